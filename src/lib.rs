//! An arcball rotation and pan controller for 3D viewports.
//!
//! Pointer drags are mapped onto a virtual sphere and accumulated into a rotation, the arc
//! rotation, which is combined with camera roll, pan and distance into a view matrix.
//!
//! - Full-circle mode recenters the drag every frame, so the pointer may leave the viewport and
//!   the rotation keeps going. Traditional mode measures one bounded rotation per drag gesture.
//! - Smooth mode keeps the arcball spinning after release, decaying exponentially.
//! - Rotation and roll are centered on a movable pivot. Changing the pivot seamlessly pans to
//!   compensate, so the view does not jump.
//!
//! [`ArcBallControls`](controller::component::ArcBallControls) is a plain struct and can be driven
//! by hand, one [`update`](controller::component::ArcBallControls::update) per frame. It is also a
//! component: add [`DefaultArcBallPlugins`] and put it on a camera together with an
//! [`ArcBallPointer`](controller::inputs::ArcBallPointer) to drive it from the mouse.

use bevy_app::{PluginGroup, PluginGroupBuilder};

pub mod controller;
pub mod extensions;

/// Common imports.
pub mod prelude {
    pub use crate::{
        controller::{
            arc_rotation::{DragState, InteractionMode},
            component::{ArcBallControls, ArcBallSettings},
            inputs::{ArcBallCamera, ArcBallInput, ArcBallPointer},
            mapping::map_screen_pos_to_arc_ball_pos_ndc,
            ArcBallPlugin,
        },
        DefaultArcBallPlugins,
    };
}

/// Adds the arcball controller and its default extensions.
pub struct DefaultArcBallPlugins;

impl PluginGroup for DefaultArcBallPlugins {
    fn build(self) -> PluginGroupBuilder {
        let group = PluginGroupBuilder::start::<Self>().add(controller::ArcBallPlugin);

        #[cfg(feature = "extension_pivot_indicator")]
        let group = group.add(extensions::pivot_indicator::PivotIndicatorPlugin);

        group
    }
}
