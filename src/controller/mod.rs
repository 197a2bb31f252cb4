//! The arcball controller: pointer mapping, the arc-rotation engine, and view composition.

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_input::InputSystem;
use bevy_window::RequestRedraw;

pub mod arc_rotation;
pub mod component;
pub mod damping;
pub mod frame;
pub mod inputs;
pub mod mapping;
pub mod view;

/// Adds the systems that drive [`component::ArcBallControls`] cameras from pointer input.
pub struct ArcBallPlugin;

impl Plugin for ArcBallPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<RequestRedraw>()
            .add_systems(
                PreUpdate,
                (
                    inputs::ArcBallPointer::collect_inputs,
                    component::ArcBallControls::update_camera_transforms,
                )
                    .chain()
                    .after(InputSystem),
            )
            .register_type::<component::ArcBallControls>()
            .register_type::<component::ArcBallSettings>()
            .register_type::<arc_rotation::InteractionMode>()
            .register_type::<arc_rotation::DragState>()
            .register_type::<inputs::ArcBallInput>()
            .register_type::<inputs::ArcBallPointer>()
            .register_type::<inputs::ArcBallCamera>();
    }
}
