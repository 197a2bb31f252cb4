//! A `bevy_arcball` extension that draws an indicator at the rotation pivot while the arcball is
//! being dragged, so it is obvious what point the view rotates around.

use bevy_app::prelude::*;
use bevy_color::Color;
use bevy_ecs::prelude::*;
use bevy_gizmos::prelude::*;
use bevy_math::{prelude::*, Isometry3d};
use bevy_reflect::prelude::*;
use bevy_transform::{prelude::*, TransformSystem};

use crate::prelude::*;

/// See the [module](self) docs.
pub struct PivotIndicatorPlugin;

impl Plugin for PivotIndicatorPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            PostUpdate,
            draw_pivot.after(TransformSystem::TransformPropagate),
        )
        .register_type::<PivotIndicator>();
    }
}

/// Optional. Configures whether or not an [`ArcBallControls`] camera should show a pivot indicator.
/// The indicator will be enabled if this component is not present.
#[derive(Debug, Component, Reflect)]
pub struct PivotIndicator {
    /// Should the indicator be visible on this camera?
    pub enabled: bool,
    /// Size of the indicator as a fraction of its distance to the camera.
    pub relative_size: f32,
}

impl Default for PivotIndicator {
    fn default() -> Self {
        Self {
            enabled: true,
            relative_size: 0.01,
        }
    }
}

/// Use gizmos to draw the rotation pivot in world space.
pub fn draw_pivot(
    cameras: Query<(&ArcBallControls, &GlobalTransform, Option<&PivotIndicator>)>,
    mut gizmos: Gizmos,
) {
    for (controls, cam_transform, indicator) in cameras.iter() {
        let relative_size = match indicator {
            Some(indicator) if !indicator.enabled => continue,
            Some(indicator) => indicator.relative_size,
            None => PivotIndicator::default().relative_size,
        };
        if !controls.drag_state().is_dragging() {
            continue;
        }

        let pivot_world = controls.rotation_pivot_offset_world_space();
        let to_camera = cam_transform.translation() - pivot_world;
        let scale = to_camera.length() * relative_size;
        // Shift the indicator toward the camera to prevent it clipping objects near parallel
        let pivot_world = pivot_world + to_camera.normalize_or_zero() * scale;

        let color = Color::WHITE;
        let arm_length = 0.4;
        let offset = 1.5 * scale;

        gizmos.circle(
            Isometry3d::new(pivot_world, cam_transform.rotation()),
            scale,
            color,
        );
        for arm in [
            cam_transform.left(),
            cam_transform.right(),
            cam_transform.up(),
            cam_transform.down(),
        ] {
            gizmos.ray(
                pivot_world + offset * arm,
                offset * arm_length * arm,
                color,
            );
        }
    }
}
