//! Per-frame inputs of the arcball, and collecting them from Bevy's mouse and window state.

use std::time::Duration;

use bevy_ecs::prelude::*;
use bevy_input::{
    mouse::{AccumulatedMouseMotion, MouseButton},
    ButtonInput,
};
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;
use bevy_time::prelude::*;
use bevy_window::{PrimaryWindow, Window};

use super::component::ArcBallControls;

/// Everything [`ArcBallControls::update`] consumes for one frame.
///
/// Pointer coordinates are fractions of the viewport, with `(0, 0)` at the top left and `(1, 1)` at
/// the bottom right. Converting from pixels is the caller's job; the deltas are the frame-to-frame
/// difference in the same units.
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Component)]
pub struct ArcBallInput {
    /// Time since the last update. Only affects damping when a reference rate is configured.
    pub delta_time: Duration,
    /// Viewport-relative pointer position.
    pub pointer: Vec2,
    /// Viewport-relative pointer motion since the last update.
    pub pointer_delta: Vec2,
    /// Signed offset of the scene along the view axis. Cameras looking down `-Z` want a negative
    /// value to place the scene in front of them.
    pub camera_distance: f32,
    /// Eye-space pan to accumulate this frame.
    pub camera_pan_delta: Vec3,
    /// Camera roll about the view axis, in radians.
    pub camera_tilt: f32,
    /// Is the button that engages the arcball held?
    pub button_pressed: bool,
}

impl Default for ArcBallInput {
    fn default() -> Self {
        Self {
            delta_time: Duration::ZERO,
            pointer: Vec2::splat(0.5),
            pointer_delta: Vec2::ZERO,
            camera_distance: 0.0,
            camera_pan_delta: Vec3::ZERO,
            camera_tilt: 0.0,
            button_pressed: false,
        }
    }
}

impl ArcBallInput {
    /// An input with the pointer at `pointer` and everything else at rest.
    pub fn new(pointer: Vec2) -> Self {
        Self {
            pointer,
            ..Default::default()
        }
    }

    /// Set the pointer motion since the last update.
    pub fn with_pointer_delta(self, pointer_delta: Vec2) -> Self {
        Self {
            pointer_delta,
            ..self
        }
    }

    /// Set whether the engage button is held.
    pub fn with_button_pressed(self, button_pressed: bool) -> Self {
        Self {
            button_pressed,
            ..self
        }
    }

    /// Set the camera distance and tilt.
    pub fn with_camera(self, camera_distance: f32, camera_tilt: f32) -> Self {
        Self {
            camera_distance,
            camera_tilt,
            ..self
        }
    }

    /// Set the pan to accumulate this frame.
    pub fn with_pan_delta(self, camera_pan_delta: Vec3) -> Self {
        Self {
            camera_pan_delta,
            ..self
        }
    }

    /// Set the frame time.
    pub fn with_delta_time(self, delta_time: Duration) -> Self {
        Self { delta_time, ..self }
    }

    /// `true` if every numeric field is finite.
    pub fn is_finite(&self) -> bool {
        self.pointer.is_finite()
            && self.pointer_delta.is_finite()
            && self.camera_distance.is_finite()
            && self.camera_pan_delta.is_finite()
            && self.camera_tilt.is_finite()
    }
}

/// Camera parameters fed into the arcball each frame by [`ArcBallPointer::collect_inputs`].
#[derive(Debug, Clone, Copy, Reflect, Component)]
pub struct ArcBallCamera {
    /// Distance from the camera to the scene origin, in front of the camera.
    pub distance: f32,
    /// Camera roll about the view axis, in radians.
    pub tilt: f32,
}

impl Default for ArcBallCamera {
    fn default() -> Self {
        Self {
            distance: 5.0,
            tilt: 0.0,
        }
    }
}

/// Drives an arcball camera from the mouse of the primary window.
///
/// Add this to a camera entity; the [`ArcBallControls`] it drives are added along with it. Each
/// frame the pointer is read, converted to viewport-relative units, and written to the entity's
/// [`ArcBallInput`].
#[derive(Debug, Clone, Reflect, Component)]
#[require(ArcBallControls, ArcBallInput, ArcBallCamera)]
pub struct ArcBallPointer {
    /// Held to rotate.
    pub rotate_button: MouseButton,
    /// Held to pan, if panning with the mouse is wanted.
    pub pan_button: Option<MouseButton>,
    /// Pan per viewport-width of pointer motion, in multiples of the camera distance.
    pub pan_sensitivity: f32,
}

impl Default for ArcBallPointer {
    fn default() -> Self {
        Self {
            rotate_button: MouseButton::Left,
            pan_button: Some(MouseButton::Middle),
            pan_sensitivity: 1.0,
        }
    }
}

impl ArcBallPointer {
    /// Convert the mouse state into an [`ArcBallInput`] for every pointer-driven camera.
    pub fn collect_inputs(
        mut cameras: Query<(&ArcBallPointer, &ArcBallCamera, &mut ArcBallInput)>,
        windows: Query<&Window, With<PrimaryWindow>>,
        buttons: Res<ButtonInput<MouseButton>>,
        motion: Res<AccumulatedMouseMotion>,
        time: Res<Time>,
    ) {
        let Ok(window) = windows.get_single() else {
            return;
        };
        let size = window.size();
        if size.cmple(Vec2::ZERO).any() {
            return;
        }
        let pointer_delta = motion.delta / size;
        let cursor = window.cursor_position().map(|position| position / size);

        for (pointer, camera, mut input) in cameras.iter_mut() {
            let panning = pointer
                .pan_button
                .map(|button| buttons.pressed(button))
                .unwrap_or(false);
            // Screen y points down, eye-space y points up.
            let camera_pan_delta = if panning {
                Vec3::new(pointer_delta.x, -pointer_delta.y, 0.0)
                    * pointer.pan_sensitivity
                    * camera.distance.abs()
            } else {
                Vec3::ZERO
            };

            *input = ArcBallInput {
                delta_time: time.delta(),
                // Keep the last known position while the cursor is outside the window.
                pointer: cursor.unwrap_or(input.pointer),
                pointer_delta,
                camera_distance: -camera.distance,
                camera_pan_delta,
                camera_tilt: camera.tilt,
                button_pressed: buttons.pressed(pointer.rotate_button),
            };
        }
    }
}
