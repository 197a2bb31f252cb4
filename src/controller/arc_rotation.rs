//! The arc-rotation engine: accumulates pointer drags into the arc rotation.

use bevy_log::prelude::*;
use bevy_math::{prelude::*, Affine3A};
use bevy_reflect::prelude::*;

use super::{
    damping::decay_toward_zero,
    frame::{orthonormalize_affine, rotate_about_pivot},
    mapping::map_screen_pos_to_arc_ball_pos_ndc,
};

/// Cross products shorter than this have no usable rotation axis.
const AXIS_EPSILON: f32 = 1e-7;
/// Rounding slack tolerated on `cos(angle)` before it is considered out of domain.
const COS_EPSILON: f32 = 1e-5;

/// The center of the viewport in relative coordinates.
const VIEWPORT_CENTER: Vec2 = Vec2::splat(0.5);

/// How pointer motion is turned into rotation.
///
/// The two flags are independent; all four combinations are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct InteractionMode {
    /// The pointer may leave the viewport and rotation keeps accumulating, allowing unbounded
    /// continuous spin. When `false`, each drag gesture is a single bounded rotation measured from
    /// the press position (the "traditional" arcball).
    pub full_circle: bool,
    /// Residual motion decays exponentially after release instead of stopping immediately.
    pub smooth: bool,
}

impl Default for InteractionMode {
    fn default() -> Self {
        Self {
            full_circle: true,
            smooth: true,
        }
    }
}

/// Whether the arcball is currently being driven.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum DragState {
    /// Not engaged, and no residual motion is rotating the arcball.
    #[default]
    Idle,
    /// The engage button is held, or in smooth mode, residual motion is still decaying.
    Dragging,
}

impl DragState {
    /// Returns `true` if the arcball is being dragged or is coasting.
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging)
    }
}

/// One frame of pointer input, already scaled by sensitivity.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DragInput {
    /// Viewport-relative pointer position.
    pub pointer: Vec2,
    /// Sensitivity-scaled pointer delta for this frame; zero if within the dead zone.
    pub motion: Vec2,
    /// Is the engage button held?
    pub engaged: bool,
}

/// Everything the engine reads from the controller for one update.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DragParams {
    pub mode: InteractionMode,
    pub dead_zone: f32,
    /// Damping for this update, already adjusted for frame time.
    pub damping: f32,
    pub max_traditional_rotation_degrees: f32,
    pub reference_frame: Mat3,
    /// Rotation pivot in arc space.
    pub pivot: Vec3,
}

/// Accumulates pointer drags into an incremental rotation, the arc rotation.
#[derive(Debug, Clone, Reflect)]
pub struct ArcRotationEngine {
    arc_rotation: Affine3A,
    /// Rotation of the gesture in progress. Only used when not in full-circle mode.
    gesture_rotation: Affine3A,
    /// Rotation of all finished gestures. Only used when not in full-circle mode.
    committed_rotation: Affine3A,
    state: DragState,
    /// Residual motion still to be applied, in relative viewport units. In traditional mode this
    /// is the last frame's motion, eased out after release.
    target_delta: Vec2,
    /// Was the engage button held last update?
    engaged: bool,
    start_dir: Vec3,
    press_pos: Vec2,
    gesture_offset: Vec2,
}

impl Default for ArcRotationEngine {
    fn default() -> Self {
        Self {
            arc_rotation: Affine3A::IDENTITY,
            gesture_rotation: Affine3A::IDENTITY,
            committed_rotation: Affine3A::IDENTITY,
            state: DragState::Idle,
            target_delta: Vec2::ZERO,
            engaged: false,
            start_dir: Vec3::Z,
            press_pos: VIEWPORT_CENTER,
            gesture_offset: Vec2::ZERO,
        }
    }
}

impl ArcRotationEngine {
    /// The accumulated arc rotation.
    pub fn arc_rotation(&self) -> Affine3A {
        self.arc_rotation
    }

    /// The current drag state.
    pub fn state(&self) -> DragState {
        self.state
    }

    /// Residual motion that has not yet decayed.
    pub fn target_delta(&self) -> Vec2 {
        self.target_delta
    }

    /// Replace the arc rotation, ending any gesture in progress.
    pub(crate) fn set_arc_rotation(&mut self, arc_rotation: Affine3A) {
        self.arc_rotation = arc_rotation;
        self.fold_gesture();
    }

    /// Fold the gesture in progress into the committed rotation, so that the next gesture starts
    /// from the current orientation.
    pub(crate) fn fold_gesture(&mut self) {
        self.committed_rotation = self.arc_rotation;
        self.gesture_rotation = Affine3A::IDENTITY;
        self.gesture_offset = Vec2::ZERO;
    }

    /// Advance the engine by one frame.
    pub(crate) fn update(&mut self, input: &DragInput, params: &DragParams) -> DragState {
        // A press while still coasting starts a fresh gesture too.
        let pressed = input.engaged && !self.engaged;
        self.engaged = input.engaged;
        if pressed {
            self.begin_drag(input.pointer, params);
        }

        if params.mode.full_circle {
            if input.engaged {
                if params.mode.smooth {
                    self.target_delta += input.motion;
                } else {
                    self.target_delta = input.motion;
                }
            } else if !params.mode.smooth {
                self.target_delta = Vec2::ZERO;
            }

            let motion = self.target_delta;
            if self.state == DragState::Dragging && motion.length() > params.dead_zone {
                self.spin(motion, params);
            }
        } else {
            // The gesture follows the pointer exactly while held; only the release velocity eases.
            let step = if input.engaged {
                self.target_delta = if params.mode.smooth {
                    input.motion
                } else {
                    Vec2::ZERO
                };
                input.motion
            } else if params.mode.smooth {
                self.target_delta
            } else {
                Vec2::ZERO
            };

            if self.state == DragState::Dragging && step.length() > params.dead_zone {
                self.sweep(step, params);
            }
        }

        self.target_delta = if params.mode.smooth {
            decay_toward_zero(self.target_delta, params.damping, params.dead_zone)
        } else {
            Vec2::ZERO
        };

        let settled = !params.mode.smooth || self.target_delta.length() <= params.dead_zone;
        if self.state == DragState::Dragging && !input.engaged && settled {
            self.end_drag();
        }

        self.state
    }

    fn begin_drag(&mut self, pointer: Vec2, params: &DragParams) {
        debug!("Arcball drag started at {pointer}");
        self.fold_gesture();
        if !params.mode.full_circle {
            self.target_delta = Vec2::ZERO;
        }
        self.state = DragState::Dragging;
        self.press_pos = pointer;
        self.start_dir = map_screen_pos_to_arc_ball_pos_ndc(pointer);
    }

    fn end_drag(&mut self) {
        debug!("Arcball drag ended");
        self.state = DragState::Idle;
        self.target_delta = Vec2::ZERO;
        self.fold_gesture();
    }

    /// Full-circle mode: rotate from the pole toward the pole offset by `motion`, every frame.
    fn spin(&mut self, motion: Vec2, params: &DragParams) {
        let current = map_screen_pos_to_arc_ball_pos_ndc(VIEWPORT_CENTER + motion);
        if let Some(delta) = arc_delta(Vec3::Z, current, 1.0, params) {
            self.compose(delta * self.arc_rotation);
        }
    }

    /// Traditional mode: one bounded rotation from the press direction to the current direction.
    fn sweep(&mut self, motion: Vec2, params: &DragParams) {
        self.gesture_offset += motion;
        let current = map_screen_pos_to_arc_ball_pos_ndc(self.press_pos + self.gesture_offset);
        let angle_scale = params.max_traditional_rotation_degrees / 180.0;
        if let Some(gesture) = arc_delta(self.start_dir, current, angle_scale, params) {
            self.gesture_rotation = gesture;
            self.compose(self.gesture_rotation * self.committed_rotation);
        }
    }

    fn compose(&mut self, arc_rotation: Affine3A) {
        // Keep the linear part rigid; repeated products otherwise drift away from a rotation.
        let Some(arc_rotation) = orthonormalize_affine(arc_rotation).filter(|a| a.is_finite())
        else {
            warn_once!("Discarded a non-finite arc rotation");
            return;
        };
        self.arc_rotation = arc_rotation;
    }
}

/// The rotation carrying `start` onto `current`, expressed in the reference frame and centered at
/// the pivot. Returns `None` when the rotation is too small or has no well-defined axis.
fn arc_delta(start: Vec3, current: Vec3, angle_scale: f32, params: &DragParams) -> Option<Affine3A> {
    let cos_angle = start.dot(current);
    if !cos_angle.is_finite() || cos_angle.abs() > 1.0 + COS_EPSILON {
        return None;
    }
    let axis = start.cross(current);
    // `acos` of a dot product near 1 rounds tiny angles to zero; `atan2` keeps them.
    let angle = axis.length().atan2(cos_angle);
    if angle < params.dead_zone {
        return None;
    }

    if axis.length() < AXIS_EPSILON {
        return None;
    }
    // Keep drag directions screen-relative under camera roll.
    let axis = (params.reference_frame * axis).try_normalize()?;

    let rotation = Mat3::from_axis_angle(axis, angle * angle_scale);
    Some(rotate_about_pivot(rotation, params.pivot))
}
