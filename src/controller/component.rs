//! The primary [`Component`] of the controller, [`ArcBallControls`].

use bevy_ecs::prelude::*;
use bevy_log::prelude::*;
use bevy_math::{prelude::*, Affine3A};
use bevy_reflect::prelude::*;
use bevy_transform::prelude::*;
use bevy_window::RequestRedraw;

use super::{
    arc_rotation::{ArcRotationEngine, DragInput, DragParams, DragState, InteractionMode},
    damping::frame_factor,
    frame::{is_orthonormal, orthonormalize, orthonormalize_affine, reference_frame_from_tilt},
    inputs::ArcBallInput,
    view::ViewState,
};

/// Tunables of an [`ArcBallControls`]. These are never modified by the controller itself.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ArcBallSettings {
    /// Fraction of residual rotation kept per update in smooth mode.
    pub rot_damping_factor: f32,
    /// Outside of smooth mode, pan input is divided by this, so damped and undamped modes pan at a
    /// comparable rate.
    pub pan_damping_factor: f32,
    /// Multiplies pointer deltas before they are turned into rotation.
    pub mouse_sensitivity: f32,
    /// Motion, residuals and angles (in radians) at or below this are treated as zero.
    pub dead_zone: f32,
    /// The rotation of a full drag sweep in traditional (not full-circle) mode. 180 gives the
    /// classic half turn, 360 a full turn.
    pub max_traditional_rotation_degrees: f32,
    /// How pointer motion is turned into rotation.
    pub interaction_mode: InteractionMode,
    /// If set, the damping factors are per frame at this rate in Hz and are rescaled to the actual
    /// frame time. If `None`, damping advances exactly once per update.
    pub damping_reference_rate: Option<f32>,
    /// When `false`, all motion is frozen without discarding accumulated state.
    pub active: bool,
}

impl Default for ArcBallSettings {
    fn default() -> Self {
        Self {
            rot_damping_factor: 0.91,
            pan_damping_factor: 0.91,
            mouse_sensitivity: 0.23,
            dead_zone: 1e-5,
            max_traditional_rotation_degrees: 180.0,
            interaction_mode: InteractionMode::default(),
            damping_reference_rate: None,
            active: true,
        }
    }
}

/// An arcball rotation and pan controller for a single viewport.
///
/// Call [`ArcBallControls::update`] once per frame with the pointer state and camera parameters,
/// then read the [view matrix](ArcBallControls::view_matrix) back for rendering. The view matrix
/// maps scene space to eye space and is composed as `translation * tilt * arc_rotation`, where the
/// arc rotation is everything the pointer has dragged so far.
///
/// The controller can be used on its own, or as a component next to an
/// [`ArcBallPointer`](super::inputs::ArcBallPointer), in which case the
/// [`ArcBallPlugin`](super::ArcBallPlugin) drives it and writes the camera [`Transform`].
///
/// Each viewport needs its own instance; instances share no state.
#[derive(Debug, Clone, Reflect, Component)]
pub struct ArcBallControls {
    settings: ArcBallSettings,
    engine: ArcRotationEngine,
    view: ViewState,
    /// Applied after undoing the camera roll. See [`Self::set_reference_frame_matrix`].
    reference_frame_base: Mat3,
}

impl Default for ArcBallControls {
    fn default() -> Self {
        Self::new(ArcBallSettings::default())
    }
}

impl ArcBallControls {
    /// Create a controller with identity transforms and the given tunables.
    pub fn new(settings: ArcBallSettings) -> Self {
        let mut controls = Self {
            settings: ArcBallSettings::default(),
            engine: ArcRotationEngine::default(),
            view: ViewState::default(),
            reference_frame_base: Mat3::IDENTITY,
        };
        controls.set_settings(settings);
        controls
    }

    /// Replace all tunables at once.
    pub fn with_settings(mut self, settings: ArcBallSettings) -> Self {
        self.set_settings(settings);
        self
    }

    /// The current tunables.
    pub fn settings(&self) -> &ArcBallSettings {
        &self.settings
    }

    /// Replace all tunables at once. Each value is clamped the same way its setter clamps it.
    pub fn set_settings(&mut self, settings: ArcBallSettings) {
        self.set_interaction_mode(settings.interaction_mode);
        self.set_rot_damping_factor(settings.rot_damping_factor);
        self.set_pan_damping_factor(settings.pan_damping_factor);
        self.set_mouse_sensitivity(settings.mouse_sensitivity);
        self.set_dead_zone(settings.dead_zone);
        self.set_max_traditional_rotation_degrees(settings.max_traditional_rotation_degrees);
        self.settings.damping_reference_rate = settings
            .damping_reference_rate
            .filter(|rate| rate.is_finite() && *rate > 0.0);
        self.set_active(settings.active);
    }

    /// Advance the controller by one frame.
    ///
    /// Never fails: degenerate geometry is skipped for the frame, and input containing NaN or
    /// infinity is dropped. Returns the drag state after the update.
    pub fn update(&mut self, input: &ArcBallInput) -> DragState {
        if !input.is_finite() {
            warn_once!("Ignoring arcball input with non-finite values: {input:?}");
            return self.engine.state();
        }
        let settings = self.settings;

        let pan_delta = if settings.active {
            let dead_zone = settings.dead_zone;
            let motion = input.pointer_delta * settings.mouse_sensitivity;
            let motion = if motion.length() < dead_zone {
                Vec2::ZERO
            } else {
                motion
            };

            let params = DragParams {
                mode: settings.interaction_mode,
                dead_zone,
                damping: frame_factor(
                    settings.rot_damping_factor,
                    settings.damping_reference_rate,
                    input.delta_time,
                ),
                max_traditional_rotation_degrees: settings.max_traditional_rotation_degrees,
                reference_frame: self.reference_frame_for_tilt(input.camera_tilt),
                pivot: self.view.pivot(),
            };
            let drag = DragInput {
                pointer: input.pointer,
                motion,
                engaged: input.button_pressed,
            };
            self.engine.update(&drag, &params);

            if settings.interaction_mode.smooth {
                input.camera_pan_delta
            } else {
                input.camera_pan_delta / settings.pan_damping_factor
            }
        } else {
            Vec3::ZERO
        };

        self.view.update(
            input.camera_tilt,
            input.camera_distance,
            pan_delta,
            self.engine.arc_rotation(),
        );
        self.engine.state()
    }

    /// Update all controlled cameras and write their transforms. Runs once per frame.
    pub fn update_camera_transforms(
        mut cameras: Query<(&mut ArcBallControls, &ArcBallInput, &mut Transform)>,
        mut redraw: EventWriter<RequestRedraw>,
    ) {
        for (mut controls, input, mut transform) in cameras.iter_mut() {
            let state = controls.update(input);
            transform.set_if_neq(controls.camera_transform());
            if state.is_dragging() {
                redraw.send(RequestRedraw);
            }
        }
    }

    /// The camera transform that renders the scene with this controller's view matrix.
    pub fn camera_transform(&self) -> Transform {
        Transform::from_matrix(Mat4::from(self.view.view_matrix().inverse()))
    }

    /// Scene to eye space: `view_translation * tilt * arc_rotation`.
    pub fn view_matrix(&self) -> Affine3A {
        self.view.view_matrix()
    }

    /// The view rotation, `tilt * arc_rotation`, without pan or camera distance.
    pub fn rotation_matrix(&self) -> Affine3A {
        self.view.view_rotation()
    }

    /// Everything the pointer has dragged so far, centered on the pivot.
    pub fn arc_rotation_matrix(&self) -> Affine3A {
        self.engine.arc_rotation()
    }

    /// The camera roll, centered on the pivot.
    pub fn tilt_rotation_matrix(&self) -> Affine3A {
        self.view.tilt_rotation()
    }

    /// Pan and camera distance.
    pub fn view_translation_matrix(&self) -> Affine3A {
        self.view.view_translation()
    }

    /// The accumulated pan offset.
    pub fn pan_vector(&self) -> Vec3 {
        self.view.pan_vector()
    }

    /// Whether the arcball is being dragged, or still coasting in smooth mode.
    pub fn drag_state(&self) -> DragState {
        self.engine.state()
    }

    /// Motion still to be applied in smooth mode, in sensitivity-scaled viewport units. Decays to
    /// exactly zero once at rest.
    pub fn residual_motion(&self) -> Vec2 {
        self.engine.target_delta()
    }

    /// The reference frame used for the current tilt.
    pub fn reference_frame_matrix(&self) -> Mat3 {
        self.reference_frame_for_tilt(self.view.tilt())
    }

    fn reference_frame_for_tilt(&self, tilt: f32) -> Mat3 {
        let frame = reference_frame_from_tilt(tilt, self.reference_frame_base);
        debug_assert!(is_orthonormal(frame, 1e-4));
        frame
    }

    /// Override the current rotation and pan, e.g. when attaching to a camera already in motion.
    ///
    /// Transforms are reset first. The rotation part of `view_matrix` becomes the arc rotation and
    /// its translation, minus the last camera distance, becomes the pan.
    pub fn set_view_matrix(&mut self, view_matrix: Affine3A) {
        self.reset_trafos();
        let Some(view_matrix) = orthonormalize_affine(view_matrix) else {
            warn!("Ignoring degenerate arcball view matrix {view_matrix:?}");
            return;
        };
        let camera_distance = self.view.camera_distance();
        self.engine
            .set_arc_rotation(Affine3A::from_mat3(Mat3::from(view_matrix.matrix3)));
        self.view.set_pan(
            Vec3::from(view_matrix.translation) - Vec3::new(0.0, 0.0, camera_distance),
        );
        self.recompose();
    }

    /// Reset all transforms to identity and all accumulators to zero. Tunables are kept.
    pub fn reset_trafos(&mut self) {
        self.engine = ArcRotationEngine::default();
        self.reference_frame_base = Mat3::IDENTITY;
        self.view.reset();
    }

    /// Set the base of the reference frame, applied after undoing the camera roll. The matrix is
    /// orthonormalized; degenerate matrices are ignored.
    pub fn set_reference_frame_matrix(&mut self, reference_frame: Mat3) {
        match orthonormalize(reference_frame) {
            Some(frame) => self.reference_frame_base = frame,
            None => warn!("Ignoring degenerate arcball reference frame {reference_frame:?}"),
        }
    }

    /// Set the rotation pivot from a scene-space point. Does nothing if the pivot would not change.
    pub fn set_rotation_pivot_world_space(&mut self, pivot: Vec3) {
        let pivot = self.world_to_arc_space(pivot);
        self.set_rotation_pivot_arc_space(pivot);
    }

    /// Set the rotation pivot from a point already in arc space. Does nothing if the pivot would
    /// not change.
    pub fn set_rotation_pivot_arc_space(&mut self, pivot: Vec3) {
        if !pivot.is_finite() {
            warn_once!("Ignoring non-finite arcball pivot {pivot}");
            return;
        }
        if self.view.set_pivot(pivot) {
            self.recompose();
        }
    }

    /// Like [`Self::set_rotation_pivot_world_space`], but pans to compensate so that the view
    /// does not visibly jump.
    pub fn seamless_set_rotation_pivot_world_space(
        &mut self,
        pivot: Vec3,
        camera_tilt: f32,
        camera_distance: f32,
    ) {
        let pivot = self.world_to_arc_space(pivot);
        self.seamless_set_rotation_pivot_arc_space(pivot, camera_tilt, camera_distance);
    }

    /// Like [`Self::set_rotation_pivot_arc_space`], but pans to compensate so that the view does
    /// not visibly jump.
    pub fn seamless_set_rotation_pivot_arc_space(
        &mut self,
        pivot: Vec3,
        camera_tilt: f32,
        camera_distance: f32,
    ) {
        if !pivot.is_finite() || !camera_tilt.is_finite() || !camera_distance.is_finite() {
            warn_once!("Ignoring non-finite arcball pivot change");
            return;
        }
        let arc_rotation = self.engine.arc_rotation();

        self.view.compose(camera_tilt, camera_distance, arc_rotation);
        let before = self.view.eye_anchor();
        if !self.view.set_pivot(pivot) {
            return;
        }
        self.view.compose(camera_tilt, camera_distance, arc_rotation);
        let compensation = before - self.view.eye_anchor();

        trace!("Compensating arcball pivot change with pan {compensation}");
        self.view.add_pan(compensation);
        self.view.compose(camera_tilt, camera_distance, arc_rotation);
    }

    /// The rotation pivot as a scene-space point.
    pub fn rotation_pivot_offset_world_space(&self) -> Vec3 {
        self.engine
            .arc_rotation()
            .inverse()
            .transform_point3(self.view.pivot())
    }

    /// The rotation pivot in arc space, as stored.
    pub fn rotation_pivot_offset_arc_space(&self) -> Vec3 {
        self.view.pivot()
    }

    /// Switching mode ends the current gesture, so the new mode starts from the current rotation.
    pub fn set_interaction_mode(&mut self, mode: InteractionMode) {
        if mode != self.settings.interaction_mode {
            debug!("Arcball interaction mode changed to {mode:?}");
            self.engine.fold_gesture();
            self.settings.interaction_mode = mode;
        }
    }

    /// The current interaction mode.
    pub fn interaction_mode(&self) -> InteractionMode {
        self.settings.interaction_mode
    }

    /// Clamped to `[0, 1]`.
    pub fn set_rot_damping_factor(&mut self, factor: f32) {
        self.settings.rot_damping_factor = clamp_finite(factor, 0.0, 1.0);
    }

    /// Per-update decay of residual rotation.
    pub fn rot_damping_factor(&self) -> f32 {
        self.settings.rot_damping_factor
    }

    /// Clamped to `[f32::EPSILON, 1]`, since pan is divided by it.
    pub fn set_pan_damping_factor(&mut self, factor: f32) {
        self.settings.pan_damping_factor = clamp_finite(factor, f32::EPSILON, 1.0);
    }

    /// Divisor applied to pan when smoothing is off.
    pub fn pan_damping_factor(&self) -> f32 {
        self.settings.pan_damping_factor
    }

    /// Scale applied to pointer deltas. Clamped to be non-negative.
    pub fn set_mouse_sensitivity(&mut self, sensitivity: f32) {
        self.settings.mouse_sensitivity = clamp_finite(sensitivity, 0.0, f32::MAX);
    }

    /// Scale applied to pointer deltas.
    pub fn mouse_sensitivity(&self) -> f32 {
        self.settings.mouse_sensitivity
    }

    /// Rotation of a full traditional drag from one side of the ball to the other. Clamped to be
    /// non-negative.
    pub fn set_max_traditional_rotation_degrees(&mut self, degrees: f32) {
        self.settings.max_traditional_rotation_degrees = clamp_finite(degrees, 0.0, f32::MAX);
    }

    /// Rotation of a full traditional drag, in degrees.
    pub fn max_traditional_rotation_degrees(&self) -> f32 {
        self.settings.max_traditional_rotation_degrees
    }

    /// Motion at or below this magnitude is treated as no motion. Clamped to be non-negative.
    pub fn set_dead_zone(&mut self, dead_zone: f32) {
        self.settings.dead_zone = clamp_finite(dead_zone, 0.0, f32::MAX);
    }

    /// Motion at or below this magnitude is treated as no motion.
    pub fn dead_zone(&self) -> f32 {
        self.settings.dead_zone
    }

    /// Freeze or unfreeze all motion. Accumulated state is kept either way.
    pub fn set_active(&mut self, active: bool) {
        self.settings.active = active;
    }

    /// Returns `true` unless motion is frozen with [`Self::set_active`].
    pub fn is_active(&self) -> bool {
        self.settings.active
    }

    fn world_to_arc_space(&self, point: Vec3) -> Vec3 {
        self.engine.arc_rotation().transform_point3(point)
    }

    /// Recompose the view with the last camera parameters, without accumulating pan.
    fn recompose(&mut self) {
        let (tilt, distance) = (self.view.tilt(), self.view.camera_distance());
        self.view.compose(tilt, distance, self.engine.arc_rotation());
    }
}

/// `value` clamped to `[min, max]`, with NaN mapped to `min`.
fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}
