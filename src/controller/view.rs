//! View composition: tilt, pan, and the rotation pivot folded together with the arc rotation.

use bevy_log::prelude::*;
use bevy_math::{prelude::*, Affine3A};
use bevy_reflect::prelude::*;

use super::frame::rotate_about_pivot;

/// Pivots closer than this to the current one are considered unchanged.
const PIVOT_EPSILON: f32 = 1e-5;

/// The derived view transforms, recomputed every update.
#[derive(Debug, Clone, Reflect)]
pub struct ViewState {
    tilt_rotation: Affine3A,
    /// `tilt_rotation * arc_rotation`.
    view_rotation: Affine3A,
    view_translation: Affine3A,
    /// `view_translation * view_rotation`.
    view_matrix: Affine3A,
    pan_vector: Vec3,
    /// Rotation pivot in arc space.
    pivot: Vec3,
    tilt: f32,
    camera_distance: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            tilt_rotation: Affine3A::IDENTITY,
            view_rotation: Affine3A::IDENTITY,
            view_translation: Affine3A::IDENTITY,
            view_matrix: Affine3A::IDENTITY,
            pan_vector: Vec3::ZERO,
            pivot: Vec3::ZERO,
            tilt: 0.0,
            camera_distance: 0.0,
        }
    }
}

impl ViewState {
    /// Scene to eye space, including the arc rotation.
    pub fn view_matrix(&self) -> Affine3A {
        self.view_matrix
    }

    /// Tilt followed by arc rotation, without translation from pan or camera distance.
    pub fn view_rotation(&self) -> Affine3A {
        self.view_rotation
    }

    /// The camera roll, centered on the pivot.
    pub fn tilt_rotation(&self) -> Affine3A {
        self.tilt_rotation
    }

    /// Pan and camera distance.
    pub fn view_translation(&self) -> Affine3A {
        self.view_translation
    }

    /// The accumulated pan offset.
    pub fn pan_vector(&self) -> Vec3 {
        self.pan_vector
    }

    /// The rotation pivot in arc space.
    pub fn pivot(&self) -> Vec3 {
        self.pivot
    }

    /// The last camera distance used to compose the view.
    pub fn camera_distance(&self) -> f32 {
        self.camera_distance
    }

    /// The last tilt used to compose the view, in radians.
    pub fn tilt(&self) -> f32 {
        self.tilt
    }

    /// Where the eye-space origin lands under `view_translation * tilt_rotation`. Pivot changes
    /// compensate pan so this point stays put.
    pub fn eye_anchor(&self) -> Vec3 {
        (self.view_translation * self.tilt_rotation).transform_point3(Vec3::ZERO)
    }

    /// Accumulate `pan_delta` and recompose the view for the given camera parameters.
    pub(crate) fn update(
        &mut self,
        tilt: f32,
        camera_distance: f32,
        pan_delta: Vec3,
        arc_rotation: Affine3A,
    ) {
        self.pan_vector += pan_delta;
        self.compose(tilt, camera_distance, arc_rotation);
    }

    /// Recompose all view transforms without accumulating pan.
    pub(crate) fn compose(&mut self, tilt: f32, camera_distance: f32, arc_rotation: Affine3A) {
        self.tilt = tilt;
        self.camera_distance = camera_distance;

        self.tilt_rotation = rotate_about_pivot(Mat3::from_rotation_z(tilt), self.pivot);
        self.view_translation = Affine3A::from_translation(Vec3::new(
            self.pan_vector.x,
            self.pan_vector.y,
            camera_distance + self.pan_vector.z,
        ));

        self.view_rotation = self.tilt_rotation * arc_rotation;
        self.view_matrix = self.view_translation * self.view_rotation;
        debug_assert!(self.view_matrix.is_finite());
    }

    /// Store a new arc-space pivot. Returns `false` and leaves the state untouched if `pivot` is
    /// within tolerance of the current one; re-deriving the pivot from floating noise makes it drift.
    pub(crate) fn set_pivot(&mut self, pivot: Vec3) -> bool {
        if pivot.abs_diff_eq(self.pivot, PIVOT_EPSILON) {
            return false;
        }
        debug!("Arcball rotation pivot moved to {pivot} (arc space)");
        self.pivot = pivot;
        true
    }

    pub(crate) fn add_pan(&mut self, offset: Vec3) {
        self.pan_vector += offset;
    }

    pub(crate) fn set_pan(&mut self, pan_vector: Vec3) {
        self.pan_vector = pan_vector;
    }

    /// Back to identity transforms, zero pan and pivot. The camera distance is kept, since it is
    /// camera input rather than accumulated state.
    pub(crate) fn reset(&mut self) {
        *self = Self {
            camera_distance: self.camera_distance,
            ..Default::default()
        };
        self.compose(0.0, self.camera_distance, Affine3A::IDENTITY);
    }
}
