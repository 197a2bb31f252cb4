//! Reference frame derivation and pivot-centered rotations.

use bevy_math::{prelude::*, Affine3A};

/// Gram-Schmidt orthonormalization of a 3x3 basis. The x axis is kept, y is made perpendicular to
/// it, and z is rebuilt as their cross product so the result is always right-handed.
///
/// Returns `None` if the basis is degenerate (zero-length or parallel axes, or non-finite values).
pub fn orthonormalize(m: Mat3) -> Option<Mat3> {
    let x = m.x_axis.try_normalize()?;
    let y = (m.y_axis - x * m.y_axis.dot(x)).try_normalize()?;
    let z = x.cross(y);
    Some(Mat3::from_cols(x, y, z))
}

/// Orthonormalize the linear part of an affine transform, leaving its translation untouched.
pub fn orthonormalize_affine(affine: Affine3A) -> Option<Affine3A> {
    let rotation = orthonormalize(Mat3::from(affine.matrix3))?;
    Some(Affine3A::from_mat3_translation(
        rotation,
        Vec3::from(affine.translation),
    ))
}

/// Derive the reference frame used to bring screen-space drag axes into arc space.
///
/// The camera roll of `tilt` radians about the view axis is undone, then `base` is applied. With no
/// roll and an identity base this is the identity.
pub fn reference_frame_from_tilt(tilt: f32, base: Mat3) -> Mat3 {
    let frame = Mat3::from_rotation_z(tilt).transpose() * base;
    // Both factors are orthonormal; this only strips accumulated rounding.
    orthonormalize(frame).unwrap_or(Mat3::IDENTITY)
}

/// Build `rotation` centered at `pivot`, i.e. translate by `-pivot`, rotate, translate back.
pub fn rotate_about_pivot(rotation: Mat3, pivot: Vec3) -> Affine3A {
    Affine3A::from_translation(pivot)
        * Affine3A::from_mat3(rotation)
        * Affine3A::from_translation(-pivot)
}

/// `true` if `m` is orthonormal to within `epsilon`.
pub fn is_orthonormal(m: Mat3, epsilon: f32) -> bool {
    (m * m.transpose()).abs_diff_eq(Mat3::IDENTITY, epsilon)
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn orthonormalize_repairs_drift() {
        let drifted = Mat3::from_cols(
            Vec3::new(1.001, 0.002, 0.0),
            Vec3::new(0.003, 0.998, 0.001),
            Vec3::new(0.0, 0.0, 1.01),
        );
        let fixed = orthonormalize(drifted).unwrap();
        assert!(is_orthonormal(fixed, 1e-6));
        assert!(fixed.determinant() > 0.0);
    }

    #[test]
    fn orthonormalize_rejects_degenerate() {
        assert!(orthonormalize(Mat3::ZERO).is_none());
        let parallel = Mat3::from_cols(Vec3::X, Vec3::X * 2.0, Vec3::Z);
        assert!(orthonormalize(parallel).is_none());
    }

    #[test]
    fn reference_frame_undoes_roll() {
        let frame = reference_frame_from_tilt(FRAC_PI_2, Mat3::IDENTITY);
        // Screen-space y, seen through a quarter roll, is arc-space x.
        let axis = frame * Vec3::Y;
        assert!(axis.abs_diff_eq(Vec3::X, 1e-6));
        assert!(is_orthonormal(frame, 1e-6));
    }

    #[test]
    fn pivot_is_fixed_point() {
        let pivot = Vec3::new(1.0, -2.0, 3.0);
        let rotation = Mat3::from_axis_angle(Vec3::new(1.0, 1.0, 0.0).normalize(), 1.2);
        let affine = rotate_about_pivot(rotation, pivot);
        assert!(affine.transform_point3(pivot).abs_diff_eq(pivot, 1e-5));
    }
}
