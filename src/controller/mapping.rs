//! Projects viewport-relative pointer positions onto the arcball.

use bevy_math::{prelude::*, DVec2};

/// Squared NDC radius where the sphere hands over to the hyperbolic sheet.
const SPHERE_SHEET_HANDOVER: f32 = 0.5;

/// Map a viewport-relative pointer position to a unit direction on the arcball.
///
/// `relative_pos` is the pointer position as fractions of the viewport, `(0, 0)` being the top
/// left corner and `(1, 1)` the bottom right. Values outside of `[0, 1]` are valid and map onto the
/// hyperbolic extension of the sphere, which keeps the direction continuous as the pointer moves
/// arbitrarily far from the center instead of collapsing onto the equator.
///
/// The result is always normalized. Inputs must be finite.
pub fn map_screen_pos_to_arc_ball_pos_ndc(relative_pos: Vec2) -> Vec3 {
    // Flip y so that "up" on screen is positive.
    let ndc = Vec2::new(2.0 * relative_pos.x - 1.0, 1.0 - 2.0 * relative_pos.y);
    let r2 = ndc.length_squared();
    if !r2.is_finite() {
        return far_sheet_direction(relative_pos);
    }

    let z = if r2 <= SPHERE_SHEET_HANDOVER {
        (1.0 - r2).sqrt()
    } else {
        SPHERE_SHEET_HANDOVER / r2.sqrt()
    };

    ndc.extend(z).normalize()
}

/// The sheet mapping in double precision, for pointers so far out that the squared radius overflows
/// `f32`.
fn far_sheet_direction(relative_pos: Vec2) -> Vec3 {
    let ndc = DVec2::new(
        2.0 * f64::from(relative_pos.x) - 1.0,
        1.0 - 2.0 * f64::from(relative_pos.y),
    );
    let z = f64::from(SPHERE_SHEET_HANDOVER) / ndc.length();
    ndc.extend(z).normalize().as_vec3()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn center_maps_to_pole() {
        let dir = map_screen_pos_to_arc_ball_pos_ndc(Vec2::splat(0.5));
        assert!(dir.abs_diff_eq(Vec3::Z, 1e-6));
    }

    #[test]
    fn screen_up_is_positive_y() {
        let dir = map_screen_pos_to_arc_ball_pos_ndc(Vec2::new(0.5, 0.25));
        assert!(dir.y > 0.0);
        assert!(dir.x.abs() < 1e-6);
    }

    #[test]
    fn always_unit_length() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2_000 {
            let pos = Vec2::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0));
            let dir = map_screen_pos_to_arc_ball_pos_ndc(pos);
            assert!((dir.length() - 1.0).abs() <= 1e-5, "{pos:?} -> {dir:?}");
        }

        for pos in [
            Vec2::new(1e20, 0.5),
            Vec2::new(-3e38, 3e38),
            Vec2::new(f32::MAX, f32::MIN),
        ] {
            let dir = map_screen_pos_to_arc_ball_pos_ndc(pos);
            assert!(dir.is_finite(), "{pos:?} -> {dir:?}");
            assert!((dir.length() - 1.0).abs() <= 1e-5, "{pos:?} -> {dir:?}");
        }
    }

    #[test]
    fn continuous_across_handover() {
        // r2 == 0.5 on the x axis is at ndc.x = sqrt(0.5).
        let ndc_x = SPHERE_SHEET_HANDOVER.sqrt();
        let rel_x = (ndc_x + 1.0) / 2.0;
        let inside = map_screen_pos_to_arc_ball_pos_ndc(Vec2::new(rel_x - 1e-4, 0.5));
        let outside = map_screen_pos_to_arc_ball_pos_ndc(Vec2::new(rel_x + 1e-4, 0.5));
        assert!(inside.abs_diff_eq(outside, 1e-3));
    }

    #[test]
    fn far_pointer_stays_in_front_hemisphere() {
        let dir = map_screen_pos_to_arc_ball_pos_ndc(Vec2::new(1.0e4, 0.5));
        assert!(dir.z > 0.0);
        assert!(dir.x > 0.99);
    }
}
