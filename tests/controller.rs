use std::{
    f32::consts::{FRAC_PI_2, PI},
    time::Duration,
};

use bevy::math::Affine3A;
use bevy::prelude::*;
use bevy_arcball::prelude::*;

const DISTANCE: f32 = -5.0;

fn input(pointer: Vec2) -> ArcBallInput {
    ArcBallInput::new(pointer).with_camera(DISTANCE, 0.0)
}

/// Rotation angle in `[0, PI]`.
fn rotation_angle(affine: Affine3A) -> f32 {
    let q = Quat::from_affine3(&affine);
    2.0 * q.xyz().length().atan2(q.w.abs())
}

/// Press in the center and drag right by `dx` in one frame.
fn drag_right(controls: &mut ArcBallControls, dx: f32) {
    let center = Vec2::splat(0.5);
    controls.update(&input(center).with_button_pressed(true));
    controls.update(
        &input(center + Vec2::new(dx, 0.0))
            .with_pointer_delta(Vec2::new(dx, 0.0))
            .with_button_pressed(true),
    );
}

#[test]
fn small_drag_rotates_about_screen_vertical() {
    let mut controls = ArcBallControls::default();
    controls.set_mouse_sensitivity(1.0);
    drag_right(&mut controls, 0.1);

    let (axis, angle) = Quat::from_affine3(&controls.arc_rotation_matrix()).to_axis_angle();
    assert!(axis.abs_diff_eq(Vec3::Y, 1e-4), "axis {axis}");
    assert!(angle > 0.0 && angle < FRAC_PI_2, "angle {angle}");
}

#[test]
fn antipodal_traditional_drag_saturates_at_half_turn() {
    let mut controls = ArcBallControls::default();
    controls.set_mouse_sensitivity(1.0);
    controls.set_max_traditional_rotation_degrees(180.0);
    controls.set_interaction_mode(InteractionMode {
        full_circle: false,
        smooth: false,
    });

    let press = Vec2::new(-100.0, 0.5);
    controls.update(&input(press).with_button_pressed(true));
    controls.update(
        &input(Vec2::new(100.0, 0.5))
            .with_pointer_delta(Vec2::new(200.0, 0.0))
            .with_button_pressed(true),
    );

    let arc = controls.arc_rotation_matrix();
    assert!(arc.is_finite());
    let angle = rotation_angle(arc);
    assert!(angle > 179f32.to_radians(), "angle {angle}");
    assert!(angle <= PI + 1e-4, "angle {angle}");
}

#[test]
fn traditional_sweep_scales_with_max_degrees() {
    let sweep = |max_degrees: f32| {
        let mut controls = ArcBallControls::default();
        controls.set_mouse_sensitivity(1.0);
        controls.set_max_traditional_rotation_degrees(max_degrees);
        controls.set_interaction_mode(InteractionMode {
            full_circle: false,
            smooth: false,
        });
        drag_right(&mut controls, 0.2);
        rotation_angle(controls.arc_rotation_matrix())
    };
    let half = sweep(180.0);
    let full = sweep(360.0);
    assert!((full - 2.0 * half).abs() < 1e-4, "{half} {full}");
}

#[test]
fn idle_updates_leave_rotation_unchanged() {
    let mut controls = ArcBallControls::default();
    controls.set_interaction_mode(InteractionMode {
        full_circle: true,
        smooth: false,
    });
    drag_right(&mut controls, 0.3);
    controls.update(&input(Vec2::splat(0.5)));
    let rotated = controls.arc_rotation_matrix();
    assert_ne!(rotated, Affine3A::IDENTITY);

    for _ in 0..100 {
        assert_eq!(controls.update(&input(Vec2::splat(0.5))), DragState::Idle);
        assert_eq!(controls.arc_rotation_matrix(), rotated);
    }
}

#[test]
fn smooth_release_settles_to_zero() {
    let mut controls = ArcBallControls::default();
    controls.set_rot_damping_factor(0.8);
    drag_right(&mut controls, 0.2);

    let mut last = controls.residual_motion().length();
    assert!(last > 0.0);
    let mut updates = 0;
    while controls.residual_motion() != Vec2::ZERO {
        controls.update(&input(Vec2::splat(0.5)));
        let residual = controls.residual_motion().length();
        assert!(residual < last);
        last = residual;
        updates += 1;
        assert!(updates < 500, "residual motion never settled");
    }
    assert_eq!(controls.drag_state(), DragState::Idle);
}

#[test]
fn coasting_continues_after_release() {
    let mut controls = ArcBallControls::default();
    drag_right(&mut controls, 0.2);
    let released = controls.arc_rotation_matrix();
    assert_eq!(
        controls.update(&input(Vec2::splat(0.5))),
        DragState::Dragging
    );
    assert_ne!(controls.arc_rotation_matrix(), released);
}

#[test]
fn damping_with_reference_rate_ignores_frame_rate() {
    let residual_after = |frames: u32, rate: f32| {
        let mut controls = ArcBallControls::new(ArcBallSettings {
            damping_reference_rate: Some(60.0),
            ..Default::default()
        });
        // The press frame has no duration, so it does not decay.
        drag_right(&mut controls, 0.2);
        let dt = Duration::from_secs_f32(1.0 / rate);
        for _ in 0..frames {
            controls.update(&input(Vec2::splat(0.5)).with_delta_time(dt));
        }
        controls.residual_motion().length()
    };
    let at_60 = residual_after(30, 60.0);
    let at_120 = residual_after(60, 120.0);
    assert!(at_60 > 0.0);
    assert!((at_60 - at_120).abs() < 1e-4, "{at_60} {at_120}");
}

#[test]
fn repeated_world_pivot_is_a_no_op() {
    let mut controls = ArcBallControls::default();
    drag_right(&mut controls, 0.15);
    controls.update(&input(Vec2::splat(0.5)).with_pan_delta(Vec3::new(0.2, 0.1, 0.0)));

    let pivot = Vec3::new(0.3, -0.2, 1.0);
    controls.set_rotation_pivot_world_space(pivot);
    let arc = controls.arc_rotation_matrix();
    let pan = controls.pan_vector();
    let stored = controls.rotation_pivot_offset_arc_space();

    controls.set_rotation_pivot_world_space(pivot);
    assert_eq!(controls.arc_rotation_matrix(), arc);
    assert_eq!(controls.pan_vector(), pan);
    assert_eq!(controls.rotation_pivot_offset_arc_space(), stored);
    assert!(controls
        .rotation_pivot_offset_world_space()
        .abs_diff_eq(pivot, 1e-5));
}

#[test]
fn seamless_pivot_change_keeps_view_still() {
    let mut controls = ArcBallControls::default();
    let tilt = 0.4;
    drag_right(&mut controls, 0.15);
    controls.update(
        &ArcBallInput::default()
            .with_camera(DISTANCE, tilt)
            .with_pan_delta(Vec3::new(0.3, -0.1, 0.2)),
    );
    let anchor = |controls: &ArcBallControls| {
        (controls.view_translation_matrix() * controls.tilt_rotation_matrix())
            .transform_point3(Vec3::ZERO)
    };
    let anchor_before = anchor(&controls);
    let view_before = controls.view_matrix();

    controls.seamless_set_rotation_pivot_world_space(Vec3::new(1.0, 2.0, -0.5), tilt, DISTANCE);

    assert!(anchor(&controls).abs_diff_eq(anchor_before, 1e-4));
    for point in [Vec3::ZERO, Vec3::X, Vec3::new(-2.0, 1.0, 3.0)] {
        let before = view_before.transform_point3(point);
        let after = controls.view_matrix().transform_point3(point);
        assert!(after.abs_diff_eq(before, 1e-4), "{before} vs {after}");
    }
}

#[test]
fn rotation_centers_on_pivot() {
    let mut controls = ArcBallControls::default();
    let pivot = Vec3::new(0.5, 0.5, -1.0);
    controls.set_rotation_pivot_world_space(pivot);
    drag_right(&mut controls, 0.2);
    let moved = controls.arc_rotation_matrix().transform_point3(pivot);
    assert!(moved.abs_diff_eq(pivot, 1e-4));
}

#[test]
fn drag_direction_follows_camera_roll() {
    let mut controls = ArcBallControls::default();
    controls.set_interaction_mode(InteractionMode {
        full_circle: true,
        smooth: false,
    });
    let tilted = |pointer: Vec2| ArcBallInput::new(pointer).with_camera(DISTANCE, FRAC_PI_2);
    controls.update(&tilted(Vec2::splat(0.5)).with_button_pressed(true));
    controls.update(
        &tilted(Vec2::new(0.6, 0.5))
            .with_pointer_delta(Vec2::new(0.1, 0.0))
            .with_button_pressed(true),
    );

    // Seen through the rolled camera, a horizontal drag still turns about the screen vertical.
    let tilt = controls.tilt_rotation_matrix();
    let on_screen = tilt * controls.arc_rotation_matrix() * tilt.inverse();
    let (axis, _) = Quat::from_affine3(&on_screen).to_axis_angle();
    assert!(axis.abs_diff_eq(Vec3::Y, 1e-4), "axis {axis}");
}

#[test]
fn reset_returns_to_camera_distance() {
    let mut controls = ArcBallControls::default();
    drag_right(&mut controls, 0.25);
    controls.update(
        &ArcBallInput::default()
            .with_camera(DISTANCE, 0.3)
            .with_pan_delta(Vec3::ONE),
    );
    controls.set_rotation_pivot_world_space(Vec3::new(1.0, 0.0, 0.0));

    controls.reset_trafos();

    let expected = Affine3A::from_translation(Vec3::new(0.0, 0.0, DISTANCE));
    assert!(controls.view_matrix().abs_diff_eq(expected, 1e-6));
    assert_eq!(controls.rotation_matrix(), Affine3A::IDENTITY);
    assert_eq!(controls.pan_vector(), Vec3::ZERO);
    assert_eq!(controls.drag_state(), DragState::Idle);
}

#[test]
fn instances_are_independent() {
    let mut first = ArcBallControls::default();
    let second = ArcBallControls::default();
    first.set_interaction_mode(InteractionMode {
        full_circle: false,
        smooth: false,
    });
    drag_right(&mut first, 0.2);
    assert_ne!(first.arc_rotation_matrix(), Affine3A::IDENTITY);
    assert_eq!(second.arc_rotation_matrix(), Affine3A::IDENTITY);
}

#[test]
fn traditional_smooth_drag_eases_out_after_release() {
    let mut controls = ArcBallControls::default();
    controls.set_mouse_sensitivity(1.0);
    controls.set_interaction_mode(InteractionMode {
        full_circle: false,
        smooth: true,
    });
    drag_right(&mut controls, 0.1);
    let dragged = controls.arc_rotation_matrix();

    // Holding the pointer still keeps the sphere under it.
    for _ in 0..50 {
        controls.update(&input(Vec2::new(0.6, 0.5)).with_button_pressed(true));
    }
    assert!(controls.arc_rotation_matrix().abs_diff_eq(dragged, 1e-6));

    // A moving release eases out, then settles.
    controls.update(
        &input(Vec2::new(0.65, 0.5))
            .with_pointer_delta(Vec2::new(0.05, 0.0))
            .with_button_pressed(true),
    );
    let released = controls.arc_rotation_matrix();
    assert_eq!(
        controls.update(&input(Vec2::new(0.65, 0.5))),
        DragState::Dragging
    );
    assert_ne!(controls.arc_rotation_matrix(), released);

    let mut updates = 0;
    while controls.update(&input(Vec2::new(0.65, 0.5))).is_dragging() {
        updates += 1;
        assert!(updates < 500, "easing never settled");
    }
    assert!(rotation_angle(controls.arc_rotation_matrix()) < PI);
}

#[test]
fn press_while_coasting_recaptures_pointer() {
    let mut controls = ArcBallControls::default();
    controls.set_mouse_sensitivity(1.0);
    controls.set_interaction_mode(InteractionMode {
        full_circle: false,
        smooth: true,
    });
    drag_right(&mut controls, 0.2);
    assert_eq!(
        controls.update(&input(Vec2::new(0.7, 0.5))),
        DragState::Dragging
    );

    controls.update(&input(Vec2::new(0.3, 0.3)).with_button_pressed(true));
    let pressed = controls.arc_rotation_matrix();
    assert_eq!(controls.residual_motion(), Vec2::ZERO);
    for _ in 0..10 {
        controls.update(&input(Vec2::new(0.3, 0.3)).with_button_pressed(true));
    }
    assert_eq!(controls.arc_rotation_matrix(), pressed);

    // Dragging again turns from the new press point.
    controls.update(
        &input(Vec2::new(0.4, 0.3))
            .with_pointer_delta(Vec2::new(0.1, 0.0))
            .with_button_pressed(true),
    );
    let gesture = controls.arc_rotation_matrix() * pressed.inverse();
    assert!(rotation_angle(gesture) > 0.0);
}

#[test]
fn arc_space_pivot_setters() {
    let mut controls = ArcBallControls::default();
    let tilt = 0.7;
    drag_right(&mut controls, 0.15);
    controls.update(
        &ArcBallInput::default()
            .with_camera(DISTANCE, tilt)
            .with_pan_delta(Vec3::new(-0.2, 0.4, 0.1)),
    );

    let pivot = Vec3::new(0.5, -1.0, 2.0);
    controls.set_rotation_pivot_arc_space(pivot);
    assert_eq!(controls.rotation_pivot_offset_arc_space(), pivot);
    let view = controls.view_matrix();
    let pan = controls.pan_vector();

    // Within tolerance of the stored pivot: nothing changes.
    controls.set_rotation_pivot_arc_space(pivot + Vec3::splat(1e-7));
    assert_eq!(controls.rotation_pivot_offset_arc_space(), pivot);
    assert_eq!(controls.view_matrix(), view);
    controls.seamless_set_rotation_pivot_arc_space(pivot + Vec3::splat(1e-7), tilt, DISTANCE);
    assert_eq!(controls.rotation_pivot_offset_arc_space(), pivot);
    assert_eq!(controls.pan_vector(), pan);

    // A real seamless move keeps every point where it was on screen.
    let moved = Vec3::new(-1.0, 0.5, 0.0);
    controls.seamless_set_rotation_pivot_arc_space(moved, tilt, DISTANCE);
    assert_eq!(controls.rotation_pivot_offset_arc_space(), moved);
    assert_ne!(controls.pan_vector(), pan);
    for point in [Vec3::ZERO, Vec3::Y, Vec3::new(2.0, -1.0, 0.5)] {
        let before = view.transform_point3(point);
        let after = controls.view_matrix().transform_point3(point);
        assert!(after.abs_diff_eq(before, 1e-4), "{before} vs {after}");
    }
}
