//! A minimal example: drag with the left mouse button to rotate, middle mouse to pan.

use bevy::prelude::*;
use bevy_arcball::prelude::*;

fn main() {
    App::new()
        .add_plugins((DefaultPlugins, DefaultArcBallPlugins))
        .add_systems(Startup, (setup_camera, setup_scene))
        .add_systems(Update, toggle_mode)
        .run();
}

fn setup_camera(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        ArcBallPointer::default(),
        ArcBallCamera {
            distance: 6.0,
            tilt: 0.0,
        },
    ));
}

/// Space switches between full-circle and traditional dragging.
fn toggle_mode(keys: Res<ButtonInput<KeyCode>>, mut cameras: Query<&mut ArcBallControls>) {
    if !keys.just_pressed(KeyCode::Space) {
        return;
    }
    for mut controls in cameras.iter_mut() {
        let mode = controls.interaction_mode();
        controls.set_interaction_mode(InteractionMode {
            full_circle: !mode.full_circle,
            ..mode
        });
    }
}

//
// --- The below code is not important for the example ---
//

fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(1.0, 1.5, 0.5))),
        MeshMaterial3d(materials.add(Color::srgb(0.8, 0.4, 0.2))),
    ));
    commands.spawn((
        PointLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 8.0, 4.0),
    ));
}
