use asteroid_belt::config::SceneConfig;
use asteroid_belt::simulation::ScenePlugin;
use bevy::prelude::*;
use bevy::window::WindowResolution;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Asteroid Belt".into(),
                resolution: WindowResolution::new(1280, 720),
                ..Default::default()
            }),
            ..Default::default()
        }))
        .insert_resource(ClearColor(Color::BLACK))
        // Compiled defaults; load_scene_config overwrites them from
        // assets/scene.toml (if present) in the Startup schedule.
        .insert_resource(SceneConfig::default())
        .add_plugins(ScenePlugin)
        .run();
}
