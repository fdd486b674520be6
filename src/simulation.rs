//! Per-frame animation plugins for Bevy ECS.
//!
//! [`SimulationPlugin`] holds the motion model only (planet spin and belt
//! orbits) and runs headless.  [`ScenePlugin`] adds everything that needs a
//! window, an asset server or a renderer: scene assembly, the environment
//! loader, orbit controls, the viewport adapter and the light helper.

use crate::asteroid::{
    advance_asteroids_system, seed_belt_rng, spawn_asteroid_belt, BeltRng,
};
use crate::camera::{
    init_viewport, orbit_controls_system, orbit_input_system, spawn_camera,
    viewport_resize_system, Viewport,
};
use crate::config::{load_scene_config, SceneConfig};
use crate::environment::{poll_environment_system, request_environment_map, EnvironmentMap};
use crate::lighting::{spawn_sun, sun_helper_gizmo_system};
use crate::planet::{load_planet_textures, spawn_planet, spin_planet_system};
use bevy::prelude::*;

/// Ordering of the per-frame update.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrameSet {
    /// Planet spin and asteroid orbits.
    Motion,
    /// Environment install point, checked once per frame.
    Environment,
    /// Camera input and damped orbit.
    Camera,
}

/// Headless motion model: planet spin, then every asteroid.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneConfig>()
            .init_resource::<BeltRng>()
            .add_systems(
                Update,
                (spin_planet_system, advance_asteroids_system)
                    .chain()
                    .in_set(FrameSet::Motion),
            );
    }
}

/// Full interactive scene on top of [`SimulationPlugin`].
pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(SimulationPlugin)
            .init_resource::<EnvironmentMap>()
            .init_resource::<Viewport>()
            .configure_sets(
                Update,
                (FrameSet::Motion, FrameSet::Environment, FrameSet::Camera).chain(),
            )
            .add_systems(
                Startup,
                (
                    // Config first so every other startup system sees the final values.
                    load_scene_config,
                    seed_belt_rng,
                    (
                        spawn_camera,
                        spawn_sun,
                        (load_planet_textures, spawn_planet).chain(),
                        spawn_asteroid_belt,
                        request_environment_map,
                    ),
                    init_viewport,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    poll_environment_system.in_set(FrameSet::Environment),
                    (orbit_input_system, orbit_controls_system)
                        .chain()
                        .in_set(FrameSet::Camera),
                    viewport_resize_system.before(FrameSet::Camera),
                    sun_helper_gizmo_system.after(FrameSet::Camera),
                ),
            );
    }
}
