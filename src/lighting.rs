//! Sun (directional light) setup and its debug helper gizmo.
//!
//! The ambient term lives on the camera (see [`crate::camera::spawn_camera`]);
//! image-based lighting is installed later by [`crate::environment`].

use crate::config::SceneConfig;
use bevy::light::{CascadeShadowConfigBuilder, DirectionalLightShadowMap};
use bevy::prelude::*;

/// Marker component for the scene's directional light.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sun;

/// Length of the helper arrow drawn along the light direction.
const HELPER_ARROW_LENGTH: f32 = 1.0;

/// Half-size of the cross drawn at the light position.
const HELPER_CROSS_HALF: f32 = 0.25;

/// Single shadow cascade starting at `shadow_near` in front of the camera.
///
/// Cascades are measured from the camera, so the far bound is stretched to the
/// farthest belt point the orbit camera can see: its maximum distance from the
/// origin plus the outer belt radius.
pub fn sun_cascades(config: &SceneConfig) -> CascadeShadowConfigBuilder {
    let far = config
        .shadow_far
        .max(config.orbit_max_distance + config.orbital_radius_max);
    CascadeShadowConfigBuilder {
        num_cascades: 1,
        minimum_distance: config.shadow_near,
        maximum_distance: far,
        first_cascade_far_bound: far,
        ..default()
    }
}

/// Startup system: spawn the shadow-casting sun aimed at the origin and set
/// the shadow-map resolution.
pub fn spawn_sun(mut commands: Commands, config: Res<SceneConfig>) {
    let [r, g, b] = config.sun_color;
    commands.insert_resource(DirectionalLightShadowMap {
        size: config.shadow_map_size,
    });
    commands.spawn((
        Sun,
        DirectionalLight {
            color: Color::srgb_u8(r, g, b),
            illuminance: config.sun_illuminance,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_translation(Vec3::from_array(config.sun_position))
            .looking_at(Vec3::ZERO, Vec3::Y),
        sun_cascades(&config).build(),
        Name::new("Sun"),
    ));
}

/// Draw the sun's position and direction, like a light helper in an editor.
pub fn sun_helper_gizmo_system(
    mut gizmos: Gizmos,
    config: Res<SceneConfig>,
    query: Query<(&GlobalTransform, &DirectionalLight), With<Sun>>,
) {
    if !config.show_light_helper {
        return;
    }
    for (transform, light) in query.iter() {
        let origin = transform.translation();
        let tip = origin + transform.forward() * HELPER_ARROW_LENGTH;
        gizmos.arrow(origin, tip, light.color);

        for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
            gizmos.line(
                origin - axis * HELPER_CROSS_HALF,
                origin + axis * HELPER_CROSS_HALF,
                light.color,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{
        ORBITAL_RADIUS_MAX, ORBIT_MAX_DISTANCE, SHADOW_FAR, SHADOW_MAP_SIZE, SHADOW_NEAR,
    };
    use bevy::ecs::system::RunSystemOnce;

    #[test]
    fn cascade_starts_at_the_configured_near_plane() {
        let builder = sun_cascades(&SceneConfig::default());
        assert_eq!(builder.num_cascades, 1);
        assert_eq!(builder.minimum_distance, SHADOW_NEAR);
        assert_eq!(builder.first_cascade_far_bound, builder.maximum_distance);
    }

    #[test]
    fn cascade_reaches_the_far_side_of_the_belt() {
        let builder = sun_cascades(&SceneConfig::default());
        // Camera clamped to the max orbit distance, looking across the belt.
        let farthest_rock = ORBIT_MAX_DISTANCE + ORBITAL_RADIUS_MAX;
        assert!(builder.maximum_distance >= farthest_rock);
        assert!(builder.maximum_distance >= SHADOW_FAR);
    }

    #[test]
    fn larger_configured_far_plane_is_kept() {
        let config = SceneConfig {
            shadow_far: 100.0,
            ..Default::default()
        };
        assert_eq!(sun_cascades(&config).maximum_distance, 100.0);
    }

    #[test]
    fn cascades_from_validated_config_build() {
        let config = SceneConfig::from_toml("shadow_near = 0.0").expect("valid config");
        let cascades = sun_cascades(&config).build();
        assert_eq!(cascades.bounds.len(), 1);
    }

    #[test]
    fn sun_casts_shadows_and_points_at_origin() {
        let mut world = World::new();
        world.insert_resource(SceneConfig::default());
        world.run_system_once(spawn_sun).expect("sun spawns");

        assert_eq!(
            world.resource::<DirectionalLightShadowMap>().size,
            SHADOW_MAP_SIZE
        );

        let mut query = world.query_filtered::<(&DirectionalLight, &Transform), With<Sun>>();
        let (light, transform) = query.single(&world).expect("exactly one sun");
        assert!(light.shadows_enabled);
        let to_origin = (-transform.translation).normalize();
        assert!(transform.forward().dot(to_origin) > 0.999);
    }
}
