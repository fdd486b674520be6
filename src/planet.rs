//! The planet the belt orbits: mesh, textures, material, and its slow spin.

use crate::config::SceneConfig;
use crate::error::{SceneError, SceneResult};
use bevy::image::ImageLoaderSettings;
use bevy::light::NotShadowCaster;
use bevy::prelude::*;

/// Marker component for the planet entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Planet;

/// Accumulated Euler angles (XYZ order) of the planet.
///
/// Y and Z grow by a fixed increment every frame; X stays at zero.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct PlanetSpin(pub Vec3);

impl PlanetSpin {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.0.x, self.0.y, self.0.z)
    }
}

/// Texture handles requested for the planet surface.
///
/// `normal` is loaded but not attached to the material: the bump texture
/// already provides the relief and the two together over-sharpen the surface.
#[derive(Resource, Debug, Clone, Default)]
pub struct PlanetTextures {
    pub color: Handle<Image>,
    pub bump: Handle<Image>,
    pub normal: Handle<Image>,
}

/// Startup system: request the planet textures from the asset server.
///
/// Height and normal data are linear, so only the albedo is decoded as sRGB.
/// A missing file leaves a blank texture; nothing else depends on it.
pub fn load_planet_textures(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    config: Res<SceneConfig>,
) {
    let linear = |settings: &mut ImageLoaderSettings| settings.is_srgb = false;
    commands.insert_resource(PlanetTextures {
        color: asset_server.load(config.planet_color_path.clone()),
        bump: asset_server.load_with_settings(config.planet_bump_path.clone(), linear),
        normal: asset_server.load_with_settings(config.planet_normal_path.clone(), linear),
    });
}

/// UV sphere with tangents, which the parallax-mapped bump texture requires.
pub fn planet_mesh(radius: f32, segments: u32) -> SceneResult<Mesh> {
    let mut mesh = Sphere::new(radius).mesh().uv(segments, segments);
    mesh.generate_tangents()
        .map_err(|e| SceneError::MeshConstruction {
            mesh: "planet",
            reason: e.to_string(),
        })?;
    Ok(mesh)
}

/// Fully rough, non-metallic surface with the bump texture as a depth map.
pub fn planet_material(textures: &PlanetTextures, config: &SceneConfig) -> StandardMaterial {
    StandardMaterial {
        base_color_texture: Some(textures.color.clone()),
        depth_map: Some(textures.bump.clone()),
        parallax_depth_scale: config.planet_bump_scale,
        perceptual_roughness: 1.0,
        metallic: 0.0,
        emissive: LinearRgba::BLACK,
        ..default()
    }
}

/// Startup system: spawn the planet below the origin.
///
/// The planet receives shadows from the belt but casts none.
pub fn spawn_planet(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    textures: Res<PlanetTextures>,
    config: Res<SceneConfig>,
) {
    let mesh = match planet_mesh(config.planet_radius, config.planet_segments) {
        Ok(mesh) => meshes.add(mesh),
        Err(e) => {
            warn!("Planet not spawned: {e}");
            return;
        }
    };

    commands.spawn((
        Planet,
        PlanetSpin::default(),
        Mesh3d(mesh),
        MeshMaterial3d(materials.add(planet_material(&textures, &config))),
        Transform::from_xyz(0.0, config.planet_base_y, 0.0),
        NotShadowCaster,
        Name::new("Planet"),
    ));
}

/// Turn the planet by the configured yaw and roll increments.
pub fn spin_planet_system(
    mut query: Query<(&mut PlanetSpin, &mut Transform), With<Planet>>,
    config: Res<SceneConfig>,
) {
    for (mut spin, mut transform) in query.iter_mut() {
        spin.0.y += config.planet_yaw_rate;
        spin.0.z += config.planet_roll_rate;
        transform.rotation = spin.rotation();
    }
}
