//! HDR environment: load an equirectangular panorama, convert it to a cubemap
//! off the main thread, and install it as the scene background and
//! image-based light.
//!
//! ## Lifecycle
//!
//! [`EnvironmentMap`] is a one-shot state machine polled once per frame by
//! [`poll_environment_system`]:
//!
//! ```text
//! Idle ──request──▶ Loading ──decoded──▶ Converting ──done──▶ Installed
//!                      │                     │
//!                      └──── error ──────────┴──────────────▶ Failed
//! ```
//!
//! The decoded panorama is removed from `Assets<Image>` as soon as conversion
//! starts, and the conversion task is dropped once its cubemap is installed.
//! A failure is logged and never retried; the scene keeps rendering with the
//! sun and ambient light only.
//!
//! ## Cubemap layout
//!
//! Six square faces stacked as array layers in wgpu order (+X, −X, +Y, −Y,
//! +Z, −Z), stored as `Rgb9e5Ufloat` with a `Cube` view.  Panorama longitude
//! zero faces −Z; the top row of the panorama is +Y.

use crate::camera::SceneCamera;
use crate::config::SceneConfig;
use crate::error::{SceneError, SceneResult};
use bevy::asset::LoadState;
use bevy::core_pipeline::Skybox;
use bevy::light::GeneratedEnvironmentMapLight;
use bevy::prelude::*;
use bevy::render::render_resource::{
    Extent3d, TextureDimension, TextureFormat, TextureViewDescriptor, TextureViewDimension,
};
use bevy::tasks::{block_on, futures_lite::future, AsyncComputeTaskPool, Task};
use bevy_asset::RenderAssetUsages;
use std::f32::consts::{PI, TAU};

// ── Rgb9e5 constants ──────────────────────────────────────────────────────────

const RGB9E5_MANTISSA_BITS: i32 = 9;
const RGB9E5_EXP_BIAS: i32 = 15;
const RGB9E5_MANTISSA_MAX: u32 = (1 << RGB9E5_MANTISSA_BITS) - 1;

/// Largest representable channel value: (511 / 512) · 2^16.
pub const RGB9E5_MAX: f32 = 65_408.0;

// ── State ─────────────────────────────────────────────────────────────────────

/// Where the environment map is in its one-shot lifecycle.
#[derive(Resource, Default)]
pub enum EnvironmentMap {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// Waiting for the asset server to decode the panorama.
    Loading(Handle<Image>),
    /// Panorama decoded; the cubemap is being built on the compute pool.
    Converting(Task<SceneResult<Image>>),
    /// Cubemap installed on the scene camera.
    Installed(Handle<Image>),
    /// Load or conversion failed.  Terminal.
    Failed,
}

impl EnvironmentMap {
    pub fn installed(&self) -> Option<&Handle<Image>> {
        match self {
            EnvironmentMap::Installed(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, EnvironmentMap::Failed)
    }
}

/// Outcome of checking on the panorama this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Pending,
    Ready,
    Failed(String),
}

/// The panorama counts as ready as soon as it is in `Assets<Image>`, whoever
/// put it there; otherwise the asset server decides.
pub fn fetch_status(
    asset_server: &AssetServer,
    images: &Assets<Image>,
    handle: &Handle<Image>,
) -> FetchStatus {
    if images.contains(handle.id()) {
        return FetchStatus::Ready;
    }
    match asset_server.load_state(handle.id()) {
        LoadState::Failed(err) => FetchStatus::Failed(err.to_string()),
        _ => FetchStatus::Pending,
    }
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Startup system: ask the asset server for the HDR panorama.
pub fn request_environment_map(
    asset_server: Res<AssetServer>,
    config: Res<SceneConfig>,
    mut environment: ResMut<EnvironmentMap>,
) {
    let handle: Handle<Image> = asset_server.load(config.environment_path.clone());
    *environment = EnvironmentMap::Loading(handle);
    info!("Requested environment map {}", config.environment_path);
}

/// Advance the environment lifecycle by at most one step.
///
/// This is the only place the loaded environment touches the scene, so the
/// renderer sees either no environment or the complete one.
pub fn poll_environment_system(
    mut commands: Commands,
    mut environment: ResMut<EnvironmentMap>,
    asset_server: Res<AssetServer>,
    mut images: ResMut<Assets<Image>>,
    config: Res<SceneConfig>,
    cameras: Query<Entity, With<SceneCamera>>,
) {
    let next = match &mut *environment {
        EnvironmentMap::Loading(handle) => match fetch_status(&asset_server, &images, handle) {
            FetchStatus::Pending => None,
            FetchStatus::Failed(reason) => {
                warn!("Environment map unavailable: {reason}");
                Some(EnvironmentMap::Failed)
            }
            FetchStatus::Ready => match images.remove(handle.id()) {
                Some(panorama) => Some(EnvironmentMap::Converting(spawn_conversion(
                    panorama,
                    config.cubemap_face_size,
                ))),
                None => {
                    warn!("Environment map vanished before conversion");
                    Some(EnvironmentMap::Failed)
                }
            },
        },
        EnvironmentMap::Converting(task) => match block_on(future::poll_once(task)) {
            None => None,
            Some(Ok(cubemap)) => {
                let handle = images.add(cubemap);
                install_environment(&mut commands, cameras.iter(), &handle, &config);
                info!("Environment map installed");
                Some(EnvironmentMap::Installed(handle))
            }
            Some(Err(e)) => {
                warn!("Environment map conversion failed: {e}");
                Some(EnvironmentMap::Failed)
            }
        },
        EnvironmentMap::Idle | EnvironmentMap::Installed(_) | EnvironmentMap::Failed => None,
    };

    if let Some(next) = next {
        *environment = next;
    }
}

/// Attach `cubemap` to each camera as both skybox and environment light.
pub fn install_environment(
    commands: &mut Commands,
    cameras: impl IntoIterator<Item = Entity>,
    cubemap: &Handle<Image>,
    config: &SceneConfig,
) {
    for camera in cameras {
        commands.entity(camera).insert((
            Skybox {
                image: cubemap.clone(),
                brightness: config.skybox_brightness,
                ..default()
            },
            GeneratedEnvironmentMapLight {
                environment_map: cubemap.clone(),
                intensity: config.environment_intensity,
                ..default()
            },
        ));
    }
}

fn spawn_conversion(panorama: Image, face_size: u32) -> Task<SceneResult<Image>> {
    AsyncComputeTaskPool::get().spawn(async move {
        let equirect = Equirect::from_image(&panorama)?;
        drop(panorama);
        Ok(cubemap_image(&equirect, face_size))
    })
}

// ── Equirectangular source ────────────────────────────────────────────────────

/// Linear-RGB texels of an equirectangular panorama, row-major from the top.
#[derive(Debug, Clone, PartialEq)]
pub struct Equirect {
    width: u32,
    height: u32,
    texels: Vec<Vec3>,
}

impl Equirect {
    pub fn new(width: u32, height: u32, texels: Vec<Vec3>) -> SceneResult<Self> {
        if width == 0 || height == 0 || texels.len() != width as usize * height as usize {
            return Err(SceneError::EmptyImage { width, height });
        }
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    /// Read every pixel of a decoded image as linear RGB.
    pub fn from_image(image: &Image) -> SceneResult<Self> {
        let (width, height) = (image.width(), image.height());
        if image.data.is_none() {
            return Err(SceneError::EmptyImage { width, height });
        }

        let mut texels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                let color = image.get_color_at(x, y).map_err(|_| {
                    SceneError::UnsupportedPixelFormat {
                        format: format!("{:?}", image.texture_descriptor.format),
                    }
                })?;
                let linear = color.to_linear();
                texels.push(Vec3::new(linear.red, linear.green, linear.blue));
            }
        }
        Self::new(width, height, texels)
    }

    fn texel(&self, x: i64, y: i64) -> Vec3 {
        let x = x.rem_euclid(i64::from(self.width));
        let y = y.clamp(0, i64::from(self.height) - 1);
        self.texels[(y * i64::from(self.width) + x) as usize]
    }

    /// Bilinear sample in `direction`, wrapping across the longitude seam.
    pub fn sample(&self, direction: Vec3) -> Vec3 {
        let uv = equirect_uv(direction);
        let px = uv.x * self.width as f32 - 0.5;
        let py = uv.y * self.height as f32 - 0.5;
        let (x0, y0) = (px.floor(), py.floor());
        let (fx, fy) = (px - x0, py - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.texel(x0, y0).lerp(self.texel(x0 + 1, y0), fx);
        let bottom = self.texel(x0, y0 + 1).lerp(self.texel(x0 + 1, y0 + 1), fx);
        top.lerp(bottom, fy)
    }
}

/// Panorama coordinates in `[0, 1]²` for a view direction.
pub fn equirect_uv(direction: Vec3) -> Vec2 {
    let d = direction.normalize_or(Vec3::NEG_Z);
    Vec2::new(
        0.5 + d.x.atan2(-d.z) / TAU,
        d.y.clamp(-1.0, 1.0).acos() / PI,
    )
}

// ── Cubemap ───────────────────────────────────────────────────────────────────

/// Convert a cube face index and UV coordinates in `[0, 1]` to a unit direction.
///
/// Face indices: 0=+X, 1=−X, 2=+Y, 3=−Y, 4=+Z, 5=−Z.
pub fn cube_face_direction(face: usize, u: f32, v: f32) -> Vec3 {
    let uc = u * 2.0 - 1.0;
    let vc = v * 2.0 - 1.0;
    let dir = match face {
        0 => Vec3::new(1.0, -vc, -uc),
        1 => Vec3::new(-1.0, -vc, uc),
        2 => Vec3::new(uc, 1.0, vc),
        3 => Vec3::new(uc, -1.0, -vc),
        4 => Vec3::new(uc, -vc, 1.0),
        5 => Vec3::new(-uc, -vc, -1.0),
        _ => Vec3::Z,
    };
    dir.normalize()
}

/// Resample `equirect` into six `face_size`² faces packed as Rgb9e5.
pub fn cubemap_texels(equirect: &Equirect, face_size: u32) -> Vec<u8> {
    let size = face_size as usize;
    let mut data = Vec::with_capacity(size * size * 6 * 4);
    for face in 0..6 {
        for y in 0..face_size {
            for x in 0..face_size {
                let u = (x as f32 + 0.5) / face_size as f32;
                let v = (y as f32 + 0.5) / face_size as f32;
                let rgb = equirect.sample(cube_face_direction(face, u, v));
                data.extend_from_slice(&pack_rgb9e5(rgb).to_le_bytes());
            }
        }
    }
    data
}

/// GPU-ready cubemap image with a `Cube` texture view.
pub fn cubemap_image(equirect: &Equirect, face_size: u32) -> Image {
    let mut image = Image::new(
        Extent3d {
            width: face_size,
            height: face_size,
            depth_or_array_layers: 6,
        },
        TextureDimension::D2,
        cubemap_texels(equirect, face_size),
        TextureFormat::Rgb9e5Ufloat,
        RenderAssetUsages::RENDER_WORLD,
    );
    image.texture_view_descriptor = Some(TextureViewDescriptor {
        dimension: Some(TextureViewDimension::Cube),
        ..default()
    });
    image
}

// ── Rgb9e5 ────────────────────────────────────────────────────────────────────

/// Pack linear RGB into the shared-exponent `Rgb9e5Ufloat` layout.
///
/// Negative and NaN channels become zero; channels above [`RGB9E5_MAX`] clamp.
pub fn pack_rgb9e5(rgb: Vec3) -> u32 {
    let clamp = |c: f32| {
        if c.is_nan() {
            0.0
        } else {
            c.clamp(0.0, RGB9E5_MAX)
        }
    };
    let (r, g, b) = (clamp(rgb.x), clamp(rgb.y), clamp(rgb.z));
    let max = r.max(g).max(b);
    if max <= 0.0 {
        return 0;
    }

    let mut exponent = (max.log2().floor() as i32).max(-RGB9E5_EXP_BIAS - 1) + 1 + RGB9E5_EXP_BIAS;
    let mut denom = 2f32.powi(exponent - RGB9E5_EXP_BIAS - RGB9E5_MANTISSA_BITS);
    if (max / denom + 0.5).floor() as u32 > RGB9E5_MANTISSA_MAX {
        denom *= 2.0;
        exponent += 1;
    }

    let mantissa = |c: f32| ((c / denom + 0.5).floor() as u32).min(RGB9E5_MANTISSA_MAX);
    ((exponent as u32) << 27) | (mantissa(b) << 18) | (mantissa(g) << 9) | mantissa(r)
}

/// Inverse of [`pack_rgb9e5`].
pub fn unpack_rgb9e5(packed: u32) -> Vec3 {
    let exponent = (packed >> 27) as i32;
    let scale = 2f32.powi(exponent - RGB9E5_EXP_BIAS - RGB9E5_MANTISSA_BITS);
    Vec3::new(
        (packed & RGB9E5_MANTISSA_MAX) as f32,
        ((packed >> 9) & RGB9E5_MANTISSA_MAX) as f32,
        ((packed >> 18) & RGB9E5_MANTISSA_MAX) as f32,
    ) * scale
}

// ── Unit tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    /// 8×4 panorama: top half red, bottom half blue.
    fn split_sky() -> Equirect {
        let (w, h) = (8, 4);
        let texels = (0..w * h)
            .map(|i| if i / w < h / 2 { Vec3::X } else { Vec3::Z })
            .collect();
        Equirect::new(w, h, texels).expect("valid panorama")
    }

    // ── Rgb9e5 ────────────────────────────────────────────────────────────────

    #[test]
    fn rgb9e5_encodes_white_exactly() {
        // max = 1 → exponent 16, mantissa 256 on every channel.
        let expected = (16 << 27) | (256 << 18) | (256 << 9) | 256;
        assert_eq!(pack_rgb9e5(Vec3::ONE), expected);
        assert_eq!(unpack_rgb9e5(expected), Vec3::ONE);
    }

    #[test]
    fn rgb9e5_rejects_negative_and_nan() {
        assert_eq!(pack_rgb9e5(Vec3::new(-1.0, f32::NAN, 0.0)), 0);
    }

    #[test]
    fn rgb9e5_clamps_overbright_values() {
        let decoded = unpack_rgb9e5(pack_rgb9e5(Vec3::splat(1.0e9)));
        assert_eq!(decoded, Vec3::splat(RGB9E5_MAX));
    }

    #[test]
    fn rgb9e5_keeps_hdr_precision_relative_to_brightest_channel() {
        let color = Vec3::new(37.5, 2.0, 0.25);
        let decoded = unpack_rgb9e5(pack_rgb9e5(color));
        let step = 37.5 / 256.0;
        assert!((decoded - color).abs().max_element() <= step);
    }

    // ── Directions ────────────────────────────────────────────────────────────

    #[test]
    fn face_centres_point_along_their_axes() {
        let axes = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
        for (face, axis) in axes.iter().enumerate() {
            let dir = cube_face_direction(face, 0.5, 0.5);
            assert!((dir - *axis).length() < 1e-6, "face {face} centre is {dir:?}");
        }
    }

    #[test]
    fn equirect_uv_maps_poles_and_horizon() {
        assert!(equirect_uv(Vec3::Y).y.abs() < 1e-6);
        assert!((equirect_uv(Vec3::NEG_Y).y - 1.0).abs() < 1e-6);
        let forward = equirect_uv(Vec3::NEG_Z);
        assert!((forward - Vec2::new(0.5, 0.5)).length() < 1e-6);
    }

    #[test]
    fn zero_direction_does_not_produce_nan() {
        assert!(equirect_uv(Vec3::ZERO).is_finite());
    }

    // ── Sampling & conversion ─────────────────────────────────────────────────

    #[test]
    fn sampling_separates_sky_and_ground() {
        let sky = split_sky();
        assert_eq!(sky.sample(Vec3::Y), Vec3::X);
        assert_eq!(sky.sample(Vec3::NEG_Y), Vec3::Z);
    }

    #[test]
    fn sampling_wraps_across_the_seam() {
        // A single bright column at x = 0 must bleed into samples just left of
        // the seam (u ≈ 1), not clamp to black.
        let (w, h) = (8u32, 2u32);
        let texels = (0..w * h)
            .map(|i| if i % w == 0 { Vec3::ONE } else { Vec3::ZERO })
            .collect();
        let pano = Equirect::new(w, h, texels).expect("valid panorama");
        // u = 1.0 lies on the seam; the direction is +Z.
        assert!(pano.sample(Vec3::Z).x > 0.0);
    }

    #[test]
    fn mismatched_texel_count_is_rejected() {
        assert_eq!(
            Equirect::new(4, 2, vec![Vec3::ZERO; 3]),
            Err(SceneError::EmptyImage {
                width: 4,
                height: 2
            })
        );
    }

    #[test]
    fn uninitialised_image_is_rejected() {
        let image = Image::new_uninit(
            Extent3d {
                width: 4,
                height: 2,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            TextureFormat::Rgba32Float,
            RenderAssetUsages::RENDER_WORLD,
        );
        assert!(matches!(
            Equirect::from_image(&image),
            Err(SceneError::EmptyImage { .. })
        ));
    }

    #[test]
    fn float_image_is_read_as_linear_rgb() {
        let pixel: Vec<u8> = [4.0f32, 0.5, 0.25, 1.0]
            .iter()
            .flat_map(|c| c.to_le_bytes())
            .collect();
        let image = Image::new_fill(
            Extent3d {
                width: 2,
                height: 1,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            &pixel,
            TextureFormat::Rgba32Float,
            RenderAssetUsages::RENDER_WORLD,
        );
        let pano = Equirect::from_image(&image).expect("float image converts");
        assert_eq!(pano.sample(Vec3::Y), Vec3::new(4.0, 0.5, 0.25));
    }

    #[test]
    fn cubemap_image_is_a_six_layer_cube() {
        let image = cubemap_image(&split_sky(), 4);
        let size = image.texture_descriptor.size;
        assert_eq!((size.width, size.height, size.depth_or_array_layers), (4, 4, 6));
        assert_eq!(image.texture_descriptor.format, TextureFormat::Rgb9e5Ufloat);
        assert_eq!(
            image
                .texture_view_descriptor
                .as_ref()
                .and_then(|d| d.dimension),
            Some(TextureViewDimension::Cube)
        );
        assert_eq!(image.data.as_ref().map(Vec::len), Some(4 * 4 * 6 * 4));
    }

    #[test]
    fn cubemap_top_face_is_sky_and_bottom_face_is_ground() {
        let data = cubemap_texels(&split_sky(), 4);
        let texel = |face: usize, x: usize, y: usize| {
            let i = ((face * 4 + y) * 4 + x) * 4;
            unpack_rgb9e5(u32::from_le_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]))
        };
        assert_eq!(texel(2, 1, 1), Vec3::X);
        assert_eq!(texel(3, 2, 2), Vec3::Z);
    }

    // ── Installation ──────────────────────────────────────────────────────────

    #[test]
    fn install_attaches_skybox_and_environment_light() {
        let mut world = World::new();
        world.insert_resource(SceneConfig::default());
        let camera = world.spawn(SceneCamera).id();
        let bystander = world.spawn_empty().id();
        let cubemap = Handle::<Image>::default();

        let handle = cubemap.clone();
        world
            .run_system_once(
                move |mut commands: Commands,
                      cameras: Query<Entity, With<SceneCamera>>,
                      config: Res<SceneConfig>| {
                    install_environment(&mut commands, cameras.iter(), &handle, &config);
                },
            )
            .expect("install runs");

        let skybox = world.get::<Skybox>(camera).expect("skybox installed");
        assert_eq!(skybox.image.id(), cubemap.id());
        let light = world
            .get::<GeneratedEnvironmentMapLight>(camera)
            .expect("environment light installed");
        assert_eq!(light.environment_map.id(), cubemap.id());
        assert!(world.get::<Skybox>(bystander).is_none());
    }

    #[test]
    fn default_state_is_idle_and_not_installed() {
        let state = EnvironmentMap::default();
        assert!(matches!(state, EnvironmentMap::Idle));
        assert!(state.installed().is_none());
        assert!(!state.is_failed());
    }
}
