//! Runtime scene configuration loaded from `assets/scene.toml`.
//!
//! [`SceneConfig`] is a Bevy [`Resource`] that mirrors every constant in
//! [`crate::constants`].  At startup, [`load_scene_config`] reads
//! `assets/scene.toml` and overwrites the defaults with any values present in
//! the file.  Missing keys fall back to the compile-time defaults, so a minimal
//! TOML can override just the values you care about.
//!
//! ## Usage in systems
//!
//! Add `config: Res<SceneConfig>` to any system parameter list and read values
//! with `config.asteroid_count`, `config.orbit_damping`, etc.
//!
//! Keep `src/constants.rs` in sync: it remains the **authoritative default**
//! source used by `SceneConfig::default()`.

use crate::constants::*;
use crate::error::{
    validate_damping, validate_non_negative, validate_positive, validate_range, SceneError,
    SceneResult,
};
use bevy::prelude::*;
use serde::Deserialize;

/// Runtime-tunable scene configuration.
///
/// All fields default to the corresponding compile-time constant from
/// `src/constants.rs`.  Override any subset in `assets/scene.toml`.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    // ── Asteroid Belt ─────────────────────────────────────────────────────────
    pub asteroid_count: usize,
    pub orbital_radius_min: f32,
    pub orbital_radius_max: f32,
    pub angular_speed_min: f32,
    pub angular_speed_max: f32,
    pub lateral_offset_min: f32,
    pub lateral_offset_max: f32,
    pub depth_jitter_amplitude: f32,
    pub depth_jitter_frequency: f32,
    pub tumble_rate: f32,
    pub rock_radius: f32,
    pub rock_jitter: f32,
    /// Fixed seed for every random draw.  `None` seeds from entropy unless
    /// `BELT_SEED` is set.
    pub rng_seed: Option<u64>,

    // ── Planet ────────────────────────────────────────────────────────────────
    pub planet_radius: f32,
    pub planet_segments: u32,
    pub planet_base_y: f32,
    pub planet_yaw_rate: f32,
    pub planet_roll_rate: f32,
    pub planet_bump_scale: f32,

    // ── Camera ────────────────────────────────────────────────────────────────
    pub camera_fov_degrees: f32,
    pub camera_near: f32,
    pub camera_far: f32,
    pub camera_start: [f32; 3],

    // ── Orbit Controls ────────────────────────────────────────────────────────
    pub orbit_damping: f32,
    pub orbit_min_distance: f32,
    pub orbit_max_distance: f32,
    pub orbit_rotate_speed: f32,
    pub orbit_zoom_speed: f32,

    // ── Lighting ──────────────────────────────────────────────────────────────
    pub sun_color: [u8; 3],
    pub sun_illuminance: f32,
    pub sun_position: [f32; 3],
    pub shadow_map_size: usize,
    pub shadow_near: f32,
    pub shadow_far: f32,
    pub ambient_color: [u8; 3],
    pub ambient_brightness: f32,
    pub show_light_helper: bool,

    // ── Environment ───────────────────────────────────────────────────────────
    pub skybox_brightness: f32,
    pub environment_intensity: f32,
    pub cubemap_face_size: u32,

    // ── Assets ────────────────────────────────────────────────────────────────
    pub environment_path: String,
    pub planet_color_path: String,
    pub planet_bump_path: String,
    pub planet_normal_path: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            // Asteroid Belt
            asteroid_count: ASTEROID_COUNT,
            orbital_radius_min: ORBITAL_RADIUS_MIN,
            orbital_radius_max: ORBITAL_RADIUS_MAX,
            angular_speed_min: ANGULAR_SPEED_MIN,
            angular_speed_max: ANGULAR_SPEED_MAX,
            lateral_offset_min: LATERAL_OFFSET_MIN,
            lateral_offset_max: LATERAL_OFFSET_MAX,
            depth_jitter_amplitude: DEPTH_JITTER_AMPLITUDE,
            depth_jitter_frequency: DEPTH_JITTER_FREQUENCY,
            tumble_rate: TUMBLE_RATE,
            rock_radius: ROCK_RADIUS,
            rock_jitter: ROCK_JITTER,
            rng_seed: None,
            // Planet
            planet_radius: PLANET_RADIUS,
            planet_segments: PLANET_SEGMENTS,
            planet_base_y: PLANET_BASE_Y,
            planet_yaw_rate: PLANET_YAW_RATE,
            planet_roll_rate: PLANET_ROLL_RATE,
            planet_bump_scale: PLANET_BUMP_SCALE,
            // Camera
            camera_fov_degrees: CAMERA_FOV_DEGREES,
            camera_near: CAMERA_NEAR,
            camera_far: CAMERA_FAR,
            camera_start: CAMERA_START,
            // Orbit Controls
            orbit_damping: ORBIT_DAMPING,
            orbit_min_distance: ORBIT_MIN_DISTANCE,
            orbit_max_distance: ORBIT_MAX_DISTANCE,
            orbit_rotate_speed: ORBIT_ROTATE_SPEED,
            orbit_zoom_speed: ORBIT_ZOOM_SPEED,
            // Lighting
            sun_color: SUN_COLOR,
            sun_illuminance: SUN_ILLUMINANCE,
            sun_position: SUN_POSITION,
            shadow_map_size: SHADOW_MAP_SIZE,
            shadow_near: SHADOW_NEAR,
            shadow_far: SHADOW_FAR,
            ambient_color: AMBIENT_COLOR,
            ambient_brightness: AMBIENT_BRIGHTNESS,
            show_light_helper: true,
            // Environment
            skybox_brightness: SKYBOX_BRIGHTNESS,
            environment_intensity: ENVIRONMENT_INTENSITY,
            cubemap_face_size: CUBEMAP_FACE_SIZE,
            // Assets
            environment_path: ENVIRONMENT_PATH.to_string(),
            planet_color_path: PLANET_COLOR_PATH.to_string(),
            planet_bump_path: PLANET_BUMP_PATH.to_string(),
            planet_normal_path: PLANET_NORMAL_PATH.to_string(),
        }
    }
}

impl SceneConfig {
    /// Parse a TOML document on top of the compiled defaults and validate it.
    pub fn from_toml(contents: &str) -> SceneResult<Self> {
        let config: SceneConfig =
            toml::from_str(contents).map_err(|e| SceneError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would panic at spawn time or produce a broken scene.
    pub fn validate(&self) -> SceneResult<()> {
        if self.asteroid_count == 0 {
            return Err(SceneError::UnsafeConstant {
                name: "asteroid_count",
                value: 0.0,
                safe_range: "[1, ∞)",
            });
        }
        validate_range(
            "orbital_radius",
            self.orbital_radius_min,
            self.orbital_radius_max,
        )?;
        validate_range(
            "angular_speed",
            self.angular_speed_min,
            self.angular_speed_max,
        )?;
        // Zero or negative speeds would stall or reverse an orbit.
        validate_positive("angular_speed_min", self.angular_speed_min)?;
        validate_range(
            "lateral_offset",
            self.lateral_offset_min,
            self.lateral_offset_max,
        )?;
        validate_positive("rock_radius", self.rock_radius)?;
        validate_positive("rock_jitter", self.rock_jitter)?;
        validate_positive("planet_radius", self.planet_radius)?;
        validate_positive("camera_fov_degrees", self.camera_fov_degrees)?;
        validate_range("camera_clip", self.camera_near, self.camera_far)?;
        validate_positive("camera_near", self.camera_near)?;
        validate_damping(self.orbit_damping)?;
        validate_range(
            "orbit_distance",
            self.orbit_min_distance,
            self.orbit_max_distance,
        )?;
        validate_positive("orbit_min_distance", self.orbit_min_distance)?;
        validate_non_negative("shadow_near", self.shadow_near)?;
        validate_range("shadow_clip", self.shadow_near, self.shadow_far)?;
        if self.shadow_map_size == 0 {
            return Err(SceneError::UnsafeConstant {
                name: "shadow_map_size",
                value: 0.0,
                safe_range: "[1, ∞)",
            });
        }
        if self.cubemap_face_size == 0 {
            return Err(SceneError::UnsafeConstant {
                name: "cubemap_face_size",
                value: 0.0,
                safe_range: "[1, ∞)",
            });
        }
        if self.planet_segments < 3 {
            return Err(SceneError::UnsafeConstant {
                name: "planet_segments",
                value: self.planet_segments as f32,
                safe_range: "[3, ∞)",
            });
        }
        Ok(())
    }

    /// Seed for [`crate::asteroid::BeltRng`]: the `BELT_SEED` env var wins over
    /// the config file.
    pub fn resolved_seed(&self) -> Option<u64> {
        self.seed_with_override(std::env::var(SEED_ENV_VAR).ok().as_deref())
    }

    /// `raw` wins when it parses as a `u64`; anything else falls back to
    /// `rng_seed`.
    pub fn seed_with_override(&self, raw: Option<&str>) -> Option<u64> {
        raw.and_then(|raw| raw.trim().parse().ok()).or(self.rng_seed)
    }
}

/// Startup system: attempt to load `assets/scene.toml` and overwrite the
/// `SceneConfig` resource with any values present in the file.
///
/// Missing keys retain their compiled defaults.  Parse and validation errors
/// are logged but do not abort startup.  A missing file is not an error.
pub fn load_scene_config(mut config: ResMut<SceneConfig>) {
    let path = CONFIG_PATH;
    match std::fs::read_to_string(path) {
        Ok(contents) => match SceneConfig::from_toml(&contents) {
            Ok(loaded) => {
                *config = loaded;
                info!("Loaded scene config from {path}");
            }
            Err(e) => {
                warn!("Failed to load {path}: {e}; using defaults");
            }
        },
        Err(_) => {
            info!("No {path} found; using compiled defaults");
        }
    }
}
