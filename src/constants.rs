//! Centralised scene constants.
//!
//! Every tuneable value lives here so it can be found and modified in one
//! place.  [`crate::config::SceneConfig::default`] mirrors these values; any
//! subset can be overridden at runtime from `assets/scene.toml`.

use std::f32::consts::TAU;

// ── Asteroid Belt ─────────────────────────────────────────────────────────────

/// Number of asteroids spawned at startup.  Never changes afterwards.
pub const ASTEROID_COUNT: usize = 500;

/// Orbit angle sampling range (radians), half-open.
pub const ANGLE_MIN: f32 = 0.0;
pub const ANGLE_MAX: f32 = TAU;

/// Orbital radius sampling range (world units), half-open.
pub const ORBITAL_RADIUS_MIN: f32 = 2.7;
pub const ORBITAL_RADIUS_MAX: f32 = 2.9;

/// Angular speed sampling range (radians per frame), half-open.
///
/// The lower bound must stay strictly positive: a zero speed would freeze an
/// asteroid and break the strictly-increasing angle property.
pub const ANGULAR_SPEED_MIN: f32 = 0.002;
pub const ANGULAR_SPEED_MAX: f32 = 0.010;

/// Lateral (depth-axis) offset sampling range, half-open.
pub const LATERAL_OFFSET_MIN: f32 = -0.6;
pub const LATERAL_OFFSET_MAX: f32 = 0.6;

/// Amplitude of the per-frame depth shimmer.
pub const DEPTH_JITTER_AMPLITUDE: f32 = 0.005;

/// Multiplier applied to the orbit angle inside the shimmer sine.
pub const DEPTH_JITTER_FREQUENCY: f32 = 7.0;

/// Upper bound of the random tumble increment per axis per frame (radians).
pub const TUMBLE_RATE: f32 = 0.04;

// ── Rock Geometry ─────────────────────────────────────────────────────────────

/// Radius of the base icosahedron shared by every asteroid.
pub const ROCK_RADIUS: f32 = 0.022;

/// Half-width of the scalar vertex displacement applied once to the rock mesh.
///
/// Each vertex receives one offset from `[-ROCK_JITTER, ROCK_JITTER)` added to
/// all three coordinates.
pub const ROCK_JITTER: f32 = 0.025;

// ── Planet ────────────────────────────────────────────────────────────────────

pub const PLANET_RADIUS: f32 = 2.0;
pub const PLANET_SEGMENTS: u32 = 128;

/// Vertical offset of the planet centre; the belt orbits around this height.
pub const PLANET_BASE_Y: f32 = -1.7;

/// Rotation increments per frame about the Y and Z axes.
pub const PLANET_YAW_RATE: f32 = 0.001;
pub const PLANET_ROLL_RATE: f32 = 0.001;

/// Parallax depth scale used for the bump texture.
pub const PLANET_BUMP_SCALE: f32 = 0.03;

// ── Camera ────────────────────────────────────────────────────────────────────

/// Vertical field of view in degrees.  Narrow on purpose: the camera sits far
/// away and the belt fills the frame like a telephoto shot.
pub const CAMERA_FOV_DEGREES: f32 = 8.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 10_000.0;
pub const CAMERA_START: [f32; 3] = [0.0, 100.0, 200.0];

// ── Orbit Controls ────────────────────────────────────────────────────────────

/// Fraction of the pending rotation applied each frame.
pub const ORBIT_DAMPING: f32 = 0.1;
pub const ORBIT_MIN_DISTANCE: f32 = 3.0;
pub const ORBIT_MAX_DISTANCE: f32 = 20.0;
pub const ORBIT_ROTATE_SPEED: f32 = 1.0;
pub const ORBIT_ZOOM_SPEED: f32 = 1.0;

/// Dolly factor per scroll step at `ORBIT_ZOOM_SPEED = 1`.
pub const ORBIT_DOLLY_BASE: f32 = 0.95;

/// Keeps the polar angle away from the poles so `looking_at` stays defined.
pub const ORBIT_POLAR_EPSILON: f32 = 1e-4;

// ── Lighting ──────────────────────────────────────────────────────────────────

pub const SUN_COLOR: [u8; 3] = [0xff, 0xee, 0xee];
pub const SUN_ILLUMINANCE: f32 = 10_500.0;
pub const SUN_POSITION: [f32; 3] = [5.0, 10.0, 7.0];
pub const SHADOW_MAP_SIZE: usize = 2048;
pub const SHADOW_NEAR: f32 = 1.0;
pub const SHADOW_FAR: f32 = 20.0;

pub const AMBIENT_COLOR: [u8; 3] = [0x22, 0x22, 0x22];
pub const AMBIENT_BRIGHTNESS: f32 = 80.0;

// ── Environment ───────────────────────────────────────────────────────────────

pub const SKYBOX_BRIGHTNESS: f32 = 1000.0;
pub const ENVIRONMENT_INTENSITY: f32 = 900.0;

/// Edge length of each generated cubemap face, in texels.
pub const CUBEMAP_FACE_SIZE: u32 = 512;

// ── Assets ────────────────────────────────────────────────────────────────────

pub const ENVIRONMENT_PATH: &str = "static/space.hdr";
pub const PLANET_COLOR_PATH: &str = "static/mars_color.jpg";
pub const PLANET_BUMP_PATH: &str = "static/mars_bump.jpg";
pub const PLANET_NORMAL_PATH: &str = "static/mars_normal.jpg";

/// Runtime config file, relative to the working directory.
pub const CONFIG_PATH: &str = "assets/scene.toml";

/// Environment variable that pins the belt RNG seed.
pub const SEED_ENV_VAR: &str = "BELT_SEED";
