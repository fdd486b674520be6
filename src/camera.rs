//! Scene camera: spawn, damped orbit controls, and the viewport adapter.
//!
//! ## Orbit controls
//!
//! [`OrbitControls`] keeps the eye on a sphere around a target.  Input only
//! queues rotation (`theta_delta`, `phi_delta`) and zoom (`scale`); every
//! frame [`OrbitControls::update`] applies a `damping` fraction of the queued
//! rotation and decays the rest, so the camera glides to a stop instead of
//! snapping.  The radius is clamped to `[min_distance, max_distance]` on every
//! update, including the first one.
//!
//! ## Viewport
//!
//! [`Viewport`] records the latest window size and aspect ratio;
//! [`viewport_resize_system`] copies the aspect into the camera projection.

use crate::config::SceneConfig;
use crate::constants::{ORBIT_DOLLY_BASE, ORBIT_POLAR_EPSILON};
use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit};
use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};
use std::f32::consts::{PI, TAU};

/// Pixels per "line" when the platform reports scroll in pixels.
const PIXELS_PER_SCROLL_LINE: f32 = 100.0;

// ── Components & resources ────────────────────────────────────────────────────

/// Marker component for the one camera that renders the scene.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneCamera;

/// Damped spherical orbit around `target`.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct OrbitControls {
    pub target: Vec3,
    radius: f32,
    /// Azimuth around +Y, measured from +Z toward +X.
    theta: f32,
    /// Polar angle from +Y.
    phi: f32,
    theta_delta: f32,
    phi_delta: f32,
    scale: f32,
    pub damping: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl OrbitControls {
    /// Start orbiting `target` from `eye`, with limits and speeds from `config`.
    pub fn new(eye: Vec3, target: Vec3, config: &SceneConfig) -> Self {
        let offset = eye - target;
        let radius = offset.length();
        let (theta, phi) = if radius > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, PI / 2.0)
        };
        Self {
            target,
            radius,
            theta,
            phi,
            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
            damping: config.orbit_damping,
            min_distance: config.orbit_min_distance,
            max_distance: config.orbit_max_distance,
            rotate_speed: config.orbit_rotate_speed,
            zoom_speed: config.orbit_zoom_speed,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn theta(&self) -> f32 {
        self.theta
    }

    pub fn phi(&self) -> f32 {
        self.phi
    }

    /// Queue a drag of `pixels` on a viewport `viewport_height` pixels tall.
    ///
    /// A drag across the full height turns the camera one full revolution.
    pub fn rotate(&mut self, pixels: Vec2, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        self.theta_delta -= TAU * pixels.x / viewport_height * self.rotate_speed;
        self.phi_delta -= TAU * pixels.y / viewport_height * self.rotate_speed;
    }

    /// Queue a radius multiplier; values below one move the eye closer.
    pub fn dolly(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.scale *= factor;
        }
    }

    /// Queue a zoom of `steps` scroll lines; positive steps zoom in.
    pub fn zoom_steps(&mut self, steps: f32) {
        self.dolly(ORBIT_DOLLY_BASE.powf(self.zoom_speed * steps));
    }

    /// Apply one frame of damped motion and return the new eye position.
    pub fn update(&mut self) -> Vec3 {
        self.theta += self.theta_delta * self.damping;
        self.phi = (self.phi + self.phi_delta * self.damping)
            .clamp(ORBIT_POLAR_EPSILON, PI - ORBIT_POLAR_EPSILON);
        self.radius = (self.radius * self.scale).clamp(self.min_distance, self.max_distance);

        self.theta_delta *= 1.0 - self.damping;
        self.phi_delta *= 1.0 - self.damping;
        self.scale = 1.0;

        self.eye()
    }

    /// Current eye position without advancing the damping.
    pub fn eye(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        self.target
            + Vec3::new(
                self.radius * sin_phi * sin_theta,
                self.radius * cos_phi,
                self.radius * sin_phi * cos_theta,
            )
    }
}

/// Latest viewport size in logical pixels and the matching aspect ratio.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub aspect: f32,
}

impl Viewport {
    /// Record a new size.  Zero-sized (minimised) windows are ignored so the
    /// aspect never becomes NaN or infinite.
    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        if width <= 0.0 || height <= 0.0 {
            return false;
        }
        *self = Viewport {
            width,
            height,
            aspect: width / height,
        };
        true
    }
}

// ── Spawn ─────────────────────────────────────────────────────────────────────

/// Startup system: spawn the perspective camera with its orbit controls and the
/// scene's ambient light.
pub fn spawn_camera(mut commands: Commands, config: Res<SceneConfig>) {
    let eye = Vec3::from_array(config.camera_start);
    let [r, g, b] = config.ambient_color;
    commands.spawn((
        SceneCamera,
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: config.camera_fov_degrees.to_radians(),
            near: config.camera_near,
            far: config.camera_far,
            ..default()
        }),
        Transform::from_translation(eye).looking_at(Vec3::ZERO, Vec3::Y),
        OrbitControls::new(eye, Vec3::ZERO, &config),
        AmbientLight {
            color: Color::srgb_u8(r, g, b),
            brightness: config.ambient_brightness,
            ..default()
        },
        Name::new("Scene Camera"),
    ));
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Queue orbit input: left-drag or one-finger drag rotates, the scroll wheel or
/// a two-finger pinch zooms.
pub fn orbit_input_system(
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    touches: Res<Touches>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut query: Query<&mut OrbitControls, With<SceneCamera>>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let Ok(mut controls) = query.single_mut() else {
        return;
    };
    let height = window.height();

    if mouse_buttons.pressed(MouseButton::Left) && mouse_motion.delta != Vec2::ZERO {
        controls.rotate(mouse_motion.delta, height);
    }

    let steps = match mouse_scroll.unit {
        MouseScrollUnit::Line => mouse_scroll.delta.y,
        MouseScrollUnit::Pixel => mouse_scroll.delta.y / PIXELS_PER_SCROLL_LINE,
    };
    if steps != 0.0 {
        controls.zoom_steps(steps);
    }

    let active: Vec<_> = touches.iter().collect();
    match active.as_slice() {
        [touch] => controls.rotate(touch.delta(), height),
        [a, b] => {
            let before = a.previous_position().distance(b.previous_position());
            let after = a.position().distance(b.position());
            if before > 0.0 && after > 0.0 {
                // Fingers spreading apart shrink the radius.
                controls.dolly(before / after);
            }
        }
        _ => {}
    }
}

/// Advance the damped orbit and write the camera transform.
pub fn orbit_controls_system(
    mut query: Query<(&mut OrbitControls, &mut Transform), With<SceneCamera>>,
) {
    for (mut controls, mut transform) in query.iter_mut() {
        let eye = controls.update();
        *transform = Transform::from_translation(eye).looking_at(controls.target, Vec3::Y);
    }
}

/// Startup system: seed [`Viewport`] from the primary window.
pub fn init_viewport(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut viewport: ResMut<Viewport>,
) {
    if let Ok(window) = windows.single() {
        viewport.resize(window.width(), window.height());
    }
}

/// Recompute the projection aspect ratio after the window is resized.
///
/// Only the last resize of the frame matters; repeating the same size
/// reproduces the same configuration.
pub fn viewport_resize_system(
    mut resized: MessageReader<WindowResized>,
    mut viewport: ResMut<Viewport>,
    mut cameras: Query<&mut Projection, With<SceneCamera>>,
) {
    let mut changed = false;
    for event in resized.read() {
        changed |= viewport.resize(event.width, event.height);
    }
    if !changed {
        return;
    }

    for mut projection in cameras.iter_mut() {
        if let Projection::Perspective(perspective) = &mut *projection {
            perspective.aspect_ratio = viewport.aspect;
        }
    }
    debug!(
        "Viewport resized to {}x{} (aspect {:.3})",
        viewport.width, viewport.height, viewport.aspect
    );
}

// ── Unit tests ────────────────────────────────────────────────────────────────
