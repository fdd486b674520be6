//! Asteroid belt: components, spawning, and the per-frame orbit update.
//!
//! Every asteroid shares one rock mesh and one material; only the handles are
//! cloned.  Motion is driven by [`AsteroidOrbit`], whose radius, speed and
//! lateral offset are fixed at spawn time.  Position is never stored as
//! independent state: each frame it is recomputed from the orbit angle.

use crate::config::SceneConfig;
use crate::constants::{ANGLE_MAX, ANGLE_MIN};
use crate::error::{SceneError, SceneResult};
use bevy::prelude::*;
use bevy_mesh::VertexAttributeValues;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ── Components ────────────────────────────────────────────────────────────────

/// Marker component for belt asteroids.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Asteroid;

/// Orbit state of one asteroid.
///
/// Only `angle` changes after spawn, and only through [`AsteroidOrbit::advance`].
/// The angle is kept in `f64` and never wrapped, so it stays exact enough over
/// very long sessions.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct AsteroidOrbit {
    angle: f64,
    orbital_radius: f32,
    angular_speed: f32,
    lateral_offset: f32,
}

impl AsteroidOrbit {
    pub fn new(angle: f64, orbital_radius: f32, angular_speed: f32, lateral_offset: f32) -> Self {
        Self {
            angle,
            orbital_radius,
            angular_speed,
            lateral_offset,
        }
    }

    /// Draw a fresh orbit uniformly from the configured half-open ranges.
    pub fn sample<R: Rng>(rng: &mut R, config: &SceneConfig) -> Self {
        Self {
            angle: f64::from(rng.gen_range(ANGLE_MIN..ANGLE_MAX)),
            orbital_radius: rng.gen_range(config.orbital_radius_min..config.orbital_radius_max),
            angular_speed: rng.gen_range(config.angular_speed_min..config.angular_speed_max),
            lateral_offset: rng.gen_range(config.lateral_offset_min..config.lateral_offset_max),
        }
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn orbital_radius(&self) -> f32 {
        self.orbital_radius
    }

    pub fn angular_speed(&self) -> f32 {
        self.angular_speed
    }

    pub fn lateral_offset(&self) -> f32 {
        self.lateral_offset
    }

    /// Step the orbit by one frame.
    pub fn advance(&mut self) {
        self.angle += f64::from(self.angular_speed);
    }
}

/// Cumulative Euler angles (XYZ order) of an asteroid's tumble.
///
/// Grows without bound; the rotation is periodic so no wrapping is applied.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Tumble(pub Vec3);

impl Tumble {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.0.x, self.0.y, self.0.z)
    }
}

// ── Resources ─────────────────────────────────────────────────────────────────

/// Random source for spawning and for the per-frame shimmer and tumble.
///
/// Seeded from entropy by default; [`seed_belt_rng`] reseeds it when a seed is
/// configured so whole runs can be replayed.
#[derive(Resource)]
pub struct BeltRng(pub StdRng);

impl BeltRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Default for BeltRng {
    fn default() -> Self {
        Self(StdRng::from_entropy())
    }
}

/// Handles of the single rock mesh and material every asteroid points at.
#[derive(Resource, Debug, Clone)]
pub struct BeltAssets {
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
}

// ── Motion model ──────────────────────────────────────────────────────────────

/// Frame-invariant parameters of the belt motion, read from [`SceneConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeltMotion {
    pub planet_base_y: f32,
    pub jitter_amplitude: f32,
    pub jitter_frequency: f32,
    pub tumble_rate: f32,
}

impl BeltMotion {
    pub fn from_config(config: &SceneConfig) -> Self {
        Self {
            planet_base_y: config.planet_base_y,
            jitter_amplitude: config.depth_jitter_amplitude,
            jitter_frequency: config.depth_jitter_frequency,
            tumble_rate: config.tumble_rate,
        }
    }

    /// World position of an asteroid at its current angle.
    ///
    /// `shimmer` is a uniform draw from `[0, 1)`; it scales the depth jitter
    /// and is re-drawn every frame.
    pub fn position(&self, orbit: &AsteroidOrbit, shimmer: f32) -> Vec3 {
        let sin = orbit.angle.sin() as f32;
        let cos = orbit.angle.cos() as f32;
        let wobble = (orbit.angle * f64::from(self.jitter_frequency)).sin() as f32;
        Vec3::new(
            sin * orbit.orbital_radius,
            self.planet_base_y + cos * orbit.orbital_radius,
            orbit.lateral_offset + wobble * shimmer * self.jitter_amplitude,
        )
    }

    /// Per-axis tumble increment for one frame from three uniform `[0, 1)` draws.
    pub fn tumble_step(&self, draws: Vec3) -> Vec3 {
        draws * self.tumble_rate
    }
}

// ── Geometry ──────────────────────────────────────────────────────────────────

/// Build the irregular rock shared by the whole belt.
///
/// Starts from a base icosahedron split into 60 face corners, adds one scalar
/// offset from `[-jitter, jitter)` to all three coordinates of each corner,
/// then recomputes flat normals.  Corners shared by neighbouring faces move
/// independently, so the faces separate into a jagged rock.
pub fn rock_mesh<R: Rng>(radius: f32, jitter: f32, rng: &mut R) -> SceneResult<Mesh> {
    let mut mesh = Sphere::new(radius)
        .mesh()
        .ico(0)
        .map_err(|e| SceneError::MeshConstruction {
            mesh: "rock",
            reason: e.to_string(),
        })?;
    mesh.duplicate_vertices();

    let Some(VertexAttributeValues::Float32x3(positions)) =
        mesh.attribute_mut(Mesh::ATTRIBUTE_POSITION)
    else {
        return Err(SceneError::MeshConstruction {
            mesh: "rock",
            reason: "icosahedron has no Float32x3 position attribute".into(),
        });
    };
    for position in positions.iter_mut() {
        let offset = rng.gen_range(-jitter..jitter);
        position[0] += offset;
        position[1] += offset;
        position[2] += offset;
    }

    mesh.compute_flat_normals();
    Ok(mesh)
}

/// Material shared by the whole belt: matte grey with a faint blue glow.
pub fn rock_material() -> StandardMaterial {
    StandardMaterial {
        base_color: Color::srgb_u8(0x88, 0x88, 0x88),
        perceptual_roughness: 0.8,
        metallic: 0.1,
        emissive: Color::srgb_u8(0x00, 0x00, 0x08).to_linear(),
        ..default()
    }
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Startup system: reseed [`BeltRng`] when `BELT_SEED` or `rng_seed` is set.
pub fn seed_belt_rng(config: Res<SceneConfig>, mut rng: ResMut<BeltRng>) {
    if let Some(seed) = config.resolved_seed() {
        *rng = BeltRng::seeded(seed);
        info!("Belt RNG seeded with {seed}");
    }
}

/// Startup system: build the shared rock and spawn the whole belt.
///
/// The initial transform uses the same formula as the per-frame update, so the
/// first rendered frame already sits on the orbit.
pub fn spawn_asteroid_belt(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<SceneConfig>,
    mut rng: ResMut<BeltRng>,
) {
    let rng = &mut rng.0;
    let mesh = match rock_mesh(config.rock_radius, config.rock_jitter, rng) {
        Ok(mesh) => meshes.add(mesh),
        Err(e) => {
            warn!("Asteroid belt not spawned: {e}");
            return;
        }
    };
    let material = materials.add(rock_material());
    let motion = BeltMotion::from_config(&config);

    let bundles: Vec<_> = (0..config.asteroid_count)
        .map(|_| {
            let orbit = AsteroidOrbit::sample(rng, &config);
            let translation = motion.position(&orbit, rng.gen());
            (
                Asteroid,
                orbit,
                Tumble::default(),
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                Transform::from_translation(translation),
            )
        })
        .collect();
    commands.spawn_batch(bundles);
    commands.insert_resource(BeltAssets { mesh, material });

    info!("Spawned {} asteroids", config.asteroid_count);
}

/// Advance every asteroid by one frame: orbit step, position, shimmer, tumble.
///
/// Each asteroid's update is independent of the others.
pub fn advance_asteroids_system(
    mut query: Query<(&mut AsteroidOrbit, &mut Tumble, &mut Transform), With<Asteroid>>,
    config: Res<SceneConfig>,
    mut rng: ResMut<BeltRng>,
) {
    let motion = BeltMotion::from_config(&config);
    let rng = &mut rng.0;

    for (mut orbit, mut tumble, mut transform) in query.iter_mut() {
        orbit.advance();
        transform.translation = motion.position(&orbit, rng.gen());

        let draws = Vec3::new(rng.gen(), rng.gen(), rng.gen());
        tumble.0 += motion.tumble_step(draws);
        transform.rotation = tumble.rotation();
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use std::f32::consts::TAU;
    use bevy::ecs::system::RunSystemOnce;

    fn belt_world(config: SceneConfig, seed: u64) -> World {
        let mut world = World::new();
        world.init_resource::<Assets<Mesh>>();
        world.init_resource::<Assets<StandardMaterial>>();
        world.insert_resource(config);
        world.insert_resource(BeltRng::seeded(seed));
        world
    }

    // ── AsteroidOrbit ─────────────────────────────────────────────────────────

    #[test]
    fn sampled_orbits_stay_inside_configured_ranges() {
        let config = SceneConfig::default();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..2_000 {
            let orbit = AsteroidOrbit::sample(&mut rng, &config);
            assert!((0.0..f64::from(TAU)).contains(&orbit.angle()));
            assert!((ORBITAL_RADIUS_MIN..ORBITAL_RADIUS_MAX).contains(&orbit.orbital_radius()));
            assert!((ANGULAR_SPEED_MIN..ANGULAR_SPEED_MAX).contains(&orbit.angular_speed()));
            assert!((LATERAL_OFFSET_MIN..LATERAL_OFFSET_MAX).contains(&orbit.lateral_offset()));
        }
    }

    #[test]
    fn advance_is_strictly_increasing() {
        let mut orbit = AsteroidOrbit::new(6.2, 2.8, ANGULAR_SPEED_MIN, 0.0);
        let mut previous = orbit.angle();
        for _ in 0..5_000 {
            orbit.advance();
            assert!(orbit.angle() > previous, "angle must grow every frame");
            previous = orbit.angle();
        }
        // No wrapping back into [0, 2π).
        assert!(orbit.angle() > f64::from(TAU));
    }

    #[test]
    fn advance_leaves_fixed_parameters_untouched() {
        let mut orbit = AsteroidOrbit::new(0.5, 2.75, 0.004, -0.3);
        for _ in 0..100 {
            orbit.advance();
        }
        assert_eq!(orbit.orbital_radius(), 2.75);
        assert_eq!(orbit.angular_speed(), 0.004);
        assert_eq!(orbit.lateral_offset(), -0.3);
    }

    // ── BeltMotion ────────────────────────────────────────────────────────────

    #[test]
    fn position_follows_orbit_formula() {
        let motion = BeltMotion::from_config(&SceneConfig::default());
        let orbit = AsteroidOrbit::new(1.1, 2.8, 0.005, 0.4);
        let p = motion.position(&orbit, 0.0);

        assert!((p.x - (1.1f64).sin() as f32 * 2.8).abs() < 1e-6);
        assert!((p.y - (PLANET_BASE_Y + (1.1f64).cos() as f32 * 2.8)).abs() < 1e-6);
        // Zero shimmer removes the jitter entirely.
        assert_eq!(p.z, 0.4);
    }

    #[test]
    fn depth_jitter_is_bounded_by_amplitude() {
        let motion = BeltMotion::from_config(&SceneConfig::default());
        let orbit = AsteroidOrbit::new(0.3, 2.8, 0.005, 0.1);
        for shimmer in [0.0, 0.25, 0.5, 0.999] {
            let z = motion.position(&orbit, shimmer).z;
            assert!(
                (z - 0.1).abs() <= DEPTH_JITTER_AMPLITUDE,
                "shimmer {shimmer} pushed z to {z}"
            );
        }
    }

    #[test]
    fn tumble_step_scales_draws() {
        let motion = BeltMotion::from_config(&SceneConfig::default());
        let step = motion.tumble_step(Vec3::new(1.0, 0.5, 0.0));
        assert!((step.x - TUMBLE_RATE).abs() < 1e-7);
        assert!((step.y - TUMBLE_RATE * 0.5).abs() < 1e-7);
        assert_eq!(step.z, 0.0);
    }

    // ── Geometry ──────────────────────────────────────────────────────────────

    #[test]
    fn rock_mesh_vertices_stay_within_jitter_of_the_base_radius() {
        let mut rng = StdRng::seed_from_u64(3);
        let mesh = rock_mesh(ROCK_RADIUS, ROCK_JITTER, &mut rng).expect("rock builds");
        let Some(VertexAttributeValues::Float32x3(positions)) =
            mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        else {
            panic!("rock must keep its position attribute");
        };
        // 20 faces × 3 corners once the faces are split.
        assert_eq!(positions.len(), 60);
        let limit = ROCK_RADIUS + ROCK_JITTER * 3f32.sqrt() + 1e-5;
        for p in positions {
            let length = Vec3::from_array(*p).length();
            assert!(length <= limit, "vertex {p:?} too far from centre");
        }
    }

    #[test]
    fn rock_mesh_offsets_all_three_coordinates_equally() {
        let mut base_rng = StdRng::seed_from_u64(5);
        let base = rock_mesh(ROCK_RADIUS, 1e-9, &mut base_rng).expect("base rock");
        let mut rng = StdRng::seed_from_u64(5);
        let rock = rock_mesh(ROCK_RADIUS, ROCK_JITTER, &mut rng).expect("rock");

        let (
            Some(VertexAttributeValues::Float32x3(before)),
            Some(VertexAttributeValues::Float32x3(after)),
        ) = (
            base.attribute(Mesh::ATTRIBUTE_POSITION),
            rock.attribute(Mesh::ATTRIBUTE_POSITION),
        )
        else {
            panic!("both meshes need positions");
        };
        assert_eq!(after.len(), 60, "every face corner is its own vertex");

        let mut offsets: Vec<f32> = Vec::with_capacity(after.len());
        for (a, b) in before.iter().zip(after) {
            let d = Vec3::from_array(*b) - Vec3::from_array(*a);
            assert!((d.x - d.y).abs() < 1e-5 && (d.y - d.z).abs() < 1e-5, "{d:?}");
            offsets.push(d.x);
        }

        // Each corner draws its own offset, including corners that share a
        // position on the base icosahedron.
        offsets.sort_by(f32::total_cmp);
        offsets.dedup_by(|a, b| (*a - *b).abs() < 1e-8);
        assert_eq!(offsets.len(), 60);
    }

    #[test]
    fn rock_mesh_has_normals() {
        let mut rng = StdRng::seed_from_u64(9);
        let mesh = rock_mesh(ROCK_RADIUS, ROCK_JITTER, &mut rng).expect("rock builds");
        assert!(mesh.attribute(Mesh::ATTRIBUTE_NORMAL).is_some());
    }

    // ── Spawning ──────────────────────────────────────────────────────────────

    #[test]
    fn belt_shares_one_mesh_and_one_material() {
        let mut world = belt_world(SceneConfig::default(), 1);
        world
            .run_system_once(spawn_asteroid_belt)
            .expect("spawn system runs");

        assert_eq!(world.resource::<Assets<Mesh>>().len(), 1);
        assert_eq!(world.resource::<Assets<StandardMaterial>>().len(), 1);

        let assets = world.resource::<BeltAssets>().clone();
        let mut query = world.query::<(&Mesh3d, &MeshMaterial3d<StandardMaterial>)>();
        let mut count = 0;
        for (mesh, material) in query.iter(&world) {
            assert_eq!(mesh.0.id(), assets.mesh.id());
            assert_eq!(material.0.id(), assets.material.id());
            count += 1;
        }
        assert_eq!(count, ASTEROID_COUNT);
    }

    #[test]
    fn spawned_asteroids_start_on_their_orbit() {
        let mut world = belt_world(SceneConfig::default(), 2);
        world
            .run_system_once(spawn_asteroid_belt)
            .expect("spawn system runs");

        let mut query = world.query::<(&AsteroidOrbit, &Transform)>();
        for (orbit, transform) in query.iter(&world) {
            let r = orbit.orbital_radius();
            let expected_x = orbit.angle().sin() as f32 * r;
            let expected_y = PLANET_BASE_Y + orbit.angle().cos() as f32 * r;
            assert!((transform.translation.x - expected_x).abs() < 1e-6);
            assert!((transform.translation.y - expected_y).abs() < 1e-6);
            assert!(
                (transform.translation.z - orbit.lateral_offset()).abs()
                    <= DEPTH_JITTER_AMPLITUDE
            );
        }
    }

    #[test]
    fn same_seed_spawns_same_belt() {
        let collect = |seed| {
            let mut world = belt_world(SceneConfig::default(), seed);
            world
                .run_system_once(spawn_asteroid_belt)
                .expect("spawn system runs");
            let mut query = world.query::<&AsteroidOrbit>();
            let mut orbits: Vec<AsteroidOrbit> = query.iter(&world).copied().collect();
            orbits.sort_by(|a, b| a.angle().total_cmp(&b.angle()));
            orbits
        };
        assert_eq!(collect(42), collect(42));
    }

    // ── advance_asteroids_system ──────────────────────────────────────────────

    #[test]
    fn tumble_accumulates_without_normalising() {
        let config = SceneConfig {
            asteroid_count: 1,
            ..Default::default()
        };
        let mut world = belt_world(config, 4);
        world
            .run_system_once(spawn_asteroid_belt)
            .expect("spawn system runs");

        // Expected growth is 0.02 rad per axis per frame; 2 000 frames ≈ 40 rad.
        for _ in 0..2_000 {
            world
                .run_system_once(advance_asteroids_system)
                .expect("advance system runs");
        }
        let mut query = world.query::<&Tumble>();
        let tumble = query.single(&world).expect("one asteroid");
        assert!(tumble.0.min_element() > TAU, "tumble {:?} was wrapped", tumble.0);
    }
}
