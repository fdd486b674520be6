//! Animated planet and asteroid belt scene
//!
//! A textured planet, a belt of tumbling asteroids that share one mesh and one
//! material, an HDR skybox that also lights the scene, and a damped orbit
//! camera, all rendered by Bevy.

pub mod asteroid;
pub mod camera;
pub mod config;
pub mod constants;
pub mod environment;
pub mod error;
pub mod lighting;
pub mod planet;
pub mod simulation;
