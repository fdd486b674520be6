//! Scene-specific error types.
//!
//! Setup code propagates failures through [`SceneError`] instead of
//! panicking, so a bad asset or a bad config value degrades the scene rather
//! than crashing it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crate::error::{SceneError, SceneResult};
//!
//! fn brightness(value: f32) -> SceneResult<f32> {
//!     validate_positive("skybox_brightness", value)?;
//!     Ok(value)
//! }
//! ```

use std::fmt;

/// Top-level error enum for the asteroid-belt scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneError {
    /// A procedural mesh could not be built (icosphere generation, tangent
    /// generation, or a missing vertex attribute).
    MeshConstruction {
        /// Which mesh was being built.
        mesh: &'static str,
        /// Human-readable cause.
        reason: String,
    },

    /// The decoded HDR image uses a pixel format the cubemap converter cannot
    /// read.
    UnsupportedPixelFormat {
        /// Debug rendering of the offending format.
        format: String,
    },

    /// The decoded HDR image has a zero dimension or no pixel data.
    EmptyImage {
        width: u32,
        height: u32,
    },

    /// A config value is outside its safe operating range.
    UnsafeConstant {
        /// Name of the config key (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the safe range.
        safe_range: &'static str,
    },

    /// `assets/scene.toml` is not valid TOML or has a value of the wrong type.
    ConfigParse(String),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::MeshConstruction { mesh, reason } => {
                write!(f, "failed to build {} mesh: {}", mesh, reason)
            }
            SceneError::UnsupportedPixelFormat { format } => write!(
                f,
                "environment image format {} cannot be converted to a cubemap",
                format
            ),
            SceneError::EmptyImage { width, height } => write!(
                f,
                "environment image is empty ({}x{} or missing pixel data)",
                width, height
            ),
            SceneError::UnsafeConstant {
                name,
                value,
                safe_range,
            } => write!(
                f,
                "config '{}' = {} is outside safe range {}",
                name, value, safe_range
            ),
            SceneError::ConfigParse(reason) => write!(f, "invalid scene config: {}", reason),
        }
    }
}

impl std::error::Error for SceneError {}

/// Convenience alias: a `Result` using `SceneError` as the error type.
pub type SceneResult<T> = Result<T, SceneError>;

// ── Validation helpers ────────────────────────────────────────────────────────

/// Returns an error unless `min < max` and both are finite.
///
/// Sampling ranges are half-open, so an empty range would make
/// `gen_range` panic at spawn time.
pub fn validate_range(name: &'static str, min: f32, max: f32) -> SceneResult<()> {
    if !min.is_finite() || !max.is_finite() || min >= max {
        Err(SceneError::UnsafeConstant {
            name,
            value: min,
            safe_range: "min < max, both finite",
        })
    } else {
        Ok(())
    }
}

/// Returns an error if `value` is not strictly positive.
pub fn validate_positive(name: &'static str, value: f32) -> SceneResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SceneError::UnsafeConstant {
            name,
            value,
            safe_range: "(0.0, ∞)",
        })
    }
}

/// Returns an error if `value` is negative or not finite.
pub fn validate_non_negative(name: &'static str, value: f32) -> SceneResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SceneError::UnsafeConstant {
            name,
            value,
            safe_range: "[0.0, ∞)",
        })
    }
}

/// Returns an error if the damping factor is outside `(0, 1]`.
///
/// Zero would freeze the camera; anything above one overshoots and oscillates.
pub fn validate_damping(value: f32) -> SceneResult<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(SceneError::UnsafeConstant {
            name: "orbit_damping",
            value,
            safe_range: "(0.0, 1.0]",
        })
    }
}
