// crates/sello-core/src/errors.rs
use thiserror::Error;

use crate::domain::{DistributionGroupId, ReleaseType, TrackId};

/// Error de las operaciones del editor de releases.
///
/// Las capas superiores (UI, bindings) deberían mapear este error a mensajes
/// de usuario. Los fallos de escritura de fondo nunca llegan aquí: se registran
/// con `tracing` y el estado optimista se conserva.
#[derive(Debug, Error)]
pub enum EditorError {
  #[error("release is locked for editing")]
  Locked,

  #[error("a {release_type} release holds at most {max} track(s)")]
  CardinalityExceeded { release_type: ReleaseType, max: usize },

  #[error("track {0} not found")]
  TrackNotFound(TrackId),

  #[error("distribution group {0} not found")]
  GroupNotFound(DistributionGroupId),

  #[error("volume {0} not found")]
  VolumeNotFound(String),

  #[error("index {index} out of range for {len} item(s)")]
  IndexOutOfRange { index: usize, len: usize },

  #[error("field error: {0}")]
  Field(#[from] FieldError),

  #[error("repository error: {0}")]
  Repository(String),

  #[error("release not found")]
  NotFound,

  #[error("resolution superseded by a newer request")]
  Superseded,
}

/// Error al aplicar un valor de campo sobre el estado local.
#[derive(Debug, Error)]
pub enum FieldError {
  #[error("unknown field `{0}`")]
  UnknownField(String),

  #[error("field `{0}` is not editable")]
  ReadOnly(String),

  #[error("`{0}` is not an object")]
  NotAnObject(String),

  #[error("invalid value for `{field}`: {reason}")]
  Decode { field: String, reason: String },
}
