use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::{DistributionTree, Release, ReleaseId, Track, TrackId};

#[derive(Debug, Clone, thiserror::Error)]
pub enum RepoError {
  #[error("entity not found")]
  NotFound,
  #[error("transport error: {0}")]
  Transport(String),
  #[error("rejected by backend: {0}")]
  Rejected(String),
}

/// Subconjunto arbitrario de campos para una actualización parcial.
///
/// Las claves son rutas con puntos (`metadata.primary_genre`); el adapter
/// decide cómo traducirlas al formato del backend.
pub type FieldPatch = Map<String, Value>;

/// Nueva posición de una pista en una actualización masiva.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackPosition {
  pub track_id: TrackId,
  pub position: u32,
}

/// Port hacia el API REST de releases.
///
/// El núcleo no conoce el transporte; la capa de presentación inyecta la
/// implementación. Timeouts y reintentos son responsabilidad del adapter.
#[async_trait]
pub trait ReleaseRepository: Send + Sync {
  // --- Lectura del release por cualquiera de sus direcciones ---
  async fn find_by_id(&self, id: ReleaseId) -> Result<Option<Release>, RepoError>;
  async fn find_by_public_id(&self, public_id: &str) -> Result<Option<Release>, RepoError>;
  async fn find_by_slug(&self, slug: &str) -> Result<Option<Release>, RepoError>;

  async fn update_release(&self, id: ReleaseId, patch: FieldPatch) -> Result<(), RepoError>;

  // --- Sub-recurso de pistas ---
  async fn list_tracks(&self, release_id: ReleaseId) -> Result<Vec<Track>, RepoError>;
  async fn create_track(&self, track: &Track) -> Result<Track, RepoError>;
  async fn update_track(&self, id: TrackId, patch: FieldPatch) -> Result<(), RepoError>;
  async fn delete_track(&self, id: TrackId) -> Result<(), RepoError>;
  async fn bulk_update_positions(&self, release_id: ReleaseId, positions: &[TrackPosition]) -> Result<(), RepoError>;

  /// Persiste el árbol de distribución en una única escritura y devuelve lo
  /// que quedó almacenado (el backend puede completar valores).
  async fn synchronize_distribution(
    &self,
    release_id: ReleaseId,
    tree: Option<DistributionTree>,
  ) -> Result<Option<DistributionTree>, RepoError>;
}
