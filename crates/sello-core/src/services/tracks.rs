use tracing::debug;

use crate::domain::{AssetRef, ReleaseId, ReleaseType, Track, TrackId, TrackSource};
use crate::errors::EditorError;
use crate::ports::TrackPosition;

/// Lista de pistas de un release en orden ordinal.
///
/// Solo gestiona el estado local (optimista). Persistir, re-derivar la
/// distribución y recalcular la validación es cosa del [`ReleaseEditor`].
///
/// [`ReleaseEditor`]: crate::services::ReleaseEditor
#[derive(Debug, Clone)]
pub struct TrackCollection {
  release_id: ReleaseId,
  release_type: ReleaseType,
  tracks: Vec<Track>,
}

impl TrackCollection {
  /// Ordena por posición y renumera 1..n; las posiciones del backend pueden
  /// traer huecos tras borrados hechos en otra sesión.
  pub fn new(release_id: ReleaseId, release_type: ReleaseType, mut tracks: Vec<Track>) -> Self {
    tracks.retain(|t| t.release_id == release_id);
    tracks.sort_by_key(|t| t.position);

    let mut collection = Self { release_id, release_type, tracks };
    collection.renumber();
    collection
  }

  pub fn tracks(&self) -> &[Track] {
    &self.tracks
  }

  pub fn len(&self) -> usize {
    self.tracks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tracks.is_empty()
  }

  pub fn get(&self, id: TrackId) -> Option<&Track> {
    self.tracks.iter().find(|t| t.id == id)
  }

  pub fn get_mut(&mut self, id: TrackId) -> Option<&mut Track> {
    self.tracks.iter_mut().find(|t| t.id == id)
  }

  pub fn index_of(&self, id: TrackId) -> Option<usize> {
    self.tracks.iter().position(|t| t.id == id)
  }

  pub fn release_type(&self) -> &ReleaseType {
    &self.release_type
  }

  /// El tipo puede cambiar durante la edición; no recorta pistas existentes.
  pub fn set_release_type(&mut self, release_type: ReleaseType) {
    self.release_type = release_type;
  }

  pub fn can_add(&self) -> bool {
    self.release_type.max_tracks().is_none_or(|max| self.tracks.len() < max)
  }

  /// Añade una pista al final, en `Vol.1`.
  pub fn add(&mut self, source: TrackSource) -> Result<&Track, EditorError> {
    if let Some(max) = self.release_type.max_tracks().filter(|max| self.tracks.len() >= *max) {
      return Err(EditorError::CardinalityExceeded { release_type: self.release_type.clone(), max });
    }

    let position = self.tracks.len() as u32 + 1;
    let track = Track::new(TrackId::new(), self.release_id, position, source);
    debug!(track_id = %track.id, position, "track added");

    self.tracks.push(track);
    Ok(&self.tracks[self.tracks.len() - 1])
  }

  /// Quita la pista y devuelve las posiciones que cambiaron al cerrar el hueco.
  pub fn remove(&mut self, id: TrackId) -> Result<(Track, Vec<TrackPosition>), EditorError> {
    let index = self.index_of(id).ok_or(EditorError::TrackNotFound(id))?;
    let removed = self.tracks.remove(index);
    debug!(track_id = %id, "track removed");

    Ok((removed, self.renumber()))
  }

  /// Mueve la pista de `from` a `to` (índices 0-based) conservando el orden
  /// relativo del resto. Devuelve las posiciones que cambiaron.
  pub fn reorder(&mut self, from: usize, to: usize) -> Result<Vec<TrackPosition>, EditorError> {
    let len = self.tracks.len();
    for index in [from, to] {
      if index >= len {
        return Err(EditorError::IndexOutOfRange { index, len });
      }
    }
    if from == to {
      return Ok(Vec::new());
    }

    let track = self.tracks.remove(from);
    self.tracks.insert(to, track);
    Ok(self.renumber())
  }

  /// Cambia solo el audio; identidad y metadatos se conservan.
  pub fn replace(&mut self, id: TrackId, source: TrackSource) -> Result<Option<AssetRef>, EditorError> {
    let track = self.get_mut(id).ok_or(EditorError::TrackNotFound(id))?;
    Ok(track.asset.replace(source.asset))
  }

  fn renumber(&mut self) -> Vec<TrackPosition> {
    let mut changed = Vec::new();
    for (index, track) in self.tracks.iter_mut().enumerate() {
      let position = index as u32 + 1;
      if track.position != position {
        track.position = position;
        changed.push(TrackPosition { track_id: track.id, position });
      }
    }
    changed
  }
}
