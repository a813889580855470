use serde_json::Value;

use crate::domain::{FieldEntity, FieldKey, Release};
use crate::errors::EditorError;
use crate::services::coalescer::{FieldCoalescer, FieldSink};

/// Orden de artistas del release con el principal fijo en la posición 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistOrdering {
  names: Vec<String>,
}

impl ArtistOrdering {
  pub fn new(names: Vec<String>) -> Self {
    Self { names }
  }

  pub fn names(&self) -> &[String] {
    &self.names
  }

  pub fn main(&self) -> Option<&str> {
    self.names.first().map(String::as_str)
  }

  /// Artistas reordenables (todos menos el principal).
  pub fn secondaries(&self) -> &[String] {
    self.names.get(1..).unwrap_or(&[])
  }

  pub fn can_reorder(&self) -> bool {
    self.names.len() >= 2
  }

  /// Mueve un secundario de `old` a `new` (índices sobre [`secondaries`]).
  ///
  /// Devuelve `false` si no hubo cambio.
  ///
  /// [`secondaries`]: Self::secondaries
  pub fn reorder(&mut self, old: usize, new: usize) -> Result<bool, EditorError> {
    if !self.can_reorder() {
      return Ok(false);
    }

    let tail = &mut self.names[1..];
    let len = tail.len();
    for index in [old, new] {
      if index >= len {
        return Err(EditorError::IndexOutOfRange { index, len });
      }
    }
    if old == new {
      return Ok(false);
    }

    if old < new {
      tail[old..=new].rotate_left(1);
    } else {
      tail[new..=old].rotate_right(1);
    }
    Ok(true)
  }

  /// Lista serializada que se persiste como un único campo.
  pub fn to_field_value(&self) -> Value {
    Value::from(self.names.clone())
  }
}

/// Mando de reordenación de artistas.
///
/// Solo existe mientras el release es editable: con el editor bloqueado el
/// [`ReleaseEditor`](crate::services::ReleaseEditor) no lo entrega, así que
/// la UI no puede ofrecer la acción.
pub struct ArtistReorder<'a, S> {
  pub(crate) ordering: &'a mut ArtistOrdering,
  pub(crate) release: &'a mut Release,
  pub(crate) coalescer: &'a FieldCoalescer<S>,
}

impl<S> ArtistReorder<'_, S>
where
  S: FieldSink,
{
  pub fn names(&self) -> &[String] {
    self.ordering.names()
  }

  /// Reordena y, si algo cambió, persiste la lista completa.
  pub fn reorder(&mut self, old: usize, new: usize) -> Result<bool, EditorError> {
    if !self.ordering.reorder(old, new)? {
      return Ok(false);
    }

    let key = FieldKey::new(FieldEntity::Release(self.release.id), "artists");
    self.coalescer.set_field(&mut *self.release, key, self.ordering.to_field_value())?;
    Ok(true)
  }
}
