use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

use crate::domain::ids::{ReleaseId, TrackId};
use crate::errors::FieldError;

/// Entidad a la que pertenece un campo editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldEntity {
  Release(ReleaseId),
  Track(TrackId),
}

impl FieldEntity {
  /// Campos que el editor no escribe vía `set_field`: identidad, orden,
  /// audio y el árbol derivado tienen operaciones propias.
  pub fn is_read_only(&self, field: &str) -> bool {
    let root = field.split('.').next().unwrap_or(field);
    match self {
      FieldEntity::Release(_) => matches!(root, "id" | "status" | "distribution"),
      FieldEntity::Track(_) => matches!(root, "id" | "release_id" | "position" | "asset"),
    }
  }
}

impl fmt::Display for FieldEntity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FieldEntity::Release(id) => write!(f, "release:{id}"),
      FieldEntity::Track(id) => write!(f, "track:{id}"),
    }
  }
}

/// Clave de coalescencia: una escritura pendiente como máximo por clave.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldKey {
  pub entity: FieldEntity,
  /// Ruta con puntos para campos anidados (`metadata.primary_genre`).
  pub field: String,
}

impl FieldKey {
  pub fn new(entity: FieldEntity, field: impl Into<String>) -> Self {
    Self { entity, field: field.into() }
  }
}

impl fmt::Display for FieldKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}#{}", self.entity, self.field)
  }
}

/// Aplica `value` en la ruta `path` de `target` pasando por su forma JSON.
///
/// La ruta debe existir en la forma serializada; si el valor no encaja en el
/// tipo, `target` queda intacto.
pub fn apply_field<T>(target: &mut T, path: &str, value: Value) -> Result<(), FieldError>
where
  T: Serialize + DeserializeOwned,
{
  let decode_err = |e: serde_json::Error| FieldError::Decode { field: path.to_string(), reason: e.to_string() };

  let mut root = serde_json::to_value(&*target).map_err(decode_err)?;
  let mut segments = path.split('.').peekable();
  let mut cursor = &mut root;
  let mut walked = String::new();

  while let Some(segment) = segments.next() {
    let object = cursor.as_object_mut().ok_or_else(|| FieldError::NotAnObject(walked.clone()))?;

    if segments.peek().is_none() {
      if !object.contains_key(segment) {
        return Err(FieldError::UnknownField(path.to_string()));
      }
      object.insert(segment.to_string(), value);
      break;
    }

    cursor = object.get_mut(segment).ok_or_else(|| FieldError::UnknownField(path.to_string()))?;
    if !walked.is_empty() {
      walked.push('.');
    }
    walked.push_str(segment);
  }

  *target = serde_json::from_value(root).map_err(decode_err)?;
  Ok(())
}
