use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Genera un newtype sobre `Uuid` con las conversiones habituales.
macro_rules! uuid_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct $name(Uuid);

    impl $name {
      /// Genera un nuevo identificador único.
      pub fn new() -> Self {
        $name(Uuid::new_v4())
      }

      pub fn from_uuid(u: Uuid) -> Self {
        $name(u)
      }

      pub fn as_uuid(&self) -> Uuid {
        self.0
      }
    }

    impl Default for $name {
      fn default() -> Self {
        Self::new()
      }
    }

    impl From<Uuid> for $name {
      fn from(u: Uuid) -> Self {
        $name(u)
      }
    }

    impl From<$name> for Uuid {
      fn from(id: $name) -> Self {
        id.0
      }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
      }
    }
  };
}

uuid_id!(
  /// Identificador interno de un release (la clave primaria del backend).
  ReleaseId
);

uuid_id!(
  /// Identificador de una pista dentro de un release.
  ///
  /// Se genera en el cliente al añadir la pista, para poder aplicar el alta
  /// de forma optimista antes de que el repositorio responda.
  TrackId
);

uuid_id!(
  /// Identificador de un distribuidor seleccionado para el release.
  ///
  /// Cada distribuidor da lugar a exactamente un `DistributionGroup`.
  DistributionGroupId
);
