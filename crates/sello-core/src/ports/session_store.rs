use crate::domain::ReleaseId;

/// Persistencia del "último release usado" entre sesiones.
///
/// Es opcional: sin store, el id recordado vive solo en el `SessionContext`.
pub trait SessionStore: Send + Sync {
  fn load_last_release(&self) -> Option<ReleaseId>;
  fn save_last_release(&self, id: ReleaseId);
}
