use crate::domain::ReleaseId;

/// Port hacia el proveedor de autorización/sesión.
///
/// Solo se consulta la concesión explícita de borrado; los derechos de
/// edición salen del estado del release.
pub trait AccessGrants: Send + Sync {
  fn can_delete_release(&self, release_id: ReleaseId) -> bool;
}

/// Sin concesiones explícitas: solo los borradores se pueden eliminar.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGrants;

impl AccessGrants for NoGrants {
  fn can_delete_release(&self, _release_id: ReleaseId) -> bool {
    false
  }
}
