use crate::domain::ReleaseStatus;
use crate::errors::EditorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
  Locked,
  Editable,
}

/// Estado de bloqueo del editor.
///
/// Editable si el release es borrador o si el usuario pidió editar. Salir de
/// `Draft` borra esa intención. El borrado es una capacidad aparte.
#[derive(Debug, Clone)]
pub struct EditLock {
  status: ReleaseStatus,
  edit_intent: bool,
  delete_grant: bool,
}

impl EditLock {
  pub fn new(status: ReleaseStatus, delete_grant: bool) -> Self {
    Self { status, edit_intent: false, delete_grant }
  }

  pub fn state(&self) -> LockState {
    if self.status == ReleaseStatus::Draft || self.edit_intent { LockState::Editable } else { LockState::Locked }
  }

  pub fn is_editable(&self) -> bool {
    self.state() == LockState::Editable
  }

  pub fn status(&self) -> ReleaseStatus {
    self.status
  }

  pub fn request_edit(&mut self) {
    self.edit_intent = true;
  }

  pub fn cancel_edit(&mut self) {
    self.edit_intent = false;
  }

  pub fn edit_intent(&self) -> bool {
    self.edit_intent
  }

  /// Registra un cambio de estado del release.
  ///
  /// Solo la salida de `Draft` borra la intención de edición; entre estados
  /// no borrador (p. ej. `Approved` → `Distributed`) se mantiene.
  pub fn on_status_change(&mut self, status: ReleaseStatus) {
    if self.status == ReleaseStatus::Draft && status != ReleaseStatus::Draft {
      self.edit_intent = false;
    }
    self.status = status;
  }

  pub fn set_delete_grant(&mut self, grant: bool) {
    self.delete_grant = grant;
  }

  /// Independiente de la intención de edición.
  pub fn can_delete(&self) -> bool {
    self.delete_grant || self.status == ReleaseStatus::Draft
  }

  pub fn ensure_editable(&self) -> Result<(), EditorError> {
    if self.is_editable() { Ok(()) } else { Err(EditorError::Locked) }
  }
}
