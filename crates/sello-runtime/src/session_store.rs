use sello_config::{ConfigBackend, PATHS, TomlConfigBackend};
use sello_core::domain::ReleaseId;
use sello_core::ports::SessionStore;
use serde::{Deserialize, Serialize};
use tracing::warn;

const SECTION: &str = "session";

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionState {
  #[serde(default)]
  last_release_id: Option<ReleaseId>,
}

/// Recuerda el último release abierto en `state.toml`.
///
/// Los errores de disco no llegan al editor: se registran y el id recordado
/// se pierde.
pub struct TomlSessionStore {
  backend: TomlConfigBackend,
}

impl TomlSessionStore {
  pub fn new(backend: TomlConfigBackend) -> Self {
    Self { backend }
  }

  /// Store sobre el `state.toml` del directorio de datos.
  pub fn system() -> Self {
    Self::new(TomlConfigBackend::new(PATHS.state_file()))
  }
}

impl SessionStore for TomlSessionStore {
  fn load_last_release(&self) -> Option<ReleaseId> {
    match self.backend.load_section_with_default::<SessionState>(SECTION) {
      Ok(state) => state.last_release_id,
      Err(e) => {
        warn!(file = ?self.backend.file(), error = %e, "session state unreadable");
        None
      }
    }
  }

  fn save_last_release(&self, id: ReleaseId) {
    let state = SessionState { last_release_id: Some(id) };
    if let Err(e) = self.backend.save_section(SECTION, &state) {
      warn!(file = ?self.backend.file(), error = %e, "session state not saved");
    }
  }
}
