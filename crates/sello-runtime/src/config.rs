use sello_config::{CONFIG_BACKEND, ConfigBackend, ConfigError, TomlConfigBackend};
use sello_core::EditorSettings;
use sello_core::domain::{PriceTier, Role, RoleCatalog};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

const SECTION: &str = "editor";

/// Sección `[editor]` de `sello.toml`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EditorConfig {
  /// Ventana de silencio antes de enviar un campo editado.
  #[serde(default = "default_quiet_period_ms")]
  pub quiet_period_ms: u64,

  /// Tarifa de los overrides que se generan para pistas nuevas.
  #[serde(default)]
  pub default_price_tier: PriceTier,

  /// Roles que exigen subtipo, con sus subtipos permitidos.
  #[serde(default = "default_role_types")]
  pub role_types: BTreeMap<String, Vec<String>>,
}

fn default_quiet_period_ms() -> u64 {
  750
}

fn default_role_types() -> BTreeMap<String, Vec<String>> {
  RoleCatalog::default()
    .typed_roles()
    .into_iter()
    .filter_map(|role| match role {
      Role::Typed { name, subtypes } => Some((name.clone(), subtypes.clone())),
      Role::Simple(_) => None,
    })
    .collect()
}

impl Default for EditorConfig {
  fn default() -> Self {
    EditorConfig {
      quiet_period_ms: default_quiet_period_ms(),
      default_price_tier: PriceTier::default(),
      role_types: default_role_types(),
    }
  }
}

impl EditorConfig {
  /// Carga `[editor]` (con defaults) y la reescribe para que el usuario vea las claves.
  pub fn load() -> Result<Self, ConfigError> {
    Self::load_from(&CONFIG_BACKEND)
  }

  pub fn save(&self) -> Result<(), ConfigError> {
    self.save_to(&CONFIG_BACKEND)
  }

  pub fn load_from(backend: &TomlConfigBackend) -> Result<Self, ConfigError> {
    let cfg: EditorConfig = backend.load_section_with_default(SECTION)?;
    backend.save_section(SECTION, &cfg)?;
    Ok(cfg)
  }

  pub fn save_to(&self, backend: &TomlConfigBackend) -> Result<(), ConfigError> {
    backend.save_section(SECTION, self)
  }
}

impl From<EditorConfig> for EditorSettings {
  fn from(cfg: EditorConfig) -> Self {
    EditorSettings {
      quiet_period: Duration::from_millis(cfg.quiet_period_ms),
      default_price_tier: cfg.default_price_tier,
      roles: RoleCatalog::new(cfg.role_types),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::tempdir;

  #[test]
  fn missing_section_is_written_back_with_defaults() {
    let tmp = tempdir().unwrap();
    let backend = TomlConfigBackend::new(tmp.path().join("sello.toml"));

    let cfg = EditorConfig::load_from(&backend).unwrap();
    assert_eq!(cfg, EditorConfig::default());

    let raw = fs::read_to_string(backend.file()).unwrap();
    assert!(raw.contains("[editor]"));
    assert!(raw.contains("quiet_period_ms = 750"));
    assert!(raw.contains("default_price_tier = \"front\""));
  }

  #[test]
  fn partial_section_keeps_user_values() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("sello.toml");
    fs::write(&path, "[editor]\nquiet_period_ms = 300\ndefault_price_tier = \"budget\"\n").unwrap();

    let cfg = EditorConfig::load_from(&TomlConfigBackend::new(path)).unwrap();
    assert_eq!(cfg.quiet_period_ms, 300);
    assert_eq!(cfg.default_price_tier, PriceTier::Budget);
    assert!(cfg.role_types.contains_key("Producer"));
  }

  #[test]
  fn converts_into_editor_settings() {
    let mut cfg = EditorConfig { quiet_period_ms: 200, ..EditorConfig::default() };
    cfg.role_types = BTreeMap::from([("Engineer".to_string(), vec!["Mixing".to_string()])]);

    let settings = EditorSettings::from(cfg);
    assert_eq!(settings.quiet_period, Duration::from_millis(200));
    assert!(settings.roles.resolve("engineer").requires_subtype());
    assert!(!settings.roles.resolve("Producer").requires_subtype());
  }
}
