use directories::ProjectDirs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("toml error: {0}")]
  Toml(#[from] toml::de::Error),
  #[error("directories error: could not determine home directory")]
  Directories,
  #[error("other: {0}")]
  Other(String),
}

/// Directorios donde Sello guarda configuración y estado de sesión.
#[derive(Debug, Clone)]
pub struct SelloPaths {
  pub base_dir: PathBuf,
  pub config_dir: PathBuf,
  pub data_dir: PathBuf,
}

const BASE_DIR_ENV: &str = "SELLO_BASE_DIR";

impl SelloPaths {
  /// Usa `SELLO_BASE_DIR` (modo portable) o los directorios de la plataforma,
  /// y crea los que falten.
  pub fn detect() -> Result<Self, ConfigError> {
    let paths = match std::env::var_os(BASE_DIR_ENV) {
      Some(base) => Self::portable(PathBuf::from(base)),
      None => Self::platform()?,
    };

    std::fs::create_dir_all(&paths.config_dir)?;
    std::fs::create_dir_all(&paths.data_dir)?;
    Ok(paths)
  }

  /// Todo bajo un mismo directorio: `config/` y `data/`.
  pub fn portable(base_dir: PathBuf) -> Self {
    Self { config_dir: base_dir.join("config"), data_dir: base_dir.join("data"), base_dir }
  }

  fn platform() -> Result<Self, ConfigError> {
    let dirs = ProjectDirs::from("com", "sello", "sello").ok_or(ConfigError::Directories)?;
    Ok(Self {
      base_dir: dirs.config_dir().to_path_buf(),
      config_dir: dirs.config_dir().to_path_buf(),
      data_dir: dirs.data_dir().to_path_buf(),
    })
  }

  pub fn config_file(&self) -> PathBuf {
    self.config_dir.join("sello.toml")
  }

  /// Estado que sobrevive entre sesiones del editor (p. ej. el último release abierto).
  pub fn state_file(&self) -> PathBuf {
    self.data_dir.join("state.toml")
  }
}
