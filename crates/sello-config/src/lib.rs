mod backend;
mod io;
mod paths;

pub use backend::{ConfigBackend, TomlConfigBackend};
pub use io::atomic_write_str;
pub use paths::{ConfigError, SelloPaths};

use once_cell::sync::Lazy;

/// Directorios resueltos al primer acceso.
pub static PATHS: Lazy<SelloPaths> = Lazy::new(|| SelloPaths::detect().expect("failed to init SelloPaths"));

/// `sello.toml`, editable por el usuario.
pub static CONFIG_BACKEND: Lazy<TomlConfigBackend> =
  Lazy::new(|| TomlConfigBackend::new(PATHS.config_file()));

