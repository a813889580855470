use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Tipo de lanzamiento.
///
/// Sigue la clasificación clásica de la industria (Album, EP, Single…) y admite
/// valores no estándar mediante [`ReleaseType::Custom`]. El tipo decide cuántas
/// pistas puede contener el release (ver [`ReleaseType::max_tracks`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseType {
  Album,
  #[serde(rename = "ep")]
  EP,
  Single,
  Compilation,
  /// Valor no estándar recibido del backend.
  Custom(String),
}

impl ReleaseType {
  /// Número máximo de pistas; `None` significa sin límite.
  pub fn max_tracks(&self) -> Option<usize> {
    match self {
      ReleaseType::Single => Some(1),
      _ => None,
    }
  }
}

impl Default for ReleaseType {
  fn default() -> Self {
    ReleaseType::Album
  }
}

impl FromStr for ReleaseType {
  type Err = std::convert::Infallible;

  /// Parsear nunca falla: lo desconocido acaba en `Custom`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let rt = match s.trim().to_lowercase().as_str() {
      "album" | "lp" => ReleaseType::Album,
      "ep" => ReleaseType::EP,
      "single" => ReleaseType::Single,
      "compilation" => ReleaseType::Compilation,
      _ => ReleaseType::Custom(s.to_string()),
    };

    Ok(rt)
  }
}

impl fmt::Display for ReleaseType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseType::Album => write!(f, "Album"),
      ReleaseType::EP => write!(f, "EP"),
      ReleaseType::Single => write!(f, "Single"),
      ReleaseType::Compilation => write!(f, "Compilation"),
      ReleaseType::Custom(s) => write!(f, "{s}"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_singles_are_bounded() {
    assert_eq!(ReleaseType::Single.max_tracks(), Some(1));
    assert_eq!(ReleaseType::Album.max_tracks(), None);
    assert_eq!("  single ".parse::<ReleaseType>().unwrap(), ReleaseType::Single);
    assert_eq!("Bootleg".parse::<ReleaseType>().unwrap(), ReleaseType::Custom("Bootleg".into()));
  }
}
