use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOrAssign;

use crate::domain::ids::TrackId;

/// Categorías de completitud que la UI muestra como avisos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCategory {
  Details,
  Contributors,
  Metadata,
  Audio,
  Publishing,
  Isrc,
}

impl ValidationCategory {
  pub const ALL: [ValidationCategory; 6] = [
    ValidationCategory::Details,
    ValidationCategory::Contributors,
    ValidationCategory::Metadata,
    ValidationCategory::Audio,
    ValidationCategory::Publishing,
    ValidationCategory::Isrc,
  ];
}

impl fmt::Display for ValidationCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      ValidationCategory::Details => "details",
      ValidationCategory::Contributors => "contributors",
      ValidationCategory::Metadata => "metadata",
      ValidationCategory::Audio => "audio",
      ValidationCategory::Publishing => "publishing",
      ValidationCategory::Isrc => "isrc",
    };
    f.write_str(s)
  }
}

/// Un flag por categoría; `true` significa incompleto.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationState {
  pub details: bool,
  pub contributors: bool,
  pub metadata: bool,
  pub audio: bool,
  pub publishing: bool,
  pub isrc: bool,
}

impl ValidationState {
  pub fn all_incomplete() -> Self {
    Self { details: true, contributors: true, metadata: true, audio: true, publishing: true, isrc: true }
  }

  pub fn is_incomplete(&self, category: ValidationCategory) -> bool {
    match category {
      ValidationCategory::Details => self.details,
      ValidationCategory::Contributors => self.contributors,
      ValidationCategory::Metadata => self.metadata,
      ValidationCategory::Audio => self.audio,
      ValidationCategory::Publishing => self.publishing,
      ValidationCategory::Isrc => self.isrc,
    }
  }

  pub fn is_complete(&self) -> bool {
    self.incomplete_categories().next().is_none()
  }

  pub fn incomplete_categories(&self) -> impl Iterator<Item = ValidationCategory> + '_ {
    ValidationCategory::ALL.into_iter().filter(|c| self.is_incomplete(*c))
  }
}

impl BitOrAssign for ValidationState {
  fn bitor_assign(&mut self, rhs: Self) {
    self.details |= rhs.details;
    self.contributors |= rhs.contributors;
    self.metadata |= rhs.metadata;
    self.audio |= rhs.audio;
    self.publishing |= rhs.publishing;
    self.isrc |= rhs.isrc;
  }
}

/// Estado de una pista concreta, para marcarla en la lista.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackValidation {
  pub track_id: TrackId,
  pub state: ValidationState,
}

/// Resultado del agregador: el OR de todas las pistas y el detalle por pista.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
  pub release: ValidationState,
  pub tracks: Vec<TrackValidation>,
}

impl Default for ValidationReport {
  fn default() -> Self {
    Self { release: ValidationState::all_incomplete(), tracks: Vec::new() }
  }
}
