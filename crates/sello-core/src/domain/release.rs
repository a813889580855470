use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::distribution::DistributionTree;
use crate::domain::ids::{DistributionGroupId, ReleaseId};
use crate::domain::release_type::ReleaseType;

/// Release tal como lo expone el repositorio.
///
/// Un release agrupa pistas y define la información editorial y de
/// distribución: territorio, exclusividad, distribuidores y fechas.
/// `distribution` es el árbol persistido; nunca se edita a mano, lo
/// reescribe el sincronizador.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
  pub id: ReleaseId,

  /// Identificador público (URLs compartibles).
  #[serde(default)]
  pub public_id: Option<String>,

  /// Slug heredado de la versión anterior de las URLs.
  #[serde(default)]
  pub slug: Option<String>,

  #[serde(default)]
  pub title: String,

  #[serde(default)]
  pub release_type: ReleaseType,

  pub status: ReleaseStatus,

  /// Nombres de artistas del release. La posición 0 es el artista principal.
  #[serde(default)]
  pub artists: Vec<String>,

  #[serde(default)]
  pub territory: Territory,

  #[serde(default)]
  pub exclusivity: Exclusivity,

  /// Distribuidores seleccionados; cada uno es un grupo del árbol de distribución.
  #[serde(default)]
  pub distributors: Vec<Distributor>,

  #[serde(default)]
  pub distribution_notes: Option<String>,

  #[serde(default)]
  pub release_date: Option<NaiveDate>,

  #[serde(default)]
  pub preorder_date: Option<NaiveDate>,

  /// Árbol distribuidor → volumen → pista. `None` es el valor vacío canónico.
  #[serde(default)]
  pub distribution: Option<DistributionTree>,
}

impl Release {
  /// Release mínimo en borrador, útil para altas y para tests.
  pub fn draft(id: ReleaseId, title: impl Into<String>, release_type: ReleaseType) -> Self {
    Self {
      id,
      public_id: None,
      slug: None,
      title: title.into(),
      release_type,
      status: ReleaseStatus::Draft,
      artists: Vec::new(),
      territory: Territory::default(),
      exclusivity: Exclusivity::default(),
      distributors: Vec::new(),
      distribution_notes: None,
      release_date: None,
      preorder_date: None,
      distribution: None,
    }
  }
}

/// Estado del flujo de revisión/distribución.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseStatus {
  Draft,
  InReview,
  Approved,
  Distributed,
  Rejected,
  TakenDown,
}

impl fmt::Display for ReleaseStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      ReleaseStatus::Draft => "draft",
      ReleaseStatus::InReview => "in_review",
      ReleaseStatus::Approved => "approved",
      ReleaseStatus::Distributed => "distributed",
      ReleaseStatus::Rejected => "rejected",
      ReleaseStatus::TakenDown => "taken_down",
    };
    f.write_str(s)
  }
}

/// Territorios donde se distribuye el release (códigos ISO 3166-1 alpha-2).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Territory {
  #[default]
  Worldwide,
  Include(Vec<String>),
  Exclude(Vec<String>),
}

/// Exclusividad con un partner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusivity {
  #[default]
  NonExclusive,
  Partner(String),
}

/// Distribuidor seleccionado para el release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distributor {
  pub id: DistributionGroupId,
  pub name: String,
}
