use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::ids::{DistributionGroupId, TrackId};
use crate::domain::release::{Exclusivity, Territory};

/// Árbol distribuidor → volumen → pista tal como se persiste.
///
/// El valor vacío canónico no es un árbol sin pistas sino la ausencia de
/// árbol (`Option::None` en [`crate::domain::release::Release::distribution`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistributionTree {
  pub groups: Vec<DistributionGroup>,
}

impl DistributionTree {
  pub fn group(&self, id: DistributionGroupId) -> Option<&DistributionGroup> {
    self.groups.iter().find(|g| g.id == id)
  }

  pub fn group_mut(&mut self, id: DistributionGroupId) -> Option<&mut DistributionGroup> {
    self.groups.iter_mut().find(|g| g.id == id)
  }

  /// `true` si ningún volumen de ningún grupo contiene pistas.
  pub fn has_no_tracks(&self) -> bool {
    self.groups.iter().all(|g| g.volumes.iter().all(|v| v.tracks.is_empty()))
  }

  /// Pares (grupo, pista) en orden de recorrido.
  pub fn entries(&self) -> impl Iterator<Item = (DistributionGroupId, &VolumeTrack)> {
    self.groups.iter().flat_map(|g| g.volumes.iter().flat_map(move |v| v.tracks.iter().map(move |t| (g.id, t))))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionGroup {
  pub id: DistributionGroupId,
  pub name: String,
  /// Copia del territorio del release; se re-estampa en cada sincronización.
  pub territory: Territory,
  /// Copia de la exclusividad del release; se re-estampa en cada sincronización.
  pub exclusivity: Exclusivity,
  pub volumes: Vec<Volume>,
}

impl DistributionGroup {
  pub fn volume_mut(&mut self, label: VolumeLabel) -> Option<&mut Volume> {
    self.volumes.iter_mut().find(|v| v.label == label)
  }

  pub fn entry_mut(&mut self, track_id: TrackId) -> Option<&mut VolumeTrack> {
    self.volumes.iter_mut().flat_map(|v| v.tracks.iter_mut()).find(|t| t.track_id == track_id)
  }
}

/// Volumen derivado: nunca se crea ni se edita de forma independiente.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
  pub label: VolumeLabel,
  pub tracks: Vec<VolumeTrack>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeTrack {
  pub track_id: TrackId,
  /// Número (1..n) dentro del volumen, según el orden ordinal de las pistas.
  pub number: u32,
  #[serde(rename = "override")]
  pub overrides: TrackOverride,
}

/// Etiqueta de volumen `Vol.N`, con N ≥ 1. Se ordena por N.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VolumeLabel(u32);

impl VolumeLabel {
  pub fn new(number: u32) -> Option<Self> {
    (number >= 1).then_some(Self(number))
  }

  pub fn number(&self) -> u32 {
    self.0
  }

  /// Parsea la etiqueta; cualquier cosa ilegible se considera `Vol.1`.
  pub fn parse_or_default(raw: &str) -> Self {
    raw.parse().unwrap_or_default()
  }
}

impl Default for VolumeLabel {
  fn default() -> Self {
    Self(1)
  }
}

impl FromStr for VolumeLabel {
  type Err = String;

  /// Acepta `Vol.2`, `vol 2`, `Vol. 2` y `VOL2`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    let rest = trimmed
      .get(..3)
      .filter(|prefix| prefix.eq_ignore_ascii_case("vol"))
      .map(|_| &trimmed[3..])
      .ok_or_else(|| format!("not a volume label: {s:?}"))?;

    let digits = rest.trim_start_matches('.').trim();
    let number: u32 = digits.parse().map_err(|_| format!("not a volume label: {s:?}"))?;

    VolumeLabel::new(number).ok_or_else(|| format!("volume numbers start at 1: {s:?}"))
  }
}

impl TryFrom<String> for VolumeLabel {
  type Error = String;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<VolumeLabel> for String {
  fn from(label: VolumeLabel) -> Self {
    label.to_string()
  }
}

impl fmt::Display for VolumeLabel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Vol.{}", self.0)
  }
}

/// Ajustes de una pista específicos de un distribuidor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackOverride {
  pub price_tier: PriceTier,
  #[serde(default)]
  pub preorder_date: Option<NaiveDate>,
  #[serde(default)]
  pub release_date: Option<NaiveDate>,
  #[serde(default)]
  pub instant_grat_date: Option<NaiveDate>,
  /// Permanent download.
  pub pd: Availability,
  /// Extended-term usage.
  pub etu: Availability,
  /// Ad-supported streaming.
  pub adss: Availability,
  /// User-generated content.
  pub ugc: Availability,
}

impl TrackOverride {
  /// Override sintetizado para un par (grupo, pista) que aún no tenía uno.
  ///
  /// Las fechas quedan vacías (heredan las del release) y cada flag toma la
  /// primera opción de su enumeración.
  pub fn synthesized(price_tier: PriceTier) -> Self {
    Self {
      price_tier,
      preorder_date: None,
      release_date: None,
      instant_grat_date: None,
      pd: Availability::FIRST,
      etu: Availability::FIRST,
      adss: Availability::FIRST,
      ugc: Availability::FIRST,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
  Budget,
  Mid,
  #[default]
  Front,
  Premium,
}

impl FromStr for PriceTier {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "budget" => Ok(PriceTier::Budget),
      "mid" => Ok(PriceTier::Mid),
      "front" => Ok(PriceTier::Front),
      "premium" => Ok(PriceTier::Premium),
      other => Err(format!("unknown price tier: {other}")),
    }
  }
}

/// Opciones de los flags PD/ETU/AdSS/UGC, en el orden en que se ofrecen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
  Allowed,
  Blocked,
}

impl Availability {
  pub const OPTIONS: [Availability; 2] = [Availability::Allowed, Availability::Blocked];
  pub const FIRST: Availability = Self::OPTIONS[0];
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn volume_labels_parse_loosely_and_sort_numerically() {
    assert_eq!("Vol.2".parse::<VolumeLabel>().unwrap().number(), 2);
    assert_eq!("vol 10".parse::<VolumeLabel>().unwrap().number(), 10);
    assert_eq!("Vol. 3".parse::<VolumeLabel>().unwrap().number(), 3);
    assert!("Disc 2".parse::<VolumeLabel>().is_err());
    assert!("Vol.0".parse::<VolumeLabel>().is_err());

    assert_eq!(VolumeLabel::parse_or_default("side B"), VolumeLabel::default());

    let mut labels = vec![VolumeLabel::parse_or_default("Vol.10"), VolumeLabel::parse_or_default("Vol.2")];
    labels.sort();
    assert_eq!(labels.iter().map(|l| l.to_string()).collect::<Vec<_>>(), vec!["Vol.2", "Vol.10"]);
  }

  #[test]
  fn empty_tree_serializes_as_array() {
    let tree = DistributionTree::default();
    assert!(tree.has_no_tracks());
    assert_eq!(serde_json::to_string(&tree).unwrap(), "[]");
  }

  #[test]
  fn synthesized_override_uses_first_options() {
    let o = TrackOverride::synthesized(PriceTier::Mid);
    assert_eq!(o.price_tier, PriceTier::Mid);
    assert_eq!(o.pd, Availability::Allowed);
    assert_eq!(o.ugc, Availability::Allowed);
    assert!(o.instant_grat_date.is_none());
  }
}
