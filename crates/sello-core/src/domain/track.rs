use serde::{Deserialize, Serialize};

use crate::domain::contributor::Contributor;
use crate::domain::distribution::VolumeLabel;
use crate::domain::ids::{ReleaseId, TrackId};

/// Una pista del release.
///
/// Todo lo que no es identidad u orden es opcional: el editor trabaja con
/// pistas incompletas y el agregador de validación decide qué falta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
  pub id: TrackId,
  pub release_id: ReleaseId,

  /// Posición ordinal (1..n) dentro del release. Manda sobre la numeración
  /// dentro de cada volumen.
  pub position: u32,

  /// Etiqueta de volumen tal como se editó (`"Vol.2"`). Ver [`Track::volume_label`].
  #[serde(default)]
  pub volume: Option<String>,

  #[serde(default)]
  pub title: Option<String>,

  #[serde(default)]
  pub artists: Vec<String>,

  #[serde(default)]
  pub contributors: Vec<Contributor>,

  #[serde(default)]
  pub parental_advisory: Option<ParentalAdvisory>,

  #[serde(default)]
  pub metadata: TrackMetadata,

  #[serde(default)]
  pub audio: AudioInfo,

  #[serde(default)]
  pub publishing: Publishing,

  #[serde(default)]
  pub isrc: Option<String>,

  /// Referencia reproducible devuelta por el asset store.
  #[serde(default)]
  pub asset: Option<AssetRef>,
}

impl Track {
  /// Pista nueva con los valores por defecto del alta.
  pub fn new(id: TrackId, release_id: ReleaseId, position: u32, source: TrackSource) -> Self {
    Self {
      id,
      release_id,
      position,
      volume: Some(VolumeLabel::default().to_string()),
      title: source.title,
      artists: Vec::new(),
      contributors: Vec::new(),
      parental_advisory: None,
      metadata: TrackMetadata::default(),
      audio: AudioInfo::default(),
      publishing: Publishing::default(),
      isrc: None,
      asset: Some(source.asset),
    }
  }

  /// Volumen normalizado: etiquetas ausentes o ilegibles caen en `Vol.1`.
  pub fn volume_label(&self) -> VolumeLabel {
    self.volume.as_deref().map(VolumeLabel::parse_or_default).unwrap_or_default()
  }
}

/// Valor de "parental advisory". El backend usa un marcador cuando aún no se eligió.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentalAdvisory {
  Explicit,
  Clean,
  NotExplicit,
  /// Marcador del formulario ("select…") o cualquier valor desconocido.
  #[serde(other)]
  Unset,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
  #[serde(default)]
  pub primary_genre: Option<String>,
  #[serde(default)]
  pub metadata_language: Option<String>,
  #[serde(default)]
  pub metadata_language_country: Option<String>,
  #[serde(default)]
  pub audio_language: Option<String>,
  #[serde(default)]
  pub release_year: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioInfo {
  #[serde(default)]
  pub recording_country: Option<String>,
  /// Original, cover, remix… (valores definidos por el backend).
  #[serde(default)]
  pub track_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Publishing {
  #[serde(default)]
  pub publisher_name: Option<String>,
  #[serde(default)]
  pub work_title: Option<String>,
}

/// Referencia opaca a un audio ya subido al asset store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(pub String);

/// Origen de una pista al añadirla o al reemplazar su audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSource {
  pub asset: AssetRef,
  /// Título sugerido (normalmente derivado del nombre de fichero).
  pub title: Option<String>,
}

impl TrackSource {
  pub fn new(asset: impl Into<String>) -> Self {
    Self { asset: AssetRef(asset.into()), title: None }
  }

  pub fn with_title(mut self, title: impl Into<String>) -> Self {
    self.title = Some(title.into());
    self
  }
}
