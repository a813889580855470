use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::domain::{
  Availability, DistributionGroup, DistributionGroupId, DistributionTree, PriceTier, Release, Track, TrackId,
  TrackOverride, Volume, VolumeLabel, VolumeTrack,
};
use crate::errors::EditorError;
use crate::services::edit_lock::EditLock;

/// Edición de un campo de un override (grupo, pista).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideEdit {
  PriceTier(PriceTier),
  PreorderDate(Option<NaiveDate>),
  ReleaseDate(Option<NaiveDate>),
  Pd(Availability),
  Etu(Availability),
  Adss(Availability),
  Ugc(Availability),
}

impl OverrideEdit {
  fn apply(self, o: &mut TrackOverride) {
    match self {
      OverrideEdit::PriceTier(tier) => o.price_tier = tier,
      OverrideEdit::PreorderDate(date) => o.preorder_date = date,
      OverrideEdit::ReleaseDate(date) => o.release_date = date,
      OverrideEdit::Pd(v) => o.pd = v,
      OverrideEdit::Etu(v) => o.etu = v,
      OverrideEdit::Adss(v) => o.adss = v,
      OverrideEdit::Ugc(v) => o.ugc = v,
    }
  }
}

/// Deriva el árbol distribuidor → volumen → pista a partir de las pistas.
///
/// La derivación es pura: mismas entradas, mismo árbol. Los overrides
/// existentes se conservan tal cual; los que faltan se sintetizan.
#[derive(Debug, Clone)]
pub struct DistributionSynchronizer {
  default_tier: PriceTier,
}

impl DistributionSynchronizer {
  pub fn new(default_tier: PriceTier) -> Self {
    Self { default_tier }
  }

  pub fn derive(&self, release: &Release, tracks: &[Track], stored: Option<&DistributionTree>) -> Option<DistributionTree> {
    let sources: Vec<&DistributionTree> = stored.into_iter().collect();
    self.derive_with(release, tracks, &sources)
  }

  /// Igual que [`derive`](Self::derive) pero buscando overrides en varias
  /// fuentes; la primera que tenga el par (grupo, pista) gana.
  pub fn derive_with(
    &self,
    release: &Release,
    tracks: &[Track],
    sources: &[&DistributionTree],
  ) -> Option<DistributionTree> {
    let mut ordered: Vec<&Track> = tracks.iter().collect();
    ordered.sort_by_key(|t| t.position);

    let mut known: HashMap<(DistributionGroupId, TrackId), &TrackOverride> = HashMap::new();
    for source in sources.iter().rev() {
      for (group_id, entry) in source.entries() {
        known.insert((group_id, entry.track_id), &entry.overrides);
      }
    }

    let groups: Vec<DistributionGroup> = release
      .distributors
      .iter()
      .map(|distributor| {
        let mut volumes: BTreeMap<VolumeLabel, Vec<VolumeTrack>> = BTreeMap::new();

        for track in &ordered {
          let overrides = known
            .get(&(distributor.id, track.id))
            .map(|o| (*o).clone())
            .unwrap_or_else(|| TrackOverride::synthesized(self.default_tier));

          let entries = volumes.entry(track.volume_label()).or_default();
          let number = entries.len() as u32 + 1;
          entries.push(VolumeTrack { track_id: track.id, number, overrides });
        }

        DistributionGroup {
          id: distributor.id,
          name: distributor.name.clone(),
          territory: release.territory.clone(),
          exclusivity: release.exclusivity.clone(),
          volumes: volumes.into_iter().map(|(label, tracks)| Volume { label, tracks }).collect(),
        }
      })
      .collect();

    let tree = DistributionTree { groups };
    if tree.has_no_tracks() {
      debug!(release_id = %release.id, "distribution collapses to empty");
      return None;
    }

    debug!(release_id = %release.id, groups = tree.groups.len(), tracks = tracks.len(), "distribution derived");
    Some(tree)
  }

  /// Fecha de "instant gratification" de una pista en un volumen de un grupo.
  pub fn set_instant_grat(
    &self,
    lock: &EditLock,
    tree: &mut Option<DistributionTree>,
    group_id: DistributionGroupId,
    label: VolumeLabel,
    track_id: TrackId,
    date: Option<NaiveDate>,
  ) -> Result<(), EditorError> {
    lock.ensure_editable()?;

    let group = tree.as_mut().and_then(|t| t.group_mut(group_id)).ok_or(EditorError::GroupNotFound(group_id))?;
    let volume = group.volume_mut(label).ok_or_else(|| EditorError::VolumeNotFound(label.to_string()))?;
    let entry =
      volume.tracks.iter_mut().find(|t| t.track_id == track_id).ok_or(EditorError::TrackNotFound(track_id))?;

    entry.overrides.instant_grat_date = date;
    Ok(())
  }

  pub fn edit_override(
    &self,
    lock: &EditLock,
    tree: &mut Option<DistributionTree>,
    group_id: DistributionGroupId,
    track_id: TrackId,
    edit: OverrideEdit,
  ) -> Result<(), EditorError> {
    lock.ensure_editable()?;

    let group = tree.as_mut().and_then(|t| t.group_mut(group_id)).ok_or(EditorError::GroupNotFound(group_id))?;
    let entry = group.entry_mut(track_id).ok_or(EditorError::TrackNotFound(track_id))?;

    edit.apply(&mut entry.overrides);
    Ok(())
  }
}

impl Default for DistributionSynchronizer {
  fn default() -> Self {
    Self::new(PriceTier::default())
  }
}
