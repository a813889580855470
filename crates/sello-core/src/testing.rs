//! Doubles compartidos por los tests del crate.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::domain::fields::apply_field;
use crate::domain::{
  Contributor, DistributionTree, ParentalAdvisory, Release, ReleaseId, Track, TrackId, TrackSource,
};
use crate::ports::{FieldPatch, ReleaseRepository, RepoError, TrackPosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Lookup {
  Id,
  PublicId,
  Slug,
}

#[derive(Default)]
pub(crate) struct RepoState {
  pub releases: Vec<Release>,
  pub tracks: Vec<Track>,
  pub release_patches: Vec<(ReleaseId, FieldPatch)>,
  pub track_patches: Vec<(TrackId, FieldPatch)>,
  pub created: Vec<TrackId>,
  pub deleted: Vec<TrackId>,
  pub position_updates: Vec<Vec<TrackPosition>>,
  pub syncs: Vec<Option<DistributionTree>>,
  pub fail_reads: bool,
  pub fail_writes: bool,
  pub failed_writes: usize,
  pub delays: HashMap<Lookup, Duration>,
}

/// Repositorio en memoria que registra cada escritura.
#[derive(Default)]
pub(crate) struct InMemoryRepository {
  state: Mutex<RepoState>,
}

impl InMemoryRepository {
  pub fn with_release(release: Release) -> Self {
    let repo = Self::default();
    repo.state().releases.push(release);
    repo
  }

  pub fn add_tracks(&self, tracks: impl IntoIterator<Item = Track>) {
    self.state().tracks.extend(tracks);
  }

  pub fn state(&self) -> MutexGuard<'_, RepoState> {
    self.state.lock().unwrap()
  }

  async fn lookup(&self, kind: Lookup, matches: impl Fn(&Release) -> bool) -> Result<Option<Release>, RepoError> {
    let delay = self.state().delays.get(&kind).copied();
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }

    let state = self.state();
    if state.fail_reads {
      return Err(RepoError::Transport("read failed".into()));
    }
    Ok(state.releases.iter().find(|r| matches(r)).cloned())
  }

  fn check_write(&self) -> Result<(), RepoError> {
    let mut state = self.state();
    if state.fail_writes {
      state.failed_writes += 1;
      return Err(RepoError::Transport("write failed".into()));
    }
    Ok(())
  }
}

#[async_trait]
impl ReleaseRepository for InMemoryRepository {
  async fn find_by_id(&self, id: ReleaseId) -> Result<Option<Release>, RepoError> {
    self.lookup(Lookup::Id, |r| r.id == id).await
  }

  async fn find_by_public_id(&self, public_id: &str) -> Result<Option<Release>, RepoError> {
    self.lookup(Lookup::PublicId, |r| r.public_id.as_deref() == Some(public_id)).await
  }

  async fn find_by_slug(&self, slug: &str) -> Result<Option<Release>, RepoError> {
    self.lookup(Lookup::Slug, |r| r.slug.as_deref() == Some(slug)).await
  }

  async fn update_release(&self, id: ReleaseId, patch: FieldPatch) -> Result<(), RepoError> {
    self.check_write()?;
    let mut state = self.state();
    if let Some(release) = state.releases.iter_mut().find(|r| r.id == id) {
      for (field, value) in &patch {
        let _ = apply_field(release, field, value.clone());
      }
    }
    state.release_patches.push((id, patch));
    Ok(())
  }

  async fn list_tracks(&self, release_id: ReleaseId) -> Result<Vec<Track>, RepoError> {
    let state = self.state();
    if state.fail_reads {
      return Err(RepoError::Transport("read failed".into()));
    }
    let mut tracks: Vec<Track> = state.tracks.iter().filter(|t| t.release_id == release_id).cloned().collect();
    tracks.sort_by_key(|t| t.position);
    Ok(tracks)
  }

  async fn create_track(&self, track: &Track) -> Result<Track, RepoError> {
    self.check_write()?;
    let mut state = self.state();
    state.created.push(track.id);
    state.tracks.push(track.clone());
    Ok(track.clone())
  }

  async fn update_track(&self, id: TrackId, patch: FieldPatch) -> Result<(), RepoError> {
    self.check_write()?;
    let mut state = self.state();
    if let Some(track) = state.tracks.iter_mut().find(|t| t.id == id) {
      for (field, value) in &patch {
        let _ = apply_field(track, field, value.clone());
      }
    }
    state.track_patches.push((id, patch));
    Ok(())
  }

  async fn delete_track(&self, id: TrackId) -> Result<(), RepoError> {
    self.check_write()?;
    let mut state = self.state();
    state.tracks.retain(|t| t.id != id);
    state.deleted.push(id);
    Ok(())
  }

  async fn bulk_update_positions(&self, _release_id: ReleaseId, positions: &[TrackPosition]) -> Result<(), RepoError> {
    self.check_write()?;
    let mut state = self.state();
    for p in positions {
      if let Some(track) = state.tracks.iter_mut().find(|t| t.id == p.track_id) {
        track.position = p.position;
      }
    }
    state.position_updates.push(positions.to_vec());
    Ok(())
  }

  async fn synchronize_distribution(
    &self,
    release_id: ReleaseId,
    tree: Option<DistributionTree>,
  ) -> Result<Option<DistributionTree>, RepoError> {
    self.check_write()?;
    let mut state = self.state();
    if let Some(release) = state.releases.iter_mut().find(|r| r.id == release_id) {
      release.distribution = tree.clone();
    }
    state.syncs.push(tree.clone());
    Ok(tree)
  }
}

/// Pista que cumple todos los predicados de validación.
pub(crate) fn complete_track(release_id: ReleaseId, position: u32, volume: &str) -> Track {
  let mut track = Track::new(
    TrackId::new(),
    release_id,
    position,
    TrackSource::new(format!("asset://{position}")).with_title(format!("Track {position}")),
  );
  track.volume = Some(volume.to_string());
  track.artists = vec!["Main Artist".into()];
  track.contributors = vec![Contributor {
    name: "Ana".into(),
    category: Some("Production".into()),
    role: Some("Producer".into()),
    role_type: Some("Co-Producer".into()),
  }];
  track.parental_advisory = Some(ParentalAdvisory::NotExplicit);
  track.metadata.primary_genre = Some("Jazz".into());
  track.metadata.metadata_language = Some("es".into());
  track.metadata.metadata_language_country = Some("ES".into());
  track.metadata.audio_language = Some("es".into());
  track.metadata.release_year = Some(2024);
  track.audio.recording_country = Some("ES".into());
  track.audio.track_type = Some("original".into());
  track.publishing.publisher_name = Some("Sello Editorial".into());
  track.publishing.work_title = Some(format!("Work {position}"));
  track.isrc = Some(format!("ESA0124000{position:02}"));
  track
}
