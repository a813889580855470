use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::{
  DistributionGroupId, DistributionTree, FieldEntity, FieldKey, PriceTier, Release, ReleaseStatus, RoleCatalog, Track,
  TrackId, TrackSource, ValidationReport, VolumeLabel,
};
use crate::errors::EditorError;
use crate::ports::{AccessGrants, FieldPatch, ReleaseRepository, TrackPosition};
use crate::services::artists::{ArtistOrdering, ArtistReorder};
use crate::services::coalescer::{FieldCoalescer, RepositorySink};
use crate::services::distribution::{DistributionSynchronizer, OverrideEdit};
use crate::services::edit_lock::{EditLock, LockState};
use crate::services::resolver::{ReleaseResolver, ResolveRequest, SessionContext};
use crate::services::tracks::TrackCollection;
use crate::services::validation::ValidationAggregator;

/// Ajustes del editor; los carga la capa de runtime desde `[editor]`.
#[derive(Debug, Clone)]
pub struct EditorSettings {
  pub quiet_period: Duration,
  pub default_price_tier: PriceTier,
  pub roles: RoleCatalog,
}

impl Default for EditorSettings {
  fn default() -> Self {
    Self {
      quiet_period: Duration::from_millis(750),
      default_price_tier: PriceTier::default(),
      roles: RoleCatalog::default(),
    }
  }
}

/// Sesión de edición de un release.
///
/// Es dueña exclusiva del estado de trabajo (release, pistas, árbol de
/// distribución, avisos de validación). Cada mutación sigue el mismo orden:
///
/// 1. comprueba el bloqueo de edición,
/// 2. aplica el cambio local,
/// 3. re-deriva la distribución y recalcula la validación,
/// 4. persiste.
///
/// Los pasos 1–3 terminan antes del primer `await`. Los fallos de escritura
/// se registran y el estado local se conserva.
pub struct ReleaseEditor<R>
where
  R: ReleaseRepository + 'static,
{
  repo: Arc<R>,
  grants: Arc<dyn AccessGrants>,
  release: Release,
  tracks: TrackCollection,
  lock: EditLock,
  synchronizer: DistributionSynchronizer,
  validator: ValidationAggregator,
  validation: ValidationReport,
  coalescer: FieldCoalescer<RepositorySink<R>>,
  artists: ArtistOrdering,
  /// El árbol local difiere del almacenado y aún no se ha escrito.
  unsynced: bool,
}

impl<R> ReleaseEditor<R>
where
  R: ReleaseRepository + 'static,
{
  /// Resuelve el release y carga sus pistas.
  ///
  /// Solo falla si ninguna dirección resuelve; un fallo al listar pistas deja
  /// la colección vacía.
  pub async fn open(
    repo: Arc<R>,
    resolver: &ReleaseResolver<R>,
    ctx: &mut SessionContext,
    request: &ResolveRequest,
    grants: Arc<dyn AccessGrants>,
    settings: EditorSettings,
  ) -> Result<Self, EditorError> {
    let release = resolver.resolve(ctx, request).await?;
    let tracks = load_tracks(repo.as_ref(), &release).await;

    let mut editor = Self::new(repo, release, tracks, grants, settings);
    editor.reconcile_distribution().await;
    Ok(editor)
  }

  /// Editor sobre un release ya cargado.
  ///
  /// El árbol almacenado se re-deriva contra `tracks`; si cambia, queda
  /// pendiente para [`reconcile_distribution`](Self::reconcile_distribution).
  pub fn new(
    repo: Arc<R>,
    mut release: Release,
    tracks: Vec<Track>,
    grants: Arc<dyn AccessGrants>,
    settings: EditorSettings,
  ) -> Self {
    let lock = EditLock::new(release.status, grants.can_delete_release(release.id));
    let tracks = TrackCollection::new(release.id, release.release_type.clone(), tracks);
    let validator = ValidationAggregator::new(settings.roles);
    let validation = validator.evaluate(tracks.tracks());
    let coalescer = FieldCoalescer::new(Arc::new(RepositorySink(Arc::clone(&repo))), settings.quiet_period);
    let artists = ArtistOrdering::new(release.artists.clone());
    let synchronizer = DistributionSynchronizer::new(settings.default_price_tier);

    let derived = synchronizer.derive(&release, tracks.tracks(), release.distribution.as_ref());
    let unsynced = derived != release.distribution;
    release.distribution = derived;

    info!(release_id = %release.id, tracks = tracks.len(), status = %release.status, "release editor opened");

    Self {
      repo,
      grants,
      release,
      tracks,
      lock,
      synchronizer,
      validator,
      validation,
      coalescer,
      artists,
      unsynced,
    }
  }

  // --- Lectura ---

  pub fn release(&self) -> &Release {
    &self.release
  }

  pub fn tracks(&self) -> &[Track] {
    self.tracks.tracks()
  }

  pub fn track(&self, id: TrackId) -> Option<&Track> {
    self.tracks.get(id)
  }

  pub fn can_add_track(&self) -> bool {
    self.lock.is_editable() && self.tracks.can_add()
  }

  pub fn distribution(&self) -> Option<&DistributionTree> {
    self.release.distribution.as_ref()
  }

  pub fn validation(&self) -> &ValidationReport {
    &self.validation
  }

  pub fn artists(&self) -> &ArtistOrdering {
    &self.artists
  }

  pub fn pending_fields(&self) -> Vec<FieldKey> {
    self.coalescer.pending()
  }

  // --- Bloqueo ---

  pub fn lock_state(&self) -> LockState {
    self.lock.state()
  }

  pub fn is_editable(&self) -> bool {
    self.lock.is_editable()
  }

  pub fn request_edit(&mut self) {
    debug!(release_id = %self.release.id, "edit requested");
    self.lock.request_edit();
  }

  pub fn cancel_edit(&mut self) {
    self.lock.cancel_edit();
  }

  pub fn can_delete(&self) -> bool {
    self.lock.can_delete()
  }

  /// Registra un cambio de estado observado en el repositorio.
  pub fn apply_status(&mut self, status: ReleaseStatus) {
    if self.release.status != status {
      info!(release_id = %self.release.id, from = %self.release.status, to = %status, "release status changed");
    }
    self.release.status = status;
    self.lock.on_status_change(status);
    self.lock.set_delete_grant(self.grants.can_delete_release(self.release.id));
  }

  // --- Pistas ---

  pub async fn add_track(&mut self, source: TrackSource) -> Result<TrackId, EditorError> {
    self.lock.ensure_editable()?;
    let track = self.tracks.add(source)?.clone();
    self.rederive();

    if let Err(e) = self.repo.create_track(&track).await {
      warn!(track_id = %track.id, error = %e, "track create failed");
    }
    self.persist_distribution().await;
    Ok(track.id)
  }

  pub async fn remove_track(&mut self, id: TrackId) -> Result<Track, EditorError> {
    self.lock.ensure_editable()?;
    let (removed, moved) = self.tracks.remove(id)?;
    self.coalescer.evict(FieldEntity::Track(id));
    self.rederive();

    if let Err(e) = self.repo.delete_track(id).await {
      warn!(track_id = %id, error = %e, "track delete failed");
    }
    self.persist_positions(&moved).await;
    self.persist_distribution().await;
    Ok(removed)
  }

  /// Mueve una pista (índices 0-based); las posiciones se guardan en bloque.
  pub async fn reorder_tracks(&mut self, from: usize, to: usize) -> Result<(), EditorError> {
    self.lock.ensure_editable()?;
    let moved = self.tracks.reorder(from, to)?;
    if moved.is_empty() {
      return Ok(());
    }
    self.rederive();

    self.persist_positions(&moved).await;
    self.persist_distribution().await;
    Ok(())
  }

  pub async fn replace_track_asset(&mut self, id: TrackId, source: TrackSource) -> Result<(), EditorError> {
    self.lock.ensure_editable()?;
    let previous = self.tracks.replace(id, source)?;
    let Some(asset) = self.tracks.get(id).and_then(|t| t.asset.clone()) else {
      return Ok(());
    };
    debug!(track_id = %id, ?previous, asset = %asset.0, "track asset replaced");
    self.rederive();

    let mut patch = FieldPatch::new();
    patch.insert("asset".into(), Value::String(asset.0));
    if let Err(e) = self.repo.update_track(id, patch).await {
      warn!(track_id = %id, error = %e, "track asset update failed");
    }
    self.persist_distribution().await;
    Ok(())
  }

  /// Edita un campo de una pista. Cambiar `volume` re-deriva la distribución.
  pub async fn set_track_field(&mut self, id: TrackId, field: &str, value: Value) -> Result<(), EditorError> {
    self.lock.ensure_editable()?;
    let track = self.tracks.get_mut(id).ok_or(EditorError::TrackNotFound(id))?;
    self.coalescer.set_field(track, FieldKey::new(FieldEntity::Track(id), field), value)?;

    if root(field) == "volume" {
      self.rederive();
      self.persist_distribution().await;
    } else {
      self.revalidate();
    }
    Ok(())
  }

  /// Edita un campo del release. Territorio, exclusividad y distribuidores
  /// re-derivan la distribución.
  pub async fn set_release_field(&mut self, field: &str, value: Value) -> Result<(), EditorError> {
    self.lock.ensure_editable()?;
    let key = FieldKey::new(FieldEntity::Release(self.release.id), field);
    self.coalescer.set_field(&mut self.release, key, value)?;

    match root(field) {
      "territory" | "exclusivity" | "distributors" => self.sync_distribution().await,
      "release_type" => self.tracks.set_release_type(self.release.release_type.clone()),
      "artists" => self.artists = ArtistOrdering::new(self.release.artists.clone()),
      _ => {}
    }
    Ok(())
  }

  /// Mando de reordenación de artistas; `None` mientras el release está bloqueado.
  pub fn artist_reorder(&mut self) -> Option<ArtistReorder<'_, RepositorySink<R>>> {
    if !self.lock.is_editable() {
      return None;
    }
    Some(ArtistReorder { ordering: &mut self.artists, release: &mut self.release, coalescer: &self.coalescer })
  }

  // --- Distribución ---

  pub async fn set_instant_grat(
    &mut self,
    group_id: DistributionGroupId,
    label: VolumeLabel,
    track_id: TrackId,
    date: Option<NaiveDate>,
  ) -> Result<(), EditorError> {
    self.synchronizer.set_instant_grat(&self.lock, &mut self.release.distribution, group_id, label, track_id, date)?;
    self.persist_distribution().await;
    Ok(())
  }

  pub async fn edit_override(
    &mut self,
    group_id: DistributionGroupId,
    track_id: TrackId,
    edit: OverrideEdit,
  ) -> Result<(), EditorError> {
    self.synchronizer.edit_override(&self.lock, &mut self.release.distribution, group_id, track_id, edit)?;
    self.persist_distribution().await;
    Ok(())
  }

  /// Re-deriva el árbol desde las pistas y lo persiste.
  pub async fn sync_distribution(&mut self) {
    self.release.distribution =
      self.synchronizer.derive(&self.release, self.tracks.tracks(), self.release.distribution.as_ref());
    self.persist_distribution().await;
  }

  /// Re-deriva el árbol y solo lo escribe si difiere de lo almacenado.
  ///
  /// Devuelve `true` si hubo escritura.
  pub async fn reconcile_distribution(&mut self) -> bool {
    let derived = self.synchronizer.derive(&self.release, self.tracks.tracks(), self.release.distribution.as_ref());
    if derived != self.release.distribution {
      self.release.distribution = derived;
      self.unsynced = true;
    }
    if !self.unsynced {
      return false;
    }

    debug!(release_id = %self.release.id, "stored distribution out of date");
    self.persist_distribution().await;
    true
  }

  // --- Ciclo de vida ---

  /// Vuelve a leer release y pistas. Los campos pendientes de enviar se
  /// reaplican sobre lo leído; si una lectura falla se conserva lo que hay.
  /// Las pistas borradas en otra sesión salen también del árbol.
  pub async fn refresh(&mut self) {
    match self.repo.find_by_id(self.release.id).await {
      Ok(Some(mut fresh)) => {
        let status = fresh.status;
        self.reapply_pending(FieldEntity::Release(fresh.id), &mut fresh);
        fresh.status = self.release.status;
        self.release = fresh;
        self.apply_status(status);
        self.artists = ArtistOrdering::new(self.release.artists.clone());
        self.tracks.set_release_type(self.release.release_type.clone());
      }
      Ok(None) => warn!(release_id = %self.release.id, "release vanished on refresh"),
      Err(e) => warn!(release_id = %self.release.id, error = %e, "release refresh failed"),
    }

    match self.repo.list_tracks(self.release.id).await {
      Ok(mut tracks) => {
        for track in &mut tracks {
          self.reapply_pending(FieldEntity::Track(track.id), track);
        }
        self.tracks = TrackCollection::new(self.release.id, self.release.release_type.clone(), tracks);
      }
      Err(e) => warn!(release_id = %self.release.id, error = %e, "track refresh failed"),
    }

    self.revalidate();
    self.reconcile_distribution().await;
  }

  /// Envía ya las escrituras de campos pendientes.
  pub async fn flush(&self) -> usize {
    self.coalescer.flush().await
  }

  // --- Internos ---

  /// Estado derivado de las pistas: árbol local y avisos.
  fn rederive(&mut self) {
    self.release.distribution =
      self.synchronizer.derive(&self.release, self.tracks.tracks(), self.release.distribution.as_ref());
    self.revalidate();
  }

  fn revalidate(&mut self) {
    self.validation = self.validator.evaluate(self.tracks.tracks());
  }

  async fn persist_positions(&self, moved: &[TrackPosition]) {
    if moved.is_empty() {
      return;
    }
    if let Err(e) = self.repo.bulk_update_positions(self.release.id, moved).await {
      warn!(release_id = %self.release.id, error = %e, "track positions update failed");
    }
  }

  /// Una sola escritura del árbol; lo devuelto se funde con el estado local.
  async fn persist_distribution(&mut self) {
    let local = self.release.distribution.clone();

    let result = self.repo.synchronize_distribution(self.release.id, local.clone()).await;
    self.unsynced = result.is_err();

    match result {
      Ok(Some(remote)) => {
        let sources: Vec<&DistributionTree> = std::iter::once(&remote).chain(local.as_ref()).collect();
        self.release.distribution = self.synchronizer.derive_with(&self.release, self.tracks.tracks(), &sources);
      }
      Ok(None) => debug!(release_id = %self.release.id, "distribution stored as empty"),
      Err(e) => warn!(release_id = %self.release.id, error = %e, "distribution sync failed"),
    }
  }

  fn reapply_pending<T>(&self, entity: FieldEntity, target: &mut T)
  where
    T: serde::Serialize + serde::de::DeserializeOwned,
  {
    for key in self.coalescer.pending().into_iter().filter(|k| k.entity == entity) {
      if let Some(value) = self.coalescer.pending_value(&key)
        && let Err(e) = crate::domain::fields::apply_field(target, &key.field, value)
      {
        warn!(%key, error = %e, "pending value no longer applies");
      }
    }
  }
}

async fn load_tracks<R: ReleaseRepository>(repo: &R, release: &Release) -> Vec<Track> {
  repo.list_tracks(release.id).await.unwrap_or_else(|e| {
    warn!(release_id = %release.id, error = %e, "track list failed; starting empty");
    Vec::new()
  })
}

fn root(field: &str) -> &str {
  field.split('.').next().unwrap_or(field)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{
    Availability, Distributor, ReleaseId, ReleaseType, Territory, TrackOverride, ValidationCategory, ValidationState,
  };
  use crate::ports::NoGrants;
  use crate::testing::{InMemoryRepository, complete_track};
  use serde_json::json;
  use std::collections::HashSet;

  const QUIET: Duration = Duration::from_millis(750);

  fn release(status: ReleaseStatus) -> Release {
    let mut release = Release::draft(ReleaseId::new(), "R1", ReleaseType::Album);
    release.status = status;
    release.artists = vec!["Main".into(), "Guest A".into(), "Guest B".into()];
    release.distributors = vec![Distributor { id: DistributionGroupId::new(), name: "Store".into() }];
    release
  }

  fn editor_with(release: Release, tracks: Vec<Track>) -> (Arc<InMemoryRepository>, ReleaseEditor<InMemoryRepository>) {
    let repo = Arc::new(InMemoryRepository::with_release(release.clone()));
    repo.add_tracks(tracks.clone());
    let editor = ReleaseEditor::new(Arc::clone(&repo), release, tracks, Arc::new(NoGrants), EditorSettings::default());
    (repo, editor)
  }

  fn track_ids(tree: Option<&DistributionTree>) -> Vec<TrackId> {
    tree.map(|t| t.entries().map(|(_, e)| e.track_id).collect()).unwrap_or_default()
  }

  #[tokio::test]
  async fn album_with_two_volumes_and_missing_isrc() {
    let r1 = release(ReleaseStatus::Draft);
    let t1 = complete_track(r1.id, 1, "Vol.1");
    let mut t2 = complete_track(r1.id, 2, "Vol.2");
    t2.isrc = None;
    let (_repo, mut editor) = editor_with(r1, vec![t1.clone(), t2.clone()]);

    editor.sync_distribution().await;

    let report = editor.validation();
    let incomplete: Vec<_> = report.release.incomplete_categories().collect();
    assert_eq!(incomplete, vec![ValidationCategory::Isrc]);
    assert!(report.tracks.iter().any(|t| t.track_id == t2.id && t.state.isrc));

    let tree = editor.distribution().expect("tree");
    let group = &tree.groups[0];
    assert_eq!(group.volumes.len(), 2);
    assert_eq!(group.volumes[0].label, VolumeLabel::default());
    assert_eq!(group.volumes[0].tracks[0].track_id, t1.id);
    assert_eq!(group.volumes[1].tracks[0].track_id, t2.id);
    for volume in &group.volumes {
      assert_eq!(volume.tracks.len(), 1);
      assert_eq!(volume.tracks[0].overrides, TrackOverride::synthesized(PriceTier::default()));
    }
  }

  #[tokio::test]
  async fn distribution_follows_adds_and_removes() {
    let r = release(ReleaseStatus::Draft);
    let (repo, mut editor) = editor_with(r, Vec::new());

    let a = editor.add_track(TrackSource::new("asset://a")).await.unwrap();
    let b = editor.add_track(TrackSource::new("asset://b")).await.unwrap();
    let c = editor.add_track(TrackSource::new("asset://c")).await.unwrap();
    editor.remove_track(b).await.unwrap();

    let ids: HashSet<TrackId> = track_ids(editor.distribution()).into_iter().collect();
    assert_eq!(ids, HashSet::from([a, c]));
    assert_eq!(track_ids(editor.distribution()).len(), 2);

    assert_eq!(editor.track(c).map(|t| t.position), Some(2));
    let state = repo.state();
    assert_eq!(state.created, vec![a, b, c]);
    assert_eq!(state.deleted, vec![b]);
    assert_eq!(state.position_updates, vec![vec![TrackPosition { track_id: c, position: 2 }]]);
  }

  #[tokio::test]
  async fn resync_without_changes_is_stable() {
    let r = release(ReleaseStatus::Draft);
    let tracks = vec![complete_track(r.id, 1, "Vol.1"), complete_track(r.id, 2, "Vol.1")];
    let (_repo, mut editor) = editor_with(r, tracks);

    editor.sync_distribution().await;
    let first = editor.distribution().cloned();
    editor.sync_distribution().await;

    assert_eq!(editor.distribution().cloned(), first);
  }

  #[tokio::test]
  async fn removing_every_track_collapses_tree() {
    let r = release(ReleaseStatus::Draft);
    let (repo, mut editor) = editor_with(r, Vec::new());

    let id = editor.add_track(TrackSource::new("asset://solo")).await.unwrap();
    assert!(editor.distribution().is_some());

    editor.remove_track(id).await.unwrap();

    assert!(editor.distribution().is_none());
    assert_eq!(repo.state().syncs.last(), Some(&None));
  }

  #[tokio::test]
  async fn empty_release_is_incomplete_and_complete_tracks_are_not() {
    let r = release(ReleaseStatus::Draft);
    let (_repo, editor) = editor_with(r.clone(), Vec::new());
    assert_eq!(editor.validation().release, ValidationState::all_incomplete());

    let (_repo, editor) = editor_with(r.clone(), vec![complete_track(r.id, 1, "Vol.1")]);
    assert!(editor.validation().release.is_complete());
  }

  #[tokio::test]
  async fn locked_release_rejects_mutations() {
    let r = release(ReleaseStatus::InReview);
    let track = complete_track(r.id, 1, "Vol.1");
    let (repo, mut editor) = editor_with(r, vec![track.clone()]);

    assert_eq!(editor.lock_state(), LockState::Locked);
    assert!(matches!(editor.add_track(TrackSource::new("asset://x")).await, Err(EditorError::Locked)));
    assert!(matches!(editor.remove_track(track.id).await, Err(EditorError::Locked)));
    assert!(matches!(editor.set_release_field("title", json!("New")).await, Err(EditorError::Locked)));
    assert!(matches!(
      editor.edit_override(DistributionGroupId::new(), track.id, OverrideEdit::Ugc(Availability::Blocked)).await,
      Err(EditorError::Locked)
    ));
    assert!(editor.artist_reorder().is_none());
    assert!(!editor.can_delete());

    assert_eq!(editor.tracks().len(), 1);
    assert!(repo.state().created.is_empty());
  }

  #[tokio::test]
  async fn edit_intent_is_dropped_when_leaving_draft() {
    let r = release(ReleaseStatus::Draft);
    let (_repo, mut editor) = editor_with(r, Vec::new());

    editor.request_edit();
    editor.apply_status(ReleaseStatus::InReview);
    assert_eq!(editor.lock_state(), LockState::Locked);

    editor.request_edit();
    assert!(editor.is_editable());
  }

  #[tokio::test]
  async fn single_release_accepts_one_track() {
    let mut r = release(ReleaseStatus::Draft);
    r.release_type = ReleaseType::Single;
    let (_repo, mut editor) = editor_with(r, Vec::new());

    editor.add_track(TrackSource::new("asset://one")).await.unwrap();
    assert!(!editor.can_add_track());
    assert!(matches!(
      editor.add_track(TrackSource::new("asset://two")).await,
      Err(EditorError::CardinalityExceeded { max: 1, .. })
    ));
  }

  #[tokio::test]
  async fn write_failures_keep_local_state() {
    let r = release(ReleaseStatus::Draft);
    let (repo, mut editor) = editor_with(r, Vec::new());
    repo.state().fail_writes = true;

    let id = editor.add_track(TrackSource::new("asset://a")).await.unwrap();

    assert_eq!(editor.tracks().len(), 1);
    assert_eq!(track_ids(editor.distribution()), vec![id]);
    assert_eq!(repo.state().failed_writes, 2);
  }

  #[tokio::test(start_paused = true)]
  async fn volume_edit_moves_track_and_field_is_coalesced() {
    let r = release(ReleaseStatus::Draft);
    let tracks = vec![complete_track(r.id, 1, "Vol.1"), complete_track(r.id, 2, "Vol.1")];
    let second = tracks[1].id;
    let (repo, mut editor) = editor_with(r, tracks);

    editor.set_track_field(second, "volume", json!("Vol.3")).await.unwrap();

    let group = &editor.distribution().unwrap().groups[0];
    assert_eq!(group.volumes.len(), 2);
    assert_eq!(group.volumes[1].label, VolumeLabel::new(3).unwrap());
    assert_eq!(group.volumes[1].tracks[0].number, 1);

    tokio::time::sleep(QUIET * 2).await;
    let state = repo.state();
    assert_eq!(state.track_patches.len(), 1);
    assert_eq!(state.track_patches[0].1.get("volume"), Some(&json!("Vol.3")));
  }

  #[tokio::test]
  async fn territory_change_restamps_groups() {
    let r = release(ReleaseStatus::Draft);
    let tracks = vec![complete_track(r.id, 1, "Vol.1")];
    let (_repo, mut editor) = editor_with(r, tracks);
    editor.sync_distribution().await;

    editor.set_release_field("territory", json!({ "include": ["ES", "MX"] })).await.unwrap();

    let expected = Territory::Include(vec!["ES".into(), "MX".into()]);
    assert_eq!(editor.release().territory, expected);
    assert_eq!(editor.distribution().unwrap().groups[0].territory, expected);
  }

  #[tokio::test]
  async fn override_edits_survive_resync() {
    let r = release(ReleaseStatus::Draft);
    let group_id = r.distributors[0].id;
    let track = complete_track(r.id, 1, "Vol.1");
    let (repo, mut editor) = editor_with(r, vec![track.clone()]);
    editor.sync_distribution().await;

    let date = NaiveDate::from_ymd_opt(2025, 3, 1);
    editor.set_instant_grat(group_id, VolumeLabel::default(), track.id, date).await.unwrap();
    editor.edit_override(group_id, track.id, OverrideEdit::PriceTier(PriceTier::Budget)).await.unwrap();
    editor.add_track(TrackSource::new("asset://next")).await.unwrap();

    let group = editor.distribution().unwrap().group(group_id).unwrap();
    let first = &group.volumes[0].tracks[0].overrides;
    assert_eq!(first.instant_grat_date, date);
    assert_eq!(first.price_tier, PriceTier::Budget);
    assert_eq!(group.volumes[0].tracks[1].overrides, TrackOverride::synthesized(PriceTier::default()));
    assert_eq!(repo.state().syncs.len(), 4);
  }

  #[tokio::test(start_paused = true)]
  async fn artist_reorder_persists_whole_list() {
    let r = release(ReleaseStatus::Draft);
    let (repo, mut editor) = editor_with(r, Vec::new());

    let mut handle = editor.artist_reorder().expect("editable");
    assert!(handle.reorder(1, 0).unwrap());
    assert_eq!(handle.names(), ["Main", "Guest B", "Guest A"]);

    assert_eq!(editor.release().artists, vec!["Main", "Guest B", "Guest A"]);
    assert_eq!(editor.flush().await, 1);
    assert_eq!(repo.state().release_patches[0].1.get("artists"), Some(&json!(["Main", "Guest B", "Guest A"])));
  }

  #[tokio::test]
  async fn reorder_persists_positions_in_bulk() {
    let r = release(ReleaseStatus::Draft);
    let tracks: Vec<Track> = (1..=3).map(|p| complete_track(r.id, p, "Vol.1")).collect();
    let ids: Vec<TrackId> = tracks.iter().map(|t| t.id).collect();
    let (repo, mut editor) = editor_with(r, tracks);

    editor.reorder_tracks(2, 0).await.unwrap();

    let order: Vec<TrackId> = editor.tracks().iter().map(|t| t.id).collect();
    assert_eq!(order, vec![ids[2], ids[0], ids[1]]);
    assert_eq!(repo.state().position_updates.len(), 1);
    assert_eq!(repo.state().position_updates[0].len(), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn removing_a_track_drops_its_pending_fields() {
    let r = release(ReleaseStatus::Draft);
    let track = complete_track(r.id, 1, "Vol.1");
    let (repo, mut editor) = editor_with(r, vec![track.clone()]);

    editor.set_track_field(track.id, "title", json!("Draft title")).await.unwrap();
    assert_eq!(editor.pending_fields().len(), 1);

    editor.remove_track(track.id).await.unwrap();
    tokio::time::sleep(QUIET * 2).await;

    assert!(editor.pending_fields().is_empty());
    assert!(repo.state().track_patches.is_empty());
  }

  #[tokio::test]
  async fn replace_keeps_identity_and_metadata() {
    let r = release(ReleaseStatus::Draft);
    let track = complete_track(r.id, 1, "Vol.1");
    let (repo, mut editor) = editor_with(r, vec![track.clone()]);

    editor.replace_track_asset(track.id, TrackSource::new("asset://remaster")).await.unwrap();

    let replaced = editor.track(track.id).unwrap();
    assert_eq!(replaced.title, track.title);
    assert_eq!(replaced.isrc, track.isrc);
    assert_eq!(replaced.asset.as_ref().map(|a| a.0.as_str()), Some("asset://remaster"));
    assert_eq!(repo.state().track_patches[0].1.get("asset"), Some(&json!("asset://remaster")));
  }

  #[tokio::test(start_paused = true)]
  async fn refresh_keeps_pending_values_and_tolerates_read_failures() {
    let r = release(ReleaseStatus::Draft);
    let (repo, mut editor) = editor_with(r, vec![]);

    editor.set_release_field("title", json!("Local title")).await.unwrap();
    repo.state().releases[0].status = ReleaseStatus::InReview;

    editor.refresh().await;
    assert_eq!(editor.release().title, "Local title");
    assert_eq!(editor.release().status, ReleaseStatus::InReview);
    assert_eq!(editor.lock_state(), LockState::Locked);

    repo.state().fail_reads = true;
    editor.refresh().await;
    assert_eq!(editor.release().title, "Local title");
  }

  #[tokio::test]
  async fn open_resolves_and_tolerates_missing_tracks() {
    let r = release(ReleaseStatus::Draft);
    let repo = Arc::new(InMemoryRepository::with_release(r.clone()));
    let resolver = ReleaseResolver::new(Arc::clone(&repo));
    let mut ctx = SessionContext::new();

    let editor = ReleaseEditor::open(
      Arc::clone(&repo),
      &resolver,
      &mut ctx,
      &ResolveRequest::by_id(r.id),
      Arc::new(NoGrants),
      EditorSettings::default(),
    )
    .await
    .unwrap();

    assert_eq!(editor.release().id, r.id);
    assert!(editor.tracks().is_empty());
    assert_eq!(ctx.remembered(), Some(r.id));

    let missing = ReleaseEditor::open(
      repo,
      &resolver,
      &mut SessionContext::new(),
      &ResolveRequest::by_slug("nope"),
      Arc::new(NoGrants),
      EditorSettings::default(),
    )
    .await;
    assert!(matches!(missing, Err(EditorError::NotFound)));
  }

  #[tokio::test]
  async fn refresh_drops_tracks_deleted_elsewhere_from_the_tree() {
    let r = release(ReleaseStatus::Draft);
    let tracks = vec![complete_track(r.id, 1, "Vol.1"), complete_track(r.id, 2, "Vol.1")];
    let (kept, gone) = (tracks[0].id, tracks[1].id);
    let (repo, mut editor) = editor_with(r, tracks);
    editor.sync_distribution().await;

    repo.state().tracks.retain(|t| t.id != gone);
    let writes = repo.state().syncs.len();

    editor.refresh().await;
    assert_eq!(editor.tracks().len(), 1);
    assert_eq!(track_ids(editor.distribution()), vec![kept]);
    assert_eq!(repo.state().syncs.len(), writes + 1);

    editor.refresh().await;
    assert_eq!(repo.state().syncs.len(), writes + 1);
  }

  #[tokio::test]
  async fn open_rewrites_a_stored_tree_only_when_it_is_stale() {
    let mut r = release(ReleaseStatus::Draft);
    let tracks = vec![complete_track(r.id, 1, "Vol.1"), complete_track(r.id, 2, "Vol.2")];
    r.distribution = DistributionSynchronizer::default().derive(&r, &tracks, None);

    let repo = Arc::new(InMemoryRepository::with_release(r.clone()));
    repo.add_tracks([tracks[0].clone()]);
    let resolver = ReleaseResolver::new(Arc::clone(&repo));
    let open = |repo: Arc<InMemoryRepository>| {
      let resolver = &resolver;
      let request = ResolveRequest::by_id(r.id);
      async move {
        ReleaseEditor::open(
          repo,
          resolver,
          &mut SessionContext::new(),
          &request,
          Arc::new(NoGrants),
          EditorSettings::default(),
        )
        .await
        .unwrap()
      }
    };

    let editor = open(Arc::clone(&repo)).await;
    assert_eq!(track_ids(editor.distribution()), vec![tracks[0].id]);
    assert_eq!(repo.state().syncs.len(), 1);

    let editor = open(Arc::clone(&repo)).await;
    assert_eq!(track_ids(editor.distribution()), vec![tracks[0].id]);
    assert_eq!(repo.state().syncs.len(), 1);
  }
}
