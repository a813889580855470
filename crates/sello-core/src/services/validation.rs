use crate::domain::{
  Contributor, ParentalAdvisory, RoleCatalog, Track, TrackValidation, ValidationReport, ValidationState,
};

/// Calcula los avisos de completitud de las pistas.
///
/// Los avisos son orientativos: nunca bloquean una escritura.
#[derive(Debug, Clone, Default)]
pub struct ValidationAggregator {
  roles: RoleCatalog,
}

impl ValidationAggregator {
  pub fn new(roles: RoleCatalog) -> Self {
    Self { roles }
  }

  pub fn roles(&self) -> &RoleCatalog {
    &self.roles
  }

  /// OR de todas las pistas; sin pistas, todas las categorías están incompletas.
  pub fn evaluate(&self, tracks: &[Track]) -> ValidationReport {
    if tracks.is_empty() {
      return ValidationReport::default();
    }

    let per_track: Vec<TrackValidation> =
      tracks.iter().map(|t| TrackValidation { track_id: t.id, state: self.check_track(t) }).collect();

    let mut release = ValidationState::default();
    for t in &per_track {
      release |= t.state;
    }

    ValidationReport { release, tracks: per_track }
  }

  pub fn check_track(&self, track: &Track) -> ValidationState {
    ValidationState {
      details: blank(&track.title)
        || track.artists.iter().all(|a| a.trim().is_empty())
        || matches!(track.parental_advisory, None | Some(ParentalAdvisory::Unset)),
      contributors: track.contributors.is_empty() || track.contributors.iter().any(|c| self.contributor_incomplete(c)),
      metadata: blank(&track.metadata.primary_genre)
        || blank(&track.metadata.metadata_language)
        || blank(&track.metadata.metadata_language_country)
        || blank(&track.metadata.audio_language)
        || track.metadata.release_year.is_none(),
      audio: blank(&track.audio.recording_country) || blank(&track.audio.track_type),
      publishing: blank(&track.publishing.publisher_name) || blank(&track.publishing.work_title),
      isrc: blank(&track.isrc),
    }
  }

  /// Solo los roles de la lista con subtipo exigen `role_type`.
  fn contributor_incomplete(&self, contributor: &Contributor) -> bool {
    if blank(&contributor.category) {
      return true;
    }

    match contributor.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
      None => true,
      Some(role) => self.roles.resolve(role).requires_subtype() && blank(&contributor.role_type),
    }
  }
}

fn blank(value: &Option<String>) -> bool {
  value.as_deref().is_none_or(|v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{ReleaseId, ValidationCategory};
  use crate::testing::complete_track;

  fn contributor(role: &str, role_type: Option<&str>) -> Contributor {
    Contributor {
      name: "Lu".into(),
      category: Some("Studio".into()),
      role: Some(role.into()),
      role_type: role_type.map(str::to_string),
    }
  }

  #[test]
  fn empty_release_is_incomplete_everywhere() {
    let report = ValidationAggregator::default().evaluate(&[]);
    assert_eq!(report.release, ValidationState::all_incomplete());
    assert!(report.tracks.is_empty());
  }

  #[test]
  fn complete_tracks_report_nothing() {
    let release_id = ReleaseId::new();
    let tracks = vec![complete_track(release_id, 1, "Vol.1"), complete_track(release_id, 2, "Vol.2")];

    let report = ValidationAggregator::default().evaluate(&tracks);
    assert!(report.release.is_complete());
    assert!(report.tracks.iter().all(|t| t.state.is_complete()));
  }

  #[test]
  fn one_missing_isrc_flags_only_isrc() {
    let release_id = ReleaseId::new();
    let t1 = complete_track(release_id, 1, "Vol.1");
    let mut t2 = complete_track(release_id, 2, "Vol.2");
    t2.isrc = Some("  ".into());

    let report = ValidationAggregator::default().evaluate(&[t1.clone(), t2.clone()]);

    assert_eq!(report.release.incomplete_categories().collect::<Vec<_>>(), vec![ValidationCategory::Isrc]);
    assert!(report.tracks.iter().find(|t| t.track_id == t1.id).unwrap().state.is_complete());
    assert!(report.tracks.iter().find(|t| t.track_id == t2.id).unwrap().state.isrc);
  }

  #[test]
  fn role_type_is_required_only_for_typed_roles() {
    let aggregator = ValidationAggregator::default();
    let mut track = complete_track(ReleaseId::new(), 1, "Vol.1");

    track.contributors = vec![contributor("Producer", None)];
    assert!(aggregator.check_track(&track).contributors);

    track.contributors = vec![contributor("Engineer", None)];
    assert!(!aggregator.check_track(&track).contributors);

    track.contributors = vec![contributor("Producer", Some("Executive Producer"))];
    assert!(!aggregator.check_track(&track).contributors);
  }

  #[test]
  fn contributors_need_category_and_role() {
    let aggregator = ValidationAggregator::default();
    let mut track = complete_track(ReleaseId::new(), 1, "Vol.1");

    track.contributors = Vec::new();
    assert!(aggregator.check_track(&track).contributors);

    let mut missing_category = contributor("Engineer", None);
    missing_category.category = None;
    track.contributors = vec![missing_category];
    assert!(aggregator.check_track(&track).contributors);

    let mut missing_role = contributor("Engineer", None);
    missing_role.role = Some(String::new());
    track.contributors = vec![missing_role];
    assert!(aggregator.check_track(&track).contributors);
  }

  #[test]
  fn details_flag_placeholder_advisory_and_missing_artists() {
    let aggregator = ValidationAggregator::default();
    let mut track = complete_track(ReleaseId::new(), 1, "Vol.1");

    track.parental_advisory = Some(ParentalAdvisory::Unset);
    assert!(aggregator.check_track(&track).details);

    track.parental_advisory = Some(ParentalAdvisory::Clean);
    track.artists.clear();
    assert!(aggregator.check_track(&track).details);
  }

  #[test]
  fn metadata_audio_and_publishing_predicates() {
    let aggregator = ValidationAggregator::default();
    let mut track = complete_track(ReleaseId::new(), 1, "Vol.1");

    track.metadata.release_year = None;
    track.audio.track_type = None;
    track.publishing.work_title = Some(String::new());

    let state = aggregator.check_track(&track);
    assert!(state.metadata && state.audio && state.publishing);
    assert!(!state.details && !state.contributors && !state.isrc);
  }
}
