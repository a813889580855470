pub mod contributor;
pub mod distribution;
pub mod fields;
pub mod ids;
pub mod release;
pub mod release_type;
pub mod track;
pub mod validation;

pub use contributor::{Contributor, Role, RoleCatalog};
pub use distribution::{
  Availability, DistributionGroup, DistributionTree, PriceTier, TrackOverride, Volume, VolumeLabel, VolumeTrack,
};
pub use fields::{FieldEntity, FieldKey};
pub use ids::{DistributionGroupId, ReleaseId, TrackId};
pub use release::{Distributor, Exclusivity, Release, ReleaseStatus, Territory};
pub use release_type::ReleaseType;
pub use track::{AssetRef, AudioInfo, ParentalAdvisory, Publishing, Track, TrackMetadata, TrackSource};
pub use validation::{TrackValidation, ValidationCategory, ValidationReport, ValidationState};
