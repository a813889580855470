pub mod access;
pub mod release_repository;
pub mod session_store;

pub use access::{AccessGrants, NoGrants};
pub use release_repository::{FieldPatch, ReleaseRepository, RepoError, TrackPosition};
pub use session_store::SessionStore;
