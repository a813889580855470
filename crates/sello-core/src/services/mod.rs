pub mod artists;
pub mod coalescer;
pub mod distribution;
pub mod edit_lock;
pub mod resolver;
pub mod session;
pub mod tracks;
pub mod validation;

pub use artists::{ArtistOrdering, ArtistReorder};
pub use coalescer::{FieldCoalescer, FieldSink, RepositorySink};
pub use distribution::{DistributionSynchronizer, OverrideEdit};
pub use edit_lock::{EditLock, LockState};
pub use resolver::{GateDecision, ReleaseAddress, ReleaseResolver, ResolutionGate, ResolveRequest, SessionContext, Ticket};
pub use session::{EditorSettings, ReleaseEditor};
pub use tracks::TrackCollection;
pub use validation::ValidationAggregator;
