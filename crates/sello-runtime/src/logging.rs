use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Instala el subscriber global de `tracing`.
///
/// `RUST_LOG` manda sobre `default_directive` (p. ej. `"sello_core=info"`).
/// Devuelve `false` si ya había un subscriber instalado.
pub fn init_tracing(default_directive: &str) -> bool {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

  tracing_subscriber::registry().with(filter).with(fmt::layer()).try_init().is_ok()
}
