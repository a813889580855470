//! Adaptadores entre la configuración en disco y el núcleo del editor.

pub mod config;
pub mod logging;
pub mod session_store;

pub use config::EditorConfig;
pub use logging::init_tracing;
pub use session_store::TomlSessionStore;
