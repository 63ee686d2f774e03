pub mod audio;
pub mod config;
pub mod core;
pub mod handlers;
pub mod mic;
pub mod relay;
pub mod routes;
pub mod state;

// Re-export commonly used items for convenience
pub use crate::config::RelayConfig;
pub use crate::core::stt::{SttError, TranscriptEvent};
pub use crate::relay::run_relay;
pub use crate::state::AppState;
