#[cfg(feature = "frontend_http")]
pub mod api;
pub mod config;
pub mod engine;
pub mod frontends;
pub mod render;

pub use config::format_diagnostics;
pub use config::Config;
pub use config::Diagnostic;
pub use config::LogLevel;
pub use engine::CommandError;
pub use engine::Engine;
pub use engine::EngineHandle;
pub use engine::Intent;
pub use engine::LogEvent;
pub use engine::Severity;
pub use engine::State;
