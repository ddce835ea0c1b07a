pub mod automation;
pub mod command;
pub mod device;
mod driver;
mod engine;
mod error;
pub mod event;
mod intent;
pub mod simulator;
pub mod state;
#[cfg(test)]
mod testing;

pub use device::set_device;
pub use device::DeviceId;
pub use driver::spawn;
pub use driver::EngineHandle;
pub use engine::Engine;
pub use error::CommandError;
pub use error::EngineError;
pub use event::LogBook;
pub use event::LogEntry;
pub use event::LogEvent;
pub use event::LogSink;
pub use event::Severity;
pub use intent::Intent;
pub use intent::TRAFFIC_MODE_KEY;
pub use state::History;
pub use state::State;
pub use state::TrafficMode;
