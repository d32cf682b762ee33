pub mod command;
pub mod constants;
pub mod error;
pub mod event;

pub use command::SystemCommand;
pub use error::{Error, Result};
pub use event::{Event, EventType};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
