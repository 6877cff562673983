//! Library surface for telemdash: device transport, telemetry normalization,
//! the polling session core, trend selection, command dispatch and file logging.

pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod filelog;
pub mod history;
pub mod profiles;
pub mod session;
pub mod telemetry;
pub mod transport;
pub mod trends;

pub use command::{CommandOutcome, CommandStatus};
pub use config::{DeviceConfig, PollInterval};
pub use error::{LogIoError, TransportError, ValidationError};
pub use session::{ConnectionState, Dashboard, SessionOptions, SessionState};
pub use transport::{DeviceTransport, HttpTransport};
