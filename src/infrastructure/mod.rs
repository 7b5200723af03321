pub mod error;
pub mod logging;

pub use error::NotifyError;
pub use logging::{setup_logging, LogFormat, LoggingConfig};
