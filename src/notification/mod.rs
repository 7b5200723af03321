pub mod service;

pub use service::{AppNotificationService, BatchReadFailure, BatchReadReport};
