pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::ParlanceConfig;
pub use error::{ParlanceError, Result};
pub use events::SessionEvent;
pub use types::*;
