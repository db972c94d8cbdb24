pub mod config;
pub mod error;
pub mod random;
pub mod types;

pub use config::{GameConfig, Site};
pub use error::{IntrusionError, Result};
pub use random::{EntityRng, RngStreams};
pub use types::{Tick, Vec2};
