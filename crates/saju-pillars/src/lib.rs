pub mod engine;
pub mod error;
pub mod luck;
pub mod remote;
pub mod service;
pub mod strength;
pub mod tables;
pub mod types;
pub mod yukchin;

pub use error::{PillarError, Result};
pub use service::{PillarCache, PillarService};
pub use types::{Pillar, Pillars};
