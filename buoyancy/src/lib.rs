//! Flotation for vehicle parts: a depth-scaled lift heuristic, water drag,
//! splash/impact handling, and inflate/deflate state shared by the buoyancy
//! modules of a part.

pub mod config;
pub mod constants;
pub mod error;
pub mod force;
pub mod host;
pub mod inflation;
pub mod part;
pub mod plugin;
pub mod view;

pub use config::BuoyancyConfig;
pub use error::{BuoyancyError, BuoyancyResult};
pub use host::{BuoyancyHost, TickContext, TickResult};
pub use inflation::{BuoyancyCommand, BuoyancyState, InflationEffect, InflationState, PersistedState};
pub use part::{ModuleSpec, PartBuoyancy};
pub use plugin::{BuoyancyPlugin, BuoyantPart};
