//! Command parameters and connection configuration.

pub mod params;
pub mod resolver;

pub use params::Params;
pub use resolver::{AuthType, ConfigResolver, Configuration};
