pub mod environment;

pub use environment::{Environment, RealEnvironment};

#[cfg(test)]
pub use environment::MockEnvironment;
