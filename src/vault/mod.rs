//! HashiCorp Vault access.
//!
//! Commands only see the [`VaultApi`] capability; [`ClientFactory`] picks the
//! authentication backend and [`HttpConnector`] supplies the real transport.

pub mod api;
mod client;
mod error;
mod http;

pub use api::{Connector, VaultApi};
pub use client::ClientFactory;
pub use error::VaultError;
pub use http::HttpConnector;

#[cfg(test)]
pub use api::MockVault;
