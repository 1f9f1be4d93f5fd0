//! Server half of the protocol: a registry of named strategies and the dispatch that routes
//! authenticate, unauthenticate, and store calls to them.
//!
//! The registry is transport-agnostic. Hosts wire the four contract endpoints to it in their
//! framework of choice and wrap each request in a [`Context`] carrying an [`HttpAdapter`].

pub mod context;
pub mod registry;
pub mod strategy;

pub use context::*;
pub use registry::*;
pub use strategy::*;
