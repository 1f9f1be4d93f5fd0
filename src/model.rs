//! Wire-level data model shared by the client engine and the server registry.

pub mod action;
pub mod authorization;
pub mod result;
pub mod secret;
pub mod timestamp;

pub use action::*;
pub use authorization::*;
pub use result::*;
pub use secret::*;
