//! # ciphercore-core
//!
//! Account and message records, storage traits, and the [`Messenger`]
//! service that drives key custody and message envelopes from
//! `ciphercore-crypto` over any store implementing [`AccountStore`] and
//! [`MessageStore`].

pub mod error;
pub mod logging;
pub mod memory;
pub mod models;
pub mod service;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use models::*;
pub use service::Messenger;
pub use traits::*;
