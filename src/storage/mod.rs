//! Storage Module
//!
//! The external collaborators the coordinators talk to, expressed as async traits,
//! plus the in-memory implementations used by the binary and the tests.
//!
//! ## Collaborators
//! - **`BitStore`**: Remote bit-addressable store (get-bit / set-bit by key and offset).
//! - **`CacheStore`**: Namespaced string values with expiration, served by the same remote store.
//! - **`UserStore`**: Durable relational store of user records with unique `email` and `email_hash`.
//!
//! Every call made through these traits by a coordinator is wrapped in [`bounded`],
//! so a stalled collaborator surfaces as `Error::Timeout` instead of hanging the request.

pub mod backend;
pub mod memory;
pub mod types;
pub mod users;

pub use backend::{BitStore, CacheStore, UserStore, bounded};
pub use memory::MemoryRemoteStore;
pub use types::{BatchInsert, NewUser, UserId, UserRecord};
pub use users::MemoryUserStore;
