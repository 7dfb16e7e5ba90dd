//! Email Registry Library
//!
//! Tracks which email addresses are registered using a hash-indexed bitmap in a
//! remote store as a fast existence index, backed by a durable user store that
//! remains the source of truth.
//!
//! ## Architecture Modules
//! - **`hashing`**: SHA-256 based email-to-offset encoding.
//! - **`storage`**: Collaborator traits (bit store, cache, user store) and their
//!   in-memory implementations.
//! - **`index`**: The Membership Index bitmap and its test/set protocol.
//! - **`registration`**: Check-then-register with optimistic bit set and
//!   compensating rollback.
//! - **`profile`**: Cache-aside profile lookups with striped single-flight locks.
//! - **`pipeline`**: Bulk generate-and-dump and reconcile-to-index jobs.
//! - **`config`** / **`error`**: Tunables and the shared error type.

pub mod config;
pub mod error;
pub mod hashing;
pub mod index;
pub mod pipeline;
pub mod profile;
pub mod registration;
pub mod storage;
