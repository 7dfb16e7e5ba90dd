//! Membership Index Module
//!
//! A single named bit-vector in the remote store, addressed by email offset.
//! Bit = 1 means "an email hashing to this offset has been registered".
//!
//! ## Properties
//! - **Monotonic**: Bits are set on registration and only cleared as compensation
//!   for a failed durable write. There is no unregister.
//! - **Uncoordinated**: Registration, reconciliation and rollback all mutate the
//!   bitmap without locking. Every operation is idempotent on its own bit, so no
//!   per-bit lock exists.
//! - **Honest failures**: A store outage is an error, never a "not registered".

pub mod service;

pub use service::{EMAIL_HASH_KEY, MembershipIndex};
