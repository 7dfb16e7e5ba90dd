//! Registration Coordinator Module
//!
//! Orchestrates check-then-register against the Membership Index and the durable
//! user store.
//!
//! ## Registration State Machine
//! `START -> CHECKED -> BIT_SET -> PERSISTED` on success, or
//! `START -> CHECKED -> BIT_SET -> ROLLED_BACK` when the store rejects the row.
//!
//! 1. **Check**: Blank emails and already-set bits end the request with no side effects.
//! 2. **Optimistic Set**: The offset bit is set before the insert, remembering its prior value.
//! 3. **Persist**: The row is inserted. The store's unique constraints are the final arbiter.
//! 4. **Compensate**: On a uniqueness conflict the bit is restored to its prior value,
//!    unless a stored row owns the offset. A row and its bit always agree afterwards.
//!
//! Between steps 2 and 4 a concurrent reader may see the bit set for an email
//! whose insert is about to fail. That false positive is bounded by one insert
//! round trip and is accepted.

pub mod handlers;
pub mod protocol;
pub mod service;
pub mod types;

pub use service::RegistrationService;
pub use types::{MembershipPolicy, RegisterOutcome};
