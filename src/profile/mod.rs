//! Profile Cache Module
//!
//! Cache-aside reads of full user profiles with single-flight protection per email.
//!
//! ## Lookup Protocol
//! 1. **Cache First**: Read `profile_email_<email>`. A hit is returned as is; a corrupt
//!    payload is discarded and treated as a miss.
//! 2. **Locked Path**: Take the lock stripe for the email with a bounded wait.
//! 3. **Double Check**: Re-read the cache under the lock, since another flight may have filled it.
//! 4. **Load & Fill**: Query the durable store and cache the record for one hour.
//! 5. **Back Off**: If the lock is busy past its timeout, sleep and start over from step 1,
//!    up to a fixed number of attempts.
//!
//! The lock is process-local. Several processes may still query the store for the
//! same email at once; the read is idempotent and cache writes are last-write-wins.

pub mod handlers;
pub mod locks;
pub mod protocol;
pub mod service;

pub use locks::LockStripes;
pub use service::{PROFILE_KEY_PREFIX, ProfileService, profile_key};

#[cfg(test)]
mod tests;
