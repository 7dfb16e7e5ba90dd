//! Hash Encoder Module
//!
//! Maps an email address to a deterministic bit offset in the Membership Index.
//!
//! ## Encoding
//! 1. **Digest**: SHA-256 over the UTF-8 bytes of the email, exactly as supplied
//!    (no case folding or trimming).
//! 2. **Truncation**: The first 4 digest bytes are read as a little-endian `i32`.
//! 3. **Range**: The saturating absolute value keeps every offset within 31 bits.
//!
//! Distinct emails may share an offset. Offset equality is necessary but not
//! sufficient for identity.

pub mod encoder;

pub use encoder::{Offset, email_offset, verify_digest};

#[cfg(test)]
mod tests;
