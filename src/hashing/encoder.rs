use crate::error::{Error, Result};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Bit position in the Membership Index. Always within `0..=i32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Offset(u32);

impl Offset {
    pub const MAX: u32 = i32::MAX as u32;

    /// Returns `None` when `value` does not fit in 31 bits.
    pub fn new(value: u32) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Offset {
    type Error = String;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        Offset::new(value).ok_or_else(|| format!("offset {} exceeds 31 bits", value))
    }
}

impl From<Offset> for u32 {
    fn from(offset: Offset) -> Self {
        offset.0
    }
}

impl std::fmt::Display for Offset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Computes the bit offset for an email.
///
/// `i32::MIN` has no positive counterpart, so it saturates to `i32::MAX`.
pub fn email_offset(email: &str) -> Offset {
    let digest = Sha256::digest(email.as_bytes());
    offset_from_prefix([digest[0], digest[1], digest[2], digest[3]])
}

pub(crate) fn offset_from_prefix(prefix: [u8; 4]) -> Offset {
    let raw = i32::from_le_bytes(prefix);
    Offset(raw.saturating_abs() as u32)
}

/// FIPS 180-2 known answer for SHA-256("abc").
const SELF_TEST_INPUT: &[u8] = b"abc";
const SELF_TEST_DIGEST: [u8; 32] = [
    0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d, 0xae, 0x22,
    0x23, 0xb0, 0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10, 0xff, 0x61, 0xf2, 0x00,
    0x15, 0xad,
];

/// Startup check of the digest primitive. Offsets must never be derived from a
/// broken or substituted hash.
pub fn verify_digest() -> Result<()> {
    let digest = Sha256::digest(SELF_TEST_INPUT);
    if digest.as_slice() != SELF_TEST_DIGEST {
        tracing::error!("SHA-256 known-answer test failed");
        return Err(Error::DigestSelfTest);
    }
    tracing::debug!("SHA-256 known-answer test passed");
    Ok(())
}
