use crate::error::UniqueField;
use crate::storage::UserRecord;

/// How a set bit is turned into a membership answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MembershipPolicy {
    /// A set bit means registered. Offset collisions between different emails
    /// read as false positives.
    #[default]
    BitOnly,
    /// A set bit is confirmed by reading the row owning that offset and
    /// comparing emails. Costs one store read per positive answer.
    Verified,
}

/// Terminal state of a registration request.
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    /// PERSISTED: bit set and row inserted.
    Registered(UserRecord),
    /// Stopped at CHECKED: the index already reports this email.
    AlreadyRegistered,
    /// ROLLED_BACK: the store rejected the row on a unique column.
    Conflict(UniqueField),
    /// Blank email, rejected without I/O.
    InvalidEmail,
}

impl RegisterOutcome {
    pub fn is_registered(&self) -> bool {
        matches!(self, RegisterOutcome::Registered(_))
    }
}

/// Emails consisting only of whitespace are rejected. The value itself is
/// never trimmed or case-folded.
pub fn is_blank(email: &str) -> bool {
    email.trim().is_empty()
}
