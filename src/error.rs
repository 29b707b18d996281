use thiserror::Error;

use crate::types::Checksum;

/// Failures of a single coercion call. None of them leave shared state behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    #[error("only {len} byte(s) available for a {width}-byte patch window")]
    BufferTooShortForWindow { len: usize, width: usize },

    #[error("insertion offset {offset} is outside a {len}-byte buffer")]
    InsertionOffsetOutOfRange { offset: usize, len: usize },

    /// The window bits do not span the checksum space. Unreachable for a
    /// 4-byte window; seeing it means the model construction is broken.
    #[error("patch window with {trailing} trailing byte(s) produced a singular linear system")]
    SingularLinearSystem { trailing: usize },

    /// The spliced buffer failed its recheck. The buffer must not be persisted.
    #[error("checksum verification failed after patching: expected {expected}, got {actual}")]
    VerificationMismatch {
        expected: Checksum,
        actual: Checksum,
    },
}

pub type CoercionResult<T> = Result<T, CoercionError>;
