use std::fmt::Display;

use error_stack::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// No row matches the id, or the id is below the minimum a row can have.
    NotFound,
    /// The version guard of an update matched no row.
    Concurrency,
    /// Field-level constraint violation. The report carries a `ValidationErrors` attachment.
    Validation,
    /// A textual identifier could not be decoded.
    InvalidFormat,
    Timeout,
    Internal,
}

impl KernelError {
    /// Failures of the underlying store, as opposed to outcomes about the data itself.
    ///
    /// A storage failure says nothing about the row: the caller may retry, but must not
    /// assume the write did or did not happen.
    pub fn is_storage(&self) -> bool {
        matches!(self, KernelError::Timeout | KernelError::Internal)
    }
}

impl Display for KernelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelError::NotFound => write!(f, "Record not found"),
            KernelError::Concurrency => write!(f, "Edit conflict"),
            KernelError::Validation => write!(f, "Validation failed"),
            KernelError::InvalidFormat => write!(f, "Invalid format"),
            KernelError::Timeout => write!(f, "Process timed out"),
            KernelError::Internal => write!(f, "Internal kernel error"),
        }
    }
}

impl Context for KernelError {}
