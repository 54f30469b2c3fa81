use std::fmt;

/// Error taxonomy shared by domain mutators, persistence adapters and
/// application services. Hand-rolled rather than derived: each variant
/// carries exactly the context a caller needs to react to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    NotFound { entity: &'static str, id: String },
    AlreadyExists { entity: &'static str, id: String },
    VersionAlreadyExists { id: String },
    AssetSlotUnknown { id: String, slot: String },
    DuplicateReference { id: String, reference: String },
    UnknownReference { id: String, reference: String },
    AlreadyDeleted { entity: &'static str, id: String },
    ConcurrentWrite { id: String, expected: u64, actual: u64 },
    /// A backend call failed in a way the retry decorator should retry
    /// (connection reset, timeout, ...). Adapters raise this kind only
    /// for failures they know are transient.
    Transient(String),
    RetryableExhausted { attempts: u32, message: String },
    ChangeLogAppendFailed { message: String },
    Validation { message: String },
    Replay { message: String },
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::NotFound { entity, id } => write!(f, "{entity} {id} not found"),
            KernelError::AlreadyExists { entity, id } => write!(f, "{entity} {id} already exists"),
            KernelError::VersionAlreadyExists { id } => {
                write!(f, "document {id} already has this version")
            }
            KernelError::AssetSlotUnknown { id, slot } => {
                write!(f, "document {id} has no asset slot named {slot}")
            }
            KernelError::DuplicateReference { id, reference } => {
                write!(f, "{id} already references {reference}")
            }
            KernelError::UnknownReference { id, reference } => {
                write!(f, "{id} has no reference to {reference}")
            }
            KernelError::AlreadyDeleted { entity, id } => {
                write!(f, "{entity} {id} is already deleted")
            }
            KernelError::ConcurrentWrite { id, expected, actual } => write!(
                f,
                "concurrent write detected for {id} (expected version {expected}, got {actual})"
            ),
            KernelError::Transient(message) => write!(f, "transient backend error: {message}"),
            KernelError::RetryableExhausted { attempts, message } => write!(
                f,
                "backend call failed after {attempts} attempts: {message}"
            ),
            KernelError::ChangeLogAppendFailed { message } => {
                write!(f, "change log append failed: {message}")
            }
            KernelError::Validation { message } => write!(f, "validation error: {message}"),
            KernelError::Replay { message } => write!(f, "replay error: {message}"),
        }
    }
}

impl std::error::Error for KernelError {}

pub type KernelResult<T> = Result<T, KernelError>;
