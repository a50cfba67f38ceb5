use crate::ClientId;

/// Failures reported by roster operations.
///
/// Duplicate and missing ids are recoverable and are surfaced to whoever
/// drove the operation (session join logic, control command application).
/// `LocalAlreadyExists` indicates a lifecycle bug upstream; debug builds
/// abort before it is ever returned.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RosterError {
    #[error("duplicated client id {0}")]
    DuplicateIdentity(ClientId),

    #[error("client {0} not found")]
    NotFound(ClientId),

    #[error("local client already exists (id {0})")]
    LocalAlreadyExists(ClientId),
}
