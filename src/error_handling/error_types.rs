// src/error_handling/error_types.rs
//! Error types for the Plasma root chain
//!
//! `RootChainError` is the error every public operation of the root chain
//! returns. The Merkle validator and the exit queue have their own smaller
//! error enums which convert into it.

use solana_program::program_error::ProgramError;
use thiserror::Error;

/// Base error type for root chain operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RootChainError {
    /// Caller is not allowed to perform the operation
    #[error("Unauthorized operation: {0}")]
    Unauthorized(String),

    /// Attached value does not match what the operation requires
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Merkle inclusion proof failed or was malformed
    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    /// Signature or confirmation signature check failed
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Referenced block, deposit or child block number is unknown or outdated
    #[error("Stale reference: {0}")]
    StaleReference(String),

    /// An exit already exists for the position
    #[error("Duplicate exit: {0}")]
    DuplicateExit(String),

    /// Bond below the minimum, or nothing to withdraw
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// No pending exit at the position
    #[error("Exit not found: {0}")]
    ExitNotFound(String),

    /// Transaction bytes could not be decoded or do not have the expected shape
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    /// An input of the exited transaction is itself being exited
    #[error("Conflicting input exit: {0}")]
    ConflictingInputExit(String),

    /// Block submitted before presumed finality of the previous one
    #[error("Premature submission: {0}")]
    PrematureSubmission(String),

    /// No deposit slot left before the next child block
    #[error("Deposit lane exhausted: {0}")]
    DepositLaneExhausted(String),

    /// Outbound value transfer failed
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// Snapshot could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal invariant broken
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RootChainError {
    /// Convert to error code
    pub fn to_error_code(&self) -> u32 {
        match self {
            RootChainError::Unauthorized(_) => 1000,
            RootChainError::InvalidAmount(_) => 1001,
            RootChainError::InvalidProof(_) => 1002,
            RootChainError::InvalidSignature(_) => 1003,
            RootChainError::StaleReference(_) => 1004,
            RootChainError::DuplicateExit(_) => 1005,
            RootChainError::InsufficientFunds(_) => 1006,
            RootChainError::ExitNotFound(_) => 1007,
            RootChainError::InvalidTransaction(_) => 1008,
            RootChainError::ConflictingInputExit(_) => 1009,
            RootChainError::PrematureSubmission(_) => 1010,
            RootChainError::DepositLaneExhausted(_) => 1011,
            RootChainError::TransferFailed(_) => 1012,
            RootChainError::Storage(_) => 1013,
            RootChainError::Configuration(_) => 1014,
            RootChainError::Internal(_) => 1015,
        }
    }

    /// Convert to a Solana program error carrying the error code
    pub fn to_program_error(&self) -> ProgramError {
        ProgramError::Custom(self.to_error_code())
    }
}

impl From<RootChainError> for ProgramError {
    fn from(error: RootChainError) -> Self {
        error.to_program_error()
    }
}

impl From<std::io::Error> for RootChainError {
    fn from(error: std::io::Error) -> Self {
        RootChainError::Storage(error.to_string())
    }
}

impl From<serde_json::Error> for RootChainError {
    fn from(error: serde_json::Error) -> Self {
        RootChainError::Configuration(error.to_string())
    }
}

/// Merkle proof and signature validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidatorError {
    /// Proof is not exactly depth * 32 bytes
    #[error("Invalid proof length: expected {expected} bytes, got {actual}")]
    InvalidProofLength { expected: usize, actual: usize },

    /// Requested byte range lies outside the buffer
    #[error("Slice out of bounds: offset {offset} length {length} in {available} bytes")]
    SliceOutOfBounds {
        offset: usize,
        length: usize,
        available: usize,
    },

    /// Leaf index does not fit in the tree
    #[error("Leaf index out of range: {0}")]
    IndexOutOfRange(u64),

    /// More leaves than the fixed-depth tree holds
    #[error("Too many leaves: {0}")]
    TooManyLeaves(usize),

    /// Signature is not 65 bytes (or a signature blob is not two of them)
    #[error("Invalid signature length: {0}")]
    InvalidSignatureLength(usize),

    /// Recovery byte is not 0, 1, 27 or 28
    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// All-zero signature where a real one is required
    #[error("Empty signature")]
    EmptySignature,

    /// Public key recovery failed
    #[error("Signature recovery failed")]
    RecoveryFailed,
}

impl ValidatorError {
    /// Whether the error concerns a signature rather than a proof
    pub fn is_signature_error(&self) -> bool {
        matches!(
            self,
            ValidatorError::InvalidSignatureLength(_)
                | ValidatorError::InvalidRecoveryId(_)
                | ValidatorError::EmptySignature
                | ValidatorError::RecoveryFailed
        )
    }
}

impl From<ValidatorError> for RootChainError {
    fn from(error: ValidatorError) -> Self {
        if error.is_signature_error() {
            RootChainError::InvalidSignature(error.to_string())
        } else {
            RootChainError::InvalidProof(error.to_string())
        }
    }
}

/// Exit priority queue errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Caller is not the queue owner
    #[error("Caller is not the queue owner")]
    Unauthorized,

    /// Queue holds no entries
    #[error("Queue is empty")]
    Empty,

    /// No entry for the position
    #[error("No queue entry for position {0}")]
    NotFound(u64),
}

impl From<QueueError> for RootChainError {
    fn from(error: QueueError) -> Self {
        match error {
            QueueError::Unauthorized => RootChainError::Unauthorized(error.to_string()),
            _ => RootChainError::Internal(error.to_string()),
        }
    }
}

/// Result type for root chain operations
pub type RootChainResult<T> = Result<T, RootChainError>;
