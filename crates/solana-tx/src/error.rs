use thiserror::Error;

/// Result alias used throughout the crate.
pub type TxResult<T> = Result<T, TxError>;

/// Transaction construction, serialization and signing errors.
///
/// None of these are transient. A caller that hits one should rebuild the
/// message from fresh inputs rather than retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    #[error("missing signature: expected {expected}, got {provided} (missing signer indices {missing:?})")]
    MissingSignature {
        expected: usize,
        provided: usize,
        missing: Vec<usize>,
    },

    #[error("invalid signature at signer indices {indices:?}: {reason}")]
    InvalidSignature { indices: Vec<usize>, reason: String },

    #[error("transaction too large: {size} bytes exceeds maximum of {max} by {overflow}")]
    TransactionTooLarge {
        size: usize,
        max: usize,
        overflow: usize,
    },

    #[error("instruction {instruction} references account index {index}, but the table has {num_accounts} accounts")]
    AccountIndexOutOfRange {
        instruction: usize,
        index: u8,
        num_accounts: usize,
    },

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("invalid instruction: {0}")]
    InvalidInstruction(String),

    #[error("signer {0} is not a required signer of this message")]
    SignerNotFound(String),

    #[error("invalid cluster config: {0}")]
    InvalidConfig(String),
}
