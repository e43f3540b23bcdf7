use thiserror::Error;

/// Error types
///
/// `AuthenticationFailed` and `DuplicateVote` are expected domain outcomes
/// (a negative answer, not an infrastructure fault) and are kept distinct
/// from the cryptographic and ledger failure variants so callers can map
/// them separately.
#[derive(Debug, Error)]
pub enum Error {
    #[error("voteguard: key generation failed: {0}")]
    KeyGeneration(&'static str),

    #[error("voteguard: failed to load keypair: {0}")]
    KeyLoad(String),

    #[error("voteguard: missing key configuration value: {0}")]
    MissingKeyConfiguration(&'static str),

    #[error("voteguard: ciphertext is not reducible under this private key")]
    Decryption,

    #[error("voteguard: invalid tally state: {0}")]
    InvalidTallyState(String),

    #[error("voteguard: invalid sharing parameters: threshold {threshold} of {total}")]
    InvalidParameters { threshold: u8, total: u8 },

    #[error("voteguard: credential reconstruction failed: {0}")]
    Reconstruction(&'static str),

    #[error("voteguard: authentication failed")]
    AuthenticationFailed,

    #[error("voteguard: voter has already cast a vote")]
    DuplicateVote,

    #[error("voteguard: ledger error: {0}")]
    Ledger(String),

    #[error("voteguard: credential hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("voteguard: JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
