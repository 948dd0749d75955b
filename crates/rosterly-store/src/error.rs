//! Error types for the record store.

/// Errors that can occur during record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file (or a payload) is not valid JSON for the dataset.
    #[error("store serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A user with this email already exists.
    #[error("duplicate email: {0}")]
    DuplicateEmail(String),

    /// A student with this student number already exists (any owner).
    #[error("duplicate student number: {0}")]
    DuplicateStudentNumber(String),

    /// Seeding the administrator account failed to hash its password.
    #[error("password hash error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}
