//! Error types for `chainleaf-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("email already registered: {0}")]
  DuplicateEmail(String),

  #[error("invalid email or password")]
  InvalidCredentials,

  #[error("current password is incorrect")]
  IncorrectPassword,

  #[error("user not found")]
  UserNotFound,

  #[error("batch not found: {0}")]
  BatchNotFound(String),

  #[error("farm not found: {0}")]
  FarmNotFound(String),

  #[error("unknown batch status: {0:?}")]
  InvalidStatus(String),

  #[error("invalid QR code")]
  InvalidQrCode,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Implemented by backend error types so higher layers can recover the
/// domain failure (if any) behind a storage error.
pub trait DomainError {
  /// The domain error carried by `self`, or `None` for infrastructure
  /// failures (I/O, database, decoding).
  fn domain(&self) -> Option<&Error>;
}

impl DomainError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}

impl DomainError for std::convert::Infallible {
  fn domain(&self) -> Option<&Error> { match *self {} }
}
