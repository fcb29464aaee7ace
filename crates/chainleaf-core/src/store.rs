//! Service traits implemented by storage backends (e.g.
//! `chainleaf-store-sqlite`).
//!
//! Higher layers (`chainleaf-api`) depend on these abstractions, not on any
//! concrete backend. All methods return `Send` futures so the traits can be
//! used in multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use crate::{
  DomainError,
  batch::{Batch, BatchQuery, BatchStatus, NewBatch, StatusCount},
  farm::{Farm, FarmQuery, NewFarm},
  ledger::{Authenticity, LedgerEntry, LedgerPayload},
  user::{NewUser, ProfileUpdate, Session},
};

/// Shared error type for a backend implementing the service traits.
pub trait Backend: Send + Sync {
  type Error: std::error::Error + DomainError + Send + Sync + 'static;
}

// ─── Credential store ────────────────────────────────────────────────────────

/// Accounts and the single active session.
pub trait CredentialStore: Backend {
  /// Store a new user and make it the active session.
  ///
  /// Fails with [`crate::Error::DuplicateEmail`] if any stored user (seeded or
  /// registered) already has this email; nothing is written in that case.
  fn register(
    &self,
    user: NewUser,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  /// Fails with [`crate::Error::InvalidCredentials`] unless a stored user
  /// matches both fields exactly.
  fn login(
    &self,
    email: String,
    password: String,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  /// Clear the active session. Idempotent.
  fn logout(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn active_session(
    &self,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + '_;

  /// Update the active user's profile in both the user table and the session.
  ///
  /// Fails with [`crate::Error::UserNotFound`] without a session, and with
  /// [`crate::Error::IncorrectPassword`] when a password change is requested
  /// with a wrong current password.
  fn update_profile(
    &self,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;
}

// ─── Batch registry ──────────────────────────────────────────────────────────

pub trait BatchRegistry: Backend {
  /// All batches in creation order.
  fn list_batches(&self) -> impl Future<Output = Result<Vec<Batch>, Self::Error>> + Send + '_;

  /// Batches matching `query`, in creation order.
  fn search_batches(
    &self,
    query: BatchQuery,
  ) -> impl Future<Output = Result<Vec<Batch>, Self::Error>> + Send + '_;

  /// Fails with [`crate::Error::BatchNotFound`] if `id` is unknown.
  fn get_batch(
    &self,
    id: String,
  ) -> impl Future<Output = Result<Batch, Self::Error>> + Send + '_;

  /// Create a batch in the initial status and record a `create` ledger entry
  /// carrying its full snapshot. Both writes happen atomically.
  fn create_batch(
    &self,
    input: NewBatch,
  ) -> impl Future<Output = Result<Batch, Self::Error>> + Send + '_;

  /// Move a batch to `new_status` at `location` and record an `update` ledger
  /// entry. Any status may follow any other.
  fn update_status(
    &self,
    id: String,
    new_status: BatchStatus,
    location: String,
  ) -> impl Future<Output = Result<Batch, Self::Error>> + Send + '_;

  /// Batch counts per status, every status included.
  fn status_summary(
    &self,
  ) -> impl Future<Output = Result<Vec<StatusCount>, Self::Error>> + Send + '_;
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// The append-only per-batch record.
pub trait Ledger: Backend {
  /// Timestamp, hash and append `payload` to the chain for `batch_id`.
  /// No validation is performed.
  fn append(
    &self,
    batch_id: String,
    payload: LedgerPayload,
  ) -> impl Future<Output = Result<LedgerEntry, Self::Error>> + Send + '_;

  /// Entries for `batch_id` in insertion order; empty if there are none.
  fn history(
    &self,
    batch_id: String,
  ) -> impl Future<Output = Result<Vec<LedgerEntry>, Self::Error>> + Send + '_;

  fn verify_authenticity(
    &self,
    batch_id: String,
  ) -> impl Future<Output = Result<Authenticity, Self::Error>> + Send + '_;
}

// ─── Farms ───────────────────────────────────────────────────────────────────

pub trait FarmDirectory: Backend {
  fn list_farms(&self) -> impl Future<Output = Result<Vec<Farm>, Self::Error>> + Send + '_;

  fn search_farms(
    &self,
    query: FarmQuery,
  ) -> impl Future<Output = Result<Vec<Farm>, Self::Error>> + Send + '_;

  /// Fails with [`crate::Error::FarmNotFound`] if `id` is unknown.
  fn get_farm(&self, id: String) -> impl Future<Output = Result<Farm, Self::Error>> + Send + '_;

  /// Append a farm with the next sequential `FARM-NNN` id.
  fn add_farm(&self, input: NewFarm) -> impl Future<Output = Result<Farm, Self::Error>> + Send + '_;
}

/// Everything the application needs from a backend.
pub trait TraceStore: CredentialStore + BatchRegistry + Ledger + FarmDirectory {}

impl<T> TraceStore for T where T: CredentialStore + BatchRegistry + Ledger + FarmDirectory {}
