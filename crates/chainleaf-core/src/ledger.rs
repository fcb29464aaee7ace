//! Ledger entries and hash chaining.
//!
//! Every batch has its own append-only chain. Each entry's hash covers the
//! previous entry's hash together with the entry's own content, so rewriting
//! or dropping an entry breaks every hash after it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  Result,
  batch::{Batch, BatchStatus},
};

/// `prev_hash` of the first entry in every chain.
pub const GENESIS_HASH: &str =
  "0x0000000000000000000000000000000000000000000000000000000000000000";

// ─── Payloads ────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LedgerAction {
  Create,
  Update,
}

/// Payload of an `update` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
  pub previous_status: BatchStatus,
  pub new_status:      BatchStatus,
  pub location:        String,
}

/// What an entry records. The variant determines the entry's action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LedgerPayload {
  /// Full snapshot of the batch as created.
  Create(Batch),
  Update(StatusChange),
}

impl LedgerPayload {
  pub fn action(&self) -> LedgerAction {
    match self {
      Self::Create(_) => LedgerAction::Create,
      Self::Update(_) => LedgerAction::Update,
    }
  }

  pub fn to_json(&self) -> Result<String> { Ok(serde_json::to_string(self)?) }
}

// ─── Entry ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
  pub hash:      String,
  pub prev_hash: String,
  pub batch_id:  String,
  pub timestamp: DateTime<Utc>,
  pub action:    LedgerAction,
  pub payload:   LedgerPayload,
}

impl LedgerEntry {
  /// Seal `payload` onto the chain whose last hash is `prev_hash`.
  pub fn seal(
    prev_hash: &str,
    batch_id: &str,
    timestamp: DateTime<Utc>,
    payload: LedgerPayload,
  ) -> Result<Self> {
    let action = payload.action();
    let hash = chain_hash(prev_hash, batch_id, timestamp, action, &payload.to_json()?);
    Ok(Self {
      hash,
      prev_hash: prev_hash.to_owned(),
      batch_id: batch_id.to_owned(),
      timestamp,
      action,
      payload,
    })
  }

  /// Recompute this entry's hash from its content.
  pub fn recompute_hash(&self) -> Result<String> {
    Ok(chain_hash(
      &self.prev_hash,
      &self.batch_id,
      self.timestamp,
      self.action,
      &self.payload.to_json()?,
    ))
  }
}

/// `0x`-prefixed SHA-256 over the previous hash and the entry content.
pub fn chain_hash(
  prev_hash: &str,
  batch_id: &str,
  timestamp: DateTime<Utc>,
  action: LedgerAction,
  payload_json: &str,
) -> String {
  let mut hasher = Sha256::new();
  hasher.update(prev_hash.as_bytes());
  hasher.update([0x1f]);
  hasher.update(batch_id.as_bytes());
  hasher.update([0x1f]);
  hasher.update(timestamp.timestamp_micros().to_le_bytes());
  hasher.update(action.as_ref().as_bytes());
  hasher.update([0x1f]);
  hasher.update(payload_json.as_bytes());
  format!("0x{}", hex::encode(hasher.finalize()))
}

/// Check that `entries` form an intact chain for a single batch: hashes link
/// and match their content, the first entry is a `create` and all later
/// entries are `update`s. An empty history is not a valid chain.
pub fn verify_chain(entries: &[LedgerEntry]) -> bool {
  let Some(first) = entries.first() else {
    return false;
  };
  if first.action != LedgerAction::Create {
    return false;
  }

  let mut prev = GENESIS_HASH;
  for (i, entry) in entries.iter().enumerate() {
    if entry.batch_id != first.batch_id || entry.prev_hash != prev {
      return false;
    }
    if i > 0 && entry.action != LedgerAction::Update {
      return false;
    }
    if entry.action != entry.payload.action() {
      return false;
    }
    match entry.recompute_hash() {
      Ok(h) if h == entry.hash => {}
      _ => return false,
    }
    prev = &entry.hash;
  }
  true
}

// ─── Authenticity ────────────────────────────────────────────────────────────

/// Verdict returned by [`crate::store::Ledger::verify_authenticity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authenticity {
  /// The batch has at least one ledger entry.
  pub authentic:   bool,
  pub reason:      String,
  /// The entries additionally pass [`verify_chain`].
  pub chain_valid: bool,
}

impl Authenticity {
  pub fn from_history(entries: &[LedgerEntry]) -> Self {
    let authentic = !entries.is_empty();
    Self {
      authentic,
      reason: if authentic {
        "Batch verified on blockchain".to_owned()
      } else {
        "Batch not found on blockchain".to_owned()
      },
      chain_valid: verify_chain(entries),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, TimeZone};

  use super::*;

  fn batch() -> Batch {
    let at = Utc.with_ymd_and_hms(2023, 8, 16, 9, 30, 0).unwrap();
    Batch {
      id:            "BATCH-001".into(),
      farm_id:       "FARM-001".into(),
      harvest_date:  NaiveDate::from_ymd_opt(2023, 8, 15).unwrap(),
      variety:       "Virginia Gold".into(),
      quantity:      "5000 kg".into(),
      grade:         "Premium".into(),
      status:        BatchStatus::Harvested,
      created_at:    at,
      last_updated:  at,
      last_location: None,
    }
  }

  fn chain() -> Vec<LedgerEntry> {
    let b = batch();
    let create =
      LedgerEntry::seal(GENESIS_HASH, &b.id, b.created_at, LedgerPayload::Create(b.clone()))
        .unwrap();
    let update = LedgerEntry::seal(
      &create.hash,
      &b.id,
      b.created_at + chrono::Duration::days(3),
      LedgerPayload::Update(StatusChange {
        previous_status: BatchStatus::Harvested,
        new_status:      BatchStatus::Curing,
        location:        "Curing Barn".into(),
      }),
    )
    .unwrap();
    vec![create, update]
  }

  #[test]
  fn sealed_chain_verifies() {
    let entries = chain();
    assert!(entries[0].hash.starts_with("0x"));
    assert_eq!(entries[0].hash.len(), 66);
    assert_eq!(entries[1].prev_hash, entries[0].hash);
    assert!(verify_chain(&entries));
  }

  #[test]
  fn tampered_payload_breaks_chain() {
    let mut entries = chain();
    if let LedgerPayload::Update(change) = &mut entries[1].payload {
      change.location = "Somewhere Else".into();
    }
    assert!(!verify_chain(&entries));
  }

  #[test]
  fn dropped_entry_breaks_chain() {
    let entries = chain();
    assert!(!verify_chain(&entries[1..]));
  }

  #[test]
  fn empty_history_is_not_authentic() {
    let verdict = Authenticity::from_history(&[]);
    assert!(!verdict.authentic);
    assert!(!verdict.chain_valid);
    assert_eq!(verdict.reason, "Batch not found on blockchain");
  }

  #[test]
  fn payload_json_is_untagged() {
    let entries = chain();
    let json = serde_json::to_value(&entries[1]).unwrap();
    assert_eq!(json["action"], "update");
    assert_eq!(json["payload"]["previousStatus"], "harvested");
    assert_eq!(json["payload"]["newStatus"], "curing");

    let back: LedgerEntry = serde_json::from_value(json).unwrap();
    assert_eq!(back, entries[1]);
  }
}
