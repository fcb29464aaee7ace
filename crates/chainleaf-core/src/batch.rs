//! Batches and their status workflow.
//!
//! A batch moves through the supply chain by status updates. The registry
//! accepts any status after any other (including leaving `Recalled`); only
//! membership in [`BatchStatus`] is checked.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumCount, EnumIter, EnumString, IntoEnumIterator as _};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Supply-chain stage, in the order a batch normally passes through them.
/// `Recalled` sits outside that order and can be entered from any stage.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumCount,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BatchStatus {
  Harvested,
  Curing,
  Processing,
  Packaging,
  Distribution,
  Retail,
  Recalled,
}

impl BatchStatus {
  /// The status assigned to every newly created batch.
  pub const INITIAL: Self = Self::Harvested;

  /// Parse a status name, rejecting anything outside the enumeration.
  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::InvalidStatus(s.to_owned()))
  }

  /// Human-readable label, e.g. `"Distribution"`.
  pub fn label(self) -> &'static str {
    match self {
      Self::Harvested => "Harvested",
      Self::Curing => "Curing",
      Self::Processing => "Processing",
      Self::Packaging => "Packaging",
      Self::Distribution => "Distribution",
      Self::Retail => "Retail",
      Self::Recalled => "Recalled",
    }
  }

  /// Short description of what the stage means for the product.
  pub fn description(self) -> &'static str {
    match self {
      Self::Harvested => "Tobacco leaves have been harvested from the farm",
      Self::Curing => "Leaves are being cured to develop flavor and aroma",
      Self::Processing => "Cured leaves are being processed and sorted",
      Self::Packaging => "Processed tobacco is being packaged",
      Self::Distribution => "Product is in transit to retail locations",
      Self::Retail => "Product is available at retail locations",
      Self::Recalled => "Product has been recalled",
    }
  }

  /// Whether moving into this status warrants an explicit confirmation from
  /// the operator. The registry itself never refuses it.
  pub fn needs_confirmation(self) -> bool { matches!(self, Self::Recalled) }

  /// All statuses in workflow order.
  pub fn all() -> impl Iterator<Item = Self> { Self::iter() }
}

// ─── Batch ───────────────────────────────────────────────────────────────────

/// A tracked unit of product.
///
/// `status`, `last_updated` and `last_location` only ever change together,
/// through [`crate::store::BatchRegistry::update_status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
  pub id:            String,
  /// References [`crate::farm::Farm::id`]; not checked.
  pub farm_id:       String,
  pub harvest_date:  NaiveDate,
  pub variety:       String,
  /// Free text, e.g. "5000 kg".
  pub quantity:      String,
  pub grade:         String,
  pub status:        BatchStatus,
  pub created_at:    DateTime<Utc>,
  pub last_updated:  DateTime<Utc>,
  /// `None` until the first status update.
  pub last_location: Option<String>,
}

/// Input to [`crate::store::BatchRegistry::create_batch`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBatch {
  pub farm_id:      String,
  pub harvest_date: NaiveDate,
  pub variety:      String,
  pub quantity:     String,
  pub grade:        String,
}

impl NewBatch {
  /// Build the initial record for this batch with a fresh id.
  pub fn into_batch(self, now: DateTime<Utc>) -> Batch {
    Batch {
      id:            new_batch_id(),
      farm_id:       self.farm_id,
      harvest_date:  self.harvest_date,
      variety:       self.variety,
      quantity:      self.quantity,
      grade:         self.grade,
      status:        BatchStatus::INITIAL,
      created_at:    now,
      last_updated:  now,
      last_location: None,
    }
  }
}

/// `BATCH-` followed by 12 uppercase hex digits.
pub fn new_batch_id() -> String {
  let raw = Uuid::new_v4().simple().to_string().to_uppercase();
  format!("BATCH-{}", &raw[..12])
}

// ─── Search ──────────────────────────────────────────────────────────────────

/// Filter over batches. Unset (or blank) fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchQuery {
  /// Case-insensitive substring of the id, variety or grade.
  pub text:    Option<String>,
  pub status:  Option<BatchStatus>,
  /// Exact farm id.
  pub farm_id: Option<String>,
}

impl BatchQuery {
  pub fn is_empty(&self) -> bool {
    non_blank(&self.text).is_none() && self.status.is_none() && non_blank(&self.farm_id).is_none()
  }

  pub fn matches(&self, batch: &Batch) -> bool {
    if let Some(term) = non_blank(&self.text) {
      let term = term.to_lowercase();
      let hit = [&batch.id, &batch.variety, &batch.grade]
        .iter()
        .any(|field| field.to_lowercase().contains(&term));
      if !hit {
        return false;
      }
    }
    if self.status.is_some_and(|s| s != batch.status) {
      return false;
    }
    non_blank(&self.farm_id).is_none_or(|farm_id| farm_id == batch.farm_id)
  }
}

pub(crate) fn non_blank(field: &Option<String>) -> Option<&str> {
  field.as_deref().filter(|s| !s.is_empty())
}

// ─── Summary ─────────────────────────────────────────────────────────────────

/// Number of batches currently in a given status, with its display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
  pub status:      BatchStatus,
  pub count:       usize,
  pub label:       String,
  pub description: String,
}

/// Count `batches` per status. Every status is present, in workflow order.
pub fn summarize<'a>(batches: impl IntoIterator<Item = &'a Batch>) -> Vec<StatusCount> {
  let mut counts = [0usize; BatchStatus::COUNT];
  for batch in batches {
    counts[batch.status as usize] += 1;
  }
  BatchStatus::all()
    .map(|status| StatusCount {
      status,
      count: counts[status as usize],
      label: status.label().to_owned(),
      description: status.description().to_owned(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_accepts_every_status_name() {
    for status in BatchStatus::all() {
      assert_eq!(BatchStatus::parse(status.as_ref()).unwrap(), status);
    }
  }

  #[test]
  fn parse_rejects_unknown_status() {
    assert!(matches!(
      BatchStatus::parse("created"),
      Err(Error::InvalidStatus(s)) if s == "created"
    ));
  }

  #[test]
  fn batch_ids_have_expected_shape() {
    let id = new_batch_id();
    assert_eq!(id.len(), "BATCH-".len() + 12);
    assert!(id.starts_with("BATCH-"));
    assert_ne!(id, new_batch_id());
  }

  #[test]
  fn new_batch_starts_harvested() {
    let now = Utc::now();
    let batch = NewBatch {
      farm_id:      "FARM-001".into(),
      harvest_date: NaiveDate::from_ymd_opt(2023, 8, 15).unwrap(),
      variety:      "Virginia Gold".into(),
      quantity:     "5000 kg".into(),
      grade:        "Premium".into(),
    }
    .into_batch(now);
    assert_eq!(batch.status, BatchStatus::Harvested);
    assert_eq!(batch.created_at, batch.last_updated);
    assert!(batch.last_location.is_none());
  }

  #[test]
  fn summary_includes_zero_counts() {
    let now = Utc::now();
    let mut batch = NewBatch {
      farm_id:      "FARM-001".into(),
      harvest_date: NaiveDate::from_ymd_opt(2023, 8, 15).unwrap(),
      variety:      "Burley".into(),
      quantity:     "1 kg".into(),
      grade:        "Standard".into(),
    }
    .into_batch(now);
    batch.status = BatchStatus::Retail;

    let summary = summarize([&batch, &batch]);
    assert_eq!(summary.len(), BatchStatus::COUNT);
    assert_eq!(summary[0].status, BatchStatus::Harvested);
    assert_eq!(summary[0].count, 0);
    assert_eq!(summary[0].label, "Harvested");
    let retail = summary.iter().find(|c| c.status == BatchStatus::Retail).unwrap();
    assert_eq!(retail.count, 2);
    assert_eq!(retail.description, "Product is available at retail locations");
  }

  #[test]
  fn every_status_has_display_text() {
    for status in BatchStatus::all() {
      assert!(status.label().eq_ignore_ascii_case(status.as_ref()));
      assert!(!status.description().is_empty());
    }
    assert_eq!(BatchStatus::Recalled.description(), "Product has been recalled");
  }

  fn sample(id: &str, farm_id: &str, variety: &str, grade: &str) -> Batch {
    let mut batch = NewBatch {
      farm_id:      farm_id.into(),
      harvest_date: NaiveDate::from_ymd_opt(2023, 9, 1).unwrap(),
      variety:      variety.into(),
      quantity:     "100 kg".into(),
      grade:        grade.into(),
    }
    .into_batch(Utc::now());
    batch.id = id.into();
    batch
  }

  #[test]
  fn query_text_is_case_insensitive_over_id_variety_grade() {
    let batch = sample("BATCH-002", "FARM-001", "Burley", "Standard");
    let text = |t: &str| BatchQuery { text: Some(t.into()), ..Default::default() };
    assert!(text("burl").matches(&batch));
    assert!(text("batch-00").matches(&batch));
    assert!(text("STAND").matches(&batch));
    assert!(!text("farm-001").matches(&batch));
  }

  #[test]
  fn query_status_and_farm_are_exact() {
    let batch = sample("BATCH-002", "FARM-001", "Burley", "Standard");
    let harvested = BatchQuery { status: Some(BatchStatus::Harvested), ..Default::default() };
    assert!(harvested.matches(&batch));
    let curing = BatchQuery { status: Some(BatchStatus::Curing), ..Default::default() };
    assert!(!curing.matches(&batch));
    let farm = |f: &str| BatchQuery { farm_id: Some(f.into()), ..Default::default() };
    assert!(farm("FARM-001").matches(&batch));
    assert!(!farm("FARM-00").matches(&batch));
  }

  #[test]
  fn blank_query_matches_everything() {
    let batch = sample("BATCH-002", "FARM-001", "Burley", "Standard");
    let blank = BatchQuery { text: Some(String::new()), status: None, farm_id: Some(String::new()) };
    assert!(blank.is_empty());
    assert!(blank.matches(&batch));
    assert!(BatchQuery::default().is_empty());
  }
}
