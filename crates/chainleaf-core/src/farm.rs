//! Farms, the origin of every batch.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::batch::non_blank;

/// A registered farm. Ids follow the `FARM-NNN` convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Farm {
  pub id:             String,
  pub name:           String,
  pub location:       String,
  pub owner:          String,
  /// Ordered as entered.
  pub certifications: Vec<String>,
  pub established:    NaiveDate,
  /// Free text, e.g. "250 acres".
  pub size:           String,
}

/// Input to [`crate::store::FarmDirectory::add_farm`]; the id is assigned by
/// the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFarm {
  pub name:           String,
  pub location:       String,
  pub owner:          String,
  #[serde(default)]
  pub certifications: Vec<String>,
  pub established:    NaiveDate,
  pub size:           String,
}

/// Filter over farms. An unset or blank `text` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FarmQuery {
  /// Case-insensitive substring of the name, location or owner.
  pub text: Option<String>,
}

impl FarmQuery {
  pub fn is_empty(&self) -> bool { non_blank(&self.text).is_none() }

  pub fn matches(&self, farm: &Farm) -> bool {
    let Some(term) = non_blank(&self.text) else {
      return true;
    };
    let term = term.to_lowercase();
    [&farm.name, &farm.location, &farm.owner]
      .iter()
      .any(|field| field.to_lowercase().contains(&term))
  }
}

/// Format the id for the `n`th farm (1-based): `FARM-001`, `FARM-002`, ...
pub fn farm_id(n: usize) -> String { format!("FARM-{n:03}") }
