//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates are `YYYY-MM-DD`, and list
//! fields are compact JSON.

use std::str::FromStr;

use chainleaf_core::{
  batch::{Batch, BatchStatus},
  farm::Farm,
  ledger::{LedgerAction, LedgerEntry, LedgerPayload},
  user::{Role, Session, User},
};
use chrono::{DateTime, NaiveDate, Utc};

use crate::{Error, Result};

// ─── DateTime<Utc> / NaiveDate ───────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enumerations ────────────────────────────────────────────────────────────

fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::Decode { column, value: s.to_owned() })
}

pub fn decode_role(s: &str) -> Result<Role> { decode_enum("role", s) }

pub fn decode_status(s: &str) -> Result<BatchStatus> { decode_enum("status", s) }

pub fn decode_action(s: &str) -> Result<LedgerAction> { decode_enum("action", s) }

// ─── Lists ───────────────────────────────────────────────────────────────────

pub fn encode_list(items: &[String]) -> Result<String> { Ok(serde_json::to_string(items)?) }

pub fn decode_list(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub email:    String,
  pub name:     String,
  pub password: String,
  pub role:     String,
}

impl RawUser {
  pub const COLUMNS: &'static str = "email, name, password, role";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      email:    row.get(0)?,
      name:     row.get(1)?,
      password: row.get(2)?,
      role:     row.get(3)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      role:     decode_role(&self.role)?,
      name:     self.name,
      email:    self.email,
      password: self.password,
    })
  }
}

/// Raw strings read directly from the `active_user` row.
pub struct RawSession {
  pub name:  String,
  pub email: String,
  pub role:  String,
}

impl RawSession {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { name: row.get(0)?, email: row.get(1)?, role: row.get(2)? })
  }

  pub fn into_session(self) -> Result<Session> {
    Ok(Session { role: decode_role(&self.role)?, name: self.name, email: self.email })
  }
}

/// Raw strings read directly from a `farms` row.
pub struct RawFarm {
  pub id:             String,
  pub name:           String,
  pub location:       String,
  pub owner:          String,
  pub certifications: String,
  pub established:    String,
  pub size:           String,
}

impl RawFarm {
  pub const COLUMNS: &'static str =
    "id, name, location, owner, certifications, established, size";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      name:           row.get(1)?,
      location:       row.get(2)?,
      owner:          row.get(3)?,
      certifications: row.get(4)?,
      established:    row.get(5)?,
      size:           row.get(6)?,
    })
  }

  pub fn into_farm(self) -> Result<Farm> {
    Ok(Farm {
      certifications: decode_list(&self.certifications)?,
      established:    decode_date(&self.established)?,
      id:             self.id,
      name:           self.name,
      location:       self.location,
      owner:          self.owner,
      size:           self.size,
    })
  }
}

/// Raw strings read directly from a `batches` row.
pub struct RawBatch {
  pub id:            String,
  pub farm_id:       String,
  pub harvest_date:  String,
  pub variety:       String,
  pub quantity:      String,
  pub grade:         String,
  pub status:        String,
  pub created_at:    String,
  pub last_updated:  String,
  pub last_location: Option<String>,
}

impl RawBatch {
  pub const COLUMNS: &'static str = "id, farm_id, harvest_date, variety, quantity, grade, \
                                     status, created_at, last_updated, last_location";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      farm_id:       row.get(1)?,
      harvest_date:  row.get(2)?,
      variety:       row.get(3)?,
      quantity:      row.get(4)?,
      grade:         row.get(5)?,
      status:        row.get(6)?,
      created_at:    row.get(7)?,
      last_updated:  row.get(8)?,
      last_location: row.get(9)?,
    })
  }

  pub fn into_batch(self) -> Result<Batch> {
    Ok(Batch {
      harvest_date:  decode_date(&self.harvest_date)?,
      status:        decode_status(&self.status)?,
      created_at:    decode_dt(&self.created_at)?,
      last_updated:  decode_dt(&self.last_updated)?,
      id:            self.id,
      farm_id:       self.farm_id,
      variety:       self.variety,
      quantity:      self.quantity,
      grade:         self.grade,
      last_location: self.last_location,
    })
  }
}

/// Raw strings read directly from a `ledger_entries` row.
pub struct RawEntry {
  pub batch_id:     String,
  pub hash:         String,
  pub prev_hash:    String,
  pub timestamp:    String,
  pub action:       String,
  pub payload_json: String,
}

impl RawEntry {
  pub const COLUMNS: &'static str = "batch_id, hash, prev_hash, timestamp, action, payload_json";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      batch_id:     row.get(0)?,
      hash:         row.get(1)?,
      prev_hash:    row.get(2)?,
      timestamp:    row.get(3)?,
      action:       row.get(4)?,
      payload_json: row.get(5)?,
    })
  }

  pub fn into_entry(self) -> Result<LedgerEntry> {
    let payload: LedgerPayload = serde_json::from_str(&self.payload_json)?;
    Ok(LedgerEntry {
      timestamp: decode_dt(&self.timestamp)?,
      action: decode_action(&self.action)?,
      payload,
      batch_id: self.batch_id,
      hash: self.hash,
      prev_hash: self.prev_hash,
    })
  }
}
