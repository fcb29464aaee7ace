//! [`SqliteStore`], the SQLite implementation of the ChainLeaf service
//! traits.

use std::path::Path;

use chainleaf_core::{
  Error as CoreError,
  batch::{self, Batch, BatchQuery, BatchStatus, NewBatch, StatusCount},
  farm::{self, Farm, FarmQuery, NewFarm},
  ledger::{Authenticity, GENESIS_HASH, LedgerEntry, LedgerPayload, StatusChange},
  store::{Backend, BatchRegistry, CredentialStore, FarmDirectory, Ledger},
  user::{NewUser, ProfileUpdate, Session},
};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  encode::{
    RawBatch, RawEntry, RawFarm, RawSession, RawUser, encode_date, encode_dt, encode_list,
  },
  error::other,
  schema::SCHEMA,
  seed::DemoData,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A ChainLeaf store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Load `data` if the store holds no users, farms or batches yet.
  ///
  /// Returns whether anything was written.
  pub async fn seed_if_empty(&self, data: DemoData) -> Result<bool> {
    let mut farm_rows = Vec::with_capacity(data.farms.len());
    for f in &data.farms {
      farm_rows.push((f.clone(), encode_list(&f.certifications)?));
    }
    let mut ledger_rows = Vec::with_capacity(data.ledger.len());
    for e in &data.ledger {
      ledger_rows.push((e.clone(), e.payload.to_json()?));
    }
    let users = data.users;
    let batches = data.batches;

    let seeded = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let populated: i64 = tx.query_row(
          "SELECT (SELECT COUNT(*) FROM users)
                + (SELECT COUNT(*) FROM farms)
                + (SELECT COUNT(*) FROM batches)",
          [],
          |r| r.get(0),
        )?;
        if populated > 0 {
          return Ok(false);
        }

        for u in &users {
          tx.execute(
            "INSERT INTO users (email, name, password, role, seeded) VALUES (?1, ?2, ?3, ?4, 1)",
            rusqlite::params![u.email, u.name, u.password, u.role.as_ref()],
          )?;
        }
        for (f, certs) in &farm_rows {
          insert_farm(&tx, f, certs)?;
        }
        for b in &batches {
          insert_batch(&tx, b)?;
        }
        for (e, payload_json) in &ledger_rows {
          insert_entry(&tx, e, payload_json)?;
        }

        tx.commit()?;
        Ok(true)
      })
      .await?;

    if seeded {
      info!("seeded store with demo data");
    }
    Ok(seeded)
  }

  async fn query_batches(&self) -> Result<Vec<Batch>> {
    let raws: Vec<RawBatch> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {} FROM batches ORDER BY seq", RawBatch::COLUMNS))?;
        let rows = stmt
          .query_map([], RawBatch::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBatch::into_batch).collect()
  }
}

// ─── Row writers ─────────────────────────────────────────────────────────────

fn insert_farm(conn: &rusqlite::Connection, f: &Farm, certs: &str) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO farms (id, name, location, owner, certifications, established, size)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      f.id,
      f.name,
      f.location,
      f.owner,
      certs,
      encode_date(f.established),
      f.size,
    ],
  )?;
  Ok(())
}

fn insert_batch(conn: &rusqlite::Connection, b: &Batch) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO batches (
       id, farm_id, harvest_date, variety, quantity, grade,
       status, created_at, last_updated, last_location
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    rusqlite::params![
      b.id,
      b.farm_id,
      encode_date(b.harvest_date),
      b.variety,
      b.quantity,
      b.grade,
      b.status.as_ref(),
      encode_dt(b.created_at),
      encode_dt(b.last_updated),
      b.last_location,
    ],
  )?;
  Ok(())
}

fn insert_entry(
  conn: &rusqlite::Connection,
  e: &LedgerEntry,
  payload_json: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO ledger_entries (batch_id, hash, prev_hash, timestamp, action, payload_json)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      e.batch_id,
      e.hash,
      e.prev_hash,
      encode_dt(e.timestamp),
      e.action.as_ref(),
      payload_json,
    ],
  )?;
  Ok(())
}

/// Replace the active session row. `role` is the stored role text.
fn set_active(
  conn: &rusqlite::Connection,
  name: &str,
  email: &str,
  role: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT OR REPLACE INTO active_user (slot, name, email, role) VALUES (1, ?1, ?2, ?3)",
    rusqlite::params![name, email, role],
  )?;
  Ok(())
}

/// Seal `payload` onto the head of `batch_id`'s chain and insert it.
fn append_entry(
  conn: &rusqlite::Connection,
  batch_id: &str,
  timestamp: DateTime<Utc>,
  payload: LedgerPayload,
) -> tokio_rusqlite::Result<LedgerEntry> {
  let head: Option<String> = conn
    .query_row(
      "SELECT hash FROM ledger_entries WHERE batch_id = ?1 ORDER BY seq DESC LIMIT 1",
      rusqlite::params![batch_id],
      |r| r.get(0),
    )
    .optional()?;
  let prev = head.as_deref().unwrap_or(GENESIS_HASH);

  let entry = LedgerEntry::seal(prev, batch_id, timestamp, payload).map_err(other)?;
  let payload_json = entry.payload.to_json().map_err(other)?;
  insert_entry(conn, &entry, &payload_json)?;
  Ok(entry)
}

fn find_user(conn: &rusqlite::Connection, email: &str) -> rusqlite::Result<Option<RawUser>> {
  conn
    .query_row(
      &format!("SELECT {} FROM users WHERE email = ?1", RawUser::COLUMNS),
      rusqlite::params![email],
      RawUser::from_row,
    )
    .optional()
}

fn find_session(conn: &rusqlite::Connection) -> rusqlite::Result<Option<RawSession>> {
  conn
    .query_row(
      "SELECT name, email, role FROM active_user WHERE slot = 1",
      [],
      RawSession::from_row,
    )
    .optional()
}

fn find_batch(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<RawBatch>> {
  conn
    .query_row(
      &format!("SELECT {} FROM batches WHERE id = ?1", RawBatch::COLUMNS),
      rusqlite::params![id],
      RawBatch::from_row,
    )
    .optional()
}

// ─── Service impls ───────────────────────────────────────────────────────────

impl Backend for SqliteStore {
  type Error = Error;
}

impl CredentialStore for SqliteStore {
  async fn register(&self, user: NewUser) -> Result<Session> {
    let email = user.email.clone();

    let session = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if find_user(&tx, &user.email)?.is_some() {
          return Ok(Err(CoreError::DuplicateEmail(user.email)));
        }

        tx.execute(
          "INSERT INTO users (email, name, password, role) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![user.email, user.name, user.password, user.role.as_ref()],
        )?;

        let session = Session { name: user.name, email: user.email, role: user.role };
        set_active(&tx, &session.name, &session.email, session.role.as_ref())?;
        tx.commit()?;
        Ok(Ok(session))
      })
      .await??;

    info!(%email, role = %session.role, "registered user");
    Ok(session)
  }

  async fn login(&self, email: String, password: String) -> Result<Session> {
    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(raw) = tx
          .query_row(
            &format!(
              "SELECT {} FROM users WHERE email = ?1 AND password = ?2",
              RawUser::COLUMNS
            ),
            rusqlite::params![email, password],
            RawUser::from_row,
          )
          .optional()?
        else {
          return Ok(Err(email));
        };

        set_active(&tx, &raw.name, &raw.email, &raw.role)?;
        tx.commit()?;
        Ok(Ok(raw))
      })
      .await?;

    match raw {
      Ok(raw) => {
        let session = raw.into_user()?.session();
        info!(email = %session.email, role = %session.role, "logged in");
        Ok(session)
      }
      Err(email) => {
        warn!(%email, "rejected login");
        Err(CoreError::InvalidCredentials.into())
      }
    }
  }

  async fn logout(&self) -> Result<()> {
    let cleared = self
      .conn
      .call(|conn| Ok(conn.execute("DELETE FROM active_user", [])?))
      .await?;
    if cleared > 0 {
      info!("logged out");
    }
    Ok(())
  }

  async fn active_session(&self) -> Result<Option<Session>> {
    let raw = self.conn.call(|conn| Ok(find_session(conn)?)).await?;
    raw.map(RawSession::into_session).transpose()
  }

  async fn update_profile(&self, update: ProfileUpdate) -> Result<Session> {
    let session = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(current) = find_session(&tx)? else {
          return Ok(Err(CoreError::UserNotFound));
        };
        let Some(stored) = find_user(&tx, &current.email)? else {
          return Ok(Err(CoreError::UserNotFound));
        };

        let password = if update.wants_password_change() {
          if update.current_password.as_deref() != Some(stored.password.as_str()) {
            return Ok(Err(CoreError::IncorrectPassword));
          }
          update.new_password.unwrap_or_default()
        } else {
          stored.password
        };

        if update.email != stored.email && find_user(&tx, &update.email)?.is_some() {
          return Ok(Err(CoreError::DuplicateEmail(update.email)));
        }

        tx.execute(
          "UPDATE users SET name = ?1, email = ?2, password = ?3 WHERE email = ?4",
          rusqlite::params![update.name, update.email, password, stored.email],
        )?;
        tx.execute(
          "UPDATE active_user SET name = ?1, email = ?2 WHERE slot = 1",
          rusqlite::params![update.name, update.email],
        )?;
        tx.commit()?;

        Ok(Ok(RawSession { name: update.name, email: update.email, role: stored.role }))
      })
      .await??;

    let session = session.into_session()?;
    info!(email = %session.email, "updated profile");
    Ok(session)
  }
}

impl BatchRegistry for SqliteStore {
  async fn list_batches(&self) -> Result<Vec<Batch>> {
    let batches = self.query_batches().await?;
    debug!(count = batches.len(), "listed batches");
    Ok(batches)
  }

  async fn search_batches(&self, query: BatchQuery) -> Result<Vec<Batch>> {
    let batches: Vec<Batch> =
      self.query_batches().await?.into_iter().filter(|b| query.matches(b)).collect();
    debug!(?query, count = batches.len(), "searched batches");
    Ok(batches)
  }

  async fn get_batch(&self, id: String) -> Result<Batch> {
    let lookup = id.clone();
    let raw = self.conn.call(move |conn| Ok(find_batch(conn, &lookup)?)).await?;
    match raw {
      Some(raw) => raw.into_batch(),
      None => Err(CoreError::BatchNotFound(id).into()),
    }
  }

  async fn create_batch(&self, input: NewBatch) -> Result<Batch> {
    let batch = input.into_batch(Utc::now());
    let snapshot = batch.clone();

    let entry = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_batch(&tx, &snapshot)?;
        let entry = append_entry(
          &tx,
          &snapshot.id,
          snapshot.created_at,
          LedgerPayload::Create(snapshot.clone()),
        )?;
        tx.commit()?;
        Ok(entry)
      })
      .await?;

    info!(batch_id = %batch.id, farm_id = %batch.farm_id, hash = %entry.hash, "created batch");
    Ok(batch)
  }

  async fn update_status(
    &self,
    id: String,
    new_status: BatchStatus,
    location: String,
  ) -> Result<Batch> {
    let now = Utc::now();

    let updated = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(raw) = find_batch(&tx, &id)? else {
          return Ok(Err(Error::from(CoreError::BatchNotFound(id))));
        };
        let mut batch = match raw.into_batch() {
          Ok(batch) => batch,
          Err(e) => return Ok(Err(e)),
        };
        let previous_status = batch.status;

        batch.status = new_status;
        batch.last_updated = now;
        batch.last_location = Some(location.clone());

        tx.execute(
          "UPDATE batches SET status = ?1, last_updated = ?2, last_location = ?3 WHERE id = ?4",
          rusqlite::params![
            batch.status.as_ref(),
            encode_dt(batch.last_updated),
            batch.last_location,
            batch.id,
          ],
        )?;
        append_entry(
          &tx,
          &batch.id,
          now,
          LedgerPayload::Update(StatusChange { previous_status, new_status, location }),
        )?;
        tx.commit()?;
        Ok(Ok((batch, previous_status)))
      })
      .await?;

    let (batch, previous) = updated?;
    info!(batch_id = %batch.id, from = %previous, to = %batch.status, "updated batch status");
    Ok(batch)
  }

  async fn status_summary(&self) -> Result<Vec<StatusCount>> {
    let batches = self.query_batches().await?;
    Ok(batch::summarize(&batches))
  }
}

impl Ledger for SqliteStore {
  async fn append(&self, batch_id: String, payload: LedgerPayload) -> Result<LedgerEntry> {
    let entry = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let entry = append_entry(&tx, &batch_id, Utc::now(), payload)?;
        tx.commit()?;
        Ok(entry)
      })
      .await?;

    info!(batch_id = %entry.batch_id, action = %entry.action, hash = %entry.hash, "recorded ledger entry");
    Ok(entry)
  }

  async fn history(&self, batch_id: String) -> Result<Vec<LedgerEntry>> {
    let raws: Vec<RawEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM ledger_entries WHERE batch_id = ?1 ORDER BY seq",
          RawEntry::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![batch_id], RawEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEntry::into_entry).collect()
  }

  async fn verify_authenticity(&self, batch_id: String) -> Result<Authenticity> {
    let entries = self.history(batch_id.clone()).await?;
    let verdict = Authenticity::from_history(&entries);
    debug!(%batch_id, authentic = verdict.authentic, chain_valid = verdict.chain_valid, "verified batch");
    Ok(verdict)
  }
}

impl FarmDirectory for SqliteStore {
  async fn list_farms(&self) -> Result<Vec<Farm>> {
    let raws: Vec<RawFarm> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {} FROM farms ORDER BY seq", RawFarm::COLUMNS))?;
        let rows = stmt
          .query_map([], RawFarm::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFarm::into_farm).collect()
  }

  async fn search_farms(&self, query: FarmQuery) -> Result<Vec<Farm>> {
    let farms: Vec<Farm> =
      self.list_farms().await?.into_iter().filter(|f| query.matches(f)).collect();
    debug!(?query, count = farms.len(), "searched farms");
    Ok(farms)
  }

  async fn get_farm(&self, id: String) -> Result<Farm> {
    let lookup = id.clone();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM farms WHERE id = ?1", RawFarm::COLUMNS),
              rusqlite::params![lookup],
              RawFarm::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    match raw {
      Some(raw) => raw.into_farm(),
      None => Err(CoreError::FarmNotFound(id).into()),
    }
  }

  async fn add_farm(&self, input: NewFarm) -> Result<Farm> {
    let certs = encode_list(&input.certifications)?;

    let farm = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let count: i64 = tx.query_row("SELECT COUNT(*) FROM farms", [], |r| r.get(0))?;

        // Skip ids already taken by farms inserted out of sequence.
        let mut n = usize::try_from(count).unwrap_or(0) + 1;
        loop {
          let taken: bool = tx
            .query_row(
              "SELECT 1 FROM farms WHERE id = ?1",
              rusqlite::params![farm::farm_id(n)],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          if !taken {
            break;
          }
          n += 1;
        }

        let farm = Farm {
          id:             farm::farm_id(n),
          name:           input.name,
          location:       input.location,
          owner:          input.owner,
          certifications: input.certifications,
          established:    input.established,
          size:           input.size,
        };
        insert_farm(&tx, &farm, &certs)?;
        tx.commit()?;
        Ok(farm)
      })
      .await?;

    info!(farm_id = %farm.id, name = %farm.name, "added farm");
    Ok(farm)
  }
}
