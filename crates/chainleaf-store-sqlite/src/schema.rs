//! SQL schema for the ChainLeaf SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Registered and seeded accounts. Passwords are plaintext.
CREATE TABLE IF NOT EXISTS users (
    email     TEXT PRIMARY KEY,   -- case-sensitive
    name      TEXT NOT NULL,
    password  TEXT NOT NULL,
    role      TEXT NOT NULL,      -- 'admin' | 'distributor' | 'consumer'
    seeded    INTEGER NOT NULL DEFAULT 0
);

-- The active session; at most one row.
CREATE TABLE IF NOT EXISTS active_user (
    slot   INTEGER PRIMARY KEY CHECK (slot = 1),
    name   TEXT NOT NULL,
    email  TEXT NOT NULL,
    role   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS farms (
    seq             INTEGER PRIMARY KEY AUTOINCREMENT,
    id              TEXT NOT NULL UNIQUE,
    name            TEXT NOT NULL,
    location        TEXT NOT NULL,
    owner           TEXT NOT NULL,
    certifications  TEXT NOT NULL DEFAULT '[]',   -- JSON array
    established     TEXT NOT NULL,                -- YYYY-MM-DD
    size            TEXT NOT NULL
);

-- farm_id is intentionally not a foreign key.
CREATE TABLE IF NOT EXISTS batches (
    seq            INTEGER PRIMARY KEY AUTOINCREMENT,
    id             TEXT NOT NULL UNIQUE,
    farm_id        TEXT NOT NULL,
    harvest_date   TEXT NOT NULL,    -- YYYY-MM-DD
    variety        TEXT NOT NULL,
    quantity       TEXT NOT NULL,
    grade          TEXT NOT NULL,
    status         TEXT NOT NULL,
    created_at     TEXT NOT NULL,    -- RFC 3339 UTC
    last_updated   TEXT NOT NULL,
    last_location  TEXT
);

-- Strictly append-only; no UPDATE or DELETE is ever issued against it.
CREATE TABLE IF NOT EXISTS ledger_entries (
    seq           INTEGER PRIMARY KEY AUTOINCREMENT,
    batch_id      TEXT NOT NULL,
    hash          TEXT NOT NULL UNIQUE,
    prev_hash     TEXT NOT NULL,
    timestamp     TEXT NOT NULL,
    action        TEXT NOT NULL,    -- 'create' | 'update'
    payload_json  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS ledger_batch_idx ON ledger_entries(batch_id, seq);

PRAGMA user_version = 1;
";
