//! Demo data loaded into an empty store: three users (one per role), three
//! farms, four batches, and the ledger history of the two oldest batches.

use chainleaf_core::{
  batch::{Batch, BatchStatus},
  farm::Farm,
  ledger::{GENESIS_HASH, LedgerEntry, LedgerPayload, StatusChange},
  user::{Role, User},
};

use crate::{
  Result,
  encode::{decode_date, decode_dt},
};

/// Password shared by every demo account.
pub const DEMO_PASSWORD: &str = "1234";

pub struct DemoData {
  pub users:   Vec<User>,
  pub farms:   Vec<Farm>,
  pub batches: Vec<Batch>,
  pub ledger:  Vec<LedgerEntry>,
}

fn user(name: &str, email: &str, role: Role) -> User {
  User {
    name:     name.to_owned(),
    email:    email.to_owned(),
    password: DEMO_PASSWORD.to_owned(),
    role,
  }
}

fn farm(
  id: &str,
  name: &str,
  location: &str,
  owner: &str,
  certifications: &[&str],
  established: &str,
  size: &str,
) -> Result<Farm> {
  Ok(Farm {
    id:             id.to_owned(),
    name:           name.to_owned(),
    location:       location.to_owned(),
    owner:          owner.to_owned(),
    certifications: certifications.iter().map(|c| (*c).to_owned()).collect(),
    established:    decode_date(established)?,
    size:           size.to_owned(),
  })
}

#[allow(clippy::too_many_arguments)]
fn batch(
  id: &str,
  farm_id: &str,
  harvest_date: &str,
  variety: &str,
  quantity: &str,
  grade: &str,
  status: BatchStatus,
  created_at: &str,
  last_updated: &str,
  last_location: &str,
) -> Result<Batch> {
  Ok(Batch {
    id:            id.to_owned(),
    farm_id:       farm_id.to_owned(),
    harvest_date:  decode_date(harvest_date)?,
    variety:       variety.to_owned(),
    quantity:      quantity.to_owned(),
    grade:         grade.to_owned(),
    status,
    created_at:    decode_dt(created_at)?,
    last_updated:  decode_dt(last_updated)?,
    last_location: Some(last_location.to_owned()),
  })
}

pub fn demo_data() -> Result<DemoData> {
  let users = vec![
    user("Admin User", "admin@chainleaf.com", Role::Admin),
    user("Distributor User", "distributor@chainleaf.com", Role::Distributor),
    user("Consumer User", "consumer@chainleaf.com", Role::Consumer),
  ];

  let farms = vec![
    farm(
      "FARM-001",
      "Green Valley Tobacco",
      "Kentucky, USA",
      "John Smith",
      &["Organic", "Fair Trade"],
      "2005-03-15",
      "250 acres",
    )?,
    farm(
      "FARM-002",
      "Golden Leaf Plantation",
      "North Carolina, USA",
      "Maria Rodriguez",
      &["GAP Certified"],
      "1998-06-22",
      "380 acres",
    )?,
    farm(
      "FARM-003",
      "Sunrise Tobacco Co.",
      "Virginia, USA",
      "David Chen",
      &["Sustainable Agriculture", "Rainforest Alliance"],
      "2010-09-10",
      "175 acres",
    )?,
  ];

  let batches = vec![
    batch(
      "BATCH-001",
      "FARM-001",
      "2023-08-15",
      "Virginia Gold",
      "5000 kg",
      "Premium",
      BatchStatus::Harvested,
      "2023-08-16T09:30:00Z",
      "2023-08-16T09:30:00Z",
      "Green Valley Tobacco Farm",
    )?,
    batch(
      "BATCH-002",
      "FARM-001",
      "2023-09-01",
      "Burley",
      "3800 kg",
      "Standard",
      BatchStatus::Processing,
      "2023-09-02T10:15:00Z",
      "2023-10-05T14:20:00Z",
      "Central Processing Facility",
    )?,
    batch(
      "BATCH-003",
      "FARM-002",
      "2023-08-25",
      "Oriental",
      "2200 kg",
      "Premium",
      BatchStatus::Distribution,
      "2023-08-26T08:45:00Z",
      "2023-11-10T11:30:00Z",
      "Regional Distribution Center",
    )?,
    batch(
      "BATCH-004",
      "FARM-003",
      "2023-09-10",
      "Kentucky",
      "4100 kg",
      "Standard",
      BatchStatus::Retail,
      "2023-09-11T15:20:00Z",
      "2023-12-01T09:10:00Z",
      "Retail Distribution",
    )?,
  ];

  let ledger = demo_ledger(&batches[0], &batches[1])?;

  Ok(DemoData { users, farms, batches, ledger })
}

/// `batch` as it looked when created: harvested, never moved.
fn as_created(batch: &Batch) -> Batch {
  Batch {
    status: BatchStatus::INITIAL,
    last_updated: batch.created_at,
    last_location: None,
    ..batch.clone()
  }
}

/// BATCH-001 has only its creation on record; BATCH-002 was created
/// harvested and later moved to processing.
fn demo_ledger(first: &Batch, second: &Batch) -> Result<Vec<LedgerEntry>> {
  let first_create = LedgerEntry::seal(
    GENESIS_HASH,
    &first.id,
    first.created_at,
    LedgerPayload::Create(as_created(first)),
  )?;

  let second_initial = as_created(second);
  let second_create = LedgerEntry::seal(
    GENESIS_HASH,
    &second.id,
    second.created_at,
    LedgerPayload::Create(second_initial),
  )?;
  let second_update = LedgerEntry::seal(
    &second_create.hash,
    &second.id,
    second.last_updated,
    LedgerPayload::Update(StatusChange {
      previous_status: BatchStatus::Harvested,
      new_status:      second.status,
      location:        "Central Processing Facility".to_owned(),
    }),
  )?;

  Ok(vec![first_create, second_create, second_update])
}
