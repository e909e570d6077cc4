//! Institutions (schools), keyed by their registry code.
//!
//! Created lazily by the first booking that names an unseen code. The stored
//! display name is first-write-wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Institution {
  pub code:       String,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}
