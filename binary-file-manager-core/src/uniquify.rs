//! Collision avoidance for generated names.
//!
//! A single check-then-use: two ingestions racing on the same name may both
//! see it free. The store's own `create`/`rename` refusing to overwrite is the
//! backstop.

use chrono::{DateTime, Local};
use tracing::info;

use crate::contract::Vault;
use crate::formatter::format_moment;
use crate::paths;

pub const CONFLICT_PREFIX: &str = "CONFLICT-";
pub const CONFLICT_STAMP_FORMAT: &str = "YYYY-MM-DD-hh-mm-ss";

/// Return `candidate` if `folder/candidate` is free, otherwise a
/// `CONFLICT-<stamp>-` prefixed variant stamped with the current time.
pub async fn uniquify(vault: &dyn Vault, candidate: &str, folder: &str) -> String {
    let target = paths::join(folder, candidate);
    if vault.lookup(&target).await.is_some() {
        let renamed = conflict_name(candidate, Local::now());
        info!(taken = %target, renamed = %renamed, "Name already taken, using conflict name");
        renamed
    } else {
        candidate.to_string()
    }
}

pub fn conflict_name(candidate: &str, now: DateTime<Local>) -> String {
    format!(
        "{CONFLICT_PREFIX}{}-{candidate}",
        format_moment(now, CONFLICT_STAMP_FORMAT)
    )
}
