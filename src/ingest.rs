//! Star Ingestion Pipeline - turns one fetched page into staged records
//!
//! Dedup rules, checked against staged and committed rows:
//! - unknown repository: staged under the owning login
//! - staged earlier by the same login: fatal, the page stops here
//! - committed under the same login by an earlier run: skipped
//! - tracked under another login: skipped, first writer wins

use serde_json::Value;
use tracing::debug;

use crate::error::SyncError;
use crate::model::StarRecord;
use crate::store::{RecordState, StarStore};

/// Counts for one ingested page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    pub inserted: usize,
    pub skipped: usize,
}

impl IngestOutcome {
    pub fn absorb(&mut self, other: IngestOutcome) {
        self.inserted += other.inserted;
        self.skipped += other.skipped;
    }
}

/// Stage every new entry of page `page` of `owner`'s stars
pub fn ingest_page(
    store: &mut StarStore,
    owner: &str,
    page: u32,
    entries: &[Value],
) -> Result<IngestOutcome, SyncError> {
    let mut outcome = IngestOutcome::default();

    for entry in entries {
        let record = StarRecord::from_value(owner, entry).map_err(|source| SyncError::Parse {
            login: owner.to_string(),
            page,
            source,
        })?;

        match store.find_by_repo_id(record.repo_id)? {
            None => {
                store.insert(record)?;
                outcome.inserted += 1;
            }
            Some(existing) if existing.record.starred_by == owner => {
                if existing.state == RecordState::Staged {
                    return Err(SyncError::Conflict {
                        login: owner.to_string(),
                        page,
                        repo_id: record.repo_id,
                    });
                }
                debug!(
                    "Repository {} already recorded for {} by an earlier run",
                    record.repo_id, owner
                );
                outcome.skipped += 1;
            }
            Some(existing) => {
                debug!(
                    "Repository {} already tracked through {}, skipping for {}",
                    record.repo_id, existing.record.starred_by, owner
                );
                outcome.skipped += 1;
            }
        }
    }

    Ok(outcome)
}
