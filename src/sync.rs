//! Sync Engine - mirrors the stars of every followed account
//!
//! Accounts are processed one at a time in the order the follow graph returns
//! them. Each account's pages are fetched and ingested in page order, then the
//! store is committed once for that account. The first failure of any kind
//! stops the run: the in-flight account is rolled back, later accounts are not
//! touched, and accounts committed before it stay committed.

use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::follow::resolve_targets;
use crate::github::{GitHubClient, Resource};
use crate::ingest::{ingest_page, IngestOutcome};
use crate::paginate::{Paginator, StopReason};
use crate::store::StarStore;

/// Where a run was when it stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPhase {
    Resolving,
    Processing(String),
    Committing(String),
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPhase::Resolving => write!(f, "resolving followed accounts"),
            SyncPhase::Processing(login) => write!(f, "fetching stars of {}", login),
            SyncPhase::Committing(login) => write!(f, "saving stars of {}", login),
        }
    }
}

#[derive(Debug)]
pub enum SyncOutcome {
    Completed,
    Aborted { phase: SyncPhase, error: SyncError },
}

/// Result for one committed account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub login: String,
    pub pages_fetched: u32,
    pub inserted: usize,
    pub skipped: usize,
    pub stop_reason: StopReason,
}

/// Results from a complete sync run
#[derive(Debug)]
pub struct SyncSummary {
    pub root: String,
    /// Committed accounts, in processing order
    pub accounts: Vec<AccountSummary>,
    pub duration: Duration,
    pub outcome: SyncOutcome,
}

impl SyncSummary {
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, SyncOutcome::Completed)
    }

    pub fn total_inserted(&self) -> usize {
        self.accounts.iter().map(|a| a.inserted).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.accounts.iter().map(|a| a.skipped).sum()
    }

    /// Phase the run stopped in, if it did not complete
    pub fn aborted_phase(&self) -> Option<&SyncPhase> {
        match &self.outcome {
            SyncOutcome::Completed => None,
            SyncOutcome::Aborted { phase, .. } => Some(phase),
        }
    }

    /// Committed accounts of a completed run, or the error that stopped it
    pub fn into_result(self) -> Result<Vec<AccountSummary>, SyncError> {
        match self.outcome {
            SyncOutcome::Completed => Ok(self.accounts),
            SyncOutcome::Aborted { error, .. } => Err(error),
        }
    }
}

/// Drives the follow-graph walk and per-account ingestion
pub struct SyncEngine {
    client: GitHubClient,
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new(client: GitHubClient, config: SyncConfig) -> Self {
        Self { client, config }
    }

    /// Mirror the stars of everyone `root` follows (and `root`, if configured)
    pub async fn run(&self, store: &mut StarStore, root: &str) -> SyncSummary {
        let start_time = Instant::now();
        info!("Starting star sync for {}", root);

        let mut accounts = Vec::new();
        let outcome = match resolve_targets(&self.client, root, self.config.include_root).await {
            Ok(targets) => self.process_accounts(store, &targets, &mut accounts).await,
            Err(error) => {
                error!("Could not resolve accounts followed by {}: {}", root, error);
                SyncOutcome::Aborted {
                    phase: SyncPhase::Resolving,
                    error,
                }
            }
        };

        let summary = SyncSummary {
            root: root.to_string(),
            accounts,
            duration: start_time.elapsed(),
            outcome,
        };

        info!(
            "Sync {} in {:.2}s: {} accounts, {} new stars, {} skipped",
            if summary.is_completed() { "completed" } else { "aborted" },
            summary.duration.as_secs_f64(),
            summary.accounts.len(),
            summary.total_inserted(),
            summary.total_skipped()
        );

        summary
    }

    async fn process_accounts(
        &self,
        store: &mut StarStore,
        targets: &[String],
        accounts: &mut Vec<AccountSummary>,
    ) -> SyncOutcome {
        for login in targets {
            info!("Fetching stars of {}", login);

            let account = match self.process_account(store, login).await {
                Ok(account) => account,
                Err(error) => {
                    let dropped = store.rollback();
                    error!(
                        "Stopping sync at {} ({} staged stars discarded): {}",
                        login, dropped, error
                    );
                    return SyncOutcome::Aborted {
                        phase: SyncPhase::Processing(login.clone()),
                        error,
                    };
                }
            };

            debug!("Saving {} staged stars of {}", store.staged_len(), login);
            if let Err(e) = store.commit() {
                error!("Failed to save stars of {}: {}", login, e);
                return SyncOutcome::Aborted {
                    phase: SyncPhase::Committing(login.clone()),
                    error: e.into(),
                };
            }

            accounts.push(account);
        }

        SyncOutcome::Completed
    }

    /// Walk and ingest every star page of one account, leaving rows staged
    async fn process_account(
        &self,
        store: &mut StarStore,
        login: &str,
    ) -> Result<AccountSummary, SyncError> {
        let mut pages = Paginator::<Value>::new(&self.client, Resource::Starred(login.to_string()))
            .with_page_limit(self.config.page_limit);
        let mut totals = IngestOutcome::default();

        while let Some(page) = pages.next_page().await? {
            let outcome = ingest_page(store, login, page.number, &page.entries)?;
            debug!(
                "{} page {}: {} new, {} skipped",
                login, page.number, outcome.inserted, outcome.skipped
            );
            totals.absorb(outcome);
        }

        Ok(AccountSummary {
            login: login.to_string(),
            pages_fetched: pages.pages_fetched(),
            inserted: totals.inserted,
            skipped: totals.skipped,
            stop_reason: pages.stop_reason().unwrap_or(StopReason::Exhausted),
        })
    }
}
