//! Remote Paginator - sequential walk over a paginated collection
//!
//! Pages are requested one at a time starting at page 1. The walk ends on the
//! first empty page, when the optional page ceiling is reached, or on the first
//! error. Pages already handed to the caller stand in every case.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::github::{GitHubClient, Resource};

/// One fetched, non-empty page
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub number: u32,
    pub entries: Vec<T>,
}

/// Why a finished walk stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The remote returned an empty page
    Exhausted,
    /// The page ceiling was reached before the data ran out
    PageLimit,
}

/// Lazy page walker; every `next_page` call is one network request
pub struct Paginator<'a, T> {
    client: &'a GitHubClient,
    resource: Resource,
    next: u32,
    page_limit: Option<u32>,
    pages_fetched: u32,
    finished: bool,
    stop_reason: Option<StopReason>,
    _entries: std::marker::PhantomData<T>,
}

impl<'a, T: DeserializeOwned> Paginator<'a, T> {
    /// Walk `resource` to completion
    pub fn new(client: &'a GitHubClient, resource: Resource) -> Self {
        Self {
            client,
            resource,
            next: 1,
            page_limit: None,
            pages_fetched: 0,
            finished: false,
            stop_reason: None,
            _entries: std::marker::PhantomData,
        }
    }

    /// Stop after `limit` pages; zero means no ceiling
    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = (limit > 0).then_some(limit);
        self
    }

    /// Fetch the next page, or `None` once the walk has stopped cleanly
    pub async fn next_page(&mut self) -> Result<Option<Page<T>>, SyncError> {
        if self.finished {
            return Ok(None);
        }

        if let Some(limit) = self.page_limit {
            if self.next > limit {
                warn!(
                    "Stopped fetching {} after the {} page limit",
                    self.resource.path(),
                    limit
                );
                return Ok(self.finish(StopReason::PageLimit));
            }
        }

        let number = self.next;
        debug!("Fetching {} page {}", self.resource.path(), number);

        let entries = match self.client.fetch_page::<T>(&self.resource, number).await {
            Ok(entries) => entries,
            Err(e) => {
                self.finished = true;
                return Err(e.into());
            }
        };

        if entries.is_empty() {
            return Ok(self.finish(StopReason::Exhausted));
        }

        self.next += 1;
        self.pages_fetched += 1;
        Ok(Some(Page { number, entries }))
    }

    /// Drain the remaining pages into one list
    pub async fn collect_all(mut self) -> Result<Vec<T>, SyncError> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page.entries);
        }
        Ok(items)
    }

    /// Non-empty pages handed out so far
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Set once the walk has ended without error
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    fn finish(&mut self, reason: StopReason) -> Option<Page<T>> {
        self.finished = true;
        self.stop_reason = Some(reason);
        None
    }
}
