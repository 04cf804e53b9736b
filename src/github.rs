use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::GitHubConfig;
use crate::error::RemoteError;

/// Fixed page size for every collection endpoint
pub const PAGE_SIZE: u32 = 100;

const ACCEPT_V3: &str = "application/vnd.github.v3+json";

/// A paginated collection endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// Repositories starred by a user, newest star first
    Starred(String),
    /// Accounts a user follows
    Following(String),
}

impl Resource {
    pub fn path(&self) -> String {
        match self {
            Resource::Starred(login) => format!("/users/{}/starred", login),
            Resource::Following(login) => format!("/users/{}/following", login),
        }
    }

    fn extra_query(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Resource::Starred(_) => &[("sort", "created"), ("direction", "desc")],
            Resource::Following(_) => &[],
        }
    }

    /// Account the resource belongs to
    pub fn login(&self) -> &str {
        match self {
            Resource::Starred(login) | Resource::Following(login) => login,
        }
    }
}

/// Unauthenticated client for the public GitHub REST API
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    api_url: String,
    user_agent: String,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Fetch one page of a collection
    ///
    /// Any non-2xx response becomes [`RemoteError::Status`] carrying the body text.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        resource: &Resource,
        page: u32,
    ) -> Result<Vec<T>, RemoteError> {
        let url = format!("{}{}", self.api_url, resource.path());
        debug!("GET {} page {}", url, page);

        let page_str = page.to_string();
        let per_page = PAGE_SIZE.to_string();
        let mut query: Vec<(&str, &str)> =
            vec![("per_page", per_page.as_str()), ("page", page_str.as_str())];
        query.extend_from_slice(resource.extra_query());

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, ACCEPT_V3)
            .header(USER_AGENT, &self.user_agent)
            .query(&query)
            .send()
            .await
            .map_err(|source| RemoteError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response.text().await);
            return Err(RemoteError::Status { url, status, body });
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|source| RemoteError::Decode { url, source })
    }
}

/// Body of a failed response, or why it could not be read
fn error_body(body: reqwest::Result<String>) -> String {
    body.unwrap_or_else(|e| format!("<unreadable body: {}>", e))
}
