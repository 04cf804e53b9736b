//! Star records and the raw GitHub payloads they are built from

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Timestamp layout GitHub uses for `pushed_at`
pub const PUSHED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One mirrored repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StarRecord {
    /// Login whose star list first produced this row
    pub starred_by: String,
    pub repo_id: i64,
    pub stars: i64,
    pub pushed_at: DateTime<Utc>,
    pub repo_name: Option<String>,
    pub repo_url: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
}

/// Entry of `GET /users/{login}/starred`
///
/// Required fields are optional here so a missing one is reported by name
/// instead of failing the whole page decode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStar {
    pub id: Option<i64>,
    pub stargazers_count: Option<i64>,
    pub pushed_at: Option<String>,
    pub name: Option<String>,
    pub html_url: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
}

/// Entry of `GET /users/{login}/following`
#[derive(Debug, Clone, Deserialize)]
pub struct FollowedUser {
    pub login: String,
}

impl StarRecord {
    /// Build a record attributed to `owner` from one raw starred entry
    pub fn from_raw(owner: &str, raw: RawStar) -> Result<Self, ParseError> {
        let repo_id = raw.id.ok_or(ParseError::MissingField("id"))?;
        let stars = raw
            .stargazers_count
            .ok_or(ParseError::MissingField("stargazers_count"))?;
        let pushed_at = raw.pushed_at.ok_or(ParseError::MissingField("pushed_at"))?;

        Ok(Self {
            starred_by: owner.to_string(),
            repo_id,
            stars,
            pushed_at: parse_pushed_at(&pushed_at)?,
            repo_name: raw.name,
            repo_url: raw.html_url,
            description: raw.description,
            language: raw.language,
        })
    }

    /// Decode a JSON entry straight from a fetched page
    pub fn from_value(owner: &str, entry: &serde_json::Value) -> Result<Self, ParseError> {
        let raw = RawStar::deserialize(entry)?;
        Self::from_raw(owner, raw)
    }

    /// `pushed_at` rendered the way GitHub sends it
    pub fn pushed_at_string(&self) -> String {
        self.pushed_at.format(PUSHED_AT_FORMAT).to_string()
    }
}

pub fn parse_pushed_at(value: &str) -> Result<DateTime<Utc>, ParseError> {
    NaiveDateTime::parse_from_str(value, PUSHED_AT_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|source| ParseError::Timestamp {
            value: value.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Datelike;
    use serde_json::json;

    fn entry() -> serde_json::Value {
        json!({
            "id": 1296269,
            "stargazers_count": 80,
            "pushed_at": "2011-01-26T19:06:43Z",
            "name": "Hello-World",
            "html_url": "https://github.com/octocat/Hello-World",
            "description": "This your first repo!",
            "language": null,
            "owner": { "login": "octocat" }
        })
    }

    #[test]
    fn test_record_from_entry() {
        let record = StarRecord::from_value("bob", &entry()).unwrap();

        assert_eq!(record.starred_by, "bob");
        assert_eq!(record.repo_id, 1296269);
        assert_eq!(record.stars, 80);
        assert_eq!(record.pushed_at.year(), 2011);
        assert_eq!(record.repo_name.as_deref(), Some("Hello-World"));
        assert_eq!(record.language, None);
        assert_eq!(record.pushed_at_string(), "2011-01-26T19:06:43Z");
    }

    #[test]
    fn test_missing_required_field() {
        let mut value = entry();
        value.as_object_mut().unwrap().remove("stargazers_count");

        let err = StarRecord::from_value("bob", &value).unwrap_err();
        assert_matches!(err, ParseError::MissingField("stargazers_count"));
    }

    #[test]
    fn test_null_pushed_at_is_missing() {
        let mut value = entry();
        value["pushed_at"] = serde_json::Value::Null;

        let err = StarRecord::from_value("bob", &value).unwrap_err();
        assert_matches!(err, ParseError::MissingField("pushed_at"));
    }

    #[test]
    fn test_malformed_timestamp() {
        let mut value = entry();
        value["pushed_at"] = json!("2011-01-26 19:06:43");

        let err = StarRecord::from_value("bob", &value).unwrap_err();
        assert_matches!(err, ParseError::Timestamp { .. });
    }

    #[test]
    fn test_wrong_type() {
        let mut value = entry();
        value["id"] = json!("not-a-number");

        let err = StarRecord::from_value("bob", &value).unwrap_err();
        assert_matches!(err, ParseError::Entry(_));
    }
}
