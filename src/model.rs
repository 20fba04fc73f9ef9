// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Typed records decoded from GitHub API payloads.
//!
//! Fields GitHub may omit or send as `null` are defaulted here, at the decode
//! boundary, so aggregation never has to second-guess a record. Timestamps
//! that fail to parse decode as `None` instead of failing the whole page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Snapshot of the account the statistics are generated for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    /// Account login.
    #[serde(default, deserialize_with = "null_as_default")]
    pub login:        String,
    /// Optional display name configured on the profile.
    #[serde(default)]
    pub name:         Option<String>,
    /// Number of followers.
    #[serde(default, deserialize_with = "null_as_default")]
    pub followers:    u64,
    /// Number of followed accounts.
    #[serde(default, deserialize_with = "null_as_default")]
    pub following:    u64,
    /// Public repository count as reported by the profile endpoint.
    #[serde(default, deserialize_with = "null_as_default")]
    pub public_repos: u64
}

impl UserProfile {
    /// Returns the configured display name, or `fallback` when it is unset or
    /// blank.
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => fallback
        }
    }
}

/// Owner block nested inside a repository payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RepositoryOwner {
    /// Login of the owning account.
    #[serde(default, deserialize_with = "null_as_default")]
    pub login: String
}

/// One repository entry from a REST listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RepositoryRecord {
    /// Numeric repository id.
    #[serde(default)]
    pub id:          Option<u64>,
    /// Short repository name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name:        String,
    /// `owner/name` identifier.
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name:   String,
    /// Owning account, when present.
    #[serde(default)]
    pub owner:       Option<RepositoryOwner>,
    /// Primary language detected by GitHub.
    #[serde(default)]
    pub language:    Option<String>,
    /// Stargazer count.
    #[serde(default, rename = "stargazers_count", deserialize_with = "null_as_default")]
    pub stars:       u64,
    /// Fork count.
    #[serde(default, rename = "forks_count", deserialize_with = "null_as_default")]
    pub forks:       u64,
    /// Whether the repository is itself a fork.
    #[serde(default, rename = "fork", deserialize_with = "null_as_default")]
    pub is_fork:     bool,
    /// Whether the repository is archived.
    #[serde(default, rename = "archived", deserialize_with = "null_as_default")]
    pub is_archived: bool,
    /// Whether the repository is private.
    #[serde(default, rename = "private", deserialize_with = "null_as_default")]
    pub is_private:  bool,
    /// Last push time.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub pushed_at:   Option<DateTime<Utc>>,
    /// Last metadata update time.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at:  Option<DateTime<Utc>>
}

impl RepositoryRecord {
    /// Login of the owning account, if the payload carried one.
    pub fn owner_login(&self) -> Option<&str> {
        self.owner.as_ref().map(|owner| owner.login.as_str())
    }

    /// Most recent of push and update time.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        match (self.pushed_at, self.updated_at) {
            (Some(pushed), Some(updated)) => Some(pushed.max(updated)),
            (pushed, updated) => pushed.or(updated)
        }
    }

    /// Stable identity used to drop repeated entries: the full name, falling
    /// back to the numeric id.
    pub fn dedupe_key(&self) -> Option<String> {
        if !self.full_name.is_empty() {
            return Some(self.full_name.clone());
        }
        self.id.map(|id| format!("#{id}"))
    }

    /// Primary language, ignoring empty strings.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref().filter(|language| !language.is_empty())
    }
}

/// Contribution totals for one repository over the queried window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryContribution {
    /// `owner/name` identifier.
    pub name_with_owner: String,
    /// Whether the repository is private.
    pub is_private:      bool,
    /// Commit contributions.
    pub commits:         u64,
    /// Opened pull requests.
    pub pull_requests:   u64,
    /// Submitted pull request reviews.
    pub reviews:         u64,
    /// Opened issues.
    pub issues:          u64
}

impl RepositoryContribution {
    /// Sum of all activity kinds.
    pub fn total(&self) -> u64 {
        self.commits
            .saturating_add(self.pull_requests)
            .saturating_add(self.reviews)
            .saturating_add(self.issues)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(parse_timestamp))
}

/// Parses an RFC 3339 timestamp such as `2024-05-01T12:00:00Z`.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}
