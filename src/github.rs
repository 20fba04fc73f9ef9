// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! GitHub API access.
//!
//! Requests are issued one at a time: repository pages are fetched in order
//! because deduplication keeps the first occurrence of a repository. Any
//! transport failure or non-2xx status aborts the run. The contribution graph
//! is the only source callers may treat as optional, see [`best_effort`].

use std::{
    collections::{HashMap, HashSet},
    future::Future,
    time::Duration
};

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use octocrab::{Octocrab, service::middleware::retry::RetryConfig};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::{
    config::Settings,
    error::Error,
    model::{RepositoryContribution, RepositoryRecord, UserProfile}
};

/// Page size requested from listing endpoints.
pub const PAGE_SIZE: u32 = 100;

const CONTRIBUTIONS_QUERY: &str = r#"
query($from: DateTime!, $to: DateTime!) {
  viewer {
    login
    contributionsCollection(from: $from, to: $to) {
      commitContributionsByRepository(maxRepositories: 100) {
        repository { nameWithOwner isPrivate }
        contributions { totalCount }
      }
      pullRequestContributionsByRepository(maxRepositories: 100) {
        repository { nameWithOwner isPrivate }
        contributions { totalCount }
      }
      pullRequestReviewContributionsByRepository(maxRepositories: 100) {
        repository { nameWithOwner isPrivate }
        contributions { totalCount }
      }
      issueContributionsByRepository(maxRepositories: 100) {
        repository { nameWithOwner isPrivate }
        contributions { totalCount }
      }
    }
  }
}
"#;

/// Everything fetched for one run.
#[derive(Debug, Clone, Default)]
pub struct ProfileData {
    /// Profile of the requested account.
    pub user:          UserProfile,
    /// Repositories after deduplication and ownership filtering.
    pub repositories:  Vec<RepositoryRecord>,
    /// Contribution totals, when the contribution graph was queried
    /// successfully.
    pub contributions: Option<Vec<RepositoryContribution>>
}

/// Thin client over [`Octocrab`] that reports failures with the requested
/// URL.
#[derive(Clone)]
pub struct GithubClient {
    http:          Octocrab,
    api_base:      String,
    authenticated: bool
}

impl GithubClient {
    /// Builds a client from resolved settings.
    ///
    /// The client never retries and applies `settings.timeout` to both
    /// connecting and reading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the API base URL is invalid or
    /// the HTTP client cannot be constructed.
    pub fn new(settings: &Settings) -> Result<Self, Error> {
        let mut builder = Octocrab::builder()
            .base_uri(settings.api_base.as_str())
            .map_err(|e| {
                Error::configuration(format!("invalid API base '{}': {e}", settings.api_base))
            })?
            .add_retry_config(RetryConfig::None)
            .set_connect_timeout(Some(settings.timeout))
            .set_read_timeout(Some(settings.timeout));

        if let Some(token) = settings.token.as_ref() {
            builder = builder.personal_token(token.clone());
        }

        let http = builder
            .build()
            .map_err(|e| Error::configuration(format!("failed to build GitHub client: {e}")))?;

        Ok(Self {
            http,
            api_base: settings.api_base.clone(),
            authenticated: settings.is_authenticated()
        })
    }

    /// Whether requests carry a bearer credential.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Fetches the profile, repositories and, when allowed, contribution
    /// totals for `settings.username`.
    ///
    /// # Errors
    ///
    /// Propagates profile and repository failures. Contribution failures are
    /// logged and dropped.
    pub async fn fetch_profile(&self, settings: &Settings) -> Result<ProfileData, Error> {
        let user = self.fetch_user(&settings.username).await?;
        let repositories = self.fetch_repositories(&settings.username).await?;

        let contributions = if self.authenticated && settings.contributions {
            let from = settings.now - chrono::Duration::days(i64::from(settings.recent_days));
            best_effort(
                self.fetch_contributions(from, settings.now).await,
                "contribution graph"
            )
        } else {
            None
        };

        Ok(ProfileData {
            user,
            repositories,
            contributions
        })
    }

    /// Fetches the public profile of `username`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Shape`] when the payload is not an object.
    pub async fn fetch_user(&self, username: &str) -> Result<UserProfile, Error> {
        let value = self.get_json(&format!("/users/{username}")).await?;
        decode_user(value)
    }

    /// Fetches every repository visible for `username`.
    ///
    /// Authenticated runs list everything the caller can see, deduplicated by
    /// full name. Unauthenticated runs list the user's own repositories and
    /// drop entries owned by someone else, unless that would drop all of them.
    ///
    /// # Errors
    ///
    /// Fails on the first page that cannot be fetched or decoded.
    pub async fn fetch_repositories(&self, username: &str) -> Result<Vec<RepositoryRecord>, Error> {
        let spinner = fetch_spinner();
        let client = self;

        let items = collect_pages(|page| {
            let route = repositories_route(username, page, client.authenticated);
            spinner.set_message(format!("Fetching repositories page {page}..."));
            async move {
                let value = client.get_json(&route).await?;
                page_items(value)
            }
        })
        .await;
        spinner.finish_and_clear();

        let repositories = decode_repositories(items?)?;
        info!("Fetched {} repositories for {}", repositories.len(), username);

        Ok(finalize_listing(repositories, username, self.authenticated))
    }

    /// Queries per-repository contribution totals for the authenticated
    /// caller between `from` and `to`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphQl`] when the response carries errors and
    /// [`Error::Shape`] when it lacks the expected data.
    pub async fn fetch_contributions(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>
    ) -> Result<Vec<RepositoryContribution>, Error> {
        let payload = json!({
            "query": CONTRIBUTIONS_QUERY,
            "variables": {
                "from": from.to_rfc3339(),
                "to": to.to_rfc3339()
            }
        });
        let value = self.post_json("/graphql", &payload).await?;
        let contributions = decode_contributions(value)?;
        debug!("Contribution graph covers {} repositories", contributions.len());
        Ok(contributions)
    }

    async fn get_json(&self, route: &str) -> Result<Value, Error> {
        self.send(route, None).await
    }

    async fn post_json(&self, route: &str, payload: &Value) -> Result<Value, Error> {
        self.send(route, Some(payload)).await
    }

    async fn send(&self, route: &str, payload: Option<&Value>) -> Result<Value, Error> {
        let url = self.url_for(route);
        let transport = |source| Error::Transport {
            url: url.clone(),
            source
        };

        let response = match payload {
            Some(body) => {
                debug!("POST {}", url);
                self.http._post(route, Some(body)).await
            }
            None => {
                debug!("GET {}", url);
                self.http._get(route).await
            }
        }
        .map_err(transport)?;

        let status = response.status();
        let body = self.http.body_to_string(response).await.map_err(transport)?;

        if !status.is_success() {
            return Err(Error::Upstream {
                url,
                status: status.as_u16(),
                detail: body
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::shape("response", format!("{url}: {e}")))
    }

    fn url_for(&self, route: &str) -> String {
        format!("{}{}", self.api_base, route)
    }
}

/// Repeatedly requests pages starting at 1 until a page comes back empty.
///
/// Pages are requested strictly in order and the items are concatenated in
/// page order.
///
/// # Errors
///
/// Returns the first error produced by `fetch_page`; items collected so far
/// are discarded.
pub async fn collect_pages<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>, Error>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>, Error>>
{
    let mut items = Vec::new();
    let mut page = 1u32;

    loop {
        let batch = fetch_page(page).await?;
        if batch.is_empty() {
            debug!("Page {} is empty, pagination complete", page);
            break;
        }
        items.extend(batch);
        page += 1;
    }

    Ok(items)
}

/// Logs a warning and returns `None` when an optional source failed.
pub fn best_effort<T>(result: Result<T, Error>, source: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            warn!("{source} unavailable, falling back to repository activity: {error}");
            None
        }
    }
}

/// Unwraps a listing page, which must be a JSON array.
///
/// # Errors
///
/// Returns [`Error::Shape`] for any other JSON kind.
pub fn page_items(value: Value) -> Result<Vec<Value>, Error> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(Error::shape(
            "repos",
            format!("expected a JSON array, got {}", json_kind(&other))
        ))
    }
}

/// Decodes repository entries, skipping entries that are not objects.
///
/// # Errors
///
/// Returns [`Error::Shape`] when an object has fields of the wrong type.
pub fn decode_repositories(items: Vec<Value>) -> Result<Vec<RepositoryRecord>, Error> {
    let mut repositories = Vec::with_capacity(items.len());
    for item in items {
        if !item.is_object() {
            debug!("Skipping non-object repository entry: {}", json_kind(&item));
            continue;
        }
        let record: RepositoryRecord = serde_json::from_value(item)
            .map_err(|e| Error::shape("repos", format!("invalid repository entry: {e}")))?;
        repositories.push(record);
    }
    Ok(repositories)
}

/// Decodes the profile payload.
///
/// # Errors
///
/// Returns [`Error::Shape`] when the payload is not an object or has fields
/// of the wrong type.
pub fn decode_user(value: Value) -> Result<UserProfile, Error> {
    if !value.is_object() {
        return Err(Error::shape(
            "user",
            format!("expected a JSON object, got {}", json_kind(&value))
        ));
    }
    serde_json::from_value(value).map_err(|e| Error::shape("user", e.to_string()))
}

/// Drops repeated repositories, keeping the first occurrence.
///
/// Entries without a full name or id cannot be compared and are kept.
pub fn dedupe_repositories(repositories: Vec<RepositoryRecord>) -> Vec<RepositoryRecord> {
    let mut seen = HashSet::with_capacity(repositories.len());
    let before = repositories.len();
    let unique: Vec<RepositoryRecord> = repositories
        .into_iter()
        .filter(|repo| match repo.dedupe_key() {
            Some(key) => seen.insert(key),
            None => true
        })
        .collect();

    if unique.len() != before {
        debug!("Dropped {} duplicate repositories", before - unique.len());
    }
    unique
}

/// Listing route for one page of repositories.
///
/// Authenticated callers list everything they can see through `/user/repos`;
/// anonymous runs fall back to the public per-user listing.
pub fn repositories_route(username: &str, page: u32, authenticated: bool) -> String {
    if authenticated {
        format!("/user/repos?per_page={PAGE_SIZE}&visibility=all&sort=updated&page={page}")
    } else {
        format!("/users/{username}/repos?per_page={PAGE_SIZE}&type=owner&sort=updated&page={page}")
    }
}

/// Post-processes a full listing: authenticated listings are deduplicated and
/// keep organization repositories, anonymous ones keep only owned entries.
pub fn finalize_listing(
    repositories: Vec<RepositoryRecord>,
    username: &str,
    authenticated: bool
) -> Vec<RepositoryRecord> {
    if authenticated {
        dedupe_repositories(repositories)
    } else {
        retain_owned(repositories, username)
    }
}

/// Keeps repositories owned by `username` (case-insensitive).
///
/// When no repository matches, the unfiltered list is returned.
pub fn retain_owned(repositories: Vec<RepositoryRecord>, username: &str) -> Vec<RepositoryRecord> {
    let owned: Vec<RepositoryRecord> = repositories
        .iter()
        .filter(|repo| {
            repo.owner_login()
                .is_some_and(|login| login.eq_ignore_ascii_case(username))
        })
        .cloned()
        .collect();

    if owned.is_empty() && !repositories.is_empty() {
        warn!("No repository is owned by {username}; keeping the unfiltered listing");
        return repositories;
    }
    owned
}

#[derive(Deserialize)]
struct GraphQlEnvelope {
    data:   Option<ContributionData>,
    #[serde(default)]
    errors: Option<Vec<Value>>
}

#[derive(Deserialize)]
struct ContributionData {
    viewer: Viewer
}

#[derive(Deserialize)]
struct Viewer {
    #[serde(rename = "contributionsCollection")]
    collection: ContributionsCollection
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionsCollection {
    #[serde(default)]
    commit_contributions_by_repository:              Vec<ByRepository>,
    #[serde(default)]
    pull_request_contributions_by_repository:        Vec<ByRepository>,
    #[serde(default)]
    pull_request_review_contributions_by_repository: Vec<ByRepository>,
    #[serde(default)]
    issue_contributions_by_repository:               Vec<ByRepository>
}

#[derive(Deserialize)]
struct ByRepository {
    repository:    RepositoryRef,
    contributions: CountObj
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryRef {
    name_with_owner: String,
    #[serde(default)]
    is_private:      bool
}

#[derive(Deserialize)]
struct CountObj {
    #[serde(rename = "totalCount")]
    total_count: u64
}

#[derive(Clone, Copy)]
enum ContributionKind {
    Commits,
    PullRequests,
    Reviews,
    Issues
}

/// Decodes a contribution-graph response into per-repository totals, in
/// first-seen order.
///
/// # Errors
///
/// Returns [`Error::GraphQl`] when the response lists errors and
/// [`Error::Shape`] when `data` is missing or malformed.
pub fn decode_contributions(value: Value) -> Result<Vec<RepositoryContribution>, Error> {
    let envelope: GraphQlEnvelope =
        serde_json::from_value(value).map_err(|e| Error::shape("graphql", e.to_string()))?;

    if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
        return Err(Error::GraphQl {
            message: Value::Array(errors).to_string()
        });
    }

    let collection = envelope
        .data
        .ok_or_else(|| Error::shape("graphql", "response has no data"))?
        .viewer
        .collection;

    let mut merged: Vec<RepositoryContribution> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let groups = [
        (ContributionKind::Commits, collection.commit_contributions_by_repository),
        (ContributionKind::PullRequests, collection.pull_request_contributions_by_repository),
        (ContributionKind::Reviews, collection.pull_request_review_contributions_by_repository),
        (ContributionKind::Issues, collection.issue_contributions_by_repository)
    ];

    for (kind, entries) in groups {
        for entry in entries {
            let slot = *index
                .entry(entry.repository.name_with_owner.clone())
                .or_insert_with(|| {
                    merged.push(RepositoryContribution {
                        name_with_owner: entry.repository.name_with_owner.clone(),
                        is_private: entry.repository.is_private,
                        ..RepositoryContribution::default()
                    });
                    merged.len() - 1
                });
            let count = entry.contributions.total_count;
            let target = &mut merged[slot];
            match kind {
                ContributionKind::Commits => target.commits += count,
                ContributionKind::PullRequests => target.pull_requests += count,
                ContributionKind::Reviews => target.reviews += count,
                ContributionKind::Issues => target.issues += count
            }
        }
    }

    Ok(merged)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object"
    }
}

fn fetch_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
