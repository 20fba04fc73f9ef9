// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Aggregation of fetched records into presentation-ready statistics.
//!
//! Everything here is pure: the same profile, repositories and `now` always
//! produce the same [`AggregateStats`]. Derived counts are computed with
//! saturating arithmetic, so inconsistent upstream flags can never yield a
//! negative value.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::{
    config::{
        DEFAULT_RECENT_DAYS, DEFAULT_STALE_DAYS, DEFAULT_TOP_LANGUAGES, DEFAULT_TOP_REPOSITORIES,
        Settings
    },
    model::{RepositoryContribution, RepositoryRecord, UserProfile}
};

/// Rendered in place of a language mix when no repository has a language.
pub const NO_LANGUAGE_DATA: &str = "No language data";

/// Label of the bucket absorbing languages beyond the displayed ones.
pub const OTHER_LABEL: &str = "Other";

/// Which repositories the breakdown figures were computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositorySource {
    /// Every visible repository; no private data was available.
    Public,
    /// Private repositories only.
    Private
}

/// Where the recent-activity figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySource {
    /// Push and update timestamps of repositories.
    Timestamps,
    /// The authenticated contribution graph.
    Contributions
}

/// A labelled count in a ranking or chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranked {
    /// Category label.
    pub label: String,
    /// Non-negative count.
    pub value: u64
}

impl Ranked {
    /// Creates a ranked entry.
    pub fn new(label: impl Into<String>, value: u64) -> Self {
        Self {
            label: label.into(),
            value
        }
    }
}

/// A repository selected for the star ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopRepository {
    /// Short name.
    pub name:      String,
    /// `owner/name` identifier.
    pub full_name: String,
    /// Stargazer count.
    pub stars:     u64
}

/// Contribution totals across all repositories in the queried window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContributionMix {
    /// Commit contributions.
    pub commits:       u64,
    /// Opened pull requests.
    pub pull_requests: u64,
    /// Submitted reviews.
    pub reviews:       u64,
    /// Opened issues.
    pub issues:        u64
}

impl ContributionMix {
    /// Chart dataset in a fixed order.
    pub fn dataset(&self) -> Vec<Ranked> {
        vec![
            Ranked::new("Commits", self.commits),
            Ranked::new("Pull Requests", self.pull_requests),
            Ranked::new("Reviews", self.reviews),
            Ranked::new("Issues", self.issues),
        ]
    }
}

/// Tunables for [`aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Short activity window in days.
    pub recent_days:      u32,
    /// Long activity window in days.
    pub stale_days:       u32,
    /// Number of languages kept in [`AggregateStats::top_languages`].
    pub top_languages:    usize,
    /// Number of repositories kept in the star ranking.
    pub top_repositories: usize
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            recent_days:      DEFAULT_RECENT_DAYS,
            stale_days:       DEFAULT_STALE_DAYS,
            top_languages:    DEFAULT_TOP_LANGUAGES,
            top_repositories: DEFAULT_TOP_REPOSITORIES
        }
    }
}

impl From<&Settings> for AggregateOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            recent_days:      settings.recent_days,
            stale_days:       settings.stale_days,
            top_languages:    settings.top_languages,
            top_repositories: settings.top_repositories
        }
    }
}

/// Statistics derived from one run's data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateStats {
    /// Login the statistics belong to.
    pub login:             String,
    /// Name shown in headings.
    pub display_name:      String,
    /// Follower count.
    pub followers:         u64,
    /// Following count.
    pub following:         u64,
    /// Number of public repositories fetched.
    pub public_repos:      u64,
    /// Number of private repositories fetched.
    pub private_repos:     u64,
    /// Stars summed over public repositories.
    pub total_stars:       u64,
    /// Repositories the breakdown covers.
    pub repository_source: RepositorySource,
    /// Source of [`AggregateStats::touched_recent`].
    pub activity_source:   ActivitySource,
    /// Size of the breakdown set.
    pub total:             u64,
    /// Non-fork repositories in the breakdown set.
    pub original:          u64,
    /// Forks in the breakdown set.
    pub forked:            u64,
    /// Archived repositories in the breakdown set.
    pub archived:          u64,
    /// Non-archived repositories in the breakdown set.
    pub active:            u64,
    /// Repositories active within the short window.
    pub recent:            u64,
    /// Repositories active within the long window.
    pub updated:           u64,
    /// Repositories not active within the long window.
    pub older:             u64,
    /// Headline recent-activity figure: repositories with contributions when
    /// the contribution graph is available, [`AggregateStats::recent`]
    /// otherwise.
    pub touched_recent:    u64,
    /// Every language in the breakdown set, most used first.
    pub languages:         Vec<Ranked>,
    /// Public repositories ranked by stars.
    pub top_repositories:  Vec<TopRepository>,
    /// Contribution totals, when the contribution graph was used.
    pub contributions:     Option<ContributionMix>,
    /// Short activity window in days.
    pub recent_days:       u32,
    /// Long activity window in days.
    pub stale_days:        u32,
    /// Number of languages to present.
    pub language_limit:    usize
}

impl AggregateStats {
    /// The first `language_limit` entries of the language ranking.
    pub fn top_languages(&self) -> &[Ranked] {
        &self.languages[..self.languages.len().min(self.language_limit)]
    }

    /// Whether private repositories drive the breakdown.
    pub fn is_private(&self) -> bool {
        self.repository_source == RepositorySource::Private
    }
}

/// Reduces a profile and its repositories to [`AggregateStats`].
///
/// When at least one private repository is present the breakdown (forks,
/// archival, activity, languages) covers private repositories only;
/// otherwise it covers every repository. Stars are always summed over public
/// repositories. A provided contribution list replaces the timestamp-based
/// recent-activity figure.
pub fn aggregate(
    user: &UserProfile,
    repositories: &[RepositoryRecord],
    contributions: Option<&[RepositoryContribution]>,
    options: &AggregateOptions,
    now: DateTime<Utc>
) -> AggregateStats {
    let (private, public): (Vec<&RepositoryRecord>, Vec<&RepositoryRecord>) =
        repositories.iter().partition(|repo| repo.is_private);

    let repository_source = if private.is_empty() {
        RepositorySource::Public
    } else {
        RepositorySource::Private
    };
    let breakdown: Vec<&RepositoryRecord> = match repository_source {
        RepositorySource::Private => private.clone(),
        RepositorySource::Public => repositories.iter().collect()
    };

    let total = breakdown.len() as u64;
    let forked = breakdown.iter().filter(|repo| repo.is_fork).count() as u64;
    let archived = breakdown.iter().filter(|repo| repo.is_archived).count() as u64;
    let recent = count_active_since(&breakdown, now, options.recent_days);
    let updated = count_active_since(&breakdown, now, options.stale_days);

    let (activity_source, touched_recent, mix) = match contributions {
        Some(entries) => (
            ActivitySource::Contributions,
            entries.iter().filter(|entry| entry.total() > 0).count() as u64,
            Some(contribution_mix(entries))
        ),
        None => (ActivitySource::Timestamps, recent, None)
    };

    AggregateStats {
        login: user.login.clone(),
        display_name: user.display_name(&user.login).to_owned(),
        followers: user.followers,
        following: user.following,
        public_repos: public.len() as u64,
        private_repos: private.len() as u64,
        total_stars: public.iter().map(|repo| repo.stars).sum(),
        repository_source,
        activity_source,
        total,
        original: remainder(total, forked),
        forked,
        archived,
        active: remainder(total, archived),
        recent,
        updated,
        older: remainder(total, updated),
        touched_recent,
        languages: rank_languages(breakdown.iter().copied()),
        top_repositories: top_starred(&public, options.top_repositories),
        contributions: mix,
        recent_days: options.recent_days,
        stale_days: options.stale_days,
        language_limit: options.top_languages
    }
}

/// `total - subset`, clamped at zero.
pub fn remainder(total: u64, subset: u64) -> u64 {
    total.saturating_sub(subset)
}

/// Counts repositories whose last activity is no older than `days` before
/// `now`. The boundary is inclusive; repositories without a timestamp are not
/// counted.
pub fn count_active_since(repositories: &[&RepositoryRecord], now: DateTime<Utc>, days: u32) -> u64 {
    let cutoff = now - Duration::days(i64::from(days));
    repositories
        .iter()
        .filter(|repo| repo.last_activity().is_some_and(|at| at >= cutoff))
        .count() as u64
}

/// Counts repositories per language, most used first. Ties keep the order in
/// which languages were first seen.
pub fn rank_languages<'a, I>(repositories: I) -> Vec<Ranked>
where
    I: IntoIterator<Item = &'a RepositoryRecord>
{
    let mut ranking: Vec<Ranked> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for repo in repositories {
        let Some(language) = repo.language() else {
            continue;
        };
        match index.get(language) {
            Some(&slot) => ranking[slot].value += 1,
            None => {
                index.insert(language, ranking.len());
                ranking.push(Ranked::new(language, 1));
            }
        }
    }

    ranking.sort_by(|a, b| b.value.cmp(&a.value));
    ranking
}

/// Keeps the first `keep` entries and folds the rest into a trailing
/// [`OTHER_LABEL`] entry, so the result sums to the same total as `ranking`.
/// No bucket is added when nothing remains.
pub fn with_other_bucket(ranking: &[Ranked], keep: usize) -> Vec<Ranked> {
    let split = ranking.len().min(keep);
    let mut kept = ranking[..split].to_vec();
    let other: u64 = ranking[split..].iter().map(|entry| entry.value).sum();
    if other > 0 {
        kept.push(Ranked::new(OTHER_LABEL, other));
    }
    kept
}

/// Ranks repositories by stars, most starred first. Ties keep input order.
pub fn top_starred(repositories: &[&RepositoryRecord], limit: usize) -> Vec<TopRepository> {
    let mut ranked: Vec<&RepositoryRecord> = repositories.to_vec();
    ranked.sort_by(|a, b| b.stars.cmp(&a.stars));
    ranked
        .into_iter()
        .take(limit)
        .map(|repo| TopRepository {
            name:      repo.name.clone(),
            full_name: repo.full_name.clone(),
            stars:     repo.stars
        })
        .collect()
}

/// Sums contribution kinds across repositories.
pub fn contribution_mix(entries: &[RepositoryContribution]) -> ContributionMix {
    entries.iter().fold(ContributionMix::default(), |mix, entry| ContributionMix {
        commits:       mix.commits.saturating_add(entry.commits),
        pull_requests: mix.pull_requests.saturating_add(entry.pull_requests),
        reviews:       mix.reviews.saturating_add(entry.reviews),
        issues:        mix.issues.saturating_add(entry.issues)
    })
}

/// Formats `part` as a share of `total` with one decimal, or `0%` when the
/// total is zero.
///
/// ```
/// use profile_stats::percentage;
///
/// assert_eq!(percentage(1, 4), "25.0%");
/// assert_eq!(percentage(0, 0), "0%");
/// ```
pub fn percentage(part: u64, total: u64) -> String {
    if total == 0 {
        return "0%".to_owned();
    }
    format!("{:.1}%", part as f64 / total as f64 * 100.0)
}

/// Formats a count with comma thousands separators.
///
/// ```
/// use profile_stats::format_count;
///
/// assert_eq!(format_count(1234567), "1,234,567");
/// ```
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (position, digit) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(digit);
    }
    formatted
}

/// One-line summary such as `Rust 50.0%, Go 25.0%`, or [`NO_LANGUAGE_DATA`]
/// when the ranking is empty. Shares are relative to the whole ranking.
pub fn language_mix(ranking: &[Ranked], limit: usize) -> String {
    let total: u64 = ranking.iter().map(|entry| entry.value).sum();
    if total == 0 {
        return NO_LANGUAGE_DATA.to_owned();
    }
    ranking
        .iter()
        .take(limit)
        .map(|entry| format!("{} {}", entry.label, percentage(entry.value, total)))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use proptest::prelude::*;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn repo(name: &str) -> RepositoryRecord {
        RepositoryRecord {
            name: name.to_owned(),
            full_name: format!("octocat/{name}"),
            ..RepositoryRecord::default()
        }
    }

    fn with_language(name: &str, language: &str) -> RepositoryRecord {
        RepositoryRecord {
            language: Some(language.to_owned()),
            ..repo(name)
        }
    }

    fn user() -> UserProfile {
        UserProfile {
            login: "octocat".to_owned(),
            name: Some("The Octocat".to_owned()),
            followers: 1200,
            following: 3,
            public_repos: 8
        }
    }

    #[test]
    fn percentage_formats_one_decimal() {
        assert_eq!(percentage(0, 0), "0%");
        assert_eq!(percentage(1, 4), "25.0%");
        assert_eq!(percentage(1, 3), "33.3%");
        assert_eq!(percentage(5, 5), "100.0%");
    }

    #[test]
    fn format_count_groups_thousands() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn empty_input_yields_zeroes() {
        let stats = aggregate(&UserProfile::default(), &[], None, &AggregateOptions::default(), now());

        assert_eq!(stats.total, 0);
        assert_eq!(stats.original, 0);
        assert_eq!(stats.forked, 0);
        assert_eq!(stats.active, 0);
        assert_eq!(stats.archived, 0);
        assert_eq!(stats.recent, 0);
        assert_eq!(stats.older, 0);
        assert_eq!(stats.total_stars, 0);
        assert!(stats.languages.is_empty());
        assert!(stats.top_repositories.is_empty());
        assert_eq!(stats.repository_source, RepositorySource::Public);
        assert_eq!(language_mix(&stats.languages, 6), NO_LANGUAGE_DATA);
    }

    #[test]
    fn stars_only_count_public_repositories() {
        let repositories = vec![
            RepositoryRecord {
                stars: 10,
                ..repo("public")
            },
            RepositoryRecord {
                stars: 50,
                is_private: true,
                ..repo("secret")
            },
        ];
        let stats = aggregate(&user(), &repositories, None, &AggregateOptions::default(), now());
        assert_eq!(stats.total_stars, 10);
        assert_eq!(stats.public_repos, 1);
        assert_eq!(stats.private_repos, 1);
    }

    #[test]
    fn private_repositories_drive_breakdown() {
        let repositories = vec![
            RepositoryRecord {
                is_fork: true,
                ..with_language("public-fork", "Go")
            },
            RepositoryRecord {
                is_private: true,
                is_archived: true,
                ..with_language("secret", "Rust")
            },
        ];
        let stats = aggregate(&user(), &repositories, None, &AggregateOptions::default(), now());

        assert!(stats.is_private());
        assert_eq!(stats.total, 1);
        assert_eq!(stats.forked, 0);
        assert_eq!(stats.archived, 1);
        assert_eq!(stats.languages, vec![Ranked::new("Rust", 1)]);
    }

    #[test]
    fn public_only_breakdown_covers_everything() {
        let repositories = vec![
            RepositoryRecord {
                is_fork: true,
                ..repo("a")
            },
            repo("b"),
            repo("c"),
        ];
        let stats = aggregate(&user(), &repositories, None, &AggregateOptions::default(), now());
        assert_eq!(stats.repository_source, RepositorySource::Public);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.forked, 1);
        assert_eq!(stats.original, 2);
    }

    #[test]
    fn recency_boundary_is_inclusive() {
        let exactly_thirty = RepositoryRecord {
            pushed_at: Some(now() - Duration::days(30)),
            ..repo("edge")
        };
        let just_outside = RepositoryRecord {
            pushed_at: Some(now() - Duration::days(30) - Duration::seconds(1)),
            ..repo("outside")
        };
        let undated = repo("undated");

        let records = [&exactly_thirty, &just_outside, &undated];
        assert_eq!(count_active_since(&records, now(), 30), 1);
        assert_eq!(count_active_since(&records, now(), 90), 2);
    }

    #[test]
    fn recency_uses_latest_of_push_and_update() {
        let updated_recently = RepositoryRecord {
            pushed_at: Some(now() - Duration::days(200)),
            updated_at: Some(now() - Duration::days(2)),
            ..repo("metadata")
        };
        assert_eq!(count_active_since(&[&updated_recently], now(), 30), 1);
    }

    #[test]
    fn recent_and_older_split_long_window() {
        let repositories = vec![
            RepositoryRecord {
                pushed_at: Some(now() - Duration::days(5)),
                ..repo("fresh")
            },
            RepositoryRecord {
                pushed_at: Some(now() - Duration::days(60)),
                ..repo("warm")
            },
            RepositoryRecord {
                pushed_at: Some(now() - Duration::days(400)),
                ..repo("cold")
            },
            repo("unknown"),
        ];
        let stats = aggregate(&user(), &repositories, None, &AggregateOptions::default(), now());

        assert_eq!(stats.recent, 1);
        assert_eq!(stats.updated, 2);
        assert_eq!(stats.older, 2);
        assert_eq!(stats.touched_recent, 1);
        assert_eq!(stats.activity_source, ActivitySource::Timestamps);
    }

    #[test]
    fn language_ranking_breaks_ties_by_first_seen() {
        let repositories = vec![
            with_language("a", "Python"),
            with_language("b", "Rust"),
            with_language("c", "Rust"),
            with_language("d", "Go"),
            with_language("e", "Python"),
            with_language("f", "Shell"),
            RepositoryRecord {
                language: Some(String::new()),
                ..repo("g")
            },
        ];
        let ranking = rank_languages(&repositories);
        assert_eq!(
            ranking,
            vec![
                Ranked::new("Python", 2),
                Ranked::new("Rust", 2),
                Ranked::new("Go", 1),
                Ranked::new("Shell", 1),
            ]
        );
    }

    #[test]
    fn other_bucket_absorbs_remainder() {
        let ranking = vec![
            Ranked::new("A", 10),
            Ranked::new("B", 7),
            Ranked::new("C", 5),
            Ranked::new("D", 3),
            Ranked::new("E", 2),
            Ranked::new("F", 1),
        ];
        let donut = with_other_bucket(&ranking, 4);
        assert_eq!(
            donut,
            vec![
                Ranked::new("A", 10),
                Ranked::new("B", 7),
                Ranked::new("C", 5),
                Ranked::new("D", 3),
                Ranked::new(OTHER_LABEL, 3),
            ]
        );
        assert_eq!(donut.iter().map(|entry| entry.value).sum::<u64>(), 28);
    }

    #[test]
    fn other_bucket_is_omitted_when_nothing_remains() {
        let ranking = vec![Ranked::new("A", 2), Ranked::new("B", 1)];
        assert_eq!(with_other_bucket(&ranking, 4), ranking);
        assert!(with_other_bucket(&[], 4).is_empty());
    }

    #[test]
    fn top_starred_is_stable() {
        let repositories = [
            RepositoryRecord {
                stars: 3,
                ..repo("three")
            },
            RepositoryRecord {
                stars: 9,
                ..repo("nine-first")
            },
            RepositoryRecord {
                stars: 0,
                ..repo("zero")
            },
            RepositoryRecord {
                stars: 9,
                ..repo("nine-second")
            },
        ];
        let references: Vec<&RepositoryRecord> = repositories.iter().collect();
        let ranked = top_starred(&references, 5);
        let names: Vec<_> = ranked.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, vec!["nine-first", "nine-second", "three", "zero"]);

        let truncated = top_starred(&references, 2);
        assert_eq!(truncated.len(), 2);
    }

    #[test]
    fn contributions_replace_timestamp_activity() {
        let repositories = vec![RepositoryRecord {
            pushed_at: Some(now() - Duration::days(1)),
            is_private: true,
            ..repo("secret")
        }];
        let contributions = vec![
            RepositoryContribution {
                name_with_owner: "octocat/secret".to_owned(),
                is_private: true,
                commits: 7,
                ..RepositoryContribution::default()
            },
            RepositoryContribution {
                name_with_owner: "org/tool".to_owned(),
                reviews: 2,
                issues: 1,
                ..RepositoryContribution::default()
            },
            RepositoryContribution {
                name_with_owner: "org/idle".to_owned(),
                ..RepositoryContribution::default()
            },
        ];

        let stats = aggregate(
            &user(),
            &repositories,
            Some(&contributions),
            &AggregateOptions::default(),
            now()
        );

        assert_eq!(stats.activity_source, ActivitySource::Contributions);
        assert_eq!(stats.touched_recent, 2);
        assert_eq!(
            stats.contributions,
            Some(ContributionMix {
                commits:       7,
                pull_requests: 0,
                reviews:       2,
                issues:        1
            })
        );
    }

    #[test]
    fn language_mix_lists_shares_of_whole_ranking() {
        let ranking = vec![Ranked::new("Rust", 2), Ranked::new("Go", 1), Ranked::new("C", 1)];
        assert_eq!(language_mix(&ranking, 2), "Rust 50.0%, Go 25.0%");
    }

    #[test]
    fn top_languages_respects_limit() {
        let repositories: Vec<RepositoryRecord> = ["A", "B", "C", "D"]
            .iter()
            .map(|language| with_language(language, language))
            .collect();
        let options = AggregateOptions {
            top_languages: 2,
            ..AggregateOptions::default()
        };
        let stats = aggregate(&user(), &repositories, None, &options, now());
        assert_eq!(stats.languages.len(), 4);
        assert_eq!(stats.top_languages().len(), 2);
    }

    #[test]
    fn display_name_comes_from_profile() {
        let stats = aggregate(&user(), &[], None, &AggregateOptions::default(), now());
        assert_eq!(stats.display_name, "The Octocat");
        assert_eq!(stats.followers, 1200);
    }

    proptest! {
        #[test]
        fn splits_always_sum_to_total(flags in proptest::collection::vec((any::<bool>(), any::<bool>(), any::<bool>()), 0..64)) {
            let repositories: Vec<RepositoryRecord> = flags
                .iter()
                .enumerate()
                .map(|(index, (fork, archived, private))| RepositoryRecord {
                    full_name: format!("octocat/{index}"),
                    is_fork: *fork,
                    is_archived: *archived,
                    is_private: *private,
                    ..RepositoryRecord::default()
                })
                .collect();

            let stats = aggregate(&user(), &repositories, None, &AggregateOptions::default(), now());
            prop_assert_eq!(stats.original + stats.forked, stats.total);
            prop_assert_eq!(stats.active + stats.archived, stats.total);
            prop_assert_eq!(stats.updated + stats.older, stats.total);
            prop_assert_eq!(stats.public_repos + stats.private_repos, repositories.len() as u64);
        }

        #[test]
        fn remainder_never_underflows(total in any::<u64>(), subset in any::<u64>()) {
            let rest = remainder(total, subset);
            prop_assert!(rest <= total);
            if subset <= total {
                prop_assert_eq!(rest + subset, total);
            } else {
                prop_assert_eq!(rest, 0);
            }
        }
    }
}
