// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! GitHub profile statistics for README dashboards.
//!
//! The library fetches a user's profile and repositories from the GitHub API,
//! reduces them to aggregate counts and renders the result either as an SVG
//! card or as a markdown section that is upserted between sentinel comments
//! of a README. Fetching is the only I/O-heavy stage; aggregation and
//! rendering are pure functions of their inputs, so output is reproducible
//! for a fixed clock.

mod artifact;
mod config;
mod error;
mod github;
mod model;
mod readme;
mod stats;
mod svg;

pub use artifact::write_artifact;
pub use config::{
    DEFAULT_API_BASE, DEFAULT_README_PATH, DEFAULT_SVG_OUTPUT, Overrides, Settings, StatsConfig,
    load_config, parse_config
};
pub use error::{
    CONFIGURATION_EXIT_CODE, Error, FAILURE_EXIT_CODE, artifact_io_error, config_io_error
};
pub use github::{
    GithubClient, ProfileData, best_effort, collect_pages, decode_contributions,
    decode_repositories, decode_user, dedupe_repositories, finalize_listing, page_items,
    repositories_route, retain_owned
};
pub use model::{RepositoryContribution, RepositoryOwner, RepositoryRecord, UserProfile};
pub use readme::{
    ReadmeUpdate, SECTION_END_MARKER, SECTION_START_MARKER, build_fragment, seed_document,
    update_readme, upsert_section
};
pub use stats::{
    ActivitySource, AggregateOptions, AggregateStats, ContributionMix, NO_LANGUAGE_DATA,
    OTHER_LABEL, Ranked, RepositorySource, TopRepository, aggregate, format_count, language_mix,
    percentage, rank_languages, top_starred, with_other_bucket
};
pub use svg::{Card, Donut, Tile, build_svg, escape_xml};

/// Aggregates fetched data with the windows and limits from `settings`.
pub fn summarize(data: &ProfileData, settings: &Settings) -> AggregateStats {
    aggregate(
        &data.user,
        &data.repositories,
        data.contributions.as_deref(),
        &AggregateOptions::from(settings),
        settings.now
    )
}

/// Renders the SVG card for aggregated statistics.
pub fn render_svg(stats: &AggregateStats) -> String {
    build_svg(&Card::from_stats(stats))
}
