// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Run configuration.
//!
//! Values come from three layers: built-in defaults, an optional YAML
//! document, and CLI/environment overrides. Later layers win. The result is a
//! validated [`Settings`] value that the rest of the pipeline consumes without
//! further checks.

use std::{fmt, fs, path::Path, path::PathBuf, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{self, Error},
    model::parse_timestamp
};

/// Default GitHub REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
/// Default location of the rendered SVG card.
pub const DEFAULT_SVG_OUTPUT: &str = "assets/github-stats.svg";
/// Default README receiving the generated section.
pub const DEFAULT_README_PATH: &str = "README.md";
/// Default network timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default short activity window in days.
pub const DEFAULT_RECENT_DAYS: u32 = 30;
/// Default long activity window in days.
pub const DEFAULT_STALE_DAYS: u32 = 90;
/// Default number of ranked languages.
pub const DEFAULT_TOP_LANGUAGES: usize = 6;
/// Default number of ranked repositories.
pub const DEFAULT_TOP_REPOSITORIES: usize = 5;

/// Optional YAML document overriding built-in defaults.
///
/// # Examples
///
/// ```
/// use profile_stats::parse_config;
///
/// let yaml = r#"
/// username: octocat
/// recent_days: 14
/// "#;
/// let config = parse_config(yaml).expect("valid configuration");
/// assert_eq!(config.username.as_deref(), Some("octocat"));
/// assert_eq!(config.recent_days, Some(14));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatsConfig {
    /// Account to generate statistics for.
    #[serde(default, alias = "user")]
    pub username:         Option<String>,
    /// Destination of the SVG card.
    #[serde(default, alias = "svg", alias = "svg-output")]
    pub svg_output:       Option<PathBuf>,
    /// README updated with the generated section.
    #[serde(default, alias = "readme", alias = "readme-path")]
    pub readme_path:      Option<PathBuf>,
    /// REST API base URL.
    #[serde(default, alias = "api-base")]
    pub api_base:         Option<String>,
    /// Network timeout in seconds.
    #[serde(default, alias = "timeout")]
    pub timeout_secs:     Option<u64>,
    /// Short activity window in days.
    #[serde(default)]
    pub recent_days:      Option<u32>,
    /// Long activity window in days.
    #[serde(default)]
    pub stale_days:       Option<u32>,
    /// Number of ranked languages.
    #[serde(default)]
    pub top_languages:    Option<usize>,
    /// Number of ranked repositories.
    #[serde(default)]
    pub top_repositories: Option<usize>
}

/// Values supplied on the command line or through the environment.
#[derive(Clone, Default)]
pub struct Overrides {
    /// Account override.
    pub username:      Option<String>,
    /// Bearer credential.
    pub token:         Option<String>,
    /// SVG destination override.
    pub svg_output:    Option<PathBuf>,
    /// README destination override.
    pub readme_path:   Option<PathBuf>,
    /// Fixed clock in RFC 3339 form.
    pub now:           Option<String>,
    /// Whether the contribution graph may be queried.
    pub contributions: bool
}

/// Fully resolved configuration for one run.
#[derive(Clone)]
pub struct Settings {
    /// Account to generate statistics for.
    pub username:         String,
    /// Bearer credential, if any.
    pub token:            Option<String>,
    /// Destination of the SVG card.
    pub svg_output:       PathBuf,
    /// README updated with the generated section.
    pub readme_path:      PathBuf,
    /// REST API base URL.
    pub api_base:         String,
    /// Network timeout.
    pub timeout:          Duration,
    /// Short activity window in days.
    pub recent_days:      u32,
    /// Long activity window in days.
    pub stale_days:       u32,
    /// Number of ranked languages.
    pub top_languages:    usize,
    /// Number of ranked repositories.
    pub top_repositories: usize,
    /// Reference time for activity windows.
    pub now:              DateTime<Utc>,
    /// Whether the contribution graph may be queried.
    pub contributions:    bool
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("username", &self.username)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("svg_output", &self.svg_output)
            .field("readme_path", &self.readme_path)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .field("recent_days", &self.recent_days)
            .field("stale_days", &self.stale_days)
            .field("top_languages", &self.top_languages)
            .field("top_repositories", &self.top_repositories)
            .field("now", &self.now)
            .field("contributions", &self.contributions)
            .finish()
    }
}

impl Settings {
    /// Merges the configuration document with overrides and validates the
    /// result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when no username is available, when a
    /// numeric setting is zero, or when `now` is not an RFC 3339 timestamp.
    pub fn resolve(config: StatsConfig, overrides: Overrides) -> Result<Self, Error> {
        let username = non_blank(overrides.username)
            .or_else(|| non_blank(config.username))
            .ok_or_else(|| Error::configuration("GITHUB_USERNAME is required"))?;
        if !username
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || character == '-')
        {
            return Err(Error::configuration(format!(
                "'{username}' is not a valid GitHub username"
            )));
        }

        let now = match non_blank(overrides.now) {
            Some(raw) => parse_timestamp(&raw).ok_or_else(|| {
                Error::configuration(format!("--now must be an RFC 3339 timestamp, got '{raw}'"))
            })?,
            None => Utc::now()
        };

        let timeout_secs = positive(
            "timeout_secs",
            config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
        )?;
        let recent_days = positive("recent_days", config.recent_days.unwrap_or(DEFAULT_RECENT_DAYS))?;
        let stale_days = positive("stale_days", config.stale_days.unwrap_or(DEFAULT_STALE_DAYS))?;
        let top_languages = positive(
            "top_languages",
            config.top_languages.unwrap_or(DEFAULT_TOP_LANGUAGES)
        )?;
        let top_repositories = positive(
            "top_repositories",
            config.top_repositories.unwrap_or(DEFAULT_TOP_REPOSITORIES)
        )?;

        let api_base = non_blank(config.api_base)
            .map(|base| base.trim_end_matches('/').to_owned())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_owned());

        Ok(Self {
            username,
            token: non_blank(overrides.token),
            svg_output: overrides
                .svg_output
                .or(config.svg_output)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SVG_OUTPUT)),
            readme_path: overrides
                .readme_path
                .or(config.readme_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_README_PATH)),
            api_base,
            timeout: Duration::from_secs(timeout_secs),
            recent_days,
            stale_days,
            top_languages,
            top_repositories,
            now,
            contributions: overrides.contributions
        })
    }

    /// Whether a bearer credential is configured.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Parses a configuration document from YAML text.
///
/// # Errors
///
/// Returns [`Error::ConfigParse`] when the text is not a valid document.
pub fn parse_config(yaml: &str) -> Result<StatsConfig, Error> {
    if yaml.trim().is_empty() {
        return Ok(StatsConfig::default());
    }
    Ok(serde_yaml::from_str(yaml)?)
}

/// Loads a configuration document from disk.
///
/// # Errors
///
/// Returns [`Error::ConfigIo`] when the file cannot be read and
/// [`Error::ConfigParse`] when it is not valid YAML.
pub fn load_config(path: &Path) -> Result<StatsConfig, Error> {
    let text = fs::read_to_string(path).map_err(|source| error::config_io_error(path, source))?;
    parse_config(&text)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

fn positive<T>(name: &str, value: T) -> Result<T, Error>
where
    T: Copy + Default + PartialOrd + fmt::Display
{
    if value > T::default() {
        Ok(value)
    } else {
        Err(Error::configuration(format!("{name} must be greater than zero, got {value}")))
    }
}
