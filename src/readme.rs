// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Maintains the generated statistics section of a README.
//!
//! The section lives between two HTML comment sentinels. Everything outside
//! them belongs to the user and is carried over untouched; rerunning with the
//! same statistics leaves the file byte-identical.

use std::{borrow::Cow, fs, io, path::Path};

use tracing::{debug, info};

use crate::{
    artifact::write_artifact,
    error::{self, Error},
    stats::{ActivitySource, AggregateStats, RepositorySource, format_count, language_mix}
};

/// Opening sentinel of the managed section.
pub const SECTION_START_MARKER: &str = "<!-- github-stats:start -->";

/// Closing sentinel of the managed section.
pub const SECTION_END_MARKER: &str = "<!-- github-stats:end -->";

/// Outcome of [`update_readme`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadmeUpdate {
    /// The file was written.
    Updated,
    /// The file already held the same content and was left alone.
    Unchanged
}

/// Renders the markdown section for `stats`, sentinels included and without a
/// trailing newline.
pub fn build_fragment(stats: &AggregateStats) -> String {
    let activity_label = match stats.activity_source {
        ActivitySource::Timestamps => {
            format!("Repositories active in the last {} days", stats.recent_days)
        }
        ActivitySource::Contributions => {
            format!("Repositories contributed to in the last {} days", stats.recent_days)
        }
    };

    let rows = [
        ("Followers", stats.followers),
        ("Following", stats.following),
        ("Public repositories", stats.public_repos),
        ("Private repositories", stats.private_repos),
        ("Stars on public repositories", stats.total_stars),
    ];

    let mut lines = vec![
        SECTION_START_MARKER.to_owned(),
        "## GitHub Stats".to_owned(),
        String::new(),
        "| Metric | Value |".to_owned(),
        "| --- | ---: |".to_owned(),
    ];
    lines.extend(
        rows.iter()
            .map(|(label, value)| format!("| {label} | {} |", format_count(*value)))
    );
    lines.push(format!("| {activity_label} | {} |", format_count(stats.touched_recent)));
    lines.push(String::new());
    lines.push(format!(
        "**Languages:** {}",
        escape_markdown(&language_mix(&stats.languages, stats.language_limit))
    ));
    lines.push(String::new());
    lines.push("**Top repositories**".to_owned());
    lines.push(String::new());

    if stats.top_repositories.is_empty() {
        lines.push("_No public repositories yet._".to_owned());
    }
    for (position, repo) in stats.top_repositories.iter().enumerate() {
        let name = escape_markdown(&repo.name);
        let entry = if repo.full_name.is_empty() {
            name
        } else {
            format!("[{name}](https://github.com/{})", repo.full_name)
        };
        lines.push(format!(
            "{}. {entry} ({} stars)",
            position + 1,
            format_count(repo.stars)
        ));
    }

    lines.push(String::new());
    lines.push(format!("<sub>{}</sub>", attribution(stats)));
    lines.push(SECTION_END_MARKER.to_owned());
    lines.join("\n")
}

fn attribution(stats: &AggregateStats) -> String {
    let breakdown = match stats.repository_source {
        RepositorySource::Public => "Breakdown computed from public repositories.",
        RepositorySource::Private => {
            "Breakdown computed from anonymized private repositories; stars count public repositories only."
        }
    };
    match stats.activity_source {
        ActivitySource::Timestamps => breakdown.to_owned(),
        ActivitySource::Contributions => format!(
            "{breakdown} Recent activity comes from the GitHub contribution graph."
        )
    }
}

/// Minimal document used when the README does not exist yet.
pub fn seed_document(heading: &str) -> String {
    format!("# {heading}\n")
}

/// Inserts or replaces the managed section of `document` with `fragment`.
///
/// When a start sentinel is followed by an end sentinel, that region is
/// replaced: content before it is kept with exactly one blank line of
/// separation, and trailing content resumes after exactly one blank line.
/// Otherwise the fragment is appended after one blank line, or becomes the
/// whole document when nothing else remains. Stray sentinels outside the
/// managed region are removed either way.
///
/// ```
/// use profile_stats::{SECTION_END_MARKER, SECTION_START_MARKER, upsert_section};
///
/// let fragment = format!("{SECTION_START_MARKER}\nstats\n{SECTION_END_MARKER}");
/// let once = upsert_section("# Hello\n", &fragment);
/// assert_eq!(once, format!("# Hello\n\n{fragment}\n"));
/// assert_eq!(upsert_section(&once, &fragment), once);
/// ```
pub fn upsert_section(document: &str, fragment: &str) -> String {
    if let Some((start, end)) = locate_section(document) {
        let before = strip_markers(&document[..start]);
        let after = strip_markers(&document[end..]);
        let before = trim_trailing_blank_lines(&before);
        let after = after.trim_start_matches(['\r', '\n']);

        let mut result = String::with_capacity(document.len() + fragment.len());
        if !before.is_empty() {
            result.push_str(before);
            result.push_str("\n\n");
        }
        result.push_str(fragment);
        if after.is_empty() {
            result.push('\n');
        } else {
            result.push_str("\n\n");
            result.push_str(after);
        }
        return result;
    }

    let cleaned = strip_markers(document);
    let kept = trim_trailing_blank_lines(&cleaned);
    if kept.is_empty() {
        format!("{fragment}\n")
    } else {
        format!("{kept}\n\n{fragment}\n")
    }
}

/// Byte range from the start sentinel through the end of the end sentinel.
fn locate_section(document: &str) -> Option<(usize, usize)> {
    let start = document.find(SECTION_START_MARKER)?;
    let search_from = start + SECTION_START_MARKER.len();
    let end = document[search_from..].find(SECTION_END_MARKER)? + search_from;
    Some((start, end + SECTION_END_MARKER.len()))
}

/// Drops lines that hold only a sentinel and cuts inline sentinels out of the
/// rest. Line terminators are kept as found.
fn strip_markers(text: &str) -> Cow<'_, str> {
    if !text.contains(SECTION_START_MARKER) && !text.contains(SECTION_END_MARKER) {
        return Cow::Borrowed(text);
    }

    let mut cleaned = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed == SECTION_START_MARKER || trimmed == SECTION_END_MARKER {
            continue;
        }
        if line.contains(SECTION_START_MARKER) || line.contains(SECTION_END_MARKER) {
            cleaned.push_str(
                &line
                    .replace(SECTION_START_MARKER, "")
                    .replace(SECTION_END_MARKER, "")
            );
        } else {
            cleaned.push_str(line);
        }
    }
    Cow::Owned(cleaned)
}

/// Removes trailing line breaks and whitespace-only lines while leaving the
/// last content line intact, trailing spaces included.
fn trim_trailing_blank_lines(text: &str) -> &str {
    let mut kept = text.trim_end_matches(['\r', '\n']);
    loop {
        let line_start = kept.rfind('\n').map_or(0, |index| index + 1);
        if !kept[line_start..].trim().is_empty() {
            return kept;
        }
        if line_start == 0 {
            return "";
        }
        kept = kept[..line_start].trim_end_matches(['\r', '\n']);
    }
}

/// Upserts `fragment` into the README at `readme_path`, seeding the file with
/// a `# {heading}` line when it does not exist. The file is only written when
/// its content changes.
///
/// # Errors
///
/// Returns [`Error::ArtifactIo`] when the README cannot be read or written.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use profile_stats::{ReadmeUpdate, update_readme};
///
/// # fn main() -> Result<(), profile_stats::Error> {
/// let fragment = "<!-- github-stats:start -->\n...\n<!-- github-stats:end -->";
/// let outcome = update_readme(Path::new("README.md"), fragment, "octocat")?;
/// assert!(matches!(outcome, ReadmeUpdate::Updated | ReadmeUpdate::Unchanged));
/// # Ok(())
/// # }
/// ```
pub fn update_readme(
    readme_path: &Path,
    fragment: &str,
    heading: &str
) -> Result<ReadmeUpdate, Error> {
    info!("Reading README from {}", readme_path.display());
    let content = match fs::read_to_string(readme_path) {
        Ok(content) => content,
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            debug!("README missing, seeding a new document");
            seed_document(heading)
        }
        Err(source) => return Err(error::artifact_io_error(readme_path, source))
    };

    let updated = upsert_section(&content, fragment);

    if updated == content && readme_path.exists() {
        info!("No changes to README");
        return Ok(ReadmeUpdate::Unchanged);
    }

    info!("Writing updated README to {}", readme_path.display());
    write_artifact(readme_path, &updated)?;
    Ok(ReadmeUpdate::Updated)
}

fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        if matches!(character, '\\' | '[' | ']' | '*' | '_' | '`' | '|' | '<' | '>') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}
