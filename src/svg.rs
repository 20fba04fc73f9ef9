// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! SVG card rendering.
//!
//! The card is laid out on a fixed grid: a row of stat tiles, up to four
//! donut charts in a two by two grid and an optional bar chart underneath.
//! Every coordinate derives from the item index, so identical input always
//! renders byte-identical output.

use std::{borrow::Cow, f64::consts::PI, fmt::Write as _};

use crate::stats::{
    AggregateStats, ActivitySource, Ranked, format_count, percentage, with_other_bucket
};

/// Canvas width in pixels.
pub const WIDTH: u32 = 760;

/// Canvas height when no bar chart is drawn.
pub const BASE_HEIGHT: u32 = 660;

/// Repeating palette for chart segments.
pub const PALETTE: [&str; 6] = ["#22d3ee", "#34d399", "#f59e0b", "#f43f5e", "#a78bfa", "#60a5fa"];

/// Ring colour used when a donut has nothing to plot.
pub const EMPTY_RING: &str = "#1e293b";

const TILE_X: u32 = 36;
const TILE_Y: u32 = 78;
const TILE_WIDTH: u32 = 124;
const TILE_HEIGHT: u32 = 78;
const TILE_GAP: u32 = 10;

const SECTION_Y: u32 = 198;
const DONUT_CENTRES: [(u32, u32); 4] = [(210, 285), (550, 285), (210, 485), (550, 485)];
const DONUT_RADIUS: u32 = 42;
const DONUT_STROKE: u32 = 13;
const LEGEND_PITCH: u32 = 18;

const DONUT_LANGUAGE_SLICES: usize = 4;

const TIP_Y: u32 = 638;

const BAR_SECTION_Y: u32 = 688;
const BAR_TOP: u32 = 708;
const BAR_PITCH: u32 = 22;
const BAR_HEIGHT: u32 = 12;
const BAR_X: u32 = 220;
const BAR_MAX_LENGTH: f64 = 420.0;
const BAR_BOTTOM_PADDING: u32 = 20;

const FONT: &str = "-apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif";

/// A labelled headline number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// Caption above the value.
    pub label: String,
    /// Pre-formatted value.
    pub value: String
}

impl Tile {
    fn new(label: impl Into<String>, value: u64) -> Self {
        Self {
            label: label.into(),
            value: format_count(value)
        }
    }
}

/// A titled donut dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Donut {
    /// Title drawn above the ring.
    pub title: String,
    /// Segments in drawing order.
    pub data:  Vec<Ranked>
}

impl Donut {
    fn new(title: impl Into<String>, data: Vec<Ranked>) -> Self {
        Self {
            title: title.into(),
            data
        }
    }
}

/// Everything drawn on the card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Name used in the title.
    pub name:    String,
    /// Stat tiles, left to right.
    pub tiles:   Vec<Tile>,
    /// Donut charts; only the first four are drawn.
    pub donuts:  Vec<Donut>,
    /// Bar chart rows, top to bottom.
    pub bars:    Vec<Ranked>,
    /// Whether the breakdown covers private repositories.
    pub private: bool
}

impl Card {
    /// Lays out the standard card for aggregated statistics.
    pub fn from_stats(stats: &AggregateStats) -> Self {
        let activity_label = match stats.activity_source {
            ActivitySource::Timestamps => format!("Touched {}d", stats.recent_days),
            ActivitySource::Contributions => format!("Contributed {}d", stats.recent_days)
        };

        let tiles = vec![
            Tile::new("Followers", stats.followers),
            Tile::new("Public Repos", stats.public_repos),
            Tile::new("Private Repos", stats.private_repos),
            Tile::new(activity_label, stats.touched_recent),
            Tile::new("Total Stars", stats.total_stars),
        ];

        let activity = match stats.contributions {
            Some(mix) => Donut::new(format!("Contributions ({}d)", stats.recent_days), mix.dataset()),
            None => Donut::new(
                format!("Active in {} Days", stats.stale_days),
                vec![
                    Ranked::new("Updated", stats.updated),
                    Ranked::new("Older", stats.older),
                ]
            )
        };

        let donuts = vec![
            Donut::new(
                "Language Mix",
                with_other_bucket(stats.top_languages(), DONUT_LANGUAGE_SLICES)
            ),
            Donut::new(
                "Original vs Forked",
                vec![
                    Ranked::new("Original", stats.original),
                    Ranked::new("Forked", stats.forked),
                ]
            ),
            activity,
            Donut::new(
                "Archived vs Active",
                vec![
                    Ranked::new("Archived", stats.archived),
                    Ranked::new("Active", stats.active),
                ]
            ),
        ];

        let bars = stats
            .top_repositories
            .iter()
            .map(|repo| Ranked::new(repo.name.as_str(), repo.stars))
            .collect();

        Self {
            name: stats.display_name.clone(),
            tiles,
            donuts,
            bars,
            private: stats.is_private()
        }
    }

    /// Rendered canvas height.
    pub fn height(&self) -> u32 {
        if self.bars.is_empty() {
            BASE_HEIGHT
        } else {
            BAR_TOP + self.bars.len() as u32 * BAR_PITCH + BAR_BOTTOM_PADDING
        }
    }
}

/// Renders the card as a standalone SVG document.
pub fn build_svg(card: &Card) -> String {
    let mut buffer = String::with_capacity(8 * 1024);
    let width = WIDTH;
    let height = card.height();
    let name = escape_xml(&card.name);

    let _ = writeln!(
        buffer,
        "<svg width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" fill=\"none\" xmlns=\"http://www.w3.org/2000/svg\" role=\"img\" aria-labelledby=\"title desc\">"
    );
    let _ = writeln!(buffer, "  <title id=\"title\">GitHub profile stats for {name}</title>");
    buffer.push_str(
        "  <desc id=\"desc\">Profile summary with anonymized private-work aggregates generated from the GitHub API.</desc>\n"
    );
    write_style(&mut buffer);
    let _ = writeln!(
        buffer,
        "  <rect class=\"bg\" x=\"0.5\" y=\"0.5\" width=\"{}\" height=\"{}\" rx=\"14\"/>",
        width - 1,
        height - 1
    );
    let _ = writeln!(buffer, "  <text class=\"title\" x=\"36\" y=\"52\">{name} - GitHub Stats</text>");
    let section = if card.private {
        "Private Work Breakdown"
    } else {
        "Project Breakdown"
    };
    let _ = writeln!(buffer, "  <text class=\"section\" x=\"36\" y=\"{SECTION_Y}\">{section}</text>");

    for (index, tile) in card.tiles.iter().enumerate() {
        write_tile(&mut buffer, index as u32, tile);
    }

    if card.donuts.is_empty() {
        buffer.push_str("  <text class=\"muted\" x=\"36\" y=\"310\">No breakdown data available yet.</text>\n");
    }
    for (donut, &(cx, cy)) in card.donuts.iter().zip(DONUT_CENTRES.iter()) {
        write_donut(&mut buffer, cx, cy, donut);
    }

    if !card.private {
        let _ = writeln!(
            buffer,
            "  <text class=\"muted\" x=\"36\" y=\"{TIP_Y}\">Tip: add PRIVATE_STATS_TOKEN to include anonymized private-work aggregates.</text>"
        );
    }

    write_bars(&mut buffer, &card.bars);

    buffer.push_str("</svg>\n");
    buffer
}

fn write_style(buffer: &mut String) {
    buffer.push_str("  <style>\n");
    buffer.push_str("    .bg { fill: #0b1220; stroke: #334155; stroke-width: 1; }\n");
    let rules = [
        ("title", "fill: #e2e8f0; font: 700 26px {font};"),
        (
            "section",
            "fill: #cbd5e1; font: 700 16px {font}; letter-spacing: 0.03em; text-transform: uppercase;"
        ),
        ("tile", "fill: #111b2f; stroke: #334155; stroke-width: 1;"),
        (
            "tile-label",
            "fill: #94a3b8; font: 600 11px {font}; letter-spacing: 0.03em; text-transform: uppercase;"
        ),
        ("tile-value", "fill: #f8fafc; font: 700 23px {font};"),
        ("legend", "fill: #cbd5e1; font: 600 11px {font};"),
        ("donut-title", "fill: #e2e8f0; font: 600 13px {font}; text-anchor: middle;"),
        ("donut-total", "fill: #f8fafc; font: 700 16px {font}; text-anchor: middle;"),
        ("bar-label", "fill: #cbd5e1; font: 600 12px {font};"),
        ("bar", "fill: #22d3ee;"),
        ("muted", "fill: #64748b; font: 600 13px {font};"),
    ];
    for (class, rule) in rules {
        let _ = writeln!(buffer, "    .{class} {{ {} }}", rule.replace("{font}", FONT));
    }
    buffer.push_str("  </style>\n");
}

fn write_tile(buffer: &mut String, index: u32, tile: &Tile) {
    let x = TILE_X + index * (TILE_WIDTH + TILE_GAP);
    let _ = writeln!(
        buffer,
        "  <rect class=\"tile\" x=\"{x}\" y=\"{TILE_Y}\" width=\"{TILE_WIDTH}\" height=\"{TILE_HEIGHT}\" rx=\"10\"/><text class=\"tile-label\" x=\"{}\" y=\"{}\">{}</text><text class=\"tile-value\" x=\"{}\" y=\"{}\">{}</text>",
        x + 10,
        TILE_Y + 26,
        escape_xml(&tile.label),
        x + 10,
        TILE_Y + 56,
        escape_xml(&tile.value)
    );
}

fn write_donut(buffer: &mut String, cx: u32, cy: u32, donut: &Donut) {
    let _ = write!(
        buffer,
        "  <text class=\"donut-title\" x=\"{cx}\" y=\"{}\">{}</text>",
        cy - 60,
        escape_xml(&donut.title)
    );

    let total: u64 = donut.data.iter().map(|entry| entry.value).sum();
    if total == 0 {
        let _ = writeln!(
            buffer,
            "<circle cx=\"{cx}\" cy=\"{cy}\" r=\"{DONUT_RADIUS}\" fill=\"none\" stroke=\"{EMPTY_RING}\" stroke-width=\"{DONUT_STROKE}\"/><text class=\"donut-total\" x=\"{cx}\" y=\"{}\">0</text>",
            cy + 5
        );
        return;
    }

    let circumference = 2.0 * PI * f64::from(DONUT_RADIUS);
    let mut offset = 0.0_f64;
    let mut legend = String::new();

    for (index, entry) in donut.data.iter().enumerate() {
        if entry.value == 0 {
            continue;
        }
        let segment = circumference * (entry.value as f64 / total as f64);
        let color = PALETTE[index % PALETTE.len()];
        let _ = write!(
            buffer,
            "<circle cx=\"{cx}\" cy=\"{cy}\" r=\"{DONUT_RADIUS}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{DONUT_STROKE}\" stroke-dasharray=\"{segment:.2} {circumference:.2}\" stroke-dashoffset=\"{:.2}\" transform=\"rotate(-90 {cx} {cy})\"/>",
            -offset
        );
        let legend_y = cy + 74 + index as u32 * LEGEND_PITCH;
        let _ = write!(
            legend,
            "<circle cx=\"{}\" cy=\"{legend_y}\" r=\"4\" fill=\"{color}\"/><text class=\"legend\" x=\"{}\" y=\"{}\">{} {}</text>",
            cx - 54,
            cx - 44,
            legend_y + 4,
            escape_xml(&entry.label),
            percentage(entry.value, total)
        );
        offset += segment;
    }

    let _ = writeln!(
        buffer,
        "<text class=\"donut-total\" x=\"{cx}\" y=\"{}\">{}</text>{legend}",
        cy + 5,
        format_count(total)
    );
}

fn write_bars(buffer: &mut String, bars: &[Ranked]) {
    if bars.is_empty() {
        return;
    }
    let _ = writeln!(
        buffer,
        "  <text class=\"section\" x=\"36\" y=\"{BAR_SECTION_Y}\">Top Repositories</text>"
    );
    let max = bars.iter().map(|entry| entry.value).max().unwrap_or(0).max(1);
    for (index, entry) in bars.iter().enumerate() {
        let y = BAR_TOP + index as u32 * BAR_PITCH;
        let length = BAR_MAX_LENGTH * entry.value as f64 / max as f64;
        let _ = writeln!(
            buffer,
            "  <text class=\"bar-label\" x=\"36\" y=\"{}\">{}</text><rect class=\"bar\" x=\"{BAR_X}\" y=\"{y}\" width=\"{length:.2}\" height=\"{BAR_HEIGHT}\" rx=\"3\"/><text class=\"legend\" x=\"{:.2}\" y=\"{}\">{}</text>",
            y + 10,
            escape_xml(&entry.label),
            f64::from(BAR_X) + length + 8.0,
            y + 10,
            format_count(entry.value)
        );
    }
}

/// Escapes the five XML special characters, borrowing when none occur.
pub fn escape_xml(value: &str) -> Cow<'_, str> {
    if value
        .chars()
        .any(|character| matches!(character, '&' | '<' | '>' | '\"' | '\''))
    {
        let mut escaped = String::with_capacity(value.len());
        for character in value.chars() {
            match character {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '\"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&apos;"),
                other => escaped.push(other)
            }
        }
        Cow::Owned(escaped)
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{
        model::{RepositoryContribution, RepositoryRecord, UserProfile},
        stats::{AggregateOptions, aggregate}
    };

    fn card(donuts: Vec<Donut>, bars: Vec<Ranked>, private: bool) -> Card {
        Card {
            name: "The Octocat".to_owned(),
            tiles: vec![
                Tile::new("Followers", 1234),
                Tile::new("Public Repos", 8),
            ],
            donuts,
            bars,
            private
        }
    }

    fn sample_stats(repositories: &[RepositoryRecord]) -> AggregateStats {
        let user = UserProfile {
            login: "octocat".to_owned(),
            name: Some("The Octocat".to_owned()),
            followers: 1234,
            following: 5,
            public_repos: 3
        };
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        aggregate(&user, repositories, None, &AggregateOptions::default(), now)
    }

    fn repo(name: &str, stars: u64, language: &str) -> RepositoryRecord {
        RepositoryRecord {
            name: name.to_owned(),
            full_name: format!("octocat/{name}"),
            stars,
            language: Some(language.to_owned()),
            ..RepositoryRecord::default()
        }
    }

    fn dasharray_segments(svg: &str) -> Vec<f64> {
        svg.split("stroke-dasharray=\"")
            .skip(1)
            .filter_map(|rest| rest.split(' ').next())
            .filter_map(|value| value.parse().ok())
            .collect()
    }

    #[test]
    fn tiles_follow_fixed_pitch() {
        let svg = build_svg(&card(Vec::new(), Vec::new(), false));
        assert!(svg.contains("<rect class=\"tile\" x=\"36\" y=\"78\" width=\"124\" height=\"78\""));
        assert!(svg.contains("<rect class=\"tile\" x=\"170\" y=\"78\""));
        assert!(svg.contains(">1,234</text>"));
    }

    #[test]
    fn empty_donut_renders_ring_and_zero() {
        let donut = Donut::new("Language Mix", Vec::new());
        let svg = build_svg(&card(vec![donut], Vec::new(), false));

        assert!(svg.contains(&format!("stroke=\"{EMPTY_RING}\"")));
        assert!(svg.contains("<text class=\"donut-total\" x=\"210\" y=\"290\">0</text>"));
        assert!(!svg.contains("stroke-dasharray"));
        assert!(!svg.contains("NaN"));
    }

    #[test]
    fn all_zero_dataset_is_treated_as_empty() {
        let donut = Donut::new(
            "Original vs Forked",
            vec![Ranked::new("Original", 0), Ranked::new("Forked", 0)]
        );
        let svg = build_svg(&card(vec![donut], Vec::new(), false));
        assert!(svg.contains(EMPTY_RING));
        assert!(!svg.contains("class=\"legend\""));
    }

    #[test]
    fn donut_segments_tile_the_circle() {
        let donut = Donut::new(
            "Language Mix",
            vec![Ranked::new("Rust", 3), Ranked::new("Go", 0), Ranked::new("C", 1)]
        );
        let svg = build_svg(&card(vec![donut], Vec::new(), false));

        let segments = dasharray_segments(&svg);
        assert_eq!(segments.len(), 2);
        let circumference = 2.0 * PI * 42.0;
        let covered: f64 = segments.iter().sum();
        assert!((covered - circumference).abs() < 0.02);

        assert!(svg.contains(&format!("stroke-dashoffset=\"-{:.2}\"", circumference * 0.75)));
        assert!(svg.contains("transform=\"rotate(-90 210 285)\""));
        assert!(svg.contains(">4</text>"));
    }

    #[test]
    fn legend_rows_follow_input_index() {
        let donut = Donut::new(
            "Language Mix",
            vec![Ranked::new("Rust", 3), Ranked::new("Go", 0), Ranked::new("C", 1)]
        );
        let svg = build_svg(&card(vec![donut], Vec::new(), false));

        assert!(svg.contains("<circle cx=\"156\" cy=\"359\" r=\"4\" fill=\"#22d3ee\"/>"));
        assert!(svg.contains("<circle cx=\"156\" cy=\"395\" r=\"4\" fill=\"#f59e0b\"/>"));
        assert!(svg.contains(">Rust 75.0%</text>"));
        assert!(svg.contains(">C 25.0%</text>"));
        assert!(!svg.contains("Go 0"));
    }

    #[test]
    fn donuts_use_grid_positions() {
        let donuts = (0..5)
            .map(|index| Donut::new(format!("Chart {index}"), vec![Ranked::new("A", 1)]))
            .collect();
        let svg = build_svg(&card(donuts, Vec::new(), true));

        assert!(svg.contains("<text class=\"donut-title\" x=\"210\" y=\"225\">Chart 0</text>"));
        assert!(svg.contains("<text class=\"donut-title\" x=\"550\" y=\"225\">Chart 1</text>"));
        assert!(svg.contains("<text class=\"donut-title\" x=\"210\" y=\"425\">Chart 2</text>"));
        assert!(svg.contains("<text class=\"donut-title\" x=\"550\" y=\"425\">Chart 3</text>"));
        assert!(!svg.contains("Chart 4"));
    }

    #[test]
    fn bars_scale_to_maximum() {
        let bars = vec![Ranked::new("big", 40), Ranked::new("half", 20), Ranked::new("none", 0)];
        let svg = build_svg(&card(Vec::new(), bars, false));

        assert!(svg.contains("Top Repositories"));
        assert!(svg.contains("y=\"708\" width=\"420.00\""));
        assert!(svg.contains("y=\"730\" width=\"210.00\""));
        assert!(svg.contains("y=\"752\" width=\"0.00\""));
        assert!(svg.contains("height=\"794\" viewBox=\"0 0 760 794\""));
    }

    #[test]
    fn all_zero_bars_do_not_divide_by_zero() {
        let bars = vec![Ranked::new("a", 0), Ranked::new("b", 0)];
        let svg = build_svg(&card(Vec::new(), bars, false));
        assert!(!svg.contains("NaN"));
        assert!(svg.contains("width=\"0.00\""));
    }

    #[test]
    fn height_is_base_without_bars() {
        let svg = build_svg(&card(Vec::new(), Vec::new(), false));
        assert!(svg.starts_with("<svg width=\"760\" height=\"660\" viewBox=\"0 0 760 660\""));
        assert!(svg.contains("No breakdown data available yet."));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn tip_line_only_in_public_mode() {
        let public = build_svg(&card(Vec::new(), Vec::new(), false));
        let private = build_svg(&card(Vec::new(), Vec::new(), true));

        assert!(public.contains("PRIVATE_STATS_TOKEN"));
        assert!(public.contains("Project Breakdown"));
        assert!(!private.contains("PRIVATE_STATS_TOKEN"));
        assert!(private.contains("Private Work Breakdown"));
    }

    #[test]
    fn dynamic_text_is_escaped() {
        let mut sample = card(Vec::new(), vec![Ranked::new("a<b>&c", 1)], false);
        sample.name = "Q & \"A\"".to_owned();
        let svg = build_svg(&sample);

        assert!(svg.contains("Q &amp; &quot;A&quot; - GitHub Stats"));
        assert!(svg.contains("a&lt;b&gt;&amp;c"));
    }

    #[test]
    fn escape_xml_returns_borrowed_when_no_escaping_needed() {
        let input = "plain text";
        match escape_xml(input) {
            Cow::Borrowed(value) => assert_eq!(value, input),
            Cow::Owned(_) => panic!("expected borrowed variant")
        }
        assert_eq!(escape_xml("&<>\"'"), "&amp;&lt;&gt;&quot;&apos;");
    }

    #[test]
    fn rendering_is_deterministic() {
        let stats = sample_stats(&[repo("a", 5, "Rust"), repo("b", 2, "Go")]);
        let card = Card::from_stats(&stats);
        assert_eq!(build_svg(&card), build_svg(&card));
    }

    #[test]
    fn card_from_stats_lays_out_standard_panels() {
        let stats = sample_stats(&[
            repo("a", 5, "Rust"),
            repo("b", 2, "Go"),
            repo("c", 9, "Rust"),
        ]);
        let card = Card::from_stats(&stats);

        let labels: Vec<_> = card.tiles.iter().map(|tile| tile.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Followers", "Public Repos", "Private Repos", "Touched 30d", "Total Stars"]
        );
        assert_eq!(card.tiles[4].value, "16");

        let titles: Vec<_> = card.donuts.iter().map(|donut| donut.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Language Mix", "Original vs Forked", "Active in 90 Days", "Archived vs Active"]
        );
        assert_eq!(card.donuts[0].data, vec![Ranked::new("Rust", 2), Ranked::new("Go", 1)]);

        let bar_names: Vec<_> = card.bars.iter().map(|bar| bar.label.as_str()).collect();
        assert_eq!(bar_names, vec!["c", "a", "b"]);
        assert!(!card.private);
    }

    #[test]
    fn contribution_source_swaps_activity_panels() {
        let user = UserProfile {
            login: "octocat".to_owned(),
            ..UserProfile::default()
        };
        let contributions = vec![RepositoryContribution {
            name_with_owner: "octocat/a".to_owned(),
            commits: 4,
            pull_requests: 1,
            ..RepositoryContribution::default()
        }];
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let stats = aggregate(&user, &[], Some(&contributions), &AggregateOptions::default(), now);
        let card = Card::from_stats(&stats);

        assert_eq!(card.tiles[3].label, "Contributed 30d");
        assert_eq!(card.tiles[3].value, "1");
        assert_eq!(card.donuts[2].title, "Contributions (30d)");
        assert_eq!(card.donuts[2].data[0], Ranked::new("Commits", 4));
        assert_eq!(card.name, "octocat");
    }
}
