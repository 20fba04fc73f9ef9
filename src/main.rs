// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Command-line interface for the profile-stats binary.
//!
//! Running without a subcommand renders the SVG card. `readme` upserts the
//! markdown section instead and `all` does both from a single fetch.

use std::{env, path::PathBuf, process};

use clap::{ArgAction, Args, Parser, Subcommand};
use profile_stats::{
    AggregateStats, Error, GithubClient, Overrides, ReadmeUpdate, Settings, StatsConfig,
    build_fragment, load_config, render_svg, summarize, update_readme, write_artifact
};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Generate GitHub profile statistics as an SVG card or README section.
#[derive(Debug, Parser)]
#[command(name = "profile-stats", version, about = "Render GitHub profile statistics")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Inputs shared by every command.
    #[command(flatten)]
    source: SourceArgs
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
/// Supported commands exposed by the CLI.
enum Command {
    /// Render the SVG card (default).
    Svg,
    /// Upsert the statistics section of the README.
    Readme,
    /// Render the card and update the README from one fetch.
    All
}

/// Arguments accepted by every command.
#[derive(Debug, Args, Default)]
struct SourceArgs {
    /// GitHub account to summarize.
    #[arg(long = "user", env = "GITHUB_USERNAME", global = true)]
    user: Option<String>,

    /// Token granting access to private repositories. Falls back to
    /// `GITHUB_TOKEN`.
    #[arg(
        long = "token",
        env = "PRIVATE_STATS_TOKEN",
        hide_env_values = true,
        global = true
    )]
    token: Option<String>,

    /// Optional YAML document with defaults for every setting.
    #[arg(long = "config", value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Destination of the SVG card.
    #[arg(long = "svg-output", value_name = "PATH", global = true)]
    svg_output: Option<PathBuf>,

    /// README receiving the generated section.
    #[arg(long = "readme", value_name = "PATH", global = true)]
    readme: Option<PathBuf>,

    /// Fixed reference time in RFC 3339 form.
    #[arg(long = "now", value_name = "RFC3339", global = true)]
    now: Option<String>,

    /// Skip the contribution graph even when a token is available.
    #[arg(long = "no-contributions", action = ArgAction::SetTrue, global = true)]
    no_contributions: bool
}

/// Entry point that reports errors and sets the appropriate exit status.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();

    if let Err(error) = run().await {
        eprintln!("{}", error.to_display_string());
        process::exit(error.exit_code());
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
        )
        .init();
}

/// Executes the CLI using parsed arguments.
///
/// # Errors
///
/// Propagates configuration, fetch and write failures.
async fn run() -> Result<(), Error> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Svg);
    let settings = resolve_settings(cli.source, env::var("GITHUB_TOKEN").ok())?;
    info!("Resolved settings: {settings:?}");

    let client = GithubClient::new(&settings)?;
    let data = client.fetch_profile(&settings).await?;
    let stats = summarize(&data, &settings);
    info!(
        "Aggregated {} repositories for {}",
        data.repositories.len(),
        stats.login
    );

    match command {
        Command::Svg => run_svg(&settings, &stats),
        Command::Readme => run_readme(&settings, &stats),
        Command::All => {
            run_svg(&settings, &stats)?;
            run_readme(&settings, &stats)
        }
    }
}

fn resolve_settings(args: SourceArgs, fallback_token: Option<String>) -> Result<Settings, Error> {
    let config = match args.config.as_deref() {
        Some(path) => load_config(path)?,
        None => StatsConfig::default()
    };

    let overrides = Overrides {
        username:      args.user,
        token:         pick_token(args.token, fallback_token),
        svg_output:    args.svg_output,
        readme_path:   args.readme,
        now:           args.now,
        contributions: !args.no_contributions
    };

    Settings::resolve(config, overrides)
}

fn pick_token(explicit: Option<String>, fallback: Option<String>) -> Option<String> {
    let usable = |token: &String| !token.trim().is_empty();
    explicit.filter(usable).or_else(|| fallback.filter(usable))
}

fn run_svg(settings: &Settings, stats: &AggregateStats) -> Result<(), Error> {
    let svg = render_svg(stats);
    write_artifact(&settings.svg_output, &svg)?;
    println!("Wrote {}", settings.svg_output.display());
    Ok(())
}

fn run_readme(settings: &Settings, stats: &AggregateStats) -> Result<(), Error> {
    let fragment = build_fragment(stats);
    let outcome = update_readme(&settings.readme_path, &fragment, &stats.display_name)?;
    let verb = match outcome {
        ReadmeUpdate::Updated => "Updated",
        ReadmeUpdate::Unchanged => "Unchanged"
    };
    println!("{verb} {}", settings.readme_path.display());
    Ok(())
}
