mod export;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use crawler::{Crawler, CrawlerConfig};
use data_loader::{Handle, Profile};
use http_client::{FetchConfig, Fetcher};
use orchestrator::{
    CrawlFailure, OrchestratorConfig, RecommendationOrchestrator, RunOutcome, ScrapeReport,
};
use pipeline::{friend_similarity, Candidate, Recommender};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// lbxd-recs - film recommendations from friends with similar taste
#[derive(Parser)]
#[command(name = "lbxd-recs")]
#[command(about = "Recommend films your friends logged, weighted by how close their taste is to yours", long_about = None)]
struct Cli {
    #[command(flatten)]
    tuning: Tuning,

    #[command(subcommand)]
    command: Commands,
}

/// Crawl tunables, shared by every subcommand
#[derive(Args)]
struct Tuning {
    /// Origin to crawl
    #[arg(long, global = true, env = "LBXD_DOMAIN", default_value = crawler::DOMAIN)]
    domain: String,

    /// Pause after each successful request, in milliseconds
    #[arg(long, global = true, env = "LBXD_REQUEST_DELAY_MS", default_value = "250")]
    request_delay_ms: u64,

    /// Friends crawled at once
    #[arg(long, global = true, env = "LBXD_MAX_WORKERS", default_value = "100")]
    max_workers: usize,

    /// Open connections allowed at once
    #[arg(long, global = true, env = "LBXD_POOL_SIZE", default_value = "100")]
    pool_size: usize,

    /// Retries of a transient failure
    #[arg(long, global = true, env = "LBXD_MAX_RETRIES", default_value = "3")]
    max_retries: u32,

    /// Backoff before the first retry (doubles each retry), in milliseconds
    #[arg(long, global = true, env = "LBXD_BACKOFF_MS", default_value = "500")]
    backoff_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, global = true, env = "LBXD_TIMEOUT_SECS", default_value = "10")]
    timeout_secs: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank unseen films from your friends' logs
    Recommend {
        /// Your handle
        handle: String,

        /// Which friends to use: mutual, following or followers
        #[arg(long, default_value = "mutual")]
        mode: String,

        /// Number of recommendations to show
        #[arg(long, default_value = "25")]
        top: usize,

        /// Where to write the CSV export
        #[arg(short, long, default_value = "recommendations.csv")]
        out: PathBuf,

        /// Drop films logged by fewer friends than this
        #[arg(long, default_value = "1")]
        min_friends: usize,
    },

    /// List your friends for a mode
    Friends {
        /// Your handle
        handle: String,

        #[arg(long, default_value = "mutual")]
        mode: String,
    },

    /// Show which friends share your taste
    Similarity {
        /// Your handle
        handle: String,

        #[arg(long, default_value = "mutual")]
        mode: String,

        /// Number of friends to show
        #[arg(long, default_value = "25")]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Ctrl-C stops new requests; whatever already finished is still reported
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("{}", "Interrupted, finishing in-flight requests...".yellow());
                cancel.cancel();
            }
        }
    });

    let orchestrator = build_orchestrator(&cli.tuning, cancel)?;

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            handle,
            mode,
            top,
            out,
            min_friends,
        } => handle_recommend(&orchestrator, &cli.tuning.domain, &handle, &mode, top, out, min_friends).await?,
        Commands::Friends { handle, mode } => handle_friends(&orchestrator, &handle, &mode).await?,
        Commands::Similarity { handle, mode, top } => {
            handle_similarity(&orchestrator, &handle, &mode, top).await?
        }
    }

    Ok(())
}

/// Wire fetcher, crawler and orchestrator from the command-line tunables
fn build_orchestrator(tuning: &Tuning, cancel: CancellationToken) -> Result<RecommendationOrchestrator> {
    let fetch_config = FetchConfig::default()
        .with_request_delay(Duration::from_millis(tuning.request_delay_ms))
        .with_pool_size(tuning.pool_size)
        .with_max_retries(tuning.max_retries)
        .with_backoff_factor(Duration::from_millis(tuning.backoff_ms))
        .with_timeout(Duration::from_secs(tuning.timeout_secs));

    let fetcher = Fetcher::new(fetch_config)
        .context("Failed to build HTTP client")?
        .with_cancellation(cancel.clone());

    let crawler = Crawler::new(Arc::new(fetcher)).with_config(
        CrawlerConfig::default()
            .with_domain(tuning.domain.as_str())
            .with_page_workers(tuning.pool_size),
    );

    Ok(RecommendationOrchestrator::new(crawler)
        .with_config(OrchestratorConfig::default().with_max_workers(tuning.max_workers))
        .with_cancellation(cancel))
}

fn parse_handle(raw: &str) -> Result<Handle> {
    Handle::new(raw).with_context(|| format!("'{}' is not a usable handle", raw))
}

/// Handle the 'recommend' command
async fn handle_recommend(
    orchestrator: &RecommendationOrchestrator,
    domain: &str,
    handle: &str,
    mode: &str,
    top: usize,
    out: PathBuf,
    min_friends: usize,
) -> Result<()> {
    let viewer = parse_handle(handle)?;
    let recommender = Recommender::new().with_min_friends(min_friends);

    let start = Instant::now();
    let outcome = orchestrator
        .run(&viewer, mode, &recommender, Some(top))
        .await
        .context("Recommendation run failed")?;

    match outcome {
        RunOutcome::NoFriends { mode } => {
            println!("No {} friends found for {}.", mode, viewer);
        }
        RunOutcome::NothingToRecommend { report } => {
            print_report_summary(&report);
            println!(
                "{} Your friends have logged nothing you haven't seen: nothing left to recommend.",
                "•".cyan()
            );
        }
        RunOutcome::Recommendations { candidates, report } => {
            print_report_summary(&report);
            print_recommendations(&candidates);

            let rows = export::write_csv(&out, &candidates, domain)?;
            println!(
                "{} Wrote {} recommendation(s) to {}",
                "✓".green(),
                rows,
                out.display()
            );
        }
    }

    println!("Finished in {:.1?}", start.elapsed());
    Ok(())
}

/// Handle the 'friends' command
async fn handle_friends(orchestrator: &RecommendationOrchestrator, handle: &str, mode: &str) -> Result<()> {
    let viewer = parse_handle(handle)?;
    let friends = orchestrator.list_friends(&viewer, mode).await?;

    if friends.is_empty() {
        println!("No {} friends found for {}.", mode, viewer);
        return Ok(());
    }

    println!("{}", format!("{} {} friend(s) of {}:", friends.len(), mode, viewer).bold().blue());
    for friend in &friends {
        println!("  - {}", friend);
    }
    Ok(())
}

/// Handle the 'similarity' command
async fn handle_similarity(
    orchestrator: &RecommendationOrchestrator,
    handle: &str,
    mode: &str,
    top: usize,
) -> Result<()> {
    let viewer = parse_handle(handle)?;
    let friends = orchestrator.list_friends(&viewer, mode).await?;

    if friends.is_empty() {
        println!("No {} friends found for {}.", mode, viewer);
        return Ok(());
    }

    let report = orchestrator.scrape_friends(&viewer, &friends).await?;
    print_report_summary(&report);

    let table = friend_similarity(&report.viewer, &report.friends);
    if table.is_empty() {
        println!("No friend profiles could be compared.");
        return Ok(());
    }

    print!("{}", "Closest matches:\n".bold().blue());
    println!("{:>4}  {:<24} {:>10}", "#", "friend", "similarity");
    for (rank, (friend, similarity)) in table.iter().take(top).enumerate() {
        println!(
            "{:>4}  {:<24} {:>10.3}",
            (rank + 1).to_string().green(),
            friend.as_str(),
            similarity
        );
    }
    Ok(())
}

/// Viewer stats and any friends that had to be skipped
fn print_report_summary(report: &ScrapeReport) {
    print_profile(&report.viewer);
    println!(
        "{} Compared against {} friend profile(s)",
        "•".cyan(),
        report.friends.len()
    );
    print_failures(&report.failures);
}

fn print_profile(profile: &Profile) {
    let mean = profile
        .mean_rating()
        .map(|m| format!("{:.2}", m))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{} {}: {} film(s), {} rated (mean {}), {} liked",
        "•".cyan(),
        profile.handle().as_str().bold(),
        profile.len(),
        profile.rated_count(),
        mean,
        profile.liked_count()
    );
}

fn print_failures(failures: &[CrawlFailure]) {
    if failures.is_empty() {
        return;
    }
    println!("{}", format!("Skipped {} friend(s):", failures.len()).yellow());
    for failure in failures {
        println!("  {} {}: {}", "!".yellow(), failure.handle, failure.reason);
    }
}

/// Helper function to format and print recommendations
fn print_recommendations(candidates: &[Candidate]) {
    print!("{}", "Film Recommendations:\n".bold().blue());
    println!(
        "{:>4}  {:<40} {:>6} {:>7} {:>8}",
        "#", "title", "pred", "score", "friends"
    );
    for (rank, candidate) in candidates.iter().enumerate() {
        println!(
            "{:>4}  {:<40} {:>6.2} {:>7.3} {:>8}",
            (rank + 1).to_string().green(),
            truncate(&candidate.title, 40),
            candidate.pred_rating,
            candidate.score,
            candidate.num_friends
        );
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
