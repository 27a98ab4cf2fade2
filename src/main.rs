//! docs-differ - visual regression between two versions of a website
//!
//! Main entry point for the CLI application.

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use docs_differ::{AgentBrowserLauncher, Config, FileDiffer, Pipeline, RunPlan};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crawl two versions of a site, screenshot every page and diff them
#[derive(Parser, Debug)]
#[command(name = "docs-differ")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Baseline site URL
    #[arg(long, short = 'b')]
    baseline: Option<String>,

    /// Current site URL, diffed against the baseline
    #[arg(long, short = 'c')]
    current: Option<String>,

    /// Limit screenshots to this many pages per site (0 or less = all pages)
    #[arg(long, short = 's', allow_negative_numbers = true)]
    screenshot_limit: Option<i64>,

    /// Maximum pages visited in parallel (0 or less = default of 10)
    #[arg(long, short = 'k', allow_negative_numbers = true)]
    concurrency: Option<i64>,

    /// Disable mobile screenshots
    #[arg(long, short = 'm')]
    no_mobile: bool,

    /// Disable desktop screenshots
    #[arg(long, short = 'd')]
    no_desktop: bool,

    /// Wait this many ms before each screenshot
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Normalize install, version and usage snippets before capturing
    #[arg(long)]
    scrub: bool,

    /// Only follow links whose path contains `.html`
    #[arg(long)]
    strict_html: bool,

    /// Path prefix links must contain (defaults to the root URL's directory)
    #[arg(long)]
    root_path: Option<String>,

    /// Diff sensitivity threshold (0.0 - 1.0)
    #[arg(long)]
    threshold: Option<f64>,

    /// Run the screenshot comparison without crawling
    #[arg(long, short = 'r')]
    only_run_diff: bool,

    /// Crawl a new baseline from the single URL given, then diff
    #[arg(long, short = 'u')]
    only_crawl_baseline: bool,

    /// Crawl a new current from the single URL given, then diff
    #[arg(long, short = 'w')]
    only_crawl_current: bool,

    /// Keep existing screenshot directories instead of deleting them first
    #[arg(long)]
    skip_clean: bool,

    /// Delete the baseline and current directories after diffing
    #[arg(long, short = 'f')]
    delete_after: bool,

    /// Run in headed browser mode (visible window)
    #[arg(long)]
    headed: bool,

    /// Only log warnings and errors
    #[arg(long, short = 'q')]
    quiet: bool,

    /// Print the default config file and exit
    #[arg(long)]
    print_config: bool,
}

fn init_logging(quiet: bool) {
    let default_filter = if quiet { "warn" } else { "info,docs_differ=debug" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_config {
        println!("{}", Config::default_config_toml());
        return Ok(());
    }

    init_logging(args.quiet);
    let started = Instant::now();

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(limit) = args.screenshot_limit {
        config.crawl.screenshot_limit = usize::try_from(limit).ok().filter(|&n| n > 0);
    }

    if let Some(concurrency) = args.concurrency {
        config.crawl.concurrency = usize::try_from(concurrency)
            .ok()
            .filter(|&n| n > 0)
            .unwrap_or(10);
    }

    if args.no_mobile {
        config.capture.mobile = false;
    }

    if args.no_desktop {
        config.capture.desktop = false;
    }

    if let Some(delay) = args.delay_ms {
        config.capture.settle_delay_ms = delay;
    }

    if args.scrub {
        config.capture.scrub_content = true;
    }

    if args.strict_html {
        config.crawl.require_html_suffix = true;
    }

    if args.root_path.is_some() {
        config.crawl.root_path = args.root_path;
    }

    if let Some(threshold) = args.threshold {
        config.diff.threshold = threshold;
    }

    if args.headed {
        config.browser.headed = true;
    }

    let plan = RunPlan {
        baseline_url: args.baseline,
        current_url: args.current,
        only_run_diff: args.only_run_diff,
        only_crawl_baseline: args.only_crawl_baseline,
        only_crawl_current: args.only_crawl_current,
        skip_clean: args.skip_clean,
        delete_after: args.delete_after,
    };

    let launcher = Arc::new(AgentBrowserLauncher::from_config(&config.browser));
    let pipeline = Pipeline::new(config, launcher, Arc::new(FileDiffer::new()));

    let report = pipeline.run(&plan).await?;

    println!("{}", serde_json::to_string_pretty(&report.diff)?);

    let report_path = pipeline.report_path();
    report.save(&report_path).await?;

    info!(
        report = %report_path.display(),
        elapsed_secs = started.elapsed().as_secs_f64(),
        "done"
    );

    Ok(())
}
