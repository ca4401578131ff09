use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pagediff::{artifacts, runner, ArtifactPaths, CaptureConfig, CaptureRequest, CdpLauncher, ComparisonOptions};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pagediff", version, about = "Visual regression testing for web pages")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture a page and compare it with its baseline
    Test {
        url: String,
        /// Baseline image (defaults to <dir>/<encoded url>.png)
        #[arg(long)]
        baseline: Option<PathBuf>,
        #[command(flatten)]
        capture: CaptureArgs,
        #[command(flatten)]
        compare: CompareArgs,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Capture a page and store it as the baseline
    Baseline {
        url: String,
        #[command(flatten)]
        capture: CaptureArgs,
    },
    /// Compare two PNG files and write a diff image
    Compare {
        expected: PathBuf,
        actual: PathBuf,
        diff: PathBuf,
        #[command(flatten)]
        compare: CompareArgs,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct CaptureArgs {
    /// Viewport width in CSS pixels
    #[arg(long, default_value_t = pagediff::DEFAULT_WIDTH)]
    width: u32,
    /// Fixed capture height; measured from the page when omitted
    #[arg(long)]
    height: Option<u32>,
    /// Directory for baseline, output and diff images
    #[arg(long, default_value = artifacts::DEFAULT_DIR)]
    dir: PathBuf,
    /// Navigation timeout in milliseconds
    #[arg(long, default_value_t = 30000)]
    timeout_ms: u64,
}

#[derive(Args)]
struct CompareArgs {
    /// Matching threshold between 0 (exact) and 1
    #[arg(long, default_value_t = 0.1)]
    threshold: f64,
    /// Count anti-aliased pixels as mismatches
    #[arg(long)]
    include_aa: bool,
}

impl CaptureArgs {
    fn request(&self, url: &str) -> CaptureRequest {
        CaptureRequest {
            width: self.width,
            height: self.height.into(),
            ..CaptureRequest::new(url)
        }
    }

    fn config(&self) -> CaptureConfig {
        CaptureConfig {
            timeout_ms: self.timeout_ms,
            ..Default::default()
        }
    }
}

impl CompareArgs {
    fn options(&self) -> ComparisonOptions {
        ComparisonOptions {
            threshold: self.threshold,
            include_anti_aliasing: self.include_aa,
            ..Default::default()
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Test { url, baseline, capture, compare, json } => {
            let mut paths = ArtifactPaths::for_url(&capture.dir, &url);
            if let Some(b) = baseline {
                paths = paths.with_baseline(b);
            }
            let report = runner::run_test(&CdpLauncher, &capture.request(&url), &paths, &capture.config(), &compare.options())
                .with_context(|| format!("visual test of {} failed", url))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report);
            }
        }
        Command::Baseline { url, capture } => {
            let paths = ArtifactPaths::for_url(&capture.dir, &url);
            runner::create_baseline(&CdpLauncher, &capture.request(&url), &paths, &capture.config())
                .with_context(|| format!("capturing baseline of {} failed", url))?;
            println!("{}", paths.baseline.display());
        }
        Command::Compare { expected, actual, diff, compare, json } => {
            let result = pagediff::compare_files(&expected, &actual, &diff, &compare.options())
                .with_context(|| format!("comparing {} with {} failed", expected.display(), actual.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("error as px: {}", result.mismatched_pixel_count);
                println!(" error as %: {}%", result.error_percentage);
            }
        }
    }
    Ok(())
}
