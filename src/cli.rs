use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "cro-audit",
    version,
    about = "Checklist-driven conversion audit for landing pages"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a page and evaluate the checklist against it.
    Analyze(AnalyzeArgs),
    /// Parse a checklist and show which checker each tip resolves to.
    Checklist(ChecklistArgs),
    /// List the registered automated checkers.
    Checkers(CheckersArgs),
    /// Record a reward for an exported JSON report.
    Feedback(FeedbackArgs),
    /// Show the learned per-tip weights.
    Weights(WeightsArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Markdown,
    Html,
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Json => "json",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ChecklistSourceArgs {
    /// Delimited checklist file; the bundled Dutch checklist when omitted.
    #[arg(long)]
    pub checklist: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub fallback_to_default: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    pub url: String,

    #[command(flatten)]
    pub source: ChecklistSourceArgs,

    #[arg(long, default_value_t = 20)]
    pub timeout_secs: u64,

    #[arg(long, default_value_t = 2000)]
    pub checker_budget_ms: u64,

    #[arg(long, default_value_t = 390)]
    pub viewport_width: u32,

    #[arg(long, default_value_t = 844)]
    pub viewport_height: u32,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub include_unlisted: bool,

    #[arg(long, default_value_t = false)]
    pub prioritize: bool,

    #[arg(long, default_value = ".cache/cro-audit")]
    pub data_dir: PathBuf,

    #[arg(long, default_value_t = 1.0)]
    pub feedback_alpha: f64,
}

#[derive(Args, Debug, Clone)]
pub struct ChecklistArgs {
    #[command(flatten)]
    pub source: ChecklistSourceArgs,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CheckersArgs {
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FeedbackArgs {
    /// JSON report written by `analyze --format json`.
    #[arg(long)]
    pub report: PathBuf,

    #[arg(long, allow_negative_numbers = true)]
    pub reward: f64,

    #[arg(long, default_value = ".cache/cro-audit")]
    pub data_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct WeightsArgs {
    #[arg(long, default_value = ".cache/cro-audit")]
    pub data_dir: PathBuf,

    #[arg(long, default_value_t = 1.0)]
    pub feedback_alpha: f64,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
