use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "chatprobe",
    version,
    about = "Regression-test a web chatbot's answers against an expected-answer dataset"
)]
pub struct Cli {
    /// Log line format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Log in, ask every dataset question and score the answers
    Run(RunArgs),
    /// Score a single answer offline, without a browser
    Score(ScoreArgs),
    /// Check a config (and optionally a dataset) without running anything
    Validate(ValidateArgs),
    /// Write a commented sample config
    Init(InitArgs),
}

#[derive(Parser, Clone, Debug)]
pub struct RunArgs {
    #[arg(long, default_value = "chatprobe.yaml")]
    pub config: PathBuf,

    /// Question dataset (.yaml, .yml or .json)
    #[arg(long)]
    pub dataset: PathBuf,

    /// Directory for results.json and summary.json
    #[arg(long, default_value = "reports")]
    pub out_dir: PathBuf,

    #[arg(long, env = "CHATBOT_USERNAME")]
    pub username: Option<String>,

    #[arg(long, env = "CHATBOT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Run the browser without a window (true, 1 or yes)
    #[arg(
        long,
        env = "HEADLESS_MODE",
        action = clap::ArgAction::Set,
        default_value = "false",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = parse_headless
    )]
    pub headless: bool,

    /// Node.js executable used to run the Playwright bridge
    #[arg(long, default_value = "node")]
    pub node: PathBuf,
}

#[derive(Parser, Clone, Debug)]
pub struct ScoreArgs {
    #[arg(long)]
    pub expected: String,

    #[arg(long)]
    pub actual: String,

    #[arg(long)]
    pub expected_data: Option<String>,

    /// Take thresholds and weights from this config instead of the defaults
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
pub struct ValidateArgs {
    #[arg(long, default_value = "chatprobe.yaml")]
    pub config: PathBuf,

    #[arg(long)]
    pub dataset: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
pub struct InitArgs {
    #[arg(long, default_value = "chatprobe.yaml")]
    pub config: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Anything other than `true`, `1` or `yes` (any case) means headed.
pub fn parse_headless(raw: &str) -> Result<bool, String> {
    Ok(matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    ))
}
