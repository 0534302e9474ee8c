use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "audition",
    version,
    about = "Listening tests for TTS output — score clips, compare models, log judgments to CSV"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the rating web UI
    Serve(ServeArgs),
    /// Check the manifest and audio files before a session
    Validate(ValidateArgs),
    /// Scaffold the input/output folder layout
    Init(InitArgs),
    /// Summarize a criteria-test log per evaluator
    Summary(SummaryArgs),
    Version,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
pub enum ServeMode {
    /// One clip at a time, scored 0–100
    #[default]
    Single,
    /// Blind A/B comparison with preference
    Compare,
    /// Criteria understanding test on reference clips
    Calibrate,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Args, Clone)]
pub struct ServeArgs {
    #[arg(long, value_enum, default_value_t = ServeMode::Single)]
    pub mode: ServeMode,

    /// Optional YAML config with serve defaults
    #[arg(long, env = "AUDITION_CONFIG")]
    pub config: Option<PathBuf>,

    /// Sample manifest CSV (overrides the config file)
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Root folder with one subfolder of clips per model
    #[arg(long)]
    pub audio_dir: Option<PathBuf>,

    /// Folder the score logs are written to
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    #[arg(long, env = "AUDITION_PORT")]
    pub port: Option<u16>,
}

#[derive(clap::Args, Clone)]
pub struct ValidateArgs {
    #[arg(long, default_value = "app_input/csv/list.csv")]
    pub manifest: PathBuf,

    #[arg(long, default_value = "app_input/audios")]
    pub audio_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Clone)]
pub struct InitArgs {
    /// Project folder to scaffold into
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

#[derive(clap::Args, Clone)]
pub struct SummaryArgs {
    /// Criteria-test log to summarize
    #[arg(long, default_value = "app_output/criteria_test_log.csv")]
    pub log: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}
