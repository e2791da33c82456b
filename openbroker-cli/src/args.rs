use std::path::PathBuf;

use clap::Args;

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Args, Clone)]
pub struct StoreArgs {
    /// Database URL; falls back to OPENBROKER_DATABASE_URL / DATABASE_URL.
    #[arg(long)]
    pub store: Option<String>,
    #[arg(long, default_value_t = 5)]
    pub max_connections: u32,
}

#[derive(Debug, Args, Clone)]
pub struct ConfigArgs {
    /// YAML broker configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct RequestArgs {
    /// Accept a 202-style async response instead of waiting inline for the
    /// job to finish.
    #[arg(long)]
    pub accepts_incomplete: bool,

    /// Originating identity for the authorization hook.
    #[arg(long)]
    pub username: Option<String>,
}
