//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了CLI命令行接口。

use crate::config::Config;
use crate::manager::PitManager;
use crate::telemetry::init_tracing;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "oxpit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Path to a TOML config file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Database url, overrides the config file")]
    pub database_url: Option<String>,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(name = "migrate", about = "Create or upgrade the tables")]
    Migrate,

    #[command(name = "get", about = "Read a value")]
    Get(KeyArgs),

    #[command(name = "set", about = "Write a value (JSON, or a plain string)")]
    Set(SetArgs),

    #[command(name = "delete", about = "Delete a value")]
    Delete(KeyArgs),

    #[command(name = "flush", about = "Delete every value in a group")]
    Flush(GroupArgs),

    #[command(name = "list", about = "List the values in a group")]
    List(ListArgs),
}

#[derive(Parser, Debug)]
pub struct KeyArgs {
    pub group: String,
    pub key: String,
}

#[derive(Parser, Debug)]
pub struct SetArgs {
    pub group: String,
    pub key: String,
    pub value: String,
}

#[derive(Parser, Debug)]
pub struct GroupArgs {
    pub group: String,
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    pub group: String,

    #[arg(short, long, help = "Maximum number of items to print")]
    pub limit: Option<usize>,
}

mod items;
mod migrate;

pub use items::parse_value;

/// 按命令行参数加载配置
pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(url) = &cli.database_url {
        config.database.url = SecretString::new(url.clone().into());
    }
    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let filter = if cli.verbose {
        Some("debug")
    } else {
        config.global.log_filter.as_deref()
    };
    init_tracing(&config.global.service_name, filter);

    let manager = PitManager::connect(config)
        .await
        .context("Failed to connect to the database")?;

    match &cli.command {
        Commands::Migrate => migrate::execute(&manager).await,
        Commands::Get(args) => items::get(&manager, args).await,
        Commands::Set(args) => items::set(&manager, args).await,
        Commands::Delete(args) => items::delete(&manager, args).await,
        Commands::Flush(args) => items::flush(&manager, args).await,
        Commands::List(args) => items::list(&manager, args).await,
    }
}
