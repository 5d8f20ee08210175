mod brands;
mod process;
mod repair;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::brands::{run_brands_add_website, run_brands_list, run_brands_show, BrandsCommands};
use crate::process::run_process;
use crate::repair::run_repair;

#[derive(Debug, Parser)]
#[command(name = "aivis-cli")]
#[command(about = "AI answer brand analytics command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Resolve brands and write analytics facts for analyzed answers
    Process {
        /// JSON files, each holding one answer or an array of answers
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Maximum answers processed at once (defaults to `AIVIS_MAX_CONCURRENT_ANSWERS`)
        #[arg(long)]
        concurrency: Option<usize>,
        /// Print the fact rows that would be written without touching the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Re-run identity resolution for facts written without a canonical brand
    Repair {
        /// Maximum (answer, brand) pairs to repair
        #[arg(long, default_value = "500")]
        limit: i64,
    },
    /// Inspect and maintain canonical brands
    Brands {
        #[command(subcommand)]
        command: BrandsCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("aivis-cli ready; run with --help to list commands");
        return Ok(());
    };

    let config = aivis_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if let Commands::Process {
        files,
        dry_run: true,
        ..
    } = &command
    {
        let tracked = aivis_core::load_tracked_websites(&config.tracked_path)?;
        return process::run_process_dry_run(&config, &tracked, files);
    }

    let pool_config = aivis_db::PoolConfig::from_app_config(&config);
    let pool = aivis_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Migrate => {
            let applied = aivis_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Process {
            files, concurrency, ..
        } => {
            let tracked = aivis_core::load_tracked_websites(&config.tracked_path)?;
            let concurrency = concurrency.unwrap_or(config.max_concurrent_answers).max(1);
            run_process(&pool, &config, &tracked, &files, concurrency).await?;
        }
        Commands::Repair { limit } => {
            let tracked = aivis_core::load_tracked_websites(&config.tracked_path)?;
            run_repair(&pool, &config, &tracked, limit).await?;
        }
        Commands::Brands { command } => match command {
            BrandsCommands::List { limit } => run_brands_list(&pool, limit).await?,
            BrandsCommands::Show { slug } => run_brands_show(&pool, &slug).await?,
            BrandsCommands::AddWebsite { slug, domain } => {
                run_brands_add_website(&pool, &slug, &domain).await?;
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests;
