//! tramp CLI
//!
//! Command-line tool for applying schema change-sets.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tramp_migrate::prelude::*;

/// Tracks and applies schema change-sets.
#[derive(Parser)]
#[command(name = "tramp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file.
    #[arg(short, long, env = "TRAMP_CONFIG", default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Database URL, overriding the configured connection.
    #[arg(short, long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations.
    Migrate {
        /// Files to record as migrated without running them.
        #[arg(long, value_delimiter = ',')]
        skip: Vec<String>,
    },

    /// Show pending migrations.
    Preview {
        /// List file names only.
        #[arg(long)]
        summary: bool,
    },

    /// Show recently applied migrations.
    History {
        /// Number of records to show.
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },

    /// Print the SQL of one migration file without executing it.
    Sql {
        /// Migration file name.
        file: String,

        /// Show the down SQL instead.
        #[arg(long)]
        down: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = MigratorConfig::load(&cli.config)?;
    if let Some(url) = cli.database_url {
        config = config.with_database_url(url);
    }
    let connection = MySqlConnection::new(config.connection.clone());
    let mut migrator = Migrator::new(config, Box::new(connection));

    // The connection is closed whatever the outcome.
    let outcome = run(&mut migrator, cli.command).await;
    let closed = migrator.close().await;
    outcome?;
    closed?;
    Ok(())
}

async fn run(migrator: &mut Migrator, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Migrate { skip } => {
            migrator.initialize().await?;
            let summary = migrator.run(&RunOptions::default().skip(skip)).await?;
            if summary.total() == 0 {
                info!("No pending migrations to migrate.");
            } else {
                info!(
                    migrated = summary.migrated.len(),
                    skipped = summary.skipped.len(),
                    "{} migrations migrated.",
                    summary.total()
                );
            }
        }

        Commands::Preview { summary } => {
            migrator.initialize().await?;
            let preview = migrator.dump_preview(summary).await?;
            print!("{preview}");
        }

        Commands::History { limit } => {
            migrator.initialize().await?;
            let records = migrator.history(limit).await?;
            if records.is_empty() {
                info!("No migrations migrated yet.");
                return Ok(());
            }

            println!("\nLast {limit} migrated migrations:");
            println!("{:-<80}", "");
            for record in &records {
                println!(
                    " {:>4}  {:<16} {}{}  {}  {}",
                    record.id,
                    record.path,
                    record.migration,
                    if record.is_skipped() { " [skipped]" } else { "" },
                    record.ran_at.format("%Y-%m-%d %H:%M:%S"),
                    record.authors
                );
            }
            println!();
        }

        Commands::Sql { file, down } => {
            let migration = migrator.find_migration(&file)?;
            let direction = if down { Direction::Down } else { Direction::Up };
            for sql in migrator.migration_sql(&migration, direction)? {
                println!("{sql}");
            }
        }
    }

    Ok(())
}
