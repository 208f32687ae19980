use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "vitrina-cli")]
#[command(about = "Vitrina catalog command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations.
    Migrate,
    /// Ensure the four canonical categories exist.
    SeedCategories,
    /// Import a product feed XML file into the catalog.
    Import {
        /// Path to the feed XML file.
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let pool = vitrina_db::connect_pool_from_env().await?;

    match cli.command {
        Commands::Migrate => {
            let applied = vitrina_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::SeedCategories => {
            let created = vitrina_db::seed_categories(&pool).await?;
            println!("created {created} categor{}", if created == 1 { "y" } else { "ies" });
        }
        Commands::Import { path } => {
            let xml = tokio::fs::read_to_string(&path).await?;
            let entries = vitrina_feed::normalize_feed(&xml)?;
            let imported = vitrina_db::import_entries(&pool, &entries).await?;
            println!("imported {imported} entries from {}", path.display());
        }
    }

    Ok(())
}
