use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use explorewiki::db::{import, migrate, Db};
use explorewiki::source::SqliteRelationSource;
use explorewiki::suggest::Suggester;
use explorewiki::{Config, GraphBuilder};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "explorewiki")]
#[command(about = "Explore a relation dataset as a bounded graph around one entity")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending schema migrations
    Migrate,
    /// Load persons and property rows from text files
    Import {
        /// One person name per line
        #[arg(long)]
        persons: Option<PathBuf>,
        /// Tab-separated entity_name, property_name[, link2]
        #[arg(long)]
        properties: Option<PathBuf>,
    },
    /// Build the graph around a name and print it as JSON
    Build {
        name: String,
        #[arg(long)]
        pretty: bool,
    },
    /// List person names starting with a prefix
    Suggest { term: String },
    /// Run the HTTP API
    Serve {
        /// Overrides http_server.port
        #[arg(long)]
        port: Option<u16>,
    },
}

async fn open_db(config: &Config) -> Result<Db> {
    let db = Db::new(config.db_path());
    let migrations_dir = config.migrations_dir().to_path_buf();
    db.with_connection(move |conn| migrate::run_migrations(conn, &migrations_dir))
        .await
        .context("Failed to migrate database")?;
    Ok(db)
}

fn reader(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;

    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", config.explore.log_level.as_str()),
    )
    .init();

    log::info!("ExploreWiki v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Database path: {}", config.db_path().display());

    match args.command {
        Command::Migrate => {
            open_db(&config).await?;
        }
        Command::Import { persons, properties } => {
            if persons.is_none() && properties.is_none() {
                anyhow::bail!("Nothing to import: pass --persons and/or --properties");
            }
            let db = open_db(&config).await?;
            if let Some(path) = persons {
                let input = reader(&path)?;
                let count = db
                    .with_connection(move |conn| import::import_persons(conn, input))
                    .await?;
                println!("Imported {} persons from {}", count, path.display());
            }
            if let Some(path) = properties {
                let input = reader(&path)?;
                let count = db
                    .with_connection(move |conn| import::import_properties(conn, input))
                    .await?;
                println!("Imported {} property rows from {}", count, path.display());
            }
        }
        Command::Build { name, pretty } => {
            let db = open_db(&config).await?;
            let builder = GraphBuilder::new(config.graph.limits());
            let graph = db
                .with_connection(move |conn| builder.build(&SqliteRelationSource::new(conn), &name))
                .await?;
            let json = if pretty {
                serde_json::to_string_pretty(&graph)?
            } else {
                serde_json::to_string(&graph)?
            };
            println!("{}", json);
            eprintln!("{}", graph.summary());
        }
        Command::Suggest { term } => {
            let db = open_db(&config).await?;
            let suggester = Suggester::new(db, config.suggest.limit, 1);
            for name in suggester.suggest(&term).await? {
                println!("{}", name);
            }
        }
        Command::Serve { port } => {
            open_db(&config).await?;
            let port = port.unwrap_or(config.http_server.port);
            explorewiki::http::serve(&config, port).await?;
        }
    }

    Ok(())
}
