use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use keyset_db::{DbHandle, Store};
use listings::contract::error::{ErrorClass, ListingError};
use listings::contract::model::ListRequest;
use listings::{ListingService, ListingsConfig, RankingsService, ResourcesService};
use runtime::{AppConfig, CliArgs};
use serde_json::{json, Map, Value as JsonValue};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps in-memory DSNs as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path) -> Result<String> {
    if dsn.contains(":memory:") || dsn.contains("mode=memory") {
        return Ok(dsn.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .or_else(|| dsn.strip_prefix("sqlite:"))
        .ok_or_else(|| anyhow!("DSN must start with sqlite: (got: {dsn})"))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Keyset listings over animal rankings and resources
#[derive(Parser)]
#[command(name = "listings-cli")]
#[command(about = "Keyset-paginated listings over animal rankings and resources")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List one page of animal rankings (sort keys: ANIMAL_RANK, ANIMAL_NAME)
    Rankings(ListArgs),
    /// List one page of resources (sort keys: RESOURCE_CREATED_AT, RESOURCE_NAME)
    Resources(ListArgs),
    /// Check configuration
    Check,
}

#[derive(Args)]
struct ListArgs {
    /// Sort key, matched exactly
    #[arg(long)]
    sort: String,

    /// Last seen value of the sort column
    #[arg(long)]
    cursor: String,

    /// Page size (0 or absent uses the configured default)
    #[arg(long)]
    limit: Option<u64>,

    /// ASC or DESC
    #[arg(long, default_value = "ASC")]
    order: String,

    /// Filter as column=value, or column=v1,v2 for set membership; repeatable
    #[arg(long = "filter", value_name = "COLUMN=VALUES")]
    filters: Vec<String>,
}

impl ListArgs {
    fn into_request<K>(self, sort: K) -> Result<ListRequest<K>> {
        let mut filters = Map::new();
        for raw in &self.filters {
            let (column, values) = raw
                .split_once('=')
                .ok_or_else(|| anyhow!("filter must look like column=value (got: {raw})"))?;
            let value = if values.contains(',') {
                JsonValue::Array(
                    values
                        .split(',')
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(|v| JsonValue::String(v.to_string()))
                        .collect(),
                )
            } else {
                JsonValue::String(values.to_string())
            };
            filters.insert(column.trim().to_string(), value);
        }

        Ok(ListRequest {
            sort,
            cursor: self.cursor,
            limit: self.limit,
            order: self.order,
            filters,
        })
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, Path::new(&config.home_dir));

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(ExitCode::SUCCESS);
    }

    match cli.command {
        Some(Commands::Rankings(list)) => {
            let svc: RankingsService = build_service(&config).await?;
            run_list(svc, list).await
        }
        Some(Commands::Resources(list)) => {
            let svc: ResourcesService = build_service(&config).await?;
            run_list(svc, list).await
        }
        Some(Commands::Check) => check_config(config),
        None => Err(anyhow!("no command given; see --help")),
    }
}

async fn build_service<E>(config: &AppConfig) -> Result<ListingService<E>>
where
    E: keyset_db::KeysetEntity,
{
    let db_config = config
        .database
        .as_ref()
        .ok_or_else(|| anyhow!("Database URL not configured"))?;

    let mut dsn = db_config.url.trim().to_owned();
    if dsn.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    if dsn.starts_with("sqlite:") {
        dsn = absolutize_sqlite_dsn(&dsn, Path::new(&config.home_dir))?;
    }

    let db = DbHandle::connect(&dsn, db_config.connect_opts())
        .await
        .context("Failed to connect to database")?;
    tracing::info!(engine = ?db.engine(), "Connected database");

    let listings_cfg = ListingsConfig::from_module(config.module("listings"))
        .context("Invalid modules.listings configuration")?;

    let store: Arc<dyn Store> = Arc::new(db);
    Ok(ListingService::new(store, listings_cfg))
}

async fn run_list<E>(svc: ListingService<E>, args: ListArgs) -> Result<ExitCode>
where
    E: keyset_db::KeysetEntity + serde::Serialize,
    E::SortKey: FromStr<Err = ListingError>,
{
    let sort = match args.sort.parse::<E::SortKey>() {
        Ok(sort) => sort,
        Err(e) => return Ok(report(&e)),
    };
    let req = args.into_request(sort)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    match svc.list(&req, cancel).await {
        Ok(page) => {
            println!("{}", serde_json::to_string_pretty(&page)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(report(&e)),
    }
}

/// Print the error as JSON on stderr and map its class to an exit code.
fn report(e: &ListingError) -> ExitCode {
    eprintln!("{}", error_json(e));
    match e.status() {
        ErrorClass::Client => ExitCode::from(2),
        ErrorClass::Server => ExitCode::from(1),
    }
}

fn error_json(e: &ListingError) -> JsonValue {
    json!({ "error": { "code": e.code(), "message": e.to_string() } })
}

fn check_config(config: AppConfig) -> Result<ExitCode> {
    tracing::info!("Checking configuration...");

    if let Some(db) = &config.database {
        DbHandle::detect(&db.url).context("Unsupported database URL")?;
    }
    ListingsConfig::from_module(config.module("listings"))
        .context("Invalid modules.listings configuration")?;

    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(ExitCode::SUCCESS)
}
