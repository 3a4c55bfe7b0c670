use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kol_optimizer::candidate::Candidate;
use kol_optimizer::catalog::{Catalog, CatalogFilter, FilterOptions};
use kol_optimizer::config::{Config, ConfigOverrides};
use kol_optimizer::optimizer::summary::parse_response;
use kol_optimizer::optimizer::validate::OptimizeRequest;
use kol_optimizer::optimizer::{build_optimizer, SelectionResult, Strategy};
use kol_optimizer::output::csv::candidates_to_csv;
use kol_optimizer::output::json::render_json;
use kol_optimizer::output::table::{
    render_candidates_table, render_options_table, render_selection_table,
};
use kol_optimizer::server::run_server;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "kol-optimizer",
    about = "Pick KOLs for a campaign budget"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    catalog: Option<String>,
    #[arg(long = "remote-url", env = "KOL_FORECAST_API_URL")]
    remote_url: Option<String>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args, Clone, Default)]
struct FilterArgs {
    #[arg(long = "min-subscribers")]
    min_subscribers: Option<f64>,
    #[arg(long = "max-subscribers")]
    max_subscribers: Option<f64>,
    #[arg(long = "min-price")]
    min_price: Option<f64>,
    #[arg(long = "max-price")]
    max_price: Option<f64>,
    #[arg(long = "category", value_delimiter = ',')]
    categories: Vec<String>,
    #[arg(long = "archetype", value_delimiter = ',')]
    archetypes: Vec<String>,
    #[arg(long = "country", value_delimiter = ',')]
    countries: Vec<String>,
    #[arg(long = "language", value_delimiter = ',')]
    languages: Vec<String>,
    #[arg(long)]
    search: Option<String>,
}

impl From<FilterArgs> for CatalogFilter {
    fn from(value: FilterArgs) -> Self {
        Self {
            min_subscribers: value.min_subscribers,
            max_subscribers: value.max_subscribers,
            min_price: value.min_price,
            max_price: value.max_price,
            categories: value.categories,
            archetypes: value.archetypes,
            countries: value.countries,
            languages: value.languages,
            search: value.search,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    Optimize {
        #[arg(long)]
        budget: f64,
        #[arg(long)]
        strategy: Option<Strategy>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    List {
        #[command(flatten)]
        filters: FilterArgs,
    },
    Options,
    Report {
        path: PathBuf,
    },
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    let strategy_override = match &cli.command {
        Commands::Optimize { strategy, .. } => *strategy,
        _ => None,
    };
    config.apply_overrides(ConfigOverrides {
        remote_url: cli.remote_url.clone(),
        catalog_path: cli.catalog.clone(),
        default_strategy: strategy_override,
    });

    match &cli.command {
        Commands::Config { init, show } => {
            handle_config_command(*init, *show, &config, &config_path)?;
        }
        Commands::Serve { host, port } => {
            let host = host.clone().unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let bind = format!("{host}:{port}");
            let addr: SocketAddr = bind
                .parse()
                .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
            run_server(config, addr).await?;
        }
        Commands::Report { path } => {
            let result = load_report(path)?;
            print_selection(&result, cli.output)?;
        }
        Commands::Options => {
            let catalog = load_catalog(&config)?;
            let options = FilterOptions::from_candidates(&catalog.candidates);
            match cli.output {
                OutputFormat::Table => println!("{}", render_options_table(&options)),
                OutputFormat::Json => println!("{}", render_json(&options)?),
                OutputFormat::Csv => {
                    warn!("CSV output for options not implemented, using JSON");
                    println!("{}", render_json(&options)?);
                }
            }
        }
        Commands::List { filters } => {
            let catalog = load_catalog(&config)?;
            let candidates = catalog.filter(&filters.clone().into());
            info!(
                "{} of {} KOLs match",
                candidates.len(),
                catalog.candidates.len()
            );
            print_candidates(&candidates, cli.output)?;
        }
        Commands::Optimize {
            budget, filters, ..
        } => {
            let catalog = load_catalog(&config)?;
            let filter: CatalogFilter = filters.clone().into();
            let request = OptimizeRequest::new(catalog.filter(&filter), *budget)?;
            let optimizer =
                build_optimizer(config.optimizer.default_strategy, &config.remote)?;
            info!(
                "optimizing {} KOLs with {} strategy",
                request.candidates.len(),
                optimizer.strategy()
            );
            let result = optimizer
                .optimize(&request.candidates, request.budget)
                .await?;
            print_selection(&result, cli.output)?;
        }
    }

    Ok(())
}

fn handle_config_command(init: bool, show: bool, config: &Config, config_path: &Path) -> Result<()> {
    if init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if show || !init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn load_catalog(config: &Config) -> Result<Catalog> {
    let path = config.resolved_catalog_path();
    let catalog = Catalog::load(&path)?;
    if catalog.candidates.is_empty() {
        warn!("catalog {} contains no KOLs", path.display());
    }
    Ok(catalog)
}

fn load_report(path: &Path) -> Result<SelectionResult> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading report: {}", path.display()))?;
    let value = serde_json::from_str(&data)
        .with_context(|| format!("invalid report JSON: {}", path.display()))?;
    Ok(parse_response(&value)?)
}

fn print_candidates(candidates: &[Candidate], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_candidates_table(candidates)),
        OutputFormat::Json => println!("{}", render_json(candidates)?),
        OutputFormat::Csv => print!("{}", candidates_to_csv(candidates)?),
    }
    Ok(())
}

fn print_selection(result: &SelectionResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_selection_table(result)),
        OutputFormat::Json => println!("{}", render_json(result)?),
        OutputFormat::Csv => print!("{}", candidates_to_csv(&result.selected)?),
    }
    Ok(())
}
