use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use delivery_planner::config::{self, CliOverrides, ConfigFile, PlannerConfig, ServiceSection};
use delivery_planner::error::{NO_SAVED_PLAN_MESSAGE, PlannerError};
use delivery_planner::gemini::{GeminiClient, Unconfigured};
use delivery_planner::model::{PlanForm, TrafficCondition};
use delivery_planner::normalize::NormalizeOptions;
use delivery_planner::session::{Notice, SAVED_NOTICE, Session};
use delivery_planner::storage::{FileStore, PlanStorage};
use delivery_planner::traits::PlanningService;

const CHART_WIDTH: usize = 40;

type CliSession = Session<Box<dyn PlanningService>, FileStore>;

#[derive(Parser)]
#[command(
    name = "delivery-planner",
    about = "Plan multi-driver delivery routes with an AI planning service"
)]
struct Cli {
    /// Config file (defaults to ~/.config/delivery-planner/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file
    Init {
        /// API key for the planning service
        #[arg(long)]
        api_key: Option<String>,
        /// Model name
        #[arg(long)]
        model: Option<String>,
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Request an optimized plan and print it
    Optimize {
        /// Headquarters address (start and end of every route)
        #[arg(long)]
        hq: String,
        /// Delivery address; repeat for each stop
        #[arg(long = "address", conflicts_with = "addresses_file")]
        addresses: Vec<String>,
        /// File with one delivery address per line
        #[arg(long)]
        addresses_file: Option<PathBuf>,
        /// Number of drivers
        #[arg(long, default_value = "1")]
        drivers: String,
        /// Minutes spent at each delivery stop
        #[arg(long, default_value = "5")]
        stop_duration: String,
        /// light, moderate or heavy
        #[arg(long, default_value_t = TrafficCondition::Moderate)]
        traffic: TrafficCondition,
        /// Model name (overrides config and env)
        #[arg(long)]
        model: Option<String>,
        /// Check route invariants on the response
        #[arg(long)]
        strict: bool,
        /// Save the plan after it is ready
        #[arg(long)]
        save: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show the last saved plan
    Load {
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Driver whose route is shown in detail (defaults to the lowest id)
    #[arg(long)]
    route: Option<u32>,
    /// Write the selected route as GeoJSON
    #[arg(long)]
    geojson: Option<PathBuf>,
    /// Write the chart config as JSON
    #[arg(long)]
    chart_json: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.unwrap_or_else(config::config_path);

    match cli.command {
        Commands::Init {
            api_key,
            model,
            force,
        } => cmd_init(&config_path, api_key, model, force),
        Commands::Optimize {
            hq,
            addresses,
            addresses_file,
            drivers,
            stop_duration,
            traffic,
            model,
            strict,
            save,
            output,
        } => {
            let overrides = CliOverrides {
                api_key: None,
                model,
                strict,
            };
            let mut session = open_session(&config_path, &overrides)?;

            let delivery_addresses = match addresses_file {
                Some(path) => fs::read_to_string(&path)
                    .with_context(|| format!("failed to read addresses from {}", path.display()))?,
                None => addresses.join("\n"),
            };
            let form = PlanForm {
                hq_address: hq,
                delivery_addresses,
                driver_count: drivers,
                stop_duration,
                traffic_condition: traffic,
            };

            if let Err(err) = session.submit(form) {
                return Err(surface(err));
            }
            if save {
                // A failed save leaves the plan on screen.
                if let Err(err) = session.save() {
                    eprintln!("{}", err.user_message());
                }
            }
            show(&mut session, &output)
        }
        Commands::Load { output } => {
            let mut session = open_session(&config_path, &CliOverrides::default())?;
            match session.load() {
                Ok(Some(_)) => show(&mut session, &output),
                Ok(None) => {
                    println!("{NO_SAVED_PLAN_MESSAGE}");
                    Ok(())
                }
                Err(err) => Err(surface(err)),
            }
        }
    }
}

/// Execute `delivery-planner init`: write the config file.
fn cmd_init(
    path: &Path,
    api_key: Option<String>,
    model: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let has_key = api_key.is_some();
    let file = ConfigFile {
        service: ServiceSection {
            api_key,
            model,
            ..ServiceSection::default()
        },
        ..ConfigFile::default()
    };
    config::save_config(path, &file)?;

    println!("Config written to {}", path.display());
    if !has_key {
        println!("No API key stored; set GEMINI_API_KEY or rerun with --api-key.");
    }
    Ok(())
}

fn open_session(path: &Path, overrides: &CliOverrides) -> anyhow::Result<CliSession> {
    let file = config::load_config(path)?;
    let resolved = PlannerConfig::resolve(overrides, file)?;

    let service: Box<dyn PlanningService> = match resolved.gemini() {
        Ok(gemini) => Box::new(GeminiClient::new(gemini).context("failed to build HTTP client")?),
        Err(_) => {
            tracing::warn!("no API key configured; optimization will fail");
            Box::new(Unconfigured)
        }
    };
    tracing::debug!(dir = %resolved.storage_dir.display(), strict = resolved.strict, "session ready");

    let storage = PlanStorage::new(FileStore::new(&resolved.storage_dir));
    Ok(Session::new(service, storage).with_options(NormalizeOptions {
        strict: resolved.strict,
    }))
}

/// Prefix the detail with the text the error panel would show.
fn surface(err: PlannerError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

fn show(session: &mut CliSession, output: &OutputArgs) -> anyhow::Result<()> {
    if let Some(driver_id) = output.route {
        session.select_route(driver_id).map_err(surface)?;
    }

    if let Some(chart) = session.chart() {
        println!("{}", chart.render_text(CHART_WIDTH));
    }
    for card in session.cards() {
        println!("{card}");
    }
    if let Some(detail) = session.detail_panel() {
        println!("{detail}");
    }
    if let Some(Notice::Saved) = session.take_notice() {
        println!("{SAVED_NOTICE}");
    }

    if let Some(path) = &output.geojson {
        let overlay = session
            .map()
            .overlay()
            .context("no route is drawn on the map")?;
        let json = serde_json::to_string_pretty(&overlay.to_geojson())
            .context("failed to serialize GeoJSON")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write GeoJSON to {}", path.display()))?;
    }
    if let Some(path) = &output.chart_json {
        let chart = session.chart().context("no chart has been built")?;
        let json = serde_json::to_string_pretty(&chart.to_config())
            .context("failed to serialize chart config")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write chart config to {}", path.display()))?;
    }
    Ok(())
}
