use std::{fs::OpenOptions, path::PathBuf, str::FromStr, time::Duration};

use anyhow::Context;
use clap::Parser;
use route_sim::{
    config::{RouterKind, SimConfig},
    map::TracingMap,
    panel::ConsolePanel,
    routing::build_router,
    session::{spawn_session, SessionHandle},
    simulator::SimulatorState,
};
use route_sim_lib::geo_point::GeoPoint;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "route_sim")]
#[command(about = "Drive a simulated vehicle along a route between two points", long_about = None)]
struct Cli {
    /// File with `key = value` settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// Milliseconds between two steps of the vehicle
    #[arg(long)]
    tick_ms: Option<u64>,
    /// Use straight lines instead of the routing service
    #[arg(long)]
    offline: bool,
    /// Base URL of an OSRM compatible routing service
    #[arg(long)]
    osrm_url: Option<String>,
    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Point A as LAT,LNG
    #[arg(long, allow_hyphen_values = true)]
    from: Option<GeoPoint>,
    /// Point B as LAT,LNG
    #[arg(long, requires = "from", allow_hyphen_values = true)]
    to: Option<GeoPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Click(GeoPoint),
    Pause,
    Resume,
    Reset,
    Status,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let command = match name {
            "click" if rest.is_empty() => return Err("usage: click LAT,LNG".into()),
            "click" => Command::Click(rest.parse().map_err(|err| format!("{}: {}", rest, err))?),
            "pause" => Command::Pause,
            "resume" => Command::Resume,
            "reset" => Command::Reset,
            "status" => Command::Status,
            "quit" | "exit" => Command::Quit,
            _ => return Err(format!("Unknown command: {}", line)),
        };

        if !matches!(command, Command::Click(_)) && !rest.is_empty() {
            return Err(format!("Unexpected arguments: {}", line));
        }
        Ok(command)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let config = load_config(&cli)?;
    tracing::info!(
        "Starting simulator: {:?} router, one step every {} ms",
        config.router,
        config.tick_period.as_millis()
    );

    let router = build_router(&config).context("Failed to set up the routing service")?;
    let (handle, task) = spawn_session(router, TracingMap::new(), ConsolePanel, config.tick_period);

    if let Some(from) = cli.from {
        handle.click(from);
    }
    if let Some(to) = cli.to {
        handle.click(to);
    }

    read_commands(handle.clone()).await?;

    handle.shutdown();
    task.await.context("Session task failed")?;
    tracing::info!("Simulator stopped");
    Ok(())
}

fn init_tracing(cli: &Cli) -> anyhow::Result<()> {
    let file_layer = match &cli.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        }
        None => None,
    };

    // Logs go to stderr so the panel owns stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<SimConfig> {
    let mut config = match &cli.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    if let Some(tick_ms) = cli.tick_ms {
        config.tick_period = Duration::from_millis(tick_ms);
    }
    if cli.offline {
        config.router = RouterKind::StraightLine;
    }
    if let Some(url) = &cli.osrm_url {
        config.osrm.base_url = url.clone();
    }

    config.validate()?;
    Ok(config)
}

async fn read_commands(mut handle: SessionHandle) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(Command::Click(point)) => handle.click(point),
            Ok(Command::Pause) => handle.pause(),
            Ok(Command::Resume) => handle.resume(),
            Ok(Command::Reset) => handle.reset(),
            Ok(Command::Status) => {
                if let Some(status) = handle.settled().await {
                    println!("{:?}", status);
                }
            }
            Ok(Command::Quit) => return Ok(()),
            Err(err) => eprintln!("{}", err),
        }
    }

    // Input is closed: let a pending route and a running vehicle finish
    if handle.settled().await.is_some() {
        handle
            .wait_for(|status| !status.route_pending && status.simulator != SimulatorState::Running)
            .await;
    }
    Ok(())
}
