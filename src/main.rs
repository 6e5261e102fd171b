use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ambutrack::config::{parse_speed, parse_tz, Settings};
use ambutrack::geo::GeoPoint;
use ambutrack::routing::OsrmClient;
use ambutrack::server::{self, AppState};
use ambutrack::tracking::{AmbulanceSession, LinePositionSource, PollOutcome, Watcher};

/// ambutrack: nearest-hospital tracking for ambulances and dispatch
///
/// Examples:
///   ambutrack nearest --lat 17.40 --lng 78.40
///   ambutrack track --id AMB-1 --lat 17.40 --lng 78.40
///   tail -f fixes.txt | ambutrack track --id AMB-1
///   ambutrack watch --interval-ms 1500
///   ambutrack serve --port 8080
#[derive(Parser)]
#[command(name = "ambutrack", version, about, long_about = None)]
struct Cli {
    /// Shared tracking slot (default ~/.ambutrack/AMB_DATA.json).
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// JSON facility list: [{"name", "lat", "lng"}, ...]. Defaults to the built-in hospitals.
    #[arg(long, global = true)]
    facilities: Option<PathBuf>,

    /// Assumed average speed for straight-line ETAs, km/h.
    #[arg(long, global = true, value_parser = parse_speed_arg)]
    speed: Option<f64>,

    /// IANA timezone for record timestamps (e.g. Asia/Kolkata).
    #[arg(long, global = true)]
    tz: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the nearest hospital for one position.
    Nearest {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
    /// List the configured hospitals.
    Hospitals,
    /// Publish ambulance positions: one fix from flags, or `lat,lng` lines from stdin.
    Track {
        /// Ambulance identifier.
        #[arg(long)]
        id: String,
        #[arg(long, allow_hyphen_values = true, requires = "lng")]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lng: Option<f64>,
        /// Fetch the driving route with each fix and ship it in the record.
        #[arg(long)]
        prefetch_route: bool,
        /// Routing service base URL.
        #[arg(long)]
        osrm: Option<String>,
    },
    /// Dispatch view: poll the shared slot and print updates.
    Watch {
        /// Poll interval in milliseconds.
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Routing service base URL.
        #[arg(long)]
        osrm: Option<String>,
        /// Marker animation frames per update.
        #[arg(long)]
        smooth_steps: Option<usize>,
        /// Poll once and exit.
        #[arg(long)]
        once: bool,
    },
    /// Serve the HTTP API.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

fn parse_speed_arg(s: &str) -> Result<f64, String> {
    parse_speed(s).map_err(|e| e.to_string())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let settings = settings_from(&cli)?;
    let resolver = settings.build_resolver().context("loading facilities")?;

    match cli.command {
        Command::Nearest { lat, lng } => {
            let point = GeoPoint::new(lat, lng)?;
            let result = resolver.resolve(point)?;
            eprintln!(
                "  Nearest: {}\n  Distance: {:.2} km\n  ETA: {:.1} min (at {} km/h)",
                result.facility, result.distance_km, result.eta_minutes, resolver.speed_kmh(),
            );
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Command::Hospitals => {
            println!("{}", serde_json::to_string_pretty(resolver.facilities())?);
        }

        Command::Track { id, lat, lng, prefetch_route, osrm } => {
            let mut store = settings.open_store();
            let router = OsrmClient::new(osrm.unwrap_or_else(|| settings.osrm_url.clone()));
            let mut session = AmbulanceSession::new(id, &resolver, &mut store, settings.tz);
            if prefetch_route {
                session = session.with_route_provider(&router);
            }

            if let (Some(lat), Some(lng)) = (lat, lng) {
                let record = session.publish_sample(GeoPoint::new(lat, lng)?)?;
                eprintln!("{}", record.status_text());
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                let stdin = io::stdin();
                let mut source = LinePositionSource::new(stdin.lock());
                let published = session.run(&mut source)?;
                tracing::info!(published, "position stream ended");
            }
        }

        Command::Watch { interval_ms, osrm, smooth_steps, once } => {
            let interval = interval_ms.map(Duration::from_millis).unwrap_or(settings.poll_interval);
            if interval.is_zero() {
                bail!("--interval-ms must be positive");
            }
            let router = OsrmClient::new(osrm.unwrap_or_else(|| settings.osrm_url.clone()));
            let mut watcher = Watcher::new(settings.open_store(), router)
                .with_smooth_steps(smooth_steps.unwrap_or(settings.smooth_steps));

            if once {
                let outcome = watcher.poll_once();
                print_tick(watcher.state(), outcome);
                return Ok(());
            }

            tracing::info!(interval_ms = interval.as_millis() as u64, store = %settings.store_path.display(), "watching");
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(watcher.run_until(
                interval,
                async {
                    let _ = tokio::signal::ctrl_c().await;
                },
                print_tick,
            ));
        }

        Command::Serve { host, port } => {
            let state = AppState::new(resolver, settings.open_store(), settings.tz);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime
                .block_on(server::start(&host, port, state))
                .with_context(|| format!("serving on {}:{}", host, port))?;
        }
    }

    Ok(())
}

fn settings_from(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = Settings::from_env()?;
    if let Some(ref path) = cli.store {
        settings.store_path = path.clone();
    }
    if let Some(ref path) = cli.facilities {
        settings.facilities_path = Some(path.clone());
    }
    if let Some(speed) = cli.speed {
        settings.speed_kmh = speed;
    }
    if let Some(ref tz) = cli.tz {
        settings.tz = parse_tz(tz)?;
    }
    Ok(settings)
}

fn print_tick(state: &ambutrack::tracking::RenderState, outcome: PollOutcome) {
    match outcome {
        PollOutcome::Empty => eprintln!("  No active tracking."),
        PollOutcome::Unchanged => {}
        PollOutcome::Updated { .. } | PollOutcome::RouteFailed { .. } => {
            if let Some(ref info) = state.info {
                eprintln!("{}", info);
            }
            if let Some(minutes) = state.route_eta_minutes {
                eprintln!("Route ETA: {:.1} min ({} points)", minutes, state.route.len());
            }
            if let PollOutcome::RouteFailed { .. } = outcome {
                eprintln!("Route: unavailable, showing last known route");
            }
            eprintln!();
        }
    }
}
