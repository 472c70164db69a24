use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use altpilot_ctrl::display::DisplayCfg;
use altpilot_ctrl::doctor as ctrl_doctor;
use altpilot_ctrl::run::{fly, EndReason, RunOutcome};
use altpilot_ctrl::stop::stop_pair;
use altpilot_ctrl::ControlConfig;
use altpilot_link::{doctor as link_doctor, DEFAULT_ENDPOINT};
use altpilot_proto::telemetry::TelemetryRecord;

#[derive(Debug, Parser)]
#[command(name = "altpilot", version, about = "altpilot - altitude schedule controller for a telemetry-streaming flight peer")]
struct Cli {
    /// TOML config; built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate the configuration.
    Doctor,
    /// Connect to the peer and fly the altitude schedule.
    Run {
        /// Override link.endpoint.
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Decode one raw telemetry string and print the record.
    Decode { raw: String },
}

#[derive(Debug, Default, serde::Deserialize)]
struct Config {
    #[serde(default)]
    link: LinkCfg,
    #[serde(default)]
    control: ControlConfig,
    #[serde(default)]
    display: DisplayCfg,
}

#[derive(Debug, serde::Deserialize)]
struct LinkCfg {
    endpoint: String,
}

impl Default for LinkCfg {
    fn default() -> Self {
        Self { endpoint: DEFAULT_ENDPOINT.to_string() }
    }
}

fn load_config(path: Option<&str>) -> Result<Config> {
    let Some(path) = path else {
        info!("config: none given, using built-in defaults");
        return Ok(Config::default());
    };
    let s = std::fs::read_to_string(path).with_context(|| format!("read config {}", path))?;
    toml::from_str(&s).context("parse config toml")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref())?;

    match cli.cmd {
        Command::Doctor => doctor(&cfg)?,
        Command::Run { endpoint } => run(&cfg, endpoint).await?,
        Command::Decode { raw } => decode(&raw),
    }
    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");
    link_doctor::check_endpoint(&cfg.link.endpoint)?;
    ctrl_doctor::check_control(&cfg.control)?;
    ctrl_doctor::check_display(&cfg.display)?;
    info!("doctor: OK");
    Ok(())
}

async fn run(cfg: &Config, endpoint: Option<String>) -> Result<()> {
    let endpoint = endpoint.unwrap_or_else(|| cfg.link.endpoint.clone());
    if let Err(e) = ctrl_doctor::check_control(&cfg.control) {
        warn!("run: control config looks off: {:#}", e);
    }
    let machine = cfg.control.machine()?;
    info!("run: starting against {} with {} targets", endpoint, machine.schedule().len());

    let (stop_handle, stop) = stop_pair();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("run: interrupt received, stopping");
                stop_handle.request();
            }
            Err(e) => warn!("run: cannot listen for ctrl-c: {}", e),
        }
    });

    let outcome = fly(&endpoint, machine, cfg.control.pacing(), cfg.display.build(), stop)
        .await
        .context("connect to flight peer")?;
    print_summary(&outcome);
    Ok(())
}

fn print_summary(out: &RunOutcome) {
    let reason = match out.reason {
        EndReason::Landed => "landed",
        EndReason::Stopped => "stopped by operator",
        EndReason::PeerClosed => "peer closed the connection",
        EndReason::SendFailed => "command send failed",
    };
    println!("result={}", reason);
    println!("commands_sent={}", out.commands_sent);
    if let (Some(x), Some(n)) = (out.final_x, out.landed_iterations) {
        println!("distance_covered={:.1}", x);
        println!("iterations={}", n);
    }
    let secs = (out.ended_at - out.started_at).as_seconds_f64();
    println!("duration_s={:.1}", secs);
}

fn decode(raw: &str) {
    let rec = TelemetryRecord::decode(raw);
    if rec.is_fallback() {
        println!("fallback=true");
    }
    println!("x={} y={} bat={} sens={:?}", rec.x, rec.y, rec.bat, rec.sens);
}
