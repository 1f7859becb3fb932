use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use application::Hal;
use domain::event::EventPublisher;
use domain::HalEvent;
use infrastructure::{
    ChannelEventPublisher, CompositeEventPublisher, PlantConfig, RtuClientFactory, SimulatedPlant,
    TracingEventPublisher,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

#[derive(Parser, Debug)]
#[command(author, version, about = "Start the plant HAL, report every tag, stop")]
struct Args {
    /// Plant description (YAML, TOML or JSON)
    #[arg(long)]
    config: Option<String>,

    /// Use the in-memory simulated plant instead of serial ports
    #[arg(long)]
    simulate: bool,

    /// Command every `cmd` tag to 0.0 before the final snapshot
    #[arg(long)]
    zero_commands: bool,

    /// How long to let the loops run before each snapshot
    #[arg(long, default_value_t = 1000)]
    settle_ms: u64,

    /// Keep running until Ctrl-C before stopping
    #[arg(long)]
    hold: bool,

    /// Print the final snapshot as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Also print every HAL event as a JSON line on stdout
    #[arg(long)]
    events: bool,
}

fn default_config_path() -> String {
    // Run from the workspace root during development
    let dev_path = "crates/hal-smoke/config/plant.yaml";
    if std::path::Path::new(dev_path).exists() {
        dev_path.to_string()
    } else {
        "config/plant.yaml".to_string()
    }
}

fn log_snapshot(hal: &Hal, label: &str) {
    info!("{}", label);
    let snapshot = hal.snapshot();
    for name in hal.tag_names() {
        match snapshot.get(&name) {
            Some(tag) => match tag.value {
                Some(value) => info!("{} = {} ({})", name, value, tag.quality),
                None => info!("{} = unavailable ({})", name, tag.quality),
            },
            None => info!("{} = no data yet", name),
        }
    }
}

fn print_events(mut rx: UnboundedReceiver<HalEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!(error = %e, "Failed to serialize event"),
            }
        }
    })
}

async fn run() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,hal_smoke=debug,application=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(default_config_path);

    info!(config = %config_path, "Loading plant configuration...");
    let config = PlantConfig::load(&config_path)
        .with_context(|| format!("Failed to load plant configuration from {}", config_path))?;
    info!(
        buses = config.buses.len(),
        devices = config.devices.len(),
        tags = config.tags.len(),
        "Configuration loaded"
    );

    let mut printer = None;
    let publisher: Arc<dyn EventPublisher> = if args.events {
        let (channel, rx) = ChannelEventPublisher::new();
        printer = Some(print_events(rx));
        Arc::new(CompositeEventPublisher::new(vec![
            Arc::new(TracingEventPublisher::new()),
            Arc::new(channel),
        ]))
    } else {
        Arc::new(TracingEventPublisher::new())
    };
    let hal = if args.simulate {
        info!("Using simulated plant");
        Hal::new(&config, &SimulatedPlant::new(), publisher)?
    } else {
        Hal::new(&config, &RtuClientFactory, publisher)?
    };

    let settle = Duration::from_millis(args.settle_ms);

    hal.start().await;
    tokio::time::sleep(settle).await;
    log_snapshot(&hal, "Initial snapshot");

    if args.zero_commands {
        for name in hal.tag_names().iter().filter(|name| name.contains("cmd")) {
            info!(tag = %name, "Commanding 0.0");
            hal.write(name, 0.0);
        }
        tokio::time::sleep(settle).await;
    }

    if args.hold {
        info!("Running, press Ctrl-C to stop");
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutting down..."),
            Err(err) => warn!(error = %err, "Unable to listen for shutdown signal"),
        }
    }

    log_snapshot(&hal, "Final snapshot");
    if args.json {
        println!("{}", serde_json::to_string_pretty(&hal.snapshot())?);
    }

    hal.stop().await;
    drop(hal);
    if let Some(printer) = printer {
        // Ends once the HAL's last handle on the channel is gone
        if tokio::time::timeout(Duration::from_millis(500), printer).await.is_err() {
            warn!("Event printer still running at exit");
        }
    }
    info!("Done");
    Ok(())
}

fn main() {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start the async runtime: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(run()) {
        eprintln!("\nFATAL: {:?}", e);
        std::process::exit(1);
    }
}
