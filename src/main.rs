use clap::Parser;
use dht22_bridge::config::{self, Config};
use dht22_bridge::notify::{ChannelSink, EventKind, PropertyEvent};
use dht22_bridge::registry::AdapterRegistry;
use dht22_bridge::sensor::SimulatedReader;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(name = "dht22-bridge", about = "DHT22 to smart-home gateway bridge")]
struct Args {
    /// Path to the sensor configuration file
    #[arg(long, env = "DHT22_CONFIG", default_value = "config.json")]
    config: PathBuf,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

/// Drain gateway-bound events. A real deployment hands these to the
/// gateway's device registry; this host just reports them.
async fn consume_events(mut rx: mpsc::UnboundedReceiver<PropertyEvent>) {
    while let Some(event) = rx.recv().await {
        match event.kind {
            EventKind::Seed => info!(
                "[Gateway] Seeded {} on pin {} at {} {}",
                event.property,
                event.pin,
                event.value,
                event.property.unit()
            ),
            EventKind::Change => info!(
                "[Gateway] {} on pin {} is now {} {}",
                event.property,
                event.pin,
                event.value,
                event.property.unit()
            ),
        }
    }
}

#[tokio::main]
async fn main() {
    init_logger();
    config::load_dotenv();
    info!("Starting DHT22 bridge");

    let args = Args::parse();
    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration from {:?}: {}", args.config, e);
            std::process::exit(1);
        }
    };
    info!("Configuration loaded:");
    info!("  Poll interval: {}s", config.poll_interval_secs);
    info!("  Sensors: {}", config.sensors.len());

    let (sink, rx) = ChannelSink::channel();
    let consumer = tokio::spawn(consume_events(rx));

    // The real DHT22 driver is wired in by the hosting gateway; this
    // binary runs against the simulated sensor.
    let reader = Arc::new(SimulatedReader::default());

    let registry = match AdapterRegistry::start(&config, reader, Arc::new(sink)).await {
        Ok(registry) => registry,
        Err(e) => {
            log::error!("Failed to start adapter registry: {}", e);
            std::process::exit(1);
        }
    };

    info!("DHT22 bridge is running");
    info!("  - {} session(s) polling", registry.sessions().len());
    info!("  - Press Ctrl+C to exit");

    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => log::error!("Failed to listen for shutdown signal: {}", e),
    }

    registry.shutdown().await;
    consumer.abort();
    info!("DHT22 bridge stopped");
}
