use ble_sensor_service::config::{self, Config};
use ble_sensor_service::sensors::simulated::{SimulatedBme280, SimulatedIsm330dhcx};
use ble_sensor_service::service::SensorService;
use ble_sensor_service::simulation;
use clap::Parser;
use log::{debug, error, info};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::Duration;

#[derive(Parser)]
#[command(name = "ble-sensor-service")]
#[command(about = "Sensor notification service with simulated BME280 and ISM330DHCX drivers")]
struct Cli {
    /// JSON config file (defaults to ~/.config/ble-sensor-service/config.json if present)
    #[arg(long, env = "SENSOR_CONFIG")]
    config: Option<PathBuf>,

    /// Do not run the simulated observer
    #[arg(long)]
    no_observer: bool,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn load_config(cli: &Cli) -> ble_sensor_service::error::Result<Config> {
    let path = cli
        .config
        .clone()
        .or_else(|| config::default_config_path().filter(|p| p.exists()));
    match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Config::from_file(&path)
        }
        None => Ok(Config::from_env()),
    }
}

fn main() {
    // Before any runtime threads exist
    config::load_dotenv();
    init_logger();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start tokio runtime: {}", e);
            std::process::exit(1);
        }
    };
    runtime.block_on(run(cli));
}

async fn run(cli: Cli) {
    info!("Starting BLE sensor service");

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Configuration loaded:");
    info!("  Base interval: {} ms", config.service.base_interval_ms);
    info!(
        "  Environmental: {} (period {} ms)",
        config.environmental.enabled, config.environmental.default_period_ms
    );
    info!(
        "  Motion: {} (period {} ms)",
        config.motion.enabled, config.motion.default_period_ms
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let mut services = Vec::new();

    if config.environmental.enabled {
        match SensorService::environmental(
            SimulatedBme280::new(),
            &config.environmental,
            &config.service,
            tx.clone(),
        ) {
            Ok(service) => services.push(Arc::new(service)),
            Err(e) => error!("Failed to start environmental service: {}", e),
        }
    }
    if config.motion.enabled {
        match SensorService::motion(
            SimulatedIsm330dhcx::new(),
            &config.motion,
            &config.service,
            tx.clone(),
        ) {
            Ok(service) => services.push(Arc::new(service)),
            Err(e) => error!("Failed to start motion service: {}", e),
        }
    }
    drop(tx);

    if services.is_empty() {
        error!("No sensor service enabled");
        std::process::exit(1);
    }

    for service in &services {
        let name = service.definition().name;
        service.set_subscription_hook(Box::new(move |subscribed| {
            debug!(
                "[{}] subscription hook: {}",
                name,
                if subscribed { "subscribed" } else { "unsubscribed" }
            );
        }));
    }

    let names: HashMap<_, _> = services
        .iter()
        .map(|s| (s.definition().measurement.uuid, s.definition().name))
        .collect();
    let logger_task = simulation::run_notification_logger(rx, names);

    let mut observer_tasks = Vec::new();
    if config.simulation.observer && !cli.no_observer {
        let step = Duration::from_secs(config.simulation.step_secs.max(1));
        for service in &services {
            observer_tasks.push(simulation::run_observer_simulation(service.clone(), step));
        }
        info!("Simulated observer running (step {:?})", step);
    }

    info!("BLE sensor service is running");
    info!("  - {} service(s) ready", services.len());
    info!("  - Press Ctrl+C to exit");

    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }

    for task in observer_tasks {
        task.abort();
    }
    // Dropping the services stops their timers and closes the channel
    drop(services);
    logger_task.abort();

    info!("BLE sensor service stopped");
}
