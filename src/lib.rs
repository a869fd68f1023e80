pub mod channels;
pub mod config;
pub mod control;
pub mod error;
pub mod metrics;
pub mod options;
pub mod prelude;
pub mod sunspec;
pub mod telemetry;

const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::prelude::*;

use crate::control::ExportControl;
use crate::sunspec::{ModbusTransport, RegisterTransport, SunSpecConnection};
use crate::telemetry::Telemetry;

fn init_logging(level: &str) -> std::result::Result<(), log::SetLoggerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .write_style(env_logger::WriteStyle::Never)
        .try_init()
}

fn connection(name: &str, device: &config::Device) -> SunSpecConnection {
    let transport: Arc<dyn RegisterTransport> = Arc::new(ModbusTransport::new(name, device));
    SunSpecConnection::new(name, device.base_address(), transport)
}

/// Loads the config, connects every device and runs the export controller
/// until `shutdown_rx` fires.
pub async fn app(mut shutdown_rx: broadcast::Receiver<()>, options: Options) -> Result<()> {
    let config = ConfigWrapper::new(options.config_file.clone())?;

    if let Err(e) = init_logging(&config.loglevel()) {
        eprintln!("failed to initialise logging: {}", e);
    }

    info!(
        "sunspec-export {} starting with config file: {}",
        CARGO_PKG_VERSION, options.config_file
    );
    config.log_summary();

    let channels = Channels::new();

    info!("  Creating Telemetry...");
    let telemetry = Telemetry::new(channels.clone());
    let telemetry_clone = telemetry.clone();
    let telemetry_handle = tokio::spawn(async move {
        if let Err(e) = telemetry_clone.start().await {
            error!("Telemetry task failed: {}", e);
        }
    });

    info!("  Creating device connections...");
    let inverters: Vec<SunSpecConnection> = config
        .enabled_inverters()
        .iter()
        .enumerate()
        .map(|(i, device)| connection(&format!("inverter[{}] {}", i, device.name()), device))
        .collect();
    let meter_config = config.meter();
    let meter = connection(&format!("meter {}", meter_config.name()), &meter_config);

    info!("  Creating ExportControl...");
    let export_control = ExportControl::new(config.clone(), channels.clone(), inverters, meter);
    let export_control_clone = export_control.clone();
    let export_control_handle = tokio::spawn(async move {
        if let Err(e) = export_control_clone.start().await {
            error!("ExportControl task failed: {}", e);
        }
    });

    info!("Waiting for shutdown signal...");
    let _ = shutdown_rx.recv().await;

    info!("Shutdown signal received, stopping components...");
    export_control.stop();
    telemetry.stop();

    if let Err(e) = export_control_handle.await {
        error!("Error waiting for export control task: {}", e);
    }
    if let Err(e) = telemetry_handle.await {
        error!("Error waiting for telemetry task: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}
