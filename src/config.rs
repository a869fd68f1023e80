use crate::prelude::*;

use serde::Deserialize;
use serde_with::{serde_as, DurationMilliSeconds, DurationSeconds};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::control::dynamic_export::ControlInput;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub inverters: Vec<Device>,
    pub meter: Device,
    pub control: Control,

    #[serde(default = "Config::default_loglevel")]
    pub loglevel: String,

    #[serde(default)]
    pub read_only: bool,
}

// Device {{{
/// A SunSpec device reachable over Modbus TCP.
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct Device {
    #[serde(default = "Config::default_enabled")]
    pub enabled: bool,

    pub host: String,
    #[serde(default = "Config::default_port")]
    pub port: u16,
    #[serde(default = "Config::default_unit_id")]
    pub unit_id: u8,
    #[serde(default = "Config::default_base_address")]
    pub base_address: u16,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "timeout_ms", default = "Config::default_timeout")]
    pub timeout: Duration,
}
impl Device {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn unit_id(&self) -> u8 {
        self.unit_id
    }

    pub fn base_address(&self) -> u16 {
        self.base_address
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn name(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.unit_id)
    }
} // }}}

// Control {{{
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct Control {
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "interval_secs", default = "Config::default_interval")]
    pub interval: Duration,

    pub export_limit_watts: Decimal,
    #[serde(default)]
    pub deenergize: bool,

    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "revert_timeout_secs", default = "Config::default_revert_timeout")]
    pub revert_timeout: Duration,
}
impl Control {
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn revert_timeout(&self) -> Duration {
        self.revert_timeout
    }

    pub fn input(&self) -> ControlInput {
        ControlInput {
            export_limit_watts: self.export_limit_watts,
            deenergize: self.deenergize,
        }
    }
} // }}}

pub struct ConfigWrapper {
    config: Arc<Mutex<Config>>,
}

impl Clone for ConfigWrapper {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
        }
    }
}

impl ConfigWrapper {
    pub fn new(file: String) -> Result<Self> {
        Ok(Self::from_config(Config::new(file)?))
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Config> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn inverters(&self) -> Vec<Device> {
        self.lock().inverters.clone()
    }

    pub fn enabled_inverters(&self) -> Vec<Device> {
        self.inverters().into_iter().filter(|i| i.enabled()).collect()
    }

    pub fn meter(&self) -> Device {
        self.lock().meter.clone()
    }

    pub fn control(&self) -> Control {
        self.lock().control.clone()
    }

    /// Current upstream request; read fresh every control cycle.
    pub fn control_input(&self) -> ControlInput {
        self.lock().control.input()
    }

    pub fn set_control_input(&self, input: ControlInput) {
        let mut config = self.lock();
        info!(
            "control input changed: export limit {}W, deenergize {}",
            input.export_limit_watts, input.deenergize
        );
        config.control.export_limit_watts = input.export_limit_watts;
        config.control.deenergize = input.deenergize;
    }

    pub fn loglevel(&self) -> String {
        self.lock().loglevel.clone()
    }

    pub fn read_only(&self) -> bool {
        self.lock().read_only
    }

    pub fn log_summary(&self) {
        self.lock().log_summary();
    }
}

impl Config {
    pub fn new(file: String) -> Result<Self> {
        let content = std::fs::read_to_string(&file)
            .map_err(|err| anyhow!("error reading {}: {}", file, err))?;

        Self::from_str(&content).map_err(|err| anyhow!("error parsing {}: {:#}", file, err))
    }

    /// Logs the effective configuration.
    pub fn log_summary(&self) {
        info!("Configuration loaded successfully:");
        info!(
            "  Inverters: {} configured, {} enabled",
            self.inverters.len(),
            self.inverters.iter().filter(|i| i.enabled).count()
        );
        for (i, inv) in self.inverters.iter().enumerate() {
            info!("    Inverter[{}]:", i);
            info!("      Enabled: {}", inv.enabled);
            info!("      Address: {}", inv.name());
            info!("      Base Address: {}", inv.base_address);
            info!("      Timeout: {:?}", inv.timeout);
        }
        info!("  Meter: {}", self.meter.name());
        info!("  Control:");
        info!("    Interval: {:?}", self.control.interval);
        info!("    Export Limit: {}W", self.control.export_limit_watts);
        info!("    Deenergize: {}", self.control.deenergize);
        info!("    Revert Timeout: {:?}", self.control.revert_timeout);
        info!("  Global Read Only: {}", self.read_only);
        info!("  Log Level: {}", self.loglevel);
    }

    fn validate(&self) -> Result<()> {
        let devices = self
            .inverters
            .iter()
            .enumerate()
            .filter(|(_, inv)| inv.enabled)
            .map(|(i, inv)| (format!("inverters[{}]", i), inv))
            .chain(std::iter::once(("meter".to_string(), &self.meter)));

        for (name, device) in devices {
            if device.host.is_empty() {
                bail!("{}.host cannot be empty", name);
            }
            if device.port == 0 {
                bail!("{}.port must be between 1 and 65535", name);
            }
            if device.timeout.is_zero() {
                bail!("{}.timeout_ms must be greater than 0", name);
            }
        }

        if !self.inverters.iter().any(|inv| inv.enabled) {
            bail!("at least one inverter must be enabled");
        }
        if !self.meter.enabled {
            bail!("meter cannot be disabled");
        }
        if self.control.interval.is_zero() {
            bail!("control.interval_secs must be greater than 0");
        }
        if self.control.revert_timeout.as_secs() > u64::from(u16::MAX) {
            bail!("control.revert_timeout_secs must fit in 16 bits");
        }

        Ok(())
    }

    fn default_enabled() -> bool {
        true
    }

    fn default_loglevel() -> String {
        "info".to_string()
    }

    fn default_port() -> u16 {
        502
    }

    fn default_unit_id() -> u8 {
        1
    }

    fn default_base_address() -> u16 {
        40000
    }

    fn default_timeout() -> Duration {
        Duration::from_millis(1000)
    }

    fn default_interval() -> Duration {
        Duration::from_secs(5)
    }

    fn default_revert_timeout() -> Duration {
        Duration::from_secs(60)
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    /// Parses and validates YAML configuration.
    fn from_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}
