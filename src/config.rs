use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    if !env_path.exists() {
        return;
    }

    let content = match fs::read_to_string(env_path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for (key, value) in content.lines().filter_map(parse_env_line) {
        // Only set if not already set (env vars take precedence)
        if std::env::var(key).is_err() {
            // SAFETY: We're single-threaded at this point (called before any async runtime)
            unsafe { std::env::set_var(key, value) };
        }
    }
}

/// Split one `.env` line into key and value, skipping blanks and comments.
fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let mut value = line[eq_pos + 1..].trim();

    // Remove surrounding quotes if present
    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        value = &value[1..value.len() - 1];
    }

    Some((key, value))
}

/// Default config file location (`~/.config/ble-sensor-service/config.json`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ble-sensor-service").join("config.json"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub environmental: SensorConfig,
    pub motion: SensorConfig,
    pub simulation: SimulationConfig,
}

/// Settings shared by every sensor service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Timer interval used for on-change sampling when no positive period
    /// has been configured yet.
    pub base_interval_ms: u32,
    /// How often a not-ready sensor is polled.
    pub ready_poll_ms: u64,
    /// Upper bound on the not-ready wait. `None` waits forever.
    ///
    /// Defaults to 500 ms here, whereas a bare `SampleSource::direct`
    /// has no bound until `with_ready_wait` sets one.
    pub ready_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    pub enabled: bool,
    /// Initial value of the period attribute (-1 off, 0 on change, >0 ms).
    pub default_period_ms: i32,
    /// Id of the first field; later fields count up from here.
    pub sensor_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Run a simulated observer against each service.
    pub observer: bool,
    /// Seconds between observer actions.
    pub step_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: 1000,
            ready_poll_ms: 2,
            ready_timeout_ms: Some(500),
        }
    }
}

impl SensorConfig {
    pub fn environmental() -> Self {
        Self {
            enabled: true,
            default_period_ms: 1000,
            sensor_id: -3,
        }
    }

    pub fn motion() -> Self {
        Self {
            enabled: true,
            default_period_ms: 100,
            sensor_id: -2,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            observer: true,
            step_secs: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            environmental: SensorConfig::environmental(),
            motion: SensorConfig::motion(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load a JSON config file, then apply environment overrides on top.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(ms) = env_parse("SENSOR_BASE_INTERVAL_MS") {
            self.service.base_interval_ms = ms;
        }
        if let Some(ms) = env_parse("SENSOR_READY_POLL_MS") {
            self.service.ready_poll_ms = ms;
        }
        if let Ok(timeout) = std::env::var("SENSOR_READY_TIMEOUT_MS") {
            // "none" or a negative number disables the bound
            self.service.ready_timeout_ms = timeout.trim().parse::<i64>().ok().and_then(|ms| {
                if ms < 0 { None } else { Some(ms as u64) }
            });
        }

        if let Some(ms) = env_parse("ENV_SENSOR_PERIOD_MS") {
            self.environmental.default_period_ms = ms;
        }
        if let Some(enabled) = env_parse("ENV_SENSOR_ENABLED") {
            self.environmental.enabled = enabled;
        }
        if let Some(ms) = env_parse("MOTION_SENSOR_PERIOD_MS") {
            self.motion.default_period_ms = ms;
        }
        if let Some(enabled) = env_parse("MOTION_SENSOR_ENABLED") {
            self.motion.enabled = enabled;
        }

        if let Some(observer) = env_parse("SIMULATED_OBSERVER") {
            self.simulation.observer = observer;
        }
        if let Some(secs) = env_parse("SIMULATION_STEP_SECS") {
            self.simulation.step_secs = secs;
        }

        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}
