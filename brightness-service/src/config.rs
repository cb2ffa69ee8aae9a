use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use brightness_core::Curve;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::sensor::DEFAULT_LUX_RE;

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct RawConfig {
    #[serde(default)]
    pub timing: Timing,
    pub sensor: RawSensor,
    #[serde(rename = "display", default)]
    pub displays: Vec<RawDisplay>,
}

impl RawConfig {
    /// Read and parse the TOML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .context(format!("Failed to open config file at {:?}", path))?;
        toml::from_str(&contents).context(format!("Failed to parse config file at {:?}", path))
    }

    pub fn example() -> Self {
        Self {
            timing: Timing::default(),
            sensor: RawSensor::Serial {
                port: PathBuf::from("/dev/ttyACM0"),
                baudrate: 9600,
                pattern: None,
            },
            displays: vec![RawDisplay {
                name: "main".to_string(),
                command: ["ddcutil", "--bus=6", "setvcp", "10", "{brightness}"]
                    .iter()
                    .map(|arg| arg.to_string())
                    .collect(),
                curve: vec![(0.0, 10), (240.0, 100)],
            }],
        }
    }
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Timing {
    /// Seconds between two samples once all displays reached their target.
    pub interval_secs: u64,

    /// Milliseconds between two samples while a display is still converging.
    pub catch_up_millis: u64,
}

impl Timing {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn catch_up(&self) -> Duration {
        Duration::from_millis(self.catch_up_millis)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            catch_up_millis: 100,
        }
    }
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RawSensor {
    /// Light sensor that prints its readings line by line.
    Serial {
        /// The serial port.
        port: PathBuf,

        /// The baud rate.
        baudrate: u32,

        /// Regex with a named `lux` group. Lines that don't match are skipped.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },

    /// File containing a single reading, e.g. an IIO `in_illuminance_input`.
    File {
        path: PathBuf,

        /// Factor the raw value is multiplied with
        #[serde(default = "default_scale")]
        scale: f64,
    },
}

fn default_scale() -> f64 {
    1.0
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct RawDisplay {
    /// Name used in log messages
    pub name: String,

    /// Command setting the brightness. `{brightness}` is replaced with the
    /// percentage.
    pub command: Vec<String>,

    /// List of (lux, brightness) pairs
    pub curve: Vec<(f64, u8)>,
}

#[derive(Debug)]
pub struct Config {
    pub timing: Timing,
    pub sensor: Sensor,
    pub displays: Vec<DisplayConfig>,
}

#[derive(Debug)]
pub enum Sensor {
    Serial {
        port: PathBuf,
        baudrate: u32,
        pattern: Regex,
    },
    File {
        path: PathBuf,
        scale: f64,
    },
}

#[derive(Debug)]
pub struct DisplayConfig {
    pub name: String,
    pub command: Vec<String>,
    pub curve: Curve,
}

impl TryFrom<RawSensor> for Sensor {
    type Error = anyhow::Error;

    fn try_from(raw_sensor: RawSensor) -> Result<Self, Self::Error> {
        Ok(match raw_sensor {
            RawSensor::Serial {
                port,
                baudrate,
                pattern,
            } => {
                let pattern = match pattern {
                    Some(pattern) => {
                        let re = Regex::new(&pattern)
                            .context(format!("Invalid sensor pattern {:?}", pattern))?;
                        if !re.capture_names().any(|name| name == Some("lux")) {
                            anyhow::bail!("Sensor pattern {:?} has no `lux` group", pattern);
                        }
                        re
                    }
                    None => DEFAULT_LUX_RE.clone(),
                };
                Sensor::Serial {
                    port,
                    baudrate,
                    pattern,
                }
            }
            RawSensor::File { path, scale } => {
                if !scale.is_finite() {
                    anyhow::bail!("Sensor scale must be a finite number");
                }
                Sensor::File { path, scale }
            }
        })
    }
}

impl TryFrom<RawDisplay> for DisplayConfig {
    type Error = anyhow::Error;

    fn try_from(raw_display: RawDisplay) -> Result<Self, Self::Error> {
        if raw_display.command.is_empty() {
            anyhow::bail!("Display {:?} has an empty command", raw_display.name);
        }
        let curve = Curve::from_steps(&raw_display.curve).context(format!(
            "Invalid brightness curve for display {:?}",
            raw_display.name
        ))?;
        Ok(DisplayConfig {
            name: raw_display.name,
            command: raw_display.command,
            curve,
        })
    }
}

impl TryFrom<RawConfig> for Config {
    type Error = anyhow::Error;

    fn try_from(raw_config: RawConfig) -> Result<Self, Self::Error> {
        if raw_config.timing.interval_secs == 0 {
            anyhow::bail!("Sampling interval must be at least one second");
        }
        if raw_config.displays.is_empty() {
            anyhow::bail!("No displays configured");
        }

        let sensor = raw_config.sensor.try_into()?;
        let displays = raw_config
            .displays
            .into_iter()
            .map(DisplayConfig::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Config {
            timing: raw_config.timing,
            sensor,
            displays,
        })
    }
}
