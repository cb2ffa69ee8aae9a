//! Illuminance sources.

use std::{
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serialport::{ClearBuffer, SerialPort};

use crate::config::Sensor;

lazy_static! {
    /// Matches `lux=123.4`, `Lux: 12` and similar.
    pub static ref DEFAULT_LUX_RE: Regex =
        Regex::new(r"(?i)\blux\s*[=:]\s*(?P<lux>[-+]?[0-9]*\.?[0-9]+)").unwrap();
}

/// Something that can report the current ambient light level.
pub trait IlluminanceSource {
    /// Return the current illuminance in lux.
    fn read_lux(&mut self) -> anyhow::Result<f64>;
}

impl<S: IlluminanceSource + ?Sized> IlluminanceSource for Box<S> {
    fn read_lux(&mut self) -> anyhow::Result<f64> {
        (**self).read_lux()
    }
}

/// Open the source described by the config.
pub fn open(sensor: &Sensor) -> anyhow::Result<Box<dyn IlluminanceSource>> {
    let source: Box<dyn IlluminanceSource> = match sensor {
        Sensor::Serial {
            port,
            baudrate,
            pattern,
        } => Box::new(SerialSensor::open(port, *baudrate, pattern.clone())?),
        Sensor::File { path, scale } => Box::new(FileSensor::new(path.clone(), *scale)),
    };
    Ok(source)
}

/// Parse a line and return the reading, if any.
pub fn parse_lux(line: &str, pattern: &Regex) -> Option<f64> {
    let capture = pattern.captures(line)?;
    capture.name("lux")?.as_str().parse().ok()
}

/// Read lines until one contains a reading.
fn read_next_lux<R: BufRead>(
    reader: &mut R,
    pattern: &Regex,
    line_buffer: &mut Vec<u8>,
) -> anyhow::Result<f64> {
    loop {
        line_buffer.clear();
        let size = reader
            .read_until(b'\n', line_buffer)
            .context("Failed to read from serial port")?;
        if size == 0 {
            anyhow::bail!("Serial port closed");
        }
        // Line noise must not end the loop, it just won't match
        let line = String::from_utf8_lossy(line_buffer);
        let line = line.trim();
        match parse_lux(line, pattern) {
            Some(lux) => return Ok(lux),
            None => debug!("Skipping line: {:?}", line),
        }
    }
}

/// A sensor that continuously prints readings over a serial port.
pub struct SerialSensor {
    port: BufReader<Box<dyn SerialPort>>,
    pattern: Regex,
    line_buffer: Vec<u8>,
}

impl SerialSensor {
    pub fn open(port: &Path, baudrate: u32, pattern: Regex) -> anyhow::Result<Self> {
        let name = port
            .to_str()
            .context(format!("Invalid serial port path {:?}", port))?;
        let raw_port = serialport::new(name, baudrate)
            .timeout(Duration::from_secs(30))
            .open()
            .context(format!("Failed to open serial port at {:?}", port))?;

        Ok(Self {
            port: BufReader::new(raw_port),
            pattern,
            line_buffer: Vec::new(),
        })
    }

    /// Throw away everything received since the last reading.
    fn discard_stale(&mut self) -> anyhow::Result<()> {
        self.port
            .get_ref()
            .clear(ClearBuffer::Input)
            .context("Failed to clear serial input buffer")?;
        let buffered = self.port.buffer().len();
        self.port.consume(buffered);

        // The first line after clearing is most likely incomplete
        self.line_buffer.clear();
        self.port
            .read_until(b'\n', &mut self.line_buffer)
            .context("Failed to read from serial port")?;
        Ok(())
    }
}

impl IlluminanceSource for SerialSensor {
    fn read_lux(&mut self) -> anyhow::Result<f64> {
        self.discard_stale()?;
        read_next_lux(&mut self.port, &self.pattern, &mut self.line_buffer)
    }
}

/// A sensor exposed as a file holding the current value.
pub struct FileSensor {
    path: PathBuf,
    scale: f64,
}

impl FileSensor {
    pub fn new(path: PathBuf, scale: f64) -> Self {
        Self { path, scale }
    }
}

impl IlluminanceSource for FileSensor {
    fn read_lux(&mut self) -> anyhow::Result<f64> {
        let contents = fs::read_to_string(&self.path)
            .context(format!("Failed to read sensor file at {:?}", self.path))?;
        let raw: f64 = contents
            .trim()
            .parse()
            .context(format!("Invalid sensor reading {:?}", contents.trim()))?;
        Ok(raw * self.scale)
    }
}
