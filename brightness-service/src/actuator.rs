//! Applying brightness values to a display.

use std::process::Command;

use anyhow::Context;
use brightness_core::MAX_BRIGHTNESS;

/// Argument placeholder replaced with the brightness percentage.
pub const PLACEHOLDER: &str = "{brightness}";

/// Something that can set the brightness of a display.
pub trait Actuator {
    fn set_brightness(&mut self, pct: u8) -> anyhow::Result<()>;
}

/// Sets the brightness by running an external command such as `ddcutil`.
#[derive(Debug)]
pub struct CommandActuator {
    argv: Vec<String>,
}

impl CommandActuator {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    /// The command line for the given percentage.
    pub fn render(&self, pct: u8) -> Vec<String> {
        let pct = pct.to_string();
        self.argv
            .iter()
            .map(|arg| arg.replace(PLACEHOLDER, &pct))
            .collect()
    }
}

impl Actuator for CommandActuator {
    fn set_brightness(&mut self, pct: u8) -> anyhow::Result<()> {
        let argv = self.render(pct.min(MAX_BRIGHTNESS));
        let Some((program, args)) = argv.split_first() else {
            anyhow::bail!("Empty brightness command");
        };
        let status = Command::new(program)
            .args(args)
            .status()
            .context(format!("Failed to run {:?}", program))?;
        if !status.success() {
            anyhow::bail!("Command {:?} failed: {}", argv, status);
        }
        Ok(())
    }
}
