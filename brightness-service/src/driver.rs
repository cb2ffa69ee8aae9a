//! The sampling loop.
//!
//! Every cycle takes one illuminance reading and ticks the controller of each
//! display with it. The actuator is only invoked when the applied brightness
//! actually moved. While any display is still converging the loop samples
//! with the short catch-up interval, otherwise with the regular interval.

use std::{future::Future, time::Duration};

use anyhow::Context;
use brightness_core::{Controller, Curve, Update};
use log::{debug, info};

use crate::{actuator::Actuator, config::Timing, sensor::IlluminanceSource};

/// A display with its controller and actuator.
pub struct Display<A> {
    name: String,
    controller: Controller,
    actuator: A,
}

impl<A: Actuator> Display<A> {
    /// Create the display state from the first reading and apply the initial
    /// brightness unconditionally.
    pub fn initialize(
        name: String,
        curve: Curve,
        mut actuator: A,
        lux: f64,
    ) -> anyhow::Result<Self> {
        let controller = Controller::new(curve, lux);
        let applied = controller.applied();
        info!("[{}] Initial brightness: lux={:.1}, setting={}", name, lux, applied);
        actuator
            .set_brightness(applied)
            .context(format!("Failed to set initial brightness of display {:?}", name))?;
        Ok(Self {
            name,
            controller,
            actuator,
        })
    }

    /// Tick the controller and forward a changed brightness to the actuator.
    pub fn update(&mut self, lux: f64) -> anyhow::Result<Update> {
        let update = self.controller.tick(lux);
        if update.changed {
            info!(
                "[{}] lux={:.1}, target={}, setting={}",
                self.name, lux, update.target, update.applied
            );
            self.actuator
                .set_brightness(update.applied)
                .context(format!("Failed to set brightness of display {:?}", self.name))?;
        }
        Ok(update)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn applied(&self) -> u8 {
        self.controller.applied()
    }

    #[cfg(test)]
    pub fn actuator(&self) -> &A {
        &self.actuator
    }
}

pub struct Driver<S, A> {
    source: S,
    displays: Vec<Display<A>>,
    timing: Timing,
}

impl<S: IlluminanceSource, A: Actuator> Driver<S, A> {
    /// Take the first reading and bring every display to its curve value.
    pub fn start(
        mut source: S,
        displays: impl IntoIterator<Item = (String, Curve, A)>,
        timing: Timing,
    ) -> anyhow::Result<Self> {
        let lux = source
            .read_lux()
            .context("Failed to read initial illuminance")?;
        let displays = displays
            .into_iter()
            .map(|(name, curve, actuator)| Display::initialize(name, curve, actuator, lux))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self {
            source,
            displays,
            timing,
        })
    }

    pub fn displays(&self) -> &[Display<A>] {
        &self.displays
    }

    /// Sample once and update all displays.
    ///
    /// Returns whether any display has not reached its target yet.
    pub fn step(&mut self) -> anyhow::Result<bool> {
        let lux = self.source.read_lux().context("Failed to read illuminance")?;
        let mut converging = false;
        for display in &mut self.displays {
            let update = display.update(lux)?;
            converging |= !update.is_settled();
        }
        debug!("lux={:.1}, converging={}", lux, converging);
        Ok(converging)
    }

    pub fn next_delay(&self, converging: bool) -> Duration {
        if converging {
            self.timing.catch_up()
        } else {
            self.timing.interval()
        }
    }

    /// Run until `shutdown` completes or sampling/actuation fails.
    ///
    /// Must be called from a multi-threaded runtime, sampling blocks.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
        tokio::pin!(shutdown);
        loop {
            let converging = tokio::task::block_in_place(|| self.step())?;
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.next_delay(converging)) => {}
            }
        }
    }
}
