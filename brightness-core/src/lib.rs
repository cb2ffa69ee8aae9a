//! Brightness decisions for a display that follows the ambient light level.
//!
//! A [`Curve`] maps illuminance to a target brightness, a [`Controller`]
//! walks the brightness that is actually applied towards that target one
//! percent per tick. Neither performs any I/O, so the crate builds without
//! `std` and can run next to the sensor on a microcontroller as well as in
//! the host service.
#![cfg_attr(not(test), no_std)]

pub mod controller;
pub mod curve;
pub mod errors;

pub use controller::{Controller, Update};
pub use curve::{Breakpoint, Curve, MAX_BREAKPOINTS, MAX_BRIGHTNESS};
pub use errors::Error;
