//! Residential microgrid simulator with inter-building energy sharing.
//!
//! A [`sim::env::GridEnvironment`] steps a community of buildings one hour at
//! a time; a controller decides how much energy each building sends to the
//! others before the remainder is settled against batteries and the grid.

pub mod config;
pub mod devices;
pub mod io;
pub mod runner;
/// Environment, ambient model, weather, rewards and policies.
pub mod sim;
#[cfg(feature = "tui")]
pub mod tui;
