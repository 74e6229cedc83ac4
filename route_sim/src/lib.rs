pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod map;
pub mod panel;
pub mod routing;
pub mod session;
pub mod simulator;

#[cfg(test)]
mod testing;
