#[macro_use]
extern crate tracing;

pub mod builder;
pub mod cli;
pub mod client;
pub mod dbus;
pub mod error;
pub mod utils;

#[cfg(test)]
mod tests;
