#![cfg_attr(not(test), no_std)]

#[cfg(target_os = "none")]
pub mod hardware;

pub mod config;
pub mod layout;
pub mod mcp9600;
pub mod metadata;
pub mod multiplexer;
pub mod poll;
pub mod report;
pub mod thermocouple;
