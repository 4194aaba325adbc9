//! Core domain + application logic for the embed-link rewriting bot.
//!
//! This crate is intentionally framework-agnostic. Discord (or any other chat
//! platform) lives behind the `ChatPort` trait implemented in adapter crates.

pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod links;
pub mod logging;
pub mod messaging;
pub mod settings;

pub use errors::{Error, Result};
