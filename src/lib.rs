//! BLE sensor service library.
//!
//! Exposes sensor readings over an attribute-based notification channel,
//! sampled periodically or on change according to a client-written
//! measurement period.

pub mod config;
pub mod error;
pub mod sensors;
pub mod service;
pub mod simulation;
