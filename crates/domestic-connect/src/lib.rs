//! Core of the Domestic Connect marketplace: account sessions, the profile
//! directory with its filter engine, and the M-Pesa payment flow.

pub mod backend;
pub mod config;
pub mod error;
pub mod marketplace;
pub mod notifications;
pub mod telemetry;
