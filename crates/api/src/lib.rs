//! HTTP API for the freezer inventory: routing, configuration and
//! request/response mapping.

pub mod app;
pub mod config;
