//! Property ledger: REST backend for properties, buildings and units, plus the
//! wizard-side client that drives property creation against it.

pub mod api;
pub mod app;
pub mod client;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod services;
