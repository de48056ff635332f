//! Core SearchMIW client library (session, API access, domain services, config).

pub mod api;
pub mod config;
pub mod logging;
pub mod services;
pub mod session;
