//! HTTP API: server, routing, and request/response mapping for job statuses.

pub mod app;
pub mod config;
pub mod context;
pub mod controller;
pub mod middleware;
