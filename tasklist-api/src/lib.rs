//! # Tasklist API Server Library
//!
//! Core functionality for the tasklist HTTP server.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and envelope mapping
//! - `extract`: Request extractors with envelope-shaped rejections
//! - `middleware`: Authentication gate and security headers
//! - `response`: The `{success, data, message}` response envelope
//! - `routes`: Route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;
pub mod routes;
