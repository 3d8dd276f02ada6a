//! Parley - a small HTTP/1.1 server for chat completions.
//!
//! Core library: the HTTP engine, the connection pool, and the chat and
//! admin handlers mounted on it.

pub mod admin;
pub mod app;
pub mod chat;
pub mod config;
pub mod http;
pub mod logging;
pub mod security;
pub mod server;
