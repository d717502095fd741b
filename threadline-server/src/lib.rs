pub mod app_state;
pub mod auth;
pub mod db;
pub mod handlers;
pub mod http;
pub mod middleware;
pub mod server;
pub mod services;
mod tracer;
