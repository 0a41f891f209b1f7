pub mod actions;
pub mod app;
pub mod auth;
pub mod channels;
pub mod client;
pub mod config;
pub mod input;
pub mod logging;
pub mod models;
pub mod profile;
pub mod session;
pub mod transport;
pub mod ui;
