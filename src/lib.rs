pub mod access;
pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod validation;

#[cfg(test)]
pub mod testing;
