// ABOUTME: Library module for dlt-replica-identity
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod commands;
pub mod config;
pub mod error;
pub mod identity;
pub mod pipeline;
pub mod postgres;
pub mod schema;
pub mod utils;
