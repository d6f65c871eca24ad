//! Library exports for sessiongate, shared between the binary and tests.

pub mod config;
pub mod guard;
pub mod identity;
pub mod models;
pub mod routes;
pub mod session;
pub mod startup;
pub mod state;
pub mod utils;
