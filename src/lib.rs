//! Todo backend: JSON CRUD over a libSQL table.

pub mod config;
pub mod error;
pub mod store;
pub mod todos;
