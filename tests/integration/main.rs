//! Integration tests running assembled statements against in-memory SQLite

mod filters;
mod fixtures;
mod hydration;
mod joins;
mod union;
