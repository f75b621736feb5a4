//! `TaskDeck` terminal task client library.

pub mod config;
pub mod gateway;
pub mod store;
pub mod sync;
