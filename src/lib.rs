//! Library crate for tcp-sweep-rs exposing the scan engine and its collaborators.
pub mod error;
pub mod monitor;
pub mod ports;
pub mod probe;
pub mod resolve;
pub mod scanner;
pub mod state;
pub mod types;
