pub mod account;
pub mod action;
pub mod chat;
pub mod code;
pub mod config;
pub mod error;
pub mod export;
pub mod io;
pub mod paths;
pub mod preview;
pub mod project;
pub mod simulation;
pub mod store;
pub mod task;
pub mod types;

pub use error::{DevflowError, Result};
