//! Core business logic module

pub mod error;
pub mod flag_store;
pub mod handover;
pub mod runner;
pub mod service;
pub mod types;
