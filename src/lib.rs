//! Org Onboarding: headless client for the five-step organization wizard.

pub mod config;
pub mod directory;
pub mod error;
pub mod gateway;
pub mod persistence;
pub mod store;
pub mod wizard;

pub use error::{Error, Result};
