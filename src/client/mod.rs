//! # Client
//!
//! `Firestore`, the public entry point, and its configuration.

pub mod config;
pub mod firestore;

pub use config::{ClientConfig, EMULATOR_HOST_ENV, PRODUCTION_BASE_URL, PROJECT_ID_ENVS};
pub use firestore::Firestore;
