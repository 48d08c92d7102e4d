//! House Price Prediction API Library
//!
//! This library provides the prediction pipeline behind the house price API:
//! artifact selection, feature derivation, the fitted preprocessor, model
//! scoring and the HTTP handlers that expose it.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core prediction pipeline.
//! - `obs`: Observability and logging.
//! - `artifact_store`: Locating and loading versioned artifacts.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `evaluate`: Offline regression metrics.
//! - `features`: Derived feature computation.
//! - `handlers`: HTTP request handlers and router.
//! - `inference`: The end-to-end prediction service.
//! - `models`: Request and response models.
//! - `preprocessing`: The fitted column transform.
//! - `regressor`: Tree ensemble scoring.

pub mod api;
pub mod core;
pub mod obs;

pub mod artifact_store;
pub mod config;
pub mod errors;
pub mod evaluate;
pub mod features;
pub mod handlers;
pub mod inference;
pub mod models;
pub mod preprocessing;
pub mod regressor;
