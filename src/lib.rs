//! statgraph - Field-Resolving Aggregation Cache for US State Statistics
//!
//! statgraph sits between a field-selecting query surface and the slow,
//! rate-limited DataUSA statistics API. It lazily fetches per-state datasets
//! (commute times, commute methods, college concentrations), caches them
//! in memory for the process lifetime, and serves filtered views of them
//! through a single resolve entry point.
//!
//! # Architecture
//!
//! - **model**: Normalized record types (State, CommuteTime, CommuteMethod, Concentration)
//! - **source**: Remote source adapter contract and the DataUSA implementation
//! - **cache**: State catalog and per-kind sub-resource caches (single-flight, cache-aside)
//! - **resolve**: Query resolution engine composing the result graph
//! - **stats**: Consumer-side derived aggregations
//! - **web**: Thin HTTP transport over the resolution engine
//! - **config**: YAML configuration

// Core modules
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod resolve;
pub mod source;
pub mod stats;

// Transport and support
pub mod logging;
pub mod web;

// Re-exports
pub use error::{Result, StatGraphError};
