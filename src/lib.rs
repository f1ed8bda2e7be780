//! # Match Analytics
//!
//! Analytics engine for recorded matches of a round-based hero shooter.
//!
//! ## Architecture
//!
//! - **models**: Telemetry records (snapshot rows, kills, ultimates, rounds) and derived results
//! - **calculate**: Normalization, fight segmentation, ratings, MVP and combat metrics
//! - **cache**: Request-scoped memoization
//! - **storage**: Telemetry store contract, JSONL data lake and in-memory store
//! - **pipeline**: Per-request orchestration over a telemetry store
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod cache;
pub mod calculate;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod storage;

pub use models::*;
