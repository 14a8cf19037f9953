//! # showring
//!
//! Live reconciliation of a horse-show ring schedule against its trip feed.
//!
//! Two JSON feeds are polled: a schedule feed (rings, class groups, classes,
//! times) and a trips feed (one row per participant run). This crate
//! normalizes both, rebuilds a ring/group/class hierarchy, applies the
//! follow-set and status filters, and serves the result over a REST API.
//!
//! ## Architecture
//!
//! - [`models`]: canonical records, identifier keys, feed envelopes, clock parsing
//! - [`ingest`]: alias ladders and the normalizer that turns raw rows into records
//! - [`engine`]: hierarchy, inclusion policy, aggregates, representatives, peak, follow set, views
//! - [`services`]: the live board, feed client, poller, refresh log
//! - [`db`]: follow-set persistence behind the repository pattern
//! - [`config`]: `showring.toml` and environment overrides
//! - [`http`]: axum router and handlers

// Allow large error types - RepositoryError carries rich context for logging
#![allow(clippy::result_large_err)]

pub mod config;
pub mod db;
pub mod engine;
pub mod ingest;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
