#![doc = "trend-digest-core: core pipeline library for trend-digest."]

//! This crate contains the full aggregation pipeline: source clients for the
//! GitHub search API and the community awesome-mcp-servers list, and the
//! aggregator that merges both into a rendered markdown trend report.
//!
//! # Usage
//! Construct a [`config::DigestConfig`] at the edge of your program (CLI,
//! tool server, test harness) and hand it to
//! [`aggregate::TrendAggregator::from_config`]. All network access and all
//! report state lives within a single call; nothing is retained in between.

pub mod aggregate;
pub mod config;
pub mod contract;
pub mod curated;
pub mod github;
