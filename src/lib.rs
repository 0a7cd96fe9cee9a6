//! Torrent release discovery for anime indexes
//!
//! Providers search remote indexes, normalize feed and curated records into
//! [`indexer::Release`]s, and can synthesize boolean search queries from
//! structured media metadata.

pub mod cli;
pub mod config;
pub mod indexer;
pub mod services;
