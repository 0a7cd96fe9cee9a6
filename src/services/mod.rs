//! Supporting services shared by the providers and the binary

pub mod filename_parser;
pub mod logging;
pub mod text_utils;

pub use filename_parser::AnimeReleaseParser;
