//! Utility functions for ryt-js

pub mod cache;
pub mod splitter;

pub use cache::*;
pub use splitter::*;
