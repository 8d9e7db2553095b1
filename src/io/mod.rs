//! File output for episode records.

pub mod export;
