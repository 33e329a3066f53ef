//! Streaming (online) separation.

pub mod processor;

pub use processor::StreamingSeparator;
