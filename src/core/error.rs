use crate::buffers::BufferState;
use thiserror::Error;

/// Errors raised by the node invocation core.
///
/// A cache miss is deliberately absent: it is not an error and never
/// leaves the invocation pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No strategy pipeline / factory registered for this configuration code.
    #[error("ConfigSelector: no preconfigured factory for config-bits={}", config_bits(.code))]
    InvalidConfig { code: u8 },

    /// Port layout or connection that cannot be wired.
    #[error("invalid wiring: {0}")]
    Wiring(String),

    #[error("buffer table overflow: {requested} slots requested at level {level}, capacity {capacity}")]
    TableOverflow {
        requested: usize,
        level: usize,
        capacity: usize,
    },

    /// Access through a released or never locked buffer handle.
    #[error("access through an invalid buffer handle")]
    InvalidHandle,

    #[error("illegal buffer state transition {from:?} -> {to:?}")]
    Lifecycle { from: BufferState, to: BufferState },

    #[error("buffer management: {0}")]
    BufferManagement(String),

    /// Violated internal sequencing of the invocation pipeline.
    #[error("invocation logic: {0}")]
    Logic(&'static str),

    #[error("processing failed in {node}: {cause:#}")]
    Processing { node: String, cause: anyhow::Error },
}

pub type Result<T> = std::result::Result<T, EngineError>;

fn config_bits(code: &u8) -> String {
    format!("{:03b}", code)
}
