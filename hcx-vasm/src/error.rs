//! Error types for the HCx visual assembler

use thiserror::Error;

/// Errors that can occur while loading, compiling or assembling a sketch
#[derive(Error, Debug)]
pub enum VasmError {
    #[error("Unresolved label: {label}")]
    UnresolvedLabel { label: String },

    #[error("Malformed sketch: {message}")]
    MalformedSketch { message: String },

    #[error("Unknown mnemonic for {arch}: {name}")]
    UnknownMnemonic { name: String, arch: String },

    #[error("Unsupported sketch version: {version}")]
    UnsupportedVersion { version: u32 },

    #[error("Tool not found in PATH: {tool}")]
    ToolNotFound { tool: String },

    #[error("{tool} failed: {message}")]
    Backend { tool: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sketch JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for sketch operations
pub type Result<T> = std::result::Result<T, VasmError>;
