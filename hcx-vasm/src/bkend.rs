//! External assembler backend interface
//!
//! Machine-code encoding is not done in this crate: compiled text is handed
//! to an external assembler tool. Backends adapt one such tool behind a
//! common trait.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::isa::Arch;

/// Artifact encoding the external assembler should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Raw binary image (the tool's default; no format flag is passed).
    #[default]
    Binary,
    /// Intel HEX
    Ihex,
    /// Verilog hex memory image
    Vhex,
    /// Human-readable listing
    Text,
}

impl OutputFormat {
    /// Format name as the external assembler's `-f` argument.
    pub fn tool_tag(&self) -> &'static str {
        match self {
            OutputFormat::Binary => "binary",
            OutputFormat::Ihex => "ihex",
            OutputFormat::Vhex => "vhex",
            OutputFormat::Text => "text",
        }
    }

    /// Format implied by an output file name: `.hex` means Intel HEX,
    /// `.txt` a listing, anything else the raw binary.
    pub fn from_extension<P: AsRef<Path>>(path: P) -> OutputFormat {
        match path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("hex") => OutputFormat::Ihex,
            Some("txt") => OutputFormat::Text,
            _ => OutputFormat::Binary,
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "binary" => Ok(OutputFormat::Binary),
            "ihex" => Ok(OutputFormat::Ihex),
            "vhex" => Ok(OutputFormat::Vhex),
            "text" => Ok(OutputFormat::Text),
            other => Err(format!(
                "unknown format '{other}' (expected binary, ihex, vhex or text)"
            )),
        }
    }
}

/// How one assembler run should behave.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    pub arch: Arch,
    pub format: OutputFormat,
    pub output_path: PathBuf,
}

impl AssembleOptions {
    /// Options for `output_path`, with the format taken from its extension.
    pub fn new<P: AsRef<Path>>(arch: Arch, output_path: P) -> Self {
        AssembleOptions {
            arch,
            format: OutputFormat::from_extension(&output_path),
            output_path: output_path.as_ref().to_path_buf(),
        }
    }
}

/// What a successful assembler run produced.
#[derive(Debug, Clone, Default)]
pub struct AssembleOutput {
    pub output_path: PathBuf,
    pub stdout: String,
}

pub trait AssemblerBackend {
    fn name(&self) -> &'static str;
    /// Assemble the text at `asm_path` into the artifact the options name.
    fn assemble(&self, asm_path: &Path, options: &AssembleOptions) -> Result<AssembleOutput>;
}
