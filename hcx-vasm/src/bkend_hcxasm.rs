//! Backend for the `hcxasm` assembler
//!
//! Invokes the HCx toolchain assembler as an external process:
//! `hcxasm <input.asm> -o <output> -a <ARCH> [-f <format>]`. A native
//! `hcxasm` on PATH is preferred; the Python distribution of the tool is
//! used as a fallback when an `hcxasm.py` sits in the working directory.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use crate::bkend::{AssembleOptions, AssembleOutput, AssemblerBackend, OutputFormat};
use crate::error::{Result, VasmError};

const TOOL: &str = "hcxasm";

fn backend_err(message: String) -> VasmError {
    VasmError::Backend {
        tool: TOOL.to_string(),
        message,
    }
}

/// Resolve the program and leading arguments that run `hcxasm`.
fn hcxasm_invocation() -> Result<(PathBuf, Vec<OsString>)> {
    if let Ok(path) = which::which(TOOL) {
        return Ok((path, Vec::new()));
    }
    let script = Path::new("hcxasm.py");
    if script.exists() {
        let python = which::which("python3")
            .or_else(|_| which::which("py"))
            .map_err(|_| VasmError::ToolNotFound {
                tool: TOOL.to_string(),
            })?;
        return Ok((python, vec![script.as_os_str().to_os_string()]));
    }
    Err(VasmError::ToolNotFound {
        tool: TOOL.to_string(),
    })
}

pub struct HcxasmBackend;

impl AssemblerBackend for HcxasmBackend {
    fn name(&self) -> &'static str {
        TOOL
    }

    fn assemble(&self, asm_path: &Path, options: &AssembleOptions) -> Result<AssembleOutput> {
        let (program, mut args) = hcxasm_invocation()?;
        args.push(asm_path.as_os_str().to_os_string());
        args.push("-o".into());
        args.push(options.output_path.as_os_str().to_os_string());
        args.push("-a".into());
        args.push(options.arch.tool_tag().into());
        if options.format != OutputFormat::Binary {
            args.push("-f".into());
            args.push(options.format.tool_tag().into());
        }
        debug!("running {} {:?}", program.display(), args);

        let output = Command::new(&program)
            .args(&args)
            .output()
            .map_err(|e| backend_err(format!("failed to spawn {}: {e}", program.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() {
                String::from_utf8_lossy(&output.stdout).into_owned()
            } else {
                stderr.into_owned()
            };
            return Err(backend_err(format!("exit {}: {}", output.status, detail.trim())));
        }

        info!(
            "assembled {} -> {}",
            asm_path.display(),
            options.output_path.display()
        );
        Ok(AssembleOutput {
            output_path: options.output_path.clone(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}
