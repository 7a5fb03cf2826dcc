//! Device upload through the `hcxprog` programmer
//!
//! Transfers an assembled image to a connected HCx board:
//! `hcxprog <image> -p <port>`. Port discovery and selection belong to the
//! caller; only the chosen port name travels through here. The transfer
//! protocol itself lives entirely in the external tool.

use std::path::Path;
use std::process::Command;

use log::info;

use crate::error::{Result, VasmError};

pub trait Programmer {
    fn name(&self) -> &'static str;
    /// Send `image_path` to the device on `port`. Returns the tool's stdout.
    fn upload(&self, image_path: &Path, port: &str) -> Result<String>;
}

const TOOL: &str = "hcxprog";

pub struct HcxprogProgrammer;

impl Programmer for HcxprogProgrammer {
    fn name(&self) -> &'static str {
        TOOL
    }

    fn upload(&self, image_path: &Path, port: &str) -> Result<String> {
        let program = which::which(TOOL).map_err(|_| VasmError::ToolNotFound {
            tool: TOOL.to_string(),
        })?;
        let output = Command::new(&program)
            .arg(image_path)
            .arg("-p")
            .arg(port)
            .output()
            .map_err(|e| VasmError::Backend {
                tool: TOOL.to_string(),
                message: format!("failed to spawn {}: {e}", program.display()),
            })?;

        if !output.status.success() {
            return Err(VasmError::Backend {
                tool: TOOL.to_string(),
                message: format!(
                    "exit {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        info!("uploaded {} via {port}", image_path.display());
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
