use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use hcx_vasm::{
    AssembleOptions, AssemblerBackend, HcxasmBackend, HcxprogProgrammer, OutputFormat, Programmer,
    Workspace,
};

/// HCx sketch compiler
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Sketch file to compile (.vasm)
    sketch: PathBuf,

    /// Write the generated assembly to this file instead of stdout
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Assemble the generated text with hcxasm into this artifact
    #[clap(long, value_name = "FILE")]
    assemble: Option<PathBuf>,

    /// Artifact format (binary, ihex, vhex, text); defaults to the
    /// artifact's extension
    #[clap(long)]
    format: Option<OutputFormat>,

    /// Upload the assembled artifact to a connected board
    #[clap(long)]
    upload: bool,

    /// Serial port for --upload
    #[clap(long)]
    port: Option<String>,
}

fn main() -> Result<()> {
    let env = env_logger::Env::default()
        .filter_or("HCX_LOG", "info")
        .write_style_or("HCX_LOG", "always");
    env_logger::init_from_env(env);

    let args = Args::parse();
    let workspace = Workspace::open(&args.sketch)
        .with_context(|| format!("failed to open {:?}", args.sketch))?;
    let text = workspace.assembly().context("failed to compile sketch")?;
    info!(
        "compiled {:?}: {} blocks, {} labels",
        args.sketch,
        workspace.sketch().len(),
        workspace.registry().len()
    );

    let asm_path = match &args.output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("failed to write {path:?}"))?;
            info!("wrote assembly to {path:?}");
            Some(path.clone())
        }
        None => None,
    };
    if asm_path.is_none() && args.assemble.is_none() {
        print!("{text}");
    }

    let artifact = match &args.assemble {
        Some(artifact) => {
            // hcxasm reads its input from a file; without -o the text goes
            // through a scratch file that is removed after the run
            let (asm_path, _scratch) = match asm_path {
                Some(path) => {
                    if &path == artifact {
                        bail!(
                            "--assemble target {artifact:?} would overwrite \
                             the assembly written by --output"
                        );
                    }
                    (path, None)
                }
                None => {
                    let mut scratch = tempfile::Builder::new()
                        .prefix("hcx-vasm")
                        .suffix(".asm")
                        .tempfile()
                        .context("failed to stage assembly text")?;
                    scratch
                        .write_all(text.as_bytes())
                        .with_context(|| format!("failed to write {:?}", scratch.path()))?;
                    (scratch.path().to_path_buf(), Some(scratch))
                }
            };
            let options = AssembleOptions {
                arch: workspace.arch(),
                format: args
                    .format
                    .unwrap_or_else(|| OutputFormat::from_extension(artifact)),
                output_path: artifact.clone(),
            };
            let backend = HcxasmBackend;
            let result = backend
                .assemble(&asm_path, &options)
                .with_context(|| format!("{} failed on {asm_path:?}", backend.name()))?;
            if !result.stdout.trim().is_empty() {
                print!("{}", result.stdout);
            }
            Some(result.output_path)
        }
        None => None,
    };

    if args.upload {
        let Some(artifact) = artifact else {
            bail!("--upload requires --assemble");
        };
        let Some(port) = &args.port else {
            bail!("--upload requires --port");
        };
        let programmer = HcxprogProgrammer;
        let stdout = programmer
            .upload(&artifact, port)
            .with_context(|| format!("{} failed on {artifact:?}", programmer.name()))?;
        if !stdout.trim().is_empty() {
            print!("{stdout}");
        }
    }

    Ok(())
}
