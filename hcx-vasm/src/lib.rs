//! # HCx Visual Assembler Core
//!
//! Compiles a sketch, the block graph built in the HCx visual editor,
//! into linear assembly text for the HC4 family of educational CPUs, and
//! drives the external `hcxasm`/`hcxprog` toolchain on the result.
//!
//! Each block is one statement: a plain instruction, a jump pseudo-op or a
//! label definition. Jump targets are symbolic labels kept in a per-session
//! registry; a jump block expands to three `LI #LABEL:k` address-byte loads
//! plus the `JP`, and the numeric addresses are resolved later by `hcxasm`.
//!
//! ## Example
//!
//! ```rust
//! use hcx_vasm::{Arch, BlockKind, Mnemonic, Register, Registry, Sketch};
//!
//! fn main() -> Result<(), hcx_vasm::VasmError> {
//!     let mut sketch = Sketch::new(Arch::Hc4);
//!     let registry = Registry::new();
//!
//!     let start = sketch.add(BlockKind::LabelDef { label: "START".into() })?;
//!     let load = sketch.add(BlockKind::Register {
//!         mnemonic: Mnemonic::Ld,
//!         register: Register::new(0)?,
//!     })?;
//!     let jump = sketch.add(BlockKind::Goto { label: "START".into() })?;
//!     sketch.link(start, load)?;
//!     sketch.link(load, jump)?;
//!
//!     let program = hcx_vasm::compile(&sketch, &registry)?;
//!     assert_eq!(
//!         program,
//!         "START:\nLD R0\nLI #START:2\nLI #START:1\nLI #START:0\nJP\n"
//!     );
//!     Ok(())
//! }
//! ```

pub mod bkend;
pub mod bkend_hcxasm;
pub mod codegen;
pub mod compile;
pub mod editor;
pub mod error;
pub mod isa;
pub mod registry;
pub mod sketch;
pub mod upload;
pub mod workspace;

pub use bkend::{AssembleOptions, AssembleOutput, AssemblerBackend, OutputFormat};
pub use bkend_hcxasm::HcxasmBackend;
pub use compile::compile;
pub use editor::{LabelChoice, LabelEditor};
pub use error::{Result, VasmError};
pub use isa::{Arch, Condition, Mnemonic, Register};
pub use registry::{LabelOptions, Registration, Registry};
pub use sketch::{BlockId, BlockKind, Sketch};
pub use upload::{HcxprogProgrammer, Programmer};
pub use workspace::Workspace;

/// Compile a sketch file to assembly text.
pub fn compile_sketch_file<P: AsRef<std::path::Path>>(sketch_path: P) -> Result<String> {
    let (sketch, registry) = Sketch::load(sketch_path)?;
    compile(&sketch, &registry)
}

/// Compile a sketch file and write the assembly to `asm_path`. Returns the
/// number of bytes written.
pub fn compile_file_to_asm<P: AsRef<std::path::Path>, Q: AsRef<std::path::Path>>(
    sketch_path: P,
    asm_path: Q,
) -> Result<usize> {
    let text = compile_sketch_file(sketch_path)?;
    std::fs::write(&asm_path, &text)?;
    Ok(text.len())
}

/// Compile a sketch file to a sibling `.asm` file.
pub fn compile_file_auto<P: AsRef<std::path::Path>>(
    sketch_path: P,
) -> Result<(std::path::PathBuf, usize)> {
    let sketch_path = sketch_path.as_ref();
    let asm_path = sketch_path.with_extension("asm");
    let size = compile_file_to_asm(sketch_path, &asm_path)?;
    Ok((asm_path, size))
}

/// Compile a sketch file and assemble it with `hcxasm` into `output_path`,
/// using the sketch's own architecture and the format implied by the output
/// extension. The intermediate assembly is left next to the output, so an
/// `output_path` ending in `.asm` is rejected.
pub fn assemble_sketch_file<P: AsRef<std::path::Path>, Q: AsRef<std::path::Path>>(
    sketch_path: P,
    output_path: Q,
) -> Result<AssembleOutput> {
    let (sketch, registry) = Sketch::load(sketch_path)?;
    let text = compile(&sketch, &registry)?;
    let options = AssembleOptions::new(sketch.arch(), &output_path);
    let asm_path = options.output_path.with_extension("asm");
    if asm_path == options.output_path {
        return Err(VasmError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("output {asm_path:?} collides with the intermediate assembly"),
        )));
    }
    std::fs::write(&asm_path, &text)?;
    HcxasmBackend.assemble(&asm_path, &options)
}
