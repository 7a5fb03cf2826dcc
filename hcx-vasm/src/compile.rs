//! Linearizer: block chains to one assembly program
//!
//! Traversal starts from every entry block (no predecessor) in creation
//! order and follows `next` links to the end of each chain, concatenating
//! each block's generated text. Blocks not reachable from any entry chain
//! contribute nothing. The sketch is never mutated.

use std::collections::HashSet;

use log::debug;

use crate::codegen::block_text;
use crate::error::Result;
use crate::registry::Registry;
use crate::sketch::Sketch;

/// Compile a sketch into its assembly text. An empty sketch is a valid
/// empty program. Any unresolved label aborts with no partial output.
pub fn compile(sketch: &Sketch, registry: &Registry) -> Result<String> {
    let mut program = String::new();
    let mut visited = HashSet::new();
    let mut emitted = 0usize;

    for entry in sketch.entries() {
        let mut cursor = Some(entry);
        while let Some(id) = cursor {
            // load-time validation rejects cycles; this guard is for graphs
            // assembled programmatically
            if !visited.insert(id) {
                break;
            }
            if let Some(kind) = sketch.kind(id) {
                program.push_str(&block_text(kind, registry)?);
                emitted += 1;
            }
            cursor = sketch.next(id);
        }
    }

    debug!("compiled {emitted} blocks into {} bytes", program.len());
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::{Arch, Condition, Mnemonic, Register as Reg};
    use crate::sketch::BlockKind;

    fn demo_sketch() -> (Sketch, Registry) {
        let mut sketch = Sketch::new(Arch::Hc4);
        let registry = Registry::new();
        let start = sketch
            .add(BlockKind::LabelDef { label: "START".into() })
            .unwrap();
        let ld = sketch
            .add(BlockKind::Register {
                mnemonic: Mnemonic::Ld,
                register: Reg::new(0).unwrap(),
            })
            .unwrap();
        let li = sketch
            .add(BlockKind::Immediate {
                mnemonic: Mnemonic::Li,
                value: 10,
            })
            .unwrap();
        let jump = sketch
            .add(BlockKind::GotoIf {
                flag: Condition::Zero,
                label: "START".into(),
            })
            .unwrap();
        sketch.link(start, ld).unwrap();
        sketch.link(ld, li).unwrap();
        sketch.link(li, jump).unwrap();
        (sketch, registry)
    }

    #[test]
    fn test_end_to_end_program() {
        let (sketch, registry) = demo_sketch();
        let program = compile(&sketch, &registry).unwrap();
        assert_eq!(
            program,
            "START:\nLD R0\nLI #10\nLI #START:2\nLI #START:1\nLI #START:0\nJP Z\n"
        );
    }

    #[test]
    fn test_compile_is_idempotent() {
        let (sketch, registry) = demo_sketch();
        let first = compile(&sketch, &registry).unwrap();
        let second = compile(&sketch, &registry).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_sketch_is_empty_program() {
        let sketch = Sketch::new(Arch::Hc4);
        let registry = Registry::new();
        assert_eq!(compile(&sketch, &registry).unwrap(), "");
    }

    #[test]
    fn test_unreachable_blocks_contribute_nothing() {
        let (mut sketch, registry) = demo_sketch();
        // a two-block loop has no entry, so no chain ever reaches it
        let x = sketch
            .add(BlockKind::NoArg { mnemonic: Mnemonic::Np })
            .unwrap();
        let y = sketch
            .add(BlockKind::NoArg { mnemonic: Mnemonic::Np })
            .unwrap();
        sketch.link(x, y).unwrap();
        sketch.link(y, x).unwrap();

        let program = compile(&sketch, &registry).unwrap();
        assert_eq!(
            program,
            "START:\nLD R0\nLI #10\nLI #START:2\nLI #START:1\nLI #START:0\nJP Z\n"
        );
    }

    #[test]
    fn test_chains_emit_in_creation_order() {
        let mut sketch = Sketch::new(Arch::Hc4);
        let registry = Registry::new();
        // two single-block chains; the older block leads
        sketch
            .add(BlockKind::NoArg { mnemonic: Mnemonic::Np })
            .unwrap();
        sketch
            .add(BlockKind::Register {
                mnemonic: Mnemonic::Ad,
                register: Reg::new(1).unwrap(),
            })
            .unwrap();
        assert_eq!(compile(&sketch, &registry).unwrap(), "NP\nAD R1\n");
    }

    #[test]
    fn test_unresolved_label_aborts_whole_compile() {
        let (mut sketch, registry) = demo_sketch();
        sketch
            .add(BlockKind::Goto { label: "MISSING".into() })
            .unwrap();
        let err = compile(&sketch, &registry).unwrap_err();
        assert!(matches!(
            err,
            crate::error::VasmError::UnresolvedLabel { .. }
        ));
    }
}
