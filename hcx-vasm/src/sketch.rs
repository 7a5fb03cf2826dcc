//! Block graph model and sketch-file persistence
//!
//! A sketch is the set of statement blocks the visual editor holds: each
//! block is one instruction, jump pseudo-op or label definition, chained to
//! at most one predecessor and one successor. Blocks live in a slot arena so
//! ids stay stable across removals; creation order is slot order.
//!
//! The on-disk form (`.vasm`) is a small JSON document carrying the target
//! architecture, the session's labels and the block chains. Loading
//! validates the document shape up front so later compilation only has to
//! deal with well-formed graphs.

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VasmError};
use crate::isa::{Arch, Condition, Mnemonic, OperandShape, Register};
use crate::registry::Registry;

/// Current sketch-file format version.
pub const SKETCH_VERSION: u32 = 1;

/// Upper bound on block slots; the CPUs address far less program memory
/// than this, so a larger id space can only come from a corrupt file.
const MAX_BLOCK_SLOTS: usize = 65536;

/// Stable handle to a block slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u32);

impl BlockId {
    pub fn from_raw(raw: u32) -> Self {
        BlockId(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }

    fn index(&self) -> usize {
        self.0 as usize
    }
}

/// What one block means. Serialized form uses a `type` tag matching the
/// sketch-file block names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    /// Bare mnemonic (`SM`, `LM`, `NP`).
    NoArg { mnemonic: Mnemonic },
    /// Mnemonic plus register operand (`LD R0`).
    Register {
        mnemonic: Mnemonic,
        register: Register,
    },
    /// Mnemonic plus 8-bit immediate (`LI #10`).
    Immediate { mnemonic: Mnemonic, value: u8 },
    /// Raw jump primitive with an optional condition (`JP`, `JP Z`).
    FlagJump {
        mnemonic: Mnemonic,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        flag: Option<Condition>,
    },
    /// Unconditional jump to a registered label.
    Goto { label: String },
    /// Conditional jump to a registered label.
    GotoIf { flag: Condition, label: String },
    /// Jump-target definition (`START:`).
    LabelDef { label: String },
}

impl BlockKind {
    /// Label field of this block, when it has one.
    pub fn label(&self) -> Option<&str> {
        match self {
            BlockKind::Goto { label }
            | BlockKind::GotoIf { label, .. }
            | BlockKind::LabelDef { label } => Some(label),
            _ => None,
        }
    }

    fn label_mut(&mut self) -> Option<&mut String> {
        match self {
            BlockKind::Goto { label }
            | BlockKind::GotoIf { label, .. }
            | BlockKind::LabelDef { label } => Some(label),
            _ => None,
        }
    }

    /// Check that the mnemonic belongs to `arch` and agrees with the
    /// block's operand form. Jump pseudo-ops and label definitions carry no
    /// mnemonic; they expand to `LI`/`JP`, present in every architecture.
    fn validate(&self, arch: Arch) -> Result<()> {
        let (mnemonic, expected) = match self {
            BlockKind::NoArg { mnemonic } => (*mnemonic, OperandShape::None),
            BlockKind::Register { mnemonic, .. } => (*mnemonic, OperandShape::Register),
            BlockKind::Immediate { mnemonic, .. } => (*mnemonic, OperandShape::Immediate),
            BlockKind::FlagJump { mnemonic, .. } => (*mnemonic, OperandShape::OptionalFlag),
            _ => return Ok(()),
        };
        if !arch.supports(mnemonic) {
            return Err(VasmError::UnknownMnemonic {
                name: mnemonic.to_string(),
                arch: arch.to_string(),
            });
        }
        if mnemonic.shape() != expected {
            return Err(VasmError::MalformedSketch {
                message: format!("{mnemonic} does not take this operand form"),
            });
        }
        Ok(())
    }

    fn normalize_label(&mut self) {
        if let Some(label) = self.label_mut() {
            *label = Registry::normalize(label);
        }
    }
}

#[derive(Debug, Clone)]
struct Block {
    kind: BlockKind,
    prev: Option<BlockId>,
    next: Option<BlockId>,
}

/// The block graph of one workspace.
#[derive(Debug, Clone)]
pub struct Sketch {
    arch: Arch,
    slots: Vec<Option<Block>>,
}

impl Sketch {
    pub fn new(arch: Arch) -> Self {
        Sketch {
            arch,
            slots: Vec::new(),
        }
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// Add an unlinked block. Labels are normalized on the way in.
    pub fn add(&mut self, mut kind: BlockKind) -> Result<BlockId> {
        kind.validate(self.arch)?;
        kind.normalize_label();
        let id = BlockId(self.slots.len() as u32);
        self.slots.push(Some(Block {
            kind,
            prev: None,
            next: None,
        }));
        Ok(id)
    }

    fn block(&self, id: BlockId) -> Option<&Block> {
        self.slots.get(id.index()).and_then(|slot| slot.as_ref())
    }

    fn block_mut(&mut self, id: BlockId) -> Result<&mut Block> {
        self.slots
            .get_mut(id.index())
            .and_then(|slot| slot.as_mut())
            .ok_or_else(|| VasmError::MalformedSketch {
                message: format!("no block with id {}", id.raw()),
            })
    }

    pub fn kind(&self, id: BlockId) -> Option<&BlockKind> {
        self.block(id).map(|b| &b.kind)
    }

    pub fn next(&self, id: BlockId) -> Option<BlockId> {
        self.block(id).and_then(|b| b.next)
    }

    pub fn prev(&self, id: BlockId) -> Option<BlockId> {
        self.block(id).and_then(|b| b.prev)
    }

    /// Number of live blocks.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live block ids in creation order.
    pub fn blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| BlockId(i as u32))
    }

    /// Chain heads: blocks with no predecessor, in creation order.
    pub fn entries(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| matches!(slot, Some(b) if b.prev.is_none()))
            .map(|(i, _)| BlockId(i as u32))
    }

    /// Chain `from -> to`. Both ends must be free on the joining side.
    pub fn link(&mut self, from: BlockId, to: BlockId) -> Result<()> {
        if from == to {
            return Err(VasmError::MalformedSketch {
                message: format!("block {} cannot follow itself", from.raw()),
            });
        }
        if self.block(from).is_none() || self.block(to).is_none() {
            return Err(VasmError::MalformedSketch {
                message: format!("link {} -> {} names a missing block", from.raw(), to.raw()),
            });
        }
        if self.next(from).is_some() {
            return Err(VasmError::MalformedSketch {
                message: format!("block {} already has a successor", from.raw()),
            });
        }
        if self.prev(to).is_some() {
            return Err(VasmError::MalformedSketch {
                message: format!("block {} already has a predecessor", to.raw()),
            });
        }
        self.block_mut(from)?.next = Some(to);
        self.block_mut(to)?.prev = Some(from);
        Ok(())
    }

    /// Break the link after `id`, if any. The detached tail becomes its own
    /// entry chain.
    pub fn unlink_next(&mut self, id: BlockId) -> Result<()> {
        let next = self.next(id);
        if let Some(next) = next {
            self.block_mut(id)?.next = None;
            self.block_mut(next)?.prev = None;
        }
        Ok(())
    }

    /// Remove a block. Neighbors are disconnected, not bridged: the
    /// predecessor chain ends where the block was, and the trailing chain
    /// becomes its own entry chain.
    pub fn remove(&mut self, id: BlockId) -> Result<()> {
        let block = self
            .slots
            .get_mut(id.index())
            .and_then(|slot| slot.take())
            .ok_or_else(|| VasmError::MalformedSketch {
                message: format!("no block with id {}", id.raw()),
            })?;
        if let Some(prev) = block.prev {
            self.block_mut(prev)?.next = None;
        }
        if let Some(next) = block.next {
            self.block_mut(next)?.prev = None;
        }
        Ok(())
    }

    /// Overwrite a label-bearing block's label field (normalized). Used by
    /// the selection/editor write-back path.
    pub fn set_label(&mut self, id: BlockId, label: &str) -> Result<()> {
        let block = self.block_mut(id)?;
        match block.kind.label_mut() {
            Some(slot) => {
                *slot = Registry::normalize(label);
                Ok(())
            }
            None => Err(VasmError::MalformedSketch {
                message: format!("block {} has no label field", id.raw()),
            }),
        }
    }

    /// Serializable document for the current graph.
    pub fn to_doc(&self, registry: &Registry) -> SketchDoc {
        let blocks = self
            .blocks()
            .filter_map(|id| {
                self.block(id).map(|b| BlockDoc {
                    id: id.raw(),
                    kind: b.kind.clone(),
                    next: b.next.map(|n| n.raw()),
                })
            })
            .collect();
        SketchDoc {
            version: SKETCH_VERSION,
            architecture: self.arch,
            labels: registry.list().to_vec(),
            blocks,
        }
    }

    /// Rebuild a graph (and its registry) from a document, validating
    /// structure: ids unique, `next` references existing blocks, no block
    /// gains two predecessors, chains acyclic, mnemonics within the
    /// document's architecture.
    pub fn from_doc(doc: &SketchDoc) -> Result<(Sketch, Registry)> {
        if doc.version != SKETCH_VERSION {
            return Err(VasmError::UnsupportedVersion {
                version: doc.version,
            });
        }

        let mut registry = Registry::new();
        for label in &doc.labels {
            registry.register(label);
        }

        let capacity = doc
            .blocks
            .iter()
            .map(|b| b.id as usize + 1)
            .max()
            .unwrap_or(0);
        if capacity > MAX_BLOCK_SLOTS {
            return Err(VasmError::MalformedSketch {
                message: format!("block id space too large ({capacity} slots)"),
            });
        }
        let mut slots: Vec<Option<Block>> = vec![None; capacity];
        for block in &doc.blocks {
            block.kind.validate(doc.architecture)?;
            let slot = &mut slots[block.id as usize];
            if slot.is_some() {
                return Err(VasmError::MalformedSketch {
                    message: format!("duplicate block id {}", block.id),
                });
            }
            let mut kind = block.kind.clone();
            kind.normalize_label();
            if let Some(label) = kind.label() {
                registry.register(label);
            }
            *slot = Some(Block {
                kind,
                prev: None,
                next: None,
            });
        }

        let mut sketch = Sketch {
            arch: doc.architecture,
            slots,
        };

        for block in &doc.blocks {
            if let Some(next) = block.next {
                let from = BlockId(block.id);
                let to = BlockId(next);
                if sketch.block(to).is_none() {
                    return Err(VasmError::MalformedSketch {
                        message: format!("block {} links to missing block {next}", block.id),
                    });
                }
                // link() also rejects a second predecessor on `to`
                sketch.link(from, to)?;
            }
        }

        // Every acyclic chain is headed by an entry block, so anything an
        // entry walk cannot reach sits on a cycle.
        let mut visited = vec![false; sketch.slots.len()];
        let mut reached = 0usize;
        for entry in sketch.entries().collect::<Vec<_>>() {
            let mut cursor = Some(entry);
            while let Some(id) = cursor {
                if visited[id.index()] {
                    break;
                }
                visited[id.index()] = true;
                reached += 1;
                cursor = sketch.next(id);
            }
        }
        if reached != sketch.len() {
            return Err(VasmError::MalformedSketch {
                message: "block chain contains a cycle".to_string(),
            });
        }

        debug!(
            "loaded sketch: {} blocks, {} labels, arch {}",
            sketch.len(),
            registry.len(),
            sketch.arch
        );
        Ok((sketch, registry))
    }

    /// Write the sketch (and the registry's labels) as pretty JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P, registry: &Registry) -> Result<()> {
        let doc = self.to_doc(registry);
        let json = serde_json::to_string_pretty(&doc)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read and validate a sketch file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<(Sketch, Registry)> {
        let json = std::fs::read_to_string(path)?;
        let doc: SketchDoc = serde_json::from_str(&json)?;
        Sketch::from_doc(&doc)
    }
}

/// On-disk form of a sketch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SketchDoc {
    pub version: u32,
    pub architecture: Arch,
    pub labels: Vec<String>,
    pub blocks: Vec<BlockDoc>,
}

/// On-disk form of one block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDoc {
    pub id: u32,
    #[serde(flatten)]
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_block(mnemonic: Mnemonic, index: u8) -> BlockKind {
        BlockKind::Register {
            mnemonic,
            register: Register::new(index).unwrap(),
        }
    }

    #[test]
    fn test_add_and_chain() {
        let mut sketch = Sketch::new(Arch::Hc4);
        let a = sketch.add(BlockKind::LabelDef { label: "start".into() }).unwrap();
        let b = sketch.add(register_block(Mnemonic::Ld, 0)).unwrap();
        sketch.link(a, b).unwrap();

        assert_eq!(sketch.entries().collect::<Vec<_>>(), vec![a]);
        assert_eq!(sketch.next(a), Some(b));
        assert_eq!(sketch.prev(b), Some(a));
        // label normalized on entry
        assert_eq!(sketch.kind(a).unwrap().label(), Some("START"));
    }

    #[test]
    fn test_link_conflicts_rejected() {
        let mut sketch = Sketch::new(Arch::Hc4);
        let a = sketch.add(BlockKind::NoArg { mnemonic: Mnemonic::Np }).unwrap();
        let b = sketch.add(BlockKind::NoArg { mnemonic: Mnemonic::Np }).unwrap();
        let c = sketch.add(BlockKind::NoArg { mnemonic: Mnemonic::Np }).unwrap();
        sketch.link(a, b).unwrap();

        assert!(sketch.link(a, c).is_err()); // a already has a successor
        assert!(sketch.link(c, b).is_err()); // b already has a predecessor
        assert!(sketch.link(c, c).is_err());
    }

    #[test]
    fn test_unlink_next_splits_chain() {
        let mut sketch = Sketch::new(Arch::Hc4);
        let a = sketch.add(BlockKind::NoArg { mnemonic: Mnemonic::Np }).unwrap();
        let b = sketch.add(register_block(Mnemonic::Ld, 3)).unwrap();
        sketch.link(a, b).unwrap();

        sketch.unlink_next(a).unwrap();
        assert_eq!(sketch.next(a), None);
        assert_eq!(sketch.prev(b), None);
        assert_eq!(sketch.entries().count(), 2);
        // unlinking again is a no-op
        sketch.unlink_next(a).unwrap();
    }

    #[test]
    fn test_remove_disconnects_neighbors() {
        let mut sketch = Sketch::new(Arch::Hc4);
        let a = sketch.add(BlockKind::NoArg { mnemonic: Mnemonic::Np }).unwrap();
        let b = sketch.add(register_block(Mnemonic::Ad, 1)).unwrap();
        let c = sketch.add(BlockKind::NoArg { mnemonic: Mnemonic::Np }).unwrap();
        sketch.link(a, b).unwrap();
        sketch.link(b, c).unwrap();

        sketch.remove(b).unwrap();
        assert_eq!(sketch.len(), 2);
        assert_eq!(sketch.next(a), None);
        assert_eq!(sketch.prev(c), None);
        // both survivors are now entry chains
        assert_eq!(sketch.entries().count(), 2);
    }

    #[test]
    fn test_kind_validation_against_arch() {
        let mut sketch = Sketch::new(Arch::Hc4e);
        // SC is not part of the HC4E table
        let err = sketch.add(register_block(Mnemonic::Sc, 0)).unwrap_err();
        assert!(matches!(err, VasmError::UnknownMnemonic { .. }));
        // LI takes an immediate, not a register
        let err = sketch.add(register_block(Mnemonic::Li, 0)).unwrap_err();
        assert!(matches!(err, VasmError::MalformedSketch { .. }));
    }

    #[test]
    fn test_memory_ops_take_no_operand() {
        let mut sketch = Sketch::new(Arch::Hc4);
        // SM and LM use the implicit indirect address; the bare form is the
        // canonical block
        sketch.add(BlockKind::NoArg { mnemonic: Mnemonic::Sm }).unwrap();
        sketch.add(BlockKind::NoArg { mnemonic: Mnemonic::Lm }).unwrap();
        let err = sketch.add(register_block(Mnemonic::Sm, 3)).unwrap_err();
        assert!(matches!(err, VasmError::MalformedSketch { .. }));
        let err = sketch.add(register_block(Mnemonic::Lm, 3)).unwrap_err();
        assert!(matches!(err, VasmError::MalformedSketch { .. }));

        let registry = Registry::new();
        let program = crate::compile::compile(&sketch, &registry).unwrap();
        assert_eq!(program, "SM\nLM\n");
    }

    #[test]
    fn test_doc_round_trip() {
        let mut sketch = Sketch::new(Arch::Hc4);
        let a = sketch.add(BlockKind::LabelDef { label: "START".into() }).unwrap();
        let b = sketch
            .add(BlockKind::GotoIf { flag: Condition::Zero, label: "START".into() })
            .unwrap();
        sketch.link(a, b).unwrap();
        let registry = Registry::new();

        let doc = sketch.to_doc(&registry);
        let json = serde_json::to_string(&doc).unwrap();
        let parsed: SketchDoc = serde_json::from_str(&json).unwrap();
        let (rebuilt, rebuilt_registry) = Sketch::from_doc(&parsed).unwrap();

        assert_eq!(rebuilt.len(), 2);
        assert_eq!(rebuilt.entries().count(), 1);
        assert_eq!(rebuilt_registry.list(), registry.list());
    }

    #[test]
    fn test_doc_tag_shape() {
        let mut sketch = Sketch::new(Arch::Hc4);
        sketch.add(register_block(Mnemonic::Sc, 5)).unwrap();
        let json = serde_json::to_string(&sketch.to_doc(&Registry::new())).unwrap();
        assert!(json.contains("\"type\":\"register\""));
        assert!(json.contains("\"mnemonic\":\"SC\""));
        assert!(json.contains("\"register\":5"));
        assert!(json.contains("\"architecture\":\"HC4\""));
    }

    #[test]
    fn test_load_rejects_dangling_next() {
        let doc: SketchDoc = serde_json::from_str(
            r#"{ "version": 1, "architecture": "HC4", "labels": [],
                 "blocks": [ { "id": 0, "type": "no_arg", "mnemonic": "NP", "next": 9 } ] }"#,
        )
        .unwrap();
        let err = Sketch::from_doc(&doc).unwrap_err();
        assert!(matches!(err, VasmError::MalformedSketch { .. }));
    }

    #[test]
    fn test_load_rejects_double_predecessor() {
        let doc: SketchDoc = serde_json::from_str(
            r#"{ "version": 1, "architecture": "HC4", "labels": [],
                 "blocks": [
                   { "id": 0, "type": "no_arg", "mnemonic": "NP", "next": 2 },
                   { "id": 1, "type": "no_arg", "mnemonic": "NP", "next": 2 },
                   { "id": 2, "type": "no_arg", "mnemonic": "NP" } ] }"#,
        )
        .unwrap();
        let err = Sketch::from_doc(&doc).unwrap_err();
        assert!(matches!(err, VasmError::MalformedSketch { .. }));
    }

    #[test]
    fn test_load_rejects_cycle() {
        let doc: SketchDoc = serde_json::from_str(
            r#"{ "version": 1, "architecture": "HC4", "labels": [],
                 "blocks": [
                   { "id": 0, "type": "no_arg", "mnemonic": "NP", "next": 1 },
                   { "id": 1, "type": "no_arg", "mnemonic": "NP", "next": 0 } ] }"#,
        )
        .unwrap();
        let err = Sketch::from_doc(&doc).unwrap_err();
        assert!(matches!(err, VasmError::MalformedSketch { .. }));
    }

    #[test]
    fn test_load_rejects_unknown_version() {
        let doc: SketchDoc = serde_json::from_str(
            r#"{ "version": 7, "architecture": "HC4", "labels": [], "blocks": [] }"#,
        )
        .unwrap();
        let err = Sketch::from_doc(&doc).unwrap_err();
        assert!(matches!(err, VasmError::UnsupportedVersion { version: 7 }));
    }

    #[test]
    fn test_load_registers_block_labels() {
        let doc: SketchDoc = serde_json::from_str(
            r#"{ "version": 1, "architecture": "HC4", "labels": ["START", "LOOP", "END"],
                 "blocks": [ { "id": 0, "type": "goto", "label": "  extra " } ] }"#,
        )
        .unwrap();
        let (sketch, registry) = Sketch::from_doc(&doc).unwrap();
        assert!(registry.contains("EXTRA"));
        assert_eq!(sketch.kind(BlockId::from_raw(0)).unwrap().label(), Some("EXTRA"));
    }
}
