//! Workspace: one editing session
//!
//! Owns the sketch, its symbol registry and the label editor, and wires the
//! label-selection surface to them. The registry lives and dies with the
//! workspace; nothing here is process-global.

use std::path::{Path, PathBuf};

use log::debug;

use crate::compile::compile;
use crate::editor::{LabelChoice, LabelEditor};
use crate::error::{Result, VasmError};
use crate::isa::Arch;
use crate::registry::Registry;
use crate::sketch::{BlockId, Sketch};

#[derive(Debug)]
pub struct Workspace {
    sketch: Sketch,
    registry: Registry,
    editor: LabelEditor,
    path: Option<PathBuf>,
}

impl Workspace {
    /// Fresh workspace: empty sketch, seeded registry, idle editor.
    pub fn new(arch: Arch) -> Self {
        Workspace {
            sketch: Sketch::new(arch),
            registry: Registry::new(),
            editor: LabelEditor::new(),
            path: None,
        }
    }

    /// Load a sketch file into a new workspace.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let (sketch, registry) = Sketch::load(&path)?;
        Ok(Workspace {
            sketch,
            registry,
            editor: LabelEditor::new(),
            path: Some(path.as_ref().to_path_buf()),
        })
    }

    /// Discard the program: empty sketch, registry back to its seeds,
    /// any pending label input dropped, file association cleared.
    pub fn reset(&mut self) {
        let arch = self.sketch.arch();
        self.sketch = Sketch::new(arch);
        self.registry.reset();
        self.editor = LabelEditor::new();
        self.path = None;
    }

    pub fn arch(&self) -> Arch {
        self.sketch.arch()
    }

    pub fn sketch(&self) -> &Sketch {
        &self.sketch
    }

    pub fn sketch_mut(&mut self) -> &mut Sketch {
        &mut self.sketch
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Compile the current sketch to assembly text.
    pub fn assembly(&self) -> Result<String> {
        compile(&self.sketch, &self.registry)
    }

    /// Compile and write the text to `path`. Nothing is written when the
    /// compile fails.
    pub fn export_asm<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = self.assembly()?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Save to the file this workspace was opened from.
    pub fn save(&self) -> Result<()> {
        match &self.path {
            Some(path) => self.sketch.save(path, &self.registry),
            None => Err(VasmError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "workspace has no file path; use save_as",
            ))),
        }
    }

    /// Save to `path` and remember it for later saves.
    pub fn save_as<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.sketch.save(&path, &self.registry)?;
        self.path = Some(path.as_ref().to_path_buf());
        Ok(())
    }

    /// Apply a label-selection result for `block`: an existing name is
    /// written straight into the block's field, a create request opens the
    /// editor with `block` pending.
    pub fn choose_label(&mut self, block: BlockId, choice: LabelChoice) -> Result<()> {
        match choice {
            LabelChoice::Selected(name) => {
                if !self.registry.contains(&name) {
                    return Err(VasmError::UnresolvedLabel { label: name });
                }
                self.sketch.set_label(block, &name)
            }
            LabelChoice::RequestCreate => {
                self.editor.request_create(block);
                Ok(())
            }
        }
    }

    /// Whether a create-label interaction is in flight.
    pub fn awaiting_label(&self) -> bool {
        self.editor.is_awaiting()
    }

    /// Pre-fill for the create-label input.
    pub fn suggest_label(&self) -> String {
        self.editor.suggest_name(&self.registry)
    }

    /// Accept typed label input. Returns the block whose field was updated,
    /// or `None` when nothing was pending (or the pending block has been
    /// removed since the request, in which case the input is dropped).
    pub fn accept_label(&mut self, text: &str) -> Result<Option<BlockId>> {
        match self.editor.accept(&mut self.registry, text) {
            Some(resolution) => self.finish_label(resolution),
            None => Ok(None),
        }
    }

    /// Cancel label input, reverting the pending block's field to the
    /// registry's first entry.
    pub fn cancel_label(&mut self) -> Result<Option<BlockId>> {
        match self.editor.cancel(&self.registry) {
            Some(resolution) => self.finish_label(resolution),
            None => Ok(None),
        }
    }

    fn finish_label(&mut self, resolution: crate::editor::Resolution) -> Result<Option<BlockId>> {
        if self.sketch.kind(resolution.block).is_none() {
            debug!(
                "pending block {:?} removed before label input resolved",
                resolution.block
            );
            return Ok(None);
        }
        self.sketch.set_label(resolution.block, &resolution.label)?;
        Ok(Some(resolution.block))
    }
}
