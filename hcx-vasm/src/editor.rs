//! Interactive create-label state machine
//!
//! A label dropdown yields either an existing name or a create request. The
//! create request suspends that block's label field until the user accepts
//! or cancels; the editor tracks the single pending block across that
//! suspension and guarantees the field is always resolved to a registered
//! name afterwards.

use log::debug;

use crate::registry::{Registration, Registry};
use crate::sketch::BlockId;

/// What a label-selection surface produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelChoice {
    /// An existing registry entry was picked.
    Selected(String),
    /// The "create new label" entry was picked; open the editor.
    RequestCreate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    AwaitingInput { pending: BlockId },
}

/// The label to write back into a block's field once input resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub block: BlockId,
    pub label: String,
}

/// Two-state editor: `Idle` until a block requests a new label, then
/// `AwaitingInput` until accept or cancel. A second request while one is
/// pending replaces it; the earlier requester keeps its previous field
/// value and is no longer tracked.
#[derive(Debug)]
pub struct LabelEditor {
    state: State,
}

impl LabelEditor {
    pub fn new() -> Self {
        LabelEditor { state: State::Idle }
    }

    /// Block currently awaiting label input, if any.
    pub fn pending(&self) -> Option<BlockId> {
        match self.state {
            State::Idle => None,
            State::AwaitingInput { pending } => Some(pending),
        }
    }

    pub fn is_awaiting(&self) -> bool {
        self.pending().is_some()
    }

    /// Begin label input on behalf of `block`. Last request wins.
    pub fn request_create(&mut self, block: BlockId) {
        if let State::AwaitingInput { pending } = self.state {
            debug!("create-label request for {block:?} pre-empts pending {pending:?}");
        }
        self.state = State::AwaitingInput { pending: block };
    }

    /// Accept the typed text. Non-empty input is registered (duplicates
    /// collapse onto the existing entry); empty input resolves to the
    /// registry's first label, same as cancel. Returns `None` when no input
    /// was pending.
    pub fn accept(&mut self, registry: &mut Registry, text: &str) -> Option<Resolution> {
        let block = self.pending()?;
        self.state = State::Idle;
        let label = match registry.register(text) {
            Registration::Added(name) | Registration::Existing(name) => name,
            Registration::Empty => registry.first().to_string(),
        };
        Some(Resolution { block, label })
    }

    /// Cancel input; the pending block's field reverts to the registry's
    /// first label and the registry is untouched.
    pub fn cancel(&mut self, registry: &Registry) -> Option<Resolution> {
        let block = self.pending()?;
        self.state = State::Idle;
        Some(Resolution {
            block,
            label: registry.first().to_string(),
        })
    }

    /// Pre-fill for the input field: the first of LABEL1, LABEL2, ... not
    /// yet registered.
    pub fn suggest_name(&self, registry: &Registry) -> String {
        let mut n = 1u32;
        loop {
            let candidate = format!("LABEL{n}");
            if !registry.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

impl Default for LabelEditor {
    fn default() -> Self {
        Self::new()
    }
}
