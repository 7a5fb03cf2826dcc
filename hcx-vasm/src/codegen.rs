//! Per-block assembly text generation
//!
//! Pure mapping from one block to its emitted lines. The HCx program
//! counter is addressed as three bytes, so a jump to a label expands to
//! three `LI #LABEL:k` loads (byte k of the target address) followed by the
//! jump itself; the external assembler substitutes the numeric bytes.
//! Nothing here ever computes an address.

use crate::error::{Result, VasmError};
use crate::registry::Registry;
use crate::sketch::BlockKind;

/// Generate the text for one block. Fails with an unresolved-label error if
/// the block references a name the registry does not hold; callers abort
/// the whole compile on that instead of emitting partial output.
pub fn block_text(kind: &BlockKind, registry: &Registry) -> Result<String> {
    let text = match kind {
        BlockKind::NoArg { mnemonic } => format!("{mnemonic}\n"),
        BlockKind::Register { mnemonic, register } => format!("{mnemonic} {register}\n"),
        BlockKind::Immediate { mnemonic, value } => format!("{mnemonic} #{value}\n"),
        BlockKind::FlagJump {
            mnemonic,
            flag: None,
        } => format!("{mnemonic}\n"),
        BlockKind::FlagJump {
            mnemonic,
            flag: Some(flag),
        } => format!("{mnemonic} {flag}\n"),
        BlockKind::LabelDef { label } => {
            let label = resolve(label, registry)?;
            format!("{label}:\n")
        }
        BlockKind::Goto { label } => {
            let label = resolve(label, registry)?;
            format!("{}JP\n", address_loads(label))
        }
        BlockKind::GotoIf { flag, label } => {
            let label = resolve(label, registry)?;
            format!("{}JP {flag}\n", address_loads(label))
        }
    };
    Ok(text)
}

/// The three symbolic address-byte loads, high byte first.
fn address_loads(label: &str) -> String {
    format!("LI #{label}:2\nLI #{label}:1\nLI #{label}:0\n")
}

fn resolve<'a>(label: &'a str, registry: &Registry) -> Result<&'a str> {
    if registry.contains(label) {
        Ok(label)
    } else {
        Err(VasmError::UnresolvedLabel {
            label: label.to_string(),
        })
    }
}
