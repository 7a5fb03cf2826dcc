//! HCx instruction set definitions
//!
//! The HC4 is a small educational CPU with sixteen 8-bit registers and a
//! 13-entry mnemonic table; the HC4E board ships a reduced core with 7 of
//! them. Operand shapes are shared: register operand, 8-bit immediate,
//! optional jump flag, or nothing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, VasmError};

/// Target CPU family. Selects the permitted mnemonic table and is passed
/// through to the external assembler as its `-a` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arch {
    #[serde(rename = "HC4")]
    Hc4,
    #[serde(rename = "HC4E")]
    Hc4e,
}

impl Arch {
    /// Mnemonics this architecture implements.
    pub fn mnemonics(&self) -> &'static [Mnemonic] {
        use Mnemonic::*;
        match self {
            Arch::Hc4 => &[Sm, Sc, Su, Ad, Xr, Or, An, Sa, Lm, Ld, Li, Jp, Np],
            Arch::Hc4e => &[Ad, Xr, Sa, Ld, Li, Jp, Np],
        }
    }

    /// Whether `mnemonic` is part of this architecture's table.
    pub fn supports(&self, mnemonic: Mnemonic) -> bool {
        self.mnemonics().contains(&mnemonic)
    }

    /// Tag understood by the external assembler (`-a HC4` / `-a HC4E`).
    pub fn tool_tag(&self) -> &'static str {
        match self {
            Arch::Hc4 => "HC4",
            Arch::Hc4e => "HC4E",
        }
    }
}

impl Default for Arch {
    fn default() -> Self {
        Arch::Hc4
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool_tag())
    }
}

/// Operand a mnemonic expects in generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandShape {
    /// `Rn`, n in 0..=15
    Register,
    /// `#v`, v in 0..=255
    Immediate,
    /// Flag token or nothing (`JP`, `JP Z`, ...)
    OptionalFlag,
    /// Bare mnemonic
    None,
}

/// One HCx instruction mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mnemonic {
    /// Store to memory, stack indirect
    Sm,
    /// Store constant
    Sc,
    /// Subtract
    Su,
    /// Add
    Ad,
    /// Exclusive or
    Xr,
    /// Or
    Or,
    /// And
    An,
    /// Shift accumulator
    Sa,
    /// Load from memory, stack indirect
    Lm,
    /// Load register
    Ld,
    /// Load immediate
    Li,
    /// Jump
    Jp,
    /// No operation
    Np,
}

impl Mnemonic {
    pub fn shape(&self) -> OperandShape {
        use Mnemonic::*;
        match self {
            Sc | Su | Ad | Xr | Or | An | Sa | Ld => OperandShape::Register,
            Li => OperandShape::Immediate,
            Jp => OperandShape::OptionalFlag,
            // SM and LM address memory through the implicit stack-indirect
            // pointer, so they take no operand
            Sm | Lm | Np => OperandShape::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        use Mnemonic::*;
        match self {
            Sm => "SM",
            Sc => "SC",
            Su => "SU",
            Ad => "AD",
            Xr => "XR",
            Or => "OR",
            An => "AN",
            Sa => "SA",
            Lm => "LM",
            Ld => "LD",
            Li => "LI",
            Jp => "JP",
            Np => "NP",
        }
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Register index, 0..=15. Displays as the operand token (`R5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Register(u8);

impl Register {
    pub fn new(index: u8) -> Result<Self> {
        if index > 15 {
            return Err(VasmError::MalformedSketch {
                message: format!("register index {index} out of range 0..=15"),
            });
        }
        Ok(Register(index))
    }

    pub fn index(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Register {
    type Error = VasmError;

    fn try_from(index: u8) -> Result<Self> {
        Register::new(index)
    }
}

impl From<Register> for u8 {
    fn from(r: Register) -> u8 {
        r.0
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Jump condition flag. A conditional `JP` emits the flag token after the
/// mnemonic; an unconditional one emits nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "C")]
    Carry,
    #[serde(rename = "NC")]
    NoCarry,
    #[serde(rename = "Z")]
    Zero,
    #[serde(rename = "NZ")]
    NonZero,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Carry => "C",
            Condition::NoCarry => "NC",
            Condition::Zero => "Z",
            Condition::NonZero => "NZ",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arch_tables() {
        assert_eq!(Arch::Hc4.mnemonics().len(), 13);
        assert_eq!(Arch::Hc4e.mnemonics().len(), 7);
        assert!(Arch::Hc4.supports(Mnemonic::Sc));
        assert!(!Arch::Hc4e.supports(Mnemonic::Sc));
        assert!(Arch::Hc4e.supports(Mnemonic::Jp));
    }

    #[test]
    fn test_register_range() {
        assert_eq!(Register::new(5).unwrap().to_string(), "R5");
        assert_eq!(Register::new(15).unwrap().to_string(), "R15");
        assert!(Register::new(16).is_err());
    }

    #[test]
    fn test_serde_tokens() {
        let arch: Arch = serde_json::from_str("\"HC4E\"").unwrap();
        assert_eq!(arch, Arch::Hc4e);
        let m: Mnemonic = serde_json::from_str("\"LD\"").unwrap();
        assert_eq!(m, Mnemonic::Ld);
        assert_eq!(serde_json::to_string(&Condition::NoCarry).unwrap(), "\"NC\"");
        assert!(serde_json::from_str::<Register>("16").is_err());
    }

    #[test]
    fn test_shapes() {
        assert_eq!(Mnemonic::Sc.shape(), OperandShape::Register);
        assert_eq!(Mnemonic::Ld.shape(), OperandShape::Register);
        assert_eq!(Mnemonic::Li.shape(), OperandShape::Immediate);
        assert_eq!(Mnemonic::Jp.shape(), OperandShape::OptionalFlag);
        assert_eq!(Mnemonic::Np.shape(), OperandShape::None);
        // stack-indirect memory access carries no operand
        assert_eq!(Mnemonic::Sm.shape(), OperandShape::None);
        assert_eq!(Mnemonic::Lm.shape(), OperandShape::None);
    }
}
