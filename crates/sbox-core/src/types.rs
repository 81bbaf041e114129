use crate::{
    Result,
    constants::{COIL_OFF, COIL_ON, HEX_PREFIX, MAX_ADDRESS_DIGITS},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Register offset on the unit (16 bits).
///
/// Operators write addresses as bare hex digits (`1F4`); the `0x` prefix is
/// synthesized when the address is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitAddress(u16);

impl UnitAddress {
    pub const fn new(address: u16) -> Self {
        UnitAddress(address)
    }

    /// Parse an operator-supplied address.
    ///
    /// # Errors
    /// Returns `Error::InvalidAddress` if the input is empty, contains a
    /// non-hex character (including a sign or an explicit prefix) or does not
    /// fit in 16 bits.
    ///
    /// # Examples
    ///
    /// ```
    /// use sbox_core::UnitAddress;
    ///
    /// assert_eq!(UnitAddress::parse_hex("1F4").unwrap().as_u16(), 0x01F4);
    /// assert!(UnitAddress::parse_hex("0x1F4").is_err());
    /// ```
    pub fn parse_hex(input: &str) -> Result<Self> {
        if input.is_empty() || !input.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidAddress(input.to_string()));
        }

        u16::from_str_radix(input, 16)
            .map(UnitAddress)
            .map_err(|_| Error::InvalidAddress(input.to_string()))
    }

    #[must_use]
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for UnitAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{HEX_PREFIX}{:0width$X}", self.0, width = MAX_ADDRESS_DIGITS)
    }
}

impl std::str::FromStr for UnitAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        UnitAddress::parse_hex(s)
    }
}

/// Register operation requested by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Read a block of coils (outputs).
    ReadCoil,
    /// Read a block of discrete inputs.
    ReadInput,
    /// Switch a single coil on.
    WriteCoilOn,
    /// Switch a single coil off.
    WriteCoilOff,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::ReadCoil,
        Action::ReadInput,
        Action::WriteCoilOn,
        Action::WriteCoilOff,
    ];

    /// Command line keyword for this action.
    pub fn keyword(&self) -> &'static str {
        match self {
            Action::ReadCoil => "read-coil",
            Action::ReadInput => "read-input",
            Action::WriteCoilOn => "write-coil-on",
            Action::WriteCoilOff => "write-coil-off",
        }
    }

    /// Value written by this action, if it is a write.
    pub fn coil_value(&self) -> Option<CoilValue> {
        match self {
            Action::WriteCoilOn => Some(CoilValue::On),
            Action::WriteCoilOff => Some(CoilValue::Off),
            Action::ReadCoil | Action::ReadInput => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl std::str::FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Action::ALL
            .into_iter()
            .find(|action| action.keyword() == s)
            .ok_or_else(|| Error::UnknownAction(s.to_string()))
    }
}

/// Coil state written by a single-coil write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoilValue {
    On,
    Off,
}

impl CoilValue {
    /// Literal 16-bit code transmitted for this state.
    #[must_use]
    pub fn code(&self) -> u16 {
        match self {
            CoilValue::On => COIL_ON,
            CoilValue::Off => COIL_OFF,
        }
    }
}

/// Ordered status bits returned by a block read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading(Vec<bool>);

impl Reading {
    pub fn new(bits: Vec<bool>) -> Self {
        Reading(bits)
    }

    pub fn bits(&self) -> &[bool] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Renders as `[0 1 0 ...]`.
impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("[")?;
        for (i, bit) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        f.write_str("]")
    }
}

/// Confirmation of a single-coil write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteAck {
    pub address: UnitAddress,
    pub value: u16,
}

impl fmt::Display for WriteAck {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "address={} value={HEX_PREFIX}{:04X}", self.address, self.value)
    }
}

/// Result of one dispatched action, printed verbatim in direct mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutput {
    Read(Reading),
    Write(WriteAck),
}

impl fmt::Display for ActionOutput {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ActionOutput::Read(reading) => reading.fmt(f),
            ActionOutput::Write(ack) => ack.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("1F4", 0x01F4)]
    #[case("19A", 0x019A)]
    #[case("0", 0)]
    #[case("ffff", 0xFFFF)]
    #[case("500", 0x0500)]
    fn test_address_valid(#[case] input: &str, #[case] expected: u16) {
        let address: UnitAddress = input.parse().unwrap();
        assert_eq!(address.as_u16(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("0x1F4")]
    #[case("+1F")]
    #[case("-1")]
    #[case("G1")]
    #[case("1 F")]
    #[case("10000")] // > u16
    fn test_address_invalid(#[case] input: &str) {
        let result = UnitAddress::parse_hex(input);
        assert!(matches!(result, Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn test_address_display_synthesizes_prefix() {
        assert_eq!(UnitAddress::new(0x1F4).to_string(), "0x01F4");
    }

    #[rstest]
    #[case("read-coil", Action::ReadCoil)]
    #[case("read-input", Action::ReadInput)]
    #[case("write-coil-on", Action::WriteCoilOn)]
    #[case("write-coil-off", Action::WriteCoilOff)]
    fn test_action_keywords(#[case] keyword: &str, #[case] expected: Action) {
        let action: Action = keyword.parse().unwrap();
        assert_eq!(action, expected);
        assert_eq!(action.to_string(), keyword);
    }

    #[rstest]
    #[case("write-coil")]
    #[case("READ-COIL")]
    #[case("")]
    fn test_action_unknown(#[case] keyword: &str) {
        assert!(matches!(
            keyword.parse::<Action>(),
            Err(Error::UnknownAction(_))
        ));
    }

    #[test]
    fn test_coil_codes() {
        assert_eq!(Action::WriteCoilOn.coil_value().unwrap().code(), 0xFF00);
        assert_eq!(Action::WriteCoilOff.coil_value().unwrap().code(), 0x0000);
        assert!(Action::ReadCoil.coil_value().is_none());
    }

    #[test]
    fn test_reading_display() {
        let reading = Reading::new(vec![false, true, false]);
        assert_eq!(reading.to_string(), "[0 1 0]");
        assert_eq!(Reading::default().to_string(), "[]");
    }

    #[test]
    fn test_write_ack_display() {
        let ack = WriteAck {
            address: UnitAddress::new(0x19A),
            value: 0,
        };
        assert_eq!(ack.to_string(), "address=0x019A value=0x0000");
    }

    proptest! {
        #[test]
        fn prop_hex_address_parses(value in any::<u16>()) {
            let short = format!("{value:X}");
            let padded = format!("{value:04x}");
            prop_assert_eq!(UnitAddress::parse_hex(&short).unwrap().as_u16(), value);
            prop_assert_eq!(UnitAddress::parse_hex(&padded).unwrap().as_u16(), value);
        }

        #[test]
        fn prop_non_hex_rejected(input in "[0-9a-fA-F]{0,3}[g-zG-Z+\\-_ ][0-9a-fA-F]{0,3}") {
            prop_assert!(UnitAddress::parse_hex(&input).is_err());
        }
    }
}
