//! Value comparison configuration.
//!
//! A [`CompareMode`] fixes how text and binary values are ordered for the
//! lifetime of a database: the collation (if any), its strength, and whether
//! raw bytes compare as unsigned or signed octets. The mode is owned by the
//! database and passed explicitly to every comparison; nothing in this crate
//! reads ambient collation state.

use std::cmp::Ordering;

/// How much of a character distinguishes two strings under a collation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollationStrength {
    /// Base letters only; case differences collapse.
    Primary,
    /// Base letters and diacritics; case differences collapse.
    Secondary,
    /// Full comparison including case.
    Tertiary,
}

/// A named collation with a comparison strength.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collation {
    name: String,
    strength: CollationStrength,
}

impl Collation {
    /// Creates a collation.
    pub fn new(name: impl Into<String>, strength: CollationStrength) -> Self {
        Self {
            name: name.into(),
            strength,
        }
    }

    /// Returns the collation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the comparison strength.
    pub fn strength(&self) -> CollationStrength {
        self.strength
    }
}

/// Value-level comparison configuration.
///
/// Immutable for the lifetime of a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareMode {
    collation: Option<Collation>,
    binary_unsigned: bool,
}

impl Default for CompareMode {
    fn default() -> Self {
        Self::binary()
    }
}

impl CompareMode {
    /// Binary mode: code-point text order, unsigned byte order.
    pub fn binary() -> Self {
        Self {
            collation: None,
            binary_unsigned: true,
        }
    }

    /// Creates a mode with an explicit collation.
    pub fn with_collation(collation: Collation, binary_unsigned: bool) -> Self {
        Self {
            collation: Some(collation),
            binary_unsigned,
        }
    }

    /// Returns the active collation, if any.
    pub fn collation(&self) -> Option<&Collation> {
        self.collation.as_ref()
    }

    /// Returns true if raw bytes compare as unsigned octets.
    pub fn binary_unsigned(&self) -> bool {
        self.binary_unsigned
    }

    /// Orders two text values under this mode.
    ///
    /// At `Primary`/`Secondary` strength the comparison is case-folded:
    /// strings differing only in case compare equal, and it is the caller's
    /// dedup that decides which representative survives.
    pub fn compare_text(&self, a: &str, b: &str) -> Ordering {
        match &self.collation {
            None => a.cmp(b),
            Some(collation) => match collation.strength {
                CollationStrength::Tertiary => a.cmp(b),
                CollationStrength::Primary | CollationStrength::Secondary => a
                    .chars()
                    .flat_map(char::to_lowercase)
                    .cmp(b.chars().flat_map(char::to_lowercase)),
            },
        }
    }

    /// Orders two byte strings under this mode.
    pub fn compare_bytes(&self, a: &[u8], b: &[u8]) -> Ordering {
        if self.binary_unsigned {
            a.cmp(b)
        } else {
            a.iter()
                .map(|&x| x as i8)
                .cmp(b.iter().map(|&x| x as i8))
        }
    }
}
