//! Value codec
//!
//! Converts between device words and their hexadecimal display form, and
//! packs named bit-fields into (and out of) register words.
//!
//! Bits are numbered across the whole register: word 0 holds bits 0..=31,
//! word 1 holds bits 32..=63, and so on.

use std::fmt;

use indexmap::IndexMap;

use crate::error::{RegisterError, Result};

/// Width of a device word in bits
pub const WORD_BITS: u32 = 32;

/// Decoded field values, in declaration order
pub type FieldMap = IndexMap<String, u32>;

/// Format a word as `0x`-prefixed uppercase hex without padding
pub fn encode_hex(word: u32) -> String {
    format!("0x{:X}", word)
}

/// Format a word as `0x`-prefixed uppercase hex, zero-padded to the number
/// of digits a `bits`-wide value needs (8 digits for a 32-bit word)
pub fn encode_hex_padded(word: u32, bits: u32) -> String {
    let digits = bits.div_ceil(4).max(1) as usize;
    format!("0x{:0width$X}", word, width = digits)
}

/// Parse user-entered hex text into a word
///
/// Surrounding whitespace and an optional `0x`/`0X` prefix are accepted.
/// Empty input, non-hex characters and values wider than 32 bits decode to
/// 0 instead of failing, so a single bad keystroke never loses the rest of
/// the edit buffer. This is lossy but safe: nothing reaches the device until
/// the user confirms the edit.
pub fn decode_hex(text: &str) -> u32 {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return 0;
    }

    u32::from_str_radix(digits, 16).unwrap_or(0)
}

/// Inclusive range of bit positions occupied by a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitRange {
    lo: u32,
    hi: u32,
}

impl BitRange {
    /// A single-bit field
    pub fn bit(index: u32) -> Self {
        Self {
            lo: index,
            hi: index,
        }
    }

    /// A field spanning bits `lo..=hi`
    pub fn new(lo: u32, hi: u32) -> Result<Self> {
        if lo > hi {
            return Err(RegisterError::InvalidBitRange { lo, hi });
        }
        Ok(Self { lo, hi })
    }

    pub fn lo(&self) -> u32 {
        self.lo
    }

    pub fn hi(&self) -> u32 {
        self.hi
    }

    /// Number of bits covered, saturating at `u32::MAX` for the full range
    pub fn width(&self) -> u32 {
        (self.hi - self.lo).saturating_add(1)
    }

    /// Right-aligned mask covering the field's width
    pub fn mask(&self) -> u32 {
        if self.width() >= WORD_BITS {
            u32::MAX
        } else {
            (1u32 << self.width()) - 1
        }
    }

    fn overlaps(&self, other: &BitRange) -> bool {
        self.lo <= other.hi && other.lo <= self.hi
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lo == self.hi {
            write!(f, "[{}]", self.lo)
        } else {
            write!(f, "[{}..={}]", self.lo, self.hi)
        }
    }
}

/// Validated field layout of one register
///
/// Fields never overlap, are at most 32 bits wide and lie inside the
/// register. Gaps between fields are allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    width_bits: u32,
    fields: IndexMap<String, BitRange>,
}

impl FieldSpec {
    /// Build a field spec for a register `width_bits` wide
    pub fn new<I, S>(width_bits: u32, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, BitRange)>,
        S: Into<String>,
    {
        let mut validated: IndexMap<String, BitRange> = IndexMap::new();

        for (name, range) in fields {
            let name = name.into();

            if range.width() > WORD_BITS {
                return Err(RegisterError::FieldTooWide {
                    field: name,
                    width: range.width(),
                });
            }
            if range.hi() >= width_bits {
                return Err(RegisterError::FieldOutOfRange {
                    field: name,
                    hi: range.hi(),
                    width_bits,
                });
            }
            if validated.contains_key(&name) {
                return Err(RegisterError::DuplicateField(name));
            }
            if let Some((other, _)) = validated.iter().find(|(_, r)| r.overlaps(&range)) {
                return Err(RegisterError::OverlappingFields {
                    first: other.clone(),
                    second: name,
                });
            }

            validated.insert(name, range);
        }

        Ok(Self {
            width_bits,
            fields: validated,
        })
    }

    pub fn width_bits(&self) -> u32 {
        self.width_bits
    }

    /// Number of words needed to hold the register
    pub fn word_count(&self) -> usize {
        self.width_bits.div_ceil(WORD_BITS) as usize
    }

    pub fn get(&self, name: &str) -> Option<BitRange> {
        self.fields.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, BitRange)> {
        self.fields.iter().map(|(name, range)| (name.as_str(), *range))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Extract the bits of `range` from a register's words
///
/// Words past the end of the slice read as zero.
pub fn read_field(words: &[u32], range: BitRange) -> u32 {
    let index = (range.lo() / WORD_BITS) as usize;
    let shift = range.lo() % WORD_BITS;

    let low = words.get(index).copied().unwrap_or(0) as u64;
    let high = words.get(index + 1).copied().unwrap_or(0) as u64;
    let window = (high << WORD_BITS) | low;

    ((window >> shift) as u32) & range.mask()
}

/// Replace the bits of `range` in a register's words with `value`
///
/// The words are left untouched if the value does not fit the range or the
/// range lies outside the words.
pub fn write_field(words: &mut [u32], range: BitRange, value: u32) -> Result<()> {
    check_fits(&range.to_string(), range, value)?;

    let available_bits = words.len() as u32 * WORD_BITS;
    if range.hi() >= available_bits {
        return Err(RegisterError::FieldOutOfRange {
            field: range.to_string(),
            hi: range.hi(),
            width_bits: available_bits,
        });
    }

    let index = (range.lo() / WORD_BITS) as usize;
    let shift = range.lo() % WORD_BITS;
    let mask = (range.mask() as u64) << shift;

    let low = words[index] as u64;
    let high = words.get(index + 1).copied().unwrap_or(0) as u64;
    let window = (high << WORD_BITS) | low;
    let updated = (window & !mask) | ((value as u64) << shift);

    words[index] = updated as u32;
    if let Some(next) = words.get_mut(index + 1) {
        *next = (updated >> WORD_BITS) as u32;
    }
    Ok(())
}

pub(crate) fn check_fits(field: &str, range: BitRange, value: u32) -> Result<()> {
    if value & !range.mask() != 0 {
        return Err(RegisterError::FieldValueTooWide {
            field: field.to_string(),
            value,
            width: range.width(),
        });
    }
    Ok(())
}

/// Decode every field of a multi-word register
pub fn decode_fields_words(words: &[u32], spec: &FieldSpec) -> FieldMap {
    spec.iter()
        .map(|(name, range)| (name.to_string(), read_field(words, range)))
        .collect()
}

/// Pack field values into the words of a multi-word register
///
/// Fields missing from `fields` and bits outside any field are zero.
pub fn encode_fields_words(fields: &FieldMap, spec: &FieldSpec) -> Result<Vec<u32>> {
    let mut words = vec![0u32; spec.word_count()];
    for (name, value) in fields {
        let range = spec
            .get(name)
            .ok_or_else(|| RegisterError::UnknownField(name.clone()))?;
        check_fits(name, range, *value)?;
        write_field(&mut words, range, *value)?;
    }
    Ok(words)
}

/// Decode the fields of a single-word register
pub fn decode_fields(raw: u32, spec: &FieldSpec) -> FieldMap {
    decode_fields_words(&[raw], spec)
}

/// Pack field values into a single word
pub fn encode_fields(fields: &FieldMap, spec: &FieldSpec) -> Result<u32> {
    if spec.width_bits() > WORD_BITS {
        return Err(RegisterError::SpecTooWide(spec.width_bits()));
    }
    let words = encode_fields_words(fields, spec)?;
    Ok(words.first().copied().unwrap_or(0))
}
