// Binary signature matching
//
// A signature names a fixed-size window of machine code. Operand fields inside
// the window are zeroed before hashing, so the same routine matches regardless
// of the chain indices or addresses baked into it. A hit yields a `Capture`:
// the zeroed template plus the decoded operand values.

use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::image::Image;

/// An operand inside a signature window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub offset: usize,
    /// Width in bytes, 2 for instruction immediates
    pub width: usize,
}

impl Field {
    pub const fn imm16(name: &'static str, offset: usize) -> Self {
        Field {
            name,
            offset,
            width: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub name: &'static str,
    pub len: usize,
    /// SHA-256 of the window with every field zeroed, lowercase hex
    pub hash: &'static str,
    pub fields: &'static [Field],
    /// Canonical instruction words, used when no template has been captured
    pub words: &'static [u32],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub template: Vec<u8>,
    pub values: IndexMap<&'static str, u32>,
}

impl Capture {
    pub fn value(&self, name: &str) -> Option<u32> {
        self.values.get(name).copied()
    }

    /// A 16-bit field read as a sign-extended immediate.
    pub fn signed(&self, name: &str) -> Option<i32> {
        self.value(name).map(|v| v as u16 as i16 as i32)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({} bytes, {} fields)", self.name, self.len, self.fields.len())
    }
}

pub fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn read_field(window: &[u8], field: &Field) -> u32 {
    window[field.offset..field.offset + field.width]
        .iter()
        .fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

impl Signature {
    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Copy of `window` with every operand field zeroed.
    pub fn masked(&self, window: &[u8]) -> Vec<u8> {
        let mut out = window.to_vec();
        for field in self.fields {
            out[field.offset..field.offset + field.width].fill(0);
        }
        out
    }

    /// Try to match a window already cut to length.
    pub fn match_bytes(&self, window: &[u8]) -> Option<Capture> {
        if window.len() != self.len {
            return None;
        }
        let template = self.masked(window);
        if digest(&template) != self.hash {
            return None;
        }
        let values = self
            .fields
            .iter()
            .map(|field| (field.name, read_field(window, field)))
            .collect();
        Some(Capture { template, values })
    }

    /// Try to match the window starting at `offset`. Running off the end of the
    /// image is a miss, not an error.
    pub fn match_at(&self, image: &Image, offset: usize) -> Option<Capture> {
        let window = image.slice(offset, self.len).ok()?;
        self.match_bytes(window)
    }

    /// The canonical routine, big-endian, with operands zeroed.
    pub fn canonical_template(&self) -> Vec<u8> {
        let bytes: Vec<u8> = self.words.iter().flat_map(|w| w.to_be_bytes()).collect();
        self.masked(&bytes)
    }

    /// Patch operand values into a template. Unnamed fields keep their bytes.
    pub fn apply(&self, template: &[u8], values: &[(&str, u32)]) -> Vec<u8> {
        let mut out = template.to_vec();
        for &(name, value) in values {
            if let Some(field) = self.field(name) {
                let bytes = value.to_be_bytes();
                out[field.offset..field.offset + field.width]
                    .copy_from_slice(&bytes[4 - field.width..]);
            }
        }
        out
    }
}

/// First signature in `candidates` that matches at `offset`.
pub fn match_any(
    candidates: &[&'static Signature],
    image: &Image,
    offset: usize,
) -> Option<(&'static Signature, Capture)> {
    candidates
        .iter()
        .find_map(|sig| sig.match_at(image, offset).map(|capture| (*sig, capture)))
}

/// Split a RAM address into `LUI`/`ADDIU` immediates. The high half is
/// rounded so that adding the sign-extended low half restores the address.
pub fn split_hi_lo(addr: u32) -> (u16, u16) {
    let hi = (addr.wrapping_add(0x8000) >> 16) as u16;
    let lo = (addr & 0xFFFF) as u16;
    (hi, lo)
}

pub fn join_hi_lo(hi: u16, lo: u16) -> u32 {
    ((hi as u32) << 16).wrapping_add(lo as i16 as i32 as u32)
}
