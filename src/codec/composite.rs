//! Composite byte encoding shared by cell names and multi-column keys.
//!
//! Binary format, repeated per component:
//! ```text
//! [length: u16 BE]          // 2 bytes
//! [value: u8 x length]      // variable
//! [end_of_component: u8]    // 1 byte, 0x00 for exact components
//! ```
//!
//! The end-of-component byte of the last component may be `0x01` (end of
//! range) or `0xFF` (start of range) when the composite is used as a slice
//! bound rather than a concrete name.

use std::cmp::Ordering;

use crate::error::{IndexError, Result};
use crate::types::validator::Validator;

/// End-of-component marker for a concrete component.
pub const EOC_EXACT: u8 = 0x00;

/// End-of-component marker that sorts after every name sharing the prefix.
pub const EOC_END: u8 = 0x01;

/// End-of-component marker that sorts before every name sharing the prefix.
pub const EOC_START: u8 = 0xFF;

/// Split a composite into its components, borrowing from `bytes`.
pub fn split(bytes: &[u8]) -> Result<Vec<&[u8]>> {
    Ok(split_with_eoc(bytes)?.into_iter().map(|(c, _)| c).collect())
}

/// Split a composite keeping the end-of-component byte of every component.
pub fn split_with_eoc(bytes: &[u8]) -> Result<Vec<(&[u8], u8)>> {
    let mut components = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes.len() - pos < 2 {
            return Err(IndexError::InvalidFormat(
                "Composite component length truncated".into(),
            ));
        }
        let len = u16::from_be_bytes([bytes[pos], bytes[pos + 1]]) as usize;
        pos += 2;
        if bytes.len() - pos < len + 1 {
            return Err(IndexError::InvalidFormat(format!(
                "Composite component truncated: need {} bytes, have {}",
                len + 1,
                bytes.len() - pos
            )));
        }
        components.push((&bytes[pos..pos + len], bytes[pos + len]));
        pos += len + 1;
    }
    Ok(components)
}

/// Final component of a composite, or `None` for an empty composite.
pub fn last_component(bytes: &[u8]) -> Result<Option<&[u8]>> {
    Ok(split(bytes)?.pop())
}

/// Largest component the 2-byte length prefix can describe.
pub const MAX_COMPONENT_LEN: usize = u16::MAX as usize;

/// Incremental composite writer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositeBuilder {
    components: Vec<Vec<u8>>,
}

impl CompositeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, component: &[u8]) -> &mut Self {
        self.components.push(component.to_vec());
        self
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> &[Vec<u8>] {
        &self.components
    }

    /// Encode with exact end-of-component markers.
    pub fn build(&self) -> Result<Vec<u8>> {
        self.build_with_last_eoc(EOC_EXACT)
    }

    /// Encode as the inclusive upper bound of every name with this prefix.
    pub fn build_as_end_of_range(&self) -> Result<Vec<u8>> {
        self.build_with_last_eoc(EOC_END)
    }

    /// Encode as the inclusive lower bound of every name with this prefix.
    pub fn build_as_start_of_range(&self) -> Result<Vec<u8>> {
        self.build_with_last_eoc(EOC_START)
    }

    fn build_with_last_eoc(&self, last_eoc: u8) -> Result<Vec<u8>> {
        let size: usize = self.components.iter().map(|c| c.len() + 3).sum();
        let mut out = Vec::with_capacity(size);
        let last = self.components.len().saturating_sub(1);
        for (i, component) in self.components.iter().enumerate() {
            let len = u16::try_from(component.len()).map_err(|_| {
                IndexError::InvalidFormat(format!(
                    "Composite component {} is {} bytes, limit is {}",
                    i,
                    component.len(),
                    MAX_COMPONENT_LEN
                ))
            })?;
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(component);
            out.push(if i == last { last_eoc } else { EOC_EXACT });
        }
        Ok(out)
    }
}

/// Compose a list of components in one call.
pub fn build<'a, I>(components: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut builder = CompositeBuilder::new();
    for c in components {
        builder.add(c);
    }
    builder.build()
}

fn eoc_rank(eoc: u8) -> i8 {
    eoc as i8
}

/// Compare two composites component-wise using `types` for each position.
///
/// Positions beyond `types` compare as raw bytes. A composite that is a strict
/// prefix of the other sorts according to its final end-of-component byte:
/// before for exact/start markers, after for end-of-range markers.
pub fn compare(types: &[Validator], a: &[u8], b: &[u8]) -> Ordering {
    let (ca, cb) = match (split_with_eoc(a), split_with_eoc(b)) {
        (Ok(ca), Ok(cb)) => (ca, cb),
        _ => return a.cmp(b),
    };

    for i in 0..ca.len().max(cb.len()) {
        match (ca.get(i), cb.get(i)) {
            (Some(&(va, ea)), Some(&(vb, eb))) => {
                let ord = match types.get(i) {
                    Some(t) => t.compare(va, vb),
                    None => va.cmp(vb),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
                let ord = eoc_rank(ea).cmp(&eoc_rank(eb));
                if ord != Ordering::Equal {
                    // An exact component followed by more components sits
                    // between the start and end markers of the same prefix.
                    let a_more = i + 1 < ca.len();
                    let b_more = i + 1 < cb.len();
                    if !a_more && !b_more {
                        return ord;
                    }
                    if !a_more {
                        return if ea == EOC_END { Ordering::Greater } else { Ordering::Less };
                    }
                    if !b_more {
                        return if eb == EOC_END { Ordering::Less } else { Ordering::Greater };
                    }
                    return ord;
                }
            }
            (None, Some(_)) => {
                let last = ca.last().map_or(EOC_EXACT, |&(_, e)| e);
                return if last == EOC_END { Ordering::Greater } else { Ordering::Less };
            }
            (Some(_), None) => {
                let last = cb.last().map_or(EOC_EXACT, |&(_, e)| e);
                return if last == EOC_END { Ordering::Less } else { Ordering::Greater };
            }
            (None, None) => break,
        }
    }
    Ordering::Equal
}

// ── Tests ──────────────────────────────────────────────────────────
