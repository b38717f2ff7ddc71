//! Row reassembly
//!
//! Cells are sanitized one by one, rejoined on the raw delimiter and split
//! again. The sanitizer has already turned every in-cell `;` into `,`, so the
//! re-split boundaries are exactly the tokenizer's, and a delimiter that was
//! embedded in a free-text field stays inside that field as a comma.

use crate::sanitize::{sanitize_field, RAW_DELIMITER};

/// A tokenized input line, untrusted length
pub type RawRow = Vec<String>;

/// Sanitized, re-split cells of one line
pub type CanonicalRow = Vec<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reassembled {
    /// A row whose cells are all blank after sanitizing. Ends the input.
    EndOfData,
    Row(CanonicalRow),
}

pub fn reassemble(raw: &[String]) -> Reassembled {
    if raw.is_empty() {
        return Reassembled::Row(Vec::new());
    }

    let cells: Vec<String> = raw.iter().map(|cell| sanitize_field(cell)).collect();

    if cells.iter().all(|cell| cell.trim().is_empty()) {
        return Reassembled::EndOfData;
    }

    let joined = cells.join(&RAW_DELIMITER.to_string());
    Reassembled::Row(joined.split(RAW_DELIMITER).map(str::to_string).collect())
}
