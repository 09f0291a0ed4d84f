//! Document numbering.
//!
//! Invoice, payment and reference counters are kept per company. Stores draw
//! from them inside the transaction that inserts the document, so a rejected
//! insert leaves the counter where it was.

use serde::Serialize;

use super::value_objects::trailing_sequence;

/// The reference counter is not reset per year.
pub const REFERENCE_SEQUENCE_YEAR: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceKind {
  Invoice,
  Payment,
  Reference,
}

impl SequenceKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      SequenceKind::Invoice => "invoice",
      SequenceKind::Payment => "payment",
      SequenceKind::Reference => "reference",
    }
  }
}

/// Highest sequence among the numbers carrying `year_prefix`. A counter that
/// is touched for the first time continues after it.
pub fn highest_issued<'a>(numbers: impl IntoIterator<Item = &'a str>, year_prefix: &str) -> u64 {
  numbers
    .into_iter()
    .filter(|number| number.starts_with(year_prefix))
    .filter_map(trailing_sequence)
    .max()
    .unwrap_or(0)
}
