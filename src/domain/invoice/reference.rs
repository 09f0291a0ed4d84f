//! Swiss QR reference (QRR) support.
//!
//! A structured reference is 27 decimal digits: a 26-digit base followed by a
//! check digit computed with the recursive MOD10 algorithm. Banks recompute the
//! check digit independently, so the carry table below must never change.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::value_objects::ValueObjectError;

const CARRY_TABLE: [u8; 10] = [0, 9, 4, 6, 8, 2, 7, 1, 3, 5];

pub const REFERENCE_LENGTH: usize = 27;
pub const BASE_LENGTH: usize = REFERENCE_LENGTH - 1;
const MAX_PREFIX_LENGTH: usize = 10;

const QR_IID_RANGE: std::ops::RangeInclusive<u32> = 30000..=31999;

/// Recursive MOD10 check digit of a string of ASCII decimal digits.
pub fn compute_checksum(digits: &str) -> Result<u8, ValueObjectError> {
  let mut carry = 0u8;
  for c in digits.chars() {
    let digit = c.to_digit(10).ok_or_else(|| {
      ValueObjectError::InvalidReference(format!("Non-digit character '{}' in reference", c))
    })? as u8;
    carry = CARRY_TABLE[((carry + digit) % 10) as usize];
  }
  Ok((10 - carry) % 10)
}

/// Checks shape and check digit. Whitespace is ignored; malformed input is
/// reported as invalid rather than as an error.
pub fn validate_reference(code: &str) -> bool {
  let compact: String = code.chars().filter(|c| !c.is_whitespace()).collect();
  if compact.len() != REFERENCE_LENGTH || !compact.chars().all(|c| c.is_ascii_digit()) {
    return false;
  }

  let (base, check) = compact.split_at(BASE_LENGTH);
  match compute_checksum(base) {
    Ok(expected) => check == expected.to_string(),
    Err(_) => false,
  }
}

/// Whether the IBAN belongs to a QR-IID (30000-31999) and therefore accepts
/// structured references. Only the institution id is inspected.
pub fn is_qr_iban(iban: &str) -> bool {
  let iban: String = iban
    .chars()
    .filter(|c| !c.is_whitespace())
    .collect::<String>()
    .to_uppercase();

  if !(iban.starts_with("CH") || iban.starts_with("LI")) {
    return false;
  }

  iban
    .get(4..9)
    .filter(|iid| iid.chars().all(|c| c.is_ascii_digit()))
    .and_then(|iid| iid.parse::<u32>().ok())
    .map(|iid| QR_IID_RANGE.contains(&iid))
    .unwrap_or(false)
}

// Reference Code - validated 27-digit QR reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceCode(String);

impl ReferenceCode {
  pub fn new(code: impl Into<String>) -> Result<Self, ValueObjectError> {
    let compact: String = code.into().chars().filter(|c| !c.is_whitespace()).collect();
    if !validate_reference(&compact) {
      return Err(ValueObjectError::InvalidReference(format!(
        "'{}' is not a valid 27-digit QR reference",
        compact
      )));
    }
    Ok(Self(compact))
  }

  /// Builds the reference for a sequential counter. Non-digits are stripped
  /// from the prefix, which is then cut to 10 characters.
  pub fn generate(counter: u64, prefix: Option<&str>) -> Self {
    let prefix: String = prefix
      .unwrap_or_default()
      .chars()
      .filter(|c| c.is_ascii_digit())
      .take(MAX_PREFIX_LENGTH)
      .collect();

    let raw = format!("{}{}", prefix, counter);
    let base = if raw.len() > BASE_LENGTH {
      raw[raw.len() - BASE_LENGTH..].to_string()
    } else {
      format!("{:0>width$}", raw, width = BASE_LENGTH)
    };

    // base is all digits by construction
    let check = compute_checksum(&base).unwrap_or_default();
    Self(format!("{}{}", base, check))
  }

  pub fn value(&self) -> &str {
    &self.0
  }

  pub fn into_inner(self) -> String {
    self.0
  }

  /// Print form used on payment slips: `21 00000 00003 13947 14300 09017`.
  pub fn formatted(&self) -> String {
    let (head, rest) = self.0.split_at(2);
    let mut groups = vec![head.to_string()];
    groups.extend(
      rest
        .as_bytes()
        .chunks(5)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned()),
    );
    groups.join(" ")
  }
}

impl fmt::Display for ReferenceCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}
