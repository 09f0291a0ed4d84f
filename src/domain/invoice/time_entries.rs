use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::calculator::LineItemInput;
use super::value_objects::{LineItemDescription, Money, Quantity, ValueObjectError};

pub const HOUR_UNIT: &str = "h";

const MINUTES_PER_HOUR: Decimal = dec!(60);
const QUANTITY_SCALE: u32 = 4;

// Time Entry - tracked work, read-only for invoicing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
  pub id: Uuid,
  pub company_id: Uuid,
  pub project_id: Option<Uuid>,
  pub user_id: Uuid,
  pub performer_name: String,
  pub work_date: NaiveDate,
  pub minutes: i32,
  pub hourly_rate: Option<Money>,
  pub billable: bool,
}

struct PerformerGroup {
  name: String,
  minutes: i64,
  rate: Option<Money>,
}

/// One line per performer, ordered by name. Non-billable entries are skipped.
/// The first hourly rate set in a group applies to the whole group.
pub fn aggregate_billable(
  entries: &[TimeEntry],
  default_rate: Money,
) -> Result<Vec<LineItemInput>, ValueObjectError> {
  let mut groups: BTreeMap<Uuid, PerformerGroup> = BTreeMap::new();
  for entry in entries.iter().filter(|e| e.billable) {
    let group = groups.entry(entry.user_id).or_insert_with(|| PerformerGroup {
      name: entry.performer_name.clone(),
      minutes: 0,
      rate: None,
    });
    group.minutes += i64::from(entry.minutes.max(0));
    if group.rate.is_none() {
      group.rate = entry.hourly_rate;
    }
  }

  let mut groups: Vec<PerformerGroup> = groups.into_values().collect();
  groups.sort_by(|a, b| a.name.cmp(&b.name));

  groups
    .into_iter()
    .map(|group| {
      let hours = (Decimal::from(group.minutes) / MINUTES_PER_HOUR).round_dp(QUANTITY_SCALE);
      let rate = group.rate.unwrap_or(default_rate);
      Ok(LineItemInput {
        description: LineItemDescription::new(format!(
          "{}: {} h at {:.2}/h",
          group.name,
          hours.normalize(),
          rate.amount()
        ))?,
        quantity: Quantity::new(hours)?,
        unit: HOUR_UNIT.to_string(),
        unit_price: rate,
        discount: None,
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(user_id: Uuid, name: &str, minutes: i32, rate: Option<Decimal>) -> TimeEntry {
    TimeEntry {
      id: Uuid::new_v4(),
      company_id: Uuid::nil(),
      project_id: None,
      user_id,
      performer_name: name.to_string(),
      work_date: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
      minutes,
      hourly_rate: rate.map(|r| Money::new(r).unwrap()),
      billable: true,
    }
  }

  #[test]
  fn test_groups_by_performer_ordered_by_name() {
    let zoe = Uuid::new_v4();
    let anna = Uuid::new_v4();
    let entries = vec![
      entry(zoe, "Zoe", 90, Some(dec!(150))),
      entry(anna, "Anna", 30, None),
      entry(zoe, "Zoe", 45, Some(dec!(200))),
      entry(anna, "Anna", 30, Some(dec!(120))),
    ];

    let lines = aggregate_billable(&entries, Money::new(dec!(100)).unwrap()).unwrap();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].description.value(), "Anna: 1 h at 120.00/h");
    assert_eq!(lines[0].quantity.value(), dec!(1));
    assert_eq!(lines[0].unit_price.amount(), dec!(120));
    assert_eq!(lines[1].description.value(), "Zoe: 2.25 h at 150.00/h");
    assert_eq!(lines[1].unit, HOUR_UNIT);
  }

  #[test]
  fn test_default_rate_and_rounding() {
    let user = Uuid::new_v4();
    let lines = aggregate_billable(
      &[entry(user, "Max", 10, None)],
      Money::new(dec!(95)).unwrap(),
    )
    .unwrap();

    assert_eq!(lines[0].quantity.value(), dec!(0.1667));
    assert_eq!(lines[0].unit_price.amount(), dec!(95));
  }

  #[test]
  fn test_non_billable_entries_are_ignored() {
    let mut internal = entry(Uuid::new_v4(), "Max", 60, None);
    internal.billable = false;
    let lines = aggregate_billable(&[internal], Money::ZERO).unwrap();
    assert!(lines.is_empty());
  }
}
