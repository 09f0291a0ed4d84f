use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::value_objects::{
  DiscountPercent, LineItemDescription, Money, Quantity, ValueObjectError, VatRate,
};

/// Swiss standard VAT rate in percent (since 2024).
pub const STANDARD_VAT_RATE: Decimal = dec!(8.1);

pub const DEFAULT_UNIT: &str = "pcs";

/// Line item as entered, before any amounts are derived.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemInput {
  pub description: LineItemDescription,
  pub quantity: Quantity,
  pub unit: String,
  pub unit_price: Money,
  pub discount: Option<DiscountPercent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalculatedLine {
  pub position: i32,
  pub input: LineItemInput,
  pub line_total: Money,
  pub tax_rate: VatRate,
  pub tax_amount: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
  pub subtotal: Money,
  pub tax_amount: Money,
  pub total: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceCalculation {
  pub lines: Vec<CalculatedLine>,
  pub totals: InvoiceTotals,
}

/// `unit_price × (1 − discount/100) × quantity`, without rounding.
pub fn line_total(input: &LineItemInput) -> Result<Money, ValueObjectError> {
  let discounted = match input.discount {
    Some(discount) => input.unit_price.multiply(discount.remaining_factor())?,
    None => input.unit_price,
  };
  discounted.multiply(input.quantity.value())
}

/// Derives line totals, per-line tax and the invoice totals for one VAT rate.
/// Positions are assigned 1..=n in input order.
pub fn calculate(
  lines: Vec<LineItemInput>,
  vat_rate: VatRate,
) -> Result<InvoiceCalculation, ValueObjectError> {
  let mut subtotal = Money::ZERO;
  let mut calculated = Vec::with_capacity(lines.len());

  for (i, input) in lines.into_iter().enumerate() {
    let line_total = line_total(&input)?;
    let tax_amount = line_total.multiply(vat_rate.as_multiplier())?;
    subtotal = subtotal.add(&line_total)?;
    calculated.push(CalculatedLine {
      position: (i + 1) as i32,
      input,
      line_total,
      tax_rate: vat_rate,
      tax_amount,
    });
  }

  let tax_amount = subtotal.multiply(vat_rate.as_multiplier())?;
  let total = subtotal.add(&tax_amount)?;

  Ok(InvoiceCalculation {
    lines: calculated,
    totals: InvoiceTotals {
      subtotal,
      tax_amount,
      total,
    },
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  fn input(quantity: Decimal, unit_price: Decimal, discount: Option<Decimal>) -> LineItemInput {
    LineItemInput {
      description: LineItemDescription::new("Consulting".to_string()).unwrap(),
      quantity: Quantity::new(quantity).unwrap(),
      unit: DEFAULT_UNIT.to_string(),
      unit_price: Money::new(unit_price).unwrap(),
      discount: discount.map(|d| DiscountPercent::new(d).unwrap()),
    }
  }

  fn standard_rate() -> VatRate {
    VatRate::new(STANDARD_VAT_RATE).unwrap()
  }

  #[test]
  fn test_line_total_without_discount() {
    let total = line_total(&input(dec!(3), dec!(120), None)).unwrap();
    assert_eq!(total.amount(), dec!(360));
  }

  #[test]
  fn test_line_total_with_discount() {
    let total = line_total(&input(dec!(2), dec!(99.90), Some(dec!(10)))).unwrap();
    assert_eq!(total.amount(), dec!(179.82));
  }

  #[test]
  fn test_full_discount_and_zero_quantity() {
    assert!(line_total(&input(dec!(5), dec!(40), Some(dec!(100)))).unwrap().is_zero());
    assert!(line_total(&input(dec!(0), dec!(40), None)).unwrap().is_zero());
  }

  #[test]
  fn test_invoice_totals() {
    let result = calculate(
      vec![
        input(dec!(2), dec!(100), None),
        input(dec!(1), dec!(50), Some(dec!(20))),
      ],
      standard_rate(),
    )
    .unwrap();

    assert_eq!(result.totals.subtotal.amount(), dec!(240));
    assert_eq!(result.totals.tax_amount.amount(), dec!(19.44));
    assert_eq!(result.totals.total.amount(), dec!(259.44));

    assert_eq!(result.lines[0].position, 1);
    assert_eq!(result.lines[1].position, 2);
    assert_eq!(result.lines[0].tax_amount.amount(), dec!(16.2));
    assert_eq!(result.lines[1].line_total.amount(), dec!(40));
  }

  #[test]
  fn test_chained_discounts_do_not_drift() {
    // 0.1 + 0.2 style values that drift in binary floating point
    let result = calculate(
      vec![
        input(dec!(3), dec!(0.10), Some(dec!(33.3))),
        input(dec!(7), dec!(0.20), Some(dec!(12.5))),
        input(dec!(1.25), dec!(19.99), Some(dec!(7))),
      ],
      standard_rate(),
    )
    .unwrap();

    let expected_subtotal = dec!(0.2001) + dec!(1.225) + dec!(23.2383750);
    assert_eq!(result.totals.subtotal.amount(), expected_subtotal);
    assert_eq!(
      result.totals.total.amount(),
      expected_subtotal + expected_subtotal * dec!(0.081)
    );
  }

  #[test]
  fn test_empty_input_yields_zero_totals() {
    let result = calculate(vec![], standard_rate()).unwrap();
    assert!(result.totals.total.is_zero());
    assert!(result.lines.is_empty());
  }

  proptest! {
    #[test]
    fn prop_totals_are_exact(
      lines in prop::collection::vec((0i64..10_000, 0i64..1_000_000, 0i64..=100), 1..8)
    ) {
      let inputs: Vec<LineItemInput> = lines
        .iter()
        .map(|(qty, price, discount)| {
          input(
            Decimal::new(*qty, 2),
            Decimal::new(*price, 2),
            Some(Decimal::from(*discount)),
          )
        })
        .collect();

      let expected_subtotal: Decimal = lines
        .iter()
        .map(|(qty, price, discount)| {
          Decimal::new(*price, 2)
            * ((Decimal::ONE_HUNDRED - Decimal::from(*discount)) / Decimal::ONE_HUNDRED)
            * Decimal::new(*qty, 2)
        })
        .sum();

      let result = calculate(inputs, standard_rate()).unwrap();
      prop_assert_eq!(result.totals.subtotal.amount(), expected_subtotal);
      prop_assert_eq!(
        result.totals.total.amount(),
        expected_subtotal + expected_subtotal * dec!(0.081)
      );
      prop_assert_eq!(
        result.totals.total.amount(),
        result.totals.subtotal.amount() + result.totals.tax_amount.amount()
      );
    }
  }
}
