//! Cross-field validation of a normalized loan request plus overrides.
//!
//! Exactly one error is surfaced at a time: rules are checked in a fixed
//! precedence order and the first violation wins. Fixing it re-validates
//! from the top. A passing validation is what gates offer aggregation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use thiserror::Error;

use crate::normalize::LoanRequest;
use crate::offer::RateOverride;
use crate::types::Lender;

const MAX_PERCENTAGE: Decimal = dec!(100);
const MAX_CUSTOM_RATE: Decimal = dec!(99);
const MAX_CUSTOM_CAT: Decimal = dec!(100);

/// A single active input problem. Non-fatal: it blocks aggregation but the
/// engine keeps accepting input, and correcting the field clears it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    #[error("down payment exceeds vehicle value")]
    DownPaymentExceedsVehicleValue,

    #[error("down payment percentage exceeds 100")]
    PercentageExceedsHundred,

    #[error("negative value not allowed")]
    NegativeValue,

    #[error("custom rate for {lender} out of range (0-99)")]
    RateOutOfRange { lender: String },

    #[error("custom CAT for {lender} out of range (0-100)")]
    CatOutOfRange { lender: String },
}

/// Check the request and overrides against every rule, in precedence order.
///
/// `overrides` is positionally parallel to `lenders`; only lenders with an
/// active override are scanned for the custom rate/CAT rules, in catalog
/// order so the reported lender is deterministic.
pub fn validate(
    request: &LoanRequest,
    lenders: &[Lender],
    overrides: &[Option<RateOverride>],
) -> Result<(), ValidationError> {
    if request.vehicle_value > Decimal::ZERO
        && request.down_payment_amount > request.vehicle_value
    {
        return Err(ValidationError::DownPaymentExceedsVehicleValue);
    }

    if request.down_payment_percentage > MAX_PERCENTAGE {
        return Err(ValidationError::PercentageExceedsHundred);
    }

    if request.down_payment_amount < Decimal::ZERO
        || request.down_payment_percentage < Decimal::ZERO
        || request.vehicle_value < Decimal::ZERO
    {
        return Err(ValidationError::NegativeValue);
    }

    for (lender, entry) in lenders.iter().zip(overrides) {
        let Some(over) = entry else { continue };
        if let Some(rate) = over.annual_rate {
            if rate < Decimal::ZERO || rate > MAX_CUSTOM_RATE {
                return Err(ValidationError::RateOutOfRange {
                    lender: lender.name.clone(),
                });
            }
        }
    }

    for (lender, entry) in lenders.iter().zip(overrides) {
        let Some(over) = entry else { continue };
        if let Some(cat) = over.cat {
            if cat < Decimal::ZERO || cat > MAX_CUSTOM_CAT {
                return Err(ValidationError::CatOutOfRange {
                    lender: lender.name.clone(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, DownPaymentEntry, RawLoanInput};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn lender(id: u32, name: &str) -> Lender {
        Lender {
            id,
            name: name.into(),
            nominal_annual_rate: dec!(12.5),
            cat: dec!(16.2),
            origination_fee_percentage: dec!(2),
        }
    }

    fn request(vehicle: &str, pct: &str) -> LoanRequest {
        normalize(&RawLoanInput {
            vehicle_value: vehicle.into(),
            down_payment_percentage: pct.into(),
            down_payment_amount: String::new(),
            term_months: "36".into(),
            down_payment_entry: DownPaymentEntry::Percentage,
        })
    }

    #[test]
    fn test_valid_request_passes() {
        let lenders = [lender(1, "Banco Uno")];
        assert_eq!(validate(&request("300000", "20"), &lenders, &[None]), Ok(()));
    }

    #[test]
    fn test_down_payment_exceeds_value_wins_precedence() {
        // Amount > value AND percentage > 100 at once: rule 1 must win.
        let mut req = request("100000", "20");
        req.down_payment_amount = dec!(150000);
        req.down_payment_percentage = dec!(150);
        assert_eq!(
            validate(&req, &[lender(1, "Banco Uno")], &[None]),
            Err(ValidationError::DownPaymentExceedsVehicleValue)
        );
    }

    #[test]
    fn test_percentage_over_hundred() {
        let mut req = request("0", "150");
        req.down_payment_amount = Decimal::ZERO;
        assert_eq!(
            validate(&req, &[], &[]),
            Err(ValidationError::PercentageExceedsHundred)
        );
    }

    #[test]
    fn test_negative_value() {
        let mut req = request("100000", "10");
        req.vehicle_value = dec!(-1);
        assert_eq!(validate(&req, &[], &[]), Err(ValidationError::NegativeValue));
    }

    #[test]
    fn test_custom_rate_out_of_range() {
        let lenders = [lender(1, "Banco Uno"), lender(2, "Banco Dos")];
        let overrides = [
            None,
            Some(RateOverride {
                annual_rate: Some(dec!(120)),
                ..RateOverride::default()
            }),
        ];
        assert_eq!(
            validate(&request("300000", "20"), &lenders, &overrides),
            Err(ValidationError::RateOutOfRange {
                lender: "Banco Dos".into()
            })
        );
    }

    #[test]
    fn test_rate_rule_precedes_cat_rule() {
        let lenders = [lender(1, "Banco Uno"), lender(2, "Banco Dos")];
        let overrides = [
            Some(RateOverride {
                cat: Some(dec!(400)),
                ..RateOverride::default()
            }),
            Some(RateOverride {
                annual_rate: Some(dec!(-5)),
                ..RateOverride::default()
            }),
        ];
        // The bad rate on lender 2 outranks the bad CAT on lender 1.
        assert_eq!(
            validate(&request("300000", "20"), &lenders, &overrides),
            Err(ValidationError::RateOutOfRange {
                lender: "Banco Dos".into()
            })
        );
    }

    #[test]
    fn test_custom_cat_out_of_range() {
        let lenders = [lender(1, "Banco Uno")];
        let overrides = [Some(RateOverride {
            cat: Some(dec!(101)),
            ..RateOverride::default()
        })];
        assert_eq!(
            validate(&request("300000", "20"), &lenders, &overrides),
            Err(ValidationError::CatOutOfRange {
                lender: "Banco Uno".into()
            })
        );
    }

    #[test]
    fn test_boundary_values_pass() {
        let lenders = [lender(1, "Banco Uno")];
        let overrides = [Some(RateOverride {
            annual_rate: Some(dec!(99)),
            cat: Some(dec!(100)),
            ..RateOverride::default()
        })];
        assert_eq!(validate(&request("300000", "100"), &lenders, &overrides), Ok(()));
    }
}
