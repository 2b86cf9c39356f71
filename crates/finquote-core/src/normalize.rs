//! Raw input coercion.
//!
//! Dealership staff type into free-form fields: currency symbols, thousands
//! separators, half-typed numbers. The normalizer turns that into a
//! consistent [`LoanRequest`] without ever failing — unparseable numerics
//! coerce to zero and validation reports the resulting state downstream.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::{Money, Percent};

/// Financing terms offered to dealership customers, in months.
pub const ALLOWED_TERMS: [u32; 5] = [12, 24, 36, 48, 60];

const HUNDRED: Decimal = dec!(100);

/// Which down-payment field the user edited last. The other one is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownPaymentEntry {
    #[default]
    Percentage,
    Amount,
}

/// Raw field values as typed, before any coercion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLoanInput {
    pub vehicle_value: String,
    pub down_payment_percentage: String,
    pub down_payment_amount: String,
    pub term_months: String,
    /// Controls which down-payment field wins when both are present.
    #[serde(default)]
    pub down_payment_entry: DownPaymentEntry,
}

/// Validated, internally consistent loan parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub vehicle_value: Money,
    pub down_payment_percentage: Percent,
    pub down_payment_amount: Money,
    pub term_months: u32,
    /// `vehicle_value - down_payment_amount`. May be negative on bad input;
    /// validation reports that case.
    pub financing_amount: Money,
}

/// Coerce raw input into a [`LoanRequest`].
///
/// Down-payment percentage and amount are kept mutually consistent: the
/// field named by `down_payment_entry` is authoritative and the other is
/// derived from it. Terms outside [`ALLOWED_TERMS`] snap to the nearest
/// allowed value (ties snap downward).
pub fn normalize(raw: &RawLoanInput) -> LoanRequest {
    let vehicle_value = parse_money(&raw.vehicle_value);
    let term_months = snap_term(parse_term(&raw.term_months));

    let (down_payment_percentage, down_payment_amount) = match raw.down_payment_entry {
        DownPaymentEntry::Amount => {
            let amount = parse_money(&raw.down_payment_amount);
            let percentage = if vehicle_value > Decimal::ZERO {
                amount / vehicle_value * HUNDRED
            } else {
                Decimal::ZERO
            };
            (percentage, amount)
        }
        DownPaymentEntry::Percentage => {
            let percentage = parse_money(&raw.down_payment_percentage);
            let amount = vehicle_value * percentage / HUNDRED;
            (percentage, amount)
        }
    };

    LoanRequest {
        vehicle_value,
        down_payment_percentage,
        down_payment_amount,
        term_months,
        financing_amount: vehicle_value - down_payment_amount,
    }
}

/// Parse a user-typed number, stripping currency symbols, separators and
/// whitespace. Anything unparseable coerces to zero.
fn parse_money(input: &str) -> Decimal {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    Decimal::from_str(&cleaned).unwrap_or(Decimal::ZERO)
}

fn parse_term(input: &str) -> u32 {
    let cleaned: String = input.chars().filter(char::is_ascii_digit).collect();
    cleaned.parse().unwrap_or(0)
}

/// Snap a term to the nearest allowed value; exact midpoints snap to the
/// shorter term.
fn snap_term(term: u32) -> u32 {
    let mut best = ALLOWED_TERMS[0];
    let mut best_distance = best.abs_diff(term);
    for candidate in ALLOWED_TERMS.into_iter().skip(1) {
        let distance = candidate.abs_diff(term);
        if distance < best_distance {
            best = candidate;
            best_distance = distance;
        }
    }
    best
}
