//! Fixed-rate amortization schedule generation.
//!
//! Standard amortizing-loan math: a closed-form monthly payment followed by a
//! row-by-row split of each payment into interest and principal. All math in
//! `rust_decimal::Decimal`; currency values are rounded to cents only on the
//! emitted rows, never in the running balance.

use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{round_money, Money, Percent};

/// Balance below this is treated as fully repaid.
const BALANCE_EPSILON: Decimal = dec!(0.01);

const MONTHS_PER_YEAR: Decimal = dec!(12);
const HUNDRED: Decimal = dec!(100);

/// One row of an amortization schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// Payment number, 1-indexed.
    pub payment_index: u32,
    /// Due date: start date advanced by `payment_index` calendar months.
    pub due_date: NaiveDate,
    /// Total payment for the period.
    pub payment_amount: Money,
    /// Portion of the payment that reduces the balance.
    pub principal_component: Money,
    /// Portion of the payment that covers accrued interest.
    pub interest_component: Money,
    /// Outstanding balance after this payment. Zero on the final row.
    pub remaining_balance: Money,
}

/// Monthly payment plus the full schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutput {
    pub monthly_payment: Money,
    pub schedule: Vec<AmortizationRow>,
}

impl ScheduleOutput {
    fn empty() -> Self {
        ScheduleOutput {
            monthly_payment: Decimal::ZERO,
            schedule: Vec::new(),
        }
    }

    /// True when the inputs were not yet computable (zero payment, no rows).
    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty()
    }
}

/// Build the amortization schedule for a fixed-rate loan.
///
/// Degenerate inputs (non-positive principal or rate, zero term) yield an
/// empty schedule with a zero payment. Callers treat that as "not yet
/// computable", not as a failure.
pub fn compute_schedule(
    principal: Money,
    annual_rate_percent: Percent,
    term_months: u32,
    start_date: NaiveDate,
) -> ScheduleOutput {
    if principal <= Decimal::ZERO || annual_rate_percent <= Decimal::ZERO || term_months == 0 {
        return ScheduleOutput::empty();
    }

    let monthly_rate = annual_rate_percent / HUNDRED / MONTHS_PER_YEAR;
    let n = Decimal::from(term_months);
    let growth = (Decimal::ONE + monthly_rate).powd(n);

    // payment = P * r * (1+r)^n / ((1+r)^n - 1); denominator is positive
    // whenever r > 0 and n >= 1.
    let payment = principal * monthly_rate * growth / (growth - Decimal::ONE);

    let mut schedule = Vec::with_capacity(term_months as usize);
    let mut balance = principal;

    for index in 1..=term_months {
        let interest = balance * monthly_rate;
        let principal_part = payment - interest;
        balance -= principal_part;

        // Clamp residue from the closed-form payment not dividing evenly.
        if balance < BALANCE_EPSILON || index == term_months {
            balance = Decimal::ZERO;
        }

        schedule.push(AmortizationRow {
            payment_index: index,
            due_date: add_months(start_date, index),
            payment_amount: round_money(payment),
            principal_component: round_money(principal_part),
            interest_component: round_money(interest),
            remaining_balance: round_money(balance),
        });
    }

    ScheduleOutput {
        monthly_payment: round_money(payment),
        schedule,
    }
}

/// Calendar-month date arithmetic, not fixed 30-day increments. Days past the
/// end of a shorter month land on that month's last day (chrono semantics).
fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_payment_matches_closed_form() {
        // 100,000 at 12% annual over 36 months: r = 0.01,
        // payment = 100000 * 0.01 * 1.01^36 / (1.01^36 - 1) ≈ 3321.43
        let out = compute_schedule(dec!(100000), dec!(12), 36, start());
        assert!((out.monthly_payment - dec!(3321.43)).abs() < dec!(0.01));
        assert_eq!(out.schedule.len(), 36);
    }

    #[test]
    fn test_principal_conservation() {
        let principal = dec!(250000);
        let out = compute_schedule(principal, dec!(9.9), 48, start());
        let repaid: Decimal = out.schedule.iter().map(|r| r.principal_component).sum();
        let tolerance = Decimal::from(48) * dec!(0.01);
        assert!(
            (repaid - principal).abs() <= tolerance,
            "repaid {repaid} vs principal {principal}"
        );
    }

    #[test]
    fn test_balance_monotone_and_terminal_zero() {
        let out = compute_schedule(dec!(180000), dec!(14.5), 60, start());
        let mut previous = dec!(180000);
        for row in &out.schedule {
            assert!(row.remaining_balance <= previous);
            previous = row.remaining_balance;
        }
        assert_eq!(out.schedule.last().unwrap().remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_first_row_split() {
        // First period interest = 100000 * 0.01 = 1000.
        let out = compute_schedule(dec!(100000), dec!(12), 36, start());
        let first = &out.schedule[0];
        assert_eq!(first.interest_component, dec!(1000.00));
        assert_eq!(
            first.principal_component,
            out.monthly_payment - dec!(1000.00)
        );
    }

    #[test]
    fn test_degenerate_inputs_yield_empty() {
        for out in [
            compute_schedule(Decimal::ZERO, dec!(12), 36, start()),
            compute_schedule(dec!(100000), Decimal::ZERO, 36, start()),
            compute_schedule(dec!(100000), dec!(12), 0, start()),
            compute_schedule(dec!(-5000), dec!(12), 36, start()),
        ] {
            assert!(out.is_empty());
            assert_eq!(out.monthly_payment, Decimal::ZERO);
        }
    }

    #[test]
    fn test_due_dates_advance_by_calendar_month() {
        let out = compute_schedule(dec!(12000), dec!(10), 14, start());
        assert_eq!(
            out.schedule[0].due_date,
            NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()
        );
        // Crosses the year boundary at row 12.
        assert_eq!(
            out.schedule[11].due_date,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
        assert_eq!(
            out.schedule[13].due_date,
            NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
        );
    }

    #[test]
    fn test_month_end_clamps_to_shorter_month() {
        let jan31 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let out = compute_schedule(dec!(6000), dec!(10), 2, jan31);
        // 2024 is a leap year.
        assert_eq!(
            out.schedule[0].due_date,
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }
}
