//! Per-lender term resolution, offer computation and ranking.
//!
//! Each lender's effective parameters are the global request merged with
//! that lender's override, if any. Offers are computed independently per
//! lender and stably ranked by monthly payment, so a negotiated override on
//! one lender never perturbs another lender's result.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{compute_schedule, AmortizationRow};
use crate::error::FinquoteError;
use crate::normalize::LoanRequest;
use crate::types::{round_money, with_metadata, ComputationOutput, Lender, Money, Percent};
use crate::FinquoteResult;

/// Indicative CAT multiplier when a custom rate has no custom CAT.
/// Heuristic carried from dealership practice, not a disclosure figure.
const CAT_ESTIMATE_FACTOR: Decimal = dec!(1.3);

const HUNDRED: Decimal = dec!(100);

/// Per-lender replacement of one or more global loan parameters, used to
/// model a custom negotiated offer. Unset fields fall back to the global
/// request and the lender's catalog terms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_rate: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cat: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_months: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_payment_amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financing_amount: Option<Money>,
}

impl RateOverride {
    pub fn is_active(&self) -> bool {
        self.annual_rate.is_some()
            || self.cat.is_some()
            || self.term_months.is_some()
            || self.down_payment_amount.is_some()
            || self.financing_amount.is_some()
    }
}

/// The parameter set actually priced for one lender, after merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveTerms {
    pub annual_rate: Percent,
    pub cat: Percent,
    pub term_months: u32,
    pub down_payment_amount: Money,
    pub financing_amount: Money,
    /// True when the CAT was estimated from a custom rate; indicative only.
    pub cat_estimated: bool,
}

/// One priced offer for one lender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferResult {
    pub lender_id: u32,
    pub lender_name: String,
    pub terms: EffectiveTerms,
    pub monthly_payment: Money,
    pub total_paid: Money,
    pub total_interest: Money,
    pub origination_fee: Money,
    pub has_override: bool,
    pub schedule: Vec<AmortizationRow>,
}

/// Aggregation input: the catalog, the global request, one override slot per
/// lender, and an optional id subset to price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub lenders: Vec<Lender>,
    pub request: LoanRequest,
    /// Positionally parallel to `lenders`. Empty means no overrides at all.
    #[serde(default)]
    pub overrides: Vec<Option<RateOverride>>,
    /// Price only these lender ids when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_lender_ids: Option<Vec<u32>>,
    /// First due date is one month after this date.
    pub start_date: NaiveDate,
}

/// Ranked offers. The first offer is the best option by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonOutput {
    pub offers: Vec<OfferResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_lender_id: Option<u32>,
}

/// Merge one lender's catalog terms, the global request and an optional
/// override into the parameter set to price.
pub fn resolve_terms(
    lender: &Lender,
    request: &LoanRequest,
    override_entry: Option<&RateOverride>,
) -> EffectiveTerms {
    let over = match override_entry {
        Some(o) if o.is_active() => o,
        _ => {
            return EffectiveTerms {
                annual_rate: lender.nominal_annual_rate,
                cat: lender.cat,
                term_months: request.term_months,
                down_payment_amount: request.down_payment_amount,
                financing_amount: request.financing_amount,
                cat_estimated: false,
            }
        }
    };

    let annual_rate = over.annual_rate.unwrap_or(lender.nominal_annual_rate);

    // A negotiated rate without a negotiated CAT gets an indicative CAT
    // estimate; a catalog rate keeps the catalog CAT.
    let (cat, cat_estimated) = match (over.cat, over.annual_rate) {
        (Some(custom_cat), _) => (custom_cat, false),
        (None, Some(custom_rate)) => (custom_rate * CAT_ESTIMATE_FACTOR, true),
        (None, None) => (lender.cat, false),
    };

    let down_payment_amount = over
        .down_payment_amount
        .unwrap_or(request.down_payment_amount);
    let financing_amount = over.financing_amount.unwrap_or(match over.down_payment_amount {
        Some(custom_down) => request.vehicle_value - custom_down,
        None => request.financing_amount,
    });

    EffectiveTerms {
        annual_rate,
        cat,
        term_months: over.term_months.unwrap_or(request.term_months),
        down_payment_amount,
        financing_amount,
        cat_estimated,
    }
}

/// Price one lender's offer from already-resolved terms.
fn price_offer(
    lender: &Lender,
    terms: EffectiveTerms,
    has_override: bool,
    start_date: NaiveDate,
) -> OfferResult {
    let out = compute_schedule(
        terms.financing_amount,
        terms.annual_rate,
        terms.term_months,
        start_date,
    );

    let total_paid = out.monthly_payment * Decimal::from(terms.term_months);
    let total_interest = if out.is_empty() {
        Decimal::ZERO
    } else {
        total_paid - terms.financing_amount
    };
    let origination_fee = terms.financing_amount.max(Decimal::ZERO)
        * lender.origination_fee_percentage
        / HUNDRED;

    OfferResult {
        lender_id: lender.id,
        lender_name: lender.name.clone(),
        monthly_payment: out.monthly_payment,
        total_paid: round_money(total_paid),
        total_interest: round_money(total_interest),
        origination_fee: round_money(origination_fee),
        has_override,
        schedule: out.schedule,
        terms,
    }
}

/// Resolve, price and rank every candidate lender.
///
/// Offers are sorted ascending by monthly payment, ties by total paid, and
/// the sort is stable so exact ties keep catalog order.
pub fn compare_offers(
    input: &ComparisonInput,
) -> FinquoteResult<ComputationOutput<ComparisonOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if !input.overrides.is_empty() && input.overrides.len() != input.lenders.len() {
        return Err(FinquoteError::InvalidInput {
            field: "overrides".into(),
            reason: format!(
                "expected one override slot per lender ({}), got {}",
                input.lenders.len(),
                input.overrides.len()
            ),
        });
    }

    if let Some(ids) = &input.selected_lender_ids {
        for id in ids {
            if !input.lenders.iter().any(|l| l.id == *id) {
                return Err(FinquoteError::UnknownLender(*id));
            }
        }
    }

    let mut offers = Vec::with_capacity(input.lenders.len());
    for (index, lender) in input.lenders.iter().enumerate() {
        if let Some(ids) = &input.selected_lender_ids {
            if !ids.contains(&lender.id) {
                continue;
            }
        }

        let override_entry = input.overrides.get(index).and_then(Option::as_ref);
        let has_override = override_entry.is_some_and(RateOverride::is_active);
        let terms = resolve_terms(lender, &input.request, override_entry);

        if terms.cat_estimated {
            warnings.push(format!(
                "{}: CAT estimated from custom rate (x1.3); indicative only",
                lender.name
            ));
        }

        offers.push(price_offer(lender, terms, has_override, input.start_date));
    }

    // Vec::sort_by is stable: exact ties keep catalog order.
    offers.sort_by(|a, b| {
        a.monthly_payment
            .cmp(&b.monthly_payment)
            .then(a.total_paid.cmp(&b.total_paid))
    });

    let best_lender_id = offers.first().map(|o| o.lender_id);
    let output = ComparisonOutput {
        offers,
        best_lender_id,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Multi-Lender Offer Comparison",
        &serde_json::json!({
            "financing_amount": input.request.financing_amount.to_string(),
            "term_months": input.request.term_months,
            "lenders": input.lenders.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
