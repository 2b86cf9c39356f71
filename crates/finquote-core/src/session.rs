//! Pricing session with debounced recomputation.
//!
//! The original tool recomputed reactively on every keystroke; here the
//! contract is explicit: mutations arm a cancellable logical timer, and only
//! after the debounce interval passes with no further edits does the session
//! run normalize → validate → (compare when offers were requested) and
//! commit a snapshot. A newer mutation always supersedes an armed timer, so
//! stale values are never committed.
//!
//! Time is a caller-supplied `Instant`, which keeps the debounce contract
//! testable without sleeping.

use chrono::NaiveDate;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::error::FinquoteError;
use crate::normalize::{normalize, DownPaymentEntry, LoanRequest, RawLoanInput};
use crate::offer::{compare_offers, ComparisonInput, ComparisonOutput, RateOverride};
use crate::types::Lender;
use crate::validation::{validate, ValidationError};
use crate::FinquoteResult;

/// Default debounce interval between the last edit and recomputation.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Scheduler state. `Computing` is observable only from within a `poll`
/// call; between calls the session is either idle or waiting out the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulerState {
    Idle,
    Pending,
    Computing,
}

/// Cancellable debounce timer. Arming while `Pending` replaces the deadline
/// and bumps the generation, so an expiry only ever fires for the latest
/// mutation (last write wins).
#[derive(Debug)]
struct RecomputeScheduler {
    state: SchedulerState,
    deadline: Option<Instant>,
    generation: u64,
    debounce: Duration,
}

impl RecomputeScheduler {
    fn new(debounce: Duration) -> Self {
        RecomputeScheduler {
            state: SchedulerState::Idle,
            deadline: None,
            generation: 0,
            debounce,
        }
    }

    fn arm(&mut self, now: Instant) {
        self.state = SchedulerState::Pending;
        self.deadline = Some(now + self.debounce);
        self.generation += 1;
    }

    /// Returns the generation to compute when the timer has expired.
    fn fire(&mut self, now: Instant) -> Option<u64> {
        match (self.state, self.deadline) {
            (SchedulerState::Pending, Some(deadline)) if now >= deadline => {
                self.state = SchedulerState::Computing;
                self.deadline = None;
                Some(self.generation)
            }
            _ => None,
        }
    }

    fn settle(&mut self) {
        if self.state == SchedulerState::Computing {
            self.state = SchedulerState::Idle;
        }
    }
}

/// Committed output of one recomputation.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    /// Mutation generation this snapshot reflects.
    pub generation: u64,
    pub request: LoanRequest,
    /// `None` when the inputs passed every rule.
    pub validation: Option<ValidationError>,
    /// Present only when offers were requested and validation passed.
    pub offers: Option<ComparisonOutput>,
}

/// One staff pricing session: raw input, lender catalog, per-lender
/// overrides, and the debounce scheduler. Snapshots are derived values;
/// nothing here persists beyond the session.
#[derive(Debug)]
pub struct PricingSession {
    raw: RawLoanInput,
    lenders: Vec<Lender>,
    overrides: Vec<Option<RateOverride>>,
    start_date: NaiveDate,
    offers_requested: bool,
    scheduler: RecomputeScheduler,
    snapshot: Option<SessionSnapshot>,
    recompute_count: u64,
}

impl PricingSession {
    pub fn new(lenders: Vec<Lender>, start_date: NaiveDate) -> Self {
        Self::with_debounce(lenders, start_date, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(lenders: Vec<Lender>, start_date: NaiveDate, debounce: Duration) -> Self {
        let overrides = vec![None; lenders.len()];
        PricingSession {
            raw: RawLoanInput::default(),
            lenders,
            overrides,
            start_date,
            offers_requested: false,
            scheduler: RecomputeScheduler::new(debounce),
            snapshot: None,
            recompute_count: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state
    }

    /// Latest committed snapshot, if any recomputation has run.
    pub fn snapshot(&self) -> Option<&SessionSnapshot> {
        self.snapshot.as_ref()
    }

    /// Number of recomputations actually committed. Rapid edits collapse
    /// into one.
    pub fn recompute_count(&self) -> u64 {
        self.recompute_count
    }

    pub fn set_vehicle_value(&mut self, value: impl Into<String>, now: Instant) {
        self.raw.vehicle_value = value.into();
        self.scheduler.arm(now);
    }

    pub fn set_down_payment_percentage(&mut self, value: impl Into<String>, now: Instant) {
        self.raw.down_payment_percentage = value.into();
        self.raw.down_payment_entry = DownPaymentEntry::Percentage;
        self.scheduler.arm(now);
    }

    pub fn set_down_payment_amount(&mut self, value: impl Into<String>, now: Instant) {
        self.raw.down_payment_amount = value.into();
        self.raw.down_payment_entry = DownPaymentEntry::Amount;
        self.scheduler.arm(now);
    }

    pub fn set_term_months(&mut self, value: impl Into<String>, now: Instant) {
        self.raw.term_months = value.into();
        self.scheduler.arm(now);
    }

    /// Replace one lender's override slot. Errors on an unknown id rather
    /// than silently ignoring the edit.
    pub fn set_override(
        &mut self,
        lender_id: u32,
        over: RateOverride,
        now: Instant,
    ) -> FinquoteResult<()> {
        let index = self.lender_index(lender_id)?;
        self.overrides[index] = Some(over);
        self.scheduler.arm(now);
        Ok(())
    }

    pub fn clear_override(&mut self, lender_id: u32, now: Instant) -> FinquoteResult<()> {
        let index = self.lender_index(lender_id)?;
        self.overrides[index] = None;
        self.scheduler.arm(now);
        Ok(())
    }

    /// Toggle whether the expensive aggregation step runs on recompute.
    /// Validation always runs.
    pub fn set_offers_requested(&mut self, requested: bool, now: Instant) {
        self.offers_requested = requested;
        self.scheduler.arm(now);
    }

    /// Drive the timer. Commits and returns a fresh snapshot when the
    /// debounce interval has expired with no newer mutation; otherwise
    /// returns `None` and the session stays as-is.
    pub fn poll(&mut self, now: Instant) -> FinquoteResult<Option<&SessionSnapshot>> {
        let Some(generation) = self.scheduler.fire(now) else {
            return Ok(None);
        };

        let request = normalize(&self.raw);
        let validation = validate(&request, &self.lenders, &self.overrides).err();

        let offers = if self.offers_requested && validation.is_none() {
            let input = ComparisonInput {
                lenders: self.lenders.clone(),
                request: request.clone(),
                overrides: self.overrides.clone(),
                selected_lender_ids: None,
                start_date: self.start_date,
            };
            Some(compare_offers(&input)?.result)
        } else {
            None
        };

        self.scheduler.settle();

        // Only the latest generation may commit. With a single writer this
        // always holds; the check documents the supersession contract.
        if generation == self.scheduler.generation {
            self.snapshot = Some(SessionSnapshot {
                generation,
                request,
                validation,
                offers,
            });
            self.recompute_count += 1;
        }

        Ok(self.snapshot.as_ref())
    }

    fn lender_index(&self, lender_id: u32) -> FinquoteResult<usize> {
        self.lenders
            .iter()
            .position(|l| l.id == lender_id)
            .ok_or(FinquoteError::UnknownLender(lender_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn lenders() -> Vec<Lender> {
        vec![
            Lender {
                id: 1,
                name: "Banco Uno".into(),
                nominal_annual_rate: dec!(12),
                cat: dec!(15.5),
                origination_fee_percentage: dec!(2),
            },
            Lender {
                id: 2,
                name: "Banco Dos".into(),
                nominal_annual_rate: dec!(10.5),
                cat: dec!(13.9),
                origination_fee_percentage: dec!(1.5),
            },
        ]
    }

    fn session() -> PricingSession {
        PricingSession::new(lenders(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    }

    #[test]
    fn test_idle_until_first_mutation() {
        let mut s = session();
        assert_eq!(s.state(), SchedulerState::Idle);
        assert!(s.poll(Instant::now()).unwrap().is_none());
        assert_eq!(s.recompute_count(), 0);
    }

    #[test]
    fn test_poll_before_deadline_does_nothing() {
        let mut s = session();
        let t0 = Instant::now();
        s.set_vehicle_value("300000", t0);
        assert_eq!(s.state(), SchedulerState::Pending);
        assert!(s.poll(t0 + Duration::from_millis(100)).unwrap().is_none());
        assert_eq!(s.state(), SchedulerState::Pending);
    }

    #[test]
    fn test_rapid_mutations_collapse_to_one_recompute() {
        let mut s = session();
        let t0 = Instant::now();
        s.set_vehicle_value("100000", t0);
        s.set_vehicle_value("200000", t0 + Duration::from_millis(50));
        s.set_vehicle_value("300000", t0 + Duration::from_millis(100));

        // Still within the window of the last edit: nothing fires.
        assert!(s.poll(t0 + Duration::from_millis(350)).unwrap().is_none());

        let snap = s
            .poll(t0 + Duration::from_millis(450))
            .unwrap()
            .expect("timer expired")
            .clone();
        assert_eq!(s.recompute_count(), 1);
        // Only the final value was committed.
        assert_eq!(snap.request.vehicle_value, dec!(300000));
        assert_eq!(s.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_mutation_rearms_after_commit() {
        let mut s = session();
        let t0 = Instant::now();
        s.set_vehicle_value("100000", t0);
        s.poll(t0 + Duration::from_millis(400)).unwrap();
        assert_eq!(s.recompute_count(), 1);

        s.set_term_months("48", t0 + Duration::from_millis(500));
        assert_eq!(s.state(), SchedulerState::Pending);
        let snap = s
            .poll(t0 + Duration::from_millis(900))
            .unwrap()
            .expect("second commit")
            .clone();
        assert_eq!(s.recompute_count(), 2);
        assert_eq!(snap.request.term_months, 48);
    }

    #[test]
    fn test_validation_error_blocks_offers() {
        let mut s = session();
        let t0 = Instant::now();
        s.set_offers_requested(true, t0);
        s.set_vehicle_value("100000", t0);
        s.set_down_payment_amount("150000", t0);

        let snap = s
            .poll(t0 + Duration::from_millis(400))
            .unwrap()
            .expect("commit")
            .clone();
        assert_eq!(
            snap.validation,
            Some(ValidationError::DownPaymentExceedsVehicleValue)
        );
        assert!(snap.offers.is_none());
    }

    #[test]
    fn test_offers_computed_when_requested_and_valid() {
        let mut s = session();
        let t0 = Instant::now();
        s.set_vehicle_value("300000", t0);
        s.set_down_payment_percentage("20", t0);
        s.set_term_months("36", t0);
        s.set_offers_requested(true, t0);

        let snap = s
            .poll(t0 + Duration::from_millis(400))
            .unwrap()
            .expect("commit")
            .clone();
        assert!(snap.validation.is_none());
        let offers = snap.offers.expect("offers requested");
        assert_eq!(offers.offers.len(), 2);
        // Banco Dos has the lower rate.
        assert_eq!(offers.best_lender_id, Some(2));
    }

    #[test]
    fn test_override_mutations_debounce_too() {
        let mut s = session();
        let t0 = Instant::now();
        s.set_vehicle_value("300000", t0);
        s.set_down_payment_percentage("20", t0);
        s.set_offers_requested(true, t0);
        s.poll(t0 + Duration::from_millis(400)).unwrap();

        let over = RateOverride {
            annual_rate: Some(dec!(8)),
            ..RateOverride::default()
        };
        s.set_override(1, over, t0 + Duration::from_millis(500)).unwrap();
        assert_eq!(s.state(), SchedulerState::Pending);

        let snap = s
            .poll(t0 + Duration::from_millis(900))
            .unwrap()
            .expect("commit")
            .clone();
        let offers = snap.offers.expect("offers");
        let uno = offers.offers.iter().find(|o| o.lender_id == 1).unwrap();
        assert!(uno.has_override);
        assert_eq!(uno.terms.annual_rate, dec!(8));
    }

    #[test]
    fn test_unknown_override_lender_errors() {
        let mut s = session();
        assert!(s
            .set_override(99, RateOverride::default(), Instant::now())
            .is_err());
    }
}
