//! Vehicle financing pricing engine for dealership staff: amortization
//! schedules, per-lender offer resolution with negotiated overrides, ranked
//! multi-lender comparison, and a debounced recompute session.
//!
//! The engine is a pure calculator over caller-supplied inputs. Persistence,
//! authentication and presentation live in external collaborators that feed
//! it plain data and consume its plain results.

pub mod amortization;
pub mod error;
pub mod normalize;
pub mod offer;
pub mod session;
pub mod types;
pub mod validation;

pub use error::FinquoteError;
pub use types::*;

/// Standard result type for all finquote operations
pub type FinquoteResult<T> = Result<T, FinquoteError>;
