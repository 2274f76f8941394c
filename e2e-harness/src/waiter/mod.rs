//! Job waiters
//!
//! Bounded polling of remote job state. Both waiters query sequentially and
//! sleep between queries, yielding to the runtime; neither retries on its own
//! beyond its budget.

mod output;
mod state;

pub use output::OutputWaiter;
pub use state::{JobStateWaiter, Verdict, judge};

#[cfg(test)]
pub(crate) mod testing;
