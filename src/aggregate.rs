//! Derived figures recomputed from raw records on every request.

use std::collections::BTreeMap;

use crate::model::cash::{CashFlow, CashSummary, CashTransaction};
use crate::model::session::{Session, SessionTotals};

/// Share of inflow reported as gross margin.
pub const GROSS_MARGIN_RATE: f64 = 0.6;
/// Share of total cash reported as net.
pub const NET_RATE: f64 = 0.8;

/// Sums `expected` and `actual` per employee. Totals saturate at the `i64` bounds.
pub fn aggregate_sessions<'a, I>(sessions: I) -> BTreeMap<String, SessionTotals>
where
    I: IntoIterator<Item = &'a Session>,
{
    let mut totals: BTreeMap<String, SessionTotals> = BTreeMap::new();
    for session in sessions {
        let entry = totals.entry(session.employee_id.clone()).or_default();
        entry.expected_total = entry.expected_total.saturating_add(session.expected);
        entry.actual_total = entry.actual_total.saturating_add(session.actual);
    }
    totals
}

pub fn cash_summary(transactions: &[CashTransaction]) -> CashSummary {
    let (total_in, total_out) =
        transactions
            .iter()
            .fold((0.0, 0.0), |(inflow, outflow), txn| match txn.kind {
                CashFlow::In => (inflow + txn.amount, outflow),
                CashFlow::Out => (inflow, outflow + txn.amount),
            });
    let total_cash = total_in - total_out;

    CashSummary {
        total_in,
        total_out,
        total_cash,
        gross_margin: total_in * GROSS_MARGIN_RATE,
        net: total_cash * NET_RATE,
    }
}
