//! Summary facts over a batch of sales records.
//!
//! Three independent reductions, each a single pass in batch order:
//! revenue leader, unit-sales leader and most popular model year. Every
//! running maximum starts at zero and only moves on a strict `>`, so the
//! earliest maximal record wins and an all-zero metric yields `None`.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sales_core::error::{RecordRef, ReportError, Result};
use sales_core::models::{Batch, PopularYear, RevenueLeader, SalesLeader, SummaryFacts};
use sales_core::money::{parse_price, NumberFormat};
use tracing::debug;

/// Derive all three summary facts from `batch`.
///
/// Fails on the first record whose price does not parse; no partial facts
/// are returned in that case.
pub fn summarize(batch: &Batch, format: &NumberFormat) -> Result<SummaryFacts> {
    let facts = SummaryFacts {
        revenue_leader: revenue_leader(batch, format)?,
        sales_leader: sales_leader(batch),
        popular_year: popular_year(batch)?,
    };

    debug!(
        records = batch.len(),
        revenue_leader = ?facts.revenue_leader.as_ref().map(|l| l.record_id),
        sales_leader = ?facts.sales_leader.as_ref().map(|l| l.record_id),
        popular_year = ?facts.popular_year.map(|p| p.year),
        "summarized sales batch"
    );

    Ok(facts)
}

/// The record with the greatest `price × total_sales`.
///
/// Every price in the batch is parsed, including those after the current
/// leader.
pub fn revenue_leader(batch: &Batch, format: &NumberFormat) -> Result<Option<RevenueLeader>> {
    let mut best: Option<RevenueLeader> = None;
    let mut best_revenue = Decimal::ZERO;

    for record in batch {
        let price = parse_price(&record.price, format).map_err(|source| ReportError::Parse {
            id: record.id,
            source,
        })?;
        let revenue = price
            .checked_mul(Decimal::from(record.total_sales))
            .ok_or_else(|| ReportError::validation(RecordRef::Id(record.id), "revenue overflows"))?;

        if revenue > best_revenue {
            best_revenue = revenue;
            best = Some(RevenueLeader {
                record_id: record.id,
                vehicle: record.vehicle.clone(),
                revenue,
            });
        }
    }

    Ok(best)
}

/// The record with the greatest unit count.
pub fn sales_leader(batch: &Batch) -> Option<SalesLeader> {
    let mut best: Option<SalesLeader> = None;
    let mut best_sales = 0u64;

    for record in batch {
        if record.total_sales > best_sales {
            best_sales = record.total_sales;
            best = Some(SalesLeader {
                record_id: record.id,
                vehicle: record.vehicle.clone(),
                total_sales: record.total_sales,
            });
        }
    }

    best
}

/// The model year with the greatest unit count summed over its records.
///
/// Years are scanned in ascending order, so on a tie the earliest year wins.
pub fn popular_year(batch: &Batch) -> Result<Option<PopularYear>> {
    // BTreeMap gives a deterministic ascending-year scan.
    let mut totals: BTreeMap<i32, u64> = BTreeMap::new();
    for record in batch {
        let bucket = totals.entry(record.vehicle.year).or_insert(0);
        *bucket = bucket.checked_add(record.total_sales).ok_or_else(|| {
            ReportError::validation(
                RecordRef::Id(record.id),
                format!("total sales for year {} overflow", record.vehicle.year),
            )
        })?;
    }

    let mut best: Option<PopularYear> = None;
    let mut best_total = 0u64;
    for (&year, &total_sales) in &totals {
        if total_sales > best_total {
            best_total = total_sales;
            best = Some(PopularYear { year, total_sales });
        }
    }

    Ok(best)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
