use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{RecordRef, ReportError, Result};

/// The car a sales record refers to. Identity is the full
/// make/model/year triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vehicle {
    /// Manufacturer, e.g. `"Honda"`.
    #[serde(rename = "car_make")]
    pub make: String,
    /// Model name, e.g. `"Civic"`.
    #[serde(rename = "car_model")]
    pub model: String,
    /// Model year.
    #[serde(rename = "car_year")]
    pub year: i32,
}

impl Vehicle {
    pub fn new(make: impl Into<String>, model: impl Into<String>, year: i32) -> Self {
        Self {
            make: make.into(),
            model: model.into(),
            year,
        }
    }
}

/// One per-model sales line as loaded from the input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesRecord {
    /// Identifier, unique within its batch.
    pub id: i64,
    /// The car that was sold.
    pub vehicle: Vehicle,
    /// Unit price exactly as supplied, e.g. `"$18731.76"`.
    pub price: String,
    /// Number of units sold.
    pub total_sales: u64,
}

/// An ordered, id-unique collection of [`SalesRecord`]s.
///
/// Input order is kept: tables render in it and tie-breaks favour the
/// earliest record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    records: Vec<SalesRecord>,
}

impl Batch {
    /// Build a batch, rejecting duplicate record ids.
    pub fn new(records: Vec<SalesRecord>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.id) {
                return Err(ReportError::validation(
                    RecordRef::Id(record.id),
                    "duplicate record id",
                ));
            }
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SalesRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a SalesRecord;
    type IntoIter = std::slice::Iter<'a, SalesRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// The record with the highest `price × total_sales`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevenueLeader {
    pub record_id: i64,
    pub vehicle: Vehicle,
    pub revenue: Decimal,
}

/// The record with the highest unit count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesLeader {
    pub record_id: i64,
    pub vehicle: Vehicle,
    pub total_sales: u64,
}

/// The model year with the highest unit count summed over all its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PopularYear {
    pub year: i32,
    pub total_sales: u64,
}

/// The three facts derived from a batch.
///
/// Each fact is `None` when no record strictly exceeds zero for that metric,
/// which includes the empty batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryFacts {
    pub revenue_leader: Option<RevenueLeader>,
    pub sales_leader: Option<SalesLeader>,
    pub popular_year: Option<PopularYear>,
}
