//! JSON loading for sales data.
//!
//! Reads a document whose top-level value is an array of sales records and
//! converts it into a validated [`Batch`]. Every record is decoded on its
//! own so a shape error can name the offending record.

use std::path::Path;

use sales_core::error::{RecordRef, ReportError, Result};
use sales_core::models::{Batch, SalesRecord, Vehicle};
use serde::Deserialize;
use serde_json::{Number, Value};
use tracing::{debug, info};

/// Wire shape of one record. `total_sales` is kept as a raw JSON number so a
/// negative count is reported as a validation failure instead of a type error.
#[derive(Debug, Deserialize)]
struct RawRecord {
    id: i64,
    car: Vehicle,
    price: String,
    total_sales: Number,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Read and validate the sales records stored at `path`.
pub fn load_batch(path: &Path) -> Result<Batch> {
    let content = std::fs::read_to_string(path).map_err(|source| ReportError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let batch = parse_batch(&content)?;
    info!("Loaded {} sales records from {}", batch.len(), path.display());
    Ok(batch)
}

/// Parse and validate a JSON document held in memory.
pub fn parse_batch(json: &str) -> Result<Batch> {
    let document: Value = serde_json::from_str(json)?;

    let Value::Array(items) = document else {
        return Err(ReportError::validation(
            RecordRef::Batch,
            "expected a JSON array of sales records",
        ));
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        records.push(decode_record(index, item)?);
    }

    debug!("Decoded {} records", records.len());
    Batch::new(records)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn decode_record(index: usize, item: Value) -> Result<SalesRecord> {
    let record_ref = item
        .get("id")
        .and_then(Value::as_i64)
        .map(RecordRef::Id)
        .unwrap_or(RecordRef::Index(index));

    let raw: RawRecord = serde_json::from_value(item)
        .map_err(|e| ReportError::validation(record_ref, e.to_string()))?;

    let total_sales = unit_count(&raw.total_sales)
        .map_err(|reason| ReportError::validation(RecordRef::Id(raw.id), reason))?;

    Ok(SalesRecord {
        id: raw.id,
        vehicle: raw.car,
        price: raw.price,
        total_sales,
    })
}

fn unit_count(value: &Number) -> std::result::Result<u64, String> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    if value.as_i64().is_some() || value.as_f64().is_some_and(|f| f < 0.0) {
        return Err(format!("total_sales must not be negative, got {value}"));
    }
    Err(format!("total_sales must be a whole number, got {value}"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TWO_RECORDS: &str = r#"[
        {"id": 1, "car": {"car_make": "Honda", "car_model": "Civic", "car_year": 2020},
         "price": "$20000.00", "total_sales": 10},
        {"id": 2, "car": {"car_make": "Toyota", "car_model": "Corolla", "car_year": 2020},
         "price": "$18000.00", "total_sales": 15}
    ]"#;

    fn validation_target(err: ReportError) -> (RecordRef, String) {
        match err {
            ReportError::Validation { record, reason } => (record, reason),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_parse_batch_reads_all_fields() {
        let batch = parse_batch(TWO_RECORDS).unwrap();
        assert_eq!(batch.len(), 2);

        let first = &batch.records()[0];
        assert_eq!(first.id, 1);
        assert_eq!(first.vehicle, Vehicle::new("Honda", "Civic", 2020));
        assert_eq!(first.price, "$20000.00");
        assert_eq!(first.total_sales, 10);
        assert_eq!(batch.records()[1].id, 2);
    }

    #[test]
    fn test_parse_batch_empty_array() {
        let batch = parse_batch("[]").unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_parse_batch_ignores_extra_fields() {
        let json = r#"[{"id": 5, "car": {"car_make": "Kia", "car_model": "Rio", "car_year": 2011,
            "color": "red"}, "price": "$3,200.00", "total_sales": 4, "dealer": "North"}]"#;
        let batch = parse_batch(json).unwrap();
        assert_eq!(batch.records()[0].price, "$3,200.00");
    }

    #[test]
    fn test_parse_batch_rejects_non_array() {
        let (record, reason) =
            validation_target(parse_batch(r#"{"id": 1}"#).unwrap_err());
        assert_eq!(record, RecordRef::Batch);
        assert!(reason.contains("array"));
    }

    #[test]
    fn test_parse_batch_malformed_json() {
        let err = parse_batch("[{").unwrap_err();
        assert!(matches!(err, ReportError::JsonParse(_)));
    }

    #[test]
    fn test_missing_field_names_record_id() {
        let json = r#"[{"id": 12, "car": {"car_make": "Kia", "car_model": "Rio", "car_year": 2011},
            "total_sales": 4}]"#;
        let (record, reason) = validation_target(parse_batch(json).unwrap_err());
        assert_eq!(record, RecordRef::Id(12));
        assert!(reason.contains("price"), "reason: {reason}");
    }

    #[test]
    fn test_missing_id_falls_back_to_position() {
        let json = r#"[
            {"id": 1, "car": {"car_make": "Kia", "car_model": "Rio", "car_year": 2011},
             "price": "$1.00", "total_sales": 4},
            {"car": {"car_make": "Kia", "car_model": "Rio", "car_year": 2011},
             "price": "$1.00", "total_sales": 4}
        ]"#;
        let (record, _) = validation_target(parse_batch(json).unwrap_err());
        assert_eq!(record, RecordRef::Index(1));
    }

    #[test]
    fn test_wrong_type_is_validation_error() {
        let json = r#"[{"id": 3, "car": {"car_make": "Kia", "car_model": "Rio", "car_year": "2011"},
            "price": "$1.00", "total_sales": 4}]"#;
        let (record, _) = validation_target(parse_batch(json).unwrap_err());
        assert_eq!(record, RecordRef::Id(3));
    }

    #[test]
    fn test_negative_total_sales_rejected() {
        let json = r#"[{"id": 8, "car": {"car_make": "Kia", "car_model": "Rio", "car_year": 2011},
            "price": "$1.00", "total_sales": -2}]"#;
        let (record, reason) = validation_target(parse_batch(json).unwrap_err());
        assert_eq!(record, RecordRef::Id(8));
        assert!(reason.contains("negative"));
    }

    #[test]
    fn test_total_sales_above_i64_range_accepted() {
        let json = r#"[{"id": 8, "car": {"car_make": "Kia", "car_model": "Rio", "car_year": 2011},
            "price": "$1.00", "total_sales": 18446744073709551615}]"#;
        let batch = parse_batch(json).unwrap();
        assert_eq!(batch.records()[0].total_sales, u64::MAX);
    }

    #[test]
    fn test_fractional_total_sales_rejected() {
        let json = r#"[{"id": 9, "car": {"car_make": "Kia", "car_model": "Rio", "car_year": 2011},
            "price": "$1.00", "total_sales": 2.5}]"#;
        let (record, reason) = validation_target(parse_batch(json).unwrap_err());
        assert_eq!(record, RecordRef::Id(9));
        assert!(reason.contains("whole number"), "reason: {reason}");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"[
            {"id": 4, "car": {"car_make": "Kia", "car_model": "Rio", "car_year": 2011},
             "price": "$1.00", "total_sales": 4},
            {"id": 4, "car": {"car_make": "Kia", "car_model": "Soul", "car_year": 2012},
             "price": "$2.00", "total_sales": 1}
        ]"#;
        let (record, _) = validation_target(parse_batch(json).unwrap_err());
        assert_eq!(record, RecordRef::Id(4));
    }

    #[test]
    fn test_price_is_not_parsed_at_load() {
        let json = r#"[{"id": 1, "car": {"car_make": "Kia", "car_model": "Rio", "car_year": 2011},
            "price": "not a price", "total_sales": 4}]"#;
        let batch = parse_batch(json).unwrap();
        assert_eq!(batch.records()[0].price, "not a price");
    }

    #[test]
    fn test_load_batch_from_file() {
        let mut file = NamedTempFile::new().expect("tempfile");
        file.write_all(TWO_RECORDS.as_bytes()).unwrap();

        let batch = load_batch(file.path()).unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_load_batch_missing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("car_sales.json");
        let err = load_batch(&path).unwrap_err();
        assert!(matches!(err, ReportError::FileRead { .. }));
        assert!(err.to_string().contains("car_sales.json"));
    }
}
