//! Human-readable rendering of vehicles, summary facts and the sales table.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{Batch, SummaryFacts, Vehicle};
use crate::money::NumberFormat;

/// Column titles of the sales table.
pub const TABLE_HEADER: [&str; 4] = ["ID", "Car", "Price", "Total Sales"];

/// One table row, cells already rendered as text.
pub type TableRow = Vec<String>;

/// Render a vehicle as `"{make} {model} ({year})"`.
///
/// # Examples
///
/// ```
/// use sales_core::formatting::format_vehicle;
/// use sales_core::models::Vehicle;
///
/// let civic = Vehicle::new("Honda", "Civic", 2020);
/// assert_eq!(format_vehicle(&civic), "Honda Civic (2020)");
/// ```
pub fn format_vehicle(vehicle: &Vehicle) -> String {
    format!("{} {} ({})", vehicle.make, vehicle.model, vehicle.year)
}

/// Render the three summary lines using the default `$` currency format.
pub fn render_summary(facts: &SummaryFacts) -> [String; 3] {
    render_summary_with(facts, &NumberFormat::default())
}

/// Render the three summary lines, writing revenue with `format`'s symbol.
///
/// Line order is revenue leader, sales leader, popular year. A fact with no
/// qualifying record gets an explicit "no data" line instead.
pub fn render_summary_with(facts: &SummaryFacts, format: &NumberFormat) -> [String; 3] {
    let revenue = match &facts.revenue_leader {
        Some(leader) => format!(
            "The {} generated the most revenue: {}",
            format_vehicle(&leader.vehicle),
            format_currency(leader.revenue, &format.currency_symbol)
        ),
        None => "No revenue data was available to determine a top model.".to_string(),
    };

    let sales = match &facts.sales_leader {
        Some(leader) => format!(
            "The {} had the most sales: {}",
            format_vehicle(&leader.vehicle),
            leader.total_sales
        ),
        None => "No sales data was available to determine a best-selling model.".to_string(),
    };

    let year = match &facts.popular_year {
        Some(popular) => format!(
            "The most popular year was {} with {} sales.",
            popular.year, popular.total_sales
        ),
        None => "No sales data was available to determine the most popular year.".to_string(),
    };

    [revenue, sales, year]
}

/// Turn a batch into table rows: the header first, then one row per record
/// in batch order. Prices are shown exactly as supplied.
pub fn to_table(batch: &Batch) -> Vec<TableRow> {
    let mut rows = Vec::with_capacity(batch.len() + 1);
    rows.push(TABLE_HEADER.iter().map(|h| h.to_string()).collect());
    for record in batch {
        rows.push(vec![
            record.id.to_string(),
            format_vehicle(&record.vehicle),
            record.price.clone(),
            record.total_sales.to_string(),
        ]);
    }
    rows
}

/// Format a decimal with thousands separators and exactly `decimals`
/// fractional digits, rounding half away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use sales_core::formatting::format_number;
///
/// assert_eq!(format_number(Decimal::new(12345, 1), 1), "1,234.5");
/// assert_eq!(format_number(Decimal::new(1234567, 0), 0), "1,234,567");
/// assert_eq!(format_number(Decimal::ZERO, 2), "0.00");
/// ```
pub fn format_number(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    let digits = rounded.abs().to_string();
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), ""));
    let grouped = group_thousands(int_part);

    let result = if decimals == 0 {
        grouped
    } else {
        format!(
            "{}.{:0<width$}",
            grouped,
            frac_part,
            width = decimals as usize
        )
    };

    if negative {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a monetary amount with two decimal places and thousands
/// separators, prefixed by `symbol`.
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use sales_core::formatting::format_currency;
///
/// assert_eq!(format_currency(Decimal::new(123456, 2), "$"), "$1,234.56");
/// assert_eq!(format_currency(Decimal::ZERO, "$"), "$0.00");
/// ```
pub fn format_currency(amount: Decimal, symbol: &str) -> String {
    if amount.is_sign_negative() && !amount.is_zero() {
        format!("{}-{}", symbol, format_number(amount.abs(), 2))
    } else {
        format!("{}{}", symbol, format_number(amount, 2))
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
