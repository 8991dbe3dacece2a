// Row normalization: maps each source's column naming onto the canonical
// field set and fills absent values with defaults.

use crate::reader::{CellValue, RawRow};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical field names every normalized row carries.
pub const CANONICAL_FIELDS: [&str; 9] = [
    "name", "role", "team", "price", "goals", "assists", "minutes", "rating", "comm",
];

/// Source header → canonical field. Headers are matched after case folding.
const HEADER_SYNONYMS: &[(&str, &str)] = &[
    ("nome", "name"),
    ("ruolo", "role"),
    ("squadra", "team"),
    ("prezzo", "price"),
    ("gol", "goals"),
    ("goal", "goals"),
    ("assist", "assists"),
    ("ass", "assists"),
    ("minuti", "minutes"),
    ("min", "minutes"),
    ("media", "rating"),
    ("mv", "rating"),
    ("commento", "comm"),
];

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// A row that cannot be forwarded to the aggregator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NormalizeError {
    #[error("row has no value for required field `{0}`")]
    MissingField(&'static str),

    #[error("row has a non-numeric price '{0}'")]
    InvalidPrice(String),
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A spreadsheet row in canonical form, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub name: String,
    pub role: String,
    pub team: String,
    pub price: f64,
    pub goals: i64,
    pub assists: i64,
    pub minutes: i64,
    pub rating: f64,
    pub comm: String,
    pub source: String,
    pub season: String,
}

/// Map a source header onto its canonical field, if it has one.
pub fn canonical_field(header: &str) -> Option<&'static str> {
    let folded = header.trim().to_lowercase();
    HEADER_SYNONYMS
        .iter()
        .find(|(from, _)| *from == folded)
        .map(|(_, to)| *to)
        .or_else(|| CANONICAL_FIELDS.iter().copied().find(|f| *f == folded))
}

/// Canonical cells picked out of a raw row. Later columns overwrite earlier
/// ones that map to the same field.
#[derive(Default)]
struct CanonicalCells<'a> {
    cells: [Option<&'a CellValue>; CANONICAL_FIELDS.len()],
}

impl<'a> CanonicalCells<'a> {
    fn from_row(row: &'a RawRow) -> Self {
        let mut out = Self::default();
        for (header, value) in row.iter() {
            let Some(field) = canonical_field(header) else {
                continue;
            };
            if let Some(slot) = CANONICAL_FIELDS.iter().position(|f| *f == field) {
                out.cells[slot] = Some(value);
            }
        }
        out
    }

    fn get(&self, field: &str) -> Option<&'a CellValue> {
        CANONICAL_FIELDS
            .iter()
            .position(|f| *f == field)
            .and_then(|slot| self.cells[slot])
            .filter(|v| !v.is_null())
    }

    fn text(&self, field: &str) -> Option<String> {
        self.get(field).and_then(CellValue::as_text)
    }

    /// Integer fields truncate toward zero; unparseable values become 0.
    fn int(&self, field: &str) -> i64 {
        self.get(field)
            .and_then(CellValue::as_f64)
            .map(|n| n.trunc() as i64)
            .unwrap_or(0)
    }

    fn float(&self, field: &str) -> f64 {
        self.get(field).and_then(CellValue::as_f64).unwrap_or(0.0)
    }
}

/// Normalize one raw row from `source` for `season`.
///
/// Every row must carry a name, a role and a numeric price; rows that do
/// not are returned as errors and must not reach the aggregator. All other
/// fields fall back to their defaults.
pub fn normalize_row(
    row: &RawRow,
    source: &str,
    season: &str,
) -> Result<NormalizedRow, NormalizeError> {
    let cells = CanonicalCells::from_row(row);

    let name = cells.text("name").ok_or(NormalizeError::MissingField("name"))?;
    let role = cells.text("role").ok_or(NormalizeError::MissingField("role"))?;
    let price = match cells.get("price") {
        None => return Err(NormalizeError::MissingField("price")),
        Some(value) => value.as_f64().ok_or_else(|| {
            NormalizeError::InvalidPrice(value.as_text().unwrap_or_default())
        })?,
    };

    // Only text counts as an annotation.
    let comm = match cells.get("comm") {
        Some(CellValue::Text(s)) => s.clone(),
        _ => String::new(),
    };

    Ok(NormalizedRow {
        name,
        role,
        team: cells.text("team").unwrap_or_default(),
        price,
        goals: cells.int("goals"),
        assists: cells.int("assists"),
        minutes: cells.int("minutes"),
        rating: cells.float("rating"),
        comm,
        source: source.to_string(),
        season: season.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.into())
    }

    fn num(n: f64) -> CellValue {
        CellValue::Number(n)
    }

    #[test]
    fn italian_headers_map_to_canonical_fields() {
        let row = RawRow::new()
            .with("nome", text("Lautaro Martínez"))
            .with("ruolo", text("A"))
            .with("squadra", text("Inter"))
            .with("prezzo", num(38.0))
            .with("gol", num(24.0))
            .with("assist", num(3.0))
            .with("minuti", num(2700.0))
            .with("media", num(7.1))
            .with("commento", text("Rigorista"));

        let n = normalize_row(&row, "fantaboom", "2025_26").unwrap();
        assert_eq!(n.name, "Lautaro Martínez");
        assert_eq!(n.role, "A");
        assert_eq!(n.team, "Inter");
        assert!((n.price - 38.0).abs() < f64::EPSILON);
        assert_eq!(n.goals, 24);
        assert_eq!(n.assists, 3);
        assert_eq!(n.minutes, 2700);
        assert!((n.rating - 7.1).abs() < f64::EPSILON);
        assert_eq!(n.comm, "Rigorista");
        assert_eq!(n.source, "fantaboom");
        assert_eq!(n.season, "2025_26");
    }

    #[test]
    fn short_synonyms_map_too() {
        assert_eq!(canonical_field("goal"), Some("goals"));
        assert_eq!(canonical_field("ass"), Some("assists"));
        assert_eq!(canonical_field("min"), Some("minutes"));
        assert_eq!(canonical_field("mv"), Some("rating"));
        assert_eq!(canonical_field("MV"), Some("rating"));
    }

    #[test]
    fn canonical_headers_pass_through() {
        assert_eq!(canonical_field("name"), Some("name"));
        assert_eq!(canonical_field("price"), Some("price"));
        assert_eq!(canonical_field("comm"), Some("comm"));
    }

    #[test]
    fn foreign_headers_are_dropped() {
        assert_eq!(canonical_field("fvm"), None);
        assert_eq!(canonical_field("quotazione"), None);
    }

    #[test]
    fn missing_optional_fields_default() {
        let row = RawRow::new()
            .with("name", text("Rossi"))
            .with("role", text("A"))
            .with("price", num(10.0))
            .with("extra", text("ignored"));

        let n = normalize_row(&row, "profeta", "2024_25").unwrap();
        assert_eq!(n.team, "");
        assert_eq!(n.goals, 0);
        assert_eq!(n.assists, 0);
        assert_eq!(n.minutes, 0);
        assert_eq!(n.rating, 0.0);
        assert_eq!(n.comm, "");
    }

    #[test]
    fn null_cells_default() {
        let row = RawRow::new()
            .with("nome", text("Rossi"))
            .with("ruolo", text("A"))
            .with("prezzo", num(10.0))
            .with("squadra", CellValue::Null)
            .with("gol", CellValue::Null)
            .with("commento", CellValue::Null);

        let n = normalize_row(&row, "profeta", "2024_25").unwrap();
        assert_eq!(n.team, "");
        assert_eq!(n.goals, 0);
        assert_eq!(n.comm, "");
    }

    #[test]
    fn later_column_wins_on_collision() {
        let row = RawRow::new()
            .with("nome", text("Rossi"))
            .with("ruolo", text("A"))
            .with("prezzo", num(10.0))
            .with("gol", num(2.0))
            .with("goal", num(5.0));

        let n = normalize_row(&row, "fantaboom", "2025_26").unwrap();
        assert_eq!(n.goals, 5);
    }

    #[test]
    fn integer_fields_truncate() {
        let row = RawRow::new()
            .with("nome", text("Rossi"))
            .with("ruolo", text("A"))
            .with("prezzo", num(10.9))
            .with("minuti", num(1234.9))
            .with("gol", text("3,7"));

        let n = normalize_row(&row, "fantaboom", "2025_26").unwrap();
        assert_eq!(n.minutes, 1234);
        assert_eq!(n.goals, 3);
        assert!((n.price - 10.9).abs() < f64::EPSILON);
    }

    #[test]
    fn decimal_comma_rating() {
        let row = RawRow::new()
            .with("nome", text("Rossi"))
            .with("ruolo", text("A"))
            .with("prezzo", text("12"))
            .with("mv", text("6,5"));

        let n = normalize_row(&row, "fantaboom", "2025_26").unwrap();
        assert!((n.rating - 6.5).abs() < f64::EPSILON);
        assert!((n.price - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unparseable_optional_number_defaults() {
        let row = RawRow::new()
            .with("nome", text("Rossi"))
            .with("ruolo", text("A"))
            .with("prezzo", num(10.0))
            .with("gol", text("n.d."));

        let n = normalize_row(&row, "fantaboom", "2025_26").unwrap();
        assert_eq!(n.goals, 0);
    }

    #[test]
    fn numeric_comment_is_not_an_annotation() {
        let row = RawRow::new()
            .with("nome", text("Rossi"))
            .with("ruolo", text("A"))
            .with("prezzo", num(10.0))
            .with("commento", num(4.0));

        let n = normalize_row(&row, "sos_fanta", "2025_26").unwrap();
        assert_eq!(n.comm, "");
    }

    #[test]
    fn missing_price_is_rejected() {
        let row = RawRow::new()
            .with("nome", text("Rossi"))
            .with("ruolo", text("A"));
        assert_eq!(
            normalize_row(&row, "fantaboom", "2025_26"),
            Err(NormalizeError::MissingField("price"))
        );

        let row = row.with("prezzo", CellValue::Null);
        assert_eq!(
            normalize_row(&row, "fantaboom", "2025_26"),
            Err(NormalizeError::MissingField("price"))
        );
    }

    #[test]
    fn non_numeric_price_is_rejected() {
        let row = RawRow::new()
            .with("nome", text("Rossi"))
            .with("ruolo", text("A"))
            .with("prezzo", text("svincolato"));
        assert_eq!(
            normalize_row(&row, "fantaboom", "2025_26"),
            Err(NormalizeError::InvalidPrice("svincolato".into()))
        );
    }

    #[test]
    fn missing_identity_is_rejected() {
        let row = RawRow::new().with("ruolo", text("A")).with("prezzo", num(1.0));
        assert_eq!(
            normalize_row(&row, "fantaboom", "2025_26"),
            Err(NormalizeError::MissingField("name"))
        );

        let row = RawRow::new().with("nome", text("Rossi")).with("prezzo", num(1.0));
        assert_eq!(
            normalize_row(&row, "fantaboom", "2025_26"),
            Err(NormalizeError::MissingField("role"))
        );
    }

    #[test]
    fn identity_values_are_not_trimmed() {
        let row = RawRow::new()
            .with("nome", text("Rossi "))
            .with("ruolo", text("a"))
            .with("prezzo", num(1.0));

        let n = normalize_row(&row, "fantaboom", "2025_26").unwrap();
        assert_eq!(n.name, "Rossi ");
        assert_eq!(n.role, "a");
    }
}
