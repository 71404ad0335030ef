//! Reference nutrition dataset
//!
//! Per-100g macro values keyed by canonical ingredient name. A key may carry several
//! alias phrases joined by [`ALIAS_DELIMITER`]. The table is loaded once and never mutated.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::models::Nutrition;

/// Separator between alias phrases inside a canonical key
pub const ALIAS_DELIMITER: &str = " - ";

/// Dataset columns, in the order they fill a [`Nutrition`]
const NAME_COLUMN: &str = "Name";
const VALUE_COLUMNS: [&str; 4] = ["Energy", "Protein", "Fat", "Carbohydrate"];

/// Reference data load failures. Fatal at startup.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Failed to read nutrition dataset '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Error reading line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: csv::Error,
    },

    #[error("Nutrition dataset has no header row")]
    MissingHeader,

    #[error("Nutrition dataset is missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("Row {line}: expected at least {expected} fields, found {found}")]
    ShortRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Row {line}: empty ingredient name")]
    EmptyName { line: usize },

    #[error("Row {line}: invalid {column} value '{value}'")]
    InvalidValue {
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("Nutrition dataset contains no rows")]
    Empty,
}

/// One reference row
#[derive(Debug, Clone, Serialize)]
pub struct NutritionRecord {
    /// Lowercased canonical key
    pub key: String,
    /// Alias phrases split out of the key, trimmed, in key order
    pub aliases: Vec<String>,
    /// Values per 100 g
    pub nutrition: Nutrition,
}

impl NutritionRecord {
    pub fn new(name: &str, nutrition: Nutrition) -> Self {
        let key = name.trim().to_lowercase();
        let aliases = key
            .split(ALIAS_DELIMITER)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            key,
            aliases,
            nutrition,
        }
    }
}

/// Immutable snapshot of the reference dataset.
///
/// Rows keep their source order: the matcher's tie-break favours the earliest candidate.
#[derive(Debug, Clone, Default)]
pub struct NutritionTable {
    records: Vec<NutritionRecord>,
    index: HashMap<String, usize>,
}

impl NutritionTable {
    /// Build a table from records. Later duplicates of a key (case-insensitive)
    /// overwrite the earlier values but keep the earlier position.
    pub fn from_records(records: impl IntoIterator<Item = NutritionRecord>) -> Self {
        let mut table = Self::default();
        for record in records {
            table.insert(record);
        }
        table
    }

    fn insert(&mut self, record: NutritionRecord) {
        match self.index.get(&record.key) {
            Some(&pos) => self.records[pos].nutrition = record.nutrition,
            None => {
                self.index.insert(record.key.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Load the dataset from a CSV file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReferenceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ReferenceError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_reader(file)?;
        tracing::info!(
            "Loaded {} reference ingredients from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Parse CSV with a header row naming `Name, Energy, Protein, Fat, Carbohydrate`.
    /// Column order is free and extra columns are ignored. Quoted fields may span lines.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReferenceError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut columns: Option<([usize; 4], usize)> = None;
        let mut table = Self::default();

        for result in reader.records() {
            let record = result.map_err(|source| ReferenceError::Read {
                line: source.position().map_or(0, |p| p.line() as usize),
                source,
            })?;
            let line_no = record.position().map_or(0, |p| p.line() as usize);

            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }

            let (value_idx, name_idx) = match columns {
                Some(c) => c,
                None => {
                    columns = Some(header_positions(&record)?);
                    continue;
                }
            };

            let needed = value_idx.iter().copied().chain([name_idx]).max().unwrap_or(0) + 1;
            if record.len() < needed {
                return Err(ReferenceError::ShortRow {
                    line: line_no,
                    expected: needed,
                    found: record.len(),
                });
            }

            let name = record[name_idx].trim();
            if name.is_empty() {
                return Err(ReferenceError::EmptyName { line: line_no });
            }

            let mut values = [0.0; 4];
            for (slot, (&idx, column)) in value_idx.iter().zip(VALUE_COLUMNS).enumerate() {
                values[slot] = parse_value(&record[idx], line_no, column)?;
            }

            table.insert(NutritionRecord::new(name, Nutrition::from_array(values)));
        }

        if columns.is_none() {
            return Err(ReferenceError::MissingHeader);
        }
        if table.is_empty() {
            return Err(ReferenceError::Empty);
        }
        Ok(table)
    }

    /// Case-insensitive lookup by canonical key
    pub fn get(&self, key: &str) -> Option<&NutritionRecord> {
        self.index
            .get(&key.trim().to_lowercase())
            .map(|&pos| &self.records[pos])
    }

    pub fn records(&self) -> &[NutritionRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &NutritionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn header_positions(header: &csv::StringRecord) -> Result<([usize; 4], usize), ReferenceError> {
    let find = |column: &'static str| {
        header
            .iter()
            .position(|f| f.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(column))
            .ok_or(ReferenceError::MissingColumn(column))
    };

    let name_idx = find(NAME_COLUMN)?;
    let mut value_idx = [0usize; 4];
    for (slot, column) in VALUE_COLUMNS.into_iter().enumerate() {
        value_idx[slot] = find(column)?;
    }
    Ok((value_idx, name_idx))
}

fn parse_value(raw: &str, line: usize, column: &'static str) -> Result<f64, ReferenceError> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(ReferenceError::InvalidValue {
            line,
            column,
            value: trimmed.to_string(),
        }),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Small dataset shared by the matcher, aggregator and engine tests
    pub(crate) const SAMPLE_CSV: &str = "\
Name,Energy,Protein,Fat,Carbohydrate
Trứng gà - Trứng gà ta,166,14.8,11.6,0.5
Muối - Muối ăn,0,0,0,0
Thịt bò - Thịt bò loại I,118,21,3.8,0
Gạo tẻ,344,7.9,1,75.9
Hành lá - Hành hoa,22,1.3,0,4.3
\"Đường, kính trắng\",397,0,0,99.3
Nước mắm,28,7.1,0,0
";

    pub(crate) fn sample_table() -> NutritionTable {
        NutritionTable::from_reader(SAMPLE_CSV.as_bytes()).expect("sample dataset parses")
    }

    #[test]
    fn test_load_sample() {
        let table = sample_table();
        assert_eq!(table.len(), 7);
        let egg = table.get("TRỨNG GÀ - trứng gà ta").unwrap();
        assert_eq!(egg.aliases, vec!["trứng gà", "trứng gà ta"]);
        assert_eq!(egg.nutrition.calories, 166.0);
        assert_eq!(egg.nutrition.carbs, 0.5);
    }

    #[test]
    fn test_quoted_field_with_comma() {
        let table = sample_table();
        let sugar = table.get("đường, kính trắng").unwrap();
        assert_eq!(sugar.nutrition.carbs, 99.3);
    }

    #[test]
    fn test_column_order_is_free() {
        let csv = "Fat,Name,Carbohydrate,Protein,Energy,Source\n1,Đậu phụ,2,3,4,x\n";
        let table = NutritionTable::from_reader(csv.as_bytes()).unwrap();
        let tofu = table.get("đậu phụ").unwrap();
        assert_eq!(tofu.nutrition, Nutrition::new(4.0, 3.0, 1.0, 2.0));
    }

    #[test]
    fn test_duplicate_key_overwrites_in_place() {
        let csv = "Name,Energy,Protein,Fat,Carbohydrate\nA,1,1,1,1\nB,2,2,2,2\na,3,3,3,3\n";
        let table = NutritionTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].key, "a");
        assert_eq!(table.records()[0].nutrition.calories, 3.0);
    }

    #[test]
    fn test_missing_column() {
        let csv = "Name,Energy,Protein,Fat\nA,1,1,1\n";
        let err = NutritionTable::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ReferenceError::MissingColumn("Carbohydrate")));
    }

    #[test]
    fn test_invalid_value() {
        let csv = "Name,Energy,Protein,Fat,Carbohydrate\nA,abc,1,1,1\n";
        let err = NutritionTable::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ReferenceError::InvalidValue { line: 2, column: "Energy", .. }));

        let csv = "Name,Energy,Protein,Fat,Carbohydrate\nA,1,-1,1,1\n";
        assert!(NutritionTable::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_empty_dataset() {
        let csv = "Name,Energy,Protein,Fat,Carbohydrate\n\n";
        assert!(matches!(
            NutritionTable::from_reader(csv.as_bytes()),
            Err(ReferenceError::Empty)
        ));
        assert!(matches!(
            NutritionTable::from_reader("".as_bytes()),
            Err(ReferenceError::MissingHeader)
        ));
    }

    #[test]
    fn test_short_row() {
        let csv = "Name,Energy,Protein,Fat,Carbohydrate\nA,1,1\n";
        assert!(matches!(
            NutritionTable::from_reader(csv.as_bytes()),
            Err(ReferenceError::ShortRow { line: 2, .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = NutritionTable::load("/nonexistent/nutrition.csv").unwrap_err();
        assert!(matches!(err, ReferenceError::Open { .. }));
    }

    #[test]
    fn test_quoted_name_spanning_lines() {
        let csv = "Name,Energy,Protein,Fat,Carbohydrate\n\"Bánh\nmì\",249,7.9,0.8,52.6\nGạo,344,7.9,1,75.9\n";
        let table = NutritionTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("bánh\nmì").unwrap().nutrition.calories, 249.0);
        assert_eq!(table.records()[1].key, "gạo");
    }

    #[test]
    fn test_escaped_quote_and_bom() {
        let csv = "\u{feff}Name,Energy,Protein,Fat,Carbohydrate\n\"Chè \"\"ba màu\"\"\",180,2,3,35\n";
        let table = NutritionTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.records()[0].key, "chè \"ba màu\"");
    }

    #[test]
    fn test_error_line_after_multiline_field() {
        let csv = "Name,Energy,Protein,Fat,Carbohydrate\n\"Bánh\nmì\",249,7.9,0.8,52.6\nGạo,x,7.9,1,75.9\n";
        let err = NutritionTable::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ReferenceError::InvalidValue { line: 4, column: "Energy", .. }));
    }
}
