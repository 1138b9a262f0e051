use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use csv::StringRecord;

/// Date layouts accepted when inferring a `Date` column.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
/// Frequency tables key on `Value`, so it must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeMap keys --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Date(d) => d.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Parse a raw CSV cell as the given column type. Empty cells are null.
    pub fn parse_as(raw: &str, dtype: ColumnType) -> Value {
        let raw = raw.trim();
        if raw.is_empty() {
            return Value::Null;
        }
        // A cell that does not fit its column type is treated as missing.
        let parsed = match dtype {
            ColumnType::Integer => raw.parse().ok().map(Value::Integer),
            ColumnType::Float => raw.parse().ok().map(Value::Float),
            ColumnType::Bool => parse_bool(raw).map(Value::Bool),
            ColumnType::Date => parse_date(raw).map(Value::Date),
            ColumnType::Text => Some(Value::String(raw.to_string())),
        };
        parsed.unwrap_or(Value::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Approximate bytes held by this cell, inline plus heap.
    pub fn footprint(&self) -> usize {
        let heap = match self {
            Value::String(s) => s.capacity(),
            _ => 0,
        };
        std::mem::size_of::<Value>() + heap
    }
}

pub fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Float,
    Bool,
    Date,
    Text,
}

impl ColumnType {
    /// Infer the narrowest type that fits every non-empty cell.
    /// Columns with no values at all are `Text`.
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a str>) -> ColumnType {
        let (mut int, mut float, mut boolean, mut date) = (true, true, true, true);
        let mut seen = false;

        for cell in cells {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            seen = true;
            int = int && cell.parse::<i64>().is_ok();
            float = float && cell.parse::<f64>().is_ok();
            boolean = boolean && parse_bool(cell).is_some();
            date = date && parse_date(cell).is_some();
            if !(int || float || boolean || date) {
                break;
            }
        }

        if !seen {
            ColumnType::Text
        } else if int {
            ColumnType::Integer
        } else if float {
            ColumnType::Float
        } else if boolean {
            ColumnType::Bool
        } else if date {
            ColumnType::Date
        } else {
            ColumnType::Text
        }
    }

    /// Pandas-style dtype label for the column-info table.
    pub fn label(&self) -> &'static str {
        match self {
            ColumnType::Integer => "int64",
            ColumnType::Float => "float64",
            ColumnType::Bool => "bool",
            ColumnType::Date => "datetime64",
            ColumnType::Text => "object",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub dtype: ColumnType,
}

// ---------------------------------------------------------------------------
// Record – one row of the source file
// ---------------------------------------------------------------------------

/// One parsed row; values are positionally aligned with `Dataset::columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Record { values }
    }

    pub fn get(&self, column: usize) -> &Value {
        self.values.get(column).unwrap_or(&Value::Null)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

// ---------------------------------------------------------------------------
// Dataset – an immutable loaded table
// ---------------------------------------------------------------------------

/// A loaded table. Built once per load and shared read-only afterwards;
/// derived views hold row indices into it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub columns: Vec<Column>,
    pub records: Vec<Record>,
}

impl Dataset {
    /// Build a typed dataset from raw CSV records.
    ///
    /// Runs two passes over `records`: one to infer each column's type, one
    /// to convert the cells. Rows shorter than the header are padded with
    /// nulls.
    pub fn from_records<'a, I>(headers: &StringRecord, records: I) -> Self
    where
        I: IntoIterator<Item = &'a StringRecord>,
        I::IntoIter: Clone,
    {
        let records = records.into_iter();
        let columns = infer_columns(headers, records.clone());
        let records = records.map(|raw| convert_record(&columns, raw)).collect();
        Dataset { columns, records }
    }

    /// Like [`Dataset::from_records`], but consumes the raw rows chunk by
    /// chunk: each chunk is freed as soon as it has been converted, so at
    /// most one chunk exists in both raw and typed form.
    pub fn from_chunks(headers: &StringRecord, chunks: Vec<Vec<StringRecord>>) -> Self {
        let columns = infer_columns(headers, chunks.iter().flatten());

        let mut records = Vec::with_capacity(chunks.iter().map(Vec::len).sum());
        for chunk in chunks {
            records.extend(chunk.iter().map(|raw| convert_record(&columns, raw)));
        }
        Dataset { columns, records }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Cell lookup by row index and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.records.get(row).map(|r| r.get(idx))
    }

    /// All cells of one column, in row order.
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &Value> {
        self.records.iter().map(move |r| r.get(column))
    }
}

// ---------------------------------------------------------------------------
// Notice – user-facing status lines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// A human-readable message for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Notice {
            severity,
            message: message.into(),
        }
    }
}

fn infer_columns<'a, I>(headers: &StringRecord, records: I) -> Vec<Column>
where
    I: Iterator<Item = &'a StringRecord> + Clone,
{
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| Column {
            name: name.trim().to_string(),
            dtype: ColumnType::infer(records.clone().map(|r| r.get(idx).unwrap_or(""))),
        })
        .collect()
}

fn convert_record(columns: &[Column], raw: &StringRecord) -> Record {
    Record::new(
        columns
            .iter()
            .enumerate()
            .map(|(idx, col)| Value::parse_as(raw.get(idx).unwrap_or(""), col.dtype))
            .collect(),
    )
}

/// Format a count with thousands separators: `1234567` → `"1,234,567"`.
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
