//! Test-case datasets in YAML or JSON.
//!
//! Accepted shapes are a top-level list of rows or a mapping with a `rows`
//! list. Each row carries `Question`, `Expected Answer` and optionally
//! `Expected Data` (snake_case spellings are accepted too).

use crate::errors::DatasetError;
use crate::model::TestCase;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Yaml,
    Json,
}

impl DatasetFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(DatasetFormat::Yaml),
            "json" => Some(DatasetFormat::Json),
            _ => None,
        }
    }
}

const QUESTION: (&str, &str) = ("Question", "question");
const EXPECTED_ANSWER: (&str, &str) = ("Expected Answer", "expected_answer");
const EXPECTED_DATA: (&str, &str) = ("Expected Data", "expected_data");

pub fn load_dataset(path: &Path) -> Result<Vec<TestCase>, DatasetError> {
    let label = path.display().to_string();
    let format = DatasetFormat::from_path(path).ok_or_else(|| DatasetError::UnsupportedFormat {
        path: label.clone(),
    })?;
    let raw = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: label.clone(),
        source,
    })?;
    let cases = parse_dataset_str(&raw, format, &label)?;
    debug!(path = %label, rows = cases.len(), "dataset loaded");
    Ok(cases)
}

pub fn parse_dataset_str(
    raw: &str,
    format: DatasetFormat,
    label: &str,
) -> Result<Vec<TestCase>, DatasetError> {
    if raw.trim().is_empty() {
        return Err(DatasetError::Empty {
            path: label.to_string(),
        });
    }
    let parse_err = |detail: String| DatasetError::Parse {
        path: label.to_string(),
        detail,
    };
    let doc: Value = match format {
        DatasetFormat::Yaml => serde_yaml::from_str(raw).map_err(|e| parse_err(e.to_string()))?,
        DatasetFormat::Json => serde_json::from_str(raw).map_err(|e| parse_err(e.to_string()))?,
    };

    let rows = match doc {
        Value::Array(rows) => rows,
        Value::Object(mut map) => match map.remove("rows") {
            Some(Value::Array(rows)) => rows,
            _ => return Err(parse_err("expected a list of rows or a `rows:` list".into())),
        },
        Value::Null => Vec::new(),
        _ => return Err(parse_err("expected a list of rows or a `rows:` list".into())),
    };

    if rows.is_empty() {
        return Err(DatasetError::Empty {
            path: label.to_string(),
        });
    }

    rows.iter()
        .enumerate()
        .map(|(idx, row)| parse_row(idx + 1, row, label))
        .collect()
}

fn parse_row(row: usize, value: &Value, label: &str) -> Result<TestCase, DatasetError> {
    let Value::Object(map) = value else {
        return Err(DatasetError::Parse {
            path: label.to_string(),
            detail: format!("row {row} is not a mapping"),
        });
    };
    let cell = |(name, alias): (&'static str, &str)| -> Result<Option<String>, DatasetError> {
        match map.get(name).or_else(|| map.get(alias)) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(Value::Array(_)) => Err(DatasetError::InvalidCell {
                row,
                field: name,
                got: "a list".into(),
            }),
            Some(Value::Object(_)) => Err(DatasetError::InvalidCell {
                row,
                field: name,
                got: "a mapping".into(),
            }),
        }
    };
    let required = |key: (&'static str, &str)| -> Result<String, DatasetError> {
        cell(key)?
            .filter(|s| !s.trim().is_empty())
            .ok_or(DatasetError::MissingField { row, field: key.0 })
    };

    let question = required(QUESTION)?;
    let expected_answer = required(EXPECTED_ANSWER)?;
    let tc = TestCase::new(row, question, expected_answer);
    Ok(match cell(EXPECTED_DATA)? {
        Some(data) => tc.with_expected_data(data),
        None => tc,
    })
}
