//! JSON and CSV export of the record list

use serde_json::Value;

use crate::WeatherRecordError;
use crate::models::WeatherRecord;

pub const CSV_CONTENT_TYPE: &str = "text/csv";
pub const CSV_FILENAME: &str = "weather.csv";

/// Records are already in their wire shape
#[must_use]
pub fn to_json(records: Vec<WeatherRecord>) -> Vec<WeatherRecord> {
    records
}

/// Render records as CSV. The header is the key set of the first record.
pub fn to_csv(records: &[WeatherRecord]) -> crate::Result<Vec<u8>> {
    let rows = records
        .iter()
        .map(|record| -> crate::Result<serde_json::Map<String, Value>> {
            match serde_json::to_value(record)? {
                Value::Object(map) => Ok(map),
                _ => Err(WeatherRecordError::store(
                    "Record did not serialize to an object",
                )),
            }
        })
        .collect::<crate::Result<Vec<_>>>()?;

    let Some(first) = rows.first() else {
        return Err(WeatherRecordError::empty_export("No records to export"));
    };
    let header: Vec<String> = first.keys().cloned().collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&header).map_err(csv_error)?;
    for row in &rows {
        let fields = header
            .iter()
            .map(|key| row.get(key).map(cell).unwrap_or_default());
        writer.write_record(fields).map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| WeatherRecordError::store(format!("Failed to finish CSV export: {e}")))
}

/// Strings as-is, everything nested as compact JSON
fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn csv_error(err: csv::Error) -> WeatherRecordError {
    WeatherRecordError::store(format!("Failed to write CSV export: {err}"))
}
