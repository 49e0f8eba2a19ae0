use serde_json::Value;
use std::io;

use super::format_value;

/// Write output as two-column field/value CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let _ = wtr.write_record(["field", "value"]);
    match result {
        Value::Object(map) => {
            for (key, val) in map {
                let _ = wtr.write_record([key.as_str(), &format_value(val)]);
            }
        }
        other => {
            let _ = wtr.write_record(["result", &format_value(other)]);
        }
    }

    let _ = wtr.flush();
}
