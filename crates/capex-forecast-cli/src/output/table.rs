use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{detail_rows, UNDEFINED_AS_NA};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_object(map);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => print_object(res_map),
        Value::Array(arr) => print_array_table(arr),
        other => println!("{}", format_value("", other)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Scalar fields as a Field/Value table, followed by the detail rows.
fn print_object(map: &Map<String, Value>) {
    let detail = detail_rows(map);

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        if detail.is_some_and(|(name, _)| name == key) {
            continue;
        }
        builder.push_record([key.as_str(), &format_value(key, val)]);
    }
    println!("{}", Table::from(builder));

    if let Some((name, rows)) = detail {
        println!("\n{}:", name);
        print_array_table(rows);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        map.get(h.as_str())
                            .map(|v| format_value(h, v))
                            .unwrap_or_default()
                    })
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value("", item));
        }
    }
}

fn format_value(key: &str, value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null if UNDEFINED_AS_NA.contains(&key) => "n/a".to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(|v| format_value(key, v)).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_undefined_irr_renders_as_na() {
        assert_eq!(format_value("irr", &Value::Null), "n/a");
        assert_eq!(format_value("npv", &Value::Null), "");
        assert_eq!(format_value("irr", &json!("0")), "0");
    }

    #[test]
    fn test_detail_rows_split_from_scalars() {
        let value = json!({ "npv": "10", "breakdown": [{ "year": 2025 }], "years": [2025] });
        let map = value.as_object().unwrap();
        let (name, rows) = detail_rows(map).unwrap();
        assert_eq!(name, "breakdown");
        assert_eq!(rows.len(), 1);
        assert_eq!(format_value("years", &map["years"]), "2025");
    }
}
