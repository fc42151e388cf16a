use capex_forecast_core::register::AssetLine;
use std::path::Path;

use super::{file, stdin};

/// Load an asset register from `--input` (`.csv` or `.json`), or from a
/// JSON array piped on stdin.
pub fn load_register(input: Option<&str>) -> Result<Vec<AssetLine>, Box<dyn std::error::Error>> {
    let lines = match input {
        Some(path) => {
            let canonical = file::resolve_path(path)?;
            match file::extension(&canonical).as_deref() {
                Some("csv") => read_csv(&canonical)?,
                Some("json") => file::read_json(path)?,
                other => {
                    return Err(format!(
                        "Unsupported register format '{}': expected .csv or .json",
                        other.unwrap_or("")
                    )
                    .into())
                }
            }
        }
        None => match stdin::read_stdin()? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| format!("Failed to parse register from stdin: {}", e))?,
            None => return Err("--input <register.csv|register.json> or stdin required".into()),
        },
    };

    tracing::info!(
        source = input.unwrap_or("stdin"),
        rows = lines.len(),
        "asset register loaded"
    );
    Ok(lines)
}

fn read_csv(path: &Path) -> Result<Vec<AssetLine>, Box<dyn std::error::Error>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    let lines = rdr
        .deserialize()
        .collect::<Result<Vec<AssetLine>, _>>()
        .map_err(|e| format!("Failed to parse '{}': {}", path.display(), e))?;
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    const HEADER: &str = "Project_Code,Program_Name,Asset_ID,Asset_Name,Asset_Type,Process_Area,Fab_Location,Scenario,Quantity,Unit_Cost_USD,Order_Quarter,Need_Quarter,Ramp_Start_Quarter,Depreciation_Years";

    fn write_temp(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_csv_register_trims_and_keeps_blank_fields() {
        let body = format!(
            "{HEADER}\nPRJ-1, Litho ,A-1,Scanner,Tool,Litho,Fab 1,Base,2,500, 2025Q1 ,,2025Q3,\n"
        );
        let file = write_temp(".csv", &body);
        let lines = load_register(file.path().to_str()).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].program_name, "Litho");
        assert_eq!(lines[0].order_quarter.as_deref(), Some("2025Q1"));
        assert_eq!(lines[0].need_quarter, None);
        assert_eq!(lines[0].depreciation_years, None);
        assert_eq!(lines[0].total_cost(), dec!(1000));
    }

    #[test]
    fn test_load_json_register() {
        let body = r#"[{"Project_Code":"P","Asset_ID":"A","Scenario":"Base",
            "Quantity":1,"Unit_Cost_USD":"250","Order_Quarter":"2026Q2",
            "Depreciation_Years":4}]"#;
        let file = write_temp(".json", body);
        let lines = load_register(file.path().to_str()).unwrap();
        assert_eq!(lines[0].unit_cost_usd, dec!(250));
        assert_eq!(lines[0].ramp_start_quarter, None);
    }

    #[test]
    fn test_unsupported_extension_is_rejected() {
        let file = write_temp(".xlsx", "not a register");
        let err = load_register(file.path().to_str()).unwrap_err();
        assert!(err.to_string().contains("Unsupported register format 'xlsx'"));
    }
}
