//! Asset register rows and the enrichment step that turns them into the
//! canonical working table.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::period::{parse_quarter, FiscalQuarter};
use crate::types::Money;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// One line of the asset register as loaded from the source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetLine {
    #[serde(rename = "Project_Code")]
    pub project_code: String,
    #[serde(rename = "Program_Name", default)]
    pub program_name: String,
    #[serde(rename = "Asset_ID")]
    pub asset_id: String,
    #[serde(rename = "Asset_Name", default)]
    pub asset_name: String,
    #[serde(rename = "Asset_Type", default)]
    pub asset_type: String,
    #[serde(rename = "Process_Area", default)]
    pub process_area: String,
    #[serde(rename = "Fab_Location", default)]
    pub fab_location: String,
    #[serde(rename = "Scenario")]
    pub scenario: String,
    #[serde(rename = "Quantity")]
    pub quantity: Decimal,
    #[serde(rename = "Unit_Cost_USD")]
    pub unit_cost_usd: Money,
    /// Quarter the asset is ordered, `YYYYQn`
    #[serde(rename = "Order_Quarter", default, deserialize_with = "lenient_label")]
    pub order_quarter: Option<String>,
    /// Quarter the asset is needed on site
    #[serde(rename = "Need_Quarter", default, deserialize_with = "lenient_label")]
    pub need_quarter: Option<String>,
    /// Quarter production ramp starts; depreciation begins in this year
    #[serde(
        rename = "Ramp_Start_Quarter",
        default,
        deserialize_with = "lenient_label"
    )]
    pub ramp_start_quarter: Option<String>,
    /// Useful life in years. Fractional values are truncated.
    #[serde(rename = "Depreciation_Years", default)]
    pub depreciation_years: Option<Decimal>,
}

impl AssetLine {
    /// Quantity x unit cost.
    pub fn total_cost(&self) -> Money {
        self.quantity * self.unit_cost_usd
    }
}

/// Quarter labels arrive from spreadsheets; anything that is not a string
/// (numbers, booleans, nulls) is kept as "no label" instead of failing the load.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawLabel {
    Text(String),
    Other(serde::de::IgnoredAny),
}

fn lenient_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawLabel>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawLabel::Text(s)) => Some(s),
        Some(RawLabel::Other(_)) | None => None,
    })
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// An asset line with its derived cost, period and ordering fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedAssetLine {
    #[serde(flatten)]
    pub line: AssetLine,
    #[serde(rename = "Total_Cost_USD")]
    pub total_cost_usd: Money,
    #[serde(rename = "Order_Quarter_Year")]
    pub order_quarter_year: Option<i32>,
    #[serde(rename = "Order_Quarter_Num")]
    pub order_quarter_num: Option<u8>,
    #[serde(rename = "Need_Quarter_Year")]
    pub need_quarter_year: Option<i32>,
    #[serde(rename = "Need_Quarter_Num")]
    pub need_quarter_num: Option<u8>,
    #[serde(rename = "Ramp_Start_Quarter_Year")]
    pub ramp_start_quarter_year: Option<i32>,
    #[serde(rename = "Ramp_Start_Quarter_Num")]
    pub ramp_start_quarter_num: Option<u8>,
    /// `year * 4 + quarter` of the order quarter, for chronological sorting only
    #[serde(rename = "Order_Q_Index")]
    pub order_q_index: Option<i32>,
    /// `year * 4 + quarter` of the ramp start quarter
    #[serde(rename = "Ramp_Q_Index")]
    pub ramp_q_index: Option<i32>,
    /// Grouping key for quarterly rollups
    #[serde(rename = "Order_Period")]
    pub order_period: Option<FiscalQuarter>,
}

impl EnrichedAssetLine {
    pub fn ramp_quarter(&self) -> Option<FiscalQuarter> {
        FiscalQuarter::new(self.ramp_start_quarter_year?, self.ramp_start_quarter_num?)
    }

    pub fn need_quarter(&self) -> Option<FiscalQuarter> {
        FiscalQuarter::new(self.need_quarter_year?, self.need_quarter_num?)
    }
}

/// Counts of rows whose timing labels could not be parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentReport {
    pub rows: usize,
    pub unparsed_order_quarter: usize,
    pub unparsed_need_quarter: usize,
    pub unparsed_ramp_start_quarter: usize,
}

impl EnrichmentReport {
    /// Count unparsed timing labels over any subset of enriched rows.
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a EnrichedAssetLine>,
    {
        rows.into_iter().fold(Self::default(), |mut report, row| {
            report.rows += 1;
            report.unparsed_order_quarter += usize::from(row.order_period.is_none());
            report.unparsed_need_quarter += usize::from(row.need_quarter_year.is_none());
            report.unparsed_ramp_start_quarter +=
                usize::from(row.ramp_start_quarter_year.is_none());
            report
        })
    }

    /// One human-readable line per timing column with unparsed labels.
    pub fn warnings(&self) -> Vec<String> {
        [
            ("Order_Quarter", self.unparsed_order_quarter),
            ("Need_Quarter", self.unparsed_need_quarter),
            ("Ramp_Start_Quarter", self.unparsed_ramp_start_quarter),
        ]
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(column, n)| {
            format!(
                "{n} of {} rows have a missing or malformed {column}; derived period fields are null",
                self.rows
            )
        })
        .collect()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Derive the working table. Same length and order as the input; rows with
/// bad timing labels survive with `None` in the derived period fields.
pub fn enrich(lines: &[AssetLine]) -> Vec<EnrichedAssetLine> {
    lines.iter().map(enrich_line).collect()
}

/// [`enrich`], plus a count of unparseable timing labels.
pub fn enrich_with_report(lines: &[AssetLine]) -> (Vec<EnrichedAssetLine>, EnrichmentReport) {
    let rows = enrich(lines);
    let report = EnrichmentReport::from_rows(&rows);
    tracing::debug!(
        rows = report.rows,
        unparsed_order = report.unparsed_order_quarter,
        unparsed_need = report.unparsed_need_quarter,
        unparsed_ramp = report.unparsed_ramp_start_quarter,
        "enriched asset register"
    );
    (rows, report)
}

pub fn enrich_line(line: &AssetLine) -> EnrichedAssetLine {
    let order = parse_quarter(line.order_quarter.as_deref());
    let need = parse_quarter(line.need_quarter.as_deref());
    let ramp = parse_quarter(line.ramp_start_quarter.as_deref());

    EnrichedAssetLine {
        line: line.clone(),
        total_cost_usd: line.total_cost(),
        order_quarter_year: order.map(|q| q.year()),
        order_quarter_num: order.map(|q| q.quarter()),
        need_quarter_year: need.map(|q| q.year()),
        need_quarter_num: need.map(|q| q.quarter()),
        ramp_start_quarter_year: ramp.map(|q| q.year()),
        ramp_start_quarter_num: ramp.map(|q| q.quarter()),
        order_q_index: order.map(|q| q.index()),
        ramp_q_index: ramp.map(|q| q.index()),
        order_period: order,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(order: Option<&str>, ramp: Option<&str>) -> AssetLine {
        AssetLine {
            project_code: "P100".into(),
            program_name: "Litho Expansion".into(),
            asset_id: "A-1".into(),
            asset_name: "Scanner".into(),
            asset_type: "Tool".into(),
            process_area: "Litho".into(),
            fab_location: "Fab 1".into(),
            scenario: "Base".into(),
            quantity: dec!(2),
            unit_cost_usd: dec!(1500000),
            order_quarter: order.map(String::from),
            need_quarter: Some("2025Q3".into()),
            ramp_start_quarter: ramp.map(String::from),
            depreciation_years: Some(dec!(5)),
        }
    }

    #[test]
    fn test_enrich_derives_cost_and_periods() {
        let rows = enrich(&[line(Some("2025Q2"), Some("2026Q1"))]);
        let r = &rows[0];
        assert_eq!(r.total_cost_usd, dec!(3000000));
        assert_eq!(r.order_quarter_year, Some(2025));
        assert_eq!(r.order_quarter_num, Some(2));
        assert_eq!(r.need_quarter(), FiscalQuarter::new(2025, 3));
        assert_eq!(r.order_q_index, Some(2025 * 4 + 2));
        assert_eq!(r.ramp_q_index, Some(2026 * 4 + 1));
        assert_eq!(r.order_period, FiscalQuarter::new(2025, 2));
        assert_eq!(r.ramp_quarter(), FiscalQuarter::new(2026, 1));
    }

    #[test]
    fn test_unparseable_order_quarter_keeps_row() {
        let lines = vec![
            line(Some("Q1-2025"), Some("2026Q1")),
            line(None, None),
            line(Some("2025Q1"), Some("2026Q1")),
        ];
        let (rows, report) = enrich_with_report(&lines);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].order_period, None);
        assert_eq!(rows[0].order_quarter_year, None);
        assert_eq!(rows[0].order_q_index, None);
        assert_eq!(rows[1].ramp_start_quarter_year, None);
        assert_eq!(rows[2].order_period, FiscalQuarter::new(2025, 1));
        assert_eq!(report.rows, 3);
        assert_eq!(report.unparsed_order_quarter, 2);
        assert_eq!(report.unparsed_ramp_start_quarter, 1);
        assert_eq!(report.unparsed_need_quarter, 0);

        let warnings = report.warnings();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].starts_with("2 of 3 rows have a missing or malformed Order_Quarter"));
        assert!(warnings[1].contains("Ramp_Start_Quarter"));
    }

    #[test]
    fn test_report_over_subset_counts_only_that_subset() {
        let rows = enrich(&[
            line(Some("TBD"), None),
            line(Some("2025Q1"), Some("2026Q1")),
            line(Some("2025Q2"), Some("2026Q2")),
        ]);
        let report = EnrichmentReport::from_rows(rows.iter().skip(1));
        assert_eq!(report.rows, 2);
        assert_eq!(report.unparsed_order_quarter, 0);
        assert_eq!(report.unparsed_ramp_start_quarter, 0);
        assert!(report.warnings().is_empty());
    }

    #[test]
    fn test_enrich_preserves_order() {
        let mut a = line(Some("2026Q1"), None);
        a.asset_id = "A-2".into();
        let b = line(Some("2025Q1"), None);
        let rows = enrich(&[a, b]);
        assert_eq!(rows[0].line.asset_id, "A-2");
        assert_eq!(rows[1].line.asset_id, "A-1");
    }

    #[test]
    fn test_non_string_quarter_label_deserializes_as_missing() {
        let json = serde_json::json!({
            "Project_Code": "P1",
            "Asset_ID": "A",
            "Scenario": "Base",
            "Quantity": 1,
            "Unit_Cost_USD": "10",
            "Order_Quarter": 2025,
            "Need_Quarter": null,
            "Ramp_Start_Quarter": "2026Q1",
            "Depreciation_Years": 3
        });
        let parsed: AssetLine = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.order_quarter, None);
        assert_eq!(parsed.need_quarter, None);
        assert_eq!(parsed.ramp_start_quarter.as_deref(), Some("2026Q1"));
        assert_eq!(parsed.program_name, "");
        assert_eq!(parsed.depreciation_years, Some(dec!(3)));
    }

    #[test]
    fn test_enriched_row_serializes_source_column_names() {
        let rows = enrich(&[line(Some("2025Q2"), Some("2026Q1"))]);
        let value = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(value["Project_Code"], "P100");
        assert_eq!(value["Order_Period"], "2025Q2");
        assert_eq!(value["Order_Quarter_Year"], 2025);
        assert!(value.get("Total_Cost_USD").is_some());
    }
}
