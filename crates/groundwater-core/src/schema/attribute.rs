//! Attribute report (`attributeReport<Year>.xlsx`): a state-wise
//! `Summary` sheet of unit counts and a unit-wise `Table` sheet.

use serde_json::{Map, Value};

use super::{number, text, DecodeContext, Field, RowReader};
use crate::models::Categorization;
use crate::scanner::{DataRow, TableSpec};

const SUMMARY_STATE_COL: usize = 0;
const DETAIL_STATE_COL: usize = 4;
const DETAIL_CATEGORIZATION_COL: usize = 24;

pub static SUMMARY_TABLE: TableSpec = TableSpec {
    first_row: 4,
    sentinel: None,
    serial_col: None,
    name_col: SUMMARY_STATE_COL,
    noise: &["State", "Total", "Grand Total"],
};

pub static DETAIL_TABLE: TableSpec = TableSpec {
    first_row: 2,
    sentinel: None,
    serial_col: None,
    name_col: DETAIL_STATE_COL,
    noise: &[],
};

pub static SUMMARY_LAYOUT: &[Field] = &[
    number("over_exploited_count", 1),
    number("safe_count", 2),
    number("saline_count", 3),
    number("critical_count", 4),
    number("semi_critical_count", 5),
    number("total_count", 6),
];

pub static DETAIL_LAYOUT: &[Field] = &[
    number("serial_no", 0),
    text("state_code", 1),
    text("state_district_code", 2),
    text("state_district_block_code", 3),
    text("district", 5),
    text("assessment_unit_name", 6),
    text("assessment_unit_type", 7),
    number("total_geographical_area_ha", 8),
    number("recharge_worthy_area_ha", 9),
    number("recharge_ham.from_rainfall_monsoon", 10),
    number("recharge_ham.from_other_sources_monsoon", 11),
    number("recharge_ham.from_rainfall_non_monsoon", 12),
    number("recharge_ham.from_other_sources_non_monsoon", 13),
    number("total_annual_recharge_ham", 14),
    number("total_natural_discharges_ham", 15),
    number("annual_extractable_resource_ham", 16),
    number("extraction_ham.irrigation", 17),
    number("extraction_ham.industrial", 18),
    number("extraction_ham.domestic", 19),
    number("extraction_ham.total", 20),
    number("annual_gw_allocation_domestic_2025_ham", 21),
    number("net_gw_availability_future_ham", 22),
    number("stage_of_extraction_percent", 23),
    text("aquifer", 25),
];

pub fn decode_summary(
    r: &mut RowReader<'_>,
    _row: &DataRow<'_>,
    _ctx: &DecodeContext,
) -> Option<Map<String, Value>> {
    let state = r.text(SUMMARY_STATE_COL)?;
    let mut map = r.fields(SUMMARY_LAYOUT);
    map.insert("state".into(), Value::from(state));
    Some(map)
}

pub fn decode_detail(
    r: &mut RowReader<'_>,
    _row: &DataRow<'_>,
    _ctx: &DecodeContext,
) -> Option<Map<String, Value>> {
    let state = r.text(DETAIL_STATE_COL)?;
    let categorization = r
        .text(DETAIL_CATEGORIZATION_COL)
        .and_then(|s| Categorization::parse(&s))
        .map(|c| c.as_str());
    let mut map = r.fields(DETAIL_LAYOUT);
    map.insert("state".into(), Value::from(state));
    map.insert("categorization".into(), Value::from(categorization));
    Some(map)
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::decode_sheet;
    use crate::coerce::Row;
    use crate::models::{Categorization, RecordSet, SourceType};

    #[test]
    fn summary_counts() {
        let mut rows: Vec<Row> = (0..4).map(|_| Vec::new()).collect();
        let mut row = indexed_row(7);
        put(&mut row, 0, "Punjab");
        let mut grand = indexed_row(7);
        put(&mut grand, 0, "Grand Total");
        rows.push(row);
        rows.push(grand);
        let out = decode_sheet(SourceType::AttributeSummary, &rows, &ctx("2024-2025"));
        let RecordSet::AttributeSummary(recs) = out.records else {
            panic!("wrong family")
        };
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].over_exploited_count, 1.0);
        assert_eq!(recs[0].total_count, 6.0);
    }

    #[test]
    fn detail_rows_need_a_state() {
        let mut rows: Vec<Row> = (0..2).map(|_| Vec::new()).collect();
        let mut row = indexed_row(26);
        put(&mut row, 4, "PUNJAB");
        put(&mut row, 6, "Ludhiana-I");
        put(&mut row, 24, "Over-Exploited");
        rows.push(row);
        let mut stateless = indexed_row(26);
        put(&mut stateless, 4, "");
        rows.push(stateless);
        let out = decode_sheet(SourceType::AttributeDetailed, &rows, &ctx("2024-2025"));
        assert_eq!(out.stats.scan.noise_rows, 1);
        let RecordSet::AttributeDetailed(recs) = out.records else {
            panic!("wrong family")
        };
        let r = &recs[0];
        assert_eq!(r.assessment_unit_name.as_deref(), Some("Ludhiana-I"));
        assert_eq!(r.state_code.as_deref(), Some("1"));
        assert_eq!(r.extraction_ham.total, 20.0);
        assert_eq!(r.categorization, Some(Categorization::OverExploited));
        assert_eq!(r.aquifer.as_deref(), Some("25"));
    }
}
