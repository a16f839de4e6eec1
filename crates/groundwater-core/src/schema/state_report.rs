//! Per-state block-level reports (`stateReport<State><Year>.xlsx`).
//!
//! One 162-column row per assessment unit. Most quantities come as a
//! four-facet quality group (contaminated, non-contaminated, poor quality,
//! total); storage figures come as fresh/saline pairs.

use serde_json::{Map, Value};

use super::{
    fresh_saline, number, quality, text, text_facets, DecodeContext, Field, RowReader,
    UNKNOWN_STATE,
};
use crate::scanner::{DataRow, TableSpec};

/// Shorter rows are debris from merged header cells.
pub const MIN_CELLS: usize = 10;

const CATEGORIZATION_KEYS: &[&str] = &["contaminated", "non_contaminated", "poor_quality", "overall"];
const TREND_KEYS: &[&str] = &["contaminated", "non_contaminated"];
const PARAMETER_KEYS: &[&str] = &["contaminated", "non_contaminated", "poor_quality"];

pub static TABLE: TableSpec = TableSpec {
    first_row: 11,
    sentinel: None,
    serial_col: Some(0),
    name_col: 2,
    noise: &["Total"],
};

pub static LAYOUT: &[Field] = &[
    text("assessment_unit", 3),
    text("watershed_district", 4),
    quality("rainfall_mm", 5),
    quality("geographical_area_ha.recharge_worthy", 9),
    number("geographical_area_ha.hilly_area", 13),
    number("geographical_area_ha.total", 14),
    quality("ground_water_recharge_ham.rainfall_recharge", 15),
    quality("ground_water_recharge_ham.canals", 19),
    quality("ground_water_recharge_ham.surface_water_irrigation", 23),
    quality("ground_water_recharge_ham.ground_water_irrigation", 27),
    quality("ground_water_recharge_ham.tanks_and_ponds", 31),
    quality("ground_water_recharge_ham.water_conservation_structure", 35),
    quality("ground_water_recharge_ham.pipelines", 39),
    quality("ground_water_recharge_ham.sewages_flash_flood_channels", 43),
    quality("ground_water_recharge_ham.subtotal", 47),
    quality("inflows_outflows_ham.base_flow", 51),
    quality("inflows_outflows_ham.stream_recharges", 55),
    quality("inflows_outflows_ham.lateral_flows", 59),
    quality("inflows_outflows_ham.vertical_flows", 63),
    quality("inflows_outflows_ham.evaporation", 67),
    quality("inflows_outflows_ham.transpiration", 71),
    quality("inflows_outflows_ham.evapotranspiration", 75),
    quality("inflows_outflows_ham.subtotal", 79),
    quality("annual_gw_recharge_ham", 83),
    quality("environmental_flows_ham", 87),
    quality("annual_extractable_gw_resource_ham", 91),
    quality("gw_extraction_ham.domestic", 95),
    quality("gw_extraction_ham.industrial", 99),
    quality("gw_extraction_ham.irrigation", 103),
    quality("gw_extraction_ham.total", 107),
    quality("stage_of_extraction_percent", 111),
    text_facets("categorization", 115, CATEGORIZATION_KEYS),
    text_facets("gw_trends.pre_monsoon", 119, TREND_KEYS),
    text_facets("gw_trends.post_monsoon", 121, TREND_KEYS),
    quality("allocation_domestic_2025_ham", 123),
    quality("net_annual_gw_availability_ham", 127),
    text_facets("quality_tagging.major_parameter", 131, PARAMETER_KEYS),
    text_facets("quality_tagging.other_parameters", 134, PARAMETER_KEYS),
    number("additional_potential_resources_ham.waterlogged_shallow_water_table", 137),
    number("additional_potential_resources_ham.flood_prone", 138),
    number("additional_potential_resources_ham.spring_discharge", 139),
    quality("coastal_areas", 140),
    fresh_saline("in_storage_unconfined_gw_ham", 144),
    fresh_saline("total_gw_availability_unconfined_ham", 146),
    fresh_saline("dynamic_confined_gw_ham", 148),
    fresh_saline("in_storage_confined_gw_ham", 150),
    fresh_saline("total_confined_gw_ham", 152),
    fresh_saline("dynamic_semi_confined_gw_ham", 154),
    fresh_saline("in_storage_semi_confined_gw_ham", 156),
    fresh_saline("total_semi_confined_gw_ham", 158),
    fresh_saline("total_gw_availability_ham", 160),
];

pub fn decode(
    r: &mut RowReader<'_>,
    _row: &DataRow<'_>,
    ctx: &DecodeContext,
) -> Option<Map<String, Value>> {
    if r.len() < MIN_CELLS {
        return None;
    }
    let district = r.text(2)?;
    let state = r
        .text(1)
        .or_else(|| ctx.fallback_state.clone())
        .unwrap_or_else(|| UNKNOWN_STATE.to_string());
    let serial = r.float(0);

    let mut map = r.fields(LAYOUT);
    map.insert("serial_no".into(), Value::from(serial as u64));
    map.insert("state".into(), Value::from(state));
    map.insert("district".into(), Value::from(district));
    Some(map)
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::{decode_sheet, DecodeContext};
    use crate::coerce::{Cell, Row};
    use crate::models::{Categorization, RecordSet, SourceType, StateReportRecord};

    fn sheet(rows: Vec<Row>) -> Vec<Row> {
        let mut sheet: Vec<Row> = (0..11).map(|_| vec![Cell::from("header")]).collect();
        sheet.extend(rows);
        sheet
    }

    fn decode(rows: Vec<Row>, fallback: Option<&str>) -> Vec<StateReportRecord> {
        let ctx = DecodeContext {
            year: "2022-2023".into(),
            fallback_state: fallback.map(str::to_string),
        };
        match decode_sheet(SourceType::StateReport, &sheet(rows), &ctx).records {
            RecordSet::StateReport(v) => v,
            other => panic!("unexpected {:?}", other.source_type()),
        }
    }

    fn unit_row() -> Row {
        let mut row = indexed_row(162);
        put(&mut row, 0, "1");
        put(&mut row, 1, "Kerala");
        put(&mut row, 2, "Idukki");
        put(&mut row, 3, "Adimali");
        row
    }

    #[test]
    fn full_row_decodes_every_group() {
        let recs = decode(vec![unit_row()], None);
        assert_eq!(recs.len(), 1);
        let r = &recs[0];
        assert_eq!(r.serial_no, 1);
        assert_eq!(r.state, "Kerala");
        assert_eq!(r.assessment_unit.as_deref(), Some("Adimali"));
        assert_eq!(r.year, "2022-2023");
        assert_eq!(r.rainfall_mm.total, 8.0);
        assert_eq!(r.geographical_area_ha.hilly_area, 13.0);
        assert_eq!(r.ground_water_recharge_ham.subtotal.total, 50.0);
        assert_eq!(r.gw_extraction_ham.total.total, 110.0);
        assert_eq!(r.categorization.overall.as_deref(), Some("118"));
        assert_eq!(r.total_gw_availability_ham.saline, 161.0);
    }

    #[test]
    fn thousands_separator_in_rainfall_total() {
        let mut row = unit_row();
        put(&mut row, 8, "1,234.5");
        let recs = decode(vec![row], None);
        assert_eq!(recs[0].rainfall_mm.total, 1234.5);
    }

    #[test]
    fn rejects_short_rows_and_missing_district() {
        let mut short = unit_row();
        short.truncate(9);
        let mut no_district = unit_row();
        no_district[2] = Cell::Empty;
        let ctx = DecodeContext {
            year: "2022-2023".into(),
            fallback_state: None,
        };
        let out = decode_sheet(SourceType::StateReport, &sheet(vec![short, no_district]), &ctx);
        assert!(out.records.is_empty());
        // the blank-district row never reaches the decoder
        assert_eq!(out.stats.scan.noise_rows, 1);
        assert_eq!(out.stats.rejected_rows, 1);
    }

    #[test]
    fn state_falls_back_to_file_name() {
        let mut row = unit_row();
        row[1] = Cell::Empty;
        let recs = decode(vec![row], Some("Tamil Nadu"));
        assert_eq!(recs[0].state, "Tamil Nadu");
    }

    #[test]
    fn total_row_and_header_rows_are_skipped() {
        let mut total = unit_row();
        put(&mut total, 0, "Total");
        put(&mut total, 2, "Total");
        let recs = decode(vec![total, unit_row()], None);
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn garbage_numeric_cells_default_and_count() {
        let mut row = unit_row();
        put(&mut row, 83, "n.a.");
        put(&mut row, 115, "");
        put(&mut row, 116, "Over-Exploited");
        put(&mut row, 118, "");
        let ctx = DecodeContext {
            year: "2022-2023".into(),
            fallback_state: None,
        };
        let out = decode_sheet(SourceType::StateReport, &sheet(vec![row]), &ctx);
        assert_eq!(out.stats.invalid_cells, 1);
        let RecordSet::StateReport(recs) = out.records else {
            panic!("wrong family")
        };
        assert_eq!(recs[0].annual_gw_recharge_ham.contaminated, 0.0);
        assert_eq!(recs[0].effective_categorization(), Some(Categorization::OverExploited));
    }
}
