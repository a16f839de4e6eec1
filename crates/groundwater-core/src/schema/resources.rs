//! Resource summaries: Annexure 1 (state-wise, BCM) and Annexure 2
//! (district-wise, HAM, one section per state).

use serde_json::{Map, Value};

use super::{number, section_state, DecodeContext, Field, RowReader};
use crate::names::is_numeric_placeholder;
use crate::scanner::{DataRow, TableSpec};

const NAME_COL: usize = 1;

pub static STATE_TABLE: TableSpec = TableSpec {
    first_row: 6,
    sentinel: None,
    serial_col: None,
    name_col: NAME_COL,
    noise: &["Total", "All India"],
};

pub static DISTRICT_TABLE: TableSpec = TableSpec {
    first_row: 0,
    sentinel: Some("DYNAMIC GROUND WATER"),
    serial_col: Some(0),
    name_col: NAME_COL,
    noise: &["Name of District", "Total", "Total(Ham)", "Total(Bcm)"],
};

macro_rules! resource_layout {
    ($unit:literal) => {
        &[
            number("serial_no", 0),
            number(concat!("ground_water_recharge_", $unit, ".monsoon_season.from_rainfall"), 2),
            number(concat!("ground_water_recharge_", $unit, ".monsoon_season.from_other_sources"), 3),
            number(concat!("ground_water_recharge_", $unit, ".non_monsoon_season.from_rainfall"), 4),
            number(concat!("ground_water_recharge_", $unit, ".non_monsoon_season.from_other_sources"), 5),
            number(concat!("ground_water_recharge_", $unit, ".total_annual"), 6),
            number(concat!("total_natural_discharges_", $unit), 7),
            number(concat!("annual_extractable_resource_", $unit), 8),
            number(concat!("current_annual_extraction_", $unit, ".irrigation"), 9),
            number(concat!("current_annual_extraction_", $unit, ".industrial"), 10),
            number(concat!("current_annual_extraction_", $unit, ".domestic"), 11),
            number(concat!("current_annual_extraction_", $unit, ".total"), 12),
            number(concat!("annual_gw_allocation_domestic_", $unit), 13),
            number(concat!("net_gw_availability_", $unit), 14),
            number("stage_of_extraction_percent", 15),
        ]
    };
}

pub static STATE_LAYOUT: &[Field] = resource_layout!("bcm");
pub static DISTRICT_LAYOUT: &[Field] = resource_layout!("ham");

pub fn decode_state(
    r: &mut RowReader<'_>,
    _row: &DataRow<'_>,
    _ctx: &DecodeContext,
) -> Option<Map<String, Value>> {
    let state = r.text(NAME_COL)?;
    let mut map = r.fields(STATE_LAYOUT);
    map.insert("state".into(), Value::from(state));
    Some(map)
}

/// District rows take their state from the section key. Districts named by
/// a bare one- or two-digit number are serial debris and are dropped.
pub fn decode_district(
    r: &mut RowReader<'_>,
    row: &DataRow<'_>,
    ctx: &DecodeContext,
) -> Option<Map<String, Value>> {
    let district = r.text(NAME_COL).filter(|d| !is_numeric_placeholder(d))?;
    let mut map = r.fields(DISTRICT_LAYOUT);
    map.insert("state".into(), Value::from(section_state(row, ctx)));
    map.insert("district".into(), Value::from(district));
    Some(map)
}
