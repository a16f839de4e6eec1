//! Unit name lists of Annexure 4: stressed units (4A) and units with
//! geogenic quality problems (4B), one section per state.

use serde_json::{Map, Value};

use super::{number, section_state, text, DecodeContext, Field, RowReader};
use crate::scanner::{DataRow, TableSpec};

const DISTRICT_COL: usize = 1;
const NOISE: &[&str] = &["Name of District", "ABSTRACT", "Total No. of Assessed Units"];

pub const STRESSED_TABLE: TableSpec = TableSpec {
    first_row: 1,
    sentinel: Some("CATEGORISATION OF ASSESSMENT"),
    serial_col: Some(0),
    name_col: DISTRICT_COL,
    noise: NOISE,
};

pub const QUALITY_TABLE: TableSpec = TableSpec {
    sentinel: Some("QUALITY PROBLEMS"),
    ..STRESSED_TABLE
};

pub static STRESSED_LAYOUT: &[Field] = &[
    number("serial_no", 0),
    text("semi_critical_unit", 3),
    text("critical_unit", 5),
    text("over_exploited_unit", 7),
];

pub static QUALITY_LAYOUT: &[Field] = &[
    number("serial_no", 0),
    text("fluoride_affected_unit", 3),
    text("arsenic_affected_unit", 5),
    text("salinity_affected_unit", 7),
];

fn unit_row(
    r: &mut RowReader<'_>,
    row: &DataRow<'_>,
    ctx: &DecodeContext,
    layout: &[Field],
) -> Option<Map<String, Value>> {
    let district = r.text(DISTRICT_COL)?;
    let map = r.fields(layout);
    let named = layout
        .iter()
        .filter(|f| f.path.ends_with("_unit"))
        .any(|f| map.get(f.path).is_some_and(|v| !v.is_null()));
    if !named {
        return None;
    }
    let mut map = map;
    map.insert("state".into(), Value::from(section_state(row, ctx)));
    map.insert("district".into(), Value::from(district));
    Some(map)
}

pub fn decode_stressed(
    r: &mut RowReader<'_>,
    row: &DataRow<'_>,
    ctx: &DecodeContext,
) -> Option<Map<String, Value>> {
    unit_row(r, row, ctx, STRESSED_LAYOUT)
}

pub fn decode_quality(
    r: &mut RowReader<'_>,
    row: &DataRow<'_>,
    ctx: &DecodeContext,
) -> Option<Map<String, Value>> {
    unit_row(r, row, ctx, QUALITY_LAYOUT)
}
