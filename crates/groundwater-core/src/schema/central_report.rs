//! National district-level report (`CentralReport<Year>.xlsx`, sheet `GEC`).

use serde_json::{Map, Value};

use super::{number, quality, text, DecodeContext, Field, RowReader};
use crate::models::Categorization;
use crate::scanner::{DataRow, TableSpec};

const STATE_COL: usize = 1;
const DISTRICT_COL: usize = 2;
const CATEGORIZATION_COL: usize = 150;

pub static TABLE: TableSpec = TableSpec {
    first_row: 11,
    sentinel: None,
    serial_col: None,
    name_col: STATE_COL,
    noise: &["Total"],
};

pub static LAYOUT: &[Field] = &[
    number("serial_no", 0),
    text("assessment_unit", 3),
    quality("rainfall_mm", 4),
    quality("total_geographical_area_ha.recharge_worthy_area", 8),
    number("total_geographical_area_ha.hilly_area", 12),
    number("total_geographical_area_ha.total", 13),
    quality("ground_water_recharge_ham.rainfall_recharge", 14),
    quality("ground_water_recharge_ham.canals", 18),
    quality("ground_water_recharge_ham.tanks_ponds", 22),
    quality("ground_water_recharge_ham.water_conservation_structures", 26),
    number("recharge_from_other_sources_monsoon_ham", 30),
    number("recharge_from_rainfall_non_monsoon_ham", 34),
    number("total_annual_recharge_ham", 50),
    number("natural_discharge_ham", 54),
    number("annual_extractable_resource_ham", 58),
    number("current_extraction_ham.irrigation", 62),
    number("current_extraction_ham.domestic", 66),
    number("current_extraction_ham.industrial", 70),
    number("current_extraction_ham.total", 74),
    number("stage_of_extraction_percent", 149),
];

pub fn decode(
    r: &mut RowReader<'_>,
    _row: &DataRow<'_>,
    _ctx: &DecodeContext,
) -> Option<Map<String, Value>> {
    let state = r.text(STATE_COL)?;
    let categorization = r
        .text(CATEGORIZATION_COL)
        .and_then(|s| Categorization::parse(&s))
        .map(|c| c.as_str());

    let mut map = r.fields(LAYOUT);
    map.insert("state".into(), Value::from(state));
    map.insert("district".into(), Value::from(r.text(DISTRICT_COL)));
    map.insert("categorization".into(), Value::from(categorization));
    Some(map)
}
