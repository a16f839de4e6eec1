//! Categorization tables of Annexure 3.
//!
//! 3A, 3C and 3E are flat state-wise tables; 3B, 3D and 3F repeat the same
//! columns district-wise with one section per state.

use serde_json::{Map, Value};

use super::{categories, number, section_state, DecodeContext, Field, RowReader};
use crate::scanner::{DataRow, TableSpec};

const NAME_COL: usize = 1;

pub const UNITS_STATE_TABLE: TableSpec = TableSpec {
    first_row: 4,
    sentinel: None,
    serial_col: None,
    name_col: NAME_COL,
    noise: &["States", "Total", "ALL INDIA"],
};

pub const RESOURCE_STATE_TABLE: TableSpec = TableSpec {
    first_row: 5,
    ..UNITS_STATE_TABLE
};

pub const AREA_STATE_TABLE: TableSpec = TableSpec {
    first_row: 4,
    ..UNITS_STATE_TABLE
};

pub const SECTIONED_TABLE: TableSpec = TableSpec {
    first_row: 0,
    sentinel: Some("DYNAMIC GROUND WATER"),
    serial_col: Some(0),
    name_col: NAME_COL,
    noise: &["Name of District", "Total", "No", "No."],
};

pub static UNITS_LAYOUT: &[Field] = &[
    number("serial_no", 0),
    number("total_assessed_units", 2),
    categories("", 3, "count"),
];

pub static RESOURCE_LAYOUT: &[Field] = &[
    number("serial_no", 0),
    number("total_extractable_resource_ham", 2),
    categories("", 3, "resource_ham"),
];

pub static STATE_AREA_LAYOUT: &[Field] = &[
    number("serial_no", 0),
    number("total_geographical_area_sq_km", 2),
    number("recharge_worthy_area_sq_km", 3),
    categories("", 4, "area_sq_km"),
];

pub static DISTRICT_AREA_LAYOUT: &[Field] = &[
    number("serial_no", 0),
    number("total_recharge_worthy_area_sq_km", 2),
    categories("", 3, "area_sq_km"),
];

fn state_row(r: &mut RowReader<'_>, layout: &[Field]) -> Option<Map<String, Value>> {
    let state = r.text(NAME_COL)?;
    let mut map = r.fields(layout);
    map.insert("state".into(), Value::from(state));
    Some(map)
}

fn district_row(
    r: &mut RowReader<'_>,
    row: &DataRow<'_>,
    ctx: &DecodeContext,
    layout: &[Field],
) -> Option<Map<String, Value>> {
    let district = r.text(NAME_COL)?;
    let mut map = r.fields(layout);
    map.insert("state".into(), Value::from(section_state(row, ctx)));
    map.insert("district".into(), Value::from(district));
    Some(map)
}

pub fn decode_units_state(
    r: &mut RowReader<'_>,
    _row: &DataRow<'_>,
    _ctx: &DecodeContext,
) -> Option<Map<String, Value>> {
    state_row(r, UNITS_LAYOUT)
}

pub fn decode_units_district(
    r: &mut RowReader<'_>,
    row: &DataRow<'_>,
    ctx: &DecodeContext,
) -> Option<Map<String, Value>> {
    district_row(r, row, ctx, UNITS_LAYOUT)
}

pub fn decode_resource_state(
    r: &mut RowReader<'_>,
    _row: &DataRow<'_>,
    _ctx: &DecodeContext,
) -> Option<Map<String, Value>> {
    state_row(r, RESOURCE_LAYOUT)
}

pub fn decode_resource_district(
    r: &mut RowReader<'_>,
    row: &DataRow<'_>,
    ctx: &DecodeContext,
) -> Option<Map<String, Value>> {
    district_row(r, row, ctx, RESOURCE_LAYOUT)
}

pub fn decode_area_state(
    r: &mut RowReader<'_>,
    _row: &DataRow<'_>,
    _ctx: &DecodeContext,
) -> Option<Map<String, Value>> {
    state_row(r, STATE_AREA_LAYOUT)
}

pub fn decode_area_district(
    r: &mut RowReader<'_>,
    row: &DataRow<'_>,
    ctx: &DecodeContext,
) -> Option<Map<String, Value>> {
    district_row(r, row, ctx, DISTRICT_AREA_LAYOUT)
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::decode_sheet;
    use crate::coerce::Row;
    use crate::models::{RecordSet, SourceType};

    fn flat(first_row: usize, names: &[&str], width: usize) -> Vec<Row> {
        let mut rows: Vec<Row> = (0..first_row).map(|_| Vec::new()).collect();
        for name in names {
            let mut row = indexed_row(width);
            put(&mut row, 1, name);
            rows.push(row);
        }
        rows
    }

    #[test]
    fn annexure3a_counts_and_percents() {
        let rows = flat(4, &["Kerala", "States", "Total"], 13);
        let out = decode_sheet(SourceType::Annexure3a, &rows, &ctx("2022-2023"));
        let RecordSet::Annexure3a(recs) = out.records else {
            panic!("wrong family")
        };
        assert_eq!(recs.len(), 1);
        let r = &recs[0];
        assert_eq!(r.district, None);
        assert_eq!(r.total_assessed_units, 2.0);
        assert_eq!(r.categories.safe.count, 3.0);
        assert_eq!(r.categories.safe.percent, 4.0);
        assert_eq!(r.categories.saline.count, 11.0);
        assert_eq!(r.categories.saline.percent, 12.0);
    }

    #[test]
    fn annexure3c_starts_one_row_later() {
        let rows = flat(5, &["Goa"], 13);
        let out = decode_sheet(SourceType::Annexure3c, &rows, &ctx("2022-2023"));
        let RecordSet::Annexure3c(recs) = out.records else {
            panic!("wrong family")
        };
        assert_eq!(recs[0].total_extractable_resource_ham, 2.0);
        assert_eq!(recs[0].categories.over_exploited.resource_ham, 9.0);
    }

    #[test]
    fn annexure3e_area_columns() {
        let rows = flat(4, &["Goa"], 14);
        let out = decode_sheet(SourceType::Annexure3e, &rows, &ctx("2022-2023"));
        let RecordSet::Annexure3e(recs) = out.records else {
            panic!("wrong family")
        };
        assert_eq!(recs[0].recharge_worthy_area_sq_km, 3.0);
        assert_eq!(recs[0].categories.safe.area_sq_km, 4.0);
    }

    #[test]
    fn annexure3f_district_sections() {
        let mut rows: Vec<Row> = vec![vec!["DYNAMIC GROUND WATER RESOURCES".into()], vec!["Punjab".into()]];
        let mut row = indexed_row(13);
        put(&mut row, 0, "1");
        put(&mut row, 1, "Ludhiana");
        rows.push(row);
        let out = decode_sheet(SourceType::Annexure3f, &rows, &ctx("2022-2023"));
        let RecordSet::Annexure3f(recs) = out.records else {
            panic!("wrong family")
        };
        assert_eq!(recs[0].state, "Punjab");
        assert_eq!(recs[0].district, "Ludhiana");
        assert_eq!(recs[0].total_recharge_worthy_area_sq_km, 2.0);
    }

    #[test]
    fn annexure3b_without_section_is_unknown_state() {
        let mut row = indexed_row(13);
        put(&mut row, 0, "1");
        put(&mut row, 1, "Ludhiana");
        let out = decode_sheet(SourceType::Annexure3b, &[row], &ctx("2022-2023"));
        let RecordSet::Annexure3b(recs) = out.records else {
            panic!("wrong family")
        };
        assert_eq!(recs[0].state, "Unknown");
        assert_eq!(recs[0].district.as_deref(), Some("Ludhiana"));
    }
}
