//! Curated metric tables, one per report family.
//!
//! Annexure keys carry a scope prefix (`state_`, `district_`,
//! `state_categorization_`, ...) so that the same quantity reported at two
//! granularities stays distinguishable in the corpus.

use super::{table_facts, FactScope, FactSink, FactValue, MetricDef, Unit};
use crate::models::{
    AttributeDetailRecord, AttributeSummaryRecord, Categorization, CentralReportRecord,
    DistrictAreaCategorizationRecord, DistrictResourceRecord, QualityProblemRecord, RecordSet,
    ResourceCategorizationRecord, SourceDocument, StateAreaCategorizationRecord,
    StateReportRecord, StateResourceRecord, StressedUnitsRecord, UnitCategorizationRecord,
};
use crate::names::{clean_location, clean_name, NameKind};

macro_rules! num {
    ($key:literal, $unit:ident, $cat:literal, $desc:literal, |$r:ident| $e:expr) => {
        MetricDef {
            key: $key,
            unit: Unit::$unit,
            category: $cat,
            description: $desc,
            read: |$r| Some(FactValue::Number($e)),
        }
    };
}

macro_rules! text {
    ($key:literal, $cat:literal, $desc:literal, |$r:ident| $e:expr) => {
        MetricDef {
            key: $key,
            unit: Unit::None,
            category: $cat,
            description: $desc,
            read: |$r| $e.map(FactValue::Text),
        }
    };
}

pub static STATE_REPORT: &[MetricDef<StateReportRecord>] = &[
    num!("rainfall_total_mm", Mm, "rainfall", "total rainfall", |r| r.rainfall_mm.total),
    num!("geographical_area_total_ha", Ha, "geographical_area", "total geographical area", |r| r.geographical_area_ha.total),
    num!("recharge_worthy_area_ha", Ha, "geographical_area", "recharge-worthy area", |r| r.geographical_area_ha.recharge_worthy.total),
    num!("gw_recharge_from_rainfall_ham", Ham, "groundwater_recharge", "groundwater recharge from rainfall", |r| r.ground_water_recharge_ham.rainfall_recharge.total),
    num!("gw_recharge_total_ham", Ham, "groundwater_recharge", "total groundwater recharge", |r| r.ground_water_recharge_ham.subtotal.total),
    num!("annual_gw_recharge_ham", Ham, "annual_resources", "annual groundwater recharge", |r| r.annual_gw_recharge_ham.total),
    num!("annual_extractable_gw_ham", Ham, "annual_resources", "annual extractable groundwater resource", |r| r.annual_extractable_gw_resource_ham.total),
    num!("environmental_flows_ham", Ham, "annual_resources", "environmental flow requirement", |r| r.environmental_flows_ham.total),
    num!("gw_extraction_irrigation_ham", Ham, "extraction", "groundwater extraction for irrigation", |r| r.gw_extraction_ham.irrigation.total),
    num!("gw_extraction_domestic_ham", Ham, "extraction", "groundwater extraction for domestic use", |r| r.gw_extraction_ham.domestic.total),
    num!("gw_extraction_industrial_ham", Ham, "extraction", "groundwater extraction for industrial use", |r| r.gw_extraction_ham.industrial.total),
    num!("gw_extraction_total_ham", Ham, "extraction", "total groundwater extraction", |r| r.gw_extraction_ham.total.total),
    num!("stage_of_extraction_percent", Percent, "extraction_status", "stage of groundwater extraction", |r| r.stage_of_extraction_percent.total),
    num!("net_gw_availability_ham", Ham, "availability", "net annual groundwater availability", |r| r.net_annual_gw_availability_ham.total),
    num!("allocation_domestic_2025_ham", Ham, "allocation", "domestic allocation projected for 2025", |r| r.allocation_domestic_2025_ham.total),
    text!("categorization_status", "status", "groundwater status category", |r| r.effective_categorization().map(|c| c.label().to_string())),
    text!("gw_trend_pre_monsoon", "trends", "pre-monsoon groundwater trend", |r| r.gw_trends.pre_monsoon.non_contaminated.clone()),
    text!("gw_trend_post_monsoon", "trends", "post-monsoon groundwater trend", |r| r.gw_trends.post_monsoon.non_contaminated.clone()),
    num!("in_storage_fresh_ham", Ham, "storage", "fresh groundwater in storage", |r| r.in_storage_unconfined_gw_ham.fresh),
    num!("total_gw_availability_fresh_ham", Ham, "availability", "total fresh groundwater availability", |r| r.total_gw_availability_ham.fresh),
];

pub static CENTRAL_REPORT: &[MetricDef<CentralReportRecord>] = &[
    num!("rainfall_total_mm", Mm, "rainfall", "total rainfall", |r| r.rainfall_mm.total),
    num!("geographical_area_total_ha", Ha, "geographical_area", "total geographical area", |r| r.total_geographical_area_ha.total),
    num!("recharge_worthy_area_ha", Ha, "geographical_area", "recharge-worthy area", |r| r.total_geographical_area_ha.recharge_worthy_area.total),
    num!("gw_recharge_from_rainfall_ham", Ham, "groundwater_recharge", "groundwater recharge from rainfall", |r| r.ground_water_recharge_ham.rainfall_recharge.total),
    num!("total_annual_recharge_ham", Ham, "groundwater_recharge", "total annual groundwater recharge", |r| r.total_annual_recharge_ham),
    num!("recharge_other_sources_monsoon_ham", Ham, "groundwater_recharge", "monsoon recharge from other sources", |r| r.recharge_from_other_sources_monsoon_ham),
    num!("recharge_rainfall_non_monsoon_ham", Ham, "groundwater_recharge", "non-monsoon rainfall recharge", |r| r.recharge_from_rainfall_non_monsoon_ham),
    num!("natural_discharge_ham", Ham, "discharge", "natural groundwater discharge", |r| r.natural_discharge_ham),
    num!("annual_extractable_resource_ham", Ham, "resources", "annual extractable groundwater resource", |r| r.annual_extractable_resource_ham),
    num!("extraction_irrigation_ham", Ham, "extraction", "groundwater extraction for irrigation", |r| r.current_extraction_ham.irrigation),
    num!("extraction_domestic_ham", Ham, "extraction", "groundwater extraction for domestic use", |r| r.current_extraction_ham.domestic),
    num!("extraction_industrial_ham", Ham, "extraction", "groundwater extraction for industrial use", |r| r.current_extraction_ham.industrial),
    num!("extraction_total_ham", Ham, "extraction", "total groundwater extraction", |r| r.current_extraction_ham.total),
    num!("stage_of_extraction_percent", Percent, "status", "stage of groundwater extraction", |r| r.stage_of_extraction_percent),
    text!("categorization_status", "status", "groundwater status category", |r| r.categorization.map(|c| c.label().to_string())),
];

pub static ATTRIBUTE_SUMMARY: &[MetricDef<AttributeSummaryRecord>] = &[
    num!("over_exploited_units_count", Count, "categorization_summary", "over-exploited groundwater units", |r| r.over_exploited_count),
    num!("safe_units_count", Count, "categorization_summary", "safe groundwater units", |r| r.safe_count),
    num!("critical_units_count", Count, "categorization_summary", "critical groundwater units", |r| r.critical_count),
    num!("semi_critical_units_count", Count, "categorization_summary", "semi-critical groundwater units", |r| r.semi_critical_count),
    num!("saline_units_count", Count, "categorization_summary", "saline groundwater units", |r| r.saline_count),
    num!("total_assessed_units_count", Count, "categorization_summary", "total assessed groundwater units", |r| r.total_count),
];

pub static ATTRIBUTE_DETAIL: &[MetricDef<AttributeDetailRecord>] = &[
    num!("geographical_area_total_ha", Ha, "geographical_area", "total geographical area", |r| r.total_geographical_area_ha),
    num!("recharge_worthy_area_ha", Ha, "geographical_area", "recharge-worthy area", |r| r.recharge_worthy_area_ha),
    num!("total_annual_recharge_ham", Ham, "recharge", "total annual groundwater recharge", |r| r.total_annual_recharge_ham),
    num!("natural_discharge_ham", Ham, "discharge", "total natural discharge", |r| r.total_natural_discharges_ham),
    num!("annual_extractable_resource_ham", Ham, "resources", "annual extractable groundwater resource", |r| r.annual_extractable_resource_ham),
    num!("extraction_irrigation_ham", Ham, "extraction", "groundwater extraction for irrigation", |r| r.extraction_ham.irrigation),
    num!("extraction_domestic_ham", Ham, "extraction", "groundwater extraction for domestic use", |r| r.extraction_ham.domestic),
    num!("extraction_industrial_ham", Ham, "extraction", "groundwater extraction for industrial use", |r| r.extraction_ham.industrial),
    num!("extraction_total_ham", Ham, "extraction", "total groundwater extraction", |r| r.extraction_ham.total),
    num!("domestic_allocation_2025_ham", Ham, "allocation", "domestic allocation projected for 2025", |r| r.annual_gw_allocation_domestic_2025_ham),
    num!("net_gw_availability_future_ham", Ham, "availability", "net groundwater availability for future use", |r| r.net_gw_availability_future_ham),
    num!("stage_of_extraction_percent", Percent, "status", "stage of groundwater extraction", |r| r.stage_of_extraction_percent),
    text!("categorization_status", "status", "groundwater status category", |r| r.categorization.map(|c| c.label().to_string())),
];

pub static ANNEXURE_1: &[MetricDef<StateResourceRecord>] = &[
    num!("state_monsoon_recharge_from_rainfall_bcm", Bcm, "recharge", "monsoon season rainfall recharge", |r| r.ground_water_recharge_bcm.monsoon_season.from_rainfall),
    num!("state_monsoon_recharge_other_sources_bcm", Bcm, "recharge", "monsoon season recharge from other sources", |r| r.ground_water_recharge_bcm.monsoon_season.from_other_sources),
    num!("state_non_monsoon_recharge_from_rainfall_bcm", Bcm, "recharge", "non-monsoon season rainfall recharge", |r| r.ground_water_recharge_bcm.non_monsoon_season.from_rainfall),
    num!("state_non_monsoon_recharge_other_sources_bcm", Bcm, "recharge", "non-monsoon season recharge from other sources", |r| r.ground_water_recharge_bcm.non_monsoon_season.from_other_sources),
    num!("state_total_annual_recharge_bcm", Bcm, "recharge", "total annual groundwater recharge", |r| r.ground_water_recharge_bcm.total_annual),
    num!("state_natural_discharge_bcm", Bcm, "discharge", "total natural groundwater discharge", |r| r.total_natural_discharges_bcm),
    num!("state_annual_extractable_resource_bcm", Bcm, "resources", "annual extractable groundwater resource", |r| r.annual_extractable_resource_bcm),
    num!("state_extraction_irrigation_bcm", Bcm, "extraction", "groundwater extraction for irrigation", |r| r.current_annual_extraction_bcm.irrigation),
    num!("state_extraction_domestic_bcm", Bcm, "extraction", "groundwater extraction for domestic use", |r| r.current_annual_extraction_bcm.domestic),
    num!("state_extraction_industrial_bcm", Bcm, "extraction", "groundwater extraction for industrial use", |r| r.current_annual_extraction_bcm.industrial),
    num!("state_extraction_total_bcm", Bcm, "extraction", "total groundwater extraction", |r| r.current_annual_extraction_bcm.total),
    num!("state_domestic_allocation_bcm", Bcm, "allocation", "domestic groundwater allocation", |r| r.annual_gw_allocation_domestic_bcm),
    num!("state_net_gw_availability_bcm", Bcm, "availability", "net groundwater availability", |r| r.net_gw_availability_bcm),
    num!("state_stage_of_extraction_percent", Percent, "status", "stage of groundwater extraction", |r| r.stage_of_extraction_percent),
];

pub static ANNEXURE_2: &[MetricDef<DistrictResourceRecord>] = &[
    num!("district_monsoon_recharge_from_rainfall_ham", Ham, "recharge", "monsoon season rainfall recharge", |r| r.ground_water_recharge_ham.monsoon_season.from_rainfall),
    num!("district_monsoon_recharge_other_sources_ham", Ham, "recharge", "monsoon season recharge from other sources", |r| r.ground_water_recharge_ham.monsoon_season.from_other_sources),
    num!("district_non_monsoon_recharge_from_rainfall_ham", Ham, "recharge", "non-monsoon season rainfall recharge", |r| r.ground_water_recharge_ham.non_monsoon_season.from_rainfall),
    num!("district_non_monsoon_recharge_other_sources_ham", Ham, "recharge", "non-monsoon season recharge from other sources", |r| r.ground_water_recharge_ham.non_monsoon_season.from_other_sources),
    num!("district_total_annual_recharge_ham", Ham, "recharge", "total annual groundwater recharge", |r| r.ground_water_recharge_ham.total_annual),
    num!("district_natural_discharge_ham", Ham, "discharge", "total natural groundwater discharge", |r| r.total_natural_discharges_ham),
    num!("district_annual_extractable_resource_ham", Ham, "resources", "annual extractable groundwater resource", |r| r.annual_extractable_resource_ham),
    num!("district_extraction_irrigation_ham", Ham, "extraction", "groundwater extraction for irrigation", |r| r.current_annual_extraction_ham.irrigation),
    num!("district_extraction_domestic_ham", Ham, "extraction", "groundwater extraction for domestic use", |r| r.current_annual_extraction_ham.domestic),
    num!("district_extraction_industrial_ham", Ham, "extraction", "groundwater extraction for industrial use", |r| r.current_annual_extraction_ham.industrial),
    num!("district_extraction_total_ham", Ham, "extraction", "total groundwater extraction", |r| r.current_annual_extraction_ham.total),
    num!("district_domestic_allocation_ham", Ham, "allocation", "domestic groundwater allocation", |r| r.annual_gw_allocation_domestic_ham),
    num!("district_net_gw_availability_ham", Ham, "availability", "net groundwater availability", |r| r.net_gw_availability_ham),
    num!("district_stage_of_extraction_percent", Percent, "status", "stage of groundwater extraction", |r| r.stage_of_extraction_percent),
];

pub static ANNEXURE_3A: &[MetricDef<UnitCategorizationRecord>] = &[
    num!("state_categorization_total_assessed_units", Count, "categorization", "total assessed units", |r| r.total_assessed_units),
    num!("state_categorization_safe_units_count", Count, "categorization", "safe units", |r| r.categories.safe.count),
    num!("state_categorization_safe_units_percent", Percent, "categorization", "percentage of safe units", |r| r.categories.safe.percent),
    num!("state_categorization_semi_critical_units_count", Count, "categorization", "semi-critical units", |r| r.categories.semi_critical.count),
    num!("state_categorization_semi_critical_units_percent", Percent, "categorization", "percentage of semi-critical units", |r| r.categories.semi_critical.percent),
    num!("state_categorization_critical_units_count", Count, "categorization", "critical units", |r| r.categories.critical.count),
    num!("state_categorization_critical_units_percent", Percent, "categorization", "percentage of critical units", |r| r.categories.critical.percent),
    num!("state_categorization_over_exploited_units_count", Count, "categorization", "over-exploited units", |r| r.categories.over_exploited.count),
    num!("state_categorization_over_exploited_units_percent", Percent, "categorization", "percentage of over-exploited units", |r| r.categories.over_exploited.percent),
    num!("state_categorization_saline_units_count", Count, "categorization", "saline units", |r| r.categories.saline.count),
    num!("state_categorization_saline_units_percent", Percent, "categorization", "percentage of saline units", |r| r.categories.saline.percent),
];

pub static ANNEXURE_3B: &[MetricDef<UnitCategorizationRecord>] = &[
    num!("district_categorization_total_assessed_units", Count, "categorization", "total assessed units", |r| r.total_assessed_units),
    num!("district_categorization_safe_units_count", Count, "categorization", "safe units", |r| r.categories.safe.count),
    num!("district_categorization_safe_units_percent", Percent, "categorization", "percentage of safe units", |r| r.categories.safe.percent),
    num!("district_categorization_over_exploited_units_count", Count, "categorization", "over-exploited units", |r| r.categories.over_exploited.count),
    num!("district_categorization_over_exploited_units_percent", Percent, "categorization", "percentage of over-exploited units", |r| r.categories.over_exploited.percent),
    num!("district_categorization_critical_units_count", Count, "categorization", "critical units", |r| r.categories.critical.count),
    num!("district_categorization_saline_units_count", Count, "categorization", "saline units", |r| r.categories.saline.count),
];

pub static ANNEXURE_3C: &[MetricDef<ResourceCategorizationRecord>] = &[
    num!("state_resource_total_extractable_resource_ham", Ham, "resources", "total extractable groundwater resource", |r| r.total_extractable_resource_ham),
    num!("state_resource_safe_resource_ham", Ham, "resources", "extractable resource in safe units", |r| r.categories.safe.resource_ham),
    num!("state_resource_over_exploited_resource_ham", Ham, "resources", "extractable resource in over-exploited units", |r| r.categories.over_exploited.resource_ham),
];

pub static ANNEXURE_3D: &[MetricDef<ResourceCategorizationRecord>] = &[
    num!("district_resource_total_extractable_resource_ham", Ham, "resources", "total extractable groundwater resource", |r| r.total_extractable_resource_ham),
    num!("district_resource_safe_resource_ham", Ham, "resources", "extractable resource in safe units", |r| r.categories.safe.resource_ham),
    num!("district_resource_over_exploited_resource_ham", Ham, "resources", "extractable resource in over-exploited units", |r| r.categories.over_exploited.resource_ham),
];

pub static ANNEXURE_3E: &[MetricDef<StateAreaCategorizationRecord>] = &[
    num!("state_area_total_geographical_area_sq_km", SqKm, "area", "total geographical area", |r| r.total_geographical_area_sq_km),
    num!("state_area_recharge_worthy_area_sq_km", SqKm, "area", "recharge-worthy area", |r| r.recharge_worthy_area_sq_km),
    num!("state_area_safe_area_sq_km", SqKm, "area", "area under safe category", |r| r.categories.safe.area_sq_km),
    num!("state_area_over_exploited_area_sq_km", SqKm, "area", "area under over-exploited category", |r| r.categories.over_exploited.area_sq_km),
];

pub static ANNEXURE_3F: &[MetricDef<DistrictAreaCategorizationRecord>] = &[
    num!("district_area_total_recharge_worthy_area_sq_km", SqKm, "area", "total recharge-worthy area", |r| r.total_recharge_worthy_area_sq_km),
    num!("district_area_safe_area_sq_km", SqKm, "area", "area under safe category", |r| r.categories.safe.area_sq_km),
    num!("district_area_over_exploited_area_sq_km", SqKm, "area", "area under over-exploited category", |r| r.categories.over_exploited.area_sq_km),
];

fn no_category<R>(_: &R) -> Option<Categorization> {
    None
}

/// Emit the facts of `doc` into `sink`.
pub fn emit(sink: &mut FactSink<'_>, doc: &SourceDocument) {
    match &doc.records {
        RecordSet::StateReport(v) => table_facts(
            sink,
            doc,
            v,
            STATE_REPORT,
            StateReportRecord::location,
            StateReportRecord::effective_categorization,
        ),
        RecordSet::CentralReport(v) => table_facts(
            sink,
            doc,
            v,
            CENTRAL_REPORT,
            CentralReportRecord::location,
            |r| r.categorization,
        ),
        RecordSet::AttributeSummary(v) => table_facts(
            sink,
            doc,
            v,
            ATTRIBUTE_SUMMARY,
            AttributeSummaryRecord::location,
            no_category,
        ),
        RecordSet::AttributeDetailed(v) => table_facts(
            sink,
            doc,
            v,
            ATTRIBUTE_DETAIL,
            AttributeDetailRecord::location,
            |r| r.categorization,
        ),
        RecordSet::Annexure1(v) => {
            table_facts(sink, doc, v, ANNEXURE_1, StateResourceRecord::location, no_category)
        }
        RecordSet::Annexure2(v) => table_facts(
            sink,
            doc,
            v,
            ANNEXURE_2,
            DistrictResourceRecord::location,
            no_category,
        ),
        RecordSet::Annexure3a(v) => table_facts(
            sink,
            doc,
            v,
            ANNEXURE_3A,
            UnitCategorizationRecord::location,
            no_category,
        ),
        RecordSet::Annexure3b(v) => table_facts(
            sink,
            doc,
            v,
            ANNEXURE_3B,
            UnitCategorizationRecord::location,
            no_category,
        ),
        RecordSet::Annexure3c(v) => table_facts(
            sink,
            doc,
            v,
            ANNEXURE_3C,
            ResourceCategorizationRecord::location,
            no_category,
        ),
        RecordSet::Annexure3d(v) => table_facts(
            sink,
            doc,
            v,
            ANNEXURE_3D,
            ResourceCategorizationRecord::location,
            no_category,
        ),
        RecordSet::Annexure3e(v) => table_facts(
            sink,
            doc,
            v,
            ANNEXURE_3E,
            StateAreaCategorizationRecord::location,
            no_category,
        ),
        RecordSet::Annexure3f(v) => table_facts(
            sink,
            doc,
            v,
            ANNEXURE_3F,
            DistrictAreaCategorizationRecord::location,
            no_category,
        ),
        RecordSet::Annexure4a(v) => stressed_unit_facts(sink, doc, v),
        RecordSet::Annexure4b(v) => quality_problem_facts(sink, doc, v),
    }
}

/// One `groundwater_unit_status` fact per named unit.
fn stressed_unit_facts(sink: &mut FactSink<'_>, doc: &SourceDocument, records: &[StressedUnitsRecord]) {
    for (row, record) in records.iter().enumerate() {
        let district = clean_location(&record.location());
        for (category, unit_name) in record.units() {
            let Some(block) = clean_name(Some(unit_name), NameKind::Block) else {
                continue;
            };
            let status = category.label().to_lowercase();
            let text = format!(
                "{} in {} district, {} is categorized as {} ({}).",
                block,
                district.district.as_deref().unwrap_or_default(),
                district.state,
                status,
                doc.year
            );
            let scope = FactScope {
                loc: crate::models::Location {
                    block: Some(block),
                    ..district.clone()
                },
                year: &doc.year,
                source: &doc.source_file,
                source_type: doc.source_type(),
                categorization: Some(category.as_str().to_string()),
                row,
            };
            sink.push_with_text(
                &scope,
                "groundwater_unit_status",
                FactValue::Text(status),
                Unit::None,
                "categorization",
                text,
            );
        }
    }
}

/// One `water_quality_issue` fact per affected unit.
fn quality_problem_facts(sink: &mut FactSink<'_>, doc: &SourceDocument, records: &[QualityProblemRecord]) {
    for (row, record) in records.iter().enumerate() {
        let district = clean_location(&record.location());
        for (problem, unit_name) in record.units() {
            let Some(block) = clean_name(Some(unit_name), NameKind::Block) else {
                continue;
            };
            let text = format!(
                "{} in {} district, {} is affected by {} contamination ({}).",
                block,
                district.district.as_deref().unwrap_or_default(),
                district.state,
                problem.as_str(),
                doc.year
            );
            let scope = FactScope {
                loc: crate::models::Location {
                    block: Some(block),
                    ..district.clone()
                },
                year: &doc.year,
                source: &doc.source_file,
                source_type: doc.source_type(),
                categorization: None,
                row,
            };
            sink.push_with_text(
                &scope,
                "water_quality_issue",
                FactValue::Text(problem.as_str().to_string()),
                Unit::None,
                "water_quality",
                text,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{derive_facts, Fact, FactOptions};
    use super::*;
    use crate::models::{ExtractionByUse, QualityFacets};

    fn doc(records: RecordSet) -> SourceDocument {
        SourceDocument {
            source_file: "example.xlsx".into(),
            state: None,
            year: "2022-2023".into(),
            records,
        }
    }

    fn metrics(facts: &[Fact]) -> Vec<&str> {
        facts.iter().map(|f| f.metric.as_str()).collect()
    }

    fn detail(extraction_total: f64, categorization: Option<Categorization>) -> AttributeDetailRecord {
        AttributeDetailRecord {
            state: "PUNJAB".into(),
            district: Some("Ludhiana".into()),
            assessment_unit_name: Some("Ludhiana-I".into()),
            year: "2022-2023".into(),
            extraction_ham: ExtractionByUse {
                total: extraction_total,
                ..Default::default()
            },
            categorization,
            ..Default::default()
        }
    }

    #[test]
    fn zero_extraction_is_suppressed_but_category_survives() {
        let facts = derive_facts(
            &doc(RecordSet::AttributeDetailed(vec![detail(0.0, Some(Categorization::Critical))])),
            &FactOptions::default(),
        );
        let got = metrics(&facts);
        assert!(!got.contains(&"extraction_total_ham"));
        assert!(got.contains(&"categorization_status"));
        // stage of extraction is always kept, even at zero
        assert!(got.contains(&"stage_of_extraction_percent"));
        let status = facts.iter().find(|f| f.metric == "categorization_status").unwrap();
        assert_eq!(status.categorization.as_deref(), Some("critical"));
        assert_eq!(status.state, "Punjab");
        assert_eq!(
            status.text,
            "In Ludhiana-I block of Ludhiana district, Punjab (2022-2023), groundwater status category is Critical."
        );
    }

    #[test]
    fn keep_zero_values_emits_everything() {
        let facts = derive_facts(
            &doc(RecordSet::AttributeDetailed(vec![detail(0.0, None)])),
            &FactOptions { keep_zero_values: true },
        );
        // all numeric metrics; the absent category has no value at all
        assert_eq!(facts.len(), ATTRIBUTE_DETAIL.len() - 1);
    }

    /// Every non-zero leaf named by a table comes back exactly once with its value.
    #[test]
    fn non_zero_leaves_round_trip() {
        let mut rec = StateReportRecord {
            state: "Kerala".into(),
            district: "Idukki".into(),
            assessment_unit: Some("Adimali".into()),
            year: "2022-2023".into(),
            ..Default::default()
        };
        rec.rainfall_mm = QualityFacets { total: 1234.5, ..Default::default() };
        rec.gw_extraction_ham.total.total = 88.25;
        rec.in_storage_unconfined_gw_ham.fresh = 10.0;
        let facts = derive_facts(&doc(RecordSet::StateReport(vec![rec])), &FactOptions::default());
        let value = |m: &str| {
            let hits: Vec<&Fact> = facts.iter().filter(|f| f.metric == m).collect();
            assert_eq!(hits.len(), 1, "{}", m);
            match hits[0].value {
                FactValue::Number(v) => v,
                FactValue::Text(_) => panic!("{} is text", m),
            }
        };
        assert!((value("rainfall_total_mm") - 1234.5).abs() < 1e-9);
        assert!((value("gw_extraction_total_ham") - 88.25).abs() < 1e-9);
        assert!((value("in_storage_fresh_ham") - 10.0).abs() < 1e-9);
        assert!((value("stage_of_extraction_percent")).abs() < 1e-9);
        assert_eq!(facts.len(), 4);
        let mut ids: Vec<&str> = facts.iter().map(|f| f.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn annexure_prefixes_and_counts() {
        let rec = UnitCategorizationRecord {
            state: "KERALA".into(),
            year: "2022-2023".into(),
            total_assessed_units: 152.0,
            categories: crate::models::Categories {
                safe: crate::models::UnitShare { count: 130.0, percent: 85.5 },
                ..Default::default()
            },
            ..Default::default()
        };
        let facts = derive_facts(&doc(RecordSet::Annexure3a(vec![rec])), &FactOptions::default());
        let safe = facts
            .iter()
            .find(|f| f.metric == "state_categorization_safe_units_count")
            .unwrap();
        assert_eq!(
            safe.text,
            "Kerala has 130 safe units as per the 2022-2023 groundwater assessment."
        );
        // zero counts survive because the key names the categorization
        assert!(metrics(&facts).contains(&"state_categorization_critical_units_count"));
    }

    #[test]
    fn district_counts_read_at_state_level() {
        let rec = UnitCategorizationRecord {
            state: "Kerala".into(),
            district: Some("Idukki".into()),
            year: "2022-2023".into(),
            total_assessed_units: 8.0,
            categories: crate::models::Categories {
                safe: crate::models::UnitShare { count: 5.0, percent: 62.5 },
                ..Default::default()
            },
            ..Default::default()
        };
        let facts = derive_facts(&doc(RecordSet::Annexure3b(vec![rec])), &FactOptions::default());
        let safe = facts
            .iter()
            .find(|f| f.metric == "district_categorization_safe_units_count")
            .unwrap();
        assert_eq!(safe.district.as_deref(), Some("Idukki"));
        assert_eq!(
            safe.text,
            "Kerala has 5 safe units as per the 2022-2023 groundwater assessment."
        );
        let total = facts
            .iter()
            .find(|f| f.metric == "district_categorization_total_assessed_units")
            .unwrap();
        assert!(total.text.starts_with("Kerala has 8 "), "{}", total.text);
    }

    #[test]
    fn stressed_units_become_status_facts() {
        let rec = StressedUnitsRecord {
            state: "KERALA".into(),
            district: "Palakkad".into(),
            year: "2022-2023".into(),
            over_exploited_unit: Some("CHITTUR".into()),
            ..Default::default()
        };
        let facts = derive_facts(&doc(RecordSet::Annexure4a(vec![rec])), &FactOptions::default());
        assert_eq!(facts.len(), 1);
        let f = &facts[0];
        assert_eq!(f.metric, "groundwater_unit_status");
        assert_eq!(f.value, FactValue::Text("over-exploited".into()));
        assert_eq!(f.block.as_deref(), Some("Chittur"));
        assert_eq!(f.categorization.as_deref(), Some("over_exploited"));
        assert_eq!(
            f.text,
            "Chittur in Palakkad district, Kerala is categorized as over-exploited (2022-2023)."
        );
    }

    #[test]
    fn quality_problems_become_issue_facts() {
        let rec = QualityProblemRecord {
            state: "Rajasthan".into(),
            district: "Barmer".into(),
            year: "2022-2023".into(),
            fluoride_affected_unit: Some("Balotra".into()),
            arsenic_affected_unit: Some("  ".into()),
            ..Default::default()
        };
        let facts = derive_facts(&doc(RecordSet::Annexure4b(vec![rec])), &FactOptions::default());
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].category, "water_quality");
        assert_eq!(
            facts[0].text,
            "Balotra in Barmer district, Rajasthan is affected by fluoride contamination (2022-2023)."
        );
    }
}
