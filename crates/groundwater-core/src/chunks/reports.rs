//! Chunks of the full-metric reports: per-state block reports, the central
//! district report and both attribute report sheets.

use super::{extraction_breakdown, format_value, place, Chunk, Metadata, Origin, Paragraph};
use crate::models::{
    AttributeDetailRecord, AttributeSummaryRecord, Categorization, CentralReportRecord,
    ExtractionByUse, StateReportRecord,
};
use crate::names::{clean_location, clean_name, NameKind};

fn shout(c: Categorization) -> String {
    c.label().to_uppercase()
}

pub(super) fn state_report(origin: &Origin<'_>, records: &[StateReportRecord]) -> Vec<Chunk> {
    records
        .iter()
        .filter_map(|r| state_report_chunk(origin, r))
        .collect()
}

fn state_report_chunk(origin: &Origin<'_>, r: &StateReportRecord) -> Option<Chunk> {
    let loc = clean_location(&r.location());
    loc.block.as_ref()?;
    let year = &origin.doc.year;
    let watershed = clean_name(r.watershed_district.as_deref(), NameKind::District);
    let categorization = r.effective_categorization();

    let mut p = Paragraph::new(format!("**{} ({})**", place(&loc), year));
    if let Some(w) = &watershed {
        p.line(format!("Watershed: {}.", w));
    }

    let area = &r.geographical_area_ha;
    let mut items = Vec::new();
    if r.rainfall_mm.total > 0.0 {
        items.push(format!("Annual rainfall: {} mm", format_value(r.rainfall_mm.total)));
    }
    if area.total > 0.0 {
        items.push(format!("Total area: {} ha", format_value(area.total)));
    }
    if area.recharge_worthy.total > 0.0 {
        items.push(format!(
            "Recharge-worthy area: {} ha",
            format_value(area.recharge_worthy.total)
        ));
    }
    p.section(items);

    let annual = r.annual_gw_recharge_ham.total;
    let from_rain = r.ground_water_recharge_ham.rainfall_recharge.total;
    let mut items = Vec::new();
    if annual > 0.0 {
        items.push(format!("Annual groundwater recharge: {} ham", format_value(annual)));
    }
    if from_rain > 0.0 {
        items.push(format!("from rainfall: {} ham", format_value(from_rain)));
    }
    p.section(items);

    let extraction = ExtractionByUse {
        irrigation: r.gw_extraction_ham.irrigation.total,
        industrial: r.gw_extraction_ham.industrial.total,
        domestic: r.gw_extraction_ham.domestic.total,
        total: r.gw_extraction_ham.total.total,
    };
    let extractable = r.annual_extractable_gw_resource_ham.total;
    let mut items = Vec::new();
    if extractable > 0.0 {
        items.push(format!("Extractable resource: {} ham", format_value(extractable)));
    }
    if extraction.total > 0.0 {
        items.push(format!(
            "Total extraction: {} ham{}",
            format_value(extraction.total),
            extraction_breakdown(&extraction, "ham")
        ));
    }
    p.section(items);

    let stage = r.stage_of_extraction_percent.total;
    let net = r.net_annual_gw_availability_ham.total;
    let mut items = vec![format!("Stage of extraction: {}%", format_value(stage))];
    if net > 0.0 {
        items.push(format!("Net availability: {} ham", format_value(net)));
    }
    if let Some(c) = categorization {
        items.push(format!("Status: **{}**", shout(c)));
    }
    p.section(items);

    let trends = &r.gw_trends;
    let mut items = Vec::new();
    if let Some(pre) = &trends.pre_monsoon.non_contaminated {
        items.push(format!("Pre-monsoon: {}", pre));
    }
    if let Some(post) = &trends.post_monsoon.non_contaminated {
        items.push(format!("Post-monsoon: {}", post));
    }
    if !items.is_empty() {
        p.line(format!("Groundwater trend: {}.", items.join(" | ")));
    }
    p.figure(
        "Fresh groundwater in storage",
        r.in_storage_unconfined_gw_ham.fresh,
        "ham",
    );

    let mut meta = Metadata::default();
    meta.non_zero("rainfall_mm", r.rainfall_mm.total)
        .non_zero("annual_recharge_ham", annual)
        .non_zero("extractable_resource_ham", extractable)
        .non_zero("extraction_total_ham", extraction.total)
        .non_zero("stage_of_extraction_percent", stage)
        .non_zero("net_availability_ham", net)
        .text("categorization", categorization.map(|c| c.as_str()));

    let serial = r.serial_no.to_string();
    let mut chunk = origin.chunk(
        loc,
        Some(&serial),
        categorization.map(|c| c.as_str().to_string()),
        p.finish(),
        meta.finish(),
    );
    chunk.watershed = watershed;
    Some(chunk)
}

pub(super) fn central_report(origin: &Origin<'_>, records: &[CentralReportRecord]) -> Vec<Chunk> {
    records
        .iter()
        .enumerate()
        .filter_map(|(row, r)| {
            let loc = clean_location(&r.location());
            let district = loc.district.clone()?;
            let mut p = Paragraph::new(format!(
                "**{} district, {} ({}) - District Summary**",
                district, loc.state, origin.doc.year
            ));
            p.figure("Annual rainfall", r.rainfall_mm.total, "mm");
            let area = &r.total_geographical_area_ha;
            if area.total > 0.0 {
                p.line(format!(
                    "Total geographical area: {} ha (recharge-worthy: {} ha).",
                    format_value(area.total),
                    format_value(area.recharge_worthy_area.total)
                ));
            }
            if r.total_annual_recharge_ham > 0.0 {
                p.figure("Total annual groundwater recharge", r.total_annual_recharge_ham, "ham");
            } else {
                p.figure(
                    "Groundwater recharge from rainfall",
                    r.ground_water_recharge_ham.rainfall_recharge.total,
                    "ham",
                );
            }
            p.figure("Natural discharge", r.natural_discharge_ham, "ham");
            p.figure("Annual extractable resource", r.annual_extractable_resource_ham, "ham");
            let e = &r.current_extraction_ham;
            if e.total > 0.0 {
                p.line(format!(
                    "Current extraction: {} ham{}.",
                    format_value(e.total),
                    extraction_breakdown(e, "ham")
                ));
            }
            if r.stage_of_extraction_percent > 0.0 {
                p.line(format!(
                    "Stage of extraction: {}%.",
                    format_value(r.stage_of_extraction_percent)
                ));
            }
            if let Some(c) = r.categorization {
                p.line(format!("Groundwater status: **{}**.", shout(c)));
            }

            let mut meta = Metadata::default();
            meta.non_zero("rainfall_mm", r.rainfall_mm.total)
                .non_zero("annual_recharge_ham", r.total_annual_recharge_ham)
                .non_zero("extractable_resource_ham", r.annual_extractable_resource_ham)
                .non_zero("extraction_total_ham", e.total)
                .non_zero("stage_of_extraction_percent", r.stage_of_extraction_percent)
                .text("categorization", r.categorization.map(|c| c.as_str()));
            let row = row.to_string();
            Some(origin.chunk(
                loc,
                Some(&row),
                r.categorization.map(|c| c.as_str().to_string()),
                p.finish(),
                meta.finish(),
            ))
        })
        .collect()
}

/// Counts per category paired with their display names, in report order.
fn category_counts(r: &AttributeSummaryRecord) -> [(&'static str, f64); 5] {
    [
        ("Safe", r.safe_count),
        ("Semi-critical", r.semi_critical_count),
        ("Critical", r.critical_count),
        ("Over-exploited", r.over_exploited_count),
        ("Saline", r.saline_count),
    ]
}

fn overall_assessment(r: &AttributeSummaryRecord) -> &'static str {
    if r.over_exploited_count > 0.0 || r.critical_count > 0.0 {
        if r.over_exploited_count > r.critical_count {
            "has over-exploited areas"
        } else {
            "has critical areas"
        }
    } else if r.semi_critical_count > 0.0 {
        "has semi-critical areas"
    } else {
        "safe"
    }
}

pub(super) fn attribute_summary(
    origin: &Origin<'_>,
    records: &[AttributeSummaryRecord],
) -> Vec<Chunk> {
    records
        .iter()
        .enumerate()
        .map(|(row, r)| {
            let loc = clean_location(&r.location());
            let mut p = Paragraph::new(format!(
                "**{} ({}) - Groundwater Unit Categorization Summary**",
                loc.state, origin.doc.year
            ));
            p.line(format!("Total assessed units: {}.", format_value(r.total_count)));
            let items = category_counts(r)
                .into_iter()
                .filter(|(_, n)| *n > 0.0)
                .map(|(label, n)| {
                    let pct = if r.total_count > 0.0 {
                        n / r.total_count * 100.0
                    } else {
                        0.0
                    };
                    format!("{}: {} ({:.1}%)", label, format_value(n), pct)
                })
                .collect();
            p.section(items);
            p.line(format!("Overall assessment: {} {}.", loc.state, overall_assessment(r)));

            let mut meta = Metadata::default();
            meta.num("total_units", r.total_count)
                .num("safe_count", r.safe_count)
                .num("semi_critical_count", r.semi_critical_count)
                .num("critical_count", r.critical_count)
                .num("over_exploited_count", r.over_exploited_count)
                .num("saline_count", r.saline_count);
            let row = row.to_string();
            origin.chunk(loc, Some(&row), None, p.finish(), meta.finish())
        })
        .collect()
}

pub(super) fn attribute_detailed(
    origin: &Origin<'_>,
    records: &[AttributeDetailRecord],
) -> Vec<Chunk> {
    records
        .iter()
        .enumerate()
        .filter_map(|(row, r)| {
            let loc = clean_location(&r.location());
            loc.block.as_ref()?;
            let mut p = Paragraph::new(format!(
                "**{} ({}) - Detailed Assessment**",
                place(&loc),
                origin.doc.year
            ));
            if r.total_geographical_area_ha > 0.0 {
                p.line(format!(
                    "Geographical area: {} ha (recharge-worthy: {} ha).",
                    format_value(r.total_geographical_area_ha),
                    format_value(r.recharge_worthy_area_ha)
                ));
            }
            p.figure("Total annual recharge", r.total_annual_recharge_ham, "ham");
            p.figure("Natural discharge", r.total_natural_discharges_ham, "ham");
            p.figure("Annual extractable resource", r.annual_extractable_resource_ham, "ham");
            let e = &r.extraction_ham;
            if e.total > 0.0 {
                p.line(format!(
                    "Current extraction: {} ham{}.",
                    format_value(e.total),
                    extraction_breakdown(e, "ham")
                ));
            }
            p.line(format!(
                "Stage of extraction: {}%.",
                format_value(r.stage_of_extraction_percent)
            ));
            p.figure(
                "Net groundwater availability for future",
                r.net_gw_availability_future_ham,
                "ham",
            );
            p.figure(
                "Projected domestic allocation (2025)",
                r.annual_gw_allocation_domestic_2025_ham,
                "ham",
            );
            if let Some(c) = r.categorization {
                p.line(format!("Groundwater status: **{}**.", shout(c)));
            }

            let mut meta = Metadata::default();
            meta.non_zero("annual_recharge_ham", r.total_annual_recharge_ham)
                .non_zero("extractable_resource_ham", r.annual_extractable_resource_ham)
                .non_zero("extraction_total_ham", e.total)
                .non_zero("stage_of_extraction_percent", r.stage_of_extraction_percent)
                .non_zero("net_availability_ham", r.net_gw_availability_future_ham)
                .text("categorization", r.categorization.map(|c| c.as_str()))
                .text("assessment_unit_type", r.assessment_unit_type.as_deref());
            let row = row.to_string();
            Some(origin.chunk(
                loc,
                Some(&row),
                r.categorization.map(|c| c.as_str().to_string()),
                p.finish(),
                meta.finish(),
            ))
        })
        .collect()
}
