//! Chunks of the annexure tables.

use super::{extraction_breakdown, format_value, place, Chunk, Metadata, Origin, Paragraph};
use crate::models::{
    Categorization, DistrictAreaCategorizationRecord, DistrictResourceRecord, Location,
    QualityProblem, QualityProblemRecord, ResourceCategorizationRecord, ResourceFigures,
    SourceType, StateAreaCategorizationRecord, StateResourceRecord, StressedUnitsRecord,
    UnitCategorizationRecord,
};
use crate::names::{clean_location, clean_name, NameKind};

/// Unit vocabulary of a resource summary.
struct ResourceUnit {
    /// Unit as printed in sentences.
    shown: &'static str,
    /// Suffix of metadata keys.
    key: &'static str,
    stage_label: &'static str,
}

const BCM: ResourceUnit = ResourceUnit {
    shown: "BCM",
    key: "bcm",
    stage_label: "Stage of groundwater extraction",
};

const HAM: ResourceUnit = ResourceUnit {
    shown: "ham",
    key: "ham",
    stage_label: "Stage of extraction",
};

fn resource_chunk(
    origin: &Origin<'_>,
    loc: Location,
    row: usize,
    header: String,
    f: &ResourceFigures,
    unit: &ResourceUnit,
) -> Chunk {
    let u = unit.shown;
    let mut p = Paragraph::new(header);
    p.figure("Total annual groundwater recharge", f.recharge.total_annual, u);
    let (m, n) = (&f.recharge.monsoon_season, &f.recharge.non_monsoon_season);
    if m.from_rainfall + m.from_other_sources + n.from_rainfall + n.from_other_sources > 0.0 {
        p.line(format!(
            "Recharge breakdown: monsoon rainfall {} {u}, monsoon other sources {} {u}, \
             non-monsoon rainfall {} {u}, non-monsoon other {} {u}.",
            format_value(m.from_rainfall),
            format_value(m.from_other_sources),
            format_value(n.from_rainfall),
            format_value(n.from_other_sources),
        ));
    }
    p.figure("Natural discharge", f.natural_discharges, u);
    p.figure("Annual extractable resource", f.annual_extractable_resource, u);
    if f.extraction.total > 0.0 {
        p.line(format!(
            "Current annual extraction: {} {}{}.",
            format_value(f.extraction.total),
            u,
            extraction_breakdown(&f.extraction, u)
        ));
    }
    if f.stage_of_extraction_percent > 0.0 {
        p.line(format!(
            "{}: {}%.",
            unit.stage_label,
            format_value(f.stage_of_extraction_percent)
        ));
    }
    p.figure("Net groundwater availability", f.net_availability, u);

    let k = unit.key;
    let mut meta = Metadata::default();
    meta.non_zero(&format!("total_annual_recharge_{k}"), f.recharge.total_annual)
        .non_zero(&format!("extractable_resource_{k}"), f.annual_extractable_resource)
        .non_zero(&format!("extraction_total_{k}"), f.extraction.total)
        .non_zero(&format!("net_availability_{k}"), f.net_availability)
        .non_zero("stage_of_extraction_percent", f.stage_of_extraction_percent);
    let row = row.to_string();
    origin.chunk(loc, Some(&row), None, p.finish(), meta.finish())
}

pub(super) fn state_resources(origin: &Origin<'_>, records: &[StateResourceRecord]) -> Vec<Chunk> {
    records
        .iter()
        .enumerate()
        .map(|(row, r)| {
            let loc = clean_location(&r.location());
            let header = format!(
                "**{} ({}) - State Groundwater Resources (BCM)**",
                loc.state, origin.doc.year
            );
            resource_chunk(origin, loc, row, header, &r.figures(), &BCM)
        })
        .collect()
}

pub(super) fn district_resources(
    origin: &Origin<'_>,
    records: &[DistrictResourceRecord],
) -> Vec<Chunk> {
    records
        .iter()
        .enumerate()
        .filter_map(|(row, r)| {
            let loc = clean_location(&r.location());
            loc.district.as_ref()?;
            let header = format!(
                "**{} ({}) - District Groundwater Resources**",
                place(&loc),
                origin.doc.year
            );
            Some(resource_chunk(origin, loc, row, header, &r.figures(), &HAM))
        })
        .collect()
}

/// `"<place> (<year>) - <title> (Annexure <tag>)"` header of a categorization table.
fn table_header(origin: &Origin<'_>, loc: &Location, title: &str) -> String {
    let tag = origin
        .doc
        .source_type()
        .as_str()
        .trim_start_matches("annexure_")
        .to_uppercase();
    format!(
        "**{} ({}) - {} (Annexure {})**",
        place(loc),
        origin.doc.year,
        title,
        tag
    )
}

/// District-wise tables skip rows without a district.
fn district_wise(origin: &Origin<'_>) -> bool {
    matches!(
        origin.doc.source_type(),
        SourceType::Annexure3b | SourceType::Annexure3d | SourceType::Annexure3f
    )
}

pub(super) fn unit_categorization(
    origin: &Origin<'_>,
    records: &[UnitCategorizationRecord],
) -> Vec<Chunk> {
    records
        .iter()
        .enumerate()
        .filter_map(|(row, r)| {
            let loc = clean_location(&r.location());
            if district_wise(origin) {
                loc.district.as_ref()?;
            }
            let mut p = Paragraph::new(table_header(origin, &loc, "Unit Categorization"));
            p.line(format!(
                "Total assessed units: {}.",
                format_value(r.total_assessed_units)
            ));
            let c = &r.categories;
            let items = [
                ("Safe", c.safe),
                ("Semi-critical", c.semi_critical),
                ("Critical", c.critical),
                ("Over-exploited", c.over_exploited),
                ("Saline", c.saline),
            ]
            .into_iter()
            .filter(|(_, share)| share.count > 0.0)
            .map(|(label, share)| {
                format!("{}: {} ({:.1}%)", label, format_value(share.count), share.percent)
            })
            .collect();
            p.section(items);

            let mut meta = Metadata::default();
            meta.num("total_units", r.total_assessed_units)
                .num("safe_count", c.safe.count)
                .num("over_exploited_count", c.over_exploited.count)
                .num("critical_count", c.critical.count);
            let row = row.to_string();
            Some(origin.chunk(loc, Some(&row), None, p.finish(), meta.finish()))
        })
        .collect()
}

pub(super) fn resource_categorization(
    origin: &Origin<'_>,
    records: &[ResourceCategorizationRecord],
) -> Vec<Chunk> {
    records
        .iter()
        .enumerate()
        .filter_map(|(row, r)| {
            let loc = clean_location(&r.location());
            if district_wise(origin) {
                loc.district.as_ref()?;
            }
            let c = &r.categories;
            let mut p =
                Paragraph::new(table_header(origin, &loc, "Extractable Resource by Category"));
            p.figure("Total extractable resource", r.total_extractable_resource_ham, "ham");
            p.figure("Resource in safe areas", c.safe.resource_ham, "ham");
            p.figure("Resource in over-exploited areas", c.over_exploited.resource_ham, "ham");

            let mut meta = Metadata::default();
            meta.non_zero("total_extractable_resource_ham", r.total_extractable_resource_ham)
                .non_zero("safe_resource_ham", c.safe.resource_ham)
                .non_zero("over_exploited_resource_ham", c.over_exploited.resource_ham);
            let row = row.to_string();
            Some(origin.chunk(loc, Some(&row), None, p.finish(), meta.finish()))
        })
        .collect()
}

pub(super) fn state_area(
    origin: &Origin<'_>,
    records: &[StateAreaCategorizationRecord],
) -> Vec<Chunk> {
    records
        .iter()
        .enumerate()
        .map(|(row, r)| {
            let loc = clean_location(&r.location());
            let c = &r.categories;
            let mut p = Paragraph::new(table_header(origin, &loc, "Area by Category"));
            p.figure("Total geographical area", r.total_geographical_area_sq_km, "sq km");
            p.figure("Recharge-worthy area", r.recharge_worthy_area_sq_km, "sq km");
            p.figure("Area under safe category", c.safe.area_sq_km, "sq km");
            p.figure("Area under over-exploited category", c.over_exploited.area_sq_km, "sq km");

            let mut meta = Metadata::default();
            meta.non_zero("total_geographical_area_sq_km", r.total_geographical_area_sq_km)
                .non_zero("recharge_worthy_area_sq_km", r.recharge_worthy_area_sq_km)
                .non_zero("safe_area_sq_km", c.safe.area_sq_km)
                .non_zero("over_exploited_area_sq_km", c.over_exploited.area_sq_km);
            let row = row.to_string();
            origin.chunk(loc, Some(&row), None, p.finish(), meta.finish())
        })
        .collect()
}

pub(super) fn district_area(
    origin: &Origin<'_>,
    records: &[DistrictAreaCategorizationRecord],
) -> Vec<Chunk> {
    records
        .iter()
        .enumerate()
        .filter_map(|(row, r)| {
            let loc = clean_location(&r.location());
            loc.district.as_ref()?;
            let c = &r.categories;
            let mut p = Paragraph::new(table_header(origin, &loc, "Area by Category"));
            p.figure("Total recharge-worthy area", r.total_recharge_worthy_area_sq_km, "sq km");
            p.figure("Area under safe category", c.safe.area_sq_km, "sq km");
            p.figure("Area under over-exploited category", c.over_exploited.area_sq_km, "sq km");

            let mut meta = Metadata::default();
            meta.non_zero("recharge_worthy_area_sq_km", r.total_recharge_worthy_area_sq_km)
                .non_zero("safe_area_sq_km", c.safe.area_sq_km)
                .non_zero("over_exploited_area_sq_km", c.over_exploited.area_sq_km);
            let row = row.to_string();
            Some(origin.chunk(loc, Some(&row), None, p.finish(), meta.finish()))
        })
        .collect()
}

/// Unit names of one state, bucketed by a key, in first-seen order.
struct StateGroup<K> {
    state: String,
    buckets: Vec<(K, Vec<String>)>,
}

impl<K: PartialEq + Copy> StateGroup<K> {
    fn add(&mut self, key: K, entry: String) {
        match self.buckets.iter_mut().find(|(k, _)| *k == key) {
            Some((_, names)) => names.push(entry),
            None => self.buckets.push((key, vec![entry])),
        }
    }

    fn get(&self, key: K) -> &[String] {
        self.buckets
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }
}

/// Group `(state, key, "<unit> (<district>)")` triples per state, keeping
/// the order in which states first appear.
fn group_by_state<K: PartialEq + Copy>(
    entries: impl Iterator<Item = (String, K, String)>,
) -> Vec<StateGroup<K>> {
    let mut groups: Vec<StateGroup<K>> = Vec::new();
    for (state, key, entry) in entries {
        match groups.iter_mut().find(|g| g.state == state) {
            Some(g) => g.add(key, entry),
            None => {
                let mut g = StateGroup {
                    state,
                    buckets: Vec::new(),
                };
                g.add(key, entry);
                groups.push(g);
            }
        }
    }
    groups
}

/// `"a, b, c and N more"` listing at most `max` names.
fn capped_list(names: &[String], max: usize) -> String {
    let shown = names.iter().take(max).cloned().collect::<Vec<_>>().join(", ");
    if names.len() > max {
        format!("{} and {} more", shown, names.len() - max)
    } else {
        shown
    }
}

/// Flatten unit lists to `(state, key, "<unit> (<district>)")` with cleaned names.
fn named_units<'r, K, R>(
    records: &'r [R],
    location: fn(&R) -> Location,
    units: fn(&R) -> Vec<(K, &str)>,
) -> impl Iterator<Item = (String, K, String)> + 'r
where
    K: 'r,
    R: 'r,
{
    records.iter().flat_map(move |r| {
        let loc = clean_location(&location(r));
        let district = loc.district.unwrap_or_default();
        units(r)
            .into_iter()
            .filter_map(|(key, name)| clean_name(Some(name), NameKind::Block).map(|n| (key, n)))
            .map(|(key, unit)| (loc.state.clone(), key, format!("{} ({})", unit, district)))
            .collect::<Vec<_>>()
    })
}

pub(super) fn stressed_units(
    origin: &Origin<'_>,
    records: &[StressedUnitsRecord],
    max_listed: usize,
) -> Vec<Chunk> {
    let lines = [
        (Categorization::OverExploited, "Over-exploited units", "over_exploited_units"),
        (Categorization::Critical, "Critical units", "critical_units"),
        (Categorization::SemiCritical, "Semi-critical units", "semi_critical_units"),
    ];
    let entries = named_units(records, StressedUnitsRecord::location, StressedUnitsRecord::units);
    group_by_state(entries)
        .into_iter()
        .map(|g| {
            let mut p = Paragraph::new(format!(
                "**{} ({}) - Stressed Groundwater Units (Annexure 4A)**",
                g.state, origin.doc.year
            ));
            let mut meta = Metadata::default();
            for (category, label, key) in lines {
                let names = g.get(category);
                if !names.is_empty() {
                    p.line(format!("{}: {}.", label, capped_list(names, max_listed)));
                }
                meta.num(key, names.len() as f64);
            }
            origin.chunk(
                Location::state(&g.state),
                None,
                Some("has_stressed_units".to_string()),
                p.finish(),
                meta.finish(),
            )
        })
        .collect()
}

pub(super) fn quality_problems(
    origin: &Origin<'_>,
    records: &[QualityProblemRecord],
    max_listed: usize,
) -> Vec<Chunk> {
    let lines = [
        (QualityProblem::Fluoride, "Fluoride-affected units", "fluoride_affected_units"),
        (QualityProblem::Arsenic, "Arsenic-affected units", "arsenic_affected_units"),
        (QualityProblem::Salinity, "Salinity-affected units", "salinity_affected_units"),
    ];
    let entries = named_units(records, QualityProblemRecord::location, QualityProblemRecord::units);
    group_by_state(entries)
        .into_iter()
        .map(|g| {
            let mut p = Paragraph::new(format!(
                "**{} ({}) - Water Quality Issues (Annexure 4B)**",
                g.state, origin.doc.year
            ));
            let mut meta = Metadata::default();
            for (problem, label, key) in lines {
                let names = g.get(problem);
                if !names.is_empty() {
                    p.line(format!("{}: {}.", label, capped_list(names, max_listed)));
                }
                meta.num(key, names.len() as f64);
            }
            origin.chunk(
                Location::state(&g.state),
                None,
                Some("has_quality_issues".to_string()),
                p.finish(),
                meta.finish(),
            )
        })
        .collect()
}
