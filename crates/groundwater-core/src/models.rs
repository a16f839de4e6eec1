//! Canonical record model shared by the decoders and both normalizers.
//!
//! One record describes one assessment unit (state, district or block) for
//! one reporting year within one report family. Numeric leaves are plain
//! `f64` and default to `0.0` when the source cell is blank or unparseable;
//! absent names are `None`. Records are created once by the schema
//! decoders and read by the fact normalizer and the chunk builder.
//!
//! # Families
//!
//! | [`SourceType`] | Record | Granularity |
//! |----------------|--------|-------------|
//! | `state_report` | [`StateReportRecord`] | block |
//! | `central_report` | [`CentralReportRecord`] | district |
//! | `annexure_1` | [`StateResourceRecord`] (BCM) | state |
//! | `annexure_2` | [`DistrictResourceRecord`] (HAM) | district |
//! | `annexure_3a` / `_3b` | [`UnitCategorizationRecord`] | state / district |
//! | `annexure_3c` / `_3d` | [`ResourceCategorizationRecord`] | state / district |
//! | `annexure_3e` | [`StateAreaCategorizationRecord`] | state |
//! | `annexure_3f` | [`DistrictAreaCategorizationRecord`] | district |
//! | `annexure_4a` | [`StressedUnitsRecord`] | district (unit names) |
//! | `annexure_4b` | [`QualityProblemRecord`] | district (unit names) |
//! | `attribute_summary` | [`AttributeSummaryRecord`] | state |
//! | `attribute_detailed` | [`AttributeDetailRecord`] | block |

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Keys of the four data-quality facets.
pub const QUALITY_FACETS: &[&str] = &["contaminated", "non_contaminated", "poor_quality", "total"];
/// Keys of the fresh/saline split.
pub const FRESH_SALINE: &[&str] = &["fresh", "saline"];
/// Category keys in column order of the categorization tables.
pub const CATEGORY_KEYS: &[&str] = &["safe", "semi_critical", "critical", "over_exploited", "saline"];

// ============ Shared value types ============

/// Groundwater categorization of an assessment unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Categorization {
    Safe,
    SemiCritical,
    Critical,
    OverExploited,
    Saline,
}

impl Categorization {
    /// Parse the spellings used across report families
    /// (`"Over-Exploited"`, `"semi critical"`, `"SAFE"`, ...).
    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();
        match key.as_str() {
            "safe" => Some(Self::Safe),
            "semi_critical" | "semicritical" => Some(Self::SemiCritical),
            "critical" => Some(Self::Critical),
            "over_exploited" | "overexploited" => Some(Self::OverExploited),
            "saline" => Some(Self::Saline),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::SemiCritical => "semi_critical",
            Self::Critical => "critical",
            Self::OverExploited => "over_exploited",
            Self::Saline => "saline",
        }
    }

    /// Display label as printed in the reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Safe => "Safe",
            Self::SemiCritical => "Semi-Critical",
            Self::Critical => "Critical",
            Self::OverExploited => "Over-Exploited",
            Self::Saline => "Saline",
        }
    }
}

impl fmt::Display for Categorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contaminated / non-contaminated / poor-quality split of one quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityFacets {
    pub contaminated: f64,
    pub non_contaminated: f64,
    pub poor_quality: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FreshSaline {
    pub fresh: f64,
    pub saline: f64,
}

/// Per-use extraction; the leaf type is [`QualityFacets`] in state reports
/// and a plain figure everywhere else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionByUse<T> {
    pub irrigation: T,
    pub industrial: T,
    pub domestic: T,
    pub total: T,
}

/// One value per category, flattened into the categorization records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Categories<S> {
    pub safe: S,
    pub semi_critical: S,
    pub critical: S,
    pub over_exploited: S,
    pub saline: S,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitShare {
    pub count: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceShare {
    pub resource_ham: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaShare {
    pub area_sq_km: f64,
    pub percent: f64,
}

/// State / district / block of a record, in decreasing specificity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub state: String,
    pub district: Option<String>,
    pub block: Option<String>,
}

impl Location {
    pub fn state(state: &str) -> Self {
        Self {
            state: state.to_string(),
            district: None,
            block: None,
        }
    }

    pub fn district(state: &str, district: Option<&str>) -> Self {
        Self {
            state: state.to_string(),
            district: district.map(str::to_string),
            block: None,
        }
    }

    pub fn block(state: &str, district: Option<&str>, block: Option<&str>) -> Self {
        Self {
            state: state.to_string(),
            district: district.map(str::to_string),
            block: block.map(str::to_string),
        }
    }
}

// ============ State report (block level) ============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeographicalArea {
    pub recharge_worthy: QualityFacets,
    pub hilly_area: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockRecharge {
    pub rainfall_recharge: QualityFacets,
    pub canals: QualityFacets,
    pub surface_water_irrigation: QualityFacets,
    pub ground_water_irrigation: QualityFacets,
    pub tanks_and_ponds: QualityFacets,
    pub water_conservation_structure: QualityFacets,
    pub pipelines: QualityFacets,
    pub sewages_flash_flood_channels: QualityFacets,
    pub subtotal: QualityFacets,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InflowsOutflows {
    pub base_flow: QualityFacets,
    pub stream_recharges: QualityFacets,
    pub lateral_flows: QualityFacets,
    pub vertical_flows: QualityFacets,
    pub evaporation: QualityFacets,
    pub transpiration: QualityFacets,
    pub evapotranspiration: QualityFacets,
    pub subtotal: QualityFacets,
}

/// Categorization strings as printed per quality facet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizationFacets {
    pub contaminated: Option<String>,
    pub non_contaminated: Option<String>,
    pub poor_quality: Option<String>,
    pub overall: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendFacets {
    pub contaminated: Option<String>,
    pub non_contaminated: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trends {
    pub pre_monsoon: TrendFacets,
    pub post_monsoon: TrendFacets,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterFacets {
    pub contaminated: Option<String>,
    pub non_contaminated: Option<String>,
    pub poor_quality: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityTagging {
    pub major_parameter: ParameterFacets,
    pub other_parameters: ParameterFacets,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalResources {
    pub waterlogged_shallow_water_table: f64,
    pub flood_prone: f64,
    pub spring_discharge: f64,
}

/// One assessment unit of a per-state report (162 columns).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateReportRecord {
    pub serial_no: u64,
    pub state: String,
    pub district: String,
    pub assessment_unit: Option<String>,
    pub watershed_district: Option<String>,
    pub year: String,
    pub rainfall_mm: QualityFacets,
    pub geographical_area_ha: GeographicalArea,
    pub ground_water_recharge_ham: BlockRecharge,
    pub inflows_outflows_ham: InflowsOutflows,
    pub annual_gw_recharge_ham: QualityFacets,
    pub environmental_flows_ham: QualityFacets,
    pub annual_extractable_gw_resource_ham: QualityFacets,
    pub gw_extraction_ham: ExtractionByUse<QualityFacets>,
    pub stage_of_extraction_percent: QualityFacets,
    pub categorization: CategorizationFacets,
    pub gw_trends: Trends,
    pub allocation_domestic_2025_ham: QualityFacets,
    pub net_annual_gw_availability_ham: QualityFacets,
    pub quality_tagging: QualityTagging,
    pub additional_potential_resources_ham: AdditionalResources,
    pub coastal_areas: QualityFacets,
    pub in_storage_unconfined_gw_ham: FreshSaline,
    pub total_gw_availability_unconfined_ham: FreshSaline,
    pub dynamic_confined_gw_ham: FreshSaline,
    pub in_storage_confined_gw_ham: FreshSaline,
    pub total_confined_gw_ham: FreshSaline,
    pub dynamic_semi_confined_gw_ham: FreshSaline,
    pub in_storage_semi_confined_gw_ham: FreshSaline,
    pub total_semi_confined_gw_ham: FreshSaline,
    pub total_gw_availability_ham: FreshSaline,
}

impl StateReportRecord {
    pub fn location(&self) -> Location {
        Location::block(
            &self.state,
            Some(&self.district),
            self.assessment_unit.as_deref(),
        )
    }

    /// Overall category, falling back to the non-contaminated facet.
    pub fn effective_categorization(&self) -> Option<Categorization> {
        self.categorization
            .overall
            .as_deref()
            .and_then(Categorization::parse)
            .or_else(|| {
                self.categorization
                    .non_contaminated
                    .as_deref()
                    .and_then(Categorization::parse)
            })
    }
}

// ============ Central report (district level) ============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CentralArea {
    pub recharge_worthy_area: QualityFacets,
    pub hilly_area: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CentralRecharge {
    pub rainfall_recharge: QualityFacets,
    pub canals: QualityFacets,
    pub tanks_ponds: QualityFacets,
    pub water_conservation_structures: QualityFacets,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CentralReportRecord {
    pub serial_no: f64,
    pub state: String,
    pub district: Option<String>,
    pub assessment_unit: Option<String>,
    pub year: String,
    pub rainfall_mm: QualityFacets,
    pub total_geographical_area_ha: CentralArea,
    pub ground_water_recharge_ham: CentralRecharge,
    pub recharge_from_other_sources_monsoon_ham: f64,
    pub recharge_from_rainfall_non_monsoon_ham: f64,
    pub total_annual_recharge_ham: f64,
    pub natural_discharge_ham: f64,
    pub annual_extractable_resource_ham: f64,
    pub current_extraction_ham: ExtractionByUse<f64>,
    pub stage_of_extraction_percent: f64,
    pub categorization: Option<Categorization>,
}

impl CentralReportRecord {
    pub fn location(&self) -> Location {
        Location::district(&self.state, self.district.as_deref())
    }
}

// ============ Annexure 1 / 2 (resource summaries) ============

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonRecharge {
    pub from_rainfall: f64,
    pub from_other_sources: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonalRecharge {
    pub monsoon_season: SeasonRecharge,
    pub non_monsoon_season: SeasonRecharge,
    pub total_annual: f64,
}

/// Unit-free view over the two resource summary families.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceFigures {
    pub recharge: SeasonalRecharge,
    pub natural_discharges: f64,
    pub annual_extractable_resource: f64,
    pub extraction: ExtractionByUse<f64>,
    pub domestic_allocation: f64,
    pub net_availability: f64,
    pub stage_of_extraction_percent: f64,
}

/// State-wise resources in billion cubic meters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateResourceRecord {
    pub serial_no: f64,
    pub state: String,
    pub year: String,
    pub ground_water_recharge_bcm: SeasonalRecharge,
    pub total_natural_discharges_bcm: f64,
    pub annual_extractable_resource_bcm: f64,
    pub current_annual_extraction_bcm: ExtractionByUse<f64>,
    pub annual_gw_allocation_domestic_bcm: f64,
    pub net_gw_availability_bcm: f64,
    pub stage_of_extraction_percent: f64,
}

impl StateResourceRecord {
    pub fn location(&self) -> Location {
        Location::state(&self.state)
    }

    pub fn figures(&self) -> ResourceFigures {
        ResourceFigures {
            recharge: self.ground_water_recharge_bcm,
            natural_discharges: self.total_natural_discharges_bcm,
            annual_extractable_resource: self.annual_extractable_resource_bcm,
            extraction: self.current_annual_extraction_bcm,
            domestic_allocation: self.annual_gw_allocation_domestic_bcm,
            net_availability: self.net_gw_availability_bcm,
            stage_of_extraction_percent: self.stage_of_extraction_percent,
        }
    }
}

/// District-wise resources in hectare meters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistrictResourceRecord {
    pub serial_no: f64,
    pub state: String,
    pub district: String,
    pub year: String,
    pub ground_water_recharge_ham: SeasonalRecharge,
    pub total_natural_discharges_ham: f64,
    pub annual_extractable_resource_ham: f64,
    pub current_annual_extraction_ham: ExtractionByUse<f64>,
    pub annual_gw_allocation_domestic_ham: f64,
    pub net_gw_availability_ham: f64,
    pub stage_of_extraction_percent: f64,
}

impl DistrictResourceRecord {
    pub fn location(&self) -> Location {
        Location::district(&self.state, Some(&self.district))
    }

    pub fn figures(&self) -> ResourceFigures {
        ResourceFigures {
            recharge: self.ground_water_recharge_ham,
            natural_discharges: self.total_natural_discharges_ham,
            annual_extractable_resource: self.annual_extractable_resource_ham,
            extraction: self.current_annual_extraction_ham,
            domestic_allocation: self.annual_gw_allocation_domestic_ham,
            net_availability: self.net_gw_availability_ham,
            stage_of_extraction_percent: self.stage_of_extraction_percent,
        }
    }
}

// ============ Annexure 3 (categorization tables) ============

/// Number of assessment units per category (3A state-wise, 3B district-wise).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitCategorizationRecord {
    pub serial_no: f64,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    pub year: String,
    pub total_assessed_units: f64,
    #[serde(flatten)]
    pub categories: Categories<UnitShare>,
}

impl UnitCategorizationRecord {
    pub fn location(&self) -> Location {
        Location::district(&self.state, self.district.as_deref())
    }
}

/// Extractable resource per category (3C state-wise, 3D district-wise).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceCategorizationRecord {
    pub serial_no: f64,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    pub year: String,
    pub total_extractable_resource_ham: f64,
    #[serde(flatten)]
    pub categories: Categories<ResourceShare>,
}

impl ResourceCategorizationRecord {
    pub fn location(&self) -> Location {
        Location::district(&self.state, self.district.as_deref())
    }
}

/// Geographical area per category, state-wise (3E).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateAreaCategorizationRecord {
    pub serial_no: f64,
    pub state: String,
    pub year: String,
    pub total_geographical_area_sq_km: f64,
    pub recharge_worthy_area_sq_km: f64,
    #[serde(flatten)]
    pub categories: Categories<AreaShare>,
}

impl StateAreaCategorizationRecord {
    pub fn location(&self) -> Location {
        Location::state(&self.state)
    }
}

/// Recharge-worthy area per category, district-wise (3F).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistrictAreaCategorizationRecord {
    pub serial_no: f64,
    pub state: String,
    pub district: String,
    pub year: String,
    pub total_recharge_worthy_area_sq_km: f64,
    #[serde(flatten)]
    pub categories: Categories<AreaShare>,
}

impl DistrictAreaCategorizationRecord {
    pub fn location(&self) -> Location {
        Location::district(&self.state, Some(&self.district))
    }
}

// ============ Annexure 4 (unit name lists) ============

/// Names of semi-critical, critical and over-exploited units in a district.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StressedUnitsRecord {
    pub serial_no: f64,
    pub state: String,
    pub district: String,
    pub year: String,
    pub semi_critical_unit: Option<String>,
    pub critical_unit: Option<String>,
    pub over_exploited_unit: Option<String>,
}

impl StressedUnitsRecord {
    pub fn location(&self) -> Location {
        Location::district(&self.state, Some(&self.district))
    }

    /// Named units with their category, most severe last.
    pub fn units(&self) -> Vec<(Categorization, &str)> {
        [
            (Categorization::SemiCritical, &self.semi_critical_unit),
            (Categorization::Critical, &self.critical_unit),
            (Categorization::OverExploited, &self.over_exploited_unit),
        ]
        .into_iter()
        .filter_map(|(cat, name)| name.as_deref().map(|n| (cat, n)))
        .collect()
    }
}

/// Geogenic contaminant affecting an assessment unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityProblem {
    Fluoride,
    Arsenic,
    Salinity,
}

impl QualityProblem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fluoride => "fluoride",
            Self::Arsenic => "arsenic",
            Self::Salinity => "salinity",
        }
    }
}

/// Names of fluoride-, arsenic- and salinity-affected units in a district.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityProblemRecord {
    pub serial_no: f64,
    pub state: String,
    pub district: String,
    pub year: String,
    pub fluoride_affected_unit: Option<String>,
    pub arsenic_affected_unit: Option<String>,
    pub salinity_affected_unit: Option<String>,
}

impl QualityProblemRecord {
    pub fn location(&self) -> Location {
        Location::district(&self.state, Some(&self.district))
    }

    pub fn units(&self) -> Vec<(QualityProblem, &str)> {
        [
            (QualityProblem::Fluoride, &self.fluoride_affected_unit),
            (QualityProblem::Arsenic, &self.arsenic_affected_unit),
            (QualityProblem::Salinity, &self.salinity_affected_unit),
        ]
        .into_iter()
        .filter_map(|(problem, name)| name.as_deref().map(|n| (problem, n)))
        .collect()
    }
}

// ============ Attribute report ============

/// State-wise unit counts from the attribute report summary sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeSummaryRecord {
    pub state: String,
    pub year: String,
    pub over_exploited_count: f64,
    pub safe_count: f64,
    pub saline_count: f64,
    pub critical_count: f64,
    pub semi_critical_count: f64,
    pub total_count: f64,
}

impl AttributeSummaryRecord {
    pub fn location(&self) -> Location {
        Location::state(&self.state)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeRecharge {
    pub from_rainfall_monsoon: f64,
    pub from_other_sources_monsoon: f64,
    pub from_rainfall_non_monsoon: f64,
    pub from_other_sources_non_monsoon: f64,
}

/// One assessment unit from the attribute report detail table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeDetailRecord {
    pub serial_no: f64,
    pub state_code: Option<String>,
    pub state_district_code: Option<String>,
    pub state_district_block_code: Option<String>,
    pub state: String,
    pub district: Option<String>,
    pub assessment_unit_name: Option<String>,
    pub assessment_unit_type: Option<String>,
    pub year: String,
    pub total_geographical_area_ha: f64,
    pub recharge_worthy_area_ha: f64,
    pub recharge_ham: AttributeRecharge,
    pub total_annual_recharge_ham: f64,
    pub total_natural_discharges_ham: f64,
    pub annual_extractable_resource_ham: f64,
    pub extraction_ham: ExtractionByUse<f64>,
    pub annual_gw_allocation_domestic_2025_ham: f64,
    pub net_gw_availability_future_ham: f64,
    pub stage_of_extraction_percent: f64,
    pub categorization: Option<Categorization>,
    pub aquifer: Option<String>,
}

impl AttributeDetailRecord {
    pub fn location(&self) -> Location {
        Location::block(
            &self.state,
            self.district.as_deref(),
            self.assessment_unit_name.as_deref(),
        )
    }
}

// ============ Sources ============

/// Report family a record was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceType {
    #[serde(rename = "state_report")]
    StateReport,
    #[serde(rename = "central_report")]
    CentralReport,
    #[serde(rename = "annexure_1")]
    Annexure1,
    #[serde(rename = "annexure_2")]
    Annexure2,
    #[serde(rename = "annexure_3a")]
    Annexure3a,
    #[serde(rename = "annexure_3b")]
    Annexure3b,
    #[serde(rename = "annexure_3c")]
    Annexure3c,
    #[serde(rename = "annexure_3d")]
    Annexure3d,
    #[serde(rename = "annexure_3e")]
    Annexure3e,
    #[serde(rename = "annexure_3f")]
    Annexure3f,
    #[serde(rename = "annexure_4a")]
    Annexure4a,
    #[serde(rename = "annexure_4b")]
    Annexure4b,
    #[serde(rename = "attribute_summary")]
    AttributeSummary,
    #[serde(rename = "attribute_detailed")]
    AttributeDetailed,
}

impl SourceType {
    pub const ALL: [SourceType; 14] = [
        Self::StateReport,
        Self::CentralReport,
        Self::Annexure1,
        Self::Annexure2,
        Self::Annexure3a,
        Self::Annexure3b,
        Self::Annexure3c,
        Self::Annexure3d,
        Self::Annexure3e,
        Self::Annexure3f,
        Self::Annexure4a,
        Self::Annexure4b,
        Self::AttributeSummary,
        Self::AttributeDetailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StateReport => "state_report",
            Self::CentralReport => "central_report",
            Self::Annexure1 => "annexure_1",
            Self::Annexure2 => "annexure_2",
            Self::Annexure3a => "annexure_3a",
            Self::Annexure3b => "annexure_3b",
            Self::Annexure3c => "annexure_3c",
            Self::Annexure3d => "annexure_3d",
            Self::Annexure3e => "annexure_3e",
            Self::Annexure3f => "annexure_3f",
            Self::Annexure4a => "annexure_4a",
            Self::Annexure4b => "annexure_4b",
            Self::AttributeSummary => "attribute_summary",
            Self::AttributeDetailed => "attribute_detailed",
        }
    }

    /// Worksheet holding this family; `None` means the workbook's first sheet.
    pub fn sheet_name(&self) -> Option<&'static str> {
        match self {
            Self::StateReport => None,
            Self::CentralReport => Some("GEC"),
            Self::Annexure1 => Some("Annexure 1A"),
            Self::Annexure2 => Some("Annexure II"),
            Self::Annexure3a => Some("Annexure-3A"),
            Self::Annexure3b => Some("Annexure-3B"),
            Self::Annexure3c => Some("Annexure-3C"),
            Self::Annexure3d => Some("Annexure-3D"),
            Self::Annexure3e => Some("Annexure-3E"),
            Self::Annexure3f => Some("Annexure-3F"),
            Self::Annexure4a => Some("Annexure 4A"),
            Self::Annexure4b => Some("Annexure 4B"),
            Self::AttributeSummary => Some("Summary"),
            Self::AttributeDetailed => Some("Table"),
        }
    }

    /// Whether a workbook of this family is broken without the sheet.
    pub fn sheet_required(&self) -> bool {
        matches!(
            self,
            Self::StateReport | Self::CentralReport | Self::Annexure1 | Self::Annexure2
        )
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed records of one decoded sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordSet {
    StateReport(Vec<StateReportRecord>),
    CentralReport(Vec<CentralReportRecord>),
    Annexure1(Vec<StateResourceRecord>),
    Annexure2(Vec<DistrictResourceRecord>),
    Annexure3a(Vec<UnitCategorizationRecord>),
    Annexure3b(Vec<UnitCategorizationRecord>),
    Annexure3c(Vec<ResourceCategorizationRecord>),
    Annexure3d(Vec<ResourceCategorizationRecord>),
    Annexure3e(Vec<StateAreaCategorizationRecord>),
    Annexure3f(Vec<DistrictAreaCategorizationRecord>),
    Annexure4a(Vec<StressedUnitsRecord>),
    Annexure4b(Vec<QualityProblemRecord>),
    AttributeSummary(Vec<AttributeSummaryRecord>),
    AttributeDetailed(Vec<AttributeDetailRecord>),
}

impl RecordSet {
    pub fn source_type(&self) -> SourceType {
        match self {
            Self::StateReport(_) => SourceType::StateReport,
            Self::CentralReport(_) => SourceType::CentralReport,
            Self::Annexure1(_) => SourceType::Annexure1,
            Self::Annexure2(_) => SourceType::Annexure2,
            Self::Annexure3a(_) => SourceType::Annexure3a,
            Self::Annexure3b(_) => SourceType::Annexure3b,
            Self::Annexure3c(_) => SourceType::Annexure3c,
            Self::Annexure3d(_) => SourceType::Annexure3d,
            Self::Annexure3e(_) => SourceType::Annexure3e,
            Self::Annexure3f(_) => SourceType::Annexure3f,
            Self::Annexure4a(_) => SourceType::Annexure4a,
            Self::Annexure4b(_) => SourceType::Annexure4b,
            Self::AttributeSummary(_) => SourceType::AttributeSummary,
            Self::AttributeDetailed(_) => SourceType::AttributeDetailed,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::StateReport(v) => v.len(),
            Self::CentralReport(v) => v.len(),
            Self::Annexure1(v) => v.len(),
            Self::Annexure2(v) => v.len(),
            Self::Annexure3a(v) | Self::Annexure3b(v) => v.len(),
            Self::Annexure3c(v) | Self::Annexure3d(v) => v.len(),
            Self::Annexure3e(v) => v.len(),
            Self::Annexure3f(v) => v.len(),
            Self::Annexure4a(v) => v.len(),
            Self::Annexure4b(v) => v.len(),
            Self::AttributeSummary(v) => v.len(),
            Self::AttributeDetailed(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// States named by the records, in first-seen order.
    pub fn states(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut push = |s: &str| {
            if !out.iter().any(|x| x == s) {
                out.push(s.to_string());
            }
        };
        match self {
            Self::StateReport(v) => v.iter().for_each(|r| push(&r.state)),
            Self::CentralReport(v) => v.iter().for_each(|r| push(&r.state)),
            Self::Annexure1(v) => v.iter().for_each(|r| push(&r.state)),
            Self::Annexure2(v) => v.iter().for_each(|r| push(&r.state)),
            Self::Annexure3a(v) | Self::Annexure3b(v) => v.iter().for_each(|r| push(&r.state)),
            Self::Annexure3c(v) | Self::Annexure3d(v) => v.iter().for_each(|r| push(&r.state)),
            Self::Annexure3e(v) => v.iter().for_each(|r| push(&r.state)),
            Self::Annexure3f(v) => v.iter().for_each(|r| push(&r.state)),
            Self::Annexure4a(v) => v.iter().for_each(|r| push(&r.state)),
            Self::Annexure4b(v) => v.iter().for_each(|r| push(&r.state)),
            Self::AttributeSummary(v) => v.iter().for_each(|r| push(&r.state)),
            Self::AttributeDetailed(v) => v.iter().for_each(|r| push(&r.state)),
        }
        out
    }

    /// Records as JSON values, in order.
    pub fn to_values(&self) -> Vec<serde_json::Value> {
        match self {
            Self::StateReport(v) => values(v),
            Self::CentralReport(v) => values(v),
            Self::Annexure1(v) => values(v),
            Self::Annexure2(v) => values(v),
            Self::Annexure3a(v) | Self::Annexure3b(v) => values(v),
            Self::Annexure3c(v) | Self::Annexure3d(v) => values(v),
            Self::Annexure3e(v) => values(v),
            Self::Annexure3f(v) => values(v),
            Self::Annexure4a(v) => values(v),
            Self::Annexure4b(v) => values(v),
            Self::AttributeSummary(v) => values(v),
            Self::AttributeDetailed(v) => values(v),
        }
    }

    /// Rebuild typed records of `source_type` from JSON values.
    pub fn from_values(
        source_type: SourceType,
        values: Vec<serde_json::Value>,
    ) -> Result<Self, serde_json::Error> {
        Ok(match source_type {
            SourceType::StateReport => Self::StateReport(typed(values)?),
            SourceType::CentralReport => Self::CentralReport(typed(values)?),
            SourceType::Annexure1 => Self::Annexure1(typed(values)?),
            SourceType::Annexure2 => Self::Annexure2(typed(values)?),
            SourceType::Annexure3a => Self::Annexure3a(typed(values)?),
            SourceType::Annexure3b => Self::Annexure3b(typed(values)?),
            SourceType::Annexure3c => Self::Annexure3c(typed(values)?),
            SourceType::Annexure3d => Self::Annexure3d(typed(values)?),
            SourceType::Annexure3e => Self::Annexure3e(typed(values)?),
            SourceType::Annexure3f => Self::Annexure3f(typed(values)?),
            SourceType::Annexure4a => Self::Annexure4a(typed(values)?),
            SourceType::Annexure4b => Self::Annexure4b(typed(values)?),
            SourceType::AttributeSummary => Self::AttributeSummary(typed(values)?),
            SourceType::AttributeDetailed => Self::AttributeDetailed(typed(values)?),
        })
    }
}

fn values<T: Serialize>(records: &[T]) -> Vec<serde_json::Value> {
    records
        .iter()
        .map(|r| serde_json::to_value(r).unwrap_or_default())
        .collect()
}

fn typed<T: DeserializeOwned>(values: Vec<serde_json::Value>) -> Result<Vec<T>, serde_json::Error> {
    values.into_iter().map(serde_json::from_value).collect()
}

/// One decoded sheet together with its provenance; persisted as an
/// intermediate JSON file and reloaded by the fact and chunk stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "DocumentWire", try_from = "DocumentWire")]
pub struct SourceDocument {
    /// Path of the workbook, relative to the data directory.
    pub source_file: String,
    /// State named by the file (per-state reports only).
    pub state: Option<String>,
    /// `YYYY-YYYY` range, or `unknown`.
    pub year: String,
    pub records: RecordSet,
}

impl SourceDocument {
    pub fn source_type(&self) -> SourceType {
        self.records.source_type()
    }

    /// File stem used for intermediate outputs (`annexure_3a_2022_2023`).
    pub fn stem(&self) -> String {
        let mut stem = self.source_type().as_str().to_string();
        if let Some(state) = &self.state {
            stem.push('_');
            stem.push_str(&state.replace(' ', "_"));
        }
        stem.push('_');
        stem.push_str(&self.year.replace('-', "_"));
        stem
    }
}

#[derive(Serialize, Deserialize)]
struct DocumentWire {
    source_type: SourceType,
    source_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    year: String,
    record_count: usize,
    records: Vec<serde_json::Value>,
}

impl From<SourceDocument> for DocumentWire {
    fn from(doc: SourceDocument) -> Self {
        Self {
            source_type: doc.source_type(),
            record_count: doc.records.len(),
            records: doc.records.to_values(),
            source_file: doc.source_file,
            state: doc.state,
            year: doc.year,
        }
    }
}

impl TryFrom<DocumentWire> for SourceDocument {
    type Error = serde_json::Error;

    fn try_from(wire: DocumentWire) -> Result<Self, Self::Error> {
        Ok(Self {
            records: RecordSet::from_values(wire.source_type, wire.records)?,
            source_file: wire.source_file,
            state: wire.state,
            year: wire.year,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorization_parses_report_spellings() {
        assert_eq!(Categorization::parse("Over-Exploited"), Some(Categorization::OverExploited));
        assert_eq!(Categorization::parse("semi critical"), Some(Categorization::SemiCritical));
        assert_eq!(Categorization::parse(" SAFE "), Some(Categorization::Safe));
        assert_eq!(Categorization::parse("Hilly Area"), None);
        assert_eq!(Categorization::OverExploited.as_str(), "over_exploited");
        assert_eq!(Categorization::SemiCritical.label(), "Semi-Critical");
    }

    #[test]
    fn source_type_names_are_stable() {
        for t in SourceType::ALL {
            assert_eq!(SourceType::parse(t.as_str()), Some(t));
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
    }

    #[test]
    fn effective_categorization_falls_back_to_non_contaminated() {
        let mut rec = StateReportRecord::default();
        rec.categorization.non_contaminated = Some("Critical".into());
        assert_eq!(rec.effective_categorization(), Some(Categorization::Critical));
        rec.categorization.overall = Some("Safe".into());
        assert_eq!(rec.effective_categorization(), Some(Categorization::Safe));
    }

    #[test]
    fn document_wire_shape() {
        let doc = SourceDocument {
            source_file: "Annexure3_2022-23.xlsx".into(),
            state: None,
            year: "2022-2023".into(),
            records: RecordSet::Annexure3a(vec![UnitCategorizationRecord {
                serial_no: 1.0,
                state: "Kerala".into(),
                district: None,
                year: "2022-2023".into(),
                total_assessed_units: 152.0,
                categories: Categories {
                    safe: UnitShare { count: 130.0, percent: 85.5 },
                    ..Default::default()
                },
            }]),
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["source_type"], "annexure_3a");
        assert_eq!(json["record_count"], 1);
        assert_eq!(json["records"][0]["safe"]["count"], 130.0);
        assert!(json["records"][0].get("district").is_none());
        assert!(json.get("state").is_none());

        let back: SourceDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
        assert_eq!(back.stem(), "annexure_3a_2022_2023");
    }

    #[test]
    fn stressed_units_lists_present_names() {
        let rec = StressedUnitsRecord {
            critical_unit: Some("Adimali".into()),
            over_exploited_unit: Some("Chittur".into()),
            ..Default::default()
        };
        assert_eq!(
            rec.units(),
            vec![
                (Categorization::Critical, "Adimali"),
                (Categorization::OverExploited, "Chittur")
            ]
        );
    }
}
