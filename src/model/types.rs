//! Typed records held by the snapshot.

use std::collections::HashSet;

use serde::{Serialize, Serializer};

use super::fields::{FieldSpec, InfraField, OrgField};
use crate::search::normalize::normalize;

/// Common view over the record types the filter engine and ranker operate on.
pub trait Record {
    type Field: FieldSpec;

    /// Raw stored value of a field; empty when the row had no value.
    fn get(&self, field: Self::Field) -> &str;

    /// Display name used by the rank scorer.
    fn display_name(&self) -> &str;

    /// Year used by year-range filtering, if the record has a parseable one.
    fn year(&self) -> Option<f64>;

    /// Whole values of a derived multi-valued field. Callers must use these
    /// instead of splitting [`Record::get`], which is only a display join.
    fn value_set(&self, _field: Self::Field) -> Option<&ValueSet> {
        None
    }
}

/// Distinct values of one location dimension, deduplicated on the normalized
/// form. Values are never re-split, so "Korea, Republic of" stays one entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSet {
    values: Vec<String>,
    keys: HashSet<String>,
    joined: String,
}

impl ValueSet {
    /// Keeps the first spelling of each value; blank values are dropped.
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut set = Self::default();
        for value in values {
            let value = value.trim();
            let key = normalize(value);
            if key.is_empty() || !set.keys.insert(key) {
                continue;
            }
            set.values.push(value.to_string());
        }
        set.joined = set.values.join(", ");
        set
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Whether a normalized key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Comma-joined display form.
    pub fn as_str(&self) -> &str {
        &self.joined
    }
}

impl Serialize for ValueSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.joined)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Organization {
    #[serde(rename = "id")]
    pub id: u64,
    pub org_id: String,
    pub org_name: String,
    pub functional_type: String,
    pub sizing: String,
    pub employee_count: String,
    pub active: String,
    pub active_year: String,
    pub legal_form: String,
    pub ultimate_parent: String,
    pub services: String,
    pub infra_tools: String,
    pub content_types: String,
    pub hq_city: String,
    pub hq_country: String,
    pub hq_sales_region: String,
    pub all_cities: ValueSet,
    pub all_countries: ValueSet,
    pub all_sales_regions: ValueSet,
}

impl Record for Organization {
    type Field = OrgField;

    fn get(&self, field: OrgField) -> &str {
        match field {
            OrgField::OrgId => &self.org_id,
            OrgField::OrgName => &self.org_name,
            OrgField::FunctionalType => &self.functional_type,
            OrgField::Sizing => &self.sizing,
            OrgField::EmployeeCount => &self.employee_count,
            OrgField::Active => &self.active,
            OrgField::ActiveYear => &self.active_year,
            OrgField::LegalForm => &self.legal_form,
            OrgField::UltimateParent => &self.ultimate_parent,
            OrgField::Services => &self.services,
            OrgField::InfraTools => &self.infra_tools,
            OrgField::ContentTypes => &self.content_types,
            OrgField::HqCity => &self.hq_city,
            OrgField::HqCountry => &self.hq_country,
            OrgField::HqSalesRegion => &self.hq_sales_region,
            OrgField::AllCities => self.all_cities.as_str(),
            OrgField::AllCountries => self.all_countries.as_str(),
            OrgField::AllSalesRegions => self.all_sales_regions.as_str(),
        }
    }

    fn value_set(&self, field: OrgField) -> Option<&ValueSet> {
        match field {
            OrgField::AllCities => Some(&self.all_cities),
            OrgField::AllCountries => Some(&self.all_countries),
            OrgField::AllSalesRegions => Some(&self.all_sales_regions),
            _ => None,
        }
    }

    fn display_name(&self) -> &str {
        &self.org_name
    }

    fn year(&self) -> Option<f64> {
        parse_year(&self.active_year)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct InfraRecord {
    #[serde(rename = "id")]
    pub id: u64,
    pub infra_id: String,
    pub infra_name: String,
    pub parent_org: String,
    pub license: String,
    pub infra_type: String,
    pub structural_type: String,
    pub pricing: String,
    pub release_date: String,
    pub related_services: String,
    pub related_content_types: String,
}

impl Record for InfraRecord {
    type Field = InfraField;

    fn get(&self, field: InfraField) -> &str {
        match field {
            InfraField::InfraId => &self.infra_id,
            InfraField::InfraName => &self.infra_name,
            InfraField::ParentOrg => &self.parent_org,
            InfraField::License => &self.license,
            InfraField::InfraType => &self.infra_type,
            InfraField::StructuralType => &self.structural_type,
            InfraField::Pricing => &self.pricing,
            InfraField::ReleaseDate => &self.release_date,
            InfraField::RelatedServices => &self.related_services,
            InfraField::RelatedContentTypes => &self.related_content_types,
        }
    }

    fn display_name(&self) -> &str {
        &self.infra_name
    }

    fn year(&self) -> Option<f64> {
        parse_year(&self.release_date)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Location {
    #[serde(rename = "id")]
    pub id: u64,
    /// Content-derived identity, see `store::location_identity`.
    pub location_id: String,
    pub org_id: String,
    pub city: String,
    pub country: String,
    pub sales_region: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_hq: bool,
}

impl Location {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Identifier {
    #[serde(rename = "id")]
    pub id: u64,
    pub org_id: String,
    pub domain: String,
    pub profile_url: String,
}

/// Parses a year-like value: the leading four-digit year of a date
/// ("2019-04-01" → 2019), else the whole value as a number. Anything
/// non-finite is treated as missing.
pub fn parse_year(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    if digits_end == 4 {
        return trimmed[..4].parse().ok();
    }
    let value: f64 = trimmed.parse().ok()?;
    value.is_finite().then_some(value)
}
