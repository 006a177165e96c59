//! In-memory snapshot of the directory and its derived indexes.
//!
//! A [`RecordStore`] is built once from boundary rows and never mutated
//! afterwards. Reloads build a fresh store and publish it through
//! [`SharedStore`], which swaps the `Arc` under a short write lock so readers
//! always see a complete snapshot.

pub mod loader;
pub mod rows;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::error::LookupError;
use crate::model::{Identifier, InfraRecord, Location, Organization, ValueSet};
use crate::search::normalize::{Delimiter, normalize, split_tokens};
use rows::{RawRow, parse_coordinate, parse_flag};

/// FNV-1a offset basis (64-bit).
const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;

/// FNV-1a prime (64-bit).
const FNV_PRIME: u64 = 0x100000001b3;

/// Decimal places kept when coordinates feed the location identity.
const COORDINATE_PRECISION: f64 = 1e5;

/// Raw row sets handed over by the loading layer.
#[derive(Debug, Clone, Default)]
pub struct RowSources {
    pub organizations: Vec<RawRow>,
    pub locations: Vec<RawRow>,
    pub infra: Vec<RawRow>,
    pub identifiers: Vec<RawRow>,
}

#[derive(Debug, Default)]
pub struct RecordStore {
    organizations: Vec<Organization>,
    locations: Vec<Location>,
    infra: Vec<InfraRecord>,
    identifiers: Vec<Identifier>,
    org_index: HashMap<String, usize>,
    infra_index: HashMap<String, usize>,
    locations_by_org: HashMap<String, Vec<usize>>,
    location_owner: HashMap<String, String>,
    identifiers_by_org: HashMap<String, Vec<usize>>,
}

/// An organization together with everything attached to it.
#[derive(Debug, Serialize)]
pub struct OrgDetail<'a> {
    pub organization: &'a Organization,
    pub identifiers: Vec<&'a Identifier>,
    pub locations: Vec<&'a Location>,
}

impl RecordStore {
    pub fn build(sources: RowSources) -> Self {
        let locations = build_locations(&sources.locations);
        let mut locations_by_org: HashMap<String, Vec<usize>> = HashMap::new();
        let mut location_owner = HashMap::new();
        for (idx, loc) in locations.iter().enumerate() {
            locations_by_org
                .entry(loc.org_id.clone())
                .or_default()
                .push(idx);
            location_owner.insert(loc.location_id.clone(), loc.org_id.clone());
        }

        let mut organizations = Vec::with_capacity(sources.organizations.len());
        let mut org_index = HashMap::new();
        for (pos, row) in sources.organizations.iter().enumerate() {
            let org_id = row.get("ORG_ID").trim().to_string();
            if org_id.is_empty() {
                tracing::warn!(row = pos + 1, "skipping organization row without ORG_ID");
                continue;
            }
            if org_index.contains_key(&org_id) {
                tracing::warn!(org_id = %org_id, "duplicate ORG_ID; keeping first row");
                continue;
            }
            let bucket = locations_by_org
                .get(&org_id)
                .map(|idxs| idxs.iter().map(|&i| &locations[i]).collect::<Vec<_>>())
                .unwrap_or_default();
            let org = build_organization((pos + 1) as u64, org_id.clone(), row, &bucket);
            org_index.insert(org_id, organizations.len());
            organizations.push(org);
        }

        let mut infra = Vec::with_capacity(sources.infra.len());
        let mut infra_index = HashMap::new();
        for (pos, row) in sources.infra.iter().enumerate() {
            let infra_id = row.get("INFRA_ID").trim().to_string();
            if infra_id.is_empty() || infra_index.contains_key(&infra_id) {
                tracing::warn!(
                    row = pos + 1,
                    "skipping infra row with missing or duplicate INFRA_ID"
                );
                continue;
            }
            infra_index.insert(infra_id.clone(), infra.len());
            infra.push(build_infra((pos + 1) as u64, infra_id, row));
        }

        let mut identifiers = Vec::with_capacity(sources.identifiers.len());
        let mut identifiers_by_org: HashMap<String, Vec<usize>> = HashMap::new();
        for (pos, row) in sources.identifiers.iter().enumerate() {
            let ident = Identifier {
                id: (pos + 1) as u64,
                org_id: row.get("ORG_ID").trim().to_string(),
                domain: row.get("DOMAIN").trim().to_string(),
                profile_url: row.get("PROFILE_URL").trim().to_string(),
            };
            identifiers_by_org
                .entry(ident.org_id.clone())
                .or_default()
                .push(identifiers.len());
            identifiers.push(ident);
        }

        tracing::info!(
            orgs = organizations.len(),
            locations = locations.len(),
            infra = infra.len(),
            identifiers = identifiers.len(),
            "snapshot_built"
        );

        Self {
            organizations,
            locations,
            infra,
            identifiers,
            org_index,
            infra_index,
            locations_by_org,
            location_owner,
            identifiers_by_org,
        }
    }

    pub fn organizations(&self) -> &[Organization] {
        &self.organizations
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn infra_records(&self) -> &[InfraRecord] {
        &self.infra
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    pub fn find_organization(&self, org_id: &str) -> Option<&Organization> {
        self.org_index
            .get(org_id.trim())
            .map(|&idx| &self.organizations[idx])
    }

    pub fn organization(&self, org_id: &str) -> Result<OrgDetail<'_>, LookupError> {
        let organization = self
            .find_organization(org_id)
            .ok_or_else(|| LookupError::OrganizationNotFound(org_id.trim().to_string()))?;
        Ok(OrgDetail {
            organization,
            identifiers: self.identifiers_of(&organization.org_id),
            locations: self.locations_of(&organization.org_id),
        })
    }

    pub fn infra(&self, infra_id: &str) -> Result<&InfraRecord, LookupError> {
        self.infra_index
            .get(infra_id.trim())
            .map(|&idx| &self.infra[idx])
            .ok_or_else(|| LookupError::InfraNotFound(infra_id.trim().to_string()))
    }

    pub fn locations_of(&self, org_id: &str) -> Vec<&Location> {
        self.locations_by_org
            .get(org_id)
            .map(|idxs| idxs.iter().map(|&i| &self.locations[i]).collect())
            .unwrap_or_default()
    }

    pub fn identifiers_of(&self, org_id: &str) -> Vec<&Identifier> {
        self.identifiers_by_org
            .get(org_id)
            .map(|idxs| idxs.iter().map(|&i| &self.identifiers[i]).collect())
            .unwrap_or_default()
    }

    /// Owning organization of a location identity.
    pub fn location_owner(&self, location_id: &str) -> Option<&str> {
        self.location_owner
            .get(location_id.trim())
            .map(String::as_str)
    }

    /// Organizations owning at least one of the given location identities.
    /// Unknown identities are ignored.
    pub fn owners_of<'a, I>(&self, location_ids: I) -> HashSet<&str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        location_ids
            .into_iter()
            .filter_map(|id| self.location_owner(id))
            .collect()
    }
}

/// Handle to the currently published snapshot.
#[derive(Clone, Debug, Default)]
pub struct SharedStore {
    current: Arc<RwLock<Arc<RecordStore>>>,
}

impl SharedStore {
    pub fn new(store: RecordStore) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(store))),
        }
    }

    /// Snapshot to run one query against; stays valid across later publishes.
    pub fn current(&self) -> Arc<RecordStore> {
        Arc::clone(&self.current.read())
    }

    /// Replaces the published snapshot wholesale.
    pub fn publish(&self, store: RecordStore) {
        let next = Arc::new(store);
        *self.current.write() = next;
        tracing::debug!("snapshot_published");
    }
}

/// Deterministic, content-addressed identity of a location row.
///
/// Two rows with the same org, rounded coordinates, HQ flag and normalized
/// region/country/city produce the same identity.
pub fn location_identity(
    org_id: &str,
    coordinates: Option<(f64, f64)>,
    is_hq: bool,
    sales_region: &str,
    country: &str,
    city: &str,
) -> String {
    let coords = match coordinates {
        Some((lat, lon)) => format!("{}:{}", round_coordinate(lat), round_coordinate(lon)),
        None => "-".to_string(),
    };
    let material = format!(
        "{}|{}|{}|{}|{}|{}",
        org_id.trim(),
        coords,
        u8::from(is_hq),
        normalize(sales_region),
        normalize(country),
        normalize(city)
    );
    format!("{:016x}", fnv1a_hash(material.as_bytes()))
}

fn round_coordinate(value: f64) -> i64 {
    (value * COORDINATE_PRECISION).round() as i64
}

fn fnv1a_hash(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn build_locations(rows: &[RawRow]) -> Vec<Location> {
    rows.iter()
        .enumerate()
        .map(|(pos, row)| {
            let org_id = row.get("ORG_ID").trim().to_string();
            let city = row.get("CITY").trim().to_string();
            let country = row.get("COUNTRY").trim().to_string();
            let sales_region = row.get("SALES_REGION").trim().to_string();
            let latitude = parse_coordinate(row.get("LATITUDE"));
            let longitude = parse_coordinate(row.get("LONGITUDE"));
            let is_hq = parse_flag(row.get("IS_HQ"));
            let coordinates = latitude.zip(longitude);
            let location_id =
                location_identity(&org_id, coordinates, is_hq, &sales_region, &country, &city);
            Location {
                id: (pos + 1) as u64,
                location_id,
                org_id,
                city,
                country,
                sales_region,
                latitude,
                longitude,
                is_hq,
            }
        })
        .collect()
}

fn build_organization(
    id: u64,
    org_id: String,
    row: &RawRow,
    bucket: &[&Location],
) -> Organization {
    let field = |name: &str| row.get(name).trim().to_string();
    Organization {
        id,
        org_id,
        org_name: field("ORG_NAME"),
        functional_type: field("FUNCTIONAL_TYPE"),
        sizing: field("SIZING"),
        employee_count: field("EMPLOYEE_COUNT"),
        active: field("ACTIVE"),
        active_year: field("ACTIVE_YEAR"),
        legal_form: field("LEGAL_FORM"),
        ultimate_parent: field("ULTIMATE_PARENT"),
        services: field("SERVICES"),
        infra_tools: field("INFRA_TOOLS"),
        content_types: field("CONTENT_TYPES"),
        hq_city: field("HQ_CITY"),
        hq_country: field("HQ_COUNTRY"),
        hq_sales_region: field("HQ_SALES_REGION"),
        all_cities: merge_location_values(
            row.get("ALL_CITIES"),
            bucket.iter().map(|l| l.city.as_str()),
        ),
        all_countries: merge_location_values(
            row.get("ALL_COUNTRIES"),
            bucket.iter().map(|l| l.country.as_str()),
        ),
        all_sales_regions: merge_location_values(
            row.get("ALL_SALES_REGIONS"),
            bucket.iter().map(|l| l.sales_region.as_str()),
        ),
    }
}

/// Union of a raw comma-joined column and per-location values. Location
/// values are taken whole.
fn merge_location_values<'a>(
    raw: &'a str,
    from_locations: impl Iterator<Item = &'a str>,
) -> ValueSet {
    ValueSet::from_values(split_tokens(raw, Delimiter::Comma).into_iter().chain(from_locations))
}

fn build_infra(id: u64, infra_id: String, row: &RawRow) -> InfraRecord {
    let field = |name: &str| row.get(name).trim().to_string();
    InfraRecord {
        id,
        infra_id,
        infra_name: field("INFRA_NAME"),
        parent_org: field("PARENT_ORG"),
        license: field("LICENSE"),
        infra_type: field("INFRA_TYPE"),
        structural_type: field("STRUCTURAL_TYPE"),
        pricing: field("PRICING"),
        release_date: field("RELEASE_DATE"),
        related_services: field("RELATED_SERVICES"),
        related_content_types: field("RELATED_CONTENT_TYPES"),
    }
}
