//! Region → country → city rollups with deduplicated organization counts.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::model::Location;
use crate::search::normalize::{collapse_whitespace, normalize};
use crate::store::RecordStore;

/// Bucket name for rows with no value at a level.
pub const UNKNOWN: &str = "Unknown";

/// Fixed display order of sales regions; anything else sorts alphabetically after.
pub const CANONICAL_REGIONS: [&str; 4] = ["North America", "Latin America", "EMEA", "Asia Pacific"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub name: String,
    pub total_orgs: usize,
    pub hq_orgs: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        let key = normalize(name);
        self.children.iter().find(|c| normalize(&c.name) == key)
    }
}

#[derive(Debug, Default)]
struct Bucket<'a> {
    name: String,
    orgs: HashSet<&'a str>,
    hq_orgs: HashSet<&'a str>,
    children: BTreeMap<String, Bucket<'a>>,
}

/// Accumulates location rows along a path of level names.
///
/// Counts are cardinalities of organization-identity sets, so several rows of
/// one organization in the same place count once.
#[derive(Debug, Default)]
pub struct RollupBuilder<'a> {
    roots: BTreeMap<String, Bucket<'a>>,
}

impl<'a> RollupBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: &[&str], org_id: &'a str, is_hq: bool) {
        let mut level = &mut self.roots;
        for raw in path {
            let display = level_name(raw);
            let bucket = level.entry(normalize(&display)).or_insert_with(|| Bucket {
                name: display,
                ..Bucket::default()
            });
            bucket.orgs.insert(org_id);
            if is_hq {
                bucket.hq_orgs.insert(org_id);
            }
            level = &mut bucket.children;
        }
    }

    /// Every level sorted alphabetically.
    pub fn into_alphabetical(self) -> Vec<TreeNode> {
        convert(self.roots, None)
    }

    /// Every level sorted by descending org count (ties alphabetical) and
    /// capped at `limit` entries.
    pub fn into_ranked(self, limit: usize) -> Vec<TreeNode> {
        convert(self.roots, Some(limit))
    }
}

fn level_name(raw: &str) -> String {
    let trimmed = collapse_whitespace(raw);
    if trimmed.is_empty() {
        UNKNOWN.to_string()
    } else {
        trimmed
    }
}

fn convert(level: BTreeMap<String, Bucket<'_>>, limit: Option<usize>) -> Vec<TreeNode> {
    // BTreeMap iteration is already alphabetical on the normalized key.
    let mut nodes: Vec<TreeNode> = level
        .into_values()
        .map(|bucket| TreeNode {
            name: bucket.name,
            total_orgs: bucket.orgs.len(),
            hq_orgs: bucket.hq_orgs.len(),
            children: convert(bucket.children, limit),
        })
        .collect();
    if let Some(limit) = limit {
        nodes.sort_by(|a, b| b.total_orgs.cmp(&a.total_orgs));
        nodes.truncate(limit);
    }
    nodes
}

fn region_rank(name: &str) -> usize {
    let key = normalize(name);
    CANONICAL_REGIONS
        .iter()
        .position(|r| normalize(r) == key)
        .unwrap_or(CANONICAL_REGIONS.len())
}

/// Orders top-level region nodes canonically, unknown names alphabetically after.
pub fn sort_regions(nodes: &mut [TreeNode]) {
    nodes.sort_by_cached_key(|n| (region_rank(&n.name), normalize(&n.name)));
}

/// Full region → country → city tree over the given location rows.
pub fn region_tree<'a, I>(locations: I) -> Vec<TreeNode>
where
    I: IntoIterator<Item = &'a Location>,
{
    let mut builder = RollupBuilder::new();
    let mut rows = 0usize;
    for loc in locations {
        builder.add(
            &[
                loc.sales_region.as_str(),
                loc.country.as_str(),
                loc.city.as_str(),
            ],
            &loc.org_id,
            loc.is_hq,
        );
        rows += 1;
    }
    let mut regions = builder.into_alphabetical();
    sort_regions(&mut regions);
    tracing::debug!(rows, regions = regions.len(), "rollup_complete");
    regions
}

/// Tree over every location, or only those of `orgs` when given.
pub fn store_tree(store: &RecordStore, orgs: Option<&HashSet<&str>>) -> Vec<TreeNode> {
    region_tree(
        store
            .locations()
            .iter()
            .filter(|loc| orgs.is_none_or(|set| set.contains(loc.org_id.as_str()))),
    )
}

/// One geocoded location for map views.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint<'a> {
    pub location_id: &'a str,
    pub org_id: &'a str,
    pub org_name: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub city: &'a str,
    pub country: &'a str,
    pub sales_region: &'a str,
    pub is_hq: bool,
}

/// Locations with coordinates, one point per location identity.
pub fn geo_points<'a>(store: &'a RecordStore, orgs: Option<&HashSet<&str>>) -> Vec<GeoPoint<'a>> {
    let mut seen = HashSet::new();
    store
        .locations()
        .iter()
        .filter(|loc| orgs.is_none_or(|set| set.contains(loc.org_id.as_str())))
        .filter_map(|loc| {
            let (latitude, longitude) = loc.coordinates()?;
            if !seen.insert(loc.location_id.as_str()) {
                return None;
            }
            let org_name = store
                .find_organization(&loc.org_id)
                .map(|o| o.org_name.as_str())
                .unwrap_or("");
            Some(GeoPoint {
                location_id: &loc.location_id,
                org_id: &loc.org_id,
                org_name,
                latitude,
                longitude,
                city: &loc.city,
                country: &loc.country,
                sales_region: &loc.sales_region,
                is_hq: loc.is_hq,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RowSources;
    use crate::store::rows::RawRow;

    fn loc(org: &str, region: &str, country: &str, city: &str, hq: bool) -> RawRow {
        RawRow::new()
            .with("ORG_ID", org)
            .with("SALES_REGION", region)
            .with("COUNTRY", country)
            .with("CITY", city)
            .with("IS_HQ", if hq { "true" } else { "false" })
    }

    fn store(locations: Vec<RawRow>) -> RecordStore {
        RecordStore::build(RowSources {
            locations,
            ..Default::default()
        })
    }

    #[test]
    fn same_org_twice_in_a_city_counts_once() {
        let store = store(vec![
            loc("o1", "EMEA", "France", "Paris", true),
            loc("o1", "EMEA", "France", "Paris", false),
            loc("o2", "EMEA", "France", "Paris", false),
        ]);
        let tree = store_tree(&store, None);
        let paris = tree[0].child("France").unwrap().child("Paris").unwrap();
        assert_eq!(paris.total_orgs, 2);
        assert_eq!(paris.hq_orgs, 1);
        assert_eq!(tree[0].total_orgs, 2);
    }

    #[test]
    fn missing_values_roll_into_unknown() {
        let store = store(vec![loc("o1", "", "  ", "", false)]);
        let tree = store_tree(&store, None);
        assert_eq!(tree[0].name, UNKNOWN);
        assert_eq!(tree[0].children[0].name, UNKNOWN);
        assert_eq!(tree[0].children[0].children[0].name, UNKNOWN);
        assert_eq!(tree[0].children[0].children[0].total_orgs, 1);
    }

    #[test]
    fn regions_follow_canonical_order_then_alphabetical() {
        let store = store(vec![
            loc("o1", "Oceania", "Fiji", "Suva", false),
            loc("o2", "Asia Pacific", "Japan", "Tokyo", false),
            loc("o3", "EMEA", "France", "Paris", false),
            loc("o4", "Antarctica", "None", "Base", false),
            loc("o5", "north america", "Canada", "Toronto", false),
        ]);
        let names: Vec<String> = store_tree(&store, None).into_iter().map(|n| n.name).collect();
        assert_eq!(
            names,
            vec!["north america", "EMEA", "Asia Pacific", "Antarctica", "Oceania"]
        );
    }

    #[test]
    fn countries_and_cities_sort_alphabetically() {
        let store = store(vec![
            loc("o1", "EMEA", "Spain", "Madrid", false),
            loc("o2", "EMEA", "France", "Paris", false),
            loc("o3", "EMEA", "France", "Lyon", false),
        ]);
        let tree = store_tree(&store, None);
        let countries: Vec<&str> = tree[0].children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(countries, vec!["France", "Spain"]);
        let cities: Vec<&str> = tree[0].children[0]
            .children
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(cities, vec!["Lyon", "Paris"]);
    }

    #[test]
    fn names_merge_case_insensitively_keeping_first_display() {
        let store = store(vec![
            loc("o1", "EMEA", "France", "Paris", false),
            loc("o2", "emea", "FRANCE", "paris", false),
        ]);
        let tree = store_tree(&store, None);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "EMEA");
        assert_eq!(tree[0].children[0].name, "France");
        assert_eq!(tree[0].children[0].total_orgs, 2);
    }

    #[test]
    fn ranked_rollup_caps_each_level() {
        let mut builder = RollupBuilder::new();
        builder.add(&["A"], "o1", false);
        builder.add(&["B"], "o1", false);
        builder.add(&["B"], "o2", false);
        builder.add(&["C"], "o3", false);
        let nodes = builder.into_ranked(2);
        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn tree_can_be_restricted_to_an_org_subset() {
        let store = store(vec![
            loc("o1", "EMEA", "France", "Paris", false),
            loc("o2", "Asia Pacific", "Japan", "Tokyo", false),
        ]);
        let subset = HashSet::from(["o2"]);
        let tree = store_tree(&store, Some(&subset));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "Asia Pacific");
    }

    #[test]
    fn points_skip_missing_coordinates_and_collapse_identities() {
        let store = store(vec![
            loc("o1", "EMEA", "France", "Paris", true)
                .with("LATITUDE", "48.8566")
                .with("LONGITUDE", "2.3522"),
            loc("o1", "EMEA", "France", "Paris", true)
                .with("LATITUDE", "48.856601")
                .with("LONGITUDE", "2.352201"),
            loc("o2", "EMEA", "France", "Lyon", false).with("LATITUDE", "45.76"),
        ]);
        let points = geo_points(&store, None);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].org_id, "o1");
        assert!(points[0].is_hq);

        // the coordinate-less row still counts in the rollup
        assert_eq!(store_tree(&store, None)[0].total_orgs, 2);
    }
}
