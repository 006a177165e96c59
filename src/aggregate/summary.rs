//! Region and country summaries.

use std::str::FromStr;

use serde::Serialize;

use super::rollup::{RollupBuilder, TreeNode};
use crate::model::{Location, OrgField, Organization};
use crate::search::filter::{LocationScope, matches_in_scope};
use crate::search::normalize::{collapse_whitespace, normalize};
use crate::store::RecordStore;

/// Geographic level a summary is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaLevel {
    Region,
    Country,
}

impl AreaLevel {
    fn hq_field(self) -> OrgField {
        match self {
            Self::Region => OrgField::HqSalesRegion,
            Self::Country => OrgField::HqCountry,
        }
    }

    fn location_value(self, loc: &Location) -> &str {
        match self {
            Self::Region => &loc.sales_region,
            Self::Country => &loc.country,
        }
    }

    /// Levels below this one, outermost first.
    fn child_path(self, loc: &Location) -> Vec<&str> {
        match self {
            Self::Region => vec![loc.country.as_str(), loc.city.as_str()],
            Self::Country => vec![loc.city.as_str()],
        }
    }
}

impl FromStr for AreaLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "region" => Ok(Self::Region),
            "country" => Ok(Self::Country),
            other => Err(format!("unknown area level '{other}' (expected region|country)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaSummary {
    pub name: String,
    pub level: AreaLevel,
    pub scope: LocationScope,
    pub total_orgs: usize,
    pub hq_orgs: usize,
    /// Countries then cities (region level) or cities (country level), each
    /// level ranked by org count and capped.
    pub children: Vec<TreeNode>,
}

/// Summarizes one region or country.
///
/// `total_orgs` counts organizations matching the area under `scope`;
/// `hq_orgs` counts those headquartered there regardless of `scope`.
/// Under [`LocationScope::Hq`] the breakdown only uses headquarters rows.
pub fn area_summary(
    store: &RecordStore,
    level: AreaLevel,
    name: &str,
    scope: LocationScope,
    limit: usize,
) -> AreaSummary {
    let key = normalize(name);
    let field = level.hq_field();
    let matched: Vec<&Organization> = if key.is_empty() {
        Vec::new()
    } else {
        store
            .organizations()
            .iter()
            .filter(|org| matches_in_scope(*org, field, &key, scope))
            .collect()
    };
    let hq_orgs = matched
        .iter()
        .filter(|org| matches_in_scope(**org, field, &key, LocationScope::Hq))
        .count();

    let mut builder = RollupBuilder::new();
    for org in &matched {
        for loc in store.locations_of(&org.org_id) {
            if scope == LocationScope::Hq && !loc.is_hq {
                continue;
            }
            if normalize(level.location_value(loc)) != key {
                continue;
            }
            builder.add(&level.child_path(loc), &org.org_id, loc.is_hq);
        }
    }

    tracing::debug!(
        area = name,
        level = ?level,
        scope = ?scope,
        matched = matched.len(),
        "summary_complete"
    );
    AreaSummary {
        name: collapse_whitespace(name),
        level,
        scope,
        total_orgs: matched.len(),
        hq_orgs,
        children: builder.into_ranked(limit),
    }
}
