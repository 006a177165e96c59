//! Multi-field filter engine.
//!
//! Constraints on different fields are ANDed. Within one field the selected
//! values are ORed, except for content-type fields in [`MatchMode::All`], where
//! every selected value must be present.

use std::collections::HashSet;
use std::str::FromStr;

use serde::Serialize;

use super::normalize::{Delimiter, normalize, split_tokens, token_key, token_keys};
use crate::model::{FieldKind, FieldSpec, InfraRecord, Organization, Record};
use crate::store::RecordStore;

/// Lowest year accepted as an active year-range bound.
pub const YEAR_FLOOR: f64 = 1900.0;

/// How content-type selections combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Any,
    All,
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "all" => Ok(Self::All),
            other => Err(format!("unknown match mode '{other}' (expected any|all)")),
        }
    }
}

/// Whether location filters see only headquarters or every location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationScope {
    #[default]
    Hq,
    All,
}

impl LocationScope {
    /// Lenient parse used at every boundary: anything unrecognized is `Hq`.
    pub fn parse_or_default(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl FromStr for LocationScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hq" => Ok(Self::Hq),
            "all" => Ok(Self::All),
            other => Err(format!("unknown scope '{other}' (expected hq|all)")),
        }
    }
}

/// Inclusive year bounds; a bound that is missing, unparseable, non-finite or
/// below [`YEAR_FLOOR`] is inactive.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct YearRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl YearRange {
    pub fn parse(min: Option<&str>, max: Option<&str>) -> Self {
        Self {
            min: min.and_then(parse_bound),
            max: max.and_then(parse_bound),
        }
    }

    pub fn is_active(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    /// Records without a year fail whenever a bound is active.
    pub fn admits(&self, year: Option<f64>) -> bool {
        if !self.is_active() {
            return true;
        }
        let Some(year) = year else {
            return false;
        };
        self.min.is_none_or(|min| year >= min) && self.max.is_none_or(|max| year <= max)
    }
}

fn parse_bound(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    (value.is_finite() && value >= YEAR_FLOOR).then_some(value)
}

/// A full set of constraints for one listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSet<F> {
    /// Field constraints in caller order, each a comma-joined multi-select.
    pub fields: Vec<(F, String)>,
    pub match_mode: MatchMode,
    pub scope: LocationScope,
    pub years: YearRange,
    /// Location identities from a map selection; empty means no constraint.
    pub location_ids: Vec<String>,
}

impl<F> Default for FilterSet<F> {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            match_mode: MatchMode::default(),
            scope: LocationScope::default(),
            years: YearRange::default(),
            location_ids: Vec::new(),
        }
    }
}

impl<F: FieldSpec> FilterSet<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: F, selection: impl Into<String>) -> Self {
        self.fields.push((field, selection.into()));
        self
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    pub fn with_scope(mut self, scope: LocationScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_years(mut self, years: YearRange) -> Self {
        self.years = years;
        self
    }

    pub fn with_location_ids(mut self, ids: Vec<String>) -> Self {
        self.location_ids = ids;
        self
    }

    /// Adds a constraint by column name. Unknown names are ignored and
    /// reported back as `false`.
    pub fn push_named(&mut self, name: &str, selection: &str) -> bool {
        match F::from_name(name) {
            Some(field) => {
                self.fields.push((field, selection.to_string()));
                true
            }
            None => {
                tracing::debug!(field = name, "ignoring unknown filter field");
                false
            }
        }
    }
}

/// One field constraint resolved to comparison keys.
#[derive(Debug)]
struct Constraint<F> {
    field: F,
    keys: HashSet<String>,
    require_all: bool,
    merge_field: Option<F>,
}

impl<F: FieldSpec> Constraint<F> {
    fn matches<R: Record<Field = F>>(&self, record: &R) -> bool {
        match self.field.kind() {
            FieldKind::Exact => exact_or_merged(record, self.field, self.merge_field, |k| {
                self.keys.contains(k)
            }),
            FieldKind::Token => {
                if let Some(set) = record.value_set(self.field) {
                    return if self.require_all {
                        self.keys.iter().all(|k| set.contains_key(k))
                    } else {
                        set.keys().any(|k| self.keys.contains(k))
                    };
                }
                let present = token_keys(self.field, record.get(self.field));
                if self.require_all {
                    self.keys.iter().all(|k| present.contains(k))
                } else {
                    present.iter().any(|k| self.keys.contains(k))
                }
            }
        }
    }
}

fn exact_or_merged<R: Record>(
    record: &R,
    field: R::Field,
    merge_field: Option<R::Field>,
    accept: impl Fn(&str) -> bool,
) -> bool {
    if accept(&normalize(record.get(field))) {
        return true;
    }
    merge_field.is_some_and(|merge| match record.value_set(merge) {
        Some(set) => set.keys().any(&accept),
        None => token_keys(merge, record.get(merge)).iter().any(|k| accept(k)),
    })
}

/// Whether `record` has the normalized `key` on an HQ-style exact field,
/// widened to every location under [`LocationScope::All`].
pub fn matches_in_scope<R: Record>(
    record: &R,
    field: R::Field,
    key: &str,
    scope: LocationScope,
) -> bool {
    let merge_field = match scope {
        LocationScope::All => field.all_locations_field(),
        LocationScope::Hq => None,
    };
    exact_or_merged(record, field, merge_field, |k| k == key)
}

/// Splits a raw multi-select into its selected values.
///
/// Commas followed by a digit never separate values. A raw string equal to an
/// existing value is kept whole, so "Autodesk, Inc." stays one selection.
/// Existing values are an exact field's own values plus, for location fields,
/// every value of the matching all-locations set.
pub fn parse_selection<'a, R: Record>(
    records: &[R],
    field: R::Field,
    raw: &'a str,
) -> Vec<&'a str> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    if raw.contains(',') && is_known_value(records, field, &normalize(raw)) {
        return vec![raw.trim()];
    }
    split_tokens(raw, Delimiter::CommaNotBeforeDigit)
}

fn is_known_value<R: Record>(records: &[R], field: R::Field, key: &str) -> bool {
    let exact = field.kind() == FieldKind::Exact;
    let merged = field.all_locations_field();
    records.iter().any(|r| {
        (exact && normalize(r.get(field)) == key)
            || [Some(field), merged]
                .into_iter()
                .flatten()
                .any(|f| r.value_set(f).is_some_and(|set| set.contains_key(key)))
    })
}

fn compile<R: Record>(
    records: &[R],
    field: R::Field,
    raw: &str,
    mode: MatchMode,
    scope: LocationScope,
) -> Option<Constraint<R::Field>> {
    let keys: HashSet<String> = parse_selection(records, field, raw)
        .into_iter()
        .map(|v| match field.kind() {
            FieldKind::Exact => normalize(v),
            FieldKind::Token => token_key(field, v),
        })
        .filter(|k| !k.is_empty())
        .collect();
    if keys.is_empty() {
        return None;
    }
    let merge_field = match scope {
        LocationScope::All => field.all_locations_field(),
        LocationScope::Hq => None,
    };
    Some(Constraint {
        field,
        keys,
        require_all: mode == MatchMode::All && field.is_content_type(),
        merge_field,
    })
}

/// Applies field constraints and the year range. Location identities are not
/// considered here.
pub fn apply_filters<'a, R: Record>(
    records: &'a [R],
    filters: &FilterSet<R::Field>,
) -> Vec<&'a R> {
    let constraints: Vec<Constraint<R::Field>> = filters
        .fields
        .iter()
        .filter_map(|(field, raw)| {
            compile(records, *field, raw, filters.match_mode, filters.scope)
        })
        .collect();

    let matched: Vec<&R> = records
        .iter()
        .filter(|r| filters.years.admits(r.year()))
        .filter(|r| constraints.iter().all(|c| c.matches(*r)))
        .collect();

    tracing::debug!(
        constraints = constraints.len(),
        candidates = records.len(),
        matched = matched.len(),
        "filter_complete"
    );
    matched
}

/// Filters organizations, including the map-selection constraint.
pub fn filter_organizations<'a>(
    store: &'a RecordStore,
    filters: &FilterSet<crate::model::OrgField>,
) -> Vec<&'a Organization> {
    let matched = apply_filters(store.organizations(), filters);
    if filters.location_ids.is_empty() {
        return matched;
    }
    let owners = store.owners_of(filters.location_ids.iter().map(String::as_str));
    matched
        .into_iter()
        .filter(|org| owners.contains(org.org_id.as_str()))
        .collect()
}

/// Filters the infra catalog. Location identities do not apply to infra.
pub fn filter_infra<'a>(
    store: &'a RecordStore,
    filters: &FilterSet<crate::model::InfraField>,
) -> Vec<&'a InfraRecord> {
    apply_filters(store.infra_records(), filters)
}
