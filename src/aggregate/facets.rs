//! Value counts and distinct-value listings for single fields.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::sort::sort_values;
use crate::error::LookupError;
use crate::model::{FieldKind, FieldSpec, InfraRecord, OrgField, Organization, Record};
use crate::search::normalize::{
    collapse_whitespace, normalize, split_tokens, token_display, token_key,
};
use crate::store::RecordStore;

/// A value and the number of records carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Facet {
    pub name: String,
    pub count: usize,
}

/// `(key, display)` pairs for one record's value of `field`, deduplicated.
fn record_values<R: Record>(record: &R, field: R::Field) -> Vec<(String, String)> {
    if let Some(set) = record.value_set(field) {
        return set
            .values()
            .iter()
            .map(|v| (normalize(v), v.clone()))
            .collect();
    }
    let raw = record.get(field);
    let mut out: Vec<(String, String)> = Vec::new();
    match field.kind() {
        FieldKind::Exact => {
            let key = normalize(raw);
            if !key.is_empty() {
                out.push((key, collapse_whitespace(raw)));
            }
        }
        FieldKind::Token => {
            for tok in split_tokens(raw, field.delimiter()) {
                let key = token_key(field, tok);
                if !key.is_empty() && !out.iter().any(|(k, _)| *k == key) {
                    out.push((key, token_display(field, tok)));
                }
            }
        }
    }
    out
}

/// Counts how many records carry each value of `field`.
///
/// A record contributes at most one to any value. Results are ordered by
/// descending count; ties keep first-seen order. Display text is the first
/// spelling encountered.
pub fn field_facets<'a, R, I>(records: I, field: R::Field, limit: usize) -> Vec<Facet>
where
    R: Record + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut facets: Vec<Facet> = Vec::new();
    for record in records {
        for (key, display) in record_values(record, field) {
            match index.get(&key) {
                Some(&pos) => facets[pos].count += 1,
                None => {
                    index.insert(key, facets.len());
                    facets.push(Facet {
                        name: display,
                        count: 1,
                    });
                }
            }
        }
    }
    facets.sort_by(|a, b| b.count.cmp(&a.count));
    facets.truncate(limit);
    facets
}

/// Every distinct value of `field`, ordered by the field's sort policy.
pub fn distinct_values<'a, R, I>(records: I, field: R::Field) -> Vec<String>
where
    R: Record + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut values: Vec<String> = Vec::new();
    for record in records {
        for (key, display) in record_values(record, field) {
            if seen.insert(key) {
                values.push(display);
            }
        }
    }
    sort_values(field.sort_policy(), &mut values);
    values
}

/// Usage profile of one infra entry across the organization directory.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfraProfile<'a> {
    pub infra: &'a InfraRecord,
    pub org_count: usize,
    pub top_services: Vec<Facet>,
    pub top_content_types: Vec<Facet>,
}

/// Organizations listing `infra_name` among their infra tools.
pub fn orgs_using<'a>(store: &'a RecordStore, infra_name: &str) -> Vec<&'a Organization> {
    let key = token_key(OrgField::InfraTools, infra_name);
    if key.is_empty() {
        return Vec::new();
    }
    store
        .organizations()
        .iter()
        .filter(|org| {
            split_tokens(&org.infra_tools, OrgField::InfraTools.delimiter())
                .into_iter()
                .any(|tok| token_key(OrgField::InfraTools, tok) == key)
        })
        .collect()
}

pub fn infra_profile<'a>(
    store: &'a RecordStore,
    infra_id: &str,
    limit: usize,
) -> Result<InfraProfile<'a>, LookupError> {
    let infra = store.infra(infra_id)?;
    let users = orgs_using(store, &infra.infra_name);
    tracing::debug!(infra_id, users = users.len(), "infra_profile");
    Ok(InfraProfile {
        infra,
        org_count: users.len(),
        top_services: field_facets(users.iter().copied(), OrgField::Services, limit),
        top_content_types: field_facets(users.iter().copied(), OrgField::ContentTypes, limit),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InfraField;
    use crate::store::RowSources;
    use crate::store::rows::RawRow;

    fn org(id: &str) -> RawRow {
        RawRow::new().with("ORG_ID", id).with("ORG_NAME", id)
    }

    fn store() -> RecordStore {
        RecordStore::build(RowSources {
            organizations: vec![
                org("o1")
                    .with("SERVICES", "Editing, VFX, editing")
                    .with("CONTENT_TYPES", "Film Content, Games")
                    .with("INFRA_TOOLS", "Maya, Nuke")
                    .with("SIZING", "51-100")
                    .with("HQ_COUNTRY", "France"),
                org("o2")
                    .with("SERVICES", "VFX")
                    .with("CONTENT_TYPES", "film")
                    .with("INFRA_TOOLS", " maya ")
                    .with("SIZING", "1-10")
                    .with("HQ_COUNTRY", " france "),
                org("o3")
                    .with("SERVICES", "Color")
                    .with("INFRA_TOOLS", "Houdini")
                    .with("SIZING", "101+"),
            ],
            infra: vec![
                RawRow::new()
                    .with("INFRA_ID", "i1")
                    .with("INFRA_NAME", "Maya")
                    .with("PRICING", "$10,001+, FREE"),
                RawRow::new()
                    .with("INFRA_ID", "i2")
                    .with("INFRA_NAME", "Unused")
                    .with("PRICING", "≤ $100"),
            ],
            ..Default::default()
        })
    }

    #[test]
    fn facets_count_each_record_once_per_value() {
        let store = store();
        let facets = field_facets(store.organizations(), OrgField::Services, 10);
        assert_eq!(
            facets,
            vec![
                Facet { name: "VFX".into(), count: 2 },
                Facet { name: "Editing".into(), count: 1 },
                Facet { name: "Color".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn content_type_facets_merge_suffix_variants() {
        let store = store();
        let facets = field_facets(store.organizations(), OrgField::ContentTypes, 10);
        assert_eq!(facets[0], Facet { name: "Film".into(), count: 2 });
        assert_eq!(facets[1], Facet { name: "Games".into(), count: 1 });
    }

    #[test]
    fn exact_field_facets_fold_case_and_whitespace() {
        let store = store();
        let facets = field_facets(store.organizations(), OrgField::HqCountry, 10);
        assert_eq!(facets, vec![Facet { name: "France".into(), count: 2 }]);
    }

    #[test]
    fn derived_location_facets_keep_comma_names() {
        let store = RecordStore::build(RowSources {
            organizations: vec![org("o1"), org("o2")],
            locations: vec![
                RawRow::new().with("ORG_ID", "o1").with("COUNTRY", "Korea, Republic of"),
                RawRow::new().with("ORG_ID", "o2").with("COUNTRY", "korea, republic of"),
            ],
            ..Default::default()
        });
        assert_eq!(
            field_facets(store.organizations(), OrgField::AllCountries, 10),
            vec![Facet { name: "Korea, Republic of".into(), count: 2 }]
        );
    }

    #[test]
    fn facet_limit_truncates() {
        let store = store();
        assert_eq!(field_facets(store.organizations(), OrgField::Services, 1).len(), 1);
    }

    #[test]
    fn distinct_values_follow_sort_policy() {
        let store = store();
        assert_eq!(
            distinct_values(store.organizations(), OrgField::Sizing),
            vec!["1-10", "51-100", "101+"]
        );
        assert_eq!(
            distinct_values(store.infra_records(), InfraField::Pricing),
            vec!["FREE", "≤ $100", "$10,001+"]
        );
        assert_eq!(
            distinct_values(store.organizations(), OrgField::InfraTools),
            vec!["Houdini", "Maya", "Nuke"]
        );
    }

    #[test]
    fn infra_profile_counts_users_by_normalized_name() {
        let store = store();
        let profile = infra_profile(&store, "i1", 5).unwrap();
        assert_eq!(profile.org_count, 2);
        assert_eq!(profile.top_services[0], Facet { name: "VFX".into(), count: 2 });
        assert_eq!(profile.top_content_types[0].count, 2);

        let unused = infra_profile(&store, "i2", 5).unwrap();
        assert_eq!(unused.org_count, 0);
        assert!(unused.top_services.is_empty());
    }

    #[test]
    fn infra_profile_of_unknown_id_is_not_found() {
        let store = store();
        assert_eq!(
            infra_profile(&store, "nope", 5).unwrap_err(),
            LookupError::InfraNotFound("nope".into())
        );
    }
}
