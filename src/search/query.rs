//! Listing pipeline: filter, rank, page.
//!
//! [`ListingRequest::from_params`] is the boundary parser for the flat
//! `name=value` parameters a request layer hands over; everything after it is
//! typed.

use super::filter::{
    FilterSet, LocationScope, MatchMode, YearRange, filter_infra, filter_organizations,
};
use super::page::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, Page, paginate, parse_page_param};
use super::rank::rank_by_name;
use crate::model::{FieldSpec, InfraField, InfraRecord, OrgField, Organization};
use crate::store::RecordStore;

const PARAM_QUERY: &str = "q";
const PARAM_PAGE: &str = "page";
const PARAM_PAGE_SIZE: &str = "pageSize";
const PARAM_MATCH: &str = "contentTypesMatch";
const PARAM_YEAR_MIN: &str = "yearMin";
const PARAM_YEAR_MAX: &str = "yearMax";
const PARAM_SCOPE: &str = "scope";
const PARAM_LOCATION_IDS: &str = "locationIds";

#[derive(Debug, Clone, PartialEq)]
pub struct ListingRequest<F> {
    pub query: String,
    pub page: i64,
    pub page_size: i64,
    pub filters: FilterSet<F>,
}

impl<F: FieldSpec> Default for ListingRequest<F> {
    fn default() -> Self {
        Self {
            query: String::new(),
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            filters: FilterSet::new(),
        }
    }
}

impl<F: FieldSpec> ListingRequest<F> {
    /// Parses request parameters. Malformed values fall back to defaults and
    /// unknown names are dropped.
    pub fn from_params<'a, I>(params: I, default_page_size: i64) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut req = Self {
            page_size: default_page_size,
            ..Self::default()
        };
        let mut year_min = None;
        let mut year_max = None;

        for (name, value) in params {
            let is = |param: &str| name.trim().eq_ignore_ascii_case(param);
            if is(PARAM_QUERY) {
                req.query = value.to_string();
            } else if is(PARAM_PAGE) {
                req.page = parse_page_param(Some(value), DEFAULT_PAGE);
            } else if is(PARAM_PAGE_SIZE) {
                req.page_size = parse_page_param(Some(value), default_page_size);
            } else if is(PARAM_MATCH) {
                req.filters.match_mode = value.parse().unwrap_or(MatchMode::Any);
            } else if is(PARAM_YEAR_MIN) {
                year_min = Some(value);
            } else if is(PARAM_YEAR_MAX) {
                year_max = Some(value);
            } else if is(PARAM_SCOPE) {
                req.filters.scope = LocationScope::parse_or_default(value);
            } else if is(PARAM_LOCATION_IDS) {
                req.filters.location_ids.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from),
                );
            } else {
                req.filters.push_named(name, value);
            }
        }

        req.filters.years = YearRange::parse(year_min, year_max);
        req
    }
}

pub fn search_organizations<'a>(
    store: &'a RecordStore,
    req: &ListingRequest<OrgField>,
) -> Page<&'a Organization> {
    let matched = filter_organizations(store, &req.filters);
    let ranked = rank_by_name(matched, &req.query);
    paginate(ranked, req.page, req.page_size)
}

pub fn search_infra<'a>(
    store: &'a RecordStore,
    req: &ListingRequest<InfraField>,
) -> Page<&'a InfraRecord> {
    let matched = filter_infra(store, &req.filters);
    let ranked = rank_by_name(matched, &req.query);
    paginate(ranked, req.page, req.page_size)
}
