//! Read-only aggregates over the current snapshot.
//!
//! - **[`rollup`]**: region → country → city tree and map points.
//! - **[`summary`]**: single region/country summaries.
//! - **[`facets`]**: value counts, distinct values and infra usage profiles.
//! - **[`sort`]**: ordering rules for distinct values.

pub mod facets;
pub mod rollup;
pub mod sort;
pub mod summary;

pub use facets::{Facet, InfraProfile, distinct_values, field_facets, infra_profile};
pub use rollup::{GeoPoint, TreeNode, geo_points, store_tree};
pub use summary::{AreaLevel, AreaSummary, area_summary};
