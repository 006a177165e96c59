//! Query engine facade.
//!
//! - **[`normalize`]**: canonical comparison forms for raw field strings.
//! - **[`filter`]**: multi-field filter engine with scope merging and year ranges.
//! - **[`rank`]**: free-text name scorer.
//! - **[`page`]**: result paging.
//! - **[`query`]**: the listing pipeline tying the above together.

pub mod filter;
pub mod normalize;
pub mod page;
pub mod query;
pub mod rank;
