//! Record types and the field taxonomy that drives matching behaviour.

pub mod fields;
pub mod types;

pub use fields::{FieldKind, FieldSpec, InfraField, LocationDimension, OrgField, SortPolicy};
pub use types::{Identifier, InfraRecord, Location, Organization, Record, ValueSet};
