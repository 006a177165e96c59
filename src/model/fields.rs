//! Field taxonomy for the organization and infrastructure domains.
//!
//! Every filterable column is an enum variant carrying its classification
//! (exact-match or token-list), the delimiter used to split its stored value,
//! and the sort policy used when listing its distinct values. Raw string names
//! only appear here, at the boundary.

use serde::Serialize;

use crate::search::normalize::Delimiter;

/// How a field's stored value is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Whole value compared as one normalized string.
    Exact,
    /// Delimited list of labels compared as a set.
    Token,
}

/// Ordering used for distinct-value listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortPolicy {
    Alphabetical,
    /// Organization sizing buckets ("1-10", "51-100", "101+").
    Sizing,
    /// Infra pricing buckets ("FREE", "≤ $100", ..., "END_OF_LIFE").
    Pricing,
}

/// Location dimension that supports headquarters/all-locations scope merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationDimension {
    SalesRegion,
    Country,
    City,
}

/// Behaviour shared by the field enums of both domains.
pub trait FieldSpec: Copy + Eq + std::hash::Hash + std::fmt::Debug {
    /// Case-insensitive lookup by column name.
    fn from_name(name: &str) -> Option<Self>;

    fn name(self) -> &'static str;
    fn kind(self) -> FieldKind;

    fn delimiter(self) -> Delimiter {
        Delimiter::Comma
    }

    /// Content-type fields strip a trailing " Content" from each token and
    /// support "all" match mode.
    fn is_content_type(self) -> bool {
        false
    }

    fn sort_policy(self) -> SortPolicy {
        SortPolicy::Alphabetical
    }

    /// Scope-mergeable HQ field, if any.
    fn location_dimension(self) -> Option<LocationDimension> {
        None
    }

    /// Derived token field holding every location's value for an HQ field.
    fn all_locations_field(self) -> Option<Self> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrgField {
    OrgId,
    OrgName,
    FunctionalType,
    Sizing,
    EmployeeCount,
    Active,
    ActiveYear,
    LegalForm,
    UltimateParent,
    Services,
    InfraTools,
    ContentTypes,
    HqCity,
    HqCountry,
    HqSalesRegion,
    AllCities,
    AllCountries,
    AllSalesRegions,
}

impl OrgField {
    pub const ALL: [OrgField; 18] = [
        OrgField::OrgId,
        OrgField::OrgName,
        OrgField::FunctionalType,
        OrgField::Sizing,
        OrgField::EmployeeCount,
        OrgField::Active,
        OrgField::ActiveYear,
        OrgField::LegalForm,
        OrgField::UltimateParent,
        OrgField::Services,
        OrgField::InfraTools,
        OrgField::ContentTypes,
        OrgField::HqCity,
        OrgField::HqCountry,
        OrgField::HqSalesRegion,
        OrgField::AllCities,
        OrgField::AllCountries,
        OrgField::AllSalesRegions,
    ];
}

impl FieldSpec for OrgField {
    fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }

    fn name(self) -> &'static str {
        match self {
            Self::OrgId => "ORG_ID",
            Self::OrgName => "ORG_NAME",
            Self::FunctionalType => "FUNCTIONAL_TYPE",
            Self::Sizing => "SIZING",
            Self::EmployeeCount => "EMPLOYEE_COUNT",
            Self::Active => "ACTIVE",
            Self::ActiveYear => "ACTIVE_YEAR",
            Self::LegalForm => "LEGAL_FORM",
            Self::UltimateParent => "ULTIMATE_PARENT",
            Self::Services => "SERVICES",
            Self::InfraTools => "INFRA_TOOLS",
            Self::ContentTypes => "CONTENT_TYPES",
            Self::HqCity => "HQ_CITY",
            Self::HqCountry => "HQ_COUNTRY",
            Self::HqSalesRegion => "HQ_SALES_REGION",
            Self::AllCities => "ALL_CITIES",
            Self::AllCountries => "ALL_COUNTRIES",
            Self::AllSalesRegions => "ALL_SALES_REGIONS",
        }
    }

    fn kind(self) -> FieldKind {
        match self {
            Self::FunctionalType
            | Self::Services
            | Self::InfraTools
            | Self::ContentTypes
            | Self::AllCities
            | Self::AllCountries
            | Self::AllSalesRegions => FieldKind::Token,
            _ => FieldKind::Exact,
        }
    }

    fn is_content_type(self) -> bool {
        matches!(self, Self::ContentTypes)
    }

    fn sort_policy(self) -> SortPolicy {
        match self {
            Self::Sizing => SortPolicy::Sizing,
            _ => SortPolicy::Alphabetical,
        }
    }

    fn location_dimension(self) -> Option<LocationDimension> {
        match self {
            Self::HqSalesRegion => Some(LocationDimension::SalesRegion),
            Self::HqCountry => Some(LocationDimension::Country),
            Self::HqCity => Some(LocationDimension::City),
            _ => None,
        }
    }

    fn all_locations_field(self) -> Option<Self> {
        match self.location_dimension()? {
            LocationDimension::SalesRegion => Some(Self::AllSalesRegions),
            LocationDimension::Country => Some(Self::AllCountries),
            LocationDimension::City => Some(Self::AllCities),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfraField {
    InfraId,
    InfraName,
    ParentOrg,
    License,
    InfraType,
    StructuralType,
    Pricing,
    ReleaseDate,
    RelatedServices,
    RelatedContentTypes,
}

impl InfraField {
    pub const ALL: [InfraField; 10] = [
        InfraField::InfraId,
        InfraField::InfraName,
        InfraField::ParentOrg,
        InfraField::License,
        InfraField::InfraType,
        InfraField::StructuralType,
        InfraField::Pricing,
        InfraField::ReleaseDate,
        InfraField::RelatedServices,
        InfraField::RelatedContentTypes,
    ];
}

impl FieldSpec for InfraField {
    /// Organization-domain names for the cross-linked token fields resolve to
    /// their infra counterparts so that org filters can be passed through.
    fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("SERVICES") {
            return Some(Self::RelatedServices);
        }
        if name.eq_ignore_ascii_case("CONTENT_TYPES") {
            return Some(Self::RelatedContentTypes);
        }
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }

    fn name(self) -> &'static str {
        match self {
            Self::InfraId => "INFRA_ID",
            Self::InfraName => "INFRA_NAME",
            Self::ParentOrg => "PARENT_ORG",
            Self::License => "LICENSE",
            Self::InfraType => "INFRA_TYPE",
            Self::StructuralType => "STRUCTURAL_TYPE",
            Self::Pricing => "PRICING",
            Self::ReleaseDate => "RELEASE_DATE",
            Self::RelatedServices => "RELATED_SERVICES",
            Self::RelatedContentTypes => "RELATED_CONTENT_TYPES",
        }
    }

    fn kind(self) -> FieldKind {
        match self {
            Self::License
            | Self::Pricing
            | Self::RelatedServices
            | Self::RelatedContentTypes => FieldKind::Token,
            _ => FieldKind::Exact,
        }
    }

    fn delimiter(self) -> Delimiter {
        match self {
            Self::License | Self::Pricing => Delimiter::CommaNotBeforeDigit,
            _ => Delimiter::Comma,
        }
    }

    fn is_content_type(self) -> bool {
        matches!(self, Self::RelatedContentTypes)
    }

    fn sort_policy(self) -> SortPolicy {
        match self {
            Self::Pricing => SortPolicy::Pricing,
            _ => SortPolicy::Alphabetical,
        }
    }
}
