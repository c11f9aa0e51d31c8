//! External catalog collaborators.
//!
//! The matching engines see the CRM through two narrow traits: a filtered
//! company search and an exhaustively paginated product listing. Both return
//! empty collections (never errors) when nothing matches; service failures
//! surface as [`CatalogError`] and are never degraded into "no match".

pub mod client;

use serde::Serialize;

use crate::error::CatalogError;

// Company properties fetched from the catalog.
pub const PROP_NAME: &str = "name";
pub const PROP_ADDRESS: &str = "address";
pub const PROP_ADDRESS2: &str = "address2";
pub const PROP_ZIP: &str = "zip";
pub const PROP_KNOWN_CLIENT: &str = "known_client";

pub const COMPANY_PROPERTIES: [&str; 5] = [
    PROP_NAME,
    PROP_ADDRESS,
    PROP_ADDRESS2,
    PROP_ZIP,
    PROP_KNOWN_CLIENT,
];

// Product properties fetched once for the whole index.
pub const PRODUCT_PROPERTIES: [&str; 5] = ["name", "price", "sku", "internal_code", "description"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FilterOperator {
    #[serde(rename = "EQ")]
    Eq,
    #[serde(rename = "CONTAINS_TOKEN")]
    ContainsToken,
}

#[derive(Debug, Clone, Serialize)]
pub struct Filter {
    #[serde(rename = "propertyName")]
    pub property: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl Filter {
    pub fn eq(property: &str, value: &str) -> Self {
        Self {
            property: property.to_string(),
            operator: FilterOperator::Eq,
            value: value.to_string(),
        }
    }

    pub fn contains_token(property: &str, value: &str) -> Self {
        Self {
            property: property.to_string(),
            operator: FilterOperator::ContainsToken,
            value: value.to_string(),
        }
    }
}

/// A conjunction of filters; the search endpoint ORs groups together.
#[derive(Debug, Clone, Serialize)]
pub struct FilterGroup {
    pub filters: Vec<Filter>,
}

/// One company entry as returned by the catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyRecord {
    pub id: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub address2: Option<String>,
    pub postal_code: Option<String>,
    pub known_client: Option<String>,
}

impl CompanyRecord {
    /// Address lines joined for scoring, skipping absent lines.
    pub fn full_address(&self) -> String {
        [self.address.as_deref(), self.address2.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One product entry as returned by the catalog; `price` stays raw until the
/// index parses it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductRecord {
    pub id: String,
    pub name: Option<String>,
    pub price: Option<String>,
    pub sku: Option<String>,
    pub internal_code: Option<String>,
    pub description: Option<String>,
}

/// One page of the product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductPage {
    pub records: Vec<ProductRecord>,
    pub next_after: Option<String>,
}

/// Filtered company search. Returns an empty list when nothing matches.
pub trait CompanySearch {
    fn search(
        &self,
        groups: &[FilterGroup],
        properties: &[&str],
        limit: u32,
    ) -> Result<Vec<CompanyRecord>, CatalogError>;
}

/// Paginated product listing, exhausted by following `next_after` until it
/// comes back `None`.
pub trait ProductListing {
    fn list_page(
        &self,
        properties: &[&str],
        after: Option<&str>,
    ) -> Result<ProductPage, CatalogError>;
}
