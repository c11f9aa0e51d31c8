//! Product resolution: an owned in-memory catalog index plus full-scan
//! best-of-all-candidates scoring per line item.
//!
//! The index is built from one exhaustive paginated fetch and reused across
//! calls; `force_refresh` rebuilds it. The resolver takes `&mut self`, so a
//! refresh can never race a resolution within one resolver instance; sharing
//! one resolver across threads is the caller's problem to serialize.

use std::thread;
use std::time::Duration;

use crate::catalog::{ProductListing, ProductRecord, PRODUCT_PROPERTIES};
use crate::error::{CatalogError, ResolveError};
use crate::features::ProductSignals;
use crate::models::{LineItemInput, MatchState, Nested, ProductMatch, ScoreBreakdown};
use crate::similarity::product_score;

pub const DEFAULT_PRODUCT_MIN_SCORE: i32 = 78;

/// Single scoring path for products, recorded in every scored result.
const METHOD_FUZZY_SIGNALS: &str = "fuzzy+signals";

/// A catalog entry with its scoring signals computed once at build time.
#[derive(Debug, Clone)]
pub struct IndexedProduct {
    pub id: String,
    pub name: String,
    pub sku: Option<String>,
    pub internal_code: Option<String>,
    pub signals: ProductSignals,
}

impl IndexedProduct {
    fn from_record(record: ProductRecord) -> Self {
        let name = record.name.unwrap_or_default();
        let description = record.description.unwrap_or_default();
        let price = parse_price(record.price.as_deref());
        let signals = ProductSignals::extract(&name, &description, price);
        Self {
            id: record.id,
            name,
            sku: record.sku,
            internal_code: record.internal_code,
            signals,
        }
    }
}

/// Options for building the index.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexOptions {
    /// Cap on listing pages; `None` fetches until the cursor runs out.
    pub max_pages: Option<u32>,
    /// Pause between pages, milliseconds.
    pub page_throttle_ms: u64,
}

/// Pre-extracted product catalog, built from one full paginated fetch.
#[derive(Debug, Default)]
pub struct ProductIndex {
    entries: Vec<IndexedProduct>,
}

impl ProductIndex {
    pub fn build<L: ProductListing>(
        listing: &L,
        options: IndexOptions,
    ) -> Result<Self, CatalogError> {
        let mut entries = Vec::new();
        let mut after: Option<String> = None;
        let mut pages = 0u32;
        loop {
            let page = listing.list_page(&PRODUCT_PROPERTIES, after.as_deref())?;
            entries.extend(page.records.into_iter().map(IndexedProduct::from_record));
            pages += 1;
            if options.max_pages.is_some_and(|cap| pages >= cap) {
                log::warn!("product index capped at {pages} page(s); catalog not fully fetched");
                break;
            }
            match page.next_after {
                Some(cursor) => {
                    after = Some(cursor);
                    if options.page_throttle_ms > 0 {
                        thread::sleep(Duration::from_millis(options.page_throttle_ms));
                    }
                }
                None => break,
            }
        }
        log::info!("product index built: {} entries over {} page(s)", entries.len(), pages);
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexedProduct] {
        &self.entries
    }

    /// Score one line item against every entry; highest score wins, first
    /// retrieved wins ties.
    pub fn match_item(&self, item: &LineItemInput, min_score: i32) -> ProductMatch {
        let signals = ProductSignals::extract(&item.product_name, "", item.unit_price);
        let mut best: Option<(&IndexedProduct, i32, ScoreBreakdown)> = None;
        for entry in &self.entries {
            let (score, details) = product_score(&signals, &entry.signals);
            if best.as_ref().map_or(true, |(_, s, _)| score > *s) {
                best = Some((entry, score, details));
            }
        }
        match best {
            Some((entry, score, details)) if score >= min_score => ProductMatch {
                input: item.clone(),
                state: MatchState::Found,
                matched_id: Some(entry.id.clone()),
                matched_name: Some(entry.name.clone()),
                matched_price: entry.signals.price,
                score,
                method: Some(METHOD_FUZZY_SIGNALS.to_string()),
                details,
            },
            Some((_, score, details)) => ProductMatch {
                input: item.clone(),
                state: MatchState::NotFound,
                matched_id: None,
                matched_name: None,
                matched_price: None,
                score,
                method: Some(METHOD_FUZZY_SIGNALS.to_string()),
                details,
            },
            None => ProductMatch {
                input: item.clone(),
                state: MatchState::NotFound,
                matched_id: None,
                matched_name: None,
                matched_price: None,
                score: 0,
                method: None,
                details: ScoreBreakdown::default(),
            },
        }
    }
}

/// Owns the listing collaborator and the cached index.
pub struct ProductResolver<L: ProductListing> {
    listing: L,
    options: IndexOptions,
    index: Option<ProductIndex>,
}

impl<L: ProductListing> ProductResolver<L> {
    pub fn new(listing: L, options: IndexOptions) -> Self {
        Self {
            listing,
            options,
            index: None,
        }
    }

    /// Build the index if absent, or rebuild it when forced. Last build wins.
    pub fn ensure_index(&mut self, force_refresh: bool) -> Result<&ProductIndex, CatalogError> {
        if force_refresh || self.index.is_none() {
            self.index = Some(ProductIndex::build(&self.listing, self.options)?);
        }
        Ok(self.index.as_ref().expect("index built above"))
    }

    /// Resolve a nested list of line items, preserving the input shape. The
    /// top level must be a list; a bare item is a usage error.
    pub fn resolve(
        &mut self,
        input: &Nested<LineItemInput>,
        min_score: i32,
        force_refresh: bool,
    ) -> Result<Nested<ProductMatch>, ResolveError> {
        let Nested::Group(nodes) = input else {
            return Err(ResolveError::InvalidShape);
        };
        let index = self.ensure_index(force_refresh)?;
        Ok(Nested::Group(
            nodes
                .iter()
                .map(|node| resolve_node(index, node, min_score))
                .collect(),
        ))
    }
}

fn resolve_node(
    index: &ProductIndex,
    node: &Nested<LineItemInput>,
    min_score: i32,
) -> Nested<ProductMatch> {
    match node {
        Nested::Leaf(item) => Nested::Leaf(index.match_item(item, min_score)),
        Nested::Group(nodes) => Nested::Group(
            nodes
                .iter()
                .map(|inner| resolve_node(index, inner, min_score))
                .collect(),
        ),
    }
}

/// Lenient price parse: empty or unparseable values are `None`, never errors.
pub(crate) fn parse_price(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse().ok()
}
