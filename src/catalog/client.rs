//! Blocking CRM catalog client.
//!
//! One reqwest blocking client, bearer auth, fixed per-request timeouts.
//! Rate-limited calls (429) retry with capped exponential backoff; 401 fails
//! the call immediately; any other non-success status is a service error.

use std::thread;
use std::time::Duration;

use serde_json::Value;

use crate::catalog::{CompanyRecord, CompanySearch, FilterGroup, ProductListing, ProductPage,
    ProductRecord};
use crate::config::CrmConfig;
use crate::error::{CatalogError, ConfigError};

pub struct CrmClient {
    search_http: reqwest::blocking::Client,
    listing_http: reqwest::blocking::Client,
    base_url: String,
    token: String,
    retry_max: u32,
    page_limit: u32,
}

impl CrmClient {
    /// Build a client from validated configuration. Fails fast when the
    /// bearer credential is absent.
    pub fn from_config(cfg: &CrmConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let search_http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "crm.request_timeout_secs",
                reason: e.to_string(),
            })?;
        let listing_http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(cfg.listing_timeout_secs))
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "crm.listing_timeout_secs",
                reason: e.to_string(),
            })?;
        Ok(Self {
            search_http,
            listing_http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            token: cfg.access_token.trim().to_string(),
            retry_max: cfg.retry_max,
            page_limit: cfg.page_limit,
        })
    }

    /// Cheap authenticated call to confirm the catalog is reachable and the
    /// credential is accepted.
    pub fn healthcheck(&self) -> Result<(), CatalogError> {
        let url = format!("{}/objects/companies", self.base_url);
        let resp = self.send_with_retry(|| {
            self.search_http
                .get(&url)
                .query(&[("limit", "1"), ("properties", "name")])
        })?;
        let _ = resp.text();
        Ok(())
    }

    /// Send a request, retrying on 429 with exponential backoff up to the
    /// configured cap, after which the last rate-limit response is reported
    /// as a generic service error.
    fn send_with_retry<F>(&self, build: F) -> Result<reqwest::blocking::Response, CatalogError>
    where
        F: Fn() -> reqwest::blocking::RequestBuilder,
    {
        let mut last_body = String::new();
        for attempt in 0..self.retry_max {
            let resp = build()
                .bearer_auth(&self.token)
                .send()
                .map_err(|e| CatalogError::Network(e.to_string()))?;
            let status = resp.status().as_u16();
            if status == 429 {
                last_body = resp.text().unwrap_or_default();
                let delay = Duration::from_secs(1u64 << attempt.min(6));
                log::warn!(
                    "catalog rate limited (attempt {}/{}), backing off {:?}",
                    attempt + 1,
                    self.retry_max,
                    delay
                );
                thread::sleep(delay);
                continue;
            }
            if status == 401 {
                return Err(CatalogError::Unauthorized(resp.text().unwrap_or_default()));
            }
            if !(200..300).contains(&status) {
                return Err(CatalogError::Service {
                    status,
                    body: resp.text().unwrap_or_default(),
                });
            }
            return Ok(resp);
        }
        Err(CatalogError::Service {
            status: 429,
            body: last_body,
        })
    }
}

impl CompanySearch for CrmClient {
    fn search(
        &self,
        groups: &[FilterGroup],
        properties: &[&str],
        limit: u32,
    ) -> Result<Vec<CompanyRecord>, CatalogError> {
        let url = format!("{}/objects/companies/search", self.base_url);
        let payload = serde_json::json!({
            "filterGroups": groups,
            "properties": properties,
            "limit": limit,
        });
        let resp = self.send_with_retry(|| self.search_http.post(&url).json(&payload))?;
        let body: Value = resp
            .json()
            .map_err(|e| CatalogError::Parse(e.to_string()))?;
        Ok(companies_from_response(&body))
    }
}

impl ProductListing for CrmClient {
    fn list_page(
        &self,
        properties: &[&str],
        after: Option<&str>,
    ) -> Result<ProductPage, CatalogError> {
        let url = format!("{}/objects/products", self.base_url);
        let limit = self.page_limit.to_string();
        let props = properties.join(",");
        let resp = self.send_with_retry(|| {
            let mut req = self.listing_http.get(&url).query(&[
                ("limit", limit.as_str()),
                ("properties", props.as_str()),
                ("archived", "false"),
            ]);
            if let Some(after) = after {
                req = req.query(&[("after", after)]);
            }
            req
        })?;
        let body: Value = resp
            .json()
            .map_err(|e| CatalogError::Parse(e.to_string()))?;
        Ok(product_page_from_response(&body))
    }
}

fn prop_str(props: &Value, key: &str) -> Option<String> {
    props.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Entry ids arrive as strings or numbers depending on the portal; accept
/// both.
fn entry_id(entry: &Value) -> Option<String> {
    let id = entry.get("id")?;
    id.as_str()
        .map(str::to_string)
        .or_else(|| id.as_i64().map(|n| n.to_string()))
}

fn companies_from_response(body: &Value) -> Vec<CompanyRecord> {
    body.get("results")
        .and_then(Value::as_array)
        .map(|results| results.iter().filter_map(company_from_value).collect())
        .unwrap_or_default()
}

fn company_from_value(entry: &Value) -> Option<CompanyRecord> {
    let id = entry_id(entry)?;
    let props = entry.get("properties").cloned().unwrap_or(Value::Null);
    Some(CompanyRecord {
        id,
        name: prop_str(&props, "name"),
        address: prop_str(&props, "address"),
        address2: prop_str(&props, "address2"),
        postal_code: prop_str(&props, "zip"),
        known_client: prop_str(&props, "known_client"),
    })
}

fn product_page_from_response(body: &Value) -> ProductPage {
    let records = body
        .get("results")
        .and_then(Value::as_array)
        .map(|results| results.iter().filter_map(product_from_value).collect())
        .unwrap_or_default();
    let next_after = body
        .get("paging")
        .and_then(|p| p.get("next"))
        .and_then(|n| n.get("after"))
        .and_then(Value::as_str)
        .map(str::to_string);
    ProductPage {
        records,
        next_after,
    }
}

fn product_from_value(entry: &Value) -> Option<ProductRecord> {
    let id = entry_id(entry)?;
    let props = entry.get("properties").cloned().unwrap_or(Value::Null);
    Some(ProductRecord {
        id,
        name: prop_str(&props, "name"),
        price: prop_str(&props, "price"),
        sku: prop_str(&props, "sku"),
        internal_code: prop_str(&props, "internal_code"),
        description: prop_str(&props, "description"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_company_search_response() {
        let body = serde_json::json!({
            "results": [
                {
                    "id": "512",
                    "properties": {
                        "name": "Pharmacie Centre Dijon",
                        "address": "10 Rue Porte Baron",
                        "zip": "21000",
                        "known_client": "true"
                    }
                },
                {"properties": {"name": "missing id, skipped"}}
            ]
        });
        let records = companies_from_response(&body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "512");
        assert_eq!(records[0].name.as_deref(), Some("Pharmacie Centre Dijon"));
        assert_eq!(records[0].address2, None);
        assert_eq!(records[0].known_client.as_deref(), Some("true"));
    }

    #[test]
    fn accepts_numeric_entry_ids() {
        let body = serde_json::json!({"results": [{"id": 512, "properties": {"name": "A"}}]});
        let records = companies_from_response(&body);
        assert_eq!(records[0].id, "512");
    }

    #[test]
    fn empty_results_is_empty_not_error() {
        let records = companies_from_response(&serde_json::json!({"results": []}));
        assert!(records.is_empty());
        let records = companies_from_response(&serde_json::json!({}));
        assert!(records.is_empty());
    }

    #[test]
    fn parses_product_page_and_cursor() {
        let body = serde_json::json!({
            "results": [
                {
                    "id": "9001",
                    "properties": {
                        "name": "Gummies Fraise x60",
                        "price": "9.95",
                        "description": "EAN 3701234567890"
                    }
                }
            ],
            "paging": {"next": {"after": "9002"}}
        });
        let page = product_page_from_response(&body);
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].price.as_deref(), Some("9.95"));
        assert_eq!(page.next_after.as_deref(), Some("9002"));
    }

    #[test]
    fn last_page_has_no_cursor() {
        let page = product_page_from_response(&serde_json::json!({"results": []}));
        assert!(page.records.is_empty());
        assert!(page.next_after.is_none());
    }
}
