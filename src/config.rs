use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Connection settings for the external CRM catalog.
#[derive(Clone, Serialize, Deserialize)]
pub struct CrmConfig {
    pub access_token: String,
    pub base_url: String,
    /// Per-request timeout for search calls, seconds.
    pub request_timeout_secs: u64,
    /// Per-request timeout for paginated listing calls, seconds.
    pub listing_timeout_secs: u64,
    /// Retry cap for rate-limited calls (exponential backoff between attempts).
    pub retry_max: u32,
    /// Page size for the product listing endpoint.
    pub page_limit: u32,
    /// Result cap for company search queries.
    pub search_limit: u32,
    /// Pause between product listing pages, milliseconds.
    pub page_throttle_ms: u64,
    /// Optional cap on listing pages fetched when building the product index.
    pub max_pages: Option<u32>,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            base_url: String::new(),
            request_timeout_secs: 15,
            listing_timeout_secs: 20,
            retry_max: 4,
            page_limit: 100,
            search_limit: 100,
            page_throttle_ms: 50,
            max_pages: None,
        }
    }
}

impl std::fmt::Debug for CrmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrmConfig")
            .field("access_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("listing_timeout_secs", &self.listing_timeout_secs)
            .field("retry_max", &self.retry_max)
            .field("page_limit", &self.page_limit)
            .field("search_limit", &self.search_limit)
            .field("page_throttle_ms", &self.page_throttle_ms)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

impl CrmConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "crm.access_token",
            });
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "crm.base_url",
            });
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "crm.base_url",
                reason: format!("{} is not an http(s) URL", self.base_url),
            });
        }
        if self.retry_max == 0 {
            return Err(ConfigError::InvalidValue {
                field: "crm.retry_max",
                reason: "must be > 0".into(),
            });
        }
        if self.page_limit == 0 || self.search_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "crm.page_limit",
                reason: "page and search limits must be > 0".into(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct MatchingConfig {
    /// Acceptance threshold for company resolution.
    pub company_min_score: i32,
    /// Acceptance threshold for product resolution.
    pub product_min_score: i32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            company_min_score: 70,
            product_min_score: 78,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ExportConfig {
    pub out_path: Option<String>,
    pub format: Option<String>, // json|csv
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            out_path: None,
            format: Some("json".into()),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct AppConfig {
    pub crm: CrmConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.crm.validate()?;
        if self.matching.company_min_score < 0 {
            return Err(ConfigError::InvalidValue {
                field: "matching.company_min_score",
                reason: format!("{} is negative", self.matching.company_min_score),
            });
        }
        if self.matching.product_min_score < 0 {
            return Err(ConfigError::InvalidValue {
                field: "matching.product_min_score",
                reason: format!("{} is negative", self.matching.product_min_score),
            });
        }
        if let Some(ref fmt) = self.export.format {
            match fmt.as_str() {
                "json" | "csv" => {}
                other => {
                    return Err(ConfigError::InvalidValue {
                        field: "export.format",
                        reason: format!("unsupported: {}", other),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        AppConfig {
            crm: CrmConfig {
                access_token: "s3cret-value".into(),
                base_url: "https://crm.example.test/crm/v3".into(),
                ..CrmConfig::default()
            },
            ..AppConfig::default()
        }
    }

    #[test]
    fn accepts_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_missing_token() {
        let mut cfg = valid();
        cfg.crm.access_token = "  ".into();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MissingField { field: "crm.access_token" })
        ));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let mut cfg = valid();
        cfg.crm.base_url = "ftp://crm".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_unknown_export_format() {
        let mut cfg = valid();
        cfg.export.format = Some("xlsx".into());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = valid();
        let rendered = format!("{:?}", cfg.crm);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("s3cret-value"));
    }
}
