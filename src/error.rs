use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Errors raised by the external catalog (CRM) collaborators.
///
/// Rate-limit responses are retried inside the client and never surface as a
/// distinct variant; once the retry cap is exhausted they come back as
/// `Service` carrying the last response body.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog rejected credentials: {0}")]
    Unauthorized(String),
    #[error("catalog service error {status}: {body}")]
    Service { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected catalog response: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("product input must be a list of items or a list of lists")]
    InvalidShape,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
