use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{AppConfig, CrmConfig, ExportConfig, MatchingConfig};
use crate::error::ConfigError;
use crate::matching::company::DEFAULT_COMPANY_MIN_SCORE;
use crate::matching::product::DEFAULT_PRODUCT_MIN_SCORE;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, ValueEnum, Debug)]
pub enum FormatOpt {
    Json,
    Csv,
}

impl FormatOpt {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl std::fmt::Display for FormatOpt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "catalog_matcher",
    version,
    about = "Company and product catalog matching (CLI)",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// CRM API base URL (env: CRM_BASE_URL)
    #[arg(long = "base-url", value_name = "URL", env = "CRM_BASE_URL")]
    pub base_url: String,
    /// CRM private-app bearer token (env: CRM_ACCESS_TOKEN)
    #[arg(
        long = "token",
        value_name = "TOKEN",
        env = "CRM_ACCESS_TOKEN",
        hide_env_values = true
    )]
    pub token: String,
    /// Per-request timeout in seconds for search calls
    #[arg(long = "timeout-secs", value_name = "SECS", default_value_t = 15)]
    pub timeout_secs: u64,
    /// Retry cap for rate-limited calls
    #[arg(long = "retry-max", value_name = "N", default_value_t = 4)]
    pub retry_max: u32,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve company records against the CRM company directory
    Companies {
        /// Input JSON file: array of {name, address, postal_code}
        #[arg(long, value_name = "PATH")]
        input: String,
        /// Acceptance threshold
        #[arg(long = "min-score", value_name = "SCORE", default_value_t = DEFAULT_COMPANY_MIN_SCORE)]
        min_score: i32,
        /// Report path (stdout when omitted)
        #[arg(long, value_name = "PATH")]
        out: Option<String>,
        /// Report format
        #[arg(long, value_enum, default_value_t = FormatOpt::Json)]
        format: FormatOpt,
    },
    /// Resolve product line items against the CRM product catalog
    Products {
        /// Input JSON file: array (possibly nested) of {product_name, unit_price}
        #[arg(long, value_name = "PATH")]
        input: String,
        /// Acceptance threshold
        #[arg(long = "min-score", value_name = "SCORE", default_value_t = DEFAULT_PRODUCT_MIN_SCORE)]
        min_score: i32,
        /// Force a product index rebuild before resolving
        #[arg(long)]
        refresh: bool,
        /// Report path (stdout when omitted)
        #[arg(long, value_name = "PATH")]
        out: Option<String>,
        /// Report format
        #[arg(long, value_enum, default_value_t = FormatOpt::Json)]
        format: FormatOpt,
    },
    /// Verify CRM connectivity and credentials
    Healthcheck,
}

impl Cli {
    pub fn to_app_config(&self) -> Result<AppConfig, ConfigError> {
        let mut matching = MatchingConfig::default();
        let mut export = ExportConfig::default();
        match &self.command {
            Command::Companies {
                min_score,
                out,
                format,
                ..
            } => {
                matching.company_min_score = *min_score;
                export.out_path = out.clone();
                export.format = Some(format.as_str().into());
            }
            Command::Products {
                min_score,
                out,
                format,
                ..
            } => {
                matching.product_min_score = *min_score;
                export.out_path = out.clone();
                export.format = Some(format.as_str().into());
            }
            Command::Healthcheck => {}
        }
        let cfg = AppConfig {
            crm: CrmConfig {
                access_token: self.token.clone(),
                base_url: self.base_url.clone(),
                request_timeout_secs: self.timeout_secs,
                retry_max: self.retry_max,
                ..CrmConfig::default()
            },
            matching,
            export,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn parses_companies_subcommand() {
        let cli = parse(&[
            "catalog_matcher",
            "--base-url",
            "https://crm.example.test/crm/v3",
            "--token",
            "tok",
            "companies",
            "--input",
            "items.json",
            "--min-score",
            "80",
        ]);
        let cfg = cli.to_app_config().unwrap();
        assert_eq!(cfg.matching.company_min_score, 80);
        assert_eq!(cfg.crm.retry_max, 4);
        match cli.command {
            Command::Companies { input, format, .. } => {
                assert_eq!(input, "items.json");
                assert_eq!(format, FormatOpt::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn products_defaults_to_78() {
        let cli = parse(&[
            "catalog_matcher",
            "--base-url",
            "https://crm.example.test/crm/v3",
            "--token",
            "tok",
            "products",
            "--input",
            "items.json",
            "--format",
            "csv",
        ]);
        let cfg = cli.to_app_config().unwrap();
        assert_eq!(cfg.matching.product_min_score, 78);
        assert_eq!(cfg.export.format.as_deref(), Some("csv"));
    }

    #[test]
    fn rejects_empty_token() {
        let cli = parse(&[
            "catalog_matcher",
            "--base-url",
            "https://crm.example.test/crm/v3",
            "--token",
            " ",
            "healthcheck",
        ]);
        assert!(cli.to_app_config().is_err());
    }
}
