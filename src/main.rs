use std::fs;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;

use catalog_matcher::catalog::client::CrmClient;
use catalog_matcher::cli::{Cli, Command, FormatOpt};
use catalog_matcher::export::csv_export::{
    export_company_matches_csv, export_product_matches_csv,
};
use catalog_matcher::matching::product::IndexOptions;
use catalog_matcher::matching::{resolve_companies, ProductResolver};
use catalog_matcher::models::{CompanyInput, LineItemInput, MatchState, Nested};
use catalog_matcher::util::envfile::load_dotenv_if_present;

fn main() {
    let _ = load_dotenv_if_present();
    catalog_matcher::logging::init_tracing_from_env();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let cfg = cli.to_app_config()?;
    let client = CrmClient::from_config(&cfg.crm)?;

    match &cli.command {
        Command::Healthcheck => {
            client.healthcheck()?;
            info!("catalog reachable; credentials accepted");
        }
        Command::Companies {
            input,
            min_score,
            out,
            format,
        } => {
            let items: Vec<CompanyInput> = read_json(input)?;
            let started = Instant::now();
            let results = resolve_companies(&client, &items, *min_score)?;
            let found = results
                .iter()
                .filter(|r| r.state == MatchState::Found)
                .count();
            info!(
                "resolved {} compan{} in {:.2}s: {} found, {} not found",
                results.len(),
                if results.len() == 1 { "y" } else { "ies" },
                started.elapsed().as_secs_f64(),
                found,
                results.len() - found
            );
            match format {
                FormatOpt::Json => write_json_report(&results, *min_score, out.as_deref())?,
                FormatOpt::Csv => {
                    let path = out.as_deref().context("--out is required with --format csv")?;
                    export_company_matches_csv(&results, path)?;
                    info!("report written to {path}");
                }
            }
        }
        Command::Products {
            input,
            min_score,
            refresh,
            out,
            format,
        } => {
            let nested: Nested<LineItemInput> = read_json(input)?;
            let options = IndexOptions {
                max_pages: cfg.crm.max_pages,
                page_throttle_ms: cfg.crm.page_throttle_ms,
            };
            let mut resolver = ProductResolver::new(client, options);
            let started = Instant::now();
            let results = resolver.resolve(&nested, *min_score, *refresh)?;
            info!(
                "resolved {} line item(s) in {:.2}s",
                results.leaf_count(),
                started.elapsed().as_secs_f64()
            );
            match format {
                FormatOpt::Json => write_json_report(&results, *min_score, out.as_deref())?,
                FormatOpt::Csv => {
                    let path = out.as_deref().context("--out is required with --format csv")?;
                    export_product_matches_csv(&results, path)?;
                    info!("report written to {path}");
                }
            }
        }
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading input file {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing input file {path}"))
}

fn write_json_report<T: Serialize>(results: &T, min_score: i32, out: Option<&str>) -> Result<()> {
    let report = serde_json::json!({
        "run_at": chrono::Utc::now().to_rfc3339(),
        "min_score": min_score,
        "results": results,
    });
    let rendered = serde_json::to_string_pretty(&report)?;
    match out {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("writing report to {path}"))?;
            info!("report written to {path}");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
