//! Company resolution: progressive-fallback retrieval plus weighted scoring.
//!
//! Stages run in a fixed escalating order. The street-token and zip-only
//! stages only run while no candidate at all has been retrieved; the place
//! and name fallback stages also run while the running best is still below
//! the acceptance threshold. Every stage re-scores its candidates against
//! the original raw input (never against the filter token) and replaces the
//! running best only on a strictly higher score.

use crate::catalog::{CompanyRecord, CompanySearch, Filter, FilterGroup, COMPANY_PROPERTIES,
    PROP_ADDRESS, PROP_ADDRESS2, PROP_NAME, PROP_ZIP};
use crate::error::CatalogError;
use crate::features::{name_token, place_token, street_token};
use crate::models::{ClientFlag, CompanyInput, CompanyMatch, MatchState};
use crate::similarity::company_score;

pub const DEFAULT_COMPANY_MIN_SCORE: i32 = 70;

/// Result cap per search stage.
const SEARCH_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageTrigger {
    /// Run only while no stage has retrieved any candidate yet.
    WhileNoCandidate,
    /// Run while there is no candidate or the best is below the threshold.
    WhileBelowThreshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageToken {
    ZipOnly,
    Street,
    Place,
    CompanyName,
}

struct SearchStage {
    method: &'static str,
    trigger: StageTrigger,
    token: StageToken,
    property: Option<&'static str>,
}

/// The escalating retrieval chain, tightest filter first.
const STAGES: [SearchStage; 6] = [
    SearchStage {
        method: "zip+address_token",
        trigger: StageTrigger::WhileNoCandidate,
        token: StageToken::Street,
        property: Some(PROP_ADDRESS),
    },
    SearchStage {
        method: "zip+address2_token",
        trigger: StageTrigger::WhileNoCandidate,
        token: StageToken::Street,
        property: Some(PROP_ADDRESS2),
    },
    SearchStage {
        method: "zip_only",
        trigger: StageTrigger::WhileNoCandidate,
        token: StageToken::ZipOnly,
        property: None,
    },
    SearchStage {
        method: "zip+place_in_address",
        trigger: StageTrigger::WhileBelowThreshold,
        token: StageToken::Place,
        property: Some(PROP_ADDRESS),
    },
    SearchStage {
        method: "zip+place_in_address2",
        trigger: StageTrigger::WhileBelowThreshold,
        token: StageToken::Place,
        property: Some(PROP_ADDRESS2),
    },
    SearchStage {
        method: "zip+name_token",
        trigger: StageTrigger::WhileBelowThreshold,
        token: StageToken::CompanyName,
        property: Some(PROP_NAME),
    },
];

struct Scored {
    record: CompanyRecord,
    score: i32,
    method: &'static str,
}

/// Resolve each input against the company directory, preserving input order.
/// Service errors propagate; an empty candidate set is a normal `not_found`.
pub fn resolve_companies<S: CompanySearch>(
    catalog: &S,
    inputs: &[CompanyInput],
    min_score: i32,
) -> Result<Vec<CompanyMatch>, CatalogError> {
    inputs
        .iter()
        .map(|input| resolve_one(catalog, input, min_score))
        .collect()
}

fn resolve_one<S: CompanySearch>(
    catalog: &S,
    input: &CompanyInput,
    min_score: i32,
) -> Result<CompanyMatch, CatalogError> {
    let zip = input.postal_code.trim();
    let mut best: Option<Scored> = None;

    if !zip.is_empty() {
        let street = street_token(&input.address);
        let place = place_token(&input.address);
        let name = name_token(&input.name);

        for stage in &STAGES {
            let runnable = match stage.trigger {
                StageTrigger::WhileNoCandidate => best.is_none(),
                StageTrigger::WhileBelowThreshold => {
                    best.as_ref().map_or(true, |b| b.score < min_score)
                }
            };
            if !runnable {
                continue;
            }
            let token = match stage.token {
                StageToken::ZipOnly => "",
                StageToken::Street => street.as_str(),
                StageToken::Place => place.as_str(),
                StageToken::CompanyName => name.as_str(),
            };
            if stage.token != StageToken::ZipOnly && token.is_empty() {
                continue;
            }

            let mut filters = vec![Filter::eq(PROP_ZIP, zip)];
            if let Some(property) = stage.property {
                filters.push(Filter::contains_token(property, token));
            }
            let group = FilterGroup { filters };
            let candidates = catalog.search(&[group], &COMPANY_PROPERTIES, SEARCH_LIMIT)?;
            log::debug!(
                "stage {}: {} candidate(s) for zip {}",
                stage.method,
                candidates.len(),
                zip
            );

            if let Some(stage_best) = pick_best(input, candidates, stage.method) {
                if best.as_ref().map_or(true, |b| stage_best.score > b.score) {
                    best = Some(stage_best);
                }
            }
        }
    }

    Ok(to_match(input, best, min_score))
}

/// Score candidates against the raw input; highest wins, first seen on ties.
fn pick_best(
    input: &CompanyInput,
    candidates: Vec<CompanyRecord>,
    method: &'static str,
) -> Option<Scored> {
    let mut best: Option<Scored> = None;
    for record in candidates {
        let score = company_score(
            &input.name,
            &input.address,
            record.name.as_deref().unwrap_or(""),
            &record.full_address(),
        );
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(Scored {
                record,
                score,
                method,
            });
        }
    }
    best
}

fn to_match(input: &CompanyInput, best: Option<Scored>, min_score: i32) -> CompanyMatch {
    match best {
        Some(b) if b.score >= min_score => CompanyMatch {
            input: input.clone(),
            state: MatchState::Found,
            matched_id: Some(b.record.id.clone()),
            matched_name: Some(b.record.name.clone().unwrap_or_default()),
            score: b.score,
            method: Some(b.method.to_string()),
            known_client: b.record.known_client.as_deref().map(ClientFlag::coerce),
        },
        Some(b) => CompanyMatch {
            input: input.clone(),
            state: MatchState::NotFound,
            matched_id: None,
            matched_name: None,
            score: b.score,
            method: Some(b.method.to_string()),
            known_client: None,
        },
        None => CompanyMatch {
            input: input.clone(),
            state: MatchState::NotFound,
            matched_id: None,
            matched_name: None,
            score: 0,
            method: None,
            known_client: None,
        },
    }
}
