//! Token-set similarity and candidate scoring.
//!
//! `token_set_ratio` compares two strings as word sets, order-independent and
//! duplicate-insensitive, on a 0..=100 scale. The combiners turn it into one
//! ranking score per candidate: a weighted address/name blend for companies,
//! a name score plus independently gated bonuses for products. Acceptance is
//! purely threshold-based; product scores may exceed 100 or go negative.

use std::collections::BTreeSet;

use strsim::normalized_levenshtein;

use crate::features::ProductSignals;
use crate::models::ScoreBreakdown;
use crate::normalize::{normalize_address, normalize_company_name};

/// Company score weights: the address carries most of the signal.
const ADDRESS_WEIGHT: f64 = 0.7;
const NAME_WEIGHT: f64 = 0.3;

fn pct(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b)
}

fn joined(base: &str, rest: &[&str]) -> String {
    if rest.is_empty() {
        base.to_string()
    } else if base.is_empty() {
        rest.join(" ")
    } else {
        format!("{} {}", base, rest.join(" "))
    }
}

/// Symmetric token-set overlap ratio in 0..=100. A string whose word set is
/// contained in the other's scores 100; either side empty scores 0.
pub fn token_set_ratio(a: &str, b: &str) -> i32 {
    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0;
    }
    let inter: Vec<&str> = set_a.intersection(&set_b).copied().collect();
    let only_a: Vec<&str> = set_a.difference(&set_b).copied().collect();
    let only_b: Vec<&str> = set_b.difference(&set_a).copied().collect();

    let base = inter.join(" ");
    let combined_a = joined(&base, &only_a);
    let combined_b = joined(&base, &only_b);

    let best = pct(&base, &combined_a)
        .max(pct(&base, &combined_b))
        .max(pct(&combined_a, &combined_b));
    (best * 100.0).round() as i32
}

/// Company candidate score: weighted blend of address and name similarity.
/// An absent name on either side contributes 0 rather than leaning on the
/// similarity function's empty-string behavior.
pub fn company_score(
    input_name: &str,
    input_address: &str,
    cand_name: &str,
    cand_address: &str,
) -> i32 {
    let addr_in = normalize_address(input_address);
    let addr_cand = normalize_address(cand_address);
    let name_in = normalize_company_name(input_name);
    let name_cand = normalize_company_name(cand_name);

    let addr_sim = token_set_ratio(&addr_in, &addr_cand) as f64;
    let name_sim = if name_in.is_empty() || name_cand.is_empty() {
        0.0
    } else {
        token_set_ratio(&name_in, &name_cand) as f64
    };
    (ADDRESS_WEIGHT * addr_sim + NAME_WEIGHT * name_sim).round() as i32
}

fn price_bonus(input: Option<f64>, cand: Option<f64>) -> i32 {
    match (input, cand) {
        (Some(p_in), Some(p_cand)) if p_in > 0.0 && p_cand != 0.0 => {
            let rel = (p_cand - p_in).abs() / p_in.max(1e-6);
            if rel <= 0.01 {
                12
            } else if rel <= 0.03 {
                9
            } else if rel <= 0.07 {
                6
            } else if rel <= 0.12 {
                3
            } else {
                0
            }
        }
        _ => {
            let input_zero = input == Some(0.0);
            let input_positive = input.is_some_and(|p| p > 0.0);
            let cand_positive = cand.is_some_and(|p| p > 0.0);
            // A candidate with no parseable price counts as zero here; an
            // absent input price never penalizes.
            if (input_zero && cand_positive) || (input_positive && !cand_positive) {
                -3
            } else {
                0
            }
        }
    }
}

/// Product candidate score: fuzzy name similarity plus additive bonuses from
/// price proximity, size, aroma, category and EAN overlap.
pub fn product_score(input: &ProductSignals, cand: &ProductSignals) -> (i32, ScoreBreakdown) {
    let mut details = ScoreBreakdown {
        name_score: token_set_ratio(&input.norm_name, &cand.norm_name),
        ..ScoreBreakdown::default()
    };

    details.price_bonus = price_bonus(input.price, cand.price);

    if let (Some(size_in), Some(size_cand)) = (input.size, cand.size) {
        if size_in != 0 && size_in == size_cand {
            details.size_bonus = 6;
        }
    }

    if input.aromas.intersection(&cand.aromas).next().is_some() {
        details.aroma_bonus = 6;
    }

    let common_cats: BTreeSet<&str> = input
        .categories
        .intersection(&cand.categories)
        .copied()
        .collect();
    if !common_cats.is_empty() {
        details.category_bonus = if common_cats.contains("ug") || common_cats.contains("presentoir")
        {
            8
        } else {
            5
        };
    }

    if input.eans.intersection(&cand.eans).next().is_some() {
        // A shared EAN-13 is a near-certain identity signal.
        details.ean_bonus = 20;
    }

    let total = details.name_score
        + details.price_bonus
        + details.size_bonus
        + details.aroma_bonus
        + details.category_bonus
        + details.ean_bonus;
    (total, details)
}
