//! Text canonicalization for matching.
//!
//! Three modes share one folding core (strip diacritics, lower-case, map
//! punctuation to spaces, collapse whitespace): company names drop the
//! near-universal pharmacy words, addresses rewrite French abbreviations to
//! canonical full words, product names keep hyphens and drop noise tokens.
//! No mode ever fails; empty or garbage input folds to an empty string.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Ordered address rewrite table. Rules apply in table order and are not
/// mutually exclusive: overlapping patterns may both fire on the same text.
const ADDRESS_REWRITES: &[(&str, &str)] = &[
    (r"\bav\b", "avenue"),
    (r"\bav\.\b", "avenue"),
    (r"\bar\b", "avenue"),
    (r"\br\b", "rue"),
    (r"\br\.\b", "rue"),
    (r"\bbd\b", "boulevard"),
    (r"\bctr?e?\b", "centre"),
    (r"\bctal?\b", "centre"),
    (r"\bctal?\.\b", "centre"),
    (r"\ball(ee|e|é)e?\b", "allee"),
    (r"\bste\b", "sainte"),
    (r"\bst\b", "saint"),
    ("centre cial", "centre commercial"),
    ("ctre cial", "centre commercial"),
    ("c cial", "centre commercial"),
];

/// Company-name stop-words: near-universal in this directory, zero signal.
const PHARMACY_WORDS: &str = r"\b(pharmacie|pharma|pharm|parapharmacie|para)\b";

/// Product-name noise: brand terms, generic packaging words, connectors.
const PRODUCT_NOISE: &[&str] = &[
    "naali", "gummies", "gummie", "gomme", "gommes", "gums", "gummys", "pilulier", "boite", "b",
    "x", "de", "du", "la", "le", "les", "des", "et", "vide", "pack",
];

fn address_rules() -> &'static Vec<(Regex, &'static str)> {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        ADDRESS_REWRITES
            .iter()
            .map(|(pat, rep)| (Regex::new(pat).expect("address rewrite pattern"), *rep))
            .collect()
    })
}

fn pharmacy_words() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PHARMACY_WORDS).expect("pharmacy stop-word pattern"))
}

/// Folding core: NFD-decompose, drop combining marks and any remaining
/// non-ASCII, lower-case, map punctuation to single spaces, trim.
fn fold_lower(input: &str, keep_hyphens: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.nfd() {
        if unicode_normalization::char::is_combining_mark(ch) {
            continue;
        }
        for lc in ch.to_lowercase() {
            if lc.is_ascii_alphanumeric() || lc == '_' || (keep_hyphens && lc == '-') {
                out.push(lc);
            } else if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
        }
    }
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out
}

fn squeeze(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Accent-stripped, lower-cased, punctuation-free text (company/address side).
pub fn fold_text(input: &str) -> String {
    fold_lower(input, false)
}

/// Same folding, hyphens preserved (product side, e.g. "citron-vert").
pub fn fold_text_hyphenated(input: &str) -> String {
    fold_lower(input, true)
}

/// Company-name mode: fold, then remove pharmacy stop-words.
pub fn normalize_company_name(input: &str) -> String {
    let folded = fold_text(input);
    squeeze(&pharmacy_words().replace_all(&folded, " "))
}

/// Address mode: fold, then apply the ordered abbreviation rewrite table.
pub fn normalize_address(input: &str) -> String {
    let mut s = fold_text(input);
    for (rule, replacement) in address_rules() {
        s = rule.replace_all(&s, *replacement).into_owned();
    }
    squeeze(&s)
}

/// Product-name mode: fold keeping hyphens, drop noise words and tokens of
/// length <= 2.
pub fn normalize_product_name(input: &str) -> String {
    fold_text_hyphenated(input)
        .split_whitespace()
        .filter(|w| w.len() > 2 && !PRODUCT_NOISE.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_strips_accents_and_punctuation() {
        assert_eq!(fold_text("Près de l'Église!"), "pres de l eglise");
        assert_eq!(fold_text("  Àé  îõ  "), "ae io");
        assert_eq!(fold_text(""), "");
    }

    #[test]
    fn fold_hyphenated_keeps_hyphens() {
        assert_eq!(fold_text_hyphenated("Citron-Vert x60"), "citron-vert x60");
        assert_eq!(fold_text("Citron-Vert"), "citron vert");
    }

    #[test]
    fn company_name_drops_pharmacy_words() {
        assert_eq!(normalize_company_name("Pharmacie de la Gare"), "de la gare");
        assert_eq!(normalize_company_name("PARAPHARMACIE Centrale"), "centrale");
        assert_eq!(normalize_company_name("Pharma"), "");
    }

    #[test]
    fn address_rewrites_abbreviations() {
        assert_eq!(normalize_address("10 av de la Gare"), "10 avenue de la gare");
        assert_eq!(normalize_address("3 bd Haussmann"), "3 boulevard haussmann");
        assert_eq!(normalize_address("r des Lilas"), "rue des lilas");
        assert_eq!(normalize_address("Place Ste Anne"), "place sainte anne");
    }

    #[test]
    fn address_rewrites_cascade_in_table_order() {
        // "ctre" -> "centre" first, then "centre cial" -> "centre commercial".
        assert_eq!(normalize_address("ctre cial Beaulieu"), "centre commercial beaulieu");
        assert_eq!(normalize_address("C CIAL du Port"), "centre commercial du port");
    }

    #[test]
    fn product_name_drops_noise_and_short_tokens() {
        assert_eq!(
            normalize_product_name("Naali Gummies Fraise x60"),
            "fraise x60"
        );
        assert_eq!(normalize_product_name("Pack de 3 UG"), "");
        assert_eq!(
            normalize_product_name("Trousse Citron-Vert"),
            "trousse citron-vert"
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "10 Av. du Général-Leclerc",
            "Pharmacie du Ctre Cial",
            "Gommies Fraise x60",
            "allée des Tilleuls",
            "",
        ];
        for s in samples {
            let a1 = normalize_address(s);
            assert_eq!(normalize_address(&a1), a1, "address mode on {s:?}");
            let n1 = normalize_company_name(s);
            assert_eq!(normalize_company_name(&n1), n1, "name mode on {s:?}");
            let p1 = normalize_product_name(s);
            assert_eq!(normalize_product_name(&p1), p1, "product mode on {s:?}");
        }
    }
}
