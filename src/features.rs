//! Structured signals pulled out of free text: street and place tokens for
//! server-side filtering, name fragments, size markers, aroma/category tags
//! and EAN-13-shaped codes for scoring. Every extractor is total: malformed
//! input yields an empty token, set or `None`, never an error.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::normalize::{
    fold_text, fold_text_hyphenated, normalize_address, normalize_company_name,
    normalize_product_name,
};

/// Street-type words excluded from the street token: they name the way, not
/// the place.
const STREET_STOP: &[&str] = &[
    "rue", "avenue", "boulevard", "allee", "impasse", "chemin", "route", "place", "square", "quai",
    "cours", "centre", "commercial", "ctre",
];

/// Mall / big-box-retailer gazetteer, in folded form (the scanned text is
/// folded first, so only folded spellings can ever match).
const MALL_KEYWORDS: &[&str] = &[
    "auchan",
    "beausejour",
    "beausejours",
    "c cial",
    "carrefour",
    "cc",
    "centre cial",
    "centre commercial",
    "cora",
    "ctre cial",
    "geant",
    "geant casino",
    "grand littoral",
    "leclerc",
    "rivoli",
    "rives d arcins",
    "val d europe",
];

const AROMA_VOCAB: &[&str] = &["fraise", "orange", "citron", "citron-vert", "menthe"];

const CATEGORY_VOCAB: &[&str] = &[
    "ug", "plv", "presentoir", "sachet", "echantillon", "pack", "trousse", "carte", "panneau",
    "stop", "meuble",
];

fn size_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "x42", "x 60"
    RE.get_or_init(|| Regex::new(r"\bx\s?(\d{1,3})\b").expect("size pattern"))
}

fn ean_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{13})\b").expect("ean pattern"))
}

/// Street token: leading house number (if any) plus up to 3 subsequent
/// significant words. "10 Rue Porte Baron" -> "10 porte baron". Cheap and
/// highly selective as a server-side CONTAINS_TOKEN filter value.
pub fn street_token(address: &str) -> String {
    let norm = normalize_address(address);
    let words: Vec<&str> = norm.split_whitespace().collect();
    let Some(first) = words.first() else {
        return String::new();
    };
    let num = if first.bytes().all(|b| b.is_ascii_digit()) {
        Some(*first)
    } else {
        None
    };
    let tail = if num.is_some() { &words[1..] } else { &words[..] };
    let mut parts: Vec<&str> = Vec::with_capacity(4);
    parts.extend(num);
    parts.extend(
        tail.iter()
            .copied()
            .filter(|w| w.len() > 2 && !STREET_STOP.contains(w))
            .take(3),
    );
    parts.join(" ")
}

/// Place token: sorted, space-joined gazetteer hits found as substrings of
/// the folded text, truncated to 60 characters. Empty when nothing hits.
pub fn place_token(text: &str) -> String {
    let folded = fold_text(text);
    let hits: BTreeSet<&str> = MALL_KEYWORDS
        .iter()
        .copied()
        .filter(|k| folded.contains(k))
        .collect();
    hits.into_iter()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(60)
        .collect()
}

/// Name token: first 4 significant words of the normalized company name.
pub fn name_token(name: &str) -> String {
    normalize_company_name(name)
        .split_whitespace()
        .filter(|w| w.len() > 2)
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Size token: first integer following an "x" marker ("x42" -> 42).
pub fn size_token(text: &str) -> Option<u32> {
    size_re()
        .captures(&fold_text_hyphenated(text))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Aroma tags found as substrings of the folded text. The two-word form
/// "citron vert" counts as the hyphenated tag.
pub fn aroma_tags(text: &str) -> BTreeSet<&'static str> {
    let folded = fold_text_hyphenated(text);
    let mut hits: BTreeSet<&'static str> = AROMA_VOCAB
        .iter()
        .copied()
        .filter(|a| folded.contains(a))
        .collect();
    if folded.contains("citron vert") {
        hits.insert("citron-vert");
    }
    hits
}

/// Category tags found as substrings of the folded text. Accented spellings
/// collapse onto the folded vocabulary ("présentoir" -> "presentoir").
pub fn category_tags(text: &str) -> BTreeSet<&'static str> {
    let folded = fold_text_hyphenated(text);
    CATEGORY_VOCAB
        .iter()
        .copied()
        .filter(|c| folded.contains(c))
        .collect()
}

/// All 13-consecutive-digit substrings (EAN-13 shape), unvalidated.
pub fn ean_codes(text: &str) -> BTreeSet<String> {
    ean_re()
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

/// Pre-extracted scoring signals for one product-shaped text, shared by
/// catalog entries and input line items (an input has no description).
#[derive(Debug, Clone, Default)]
pub struct ProductSignals {
    pub norm_name: String,
    pub price: Option<f64>,
    pub size: Option<u32>,
    pub aromas: BTreeSet<&'static str>,
    pub categories: BTreeSet<&'static str>,
    pub eans: BTreeSet<String>,
}

impl ProductSignals {
    pub fn extract(name: &str, description: &str, price: Option<f64>) -> Self {
        let mut categories = category_tags(name);
        categories.extend(category_tags(description));
        let mut eans = ean_codes(name);
        eans.extend(ean_codes(description));
        Self {
            norm_name: normalize_product_name(name),
            price,
            size: size_token(name),
            aromas: aroma_tags(name),
            categories,
            eans,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn street_token_number_and_core_words() {
        assert_eq!(street_token("10 Rue Porte Baron"), "10 porte baron");
        assert_eq!(street_token("Av. du Général Leclerc"), "general leclerc");
        assert_eq!(street_token(""), "");
    }

    #[test]
    fn street_token_caps_core_at_three_words() {
        assert_eq!(
            street_token("12 rue des Quatre Vents Nouveaux Prolongée"),
            "12 des quatre vents"
        );
    }

    #[test]
    fn street_token_skips_street_type_words() {
        assert_eq!(
            street_token("5 Boulevard du Centre Commercial Grand Large"),
            "5 grand large"
        );
    }

    #[test]
    fn place_token_sorted_hits() {
        assert_eq!(
            place_token("Centre Commercial Carrefour Beauséjour"),
            "beausejour carrefour centre commercial"
        );
        assert_eq!(place_token("12 rue des Lilas"), "");
    }

    #[test]
    fn place_token_truncates_to_sixty_chars() {
        let t = place_token("cc cora auchan carrefour geant casino leclerc grand littoral rivoli");
        assert!(t.chars().count() <= 60);
        assert!(t.starts_with("auchan"));
    }

    #[test]
    fn name_token_first_four_significant_words() {
        assert_eq!(
            name_token("Pharmacie du Grand Marché des Trois Fontaines Réunies"),
            "grand marche des trois"
        );
        assert_eq!(name_token("Pharma"), "");
    }

    #[test]
    fn size_token_reads_x_marker() {
        assert_eq!(size_token("Gommies Fraise x60"), Some(60));
        assert_eq!(size_token("boite x 42 grand format"), Some(42));
        assert_eq!(size_token("Gommies Fraise"), None);
    }

    #[test]
    fn aroma_tags_two_word_citron_vert() {
        let tags = aroma_tags("Gommies Citron Vert x30");
        assert!(tags.contains("citron"));
        assert!(tags.contains("citron-vert"));
        let tags = aroma_tags("Trousse Menthe");
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), ["menthe"]);
    }

    #[test]
    fn category_tags_fold_accented_spellings() {
        let tags = category_tags("Présentoir comptoir + échantillons");
        assert!(tags.contains("presentoir"));
        assert!(tags.contains("echantillon"));
        assert!(!tags.contains("ug"));
    }

    #[test]
    fn ean_codes_extract_thirteen_digit_runs() {
        let codes = ean_codes("EAN 3701234567890 / ref 123456");
        assert_eq!(codes.into_iter().collect::<Vec<_>>(), ["3701234567890"]);
        assert!(ean_codes("12 digits: 123456789012").is_empty());
    }

    #[test]
    fn product_signals_merge_name_and_description() {
        let sig = ProductSignals::extract(
            "Gummies Fraise x60",
            "Carton PLV / EAN 3701234567890",
            Some(9.9),
        );
        assert_eq!(sig.norm_name, "fraise x60");
        assert_eq!(sig.size, Some(60));
        assert!(sig.aromas.contains("fraise"));
        assert!(sig.categories.contains("plv"));
        assert!(sig.eans.contains("3701234567890"));
    }
}
