//! CSV export of match results.
//!
//! Company results map one row per input. Product results are flattened
//! depth-first with a positional `path` column ("1.0.2") so nested shapes
//! stay reconstructable from the flat file.

use std::fs::File;
use std::io::BufWriter;

use anyhow::Result;
use csv::{Writer, WriterBuilder};

use crate::models::{CompanyMatch, MatchState, Nested, ProductMatch};

fn state_label(state: MatchState) -> &'static str {
    match state {
        MatchState::Found => "found",
        MatchState::NotFound => "not_found",
    }
}

pub fn export_company_matches_csv(results: &[CompanyMatch], path: &str) -> Result<()> {
    let file = File::create(path)?;
    let mut w = WriterBuilder::new().from_writer(BufWriter::new(file));
    w.write_record([
        "input_name",
        "input_address",
        "input_postal_code",
        "match",
        "matched_id",
        "matched_name",
        "score",
        "method",
        "known_client",
    ])?;
    for r in results {
        let row = vec![
            r.input.name.clone(),
            r.input.address.clone(),
            r.input.postal_code.clone(),
            state_label(r.state).to_string(),
            r.matched_id.clone().unwrap_or_default(),
            r.matched_name.clone().unwrap_or_default(),
            r.score.to_string(),
            r.method.clone().unwrap_or_default(),
            r.known_client
                .as_ref()
                .map(|f| f.as_str().to_string())
                .unwrap_or_default(),
        ];
        w.write_record(&row)?;
    }
    w.flush()?;
    Ok(())
}

pub fn export_product_matches_csv(results: &Nested<ProductMatch>, path: &str) -> Result<()> {
    let file = File::create(path)?;
    let mut w = WriterBuilder::new().from_writer(BufWriter::new(file));
    w.write_record([
        "path",
        "input_product_name",
        "input_unit_price",
        "match",
        "matched_id",
        "matched_name",
        "matched_price",
        "score",
        "method",
        "name_score",
        "price_bonus",
        "size_bonus",
        "aroma_bonus",
        "category_bonus",
        "ean_bonus",
    ])?;
    for (path_label, r) in flatten_with_paths(results) {
        write_product_row(&mut w, &path_label, r)?;
    }
    w.flush()?;
    Ok(())
}

fn write_product_row<W: std::io::Write>(
    w: &mut Writer<W>,
    path_label: &str,
    r: &ProductMatch,
) -> Result<()> {
    let row = vec![
        path_label.to_string(),
        r.input.product_name.clone(),
        r.input.unit_price.map(|p| p.to_string()).unwrap_or_default(),
        state_label(r.state).to_string(),
        r.matched_id.clone().unwrap_or_default(),
        r.matched_name.clone().unwrap_or_default(),
        r.matched_price.map(|p| p.to_string()).unwrap_or_default(),
        r.score.to_string(),
        r.method.clone().unwrap_or_default(),
        r.details.name_score.to_string(),
        r.details.price_bonus.to_string(),
        r.details.size_bonus.to_string(),
        r.details.aroma_bonus.to_string(),
        r.details.category_bonus.to_string(),
        r.details.ean_bonus.to_string(),
    ];
    w.write_record(&row)?;
    Ok(())
}

/// Depth-first leaves with their positional paths, e.g. "0", "1.0", "1.1.2".
pub fn flatten_with_paths(node: &Nested<ProductMatch>) -> Vec<(String, &ProductMatch)> {
    let mut out = Vec::new();
    match node {
        Nested::Leaf(item) => out.push((String::new(), item)),
        Nested::Group(nodes) => {
            for (i, inner) in nodes.iter().enumerate() {
                collect(inner, i.to_string(), &mut out);
            }
        }
    }
    out
}

fn collect<'a>(
    node: &'a Nested<ProductMatch>,
    prefix: String,
    out: &mut Vec<(String, &'a ProductMatch)>,
) {
    match node {
        Nested::Leaf(item) => out.push((prefix, item)),
        Nested::Group(nodes) => {
            for (i, inner) in nodes.iter().enumerate() {
                collect(inner, format!("{prefix}.{i}"), out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompanyInput, LineItemInput, ScoreBreakdown};

    fn product_match(name: &str, state: MatchState) -> ProductMatch {
        ProductMatch {
            input: LineItemInput {
                product_name: name.into(),
                unit_price: Some(9.9),
            },
            state,
            matched_id: Some("1".into()),
            matched_name: Some("Gummies".into()),
            matched_price: Some(9.95),
            score: 100,
            method: Some("fuzzy+signals".into()),
            details: ScoreBreakdown::default(),
        }
    }

    #[test]
    fn flatten_paths_follow_positions() {
        let nested = Nested::Group(vec![
            Nested::Leaf(product_match("a", MatchState::Found)),
            Nested::Group(vec![
                Nested::Leaf(product_match("b", MatchState::Found)),
                Nested::Group(vec![Nested::Leaf(product_match("c", MatchState::NotFound))]),
            ]),
        ]);
        let flat = flatten_with_paths(&nested);
        let paths: Vec<&str> = flat.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, ["0", "1.0", "1.1.0"]);
        assert_eq!(flat[2].1.input.product_name, "c");
    }

    #[test]
    fn company_csv_smoke() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("companies.csv");
        let results = [CompanyMatch {
            input: CompanyInput {
                name: "Pharmacie, du Centre".into(),
                address: "10 Rue Porte Baron".into(),
                postal_code: "21000".into(),
            },
            state: MatchState::Found,
            matched_id: Some("512".into()),
            matched_name: Some("Pharmacie Centre Dijon".into()),
            score: 90,
            method: Some("zip+address_token".into()),
            known_client: None,
        }];
        export_company_matches_csv(&results, path.to_str().unwrap()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("input_name,"));
        // Comma inside the name stays quoted, one data row.
        assert!(text.contains("\"Pharmacie, du Centre\""));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn product_csv_flattens_nested_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");
        let nested = Nested::Group(vec![Nested::Group(vec![Nested::Leaf(product_match(
            "Gommies",
            MatchState::Found,
        ))])]);
        export_product_matches_csv(&nested, path.to_str().unwrap()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.lines().nth(1).unwrap().starts_with("0.0,Gommies"));
    }
}
