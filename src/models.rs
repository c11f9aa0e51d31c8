use serde::{Deserialize, Serialize};

/// A company record extracted from a document. Empty strings mean "absent".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub postal_code: String,
}

/// A purchased product line item extracted from a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItemInput {
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub unit_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    Found,
    NotFound,
}

/// Client-relationship flag coerced from whatever raw form the catalog
/// stores. Unrecognized values pass through unchanged rather than being
/// silently dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFlag {
    Yes,
    No,
    Unrecognized(String),
}

impl ClientFlag {
    pub fn coerce(raw: &str) -> ClientFlag {
        match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "y" | "oui" => ClientFlag::Yes,
            "false" | "0" | "no" | "n" | "non" => ClientFlag::No,
            _ => ClientFlag::Unrecognized(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ClientFlag::Yes => "Oui",
            ClientFlag::No => "Non",
            ClientFlag::Unrecognized(raw) => raw,
        }
    }
}

impl std::fmt::Display for ClientFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ClientFlag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Per-signal contribution to a product candidate's score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub name_score: i32,
    pub price_bonus: i32,
    pub size_bonus: i32,
    pub aroma_bonus: i32,
    pub category_bonus: i32,
    pub ean_bonus: i32,
}

/// Resolution outcome for one company input.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyMatch {
    pub input: CompanyInput,
    #[serde(rename = "match")]
    pub state: MatchState,
    pub matched_id: Option<String>,
    pub matched_name: Option<String>,
    pub score: i32,
    pub method: Option<String>,
    pub known_client: Option<ClientFlag>,
}

/// Resolution outcome for one product line item.
#[derive(Debug, Clone, Serialize)]
pub struct ProductMatch {
    pub input: LineItemInput,
    #[serde(rename = "match")]
    pub state: MatchState,
    pub matched_id: Option<String>,
    pub matched_name: Option<String>,
    pub matched_price: Option<f64>,
    pub score: i32,
    pub method: Option<String>,
    pub details: ScoreBreakdown,
}

/// Arbitrarily nested list shape, preserved from input to output by the
/// product resolver. Deserialization treats a JSON array as a group and
/// anything else as a leaf.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Nested<T> {
    Group(Vec<Nested<T>>),
    Leaf(T),
}

impl<T> Nested<T> {
    pub fn leaf_count(&self) -> usize {
        match self {
            Nested::Leaf(_) => 1,
            Nested::Group(nodes) => nodes.iter().map(Nested::leaf_count).sum(),
        }
    }

    /// Depth-first leaves, left to right.
    pub fn leaves(&self) -> Vec<&T> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a T>) {
        match self {
            Nested::Leaf(item) => out.push(item),
            Nested::Group(nodes) => {
                for node in nodes {
                    node.collect_leaves(out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_flag_coercion() {
        assert_eq!(ClientFlag::coerce("Oui"), ClientFlag::Yes);
        assert_eq!(ClientFlag::coerce("1"), ClientFlag::Yes);
        assert_eq!(ClientFlag::coerce(" y "), ClientFlag::Yes);
        assert_eq!(ClientFlag::coerce("non"), ClientFlag::No);
        assert_eq!(ClientFlag::coerce("0"), ClientFlag::No);
        assert_eq!(
            ClientFlag::coerce("peut-etre"),
            ClientFlag::Unrecognized("peut-etre".into())
        );
    }

    #[test]
    fn client_flag_serializes_as_string() {
        let json = serde_json::to_string(&ClientFlag::Yes).unwrap();
        assert_eq!(json, "\"Oui\"");
        let json = serde_json::to_string(&ClientFlag::Unrecognized("42x".into())).unwrap();
        assert_eq!(json, "\"42x\"");
    }

    #[test]
    fn match_state_snake_case() {
        assert_eq!(serde_json::to_string(&MatchState::Found).unwrap(), "\"found\"");
        assert_eq!(
            serde_json::to_string(&MatchState::NotFound).unwrap(),
            "\"not_found\""
        );
    }

    #[test]
    fn nested_deserializes_lists_and_leaves() {
        let json = r#"[{"product_name":"a"},[{"product_name":"b"},[{"product_name":"c"}]]]"#;
        let nested: Nested<LineItemInput> = serde_json::from_str(json).unwrap();
        assert_eq!(nested.leaf_count(), 3);
        let names: Vec<&str> = nested
            .leaves()
            .iter()
            .map(|i| i.product_name.as_str())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn nested_top_level_object_is_a_leaf() {
        let nested: Nested<LineItemInput> =
            serde_json::from_str(r#"{"product_name":"solo"}"#).unwrap();
        assert!(matches!(nested, Nested::Leaf(_)));
    }

    #[test]
    fn nested_roundtrips_shape() {
        let json = r#"[[{"product_name":"a","unit_price":1.0}],[]]"#;
        let nested: Nested<LineItemInput> = serde_json::from_str(json).unwrap();
        let back = serde_json::to_value(&nested).unwrap();
        assert!(back.is_array());
        assert_eq!(back.as_array().unwrap().len(), 2);
        assert!(back[1].as_array().unwrap().is_empty());
    }
}
