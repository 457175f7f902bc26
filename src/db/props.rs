//! Page and property types for the document store.
//!
//! Every record the portal touches is a page whose fields are polymorphic
//! typed property values. [`extract`] is the single choke point translating
//! those values into application scalars; absence is silently normalized to
//! the type's zero value, never an error. The unassigned-team sentinel is the
//! empty string this fallback produces, so every caller depends on it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Property map of a page, keyed by property name.
pub type Properties = BTreeMap<String, Property>;

/// A single record in the document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub created_time: String,
    #[serde(default)]
    pub last_edited_time: String,
    #[serde(default)]
    pub properties: Properties,
}

impl Page {
    pub fn prop(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Extract a property as text (`""` when absent).
    pub fn text(&self, name: &str) -> String {
        extract(self.prop(name)).into_text()
    }

    /// Extract a property as a number (`0` when absent).
    pub fn number(&self, name: &str) -> f64 {
        extract(self.prop(name)).into_number()
    }

    /// Extract a property as a boolean (`false` when absent).
    pub fn boolean(&self, name: &str) -> bool {
        extract(self.prop(name)).into_bool()
    }
}

/// One span of rich text. Writes fill both `plain_text` and `text` so the
/// value reads back identically from the live store and the test store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RichTextSpan {
    #[serde(default)]
    pub plain_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateValue {
    pub start: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRef {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormulaResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RollupValue {
    #[serde(default)]
    pub array: Vec<Property>,
}

/// A polymorphic property value, discriminated by its declared type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Property {
    Title { title: Vec<RichTextSpan> },
    RichText { rich_text: Vec<RichTextSpan> },
    Email { email: Option<String> },
    PhoneNumber { phone_number: Option<String> },
    Url { url: Option<String> },
    Number { number: Option<f64> },
    Select { select: Option<SelectOption> },
    MultiSelect { multi_select: Vec<SelectOption> },
    Checkbox { checkbox: bool },
    Date { date: Option<DateValue> },
    Formula { formula: FormulaResult },
    Rollup { rollup: RollupValue },
    Relation { relation: Vec<PageRef> },
}

fn span(content: &str) -> RichTextSpan {
    RichTextSpan {
        plain_text: content.to_string(),
        text: Some(TextContent {
            content: content.to_string(),
        }),
    }
}

/// Write-side constructors.
impl Property {
    pub fn title(value: &str) -> Self {
        Property::Title {
            title: vec![span(value)],
        }
    }

    /// Rich text value; an empty string clears the property.
    pub fn text(value: &str) -> Self {
        let rich_text = if value.is_empty() {
            Vec::new()
        } else {
            vec![span(value)]
        };
        Property::RichText { rich_text }
    }

    pub fn number(value: f64) -> Self {
        Property::Number {
            number: Some(value),
        }
    }

    pub fn select(name: &str) -> Self {
        Property::Select {
            select: Some(SelectOption {
                name: name.to_string(),
            }),
        }
    }

    pub fn checkbox(value: bool) -> Self {
        Property::Checkbox { checkbox: value }
    }

    pub fn date(start: &str) -> Self {
        Property::Date {
            date: Some(DateValue {
                start: start.to_string(),
            }),
        }
    }

    pub fn url(value: Option<String>) -> Self {
        Property::Url { url: value }
    }

    pub fn email(value: &str) -> Self {
        Property::Email {
            email: Some(value.to_string()),
        }
    }
}

/// A normalized scalar extracted from a property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Scalar {
    pub fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
            Scalar::Bool(_) => String::new(),
        }
    }

    pub fn into_number(self) -> f64 {
        match self {
            Scalar::Number(n) => n,
            Scalar::Text(s) => s.trim().parse().unwrap_or(0.0),
            Scalar::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn into_bool(self) -> bool {
        match self {
            Scalar::Bool(b) => b,
            Scalar::Text(s) => !s.is_empty(),
            Scalar::Number(n) => n != 0.0,
        }
    }
}

fn join_plain_text(spans: &[RichTextSpan]) -> String {
    spans
        .iter()
        .map(|s| {
            if s.plain_text.is_empty() {
                s.text.as_ref().map(|t| t.content.as_str()).unwrap_or("")
            } else {
                s.plain_text.as_str()
            }
        })
        .collect()
}

/// Normalize a property value into a scalar matching its declared type.
///
/// Missing input yields the zero value (`""`, `0`, `false`); no error is ever
/// raised.
pub fn extract(property: Option<&Property>) -> Scalar {
    let Some(property) = property else {
        return Scalar::Text(String::new());
    };

    match property {
        Property::Title { title } => Scalar::Text(join_plain_text(title)),
        Property::RichText { rich_text } => Scalar::Text(join_plain_text(rich_text)),
        Property::Email { email } => Scalar::Text(email.clone().unwrap_or_default()),
        Property::PhoneNumber { phone_number } => {
            Scalar::Text(phone_number.clone().unwrap_or_default())
        }
        Property::Url { url } => Scalar::Text(url.clone().unwrap_or_default()),
        Property::Number { number } => Scalar::Number(number.unwrap_or(0.0)),
        Property::Select { select } => {
            Scalar::Text(select.as_ref().map(|s| s.name.clone()).unwrap_or_default())
        }
        Property::Checkbox { checkbox } => Scalar::Bool(*checkbox),
        Property::Date { date } => {
            Scalar::Text(date.as_ref().map(|d| d.start.clone()).unwrap_or_default())
        }
        Property::Formula { formula } => match (&formula.string, formula.number) {
            (Some(s), _) if !s.is_empty() => Scalar::Text(s.clone()),
            (_, Some(n)) => Scalar::Number(n),
            _ => Scalar::Text(String::new()),
        },
        Property::Rollup { rollup } => Scalar::Text(
            rollup
                .array
                .iter()
                .map(|p| extract(Some(p)).into_text())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        // Multi-selects and relations carry no scalar shape of their own
        Property::MultiSelect { .. } | Property::Relation { .. } => Scalar::Text(String::new()),
    }
}

/// Sort direction for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "ascending",
            Direction::Descending => "descending",
        }
    }
}

/// One sort key for a query.
#[derive(Debug, Clone)]
pub struct Sort {
    pub property: String,
    pub direction: Direction,
}

impl Sort {
    pub fn ascending(property: &str) -> Self {
        Self {
            property: property.to_string(),
            direction: Direction::Ascending,
        }
    }

    pub fn descending(property: &str) -> Self {
        Self {
            property: property.to_string(),
            direction: Direction::Descending,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "property": self.property,
            "direction": self.direction.as_str(),
        })
    }
}

/// Query filter over page properties.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Rich-text property equals value
    TextEquals { property: String, value: String },
    /// Title property equals value
    TitleEquals { property: String, value: String },
    /// All nested filters match
    And(Vec<Filter>),
}

impl Filter {
    pub fn text_equals(property: &str, value: &str) -> Self {
        Filter::TextEquals {
            property: property.to_string(),
            value: value.to_string(),
        }
    }

    pub fn title_equals(property: &str, value: &str) -> Self {
        Filter::TitleEquals {
            property: property.to_string(),
            value: value.to_string(),
        }
    }

    /// Wire representation understood by the document store.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Filter::TextEquals { property, value } => serde_json::json!({
                "property": property,
                "rich_text": { "equals": value },
            }),
            Filter::TitleEquals { property, value } => serde_json::json!({
                "property": property,
                "title": { "equals": value },
            }),
            Filter::And(filters) => serde_json::json!({
                "and": filters.iter().map(Filter::to_json).collect::<Vec<_>>(),
            }),
        }
    }

    /// Evaluate the filter against a page (used by the in-memory store).
    pub fn matches(&self, page: &Page) -> bool {
        match self {
            Filter::TextEquals { property, value }
            | Filter::TitleEquals { property, value } => {
                extract(page.prop(property)).into_text() == *value
            }
            Filter::And(filters) => filters.iter().all(|f| f.matches(page)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_property_extracts_to_empty_text() {
        assert_eq!(extract(None), Scalar::Text(String::new()));
        assert_eq!(extract(None).into_number(), 0.0);
        assert!(!extract(None).into_bool());
    }

    #[test]
    fn test_rich_text_concatenates_spans() {
        let prop = Property::RichText {
            rich_text: vec![span("foo"), span("bar")],
        };
        assert_eq!(extract(Some(&prop)).into_text(), "foobar");
    }

    #[test]
    fn test_empty_number_and_select_fall_back_to_zero_values() {
        let number = Property::Number { number: None };
        assert_eq!(extract(Some(&number)), Scalar::Number(0.0));

        let select = Property::Select { select: None };
        assert_eq!(extract(Some(&select)).into_text(), "");
    }

    #[test]
    fn test_formula_prefers_string_over_number() {
        let string_formula = Property::Formula {
            formula: FormulaResult {
                string: Some("twelve".to_string()),
                number: Some(12.0),
            },
        };
        assert_eq!(extract(Some(&string_formula)).into_text(), "twelve");

        let number_formula = Property::Formula {
            formula: FormulaResult {
                string: None,
                number: Some(12.0),
            },
        };
        assert_eq!(extract(Some(&number_formula)), Scalar::Number(12.0));
    }

    #[test]
    fn test_rollup_joins_recursive_values() {
        let prop = Property::Rollup {
            rollup: RollupValue {
                array: vec![Property::text("a"), Property::number(2.0)],
            },
        };
        assert_eq!(extract(Some(&prop)).into_text(), "a, 2");
    }

    #[test]
    fn test_text_constructor_with_empty_string_clears() {
        match Property::text("") {
            Property::RichText { rich_text } => assert!(rich_text.is_empty()),
            _ => panic!("expected rich text"),
        }
    }

    #[test]
    fn test_filter_matches_extracted_text() {
        let mut properties = Properties::new();
        properties.insert("Slack ID".to_string(), Property::text("U123"));
        let page = Page {
            id: "p1".to_string(),
            created_time: String::new(),
            last_edited_time: String::new(),
            properties,
        };

        assert!(Filter::text_equals("Slack ID", "U123").matches(&page));
        assert!(!Filter::text_equals("Slack ID", "U999").matches(&page));
        assert!(!Filter::text_equals("Missing", "U123").matches(&page));
    }
}
