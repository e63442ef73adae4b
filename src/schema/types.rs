//! Schema type definitions
//!
//! Supported types:
//! - string: UTF-8 string
//! - integer: JSON integer
//! - float: JSON number written with a fractional part
//! - number: any JSON number
//! - boolean
//! - dict: nested object, optionally with its own field rules
//! - list: array, optionally with a rule set applied to every element

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};

/// Name of the primary key field assigned by the store.
pub const PRIMARY_KEY: &str = "id";

/// Declared field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Number,
    Boolean,
    Dict,
    List,
}

impl FieldType {
    /// Returns the type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Dict => "dict",
            FieldType::List => "list",
        }
    }

    /// Whether `value` is an instance of this type. No coercion.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Float => value.is_f64(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Dict => value.is_object(),
            FieldType::List => value.is_array(),
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float | FieldType::Number)
    }

    fn has_length(&self) -> bool {
        matches!(self, FieldType::String | FieldType::List)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Full-match regular expression, compiled when the schema is loaded.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    compiled: Regex,
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Result<Self, regex::Error> {
        let source = source.into();
        let compiled = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self { source, compiled })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.compiled.is_match(text)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(source).map_err(serde::de::Error::custom)
    }
}

/// Nested rules: a field map for `dict`, an element rule set for `list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NestedRules {
    Items(Box<FieldDef>),
    Fields(BTreeMap<String, FieldDef>),
}

/// Rule set for a single field
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDef {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub allowed: Option<Vec<Value>>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub minlength: Option<usize>,
    #[serde(default)]
    pub maxlength: Option<usize>,
    #[serde(default)]
    pub regex: Option<Pattern>,
    #[serde(default)]
    pub schema: Option<NestedRules>,
}

impl FieldDef {
    /// A bare rule set of the given type
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            nullable: false,
            allowed: None,
            min: None,
            max: None,
            minlength: None,
            maxlength: None,
            regex: None,
            schema: None,
        }
    }

    pub fn required_string() -> Self {
        Self::new(FieldType::String).required()
    }

    pub fn optional_string() -> Self {
        Self::new(FieldType::String)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_allowed(mut self, allowed: Vec<Value>) -> Self {
        self.allowed = Some(allowed);
        self
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_length(mut self, minlength: Option<usize>, maxlength: Option<usize>) -> Self {
        self.minlength = minlength;
        self.maxlength = maxlength;
        self
    }

    pub fn with_regex(mut self, pattern: Pattern) -> Self {
        self.regex = Some(pattern);
        self
    }

    pub fn with_fields(mut self, fields: BTreeMap<String, FieldDef>) -> Self {
        self.schema = Some(NestedRules::Fields(fields));
        self
    }

    pub fn with_items(mut self, items: FieldDef) -> Self {
        self.schema = Some(NestedRules::Items(Box::new(items)));
        self
    }

    /// Checks that every rule makes sense for the declared type.
    fn check(&self, path: &str) -> SchemaResult<()> {
        if (self.min.is_some() || self.max.is_some()) && !self.field_type.is_numeric() {
            return Err(SchemaError::invalid_rule(
                path,
                format!("min/max do not apply to {} fields", self.field_type),
            ));
        }
        if (self.minlength.is_some() || self.maxlength.is_some()) && !self.field_type.has_length() {
            return Err(SchemaError::invalid_rule(
                path,
                format!("minlength/maxlength do not apply to {} fields", self.field_type),
            ));
        }
        if self.regex.is_some() && self.field_type != FieldType::String {
            return Err(SchemaError::invalid_rule(path, "regex applies to strings only"));
        }

        match (&self.schema, self.field_type) {
            (None, _) => Ok(()),
            (Some(NestedRules::Fields(fields)), FieldType::Dict) => {
                for (name, def) in fields {
                    def.check(&format!("{}.{}", path, name))?;
                }
                Ok(())
            }
            (Some(NestedRules::Items(items)), FieldType::List) => items.check(&format!("{}[]", path)),
            (Some(_), other) => Err(SchemaError::invalid_rule(
                path,
                format!("nested schema does not match {} type", other),
            )),
        }
    }
}

/// What to do with payload fields the schema does not declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFieldPolicy {
    #[default]
    Reject,
    Allow,
}

/// A loaded resource schema
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: String,
    pub fields: BTreeMap<String, FieldDef>,
    pub unknown_fields: UnknownFieldPolicy,
}

impl Schema {
    /// Builds a schema, checking every rule set against its type.
    pub fn new(
        name: impl Into<String>,
        fields: BTreeMap<String, FieldDef>,
        unknown_fields: UnknownFieldPolicy,
    ) -> SchemaResult<Self> {
        for (field, def) in &fields {
            def.check(field)?;
        }
        if let Some(id) = fields.get(PRIMARY_KEY) {
            if id.field_type != FieldType::String {
                return Err(SchemaError::invalid_rule(
                    PRIMARY_KEY,
                    "the primary key must be declared as a string",
                ));
            }
        }
        Ok(Self {
            name: name.into(),
            fields,
            unknown_fields,
        })
    }

    /// Names of fields that must be present on create
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, def)| def.required)
            .map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_matching_is_exact() {
        assert!(FieldType::Integer.matches(&json!(3)));
        assert!(!FieldType::Integer.matches(&json!(3.5)));
        assert!(FieldType::Float.matches(&json!(3.5)));
        assert!(!FieldType::Float.matches(&json!(3)));
        assert!(FieldType::Number.matches(&json!(3)));
        assert!(FieldType::Number.matches(&json!(3.5)));
        assert!(!FieldType::String.matches(&json!(3)));
        assert!(!FieldType::Boolean.matches(&json!("true")));
        assert!(FieldType::Dict.matches(&json!({})));
        assert!(FieldType::List.matches(&json!([])));
    }

    #[test]
    fn test_pattern_is_anchored() {
        let pattern = Pattern::new("[A-Z][a-z]+").unwrap();
        assert!(pattern.is_match("Trek"));
        assert!(!pattern.is_match("Trek 2"));
        assert!(!pattern.is_match("trek"));
        assert_eq!(pattern.as_str(), "[A-Z][a-z]+");
    }

    #[test]
    fn test_rule_must_fit_type() {
        let mut fields = BTreeMap::new();
        fields.insert(
            "brand".into(),
            FieldDef::required_string().with_range(Some(0.0), None),
        );
        let err = Schema::new("bicycles", fields, UnknownFieldPolicy::Reject).unwrap_err();
        assert!(err.to_string().contains("brand"));
    }

    #[test]
    fn test_nested_schema_must_fit_type() {
        let mut inner = BTreeMap::new();
        inner.insert("frame".into(), FieldDef::optional_string());

        let mut fields = BTreeMap::new();
        fields.insert("tags".into(), FieldDef::new(FieldType::List).with_fields(inner));
        assert!(Schema::new("bicycles", fields, UnknownFieldPolicy::Reject).is_err());
    }

    #[test]
    fn test_primary_key_must_be_string() {
        let mut fields = BTreeMap::new();
        fields.insert(PRIMARY_KEY.into(), FieldDef::new(FieldType::Integer));
        assert!(Schema::new("bicycles", fields, UnknownFieldPolicy::Reject).is_err());
    }

    #[test]
    fn test_required_fields() {
        let mut fields = BTreeMap::new();
        fields.insert("brand".into(), FieldDef::required_string());
        fields.insert("model".into(), FieldDef::required_string());
        fields.insert("color".into(), FieldDef::optional_string());

        let schema = Schema::new("bicycles", fields, UnknownFieldPolicy::Reject).unwrap();
        let required: Vec<_> = schema.required_fields().collect();
        assert_eq!(required, vec!["brand", "model"]);
    }

    #[test]
    fn test_field_def_from_yaml() {
        let def: FieldDef = serde_yaml::from_str(
            "type: string\nrequired: true\nallowed: [road, mountain]\nmaxlength: 16\n",
        )
        .unwrap();
        assert_eq!(def.field_type, FieldType::String);
        assert!(def.required);
        assert_eq!(def.allowed.as_ref().map(Vec::len), Some(2));
        assert_eq!(def.maxlength, Some(16));
    }

    #[test]
    fn test_unknown_rule_key_rejected() {
        let result: Result<FieldDef, _> = serde_yaml::from_str("type: string\ncoerce: int\n");
        assert!(result.is_err());
    }
}
