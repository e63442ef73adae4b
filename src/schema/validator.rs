//! Payload validation against a loaded schema
//!
//! Validation semantics:
//! - Full mode: every required field must be present
//! - Partial mode: presence is not enforced, present fields are
//! - Present fields must match their declared type exactly (no coercion)
//! - Undeclared fields follow the schema's unknown-field policy
//! - Null is rejected unless the field is nullable
//!
//! The validator never mutates the payload and reports every violation,
//! not only the first.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use super::types::{FieldDef, FieldType, NestedRules, Schema, UnknownFieldPolicy, PRIMARY_KEY};

/// Whether required-field presence is enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Create: required fields must be present
    Full,
    /// Update: only supplied fields are checked
    Partial,
}

/// Field path → reasons. Empty when the payload is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationReport {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    /// Reasons recorded for one field path
    pub fn field(&self, path: &str) -> Option<&[String]> {
        self.errors.get(path).map(Vec::as_slice)
    }

    /// Records a reason against a field path.
    pub fn push(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.errors.entry(path.into()).or_default().push(reason.into());
    }

    /// `Ok(())` when valid, otherwise the report itself as the error.
    pub fn into_result(self) -> Result<(), ValidationReport> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Validates payloads against a schema.
pub struct SchemaValidator<'a> {
    schema: &'a Schema,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Validates a payload in the given mode.
    pub fn validate(&self, payload: &Value, mode: ValidationMode) -> ValidationReport {
        let mut report = ValidationReport::default();

        let Some(obj) = payload.as_object() else {
            report.push("$root", type_reason(FieldType::Dict));
            return report;
        };

        if !self.schema.fields.contains_key(PRIMARY_KEY) {
            if let Some(id) = obj.get(PRIMARY_KEY) {
                if !id.is_string() {
                    report.push(PRIMARY_KEY, type_reason(FieldType::String));
                }
            }
        }

        self.validate_object(
            obj,
            &self.schema.fields,
            self.schema.unknown_fields,
            mode,
            "",
            &mut report,
        );
        report
    }

    /// Validates an update payload for the record `existing_id`.
    ///
    /// Runs partial validation and additionally rejects any attempt to
    /// change the primary key.
    pub fn validate_update(&self, existing_id: &str, payload: &Value) -> ValidationReport {
        let mut report = self.validate(payload, ValidationMode::Partial);

        if let Some(new_id) = payload.get(PRIMARY_KEY).and_then(Value::as_str) {
            if new_id != existing_id {
                report.push(PRIMARY_KEY, "field is read-only");
            }
        }

        report
    }

    fn validate_object(
        &self,
        obj: &Map<String, Value>,
        fields: &BTreeMap<String, FieldDef>,
        unknown: UnknownFieldPolicy,
        mode: ValidationMode,
        prefix: &str,
        report: &mut ValidationReport,
    ) {
        if unknown == UnknownFieldPolicy::Reject {
            for key in obj.keys() {
                // The store's primary key is implicitly declared at the top level.
                let implicit = prefix.is_empty() && key == PRIMARY_KEY;
                if !fields.contains_key(key) && !implicit {
                    report.push(make_path(prefix, key), "unknown field");
                }
            }
        }

        for (name, def) in fields {
            let path = make_path(prefix, name);
            match obj.get(name) {
                Some(value) => self.validate_value(value, def, mode, &path, report),
                None if def.required && mode == ValidationMode::Full => {
                    report.push(path, "required field");
                }
                None => {}
            }
        }
    }

    fn validate_value(
        &self,
        value: &Value,
        def: &FieldDef,
        mode: ValidationMode,
        path: &str,
        report: &mut ValidationReport,
    ) {
        if value.is_null() {
            if !def.nullable {
                report.push(path, "null value not allowed");
            }
            return;
        }

        if !def.field_type.matches(value) {
            report.push(path, type_reason(def.field_type));
            return;
        }

        if let Some(allowed) = &def.allowed {
            match value {
                Value::Array(items) => {
                    for item in items.iter().filter(|item| !allowed.contains(item)) {
                        report.push(path, format!("unallowed value {}", item));
                    }
                }
                other if !allowed.contains(other) => {
                    report.push(path, format!("unallowed value {}", other));
                }
                _ => {}
            }
        }

        if let Some(number) = value.as_f64() {
            if let Some(min) = def.min {
                if number < min {
                    report.push(path, format!("min value is {}", min));
                }
            }
            if let Some(max) = def.max {
                if number > max {
                    report.push(path, format!("max value is {}", max));
                }
            }
        }

        let length = match value {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(items) => Some(items.len()),
            _ => None,
        };
        if let Some(length) = length {
            if let Some(minlength) = def.minlength {
                if length < minlength {
                    report.push(path, format!("min length is {}", minlength));
                }
            }
            if let Some(maxlength) = def.maxlength {
                if length > maxlength {
                    report.push(path, format!("max length is {}", maxlength));
                }
            }
        }

        if let (Some(pattern), Some(text)) = (&def.regex, value.as_str()) {
            if !pattern.is_match(text) {
                report.push(
                    path,
                    format!("value does not match regex '{}'", pattern.as_str()),
                );
            }
        }

        match (&def.schema, value) {
            (Some(NestedRules::Fields(fields)), Value::Object(obj)) => {
                self.validate_object(obj, fields, self.schema.unknown_fields, mode, path, report);
            }
            (Some(NestedRules::Items(items)), Value::Array(elements)) => {
                // Elements are whole values: presence rules do not apply to them.
                for (i, elem) in elements.iter().enumerate() {
                    let elem_path = format!("{}[{}]", path, i);
                    self.validate_value(elem, items, ValidationMode::Full, &elem_path, report);
                }
            }
            _ => {}
        }
    }
}

fn type_reason(expected: FieldType) -> String {
    format!("must be of {} type", expected)
}

/// Creates a field path from prefix and field name.
fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}
