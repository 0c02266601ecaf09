//! Declarative request validation.
//!
//! Each operation owns a rule table (`FieldSpec` entries); `validate` evaluates
//! the whole table and returns every violated rule grouped by field, so callers
//! always see the complete picture instead of the first failure.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Field violations keyed by field name, each holding every failed rule's
/// message. Serializes as the bare `{"field": ["message", ...]}` map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Violations(BTreeMap<String, Vec<String>>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn merge(&mut self, other: Violations) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for msg in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, msg)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A single field rule. Rules after `Required` are skipped for absent fields;
/// an absent optional field is always valid.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    Required,
    StrMax(usize),
    NumMin(i64),
}

/// One row of a rule table.
pub struct FieldSpec {
    pub field: &'static str,
    pub rules: &'static [Rule],
}

/// Value of a payload field as seen by the validator.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Absent,
    Str(&'a str),
    Num(i64),
}

/// Rules for creating a country: required fields must be present, everything
/// obeys the same type/range constraints.
pub const CREATE_RULES: &[FieldSpec] = &[
    FieldSpec { field: "name", rules: &[Rule::Required, Rule::StrMax(255)] },
    FieldSpec { field: "capital", rules: &[Rule::Required, Rule::StrMax(255)] },
    FieldSpec { field: "population", rules: &[Rule::Required, Rule::NumMin(0)] },
    FieldSpec { field: "region", rules: &[Rule::Required, Rule::StrMax(255)] },
    FieldSpec { field: "flag_url", rules: &[Rule::StrMax(255)] },
    FieldSpec { field: "motto", rules: &[Rule::StrMax(255)] },
    FieldSpec { field: "language", rules: &[Rule::StrMax(255)] },
];

/// Rules for updating a country: same constraints, nothing required.
pub const UPDATE_RULES: &[FieldSpec] = &[
    FieldSpec { field: "name", rules: &[Rule::StrMax(255)] },
    FieldSpec { field: "capital", rules: &[Rule::StrMax(255)] },
    FieldSpec { field: "population", rules: &[Rule::NumMin(0)] },
    FieldSpec { field: "region", rules: &[Rule::StrMax(255)] },
    FieldSpec { field: "flag_url", rules: &[Rule::StrMax(255)] },
    FieldSpec { field: "motto", rules: &[Rule::StrMax(255)] },
    FieldSpec { field: "language", rules: &[Rule::StrMax(255)] },
];

pub const NAME_TAKEN: &str = "The name has already been taken.";

pub const FLAG_ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "png", "jpg", "gif", "svg"];
pub const FLAG_MAX_KILOBYTES: usize = 2048;

/// Evaluate a rule table against a payload, collecting every violation.
/// `value_of` resolves a field name to its submitted value.
pub fn validate<'a>(
    specs: &[FieldSpec],
    value_of: impl Fn(&str) -> FieldValue<'a>,
) -> Violations {
    let mut violations = Violations::new();
    for spec in specs {
        let value = value_of(spec.field);
        for rule in spec.rules {
            match (rule, value) {
                (Rule::Required, FieldValue::Absent) => {
                    violations.add(spec.field, format!("The {} field is required.", spec.field));
                    break;
                }
                (_, FieldValue::Absent) => break,
                (Rule::Required, _) => {}
                (Rule::StrMax(max), FieldValue::Str(s)) => {
                    if s.chars().count() > *max {
                        violations.add(
                            spec.field,
                            format!("The {} may not be greater than {} characters.", spec.field, max),
                        );
                    }
                }
                (Rule::NumMin(min), FieldValue::Num(n)) => {
                    if n < *min {
                        violations.add(
                            spec.field,
                            format!("The {} must be at least {}.", spec.field, min),
                        );
                    }
                }
                // Type mismatches are caught at deserialization; a rule that
                // does not apply to the submitted shape is a no-op.
                _ => {}
            }
        }
    }
    violations
}

/// Lowercased extension of an uploaded file name.
pub fn file_extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Validate an uploaded flag file: must be present, an image with an allowed
/// extension, and at most `FLAG_MAX_KILOBYTES` in size. Returns the
/// lowercased extension on success, every violation otherwise.
pub fn validate_flag_upload(
    file_name: Option<&str>,
    content_type: Option<&str>,
    size_bytes: usize,
) -> Result<String, Violations> {
    let mut violations = Violations::new();
    let Some(file_name) = file_name else {
        violations.add("flag", "The flag field is required.");
        return Err(violations);
    };

    if !content_type.is_some_and(|ct| ct.starts_with("image/")) {
        violations.add("flag", "The flag must be an image.");
    }
    let ext = match file_extension(file_name) {
        Some(ext) if FLAG_ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Some(ext),
        _ => {
            violations.add(
                "flag",
                format!(
                    "The flag must be a file of type: {}.",
                    FLAG_ALLOWED_EXTENSIONS.join(", ")
                ),
            );
            None
        }
    };
    if size_bytes > FLAG_MAX_KILOBYTES * 1024 {
        violations.add(
            "flag",
            format!("The flag may not be greater than {} kilobytes.", FLAG_MAX_KILOBYTES),
        );
    }
    match (ext, violations.is_empty()) {
        (Some(ext), true) => Ok(ext),
        _ => Err(violations),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_payload(_field: &str) -> FieldValue<'static> {
        FieldValue::Absent
    }

    #[test]
    fn create_rules_collect_all_required_violations() {
        let violations = validate(CREATE_RULES, empty_payload);
        assert!(violations.contains("name"));
        assert!(violations.contains("capital"));
        assert!(violations.contains("population"));
        assert!(violations.contains("region"));
        // Optional fields stay clean when absent.
        assert!(!violations.contains("motto"));
        assert!(!violations.contains("flag_url"));
    }

    #[test]
    fn update_rules_allow_fully_absent_payload() {
        let violations = validate(UPDATE_RULES, empty_payload);
        assert!(violations.is_empty());
    }

    #[test]
    fn string_length_and_number_range_checked_together() {
        let long = "x".repeat(256);
        let violations = validate(CREATE_RULES, |field| match field {
            "name" => FieldValue::Str(&long),
            "capital" => FieldValue::Str("Paris"),
            "population" => FieldValue::Num(-1),
            "region" => FieldValue::Str("Europe"),
            _ => FieldValue::Absent,
        });
        assert!(violations.contains("name"));
        assert!(violations.contains("population"));
        assert!(!violations.contains("capital"));
        assert!(!violations.contains("region"));
    }

    #[test]
    fn violations_serialize_as_field_map() {
        let mut v = Violations::new();
        v.add("name", "The name field is required.");
        v.add("name", "second");
        let json = serde_json::to_value(&v).expect("serialize");
        assert_eq!(json["name"][0], "The name field is required.");
        assert_eq!(json["name"][1], "second");
    }

    #[test]
    fn flag_upload_rules() {
        // Missing file: required only.
        let v = validate_flag_upload(None, None, 0).expect_err("missing file");
        assert!(v.contains("flag"));

        // Wrong extension and not an image.
        let v = validate_flag_upload(Some("flag.pdf"), Some("application/pdf"), 10)
            .expect_err("bad type");
        let json = serde_json::to_value(&v).expect("serialize");
        assert_eq!(json["flag"].as_array().expect("list").len(), 2);

        // Oversize.
        let v = validate_flag_upload(Some("flag.png"), Some("image/png"), 2049 * 1024)
            .expect_err("oversize");
        let json = serde_json::to_value(&v).expect("serialize");
        assert_eq!(
            json["flag"][0],
            "The flag may not be greater than 2048 kilobytes."
        );

        // Valid upload resolves the lowercased extension.
        let ext = validate_flag_upload(Some("Flag.PNG"), Some("image/png"), 1024).expect("valid");
        assert_eq!(ext, "png");
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(file_extension("a.SVG").as_deref(), Some("svg"));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension("trailing."), None);
    }
}
