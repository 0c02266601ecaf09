use serde::{Deserialize, Serialize};

use crate::validation::FieldValue;

/// Inbound country fields for create and update. Everything is optional at
/// the edge; the per-operation rule tables decide what must be present, so a
/// bad request reports every missing field instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountryPayload {
    pub name: Option<String>,
    pub capital: Option<String>,
    pub population: Option<i64>,
    pub region: Option<String>,
    pub flag_url: Option<String>,
    pub motto: Option<String>,
    pub language: Option<String>,
    pub description: Option<String>,
}

fn str_value(v: &Option<String>) -> FieldValue<'_> {
    match v.as_deref() {
        Some(s) => FieldValue::Str(s),
        None => FieldValue::Absent,
    }
}

impl CountryPayload {
    /// Resolve a field by name for the validator.
    pub fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "name" => str_value(&self.name),
            "capital" => str_value(&self.capital),
            "population" => self.population.map_or(FieldValue::Absent, FieldValue::Num),
            "region" => str_value(&self.region),
            "flag_url" => str_value(&self.flag_url),
            "motto" => str_value(&self.motto),
            "language" => str_value(&self.language),
            "description" => str_value(&self.description),
            _ => FieldValue::Absent,
        }
    }

    /// Convert a payload that passed the create rules into insertable data.
    /// Returns `None` when a required field is absent.
    pub fn into_new(self) -> Option<NewCountry> {
        Some(NewCountry {
            name: self.name?,
            capital: self.capital?,
            population: self.population?,
            region: self.region?,
            flag_url: self.flag_url,
            motto: self.motto,
            language: self.language,
            description: self.description,
        })
    }
}

/// Fully validated data for a new country record.
#[derive(Debug, Clone)]
pub struct NewCountry {
    pub name: String,
    pub capital: String,
    pub population: i64,
    pub region: String,
    pub flag_url: Option<String>,
    pub motto: Option<String>,
    pub language: Option<String>,
    pub description: Option<String>,
}

/// An uploaded flag file as extracted from the multipart request.
/// `file_name` is `None` when the request carried no `flag` part.
#[derive(Debug, Clone, Default)]
pub struct FlagUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}
