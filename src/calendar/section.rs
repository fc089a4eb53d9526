use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Server-side section identifier, sent back to the API exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionId {
    Int(u64),
    Str(String),
    Other(Value),
}

impl From<u64> for SectionId {
    fn from(id: u64) -> Self {
        SectionId::Int(id)
    }
}

impl From<&str> for SectionId {
    fn from(id: &str) -> Self {
        SectionId::Str(id.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SectionId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Section {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(SectionId::Int(id));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn section_without_id_deserializes() {
        let section: Section = serde_json::from_value(json!({"code": "PHY-2"})).unwrap();

        assert_eq!(section.code, "PHY-2");
        assert_eq!(section.id, None);
    }

    #[test]
    fn section_with_id_serializes_id() {
        let section = Section::new("PHY-2").with_id(12);

        let value = serde_json::to_value(&section).unwrap();

        assert_eq!(value, json!({"code": "PHY-2", "id": 12}));
    }

    #[test]
    fn section_without_code_keeps_its_other_fields() {
        let raw = json!({"id": 3, "nrc": "123"});

        let section: Section = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(section.code, "");
        assert_eq!(section.id, Some(SectionId::Int(3)));
        assert_eq!(serde_json::to_value(&section).unwrap(), raw);
    }

    #[test]
    fn string_and_unusual_ids_pass_through() {
        let text: Section = serde_json::from_value(json!({"code": "A", "id": "sec-9"})).unwrap();
        let negative: Section = serde_json::from_value(json!({"code": "B", "id": -1})).unwrap();

        assert_eq!(text.id, Some(SectionId::from("sec-9")));
        assert_eq!(negative.id, Some(SectionId::Other(json!(-1))));
        assert_eq!(serde_json::to_value(&negative).unwrap(), json!({"code": "B", "id": -1}));
    }
}
