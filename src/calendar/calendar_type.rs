use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::{Section, SectionId};

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Section>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Section>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A named collection of sections, either local-only or backed by the API.
///
/// Fields the application does not interpret are kept in `extra` so a
/// calendar survives a storage or API round trip unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(rename = "fromApi", default, skip_serializing_if = "Option::is_none")]
    pub from_api: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Calendar {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    pub fn has_uuid(&self, uuid: &str) -> bool {
        self.uuid.as_deref() == Some(uuid)
    }

    pub fn is_from_api(&self) -> bool {
        self.from_api.unwrap_or(false)
    }

    pub fn is_public(&self) -> bool {
        self.is_public.unwrap_or(false)
    }

    /// Marks a calendar as the server's copy.
    pub fn tagged_from_api(mut self) -> Self {
        self.from_api = Some(true);
        self
    }

    /// Detaches a calendar from the server under a fresh identity.
    pub fn into_local_copy(mut self, uuid: String) -> Self {
        self.uuid = Some(uuid);
        self.from_api = None;
        self
    }

    pub fn section_ids(&self) -> Vec<SectionId> {
        self.sections.iter().filter_map(|s| s.id.clone()).collect()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(untitled)")
    }
}
