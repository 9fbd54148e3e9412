//! Plain key-value projection of parsed documents, for JSON export.
//!
//! References are written as identifiers, so a [`DocumentRecord`] is
//! self-contained and can be compared across parses.

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::errors::Result;
use crate::types::Argument;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityExport {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub spans: Vec<[usize; 2]>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationExport {
    pub id: String,
    #[serde(rename = "type")]
    pub relation_type: String,
    #[serde(with = "role_map")]
    pub args: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventExport {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub trigger: String,
    #[serde(with = "role_map")]
    pub args: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeExport {
    pub id: String,
    #[serde(rename = "type")]
    pub attribute_type: String,
    pub target: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationExport {
    pub id: String,
    #[serde(rename = "type")]
    pub normalization_type: String,
    pub target: String,
    pub resource: String,
    pub entry: String,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteExport {
    pub id: String,
    #[serde(rename = "type")]
    pub note_type: String,
    pub target: String,
    pub text: String,
}

/// Serializable form of a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub text: String,
    pub entities: Vec<EntityExport>,
    pub relations: Vec<RelationExport>,
    pub events: Vec<EventExport>,
    #[serde(default)]
    pub attributes: Vec<AttributeExport>,
    #[serde(default)]
    pub normalizations: Vec<NormalizationExport>,
    #[serde(default)]
    pub notes: Vec<NoteExport>,
}

impl DocumentRecord {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn export_args(document: &Document, args: &[Argument]) -> Vec<(String, String)> {
    args.iter()
        .map(|a| (a.role.clone(), document.target_id(a.target).to_string()))
        .collect()
}

impl From<&Document> for DocumentRecord {
    fn from(document: &Document) -> Self {
        DocumentRecord {
            id: document.id().to_string(),
            text: document.text().to_string(),
            entities: document
                .entities()
                .iter()
                .map(|e| EntityExport {
                    id: e.id.clone(),
                    entity_type: e.entity_type.clone(),
                    spans: e.spans.iter().map(|s| [s.start, s.end]).collect(),
                    text: e.text.clone(),
                })
                .collect(),
            relations: document
                .relations()
                .iter()
                .map(|r| RelationExport {
                    id: r.id.clone(),
                    relation_type: r.relation_type.clone(),
                    args: export_args(document, &r.args),
                })
                .collect(),
            events: document
                .events()
                .iter()
                .map(|e| EventExport {
                    id: e.id.clone(),
                    event_type: e.event_type.clone(),
                    trigger: document.entity(e.trigger).id.clone(),
                    args: export_args(document, &e.args),
                })
                .collect(),
            attributes: document
                .attributes()
                .iter()
                .map(|a| AttributeExport {
                    id: a.id.clone(),
                    attribute_type: a.attribute_type.clone(),
                    target: document.target_id(a.target).to_string(),
                    value: a.value.clone(),
                })
                .collect(),
            normalizations: document
                .normalizations()
                .iter()
                .map(|n| NormalizationExport {
                    id: n.id.clone(),
                    normalization_type: n.normalization_type.clone(),
                    target: document.target_id(n.target).to_string(),
                    resource: n.resource.clone(),
                    entry: n.entry.clone(),
                    text: n.text.clone(),
                })
                .collect(),
            notes: document
                .notes()
                .iter()
                .map(|n| NoteExport {
                    id: n.id.clone(),
                    note_type: n.note_type.clone(),
                    target: document.target_id(n.target).to_string(),
                    text: n.text.clone(),
                })
                .collect(),
        }
    }
}

impl Document {
    /// Projects the document onto its serializable form.
    pub fn to_record(&self) -> DocumentRecord {
        DocumentRecord::from(self)
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.to_record())?)
    }
}

/// Serializes `(role, id)` pairs as a JSON object, keeping argument order.
mod role_map {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        args: &[(String, String)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(args.len()))?;
        for (role, id) in args {
            map.serialize_entry(role, id)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, String)>, D::Error> {
        struct RoleMapVisitor;

        impl<'de> Visitor<'de> for RoleMapVisitor {
            type Value = Vec<(String, String)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from role name to annotation id")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut args = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((role, id)) = access.next_entry::<String, String>()? {
                    args.push((role, id));
                }
                Ok(args)
            }
        }

        deserializer.deserialize_map(RoleMapVisitor)
    }
}
