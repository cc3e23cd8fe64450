use chrono::{DateTime, Utc};
use fragments_types::{FragmentId, FragmentKey, MediaType, OwnerId, SupportedType, TypeError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// Untyped fragment fields, as supplied by a caller or read back from the
/// metadata store.
///
/// Nothing here is trusted. [`FragmentFields::build`] validates every field
/// and fills in the ones that were omitted.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentFields {
    pub id: Option<String>,
    pub owner_id: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub size: Option<Value>,
}

impl FragmentFields {
    pub fn new(owner_id: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            content_type: Some(content_type.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_size(mut self, size: impl Into<Value>) -> Self {
        self.size = Some(size.into());
        self
    }

    /// Validate and construct. Performs no I/O.
    pub fn build(self) -> Result<Fragment, ValidationError> {
        let id = match self.id {
            Some(id) => FragmentId::new(id).map_err(|e| ValidationError::new("id", e.to_string()))?,
            None => FragmentId::generate(),
        };
        let owner_id = OwnerId::new(self.owner_id.unwrap_or_default())
            .map_err(|e| ValidationError::new("ownerId", e.to_string()))?;
        let content_type = parse_type(self.content_type.as_deref())?;
        let size = match self.size {
            Some(value) => parse_size(&value)?,
            None => 0,
        };

        let now = Utc::now();
        let created = self.created.unwrap_or(now);
        Ok(Fragment {
            id,
            owner_id,
            created,
            updated: self.updated.unwrap_or(created),
            content_type,
            size,
        })
    }
}

fn parse_type(value: Option<&str>) -> Result<MediaType, ValidationError> {
    let value = value.unwrap_or_default();
    if value.trim().is_empty() {
        return Err(ValidationError::new("type", "must not be empty"));
    }
    MediaType::parse(value).map_err(|e| match e {
        TypeError::UnsupportedMediaType(t) => {
            ValidationError::new("type", format!("unsupported media type: {t}"))
        }
        other => ValidationError::new("type", other.to_string()),
    })
}

/// A byte count from untyped input: a finite, non-negative whole number.
fn parse_size(value: &Value) -> Result<u64, ValidationError> {
    let Value::Number(n) = value else {
        return Err(ValidationError::new("size", format!("must be a number, got {value}")));
    };
    if let Some(size) = n.as_u64() {
        return Ok(size);
    }
    match n.as_f64() {
        Some(f) if f < 0.0 => Err(ValidationError::new("size", "must not be negative")),
        Some(f) if f.is_finite() && f.fract() == 0.0 && f < u64::MAX as f64 => Ok(f as u64),
        _ => Err(ValidationError::new("size", format!("must be a whole number, got {n}"))),
    }
}

/// Metadata for one stored payload.
///
/// Serializes to the record kept in the metadata store:
/// `{"id", "ownerId", "created", "updated", "type", "size"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "FragmentFields")]
pub struct Fragment {
    pub(crate) id: FragmentId,
    pub(crate) owner_id: OwnerId,
    pub(crate) created: DateTime<Utc>,
    pub(crate) updated: DateTime<Utc>,
    #[serde(rename = "type")]
    pub(crate) content_type: MediaType,
    pub(crate) size: u64,
}

impl TryFrom<FragmentFields> for Fragment {
    type Error = ValidationError;

    fn try_from(fields: FragmentFields) -> Result<Self, Self::Error> {
        fields.build()
    }
}

impl Fragment {
    /// Construct a fresh, empty fragment from untyped input.
    pub fn new(owner_id: &str, content_type: &str) -> Result<Self, ValidationError> {
        FragmentFields::new(owner_id, content_type).build()
    }

    /// Construct a fresh, empty fragment from already-validated parts.
    pub fn for_owner(owner_id: OwnerId, content_type: MediaType) -> Self {
        let now = Utc::now();
        Self {
            id: FragmentId::generate(),
            owner_id,
            created: now,
            updated: now,
            content_type,
            size: 0,
        }
    }

    pub fn id(&self) -> &FragmentId {
        &self.id
    }

    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    pub fn key(&self) -> FragmentKey {
        FragmentKey::new(self.owner_id.clone(), self.id.clone())
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn updated(&self) -> DateTime<Utc> {
        self.updated
    }

    /// The full type as supplied, parameters included.
    pub fn content_type(&self) -> &MediaType {
        &self.content_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Base type with parameters stripped.
    pub fn mime_type(&self) -> &'static str {
        self.content_type.essence()
    }

    pub fn is_text(&self) -> bool {
        self.mime_type().starts_with("text/")
    }

    /// Types this fragment can be served as, identity first.
    pub fn formats(&self) -> &'static [SupportedType] {
        self.content_type.base().formats()
    }

    pub fn is_supported_type(value: &str) -> bool {
        fragments_types::is_supported_type(value)
    }
}
