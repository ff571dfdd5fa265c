//! Domain model: entity kinds, access methods, attribute values and the
//! flat view shape returned by every read endpoint.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// The entity types the catalog serves. Every kind shares the same
/// attribute tables, keyed by `(owner kind, parent id)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Block,
    Element,
    Section,
    Point,
    User,
    Group,
    File,
}

impl EntityKind {
    /// Storage tag used in the shared attribute/ACL tables.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Element => "element",
            Self::Section => "section",
            Self::Point => "point",
            Self::User => "user",
            Self::Group => "group",
            Self::File => "file",
        }
    }

    /// Human-readable name used in error messages.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Block => "Block",
            Self::Element => "Element",
            Self::Section => "Section",
            Self::Point => "Point",
            Self::User => "User",
            Self::Group => "Group",
            Self::File => "File",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Access method carried by ACL entries and method-access rules.
///
/// `All` matches any requested method; it is never itself requested.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Read,
    Write,
    Delete,
    All,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::Delete => "DELETE",
            Self::All => "ALL",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "READ" => Some(Self::Read),
            "WRITE" => Some(Self::Write),
            "DELETE" => Some(Self::Delete),
            "ALL" => Some(Self::All),
            _ => None,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Attribute values (stored rows) and inputs (desired state)
// ============================================================================

/// Short localized text value. Multiple rows per `(attribute, language)`
/// are allowed; they are reconciled positionally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StringValue {
    pub id: Uuid,
    pub attribute_id: String,
    pub language_id: Option<String>,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringInput {
    pub attribute_id: String,
    #[serde(default)]
    pub language_id: Option<String>,
    pub value: String,
}

/// Long-form text value, same keying as [`StringValue`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionValue {
    pub id: Uuid,
    pub attribute_id: String,
    pub language_id: Option<String>,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionInput {
    pub attribute_id: String,
    #[serde(default)]
    pub language_id: Option<String>,
    pub value: String,
}

/// Reference into the point directory; membership semantics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointValue {
    pub id: Uuid,
    pub attribute_id: String,
    pub point_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointInput {
    pub attribute_id: String,
    pub point_id: String,
}

/// Numeric measurement, optionally dimensioned by a point and a measure
/// (unit). At most one row per `(attribute, point)` pair.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterValue {
    pub id: Uuid,
    pub attribute_id: String,
    pub point_id: Option<String>,
    pub measure_id: Option<String>,
    pub count: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterInput {
    pub attribute_id: String,
    #[serde(default)]
    pub point_id: Option<String>,
    #[serde(default)]
    pub measure_id: Option<String>,
    pub count: f64,
}

/// Reference to a file entity; membership semantics, same shape as points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileValue {
    pub id: Uuid,
    pub attribute_id: String,
    pub file_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInput {
    pub attribute_id: String,
    pub file_id: String,
}

/// One ACL row as submitted and as stored. A `None` group applies to every
/// caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionInput {
    #[serde(default)]
    pub group_id: Option<String>,
    pub method: Method,
}

/// Desired attribute state for one entity, as carried by write payloads.
///
/// A kind that is absent from the payload deserializes to an empty list,
/// which on update deletes every stored row of that kind. Destructive by
/// default; callers resubmit what they want to keep.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributesInput {
    #[serde(default)]
    pub strings: Vec<StringInput>,
    #[serde(default)]
    pub descriptions: Vec<DescriptionInput>,
    #[serde(default)]
    pub points: Vec<PointInput>,
    #[serde(default)]
    pub counters: Vec<CounterInput>,
    #[serde(default)]
    pub files: Vec<FileInput>,
}

// ============================================================================
// Views
// ============================================================================

/// Stored attribute rows of one entity, grouped by kind. Lists are empty
/// rather than absent when the entity carries no rows of a kind.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSet {
    pub strings: Vec<StringValue>,
    pub descriptions: Vec<DescriptionValue>,
    pub points: Vec<PointValue>,
    pub counters: Vec<CounterValue>,
    pub files: Vec<FileValue>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionView {
    pub group: Option<String>,
    pub method: Method,
}

/// Flat view: entity scalar fields, attributes grouped by kind, ACL.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityView<S: Serialize> {
    #[serde(flatten)]
    pub scalar: S,
    pub attributes: AttributeSet,
    pub permissions: Vec<PermissionView>,
}

/// List result: the page plus the total row count after visibility and
/// attribute filtering, before the page window.
#[derive(Clone, Debug, Serialize)]
pub struct PageView<S: Serialize> {
    pub data: Vec<EntityView<S>>,
    pub count: u64,
}

// ============================================================================
// Scalar views per entity kind
// ============================================================================

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockScalar {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementScalar {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub blocks: Vec<String>,
    pub sections: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionScalar {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointScalar {
    pub id: String,
    pub parent_id: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserScalar {
    pub id: String,
    pub login: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub groups: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupScalar {
    pub id: String,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileScalar {
    pub id: String,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub size: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

// ============================================================================
// List parameters
// ============================================================================

/// One string-attribute restriction. `value` matches exactly, `like`
/// matches as a substring; both may be combined with a language pin.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringFilter {
    pub attribute_id: String,
    pub language_id: Option<String>,
    pub value: Option<String>,
    pub like: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PointFilter {
    pub attribute_id: String,
    pub point_id: String,
}

/// Counter restriction; `min`/`max` form an inclusive range.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CounterFilter {
    pub attribute_id: String,
    pub eq: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct FilterSet {
    pub strings: Vec<StringFilter>,
    pub points: Vec<PointFilter>,
    pub counters: Vec<CounterFilter>,
}

impl FilterSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty() && self.points.is_empty() && self.counters.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    UpdatedAt,
    StringAttr {
        attribute_id: String,
        language_id: Option<String>,
    },
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// Everything a list endpoint accepts. `limit`/`offset` are applied last,
/// over the visibility-scoped and filtered result set.
#[derive(Clone, Debug, Default)]
pub struct ListParams {
    pub filters: FilterSet,
    pub sort: Option<(SortKey, SortDir)>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}
