//! Core data model — §3 of the spec.
//!
//! Plain data structs only; no behavior. `PublishingStore` implementations
//! construct and return these directly from row data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::{
    DraftChangeLogId, DraftChangeLogRecordId, EntityId, EntityListId, PackageId,
    PublishLogId, PublishLogRecordId, UserId, VersionId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningPackage {
    pub id: PackageId,
    pub uuid: Uuid,
    pub key: String,
    pub title: String,
    pub description: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPackage {
    pub key: String,
    pub title: String,
    pub description: String,
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct PackageUpdate {
    pub key: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub updated: Option<DateTime<Utc>>,
}

impl PackageUpdate {
    pub fn is_empty(&self) -> bool {
        self.key.is_none() && self.title.is_none() && self.description.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishableEntity {
    pub id: EntityId,
    pub uuid: Uuid,
    pub package_id: PackageId,
    pub key: String,
    pub created: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub can_stand_alone: bool,
    /// The registered `Kind` name for this entity, if any has been attached
    /// yet (see §4.8). `None` for an entity created but not yet wrapped by a
    /// specialized kind.
    pub kind: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewEntity {
    pub package_id: PackageId,
    pub key: String,
    pub created: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub can_stand_alone: bool,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishableEntityVersion {
    pub id: VersionId,
    pub uuid: Uuid,
    pub entity_id: EntityId,
    pub version_num: u32,
    pub title: String,
    pub created: DateTime<Utc>,
    pub created_by: Option<UserId>,
}

#[derive(Debug, Clone)]
pub struct NewVersion {
    pub entity_id: EntityId,
    pub version_num: u32,
    pub title: String,
    pub created: DateTime<Utc>,
    pub created_by: Option<UserId>,
}

/// Explicit tri-valued head state (§4.3, §9 "tri-valued null semantics").
///
/// Never rely on `Option<Option<VersionId>>` or native SQL null-equality to
/// reason about drafts/published heads — match on this enum instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadState {
    /// No head row exists: a version was never created for this entity.
    NeverHad,
    /// The head currently points at a live version.
    Points(VersionId),
    /// A head row exists but points at no version (soft-deleted/withdrawn).
    Withdrawn,
}

impl HeadState {
    pub fn version(self) -> Option<VersionId> {
        match self {
            HeadState::Points(v) => Some(v),
            HeadState::NeverHad | HeadState::Withdrawn => None,
        }
    }

    pub fn from_row(had_row: bool, version: Option<VersionId>) -> Self {
        if !had_row {
            HeadState::NeverHad
        } else {
            match version {
                Some(v) => HeadState::Points(v),
                None => HeadState::Withdrawn,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub entity_id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerVersion {
    pub version_id: VersionId,
    pub container_entity_id: EntityId,
    pub entity_list_id: EntityListId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityListRow {
    pub entity_list_id: EntityListId,
    pub order_num: u32,
    pub entity_id: EntityId,
    /// `Some` = pinned to this exact version. `None` = unpinned, follows the
    /// current draft/published head of `entity_id` depending on query mode.
    pub entity_version_id: Option<VersionId>,
}

impl EntityListRow {
    pub fn is_pinned(&self) -> bool {
        self.entity_version_id.is_some()
    }
}

/// One row a caller supplies when building/replacing a container's children.
#[derive(Debug, Clone)]
pub struct NewEntityListRow {
    pub entity_id: EntityId,
    pub entity_version_id: Option<VersionId>,
}

/// The effective content of a container, resolved for one query mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerEntityListEntry {
    pub entity_id: EntityId,
    pub version_id: VersionId,
    pub pinned: bool,
}

/// Action describing what kind of edit `create_next_container_version` is
/// performing on a container's child rows (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerEditAction {
    /// Replace the entire row set with the caller-supplied rows.
    Replace,
    /// Append caller-supplied rows to the end of the existing list.
    Append,
    /// Remove the caller-supplied entities from the existing list.
    Remove,
}

/// Which head a read should resolve unpinned rows against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveMode {
    Draft,
    Published,
    PublishedAsOf(PublishLogId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftChangeLog {
    pub id: DraftChangeLogId,
    pub uuid: Uuid,
    pub package_id: PackageId,
    pub changed_at: DateTime<Utc>,
    pub changed_by: Option<UserId>,
    pub records: Vec<DraftChangeLogRecord>,
    pub side_effects: Vec<DraftSideEffect>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftChangeLogRecord {
    pub id: DraftChangeLogRecordId,
    pub entity_id: EntityId,
    pub old_version: Option<VersionId>,
    pub new_version: Option<VersionId>,
}

/// Links a direct change (`cause_record_id`) to a container record further
/// up the tree whose effective content changed as a result
/// (`effect_record_id`), without its own version being bumped — the
/// `old_version == new_version` convention on the effect record (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSideEffect {
    pub draft_change_log_id: DraftChangeLogId,
    pub cause_record_id: DraftChangeLogRecordId,
    pub effect_record_id: DraftChangeLogRecordId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishSideEffect {
    pub publish_log_id: PublishLogId,
    pub cause_record_id: PublishLogRecordId,
    pub effect_record_id: PublishLogRecordId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishLog {
    pub id: PublishLogId,
    pub uuid: Uuid,
    pub package_id: PackageId,
    pub message: String,
    pub published_at: DateTime<Utc>,
    pub published_by: Option<UserId>,
    pub records: Vec<PublishLogRecord>,
    pub side_effects: Vec<PublishSideEffect>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishLogRecord {
    pub id: PublishLogRecordId,
    pub entity_id: EntityId,
    pub old_version: Option<VersionId>,
    pub new_version: Option<VersionId>,
    pub dependencies_hash: String,
}
