//! SQLx row types, isolating `FromRow` derives from `publishing-core`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use publishing_core::ids::{
    DraftChangeLogId, DraftChangeLogRecordId, EntityId, EntityListId, PackageId, PublishLogId,
    PublishLogRecordId, UserId, VersionId,
};
use publishing_core::model::{
    ContainerVersion, EntityListRow, LearningPackage, PublishableEntity,
    PublishableEntityVersion,
};

#[derive(sqlx::FromRow)]
pub struct PackageRow {
    pub id: i32,
    pub uuid: Uuid,
    pub key: String,
    pub title: String,
    pub description: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl From<PackageRow> for LearningPackage {
    fn from(r: PackageRow) -> Self {
        LearningPackage {
            id: PackageId(r.id),
            uuid: r.uuid,
            key: r.key,
            title: r.title,
            description: r.description,
            created: r.created,
            updated: r.updated,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct EntityRow {
    pub id: i32,
    pub uuid: Uuid,
    pub learning_package_id: i32,
    pub key: String,
    pub created: DateTime<Utc>,
    pub created_by: Option<i64>,
    pub can_stand_alone: bool,
    pub kind: Option<String>,
}

impl From<EntityRow> for PublishableEntity {
    fn from(r: EntityRow) -> Self {
        PublishableEntity {
            id: EntityId(r.id),
            uuid: r.uuid,
            package_id: PackageId(r.learning_package_id),
            key: r.key,
            created: r.created,
            created_by: r.created_by.map(UserId),
            can_stand_alone: r.can_stand_alone,
            kind: r.kind,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct VersionRow {
    pub id: i32,
    pub uuid: Uuid,
    pub entity_id: i32,
    pub version_num: i32,
    pub title: String,
    pub created: DateTime<Utc>,
    pub created_by: Option<i64>,
}

impl From<VersionRow> for PublishableEntityVersion {
    fn from(r: VersionRow) -> Self {
        PublishableEntityVersion {
            id: VersionId(r.id),
            uuid: r.uuid,
            entity_id: EntityId(r.entity_id),
            version_num: r.version_num as u32,
            title: r.title,
            created: r.created,
            created_by: r.created_by.map(UserId),
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct EntityListRowRow {
    pub entity_list_id: i32,
    pub order_num: i32,
    pub entity_id: i32,
    pub entity_version_id: Option<i32>,
}

impl From<EntityListRowRow> for EntityListRow {
    fn from(r: EntityListRowRow) -> Self {
        EntityListRow {
            entity_list_id: EntityListId(r.entity_list_id),
            order_num: r.order_num as u32,
            entity_id: EntityId(r.entity_id),
            entity_version_id: r.entity_version_id.map(VersionId),
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct ContainerVersionRow {
    pub version_id: i32,
    pub container_entity_id: i32,
    pub entity_list_id: i32,
}

impl From<ContainerVersionRow> for ContainerVersion {
    fn from(r: ContainerVersionRow) -> Self {
        ContainerVersion {
            version_id: VersionId(r.version_id),
            container_entity_id: EntityId(r.container_entity_id),
            entity_list_id: EntityListId(r.entity_list_id),
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct DraftChangeLogRow {
    pub id: i32,
    pub uuid: Uuid,
    pub learning_package_id: i32,
    pub changed_at: DateTime<Utc>,
    pub changed_by: Option<i64>,
}

#[derive(sqlx::FromRow)]
pub struct DraftChangeLogRecordRow {
    pub id: i32,
    pub entity_id: i32,
    pub old_version_id: Option<i32>,
    pub new_version_id: Option<i32>,
}

#[derive(sqlx::FromRow)]
pub struct DraftSideEffectRow {
    pub draft_change_log_id: i32,
    pub cause_record_id: i32,
    pub effect_record_id: i32,
}

#[derive(sqlx::FromRow)]
pub struct PublishLogRow {
    pub id: i32,
    pub uuid: Uuid,
    pub learning_package_id: i32,
    pub message: String,
    pub published_at: DateTime<Utc>,
    pub published_by: Option<i64>,
}

#[derive(sqlx::FromRow)]
pub struct PublishLogRecordRow {
    pub id: i32,
    pub entity_id: i32,
    pub old_version_id: Option<i32>,
    pub new_version_id: Option<i32>,
    pub dependencies_hash_digest: String,
}

#[derive(sqlx::FromRow)]
pub struct PublishSideEffectRow {
    pub publish_log_id: i32,
    pub cause_record_id: i32,
    pub effect_record_id: i32,
}

pub fn draft_log_record_id(id: i32) -> DraftChangeLogRecordId {
    DraftChangeLogRecordId(id)
}

pub fn publish_log_record_id(id: i32) -> PublishLogRecordId {
    PublishLogRecordId(id)
}

pub fn draft_log_id(id: i32) -> DraftChangeLogId {
    DraftChangeLogId(id)
}

pub fn publish_log_id(id: i32) -> PublishLogId {
    PublishLogId(id)
}
