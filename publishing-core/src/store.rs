//! The `PublishingStore` port (§4, §6).
//!
//! Grounded in `sem_os_core::authoring::ports::AuthoringStore`: one
//! `#[async_trait]` trait with no generic lifetime or associated storage
//! type, implemented by a separate adapter crate that owns its connection
//! pool and transaction handling internally. `publishing-core` itself never
//! names `sqlx`.
//!
//! Bulk-change sessions (§4.5, the "Draft Log") are modeled as an explicit
//! `DraftChangeLogId` handle rather than a borrowed transaction object: a
//! caller opens one with `open_draft_change_log`, threads its id through
//! any number of mutating calls, and closes it with `close_draft_change_log`.
//! Passing `None` for the log id lets an adapter open and close a one-off
//! log around a single mutation, matching the original's "auto bulk_update"
//! convenience for single-call sites.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::ids::{
    DraftChangeLogId, DraftChangeLogRecordId, EntityId, EntityListId, PackageId, PublishLogId,
    UserId, VersionId,
};
use crate::model::{
    ContainerEntityListEntry, ContainerVersion, DraftChangeLog, DraftSideEffect, EffectiveMode,
    EntityListRow, HeadState, LearningPackage, NewEntity, NewEntityListRow, NewPackage,
    NewVersion, PackageUpdate, PublishLog, PublishLogRecord, PublishableEntity,
    PublishableEntityVersion,
};

#[async_trait]
pub trait PublishingStore: Send + Sync {
    // ── Packages (§4.1) ────────────────────────────────────────────

    async fn create_package(&self, new_package: NewPackage) -> Result<LearningPackage>;

    async fn get_package(&self, id: PackageId) -> Result<LearningPackage>;

    async fn get_package_by_key(&self, key: &str) -> Result<LearningPackage>;

    async fn update_package(&self, id: PackageId, update: PackageUpdate) -> Result<LearningPackage>;

    // ── Entities & versions (§4.1, §4.2) ───────────────────────────

    async fn create_entity(&self, new_entity: NewEntity) -> Result<PublishableEntity>;

    async fn get_entity(&self, id: EntityId) -> Result<PublishableEntity>;

    async fn get_entity_by_key(&self, package_id: PackageId, key: &str) -> Result<PublishableEntity>;

    async fn set_entity_kind(&self, id: EntityId, kind: &str) -> Result<()>;

    async fn create_version(&self, new_version: NewVersion) -> Result<PublishableEntityVersion>;

    async fn get_version(&self, id: VersionId) -> Result<PublishableEntityVersion>;

    /// The highest-numbered version of `entity_id`.
    async fn latest_version(&self, entity_id: EntityId) -> Result<PublishableEntityVersion>;

    async fn latest_version_num(&self, entity_id: EntityId) -> Result<u32>;

    // ── Heads (§4.3) ────────────────────────────────────────────────

    async fn draft_head(&self, entity_id: EntityId) -> Result<HeadState>;

    async fn published_head(&self, entity_id: EntityId) -> Result<HeadState>;

    /// Sets the draft head for `entity_id` to `version` (`None` = withdraw).
    /// Returns the prior draft head so callers can populate
    /// `DraftChangeLogRecord.old_version`. Does not itself write any log
    /// record — callers append one via `append_draft_change_log_record`.
    async fn set_draft_head(
        &self,
        entity_id: EntityId,
        version: Option<VersionId>,
    ) -> Result<HeadState>;

    async fn append_draft_change_log_record(
        &self,
        log_id: DraftChangeLogId,
        entity_id: EntityId,
        old_version: Option<VersionId>,
        new_version: Option<VersionId>,
    ) -> Result<DraftChangeLogRecordId>;

    async fn add_draft_side_effect(&self, side_effect: DraftSideEffect) -> Result<()>;

    // ── Containers & entity lists (§4.4) ───────────────────────────

    async fn create_entity_list(&self, rows: &[NewEntityListRow]) -> Result<EntityListId>;

    async fn get_entity_list_rows(&self, id: EntityListId) -> Result<Vec<EntityListRow>>;

    async fn create_container_version(
        &self,
        container_entity_id: EntityId,
        version_num: u32,
        title: &str,
        entity_list_id: EntityListId,
        created: DateTime<Utc>,
        created_by: Option<UserId>,
    ) -> Result<ContainerVersion>;

    async fn get_container_version(&self, version_id: VersionId) -> Result<ContainerVersion>;

    /// Resolves the effective, ordered child list of `container_entity_id`
    /// under `mode`, following unpinned rows to the relevant head.
    async fn resolve_container_children(
        &self,
        container_entity_id: EntityId,
        mode: EffectiveMode,
    ) -> Result<Vec<ContainerEntityListEntry>>;

    /// All containers that currently list `entity_id` as a child (direct
    /// parents only; §4.4 ancestor propagation walks this repeatedly).
    async fn direct_parent_containers(&self, entity_id: EntityId) -> Result<Vec<EntityId>>;

    // ── Bulk-change sessions / Draft Log (§4.5) ────────────────────

    async fn open_draft_change_log(
        &self,
        package_id: PackageId,
        changed_at: DateTime<Utc>,
        changed_by: Option<UserId>,
    ) -> Result<DraftChangeLogId>;

    async fn close_draft_change_log(&self, id: DraftChangeLogId) -> Result<DraftChangeLog>;

    async fn get_draft_change_log(&self, id: DraftChangeLogId) -> Result<DraftChangeLog>;

    // ── Publish (§4.6) ──────────────────────────────────────────────

    async fn get_publish_log(&self, id: PublishLogId) -> Result<PublishLog>;

    async fn latest_publish_log(&self, package_id: PackageId) -> Result<Option<PublishLog>>;

    /// Applies `records` as the new published heads, atomically with
    /// inserting the `PublishLog` row and any `side_effects` linking records.
    async fn apply_publish(
        &self,
        package_id: PackageId,
        message: &str,
        published_at: DateTime<Utc>,
        published_by: Option<UserId>,
        records: Vec<PublishLogRecord>,
        side_effects: Vec<(usize, usize)>,
    ) -> Result<PublishLog>;

    /// Entities with unpublished draft changes in `package_id` (draft head
    /// != published head under the tri-valued comparison in §9).
    /// `include_deletes=false` excludes entities whose draft head is
    /// withdrawn while their published head is still live; `true` includes
    /// them alongside ordinary edits.
    async fn entities_with_unpublished_changes(
        &self,
        package_id: PackageId,
        include_deletes: bool,
    ) -> Result<Vec<EntityId>>;

    /// The version `entity_id` was published at as of `publish_log_id`: the
    /// `new_version` of the most recent `PublishLogRecord` for this entity
    /// with `publish_log_id <= target`, or `None` if it was never published
    /// by that point.
    async fn published_version_as_of(
        &self,
        entity_id: EntityId,
        publish_log_id: PublishLogId,
    ) -> Result<Option<VersionId>>;

    // ── Query surface (§7) ─────────────────────────────────────────

    async fn list_entities(&self, package_id: PackageId) -> Result<Vec<PublishableEntity>>;

    async fn list_versions(&self, entity_id: EntityId) -> Result<Vec<PublishableEntityVersion>>;
}
