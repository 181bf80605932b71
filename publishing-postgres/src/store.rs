//! Postgres implementation of `PublishingStore`.
//!
//! All SQL is runtime-checked (`sqlx::query`/`query_as`, not `sqlx::query!`)
//! so the crate builds without a live `DATABASE_URL`, mirroring
//! `sem_os_postgres::store`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use publishing_core::error::Result;
use publishing_core::ids::{
    DraftChangeLogId, EntityId, EntityListId, PackageId, PublishLogId, UserId, VersionId,
};
use publishing_core::model::{
    ContainerEntityListEntry, ContainerVersion, DraftChangeLog, DraftChangeLogRecord,
    DraftSideEffect, EffectiveMode, EntityListRow, HeadState, LearningPackage, NewEntity,
    NewEntityListRow, NewPackage, NewVersion, PackageUpdate, PublishLog, PublishLogRecord,
    PublishSideEffect, PublishableEntity, PublishableEntityVersion,
};
use publishing_core::store::PublishingStore;

use crate::error_map::{map_already_exists, map_not_found, map_store};
use crate::rows::{
    draft_log_id, draft_log_record_id, publish_log_id, publish_log_record_id,
    ContainerVersionRow, DraftChangeLogRecordRow, DraftChangeLogRow, DraftSideEffectRow,
    EntityListRowRow, EntityRow, PackageRow, PublishLogRecordRow, PublishLogRow,
    PublishSideEffectRow, VersionRow,
};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn head(&self, table: &'static str, entity_id: EntityId) -> Result<HeadState> {
        let row: Option<(Option<i32>,)> = sqlx::query_as(&format!(
            "SELECT version_id FROM {table} WHERE entity_id = $1"
        ))
        .bind(entity_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_store)?;

        Ok(match row {
            None => HeadState::NeverHad,
            Some((None,)) => HeadState::Withdrawn,
            Some((Some(v),)) => HeadState::Points(VersionId(v)),
        })
    }
}

#[async_trait]
impl PublishingStore for PgStore {
    // ── Packages ────────────────────────────────────────────────────

    async fn create_package(&self, new_package: NewPackage) -> Result<LearningPackage> {
        let now = new_package.created.unwrap_or_else(Utc::now);
        let row: PackageRow = sqlx::query_as(
            r#"
            INSERT INTO learning_packages (key, title, description, created, updated)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, uuid, key, title, description, created, updated
            "#,
        )
        .bind(&new_package.key)
        .bind(&new_package.title)
        .bind(&new_package.description)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_already_exists("learning_package", &new_package.key))?;
        Ok(row.into())
    }

    async fn get_package(&self, id: PackageId) -> Result<LearningPackage> {
        let row: PackageRow = sqlx::query_as(
            "SELECT id, uuid, key, title, description, created, updated FROM learning_packages WHERE id = $1",
        )
        .bind(id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(map_not_found("learning_package", id))?;
        Ok(row.into())
    }

    async fn get_package_by_key(&self, key: &str) -> Result<LearningPackage> {
        let row: PackageRow = sqlx::query_as(
            "SELECT id, uuid, key, title, description, created, updated FROM learning_packages WHERE key = $1",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await
        .map_err(map_not_found("learning_package", key))?;
        Ok(row.into())
    }

    async fn update_package(&self, id: PackageId, update: PackageUpdate) -> Result<LearningPackage> {
        let current = self.get_package(id).await?;
        let key = update.key.unwrap_or(current.key);
        let title = update.title.unwrap_or(current.title);
        let description = update.description.unwrap_or(current.description);
        let updated = update.updated.unwrap_or_else(Utc::now);

        let row: PackageRow = sqlx::query_as(
            r#"
            UPDATE learning_packages SET key = $2, title = $3, description = $4, updated = $5
            WHERE id = $1
            RETURNING id, uuid, key, title, description, created, updated
            "#,
        )
        .bind(id.0)
        .bind(&key)
        .bind(&title)
        .bind(&description)
        .bind(updated)
        .fetch_one(&self.pool)
        .await
        .map_err(map_already_exists("learning_package", &key))?;
        Ok(row.into())
    }

    // ── Entities & versions ────────────────────────────────────────

    async fn create_entity(&self, new_entity: NewEntity) -> Result<PublishableEntity> {
        let row: EntityRow = sqlx::query_as(
            r#"
            INSERT INTO publishable_entities
                (learning_package_id, key, created, created_by, can_stand_alone, kind)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, uuid, learning_package_id, key, created, created_by, can_stand_alone, kind
            "#,
        )
        .bind(new_entity.package_id.0)
        .bind(&new_entity.key)
        .bind(new_entity.created)
        .bind(new_entity.created_by.map(|u| u.0))
        .bind(new_entity.can_stand_alone)
        .bind(&new_entity.kind)
        .fetch_one(&self.pool)
        .await
        .map_err(map_already_exists("publishable_entity", &new_entity.key))?;
        Ok(row.into())
    }

    async fn get_entity(&self, id: EntityId) -> Result<PublishableEntity> {
        let row: EntityRow = sqlx::query_as(
            "SELECT id, uuid, learning_package_id, key, created, created_by, can_stand_alone, kind \
             FROM publishable_entities WHERE id = $1",
        )
        .bind(id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(map_not_found("publishable_entity", id))?;
        Ok(row.into())
    }

    async fn get_entity_by_key(&self, package_id: PackageId, key: &str) -> Result<PublishableEntity> {
        let row: EntityRow = sqlx::query_as(
            "SELECT id, uuid, learning_package_id, key, created, created_by, can_stand_alone, kind \
             FROM publishable_entities WHERE learning_package_id = $1 AND key = $2",
        )
        .bind(package_id.0)
        .bind(key)
        .fetch_one(&self.pool)
        .await
        .map_err(map_not_found("publishable_entity", key))?;
        Ok(row.into())
    }

    async fn set_entity_kind(&self, id: EntityId, kind: &str) -> Result<()> {
        sqlx::query("UPDATE publishable_entities SET kind = $2 WHERE id = $1")
            .bind(id.0)
            .bind(kind)
            .execute(&self.pool)
            .await
            .map_err(map_store)?;
        sqlx::query("INSERT INTO containers (entity_id) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(map_store)?;
        Ok(())
    }

    async fn create_version(&self, new_version: NewVersion) -> Result<PublishableEntityVersion> {
        let row: VersionRow = sqlx::query_as(
            r#"
            INSERT INTO publishable_entity_versions (entity_id, version_num, title, created, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, uuid, entity_id, version_num, title, created, created_by
            "#,
        )
        .bind(new_version.entity_id.0)
        .bind(new_version.version_num as i32)
        .bind(&new_version.title)
        .bind(new_version.created)
        .bind(new_version.created_by.map(|u| u.0))
        .fetch_one(&self.pool)
        .await
        .map_err(map_already_exists("publishable_entity_version", new_version.version_num))?;
        Ok(row.into())
    }

    async fn get_version(&self, id: VersionId) -> Result<PublishableEntityVersion> {
        let row: VersionRow = sqlx::query_as(
            "SELECT id, uuid, entity_id, version_num, title, created, created_by \
             FROM publishable_entity_versions WHERE id = $1",
        )
        .bind(id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(map_not_found("publishable_entity_version", id))?;
        Ok(row.into())
    }

    async fn latest_version(&self, entity_id: EntityId) -> Result<PublishableEntityVersion> {
        let row: VersionRow = sqlx::query_as(
            "SELECT id, uuid, entity_id, version_num, title, created, created_by \
             FROM publishable_entity_versions WHERE entity_id = $1 ORDER BY version_num DESC LIMIT 1",
        )
        .bind(entity_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(map_not_found("publishable_entity_version", entity_id))?;
        Ok(row.into())
    }

    async fn latest_version_num(&self, entity_id: EntityId) -> Result<u32> {
        let row: (Option<i32>,) = sqlx::query_as(
            "SELECT MAX(version_num) FROM publishable_entity_versions WHERE entity_id = $1",
        )
        .bind(entity_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(map_store)?;
        Ok(row.0.unwrap_or(0) as u32)
    }

    // ── Heads ───────────────────────────────────────────────────────

    async fn draft_head(&self, entity_id: EntityId) -> Result<HeadState> {
        self.head("drafts", entity_id).await
    }

    async fn published_head(&self, entity_id: EntityId) -> Result<HeadState> {
        self.head("published", entity_id).await
    }

    async fn set_draft_head(&self, entity_id: EntityId, version: Option<VersionId>) -> Result<HeadState> {
        let prior = self.draft_head(entity_id).await?;
        sqlx::query(
            r#"
            INSERT INTO drafts (entity_id, version_id) VALUES ($1, $2)
            ON CONFLICT (entity_id) DO UPDATE SET version_id = EXCLUDED.version_id
            "#,
        )
        .bind(entity_id.0)
        .bind(version.map(|v| v.0))
        .execute(&self.pool)
        .await
        .map_err(map_store)?;
        Ok(prior)
    }

    async fn append_draft_change_log_record(
        &self,
        log_id: DraftChangeLogId,
        entity_id: EntityId,
        old_version: Option<VersionId>,
        new_version: Option<VersionId>,
    ) -> Result<publishing_core::ids::DraftChangeLogRecordId> {
        let row: (i32,) = sqlx::query_as(
            r#"
            INSERT INTO draft_change_log_records (draft_change_log_id, entity_id, old_version_id, new_version_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (draft_change_log_id, entity_id)
            DO UPDATE SET new_version_id = EXCLUDED.new_version_id
            RETURNING id
            "#,
        )
        .bind(log_id.0)
        .bind(entity_id.0)
        .bind(old_version.map(|v| v.0))
        .bind(new_version.map(|v| v.0))
        .fetch_one(&self.pool)
        .await
        .map_err(map_store)?;
        Ok(draft_log_record_id(row.0))
    }

    async fn add_draft_side_effect(&self, side_effect: DraftSideEffect) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO draft_side_effects (draft_change_log_id, cause_record_id, effect_record_id)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(side_effect.draft_change_log_id.0)
        .bind(side_effect.cause_record_id.0)
        .bind(side_effect.effect_record_id.0)
        .execute(&self.pool)
        .await
        .map_err(map_store)?;
        Ok(())
    }

    // ── Containers & entity lists ───────────────────────────────────

    async fn create_entity_list(&self, rows: &[NewEntityListRow]) -> Result<EntityListId> {
        let (id,): (i32,) = sqlx::query_as("INSERT INTO entity_lists DEFAULT VALUES RETURNING id")
            .fetch_one(&self.pool)
            .await
            .map_err(map_store)?;

        for (i, row) in rows.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO entity_list_rows (entity_list_id, order_num, entity_id, entity_version_id)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(id)
            .bind(i as i32)
            .bind(row.entity_id.0)
            .bind(row.entity_version_id.map(|v| v.0))
            .execute(&self.pool)
            .await
            .map_err(map_store)?;
        }
        Ok(EntityListId(id))
    }

    async fn get_entity_list_rows(&self, id: EntityListId) -> Result<Vec<EntityListRow>> {
        let rows: Vec<EntityListRowRow> = sqlx::query_as(
            "SELECT entity_list_id, order_num, entity_id, entity_version_id \
             FROM entity_list_rows WHERE entity_list_id = $1 ORDER BY order_num",
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_store)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_container_version(
        &self,
        container_entity_id: EntityId,
        version_num: u32,
        title: &str,
        entity_list_id: EntityListId,
        created: DateTime<Utc>,
        created_by: Option<UserId>,
    ) -> Result<ContainerVersion> {
        sqlx::query("INSERT INTO containers (entity_id) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(container_entity_id.0)
            .execute(&self.pool)
            .await
            .map_err(map_store)?;

        let version: VersionRow = sqlx::query_as(
            r#"
            INSERT INTO publishable_entity_versions (entity_id, version_num, title, created, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, uuid, entity_id, version_num, title, created, created_by
            "#,
        )
        .bind(container_entity_id.0)
        .bind(version_num as i32)
        .bind(title)
        .bind(created)
        .bind(created_by.map(|u| u.0))
        .fetch_one(&self.pool)
        .await
        .map_err(map_already_exists("publishable_entity_version", version_num))?;

        let row: ContainerVersionRow = sqlx::query_as(
            r#"
            INSERT INTO container_versions (version_id, container_entity_id, entity_list_id)
            VALUES ($1, $2, $3)
            RETURNING version_id, container_entity_id, entity_list_id
            "#,
        )
        .bind(version.id)
        .bind(container_entity_id.0)
        .bind(entity_list_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(map_store)?;
        Ok(row.into())
    }

    async fn get_container_version(&self, version_id: VersionId) -> Result<ContainerVersion> {
        let row: ContainerVersionRow = sqlx::query_as(
            "SELECT version_id, container_entity_id, entity_list_id FROM container_versions WHERE version_id = $1",
        )
        .bind(version_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(map_not_found("container_version", version_id))?;
        Ok(row.into())
    }

    async fn resolve_container_children(
        &self,
        container_entity_id: EntityId,
        mode: EffectiveMode,
    ) -> Result<Vec<ContainerEntityListEntry>> {
        let version_id = match mode {
            EffectiveMode::Draft => self.draft_head(container_entity_id).await?.version(),
            EffectiveMode::Published => self.published_head(container_entity_id).await?.version(),
            EffectiveMode::PublishedAsOf(log_id) => {
                self.published_version_as_of(container_entity_id, log_id).await?
            }
        };
        let Some(version_id) = version_id else { return Ok(Vec::new()) };

        let container_version = self.get_container_version(version_id).await?;
        let rows = self.get_entity_list_rows(container_version.entity_list_id).await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let resolved = match row.entity_version_id {
                Some(pinned) => Some(pinned),
                None => match mode {
                    EffectiveMode::Draft => self.draft_head(row.entity_id).await?.version(),
                    EffectiveMode::Published => self.published_head(row.entity_id).await?.version(),
                    EffectiveMode::PublishedAsOf(log_id) => {
                        self.published_version_as_of(row.entity_id, log_id).await?
                    }
                },
            };
            if let Some(version_id) = resolved {
                entries.push(ContainerEntityListEntry {
                    entity_id: row.entity_id,
                    version_id,
                    pinned: row.is_pinned(),
                });
            }
        }
        Ok(entries)
    }

    async fn direct_parent_containers(&self, entity_id: EntityId) -> Result<Vec<EntityId>> {
        let rows: Vec<(i32,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT cv.container_entity_id
            FROM container_versions cv
            JOIN entity_list_rows elr ON elr.entity_list_id = cv.entity_list_id
            JOIN drafts d ON d.entity_id = cv.container_entity_id AND d.version_id = cv.version_id
            WHERE elr.entity_id = $1
            "#,
        )
        .bind(entity_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_store)?;
        Ok(rows.into_iter().map(|(id,)| EntityId(id)).collect())
    }

    // ── Bulk-change sessions / Draft Log ────────────────────────────

    async fn open_draft_change_log(
        &self,
        package_id: PackageId,
        changed_at: DateTime<Utc>,
        changed_by: Option<UserId>,
    ) -> Result<DraftChangeLogId> {
        let (id,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO draft_change_logs (learning_package_id, changed_at, changed_by)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(package_id.0)
        .bind(changed_at)
        .bind(changed_by.map(|u| u.0))
        .fetch_one(&self.pool)
        .await
        .map_err(map_store)?;
        Ok(draft_log_id(id))
    }

    async fn close_draft_change_log(&self, id: DraftChangeLogId) -> Result<DraftChangeLog> {
        self.get_draft_change_log(id).await
    }

    async fn get_draft_change_log(&self, id: DraftChangeLogId) -> Result<DraftChangeLog> {
        let log: DraftChangeLogRow = sqlx::query_as(
            "SELECT id, uuid, learning_package_id, changed_at, changed_by FROM draft_change_logs WHERE id = $1",
        )
        .bind(id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(map_not_found("draft_change_log", id))?;

        let record_rows: Vec<DraftChangeLogRecordRow> = sqlx::query_as(
            "SELECT id, entity_id, old_version_id, new_version_id FROM draft_change_log_records WHERE draft_change_log_id = $1",
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_store)?;

        let side_effect_rows: Vec<DraftSideEffectRow> = sqlx::query_as(
            "SELECT draft_change_log_id, cause_record_id, effect_record_id FROM draft_side_effects WHERE draft_change_log_id = $1",
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_store)?;

        Ok(DraftChangeLog {
            id: draft_log_id(log.id),
            uuid: log.uuid,
            package_id: PackageId(log.learning_package_id),
            changed_at: log.changed_at,
            changed_by: log.changed_by.map(UserId),
            records: record_rows
                .into_iter()
                .map(|r| DraftChangeLogRecord {
                    id: draft_log_record_id(r.id),
                    entity_id: EntityId(r.entity_id),
                    old_version: r.old_version_id.map(VersionId),
                    new_version: r.new_version_id.map(VersionId),
                })
                .collect(),
            side_effects: side_effect_rows
                .into_iter()
                .map(|r| DraftSideEffect {
                    draft_change_log_id: draft_log_id(r.draft_change_log_id),
                    cause_record_id: draft_log_record_id(r.cause_record_id),
                    effect_record_id: draft_log_record_id(r.effect_record_id),
                })
                .collect(),
        })
    }

    // ── Publish ─────────────────────────────────────────────────────

    async fn get_publish_log(&self, id: PublishLogId) -> Result<PublishLog> {
        let log: PublishLogRow = sqlx::query_as(
            "SELECT id, uuid, learning_package_id, message, published_at, published_by FROM publish_logs WHERE id = $1",
        )
        .bind(id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(map_not_found("publish_log", id))?;

        let record_rows: Vec<PublishLogRecordRow> = sqlx::query_as(
            "SELECT id, entity_id, old_version_id, new_version_id, dependencies_hash_digest \
             FROM publish_log_records WHERE publish_log_id = $1",
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_store)?;

        let side_effect_rows: Vec<PublishSideEffectRow> = sqlx::query_as(
            "SELECT publish_log_id, cause_record_id, effect_record_id FROM publish_side_effects WHERE publish_log_id = $1",
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_store)?;

        Ok(PublishLog {
            id: publish_log_id(log.id),
            uuid: log.uuid,
            package_id: PackageId(log.learning_package_id),
            message: log.message,
            published_at: log.published_at,
            published_by: log.published_by.map(UserId),
            records: record_rows
                .into_iter()
                .map(|r| PublishLogRecord {
                    id: publish_log_record_id(r.id),
                    entity_id: EntityId(r.entity_id),
                    old_version: r.old_version_id.map(VersionId),
                    new_version: r.new_version_id.map(VersionId),
                    dependencies_hash: r.dependencies_hash_digest,
                })
                .collect(),
            side_effects: side_effect_rows
                .into_iter()
                .map(|r| PublishSideEffect {
                    publish_log_id: publish_log_id(r.publish_log_id),
                    cause_record_id: publish_log_record_id(r.cause_record_id),
                    effect_record_id: publish_log_record_id(r.effect_record_id),
                })
                .collect(),
        })
    }

    async fn latest_publish_log(&self, package_id: PackageId) -> Result<Option<PublishLog>> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT id FROM publish_logs WHERE learning_package_id = $1 ORDER BY published_at DESC, id DESC LIMIT 1",
        )
        .bind(package_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_store)?;
        match row {
            None => Ok(None),
            Some((id,)) => Ok(Some(self.get_publish_log(publish_log_id(id)).await?)),
        }
    }

    async fn apply_publish(
        &self,
        package_id: PackageId,
        message: &str,
        published_at: DateTime<Utc>,
        published_by: Option<UserId>,
        records: Vec<PublishLogRecord>,
        side_effects: Vec<(usize, usize)>,
    ) -> Result<PublishLog> {
        let (log_id,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO publish_logs (learning_package_id, message, published_at, published_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(package_id.0)
        .bind(message)
        .bind(published_at)
        .bind(published_by.map(|u| u.0))
        .fetch_one(&self.pool)
        .await
        .map_err(map_store)?;

        let mut record_ids = Vec::with_capacity(records.len());
        for record in &records {
            let (record_id,): (i32,) = sqlx::query_as(
                r#"
                INSERT INTO publish_log_records
                    (publish_log_id, entity_id, old_version_id, new_version_id, dependencies_hash_digest)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(log_id)
            .bind(record.entity_id.0)
            .bind(record.old_version.map(|v| v.0))
            .bind(record.new_version.map(|v| v.0))
            .bind(&record.dependencies_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_store)?;

            sqlx::query(
                r#"
                INSERT INTO published (entity_id, version_id, publish_log_record_id)
                VALUES ($1, $2, $3)
                ON CONFLICT (entity_id) DO UPDATE SET version_id = EXCLUDED.version_id, publish_log_record_id = EXCLUDED.publish_log_record_id
                "#,
            )
            .bind(record.entity_id.0)
            .bind(record.new_version.map(|v| v.0))
            .bind(record_id)
            .execute(&self.pool)
            .await
            .map_err(map_store)?;

            record_ids.push(record_id);
        }

        for (cause_idx, effect_idx) in side_effects {
            let Some(&cause_id) = record_ids.get(cause_idx) else { continue };
            let Some(&effect_id) = record_ids.get(effect_idx) else { continue };
            if cause_id == effect_id {
                continue;
            }
            sqlx::query(
                r#"
                INSERT INTO publish_side_effects (publish_log_id, cause_record_id, effect_record_id)
                VALUES ($1, $2, $3)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(log_id)
            .bind(cause_id)
            .bind(effect_id)
            .execute(&self.pool)
            .await
            .map_err(map_store)?;
        }

        self.get_publish_log(publish_log_id(log_id)).await
    }

    async fn entities_with_unpublished_changes(
        &self,
        package_id: PackageId,
        include_deletes: bool,
    ) -> Result<Vec<EntityId>> {
        let rows: Vec<(i32,)> = sqlx::query_as(
            r#"
            SELECT d.entity_id
            FROM drafts d
            JOIN publishable_entities e ON e.id = d.entity_id
            LEFT JOIN published p ON p.entity_id = d.entity_id
            WHERE e.learning_package_id = $1
              AND d.version_id IS DISTINCT FROM p.version_id
              AND ($2 OR NOT (d.version_id IS NULL AND p.version_id IS NOT NULL))
            "#,
        )
        .bind(package_id.0)
        .bind(include_deletes)
        .fetch_all(&self.pool)
        .await
        .map_err(map_store)?;
        Ok(rows.into_iter().map(|(id,)| EntityId(id)).collect())
    }

    async fn published_version_as_of(
        &self,
        entity_id: EntityId,
        publish_log_id: PublishLogId,
    ) -> Result<Option<VersionId>> {
        let row: Option<(Option<i32>,)> = sqlx::query_as(
            r#"
            SELECT new_version_id
            FROM publish_log_records
            WHERE entity_id = $1 AND publish_log_id <= $2
            ORDER BY publish_log_id DESC
            LIMIT 1
            "#,
        )
        .bind(entity_id.0)
        .bind(publish_log_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_store)?;
        Ok(row.and_then(|(v,)| v).map(VersionId))
    }

    // ── Query surface ───────────────────────────────────────────────

    async fn list_entities(&self, package_id: PackageId) -> Result<Vec<PublishableEntity>> {
        let rows: Vec<EntityRow> = sqlx::query_as(
            "SELECT id, uuid, learning_package_id, key, created, created_by, can_stand_alone, kind \
             FROM publishable_entities WHERE learning_package_id = $1 ORDER BY id",
        )
        .bind(package_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_store)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_versions(&self, entity_id: EntityId) -> Result<Vec<PublishableEntityVersion>> {
        let rows: Vec<VersionRow> = sqlx::query_as(
            "SELECT id, uuid, entity_id, version_num, title, created, created_by \
             FROM publishable_entity_versions WHERE entity_id = $1 ORDER BY version_num",
        )
        .bind(entity_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_store)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
