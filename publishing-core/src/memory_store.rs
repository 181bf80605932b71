//! A lightweight in-memory `PublishingStore` for unit-testing pure engine
//! logic without a live database (§13), grounded in the teacher's practice
//! of keeping fast, DB-free tests for anything that doesn't genuinely need
//! SQL semantics to exercise. Not exported outside the crate: it backs
//! `publishing-core`'s own unit tests only, while `publishing-postgres`'s
//! integration tests exercise the real adapter.

#![cfg(test)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ids::{
    DraftChangeLogId, DraftChangeLogRecordId, EntityId, EntityListId, PackageId, PublishLogId,
    PublishLogRecordId, UserId, VersionId,
};
use crate::model::{
    ContainerEntityListEntry, ContainerVersion, DraftChangeLog, DraftChangeLogRecord,
    DraftSideEffect, EffectiveMode, EntityListRow, HeadState, LearningPackage, NewEntity,
    NewEntityListRow, NewPackage, NewVersion, PackageUpdate, PublishLog, PublishLogRecord,
    PublishSideEffect, PublishableEntity, PublishableEntityVersion,
};
use crate::registry;
use crate::store::PublishingStore;

#[derive(Default)]
struct State {
    packages: Vec<LearningPackage>,
    entities: Vec<PublishableEntity>,
    versions: Vec<PublishableEntityVersion>,
    drafts: HashMap<i32, Option<VersionId>>,
    published: HashMap<i32, Option<VersionId>>,
    entity_lists: Vec<Vec<EntityListRow>>,
    container_versions: Vec<ContainerVersion>,
    draft_logs: Vec<DraftChangeLog>,
    publish_logs: Vec<PublishLog>,
    next_record_id: i32,
}

/// In-memory `PublishingStore`. Every method takes the same lock for the
/// whole call, so there is no real concurrency to speak of — it exists to
/// test sequencing, not contention.
#[derive(Default)]
pub struct InMemoryStore(Mutex<State>);

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PublishingStore for InMemoryStore {
    async fn create_package(&self, new_package: NewPackage) -> Result<LearningPackage> {
        let mut state = self.0.lock().unwrap();
        if state.packages.iter().any(|p| p.key == new_package.key) {
            return Err(Error::already_exists("package", &new_package.key));
        }
        let now = new_package.created.unwrap_or_else(Utc::now);
        let package = LearningPackage {
            id: PackageId(state.packages.len() as i32 + 1),
            uuid: Uuid::new_v4(),
            key: new_package.key,
            title: new_package.title,
            description: new_package.description,
            created: now,
            updated: now,
        };
        state.packages.push(package.clone());
        Ok(package)
    }

    async fn get_package(&self, id: PackageId) -> Result<LearningPackage> {
        let state = self.0.lock().unwrap();
        state
            .packages
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found("package", id))
    }

    async fn get_package_by_key(&self, key: &str) -> Result<LearningPackage> {
        let state = self.0.lock().unwrap();
        state
            .packages
            .iter()
            .find(|p| p.key == key)
            .cloned()
            .ok_or_else(|| Error::not_found("package", key))
    }

    async fn update_package(&self, id: PackageId, update: PackageUpdate) -> Result<LearningPackage> {
        let mut state = self.0.lock().unwrap();
        let package = state
            .packages
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::not_found("package", id))?;
        if let Some(key) = update.key {
            package.key = key;
        }
        if let Some(title) = update.title {
            package.title = title;
        }
        if let Some(description) = update.description {
            package.description = description;
        }
        package.updated = update.updated.unwrap_or_else(Utc::now);
        Ok(package.clone())
    }

    async fn create_entity(&self, new_entity: NewEntity) -> Result<PublishableEntity> {
        let mut state = self.0.lock().unwrap();
        if state
            .entities
            .iter()
            .any(|e| e.package_id == new_entity.package_id && e.key == new_entity.key)
        {
            return Err(Error::already_exists("entity", &new_entity.key));
        }
        let entity = PublishableEntity {
            id: EntityId(state.entities.len() as i32 + 1),
            uuid: Uuid::new_v4(),
            package_id: new_entity.package_id,
            key: new_entity.key,
            created: new_entity.created,
            created_by: new_entity.created_by,
            can_stand_alone: new_entity.can_stand_alone,
            kind: new_entity.kind,
        };
        state.entities.push(entity.clone());
        Ok(entity)
    }

    async fn get_entity(&self, id: EntityId) -> Result<PublishableEntity> {
        let state = self.0.lock().unwrap();
        state.entities.iter().find(|e| e.id == id).cloned().ok_or_else(|| Error::not_found("entity", id))
    }

    async fn get_entity_by_key(&self, package_id: PackageId, key: &str) -> Result<PublishableEntity> {
        let state = self.0.lock().unwrap();
        state
            .entities
            .iter()
            .find(|e| e.package_id == package_id && e.key == key)
            .cloned()
            .ok_or_else(|| Error::not_found("entity", key))
    }

    async fn set_entity_kind(&self, id: EntityId, kind: &str) -> Result<()> {
        let mut state = self.0.lock().unwrap();
        let entity = state.entities.iter_mut().find(|e| e.id == id).ok_or_else(|| Error::not_found("entity", id))?;
        entity.kind = Some(kind.to_string());
        Ok(())
    }

    async fn create_version(&self, new_version: NewVersion) -> Result<PublishableEntityVersion> {
        let mut state = self.0.lock().unwrap();
        if state
            .versions
            .iter()
            .any(|v| v.entity_id == new_version.entity_id && v.version_num == new_version.version_num)
        {
            return Err(Error::conflict(format!(
                "version {} already exists for entity {}",
                new_version.version_num, new_version.entity_id
            )));
        }
        let version = PublishableEntityVersion {
            id: VersionId(state.versions.len() as i32 + 1),
            uuid: Uuid::new_v4(),
            entity_id: new_version.entity_id,
            version_num: new_version.version_num,
            title: new_version.title,
            created: new_version.created,
            created_by: new_version.created_by,
        };
        state.versions.push(version.clone());
        Ok(version)
    }

    async fn get_version(&self, id: VersionId) -> Result<PublishableEntityVersion> {
        let state = self.0.lock().unwrap();
        state.versions.iter().find(|v| v.id == id).cloned().ok_or_else(|| Error::not_found("version", id))
    }

    async fn latest_version(&self, entity_id: EntityId) -> Result<PublishableEntityVersion> {
        let state = self.0.lock().unwrap();
        state
            .versions
            .iter()
            .filter(|v| v.entity_id == entity_id)
            .max_by_key(|v| v.version_num)
            .cloned()
            .ok_or_else(|| Error::not_found("version", entity_id))
    }

    async fn latest_version_num(&self, entity_id: EntityId) -> Result<u32> {
        let state = self.0.lock().unwrap();
        Ok(state.versions.iter().filter(|v| v.entity_id == entity_id).map(|v| v.version_num).max().unwrap_or(0))
    }

    async fn draft_head(&self, entity_id: EntityId) -> Result<HeadState> {
        let state = self.0.lock().unwrap();
        match state.drafts.get(&entity_id.0) {
            None => Ok(HeadState::NeverHad),
            Some(v) => Ok(HeadState::from_row(true, *v)),
        }
    }

    async fn published_head(&self, entity_id: EntityId) -> Result<HeadState> {
        let state = self.0.lock().unwrap();
        match state.published.get(&entity_id.0) {
            None => Ok(HeadState::NeverHad),
            Some(v) => Ok(HeadState::from_row(true, *v)),
        }
    }

    async fn set_draft_head(&self, entity_id: EntityId, version: Option<VersionId>) -> Result<HeadState> {
        let mut state = self.0.lock().unwrap();
        let prior = match state.drafts.get(&entity_id.0) {
            None => HeadState::NeverHad,
            Some(v) => HeadState::from_row(true, *v),
        };
        state.drafts.insert(entity_id.0, version);
        Ok(prior)
    }

    async fn append_draft_change_log_record(
        &self,
        log_id: DraftChangeLogId,
        entity_id: EntityId,
        old_version: Option<VersionId>,
        new_version: Option<VersionId>,
    ) -> Result<DraftChangeLogRecordId> {
        let mut state = self.0.lock().unwrap();
        let record_id = DraftChangeLogRecordId(next_record_id(&mut state.next_record_id));
        let log =
            state.draft_logs.iter_mut().find(|l| l.id == log_id).ok_or_else(|| Error::not_found("draft log", log_id))?;
        if let Some(existing) = log.records.iter_mut().find(|r| r.entity_id == entity_id) {
            existing.new_version = new_version;
            Ok(existing.id)
        } else {
            log.records.push(DraftChangeLogRecord { id: record_id, entity_id, old_version, new_version });
            Ok(record_id)
        }
    }

    async fn add_draft_side_effect(&self, side_effect: DraftSideEffect) -> Result<()> {
        let mut state = self.0.lock().unwrap();
        let log = state
            .draft_logs
            .iter_mut()
            .find(|l| l.id == side_effect.draft_change_log_id)
            .ok_or_else(|| Error::not_found("draft log", side_effect.draft_change_log_id))?;
        log.side_effects.push(side_effect);
        Ok(())
    }

    async fn create_entity_list(&self, rows: &[NewEntityListRow]) -> Result<EntityListId> {
        let mut state = self.0.lock().unwrap();
        let id = EntityListId(state.entity_lists.len() as i32 + 1);
        let rows = rows
            .iter()
            .enumerate()
            .map(|(i, r)| EntityListRow {
                entity_list_id: id,
                order_num: i as u32,
                entity_id: r.entity_id,
                entity_version_id: r.entity_version_id,
            })
            .collect();
        state.entity_lists.push(rows);
        Ok(id)
    }

    async fn get_entity_list_rows(&self, id: EntityListId) -> Result<Vec<EntityListRow>> {
        let state = self.0.lock().unwrap();
        state
            .entity_lists
            .get((id.0 - 1) as usize)
            .cloned()
            .ok_or_else(|| Error::not_found("entity list", id))
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
        let mut state = self.0.lock().unwrap();
        if state
            .versions
            .iter()
            .any(|v| v.entity_id == container_entity_id && v.version_num == version_num)
        {
            return Err(Error::conflict(format!(
                "version {version_num} already exists for entity {container_entity_id}"
            )));
        }
        let version = PublishableEntityVersion {
            id: VersionId(state.versions.len() as i32 + 1),
            uuid: Uuid::new_v4(),
            entity_id: container_entity_id,
            version_num,
            title: title.to_string(),
            created,
            created_by,
        };
        state.versions.push(version.clone());
        let container_version =
            ContainerVersion { version_id: version.id, container_entity_id, entity_list_id };
        state.container_versions.push(container_version.clone());
        Ok(container_version)
    }

    async fn get_container_version(&self, version_id: VersionId) -> Result<ContainerVersion> {
        let state = self.0.lock().unwrap();
        state
            .container_versions
            .iter()
            .find(|v| v.version_id == version_id)
            .cloned()
            .ok_or_else(|| Error::not_found("container version", version_id))
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

        let mut out = Vec::new();
        for row in rows {
            let resolved = match row.entity_version_id {
                Some(v) => Some((v, true)),
                None => {
                    let head = match mode {
                        EffectiveMode::Draft => self.draft_head(row.entity_id).await?.version(),
                        EffectiveMode::Published => self.published_head(row.entity_id).await?.version(),
                        EffectiveMode::PublishedAsOf(log_id) => {
                            self.published_version_as_of(row.entity_id, log_id).await?
                        }
                    };
                    head.map(|v| (v, false))
                }
            };
            if let Some((version_id, pinned)) = resolved {
                out.push(ContainerEntityListEntry { entity_id: row.entity_id, version_id, pinned });
            }
        }
        Ok(out)
    }

    async fn direct_parent_containers(&self, entity_id: EntityId) -> Result<Vec<EntityId>> {
        let state = self.0.lock().unwrap();
        let mut out = Vec::new();
        for cv in &state.container_versions {
            let Some(&Some(draft_version)) = state.drafts.get(&cv.container_entity_id.0) else { continue };
            if draft_version != cv.version_id {
                continue;
            }
            if let Some(rows) = state.entity_lists.get((cv.entity_list_id.0 - 1) as usize) {
                if rows.iter().any(|r| r.entity_id == entity_id) {
                    out.push(cv.container_entity_id);
                }
            }
        }
        out.sort_by_key(|id| id.0);
        out.dedup();
        Ok(out)
    }

    async fn open_draft_change_log(
        &self,
        package_id: PackageId,
        changed_at: DateTime<Utc>,
        changed_by: Option<UserId>,
    ) -> Result<DraftChangeLogId> {
        let mut state = self.0.lock().unwrap();
        let id = DraftChangeLogId(state.draft_logs.len() as i32 + 1);
        state.draft_logs.push(DraftChangeLog {
            id,
            uuid: Uuid::new_v4(),
            package_id,
            changed_at,
            changed_by,
            records: Vec::new(),
            side_effects: Vec::new(),
        });
        Ok(id)
    }

    async fn close_draft_change_log(&self, id: DraftChangeLogId) -> Result<DraftChangeLog> {
        self.get_draft_change_log(id).await
    }

    async fn get_draft_change_log(&self, id: DraftChangeLogId) -> Result<DraftChangeLog> {
        let state = self.0.lock().unwrap();
        state.draft_logs.iter().find(|l| l.id == id).cloned().ok_or_else(|| Error::not_found("draft log", id))
    }

    async fn get_publish_log(&self, id: PublishLogId) -> Result<PublishLog> {
        let state = self.0.lock().unwrap();
        state.publish_logs.iter().find(|l| l.id == id).cloned().ok_or_else(|| Error::not_found("publish log", id))
    }

    async fn latest_publish_log(&self, package_id: PackageId) -> Result<Option<PublishLog>> {
        let state = self.0.lock().unwrap();
        Ok(state.publish_logs.iter().rev().find(|l| l.package_id == package_id).cloned())
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
        let mut state = self.0.lock().unwrap();
        let log_id = PublishLogId(state.publish_logs.len() as i32 + 1);
        let records: Vec<PublishLogRecord> = records
            .into_iter()
            .enumerate()
            .map(|(i, mut r)| {
                r.id = PublishLogRecordId(i as i32 + 1);
                r
            })
            .collect();
        for record in &records {
            state.published.insert(record.entity_id.0, record.new_version);
        }
        let publish_side_effects: Vec<PublishSideEffect> = side_effects
            .into_iter()
            .filter_map(|(cause, effect)| {
                if cause == effect {
                    return None;
                }
                Some(PublishSideEffect {
                    publish_log_id: log_id,
                    cause_record_id: records.get(cause)?.id,
                    effect_record_id: records.get(effect)?.id,
                })
            })
            .collect();
        let log = PublishLog {
            id: log_id,
            uuid: Uuid::new_v4(),
            package_id,
            message: message.to_string(),
            published_at,
            published_by,
            records,
            side_effects: publish_side_effects,
        };
        state.publish_logs.push(log.clone());
        Ok(log)
    }

    async fn entities_with_unpublished_changes(
        &self,
        package_id: PackageId,
        include_deletes: bool,
    ) -> Result<Vec<EntityId>> {
        let state = self.0.lock().unwrap();
        let mut out = Vec::new();
        for entity in state.entities.iter().filter(|e| e.package_id == package_id) {
            let draft_had_row = state.drafts.contains_key(&entity.id.0);
            let draft = state.drafts.get(&entity.id.0).copied().flatten();
            let published = state.published.get(&entity.id.0).copied().flatten();
            if draft == published {
                continue;
            }
            let is_delete = draft_had_row && draft.is_none() && published.is_some();
            if is_delete && !include_deletes {
                continue;
            }
            out.push(entity.id);
        }
        Ok(out)
    }

    async fn published_version_as_of(
        &self,
        entity_id: EntityId,
        publish_log_id: PublishLogId,
    ) -> Result<Option<VersionId>> {
        let state = self.0.lock().unwrap();
        Ok(state
            .publish_logs
            .iter()
            .filter(|l| l.id.0 <= publish_log_id.0)
            .flat_map(|l| l.records.iter().map(move |r| (l.id, r)))
            .filter(|(_, r)| r.entity_id == entity_id)
            .max_by_key(|(log_id, _)| log_id.0)
            .map(|(_, r)| r.new_version)
            .unwrap_or(None))
    }

    async fn list_entities(&self, package_id: PackageId) -> Result<Vec<PublishableEntity>> {
        let state = self.0.lock().unwrap();
        Ok(state.entities.iter().filter(|e| e.package_id == package_id).cloned().collect())
    }

    async fn list_versions(&self, entity_id: EntityId) -> Result<Vec<PublishableEntityVersion>> {
        let state = self.0.lock().unwrap();
        Ok(state.versions.iter().filter(|v| v.entity_id == entity_id).cloned().collect())
    }
}

fn next_record_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PublishingEngine;
    use crate::model::{ContainerEditAction, NewEntityListRow};
    use crate::registry::Kind;

    fn register_kinds() {
        registry::register_kind(Kind::leaf("component"));
        registry::register_kind(Kind::container("unit", vec!["component"]));
    }

    async fn new_package(engine: &PublishingEngine<InMemoryStore>, key: &str) -> PackageId {
        engine
            .create_package(NewPackage { key: key.into(), title: "Pkg".into(), ..Default::default() })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn p2_no_both_null_unpublished_change() {
        register_kinds();
        let engine = PublishingEngine::new(InMemoryStore::new());
        let package_id = new_package(&engine, "p2").await;
        let entity = engine
            .create_entity(NewEntity {
                package_id,
                key: "comp".into(),
                created: Utc::now(),
                created_by: None,
                can_stand_alone: true,
                kind: Some("component".into()),
            })
            .await
            .unwrap();

        // Never touched: both draft and published are null (NeverHad), must
        // not appear in unpublished-changes.
        let changed = engine.entities_with_unpublished_changes(package_id, true).await.unwrap();
        assert!(!changed.contains(&entity.id));
    }

    #[tokio::test]
    async fn p5_at_most_one_record_per_entity_per_log() {
        register_kinds();
        let engine = PublishingEngine::new(InMemoryStore::new());
        let package_id = new_package(&engine, "p5").await;
        let entity = engine
            .create_entity(NewEntity {
                package_id,
                key: "comp".into(),
                created: Utc::now(),
                created_by: None,
                can_stand_alone: true,
                kind: Some("component".into()),
            })
            .await
            .unwrap();

        let engine_ref = &engine;
        let (_, log) = engine_ref
            .bulk_draft_changes(package_id, Utc::now(), None, |log_id| async move {
                engine_ref.create_next_version(Some(log_id), entity.id, "v1".into(), Utc::now(), None).await?;
                engine_ref.create_next_version(Some(log_id), entity.id, "v2".into(), Utc::now(), None).await?;
                Ok(())
            })
            .await
            .unwrap();

        let records_for_entity = log.records.iter().filter(|r| r.entity_id == entity.id).count();
        assert_eq!(records_for_entity, 1);
    }

    #[tokio::test]
    async fn p6_bulk_collapse_keeps_prior_head_and_final_version() {
        register_kinds();
        let engine = PublishingEngine::new(InMemoryStore::new());
        let package_id = new_package(&engine, "p6").await;
        let entity = engine
            .create_entity(NewEntity {
                package_id,
                key: "comp".into(),
                created: Utc::now(),
                created_by: None,
                can_stand_alone: true,
                kind: Some("component".into()),
            })
            .await
            .unwrap();

        let v1 = engine.create_next_version(None, entity.id, "v1".into(), Utc::now(), None).await.unwrap();
        engine.publish_all_drafts(package_id, "publish v1", Utc::now(), None).await.unwrap();

        let engine_ref = &engine;
        let (_, log) = engine_ref
            .bulk_draft_changes(package_id, Utc::now(), None, |log_id| async move {
                engine_ref.create_next_version(Some(log_id), entity.id, "v2".into(), Utc::now(), None).await?;
                engine_ref.create_next_version(Some(log_id), entity.id, "v3".into(), Utc::now(), None).await?;
                Ok(())
            })
            .await
            .unwrap();

        let record = log.records.iter().find(|r| r.entity_id == entity.id).unwrap();
        assert_eq!(record.old_version, Some(v1.id));
        let head = engine.draft_head(entity.id).await.unwrap().version().unwrap();
        let version = engine.get_version(head).await.unwrap();
        assert_eq!(version.version_num, 3);
    }

    #[tokio::test]
    async fn p8_container_version_reuses_entity_list_on_no_op_replace() {
        register_kinds();
        let engine = PublishingEngine::new(InMemoryStore::new());
        let package_id = new_package(&engine, "p8").await;
        let component = engine
            .create_entity(NewEntity {
                package_id,
                key: "comp".into(),
                created: Utc::now(),
                created_by: None,
                can_stand_alone: true,
                kind: Some("component".into()),
            })
            .await
            .unwrap();
        engine.create_next_version(None, component.id, "c-v1".into(), Utc::now(), None).await.unwrap();

        let unit = engine.create_container_entity(package_id, "unit".into(), "unit", Utc::now(), None).await.unwrap();
        let v1 = engine
            .create_next_container_version(
                None,
                unit.id,
                "Unit v1".into(),
                ContainerEditAction::Replace,
                vec![NewEntityListRow { entity_id: component.id, entity_version_id: None }],
                Utc::now(),
                None,
            )
            .await
            .unwrap();
        let v2 = engine
            .create_next_container_version(
                None,
                unit.id,
                "Unit v2".into(),
                ContainerEditAction::Replace,
                vec![NewEntityListRow { entity_id: component.id, entity_version_id: None }],
                Utc::now(),
                None,
            )
            .await
            .unwrap();

        assert_eq!(v1.entity_list_id, v2.entity_list_id);
    }

    #[tokio::test]
    async fn nested_bulk_draft_changes_joins_the_outer_session() {
        register_kinds();
        let engine = PublishingEngine::new(InMemoryStore::new());
        let package_id = new_package(&engine, "nest").await;
        let a = engine
            .create_entity(NewEntity {
                package_id,
                key: "a".into(),
                created: Utc::now(),
                created_by: None,
                can_stand_alone: true,
                kind: Some("component".into()),
            })
            .await
            .unwrap();
        let b = engine
            .create_entity(NewEntity {
                package_id,
                key: "b".into(),
                created: Utc::now(),
                created_by: None,
                can_stand_alone: true,
                kind: Some("component".into()),
            })
            .await
            .unwrap();

        let engine_ref = &engine;
        let (_, log) = engine_ref
            .bulk_draft_changes(package_id, Utc::now(), None, |log_id| async move {
                engine_ref.create_next_version(Some(log_id), a.id, "a-v1".into(), Utc::now(), None).await?;
                // An inner bulk_draft_changes call for the same package joins
                // the outer one instead of opening an independent log.
                let (_, inner_log) = engine_ref
                    .bulk_draft_changes(package_id, Utc::now(), None, |inner_log_id| async move {
                        engine_ref.create_next_version(Some(inner_log_id), b.id, "b-v1".into(), Utc::now(), None).await
                    })
                    .await?;
                assert_eq!(inner_log.id, log_id);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(log.records.len(), 2);
    }
}
