//! `PublishingEngine` — orchestration over a `PublishingStore` (§4).
//!
//! Mirrors `sem_os_core::service`: a thin generic wrapper around the store
//! port that owns no state of its own, validates inputs, and sequences
//! store calls so the invariants in §9 hold without the adapter having to
//! know about them.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::content_store::ContentStore;
use crate::dependencies_hash::{container_dependencies_hash, leaf_dependencies_hash};
use crate::error::{Error, Result};
use crate::ids::{DraftChangeLogId, EntityId, PackageId, PublishLogId, UserId, VersionId};
use crate::model::{
    Container, ContainerEditAction, ContainerEntityListEntry, ContainerVersion, DraftChangeLog,
    DraftSideEffect, EffectiveMode, EntityListRow, HeadState, LearningPackage, NewEntity,
    NewEntityListRow, NewPackage, NewVersion, PackageUpdate, PublishLog, PublishLogRecord,
    PublishableEntity, PublishableEntityVersion,
};
use crate::registry;
use crate::store::PublishingStore;

tokio::task_local! {
    /// The Draft Log currently open on this call context, if any
    /// (`package_id`, `log_id`). Lets a nested `bulk_draft_changes` call
    /// join the session its caller already opened instead of starting a
    /// second, independent one (§4.5: "sessions do not nest").
    static CURRENT_DRAFT_LOG: std::cell::Cell<Option<(i32, i32)>>;
}

pub struct PublishingEngine<S> {
    store: S,
    content_store: Option<Box<dyn ContentStore>>,
}

impl<S: PublishingStore> PublishingEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store, content_store: None }
    }

    pub fn with_content_store(store: S, content_store: Box<dyn ContentStore>) -> Self {
        Self { store, content_store: Some(content_store) }
    }

    pub fn content_store(&self) -> Option<&dyn ContentStore> {
        self.content_store.as_deref()
    }

    // ── Packages ────────────────────────────────────────────────────

    #[instrument(skip(self))]
    pub async fn create_package(&self, new_package: NewPackage) -> Result<LearningPackage> {
        if new_package.key.trim().is_empty() {
            return Err(Error::validation("package key must not be empty"));
        }
        self.store.create_package(new_package).await
    }

    pub async fn get_package(&self, id: PackageId) -> Result<LearningPackage> {
        self.store.get_package(id).await
    }

    pub async fn get_package_by_key(&self, key: &str) -> Result<LearningPackage> {
        self.store.get_package_by_key(key).await
    }

    pub async fn update_package(&self, id: PackageId, update: PackageUpdate) -> Result<LearningPackage> {
        if update.is_empty() {
            return self.store.get_package(id).await;
        }
        self.store.update_package(id, update).await
    }

    // ── Entities & versions (§4.1, §4.2) ──────────────────────────────

    #[instrument(skip(self))]
    pub async fn create_entity(&self, new_entity: NewEntity) -> Result<PublishableEntity> {
        if new_entity.key.trim().is_empty() {
            return Err(Error::validation("entity key must not be empty"));
        }
        if let Some(kind) = &new_entity.kind {
            registry::kind_of(kind)?;
        }
        self.store.create_entity(new_entity).await
    }

    /// Convenience for creating an entity of a registered container kind
    /// (§4.8): validates the kind is actually a container kind before
    /// delegating to `create_entity`.
    pub async fn create_container_entity(
        &self,
        package_id: PackageId,
        key: String,
        kind: &str,
        created: DateTime<Utc>,
        created_by: Option<UserId>,
    ) -> Result<PublishableEntity> {
        if !registry::is_container_kind(kind)? {
            return Err(Error::invariant(format!("kind {kind} is not a container kind")));
        }
        self.store
            .create_entity(NewEntity {
                package_id,
                key,
                created,
                created_by,
                can_stand_alone: true,
                kind: Some(kind.to_string()),
            })
            .await
    }

    pub async fn get_entity(&self, id: EntityId) -> Result<PublishableEntity> {
        self.store.get_entity(id).await
    }

    pub async fn get_entity_by_key(&self, package_id: PackageId, key: &str) -> Result<PublishableEntity> {
        self.store.get_entity_by_key(package_id, key).await
    }

    /// Creates the next version of `entity_id` (version_num = current max +
    /// 1) and advances its draft head to point at it, recording the change
    /// under `log_id` (or a transient one-off log when `None`), and
    /// propagating a side-effect record up to every ancestor container
    /// (§4.4, §4.5).
    #[instrument(skip(self, title))]
    pub async fn create_next_version(
        &self,
        log_id: Option<DraftChangeLogId>,
        entity_id: EntityId,
        title: String,
        created: DateTime<Utc>,
        created_by: Option<UserId>,
    ) -> Result<PublishableEntityVersion> {
        self.create_version_inner(log_id, entity_id, title, created, created_by, None).await
    }

    /// Like `create_next_version`, but pins `version_num` to a caller-chosen
    /// value instead of computing `latest + 1`. Exists so an import/export
    /// surface (out of scope here) can round-trip version numbers from a
    /// serialized package rather than renumbering them on load (§6).
    pub async fn create_version_with_forced_num(
        &self,
        log_id: Option<DraftChangeLogId>,
        entity_id: EntityId,
        title: String,
        created: DateTime<Utc>,
        created_by: Option<UserId>,
        force_version_num: u32,
    ) -> Result<PublishableEntityVersion> {
        self.create_version_inner(log_id, entity_id, title, created, created_by, Some(force_version_num)).await
    }

    async fn create_version_inner(
        &self,
        log_id: Option<DraftChangeLogId>,
        entity_id: EntityId,
        title: String,
        created: DateTime<Utc>,
        created_by: Option<UserId>,
        force_version_num: Option<u32>,
    ) -> Result<PublishableEntityVersion> {
        let entity = self.store.get_entity(entity_id).await?;
        let next_num = match force_version_num {
            Some(n) => n,
            None => self.store.latest_version_num(entity_id).await? + 1,
        };
        let version = self
            .store
            .create_version(NewVersion {
                entity_id,
                version_num: next_num,
                title,
                created,
                created_by,
            })
            .await?;

        self.set_draft_version(log_id, entity.id, Some(version.id), created, created_by)
            .await?;
        Ok(version)
    }

    /// Withdraws (soft-deletes) the draft head of `entity_id` — sets it to
    /// `None` rather than removing the head row, per the tri-valued head
    /// semantics in §9.
    pub async fn withdraw_draft(
        &self,
        log_id: Option<DraftChangeLogId>,
        entity_id: EntityId,
        changed_at: DateTime<Utc>,
        changed_by: Option<UserId>,
    ) -> Result<()> {
        self.set_draft_version(log_id, entity_id, None, changed_at, changed_by).await
    }

    async fn set_draft_version(
        &self,
        log_id: Option<DraftChangeLogId>,
        entity_id: EntityId,
        version: Option<VersionId>,
        changed_at: DateTime<Utc>,
        changed_by: Option<UserId>,
    ) -> Result<()> {
        let package_id = self.store.get_entity(entity_id).await?.package_id;
        let ambient = CURRENT_DRAFT_LOG
            .try_with(|cell| cell.get())
            .ok()
            .flatten()
            .filter(|(pkg, _)| *pkg == package_id.0)
            .map(|(_, log_id)| DraftChangeLogId(log_id));
        let (owned_log, log_id) = match log_id.or(ambient) {
            Some(id) => (false, id),
            None => (true, self.store.open_draft_change_log(package_id, changed_at, changed_by).await?),
        };

        let prior = self.store.set_draft_head(entity_id, version).await?;
        let cause_record = self
            .store
            .append_draft_change_log_record(log_id, entity_id, prior.version(), version)
            .await?;

        self.propagate_draft_side_effects(log_id, entity_id, cause_record).await?;

        if owned_log {
            self.store.close_draft_change_log(log_id).await?;
        }
        Ok(())
    }

    /// Walks every ancestor container of `entity_id` and records an
    /// unchanged-version (`old_version == new_version`) log record plus a
    /// `DraftSideEffect` linking it back to `cause_record`, so the Draft Log
    /// shows containers whose effective content moved even though their own
    /// version did not (§4.5).
    #[allow(clippy::only_used_in_recursion)]
    fn propagate_draft_side_effects<'a>(
        &'a self,
        log_id: DraftChangeLogId,
        entity_id: EntityId,
        cause_record: crate::ids::DraftChangeLogRecordId,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let parents = self.store.direct_parent_containers(entity_id).await?;
            for parent_id in parents {
                let head = self.store.draft_head(parent_id).await?;
                let version = head.version();
                let effect_record = self
                    .store
                    .append_draft_change_log_record(log_id, parent_id, version, version)
                    .await?;
                self.store
                    .add_draft_side_effect(DraftSideEffect {
                        draft_change_log_id: log_id,
                        cause_record_id: cause_record,
                        effect_record_id: effect_record,
                    })
                    .await?;
                self.propagate_draft_side_effects(log_id, parent_id, effect_record).await?;
            }
            Ok(())
        })
    }

    // ── Bulk-change sessions / Draft Log (§4.5) ─────────────────────

    /// Opens a Draft Log, runs `f` with its id threaded through, and closes
    /// it, returning both `f`'s result and the finished log. Sessions do not
    /// nest (§4.5): if `f` (directly or transitively) calls
    /// `bulk_draft_changes` again for the same package, the inner call joins
    /// this outer session instead of opening a second one — it returns the
    /// same `log_id` and its own close is a no-op, leaving only the
    /// outermost call responsible for actually closing the log.
    pub async fn bulk_draft_changes<F, Fut, T>(
        &self,
        package_id: PackageId,
        changed_at: DateTime<Utc>,
        changed_by: Option<UserId>,
        f: F,
    ) -> Result<(T, DraftChangeLog)>
    where
        F: FnOnce(DraftChangeLogId) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let joined = CURRENT_DRAFT_LOG
            .try_with(|cell| cell.get())
            .ok()
            .flatten()
            .filter(|(pkg, _)| *pkg == package_id.0);

        if let Some((_, log_id)) = joined {
            let log_id = DraftChangeLogId(log_id);
            let value = f(log_id).await?;
            let log = self.store.get_draft_change_log(log_id).await?;
            return Ok((value, log));
        }

        let log_id = self.store.open_draft_change_log(package_id, changed_at, changed_by).await?;
        let result = CURRENT_DRAFT_LOG
            .scope(std::cell::Cell::new(Some((package_id.0, log_id.0))), f(log_id))
            .await;
        match result {
            Ok(value) => {
                let log = self.store.close_draft_change_log(log_id).await?;
                Ok((value, log))
            }
            Err(e) => Err(e),
        }
    }

    /// Sets the draft head of every entity in `entity_ids` back to its
    /// published head, in a single Draft Log.
    pub async fn reset_drafts_to_published(
        &self,
        package_id: PackageId,
        entity_ids: &[EntityId],
        changed_at: DateTime<Utc>,
        changed_by: Option<UserId>,
    ) -> Result<DraftChangeLog> {
        let ids = entity_ids.to_vec();
        let (_, log) = self
            .bulk_draft_changes(package_id, changed_at, changed_by, |log_id| async move {
                for entity_id in ids {
                    let published = self.store.published_head(entity_id).await?.version();
                    self.set_draft_version(Some(log_id), entity_id, published, changed_at, changed_by)
                        .await?;
                }
                Ok(())
            })
            .await?;
        Ok(log)
    }

    // ── Containers & entity lists (§4.4) ────────────────────────────

    /// Creates the next container version, editing its child list per
    /// `action`. Reuses the previous version's `EntityList` instead of
    /// creating a new one when the resolved row set would be identical
    /// (§4.4 list-reuse-on-metadata-only-change, P8).
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(self, title, rows))]
    pub async fn create_next_container_version(
        &self,
        log_id: Option<DraftChangeLogId>,
        container_entity_id: EntityId,
        title: String,
        action: ContainerEditAction,
        rows: Vec<NewEntityListRow>,
        created: DateTime<Utc>,
        created_by: Option<UserId>,
    ) -> Result<ContainerVersion> {
        self.create_container_version_inner(log_id, container_entity_id, title, action, rows, created, created_by, None)
            .await
    }

    /// Like `create_next_container_version`, but pins `version_num` to a
    /// caller-chosen value instead of computing `latest + 1` (§6, same
    /// import/export round-trip rationale as `create_version_with_forced_num`).
    #[allow(clippy::too_many_arguments)]
    pub async fn create_container_version_with_forced_num(
        &self,
        log_id: Option<DraftChangeLogId>,
        container_entity_id: EntityId,
        title: String,
        action: ContainerEditAction,
        rows: Vec<NewEntityListRow>,
        created: DateTime<Utc>,
        created_by: Option<UserId>,
        force_version_num: u32,
    ) -> Result<ContainerVersion> {
        self.create_container_version_inner(
            log_id,
            container_entity_id,
            title,
            action,
            rows,
            created,
            created_by,
            Some(force_version_num),
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn create_container_version_inner(
        &self,
        log_id: Option<DraftChangeLogId>,
        container_entity_id: EntityId,
        title: String,
        action: ContainerEditAction,
        rows: Vec<NewEntityListRow>,
        created: DateTime<Utc>,
        created_by: Option<UserId>,
        force_version_num: Option<u32>,
    ) -> Result<ContainerVersion> {
        let entity = self.store.get_entity(container_entity_id).await?;
        let kind = entity
            .kind
            .as_deref()
            .ok_or_else(|| Error::invariant("container entity has no registered kind"))?;
        if !registry::is_container_kind(kind)? {
            return Err(Error::WrongKind { entity_id: container_entity_id.to_string(), expected: "container" });
        }

        for row in &rows {
            let row_entity = self.store.get_entity(row.entity_id).await?;
            if row_entity.package_id != entity.package_id {
                return Err(Error::validation(format!(
                    "entity {} belongs to a different package than container {container_entity_id}",
                    row.entity_id
                )));
            }
        }

        let prior_head = self.store.draft_head(container_entity_id).await?;
        let new_rows = match (action, prior_head) {
            (ContainerEditAction::Replace, _) => rows,
            (ContainerEditAction::Append, HeadState::Points(prior_version)) => {
                let prior_version_row = self.store.get_container_version(prior_version).await?;
                let mut existing = self.store.get_entity_list_rows(prior_version_row.entity_list_id).await?;
                existing.sort_by_key(|r| r.order_num);
                let mut combined: Vec<NewEntityListRow> = existing
                    .into_iter()
                    .map(|r| NewEntityListRow { entity_id: r.entity_id, entity_version_id: r.entity_version_id })
                    .collect();
                combined.extend(rows);
                combined
            }
            (ContainerEditAction::Remove, HeadState::Points(prior_version)) => {
                let prior_version_row = self.store.get_container_version(prior_version).await?;
                let mut existing = self.store.get_entity_list_rows(prior_version_row.entity_list_id).await?;
                existing.sort_by_key(|r| r.order_num);
                let remove_ids: Vec<EntityId> = rows.iter().map(|r| r.entity_id).collect();
                existing
                    .into_iter()
                    .filter(|r| !remove_ids.contains(&r.entity_id))
                    .map(|r| NewEntityListRow { entity_id: r.entity_id, entity_version_id: r.entity_version_id })
                    .collect()
            }
            (ContainerEditAction::Append | ContainerEditAction::Remove, _) => rows,
        };

        let entity_list_id = match prior_head {
            HeadState::Points(prior_version) => {
                let prior_version_row = self.store.get_container_version(prior_version).await?;
                let existing = self.store.get_entity_list_rows(prior_version_row.entity_list_id).await?;
                if rows_match(&existing, &new_rows) {
                    prior_version_row.entity_list_id
                } else {
                    self.store.create_entity_list(&new_rows).await?
                }
            }
            _ => self.store.create_entity_list(&new_rows).await?,
        };

        let next_num = match force_version_num {
            Some(n) => n,
            None => self.store.latest_version_num(container_entity_id).await? + 1,
        };
        let container_version = self
            .store
            .create_container_version(container_entity_id, next_num, &title, entity_list_id, created, created_by)
            .await?;

        self.set_draft_version(log_id, container_entity_id, Some(container_version.version_id), created, created_by)
            .await?;
        Ok(container_version)
    }

    pub async fn get_effective_container_children(
        &self,
        container_entity_id: EntityId,
        mode: EffectiveMode,
    ) -> Result<Vec<ContainerEntityListEntry>> {
        self.store.resolve_container_children(container_entity_id, mode).await
    }

    // ── Publish (§4.6) ───────────────────────────────────────────────

    #[instrument(skip(self, message))]
    pub async fn publish_all_drafts(
        &self,
        package_id: PackageId,
        message: &str,
        published_at: DateTime<Utc>,
        published_by: Option<UserId>,
    ) -> Result<PublishLog> {
        let entity_ids = self.store.entities_with_unpublished_changes(package_id, true).await?;
        self.publish_from_drafts(package_id, &entity_ids, message, published_at, published_by).await
    }

    /// Publishes exactly the entities in `entity_ids`, generalizing the
    /// original's one-level-only descendant auto-include: any container in
    /// the set pulls in every unpublished descendant, transitively, so a
    /// Section publish also publishes its Subsections, Units, and
    /// Components without a separate call (§4.6 REDESIGN FLAG).
    #[instrument(skip(self, entity_ids, message))]
    pub async fn publish_from_drafts(
        &self,
        package_id: PackageId,
        entity_ids: &[EntityId],
        message: &str,
        published_at: DateTime<Utc>,
        published_by: Option<UserId>,
    ) -> Result<PublishLog> {
        let mut seen: std::collections::HashSet<EntityId> = std::collections::HashSet::new();
        let mut to_publish: Vec<EntityId> = Vec::new();
        for id in entity_ids {
            if seen.insert(*id) {
                to_publish.push(*id);
            }
        }
        let mut frontier = to_publish.clone();

        while let Some(entity_id) = frontier.pop() {
            let entity = self.store.get_entity(entity_id).await?;
            let is_container = match &entity.kind {
                Some(kind) => registry::is_container_kind(kind).unwrap_or(false),
                None => false,
            };
            if !is_container {
                continue;
            }
            let draft_head = self.store.draft_head(entity_id).await?;
            let Some(version_id) = draft_head.version() else { continue };
            let version = self.store.get_container_version(version_id).await?;
            let rows = self.store.get_entity_list_rows(version.entity_list_id).await?;
            for row in rows {
                if row.is_pinned() {
                    continue;
                }
                let draft = self.store.draft_head(row.entity_id).await?;
                let published = self.store.published_head(row.entity_id).await?;
                if draft.version() != published.version() && seen.insert(row.entity_id) {
                    to_publish.push(row.entity_id);
                    frontier.push(row.entity_id);
                }
            }
        }

        let mut records = Vec::with_capacity(to_publish.len());
        let mut record_index_of: std::collections::HashMap<EntityId, usize> = std::collections::HashMap::new();
        for entity_id in &to_publish {
            let entity = self.store.get_entity(*entity_id).await?;
            let old_version = self.store.published_head(*entity_id).await?.version();
            let new_version = self.store.draft_head(*entity_id).await?.version();

            let dependencies_hash = match (&entity.kind, new_version) {
                (Some(kind), Some(v)) if registry::is_container_kind(kind).unwrap_or(false) => {
                    let children = self.store.resolve_container_children(*entity_id, EffectiveMode::Draft).await?;
                    container_dependencies_hash(*entity_id, v, &children)
                }
                (_, Some(v)) => leaf_dependencies_hash(*entity_id, v),
                (_, None) => leaf_dependencies_hash(*entity_id, VersionId(0)),
            };

            record_index_of.insert(*entity_id, records.len());
            records.push(PublishLogRecord {
                id: crate::ids::PublishLogRecordId(0),
                entity_id: *entity_id,
                old_version,
                new_version,
                dependencies_hash,
            });
        }

        let mut side_effect_indices = Vec::new();
        for entity_id in &to_publish {
            let parents = self.store.direct_parent_containers(*entity_id).await?;
            for parent_id in parents {
                if let (Some(&cause), Some(&effect)) =
                    (record_index_of.get(entity_id), record_index_of.get(&parent_id))
                {
                    side_effect_indices.push((cause, effect));
                }
            }
        }

        self.store
            .apply_publish(package_id, message, published_at, published_by, records, side_effect_indices)
            .await
    }

    pub async fn get_publish_log(&self, id: PublishLogId) -> Result<PublishLog> {
        self.store.get_publish_log(id).await
    }

    pub async fn latest_publish_log(&self, package_id: PackageId) -> Result<Option<PublishLog>> {
        self.store.latest_publish_log(package_id).await
    }

    // ── Query surface (§7) ──────────────────────────────────────────

    pub async fn list_entities(&self, package_id: PackageId) -> Result<Vec<PublishableEntity>> {
        self.store.list_entities(package_id).await
    }

    pub async fn list_versions(&self, entity_id: EntityId) -> Result<Vec<PublishableEntityVersion>> {
        self.store.list_versions(entity_id).await
    }

    pub async fn get_version(&self, id: VersionId) -> Result<PublishableEntityVersion> {
        self.store.get_version(id).await
    }

    /// The highest-numbered version of `entity_id`.
    pub async fn latest_version(&self, entity_id: EntityId) -> Result<PublishableEntityVersion> {
        self.store.latest_version(entity_id).await
    }

    pub async fn draft_head(&self, entity_id: EntityId) -> Result<HeadState> {
        self.store.draft_head(entity_id).await
    }

    pub async fn published_head(&self, entity_id: EntityId) -> Result<HeadState> {
        self.store.published_head(entity_id).await
    }

    /// Entities in `package_id` whose draft head differs from their
    /// published head. `include_deletes=false` (the default query semantics)
    /// excludes entities whose draft head is withdrawn but whose published
    /// head is still live — those are reported separately via
    /// `entities_with_unpublished_deletes`. `include_deletes=true` folds
    /// both cases together (used internally by `publish_all_drafts`, which
    /// must publish deletes along with ordinary edits).
    pub async fn entities_with_unpublished_changes(
        &self,
        package_id: PackageId,
        include_deletes: bool,
    ) -> Result<Vec<EntityId>> {
        self.store.entities_with_unpublished_changes(package_id, include_deletes).await
    }

    /// Entities in `package_id` whose draft head is null but whose published
    /// head is not — i.e. a draft soft-delete that hasn't been published yet.
    pub async fn entities_with_unpublished_deletes(&self, package_id: PackageId) -> Result<Vec<EntityId>> {
        let mut out = Vec::new();
        for entity in self.store.list_entities(package_id).await? {
            let draft = self.store.draft_head(entity.id).await?;
            let published = self.store.published_head(entity.id).await?;
            if draft.version().is_none() && published.version().is_some() {
                out.push(entity.id);
            }
        }
        Ok(out)
    }

    /// True if `container_entity_id`'s own draft head differs from its
    /// published head, or any unpinned descendant (transitively) does.
    /// Pinned references are ignored: they freeze content, so a pinned
    /// child's unpublished changes never propagate to an ancestor. Guards
    /// against cycles with a visited-set.
    pub async fn contains_unpublished_changes(&self, container_entity_id: EntityId) -> Result<bool> {
        let mut visited = std::collections::HashSet::new();
        self.contains_unpublished_changes_inner(container_entity_id, &mut visited).await
    }

    fn contains_unpublished_changes_inner<'a>(
        &'a self,
        container_entity_id: EntityId,
        visited: &'a mut std::collections::HashSet<EntityId>,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>> {
        Box::pin(async move {
            if !visited.insert(container_entity_id) {
                return Ok(false);
            }

            let draft = self.store.draft_head(container_entity_id).await?;
            let published = self.store.published_head(container_entity_id).await?;
            if draft.version() != published.version() {
                return Ok(true);
            }

            let Some(version_id) = draft.version() else { return Ok(false) };
            let entity = self.store.get_entity(container_entity_id).await?;
            let is_container = match &entity.kind {
                Some(kind) => registry::is_container_kind(kind).unwrap_or(false),
                None => false,
            };
            if !is_container {
                return Ok(false);
            }

            let version = self.store.get_container_version(version_id).await?;
            let rows = self.store.get_entity_list_rows(version.entity_list_id).await?;
            for row in rows {
                if row.is_pinned() {
                    continue;
                }
                if self.contains_unpublished_changes_inner(row.entity_id, visited).await? {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    /// Reverse lookup: every container that currently lists `entity_id` as a
    /// child. When `ignore_pinned` is true, pinned references are excluded
    /// (only unpinned rows count). The default (`false`) returns every
    /// parent regardless of pin status.
    pub async fn containers_with_entity(
        &self,
        entity_id: EntityId,
        ignore_pinned: bool,
    ) -> Result<Vec<EntityId>> {
        let parents = self.store.direct_parent_containers(entity_id).await?;
        if !ignore_pinned {
            return Ok(parents);
        }
        let mut out = Vec::new();
        for parent_id in parents {
            let children = self.store.resolve_container_children(parent_id, EffectiveMode::Draft).await?;
            if children.iter().any(|c| c.entity_id == entity_id && !c.pinned) {
                out.push(parent_id);
            }
        }
        Ok(out)
    }

    /// Views `entity_id` as a container, failing with `WrongKind` if it has
    /// no registered kind or its kind isn't a container kind (§4.8).
    pub async fn as_container(&self, entity_id: EntityId) -> Result<Container> {
        let entity = self.store.get_entity(entity_id).await?;
        let is_container = match entity.kind.as_deref() {
            Some(kind) => registry::is_container_kind(kind)?,
            None => false,
        };
        if !is_container {
            return Err(Error::WrongKind { entity_id: entity_id.to_string(), expected: "container" });
        }
        Ok(Container { entity_id })
    }

    /// The version `entity_id` was published at as of `publish_log_id`.
    pub async fn published_version_as_of(
        &self,
        entity_id: EntityId,
        publish_log_id: PublishLogId,
    ) -> Result<Option<VersionId>> {
        self.store.published_version_as_of(entity_id, publish_log_id).await
    }
}

fn rows_match(existing: &[EntityListRow], candidate: &[NewEntityListRow]) -> bool {
    if existing.len() != candidate.len() {
        return false;
    }
    existing
        .iter()
        .zip(candidate.iter())
        .all(|(a, b)| a.entity_id == b.entity_id && a.entity_version_id == b.entity_version_id)
}
