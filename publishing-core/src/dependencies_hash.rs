//! Dependency hashing for publish log records (§4.6, resolving the spec's
//! Open Question on `dependencies_hash` scope).
//!
//! Every container's `PublishLogRecord` carries a hash over the ordered,
//! resolved `(entity_id, version_id, pinned)` triples of its published
//! child list, so two publishes of a container produce the same hash iff
//! its effective content (including which children are pinned) is
//! unchanged — even when the container's own version row is new. Leaf
//! (non-container) entities get a hash over their own `(entity_id,
//! version_id)` pair, so every publish record has a `dependencies_hash`
//! uniformly, not just containers.

use sha2::{Digest, Sha256};

use crate::ids::{EntityId, VersionId};
use crate::model::ContainerEntityListEntry;

/// Hash for a leaf entity's publish record: just its own identity and
/// version, so unrelated leaf publishes never collide.
pub fn leaf_dependencies_hash(entity_id: EntityId, version_id: VersionId) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"leaf\0");
    hasher.update(entity_id.0.to_le_bytes());
    hasher.update(version_id.0.to_le_bytes());
    hex::encode(hasher.finalize())
}

/// Hash for a container's publish record over its resolved child list.
/// Order matters: reordering children changes the hash even if the set of
/// entity/version pairs is identical.
pub fn container_dependencies_hash(
    entity_id: EntityId,
    version_id: VersionId,
    children: &[ContainerEntityListEntry],
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"container\0");
    hasher.update(entity_id.0.to_le_bytes());
    hasher.update(version_id.0.to_le_bytes());
    for child in children {
        hasher.update(child.entity_id.0.to_le_bytes());
        hasher.update(child.version_id.0.to_le_bytes());
        hasher.update([child.pinned as u8]);
    }
    hex::encode(hasher.finalize())
}
