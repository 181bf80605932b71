//! Process-wide kind registry (§4.8).
//!
//! Populated once at startup by the host application (one `register_kind`
//! call per specialized entity/container kind it supports) and consulted
//! read-only thereafter. Mirrors the `once_cell::sync::Lazy<RwLock<...>>`
//! global-registry convention used for static lookup tables across the
//! teacher's workspace (e.g. `dsl-core`'s operator registry).

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kind {
    pub name: &'static str,
    pub is_container: bool,
    /// Child kinds this kind is permitted to hold, when `is_container` is
    /// true. Empty for leaf (non-container) kinds.
    pub allowed_child_kinds: Vec<&'static str>,
}

impl Kind {
    pub fn leaf(name: &'static str) -> Self {
        Kind { name, is_container: false, allowed_child_kinds: Vec::new() }
    }

    pub fn container(name: &'static str, allowed_child_kinds: Vec<&'static str>) -> Self {
        Kind { name, is_container: true, allowed_child_kinds }
    }
}

static REGISTRY: Lazy<RwLock<HashMap<&'static str, Kind>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Registers a kind. Idempotent: re-registering the same name overwrites the
/// previous definition, which lets host applications re-register during
/// tests without restarting a process.
pub fn register_kind(kind: Kind) {
    REGISTRY.write().expect("kind registry poisoned").insert(kind.name, kind);
}

pub fn kind_of(name: &str) -> Result<Kind> {
    REGISTRY
        .read()
        .expect("kind registry poisoned")
        .get(name)
        .cloned()
        .ok_or_else(|| Error::not_found("kind", name))
}

pub fn is_container_kind(name: &str) -> Result<bool> {
    Ok(kind_of(name)?.is_container)
}

/// Validates that `child_kind` is allowed as a child of `parent_kind`.
pub fn check_allowed_child(parent_kind: &str, child_kind: &str) -> Result<()> {
    let parent = kind_of(parent_kind)?;
    if !parent.is_container {
        return Err(Error::invariant(format!("kind {parent_kind} is not a container")));
    }
    if parent.allowed_child_kinds.contains(&child_kind) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "kind {child_kind} is not an allowed child of {parent_kind}"
        )))
    }
}

/// Registers the five built-in kinds (§4.8): `component` is a leaf; `unit`,
/// `subsection`, and `section` are containers forming a strict containment
/// chain (unit holds components, subsection holds units, section holds
/// subsections); `outline_root` sits above sections as the package-level
/// container. Idempotent — safe to call more than once (e.g. once per test).
pub fn register_default_kinds() {
    register_kind(Kind::leaf("component"));
    register_kind(Kind::container("unit", vec!["component"]));
    register_kind(Kind::container("subsection", vec!["unit"]));
    register_kind(Kind::container("section", vec!["subsection"]));
    register_kind(Kind::container("outline_root", vec!["section"]));
}
