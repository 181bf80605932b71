//! Newtype identifiers for the publishing domain.
//!
//! All entities are referenced internally by a 4-byte (`i32`) surrogate key,
//! matching the teacher's convention of small `entity_id`/`package_id`
//! integers for in-process joins, with an immutable UUID carried alongside
//! for external/cross-system references (see `spec.md` §3).

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(v: i32) -> Self {
                $name(v)
            }
        }
    };
}

id_type!(PackageId);
id_type!(EntityId);
id_type!(VersionId);
id_type!(EntityListId);
id_type!(DraftChangeLogId);
id_type!(DraftChangeLogRecordId);
id_type!(PublishLogId);
id_type!(PublishLogRecordId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
