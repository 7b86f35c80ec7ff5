//! crates/course_admin_core/src/store.rs
//!
//! Document addressing for the `DocumentStore` port, plus the helpers that move
//! typed records in and out of raw document fields.

use std::fmt;

use serde::{de::DeserializeOwned, Serialize};

use crate::ports::{PortError, PortResult};

/// Raw top-level fields of a document.
pub type Fields = serde_json::Map<String, serde_json::Value>;

pub const COURSES: &str = "courses";
pub const MODULES: &str = "modules";
pub const SECTIONS: &str = "sections";
pub const USERS: &str = "users";
pub const PROJECT_CATEGORIES: &str = "projectCategories";
pub const PROJECTS: &str = "projects";
pub const USER_PROJECTS: &str = "userProjects";
pub const SUBMISSIONS: &str = "submissions";

/// Slash-separated path of a collection, e.g. `courses/c1/modules`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn root(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn doc(&self, id: impl Into<String>) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            id: id.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    pub collection: CollectionPath,
    pub id: String,
}

impl DocumentPath {
    /// A sub-collection nested under this document.
    pub fn collection(&self, name: &str) -> CollectionPath {
        CollectionPath(format!("{}/{}/{}", self.collection, self.id, name))
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A document as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Fields,
}

impl StoredDocument {
    pub fn decode<T: DeserializeOwned>(&self) -> PortResult<T> {
        from_fields(&self.fields)
    }
}

/// Generates an id for a document created without a caller-chosen one.
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub fn to_fields<T: Serialize>(value: &T) -> PortResult<Fields> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(PortError::Unexpected(format!(
            "expected a document object, got {other}"
        ))),
    }
}

pub fn from_fields<T: DeserializeOwned>(fields: &Fields) -> PortResult<T> {
    Ok(serde_json::from_value(serde_json::Value::Object(fields.clone()))?)
}

//=========================================================================================
// Well-known paths
//=========================================================================================

pub fn courses() -> CollectionPath {
    CollectionPath::root(COURSES)
}

pub fn course(course_id: &str) -> DocumentPath {
    courses().doc(course_id)
}

pub fn modules(course_id: &str) -> CollectionPath {
    course(course_id).collection(MODULES)
}

pub fn sections(course_id: &str, module_id: &str) -> CollectionPath {
    modules(course_id).doc(module_id).collection(SECTIONS)
}

pub fn users() -> CollectionPath {
    CollectionPath::root(USERS)
}

pub fn project_categories() -> CollectionPath {
    CollectionPath::root(PROJECT_CATEGORIES)
}

pub fn projects() -> CollectionPath {
    CollectionPath::root(PROJECTS)
}

pub fn user_projects() -> CollectionPath {
    CollectionPath::root(USER_PROJECTS)
}

pub fn submissions() -> CollectionPath {
    CollectionPath::root(SUBMISSIONS)
}
