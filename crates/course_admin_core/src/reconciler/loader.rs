//! Reads the persisted course tree into sibling indexes.

use std::collections::HashMap;

use crate::ports::{DocumentStore, PortResult};
use crate::store::{self, Fields, StoredDocument};

pub(crate) const MODULE_NAME_FIELD: &str = "moduleName";
pub(crate) const SECTION_NAME_FIELD: &str = "title";

/// The persisted children of one parent, indexed by id and by display name.
#[derive(Debug, Default)]
pub struct Siblings {
    ids: Vec<String>,
    by_id: HashMap<String, Fields>,
    /// Ids sharing a name, in listing order. The last entry wins a lookup.
    by_name: HashMap<String, Vec<String>>,
}

impl Siblings {
    pub fn index(docs: Vec<StoredDocument>, name_field: &str) -> Self {
        let mut siblings = Siblings::default();
        for doc in docs {
            if let Some(name) = doc.fields.get(name_field).and_then(|v| v.as_str()) {
                siblings
                    .by_name
                    .entry(name.to_string())
                    .or_default()
                    .push(doc.id.clone());
            }
            siblings.ids.push(doc.id.clone());
            siblings.by_id.insert(doc.id, doc.fields);
        }
        siblings
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn fields(&self, id: &str) -> Option<&Fields> {
        self.by_id.get(id)
    }

    /// Ids in listing order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The most recently listed sibling called `name` that `skip` does not
    /// reject.
    pub fn find_by_name(&self, name: &str, skip: impl Fn(&str) -> bool) -> Option<&str> {
        self.by_name
            .get(name)?
            .iter()
            .rev()
            .map(String::as_str)
            .find(|id| !skip(id))
    }
}

pub async fn load_course(
    store: &dyn DocumentStore,
    course_id: &str,
) -> PortResult<Option<StoredDocument>> {
    store.get(&store::course(course_id)).await
}

pub async fn load_modules(store: &dyn DocumentStore, course_id: &str) -> PortResult<Siblings> {
    let docs = store.list(&store::modules(course_id), Some("order")).await?;
    Ok(Siblings::index(docs, MODULE_NAME_FIELD))
}

pub async fn load_sections(
    store: &dyn DocumentStore,
    course_id: &str,
    module_id: &str,
) -> PortResult<Siblings> {
    let docs = store
        .list(&store::sections(course_id, module_id), Some("order"))
        .await?;
    Ok(Siblings::index(docs, SECTION_NAME_FIELD))
}
