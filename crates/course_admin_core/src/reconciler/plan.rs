//! Decides, before any write, which persisted document each desired child
//! maps to.

use std::collections::HashSet;

use crate::domain::DraftId;

use super::loader::Siblings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The draft's persisted id exists; update it in place.
    Update(String),
    /// The draft matched an unclaimed sibling by name; update that one.
    Adopt(String),
    /// A stale persisted id with no name match; recreate it under that id.
    CreateAt(String),
    /// Create with a store-assigned id.
    Create,
}

/// Resolves `(id, name)` pairs against the existing siblings, in draft order.
///
/// Ids that exist are claimed first, so a renamed sibling is never adopted by
/// another draft. Temporary and stale ids then match the most recently listed
/// unclaimed sibling with the exact same name. No persisted document is ever
/// claimed twice.
pub fn resolve<'a>(
    drafts: impl IntoIterator<Item = (&'a DraftId, &'a str)>,
    existing: &Siblings,
) -> Vec<Resolution> {
    let drafts: Vec<(&DraftId, &str)> = drafts.into_iter().collect();
    let mut claimed: HashSet<String> = HashSet::new();
    let mut resolved: Vec<Option<Resolution>> = vec![None; drafts.len()];

    for (slot, (id, _)) in resolved.iter_mut().zip(&drafts) {
        if let Some(id) = id.persisted_id() {
            if existing.contains(id) && claimed.insert(id.to_string()) {
                *slot = Some(Resolution::Update(id.to_string()));
            }
        }
    }

    for (slot, (id, name)) in resolved.iter_mut().zip(&drafts) {
        if slot.is_some() {
            continue;
        }
        let adopted = existing
            .find_by_name(name, |candidate| claimed.contains(candidate))
            .map(str::to_string);
        let resolution = match (adopted, id.persisted_id()) {
            (Some(existing_id), _) => Resolution::Adopt(existing_id),
            (None, Some(stale)) if !existing.contains(stale) && !claimed.contains(stale) => {
                Resolution::CreateAt(stale.to_string())
            }
            (None, _) => Resolution::Create,
        };
        match &resolution {
            Resolution::Adopt(id) | Resolution::CreateAt(id) => {
                claimed.insert(id.clone());
            }
            _ => {}
        }
        *slot = Some(resolution);
    }

    resolved
        .into_iter()
        .map(|r| r.unwrap_or(Resolution::Create))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Fields, StoredDocument};
    use serde_json::json;

    fn existing(entries: &[(&str, &str)]) -> Siblings {
        let docs = entries
            .iter()
            .map(|(id, name)| {
                let mut fields = Fields::new();
                fields.insert("moduleName".into(), json!(name));
                StoredDocument {
                    id: id.to_string(),
                    fields,
                }
            })
            .collect();
        Siblings::index(docs, "moduleName")
    }

    fn run(drafts: &[(DraftId, &str)], siblings: &Siblings) -> Vec<Resolution> {
        resolve(drafts.iter().map(|(id, name)| (id, *name)), siblings)
    }

    #[test]
    fn temporary_ids_adopt_siblings_by_exact_name() {
        let siblings = existing(&[("m1", "Intro")]);
        let plan = run(
            &[
                (DraftId::temporary("module-1"), "Intro"),
                (DraftId::temporary("module-2"), "intro"),
            ],
            &siblings,
        );
        assert_eq!(plan, vec![Resolution::Adopt("m1".into()), Resolution::Create]);
    }

    #[test]
    fn a_renamed_sibling_is_not_adopted_by_a_new_draft_with_its_old_name() {
        let siblings = existing(&[("m1", "Intro")]);
        let plan = run(
            &[
                (DraftId::temporary("module-1"), "Intro"),
                (DraftId::persisted("m1"), "Welcome"),
            ],
            &siblings,
        );
        assert_eq!(plan, vec![Resolution::Create, Resolution::Update("m1".into())]);
    }

    #[test]
    fn stale_ids_fall_back_to_names_then_to_their_own_id() {
        let siblings = existing(&[("m1", "Intro")]);
        let plan = run(
            &[
                (DraftId::persisted("gone"), "Intro"),
                (DraftId::persisted("also-gone"), "Outro"),
            ],
            &siblings,
        );
        assert_eq!(
            plan,
            vec![
                Resolution::Adopt("m1".into()),
                Resolution::CreateAt("also-gone".into())
            ]
        );
    }

    #[test]
    fn duplicate_ids_in_a_draft_never_share_a_document() {
        let siblings = existing(&[("m1", "Intro")]);
        let plan = run(
            &[
                (DraftId::persisted("m1"), "Intro"),
                (DraftId::persisted("m1"), "Intro"),
                (DraftId::persisted("x"), "A"),
                (DraftId::persisted("x"), "B"),
            ],
            &siblings,
        );
        assert_eq!(
            plan,
            vec![
                Resolution::Update("m1".into()),
                Resolution::Create,
                Resolution::CreateAt("x".into()),
                Resolution::Create,
            ]
        );
    }
}
