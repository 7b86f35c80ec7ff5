//! Module and section mergers. Writes for siblings run concurrently and are
//! always joined before the caller moves on; deletions happen in `prune`.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::debug;

use crate::domain::{ModuleDraft, SectionDraft};
use crate::ports::{DocumentStore, PortResult};
use crate::records::{ModulePatch, SectionPatch};
use crate::store::{self, to_fields, CollectionPath, Fields};

use super::journal::{Node, Tally, WriteJournal};
use super::loader::{self, Siblings};
use super::plan::{self, Resolution};
use super::prune;

/// Everything one reconciliation pass shares across its concurrent writes.
#[derive(Clone, Copy)]
pub(crate) struct MergeContext<'a> {
    pub store: &'a dyn DocumentStore,
    pub journal: &'a WriteJournal,
    pub tally: &'a Tally,
    pub course_id: &'a str,
    pub now: DateTime<Utc>,
}

/// Waits for every result, then surfaces the first error if any.
pub(crate) fn settle<T>(results: Vec<PortResult<T>>) -> PortResult<Vec<T>> {
    let mut values = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(value) => values.push(value),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(values),
    }
}

/// Merges every desired module and returns the ids that must survive pruning.
pub(crate) async fn merge_modules(
    ctx: MergeContext<'_>,
    drafts: &[ModuleDraft],
    existing: &Siblings,
) -> PortResult<HashSet<String>> {
    let plan = plan::resolve(
        drafts.iter().map(|d| (&d.id, d.module_name.as_str())),
        existing,
    );
    let merges = drafts
        .iter()
        .zip(plan.iter())
        .enumerate()
        .map(|(index, (draft, resolution))| merge_module(ctx, draft, index, resolution, existing));
    let kept = settle(join_all(merges).await)?;
    Ok(kept.into_iter().collect())
}

async fn merge_module(
    ctx: MergeContext<'_>,
    draft: &ModuleDraft,
    index: usize,
    resolution: &Resolution,
    existing: &Siblings,
) -> PortResult<String> {
    let patch = ModulePatch {
        module_name: draft.module_name.clone(),
        description: draft.description.clone(),
        order: draft.order.unwrap_or(index as i64),
        updated_at: ctx.now,
    };
    let collection = store::modules(ctx.course_id);
    let module_id = write_node(ctx, &collection, resolution, existing, to_fields(&patch)?, Node::Module).await?;
    debug!(course_id = ctx.course_id, module_id = %module_id, ?resolution, "Module merged");

    let existing_sections = match resolution {
        Resolution::Create => Siblings::default(),
        _ => loader::load_sections(ctx.store, ctx.course_id, &module_id).await?,
    };
    merge_sections(ctx, &module_id, &draft.sections, &existing_sections).await?;
    Ok(module_id)
}

/// Merges the desired sections of one module, then prunes the sections the
/// draft no longer lists. Returns once every write for the module settled.
pub(crate) async fn merge_sections(
    ctx: MergeContext<'_>,
    module_id: &str,
    drafts: &[SectionDraft],
    existing: &Siblings,
) -> PortResult<()> {
    let collection = store::sections(ctx.course_id, module_id);
    let plan = plan::resolve(drafts.iter().map(|d| (&d.id, d.title.as_str())), existing);
    let writes = drafts
        .iter()
        .zip(plan.iter())
        .enumerate()
        .map(|(index, (draft, resolution))| {
            let collection = &collection;
            async move {
                let patch = SectionPatch::from_draft(draft, draft.order.unwrap_or(index as i64), ctx.now)?;
                write_node(ctx, collection, resolution, existing, to_fields(&patch)?, Node::Section).await
            }
        });
    let kept: HashSet<String> = settle(join_all(writes).await)?.into_iter().collect();
    prune::prune_sections(ctx, &collection, existing, &kept).await
}

/// Applies one resolved write and journals its undo.
async fn write_node(
    ctx: MergeContext<'_>,
    collection: &CollectionPath,
    resolution: &Resolution,
    existing: &Siblings,
    mut fields: Fields,
    node: Node,
) -> PortResult<String> {
    match resolution {
        Resolution::Update(id) | Resolution::Adopt(id) => {
            let path = collection.doc(id.clone());
            ctx.store.update(&path, fields).await?;
            if let Some(previous) = existing.fields(id) {
                ctx.journal.overwritten(path, previous.clone());
            }
            ctx.tally.updated(node);
            Ok(id.clone())
        }
        Resolution::CreateAt(id) => {
            fields.insert("createdAt".into(), serde_json::to_value(ctx.now)?);
            let path = collection.doc(id.clone());
            ctx.store.set(&path, fields).await?;
            ctx.journal.created(path);
            ctx.tally.created(node);
            Ok(id.clone())
        }
        Resolution::Create => {
            fields.insert("createdAt".into(), serde_json::to_value(ctx.now)?);
            let id = ctx.store.create(collection, fields).await?;
            ctx.journal.created(collection.doc(id.clone()));
            ctx.tally.created(node);
            Ok(id)
        }
    }
}
