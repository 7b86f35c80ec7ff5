//! Orphan deletion. Runs only after the merges of its level have settled.

use std::collections::HashSet;

use futures::future::join_all;
use tracing::debug;

use crate::store::{self, CollectionPath, DocumentPath, Fields};
use crate::ports::PortResult;

use super::journal::Node;
use super::loader::{self, Siblings};
use super::merge::{settle, MergeContext};

pub(crate) async fn prune_sections(
    ctx: MergeContext<'_>,
    collection: &CollectionPath,
    existing: &Siblings,
    keep: &HashSet<String>,
) -> PortResult<()> {
    let deletions = existing
        .ids()
        .filter(|id| !keep.contains(*id))
        .map(|id| delete_tracked(ctx, collection.doc(id), existing.fields(id).cloned(), Node::Section));
    settle(join_all(deletions).await)?;
    Ok(())
}

pub(crate) async fn prune_modules(
    ctx: MergeContext<'_>,
    existing: &Siblings,
    keep: &HashSet<String>,
) -> PortResult<()> {
    let orphans: Vec<&str> = existing.ids().filter(|id| !keep.contains(*id)).collect();
    if !orphans.is_empty() {
        debug!(course_id = ctx.course_id, ?orphans, "Pruning orphan modules");
    }
    let deletions = orphans
        .into_iter()
        .map(|id| delete_module(ctx, id, existing.fields(id).cloned()));
    settle(join_all(deletions).await)?;
    Ok(())
}

/// Deletes a module's sections, then the module document itself.
pub(crate) async fn delete_module(
    ctx: MergeContext<'_>,
    module_id: &str,
    previous: Option<Fields>,
) -> PortResult<()> {
    let sections = loader::load_sections(ctx.store, ctx.course_id, module_id).await?;
    let collection = store::sections(ctx.course_id, module_id);
    let deletions = sections
        .ids()
        .map(|id| delete_tracked(ctx, collection.doc(id), sections.fields(id).cloned(), Node::Section));
    settle(join_all(deletions).await)?;

    let path = store::modules(ctx.course_id).doc(module_id);
    delete_tracked(ctx, path, previous, Node::Module).await
}

async fn delete_tracked(
    ctx: MergeContext<'_>,
    path: DocumentPath,
    previous: Option<Fields>,
    node: Node,
) -> PortResult<()> {
    ctx.store.delete(&path).await?;
    if let Some(previous) = previous {
        ctx.journal.overwritten(path, previous);
    }
    ctx.tally.deleted(node);
    Ok(())
}
