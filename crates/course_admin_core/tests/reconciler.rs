mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;

use common::*;
use course_admin_core::domain::{CourseStatus, DraftId};
use course_admin_core::store::{self, to_fields, Fields};
use course_admin_core::{CourseReconciler, DocumentStore, FailureKind, ReconcileError};

fn fields(value: serde_json::Value) -> Fields {
    to_fields(&value).unwrap()
}

#[tokio::test]
async fn create_persists_the_whole_tree() {
    let h = harness();
    let id = h
        .create(course(
            "Rust",
            vec![
                module("m-a", "A", vec![section("s-1", "One", vec![video("v1", 10)])]),
                module("m-b", "B", vec![]),
            ],
        ))
        .await;

    let tree = h.tree(&id).await;
    assert_eq!(tree.course.main_title, "Rust");
    assert_eq!(tree.course.status, CourseStatus::Active);
    let names: Vec<_> = tree.modules.iter().map(|m| m.module.module_name.as_str()).collect();
    assert_eq!(names, ["A", "B"]);
    assert_eq!(tree.modules[0].module.order, 0);
    assert_eq!(tree.modules[1].module.order, 1);
    assert_eq!(tree.modules[0].sections[0].videos, vec![video("v1", 10)]);
}

#[tokio::test]
async fn reapplying_the_loaded_tree_changes_nothing() {
    let h = harness();
    let id = h
        .create(course(
            "Rust",
            vec![
                module("m-a", "A", vec![section("s-1", "One", vec![video("v1", 10)])]),
                module("m-b", "B", vec![section("s-2", "Two", vec![])]),
            ],
        ))
        .await;
    let before = h.tree(&id).await;

    for _ in 0..2 {
        let result = h.courses.update_course(&id, draft_of(&before)).await;
        assert!(result.success, "{}", result.message);
        let summary = result.data.unwrap();
        assert_eq!(summary.modules_created + summary.modules_deleted, 0);
        assert_eq!(summary.sections_created + summary.sections_deleted, 0);
    }

    let after = h.tree(&id).await;
    assert_eq!(outline(&after), outline(&before));
    assert_eq!(after.course.created_at, before.course.created_at);
}

#[tokio::test]
async fn temporary_ids_adopt_existing_siblings_by_name() {
    let h = harness();
    let id = h
        .create(course(
            "Rust",
            vec![module("m-a", "Intro", vec![section("s-1", "Setup", vec![])])],
        ))
        .await;
    let before = h.tree(&id).await;

    // Same names, fresh client labels: nothing may be duplicated.
    let result = h
        .courses
        .update_course(
            &id,
            course(
                "Rust",
                vec![module("m-new", "Intro", vec![section("s-new", "Setup", vec![])])],
            ),
        )
        .await;
    assert!(result.success);

    let after = h.tree(&id).await;
    assert_eq!(after.modules.len(), 1);
    assert_eq!(after.modules[0].module.id, before.modules[0].module.id);
    assert_eq!(after.modules[0].sections.len(), 1);
    assert_eq!(after.modules[0].sections[0].id, before.modules[0].sections[0].id);
}

#[tokio::test]
async fn name_matching_is_case_sensitive() {
    let h = harness();
    let id = h.create(course("Rust", vec![module("m-a", "Intro", vec![])])).await;

    h.courses
        .update_course(&id, course("Rust", vec![module("m-b", "intro", vec![])]))
        .await;

    let after = h.tree(&id).await;
    assert_eq!(after.modules.len(), 1);
    assert_eq!(after.modules[0].module.module_name, "intro");
}

#[tokio::test]
async fn two_new_modules_with_one_name_never_share_a_document() {
    let h = harness();
    let id = h.create(course("Rust", vec![module("m-a", "Dup", vec![])])).await;

    let result = h
        .courses
        .update_course(
            &id,
            course("Rust", vec![module("x", "Dup", vec![]), module("y", "Dup", vec![])]),
        )
        .await;
    assert!(result.success);
    let summary = result.data.unwrap();
    assert_eq!(summary.modules_updated, 1);
    assert_eq!(summary.modules_created, 1);
    assert_eq!(h.tree(&id).await.modules.len(), 2);
}

#[tokio::test]
async fn dropped_modules_are_pruned_with_their_sections() {
    let h = harness();
    let id = h
        .create(course(
            "Rust",
            vec![
                module("a", "A", vec![section("a1", "A1", vec![])]),
                module("b", "B", vec![section("b1", "B1", vec![]), section("b2", "B2", vec![])]),
                module("c", "C", vec![section("c1", "C1", vec![])]),
            ],
        ))
        .await;
    let before = h.tree(&id).await;
    let b_id = before.modules[1].module.id.clone();

    let mut draft = draft_of(&before);
    draft.modules.remove(1);
    let result = h.courses.update_course(&id, draft).await;
    assert!(result.success);
    let summary = result.data.unwrap();
    assert_eq!(summary.modules_deleted, 1);
    assert_eq!(summary.sections_deleted, 2);

    let after = h.tree(&id).await;
    let names: Vec<_> = after.modules.iter().map(|m| m.module.module_name.as_str()).collect();
    assert_eq!(names, ["A", "C"]);
    assert_eq!(h.store.count(&store::sections(&id, &b_id)).await, 0);
    assert!(h.store.get(&store::modules(&id).doc(b_id)).await.unwrap().is_none());
}

#[tokio::test]
async fn dropped_sections_are_pruned() {
    let h = harness();
    let id = h
        .create(course(
            "Rust",
            vec![module("a", "A", vec![section("1", "Keep", vec![]), section("2", "Drop", vec![])])],
        ))
        .await;
    let mut draft = draft_of(&h.tree(&id).await);
    draft.modules[0].sections.pop();

    assert!(h.courses.update_course(&id, draft).await.success);
    let after = h.tree(&id).await;
    let titles: Vec<_> = after.modules[0].sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["Keep"]);
}

#[tokio::test]
async fn deleting_a_course_leaves_nothing_behind() {
    let h = harness();
    let id = h
        .create(course(
            "Rust",
            vec![
                module("a", "A", vec![section("1", "One", vec![]), section("2", "Two", vec![])]),
                module("b", "B", vec![section("3", "Three", vec![])]),
            ],
        ))
        .await;

    let result = h.courses.delete_course(&id).await;
    assert!(result.success);
    assert_eq!(result.data.unwrap().sections_deleted, 3);
    assert_eq!(h.store.count_under(&format!("courses/{id}")).await, 0);
    assert!(h.store.get(&store::course(&id)).await.unwrap().is_none());
    assert_eq!(h.store.count(&store::courses()).await, 0);
}

#[tokio::test]
async fn deleting_a_course_revokes_user_entitlements() {
    let h = harness();
    let id = h.create(course("Rust", vec![])).await;
    h.store
        .set(
            &store::users().doc("u1"),
            fields(json!({"email": "a@b.co", "courseIds": [id.clone(), "other"]})),
        )
        .await
        .unwrap();

    assert!(h.courses.delete_course(&id).await.success);
    let user = h.store.get(&store::users().doc("u1")).await.unwrap().unwrap();
    assert_eq!(user.fields["courseIds"], json!(["other"]));
}

#[tokio::test]
async fn section_duration_is_the_sum_of_its_videos() {
    let h = harness();
    let id = h
        .create(course(
            "Rust",
            vec![module("a", "A", vec![section("1", "S", vec![video("x", 30), video("y", 45)])])],
        ))
        .await;

    let tree = h.tree(&id).await;
    let section = &tree.modules[0].sections[0];
    assert_eq!(section.duration, 75);
    let stored = h
        .store
        .get(&store::sections(&id, &tree.modules[0].module.id).doc(section.id.clone()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.fields["duration"], json!(75));
    assert_eq!(stored.fields["videoId"], json!("x"));
}

#[tokio::test]
async fn client_durations_on_the_section_are_ignored() {
    let h = harness();
    let id = h.create(course("Rust", vec![module("a", "A", vec![section("1", "S", vec![video("x", 30)])])])).await;
    let mut draft = draft_of(&h.tree(&id).await);
    draft.modules[0].sections[0].videos = Some(vec![video("x", 30), video("z", 5)]);

    h.courses.update_course(&id, draft).await;
    assert_eq!(h.tree(&id).await.modules[0].sections[0].duration, 35);
}

#[tokio::test]
async fn legacy_video_id_round_trips_through_an_update() {
    let h = harness();
    let id = h.create(course("Rust", vec![module("a", "A", vec![])])).await;
    let module_id = h.tree(&id).await.modules[0].module.id.clone();
    let sections = store::sections(&id, &module_id);
    h.store
        .set(
            &sections.doc("legacy"),
            fields(json!({"title": "Old", "order": 0, "videoId": "abc"})),
        )
        .await
        .unwrap();

    let loaded = h.tree(&id).await;
    assert_eq!(loaded.modules[0].sections[0].videos, vec![video("abc", 0)]);

    let mut draft = draft_of(&loaded);
    draft.modules[0].sections[0].videos = None;
    assert!(h.courses.update_course(&id, draft).await.success);

    let stored = h.store.get(&sections.doc("legacy")).await.unwrap().unwrap();
    assert_eq!(stored.fields["videos"], json!([{"id": "abc", "duration": 0}]));
    assert_eq!(stored.fields["videoId"], json!("abc"));
}

#[tokio::test]
async fn updating_a_missing_course_writes_nothing() {
    let h = harness();
    let result = h
        .courses
        .update_course("nonexistent-id", course("Rust", vec![module("a", "A", vec![])]))
        .await;

    assert!(!result.success);
    assert_eq!(result.message, "Course not found");
    assert_eq!(result.error, Some(FailureKind::NotFound));
    assert_eq!(h.store.write_count(), 0);
}

#[tokio::test]
async fn invalid_drafts_are_rejected_before_any_write() {
    let h = harness();
    let id = h.create(course("Rust", vec![])).await;
    let writes = h.store.write_count();

    let result = h
        .courses
        .update_course(&id, course("Rust", vec![module("a", "", vec![])]))
        .await;
    assert_eq!(result.error, Some(FailureKind::Validation));
    assert_eq!(h.store.write_count(), writes);
}

#[tokio::test]
async fn rename_and_add_a_section_leaves_the_rest_alone() {
    let h = harness();
    let id = h
        .create(course("C1", vec![module("m", "M1", vec![section("s", "S1", vec![video("v1", 60)])])]))
        .await;
    let before = h.tree(&id).await;
    let s1_before = before.modules[0].sections[0].clone();

    let mut draft = draft_of(&before);
    draft.modules[0].module_name = "Module One".into();
    draft.modules[0]
        .sections
        .push(section("section-123", "New Section", vec![video("v2", 30)]));
    let result = h.courses.update_course(&id, draft).await;
    assert!(result.success, "{}", result.message);

    let after = h.tree(&id).await;
    let m1 = &after.modules[0];
    assert_eq!(m1.module.id, before.modules[0].module.id);
    assert_eq!(m1.module.module_name, "Module One");
    assert_eq!(m1.sections.len(), 2);

    let s1 = m1.sections.iter().find(|s| s.id == s1_before.id).unwrap();
    assert_eq!(s1.title, s1_before.title);
    assert_eq!(s1.videos, s1_before.videos);
    assert_eq!(s1.order, s1_before.order);

    let new = m1.sections.iter().find(|s| s.title == "New Section").unwrap();
    assert_ne!(new.id, "section-123");
    assert_eq!(new.videos, vec![video("v2", 30)]);
}

#[tokio::test]
async fn a_stale_persisted_id_is_recreated_under_that_id() {
    let h = harness();
    let id = h.create(course("Rust", vec![])).await;
    let mut draft = course("Rust", vec![module("x", "Revived", vec![])]);
    draft.modules[0].id = DraftId::persisted("gone-123");

    assert!(h.courses.update_course(&id, draft).await.success);
    let tree = h.tree(&id).await;
    assert_eq!(tree.modules[0].module.id, "gone-123");
}

#[tokio::test]
async fn missing_status_keeps_the_stored_one() {
    let h = harness();
    let mut draft = course("Rust", vec![]);
    draft.status = Some(CourseStatus::Published);
    let id = h.create(draft).await;

    h.courses.update_course(&id, course("Rust 2", vec![])).await;
    let tree = h.tree(&id).await;
    assert_eq!(tree.course.status, CourseStatus::Published);
    assert_eq!(tree.course.main_title, "Rust 2");
}

#[tokio::test]
async fn a_failed_write_rolls_the_whole_pass_back() {
    let h = harness();
    let id = h
        .create(course(
            "Rust",
            vec![
                module("a", "A", vec![section("1", "One", vec![])]),
                module("b", "B", vec![section("2", "Two", vec![])]),
            ],
        ))
        .await;
    let before = h.tree(&id).await;
    let broken_module = before.modules[1].module.id.clone();
    let documents_before = h.store.count_under(&format!("courses/{id}")).await;

    let mut draft = draft_of(&before);
    draft.main_title = "Renamed".into();
    draft.modules[0].module_name = "A renamed".into();
    draft.modules[1].sections.push(section("3", "Three", vec![]));
    draft.modules.push(module("c", "C", vec![section("4", "Four", vec![])]));

    h.store
        .fail_writes_containing(&format!("modules/{broken_module}/sections"));
    let result = h.courses.update_course(&id, draft).await;
    h.store.clear_failures();

    assert!(!result.success);
    assert_eq!(result.error, Some(FailureKind::Store));
    assert!(result.message.starts_with("Failed to update course: "), "{}", result.message);
    assert!(result.message.ends_with("(changes rolled back)"), "{}", result.message);

    let after = h.tree(&id).await;
    assert_eq!(after.course.main_title, "Rust");
    assert_eq!(outline(&after), outline(&before));
    assert_eq!(h.store.count_under(&format!("courses/{id}")).await, documents_before);
}

#[tokio::test]
async fn a_failed_create_removes_the_course_document() {
    let h = harness();
    h.store.fail_writes_containing("/sections/");
    let result = h
        .courses
        .create_course(course(
            "Rust",
            vec![
                module("a", "A", vec![section("1", "One", vec![])]),
                module("b", "B", vec![]),
            ],
        ))
        .await;
    h.store.clear_failures();

    assert_eq!(result.error, Some(FailureKind::Store));
    assert!(result.message.starts_with("Failed to create course: "), "{}", result.message);
    assert!(result.message.ends_with("(changes rolled back)"), "{}", result.message);
    assert_eq!(h.store.count(&store::courses()).await, 0);
    assert_eq!(h.store.count_under("courses").await, 0);
}

#[tokio::test]
async fn a_failed_delete_restores_what_was_already_removed() {
    let h = harness();
    let id = h
        .create(course(
            "Rust",
            vec![
                module("a", "A", vec![section("1", "One", vec![])]),
                module("b", "B", vec![section("2", "Two", vec![])]),
            ],
        ))
        .await;
    let before = h.tree(&id).await;
    let broken_module = before.modules[1].module.id.clone();
    let documents_before = h.store.count_under(&format!("courses/{id}")).await;

    h.store
        .fail_writes_containing(&format!("modules/{broken_module}/sections"));
    let result = h.courses.delete_course(&id).await;
    h.store.clear_failures();

    assert_eq!(result.error, Some(FailureKind::Store));
    assert!(result.message.starts_with("Failed to delete course: "), "{}", result.message);
    assert!(result.message.ends_with("(changes rolled back)"), "{}", result.message);
    assert!(h.store.get(&store::course(&id)).await.unwrap().is_some());
    assert_eq!(h.store.count_under(&format!("courses/{id}")).await, documents_before);
    assert_eq!(outline(&h.tree(&id).await), outline(&before));
}

#[tokio::test]
async fn overflowing_video_durations_are_rejected_before_any_write() {
    let h = harness();
    let endless = || section("x", "Endless", vec![video("a", u64::MAX), video("b", 1)]);

    let created = h
        .courses
        .create_course(course("Rust", vec![module("a", "A", vec![endless()])]))
        .await;
    assert_eq!(created.error, Some(FailureKind::Validation));
    assert_eq!(h.store.write_count(), 0);

    let id = h.create(course("Rust", vec![module("a", "A", vec![])])).await;
    let writes = h.store.write_count();
    let mut draft = course("Renamed", vec![module("a", "A", vec![])]);
    draft.modules.push(module("b", "B", vec![endless()]));
    let updated = h.courses.update_course(&id, draft).await;

    assert_eq!(updated.error, Some(FailureKind::Validation));
    assert_eq!(h.store.write_count(), writes);
    let tree = h.tree(&id).await;
    assert_eq!(tree.course.main_title, "Rust");
    assert_eq!(tree.modules.len(), 1);
}

#[tokio::test]
async fn reconciler_reports_missing_courses_as_a_distinct_error() {
    let store = Arc::new(course_admin_core::InMemoryDocumentStore::new());
    let reconciler = CourseReconciler::new(store.clone());
    let err = reconciler.delete("nope").await.unwrap_err();
    assert_matches!(err, ReconcileError::CourseNotFound);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn concurrent_updates_of_one_course_do_not_duplicate_modules() {
    let h = Arc::new(harness());
    let id = h.create(course("Rust", vec![module("a", "A", vec![])])).await;
    let draft = {
        let mut draft = draft_of(&h.tree(&id).await);
        draft.modules.push(module("tmp", "Extra", vec![section("s", "S", vec![])]));
        draft
    };

    let runs = (0..4).map(|_| {
        let h = h.clone();
        let id = id.clone();
        let draft = draft.clone();
        tokio::spawn(async move { h.courses.update_course(&id, draft).await })
    });
    for run in futures::future::join_all(runs).await {
        assert!(run.unwrap().success);
    }

    let tree = h.tree(&id).await;
    assert_eq!(tree.modules.len(), 2);
    assert_eq!(tree.modules[1].sections.len(), 1);
}

#[tokio::test]
async fn thumbnails_accept_images_only() {
    let h = harness();
    let id = h.create(course("Rust", vec![])).await;

    let rejected = h.courses.set_thumbnail(&id, b"%PDF", "application/pdf").await;
    assert_eq!(rejected.error, Some(FailureKind::Validation));

    let stored = h.courses.set_thumbnail(&id, b"\x89PNG", "image/png").await;
    assert!(stored.success);
    assert_eq!(h.tree(&id).await.course.thumbnail, stored.data);

    let missing = h.courses.set_thumbnail("nope", b"\x89PNG", "image/png").await;
    assert_eq!(missing.error, Some(FailureKind::NotFound));
}

#[tokio::test]
async fn course_options_list_titles() {
    let h = harness();
    let id = h.create(course("Rust", vec![])).await;
    let options = h.courses.course_options().await.data.unwrap();
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].id, id);
    assert_eq!(options[0].main_title, "Rust");
}
