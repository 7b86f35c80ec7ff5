//! Integration tests for user management and the projects area.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::test_app;

#[tokio::test]
async fn users_are_created_welcomed_and_deleted() {
    let app = test_app().await;
    let cookie = app.admin_cookie().await;

    let new_user = json!({"email": "ana@example.com", "password": "secret1", "courseIds": ["c1"]});
    let created = app
        .call(Method::POST, "/api/users", Some(&cookie), Some(new_user.clone()))
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    let user_id = created.body["data"]["userId"].as_str().unwrap().to_string();
    assert_eq!(app.mail.sent().len(), 1);
    assert_eq!(app.mail.sent()[0].to, "ana@example.com");

    let duplicate = app
        .call(Method::POST, "/api/users", Some(&cookie), Some(new_user))
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.body["message"], "Email is already in use");

    let listed = app.call(Method::GET, "/api/users", Some(&cookie), None).await;
    assert_eq!(listed.body["data"][0]["email"], "ana@example.com");

    let updated = app
        .call(
            Method::PUT,
            &format!("/api/users/{user_id}/courses"),
            Some(&cookie),
            Some(json!({"courseIds": ["c2"]})),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);

    let deleted = app
        .call(Method::DELETE, &format!("/api/users/{user_id}"), Some(&cookie), None)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "User deleted successfully");

    let again = app
        .call(Method::DELETE, &format!("/api/users/{user_id}"), Some(&cookie), None)
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_users_are_bad_requests() {
    let app = test_app().await;
    let cookie = app.admin_cookie().await;
    let response = app
        .call(
            Method::POST,
            "/api/users",
            Some(&cookie),
            Some(json!({"email": "ana@example.com", "password": "123", "courseIds": ["c1"]})),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.mail.sent().is_empty());
}

#[tokio::test]
async fn projects_flow_from_category_to_assignment() {
    let app = test_app().await;
    let cookie = app.admin_cookie().await;

    let category = app
        .call(
            Method::POST,
            "/api/project-categories",
            Some(&cookie),
            Some(json!({"title": "Web", "description": "Build for the browser"})),
        )
        .await;
    assert_eq!(category.status, StatusCode::CREATED, "{}", category.body);
    let category_id = category.body["data"]["id"].as_str().unwrap().to_string();

    let project = app
        .call(
            Method::POST,
            "/api/projects",
            Some(&cookie),
            Some(json!({
                "title": "Portfolio",
                "description": "A personal site",
                "categoryId": category_id,
                "objectives": ["Ship it"],
                "learningOutcomes": ["HTML"],
                "deliverables": ["Repository"],
                "toolsAndTechnologies": ["Rust"]
            })),
        )
        .await;
    assert_eq!(project.status, StatusCode::CREATED, "{}", project.body);
    let project_id = project.body["data"]["id"].as_str().unwrap().to_string();

    let in_use = app
        .call(
            Method::DELETE,
            &format!("/api/project-categories/{category_id}"),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(in_use.status, StatusCode::CONFLICT);

    let synced = app
        .call(
            Method::POST,
            "/api/assignments/sync",
            Some(&cookie),
            Some(json!({"projectIds": [project_id], "userIds": ["u1", "u2"]})),
        )
        .await;
    assert_eq!(synced.status, StatusCode::OK);
    assert_eq!(synced.body["data"]["added"], 2);

    let assignments = app
        .call(
            Method::GET,
            &format!("/api/assignments?projectId={project_id}"),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(assignments.body["data"].as_array().unwrap().len(), 2);

    let listed = app.call(Method::GET, "/api/projects", Some(&cookie), None).await;
    assert_eq!(listed.body["data"][0]["categoryTitle"], "Web");
}

#[tokio::test]
async fn unknown_submissions_cannot_be_reviewed() {
    let app = test_app().await;
    let cookie = app.admin_cookie().await;
    let response = app
        .call(
            Method::POST,
            "/api/submissions/missing/review",
            Some(&cookie),
            Some(json!({"feedback": "Good", "grade": 80})),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
