mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use common::{empty_request, json_request, test_app};

#[tokio::test]
async fn finish_and_resume_round_trip() {
    let app = test_app();
    let ada = app.register_and_login("ada@example.com").await;
    let goal_id = app.create_goal(&ada, "Learn Rust").await;
    let milestone_id = app.create_milestone(&ada, goal_id, "Ownership").await;

    let finish = format!("/milestones/{milestone_id}?edit=finish");
    let resume = format!("/milestones/{milestone_id}?edit=resume");

    let resp = app
        .send(empty_request(Method::PUT, &finish, Some(&ada.access_token)))
        .await;
    assert_eq!(resp.body["milestone"]["isComplete"], true);

    let resp = app
        .send(empty_request(Method::PUT, &resume, Some(&ada.access_token)))
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.message(), "Milestone set to incomplete");
    assert_eq!(resp.body["milestone"]["isComplete"], false);
    assert_eq!(app.goal(&ada, goal_id).await["counters"]["finished"], 0);

    // Resuming an incomplete milestone changes nothing.
    app.send(empty_request(Method::PUT, &resume, Some(&ada.access_token)))
        .await;
    assert_eq!(app.goal(&ada, goal_id).await["counters"]["finished"], 0);
}

#[tokio::test]
async fn unknown_edit_is_rejected() {
    let app = test_app();
    let ada = app.register_and_login("ada@example.com").await;
    let goal_id = app.create_goal(&ada, "Learn Rust").await;
    let milestone_id = app.create_milestone(&ada, goal_id, "Ownership").await;

    let resp = app
        .send(empty_request(
            Method::PUT,
            &format!("/milestones/{milestone_id}?edit=archive"),
            Some(&ada.access_token),
        ))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn plain_edit_leaves_completion_alone() {
    let app = test_app();
    let ada = app.register_and_login("ada@example.com").await;
    let goal_id = app.create_goal(&ada, "Learn Rust").await;
    let milestone_id = app.create_milestone(&ada, goal_id, "Ownership").await;
    app.send(empty_request(
        Method::PUT,
        &format!("/milestones/{milestone_id}?edit=finish"),
        Some(&ada.access_token),
    ))
    .await;

    let resp = app
        .send(json_request(
            Method::PUT,
            &format!("/milestones/{milestone_id}"),
            Some(&ada.access_token),
            json!({ "title": "Ownership and lifetimes", "endDate": "2024-03-01" }),
        ))
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.message(), "Milestone edited successfully");

    let milestone = app.milestone(&ada, milestone_id).await;
    assert_eq!(milestone["title"], "Ownership and lifetimes");
    assert_eq!(milestone["description"], "Chapters 1-4");
    assert_eq!(milestone["endDate"], "2024-03-01");
    assert_eq!(milestone["isComplete"], true);
    assert_eq!(app.goal(&ada, goal_id).await["counters"]["finished"], 1);
}

#[tokio::test]
async fn create_checks_parent_and_duplicates() {
    let app = test_app();
    let ada = app.register_and_login("ada@example.com").await;
    let bob = app.register_and_login("bob@example.com").await;
    let goal_id = app.create_goal(&ada, "Learn Rust").await;
    app.create_milestone(&ada, goal_id, "Ownership").await;

    let body = |goal: Uuid| {
        json!({
            "goalId": goal,
            "title": "Ownership",
            "description": "Chapters 1-4",
            "endDate": "2024-02-01",
        })
    };

    let dup = app
        .send(json_request(Method::POST, "/milestones", Some(&ada.access_token), body(goal_id)))
        .await;
    assert_eq!(dup.status, StatusCode::CONFLICT);
    assert_eq!(dup.message(), "Milestone already exists");

    let missing = app
        .send(json_request(
            Method::POST,
            "/milestones",
            Some(&ada.access_token),
            body(Uuid::new_v4()),
        ))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let foreign = app
        .send(json_request(Method::POST, "/milestones", Some(&bob.access_token), body(goal_id)))
        .await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);

    assert_eq!(app.goal(&ada, goal_id).await["counters"]["milestones"], 1);
}

#[tokio::test]
async fn list_by_goal_and_owner() {
    let app = test_app();
    let ada = app.register_and_login("ada@example.com").await;
    let bob = app.register_and_login("bob@example.com").await;
    let rust = app.create_goal(&ada, "Learn Rust").await;
    let marathon = app.create_goal(&ada, "Run a marathon").await;
    app.create_milestone(&ada, rust, "Ownership").await;
    app.create_milestone(&ada, rust, "Traits").await;
    app.create_milestone(&ada, marathon, "10k").await;

    let by_goal = app.get(&format!("/milestones?goalId={rust}"), &ada).await;
    assert_eq!(by_goal.status, StatusCode::OK);
    assert_eq!(by_goal.body["milestones"].as_array().unwrap().len(), 2);

    let by_owner = app.get(&format!("/milestones?userId={}", ada.id), &ada).await;
    assert_eq!(by_owner.body["milestones"].as_array().unwrap().len(), 3);

    let foreign = app.get(&format!("/milestones?goalId={rust}"), &bob).await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);

    let by_date = app.get("/milestones?date=2024-02-01", &ada).await;
    assert_eq!(by_date.status, StatusCode::BAD_REQUEST);
}
