mod support;

use axum::http::{Method, StatusCode};
use serde_json::json;

use support::spawn_app;

fn rust_job() -> serde_json::Value {
    json!({
        "title": "Rust Developer",
        "description": "Build backend services",
        "keywords": "rust, tokio",
        "min_budget": 100,
        "max_budget": 500,
    })
}

#[tokio::test]
async fn create_search_apply_and_notify() {
    let app = spawn_app();
    let (author_id, author) = app.sign_up("author").await;
    let (applicant_id, applicant) = app.sign_up("applicant").await;

    let (status, body) = app
        .send(Method::POST, "/jobs/create", Some(rust_job()), Some(&author))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let job_id = body["job_id"].as_i64().unwrap();

    let (_, body) = app.send(Method::GET, "/api/jobs", None, None).await;
    assert_eq!(body["jobs"][0]["author_id"], author_id);

    let (status, body) = app
        .send(Method::GET, "/jobs/search?query=TOKIO", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jobs"].as_array().unwrap().len(), 1);

    let (status, body) = app.send(Method::GET, "/jobs/search", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let apply_uri = format!("/jobs/{job_id}/apply");
    let (status, _) = app
        .send(
            Method::POST,
            &apply_uri,
            Some(json!({ "cover_letter": "I know Rust" })),
            Some(&applicant),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .send(Method::POST, &apply_uri, Some(json!({})), Some(&applicant))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "DUPLICATE_APPLICATION");

    let (_, detail) = app
        .send(Method::GET, &format!("/jobs/{job_id}"), None, Some(&author))
        .await;
    assert_eq!(detail["title"], "Rust Developer");
    let applicants = detail["applicants"].as_array().unwrap();
    assert_eq!(applicants.len(), 1);
    assert_eq!(applicants[0]["applicant_id"], applicant_id);
    assert_eq!(applicants[0]["username"], "applicant");
    assert_eq!(applicants[0]["cover_letter"], "I know Rust");

    // 作者收到一条且仅一条通知
    let (status, inbox) = app
        .send(Method::GET, "/notifications", None, Some(&author))
        .await;
    assert_eq!(status, StatusCode::OK);
    let inbox = inbox.as_array().unwrap().clone();
    assert_eq!(inbox.len(), 1);
    assert_eq!(
        inbox[0]["message"],
        format!("User {applicant_id} has applied to your job \"Rust Developer\".")
    );
    assert_eq!(inbox[0]["is_read"], false);
    let notification_id = inbox[0]["id"].as_i64().unwrap();

    let read_uri = format!("/notifications/{notification_id}");
    let (status, _) = app
        .send(Method::PUT, &read_uri, None, Some(&applicant))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.send(Method::PUT, &read_uri, None, Some(&author)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notification"]["is_read"], true);
}

#[tokio::test]
async fn applicants_are_visible_to_the_author_only() {
    let app = spawn_app();
    let (_, author) = app.sign_up("owner").await;
    let (_, other) = app.sign_up("stranger").await;

    let (_, body) = app
        .send(Method::POST, "/jobs/create", Some(rust_job()), Some(&author))
        .await;
    let uri = format!("/jobs/{}/applicants", body["job_id"]);

    let (status, body) = app.send(Method::GET, &uri, None, Some(&other)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = app.send(Method::GET, &uri, None, Some(&author)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["applicants"].as_array().unwrap().is_empty());

    let (_, applicant) = app.sign_up("candidate").await;
    let apply_uri = uri.replace("applicants", "apply");
    let (status, _) = app
        .send(Method::POST, &apply_uri, None, Some(&applicant))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app.send(Method::GET, &uri, None, Some(&author)).await;
    let applicants = body["applicants"].as_array().unwrap();
    assert_eq!(applicants.len(), 1);
    assert_eq!(applicants[0]["username"], "candidate");
    assert!(applicants[0]["applicant_id"].is_i64());
}

#[tokio::test]
async fn malformed_ids_and_bodies_are_validation_errors() {
    let app = spawn_app();
    let (_, token) = app.sign_up("typo").await;

    for uri in ["/jobs/abc", "/api/chat-history/xyz"] {
        let (status, body) = app.send(Method::GET, uri, None, Some(&token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["code"], "VALIDATION_ERROR", "{uri}");
        assert!(body["message"].is_string());
    }

    let (status, body) = app
        .send(Method::PUT, "/notifications/first", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (_, created) = app
        .send(Method::POST, "/jobs/create", Some(rust_job()), Some(&token))
        .await;
    let apply_uri = format!("/jobs/{}/apply", created["job_id"]);
    let (status, body) = app
        .send(Method::POST, &apply_uri, Some(json!("oops")), Some(&token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .send(
            Method::POST,
            &apply_uri,
            Some(json!({ "resume_file": "r".repeat(256) })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "resume_file: must be at most 255 characters");
}

#[tokio::test]
async fn applying_to_unknown_job_is_not_found() {
    let app = spawn_app();
    let (_, token) = app.sign_up("seeker").await;

    let (status, body) = app
        .send(Method::POST, "/jobs/404/apply", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "job not found");
}

#[tokio::test]
async fn profile_update_and_record_deletion() {
    let app = spawn_app();
    let (_, owner) = app.sign_up("grace").await;
    let (_, intruder) = app.sign_up("mallory").await;

    let update = json!({
        "phone": "555-0100",
        "education": [{
            "degree": "BSc",
            "field": "Computer Science",
            "start_date": "2015-09-01",
            "end_date": "2019-06-30",
            "school_name": "State University"
        }]
    });

    let (status, body) = app
        .send(Method::PUT, "/profile/grace", Some(update.clone()), Some(&intruder))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = app
        .send(Method::PUT, "/profile/grace", Some(update), Some(&owner))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["phone"], "555-0100");
    let education_id = body["profile"]["education"][0]["id"].as_i64().unwrap();

    let (_, profile) = app.send(Method::GET, "/profile/grace", None, None).await;
    assert_eq!(profile["education"][0]["start_date"], "2015-09-01");

    let (status, _) = app
        .send(
            Method::DELETE,
            "/profile/grace",
            Some(json!({ "type": "hobby", "id": education_id })),
            Some(&owner),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::DELETE,
            "/profile/grace",
            Some(json!({ "type": "education", "id": education_id })),
            Some(&owner),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(
            Method::DELETE,
            "/profile/grace",
            Some(json!({ "type": "education", "id": education_id })),
            Some(&owner),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(Method::GET, "/profile/nobody", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn renaming_to_a_taken_username_fails() {
    let app = spawn_app();
    let (_, token) = app.sign_up("heidi").await;
    app.register("ivan").await;

    let (status, body) = app
        .send(
            Method::PUT,
            "/profile/heidi",
            Some(json!({ "name": "ivan" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "DUPLICATE_USERNAME");
}
