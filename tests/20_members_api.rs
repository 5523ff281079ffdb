mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;

use common::{admin, request, TestApp};

#[tokio::test]
async fn create_applies_defaults_and_assigns_id() -> Result<()> {
    let app = TestApp::spawn();

    let res = app
        .post_json("/members/member", Some(&admin()), &json!({"name": "Aldric", "level": 5}))
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "body: {}", res.body);
    let id = res.body["id"].as_str().unwrap_or_default().to_string();
    assert!(!id.is_empty());
    assert_eq!(res.body["name"], "Aldric");
    assert_eq!(res.body["level"], 5);
    assert_eq!(res.body["hp"], 1);

    for _ in 0..2 {
        let fetched = app.get(&format!("/members/member/{}", id), None).await?;
        assert_eq!(fetched.status, StatusCode::OK);
        assert_eq!(fetched.body["id"], id.as_str());
        assert_eq!(fetched.body["name"], "Aldric");
    }
    Ok(())
}

#[tokio::test]
async fn member_without_owner_stays_out_of_the_owner_index() -> Result<()> {
    let app = TestApp::spawn();

    let res = app
        .post_json("/members/member", Some(&admin()), &json!({"name": "Aldric", "owner": ""}))
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "body: {}", res.body);
    assert!(res.body.get("owner").is_none());

    app.seed_member(json!({"id": "m2", "name": "Brin", "owner": "alice"})).await?;
    let res = app.put_json("/members/member/m2", Some(&admin()), &json!({"owner": " "})).await?;
    assert_eq!(res.status, StatusCode::OK, "body: {}", res.body);
    assert!(res.body.get("owner").is_none());

    let listed = app.get("/members/characters?sub=alice", Some(&admin())).await?;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body, json!([]));
    Ok(())
}

#[tokio::test]
async fn blank_name_is_rejected_without_write() -> Result<()> {
    let app = TestApp::spawn();

    let res = app.post_json("/members/member", Some(&admin()), &json!({"name": "   "})).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert_eq!(res.body["error"], true);
    assert!(app.store.is_empty(&app.config.tables.members));
    Ok(())
}

#[tokio::test]
async fn update_leaves_absent_fields_alone() -> Result<()> {
    let app = TestApp::spawn();
    app.seed_member(json!({"id": "m1", "name": "Old", "title": "Sir", "hp": 7})).await?;

    let res = app.put_json("/members/member/m1", Some(&admin()), &json!({"name": "New"})).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "New");
    assert_eq!(res.body["title"], "Sir");
    assert_eq!(res.body["hp"], 7);
    assert!(res.body["updated_at"].is_string());

    let fetched = app.get("/members/member/m1", None).await?;
    assert_eq!(fetched.body["title"], "Sir");
    assert_eq!(fetched.body["id"], "m1");
    Ok(())
}

#[tokio::test]
async fn empty_update_is_a_no_op() -> Result<()> {
    let app = TestApp::spawn();
    app.seed_member(json!({"id": "m1", "name": "Aldric", "title": "Sir"})).await?;

    let res = app.put_json("/members/member/m1", Some(&admin()), &json!({})).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "Aldric");
    assert_eq!(res.body["title"], "Sir");
    assert!(res.body.get("updated_at").is_none());
    Ok(())
}

#[tokio::test]
async fn update_rejects_blank_name_and_missing_member() -> Result<()> {
    let app = TestApp::spawn();
    app.seed_member(json!({"id": "m1", "name": "Aldric"})).await?;

    let res = app.put_json("/members/member/m1", Some(&admin()), &json!({"name": " "})).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    let res = app.put_json("/members/member/ghost", Some(&admin()), &json!({"name": "Boo"})).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["code"], "MEMBER_NOT_FOUND");
    assert_eq!(app.store.len(&app.config.tables.members), 1);
    Ok(())
}

#[tokio::test]
async fn delete_of_missing_member_mutates_nothing() -> Result<()> {
    let app = TestApp::spawn();
    app.seed_member(json!({"id": "m1", "name": "Aldric"})).await?;

    let res = app.delete("/members/member/ghost", Some(&admin())).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["code"], "MEMBER_NOT_FOUND");
    assert_eq!(app.store.len(&app.config.tables.members), 1);
    Ok(())
}

#[tokio::test]
async fn delete_removes_member_and_image() -> Result<()> {
    let app = TestApp::spawn();
    let created = app
        .send(common::multipart_request(
            Method::POST,
            "/members/member",
            &admin(),
            &json!({"name": "Aldric"}),
            Some(("face.png", &common::png(40, 40)[..])),
        )?)
        .await?;
    assert_eq!(created.status, StatusCode::CREATED, "body: {}", created.body);
    let id = created.body["id"].as_str().unwrap_or_default().to_string();
    assert_eq!(app.objects.keys().len(), 1);

    let res = app.delete(&format!("/members/member/{}", id), Some(&admin())).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["deleted"], true);
    assert!(app.objects.keys().is_empty());

    let gone = app.get(&format!("/members/member/{}", id), None).await?;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn delete_survives_missing_image_object() -> Result<()> {
    let app = TestApp::spawn();
    app.seed_member(json!({"id": "m1", "name": "Aldric", "image": "lost.jpg"})).await?;

    let res = app.delete("/members/member/m1", Some(&admin())).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert!(app.store.is_empty(&app.config.tables.members));
    Ok(())
}

#[tokio::test]
async fn listing_is_projected_and_includes_deleted() -> Result<()> {
    let app = TestApp::spawn();
    app.seed_member(json!({"id": "m1", "name": "Aldric", "biography": "<p>Long</p>", "groups": ["g1"]})).await?;
    app.seed_member(json!({"id": "m2", "name": "Brin", "deleted": 1})).await?;

    let res = app.get("/members", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    let members = res.body.as_array().cloned().unwrap_or_default();
    assert_eq!(members.len(), 2);
    assert!(members.iter().all(|m| m.get("biography").is_none()));
    assert!(members.iter().all(|m| m.get("deleted").is_none()));
    assert_eq!(members[0]["groups"], json!(["g1"]));
    Ok(())
}

#[tokio::test]
async fn lookup_tables_are_listed_in_full() -> Result<()> {
    let app = TestApp::spawn();
    let classes = app.config.tables.classes.clone();
    app.seed(&classes, json!({"id": "c1", "name": "Wizard", "colour": "blue"})).await?;
    app.seed(&classes, json!({"id": "c2", "name": "Rogue"})).await?;

    let res = app.get("/members/classes", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body.as_array().map(Vec::len), Some(2));
    assert_eq!(res.body[0]["colour"], "blue");

    let res = app.get("/members/auras", None).await?;
    assert_eq!(res.body, json!([]));
    Ok(())
}

#[tokio::test]
async fn sessions_are_listed_and_counted() -> Result<()> {
    let app = TestApp::spawn();
    let sessions = app.config.tables.sessions.clone();
    for report in ["r3", "r1", "r2"] {
        app.seed(&sessions, json!({"member_id": "m1", "report_id": report, "xp": 10})).await?;
    }
    app.seed(&sessions, json!({"member_id": "m2", "report_id": "r1"})).await?;

    let res = app.get("/members/sessions/m1", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    let ids: Vec<&str> = res
        .body
        .as_array()
        .map(|items| items.iter().filter_map(|s| s["report_id"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(ids, vec!["r1", "r2", "r3"]);
    assert_eq!(res.body[0]["xp"], 10);

    let res = app.get("/members/sessions/m1/count", None).await?;
    assert_eq!(res.body, json!({"member_id": "m1", "count": 3}));
    Ok(())
}

#[tokio::test]
async fn malformed_json_surfaces_as_internal_error() -> Result<()> {
    let app = TestApp::spawn();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/members/member")
        .header("authorization", format!("Bearer {}", admin()))
        .header("content-type", "application/json")
        .body(Body::from("{\"name\": "))?;

    let res = app.send(req).await?;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body["code"], "INTERNAL_ERROR");
    assert!(res.body["message"].as_str().map_or(false, |m| !m.is_empty()));
    Ok(())
}

#[tokio::test]
async fn preflight_and_cors_headers() -> Result<()> {
    let app = TestApp::spawn();

    let res = app.send(request(Method::OPTIONS, "/anything/at/all", None, None)?).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({}));
    assert_eq!(res.headers["access-control-allow-origin"], "*");

    let res = app.get("/members/member/ghost", None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.headers["access-control-allow-origin"], "*");
    assert_eq!(res.headers["access-control-allow-methods"], "GET,POST,PUT,DELETE,OPTIONS");
    assert_eq!(res.headers["content-type"], "application/json");
    Ok(())
}

#[tokio::test]
async fn routing_errors() -> Result<()> {
    let app = TestApp::spawn();

    let res = app.send(request(Method::PATCH, "/members/member/1", Some(&admin()), None)?).await?;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);

    let res = app.get("/heroes", None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.put_json("/members/member", Some(&admin()), &json!({})).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.get("/health", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "ok");
    Ok(())
}
