//! HTTP-level integration tests running the router over the Postgres adapter.
//!
//! Each test gets a fresh database with the service migrations applied, so
//! uniqueness, ownership checks, cascades and ordering are exercised in SQL
//! rather than in the in-memory double. Requires `DATABASE_URL`.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, build_pg_test_app};
use serde_json::json;
use sqlx::PgPool;

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_registration_maps_to_duplicate_identity(pool: PgPool) {
    let app = build_pg_test_app(pool.clone());
    app.register("alice", "a@x.com", "secret1").await;

    for (username, email) in [("alice", "other@x.com"), ("other", "a@x.com")] {
        let response = app
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "username": username, "email": email, "password": "secret1" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "DUPLICATE_IDENTITY");
    }
    assert_eq!(count(&pool, "users").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn login_by_username_and_email_against_stored_hash(pool: PgPool) {
    let app = build_pg_test_app(pool);
    app.register("alice", "a@x.com", "secret1").await;

    for identifier in ["alice", "a@x.com"] {
        let ok = app
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": identifier, "password": "secret1" })),
            )
            .await;
        assert_eq!(ok.status(), StatusCode::OK);
    }

    let wrong = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice", "password": "secret2" })),
        )
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(wrong).await["code"], "INVALID_CREDENTIALS");
}

#[sqlx::test(migrations = "./migrations")]
async fn ambiguous_identifier_resolves_to_the_email_owner(pool: PgPool) {
    let app = build_pg_test_app(pool);
    app.register("shared@x.com", "first@x.com", "secret1").await;
    app.register("second", "shared@x.com", "secret2").await;

    let response = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "shared@x.com", "password": "secret2" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["user"]["username"], "second");
}

// ---------------------------------------------------------------------------
// Languages
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_and_colliding_language_names(pool: PgPool) {
    let app = build_pg_test_app(pool);
    let alice = app.register("alice", "a@x.com", "secret1").await;
    let bob = app.register("bob", "b@x.com", "secret1").await;
    app.create_language(&alice, "Spanish").await;
    let french = app.create_language(&alice, "French").await;

    let again = app
        .post("/api/languages", &alice, json!({ "name": "Spanish" }))
        .await;
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(again).await["code"], "DUPLICATE_NAME");

    let rename = app
        .put(
            &format!("/api/languages/{french}"),
            &alice,
            json!({ "name": "Spanish" }),
        )
        .await;
    assert_eq!(rename.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(rename).await["code"], "DUPLICATE_NAME");

    // Names are unique per owner only.
    app.create_language(&bob, "Spanish").await;
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_creates_with_one_name_let_exactly_one_through(pool: PgPool) {
    let app = build_pg_test_app(pool.clone());
    let token = app.register("alice", "a@x.com", "secret1").await;

    let body = json!({ "name": "Spanish" });
    let (first, second) = tokio::join!(
        app.post("/api/languages", &token, body.clone()),
        app.post("/api/languages", &token, body.clone()),
    );

    let mut statuses = [first.status().as_u16(), second.status().as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, [201, 400]);
    assert_eq!(count(&pool, "languages").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn languages_are_ordered_by_minutes_then_newest(pool: PgPool) {
    let app = build_pg_test_app(pool);
    let token = app.register("alice", "a@x.com", "secret1").await;
    let spanish = app.create_language(&token, "Spanish").await;
    app.create_language(&token, "French").await;
    app.create_language(&token, "German").await;
    app.log_session(&token, &spanish, "Reading", 45, "2024-03-01").await;

    let list = body_json(app.get("/api/languages", &token).await).await;
    let summary: Vec<(String, i64)> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|l| {
            (
                l["name"].as_str().unwrap().to_string(),
                l["total_minutes"].as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Spanish".to_string(), 45),
            ("German".to_string(), 0),
            ("French".to_string(), 0),
        ]
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn foreign_language_rows_are_not_found(pool: PgPool) {
    let app = build_pg_test_app(pool.clone());
    let alice = app.register("alice", "a@x.com", "secret1").await;
    let bob = app.register("bob", "b@x.com", "secret1").await;
    app.create_language(&alice, "Spanish").await;
    let bobs = app.create_language(&bob, "Spanish").await;

    let delete = app.delete(&format!("/api/languages/{bobs}"), &alice).await;
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);
    let rename = app
        .put(
            &format!("/api/languages/{bobs}"),
            &alice,
            json!({ "name": "Mine now" }),
        )
        .await;
    assert_eq!(rename.status(), StatusCode::NOT_FOUND);
    let stats = app.get(&format!("/api/sessions/stats/{bobs}"), &alice).await;
    assert_eq!(stats.status(), StatusCode::NOT_FOUND);

    assert_eq!(count(&pool, "languages").await, 2);
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn logging_against_a_foreign_language_is_not_found(pool: PgPool) {
    let app = build_pg_test_app(pool.clone());
    let alice = app.register("alice", "a@x.com", "secret1").await;
    let bob = app.register("bob", "b@x.com", "secret1").await;
    let bobs = app.create_language(&bob, "Spanish").await;

    let response = app
        .post(
            "/api/sessions",
            &alice,
            json!({
                "language_id": bobs,
                "category": "Reading",
                "duration_minutes": 30,
                "date": "2024-03-01"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(count(&pool, "study_sessions").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn stats_round_trip_and_category_ties(pool: PgPool) {
    let app = build_pg_test_app(pool);
    let token = app.register("alice", "a@x.com", "secret1").await;
    let spanish = app.create_language(&token, "Spanish").await;

    let response = app
        .post(
            "/api/sessions",
            &token,
            json!({
                "language_id": spanish,
                "category": "Reading",
                "duration_minutes": 45,
                "date": "2024-03-01",
                "notes": "ch.3"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let stats = body_json(app.get(&format!("/api/sessions/stats/{spanish}"), &token).await).await;
    assert_eq!(
        stats,
        json!({
            "total_minutes": 45,
            "by_category": [
                { "category": "Reading", "total_minutes": 45, "session_count": 1 }
            ]
        })
    );

    app.log_session(&token, &spanish, "Listening", 45, "2024-03-02").await;
    let stats = body_json(app.get(&format!("/api/sessions/stats/{spanish}"), &token).await).await;
    assert_eq!(stats["total_minutes"], 90);
    assert_eq!(stats["by_category"][0]["category"], "Listening");
    assert_eq!(stats["by_category"][1]["category"], "Reading");
}

#[sqlx::test(migrations = "./migrations")]
async fn session_dates_come_back_unshifted_and_in_order(pool: PgPool) {
    let app = build_pg_test_app(pool);
    let token = app.register("alice", "a@x.com", "secret1").await;
    let spanish = app.create_language(&token, "Spanish").await;
    app.log_session(&token, &spanish, "Reading", 10, "2024-03-01").await;
    app.log_session(&token, &spanish, "Writing", 20, "2024-03-03").await;
    app.log_session(&token, &spanish, "Grammar", 30, "2024-03-01").await;

    let list = body_json(app.get("/api/sessions", &token).await).await;
    let rows: Vec<(&str, &str)> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|s| (s["date"].as_str().unwrap(), s["category"].as_str().unwrap()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("2024-03-03", "Writing"),
            ("2024-03-01", "Grammar"),
            ("2024-03-01", "Reading"),
        ]
    );
    assert_eq!(list[0]["language_name"], "Spanish");
}

#[sqlx::test(migrations = "./migrations")]
async fn overall_stats_empty_then_tied(pool: PgPool) {
    let app = build_pg_test_app(pool);
    let token = app.register("alice", "a@x.com", "secret1").await;

    let empty = body_json(app.get("/api/sessions/overall-stats", &token).await).await;
    assert_eq!(empty, json!({ "total_minutes": 0, "top_language": null }));

    let spanish = app.create_language(&token, "Spanish").await;
    let french = app.create_language(&token, "French").await;
    app.log_session(&token, &spanish, "Reading", 30, "2024-03-01").await;
    app.log_session(&token, &french, "Reading", 30, "2024-03-01").await;

    let stats = body_json(app.get("/api/sessions/overall-stats", &token).await).await;
    assert_eq!(
        stats,
        json!({
            "total_minutes": 60,
            "top_language": { "name": "French", "total_minutes": 30 }
        })
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_a_language_cascades_to_its_sessions(pool: PgPool) {
    let app = build_pg_test_app(pool.clone());
    let token = app.register("alice", "a@x.com", "secret1").await;
    let spanish = app.create_language(&token, "Spanish").await;
    let french = app.create_language(&token, "French").await;
    app.log_session(&token, &spanish, "Reading", 30, "2024-03-01").await;
    app.log_session(&token, &spanish, "Writing", 15, "2024-03-02").await;
    app.log_session(&token, &french, "Reading", 20, "2024-03-02").await;

    let response = app.delete(&format!("/api/languages/{spanish}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(count(&pool, "study_sessions").await, 1);
    let listing = app
        .get(&format!("/api/sessions/language/{spanish}"), &token)
        .await;
    assert_eq!(listing.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_a_user_cascades_to_languages_and_sessions(pool: PgPool) {
    let app = build_pg_test_app(pool.clone());
    let alice = app.register("alice", "a@x.com", "secret1").await;
    let bob = app.register("bob", "b@x.com", "secret1").await;
    for token in [&alice, &bob] {
        let language = app.create_language(token, "Spanish").await;
        app.log_session(token, &language, "Reading", 30, "2024-03-01").await;
    }

    sqlx::query("DELETE FROM users WHERE username = $1")
        .bind("alice")
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(count(&pool, "users").await, 1);
    assert_eq!(count(&pool, "languages").await, 1);
    assert_eq!(count(&pool, "study_sessions").await, 1);

    let me = app.get("/api/auth/me", &alice).await;
    assert_eq!(me.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_twice_is_not_found_both_times(pool: PgPool) {
    let app = build_pg_test_app(pool);
    let token = app.register("alice", "a@x.com", "secret1").await;
    let spanish = app.create_language(&token, "Spanish").await;
    let session = app.log_session(&token, &spanish, "Reading", 30, "2024-03-01").await;

    assert_eq!(
        app.delete(&format!("/api/sessions/{session}"), &token).await.status(),
        StatusCode::OK
    );
    for _ in 0..2 {
        let again = app.delete(&format!("/api/sessions/{session}"), &token).await;
        assert_eq!(again.status(), StatusCode::NOT_FOUND);
    }

    assert_eq!(
        app.delete(&format!("/api/languages/{spanish}"), &token).await.status(),
        StatusCode::OK
    );
    for _ in 0..2 {
        let again = app.delete(&format!("/api/languages/{spanish}"), &token).await;
        assert_eq!(again.status(), StatusCode::NOT_FOUND);
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn daily_activity_sums_per_calendar_day(pool: PgPool) {
    let app = build_pg_test_app(pool);
    let token = app.register("alice", "a@x.com", "secret1").await;
    let spanish = app.create_language(&token, "Spanish").await;
    app.log_session(&token, &spanish, "Reading", 30, "2024-03-02").await;
    app.log_session(&token, &spanish, "Writing", 15, "2024-03-01").await;
    app.log_session(&token, &spanish, "Speaking", 10, "2024-03-02").await;

    let days = body_json(app.get("/api/sessions/daily-activity", &token).await).await;
    assert_eq!(
        days,
        json!([
            { "date": "2024-03-01", "total_minutes": 15, "session_count": 1 },
            { "date": "2024-03-02", "total_minutes": 40, "session_count": 2 }
        ])
    );
}
