use reqwest::StatusCode;
use serde_json::{json, Value};

use super::{id_of, TestFixture};

async fn create_event(fixture: &TestFixture, name: &str, capacity: Option<i64>) -> Value {
    fixture
        .create(
            "/api/events",
            json!({
                "name": name,
                "venue": "Town hall",
                "startsAt": "2099-05-01T19:00:00+02:00",
                "endsAt": "2099-05-01T23:30:00+02:00",
                "capacity": capacity
            }),
        )
        .await
}

#[tokio::test]
async fn test_event_crud_and_filter() {
    let fixture = TestFixture::new().await;

    let event = create_event(&fixture, "Spring ball", Some(200)).await;
    let id = id_of(&event);
    assert_eq!(event["status"], "planned");

    let (status, body) = fixture
        .put(
            &format!("/api/events/{}", id),
            json!({"status": "confirmed", "expectedVersion": 1}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "confirmed");

    create_event(&fixture, "Quiz night", None).await;

    let (_, body) = fixture.get("/api/events?status=confirmed").await;
    let events = body["data"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["name"], "Spring ball");

    let (_, body) = fixture.get("/api/events").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_event_schedule_validation() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post(
            "/api/events",
            json!({
                "name": "Backwards",
                "startsAt": "2099-05-02T10:00:00Z",
                "endsAt": "2099-05-01T10:00:00Z"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = fixture
        .post(
            "/api/events",
            json!({"name": "Sometime", "startsAt": "next friday"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_scenario_lifecycle_and_cascade() {
    let fixture = TestFixture::new().await;

    let event = create_event(&fixture, "Gala", Some(120)).await;
    let event_id = id_of(&event);
    let scenarios_path = format!("/api/events/{}/scenarios", event_id);

    let scenario = fixture
        .create(
            &scenarios_path,
            json!({
                "name": "Base",
                "ticketPrices": [40, 55],
                "staffPrices": [0],
                "occupancyLevels": [50, 100],
                "staffCount": 4,
                "lineItems": [
                    {"label": "Venue", "kind": "cost", "basis": "fixed", "amount": 1500}
                ]
            }),
        )
        .await;
    // Capacity falls back to the event's.
    assert_eq!(scenario["capacity"], 120);
    let scenario_id = id_of(&scenario);

    let (status, body) = fixture
        .post(&format!("/api/scenarios/{}/duplicate", scenario_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Base (copy)");
    assert_eq!(body["data"]["lineItems"][0]["label"], "Venue");
    assert_ne!(body["data"]["id"], scenario["id"]);

    let (status, body) = fixture
        .put(
            &format!("/api/scenarios/{}", scenario_id),
            json!({"occupancyLevels": [50, 120]}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (_, body) = fixture.get(&scenarios_path).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, _) = fixture.delete(&format!("/api/events/{}", event_id)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = fixture.get(&format!("/api/scenarios/{}", scenario_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_scenario_requires_capacity() {
    let fixture = TestFixture::new().await;

    let event = create_event(&fixture, "Open air", None).await;
    let (status, _) = fixture
        .post(
            &format!("/api/events/{}/scenarios", id_of(&event)),
            json!({
                "name": "No capacity",
                "ticketPrices": [10],
                "staffPrices": [0],
                "occupancyLevels": [100]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_scenario_size_limits() {
    let fixture = TestFixture::new().await;

    let event = create_event(&fixture, "Festival", Some(500)).await;
    let path = format!("/api/events/{}/scenarios", id_of(&event));

    let (status, body) = fixture
        .post(
            &path,
            json!({
                "name": "Everyone",
                "ticketPrices": [10],
                "staffPrices": [0],
                "occupancyLevels": [100],
                "capacity": i64::MAX,
                "staffCount": i64::MAX
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let prices: Vec<u32> = (1..=1000).collect();
    let (status, _) = fixture
        .post(
            &path,
            json!({
                "name": "Every price",
                "ticketPrices": prices,
                "staffPrices": prices,
                "occupancyLevels": [50, 100]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = fixture
        .post(
            "/api/events",
            json!({"name": "Stadium", "startsAt": "2099-06-01T18:00:00Z", "capacity": i64::MAX}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_scenario_metrics() {
    let fixture = TestFixture::new().await;

    let event = create_event(&fixture, "Concert", Some(100)).await;
    let scenario = fixture
        .create(
            &format!("/api/events/{}/scenarios", id_of(&event)),
            json!({
                "name": "Simple",
                "ticketPrices": [10],
                "staffPrices": [0],
                "occupancyLevels": [50, 100],
                "lineItems": [
                    {"label": "Band", "kind": "cost", "basis": "fixed", "amount": 600}
                ]
            }),
        )
        .await;

    let (status, body) = fixture
        .get(&format!("/api/scenarios/{}/metrics", id_of(&scenario)))
        .await;
    assert_eq!(status, StatusCode::OK);
    let metrics = &body["data"];
    let rows = metrics["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0]["guests"], 50);
    assert_eq!(rows[0]["revenue"], 500.0);
    assert_eq!(rows[0]["profit"], -100.0);
    assert_eq!(rows[0]["breakEvenTicketPrice"], 12.0);

    assert_eq!(rows[1]["guests"], 100);
    assert_eq!(rows[1]["profit"], 400.0);
    assert_eq!(rows[1]["costPerHead"], 6.0);

    assert_eq!(metrics["best"]["occupancy"], 100.0);
    assert_eq!(metrics["worst"]["occupancy"], 50.0);
    assert_eq!(metrics["profitableCount"], 1);

    let (status, _) = fixture.get("/api/scenarios/missing/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
