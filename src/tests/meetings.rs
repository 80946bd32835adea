use reqwest::StatusCode;
use serde_json::{json, Value};

use super::{id_of, TestFixture};

async fn started_meeting(fixture: &TestFixture, body: Value) -> String {
    let meeting = fixture.create("/api/meetings", body).await;
    let id = id_of(&meeting);
    let (status, body) = fixture
        .post(&format!("/api/meetings/{}/start", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "inProgress");
    assert!(body["data"]["calledToOrderAt"].is_string());
    id
}

async fn act(fixture: &TestFixture, motion_id: &str, action: Value) -> (StatusCode, Value) {
    fixture
        .post(&format!("/api/motions/{}/actions", motion_id), action)
        .await
}

#[tokio::test]
async fn test_committee_crud() {
    let fixture = TestFixture::new().await;

    let committee = fixture
        .create(
            "/api/committees",
            json!({
                "name": "Finance",
                "chairContactId": "c1",
                "memberContactIds": ["c1", "c2"]
            }),
        )
        .await;
    let id = id_of(&committee);

    let (status, body) = fixture
        .post("/api/committees", json!({"name": "FINANCE"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, _) = fixture
        .put(
            &format!("/api/committees/{}", id),
            json!({"chairContactId": "c9"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = fixture
        .put(
            &format!("/api/committees/{}", id),
            json!({"description": "Budget and accounts", "expectedVersion": 1}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["version"], 2);

    let meeting = fixture
        .create(
            "/api/meetings",
            json!({"committeeId": id, "title": "Q1 review", "scheduledAt": "2099-01-10T18:00:00Z"}),
        )
        .await;
    let (_, body) = fixture
        .get(&format!("/api/meetings?committeeId={}", id))
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = fixture.delete(&format!("/api/committees/{}", id)).await;
    assert_eq!(status, StatusCode::OK);

    // The meeting survives without its committee.
    let (status, body) = fixture
        .get(&format!("/api/meetings/{}", id_of(&meeting)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["committeeId"].is_null());
}

#[tokio::test]
async fn test_meeting_lifecycle() {
    let fixture = TestFixture::new().await;

    let meeting = fixture
        .create(
            "/api/meetings",
            json!({"title": "Board", "scheduledAt": "2099-02-01T18:00:00Z"}),
        )
        .await;
    let id = id_of(&meeting);

    let (status, body) = fixture
        .post(&format!("/api/meetings/{}/adjourn", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE");

    fixture
        .post(&format!("/api/meetings/{}/start", id), json!({}))
        .await;

    let (status, _) = fixture
        .post(&format!("/api/meetings/{}/cancel", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = fixture
        .put(
            &format!("/api/meetings/{}/minutes", id),
            json!({"minutes": "Opened at 18:02."}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["minutes"], "Opened at 18:02.");

    let (status, body) = fixture
        .post(&format!("/api/meetings/{}/adjourn", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "adjourned");
    assert!(body["data"]["adjournedAt"].is_string());

    let other = fixture
        .create(
            "/api/meetings",
            json!({"title": "Spare", "scheduledAt": "2099-03-01T18:00:00Z"}),
        )
        .await;
    let (status, body) = fixture
        .post(&format!("/api/meetings/{}/cancel", id_of(&other)), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");
}

#[tokio::test]
async fn test_agenda_ordering() {
    let fixture = TestFixture::new().await;

    let meeting = fixture
        .create(
            "/api/meetings",
            json!({"title": "AGM", "scheduledAt": "2099-04-01T18:00:00Z"}),
        )
        .await;
    let agenda_path = format!("/api/meetings/{}/agenda", id_of(&meeting));

    let mut ids = Vec::new();
    for title in ["Welcome", "Accounts", "Elections"] {
        let item = fixture.create(&agenda_path, json!({"title": title})).await;
        ids.push(id_of(&item));
    }

    let (status, body) = fixture
        .put(
            &format!("{}/order", agenda_path),
            json!({"itemIds": [ids[2], ids[0], ids[1]]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Elections", "Welcome", "Accounts"]);

    // Not a permutation.
    let (status, _) = fixture
        .put(
            &format!("{}/order", agenda_path),
            json!({"itemIds": [ids[0], ids[1]]}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = fixture.delete(&format!("/api/agenda/{}", ids[2])).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = fixture.get(&agenda_path).await;
    let positions: Vec<(i64, &str)> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| (i["position"].as_i64().unwrap(), i["title"].as_str().unwrap()))
        .collect();
    assert_eq!(positions, vec![(1, "Welcome"), (2, "Accounts")]);

    let (status, body) = fixture
        .put(&format!("/api/agenda/{}", ids[0]), json!({"status": "discussed"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "discussed");
}

#[tokio::test]
async fn test_motion_needs_meeting_in_progress() {
    let fixture = TestFixture::new().await;

    let meeting = fixture
        .create(
            "/api/meetings",
            json!({"title": "Not yet", "scheduledAt": "2099-05-01T18:00:00Z"}),
        )
        .await;
    let (status, body) = fixture
        .post(
            &format!("/api/meetings/{}/motions", id_of(&meeting)),
            json!({"text": "Buy a new kettle", "movedBy": "c1"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE");
}

#[tokio::test]
async fn test_motion_second_and_vote() {
    let fixture = TestFixture::new().await;

    let meeting_id = started_meeting(
        &fixture,
        json!({"title": "Board", "scheduledAt": "2099-06-01T18:00:00Z"}),
    )
    .await;
    let motions_path = format!("/api/meetings/{}/motions", meeting_id);

    let motion = fixture
        .create(
            &motions_path,
            json!({"text": "Raise dues by 5%", "movedBy": "c1"}),
        )
        .await;
    let motion_id = id_of(&motion);
    assert_eq!(motion["status"], "moved");
    assert_eq!(motion["threshold"], "majority");

    let (status, _) = act(&fixture, &motion_id, json!({"action": "second", "contactId": "c1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = act(
        &fixture,
        &motion_id,
        json!({"action": "vote", "for": 3, "against": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) =
        act(&fixture, &motion_id, json!({"action": "second", "contactId": "c2"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "seconded");
    assert_eq!(body["data"]["secondedBy"], "c2");

    // Adjourning with a pending motion is refused.
    let (status, _) = fixture
        .post(&format!("/api/meetings/{}/adjourn", meeting_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, overview) = fixture.get("/api/overview").await;
    assert_eq!(overview["data"]["openMotions"], 1);

    let (status, body) = act(
        &fixture,
        &motion_id,
        json!({"action": "vote", "for": 4, "against": 4, "abstain": 2}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "failed");
    assert_eq!(body["data"]["votesAbstain"], 2);
    assert!(body["data"]["decidedAt"].is_string());

    let (status, _) = fixture
        .post(&format!("/api/meetings/{}/adjourn", meeting_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_amendment_blocks_vote_on_main_motion() {
    let fixture = TestFixture::new().await;

    let meeting_id = started_meeting(
        &fixture,
        json!({"title": "Board", "scheduledAt": "2099-07-01T18:00:00Z"}),
    )
    .await;
    let motions_path = format!("/api/meetings/{}/motions", meeting_id);

    let main = fixture
        .create(&motions_path, json!({"text": "Hold a summer party", "movedBy": "c1"}))
        .await;
    let main_id = id_of(&main);

    // Amendments need a seconded parent.
    let (status, _) = fixture
        .post(
            &motions_path,
            json!({"kind": "amendment", "text": "in July", "movedBy": "c3", "parentMotionId": main_id}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    act(&fixture, &main_id, json!({"action": "second", "contactId": "c2"})).await;
    let amendment = fixture
        .create(
            &motions_path,
            json!({"kind": "amendment", "text": "in July", "movedBy": "c3", "parentMotionId": main_id}),
        )
        .await;
    let amendment_id = id_of(&amendment);

    let (status, body) = act(
        &fixture,
        &main_id,
        json!({"action": "vote", "for": 5, "against": 0}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE");

    let (status, body) = act(&fixture, &amendment_id, json!({"action": "withdraw"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "withdrawn");

    let (status, body) = act(
        &fixture,
        &main_id,
        json!({"action": "vote", "for": 5, "against": 0}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "adopted");

    let (_, body) = fixture.get(&motions_path).await;
    let listed: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(listed, vec![main_id.as_str(), amendment_id.as_str()]);
}

#[tokio::test]
async fn test_two_thirds_table_and_quorum() {
    let fixture = TestFixture::new().await;

    let meeting_id = started_meeting(
        &fixture,
        json!({
            "title": "Small board",
            "scheduledAt": "2099-08-01T18:00:00Z",
            "quorum": 3,
            "attendeeContactIds": ["c1", "c2"]
        }),
    )
    .await;
    let motions_path = format!("/api/meetings/{}/motions", meeting_id);

    let question = fixture
        .create(
            &motions_path,
            json!({"kind": "previousQuestion", "text": "Close debate", "movedBy": "c1"}),
        )
        .await;
    assert_eq!(question["threshold"], "twoThirds");
    let question_id = id_of(&question);

    act(&fixture, &question_id, json!({"action": "second", "contactId": "c2"})).await;

    let (status, body) = act(&fixture, &question_id, json!({"action": "table"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "tabled");
    let (_, body) = act(&fixture, &question_id, json!({"action": "takeFromTable"})).await;
    assert_eq!(body["data"]["status"], "seconded");

    // Two attendees against a quorum of three.
    let (status, body) = act(
        &fixture,
        &question_id,
        json!({"action": "vote", "for": 2, "against": 0}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE");

    let (status, _) = fixture
        .put(
            &format!("/api/meetings/{}", meeting_id),
            json!({"attendeeContactIds": ["c1", "c2", "c3"]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = act(
        &fixture,
        &question_id,
        json!({"action": "vote", "for": 2, "against": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "adopted");
}
