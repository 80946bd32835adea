use reqwest::StatusCode;
use serde_json::{json, Value};

use super::{id_of, TestFixture};

async fn contact(fixture: &TestFixture, body: Value) -> String {
    id_of(&fixture.create("/api/contacts", body).await)
}

#[tokio::test]
async fn test_list_membership_rules() {
    let fixture = TestFixture::new().await;

    let with_email = contact(
        &fixture,
        json!({"firstName": "Ada", "lastName": "Lovelace", "email": "ada@example.org"}),
    )
    .await;
    let no_address = contact(&fixture, json!({"firstName": "Nomad", "lastName": "X"})).await;

    let postal = fixture
        .create(
            "/api/lists",
            json!({"name": "Printed newsletter", "channel": "postal"}),
        )
        .await;
    let (status, _) = fixture
        .post(
            &format!("/api/lists/{}/members", id_of(&postal)),
            json!({"contactId": with_email}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let email = fixture.create("/api/lists", json!({"name": "News"})).await;
    let members_path = format!("/api/lists/{}/members", id_of(&email));

    let (status, _) = fixture
        .post(&members_path, json!({"contactId": no_address}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let first = fixture
        .create(&members_path, json!({"contactId": with_email}))
        .await;
    assert_eq!(first["memberCount"], 1);
    let (status, body) = fixture
        .post(&members_path, json!({"contactId": with_email}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["memberCount"], 1);

    let (status, _) = fixture
        .post(&members_path, json!({"contactId": "missing"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = fixture
        .delete(&format!("{}/{}", members_path, with_email))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = fixture
        .delete(&format!("{}/{}", members_path, with_email))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = fixture.post("/api/lists", json!({"name": "news"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_batch_lifecycle() {
    let fixture = TestFixture::new().await;

    let ada = contact(
        &fixture,
        json!({
            "firstName": "Ada", "lastName": "Lovelace",
            "street": "1 Main St", "postalCode": "12345", "city": "London"
        }),
    )
    .await;
    let alan = contact(
        &fixture,
        json!({
            "firstName": "Alan", "lastName": "Turing",
            "street": "2 Side St", "postalCode": "54321", "city": "Wilmslow"
        }),
    )
    .await;

    let list = fixture
        .create(
            "/api/lists",
            json!({"name": "Annual letter", "channel": "postal"}),
        )
        .await;
    let list_id = id_of(&list);

    let (status, body) = fixture
        .post("/api/batches", json!({"listId": list_id, "name": "Empty"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE");

    for id in [&ada, &alan] {
        fixture
            .create(
                &format!("/api/lists/{}/members", list_id),
                json!({"contactId": id}),
            )
            .await;
    }

    let detail = fixture
        .create(
            "/api/batches",
            json!({"listId": list_id, "name": "Letter 2099"}),
        )
        .await;
    let batch_id = detail["batch"]["id"].as_str().unwrap().to_string();
    assert_eq!(detail["batch"]["status"], "prepared");
    assert_eq!(detail["batch"]["recipientCount"], 2);
    assert_eq!(detail["report"]["pending"], 2);
    assert_eq!(detail["recipients"][0]["city"], "London");

    // Later contact edits do not touch the snapshot.
    fixture
        .put(&format!("/api/contacts/{}", ada), json!({"city": "Paris"}))
        .await;

    let recipient_id = detail["recipients"][0]["id"].as_str().unwrap().to_string();
    let recipient_path = format!("/api/batches/{}/recipients/{}", batch_id, recipient_id);

    let (status, _) = fixture
        .put(&recipient_path, json!({"status": "delivered"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = fixture
        .post(&format!("/api/batches/{}/send", batch_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["batch"]["status"], "sent");
    assert!(body["data"]["batch"]["sentAt"].is_string());
    assert_eq!(body["data"]["report"]["mailed"], 2);

    let (status, _) = fixture
        .post(&format!("/api/batches/{}/send", batch_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = fixture
        .put(
            &recipient_path,
            json!({"status": "returned", "note": "Moved away"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "returned");
    assert_eq!(body["data"]["note"], "Moved away");

    let (status, _) = fixture
        .put(&recipient_path, json!({"status": "delivered"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = fixture
        .post(&format!("/api/batches/{}/close", batch_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["batch"]["status"], "closed");

    // Deleting the list and a contact leaves the batch intact.
    fixture.delete(&format!("/api/lists/{}", list_id)).await;
    fixture.delete(&format!("/api/contacts/{}", alan)).await;

    let (status, body) = fixture.get(&format!("/api/batches/{}", batch_id)).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert!(data["batch"]["listId"].is_null());
    assert_eq!(data["batch"]["listName"], "Annual letter");
    assert_eq!(data["recipients"][0]["city"], "London");
    assert_eq!(data["recipients"].as_array().unwrap().len(), 2);
    assert_eq!(data["report"]["returned"], 1);
    assert_eq!(data["report"]["mailed"], 1);

    let (_, body) = fixture.get("/api/batches").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
