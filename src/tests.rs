//! Integration tests for the Lodge backend.
//!
//! The router runs against an in-memory datastore; Hackatime, the admin
//! config resource and the OAuth endpoints are served by wiremock.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::{Config, DatabaseIds};
use crate::db::props::{Properties, Property};
use crate::db::{Datastore, MemoryDatastore, Repository};
use crate::hackatime::HackatimeClient;
use crate::{create_router, AppState};

const MEMBERS_DB: &str = "members-db";
const TEAMS_DB: &str = "teams-db";
const PROJECTS_DB: &str = "projects-db";
const STORE_DB: &str = "store-db";
const EVENTS_DB: &str = "events-db";
const NEWS_DB: &str = "news-db";
const SETTINGS_DB: &str = "settings-db";

/// Test fixture for integration tests.
struct TestFixture {
    base_url: String,
    store: Arc<MemoryDatastore>,
    mock: MockServer,
    temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let mock = MockServer::start().await;
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let allowlist_path = temp_dir.path().join("allowed-members.json");

        let config = Config {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
            docstore_base_url: "http://unused.invalid".to_string(),
            docstore_api_key: String::new(),
            databases: DatabaseIds {
                members: MEMBERS_DB.to_string(),
                teams: TEAMS_DB.to_string(),
                projects: PROJECTS_DB.to_string(),
                store_items: STORE_DB.to_string(),
                events: EVENTS_DB.to_string(),
                news: NEWS_DB.to_string(),
                settings: SETTINGS_DB.to_string(),
            },
            hackatime_base_url: mock.uri(),
            slack_client_id: "client-id".to_string(),
            slack_client_secret: "client-secret".to_string(),
            slack_redirect_uri: "http://localhost:3000/api/auth/callback".to_string(),
            slack_api_base: mock.uri(),
            admin_config_url: format!("{}/data.json", mock.uri()),
            allowlist_path,
            invite_code: Some("LODGEDEMO".to_string()),
            demo_slack_id: "U000000001".to_string(),
        };

        let store = Arc::new(MemoryDatastore::new());
        let repo = Arc::new(Repository::new(store.clone(), config.databases.clone()));
        let hackatime = Arc::new(HackatimeClient::new(&config.hackatime_base_url));

        let state = AppState {
            repo,
            hackatime,
            http: reqwest::Client::new(),
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            base_url,
            store,
            mock,
            temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Client carrying a session cookie for the given Slack id.
    fn client_as(&self, slack_user_id: &str) -> Client {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::COOKIE,
            format!("slack_user_id={}", slack_user_id).parse().unwrap(),
        );
        Client::builder().default_headers(headers).build().unwrap()
    }

    fn client(&self) -> Client {
        Client::new()
    }

    fn seed_member(&self, slack_id: &str, name: &str, xp: f64) -> String {
        let properties = Properties::from_iter([
            ("Name".to_string(), Property::title(name)),
            ("Email Address".to_string(), Property::email("")),
            ("Slack ID".to_string(), Property::text(slack_id)),
            ("Slack Name".to_string(), Property::text(name)),
            ("Experience Points".to_string(), Property::number(xp)),
            ("Banned".to_string(), Property::checkbox(false)),
        ]);
        self.store.insert(MEMBERS_DB, properties)
    }

    fn seed_store_item(
        &self,
        name: &str,
        price: f64,
        stock_status: &str,
        category: &str,
        limit: f64,
    ) -> String {
        let properties = Properties::from_iter([
            ("Name".to_string(), Property::title(name)),
            ("Description".to_string(), Property::text("A test item")),
            ("XP Price".to_string(), Property::number(price)),
            ("Stock Status".to_string(), Property::select(stock_status)),
            ("Category".to_string(), Property::select(category)),
            ("Limit per person".to_string(), Property::number(limit)),
        ]);
        self.store.insert(STORE_DB, properties)
    }

    async fn mount_admin_config(&self, admin_ids: &[&str]) {
        Mock::given(method("GET"))
            .and(path("/data.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "admin-slack-ids": admin_ids })),
            )
            .mount(&self.mock)
            .await;
    }

    async fn mount_hackatime_stats(&self, slack_id: &str, projects: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/v1/users/{}/stats", slack_id)))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "projects": projects } })),
            )
            .mount(&self.mock)
            .await;
    }
}

// ==================== HEALTH & PROFILE ====================

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client()
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_me_without_session() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client()
        .get(fixture.url("/api/user/me"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["authenticated"], false);
}

#[tokio::test]
async fn test_me_with_session() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U100", "Alice", 250.0);

    let resp = fixture
        .client_as("U100")
        .get(fixture.url("/api/user/me"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["id"], "U100");
    assert_eq!(body["user"]["xp"], 250);
    assert_eq!(body["user"]["teamName"], "No Team Assigned");
    assert_eq!(body["user"]["purchasedItems"].as_array().unwrap().len(), 0);
}

// ==================== STORE ====================

#[tokio::test]
async fn test_purchase_and_limit() {
    let fixture = TestFixture::new().await;
    let member_page = fixture.seed_member("U1", "Alice", 500.0);
    let item_id = fixture.seed_store_item("Sticker Pack", 300.0, "In stock", "Swag", 1.0);

    let client = fixture.client_as("U1");

    // First purchase succeeds
    let resp = client
        .post(fixture.url("/api/store/purchase"))
        .json(&json!({ "itemId": item_id }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["newXP"], 200);
    assert_eq!(body["purchase"]["itemName"], "Sticker Pack");
    assert_eq!(body["purchase"]["xpPrice"], 300);
    assert_eq!(body["purchase"]["used"], false);
    assert!(body["purchase"]["usedAt"].is_null());

    // The balance and ledger were written in one update
    let page = fixture.store.page(&member_page).unwrap();
    assert_eq!(page.number("Experience Points"), 200.0);

    // Second purchase of a limit-1 item fails, balance unchanged
    let resp = client
        .post(fixture.url("/api/store/purchase"))
        .json(&json!({ "itemId": item_id }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Purchase limit reached for this item");

    let me: Value = client
        .get(fixture.url("/api/user/me"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["user"]["xp"], 200);
    assert_eq!(me["user"]["purchasedItems"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_purchase_rejections() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 100.0);
    let restocking = fixture.seed_store_item("Hoodie", 50.0, "Will be restocked", "Swag", 0.0);
    let pricey = fixture.seed_store_item("Keyboard", 900.0, "In stock", "Hardware", 0.0);

    let client = fixture.client_as("U1");

    let resp = client
        .post(fixture.url("/api/store/purchase"))
        .json(&json!({ "itemId": restocking }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Item is not in stock");

    let resp = client
        .post(fixture.url("/api/store/purchase"))
        .json(&json!({ "itemId": pricey }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Insufficient XP");

    let resp = client
        .post(fixture.url("/api/store/purchase"))
        .json(&json!({ "itemId": "missing-item" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .post(fixture.url("/api/store/purchase"))
        .json(&json!({ "itemId": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_toggle_usage_round_trip() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 500.0);
    let item_id = fixture.seed_store_item("Sticker Pack", 100.0, "In stock", "Swag", 0.0);

    let client = fixture.client_as("U1");
    client
        .post(fixture.url("/api/store/purchase"))
        .json(&json!({ "itemId": item_id }))
        .send()
        .await
        .unwrap();

    // Mark used
    let resp = client
        .post(fixture.url("/api/store/toggle-usage"))
        .json(&json!({ "purchaseIndex": 0, "markAsUsed": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["updatedItem"]["used"], true);
    assert!(body["updatedItem"]["usedAt"].is_string());

    // Unmark restores the exact initial shape
    let resp = client
        .post(fixture.url("/api/store/toggle-usage"))
        .json(&json!({ "purchaseIndex": 0, "markAsUsed": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["updatedItem"]["used"], false);
    assert!(body["updatedItem"]["usedAt"].is_null());

    // Out-of-bounds index
    let resp = client
        .post(fixture.url("/api/store/toggle-usage"))
        .json(&json!({ "purchaseIndex": 5, "markAsUsed": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid purchase index");

    // Missing parameters
    let resp = client
        .post(fixture.url("/api/store/toggle-usage"))
        .json(&json!({ "purchaseIndex": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_store_catalog_sorted_by_category_then_price() {
    let fixture = TestFixture::new().await;
    fixture.seed_store_item("Zebra", 100.0, "In stock", "Bravo", 0.0);
    fixture.seed_store_item("Apple", 500.0, "In stock", "Alpha", 0.0);
    fixture.seed_store_item("Cherry", 50.0, "In stock", "Alpha", 0.0);

    let resp = fixture
        .client()
        .get(fixture.url("/api/store"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let names: Vec<&str> = body["storeItems"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Cherry", "Apple", "Zebra"]);
}

// ==================== TEAMS ====================

async fn create_team(client: &Client, fixture: &TestFixture, name: &str, team_type: &str) -> Value {
    let resp = client
        .post(fixture.url("/api/teams/create"))
        .json(&json!({ "teamName": name, "teamType": team_type }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn test_team_create_join_and_size_sync() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 0.0);
    fixture.seed_member("U2", "Bob", 0.0);

    let alice = fixture.client_as("U1");
    let bob = fixture.client_as("U2");

    let created = create_team(&alice, &fixture, "Owls", "Public").await;
    let team_id = created["teamId"].as_str().unwrap().to_string();

    // Creator cannot create a second team
    let resp = alice
        .post(fixture.url("/api/teams/create"))
        .json(&json!({ "teamName": "Again", "teamType": "Public" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "User is already on a team");

    // Bob joins; size goes from 1 to 2
    let resp = bob
        .post(fixture.url("/api/teams/join"))
        .json(&json!({ "teamId": team_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let teams: Value = fixture
        .client()
        .get(fixture.url("/api/teams"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let team = &teams["teams"][0];
    assert_eq!(team["teamSize"], 2);
    assert_eq!(team["members"].as_array().unwrap().len(), 2);
    assert_eq!(team["type"], "Public");

    // Unknown team
    let resp = fixture
        .client_as("U3-no-such")
        .post(fixture.url("/api/teams/join"))
        .json(&json!({ "teamId": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_invalid_team_type_rejected() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 0.0);

    let resp = fixture
        .client_as("U1")
        .post(fixture.url("/api/teams/create"))
        .json(&json!({ "teamName": "Owls", "teamType": "Secret" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid team type");
}

#[tokio::test]
async fn test_join_private_team_forbidden() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 0.0);
    fixture.seed_member("U2", "Bob", 0.0);

    let created = create_team(&fixture.client_as("U1"), &fixture, "Hermits", "Private").await;
    let team_id = created["teamId"].as_str().unwrap().to_string();

    let resp = fixture
        .client_as("U2")
        .post(fixture.url("/api/teams/join"))
        .json(&json!({ "teamId": team_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Cannot join private team");
}

#[tokio::test]
async fn test_join_request_dedup() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 0.0);
    fixture.seed_member("U2", "Bob", 0.0);

    let created = create_team(&fixture.client_as("U1"), &fixture, "Owls", "Ask for invite").await;
    let team_id = created["teamId"].as_str().unwrap().to_string();

    let bob = fixture.client_as("U2");
    let resp = bob
        .post(fixture.url("/api/teams/request"))
        .json(&json!({ "teamId": team_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Duplicate request from the same member is rejected
    let resp = bob
        .post(fixture.url("/api/teams/request"))
        .json(&json!({ "teamId": team_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Join request already sent");

    let teams: Value = fixture
        .client()
        .get(fixture.url("/api/teams"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let requests = teams["teams"][0]["joinRequests"].as_array().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["id"], "U2");
    assert_eq!(requests[0]["status"], "pending");
}

#[tokio::test]
async fn test_request_join_requires_invite_team() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 0.0);
    fixture.seed_member("U2", "Bob", 0.0);

    let created = create_team(&fixture.client_as("U1"), &fixture, "Owls", "Public").await;
    let team_id = created["teamId"].as_str().unwrap().to_string();

    let resp = fixture
        .client_as("U2")
        .post(fixture.url("/api/teams/request"))
        .json(&json!({ "teamId": team_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "This team does not accept join requests");
}

#[tokio::test]
async fn test_leave_team_decrements_and_last_member_deletes() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 0.0);
    fixture.seed_member("U2", "Bob", 0.0);

    let alice = fixture.client_as("U1");
    let bob = fixture.client_as("U2");

    let created = create_team(&alice, &fixture, "Owls", "Public").await;
    let team_id = created["teamId"].as_str().unwrap().to_string();
    bob.post(fixture.url("/api/teams/join"))
        .json(&json!({ "teamId": team_id }))
        .send()
        .await
        .unwrap();

    let team_pages = fixture.store.query(TEAMS_DB, None, &[]).await.unwrap();
    let team_page_id = team_pages[0].id.clone();

    // Bob leaves: roster shrinks to exactly Alice
    let resp = bob
        .post(fixture.url("/api/teams/leave"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let teams: Value = fixture
        .client()
        .get(fixture.url("/api/teams"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let team = &teams["teams"][0];
    assert_eq!(team["teamSize"], 1);
    let members = team["members"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["id"], "U1");

    // Alice leaves as last member: the team record disappears
    let resp = alice
        .post(fixture.url("/api/teams/leave"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(!fixture.store.contains(&team_page_id));

    // Leaving again fails
    let resp = alice
        .post(fixture.url("/api/teams/leave"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "User is not on a team");
}

// ==================== PROJECTS ====================

async fn create_project(client: &Client, fixture: &TestFixture, name: &str) -> Value {
    let resp = client
        .post(fixture.url("/api/projects/create"))
        .json(&json!({ "projectName": name, "description": "A test project" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn test_project_name_unique_per_team_only() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 0.0);
    fixture.seed_member("U2", "Bob", 0.0);

    let alice = fixture.client_as("U1");
    let bob = fixture.client_as("U2");
    create_team(&alice, &fixture, "Owls", "Public").await;
    create_team(&bob, &fixture, "Foxes", "Public").await;

    let created = create_project(&alice, &fixture, "Tracker").await;
    assert_eq!(created["project"]["status"], "Created");

    // Same name, same team: rejected
    let resp = alice
        .post(fixture.url("/api/projects/create"))
        .json(&json!({ "projectName": "Tracker" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Project with this name already exists");

    // Same name, different team: fine
    let resp = bob
        .post(fixture.url("/api/projects/create"))
        .json(&json!({ "projectName": "Tracker" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_project_listing() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 0.0);
    let alice = fixture.client_as("U1");
    create_team(&alice, &fixture, "Owls", "Public").await;
    create_project(&alice, &fixture, "Tracker").await;

    // Listing requires a session
    let resp = fixture
        .client()
        .get(fixture.url("/api/projects"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let body: Value = alice
        .get(fixture.url("/api/projects"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let projects = body["projects"].as_array().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["name"], "Tracker");
    assert_eq!(projects[0]["teamName"], "Owls");
    assert_eq!(projects[0]["status"], "Created");
    assert_eq!(projects[0]["members"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_project_requires_team() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 0.0);

    let resp = fixture
        .client_as("U1")
        .post(fixture.url("/api/projects/create"))
        .json(&json!({ "projectName": "Tracker" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "User must be on a team to create projects");
}

#[tokio::test]
async fn test_devlog_appends_and_auto_transitions() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 0.0);
    let alice = fixture.client_as("U1");
    create_team(&alice, &fixture, "Owls", "Public").await;
    let created = create_project(&alice, &fixture, "Tracker").await;
    let project_id = created["project"]["id"].as_str().unwrap().to_string();

    let resp = alice
        .post(fixture.url(&format!("/api/projects/{}/devlogs", project_id)))
        .json(&json!({ "content": "Shipped the first cut" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["devlog"]["content"], "Shipped the first cut");
    assert_eq!(body["devlog"]["author"], "Alice");

    let project: Value = alice
        .get(fixture.url(&format!("/api/projects/{}", project_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(project["project"]["status"], "In development");
    assert_eq!(project["project"]["devlogs"].as_array().unwrap().len(), 1);
    assert_eq!(project["project"]["teamName"], "Owls");

    // Empty content is rejected
    let resp = alice
        .post(fixture.url(&format!("/api/projects/{}/devlogs", project_id)))
        .json(&json!({ "content": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_project_access_requires_same_team() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 0.0);
    fixture.seed_member("U2", "Bob", 0.0);

    let alice = fixture.client_as("U1");
    let bob = fixture.client_as("U2");
    create_team(&alice, &fixture, "Owls", "Public").await;
    create_team(&bob, &fixture, "Foxes", "Public").await;

    let created = create_project(&alice, &fixture, "Tracker").await;
    let project_id = created["project"]["id"].as_str().unwrap().to_string();

    let resp = bob
        .get(fixture.url(&format!("/api/projects/{}", project_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Access denied");
}

#[tokio::test]
async fn test_project_partial_update() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 0.0);
    let alice = fixture.client_as("U1");
    create_team(&alice, &fixture, "Owls", "Public").await;
    let created = create_project(&alice, &fixture, "Tracker").await;
    let project_id = created["project"]["id"].as_str().unwrap().to_string();

    let resp = alice
        .put(fixture.url(&format!("/api/projects/{}", project_id)))
        .json(&json!({ "gitRepo": "https://example.com/owls/tracker" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let project: Value = alice
        .get(fixture.url(&format!("/api/projects/{}", project_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        project["project"]["gitRepo"],
        "https://example.com/owls/tracker"
    );
    // Description untouched by the partial update
    assert_eq!(project["project"]["description"], "A test project");
}

// ==================== HACKATIME ====================

#[tokio::test]
async fn test_hackatime_link_unlink_and_hours() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 0.0);
    fixture
        .mount_hackatime_stats(
            "U1",
            json!([
                { "name": "tracker-cli", "total_seconds": 7200 },
                { "name": "other", "total_seconds": 999 }
            ]),
        )
        .await;

    let alice = fixture.client_as("U1");
    create_team(&alice, &fixture, "Owls", "Public").await;
    let created = create_project(&alice, &fixture, "Tracker").await;
    let project_id = created["project"]["id"].as_str().unwrap().to_string();

    // Link: hours come from the matching project only
    let resp = alice
        .post(fixture.url(&format!("/api/projects/{}/hackatime", project_id)))
        .json(&json!({ "projectName": "tracker-cli" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["updatedHours"], 2.0);
    assert_eq!(body["hackatimeProject"]["userId"], "U1");

    // Linking moved the project out of Created
    let project: Value = alice
        .get(fixture.url(&format!("/api/projects/{}", project_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(project["project"]["status"], "In development");
    assert_eq!(project["project"]["hackatimeHours"], 2.0);

    // Same (name, user) pair cannot be linked twice
    let resp = alice
        .post(fixture.url(&format!("/api/projects/{}/hackatime", project_id)))
        .json(&json!({ "projectName": "tracker-cli" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "This Hackatime project is already linked for you");

    // Unlink drops the hours back to zero
    let resp = alice
        .delete(fixture.url(&format!("/api/projects/{}/hackatime", project_id)))
        .json(&json!({ "projectName": "tracker-cli" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["updatedHours"], 0.0);
}

#[tokio::test]
async fn test_hackatime_hours_round_to_two_decimals() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 0.0);
    // 5000 seconds = 1.3888... hours, rounds to 1.39
    fixture
        .mount_hackatime_stats("U1", json!([{ "name": "tracker-cli", "total_seconds": 5000 }]))
        .await;

    let alice = fixture.client_as("U1");
    create_team(&alice, &fixture, "Owls", "Public").await;
    let created = create_project(&alice, &fixture, "Tracker").await;
    let project_id = created["project"]["id"].as_str().unwrap().to_string();

    let body: Value = alice
        .post(fixture.url(&format!("/api/projects/{}/hackatime", project_id)))
        .json(&json!({ "projectName": "tracker-cli" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["updatedHours"], 1.39);
}

// ==================== FEEDS & SETTINGS ====================

#[tokio::test]
async fn test_settings_fold_boolean_strings() {
    let fixture = TestFixture::new().await;
    for (item, value) in [("storeOpen", "true"), ("signupOpen", "false"), ("motd", "hi")] {
        let properties = Properties::from_iter([
            ("Item".to_string(), Property::title(item)),
            ("Value".to_string(), Property::text(value)),
        ]);
        fixture.store.insert(SETTINGS_DB, properties);
    }

    let body: Value = fixture
        .client()
        .get(fixture.url("/api/settings"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["settings"]["storeOpen"], true);
    assert_eq!(body["settings"]["signupOpen"], false);
    assert_eq!(body["settings"]["motd"], "hi");
}

#[tokio::test]
async fn test_leaderboard_excludes_banned_and_zero_xp() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 300.0);
    fixture.seed_member("U2", "Bob", 700.0);
    fixture.seed_member("U3", "Zero", 0.0);
    let banned_page = fixture.seed_member("U4", "Mallory", 900.0);
    // Flag Mallory as banned directly in the store
    fixture
        .store
        .update(
            &banned_page,
            Properties::from_iter([("Banned".to_string(), Property::checkbox(true))]),
        )
        .await
        .unwrap();

    let body: Value = fixture
        .client()
        .get(fixture.url("/api/leaderboard"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["id"], "U2");
    assert_eq!(users[0]["rank"], 1);
    assert_eq!(users[1]["id"], "U1");
    assert_eq!(users[1]["rank"], 2);
}

// ==================== AUTH ====================

#[tokio::test]
async fn test_invite_login_sets_session() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client()
        .post(fixture.url("/api/auth/invite"))
        .json(&json!({ "inviteCode": "LODGEDEMO" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let cookie = resp
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cookie.contains("slack_user_id=U000000001"));
    assert!(cookie.contains("HttpOnly"));

    let resp = fixture
        .client()
        .post(fixture.url("/api/auth/invite"))
        .json(&json!({ "inviteCode": "WRONG" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client_as("U1")
        .post(fixture.url("/api/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let cookie = resp
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_oauth_callback_creates_allow_listed_member() {
    let fixture = TestFixture::new().await;

    // Allow-list the incoming identity
    tokio::fs::write(
        fixture.temp_dir.path().join("allowed-members.json"),
        serde_json::to_vec(&json!(["U777"])).unwrap(),
    )
    .await
    .unwrap();

    Mock::given(method("POST"))
        .and(path("/api/oauth.v2.access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "authed_user": { "access_token": "xoxp-test" }
        })))
        .mount(&fixture.mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users.identity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "user": { "id": "U777", "name": "carol", "email": "carol@example.com" }
        })))
        .mount(&fixture.mock)
        .await;

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let resp = client
        .get(fixture.url("/api/auth/callback?code=test-code"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 303);
    let location = resp
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(location.ends_with("/dashboard"));
    let cookie = resp
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cookie.contains("slack_user_id=U777"));

    // The member record was created with a zero balance
    let me: Value = fixture
        .client_as("U777")
        .get(fixture.url("/api/user/me"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["authenticated"], true);
    assert_eq!(me["user"]["xp"], 0);
}

#[tokio::test]
async fn test_oauth_callback_rejects_unlisted_member() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/oauth.v2.access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "authed_user": { "access_token": "xoxp-test" }
        })))
        .mount(&fixture.mock)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users.identity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "user": { "id": "U888", "name": "dave" }
        })))
        .mount(&fixture.mock)
        .await;

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let resp = client
        .get(fixture.url("/api/auth/callback?code=test-code"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 303);
    let location = resp
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(location.ends_with("/unauthorized"));
}

// ==================== ADMIN ====================

#[tokio::test]
async fn test_admin_check_auth() {
    let fixture = TestFixture::new().await;
    fixture.mount_admin_config(&["UADMIN"]).await;

    let resp = fixture
        .client()
        .get(fixture.url("/api/admin/check-auth"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let body: Value = fixture
        .client_as("UADMIN")
        .get(fixture.url("/api/admin/check-auth"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["isAdmin"], true);

    let body: Value = fixture
        .client_as("UNOBODY")
        .get(fixture.url("/api/admin/check-auth"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["isAdmin"], false);
}

#[tokio::test]
async fn test_admin_user_lookup_by_invite_id() {
    let fixture = TestFixture::new().await;
    fixture.mount_admin_config(&["UADMIN"]).await;
    fixture.seed_member("UADMIN", "Root", 0.0);

    let member_page = fixture.seed_member("U1", "Alice", 120.0);
    fixture
        .store
        .update(
            &member_page,
            Properties::from_iter([("Invite ID".to_string(), Property::text("INV-42"))]),
        )
        .await
        .unwrap();

    // Non-admin gets refused
    let resp = fixture
        .client_as("U1")
        .get(fixture.url("/api/admin/user/INV-42"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let body: Value = fixture
        .client_as("UADMIN")
        .get(fixture.url("/api/admin/user/INV-42"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["user"]["slackId"], "U1");
    assert_eq!(body["user"]["xp"], 120);
    assert_eq!(body["user"]["inviteId"], "INV-42");
}

// ==================== BOTS ====================

async fn discord_command(fixture: &TestFixture, command: &str, options: Value) -> Value {
    fixture
        .client()
        .post(fixture.url("/discord/commands"))
        .json(&json!({
            "userId": "483347547415642142",
            "command": command,
            "options": options
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn slack_command(fixture: &TestFixture, command: &str, user_id: &str, text: &str) -> Value {
    fixture
        .client()
        .post(fixture.url("/slack/commands"))
        .form(&[
            ("command", command),
            ("user_id", user_id),
            ("user_name", user_id),
            ("text", text),
        ])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_slack_experience_command() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 2500.0);

    let body = slack_command(&fixture, "/experience", "U1", "").await;
    let text = body["text"].as_str().unwrap();
    assert!(text.contains("2500 experience points"));
    assert!(text.contains("level 2"));

    // Unregistered callers get pointed at the portal
    let body = slack_command(&fixture, "/experience", "USTRANGER", "").await;
    assert!(body["text"].as_str().unwrap().contains("haven't checked into"));
}

#[tokio::test]
async fn test_slack_ping_and_help() {
    let fixture = TestFixture::new().await;

    let body = slack_command(&fixture, "/mc-ping", "U1", "").await;
    assert!(body["text"].as_str().unwrap().contains("Pong"));

    let body = slack_command(&fixture, "/mc-help", "U1", "").await;
    assert!(body["text"].as_str().unwrap().contains("/experience"));
}

#[tokio::test]
async fn test_slack_stats_command() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 0.0);
    fixture.seed_member("U2", "Bob", 0.0);

    let body = slack_command(&fixture, "/mc-stats", "U1", "").await;
    let text = body["text"].as_str().unwrap();
    assert!(text.contains("*Total Users:* 2"));
    assert!(text.contains("*Total Projects:* 0"));
    assert!(text.contains("198 to go"));
}

#[tokio::test]
async fn test_slack_admin_gating() {
    let fixture = TestFixture::new().await;
    fixture.mount_admin_config(&["UADMIN"]).await;
    fixture.seed_member("U1", "Alice", 0.0);

    let body = slack_command(&fixture, "/adm-mc-ban", "U1", "U1 Copy paste").await;
    assert!(body["text"]
        .as_str()
        .unwrap()
        .contains("not authorized"));

    let body = slack_command(&fixture, "/adm-mc-ban", "UADMIN", "U1 Copy paste").await;
    assert!(body["text"].as_str().unwrap().contains("has been banned"));
}

#[tokio::test]
async fn test_banned_member_refused_by_bot_but_not_api() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 100.0);

    // Ban through the companion admin surface
    let resp: Value = fixture
        .client()
        .post(fixture.url("/discord/commands"))
        .json(&json!({
            "userId": "483347547415642142",
            "command": "banuser",
            "options": { "user_id": "U1", "reason": "Copy paste" }
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(resp["content"].as_str().unwrap().contains("has been banned"));

    // The bot refuses the banned member
    let body = slack_command(&fixture, "/experience", "U1", "").await;
    assert!(body["text"].as_str().unwrap().contains("banned"));

    // The web API still serves them once a cookie exists
    let me: Value = fixture
        .client_as("U1")
        .get(fixture.url("/api/user/me"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["authenticated"], true);
}

#[tokio::test]
async fn test_discord_admin_project_review_flow() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("U1", "Alice", 0.0);
    let alice = fixture.client_as("U1");
    create_team(&alice, &fixture, "Owls", "Public").await;
    let created = create_project(&alice, &fixture, "Tracker").await;
    let project_id = created["project"]["id"].as_str().unwrap().to_string();

    // Submit directly in the store, as staff would
    let pages = fixture.store.query(PROJECTS_DB, None, &[]).await.unwrap();
    fixture
        .store
        .update(
            &pages[0].id,
            Properties::from_iter([("Status".to_string(), Property::select("Submitted"))]),
        )
        .await
        .unwrap();

    let pending = discord_command(&fixture, "viewpendingprojects", json!({})).await;
    assert!(pending["content"].as_str().unwrap().contains("Tracker"));

    let rejected = discord_command(
        &fixture,
        "rejectproject",
        json!({ "project_id": project_id, "reason": "Needs a demo" }),
    )
    .await;
    assert!(rejected["content"].as_str().unwrap().contains("rejected"));

    let project: Value = alice
        .get(fixture.url(&format!("/api/projects/{}", project_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(project["project"]["status"], "Rejected");
    assert_eq!(project["project"]["rejectionReason"], "Needs a demo");

    // Unauthorized caller is turned away
    let refused: Value = fixture
        .client()
        .post(fixture.url("/discord/commands"))
        .json(&json!({
            "userId": "999",
            "command": "viewpendingprojects",
            "options": {}
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(refused["content"].as_str().unwrap().contains("not authorized"));
}
