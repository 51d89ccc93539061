//! End-to-end command dispatch against a mock clan backend.
//!
//! Each test starts an axum server on an ephemeral port that plays both the
//! clan backend and the Wise Old Man API, routes chat messages through a
//! real [`Dispatcher`], and inspects what the recording surface received and
//! what the backend was sent.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

use clanbot::channels::recording::RecordingChannel;
use clanbot::commands::{CommandRegistry, DispatchOutcome, Dispatcher, Services};
use clanbot::config::BotConfig;
use clanbot::messages::{strip_fence, CODE_BLOCK_FENCE, DISCORD_MESSAGE_LIMIT};
use clanbot::roster::RosterMember;

#[derive(Debug, Clone)]
struct RecordedCall {
    method: Method,
    path: String,
    user_id: Option<String>,
    server_id: Option<String>,
    authorization: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct MockBackend {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockBackend {
    fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn handle(
    State(mock): State<MockBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let path = uri.path().to_string();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    mock.calls.lock().push(RecordedCall {
        method: method.clone(),
        path: path.clone(),
        user_id: header(&headers, "userdiscordid"),
        server_id: header(&headers, "discordserverid"),
        authorization: header(&headers, "authorization"),
        body: body.clone(),
    });

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    match (method.as_str(), segments.as_slice()) {
        ("POST", ["api", "donations", "add", "donation"]) => {
            (StatusCode::OK, Json(json!({"name": body["username"], "total": "1,010"})))
        }
        ("POST", ["api", "donations", "add", "type"]) => {
            (StatusCode::OK, Json(json!({"name": body["name"]})))
        }
        ("DELETE", ["api", "donations", "remove", "type"]) => {
            (StatusCode::OK, Json(json!({"name": body["name"]})))
        }
        ("POST", ["api", "donations", "list"]) => match body["type"].as_str() {
            Some("all") => (
                StatusCode::OK,
                Json(json!({
                    "grandTotal": "3,000",
                    "donationTypes": [{"name": "Bonds", "formattedAmount": "3,000"}]
                })),
            ),
            _ => (
                StatusCode::OK,
                Json(json!({"name": body["lookupId"], "total": 42})),
            ),
        },
        ("POST", ["api", "donations", "list", "topDonators"]) => match body["name"].as_str() {
            Some("Bonds") => (
                StatusCode::OK,
                Json(json!([
                    {"name": "Zezima", "total": "2,000"},
                    {"name": "Woox", "total": 1500}
                ])),
            ),
            _ => (
                StatusCode::NOT_FOUND,
                Json(json!({"message": "clan not found"})),
            ),
        },
        ("GET", ["api", "clan", "chatlog", count]) => {
            let count: usize = count.parse().unwrap_or(0);
            let entries: Vec<Value> = (0..count)
                .map(|i| {
                    json!({
                        "time_sent": format!("12:{i:02}"),
                        "sender": format!("Player{i}"),
                        "message": "x".repeat(900),
                    })
                })
                .collect();
            (StatusCode::OK, Json(Value::Array(entries)))
        }
        ("GET", ["api", "player", "inactive", _days]) => (
            StatusCode::OK,
            Json(json!([
                {"username": "Woox", "last_active": "01-02-2024"},
                {"username": "Zezima", "last_active": "12-25-2023"}
            ])),
        ),
        ("POST", ["api", "clan", "signup"]) => (
            StatusCode::OK,
            Json(json!({"link": "https://clan.example/export/abc"})),
        ),
        ("GET", ["api", "clan", "wom", "sync", _guild]) => {
            (StatusCode::OK, Json(json!({"synced": true})))
        }
        ("GET", ["groups", "404", "members"]) => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Group not found."})),
        ),
        ("GET", ["groups", _id, "members"]) => (
            StatusCode::OK,
            Json(json!([
                {"username": "Zezima"},
                {"username": "B0aty"},
                {"username": "woox"}
            ])),
        ),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": format!("no route for {path}")})),
        ),
    }
}

struct Harness {
    dispatcher: Dispatcher,
    mock: MockBackend,
}

async fn start_harness() -> Harness {
    let mock = MockBackend::default();
    let app = Router::new().fallback(handle).with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let base_url = format!("http://{addr}");
    let mut config = BotConfig::default();
    config.api.base_url = base_url.clone();
    config.api.token = "backend-secret".to_string();
    config.wise_old_man.base_url = base_url;

    let services = Services::from_config(&config).unwrap();
    let dispatcher = Dispatcher::new(
        Arc::new(CommandRegistry::with_builtin_commands()),
        Arc::new(services),
    );
    Harness { dispatcher, mock }
}

async fn send(harness: &Harness, surface: &Arc<RecordingChannel>, content: &str) -> DispatchOutcome {
    harness
        .dispatcher
        .handle_message(surface.clone(), "guild-1", "chan-1", "user-1", content)
        .await
}

// ---------------------------------------------------------------------------
// Donations
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_donation_add_makes_one_call_and_confirms() {
    let harness = start_harness().await;
    let surface = Arc::new(RecordingChannel::new());

    let outcome = send(&harness, &surface, "??donations add, Bonds, Zezima, 10").await;
    assert_eq!(outcome, DispatchOutcome::Completed("donations".to_string()));

    let calls = harness.mock.calls();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.method, Method::POST);
    assert_eq!(call.path, "/api/donations/add/donation");
    assert_eq!(
        call.body,
        json!({"donationType": "Bonds", "username": "Zezima", "amount": "10"})
    );
    assert_eq!(call.user_id.as_deref(), Some("user-1"));
    assert_eq!(call.server_id.as_deref(), Some("guild-1"));
    assert_eq!(call.authorization.as_deref(), Some("Bearer backend-secret"));

    let sent = surface.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].channel_id, "chan-1");
    let embed = sent[0].content.as_embed().expect("confirmation embed");
    assert_eq!(embed.title.as_deref(), Some("Successfully added 10 to Zezima"));
    assert_eq!(embed.fields[0].name, "Total donated");
    assert_eq!(embed.fields[0].value, "1,010");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_donation_add_missing_fields_makes_no_call() {
    let harness = start_harness().await;
    let surface = Arc::new(RecordingChannel::new());

    send(&harness, &surface, "??donations add, Bonds").await;

    assert!(harness.mock.calls().is_empty());
    assert_eq!(
        surface.texts(),
        vec!["Username was not provided", "Amount was not provided"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_donation_list_all_body_and_render() {
    let harness = start_harness().await;
    let surface = Arc::new(RecordingChannel::new());

    send(&harness, &surface, "??donations list, all").await;

    let calls = harness.mock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].body, json!({"type": "all"}));

    let sent = surface.sent();
    let embed = sent[0].content.as_embed().unwrap();
    assert_eq!(embed.title.as_deref(), Some("Total donated"));
    assert_eq!(embed.fields[0].name, "Grand Total Donated");
    assert_eq!(embed.fields[1].name, "Bonds");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_donation_list_user() {
    let harness = start_harness().await;
    let surface = Arc::new(RecordingChannel::new());

    send(&harness, &surface, "??donations list, user, Zezima").await;

    assert_eq!(
        harness.mock.calls()[0].body,
        json!({"type": "user", "lookupId": "Zezima"})
    );
    let sent = surface.sent();
    let embed = sent[0].content.as_embed().unwrap();
    assert_eq!(embed.fields[0].name, "Grand Total Donated For Zezima");
    assert_eq!(embed.fields[0].value, "42");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_donation_list_type() {
    let harness = start_harness().await;
    let surface = Arc::new(RecordingChannel::new());

    send(&harness, &surface, "??donations list, type, Bonds").await;

    let calls = harness.mock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "/api/donations/list");
    assert_eq!(
        calls[0].body,
        json!({"type": "donationType", "lookupId": "Bonds"})
    );
    let sent = surface.sent();
    let embed = sent[0].content.as_embed().unwrap();
    assert_eq!(embed.title.as_deref(), Some("Total donated"));
    assert_eq!(embed.fields[0].name, "Grand Total Donated For Bonds");
    assert_eq!(embed.fields[0].value, "42");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_donation_list_top() {
    let harness = start_harness().await;
    let surface = Arc::new(RecordingChannel::new());

    let outcome = send(&harness, &surface, "??donations list, top, Bonds").await;

    assert!(matches!(outcome, DispatchOutcome::Completed(_)));
    let calls = harness.mock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "/api/donations/list/topDonators");
    assert_eq!(calls[0].body, json!({"name": "Bonds"}));

    let sent = surface.sent();
    let embed = sent[0].content.as_embed().unwrap();
    assert_eq!(embed.title.as_deref(), Some("Bonds current donation rankings!"));
    let fields: Vec<(&str, &str)> = embed
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.value.as_str()))
        .collect();
    assert_eq!(fields, vec![("1. Zezima", "2,000"), ("2. Woox", "1500")]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_donation_type_add_and_remove() {
    let harness = start_harness().await;
    let surface = Arc::new(RecordingChannel::new());

    send(&harness, &surface, "??donations add, type, Bonds").await;
    send(&harness, &surface, "??donations remove, type, Bonds").await;

    let calls = harness.mock.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].path, "/api/donations/add/type");
    assert_eq!(calls[1].method, Method::DELETE);
    assert_eq!(calls[1].body, json!({"name": "Bonds"}));

    let titles: Vec<_> = surface
        .sent()
        .iter()
        .map(|m| m.content.as_embed().unwrap().title.clone().unwrap())
        .collect();
    assert_eq!(
        titles,
        vec![
            "Bonds successfully added as a donation type!",
            "Bonds successfully removed from donation type list!"
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_backend_rejection_shown_verbatim() {
    let harness = start_harness().await;
    let surface = Arc::new(RecordingChannel::new());

    let outcome = send(&harness, &surface, "??donations list, top, Missing").await;

    assert!(matches!(outcome, DispatchOutcome::Failed(_, _)));
    assert_eq!(surface.texts(), vec!["clan not found"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unknown_verb_shows_help_without_calls() {
    let harness = start_harness().await;
    let surface = Arc::new(RecordingChannel::new());

    send(&harness, &surface, "??donations frobnicate").await;

    assert!(harness.mock.calls().is_empty());
    assert_eq!(surface.len(), 1);
    assert!(surface.sent()[0].content.as_embed().is_some());
}

// ---------------------------------------------------------------------------
// Signup and sync
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_signup_missing_leader_makes_no_call() {
    let harness = start_harness().await;
    let surface = Arc::new(RecordingChannel::new());

    send(&harness, &surface, "??signup Iron Foundry").await;

    assert!(harness.mock.calls().is_empty());
    assert_eq!(surface.texts(), vec!["Runescape username was not provided"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_signup_success() {
    let harness = start_harness().await;
    let surface = Arc::new(RecordingChannel::new());

    send(&harness, &surface, "??signup Iron Foundry, Zezima").await;

    let calls = harness.mock.calls();
    assert_eq!(
        calls[0].body,
        json!({
            "name": "Iron Foundry",
            "discordId": "guild-1",
            "discordIdOfCreator": "user-1",
            "runescapeUserName": "Zezima"
        })
    );
    let sent = surface.sent();
    let embed = sent[0].content.as_embed().unwrap();
    assert_eq!(
        embed.title.as_deref(),
        Some("Successfully signed up the clan Iron Foundry")
    );
    assert_eq!(
        embed.description.as_deref(),
        Some("Link to set in Clanmate Export Plugin: https://clan.example/export/abc")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_womsync_runs_without_args() {
    let harness = start_harness().await;
    let surface = Arc::new(RecordingChannel::new());

    send(&harness, &surface, "??womsync").await;

    let calls = harness.mock.calls();
    assert_eq!(calls[0].path, "/api/clan/wom/sync/guild-1");
    let sent = surface.sent();
    assert_eq!(
        sent[0].content.as_embed().unwrap().title.as_deref(),
        Some("Successfully Synced Wise Old Man!")
    );
}

// ---------------------------------------------------------------------------
// Paginated listings
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_chatlog_paginates_in_code_blocks() {
    let harness = start_harness().await;
    let surface = Arc::new(RecordingChannel::new());

    send(&harness, &surface, "??chatlog list, 3").await;

    assert_eq!(harness.mock.calls()[0].path, "/api/clan/chatlog/3");
    let texts = surface.texts();
    assert_eq!(texts.len(), 2);
    for chunk in &texts {
        assert!(chunk.chars().count() <= DISCORD_MESSAGE_LIMIT);
        assert!(chunk.starts_with(CODE_BLOCK_FENCE) && chunk.ends_with(CODE_BLOCK_FENCE));
    }
    let transcript: String = texts
        .iter()
        .map(|c| strip_fence(c, CODE_BLOCK_FENCE))
        .collect();
    // oldest first
    assert!(transcript.starts_with("12:02 Player2: "));
    assert!(transcript.ends_with(" \n"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_chatlog_rejects_non_numeric_count() {
    let harness = start_harness().await;
    let surface = Arc::new(RecordingChannel::new());

    send(&harness, &surface, "??chatlog list, lots").await;

    assert!(harness.mock.calls().is_empty());
    assert_eq!(surface.texts(), vec!["Message count must be a whole number"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_clan_inactive_report() {
    let harness = start_harness().await;
    let surface = Arc::new(RecordingChannel::new());

    send(&harness, &surface, "??clan inactive, 30").await;

    let texts = surface.texts();
    assert_eq!(texts.len(), 1);
    assert_eq!(
        strip_fence(&texts[0], CODE_BLOCK_FENCE),
        "Players who have not been on for 30 days \nDate format is mm-dd-yyyy \n \n\
         Zezima: 12-25-2023 \nWoox: 01-02-2024 \n"
    );
}

// ---------------------------------------------------------------------------
// Roster diff
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_notondiscord_lists_missing_members() {
    let harness = start_harness().await;
    let surface = Arc::new(RecordingChannel::new().with_members(vec![
        RosterMember::new("1", "zezima_acct").with_nickname("ZEZIMA"),
        RosterMember::new("2", "Woox"),
        RosterMember::new("3", "B0aty").as_bot(),
    ]));

    send(&harness, &surface, "??notondiscord 139").await;

    assert_eq!(harness.mock.calls()[0].path, "/groups/139/members");
    assert_eq!(surface.texts(), vec!["B0aty"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_notondiscord_everyone_present() {
    let harness = start_harness().await;
    let surface = Arc::new(RecordingChannel::new().with_members(vec![
        RosterMember::new("1", "Zezima"),
        RosterMember::new("2", "B0aty"),
        RosterMember::new("3", "Woox"),
    ]));

    send(&harness, &surface, "??notondiscord 139").await;

    assert_eq!(
        surface.texts(),
        vec!["Everyone in the Wise Old Man group is on Discord!"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_notondiscord_wise_old_man_failure() {
    let harness = start_harness().await;
    let surface = Arc::new(RecordingChannel::new());

    send(&harness, &surface, "??notondiscord 404").await;

    assert_eq!(
        surface.texts(),
        vec![
            "There was an error with calling Wise old man. Maybe check group id.",
            "Group not found."
        ]
    );
}
