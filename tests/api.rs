mod common;

use std::time::Duration;

use common::{FixtureServer, Reply, closed_url, roblox_fixture};
use roblox_avail::bulk::{Orchestrator, Pause};
use roblox_avail::check::{
    Checker, Client, ClientConfig, Existence, LookupError, Outcome, User, Validity,
    check_username,
};
use roblox_avail::config::RunConfig;

const ACCOUNTS: &[(&str, u64, &str)] = &[("existinguser", 123, "ExistingUser")];
const REJECTIONS: &[(&str, &str)] = &[("ab", "Username is too short")];

fn client_for(server: &FixtureServer) -> Client {
    Client::with_config(ClientConfig {
        lookup_url: server.lookup_url(),
        validate_url: server.validate_url(),
        timeout: Duration::from_secs(5),
        ..ClientConfig::default()
    })
}

struct NoPause;

impl Pause for NoPause {
    fn pause(&mut self, _: Duration) {}
}

#[test]
fn existing_user_is_taken_and_never_validated() {
    let server = roblox_fixture(ACCOUNTS, REJECTIONS);
    let client = client_for(&server);

    assert_eq!(
        check_username(&client, "existinguser"),
        Outcome::Taken(User {
            id: 123,
            name: "ExistingUser".to_string()
        })
    );

    let calls = server.calls();
    assert_eq!(calls.len(), 1, "{calls:?}");
    assert!(calls[0].is_lookup());
    assert_eq!(calls[0].username(), "existinguser");
}

#[test]
fn short_name_is_invalid_with_service_message() {
    let server = roblox_fixture(ACCOUNTS, REJECTIONS);
    let client = client_for(&server);

    assert_eq!(
        check_username(&client, "ab"),
        Outcome::Invalid("Username is too short".to_string())
    );
}

#[test]
fn fresh_name_is_available_and_sends_placeholder_birthday() {
    let server = roblox_fixture(ACCOUNTS, REJECTIONS);
    let client = client_for(&server);

    assert_eq!(check_username(&client, "freshname42"), Outcome::Available);

    let post = server
        .calls()
        .into_iter()
        .find(|c| c.is_validate())
        .expect("validation request");
    let body: serde_json::Value = serde_json::from_str(&post.body).expect("json body");
    assert_eq!(body["username"], "freshname42");
    assert_eq!(body["birthday"], "1990-01-01T00:00:00.000Z");
}

#[test]
fn taken_classification_is_repeatable() {
    let server = roblox_fixture(ACCOUNTS, REJECTIONS);
    let client = client_for(&server);

    for _ in 0..2 {
        assert!(matches!(
            client.check_exists("existinguser"),
            Existence::Exists(_)
        ));
    }
}

#[test]
fn lookup_error_status_reads_as_not_found() {
    let server = FixtureServer::start(|call| {
        if call.is_lookup() {
            Reply::Json(404, "{}".to_string())
        } else {
            Reply::ok(serde_json::json!({ "code": 0 }))
        }
    });
    let client = client_for(&server);

    assert_eq!(client.check_exists("anyone"), Existence::NotFound);
    assert_eq!(check_username(&client, "anyone"), Outcome::Available);
}

#[test]
fn validation_error_status_is_reported() {
    let server = FixtureServer::start(|call| {
        if call.is_lookup() {
            Reply::ok(serde_json::json!({}))
        } else {
            Reply::Json(500, "{}".to_string())
        }
    });
    let client = client_for(&server);

    assert_eq!(
        client.check_validity("x"),
        Validity::Invalid("API error: 500".to_string())
    );
}

#[test]
fn validation_timeout_is_invalid_not_a_crash() {
    let server = FixtureServer::start(|call| {
        if call.is_lookup() {
            Reply::ok(serde_json::json!({}))
        } else {
            Reply::Stall(Duration::from_secs(3))
        }
    });
    let client = Client::with_config(ClientConfig {
        lookup_url: server.lookup_url(),
        validate_url: server.validate_url(),
        timeout: Duration::from_millis(300),
        ..ClientConfig::default()
    });

    assert!(matches!(
        client.validate_username("x"),
        Err(LookupError::Timeout)
    ));
    match check_username(&client, "x") {
        Outcome::Invalid(reason) => assert!(reason.contains("timeout"), "{reason}"),
        other => panic!("expected Invalid, got {other:?}"),
    }
}

#[test]
fn unreachable_service_fails_open_to_not_found() {
    let client = Client::with_config(ClientConfig {
        lookup_url: closed_url(),
        validate_url: closed_url(),
        timeout: Duration::from_secs(2),
        ..ClientConfig::default()
    });

    assert_eq!(client.check_exists("x"), Existence::NotFound);
    match client.check_validity("x") {
        Validity::Invalid(reason) => assert!(reason.starts_with("network error"), "{reason}"),
        other => panic!("expected Invalid, got {other:?}"),
    }
}

#[test]
fn malformed_bodies_are_handled() {
    let server = FixtureServer::start(|_| Reply::Json(200, "<html>maintenance</html>".into()));
    let client = client_for(&server);

    assert!(matches!(
        client.lookup_user("x"),
        Err(LookupError::Malformed(_))
    ));
    assert_eq!(client.check_exists("x"), Existence::NotFound);
    match client.check_validity("x") {
        Validity::Invalid(reason) => {
            assert!(reason.starts_with("unexpected response"), "{reason}")
        }
        other => panic!("expected Invalid, got {other:?}"),
    }
}

#[test]
fn bulk_run_issues_one_lookup_per_name() {
    let server = roblox_fixture(ACCOUNTS, REJECTIONS);
    let client = client_for(&server);
    let names: Vec<String> = ["existinguser", "ab", "freshname42"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut out = Vec::new();
    let report = Orchestrator::new(&client, RunConfig::default())
        .with_pause(NoPause)
        .run(&names, &mut out)
        .expect("progress to vec");

    let results = report.results;
    assert_eq!(results.available, vec!["freshname42".to_string()]);
    assert_eq!(results.taken.len(), 1);
    assert_eq!(results.taken[0].user.id, 123);
    assert_eq!(results.invalid.len(), 1);
    assert_eq!(results.invalid[0].reason, "Username is too short");

    let calls = server.calls();
    let lookups: Vec<String> = calls
        .iter()
        .filter(|c| c.is_lookup())
        .map(|c| c.username())
        .collect();
    let validations: Vec<String> = calls
        .iter()
        .filter(|c| c.is_validate())
        .map(|c| c.username())
        .collect();
    assert_eq!(lookups, names);
    assert_eq!(validations, vec!["ab".to_string(), "freshname42".to_string()]);
}
