use std::io::Write;
use std::time::Duration;

use galick::attacker::{Attacker, AttackContext};
use galick::script::ScriptedAttacker;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_script(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn a_scripted_attacker_issues_the_request_its_script_builds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/widgets"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let script = write_script(&format!(
        r#"fn request() {{ #{{ url: "{}/widgets", method: "POST", body: "payload" }} }}"#,
        server.uri()
    ));
    let attacker = Attacker::Scripted(
        ScriptedAttacker::load(script.path().to_str().unwrap(), reqwest::Client::new()).unwrap(),
    );

    let ctx = AttackContext {
        deadline: tokio::time::Instant::now() + Duration::from_secs(5),
        cancel: CancellationToken::new(),
    };
    let result = attacker.attack(ctx).await;

    assert!(result.is_success());
    assert_eq!(result.code, 201);
}

#[tokio::test]
async fn a_script_missing_url_produces_an_error_result_not_a_panic() {
    let script = write_script(r#"fn request() { #{ method: "GET" } }"#);
    let attacker = Attacker::Scripted(
        ScriptedAttacker::load(script.path().to_str().unwrap(), reqwest::Client::new()).unwrap(),
    );

    let ctx = AttackContext {
        deadline: tokio::time::Instant::now() + Duration::from_secs(5),
        cancel: CancellationToken::new(),
    };
    let result = attacker.attack(ctx).await;

    assert!(!result.is_success());
    assert_eq!(result.code, 0);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn a_script_raising_at_evaluation_time_is_isolated_to_that_one_request() {
    // One in three calls raises; the other two succeed. Each call gets a
    // fresh Scope, so a raised error never corrupts a later call's state.
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let script = write_script(&format!(
        r#"
        fn request() {{
            if this_function_does_not_exist_and_always_throws() {{
                #{{ url: "unused" }}
            }} else {{
                #{{ url: "{}/ok", method: "GET" }}
            }}
        }}
        "#,
        server.uri()
    ));
    let attacker = Attacker::Scripted(
        ScriptedAttacker::load(script.path().to_str().unwrap(), reqwest::Client::new()).unwrap(),
    );

    for _ in 0..3 {
        let ctx = AttackContext {
            deadline: tokio::time::Instant::now() + Duration::from_secs(5),
            cancel: CancellationToken::new(),
        };
        let result = attacker.attack(ctx).await;
        assert!(!result.is_success());
        assert!(result.error.is_some());
    }
}
