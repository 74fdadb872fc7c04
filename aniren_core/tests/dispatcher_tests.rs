//! Dispatcher behaviour against a scripted localhost server

use aniren_core::protocol::ProtocolError;
use aniren_core::{
    Credentials, Dispatcher, FieldMask, NetworkConfig, ProgressUpdate, SharedProvider, Shutdown,
    TemplateSet, WorkItem,
};
use aniren_test_utils::{MockAniDBServer, RecordingProvider, fake_hash, file_reply};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

fn credentials() -> Credentials {
    Credentials::new("tester", "s3cr3tpass").unwrap()
}

fn item(n: u32) -> WorkItem {
    WorkItem {
        path: PathBuf::from(format!("/media/{n}.mkv")),
        size: 1000 + u64::from(n),
        ed2k: fake_hash(n),
    }
}

async fn connect(
    server: &MockAniDBServer,
    network: NetworkConfig,
) -> (Dispatcher, Shutdown, Arc<RecordingProvider>) {
    let shutdown = Shutdown::new();
    let recorder = Arc::new(RecordingProvider::new());
    let network = NetworkConfig {
        server: server.addr().to_string(),
        ..network
    };
    let dispatcher = Dispatcher::connect(
        &network,
        shutdown.clone(),
        SharedProvider::new(recorder.clone()),
    )
    .await
    .unwrap();
    (dispatcher, shutdown, recorder)
}

#[tokio::test]
async fn test_authenticate_stores_session() {
    let server = MockAniDBServer::start().await;
    let (mut dispatcher, shutdown, recorder) = connect(&server, NetworkConfig::local("")).await;

    let token = dispatcher.authenticate(&credentials()).await.unwrap();
    assert_eq!(token, "iQUO2");
    assert_eq!(dispatcher.session(), Some("iQUO2"));
    assert!(!shutdown.is_aborted());

    // the server sees the real credentials, reports only the masked form
    let auth = &server.commands_named("AUTH")[0];
    assert_eq!(auth.param("user"), Some("tester"));
    assert_eq!(auth.param("pass"), Some("s3cr3tpass"));
    assert_eq!(auth.param("protover"), Some("3"));
    assert_eq!(auth.param("client"), Some("aniren"));
    assert_eq!(auth.param("nat"), Some("1"));
    assert_eq!(auth.param("enc"), Some("utf-8"));

    let reported = recorder.requests();
    assert!(reported[0].starts_with("AUTH user=******&pass=******&"));
    assert!(reported.iter().all(|r| !r.contains("s3cr3tpass")));
}

#[tokio::test]
async fn test_rejected_login_aborts() {
    let server = MockAniDBServer::builder()
        .auth_reply("500 LOGIN FAILED")
        .start()
        .await;
    let (mut dispatcher, shutdown, _) = connect(&server, NetworkConfig::local("")).await;

    let err = dispatcher.authenticate(&credentials()).await.unwrap_err();
    assert_eq!(err.server_code(), Some(500));
    assert!(shutdown.is_aborted());
    assert_eq!(dispatcher.session(), None);
}

#[tokio::test]
async fn test_malformed_session_key_aborts() {
    let server = MockAniDBServer::builder()
        .auth_reply("200 x LOGIN ACCEPTED")
        .start()
        .await;
    let (mut dispatcher, shutdown, _) = connect(&server, NetworkConfig::local("")).await;

    let err = dispatcher.authenticate(&credentials()).await.unwrap_err();
    assert!(matches!(err, ProtocolError::AuthenticationFailed { .. }));
    assert!(shutdown.is_aborted());
}

#[tokio::test]
async fn test_lookup_requires_session() {
    let server = MockAniDBServer::start().await;
    let (mut dispatcher, shutdown, _) = connect(&server, NetworkConfig::local("")).await;
    let mask = FieldMask::from_templates(&TemplateSet::default());

    let err = dispatcher.lookup_file(&item(1), &mask).await.unwrap_err();
    assert!(matches!(err, ProtocolError::NotAuthenticated));
    assert!(shutdown.is_aborted());
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_lookup_decodes_requested_fields() {
    let mask = FieldMask::from_templates(&TemplateSet::new("%epno [%crc32]"));
    assert_eq!(mask.fields(), &["fid", "crc32", "anime_type", "epno"]);

    let server = MockAniDBServer::builder()
        .file(&fake_hash(1), &file_reply(&["42", "ABCD1234", "TV", "05"]))
        .start()
        .await;
    let (mut dispatcher, _, _) = connect(&server, NetworkConfig::local("")).await;
    dispatcher.authenticate(&credentials()).await.unwrap();

    let record = dispatcher.lookup_file(&item(1), &mask).await.unwrap();
    assert_eq!(record.fid(), Some("42"));
    assert_eq!(record.get("crc32"), Some("ABCD1234"));
    assert_eq!(record.category(), Some("TV"));
    assert_eq!(record.get("epno"), Some("05"));

    let file = &server.commands_named("FILE")[0];
    assert_eq!(file.param("size"), Some("1001"));
    assert_eq!(file.param("ed2k"), Some(fake_hash(1).as_str()));
    assert_eq!(file.param("fmask"), Some(mask.fmask()));
    assert_eq!(file.param("amask"), Some(mask.amask()));
    assert_eq!(file.param("s"), Some("iQUO2"));
}

#[tokio::test]
async fn test_rate_limited_requests_are_spaced() {
    let network = NetworkConfig::local("");
    let delay = network.request_delay();
    let server = MockAniDBServer::builder()
        .file(&fake_hash(1), &file_reply(&["1", "TV"]))
        .file(&fake_hash(2), &file_reply(&["2", "TV"]))
        .file(&fake_hash(3), &file_reply(&["3", "TV"]))
        .start()
        .await;
    let (mut dispatcher, _, recorder) = connect(&server, network).await;
    let mask = FieldMask::from_templates(&TemplateSet::new(""));

    dispatcher.authenticate(&credentials()).await.unwrap();
    for n in 1..=3 {
        dispatcher.lookup_file(&item(n), &mask).await.unwrap();
    }

    let requests = server.requests();
    assert_eq!(server.command_names(), vec!["AUTH", "FILE", "FILE", "FILE"]);
    for pair in requests.windows(2) {
        let gap = pair[1].at.duration_since(pair[0].at);
        assert!(gap >= delay, "requests only {gap:?} apart");
    }

    let waits = recorder
        .updates()
        .into_iter()
        .filter(|u| matches!(u, ProgressUpdate::Waiting { .. }))
        .count();
    assert_eq!(waits, 3);
}

#[tokio::test]
async fn test_ping_skips_the_delay() {
    let network = NetworkConfig {
        request_delay_ms: 2_000,
        ..NetworkConfig::local("")
    };
    let server = MockAniDBServer::start().await;
    let (mut dispatcher, _, _) = connect(&server, network).await;

    dispatcher.authenticate(&credentials()).await.unwrap();
    dispatcher.ping().await.unwrap();

    let requests = server.requests();
    let gap = requests[1].at.duration_since(requests[0].at);
    assert!(gap < Duration::from_secs(1), "PING waited {gap:?}");
    assert!(dispatcher.idle_for() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_logout_skips_the_delay() {
    let network = NetworkConfig {
        request_delay_ms: 2_000,
        ..NetworkConfig::local("")
    };
    let server = MockAniDBServer::start().await;
    let (mut dispatcher, _, recorder) = connect(&server, network).await;

    dispatcher.authenticate(&credentials()).await.unwrap();
    dispatcher.close().await;

    let requests = server.requests();
    assert_eq!(server.command_names(), vec!["AUTH", "LOGOUT"]);
    let gap = requests[1].at.duration_since(requests[0].at);
    assert!(gap < Duration::from_secs(1), "LOGOUT waited {gap:?}");
    assert!(
        !recorder
            .updates()
            .iter()
            .any(|u| matches!(u, ProgressUpdate::Waiting { .. }))
    );
}

#[tokio::test]
async fn test_fatal_status_aborts() {
    let server = MockAniDBServer::start().await;
    let (mut dispatcher, shutdown, _) = connect(&server, NetworkConfig::local("")).await;
    let mask = FieldMask::from_templates(&TemplateSet::default());

    dispatcher.authenticate(&credentials()).await.unwrap();
    let err = dispatcher.lookup_file(&item(9), &mask).await.unwrap_err();

    assert_eq!(err.server_code(), Some(320));
    assert!(shutdown.is_aborted());
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let network = NetworkConfig {
        response_timeout_secs: 1,
        ..NetworkConfig::local("")
    };
    let server = MockAniDBServer::builder().silent_on("PING").start().await;
    let (mut dispatcher, shutdown, _) = connect(&server, network).await;

    let err = dispatcher.ping().await.unwrap_err();
    assert!(matches!(err, ProtocolError::Timeout(_)));
    assert!(shutdown.is_aborted());
}

#[tokio::test]
async fn test_close_logs_out() {
    let server = MockAniDBServer::start().await;
    let (mut dispatcher, _, _) = connect(&server, NetworkConfig::local("")).await;

    dispatcher.authenticate(&credentials()).await.unwrap();
    dispatcher.close().await;

    let logout = server.commands_named("LOGOUT");
    assert_eq!(logout.len(), 1);
    assert_eq!(logout[0].param("s"), Some("iQUO2"));
}

#[tokio::test]
async fn test_close_without_session_sends_nothing() {
    let server = MockAniDBServer::start().await;
    let (dispatcher, _, _) = connect(&server, NetworkConfig::local("")).await;

    dispatcher.close().await;
    assert!(server.requests().is_empty());
}
