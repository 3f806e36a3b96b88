//! Proxy fallback behavior of GitFetchEngine against a scripted git

use camino::Utf8Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use templet_core::testing::ScriptedRunner;
use templet_core::{CommandResult, RetryOutcome, Transport};
use templet_projects::git::{FetchSettings, GitFetchEngine};
use templet_projects::{Error, ProxyPolicy, SignalMode};

const SOURCE: &str = "https://github.com/a/b.git";
const PROXIED: &str = "https://ghproxy.com/https://github.com/a/b.git";

fn engine(runner: &Arc<ScriptedRunner>) -> GitFetchEngine {
    GitFetchEngine::new(
        runner.clone(),
        ProxyPolicy::default(),
        FetchSettings {
            shallow: true,
            tick_interval: Duration::from_millis(5),
            show_progress: false,
        },
    )
}

fn clone_url(runner: &ScriptedRunner, call: usize) -> String {
    let calls = runner.calls();
    calls[call].args[calls[call].args.len() - 2].clone()
}

#[tokio::test]
async fn proxied_timeout_falls_back_to_direct_once() {
    let runner = Arc::new(ScriptedRunner::new());
    runner
        .push(CommandResult::failed(
            "Cloning into 'b'...\nfatal: unable to access: Operation timeout after 30000 ms\n",
            128,
        ))
        .push(CommandResult::new(
            "",
            "Cloning into 'b'...\nReceiving objects: 100% (10/10), done.\n",
            0,
        ));

    let report = engine(&runner)
        .fetch(SOURCE, Utf8Path::new("b"))
        .await
        .unwrap();

    assert_eq!(runner.call_count(), 2);
    assert_eq!(clone_url(&runner, 0), PROXIED);
    assert_eq!(clone_url(&runner, 1), SOURCE);
    assert_eq!(
        report.outcomes,
        vec![
            RetryOutcome::failed(Transport::Proxied),
            RetryOutcome::succeeded(Transport::Direct),
        ]
    );
    assert!(report.fell_back());
}

#[tokio::test]
async fn second_failure_is_fatal() {
    let runner = Arc::new(ScriptedRunner::new());
    runner
        .push(CommandResult::failed("fatal: SSL_connect: SSL_ERROR_SYSCALL", 128))
        .push(CommandResult::failed("fatal: Connection refused", 128));

    let err = engine(&runner)
        .fetch(SOURCE, Utf8Path::new("b"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Fetch { ref url, .. } if url == SOURCE));
    assert_eq!(runner.call_count(), 2);
}

#[tokio::test]
async fn non_proxy_failure_does_not_retry() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push(CommandResult::failed(
        "fatal: destination path 'b' already exists and is not an empty directory.\n",
        128,
    ));

    let err = engine(&runner)
        .fetch(SOURCE, Utf8Path::new("b"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Fetch { .. }));
    assert_eq!(runner.call_count(), 1);
}

#[tokio::test]
async fn direct_hosts_are_never_proxied_or_retried() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push(CommandResult::failed("fatal: Connection timed out", 128));

    let err = engine(&runner)
        .fetch("https://gitlab.com/a/b.git", Utf8Path::new("b"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Fetch { .. }));
    assert_eq!(runner.call_count(), 1);
    assert_eq!(clone_url(&runner, 0), "https://gitlab.com/a/b.git");
}

#[tokio::test]
async fn disabled_proxy_clones_directly() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push(CommandResult::ok(""));

    let engine = GitFetchEngine::new(
        runner.clone(),
        ProxyPolicy::default().disabled(),
        FetchSettings {
            show_progress: false,
            ..Default::default()
        },
    );
    let report = engine.fetch(SOURCE, Utf8Path::new("b")).await.unwrap();

    assert_eq!(report.transport(), Some(Transport::Direct));
    assert_eq!(clone_url(&runner, 0), SOURCE);
}

#[tokio::test]
async fn spawn_failure_through_proxy_is_classified() {
    let runner = Arc::new(ScriptedRunner::new());
    runner
        .push_spawn_failure("connection reset while starting git")
        .push(CommandResult::ok(""));

    let report = engine(&runner)
        .fetch(SOURCE, Utf8Path::new("b"))
        .await
        .unwrap();

    assert_eq!(report.attempts(), 2);
}

#[tokio::test]
async fn fallback_notice_is_reported() {
    let runner = Arc::new(ScriptedRunner::new());
    runner
        .push(CommandResult::failed("fatal: proxy returned 502", 128))
        .push(CommandResult::ok(""));

    let notices = Arc::new(Mutex::new(Vec::new()));
    let sink = notices.clone();
    let engine = engine(&runner).with_fallback_notice(Arc::new(move |msg: &str| {
        sink.lock().unwrap().push(msg.to_string());
    }));

    engine.fetch(SOURCE, Utf8Path::new("b")).await.unwrap();
    assert_eq!(notices.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn checkout_ref_clones_shallow_branch() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push(CommandResult::ok(""));

    engine(&runner)
        .fetch_ref(SOURCE, Utf8Path::new("b"), "master")
        .await
        .unwrap();

    let args = runner.calls()[0].args.clone();
    assert_eq!(
        args,
        vec!["clone", "--progress", "--depth", "1", "--branch", "master", PROXIED, "b"]
    );
}

#[tokio::test]
async fn destination_name_never_triggers_fallback() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push(CommandResult::failed(
        "Cloning into 'rustls'...\nfatal: Remote branch v9 not found in upstream origin\n",
        128,
    ));

    let err = engine(&runner)
        .fetch_ref(
            "https://github.com/rustls/rustls.git",
            Utf8Path::new("rustls"),
            "v9",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Fetch { .. }));
    assert_eq!(runner.call_count(), 1);
}

#[tokio::test]
async fn existing_proxy_named_destination_is_fatal() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push(CommandResult::failed(
        "fatal: destination path 'my-proxy' already exists and is not an empty directory.\n",
        128,
    ));

    let err = engine(&runner)
        .fetch(SOURCE, Utf8Path::new("my-proxy"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Fetch { .. }));
    assert_eq!(runner.call_count(), 1);
}

#[tokio::test]
async fn git_progress_lines_drive_the_tracker() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push(CommandResult::new(
        "",
        "Cloning into 'b'...\r\
         Receiving objects:  40% (4/10)\r\
         Receiving objects: 100% (10/10), 1.2 MiB | 2.0 MiB/s, done.\n\
         Resolving deltas:  50% (2/4)\r\
         Resolving deltas: 100% (4/4), done.\n",
        0,
    ));

    let report = engine(&runner)
        .fetch(SOURCE, Utf8Path::new("b"))
        .await
        .unwrap();

    assert_eq!(report.progress.mode(), SignalMode::Real);
    assert_eq!(report.progress.real_samples(), 4);
    assert!(report.progress.is_finished());
    assert_eq!(report.progress.displayed(), 1.0);
}

#[tokio::test]
async fn fetch_without_git_progress_stays_simulated() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push(CommandResult::new("", "Cloning into 'b'...\n", 0));

    let report = engine(&runner)
        .fetch(SOURCE, Utf8Path::new("b"))
        .await
        .unwrap();

    assert_eq!(report.progress.mode(), SignalMode::Simulated);
    assert_eq!(report.progress.real_samples(), 0);
    assert_eq!(report.progress.displayed(), 1.0);
}
