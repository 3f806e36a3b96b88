//! Resolve-then-terminate flows against scripted OS commands

use std::sync::Arc;
use templet_core::testing::ScriptedRunner;
use templet_core::{CommandResult, ProcessRecord};
use templet_ports::{Error, PortProcessResolver, PosixDialect, ProcessTerminator, WindowsDialect};

#[tokio::test]
async fn posix_duplicate_sockets_collapse_to_one_record() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push(CommandResult::ok(
        "COMMAND PID USER FD TYPE DEVICE SIZE/OFF NODE NAME\n\
         node 100 dev 20u IPv4 0x1 0t0 TCP *:3000 (LISTEN)\n\
         node 100 dev 21u IPv6 0x2 0t0 TCP *:3000 (LISTEN)\n\
         ruby 200 dev 9u IPv4 0x3 0t0 TCP *:3000 (LISTEN)\n",
    ));

    let mut records = PortProcessResolver::new(runner.clone(), Arc::new(PosixDialect))
        .resolve_by_port("3000")
        .await
        .unwrap();
    records.sort_by(|a, b| a.process_id.cmp(&b.process_id));

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].process_id, "100");
    assert_eq!(records[1].process_id, "200");
    assert_eq!(runner.calls()[0].to_string(), "lsof -i :3000 -P -n");
}

#[tokio::test]
async fn windows_only_returns_the_requested_port() {
    let runner = Arc::new(ScriptedRunner::new());
    runner
        .push(CommandResult::ok(
            "Active Connections\n\n  Proto  Local Address  Foreign Address  State  PID\n\
             \x20 TCP    0.0.0.0:3000   0.0.0.0:0   LISTENING   1111\n\
             \x20 TCP    0.0.0.0:8080   0.0.0.0:0   LISTENING   2222\n",
        ))
        .push(CommandResult::ok(
            "INFO: No tasks are running which match the specified criteria.\n",
        ));

    let records = PortProcessResolver::new(runner.clone(), Arc::new(WindowsDialect))
        .resolve_by_port("8080")
        .await
        .unwrap();

    assert_eq!(records, vec![ProcessRecord::new("PID-2222", "2222")]);
}

#[tokio::test]
async fn first_kill_failure_stops_the_batch() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push(CommandResult::failed(
        "kill: (1) - Operation not permitted",
        1,
    ));

    let records = vec![ProcessRecord::new("a", "1"), ProcessRecord::new("b", "2")];
    let err = ProcessTerminator::new(runner.clone(), Arc::new(PosixDialect))
        .terminate(&records, "8080")
        .await
        .unwrap_err();

    assert_eq!(err.failed_pid(), Some("1"));
    assert!(matches!(err, Error::Kill { ref message, .. } if message.contains("not permitted")));
    assert_eq!(runner.call_count(), 1);
    assert!(runner.calls().iter().all(|c| !c.args.contains(&"2".to_string())));
}

#[tokio::test]
async fn empty_batch_runs_no_command() {
    let runner = Arc::new(ScriptedRunner::new());

    let report = ProcessTerminator::new(runner.clone(), Arc::new(PosixDialect))
        .terminate(&[], "8080")
        .await
        .unwrap();

    assert!(report.is_empty());
    assert_eq!(runner.call_count(), 0);
}

#[tokio::test]
async fn resolved_records_are_terminated_in_order() {
    let runner = Arc::new(ScriptedRunner::new());
    runner
        .push(CommandResult::ok(
            "COMMAND PID USER\nnode 10 dev\nnode 11 dev\n",
        ))
        .push(CommandResult::ok(""))
        .push(CommandResult::ok(""));

    let records = PortProcessResolver::new(runner.clone(), Arc::new(PosixDialect))
        .resolve_by_port("5173")
        .await
        .unwrap();
    let report = ProcessTerminator::new(runner.clone(), Arc::new(PosixDialect))
        .terminate(&records, "5173")
        .await
        .unwrap();

    assert_eq!(report.terminated.len(), 2);
    let kills: Vec<String> = runner.calls()[1..].iter().map(|c| c.to_string()).collect();
    assert_eq!(kills, vec!["kill 10", "kill 11"]);
}
