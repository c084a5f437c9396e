//! Integration tests for full runs.
//!
//! Runs the launcher against scripted and real processes and checks the
//! ledger and tool logs it leaves behind.

use cmtl_core::exec::runner_mock::{MockCommandRunner, MockResponse};
use cmtl_core::{
    CommandOutput, CommandSpec, InvocationStatus, Launcher, LauncherConfig, OutputLayout,
    RecordKind, ResultLedger,
};
use indexmap::IndexMap;
use tempfile::TempDir;

fn external(tools: &[(&str, Vec<&str>)]) -> LauncherConfig {
    LauncherConfig {
        run_delay_ms: 0,
        internal_tools: IndexMap::new(),
        external_tools: tools
            .iter()
            .map(|(name, argv)| (name.to_string(), CommandSpec::vector(argv.clone())))
            .collect(),
        ..LauncherConfig::default()
    }
}

#[tokio::test]
async fn test_run_all_with_default_registry_records_every_tool() {
    let temp_dir = TempDir::new().unwrap();
    let config = LauncherConfig {
        run_delay_ms: 0,
        ..LauncherConfig::default()
    };
    let runner = MockCommandRunner::new();
    runner.set_response(
        "nmap",
        MockResponse::Output(CommandOutput::with_stdout(0, "Nmap done")),
    );

    let launcher = Launcher::with_runner(
        config,
        OutputLayout::new(temp_dir.path().join("output")),
        Box::new(runner),
    )
    .unwrap();
    let tools = launcher.registry().len();

    let summary = launcher.run_all("192.168.1.1").await;

    assert_eq!(summary.outcomes.len(), tools);
    assert_eq!(summary.succeeded(), 1);

    let ledger = ResultLedger::open(temp_dir.path().join("output").join("results.json"));
    let records = ledger.load_all();
    assert_eq!(records.len(), tools + 1);
    assert_eq!(records[tools].kind, RecordKind::RunAll);

    // internal probes run first
    assert_eq!(records[0].tool, "port_scanner");
    assert_eq!(records[0].note.as_deref(), Some("script_not_found"));
}

#[tokio::test]
async fn test_consecutive_runs_only_append() {
    let temp_dir = TempDir::new().unwrap();
    let launcher = Launcher::with_runner(
        external(&[("Ghost", vec!["ghost"])]),
        OutputLayout::new(temp_dir.path()),
        Box::new(MockCommandRunner::new()),
    )
    .unwrap();

    launcher.run_all("10.0.0.1").await;
    let after_first = launcher.ledger().load_all();
    launcher.run_all("10.0.0.2").await;
    let after_second = launcher.ledger().load_all();

    assert_eq!(after_first.len(), 2);
    assert_eq!(after_second.len(), 4);
    assert_eq!(&after_second[..2], &after_first[..]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_all_with_real_processes() {
    let temp_dir = TempDir::new().unwrap();
    let config = external(&[
        ("Echo", vec!["echo", "scan", "{target}"]),
        ("Fail", vec!["sh", "-c", "echo oops >&2; exit 3"]),
        ("Missing", vec!["definitely-not-a-real-tool-cmtl"]),
    ]);

    let launcher = Launcher::new(config, OutputLayout::new(temp_dir.path())).unwrap();
    let summary = launcher.run_all("10.1.2.3").await;

    let statuses: Vec<InvocationStatus> = summary.outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![
            InvocationStatus::Succeeded,
            InvocationStatus::Failed,
            InvocationStatus::NotFound
        ]
    );
    assert_eq!(summary.outcomes[0].output, "scan 10.1.2.3\n");
    assert_eq!(summary.outcomes[1].exit_code, Some(3));
    assert_eq!(summary.outcomes[1].output, "ERR:\noops\n");

    let records = launcher.ledger().load_all();
    assert_eq!(records[0].cmd.as_deref(), Some("echo scan 10.1.2.3"));
    assert_eq!(records[0].output_preview.as_deref(), Some("scan 10.1.2.3\n"));

    let echo_log = std::fs::read_to_string(temp_dir.path().join("logs").join("echo.log")).unwrap();
    assert!(echo_log.starts_with("--- "));
    assert!(echo_log.contains("scan 10.1.2.3"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_all_times_out_and_continues() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = external(&[("Slow", vec!["sleep", "10"]), ("Echo", vec!["echo", "ok"])]);
    config.timeout_seconds = 1;

    let launcher = Launcher::new(config, OutputLayout::new(temp_dir.path())).unwrap();
    let started = std::time::Instant::now();
    let summary = launcher.run_all("10.0.0.1").await;

    assert!(started.elapsed() < std::time::Duration::from_secs(5));
    assert_eq!(summary.outcomes[0].status, InvocationStatus::TimedOut);
    assert_eq!(summary.outcomes[0].note.as_deref(), Some("timed_out"));
    assert!(summary.outcomes[1].success);
}
