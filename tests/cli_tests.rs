use std::net::TcpListener;
use std::process::{Command, Output, Stdio};

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tcp-sweep-rs"))
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("binary runs")
}

fn exit_code(args: &[&str]) -> i32 {
    run_cli(args).status.code().expect("exited normally")
}

#[test]
fn help_exits_zero() {
    let out = run_cli(&["-h"]);
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Usage"));
}

#[test]
fn zero_jobs_exits_one_without_scanning() {
    let out = run_cli(&["-j", "0", "127.0.0.1", "1", "2"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid thread count"));
    assert!(!String::from_utf8_lossy(&out.stdout).contains("Starting Port Scan"));
}

#[test]
fn negative_timeout_exits_one_without_scanning() {
    let out = run_cli(&["-t", "-1", "127.0.0.1", "1", "2"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid timeout value"));
    assert!(!String::from_utf8_lossy(&out.stdout).contains("Starting Port Scan"));
}

#[test]
fn unparsable_options_exit_one() {
    assert_eq!(exit_code(&["-t", "abc", "127.0.0.1", "1", "2"]), 1);
    assert_eq!(exit_code(&["-j", "1001", "127.0.0.1", "1", "2"]), 1);
    assert_eq!(exit_code(&["127.0.0.1", "1"]), 1);
}

#[test]
fn bad_ports_exit_one() {
    assert_eq!(exit_code(&["127.0.0.1", "8x", "10"]), 1);
    assert_eq!(exit_code(&["127.0.0.1", "0", "5"]), 1);
    assert_eq!(exit_code(&["127.0.0.1", "100", "1"]), 1);
    assert_eq!(exit_code(&["127.0.0.1", "1", "65536"]), 1);
}

#[test]
fn unresolved_host_exits_one() {
    let out = run_cli(&["no.such.host.invalid", "80", "80"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("could not resolve hostname"));
}

#[test]
fn completed_scan_exits_zero() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port().to_string();

    let out = run_cli(&["-j", "2", "127.0.0.1", &port, &port]);
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains(&format!("[OPEN] 127.0.0.1:{port}")));
    assert!(stdout.contains("--- Scan Complete ---"));
}

#[test]
fn json_report_lists_open_port() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let arg = port.to_string();

    let out = run_cli(&["--json", "127.0.0.1", &arg, &arg]);
    assert_eq!(out.status.code(), Some(0));
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json on stdout");
    assert_eq!(report["status"], "complete");
    assert_eq!(report["open_ports"], serde_json::json!([port]));
}
