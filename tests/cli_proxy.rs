//! Integration tests for the stream proxy subcommands.

#![allow(deprecated)] // cargo_bin is deprecated upstream

use assert_cmd::Command;
use predicates::prelude::*;

fn reelfetch() -> Command {
    let mut cmd = Command::cargo_bin("reelfetch").expect("binary 'reelfetch' should be built");
    cmd.args([
        "--config",
        "/nonexistent/reelfetch/config.toml",
        "--proxy",
        "https://proxy.test",
    ]);
    cmd
}

fn proxy_url(args: &[&str]) -> String {
    let output = reelfetch().arg("proxy-url").args(args).output().unwrap();
    assert!(output.status.success(), "{output:?}");
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

#[test]
fn proxy_url_is_deterministic() {
    let args = [
        "https://cdn.test/master.m3u8",
        "-H",
        "referer: https://site.test/",
        "-H",
        "origin: https://site.test",
    ];
    let first = proxy_url(&args);
    assert_eq!(first, proxy_url(&args));
    assert!(first.starts_with("https://proxy.test/m3u8-proxy?url=https%3A%2F%2Fcdn.test"));
}

#[test]
fn proxy_decode_recovers_target_and_headers() {
    let encoded = proxy_url(&["https://cdn.test/a.m3u8?token=1", "-H", "referer: https://site.test/"]);

    reelfetch()
        .args(["proxy-decode", &encoded, "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"target\": \"https://cdn.test/a.m3u8?token=1\""))
        .stdout(predicate::str::contains("\"referer\": \"https://site.test/\""));
}

#[test]
fn nested_proxy_url_decodes_one_layer() {
    let twice = proxy_url(&["https://cdn.test/a.m3u8", "--depth", "2"]);

    reelfetch()
        .args(["proxy-decode", &twice])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://proxy.test/m3u8-proxy?url="));
}

#[test]
fn malformed_header_is_rejected() {
    reelfetch()
        .args(["proxy-url", "https://cdn.test/a.m3u8", "-H", "no-colon-here"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Name: value"));
}

#[test]
fn non_proxy_url_cannot_be_decoded() {
    reelfetch()
        .args(["proxy-decode", "https://cdn.test/a.m3u8"])
        .assert()
        .failure();
}
