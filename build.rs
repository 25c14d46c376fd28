//! Stamps the gateway binary with a version and short git SHA.
//!
//! - LIGHTGW_VERSION: release version (defaults to CARGO_PKG_VERSION)
//! - LIGHTGW_GIT_SHA: commit SHA (defaults to GITHUB_SHA, then `git rev-parse`)

use std::process::Command;

fn main() {
    let version = std::env::var("LIGHTGW_VERSION").unwrap_or_else(|_| {
        std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "unknown".into())
    });
    println!("cargo:rustc-env=LIGHTGW_VERSION={}", version);

    let git_sha = std::env::var("LIGHTGW_GIT_SHA")
        .or_else(|_| std::env::var("GITHUB_SHA").map(|s| s.chars().take(7).collect()))
        .unwrap_or_else(|_| short_sha_from_git());
    println!("cargo:rustc-env=LIGHTGW_GIT_SHA={}", git_sha);

    println!("cargo:rerun-if-env-changed=LIGHTGW_VERSION");
    println!("cargo:rerun-if-env-changed=LIGHTGW_GIT_SHA");
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");
}

fn short_sha_from_git() -> String {
    Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".into())
}
