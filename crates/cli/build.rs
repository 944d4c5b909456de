use std::env;
use std::process::Command;

/// Short commit for `slipgen --version`; `SLIPGEN_BUILD_COMMIT` overrides git.
fn commit() -> String {
    if let Ok(commit) = env::var("SLIPGEN_BUILD_COMMIT") {
        if !commit.trim().is_empty() {
            return commit.trim().to_string();
        }
    }
    Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    println!("cargo:rerun-if-env-changed=SLIPGEN_BUILD_COMMIT");
    println!("cargo:rerun-if-changed=../../.git/HEAD");

    println!("cargo:rustc-env=SLIPGEN_COMMIT={}", commit());
    println!(
        "cargo:rustc-env=SLIPGEN_TARGET={}",
        env::var("TARGET").unwrap_or_else(|_| "unknown".to_string())
    );
}
