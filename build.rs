//! Stamps the binary with the checkout commit and compiler version,
//! read back by `meridian::version`.

use std::process::Command;

/// Trimmed stdout of a successful command
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

fn main() {
    let commit = command_output("git", &["rev-parse", "--short", "HEAD"])
        .filter(|sha| !sha.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    // `rustc 1.80.0 (051478957 2024-07-21)` keeps only the version number
    let rustc = command_output("rustc", &["--version"])
        .and_then(|line| {
            line.strip_prefix("rustc ")
                .and_then(|rest| rest.split_whitespace().next())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=MERIDIAN_COMMIT_SHA={}", commit);
    println!("cargo:rustc-env=MERIDIAN_RUSTC_VERSION={}", rustc);
    println!("cargo:rerun-if-changed=.git/HEAD");
}
