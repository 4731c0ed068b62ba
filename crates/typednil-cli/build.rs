use std::process::Command;

/// Set when building outside a git checkout, e.g. from a source tarball.
const HASH_OVERRIDE: &str = "TYPEDNIL_GIT_HASH";

fn git_short_hash() -> Option<String> {
    let out = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let hash = String::from_utf8(out.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}

fn main() {
    let hash = std::env::var(HASH_OVERRIDE)
        .ok()
        .filter(|h| !h.is_empty())
        .or_else(git_short_hash)
        .unwrap_or_else(|| "unknown".into());
    println!("cargo:rustc-env=GIT_HASH={hash}");

    println!("cargo:rerun-if-env-changed={HASH_OVERRIDE}");
    for watched in ["../../.git/HEAD", "../../.git/refs/"] {
        println!("cargo:rerun-if-changed={watched}");
    }
}
