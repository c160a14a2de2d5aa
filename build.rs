//! Embeds the git revision and cargo profile reported by `GET /health`.
//!
//! `EDGEIP_GIT_SHORT_OVERRIDE` wins over git, for builds without a `.git`
//! directory (container images, source tarballs).

use std::env;
use std::process::Command;

fn git_revision() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let revision = String::from_utf8(output.stdout).ok()?;
    let revision = revision.trim();
    (!revision.is_empty()).then(|| revision.to_owned())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-env-changed=EDGEIP_GIT_SHORT_OVERRIDE");

    let revision = env::var("EDGEIP_GIT_SHORT_OVERRIDE")
        .ok()
        .filter(|value| !value.is_empty())
        .or_else(git_revision)
        .unwrap_or_else(|| "unknown".to_owned());
    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_owned());

    println!("cargo:rustc-env=EDGEIP_GIT_SHORT={revision}");
    println!("cargo:rustc-env=EDGEIP_BUILD_PROFILE={profile}");
}
