use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    // Release builds sit exactly on a tag; anything else carries the short hash.
    let exact_tag = git(&["describe", "--exact-match", "--tags", "HEAD"]).is_some();
    let hash = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_default();

    println!("cargo:rustc-env=CHART2KAP_GIT_HASH={hash}");
    println!("cargo:rustc-env=CHART2KAP_ON_TAG={exact_tag}");
}
