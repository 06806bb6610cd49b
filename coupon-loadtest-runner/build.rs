use std::process::Command;

fn main() {
    let git_hash = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|x| String::from_utf8(x.stdout).ok())
        .map(|hash| hash[..8].to_owned());

    let dirty = Command::new("git")
        .args(["diff", "--stat"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !matches!(output.stdout.len(), 0));

    let git_hash = git_hash.unwrap_or_else(|| "unknown".to_owned());
    if Some(true) == dirty {
        println!("cargo:rustc-env=COUPON_LOADTEST_GIT_HASH={}-dirty", git_hash);
    } else {
        println!("cargo:rustc-env=COUPON_LOADTEST_GIT_HASH={}", git_hash);
    }

    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_owned());
    println!("cargo:rustc-env=COUPON_LOADTEST_PROFILE={}", profile);
}
