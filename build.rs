fn git(args: &[&str]) -> Option<String> {
    std::process::Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    // Tagged builds report the crate version; everything else reports dev@<hash>.
    let version = match git(&["describe", "--exact-match", "--tags", "HEAD"]) {
        Some(_) => env!("CARGO_PKG_VERSION").to_string(),
        None => match git(&["rev-parse", "--short", "HEAD"]) {
            Some(hash) if !hash.is_empty() => format!("dev@{hash}"),
            _ => "dev@unknown".to_string(),
        },
    };

    println!("cargo:rustc-env=ALMANAC_VERSION={version}");
}
