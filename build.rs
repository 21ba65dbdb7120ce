fn main() {
    // Shown in the page footer as the deploy time
    let deployed_at = chrono::Utc::now().format("%Y-%m-%d %H:%M UTC").to_string();
    println!("cargo:rustc-env=BUILD_TIME={deployed_at}");
    println!("cargo:rerun-if-changed=build.rs");
}
