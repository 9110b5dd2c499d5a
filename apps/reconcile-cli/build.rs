fn main() {
    // Allow overriding the CLI version with CH_RECONCILE_VERSION environment variable
    // This is used during CI builds to inject the full version string
    let cli_version = std::env::var("CH_RECONCILE_VERSION")
        .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());
    println!("cargo:rustc-env=CH_RECONCILE_VERSION={cli_version}");
    println!("cargo:rerun-if-env-changed=CH_RECONCILE_VERSION");
}
