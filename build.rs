use chrono::Utc;
use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

fn main() {
    let out_dir = env::var_os("OUT_DIR").unwrap();
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let manifest = Path::new(&manifest_dir).join("Cargo.toml");

    let generated = format!(
        "pub const PACKAGE_DESCRIPTION: &str = {:?};\n\
         pub const BUILD_TIME: &str = {:?};\n\
         pub const GIT_HASH: &str = {:?};\n",
        package_description(&manifest),
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        git_hash(&manifest_dir),
    );
    fs::write(Path::new(&out_dir).join("version.rs"), generated).unwrap();

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=.git/HEAD");
}

/// `package.description` from Cargo.toml, empty if absent
fn package_description(manifest: &Path) -> String {
    fs::read_to_string(manifest)
        .ok()
        .and_then(|text| text.parse::<toml::Table>().ok())
        .and_then(|table| {
            table
                .get("package")?
                .get("description")?
                .as_str()
                .map(str::to_string)
        })
        .unwrap_or_default()
}

/// Short hash of HEAD, or "unknown" outside a git checkout
fn git_hash(dir: &str) -> String {
    Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .current_dir(dir)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
