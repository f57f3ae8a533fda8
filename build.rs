use std::env;
use std::path::{Path, PathBuf};

const HOMEBREW_PREFIXES: [&str; 2] = ["/opt/homebrew/opt/ffmpeg", "/usr/local/opt/ffmpeg"];

fn main() {
    for variable in [
        "FFMPEG_DIR",
        "PKG_CONFIG_PATH",
        "VCPKG_ROOT",
        "VCPKGRS_DYNAMIC",
        "VCPKGRS_TRIPLET",
    ] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    // An explicit FFMPEG_DIR is what ffmpeg-sys-next honours first.
    if env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    match env::var("CARGO_CFG_TARGET_OS").unwrap_or_default().as_str() {
        "windows" => hint_vcpkg(),
        "macos" => hint_homebrew(),
        _ => {}
    }
}

fn hint_vcpkg() {
    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!(
            "cargo:warning=FFMPEG_DIR is not set. On Windows, install FFmpeg via vcpkg and set VCPKG_ROOT or FFMPEG_DIR so the demuxer libraries can be found."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let install = PathBuf::from(&vcpkg_root).join("installed").join(&triplet);
    if !install.join("include").join("libavformat").exists() {
        println!(
            "cargo:warning=VCPKG_ROOT is set but libavformat headers were not found under {}.",
            install.display(),
        );
        return;
    }

    println!(
        "cargo:warning=Using vcpkg FFmpeg at {}. Set FFMPEG_DIR={} to make discovery explicit.",
        install.display(),
        install.display(),
    );
    if env::var_os("VCPKGRS_DYNAMIC").is_none() {
        println!(
            "cargo:warning=Set VCPKGRS_DYNAMIC=1 when linking a dynamic vcpkg FFmpeg into the cdylib."
        );
    }
}

fn hint_homebrew() {
    if env::var_os("PKG_CONFIG_PATH").is_some() {
        return;
    }
    if let Some(prefix) = HOMEBREW_PREFIXES
        .iter()
        .map(Path::new)
        .find(|prefix| prefix.join("lib").join("pkgconfig").exists())
    {
        println!(
            "cargo:warning=PKG_CONFIG_PATH is not set. Homebrew FFmpeg found at {}; export PKG_CONFIG_PATH={} if the build cannot find libavformat.",
            prefix.display(),
            prefix.join("lib").join("pkgconfig").display(),
        );
    }
}
