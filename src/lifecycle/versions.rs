//! Environment and external tool version probe.
//!
//! Reports the operating system, whether the process runs in a container,
//! and the version of the media tool the configured stream type needs.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use serde::Serialize;

use crate::config::{EffectiveConfig, StreamType};

/// Reported for a tool that is not used by the current stream type.
pub const NOT_APPLICABLE: &str = "N/A";
/// Reported for a tool whose executable cannot be found.
pub const MISSING: &str = "Missing";
/// Reported when a tool runs but its output has no version string.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Versions {
    pub opersystem: String,
    pub isdocker: bool,
    pub ffmpeg: String,
    pub vlc: String,
}

/// Operating system name as shown to users.
pub fn operating_system() -> String {
    match std::env::consts::OS {
        "linux" => "Linux".to_string(),
        "macos" => "Darwin".to_string(),
        "windows" => "Windows".to_string(),
        other => other.to_string(),
    }
}

/// Real or effective UID 0.
#[cfg(unix)]
pub fn running_as_root() -> bool {
    nix::unistd::geteuid().is_root() || nix::unistd::getuid().is_root()
}

#[cfg(not(unix))]
pub fn running_as_root() -> bool {
    false
}

/// Warning to log for the given platform and privilege level, if any.
pub fn privilege_warning(opersystem: &str, as_root: bool, as_admin: bool) -> Option<&'static str> {
    match opersystem {
        "Linux" | "Darwin" => as_root.then_some("Do not run fHDHR with root privileges."),
        "Windows" => as_admin.then_some("Do not run fHDHR as Administrator."),
        _ => Some("Uncommon Operating System, use at your own risk."),
    }
}

fn warn_privileges(opersystem: &str) {
    let as_admin = std::env::var("USERNAME").is_ok_and(|user| user == "Administrator");
    if let Some(message) = privilege_warning(opersystem, running_as_root(), as_admin) {
        tracing::warn!("{}", message);
    }
}

/// Container detection via the Docker marker file or the cgroup table.
pub fn is_docker() -> bool {
    if Path::new("/.dockerenv").exists() {
        return true;
    }
    std::fs::read_to_string("/proc/self/cgroup").is_ok_and(|cgroup| cgroup.contains("docker"))
}

/// `ffmpeg -version` prints `ffmpeg version 6.0 Copyright ...`.
pub fn parse_ffmpeg_version(output: &str) -> Option<String> {
    let (_, rest) = output.split_once("version ")?;
    rest.split(' ').next().filter(|v| !v.is_empty()).map(str::to_string)
}

/// `vlc --version` prints `VLC media player 3.0.18 Vetinari` on a line
/// introduced by `VLC version`.
pub fn parse_vlc_version(output: &str) -> Option<String> {
    let (_, rest) = output.split_once("version ")?;
    rest.split('\n').next().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn tool_version(path: &str, flag: &str, parse: fn(&str) -> Option<String>) -> String {
    match Command::new(path).arg(flag).stdin(Stdio::null()).stderr(Stdio::null()).output() {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            parse(&stdout).unwrap_or_else(|| UNKNOWN.to_string())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(path = %path, "Failed to find {}.", path);
            MISSING.to_string()
        }
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Failed to run version probe");
            UNKNOWN.to_string()
        }
    }
}

/// Probe the environment for the configured stream type.
pub fn probe_versions(config: &EffectiveConfig) -> Versions {
    let opersystem = operating_system();
    warn_privileges(&opersystem);

    let mut versions = Versions {
        opersystem,
        isdocker: is_docker(),
        ffmpeg: NOT_APPLICABLE.to_string(),
        vlc: NOT_APPLICABLE.to_string(),
    };

    match config.stream_type() {
        Some(StreamType::Ffmpeg) => {
            let path = config.get_str("ffmpeg", "path").unwrap_or("ffmpeg");
            versions.ffmpeg = tool_version(path, "-version", parse_ffmpeg_version);
        }
        Some(StreamType::Vlc) => {
            let path = config.get_str("vlc", "path").unwrap_or("cvlc");
            versions.vlc = tool_version(path, "--version", parse_vlc_version);
        }
        _ => {}
    }

    tracing::info!(
        opersystem = %versions.opersystem,
        isdocker = versions.isdocker,
        ffmpeg = %versions.ffmpeg,
        vlc = %versions.vlc,
        "Environment probed"
    );
    versions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ffmpeg_version() {
        let output = "ffmpeg version 6.0-static https://johnvansickle.com/ffmpeg/ Copyright (c) 2000-2023\n";
        assert_eq!(parse_ffmpeg_version(output), Some("6.0-static".to_string()));
        assert_eq!(parse_ffmpeg_version("no banner"), None);
    }

    #[test]
    fn test_parse_vlc_version() {
        let output = "VLC version 3.0.18 Vetinari (3.0.18-0-gd3b4fbd9a4)\nCompiled by buildd\n";
        assert_eq!(
            parse_vlc_version(output),
            Some("3.0.18 Vetinari (3.0.18-0-gd3b4fbd9a4)".to_string())
        );
    }

    #[test]
    fn test_privilege_warning() {
        assert!(privilege_warning("Linux", true, false).is_some());
        assert!(privilege_warning("Darwin", true, false).is_some());
        assert_eq!(privilege_warning("Linux", false, false), None);
        assert_eq!(privilege_warning("Linux", false, true), None);
        assert!(privilege_warning("Windows", false, true).is_some());
        assert_eq!(privilege_warning("Windows", true, false), None);
        assert!(privilege_warning("Plan9", false, false).is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_root_detection_matches_effective_uid() {
        let euid_root = nix::unistd::geteuid().is_root();
        let uid_root = nix::unistd::getuid().is_root();
        assert_eq!(running_as_root(), euid_root || uid_root);
    }

    #[test]
    fn test_direct_stream_probes_no_tools() {
        let mut config = EffectiveConfig::new();
        config.set("fhdhr", "stream_type", "direct".into());

        let versions = probe_versions(&config);
        assert_eq!(versions.ffmpeg, NOT_APPLICABLE);
        assert_eq!(versions.vlc, NOT_APPLICABLE);
        assert!(!versions.opersystem.is_empty());
    }

    #[test]
    fn test_missing_tool_is_reported() {
        let mut config = EffectiveConfig::new();
        config.set("fhdhr", "stream_type", "ffmpeg".into());
        config.set("ffmpeg", "path", "/nonexistent/fhdhr-test/ffmpeg".into());

        assert_eq!(probe_versions(&config).ffmpeg, MISSING);
    }
}
