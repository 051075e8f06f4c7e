//! # Tool Path Resolver
//!
//! Finds the external transcoder (`ffmpeg`) used for video compression.
//!
//! Resolution order:
//! 1. Explicit path from the configuration / `--ffmpeg` (authoritative, no fallback)
//! 2. `MEDIA_COMPRESSOR_FFMPEG` environment variable (authoritative, no fallback)
//! 3. Bundled tools directory (`TOOLS_DIR`, or `tools/` next to the executable),
//!    laid out as `tools/{platform}/ffmpeg[.exe]` or `tools/{platform}/ffmpeg/ffmpeg[.exe]`
//! 4. System `PATH`

use crate::error::CompressError;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the ffmpeg location
pub const FFMPEG_ENV: &str = "MEDIA_COMPRESSOR_FFMPEG";

/// Tool path resolver for bundled and system-installed binaries
#[derive(Debug, Clone)]
pub struct ToolPathResolver {
    /// Value of `MEDIA_COMPRESSOR_FFMPEG` captured at construction
    env_override: Option<PathBuf>,
    /// Base directory where tools are bundled
    tools_dir: Option<PathBuf>,
    /// Directories searched like the shell `PATH`
    search_path: Option<OsString>,
}

impl ToolPathResolver {
    /// Create a resolver from the process environment
    pub fn new() -> Self {
        Self {
            env_override: env::var_os(FFMPEG_ENV).filter(|v| !v.is_empty()).map(PathBuf::from),
            tools_dir: Self::detect_bundled_tools_dir(),
            search_path: env::var_os("PATH"),
        }
    }

    /// Create a resolver with explicit search locations and no env override
    pub fn with_locations(tools_dir: Option<PathBuf>, search_path: Option<OsString>) -> Self {
        Self {
            env_override: None,
            tools_dir,
            search_path,
        }
    }

    /// Detect the bundled tools directory
    fn detect_bundled_tools_dir() -> Option<PathBuf> {
        if let Some(tools_dir) = env::var_os("TOOLS_DIR") {
            let tools_path = PathBuf::from(tools_dir);
            debug!("Checking TOOLS_DIR environment variable: {:?}", tools_path);
            if tools_path.is_dir() {
                return Some(tools_path);
            }
        }

        if let Ok(exe_path) = env::current_exe() {
            if let Some(app_dir) = exe_path.parent() {
                let possible_paths = [app_dir.join("tools"), app_dir.join("resources").join("tools")];
                for path in possible_paths {
                    debug!("Checking bundled tools path: {:?}", path);
                    if path.is_dir() {
                        return Some(path);
                    }
                }
            }
        }

        debug!("No bundled tools directory found");
        None
    }

    /// Resolve the ffmpeg binary following the documented order
    pub fn resolve_ffmpeg(&self, explicit: Option<&Path>) -> Result<PathBuf, CompressError> {
        if let Some(path) = explicit {
            return Self::check_executable(path, "configured ffmpeg path");
        }

        if let Some(ref path) = self.env_override {
            return Self::check_executable(path, FFMPEG_ENV);
        }

        self.resolve_tool("ffmpeg").ok_or_else(|| {
            CompressError::ExternalToolUnavailable(format!(
                "ffmpeg not found in bundled tools or PATH (install with: {}, or set {})",
                Self::install_instructions("ffmpeg"),
                FFMPEG_ENV
            ))
        })
    }

    /// Resolve the path to a specific tool (bundled first, then PATH)
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        if let Some(ref tools_dir) = self.tools_dir {
            if let Some(bundled) = Self::bundled_tool_path(tools_dir, tool_name) {
                debug!("Using bundled tool: {} -> {:?}", tool_name, bundled);
                return Some(bundled);
            }
        }

        if let Some(system_path) = self.find_in_search_path(tool_name) {
            debug!("Using system tool: {} -> {:?}", tool_name, system_path);
            return Some(system_path);
        }

        warn!("Tool not found: {}", tool_name);
        None
    }

    /// Existing bundled binary for `tool_name`, if any
    fn bundled_tool_path(tools_dir: &Path, tool_name: &str) -> Option<PathBuf> {
        let platform_dir = tools_dir.join(Self::platform_name());
        let binary = executable_name(tool_name);

        [
            platform_dir.join(&binary),
            platform_dir.join(tool_name).join(&binary),
        ]
        .into_iter()
        .find(|p| p.is_file())
    }

    fn find_in_search_path(&self, tool_name: &str) -> Option<PathBuf> {
        let binary = executable_name(tool_name);
        env::split_paths(self.search_path.as_ref()?)
            .map(|dir| dir.join(&binary))
            .find(|path| path.is_file())
    }

    fn check_executable(path: &Path, source: &str) -> Result<PathBuf, CompressError> {
        if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(CompressError::ExternalToolUnavailable(format!(
                "ffmpeg from {} does not exist: {}",
                source,
                path.display()
            )))
        }
    }

    fn platform_name() -> &'static str {
        if cfg!(target_os = "windows") {
            "windows"
        } else if cfg!(target_os = "macos") {
            "darwin"
        } else if cfg!(target_os = "linux") {
            "linux"
        } else {
            env::consts::OS
        }
    }

    /// Installation hint for a tool
    pub fn install_instructions(tool_name: &str) -> String {
        match (tool_name, env::consts::OS) {
            ("ffmpeg" | "ffprobe", "linux") => "sudo apt-get install ffmpeg".to_string(),
            ("ffmpeg" | "ffprobe", "macos") => "brew install ffmpeg".to_string(),
            ("ffmpeg" | "ffprobe", "windows") => "winget install ffmpeg".to_string(),
            (other, _) => format!("install {} and add it to PATH", other),
        }
    }
}

impl Default for ToolPathResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn executable_name(tool_name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", tool_name)
    } else {
        tool_name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, b"#!/bin/sh\n").unwrap();
    }

    #[test]
    fn test_explicit_path_is_authoritative() {
        let dir = TempDir::new().unwrap();
        let on_path = dir.path().join("bin").join(executable_name("ffmpeg"));
        touch(&on_path);

        let resolver = ToolPathResolver::with_locations(None, Some(dir.path().join("bin").into_os_string()));
        let missing = dir.path().join("nope").join("ffmpeg");

        // falls back to nothing even though PATH has one
        let err = resolver.resolve_ffmpeg(Some(&missing)).unwrap_err();
        assert!(matches!(err, CompressError::ExternalToolUnavailable(_)));

        assert_eq!(resolver.resolve_ffmpeg(Some(&on_path)).unwrap(), on_path);
    }

    #[test]
    fn test_search_path_lookup() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        std::fs::create_dir_all(&first).unwrap();
        let binary = second.join(executable_name("ffmpeg"));
        touch(&binary);

        let search = env::join_paths([first, second]).unwrap();
        let resolver = ToolPathResolver::with_locations(None, Some(search));
        assert_eq!(resolver.resolve_ffmpeg(None).unwrap(), binary);
        assert_eq!(resolver.resolve_tool("definitely-not-a-tool"), None);
    }

    #[test]
    fn test_bundled_tools_win_over_path() {
        let dir = TempDir::new().unwrap();
        let tools = dir.path().join("tools");
        let bundled = tools
            .join(ToolPathResolver::platform_name())
            .join("ffmpeg")
            .join(executable_name("ffmpeg"));
        touch(&bundled);
        let system = dir.path().join("bin").join(executable_name("ffmpeg"));
        touch(&system);

        let resolver = ToolPathResolver::with_locations(Some(tools), Some(dir.path().join("bin").into_os_string()));
        assert_eq!(resolver.resolve_tool("ffmpeg"), Some(bundled));
    }

    #[test]
    fn test_nothing_found() {
        let dir = TempDir::new().unwrap();
        let resolver = ToolPathResolver::with_locations(None, Some(dir.path().as_os_str().to_owned()));
        let err = resolver.resolve_ffmpeg(None).unwrap_err();
        assert!(err.to_string().contains(FFMPEG_ENV));
    }
}
