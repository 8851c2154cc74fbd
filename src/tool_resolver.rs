//! # Tool Path Resolver
//!
//! Finds the external encoder binary:
//! - `TOOLS_DIR` override (a directory holding `ffmpeg`, or `<platform>/ffmpeg`)
//! - System `PATH`

use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Tool path resolver for bundled and system-installed tools
pub struct ToolPathResolver {
    /// Directory searched before PATH
    tools_dir: Option<PathBuf>,
    /// Value of PATH at construction time
    search_path: Option<std::ffi::OsString>,
}

impl ToolPathResolver {
    /// Create a resolver from the process environment
    pub fn new() -> Self {
        let tools_dir = env::var_os("TOOLS_DIR")
            .map(PathBuf::from)
            .filter(|dir| {
                let exists = dir.is_dir();
                if !exists {
                    warn!("TOOLS_DIR does not exist: {}", dir.display());
                }
                exists
            });

        Self {
            tools_dir,
            search_path: env::var_os("PATH"),
        }
    }

    /// Resolver with an explicit tools directory and search path
    pub fn with_paths(tools_dir: Option<PathBuf>, search_path: Option<std::ffi::OsString>) -> Self {
        Self { tools_dir, search_path }
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        if let Some(ref tools_dir) = self.tools_dir {
            if let Some(bundled) = self.find_bundled(tools_dir, tool_name) {
                debug!("Using bundled tool: {} -> {}", tool_name, bundled.display());
                return Some(bundled);
            }
        }

        if let Some(system_path) = self.find_in_system_path(tool_name) {
            debug!("Using system tool: {} -> {}", tool_name, system_path.display());
            return Some(system_path);
        }

        warn!("Tool not found: {}", tool_name);
        None
    }

    fn executable_name(tool_name: &str) -> String {
        if cfg!(windows) {
            format!("{}.exe", tool_name)
        } else {
            tool_name.to_string()
        }
    }

    fn find_bundled(&self, tools_dir: &Path, tool_name: &str) -> Option<PathBuf> {
        let platform = if cfg!(target_os = "macos") {
            "darwin"
        } else {
            env::consts::OS
        };
        let exe = Self::executable_name(tool_name);

        [tools_dir.join(&exe), tools_dir.join(platform).join(&exe)]
            .into_iter()
            .find(|path| path.is_file())
    }

    /// Find tool in system PATH
    fn find_in_system_path(&self, tool_name: &str) -> Option<PathBuf> {
        let exe = Self::executable_name(tool_name);
        env::split_paths(self.search_path.as_ref()?)
            .map(|dir| dir.join(&exe))
            .find(|path| path.is_file())
    }

    /// Installation hint shown when a tool is missing
    pub fn install_hint(tool_name: &str) -> String {
        let package = match tool_name {
            "ffmpeg" | "ffprobe" => "ffmpeg",
            other => other,
        };
        if cfg!(target_os = "macos") {
            format!("brew install {}", package)
        } else if cfg!(windows) {
            format!("winget install {}", package)
        } else {
            format!("sudo apt-get install {}", package)
        }
    }
}

impl Default for ToolPathResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_tool(dir: &Path, name: &str) -> PathBuf {
        std::fs::create_dir_all(dir).unwrap();
        let path = dir.join(ToolPathResolver::executable_name(name));
        std::fs::write(&path, b"#!/bin/sh\n").unwrap();
        path
    }

    #[test]
    fn test_resolve_from_search_path() {
        let temp_dir = TempDir::new().unwrap();
        let bin = temp_dir.path().join("bin");
        let expected = fake_tool(&bin, "ffmpeg");

        let search_path = env::join_paths([temp_dir.path().join("empty"), bin]).unwrap();
        let resolver = ToolPathResolver::with_paths(None, Some(search_path));

        assert_eq!(resolver.resolve_tool("ffmpeg"), Some(expected));
        assert_eq!(resolver.resolve_tool("definitely-not-a-tool"), None);
    }

    #[test]
    fn test_tools_dir_takes_precedence() {
        let temp_dir = TempDir::new().unwrap();
        let bundled = fake_tool(&temp_dir.path().join("tools"), "ffmpeg");
        let bin = temp_dir.path().join("bin");
        fake_tool(&bin, "ffmpeg");

        let resolver = ToolPathResolver::with_paths(
            Some(temp_dir.path().join("tools")),
            Some(bin.into_os_string()),
        );
        assert_eq!(resolver.resolve_tool("ffmpeg"), Some(bundled));
    }

    #[test]
    fn test_missing_search_path() {
        let resolver = ToolPathResolver::with_paths(None, None);
        assert!(resolver.resolve_tool("ffmpeg").is_none());
    }

    #[test]
    fn test_install_hint_names_package() {
        assert!(ToolPathResolver::install_hint("ffprobe").contains("ffmpeg"));
    }
}
