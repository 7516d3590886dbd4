// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::AppError;
use std::path::{Path, PathBuf};

const DATA_DIR_ENV: &str = "DATA_DIR";

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}

fn normalize_data_relative(path: &Path) -> PathBuf {
    path.strip_prefix("data")
        .map(PathBuf::from)
        .unwrap_or_else(|_| path.to_path_buf())
}

fn env_data_dir() -> Option<String> {
    std::env::var(DATA_DIR_ENV)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn explicit_dir(explicit_data_dir: Option<&str>) -> Option<String> {
    explicit_data_dir
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .or_else(env_data_dir)
}

/// Resolves a token/pool list path. Relative paths starting with `data/`
/// are re-rooted under `DATA_DIR` (or the configured data dir) when set,
/// otherwise under the working directory.
pub fn resolve_data_path(raw_path: &str, explicit_data_dir: Option<&str>) -> PathBuf {
    let as_path = PathBuf::from(raw_path);
    if as_path.is_absolute() {
        return as_path;
    }
    match explicit_dir(explicit_data_dir) {
        Some(dir) => absolute(PathBuf::from(dir)).join(normalize_data_relative(&as_path)),
        None => absolute(as_path),
    }
}

pub fn resolve_required_data_path(
    raw_path: &str,
    explicit_data_dir: Option<&str>,
) -> Result<PathBuf, AppError> {
    let resolved = resolve_data_path(raw_path, explicit_data_dir);
    if resolved.exists() {
        return Ok(resolved);
    }
    Err(AppError::Config(format!(
        "expected at {}; set DATA_DIR",
        resolved.display()
    )))
}
