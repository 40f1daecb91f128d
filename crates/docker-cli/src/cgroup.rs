use crate::error::{DockerError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const DEFAULT_CGROUP_PATH: &str = "/proc/self/cgroup";

static CONTAINER_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[/-])([0-9a-f]{64})(?:\.scope)?$").expect("container id pattern compiles")
});

/// Finds the id of the container the current process runs in, given the
/// contents of a `/proc/<pid>/cgroup` file.
pub fn container_id_from_cgroup(contents: &str) -> Option<String> {
    contents.lines().find_map(|line| {
        let path = line.splitn(3, ':').nth(2)?.trim();
        CONTAINER_ID_PATTERN
            .captures(path)
            .map(|captures| captures[1].to_string())
    })
}

/// A missing cgroup file means we are not on Linux, hence not containerized.
pub fn read_container_id(cgroup_path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(cgroup_path) {
        Ok(contents) => Ok(container_id_from_cgroup(&contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(DockerError::Io {
            path: cgroup_path.to_path_buf(),
            source,
        }),
    }
}
