//! Candidate configuration paths and restricted `$HOME` expansion.
//!
//! Search directories may come from untrusted input (CLI flags, other config
//! files), so expansion is deliberately narrow:
//! - percent-decoding happens exactly once
//! - traversal sequences and control characters disable expansion entirely
//! - only a leading `$HOME` is substituted, and only its first occurrence
//!
//! A rejected entry is never an error: it is returned unexpanded so one bad
//! directory cannot halt the whole lookup.
//!
//! Known limitation: decoding is single-pass. `%252e%252e` decodes to `%2e%2e`,
//! which is not recognised as traversal and comes back once-decoded.
//! Decoding follows path rules, not query-string rules: `+` is kept literally
//! instead of becoming a space, so `$HOME/a+b` expands to `<home>/a+b`.

use crate::env::EnvProvider;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Directories searched when the caller supplies none, in order.
pub const DEFAULT_SEARCH_DIRS: [&str; 4] = [".", "/etc", "$HOME/.config", "$HOME"];

/// Extensions tried per directory, before the extension-less variant.
pub const CONFIG_EXTENSIONS: [&str; 3] = [".yaml", ".yml", ".json"];

/// Builds candidate configuration file paths.
#[derive(Clone)]
pub struct PathResolver {
    env: Arc<dyn EnvProvider>,
}

impl std::fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathResolver").finish_non_exhaustive()
    }
}

impl PathResolver {
    /// Create a resolver that reads `HOME` from the given environment.
    pub fn new(env: Arc<dyn EnvProvider>) -> Self {
        Self { env }
    }

    /// Candidate paths for `base_name` across `search_dirs`.
    ///
    /// Directory-major order; per directory: `.yaml`, `.yml`, `.json`, then no
    /// extension. Empty `search_dirs` means [`DEFAULT_SEARCH_DIRS`]. Candidates
    /// containing a NUL byte are dropped.
    pub fn build_config_paths<S: AsRef<str>>(
        &self,
        base_name: &str,
        search_dirs: &[S],
    ) -> Vec<PathBuf> {
        let dirs: Vec<&str> = if search_dirs.is_empty() {
            DEFAULT_SEARCH_DIRS.to_vec()
        } else {
            search_dirs.iter().map(|d| d.as_ref()).collect()
        };

        let mut paths = Vec::with_capacity(dirs.len() * (CONFIG_EXTENSIONS.len() + 1));
        for dir in dirs {
            let expanded = self.expand_path(dir);
            let dir = Path::new(&expanded);

            let names = CONFIG_EXTENSIONS
                .iter()
                .map(|ext| format!("{}{}", base_name, ext))
                .chain(std::iter::once(base_name.to_string()));
            for name in names {
                let candidate = dir.join(name);
                if contains_nul(&candidate) {
                    debug!("Dropping candidate path with NUL byte");
                    continue;
                }
                paths.push(candidate);
            }
        }
        paths
    }

    /// Expand a leading `$HOME` after security filtering.
    pub fn expand_path(&self, path: &str) -> String {
        let decoded = percent_decode_once(path).unwrap_or_else(|| path.to_string());

        if is_traversal(&decoded) {
            warn!(path, "Refusing to expand path containing traversal");
            return path.to_string();
        }

        if decoded.contains(['\0', '\n', '\r']) {
            warn!("Refusing to expand path containing control characters");
            return path.to_string();
        }

        if decoded.starts_with("$HOME") {
            let home = self.env.get("HOME");
            return decoded.replacen("$HOME", &home, 1);
        }
        decoded
    }
}

/// Conventional configuration locations for an application, unexpanded.
pub fn common_config_paths(app_name: &str) -> Vec<String> {
    vec![
        format!(".{app_name}.yaml"),
        format!(".{app_name}.yml"),
        format!(".{app_name}.json"),
        format!("{app_name}.yaml"),
        format!("{app_name}.yml"),
        format!("{app_name}.json"),
        format!("$HOME/.config/{app_name}/{app_name}.yaml"),
        format!("$HOME/.config/{app_name}.yaml"),
        format!("${{HOME}}/.config/{app_name}/{app_name}.yaml"),
        format!("${{HOME}}/.config/{app_name}.yaml"),
        format!("/etc/{app_name}/{app_name}.yaml"),
        format!("/etc/{app_name}.yaml"),
    ]
}

fn is_traversal(decoded: &str) -> bool {
    decoded.contains("../") || decoded.contains("..\\") || decoded.ends_with("..")
}

fn contains_nul(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().contains('\0')
}

/// Decode `%XX` escapes once. Returns `None` for a malformed escape or a
/// result that is not UTF-8.
fn percent_decode_once(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let well_formed = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !well_formed {
                return None;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    urlencoding::decode(input).ok().map(|s| s.into_owned())
}
