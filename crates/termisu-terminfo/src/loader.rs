//! Locates and reads compiled terminfo files from the standard search
//! paths.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Where a loaded capability table came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminfoSource {
    /// Loaded from a compiled terminfo file at this path.
    Compiled(PathBuf),
    /// No compiled database was found; the named built-in fallback table
    /// was used instead.
    Fallback(&'static str),
}

/// Error locating a terminfo database entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFound {
    pub term: String,
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no terminfo entry found for terminal {:?}", self.term)
    }
}

impl std::error::Error for NotFound {}

/// Candidate base directories to search, in priority order.
fn search_bases() -> Vec<PathBuf> {
    let mut bases = Vec::new();

    if let Ok(terminfo) = env::var("TERMINFO") {
        if !terminfo.is_empty() {
            bases.push(PathBuf::from(terminfo));
        }
    }

    if let Ok(home) = env::var("HOME") {
        if !home.is_empty() {
            bases.push(PathBuf::from(home).join(".terminfo"));
        }
    }

    if let Ok(dirs) = env::var("TERMINFO_DIRS") {
        for entry in dirs.split(':') {
            if entry.is_empty() {
                bases.push(PathBuf::from("/usr/share/terminfo"));
            } else {
                bases.push(PathBuf::from(entry));
            }
        }
    }

    bases.push(PathBuf::from("/lib/terminfo"));
    bases.push(PathBuf::from("/usr/local/share/terminfo"));
    bases.push(PathBuf::from("/usr/share/terminfo"));

    bases
}

/// Locate and read the compiled terminfo bytes for `name`, trying each
/// standard search path in order and, within each base, both the
/// first-character and Darwin hex-nibble subdirectory layouts.
///
/// # Errors
///
/// Returns [`NotFound`] if no path yields a readable file.
pub fn load(name: &str) -> Result<(PathBuf, Vec<u8>), NotFound> {
    let Some(first) = name.chars().next() else {
        return Err(NotFound {
            term: name.to_owned(),
        });
    };

    for base in search_bases() {
        for sub in candidate_subdirs(first) {
            let path = base.join(sub).join(name);
            if let Ok(bytes) = fs::read(&path) {
                return Ok((path, bytes));
            }
        }
    }

    Err(NotFound {
        term: name.to_owned(),
    })
}

fn candidate_subdirs(first: char) -> [String; 2] {
    let mut buf = [0u8; 4];
    let standard = first.encode_utf8(&mut buf).to_owned();
    let hex = format!("{:02x}", first as u32 & 0xff);
    [standard, hex]
}

/// True if `path` exists under any of the standard search bases (used by
/// tests and diagnostics; not part of the load fast path).
#[must_use]
pub fn is_under_search_path(path: &Path) -> bool {
    search_bases().iter().any(|base| path.starts_with(base))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn not_found_for_nonexistent_terminal() {
        let _guard = ENV_LOCK.lock().unwrap();
        // SAFETY: test runs under ENV_LOCK; no concurrent env access.
        unsafe {
            env::remove_var("TERMINFO");
            env::remove_var("TERMINFO_DIRS");
            env::set_var("HOME", "/nonexistent-termisu-test-home");
        }
        let result = load("definitely-not-a-real-terminal-xyz");
        assert!(result.is_err());
    }

    #[test]
    fn empty_term_name_fails_fast() {
        let _guard = ENV_LOCK.lock().unwrap();
        assert_eq!(
            load(""),
            Err(NotFound {
                term: String::new()
            })
        );
    }

    #[test]
    fn terminfo_dirs_empty_entry_means_usr_share() {
        let _guard = ENV_LOCK.lock().unwrap();
        // SAFETY: test runs under ENV_LOCK; no concurrent env access.
        unsafe {
            env::set_var("TERMINFO_DIRS", ":/some/other/dir");
        }
        let bases = search_bases();
        assert!(bases.contains(&PathBuf::from("/usr/share/terminfo")));
        assert!(bases.contains(&PathBuf::from("/some/other/dir")));
        unsafe {
            env::remove_var("TERMINFO_DIRS");
        }
    }
}
