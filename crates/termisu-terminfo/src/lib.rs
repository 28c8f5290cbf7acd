//! Terminfo database discovery, binary decoding, and parametrized string
//! evaluation.
//!
//! This crate covers three independent pieces that together answer "what
//! escape sequence turns on bold on this terminal": finding the compiled
//! terminfo file for `$TERM` ([`loader`]), decoding it into a capability
//! name to byte-string map ([`parser`]), and running capabilities that take
//! parameters (`cup`, `setaf`, ...) through the tparm stack machine
//! ([`tparm`]). [`fallback`] supplies built-in tables for the two terminal
//! types that show up even when no terminfo database is installed.

pub mod fallback;
pub mod loader;
pub mod names;
pub mod parser;
pub mod tparm;

use std::fmt;

use loader::{NotFound, TerminfoSource};
use parser::{CapabilityTable, ParseError};

/// Failure to resolve any capability table for a terminal name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    NotFound(NotFound),
    Parse(ParseError),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NotFound(e) => write!(f, "{e}"),
            ResolveError::Parse(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ResolveError {}

/// A resolved capability table together with where it came from.
pub struct Database {
    table: CapabilityTable,
    source: TerminfoSource,
}

impl Database {
    /// Resolve the capability table for `term`: try the compiled terminfo
    /// search path first, and fall back to a built-in table for `xterm` or
    /// `linux` if no compiled entry exists.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Parse`] if a compiled file was found but
    /// could not be decoded. Returns [`ResolveError::NotFound`] if no
    /// compiled file exists and `term` has no built-in fallback either.
    pub fn resolve(term: &str) -> Result<Self, ResolveError> {
        match loader::load(term) {
            Ok((path, bytes)) => {
                let table = parser::parse(&bytes).map_err(ResolveError::Parse)?;
                Ok(Database {
                    table,
                    source: TerminfoSource::Compiled(path),
                })
            }
            Err(not_found) => {
                for name in fallback::FALLBACK_NAMES {
                    if name == term {
                        return Ok(Database {
                            table: fallback::lookup(name).expect("name came from FALLBACK_NAMES"),
                            source: TerminfoSource::Fallback(name),
                        });
                    }
                }
                Err(ResolveError::NotFound(not_found))
            }
        }
    }

    /// Build a database directly from a built-in fallback table, bypassing
    /// the filesystem search. Useful for tests and for environments known
    /// in advance to have no terminfo database installed.
    #[must_use]
    pub fn from_fallback(name: &'static str) -> Option<Self> {
        fallback::lookup(name).map(|table| Database {
            table,
            source: TerminfoSource::Fallback(name),
        })
    }

    /// Where this database's data came from.
    #[must_use]
    pub fn source(&self) -> &TerminfoSource {
        &self.source
    }

    /// Raw, unevaluated template bytes for a capability, if present.
    #[must_use]
    pub fn raw(&self, capability: &str) -> Option<&[u8]> {
        self.table.get(capability).map(Vec::as_slice)
    }

    /// Whether the table carries a capability at all (booleans appear as
    /// an empty-length absence check at the caller; string capabilities
    /// with no parameters, like `sgr0`, are non-empty byte strings).
    #[must_use]
    pub fn has(&self, capability: &str) -> bool {
        self.table.contains_key(capability)
    }

    /// Evaluate a capability's template against `params` via [`tparm`],
    /// returning `None` if the capability is absent.
    #[must_use]
    pub fn parm(&self, capability: &str, params: &[i64]) -> Option<Vec<u8>> {
        let template = std::str::from_utf8(self.raw(capability)?).ok()?;
        Some(tparm::tparm(template, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_database_answers_known_capabilities() {
        let db = Database::from_fallback("xterm").unwrap();
        assert!(db.has("cup"));
        assert_eq!(db.parm("cup", &[0, 0]).unwrap(), b"\x1b[1;1H");
    }

    #[test]
    fn missing_capability_is_none() {
        let db = Database::from_fallback("xterm").unwrap();
        assert!(db.parm("definitely-not-a-cap", &[]).is_none());
    }

    #[test]
    fn resolve_falls_back_when_uninstalled() {
        // In a container without a terminfo database this still resolves
        // via the built-in xterm table.
        if loader::load("xterm").is_err() {
            let db = Database::resolve("xterm").unwrap();
            assert!(matches!(db.source(), TerminfoSource::Fallback("xterm")));
        }
    }
}
