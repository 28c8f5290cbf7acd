//! Built-in capability tables used when no compiled terminfo database can
//! be found on disk, so a terminal can still be driven in a minimal
//! container or stripped-down CI image.

use std::collections::HashMap;

use crate::parser::CapabilityTable;

/// Names of the built-in fallback tables, in the order they're tried.
pub const FALLBACK_NAMES: [&str; 2] = ["xterm", "linux"];

/// Return a built-in capability table for one of [`FALLBACK_NAMES`], or
/// `None` if `term` doesn't name a known fallback.
#[must_use]
pub fn lookup(term: &str) -> Option<CapabilityTable> {
    match term {
        "xterm" | "xterm-256color" => Some(xterm_table()),
        "linux" => Some(linux_table()),
        _ => None,
    }
}

fn entries(pairs: &[(&'static str, &str)]) -> CapabilityTable {
    let mut table = HashMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        table.insert(*name, value.as_bytes().to_vec());
    }
    table
}

fn xterm_table() -> CapabilityTable {
    entries(&[
        ("cup", "\x1b[%i%p1%d;%p2%dH"),
        ("cuu1", "\x1b[A"),
        ("cud1", "\n"),
        ("cuf1", "\x1b[C"),
        ("cub1", "\x08"),
        ("home", "\x1b[H"),
        ("clear", "\x1b[H\x1b[2J"),
        ("el", "\x1b[K"),
        ("ed", "\x1b[J"),
        ("bold", "\x1b[1m"),
        ("dim", "\x1b[2m"),
        ("smul", "\x1b[4m"),
        ("rmul", "\x1b[24m"),
        ("blink", "\x1b[5m"),
        ("rev", "\x1b[7m"),
        ("invis", "\x1b[8m"),
        ("sgr0", "\x1b[m\x0f"),
        ("smso", "\x1b[7m"),
        ("rmso", "\x1b[27m"),
        ("smcup", "\x1b[?1049h"),
        ("rmcup", "\x1b[?1049l"),
        ("civis", "\x1b[?25l"),
        ("cnorm", "\x1b[?12l\x1b[?25h"),
        ("cvvis", "\x1b[?12;25h"),
        (
            "setaf",
            "\x1b[%?%p1%{8}%<%t3%p1%d%e%p1%{16}%<%t9%p1%{8}%-%d%e38;5;%p1%d%;m",
        ),
        (
            "setab",
            "\x1b[%?%p1%{8}%<%t4%p1%d%e%p1%{16}%<%t10%p1%{8}%-%d%e48;5;%p1%d%;m",
        ),
        ("op", "\x1b[39;49m"),
        ("smkx", "\x1b[?1h\x1b="),
        ("rmkx", "\x1b[?1l\x1b>"),
        ("kcuu1", "\x1bOA"),
        ("kcud1", "\x1bOB"),
        ("kcuf1", "\x1bOC"),
        ("kcub1", "\x1bOD"),
        ("kf1", "\x1bOP"),
        ("kf2", "\x1bOQ"),
        ("kf3", "\x1bOR"),
        ("kf4", "\x1bOS"),
        ("khome", "\x1bOH"),
        ("kend", "\x1bOF"),
        ("kbs", "\x7f"),
        ("kdch1", "\x1b[3~"),
        ("smam", "\x1b[?7h"),
        ("rmam", "\x1b[?7l"),
    ])
}

fn linux_table() -> CapabilityTable {
    let mut table = xterm_table();
    // The Linux console lacks alternate-screen support and uses BIOS-style
    // function key sequences.
    table.remove("smcup");
    table.remove("rmcup");
    table.insert("kf1".into(), b"\x1b[[A".to_vec());
    table.insert("kf2".into(), b"\x1b[[B".to_vec());
    table.insert("kf3".into(), b"\x1b[[C".to_vec());
    table.insert("kf4".into(), b"\x1b[[D".to_vec());
    table.insert("kf5".into(), b"\x1b[[E".to_vec());
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xterm_has_core_capabilities() {
        let table = lookup("xterm").unwrap();
        assert!(table.contains_key("cup"));
        assert!(table.contains_key("sgr0"));
        assert!(table.contains_key("setaf"));
    }

    #[test]
    fn linux_drops_alternate_screen() {
        let table = lookup("linux").unwrap();
        assert!(!table.contains_key("smcup"));
        assert!(table.contains_key("cup"));
    }

    #[test]
    fn unknown_term_has_no_fallback() {
        assert!(lookup("not-a-real-term").is_none());
    }
}
