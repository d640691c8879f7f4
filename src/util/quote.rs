//! Quoting for the two command languages artifacts are written in: POSIX
//! shell (wrapper and phase scripts) and systemd's `Exec*=` / `Environment=`
//! syntax.

fn is_plain(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '_' | '-' | '.' | '/' | ':' | '=' | ',' | '@' | '+')
        })
}

/// Quote a word for a POSIX shell.
pub fn shell(s: &str) -> String {
    if is_plain(s) {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Escape systemd specifiers and variable references inside a value.
fn systemd_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str(r"\\"),
            '"' => out.push_str("\\\""),
            '%' => out.push_str("%%"),
            '$' => out.push_str("$$"),
            _ => out.push(c),
        }
    }
    out
}

/// Quote a single argument of an `Exec*=` line.
pub fn systemd_arg(s: &str) -> String {
    if is_plain(s) {
        return s.to_string();
    }
    format!("\"{}\"", systemd_escape(s))
}

/// Escape specifiers in a caller-supplied option string. Whitespace and
/// quotes are kept so systemd still splits it into words.
pub fn systemd_verbatim(s: &str) -> String {
    s.replace('%', "%%")
}

/// Render one `Environment=` assignment.
pub fn systemd_env(key: &str, value: &str) -> String {
    let pair = format!("{}={}", key, value);
    // `$` is not expanded in Environment=, only specifiers are.
    let escaped = systemd_escape(&pair).replace("$$", "$");
    format!("\"{}\"", escaped)
}
