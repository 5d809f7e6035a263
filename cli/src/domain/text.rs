//! Line-oriented editing of remote text files.
//!
//! Every edit is expressed as a pure `existing -> updated` transformation so a
//! stage can read a file, patch it locally, and write the result back. Applying
//! the same edit twice yields the same file.

/// Replace (or append) a block delimited by `# BEGIN <marker>` / `# END <marker>`.
///
/// Lines outside the block are preserved. An unterminated block is treated as
/// running to the end of the file.
#[must_use]
pub fn replace_managed_block(existing: &str, marker: &str, body: &[String]) -> String {
    let begin = format!("# BEGIN {marker}");
    let end = format!("# END {marker}");

    let mut kept: Vec<&str> = Vec::new();
    let mut inside = false;
    for line in existing.lines() {
        if line.trim() == begin {
            inside = true;
        } else if inside && line.trim() == end {
            inside = false;
        } else if !inside {
            kept.push(line);
        }
    }
    while kept.last().is_some_and(|l| l.trim().is_empty()) {
        kept.pop();
    }

    let mut out = String::new();
    for line in kept {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&begin);
    out.push('\n');
    for line in body {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&end);
    out.push('\n');
    out
}

/// Append `line` unless an identical line is already present.
#[must_use]
pub fn ensure_line(existing: &str, line: &str) -> String {
    if existing.lines().any(|l| l.trim_end() == line.trim_end()) {
        return existing.to_string();
    }
    let mut out = existing.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(line.trim_end());
    out.push('\n');
    out
}

/// Keep comments and blank lines of a worker list, replace every host line.
#[must_use]
pub fn replace_worker_list(existing: &str, hosts: &[String]) -> String {
    let mut out = String::new();
    for line in existing.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            out.push_str(line);
            out.push('\n');
        }
    }
    for host in hosts {
        out.push_str(host);
        out.push('\n');
    }
    out
}

/// Quote `s` for a POSIX shell.
#[must_use]
pub fn shell_quote(s: &str) -> String {
    if !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@+,%".contains(c))
    {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}
