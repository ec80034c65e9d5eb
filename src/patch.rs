//! Marker-guarded text patches for the DNS hook.
//!
//! Every function here is pure: it takes the current file text and returns the
//! new text plus whether anything changed. Callers decide whether to upload.

use crate::paths::{DHCP_SCRIPTS, PRIORITY_NAMESERVER, RESOLV_CONF};

pub const HOOK_BEGIN: &str = "# speaker-migrate: dns hook";
pub const HOOK_END: &str = "# end speaker-migrate dns hook";
pub const BOOT_BEGIN: &str = "# speaker-migrate: dns boot hook";
pub const BOOT_END: &str = "# end speaker-migrate dns boot hook";

const HEREDOC_TAG: &str = "SPEAKER_MIGRATE_HOOK";

/// Snippet appended to DHCP client scripts: prepend the priority nameserver to resolv.conf.
pub fn hook_snippet() -> String {
    [
        HOOK_BEGIN.to_string(),
        format!("if [ -s {PRIORITY_NAMESERVER} ]; then"),
        format!(
            "    {{ cat {PRIORITY_NAMESERVER}; grep -v -x -F -f {PRIORITY_NAMESERVER} {RESOLV_CONF}; }} > /tmp/resolv.conf.merged"
        ),
        format!("    cat /tmp/resolv.conf.merged > {RESOLV_CONF}"),
        "fi".to_string(),
        HOOK_END.to_string(),
    ]
    .join("\n")
}

/// Block appended to the boot script: reinstall the hook into DHCP scripts on every boot.
pub fn boot_block() -> String {
    let mut lines = vec![
        BOOT_BEGIN.to_string(),
        format!("for script in {}; do", DHCP_SCRIPTS.join(" ")),
        format!("    if [ -f \"$script\" ] && ! grep -q '{HOOK_BEGIN}' \"$script\"; then"),
        format!("        cat >> \"$script\" <<'{HEREDOC_TAG}'"),
    ];
    lines.push(hook_snippet());
    lines.push(HEREDOC_TAG.to_string());
    lines.push("    fi".to_string());
    lines.push("done".to_string());
    lines.push(BOOT_END.to_string());
    lines.join("\n")
}

/// Whether stored text is really the error output of an earlier failed read.
pub fn looks_like_read_error(text: &str) -> bool {
    let trimmed = text.trim_start();
    trimmed.starts_with("cat:")
        || trimmed.contains("No such file or directory")
        || trimmed.contains("can't open")
}

fn join_lines(lines: &[&str], trailing_newline: bool) -> String {
    let mut out = lines.join("\n");
    if trailing_newline && !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Insert the DHCP hook, before a final `exit 0` if the script ends with one.
pub fn patch_dhcp_script(current: &str) -> (String, bool) {
    if current.contains(HOOK_BEGIN) {
        return (current.to_string(), false);
    }

    let snippet = hook_snippet();
    let mut lines: Vec<&str> = current.lines().collect();
    let last_content = lines.iter().rposition(|l| !l.trim().is_empty());

    match last_content {
        Some(idx) if lines[idx].trim() == "exit 0" => {
            lines.insert(idx, snippet.as_str());
        }
        _ => lines.push(snippet.as_str()),
    }
    (join_lines(&lines, true), true)
}

/// Append the boot block once. A stored read-error placeholder is discarded first.
pub fn patch_boot_script(current: &str) -> (String, bool) {
    let base = if looks_like_read_error(current) {
        ""
    } else {
        current
    };
    if base.contains(BOOT_BEGIN) {
        return (base.to_string(), base != current);
    }

    let mut out = if base.trim().is_empty() {
        String::from("#!/bin/sh\n")
    } else {
        let mut existing = base.to_string();
        if !existing.ends_with('\n') {
            existing.push('\n');
        }
        existing
    };
    out.push_str(&boot_block());
    out.push('\n');
    (out, true)
}

/// Remove every block opened by a line equal to `begin` through the next line equal to `end`.
pub fn strip_block(current: &str, begin: &str, end: &str) -> (String, bool) {
    let mut kept: Vec<&str> = Vec::new();
    let mut inside = false;
    let mut changed = false;

    for line in current.lines() {
        let trimmed = line.trim();
        if !inside && trimmed == begin {
            inside = true;
            changed = true;
            continue;
        }
        if inside {
            if trimmed == end {
                inside = false;
            }
            continue;
        }
        kept.push(line);
    }

    if !changed {
        return (current.to_string(), false);
    }
    (join_lines(&kept, current.ends_with('\n')), true)
}

pub fn strip_dhcp_hook(current: &str) -> (String, bool) {
    strip_block(current, HOOK_BEGIN, HOOK_END)
}

/// Remove the boot block; a read-error placeholder is dropped wholesale.
pub fn strip_boot_hook(current: &str) -> (String, bool) {
    if looks_like_read_error(current) {
        return (String::new(), true);
    }
    strip_block(current, BOOT_BEGIN, BOOT_END)
}
