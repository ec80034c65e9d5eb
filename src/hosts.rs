//! Pure hosts-file rewriting for the hosts redirect.

use crate::paths::VENDOR_DOMAINS;

fn is_vendor_domain(name: &str) -> bool {
    VENDOR_DOMAINS
        .iter()
        .any(|domain| domain.eq_ignore_ascii_case(name))
}

/// Split a hosts line into (address, names), ignoring blanks and comments.
fn parse_entry(line: &str) -> Option<(&str, Vec<&str>)> {
    let content = line.split('#').next().unwrap_or_default().trim();
    if content.is_empty() {
        return None;
    }
    let mut fields = content.split_whitespace();
    let addr = fields.next()?;
    let names: Vec<&str> = fields.collect();
    if names.is_empty() {
        return None;
    }
    Some((addr, names))
}

/// Hosts body that maps every vendor domain to `ip`.
pub fn planned_hosts(ip: &str) -> String {
    let mut out = String::from("127.0.0.1\tlocalhost\n");
    for domain in VENDOR_DOMAINS {
        out.push_str(&format!("{ip}\t{domain}\n"));
    }
    out
}

/// Point vendor entries at `ip`, leave every other line alone, and append missing vendor domains.
pub fn rewrite_hosts(current: &str, ip: &str) -> String {
    let mut seen: Vec<String> = Vec::new();
    let mut lines: Vec<String> = Vec::new();

    for line in current.lines() {
        match parse_entry(line) {
            Some((_, names)) if names.iter().any(|n| is_vendor_domain(n)) => {
                seen.extend(names.iter().map(|n| n.to_ascii_lowercase()));
                let mut rewritten = format!("{ip}\t{}", names.join(" "));
                if let Some(at) = line.find('#') {
                    rewritten.push(' ');
                    rewritten.push_str(&line[at..]);
                }
                lines.push(rewritten);
            }
            _ => lines.push(line.to_string()),
        }
    }

    for domain in VENDOR_DOMAINS {
        if !seen.iter().any(|s| s == domain) {
            lines.push(format!("{ip}\t{domain}"));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// True if any active entry names a vendor domain.
pub fn mentions_vendor_domain(text: &str) -> bool {
    text.lines()
        .filter_map(parse_entry)
        .any(|(_, names)| names.iter().any(|n| is_vendor_domain(n)))
}

/// Append a single `ip host` entry.
pub fn add_entry(current: &str, ip: &str, host: &str) -> String {
    let mut out = current.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!("{ip}\t{host}\n"));
    out
}

/// Drop every active entry naming `host`.
pub fn remove_entries(current: &str, host: &str) -> String {
    let mut out = String::new();
    for line in current.lines() {
        if let Some((_, names)) = parse_entry(line) {
            if names.iter().any(|n| n.eq_ignore_ascii_case(host)) {
                continue;
            }
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}
