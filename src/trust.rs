//! Edits to the speaker's CA bundle: one labeled block holding the local CA.

/// Line written before and after our certificate inside the bundle.
pub const CA_LABEL: &str = "# speaker-migrate local CA";

const SNIPPET_LEN: usize = 48;

/// A stretch of the certificate's base64 body, used when the label is missing.
fn body_snippet(ca_pem: &str) -> Option<String> {
    let body: String = ca_pem
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("-----"))
        .collect();
    if body.is_empty() {
        return None;
    }
    // Skip the prefix shared by most certificates.
    let start = body.len().saturating_sub(SNIPPET_LEN) / 2;
    body.get(start..start + SNIPPET_LEN.min(body.len()))
        .map(str::to_string)
}

/// Whether `bundle` already trusts `ca_pem`.
pub fn is_trusted(bundle: &str, ca_pem: &str) -> bool {
    if bundle.lines().any(|l| l.trim() == CA_LABEL) {
        return true;
    }
    body_snippet(ca_pem)
        .map(|snippet| bundle.contains(&snippet))
        .unwrap_or(false)
}

/// Drop every labeled block. Returns the new text and whether anything was removed.
pub fn remove_block(bundle: &str) -> (String, bool) {
    let mut inside = false;
    let mut changed = false;
    let mut out = String::with_capacity(bundle.len());

    for line in bundle.lines() {
        if line.trim() == CA_LABEL {
            inside = !inside;
            changed = true;
            continue;
        }
        if inside {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }

    if !changed {
        return (bundle.to_string(), false);
    }
    (out, true)
}

/// Replace any existing labeled block with a fresh one holding `ca_pem`.
pub fn inject_block(bundle: &str, ca_pem: &str) -> String {
    let (mut out, _) = remove_block(bundle);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(CA_LABEL);
    out.push('\n');
    out.push_str(ca_pem.trim());
    out.push('\n');
    out.push_str(CA_LABEL);
    out.push('\n');
    out
}
