//! Minimal distinguished-name handling: enough to normalise names for lookup
//! and to walk from an entry to its parent.

/// Splits a DN into its RDN components, honouring `\` escapes.
pub fn components(dn: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for ch in dn.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' => {
                current.push(ch);
                escaped = true;
            }
            ',' | ';' => {
                parts.push(normalize_rdn(&current));
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    let last = normalize_rdn(&current);
    if !last.is_empty() || !parts.is_empty() {
        parts.push(last);
    }
    parts
}

fn normalize_rdn(rdn: &str) -> String {
    match rdn.split_once('=') {
        Some((attr, value)) => format!(
            "{}={}",
            attr.trim().to_ascii_lowercase(),
            value.trim().to_lowercase()
        ),
        None => rdn.trim().to_lowercase(),
    }
}

/// Canonical form used as a lookup key.
pub fn normalize(dn: &str) -> String {
    components(dn).join(",")
}

/// Parent of `dn`, or `None` for a single-component name.
pub fn parent(dn: &str) -> Option<String> {
    let parts = components(dn);
    if parts.len() <= 1 {
        return None;
    }
    Some(parts[1..].join(","))
}

/// Resolves `name` relative to `base`; an empty base means the absolute root.
pub fn resolve(name: &str, base: &str) -> String {
    let name = normalize(name);
    let base = normalize(base);
    match (name.is_empty(), base.is_empty()) {
        (true, _) => base,
        (false, true) => name,
        (false, false) => format!("{},{}", name, base),
    }
}

/// Whether `dn` equals `suffix` or lies beneath it.
pub fn is_within(dn: &str, suffix: &str) -> bool {
    let dn = components(dn);
    let suffix = components(suffix);
    if suffix.is_empty() {
        return true;
    }
    dn.len() >= suffix.len() && dn[dn.len() - suffix.len()..] == suffix[..]
}
