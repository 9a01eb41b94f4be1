use crate::config::ModelMap;

/// Resolves a client-supplied model name to the upstream model name.
///
/// Lookup order: exact match (case-folded, trimmed) → unique prefix match →
/// configured default. Ties on the prefix match (more than one configured
/// key prefixes the input) are treated as "no unique match" and fall
/// through to the default, not an error.
pub fn resolve_model(input: &str, map: &ModelMap, default: Option<&str>) -> String {
    let normalized = input.trim().to_lowercase();

    if let Some(exact) = map.0.get(&normalized) {
        return exact.clone();
    }

    let mut matches = map.0.iter().filter(|(key, _)| normalized.starts_with(key.as_str()));

    if let Some((_, value)) = matches.next() {
        if matches.next().is_none() {
            return value.clone();
        }
    }

    default.map(str::to_string).unwrap_or_else(|| input.to_string())
}
