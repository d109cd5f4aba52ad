//! Validation helpers for configuration and command-line values

/// Validate positive integer value
pub fn validate_positive_int(value: &str) -> Result<u64, String> {
    match value.parse::<u64>() {
        Ok(0) => Err("Value must be greater than 0".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{}' is not a valid positive integer", value)),
    }
}

/// Validate a ledger or asset base URL
///
/// Only http and https are accepted; a trailing slash is stripped so paths can
/// be appended uniformly.
pub fn validate_base_url(url: &str) -> Result<String, String> {
    let trimmed = url.trim();
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(format!(
            "Invalid URL scheme. Only http:// and https:// are supported: {}",
            trimmed
        ));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Validate a recognized identifier prefix
pub fn validate_prefix(prefix: &str) -> Result<String, String> {
    if prefix.trim().is_empty() {
        return Err("Identifier prefix cannot be empty".to_string());
    }
    if prefix.chars().any(char::is_whitespace) {
        return Err(format!("Identifier prefix '{}' contains whitespace", prefix));
    }
    Ok(prefix.to_string())
}

/// Validate an identifier pattern and return it anchored to the whole id
pub fn validate_id_pattern(pattern: &str) -> Result<regex::Regex, String> {
    let anchored = format!("^(?:{})$", pattern);
    regex::Regex::new(&anchored)
        .map_err(|e| format!("Invalid identifier pattern '{}': {}", pattern, e))
}

/// Validate a route prefix used by the cache policy
pub fn validate_route_prefix(route: &str) -> Result<String, String> {
    if !route.starts_with('/') {
        return Err(format!("Route '{}' must start with '/'", route));
    }
    Ok(route.to_string())
}
