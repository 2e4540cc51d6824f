/// Why an artifact name was rejected.
#[derive(Debug, PartialEq, Eq)]
pub enum NameError {
    /// Nothing left after trimming whitespace.
    Empty,
    /// `/` or `\` would introduce a directory component.
    ContainsPathSeparator,
    /// The name is exactly `..`.
    PathTraversal,
    NullByte,
    /// A leading dot would collide with the store's own entries.
    Hidden,
    ControlCharacter,
}

impl NameError {
    /// Human-readable rejection reason.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Artifact name is empty",
            Self::ContainsPathSeparator => "Artifact name must not contain '/' or '\\'",
            Self::PathTraversal => "Artifact name must not be '..'",
            Self::NullByte => "Artifact name must not contain null bytes",
            Self::Hidden => "Artifact name must not start with '.'",
            Self::ControlCharacter => "Artifact name must not contain control characters",
        }
    }
}

/// Validates a flat artifact name (no directory components allowed).
///
/// Artifacts live directly under the store's base directory; anything that
/// could escape it or collide with the temp area is rejected.
pub fn validate_flat_name(name: &str) -> Result<&str, NameError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(NameError::Empty);
    }

    if trimmed.contains('\0') {
        return Err(NameError::NullByte);
    }

    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(NameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(NameError::ContainsPathSeparator);
    }

    if trimmed == ".." {
        return Err(NameError::PathTraversal);
    }

    if trimmed.starts_with('.') {
        return Err(NameError::Hidden);
    }

    Ok(trimmed)
}
