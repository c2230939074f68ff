use std::fmt;

use bstr::{BStr, BString, ByteSlice};

use crate::error::RefError;

/// A validated reference name.
///
/// Enforces the rules from `git-check-ref-format(1)`:
/// - No double dots `..`
/// - No ASCII control characters or space, `~`, `^`, `:`, `?`, `*`, `[`, `\`
/// - Cannot begin or end with `/`, or contain `//`
/// - Cannot end with `.` or `.lock`
/// - Cannot contain `@{`, or be the single character `@`
/// - Cannot contain a NUL byte
/// - No component may start with `.`
///
/// `HEAD` and friends are valid without a `/`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefName(BString);

/// Characters forbidden anywhere in a ref name.
const FORBIDDEN_CHARS: &[u8] = b" ~^:?*[\\";

/// Special ref names that are valid without a `/`.
const SPECIAL_REFS: &[&str] = &["HEAD", "ORIG_HEAD", "FETCH_HEAD"];

impl RefName {
    /// Create and validate a ref name.
    pub fn new(name: impl Into<BString>) -> Result<Self, RefError> {
        let name = name.into();
        validate_ref_name(&name)?;
        Ok(Self(name))
    }

    /// Get the short name (e.g., `main` from `refs/heads/main`).
    pub fn short_name(&self) -> &BStr {
        let s = self.0.as_bstr();
        if let Some(rest) = s.strip_prefix(b"refs/heads/") {
            rest.as_bstr()
        } else if let Some(rest) = s.strip_prefix(b"refs/tags/") {
            rest.as_bstr()
        } else if let Some(rest) = s.strip_prefix(b"refs/remotes/") {
            rest.as_bstr()
        } else {
            s
        }
    }

    /// Is this under `refs/heads/`?
    pub fn is_branch(&self) -> bool {
        self.0.starts_with(b"refs/heads/")
    }

    /// Is this under `refs/remotes/`?
    pub fn is_remote(&self) -> bool {
        self.0.starts_with(b"refs/remotes/")
    }

    /// Get as a string slice (ref names are always valid UTF-8 in practice).
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("<invalid-utf8>")
    }
}

impl AsRef<BStr> for RefName {
    fn as_ref(&self) -> &BStr {
        self.0.as_bstr()
    }
}

impl fmt::Display for RefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate a ref name per git-check-ref-format rules.
fn validate_ref_name(name: &[u8]) -> Result<(), RefError> {
    let name_str = || String::from_utf8_lossy(name).into_owned();

    if name.is_empty() {
        return Err(RefError::InvalidName("ref name is empty".into()));
    }

    if name.contains(&0) {
        return Err(RefError::InvalidName(format!(
            "'{}': contains NUL byte",
            name_str()
        )));
    }

    if name == b"@" {
        return Err(RefError::InvalidName("'@' is not a valid ref name".into()));
    }

    for (i, &b) in name.iter().enumerate() {
        if b < 0x20 || b == 0x7f {
            return Err(RefError::InvalidName(format!(
                "'{}': contains control character at position {}",
                name_str(),
                i
            )));
        }
        if FORBIDDEN_CHARS.contains(&b) {
            return Err(RefError::InvalidName(format!(
                "'{}': contains forbidden character '{}' at position {}",
                name_str(),
                b as char,
                i
            )));
        }
    }

    if name.starts_with(b"/") || name.ends_with(b"/") {
        return Err(RefError::InvalidName(format!(
            "'{}': begins or ends with '/'",
            name_str()
        )));
    }

    if name.ends_with(b".") {
        return Err(RefError::InvalidName(format!(
            "'{}': ends with '.'",
            name_str()
        )));
    }

    if name.find(b"..").is_some() {
        return Err(RefError::InvalidName(format!(
            "'{}': contains '..'",
            name_str()
        )));
    }

    if name.find(b"//").is_some() {
        return Err(RefError::InvalidName(format!(
            "'{}': contains '//'",
            name_str()
        )));
    }

    if name.find(b"@{").is_some() {
        return Err(RefError::InvalidName(format!(
            "'{}': contains '@{{'",
            name_str()
        )));
    }

    for component in name.split_str(b"/") {
        if component.starts_with(b".") {
            return Err(RefError::InvalidName(format!(
                "'{}': component starts with '.'",
                name_str()
            )));
        }
        if component.ends_with(b".lock") {
            return Err(RefError::InvalidName(format!(
                "'{}': component ends with '.lock'",
                name_str()
            )));
        }
    }

    // Full refs need a '/'; special top-level names are exempt.
    if !name.contains(&b'/') {
        let s = String::from_utf8_lossy(name);
        if !SPECIAL_REFS.contains(&s.as_ref()) {
            return Err(RefError::InvalidName(format!(
                "'{}': single-level names are reserved for HEAD and friends",
                name_str()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        for name in [
            "refs/heads/main",
            "refs/heads/feature/nested",
            "refs/remotes/origin/master",
            "refs/tags/v1.0.0",
            "HEAD",
            "FETCH_HEAD",
        ] {
            assert!(RefName::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn invalid_names() {
        for name in [
            "",
            "@",
            "refs/heads/with space",
            "refs/heads/double..dot",
            "refs/heads/trailing.",
            "refs/heads/trailing.lock",
            "refs/heads//double-slash",
            "/refs/heads/lead",
            "refs/heads/trail/",
            "refs/heads/.hidden",
            "refs/heads/ref@{0}",
            "refs/heads/col:on",
            "refs/heads/ast*erisk",
            "not-a-special-name",
        ] {
            assert!(RefName::new(name).is_err(), "{name:?} should be invalid");
        }
    }

    #[test]
    fn short_name() {
        assert_eq!(
            RefName::new("refs/heads/main").unwrap().short_name(),
            "main"
        );
        assert_eq!(
            RefName::new("refs/remotes/origin/dev").unwrap().short_name(),
            "origin/dev"
        );
        assert_eq!(RefName::new("HEAD").unwrap().short_name(), "HEAD");
    }

    #[test]
    fn predicates() {
        assert!(RefName::new("refs/heads/main").unwrap().is_branch());
        assert!(!RefName::new("refs/tags/v1").unwrap().is_branch());
        assert!(RefName::new("refs/remotes/origin/main").unwrap().is_remote());
    }

    #[test]
    fn display() {
        let name = RefName::new("refs/heads/main").unwrap();
        assert_eq!(name.to_string(), "refs/heads/main");
    }
}
