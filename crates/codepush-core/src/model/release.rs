//! Release parameters and labels

use serde::{Deserialize, Serialize};

/// Provenance tag recorded on every Package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReleaseMethod {
    /// Fresh bundle uploaded by a developer
    #[default]
    Upload,
    /// Copied from another deployment
    Promote,
    /// Re-release of an earlier package
    Rollback,
}

impl ReleaseMethod {
    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseMethod::Upload => "Upload",
            ReleaseMethod::Promote => "Promote",
            ReleaseMethod::Rollback => "Rollback",
        }
    }

    /// Parse the stored representation; unknown tags yield `None`
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Upload" => Some(ReleaseMethod::Upload),
            "Promote" => Some(ReleaseMethod::Promote),
            "Rollback" => Some(ReleaseMethod::Rollback),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReleaseMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for one release
///
/// Defaults: `Upload`, actor `0`, not mandatory, size `0`, empty
/// description, no lineage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseParams {
    pub release_method: ReleaseMethod,
    /// Releasing actor id
    pub release_uid: i64,
    pub is_mandatory: bool,
    /// Size in bytes of the full bundle blob
    pub size: i64,
    pub description: String,
    /// Label of the package this one was promoted/rolled back from
    pub original_label: Option<String>,
    /// Deployment name the package was promoted from
    pub original_deployment: Option<String>,
}

/// Format the human label for sequence number `n`
pub fn format_label(n: i64) -> String {
    format!("v{}", n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_method_round_trips_through_storage_tag() {
        for m in [
            ReleaseMethod::Upload,
            ReleaseMethod::Promote,
            ReleaseMethod::Rollback,
        ] {
            assert_eq!(ReleaseMethod::parse(m.as_str()), Some(m));
        }
        assert_eq!(ReleaseMethod::parse("upload"), None);
    }

    #[test]
    fn test_release_params_defaults() {
        let p = ReleaseParams::default();
        assert_eq!(p.release_method, ReleaseMethod::Upload);
        assert_eq!(p.release_uid, 0);
        assert!(!p.is_mandatory);
        assert_eq!(p.size, 0);
        assert!(p.description.is_empty());
        assert!(p.original_label.is_none());
        assert!(p.original_deployment.is_none());
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1), "v1");
        assert_eq!(format_label(42), "v42");
    }
}
