//! Target platform of a bundle

use crate::errors::{io_error, ReleaseError, Result};
use std::path::Path;

const ANDROID_BUNDLE_SUFFIX: &str = ".android.bundle";

/// Platform a release is published for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    /// Parse the declared platform tag (`android` / `ios`)
    pub fn parse(tag: &str) -> std::result::Result<Self, ReleaseError> {
        match tag {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => Err(ReleaseError::UnsupportedPlatform {
                tag: other.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }

    /// Detect the platform of an extracted bundle
    ///
    /// A bundle is Android iff its top-level directory holds a
    /// `*.android.bundle` file; anything else is treated as iOS.
    pub fn detect(bundle_dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(bundle_dir).map_err(|e| io_error("detect_platform", e))?;
        for entry in entries {
            let entry = entry.map_err(|e| io_error("detect_platform", e))?;
            if entry
                .file_name()
                .to_string_lossy()
                .ends_with(ANDROID_BUNDLE_SUFFIX)
            {
                return Ok(Platform::Android);
            }
        }
        Ok(Platform::Ios)
    }

    /// Fail unless the bundle at `bundle_dir` matches this platform
    pub fn verify_bundle(&self, bundle_dir: &Path) -> Result<()> {
        let detected = Self::detect(bundle_dir)?;
        if detected != *self {
            return Err(ReleaseError::PlatformMismatch {
                declared: self.as_str().to_string(),
                detected: detected.as_str().to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_parse_known_tags() {
        assert_eq!(Platform::parse("android").unwrap(), Platform::Android);
        assert_eq!(Platform::parse("ios").unwrap(), Platform::Ios);
        assert!(Platform::parse("windows").is_err());
    }

    #[test]
    fn test_detect_android_bundle() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.android.bundle"), b"x").unwrap();
        assert_eq!(Platform::detect(dir.path()).unwrap(), Platform::Android);
    }

    #[test]
    fn test_detect_ios_bundle() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.jsbundle"), b"x").unwrap();
        assert_eq!(Platform::detect(dir.path()).unwrap(), Platform::Ios);
    }

    #[test]
    fn test_nested_android_bundle_is_not_detected() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/index.android.bundle"), b"x").unwrap();
        assert_eq!(Platform::detect(dir.path()).unwrap(), Platform::Ios);
    }

    #[test]
    fn test_verify_rejects_ios_bundle_declared_android() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.jsbundle"), b"x").unwrap();

        let err = Platform::Android.verify_bundle(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::PlatformMismatch);
        assert!(Platform::Ios.verify_bundle(dir.path()).is_ok());
    }
}
