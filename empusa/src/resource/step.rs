//! Declarative install steps.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::validate_relative_path;

/// File placement operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InstallOperation {
    /// Overlay the whole extracted asset onto the volume root.
    MergeAll,
    /// Overlay one directory of the asset onto a directory of the volume.
    MergeDir,
    /// Move a single file from the asset into the volume.
    MoveFile,
}

impl InstallOperation {
    /// Name used in catalog documents.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MergeAll => "mergeAll",
            Self::MergeDir => "mergeDir",
            Self::MoveFile => "moveFile",
        }
    }
}

impl fmt::Display for InstallOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One file placement operation of an install procedure.
///
/// `origin` is relative to the extracted asset root and `destination` to the
/// volume root. Both are present for [`InstallOperation::MergeDir`] and
/// [`InstallOperation::MoveFile`], and absent for
/// [`InstallOperation::MergeAll`]. Steps decoded from a catalog are validated
/// on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInstallStep")]
pub struct InstallStep {
    pub operation: InstallOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

impl InstallStep {
    /// Overlay the whole asset onto the volume root.
    pub fn merge_all() -> Self {
        Self {
            operation: InstallOperation::MergeAll,
            origin: None,
            destination: None,
        }
    }

    /// Overlay `origin` onto `destination`.
    pub fn merge_dir(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            operation: InstallOperation::MergeDir,
            origin: Some(origin.into()),
            destination: Some(destination.into()),
        }
    }

    /// Move the file at `origin` to `destination`.
    ///
    /// A destination ending in `/` is a directory the file is moved into.
    pub fn move_file(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            operation: InstallOperation::MoveFile,
            origin: Some(origin.into()),
            destination: Some(destination.into()),
        }
    }

    /// Check the origin/destination shape required by the operation.
    pub fn validate(&self) -> Result<(), String> {
        match self.operation {
            InstallOperation::MergeAll => {
                if self.origin.is_some() || self.destination.is_some() {
                    return Err("mergeAll takes no origin or destination".to_string());
                }
            }
            InstallOperation::MergeDir | InstallOperation::MoveFile => {
                let origin = self
                    .origin
                    .as_deref()
                    .ok_or_else(|| format!("{} requires an origin", self.operation))?;
                let destination = self
                    .destination
                    .as_deref()
                    .ok_or_else(|| format!("{} requires a destination", self.operation))?;
                validate_relative_path(origin)?;
                validate_relative_path(destination)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.origin, &self.destination) {
            (Some(origin), Some(destination)) => {
                write!(f, "{} {} -> {}", self.operation, origin, destination)
            }
            _ => write!(f, "{}", self.operation),
        }
    }
}

#[derive(Deserialize)]
struct RawInstallStep {
    operation: InstallOperation,
    #[serde(default)]
    origin: Option<String>,
    #[serde(default)]
    destination: Option<String>,
}

impl TryFrom<RawInstallStep> for InstallStep {
    type Error = String;

    fn try_from(raw: RawInstallStep) -> Result<Self, Self::Error> {
        let step = InstallStep {
            operation: raw.operation,
            origin: raw.origin,
            destination: raw.destination,
        };
        step.validate()?;
        Ok(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_merge_all() {
        let step: InstallStep = serde_json::from_str(r#"{"operation":"mergeAll"}"#).unwrap();
        assert_eq!(step, InstallStep::merge_all());
    }

    #[test]
    fn test_parse_merge_dir() {
        let step: InstallStep = serde_json::from_str(
            r#"{"operation":"mergeDir","origin":"bootloader","destination":"bootloader"}"#,
        )
        .unwrap();
        assert_eq!(step, InstallStep::merge_dir("bootloader", "bootloader"));
    }

    #[test]
    fn test_move_file_requires_origin_and_destination() {
        let result: Result<InstallStep, _> =
            serde_json::from_str(r#"{"operation":"moveFile","destination":"bootloader/"}"#);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("requires an origin"), "{}", err);

        let result: Result<InstallStep, _> =
            serde_json::from_str(r#"{"operation":"moveFile","origin":"a.bin"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_all_rejects_paths() {
        let result: Result<InstallStep, _> =
            serde_json::from_str(r#"{"operation":"mergeAll","origin":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let result: Result<InstallStep, _> = serde_json::from_str(
            r#"{"operation":"mergeDir","origin":"a","destination":"../../home"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_operation_is_rejected() {
        let result: Result<InstallStep, _> =
            serde_json::from_str(r#"{"operation":"deleteAll"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_omits_absent_paths() {
        let json = serde_json::to_string(&InstallStep::merge_all()).unwrap();
        assert_eq!(json, r#"{"operation":"mergeAll"}"#);
    }

    #[test]
    fn test_display() {
        assert_eq!(InstallStep::merge_all().to_string(), "mergeAll");
        assert_eq!(
            InstallStep::move_file("Lockpick_RCM.bin", "bootloader/payloads/").to_string(),
            "moveFile Lockpick_RCM.bin -> bootloader/payloads/"
        );
    }
}
