use serde::{Deserialize, Serialize};

/// A named release channel for one application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: i64,
    pub name: String,
    pub deployment_key: String,
    /// Last label number handed out (labels are `v{label_id}`)
    pub label_id: i64,
    /// Most recent DeploymentVersion touched by a release (0 = none)
    pub last_deployment_version_id: i64,
    pub created_at: i64,
}

/// Releasable state of one (deployment, app version) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentVersion {
    pub id: i64,
    pub deployment_id: i64,
    pub app_version: String,
    pub is_mandatory: bool,
    /// Current Package id; values <= 0 mean no release yet
    pub current_package_id: i64,
    pub created_at: i64,
}

impl DeploymentVersion {
    /// The current Package id, if a release has been committed
    pub fn current_package(&self) -> Option<i64> {
        (self.current_package_id > 0).then_some(self.current_package_id)
    }
}
