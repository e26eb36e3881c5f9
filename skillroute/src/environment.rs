//! Host environment state used to gate commands.
//!
//! Commands can declare that they need an open workspace or a signed-in
//! Azure account. The coordinator checks a fresh [`EnvironmentSnapshot`]
//! before running one and answers with an explanation when it can't.

use serde::{Deserialize, Serialize};
use skillroute_api::CommandSpec;
use std::path::PathBuf;
use std::sync::RwLock;

/// State of the host at the moment a command is about to run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    /// Folders open in the IDE workspace
    #[serde(default)]
    pub workspace_folders: Vec<PathBuf>,

    /// Whether an Azure account is signed in
    #[serde(default)]
    pub signed_in: bool,
}

/// Precondition a command declared but the environment does not meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatingViolation {
    WorkspaceNotOpen,
    NotSignedIn,
}

impl GatingViolation {
    /// Explanation shown to the user instead of running `spec`
    pub fn message(&self, spec: &CommandSpec) -> String {
        match self {
            GatingViolation::WorkspaceNotOpen => format!(
                "**{}** needs an open workspace. Open a folder and try again.",
                spec.display_name
            ),
            GatingViolation::NotSignedIn => format!(
                "**{}** needs you to be signed in to Azure. Sign in and try again.",
                spec.display_name
            ),
        }
    }
}

impl EnvironmentSnapshot {
    /// Snapshot with the process working directory as the only workspace folder
    pub fn from_process(signed_in: bool) -> Self {
        Self {
            workspace_folders: std::env::current_dir().into_iter().collect(),
            signed_in,
        }
    }

    pub fn workspace_open(&self) -> bool {
        !self.workspace_folders.is_empty()
    }

    /// Check the gating flags of `spec`; the workspace is checked first
    pub fn check(&self, spec: &CommandSpec) -> Result<(), GatingViolation> {
        if spec.requires_workspace_open && !self.workspace_open() {
            return Err(GatingViolation::WorkspaceNotOpen);
        }
        if spec.requires_azure_login && !self.signed_in {
            return Err(GatingViolation::NotSignedIn);
        }
        Ok(())
    }
}

/// Source of environment snapshots.
pub trait HostEnvironment: Send + Sync {
    fn snapshot(&self) -> EnvironmentSnapshot;
}

/// Environment holding a snapshot that can be updated at runtime.
#[derive(Debug, Default)]
pub struct StaticEnvironment {
    state: RwLock<EnvironmentSnapshot>,
}

impl StaticEnvironment {
    pub fn new(snapshot: EnvironmentSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    /// Workspace open and signed in
    pub fn ready() -> Self {
        Self::new(EnvironmentSnapshot {
            workspace_folders: vec![PathBuf::from(".")],
            signed_in: true,
        })
    }

    pub fn set_signed_in(&self, signed_in: bool) {
        self.state.write().unwrap().signed_in = signed_in;
    }

    pub fn set_workspace_folders(&self, folders: Vec<PathBuf>) {
        self.state.write().unwrap().workspace_folders = folders;
    }
}

impl HostEnvironment for StaticEnvironment {
    fn snapshot(&self) -> EnvironmentSnapshot {
        self.state.read().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ungated_command_always_passes() {
        let spec = CommandSpec::simple("open", "workbench.open");
        assert!(EnvironmentSnapshot::default().check(&spec).is_ok());
    }

    #[test]
    fn test_workspace_checked_before_login() {
        let spec = CommandSpec::wizard("deploy", "azure.deploy")
            .requires_workspace()
            .requires_login();
        let env = StaticEnvironment::default();

        assert_eq!(
            env.snapshot().check(&spec),
            Err(GatingViolation::WorkspaceNotOpen)
        );

        env.set_workspace_folders(vec![PathBuf::from("/work")]);
        assert_eq!(env.snapshot().check(&spec), Err(GatingViolation::NotSignedIn));

        env.set_signed_in(true);
        assert!(env.snapshot().check(&spec).is_ok());
    }

    #[test]
    fn test_violation_message_names_command() {
        let spec = CommandSpec::wizard("deploy", "azure.deploy").display_name("Deploy to Azure");
        let message = GatingViolation::NotSignedIn.message(&spec);
        assert!(message.contains("Deploy to Azure"));
        assert!(message.contains("signed in"));
    }

    #[test]
    fn test_from_process_has_workspace() {
        let snapshot = EnvironmentSnapshot::from_process(false);
        assert!(snapshot.workspace_open());
        assert!(!snapshot.signed_in);
    }
}
