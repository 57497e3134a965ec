/// Pulumi CLI operations for a program directory
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use super::program::{Program, PROGRAM_FILE};
use crate::utils::command::{check_tool_installed, CommandBuilder};

/// Summary of a stack as listed by `pulumi stack ls --json`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackSummary {
    pub name: String,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub update_in_progress: bool,
    #[serde(default)]
    pub resource_count: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Parse the JSON printed by `pulumi stack ls --json`
pub fn parse_stack_list(json: &str) -> Result<Vec<StackSummary>> {
    serde_json::from_str(json).context("Failed to parse pulumi stack list")
}

/// Pulumi client bound to one program directory and stack
pub struct PulumiClient {
    work_dir: PathBuf,
    stack: String,
}

impl PulumiClient {
    pub fn new(work_dir: PathBuf, stack: impl Into<String>) -> Self {
        Self {
            work_dir,
            stack: stack.into(),
        }
    }

    /// Check if pulumi is installed
    pub async fn check_pulumi_installed() -> Result<()> {
        check_tool_installed(
            "pulumi",
            &["version"],
            "https://www.pulumi.com/docs/install/",
        )
        .await
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn pulumi(&self) -> CommandBuilder {
        CommandBuilder::new("pulumi")
            .current_dir(&self.work_dir)
            .env("PULUMI_SKIP_UPDATE_CHECK", "true")
    }

    /// Write the program into the work directory
    pub async fn write_program(&self, program: &Program<'_>) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.work_dir)
            .await
            .context("Failed to create output directory")?;

        let yaml = program.render().context("Failed to render Pulumi program")?;
        let path = self.work_dir.join(PROGRAM_FILE);
        tokio::fs::write(&path, yaml)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!("Pulumi program written: {}", path.display());
        Ok(path)
    }

    /// Select the stack, creating it if it does not exist
    pub async fn select_stack(&self) -> Result<()> {
        info!("Selecting stack {}", self.stack);

        self.pulumi()
            .args(["stack", "select", "--create", "--non-interactive"])
            .arg(&self.stack)
            .context(format!("Failed to select stack {}", self.stack))
            .run_silent()
            .await
    }

    /// Set the AWS region for the stack
    pub async fn set_region(&self, region: &str) -> Result<()> {
        self.pulumi()
            .args(["config", "set", "aws:region", region, "--stack"])
            .arg(&self.stack)
            .context("Failed to set aws:region")
            .run_silent()
            .await
    }

    /// Show pending changes without applying them
    pub async fn preview(&self) -> Result<String> {
        info!("Previewing stack {}...", self.stack);

        self.pulumi()
            .args(["preview", "--non-interactive", "--diff", "--stack"])
            .arg(&self.stack)
            .context("pulumi preview failed")
            .run()
            .await
    }

    /// Create or update every declared resource
    pub async fn up(&self) -> Result<String> {
        info!("Updating stack {}...", self.stack);

        self.pulumi()
            .args(["up", "--yes", "--non-interactive", "--stack"])
            .arg(&self.stack)
            .context("pulumi up failed")
            .run()
            .await
    }

    /// Delete every resource of the stack
    pub async fn destroy(&self) -> Result<String> {
        info!("Destroying stack {}...", self.stack);

        self.pulumi()
            .args(["destroy", "--yes", "--non-interactive", "--stack"])
            .arg(&self.stack)
            .context("pulumi destroy failed")
            .run()
            .await
    }

    /// Stacks of the project
    pub async fn list_stacks(&self) -> Result<Vec<StackSummary>> {
        let stdout = self
            .pulumi()
            .args(["stack", "ls", "--json"])
            .context("Failed to list stacks")
            .run()
            .await?;

        parse_stack_list(&stdout)
    }

    /// Outputs of the stack, as raw JSON
    pub async fn outputs(&self) -> Result<serde_json::Value> {
        let stdout = self
            .pulumi()
            .args(["stack", "output", "--json", "--stack"])
            .arg(&self.stack)
            .context("Failed to read stack outputs")
            .run()
            .await?;

        serde_json::from_str(&stdout).context("Failed to parse stack outputs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::expand;
    use crate::config::ClusterConfig;
    use chrono::TimeZone;

    #[test]
    fn test_parse_stack_list() {
        let json = r#"[
            {
                "name": "dev",
                "current": true,
                "lastUpdate": "2024-03-01T10:20:30.000Z",
                "updateInProgress": false,
                "resourceCount": 19,
                "url": "https://app.pulumi.com/acme/ecsfleet/dev"
            },
            { "name": "prod", "current": false }
        ]"#;

        let stacks = parse_stack_list(json).unwrap();
        assert_eq!(stacks.len(), 2);
        assert!(stacks[0].current);
        assert_eq!(
            stacks[0].last_update,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 20, 30).unwrap())
        );
        assert_eq!(stacks[0].resource_count, Some(19));
        assert_eq!(stacks[1].last_update, None);
        assert!(!stacks[1].update_in_progress);
    }

    #[test]
    fn test_parse_stack_list_rejects_garbage() {
        assert!(parse_stack_list("error: no Pulumi.yaml project file found").is_err());
    }

    #[tokio::test]
    async fn test_write_program() {
        let dir = std::env::temp_dir().join(format!("ecsfleet-test-{}", std::process::id()));
        let client = PulumiClient::new(dir.clone(), "dev");

        let config = ClusterConfig::example();
        let expansion = expand(&config).unwrap();
        let program = Program::new(&config.settings, &expansion);

        let path = client.write_program(&program).await.unwrap();
        assert_eq!(path, dir.join(PROGRAM_FILE));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, program.render().unwrap());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires pulumi and AWS credentials
    async fn test_preview() {
        let config = ClusterConfig::example();
        let expansion = expand(&config).unwrap();
        let program = Program::new(&config.settings, &expansion);
        let client = PulumiClient::new(std::env::temp_dir().join("ecsfleet-preview"), "dev");
        client.write_program(&program).await.unwrap();
        client.select_stack().await.unwrap();
        client.set_region(&config.settings.region).await.unwrap();
        client.preview().await.unwrap();
    }
}
