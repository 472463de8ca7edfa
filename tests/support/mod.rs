// ABOUTME: Test support utilities.
// ABOUTME: Scripted phase executor and in-memory capability provider.

use async_trait::async_trait;
use cumulo::config::{DeployConfig, Environment};
use cumulo::deploy::{Phase, PhaseExecutor, PhaseFailure, PhaseReport};
use cumulo::region::{CapabilityProvider, ProviderError};
use cumulo::types::{RegionName, ResourceGroupName};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("cumulo=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Deploy config targeting a known-good region, so no provider queries run.
#[allow(dead_code)]
pub fn deploy_config() -> DeployConfig {
    let mut config = DeployConfig::new(
        ResourceGroupName::new("rg-test").unwrap(),
        RegionName::new("eastus").unwrap(),
        Environment::Dev,
        "main.bicep".into(),
    );
    config.git_sha = Some("0123456789abcdef".to_string());
    config
}

/// Phase executor that plays back queued outcomes, then succeeds.
#[derive(Default)]
#[allow(dead_code)]
pub struct ScriptedExecutor {
    script: Mutex<BTreeMap<Phase, VecDeque<Result<PhaseReport, PhaseFailure>>>>,
    calls: Mutex<BTreeMap<Phase, usize>>,
    hang: Option<Phase>,
}

#[allow(dead_code)]
impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, phase: Phase, outcome: Result<PhaseReport, PhaseFailure>) -> Self {
        self.script
            .lock()
            .entry(phase)
            .or_default()
            .push_back(outcome);
        self
    }

    pub fn fail_times(mut self, phase: Phase, times: usize, message: &str) -> Self {
        for _ in 0..times {
            self = self.then(phase, Err(PhaseFailure::new(message)));
        }
        self
    }

    /// Never return from `phase`.
    pub fn hang_on(mut self, phase: Phase) -> Self {
        self.hang = Some(phase);
        self
    }

    pub fn calls(&self, phase: Phase) -> usize {
        self.calls.lock().get(&phase).copied().unwrap_or(0)
    }

    async fn step(&self, phase: Phase) -> Result<PhaseReport, PhaseFailure> {
        *self.calls.lock().entry(phase).or_default() += 1;
        if self.hang == Some(phase) {
            tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
        }
        self.script
            .lock()
            .get_mut(&phase)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(PhaseReport::ok()))
    }
}

#[async_trait]
impl PhaseExecutor for ScriptedExecutor {
    async fn validate_parameters(&self, _: &DeployConfig) -> Result<PhaseReport, PhaseFailure> {
        self.step(Phase::ValidateParameters).await
    }

    async fn lint(&self, _: &DeployConfig) -> Result<PhaseReport, PhaseFailure> {
        self.step(Phase::Lint).await
    }

    async fn plan(&self, _: &DeployConfig) -> Result<PhaseReport, PhaseFailure> {
        self.step(Phase::Plan).await
    }

    async fn deploy(&self, _: &DeployConfig) -> Result<PhaseReport, PhaseFailure> {
        self.step(Phase::Deploy).await
    }

    async fn verify_health(&self, _: &DeployConfig) -> Result<PhaseReport, PhaseFailure> {
        self.step(Phase::VerifyHealth).await
    }
}

/// Capability provider backed by a fixed namespace table.
#[derive(Default)]
#[allow(dead_code)]
pub struct MockProvider {
    regions: HashMap<String, Vec<String>>,
    failing: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every query fails with a transport error.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: &str, regions: &[&str]) -> Self {
        self.regions.insert(
            namespace.to_string(),
            regions.iter().map(|r| r.to_string()).collect(),
        );
        self
    }

    /// Delay every answer.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CapabilityProvider for MockProvider {
    async fn provider_regions(&self, namespace: &str) -> Result<Vec<String>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(ProviderError::Transport("connection refused".to_string()));
        }
        Ok(self.regions.get(namespace).cloned().unwrap_or_default())
    }
}

/// Canned `az` responses keyed on the leading arguments.
#[allow(dead_code)]
const FAKE_AZ: &str = r#"#!/bin/sh
echo "$*" >> "$(dirname "$0")/az-calls.log"
case "$*" in
  "group exists --name rg-missing"*) echo false ;;
  "group exists"*) echo true ;;
  "group show"*) echo '{"name":"rg-app","location":"westeurope","provisioningState":"Succeeded"}' ;;
  "group delete"*) ;;
  "bicep lint"*) ;;
  "group create"*) ;;
  "provider show --namespace Microsoft.KeyVault"*) echo "<html>gateway error</html>" ;;
  "provider show"*) echo '["East US","Brazil South","East US"]' ;;
  "resource list"*) echo '[{"name":"stapp","type":"Microsoft.Storage/storageAccounts","location":"westeurope"}]' ;;
  "deployment group list"*) echo '[{"name":"cumulo-dev-old","provisioningState":"Succeeded"},{"name":"cumulo-dev-abc","provisioningState":"Failed","timestamp":"2026-01-01T00:00:00Z"}]' ;;
  "deployment operation group list"*) echo '[{"resourceType":"Microsoft.Storage/storageAccounts","resourceName":"stapp","statusCode":"Conflict","message":"Request timeout while connecting to storage"}]' ;;
  "deployment group validate"*) ;;
  "deployment group what-if"*) echo '{"status":"Succeeded","changes":[{"changeType":"Delete","resourceId":"/subscriptions/s/resourceGroups/rg-app/providers/Microsoft.Storage/storageAccounts/old"}]}' ;;
  "deployment group create"*) ;;
  "deployment group show"*) echo Succeeded ;;
  *) echo "ERROR: unexpected arguments: $*" >&2; exit 1 ;;
esac
"#;

/// Write an executable fake `az` into `dir` and return its path.
#[cfg(unix)]
#[allow(dead_code)]
pub fn install_fake_az(dir: &std::path::Path) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("az");
    std::fs::write(&path, FAKE_AZ).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Arguments of every fake `az` invocation so far.
#[allow(dead_code)]
pub fn fake_az_calls(dir: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("az-calls.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
