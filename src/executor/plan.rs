// Execution planning - validate a request against catalog and policy
#![allow(dead_code)]

use crate::catalog::ToolCatalog;
use crate::executor::args::{is_flag, split};
use crate::executor::config::SUGGESTION_LIMIT;
use crate::executor::error::Rejection;
use crate::executor::types::{ExecutionPlan, ResourceLimits};
use crate::policy::types::{CPU_TIME_LIMIT, LimitTable, MEMORY_LIMIT_MB};
use crate::policy::{Overrides, Policy, ToolPolicy};
use tracing::debug;

/// Turns a raw request into an [`ExecutionPlan`]
///
/// Pure with respect to its inputs: reads the catalog and a policy snapshot,
/// never touches the filesystem or spawns anything.
pub struct Planner<'a> {
    catalog: &'a dyn ToolCatalog,
    policy: &'a Policy,
    overrides: &'a Overrides,
    fallback_timeout_secs: f64,
}

impl<'a> Planner<'a> {
    pub fn new(
        catalog: &'a dyn ToolCatalog,
        policy: &'a Policy,
        overrides: &'a Overrides,
        fallback_timeout_secs: f64,
    ) -> Self {
        Self {
            catalog,
            policy,
            overrides,
            fallback_timeout_secs,
        }
    }

    pub fn plan(
        &self,
        tool_name: &str,
        raw_arguments: &str,
        requested_timeout: Option<f64>,
    ) -> Result<ExecutionPlan, Rejection> {
        if tool_name.trim().is_empty() {
            return Err(Rejection::MissingToolName);
        }

        let Some(tool) = self.catalog.resolve(tool_name) else {
            let suggestions = self
                .catalog
                .fuzzy_suggestions(tool_name, SUGGESTION_LIMIT)
                .into_iter()
                .map(|t| t.name)
                .collect();
            return Err(Rejection::UnknownTool {
                name: tool_name.to_string(),
                suggestions,
            });
        };

        let empty = ToolPolicy::default();
        let tool_policy = self.policy.tool(&tool.name).unwrap_or(&empty);

        let mut arguments = parse(raw_arguments)?;
        if arguments.is_empty() && !tool.default_args.trim().is_empty() {
            arguments = parse(&tool.default_args)?;
        }

        check_flags(&tool.name, tool_policy, &arguments)?;
        if tool_policy.requires_target_confirmation {
            self.check_targets(tool_policy, &arguments)?;
        }

        if !tool.is_runnable() {
            return Err(Rejection::ExecutionDisabled(tool.name));
        }

        let timeout_secs = self.timeout(tool_policy, requested_timeout);
        let global_limits = &self.policy.global.resource_limits;
        let resource_limits = ResourceLimits {
            cpu_seconds: merged_limit(tool_policy, global_limits, CPU_TIME_LIMIT),
            memory_mb: merged_limit(tool_policy, global_limits, MEMORY_LIMIT_MB),
        };

        let mut command = Vec::with_capacity(arguments.len() + 1);
        command.push(tool.binary_path.trim().to_string());
        command.extend(arguments);

        debug!(
            tool = %tool.name,
            command = %command.join(" "),
            timeout_secs,
            cpu_limit = ?resource_limits.cpu_seconds,
            memory_limit_mb = ?resource_limits.memory_mb,
            "execution planned"
        );

        Ok(ExecutionPlan {
            tool,
            command,
            timeout_secs,
            resource_limits,
        })
    }

    fn check_targets(
        &self,
        tool_policy: &ToolPolicy,
        arguments: &[String],
    ) -> Result<(), Rejection> {
        let targets: Vec<&str> = arguments
            .iter()
            .map(String::as_str)
            .filter(|arg| !arg.is_empty() && !is_flag(arg))
            .collect();
        if targets.is_empty() {
            return Err(Rejection::MissingTarget);
        }

        let whitelist: Vec<&str> = tool_policy
            .target_prefix_whitelist
            .iter()
            .chain(self.overrides.target_whitelist.iter())
            .map(String::as_str)
            .collect();
        if whitelist.is_empty() {
            return Err(Rejection::NoWhitelist);
        }

        match targets
            .into_iter()
            .find(|target| !whitelist.iter().any(|prefix| target.starts_with(prefix)))
        {
            Some(target) => Err(Rejection::TargetNotPermitted(target.to_string())),
            None => Ok(()),
        }
    }

    /// Caller, then tool default, then global default, then fallback; clamped by `max_timeout`
    fn timeout(&self, tool_policy: &ToolPolicy, requested: Option<f64>) -> f64 {
        let timeout = requested
            .filter(|secs| positive(*secs))
            .or(tool_policy.default_timeout.filter(|secs| positive(*secs)))
            .or(self.policy.default_timeout(self.overrides).filter(|secs| positive(*secs)))
            .unwrap_or(self.fallback_timeout_secs);

        match tool_policy.max_timeout.filter(|secs| positive(*secs)) {
            Some(max) => timeout.min(max),
            None => timeout,
        }
    }
}

fn positive(secs: f64) -> bool {
    secs.is_finite() && secs > 0.0
}

fn parse(raw: &str) -> Result<Vec<String>, Rejection> {
    split(raw).map_err(|e| Rejection::UnparsableArguments(e.to_string()))
}

fn check_flags(
    tool: &str,
    tool_policy: &ToolPolicy,
    arguments: &[String],
) -> Result<(), Rejection> {
    let allowed = &tool_policy.allowed_flags;
    if allowed.is_empty() {
        return Ok(());
    }

    match arguments
        .iter()
        .find(|arg| is_flag(arg) && !allowed.contains(*arg))
    {
        Some(flag) => {
            let mut allowed = allowed.clone();
            allowed.sort();
            allowed.dedup();
            Err(Rejection::FlagNotPermitted {
                flag: flag.clone(),
                tool: tool.to_string(),
                allowed,
            })
        }
        None => Ok(()),
    }
}

/// A key present at tool level wins, even when its value is unusable
fn merged_limit(tool_policy: &ToolPolicy, global: &LimitTable, key: &str) -> Option<f64> {
    if tool_policy.resource_limits.contains(key) {
        tool_policy.resource_limits.numeric(key)
    } else {
        global.numeric(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ToolDataset, ToolDescriptor};

    fn descriptor(name: &str, binary: &str, default_args: &str) -> ToolDescriptor {
        ToolDescriptor {
            name: name.to_string(),
            package: name.to_string(),
            category: "Information Gathering".to_string(),
            summary: format!("{} scanner", name),
            binary_path: binary.to_string(),
            default_args: default_args.to_string(),
        }
    }

    fn dataset() -> ToolDataset {
        ToolDataset::new(vec![
            descriptor("nmap", "nmap", "--version"),
            descriptor("nikto", "nikto", ""),
            descriptor("openvas", "", ""),
        ])
        .unwrap()
    }

    fn plan_with(
        policy_yaml: &str,
        overrides: &Overrides,
        tool: &str,
        args: &str,
        timeout: Option<f64>,
    ) -> Result<ExecutionPlan, Rejection> {
        let catalog = dataset();
        let policy = Policy::from_yaml_str(policy_yaml).unwrap();
        Planner::new(&catalog, &policy, overrides, 60.0).plan(tool, args, timeout)
    }

    fn plan(policy_yaml: &str, tool: &str, args: &str) -> Result<ExecutionPlan, Rejection> {
        plan_with(policy_yaml, &Overrides::default(), tool, args, None)
    }

    #[test]
    fn test_blank_tool_name() {
        assert_eq!(plan("", "   ", "-sV"), Err(Rejection::MissingToolName));
    }

    #[test]
    fn test_unknown_tool_suggests() {
        match plan("", "nmapp", "") {
            Err(Rejection::UnknownTool { name, suggestions }) => {
                assert_eq!(name, "nmapp");
                assert!(suggestions.contains(&"nmap".to_string()));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_default_args_substituted() {
        let plan = plan("", "nmap", "  ").unwrap();
        assert_eq!(plan.command, vec!["nmap", "--version"]);
    }

    #[test]
    fn test_unparsable_arguments() {
        assert_eq!(
            plan("", "nmap", "-sV 'open"),
            Err(Rejection::UnparsableArguments("No closing quotation".to_string()))
        );
    }

    #[test]
    fn test_flag_outside_allow_list() {
        let policy = "tools:\n  nmap:\n    allowed_flags: [\"-sV\", \"-Pn\"]\n";
        assert!(plan(policy, "nmap", "-sV 127.0.0.1").is_ok());
        assert_eq!(
            plan(policy, "nmap", "-sV -A 127.0.0.1"),
            Err(Rejection::FlagNotPermitted {
                flag: "-A".to_string(),
                tool: "nmap".to_string(),
                allowed: vec!["-Pn".to_string(), "-sV".to_string()],
            })
        );
    }

    #[test]
    fn test_target_confirmation() {
        let policy = r#"
tools:
  nmap:
    requires_target_confirmation: true
    target_prefix_whitelist: ["127."]
"#;
        assert!(plan(policy, "nmap", "-sV 127.0.0.1").is_ok());
        assert_eq!(plan(policy, "nmap", "-sV"), Err(Rejection::MissingTarget));
        assert_eq!(
            plan(policy, "nmap", "-sV 10.0.0.1"),
            Err(Rejection::TargetNotPermitted("10.0.0.1".to_string()))
        );
    }

    #[test]
    fn test_missing_target_reported_before_empty_whitelist() {
        let policy = "tools:\n  nmap:\n    requires_target_confirmation: true\n";
        assert_eq!(plan(policy, "nmap", "-sV"), Err(Rejection::MissingTarget));
        assert_eq!(plan(policy, "nmap", "127.0.0.1"), Err(Rejection::NoWhitelist));
    }

    #[test]
    fn test_env_whitelist_extends_policy() {
        let policy = r#"
tools:
  nmap:
    requires_target_confirmation: true
    target_prefix_whitelist: ["127."]
"#;
        let overrides = Overrides {
            target_whitelist: vec!["10.0.".to_string()],
            ..Default::default()
        };
        assert!(plan_with(policy, &overrides, "nmap", "10.0.0.1", None).is_ok());
        assert!(plan_with(policy, &overrides, "nmap", "127.0.0.1", None).is_ok());
    }

    #[test]
    fn test_unrunnable_tool() {
        assert_eq!(
            plan("", "openvas", ""),
            Err(Rejection::ExecutionDisabled("openvas".to_string()))
        );
    }

    #[test]
    fn test_timeout_precedence() {
        let policy = r#"
global:
  default_timeout: 120
tools:
  nmap:
    default_timeout: 30
"#;
        let overrides = Overrides::default();
        assert_eq!(plan_with(policy, &overrides, "nmap", "", Some(5.0)).unwrap().timeout_secs, 5.0);
        let plan = plan_with(policy, &overrides, "nmap", "", Some(0.0)).unwrap();
        assert_eq!(plan.timeout_secs, 30.0);
        assert_eq!(plan_with(policy, &overrides, "nikto", "", None).unwrap().timeout_secs, 120.0);

        let overrides = Overrides {
            default_timeout: Some(15),
            ..Default::default()
        };
        assert_eq!(plan_with(policy, &overrides, "nikto", "", None).unwrap().timeout_secs, 15.0);
        let plan = plan_with("", &Overrides::default(), "nikto", "", None).unwrap();
        assert_eq!(plan.timeout_secs, 60.0);
    }

    #[test]
    fn test_timeout_clamped_by_max() {
        let policy = "tools:\n  nmap:\n    max_timeout: 30\n";
        let plan = plan_with(policy, &Overrides::default(), "nmap", "", Some(900.0)).unwrap();
        assert_eq!(plan.timeout_secs, 30.0);
        let plan = plan_with(policy, &Overrides::default(), "nmap", "", Some(10.0)).unwrap();
        assert_eq!(plan.timeout_secs, 10.0);
    }

    #[test]
    fn test_resource_limits_merge() {
        let policy = r#"
global:
  resource_limits:
    cpu_time_limit: 300
    memory_limit_mb: 1024
tools:
  nmap:
    resource_limits:
      memory_limit_mb: "512"
  nikto:
    resource_limits:
      cpu_time_limit: unlimited
"#;
        let nmap = plan(policy, "nmap", "").unwrap();
        assert_eq!(nmap.resource_limits.cpu_seconds, Some(300.0));
        assert_eq!(nmap.resource_limits.memory_mb, Some(512.0));

        let nikto = plan(policy, "nikto", "").unwrap();
        assert_eq!(nikto.resource_limits.cpu_seconds, None);
        assert_eq!(nikto.resource_limits.memory_mb, Some(1024.0));
    }
}
