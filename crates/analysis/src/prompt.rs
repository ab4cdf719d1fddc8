//! Prompt assembly — the fixed system instruction plus formatted logs.
//!
//! Static string assembly; included as the input contract for the pipeline.

use kubesentinel_core::log::LogRecord;

/// The fixed system instruction: tool catalog + response-format contract.
///
/// The catalog parameter shapes are opaque to the core — the extractor
/// round-trips whatever `args` the model produces without validating them.
pub const SYSTEM_PROMPT: &str = r#"You are a Kubernetes Site Reliability Engineer (SRE) AI assistant.
Your job is to analyze Kubernetes logs and propose the most appropriate remediation action.

## Available Tools

1. **scale_deployment** - Scale deployment replicas up or down
   Parameters: namespace, deployment, replicas
   Use when: OOMKilled, high traffic, CPU pressure, load balancing needed

2. **restart_pod** - Restart a specific pod (delete and recreate)
   Parameters: namespace, pod, graceful (bool)
   Use when: Pod stuck, memory leak, unresponsive app, needs config refresh

3. **rollback_deployment** - Rollback to previous deployment version
   Parameters: namespace, deployment, revision (optional)
   Use when: Bad deployment, app errors after update, performance regression

4. **drain_node** - Safely evict all pods from a node
   Parameters: node, force (bool), ignore_daemonsets (bool), timeout
   Use when: Node hardware issues, maintenance needed, OS updates

5. **cordon_node** - Mark node as unschedulable
   Parameters: node, cordon (bool - true to cordon, false to uncordon)
   Use when: Prevent new pods on problematic node, gradual drain

6. **delete_pod** - Force delete a stuck pod
   Parameters: namespace, pod, force (bool)
   Use when: Pod stuck in Terminating, zombie pods, cleanup needed

7. **update_resource_limits** - Update CPU/Memory limits
   Parameters: namespace, deployment, cpu_limit, memory_limit, cpu_request, memory_request
   Use when: OOMKilled frequently, CPU throttling, resource optimization

8. **apply_network_policy** - Apply network traffic rules
   Parameters: namespace, policy_name, action (allow/deny), target_pod_selector
   Use when: Security incident, DDoS, traffic isolation needed

## Response Format

Respond with a JSON object:
{
  "toolName": "<tool_name>",
  "args": { <tool-specific parameters> },
  "reason": "<detailed explanation of the issue and why this action will fix it>"
}

## Rules
- Analyze ALL logs to understand the full context
- Choose the MOST appropriate tool for the specific issue
- Extract deployment/pod names from the log entries
- Provide detailed reasoning explaining root cause and fix
- namespace defaults to "prod" unless logs indicate otherwise"#;

/// Turn an ordered sequence of log records into one newline-joined block.
///
/// Caller ordering is preserved verbatim.
pub fn format_logs(logs: &[LogRecord]) -> String {
    logs.iter()
        .map(LogRecord::prompt_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the user prompt wrapping the formatted logs.
pub fn build_user_prompt(logs: &[LogRecord]) -> String {
    format!(
        "Analyze these Kubernetes log entries. A critical incident has been detected.\n\n\
         LOGS:\n{}\n\n\
         Based on these logs:\n\
         1. Identify the root cause of the incident\n\
         2. Choose the most appropriate remediation tool\n\
         3. Provide the complete JSON response with toolName, args, and detailed reason",
        format_logs(logs)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubesentinel_core::log::LogLevel;

    fn record(id: &str, message: &str) -> LogRecord {
        LogRecord {
            id: id.into(),
            timestamp: "2024-05-01T10:00:00Z".into(),
            level: LogLevel::Error,
            pod: "api-6f7b8".into(),
            message: message.into(),
        }
    }

    #[test]
    fn logs_joined_in_caller_order() {
        let logs = vec![record("1", "first"), record("2", "second")];
        let block = format_logs(&logs);
        assert_eq!(
            block,
            "[2024-05-01T10:00:00Z] [ERROR] [api-6f7b8] first\n\
             [2024-05-01T10:00:00Z] [ERROR] [api-6f7b8] second"
        );
    }

    #[test]
    fn user_prompt_embeds_logs() {
        let prompt = build_user_prompt(&[record("1", "OOMKilled")]);
        assert!(prompt.contains("LOGS:\n[2024-05-01T10:00:00Z]"));
        assert!(prompt.contains("OOMKilled"));
        assert!(prompt.ends_with("detailed reason"));
    }

    #[test]
    fn system_prompt_carries_catalog_and_contract() {
        assert!(SYSTEM_PROMPT.contains("scale_deployment"));
        assert!(SYSTEM_PROMPT.contains("apply_network_policy"));
        assert!(SYSTEM_PROMPT.contains(r#""toolName""#));
    }
}
