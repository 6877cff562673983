//! Command dispatch: one command in flight at a time, every outcome recorded.

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::ValidationError;
use crate::session::Dashboard;
use crate::transport::JsonObject;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandStatus {
    #[default]
    Idle,
    Sending,
    Success,
    Error,
}

impl CommandStatus {
    pub fn label(self) -> &'static str {
        match self {
            CommandStatus::Idle => "Idle",
            CommandStatus::Sending => "Sending...",
            CommandStatus::Success => "Success",
            CommandStatus::Error => "Error",
        }
    }
}

/// What happened to a dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Another command was in flight; nothing was sent or changed.
    Busy,
    /// Rejected locally before reaching the device.
    Invalid,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct CommandState {
    pub busy: bool,
    pub last_name: String,
    pub status: CommandStatus,
    pub response_text: String,
    pub latency_ms: f64,
    /// Operator-entered name and args for [`Dashboard::send_custom_command`].
    pub input: String,
    pub args_json: String,
}

/// Parse command args; blank text means `{}`.
pub fn parse_args(text: &str) -> Result<JsonObject, ValidationError> {
    if text.trim().is_empty() {
        return Ok(JsonObject::new());
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ValidationError::ArgsNotObject),
        Err(e) => Err(ValidationError::InvalidArgsJson(e.to_string())),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl Dashboard {
    /// Validate, send and record one command. The busy flag is claimed and
    /// released under the session lock; the request itself runs unlocked.
    pub async fn send_command(&self, name: &str, args_json: &str) -> CommandOutcome {
        let name = name.trim().to_string();
        let (address, args) = {
            let mut s = self.state.lock().await;
            if s.command.busy {
                return CommandOutcome::Busy;
            }
            let parsed = if name.is_empty() {
                Err(ValidationError::EmptyCommandName)
            } else {
                parse_args(args_json)
            };
            let args = match parsed {
                Ok(args) => args,
                Err(e) => {
                    s.command.last_name = name.clone();
                    s.command.status = CommandStatus::Error;
                    s.command.response_text = e.to_string();
                    s.events.push(format!("Command '{name}' rejected: {e}"));
                    return CommandOutcome::Invalid;
                }
            };
            s.command.busy = true;
            s.command.last_name = name.clone();
            s.command.status = CommandStatus::Sending;
            (s.device_address(), args)
        };

        let result = self
            .transport
            .send_command(&address, &name, &args, self.options.command_timeout)
            .await;

        let mut s = self.state.lock().await;
        s.command.busy = false;
        match result {
            Ok(reply) => {
                let latency = round2(reply.latency_ms);
                s.command.status = CommandStatus::Success;
                s.command.latency_ms = latency;
                s.command.response_text = serde_json::to_string_pretty(&reply.payload)
                    .unwrap_or_else(|_| "{}".into());
                info!(command = %name, latency_ms = latency, "command ok");
                s.events.push(format!("Command '{name}' OK ({latency} ms)"));
                CommandOutcome::Succeeded
            }
            Err(e) => {
                s.command.status = CommandStatus::Error;
                s.command.response_text = e.to_string();
                warn!(command = %name, error = %e, "command failed");
                s.events.push(format!("Command '{name}' failed: {e}"));
                CommandOutcome::Failed
            }
        }
    }

    /// Run [`Dashboard::send_command`] as a short-lived background task.
    pub fn spawn_command(&self, name: &str, args_json: &str) -> JoinHandle<CommandOutcome> {
        let this = self.clone();
        let name = name.to_string();
        let args_json = args_json.to_string();
        tokio::spawn(async move { this.send_command(&name, &args_json).await })
    }

    pub async fn set_command_input(&self, value: &str) {
        self.state.lock().await.command.input = value.trim().to_string();
    }

    pub async fn set_command_args_json(&self, value: &str) {
        self.state.lock().await.command.args_json = value.to_string();
    }

    /// Send whatever the operator typed into the command fields.
    pub async fn send_custom_command(&self) -> CommandOutcome {
        let (name, args) = {
            let s = self.state.lock().await;
            (s.command.input.clone(), s.command.args_json.clone())
        };
        self.send_command(&name, &args).await
    }

    pub fn cmd_reset(&self) -> JoinHandle<CommandOutcome> {
        self.spawn_command("reset", "{}")
    }

    pub fn cmd_clear_faults(&self) -> JoinHandle<CommandOutcome> {
        self.spawn_command("clear_faults", "{}")
    }

    pub fn cmd_set_mode_idle(&self) -> JoinHandle<CommandOutcome> {
        self.spawn_command("set_mode", r#"{"mode":"IDLE"}"#)
    }

    pub fn cmd_set_mode_run(&self) -> JoinHandle<CommandOutcome> {
        self.spawn_command("set_mode", r#"{"mode":"RUN"}"#)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::session::tests::{dashboard_with, obj, refused, ScriptedTransport};
    use crate::transport::{DeviceReply, DeviceTransport};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[test]
    fn args_parsing() {
        assert_eq!(parse_args("").unwrap(), JsonObject::new());
        assert_eq!(parse_args("  ").unwrap(), JsonObject::new());
        assert_eq!(parse_args(r#"{"mode":"RUN"}"#).unwrap()["mode"], json!("RUN"));
        assert_eq!(parse_args("[1,2]"), Err(ValidationError::ArgsNotObject));
        assert!(matches!(
            parse_args("{mode:"),
            Err(ValidationError::InvalidArgsJson(_))
        ));
    }

    #[tokio::test]
    async fn set_mode_success() {
        let t = Arc::new(ScriptedTransport::default());
        let dash = dashboard_with(t.clone());
        let out = dash.send_command("set_mode", r#"{"mode":"RUN"}"#).await;
        assert_eq!(out, CommandOutcome::Succeeded);
        let c = dash.inspect(|s| s.command.clone()).await;
        assert_eq!(c.status, CommandStatus::Success);
        assert!(!c.busy);
        assert_eq!(c.last_name, "set_mode");
        assert_eq!(c.latency_ms, 12.35);
        assert!(c.response_text.contains("\"ok\": true"));
        assert_eq!(t.command_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transport_failure_clears_busy() {
        let t = Arc::new(ScriptedTransport::default());
        t.commands.lock().unwrap().push_back(Err(refused()));
        let dash = dashboard_with(t.clone());
        assert_eq!(dash.send_command("reset", "").await, CommandOutcome::Failed);
        let (status, busy, text, last) = dash
            .inspect(|s| {
                (
                    s.command.status,
                    s.command.busy,
                    s.command.response_text.clone(),
                    s.events.last().map(str::to_string),
                )
            })
            .await;
        assert_eq!(status, CommandStatus::Error);
        assert!(!busy);
        assert!(text.contains("connection refused"));
        assert!(last.unwrap().starts_with("Command 'reset' failed"));
    }

    #[tokio::test]
    async fn invalid_args_never_reach_device() {
        let t = Arc::new(ScriptedTransport::default());
        let dash = dashboard_with(t.clone());
        assert_eq!(dash.send_command("set_mode", "{oops").await, CommandOutcome::Invalid);
        assert_eq!(dash.send_command("set_mode", "\"RUN\"").await, CommandOutcome::Invalid);
        assert_eq!(dash.send_command("   ", "{}").await, CommandOutcome::Invalid);
        let c = dash.inspect(|s| s.command.clone()).await;
        assert_eq!(c.status, CommandStatus::Error);
        assert_eq!(c.response_text, "Command name is required");
        assert!(!c.busy);
        assert_eq!(t.command_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn custom_command_uses_stored_fields() {
        let t = Arc::new(ScriptedTransport::default());
        let dash = dashboard_with(t.clone());
        dash.set_command_input("  inject_fault ").await;
        dash.set_command_args_json(r#"{"fault":"FAN_WARN"}"#).await;
        assert_eq!(dash.send_custom_command().await, CommandOutcome::Succeeded);
        assert_eq!(dash.inspect(|s| s.command.last_name.clone()).await, "inject_fault");
    }

    /// Holds every command until released.
    struct SlowCommands {
        entered: Notify,
        release: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DeviceTransport for SlowCommands {
        async fn fetch_status(
            &self,
            _address: &str,
            _timeout: Duration,
        ) -> Result<DeviceReply, TransportError> {
            Err(refused())
        }

        async fn send_command(
            &self,
            _address: &str,
            _command: &str,
            _args: &JsonObject,
            _timeout: Duration,
        ) -> Result<DeviceReply, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            self.release.notified().await;
            Ok(DeviceReply {
                payload: obj(json!({"ok": true})),
                latency_ms: 5.0,
            })
        }
    }

    #[tokio::test]
    async fn second_command_while_busy_is_rejected() {
        let t = Arc::new(SlowCommands {
            entered: Notify::new(),
            release: Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let dash = dashboard_with(t.clone());
        let first = dash.cmd_reset();
        t.entered.notified().await;

        let before = dash.inspect(|s| (s.command.status, s.command.last_name.clone())).await;
        assert_eq!(before, (CommandStatus::Sending, "reset".to_string()));

        assert_eq!(
            dash.send_command("clear_faults", "{}").await,
            CommandOutcome::Busy
        );
        assert_eq!(dash.cmd_set_mode_run().await.unwrap(), CommandOutcome::Busy);
        let during = dash.inspect(|s| (s.command.status, s.command.last_name.clone())).await;
        assert_eq!(during, before);
        assert_eq!(t.calls.load(Ordering::SeqCst), 1);

        t.release.notify_one();
        assert_eq!(first.await.unwrap(), CommandOutcome::Succeeded);
        assert!(!dash.inspect(|s| s.command.busy).await);
    }
}
