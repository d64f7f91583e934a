//! # Commands: named operations, optionally composite.
//!
//! A command with no sub-commands runs its own [`Command::execute`]. A
//! composite command runs every sub-command against the same payload,
//! concurrently, then combines the outcomes with [`Command::merge`].
//!
//! ```text
//! execute("sync", payload)
//!    ├─► "sync-users"    ─┐
//!    ├─► "sync-groups"   ─┼─► join_all ─► merge ─► result
//!    └─► "sync-devices"  ─┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, join_all};
use serde_json::Value;

use crate::error::FacadeError;

/// Named operation registered in a [`Facade`](crate::Facade).
#[async_trait]
pub trait Command: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Sub-commands of a composite command; empty for a simple one.
    fn sub_commands(&self) -> &[Arc<dyn Command>] {
        &[]
    }

    /// Own logic of a simple command. Not called for composite commands.
    async fn execute(&self, _payload: &Value) -> Result<Value, FacadeError> {
        Err(FacadeError::CommandFailed {
            command: self.name().into(),
            reason: "command has no logic of its own".into(),
        })
    }

    /// Combines sub-command outcomes, in declaration order.
    ///
    /// Defaults to [`merge_all`].
    fn merge(&self, outcomes: Vec<Result<Value, FacadeError>>) -> Result<Value, FacadeError> {
        merge_all(outcomes)
    }
}

/// Fails with the first failing outcome; otherwise returns every result as
/// a JSON array, in declaration order.
pub fn merge_all(outcomes: Vec<Result<Value, FacadeError>>) -> Result<Value, FacadeError> {
    outcomes
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

/// Runs `command`, fanning out to its sub-commands when it has any.
pub fn run<'a>(command: &'a dyn Command, payload: &'a Value) -> BoxFuture<'a, Result<Value, FacadeError>> {
    async move {
        let subs = command.sub_commands();
        if subs.is_empty() {
            return command.execute(payload).await;
        }
        let outcomes = join_all(subs.iter().map(|sub| run(sub.as_ref(), payload))).await;
        command.merge(outcomes)
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Step {
        name: &'static str,
        fail: bool,
    }

    #[async_trait]
    impl Command for Step {
        fn name(&self) -> &str {
            self.name
        }

        async fn execute(&self, payload: &Value) -> Result<Value, FacadeError> {
            if self.fail {
                return Err(FacadeError::CommandFailed {
                    command: self.name.into(),
                    reason: "device offline".into(),
                });
            }
            Ok(json!({ "step": self.name, "input": payload.clone() }))
        }
    }

    struct Composite {
        name: &'static str,
        subs: Vec<Arc<dyn Command>>,
    }

    #[async_trait]
    impl Command for Composite {
        fn name(&self) -> &str {
            self.name
        }

        fn sub_commands(&self) -> &[Arc<dyn Command>] {
            &self.subs
        }
    }

    fn step(name: &'static str, fail: bool) -> Arc<dyn Command> {
        Arc::new(Step { name, fail })
    }

    #[tokio::test]
    async fn one_failing_sub_command_fails_the_composite() {
        let sync = Composite {
            name: "sync",
            subs: vec![step("users", false), step("devices", true), step("groups", false)],
        };

        let err = run(&sync, &json!(1)).await.unwrap_err();
        assert_eq!(
            err,
            FacadeError::CommandFailed {
                command: "devices".into(),
                reason: "device offline".into(),
            }
        );
    }

    #[tokio::test]
    async fn successful_composite_collects_results_in_order() {
        let sync = Composite {
            name: "sync",
            subs: vec![step("users", false), step("groups", false)],
        };

        let value = run(&sync, &json!("x")).await.unwrap();
        assert_eq!(
            value,
            json!([
                { "step": "users", "input": "x" },
                { "step": "groups", "input": "x" },
            ])
        );
    }

    #[tokio::test]
    async fn composite_without_logic_of_its_own_still_runs_nested() {
        let inner: Arc<dyn Command> = Arc::new(Composite {
            name: "inner",
            subs: vec![step("a", false)],
        });
        let outer = Composite {
            name: "outer",
            subs: vec![inner, step("b", false)],
        };

        let value = run(&outer, &Value::Null).await.unwrap();
        assert_eq!(value[0][0]["step"], "a");
        assert_eq!(value[1]["step"], "b");
    }
}
