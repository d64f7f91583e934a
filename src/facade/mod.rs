//! # Facade: a component's command / proxy / mediator runtime.
//!
//! An optional secondary runtime owned by one component. It holds three
//! independent name-keyed registries and a local [`Notifier`]:
//!
//! ```text
//!              execute(name)          fetch / update(name)
//!                   │                         │
//!                   ▼                         ▼
//!            Registry<Command>        Registry<Proxy> ──update ok──► Notifier
//!                                                                      │
//!                                           Registry<Mediator> ◄───────┘
//!                                           (one listener task each)
//! ```
//!
//! ## Rules
//! - Registries are mutated only through `&mut Facade`, by the owning component.
//! - Adding a name twice fails with [`FacadeError::DuplicateName`] and keeps the
//!   first entry.
//! - Removing an unknown command or proxy is [`FacadeError::NotFound`]; removing
//!   an unknown mediator is a no-op.
//! - Dropping the facade stops every mediator listener.

mod command;
mod mediator;
mod notifier;
mod proxy;
mod registry;

pub use command::{Command, merge_all};
pub use mediator::Mediator;
pub use notifier::{Notification, Notifier};
pub use proxy::Proxy;
pub use registry::Registry;

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::FacadeError;
use mediator::Listening;

/// Per-component command / proxy / mediator registries.
pub struct Facade {
    commands: Registry<Arc<dyn Command>>,
    proxies: Registry<Arc<dyn Proxy>>,
    mediators: Registry<Listening>,
    notifier: Notifier,
    cancel: CancellationToken,
}

impl Default for Facade {
    fn default() -> Self {
        Self::new()
    }
}

impl Facade {
    pub fn new() -> Self {
        Self {
            commands: Registry::new("command"),
            proxies: Registry::new("proxy"),
            mediators: Registry::new("mediator"),
            notifier: Notifier::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    // ---- commands ----

    pub fn add_command(&mut self, command: Arc<dyn Command>) -> Result<(), FacadeError> {
        let name: Arc<str> = command.name().into();
        self.commands.insert(name, command)
    }

    pub fn remove_command(&mut self, name: &str) -> Result<(), FacadeError> {
        self.commands.take(name).map(drop)
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.has(name)
    }

    /// Runs the command registered under `name` with `payload`.
    pub async fn execute(&self, name: &str, payload: Value) -> Result<Value, FacadeError> {
        let command = Arc::clone(self.commands.lookup(name)?);
        command::run(command.as_ref(), &payload).await
    }

    // ---- proxies ----

    pub fn add_proxy(&mut self, proxy: Arc<dyn Proxy>) -> Result<(), FacadeError> {
        let name: Arc<str> = proxy.name().into();
        self.proxies.insert(name, proxy)
    }

    pub fn remove_proxy(&mut self, name: &str) -> Result<(), FacadeError> {
        self.proxies.take(name).map(drop)
    }

    pub fn has_proxy(&self, name: &str) -> bool {
        self.proxies.has(name)
    }

    pub async fn fetch(&self, name: &str, query: Value) -> Result<Value, FacadeError> {
        self.proxies.lookup(name)?.fetch(&query).await
    }

    /// Updates through the proxy `name`, then notifies mediators interested in `name`.
    pub async fn update(&self, name: &str, data: Value) -> Result<Value, FacadeError> {
        let proxy = self.proxies.lookup(name)?;
        let stored = proxy.update(data).await?;
        self.notifier
            .notify(Notification::new(proxy.name(), stored.clone()));
        Ok(stored)
    }

    // ---- mediators ----

    /// Registers `mediator` and subscribes it to its interests.
    ///
    /// Must be called inside a tokio runtime.
    pub fn add_mediator(&mut self, mediator: Arc<dyn Mediator>) -> Result<(), FacadeError> {
        let name: Arc<str> = mediator.name().into();
        if self.mediators.has(&name) {
            return Err(FacadeError::DuplicateName {
                registry: "mediator",
                name,
            });
        }
        let listening = Listening::spawn(mediator, &self.notifier, self.cancel.child_token());
        self.mediators.insert(name, listening)
    }

    /// Unsubscribes and drops the mediator `name`; unknown names are ignored.
    pub fn remove_mediator(&mut self, name: &str) {
        if let Some(listening) = self.mediators.remove(name) {
            listening.stop();
        }
    }

    pub fn has_mediator(&self, name: &str) -> bool {
        self.mediators.has(name)
    }

    /// Registered mediator, if any.
    pub fn mediator(&self, name: &str) -> Option<&Arc<dyn Mediator>> {
        self.mediators.get(name).map(|l| &l.mediator)
    }

    /// Stops every mediator listener and empties all registries.
    pub fn clear(&mut self) {
        for listening in self.mediators.drain() {
            listening.stop();
        }
        self.commands.drain().for_each(drop);
        self.proxies.drain().for_each(drop);
    }
}

impl Drop for Facade {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Users {
        rows: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl Proxy for Users {
        fn name(&self) -> &str {
            "users"
        }

        async fn fetch(&self, _query: &Value) -> Result<Value, FacadeError> {
            Ok(Value::Array(self.rows.lock().unwrap().clone()))
        }

        async fn update(&self, data: Value) -> Result<Value, FacadeError> {
            if data.get("name").is_none() {
                return Err(FacadeError::ProxyFailed {
                    proxy: "users".into(),
                    reason: "name is required".into(),
                });
            }
            self.rows.lock().unwrap().push(data.clone());
            Ok(data)
        }
    }

    struct Sidebar {
        seen: mpsc::UnboundedSender<Notification>,
    }

    #[async_trait]
    impl Mediator for Sidebar {
        fn name(&self) -> &str {
            "sidebar"
        }

        fn interests(&self) -> Vec<String> {
            vec!["users".into()]
        }

        async fn on_notification(&self, note: &Notification) {
            let _ = self.seen.send(note.clone());
        }
    }

    struct Echo;

    #[async_trait]
    impl Command for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn execute(&self, payload: &Value) -> Result<Value, FacadeError> {
            Ok(payload.clone())
        }
    }

    fn users() -> Arc<dyn Proxy> {
        Arc::new(Users {
            rows: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn proxy_update_reaches_interested_mediator() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut facade = Facade::new();
        facade.add_proxy(users()).unwrap();
        facade.add_mediator(Arc::new(Sidebar { seen: tx })).unwrap();

        facade.update("users", json!({ "name": "ada" })).await.unwrap();

        let note = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(note, Notification::new("users", json!({ "name": "ada" })));
        assert_eq!(
            facade.fetch("users", Value::Null).await.unwrap(),
            json!([{ "name": "ada" }])
        );
    }

    #[tokio::test]
    async fn failed_update_notifies_nobody() {
        let mut facade = Facade::new();
        facade.add_proxy(users()).unwrap();
        let mut rx = facade.notifier().subscribe();

        let err = facade.update("users", json!({})).await.unwrap_err();
        assert_eq!(err.as_label(), "facade_proxy_failed");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn duplicates_are_rejected_in_every_registry() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut facade = Facade::new();
        facade.add_command(Arc::new(Echo)).unwrap();
        facade.add_proxy(users()).unwrap();
        facade.add_mediator(Arc::new(Sidebar { seen: tx.clone() })).unwrap();

        assert!(matches!(
            facade.add_command(Arc::new(Echo)),
            Err(FacadeError::DuplicateName { registry: "command", .. })
        ));
        assert!(matches!(
            facade.add_proxy(users()),
            Err(FacadeError::DuplicateName { registry: "proxy", .. })
        ));
        assert!(matches!(
            facade.add_mediator(Arc::new(Sidebar { seen: tx })),
            Err(FacadeError::DuplicateName { registry: "mediator", .. })
        ));
        assert_eq!(facade.execute("echo", json!(7)).await.unwrap(), json!(7));
    }

    #[tokio::test]
    async fn removal_rules_differ_per_registry() {
        let mut facade = Facade::new();
        assert!(matches!(
            facade.remove_command("missing"),
            Err(FacadeError::NotFound { registry: "command", .. })
        ));
        assert!(matches!(
            facade.remove_proxy("missing"),
            Err(FacadeError::NotFound { registry: "proxy", .. })
        ));
        facade.remove_mediator("missing");

        facade.add_command(Arc::new(Echo)).unwrap();
        facade.remove_command("echo").unwrap();
        assert!(!facade.has_command("echo"));
        assert!(matches!(
            facade.execute("echo", Value::Null).await,
            Err(FacadeError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn removed_mediator_stops_listening() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut facade = Facade::new();
        facade.add_proxy(users()).unwrap();
        facade.add_mediator(Arc::new(Sidebar { seen: tx })).unwrap();
        facade.remove_mediator("sidebar");
        assert!(!facade.has_mediator("sidebar"));

        facade.update("users", json!({ "name": "bob" })).await.unwrap();
        // The listener owned the only sender; once it ends the channel closes.
        let closed = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap();
        assert!(closed.is_none());
    }
}
