//! # Example: cluster
//!
//! A small web application split into units and run on a pool of workers.
//!
//! Demonstrates how to:
//! - Declare services ([`UnitDescriptor::service`]) and nested components.
//! - Inject a started service's interface into a component at `start`.
//! - Pick per-environment config with [`EnvConfig`].
//! - Mount component routers under their parents.
//! - Drive a [`Facade`] (commands, proxies, mediators) from a component.
//! - Let [`launch`] choose between the master and worker roles.
//!
//! ## Tree
//! ```text
//! services:   database          sessions ──► database
//! components: app ─┬─ api ── users ──► database
//!                  └─ health
//! ```
//!
//! ## Run
//! ```bash
//! UNITVISOR_ENV=development RUST_LOG=info cargo run --example cluster
//! ```
//! Press Ctrl+C to stop the master; every worker tears its units down and exits.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use unitvisor::{
    BoxRouter, Command, Dependencies, EnvConfig, Environment, Facade, FacadeError, LoadContext,
    Mediator, Notification, Proxy, RouteTable, RuntimeConfig, Unit, UnitDescriptor, UnitError,
    UnitTree, launch, logging,
};

#[derive(Debug, Clone, Deserialize)]
struct DatabaseConfig {
    url: String,
    pool: usize,
}

/// Handle other units receive for "database".
#[derive(Debug)]
struct Pool {
    url: String,
    size: usize,
}

struct Database {
    desc: UnitDescriptor,
    configs: EnvConfig<DatabaseConfig>,
    pool: Option<Arc<Pool>>,
}

impl Database {
    fn new() -> Self {
        Self {
            desc: UnitDescriptor::service("database"),
            configs: EnvConfig::new()
                .with(
                    Environment::Development,
                    DatabaseConfig { url: "postgres://localhost/dev".into(), pool: 2 },
                )
                .with(
                    Environment::Production,
                    DatabaseConfig { url: "postgres://db/prod".into(), pool: 16 },
                ),
            pool: None,
        }
    }
}

#[async_trait]
impl Unit for Database {
    fn descriptor(&self) -> &UnitDescriptor {
        &self.desc
    }

    async fn load(&mut self, ctx: &LoadContext) -> Result<(), UnitError> {
        let cfg = self
            .configs
            .select(ctx.environment)
            .map_err(|e| UnitError::Fatal { error: e.to_string() })?;
        self.pool = Some(Arc::new(Pool { url: cfg.url.clone(), size: cfg.pool }));
        Ok(())
    }

    async fn start(&mut self, _deps: Dependencies) -> Result<(), UnitError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if let Some(pool) = &self.pool {
            println!("[database] connected to {} ({} conns)", pool.url, pool.size);
        }
        Ok(())
    }

    async fn unload(&mut self) -> Result<(), UnitError> {
        self.pool = None;
        Ok(())
    }

    fn interface(&self) -> Option<unitvisor::Interface> {
        self.pool.clone().map(|p| p as unitvisor::Interface)
    }
}

struct Sessions {
    desc: UnitDescriptor,
}

#[async_trait]
impl Unit for Sessions {
    fn descriptor(&self) -> &UnitDescriptor {
        &self.desc
    }

    async fn start(&mut self, deps: Dependencies) -> Result<(), UnitError> {
        let pool = deps
            .get::<Pool>("database")
            .ok_or_else(|| UnitError::fail("database handle missing"))?;
        println!("[sessions] storing sessions in {}", pool.url);
        Ok(())
    }
}

/// Root component: only serves `/health`.
struct App {
    desc: UnitDescriptor,
}

#[async_trait]
impl Unit for App {
    fn descriptor(&self) -> &UnitDescriptor {
        &self.desc
    }

    fn router(&self) -> Option<BoxRouter> {
        Some(Box::new(RouteTable::new().route("health")))
    }
}

/// Mount point without routes of its own.
struct Api {
    desc: UnitDescriptor,
}

#[async_trait]
impl Unit for Api {
    fn descriptor(&self) -> &UnitDescriptor {
        &self.desc
    }

    fn router(&self) -> Option<BoxRouter> {
        Some(Box::new(RouteTable::new()))
    }
}

struct UserRows {
    rows: Mutex<Vec<Value>>,
}

#[async_trait]
impl Proxy for UserRows {
    fn name(&self) -> &str {
        "users"
    }

    async fn fetch(&self, _query: &Value) -> Result<Value, FacadeError> {
        let rows = self.rows.lock().map_err(|_| FacadeError::ProxyFailed {
            proxy: "users".into(),
            reason: "rows poisoned".into(),
        })?;
        Ok(Value::Array(rows.clone()))
    }

    async fn update(&self, data: Value) -> Result<Value, FacadeError> {
        let mut rows = self.rows.lock().map_err(|_| FacadeError::ProxyFailed {
            proxy: "users".into(),
            reason: "rows poisoned".into(),
        })?;
        rows.push(data.clone());
        Ok(data)
    }
}

struct Audit;

#[async_trait]
impl Mediator for Audit {
    fn name(&self) -> &str {
        "audit"
    }

    fn interests(&self) -> Vec<String> {
        vec!["users".into()]
    }

    async fn on_notification(&self, note: &Notification) {
        println!("[users] audit: {} changed to {}", note.name, note.body);
    }
}

struct Signup;

#[async_trait]
impl Command for Signup {
    fn name(&self) -> &str {
        "signup"
    }

    async fn execute(&self, payload: &Value) -> Result<Value, FacadeError> {
        Ok(json!({ "welcome": payload.get("name").cloned().unwrap_or(Value::Null) }))
    }
}

/// Leaf component owning a facade over the user rows.
struct Users {
    desc: UnitDescriptor,
    facade: Facade,
}

#[async_trait]
impl Unit for Users {
    fn descriptor(&self) -> &UnitDescriptor {
        &self.desc
    }

    async fn initialize(&mut self) -> Result<(), UnitError> {
        let fail = |e: FacadeError| UnitError::Fatal { error: e.to_string() };
        self.facade
            .add_proxy(Arc::new(UserRows { rows: Mutex::new(Vec::new()) }))
            .map_err(fail)?;
        self.facade.add_mediator(Arc::new(Audit)).map_err(fail)?;
        self.facade.add_command(Arc::new(Signup)).map_err(fail)?;
        Ok(())
    }

    async fn start(&mut self, deps: Dependencies) -> Result<(), UnitError> {
        let fail = |e: FacadeError| UnitError::fail(e.to_string());
        if !deps.contains("database") {
            return Err(UnitError::fail("database handle missing"));
        }
        self.facade.update("users", json!({ "name": "ada" })).await.map_err(fail)?;
        let reply = self.facade.execute("signup", json!({ "name": "ada" })).await.map_err(fail)?;
        println!("[users] {reply}");
        Ok(())
    }

    async fn uninitialize(&mut self) -> Result<(), UnitError> {
        self.facade.clear();
        Ok(())
    }

    fn router(&self) -> Option<BoxRouter> {
        Some(Box::new(RouteTable::new().route("").route("list")))
    }
}

fn build() -> Result<UnitTree, unitvisor::ResolveError> {
    let mut builder = UnitTree::builder(Box::new(App {
        desc: UnitDescriptor::component("app"),
    }));
    builder
        .service(Box::new(Database::new()))
        .service(Box::new(Sessions {
            desc: UnitDescriptor::service("sessions").depends_on("database"),
        }));

    let root = builder.root();
    let api = builder.child(root, "api", Box::new(Api {
        desc: UnitDescriptor::component("api"),
    }));
    builder.child(api, "users", Box::new(Users {
        desc: UnitDescriptor::component("users").depends_on("database"),
        facade: Facade::new(),
    }));
    builder.build()
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    logging::init("info");

    let env = Environment::from_env()?;
    let mut cfg = RuntimeConfig::for_environment(env);
    cfg.grace = Duration::from_secs(5);
    cfg.phase_timeout = Duration::from_secs(10);

    launch(cfg, build).await?;
    Ok(())
}
