//! Data proxies: named access to one slice of a component's data.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FacadeError;

/// Named data accessor registered in a [`Facade`](crate::Facade).
///
/// A successful [`Proxy::update`] made through the facade is announced to
/// mediators as a [`Notification`](crate::Notification) named after the proxy.
#[async_trait]
pub trait Proxy: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Reads data matching `query`.
    async fn fetch(&self, query: &Value) -> Result<Value, FacadeError>;

    /// Writes `data`; returns the stored value, which is also the notification body.
    async fn update(&self, data: Value) -> Result<Value, FacadeError>;
}
