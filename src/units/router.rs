//! # Mountable router handles.
//!
//! The runtime does not know how requests are matched. It only knows how to
//! mount a child component's router under a path segment of its parent's
//! router. [`RouteTable`] is a minimal implementation that records flat paths;
//! real HTTP layers implement [`Router`] for their own route types.

/// Opaque, mountable request-routing handle of a component.
pub trait Router: Send + Sync + 'static {
    /// Mounts `child` under `segment`.
    fn mount(&mut self, segment: &str, child: BoxRouter);

    /// Every path served by this router, children included.
    fn paths(&self) -> Vec<String>;
}

/// Owned router handle.
pub type BoxRouter = Box<dyn Router>;

/// Router that only records paths.
#[derive(Debug, Default, Clone)]
pub struct RouteTable {
    paths: Vec<String>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a path served directly by this component.
    pub fn route(mut self, path: &str) -> Self {
        self.paths.push(join("", path));
        self
    }
}

impl Router for RouteTable {
    fn mount(&mut self, segment: &str, child: BoxRouter) {
        for path in child.paths() {
            self.paths.push(join(segment, &path));
        }
    }

    fn paths(&self) -> Vec<String> {
        self.paths.clone()
    }
}

/// Joins a mount segment and a path into one normalized absolute path.
fn join(segment: &str, path: &str) -> String {
    let parts: Vec<&str> = segment
        .split('/')
        .chain(path.split('/'))
        .filter(|p| !p.is_empty())
        .collect();
    format!("/{}", parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mounting_prefixes_child_paths() {
        let users = RouteTable::new().route("/").route("list");
        let mut api = RouteTable::new().route("/health");
        api.mount("users", Box::new(users));

        let mut root = RouteTable::new();
        root.mount("/api/", Box::new(api));

        assert_eq!(root.paths(), ["/api/health", "/api/users", "/api/users/list"]);
    }
}
