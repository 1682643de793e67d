//! Programmatic extension points that cannot live in a config file.

use std::fmt;
use std::io;
use std::sync::Arc;

use crate::dev::DevApp;

/// A compiler plugin contributing a prologue to every chunk.
///
/// Plugins run in list order. Content is produced when a build runs, not
/// when the plugin is registered.
pub trait BundlePlugin: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Source placed ahead of the entry, or `None` to contribute nothing.
    fn prologue(&self) -> io::Result<Option<String>>;
}

/// Operator hook run against the server app before any tether routes are
/// mounted.
#[derive(Clone)]
pub struct MiddlewareHook(Arc<dyn Fn(&mut DevApp) + Send + Sync>);

impl MiddlewareHook {
    pub fn new(hook: impl Fn(&mut DevApp) + Send + Sync + 'static) -> Self {
        Self(Arc::new(hook))
    }

    pub fn call(&self, app: &mut DevApp) {
        (self.0)(app)
    }
}

impl fmt::Debug for MiddlewareHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MiddlewareHook(..)")
    }
}
