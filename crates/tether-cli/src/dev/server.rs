//! HTTP surface of the development server.
//!
//! Route precedence, highest first:
//! 1. Operator routes added through the `on_before_setup_middleware` hook
//! 2. `/<platform>` mounts of each target's `platform_www`
//! 3. `/__tether_sse__` and `/__tether_reload__.js`
//! 4. Routers merged by the hook, in order; a 404 from one passes the request on
//! 5. Compiled chunks from memory, then the static directory (with an
//!    `index.html` history fallback when enabled)

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Response, Sse,
    },
    routing::{get, MethodRouter},
    Router,
};
use tether_native::TargetSet;
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};
use tower::ServiceExt;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
};

use crate::config::MiddlewareHook;
use crate::dev::{DevEvent, SharedState, RELOAD_CLIENT};
use crate::ui;

pub const SSE_PATH: &str = "/__tether_sse__";
pub const RELOAD_SCRIPT_PATH: &str = "/__tether_reload__.js";

/// The server app handed to the operator hook before tether mounts its own
/// routes.
///
/// Mounts made through [`DevApp::serve_dir`] and [`DevApp::nest_service`] are
/// tracked, so tether will not mount over them. Routers added with
/// [`DevApp::merge`] are not inspected and may carry their own fallback.
pub struct DevApp {
    router: Router,
    merged: Vec<Router>,
    mounts: BTreeSet<String>,
    project_root: PathBuf,
}

impl DevApp {
    pub(crate) fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            router: Router::new(),
            merged: Vec::new(),
            mounts: BTreeSet::new(),
            project_root: project_root.into(),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Add a route at an exact path.
    pub fn route(&mut self, path: &str, method_router: MethodRouter) -> &mut Self {
        self.router = std::mem::take(&mut self.router).route(path, method_router);
        self
    }

    /// Mount a service under `path` and everything below it.
    pub fn nest_service<S>(&mut self, path: &str, service: S) -> &mut Self
    where
        S: tower::Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
        S::Response: IntoResponse,
        S::Future: Send + 'static,
    {
        self.router = std::mem::take(&mut self.router).nest_service(path, service);
        self.mounts.insert(normalize_mount(path));
        self
    }

    /// Serve files from `dir` under `path`.
    pub fn serve_dir(&mut self, path: &str, dir: impl AsRef<Path>) -> &mut Self {
        self.nest_service(path, ServeDir::new(dir))
    }

    /// Consult `router` for requests no route or mount matched, before the
    /// compiled chunks and static files. A 404 response passes the request on.
    pub fn merge(&mut self, router: Router) -> &mut Self {
        self.merged.push(router);
        self
    }

    pub fn is_mounted(&self, path: &str) -> bool {
        self.mounts.contains(&normalize_mount(path))
    }

    fn into_parts(self) -> (Router, Vec<Router>) {
        (self.router, self.merged)
    }
}

fn normalize_mount(path: &str) -> String {
    format!("/{}", path.trim_matches('/'))
}

/// What the router is built from.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub project_root: PathBuf,
    pub static_dir: PathBuf,
    pub history_api_fallback: bool,
    pub targets: TargetSet,
    pub hook: Option<MiddlewareHook>,
}

#[derive(Clone)]
struct AppState {
    dev: SharedState,
    merged: Vec<Router>,
    static_files: Router,
}

/// Compose the full router: operator hook, platform mounts, then tether's
/// own routes.
pub fn build_router(settings: &RouterSettings, dev: SharedState) -> Router {
    let mut app = DevApp::new(&settings.project_root);

    if let Some(hook) = &settings.hook {
        tracing::debug!("running on_before_setup_middleware hook");
        hook.call(&mut app);
    }

    for platform in settings.targets.iter() {
        let mount = platform.mount_path();
        if app.is_mounted(&mount) {
            ui::warning(&format!(
                "{mount} is already mounted by on_before_setup_middleware; not serving platform_www there"
            ));
            continue;
        }
        let dir = platform.platform_www(&settings.project_root);
        tracing::debug!(%mount, dir = %dir.display(), "mounting platform_www");
        app.serve_dir(&mount, dir);
    }

    let (router, merged) = app.into_parts();
    let state = AppState {
        dev,
        merged,
        static_files: static_router(&settings.static_dir, settings.history_api_fallback),
    };

    let tether = Router::new()
        .route(SSE_PATH, get(handle_sse))
        .route(RELOAD_SCRIPT_PATH, get(handle_reload_script))
        .fallback(handle_fallback)
        .with_state(state);

    router
        .merge(tether)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

fn static_router(static_dir: &Path, history_api_fallback: bool) -> Router {
    if history_api_fallback {
        let index = ServeFile::new(static_dir.join("index.html"));
        Router::new().fallback_service(ServeDir::new(static_dir).fallback(index))
    } else {
        Router::new().fallback_service(ServeDir::new(static_dir))
    }
}

/// Live-reload event stream.
async fn handle_sse(
    State(app): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (id, rx) = app.dev.register_client();
    tracing::debug!(client = id, "live-reload client connected");

    app.dev.broadcast(&DevEvent::ClientConnected { id }).await;

    let stream = ReceiverStream::new(rx).map(|data| Ok(Event::default().data(data)));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

async fn handle_reload_script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], RELOAD_CLIENT)
}

/// Merged operator routers, then compiled chunks, then the static directory.
async fn handle_fallback(State(app): State<AppState>, request: Request) -> Response {
    let request = if app.merged.is_empty() {
        request
    } else {
        match offer_to_merged(&app.merged, request).await {
            Ok(response) => return response,
            Err(request) => request,
        }
    };

    if let Some((content, content_type)) = app.dev.cached_file(request.uri().path()) {
        return ([(header::CONTENT_TYPE, content_type)], content).into_response();
    }

    match app.static_files.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

/// First non-404 response from `routers`, or the request back for the next
/// stage.
async fn offer_to_merged(routers: &[Router], request: Request) -> Result<Response, Request> {
    let (parts, body) = request.into_parts();
    let body = match to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(err) => return Ok((StatusCode::BAD_REQUEST, err.to_string()).into_response()),
    };

    for router in routers {
        let attempt = Request::from_parts(parts.clone(), Body::from(body.clone()));
        let response = match router.clone().oneshot(attempt).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        if response.status() != StatusCode::NOT_FOUND {
            return Ok(response);
        }
    }

    Err(Request::from_parts(parts, Body::from(body)))
}
