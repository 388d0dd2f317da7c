//! Static files served under a catch-all route.

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::http::handler::{BoxHandler, Handler, HandlerFuture};
use crate::http::response;
use crate::routing::{PathParams, RouteError, RouterBuilder};

const FILEPATH: &str = "filepath";

/// Handler serving files from a directory. The matched `filepath`
/// parameter, not the request path, names the file.
#[derive(Clone)]
pub struct FilesHandler {
    dir: ServeDir,
}

impl FilesHandler {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: ServeDir::new(dir),
        }
    }
}

impl Handler for FilesHandler {
    fn call(&self, mut req: Request<Body>) -> HandlerFuture {
        let filepath = req
            .extensions()
            .get::<PathParams>()
            .and_then(|params| params.get(FILEPATH))
            .unwrap_or("/");

        let target = match req.uri().query() {
            Some(query) => format!("{}?{query}", response::encode_path(filepath)),
            None => response::encode_path(filepath).into_owned(),
        };
        match target.parse::<Uri>() {
            Ok(uri) => *req.uri_mut() = uri,
            Err(_) => return Box::pin(async { response::bad_request() }),
        }

        let dir = self.dir.clone();
        Box::pin(async move {
            match dir.oneshot(req).await {
                Ok(res) => res.map(Body::new).into_response(),
                Err(e) => {
                    tracing::error!(error = %e, "File service failed");
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        })
    }
}

impl RouterBuilder<BoxHandler> {
    /// Serve files from `dir` for GET requests matching `pattern`, which
    /// must end in `/*filepath`. `/static/*filepath` maps
    /// `/static/css/site.css` to `dir/css/site.css`.
    pub fn serve_files(&mut self, pattern: &str, dir: impl AsRef<Path>) -> Result<&mut Self, RouteError> {
        if !pattern.ends_with("/*filepath") {
            return Err(RouteError::InvalidFilesPattern {
                pattern: pattern.to_owned(),
            });
        }
        tracing::debug!(pattern, dir = %dir.as_ref().display(), "Serving files");
        self.get(pattern, Arc::new(FilesHandler::new(dir)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::service::RouterService;
    use crate::routing::Router;
    use axum::http::Method;
    use std::fs;

    fn request(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_string(res: Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_serve_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("css/site.css"), "body {}").unwrap();
        fs::write(dir.path().join("read me.txt"), "spaced").unwrap();

        let mut builder: RouterBuilder<BoxHandler> = Router::builder();
        builder.serve_files("/static/*filepath", dir.path()).unwrap();
        let svc = RouterService::new(builder.build());

        let res = svc.clone().oneshot(request("/static/css/site.css")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_string(res).await, "body {}");

        let res = svc.clone().oneshot(request("/static/read%20me.txt")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_string(res).await, "spaced");

        let res = svc.clone().oneshot(request("/static/missing.txt")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        // files never escape the directory
        let res = svc.oneshot(request("/static/%2E%2E/secret")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_serve_files_requires_filepath_catch_all() {
        let mut builder: RouterBuilder<BoxHandler> = Router::builder();
        for pattern in ["/static/:file", "/static/*path", "/static/"] {
            let err = builder.serve_files(pattern, ".").err();
            assert_eq!(
                err,
                Some(RouteError::InvalidFilesPattern {
                    pattern: pattern.to_owned()
                })
            );
        }
        assert!(builder.build().is_empty());
    }
}
