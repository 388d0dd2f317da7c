//! Responses produced by the server itself.
//!
//! # Responsibilities
//! - Replies for the dispatch outcomes that have no handler (redirect,
//!   OPTIONS, 405, 404)
//! - Canned responses for routes declared in the config file
//!
//! # Design Decisions
//! - Every 405 and automatic OPTIONS reply carries an `Allow` header
//! - Body templates are parsed once when the route table is built

use std::borrow::Cow;

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::config::RouteConfig;
use crate::http::handler::{Handler, HandlerFuture};
use crate::routing::{AllowedMethods, PathParams};

/// Bytes escaped when a decoded path goes back into a URI: the URL path
/// percent-encode set plus `%` itself. Non-ASCII is always escaped.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-encode a decoded path for use in a URI.
pub fn encode_path(path: &str) -> Cow<'_, str> {
    utf8_percent_encode(path, PATH).into()
}

/// Redirect to `location` with the given status.
pub fn redirect(status: StatusCode, location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (status, [(header::LOCATION, value)]).into_response(),
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

/// Automatic reply to an OPTIONS request.
pub fn options(allow: &AllowedMethods) -> Response {
    let mut res = StatusCode::OK.into_response();
    set_allow(&mut res, allow);
    res
}

/// Default 405 reply.
pub fn method_not_allowed(allow: &AllowedMethods) -> Response {
    let mut res = (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").into_response();
    set_allow(&mut res, allow);
    res
}

/// Reply to a request path that does not decode to UTF-8.
pub fn bad_request() -> Response {
    (StatusCode::BAD_REQUEST, "400 bad request").into_response()
}

/// Default 404 reply.
pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 page not found").into_response()
}

/// Overwrite the `Allow` header of `res`.
pub fn set_allow(res: &mut Response, allow: &AllowedMethods) {
    if let Ok(value) = HeaderValue::from_str(&allow.to_string()) {
        res.headers_mut().insert(header::ALLOW, value);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    Param(String),
}

/// Response body with `{name}` placeholders for route parameters.
///
/// Anything between braces that is not a plain identifier (letters, digits,
/// `_`, `-`) is kept as text, so JSON bodies need no escaping. A placeholder
/// naming a parameter the request does not carry is kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyTemplate {
    pieces: Vec<Piece>,
}

impl BodyTemplate {
    pub fn parse(source: &str) -> Self {
        let mut pieces = Vec::new();
        let mut text = String::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            text.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let name_len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
                .unwrap_or(after.len());

            if name_len > 0 && after[name_len..].starts_with('}') {
                if !text.is_empty() {
                    pieces.push(Piece::Text(std::mem::take(&mut text)));
                }
                pieces.push(Piece::Param(after[..name_len].to_owned()));
                rest = &after[name_len + 1..];
            } else {
                text.push('{');
                rest = after;
            }
        }
        text.push_str(rest);
        if !text.is_empty() {
            pieces.push(Piece::Text(text));
        }

        Self { pieces }
    }

    pub fn render(&self, params: &PathParams) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Param(name) => match params.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                },
            }
        }
        out
    }
}

/// Handler serving the canned response of a configured route.
#[derive(Debug, Clone)]
pub struct ResponderHandler {
    route: String,
    status: StatusCode,
    content_type: HeaderValue,
    body: BodyTemplate,
}

impl ResponderHandler {
    /// Build the handler for `route`. Values rejected by validation fall
    /// back to `200 OK` and `text/plain`.
    pub fn from_config(route: &RouteConfig) -> Self {
        let status = StatusCode::from_u16(route.status).unwrap_or_else(|_| {
            tracing::warn!(route = %route.name, status = route.status, "Invalid status, using 200");
            StatusCode::OK
        });
        let content_type = HeaderValue::from_str(&route.content_type).unwrap_or_else(|_| {
            tracing::warn!(route = %route.name, "Invalid content type, using text/plain");
            HeaderValue::from_static("text/plain; charset=utf-8")
        });

        Self {
            route: route.name.clone(),
            status,
            content_type,
            body: BodyTemplate::parse(&route.body),
        }
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    fn respond(&self, params: &PathParams) -> Response {
        let body = self.body.render(params);
        (
            self.status,
            [(header::CONTENT_TYPE, self.content_type.clone())],
            body,
        )
            .into_response()
    }
}

impl Handler for ResponderHandler {
    fn call(&self, req: Request<Body>) -> HandlerFuture {
        let res = match req.extensions().get::<PathParams>() {
            Some(params) => self.respond(params),
            None => self.respond(&PathParams::default()),
        };
        Box::pin(async move { res })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn params(pairs: &[(&str, &str)]) -> PathParams {
        pairs.iter().copied().collect()
    }

    async fn body_string(res: Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_template_placeholders() {
        let t = BodyTemplate::parse("hello {name}, file {filepath}!");
        assert_eq!(
            t.render(&params(&[("name", "gopher"), ("filepath", "/a/b.txt")])),
            "hello gopher, file /a/b.txt!"
        );
    }

    #[test]
    fn test_template_keeps_non_placeholders() {
        let json = r#"{"user": "{id}", "empty": {}, "open": "{"}"#;
        let t = BodyTemplate::parse(json);
        assert_eq!(
            t.render(&params(&[("id", "42")])),
            r#"{"user": "42", "empty": {}, "open": "{"}"#
        );

        let t = BodyTemplate::parse("{missing} {unterminated");
        assert_eq!(t.render(&PathParams::default()), "{missing} {unterminated");
    }

    #[test]
    fn test_template_without_placeholders() {
        assert_eq!(BodyTemplate::parse("").render(&PathParams::default()), "");
        assert_eq!(
            BodyTemplate::parse("plain").pieces,
            vec![Piece::Text("plain".into())]
        );
    }

    #[test]
    fn test_allow_replies() {
        let allow: AllowedMethods = [Method::GET, Method::POST].into_iter().collect();

        let res = options(&allow);
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::ALLOW], "GET, POST");

        let res = method_not_allowed(&allow);
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers()[header::ALLOW], "GET, POST");
    }

    #[test]
    fn test_encode_path() {
        assert!(matches!(encode_path("/user/gopher"), Cow::Borrowed("/user/gopher")));
        assert_eq!(encode_path("/café/a b"), "/caf%C3%A9/a%20b");
        assert_eq!(encode_path("/100%/x?y#z"), "/100%25/x%3Fy%23z");
    }

    #[test]
    fn test_redirect_reply() {
        let res = redirect(StatusCode::MOVED_PERMANENTLY, "/path?x=1");
        assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(res.headers()[header::LOCATION], "/path?x=1");

        let res = redirect(StatusCode::MOVED_PERMANENTLY, "/bad\nheader");
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_responder_handler() {
        let route = RouteConfig {
            name: "user".into(),
            method: "GET".into(),
            path: "/user/:name".into(),
            status: 201,
            body: "hello {name}".into(),
            content_type: "text/html".into(),
        };
        let handler = ResponderHandler::from_config(&route);
        assert_eq!(handler.route(), "user");

        let mut req = Request::new(Body::empty());
        req.extensions_mut().insert(params(&[("name", "gopher")]));

        let res = handler.call(req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "text/html");
        assert_eq!(body_string(res).await, "hello gopher");

        let res = handler.call(Request::new(Body::empty())).await;
        assert_eq!(body_string(res).await, "hello {name}");
    }
}
