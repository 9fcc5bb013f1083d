//! A canned API server for exercising the kube-backed lister.

use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

pub const NAMESPACES_PATH: &str = "/api/v1/namespaces";

pub const FORBIDDEN_JSON: &str = r#"{"kind":"Status","apiVersion":"v1","metadata":{},"status":"Failure","message":"namespaces is forbidden: User \"dev\" cannot list resource \"namespaces\"","reason":"Forbidden","code":403}"#;

/// Answers GET requests by exact path; anything else is a 404.
#[derive(Clone, Default)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<String, (u16, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
        self
    }

    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let found = if *req.method() == http::Method::GET {
            self.responses.lock().unwrap().get(req.uri().path()).cloned()
        } else {
            None
        };
        let (status, body) = found.unwrap_or_else(|| {
            (
                404,
                r#"{"kind":"Status","apiVersion":"v1","metadata":{},"status":"Failure","message":"not found","reason":"NotFound","code":404}"#
                    .to_string(),
            )
        });

        Box::pin(async move {
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

pub fn namespace_list_json(names: &[&str]) -> String {
    let items: Vec<_> = names
        .iter()
        .map(|name| {
            serde_json::json!({
                "apiVersion": "v1",
                "kind": "Namespace",
                "metadata": { "name": name },
                "status": { "phase": "Active" }
            })
        })
        .collect();

    serde_json::json!({
        "apiVersion": "v1",
        "kind": "NamespaceList",
        "metadata": { "resourceVersion": "1" },
        "items": items
    })
    .to_string()
}
