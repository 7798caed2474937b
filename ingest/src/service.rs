use crate::errors::IngestError;
use crate::handler::WebhookHandler;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use serde_json::json;
use shared::http::{make_error_response, make_json_response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub const WEBHOOK_PATH: &str = "/api/vapi/webhook";

/// HTTP surface of the webhook: a healthcheck at `/` for keep-alive pings
/// and the report pipeline at the webhook path. Everything else is 404.
#[derive(Clone)]
pub struct IngestService {
    handler: Arc<WebhookHandler>,
}

impl IngestService {
    pub fn new(handler: WebhookHandler) -> Self {
        IngestService {
            handler: Arc::new(handler),
        }
    }
}

impl<B> Service<Request<B>> for IngestService
where
    B: hyper::body::Body + Send + 'static,
    B::Data: Send,
    B::Error: std::fmt::Display + Send,
{
    type Response = Response<Full<Bytes>>;
    type Error = IngestError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let handler = self.handler.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let path = parts.uri.path();

            let response = if path == "/"
                && (parts.method == Method::GET || parts.method == Method::HEAD)
            {
                health_response(&parts.method)
            } else if path == WEBHOOK_PATH && parts.method == Method::POST {
                match body.collect().await {
                    Ok(collected) => {
                        handler
                            .handle(&parts.headers, &collected.to_bytes())
                            .await
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to read request body");
                        make_error_response(StatusCode::BAD_REQUEST)
                    }
                }
            } else {
                make_error_response(StatusCode::NOT_FOUND)
            };

            Ok(response)
        })
    }
}

// HEAD gets the status without a body; uptime monitors use both.
fn health_response(method: &Method) -> Response<Full<Bytes>> {
    if method == Method::HEAD {
        return Response::new(Full::new(Bytes::new()));
    }
    make_json_response(
        StatusCode::OK,
        &json!({"status": "ok", "service": "call report webhook"}),
    )
}
