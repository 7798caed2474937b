use crate::auth::{AccessTokenProvider, AuthError};
use crate::config::Config;
use async_trait::async_trait;
use http::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Errors that can occur while delivering a row to the spreadsheet API.
///
/// Everything the HTTP layer can throw is converted into one of these
/// variants; callers decide recovery policy, the client never panics and
/// never lets a transport error escape raw.
#[derive(thiserror::Error, Debug)]
pub enum AppendError {
    #[error("credential failure: {0}")]
    Credentials(String),

    #[error("rate limited by the spreadsheet API")]
    RateLimited,

    #[error("spreadsheet target rejected: {0}")]
    InvalidTarget(String),

    #[error("append timed out")]
    Timeout,

    #[error("network failure: {0}")]
    Network(String),

    #[error("spreadsheet API returned {status}: {body}")]
    Upstream { status: u16, body: String },
}

impl From<AuthError> for AppendError {
    fn from(e: AuthError) -> Self {
        AppendError::Credentials(e.to_string())
    }
}

/// Cells changed by a successful append, as reported by the API.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSummary {
    #[serde(default)]
    pub updated_range: String,
    #[serde(default)]
    pub updated_rows: u32,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct AppendOutcome {
    #[serde(default)]
    pub updates: UpdateSummary,
}

/// Appends one ordered row after the current last row of a sheet.
#[async_trait]
pub trait RowAppender: Send + Sync {
    async fn append(&self, row: Vec<String>) -> Result<AppendOutcome, AppendError>;
}

/// Client for the Google Sheets v4 values.append endpoint.
///
/// Rows are delivered with `insertDataOption=INSERT_ROWS`, so the API places
/// each row after the last existing one; existing rows are never overwritten
/// and no fixed row number is assumed.
pub struct SheetsClient {
    http: reqwest::Client,
    config: Config,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl SheetsClient {
    pub fn new(
        config: Config,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self, AppendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| AppendError::Network(e.to_string()))?;

        Ok(SheetsClient {
            http,
            config,
            tokens,
        })
    }

    fn append_url(&self) -> Result<Url, AppendError> {
        let path = format!(
            "/v4/spreadsheets/{}/values/{}:append",
            self.config.spreadsheet_id, self.config.range
        );
        self.config
            .api_base
            .join(&path)
            .map_err(|e| AppendError::InvalidTarget(e.to_string()))
    }
}

#[async_trait]
impl RowAppender for SheetsClient {
    async fn append(&self, row: Vec<String>) -> Result<AppendOutcome, AppendError> {
        let token = self.tokens.access_token().await?;
        let url = self.append_url()?;
        let body = json!({ "values": [row] });

        let response = self
            .http
            .post(url)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status.is_success() {
            // The append still happened if the success body is unreadable;
            // fall back to an empty summary rather than failing the call.
            let outcome = response.json::<AppendOutcome>().await.unwrap_or_default();
            tracing::debug!(
                updated_range = %outcome.updates.updated_range,
                updated_rows = outcome.updates.updated_rows,
                "row appended"
            );
            return Ok(outcome);
        }

        let body_text = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppendError::Credentials(body_text),
            StatusCode::TOO_MANY_REQUESTS => AppendError::RateLimited,
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => AppendError::InvalidTarget(body_text),
            _ => AppendError::Upstream {
                status: status.as_u16(),
                body: body_text,
            },
        })
    }
}

fn classify_transport_error(e: reqwest::Error) -> AppendError {
    if e.is_timeout() {
        AppendError::Timeout
    } else {
        AppendError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenProvider;
    use http_body_util::BodyExt;
    use http_body_util::Full;
    use hyper::body::{Bytes, Incoming};
    use hyper::service::service_fn;
    use hyper::{Request, Response};
    use std::convert::Infallible;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    #[derive(Debug)]
    struct Captured {
        path_and_query: String,
        authorization: String,
        body: serde_json::Value,
    }

    /// Spins up a local server that answers every request with the given
    /// status/body and reports what it received on the channel.
    async fn start_test_server(
        status: u16,
        response_body: &'static str,
        tx: mpsc::UnboundedSender<Captured>,
    ) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = hyper_util::rt::TokioIo::new(stream);
                let tx = tx.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let tx = tx.clone();
                        async move {
                            let (parts, body) = req.into_parts();
                            let bytes = body.collect().await.unwrap().to_bytes();
                            let _ = tx.send(Captured {
                                path_and_query: parts
                                    .uri
                                    .path_and_query()
                                    .map(|pq| pq.to_string())
                                    .unwrap_or_default(),
                                authorization: parts
                                    .headers
                                    .get("authorization")
                                    .and_then(|v| v.to_str().ok())
                                    .unwrap_or_default()
                                    .to_string(),
                                body: serde_json::from_slice(&bytes)
                                    .unwrap_or(serde_json::Value::Null),
                            });

                            let mut response =
                                Response::new(Full::new(Bytes::from_static(response_body.as_bytes())));
                            *response.status_mut() = hyper::StatusCode::from_u16(status).unwrap();
                            Ok::<_, Infallible>(response)
                        }
                    });

                    let _ = hyper_util::server::conn::auto::Builder::new(
                        hyper_util::rt::TokioExecutor::new(),
                    )
                    .serve_connection(io, service)
                    .await;
                });
            }
        });

        port
    }

    fn test_client(port: u16) -> SheetsClient {
        let config = Config {
            spreadsheet_id: "sheet-123".to_string(),
            range: "Sheet1".to_string(),
            api_base: Url::parse(&format!("http://127.0.0.1:{port}")).unwrap(),
            http_timeout_secs: 2,
        };
        SheetsClient::new(config, Arc::new(StaticTokenProvider::new("test-token"))).unwrap()
    }

    fn sample_row() -> Vec<String> {
        vec!["Jane".to_string(), "Doe".to_string(), "+15550100".to_string()]
    }

    #[tokio::test]
    async fn test_append_success() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let port = start_test_server(
            200,
            r#"{"updates":{"updatedRange":"Sheet1!A5:K5","updatedRows":1}}"#,
            tx,
        )
        .await;

        let outcome = test_client(port).append(sample_row()).await.unwrap();
        assert_eq!(outcome.updates.updated_range, "Sheet1!A5:K5");
        assert_eq!(outcome.updates.updated_rows, 1);

        let captured = rx.recv().await.unwrap();
        assert!(
            captured
                .path_and_query
                .starts_with("/v4/spreadsheets/sheet-123/values/Sheet1:append")
        );
        assert!(captured.path_and_query.contains("valueInputOption=USER_ENTERED"));
        assert!(captured.path_and_query.contains("insertDataOption=INSERT_ROWS"));
        assert_eq!(captured.authorization, "Bearer test-token");
        assert_eq!(
            captured.body["values"][0],
            serde_json::json!(["Jane", "Doe", "+15550100"])
        );
    }

    #[tokio::test]
    async fn test_append_success_with_unreadable_body() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let port = start_test_server(200, "not json", tx).await;

        let outcome = test_client(port).append(sample_row()).await.unwrap();
        assert_eq!(outcome, AppendOutcome::default());
    }

    #[tokio::test]
    async fn test_append_credential_failure() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let port = start_test_server(401, r#"{"error":"invalid auth"}"#, tx).await;

        let err = test_client(port).append(sample_row()).await.unwrap_err();
        assert!(matches!(err, AppendError::Credentials(_)));
        assert!(err.to_string().contains("invalid auth"));
    }

    #[tokio::test]
    async fn test_append_rate_limited() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let port = start_test_server(429, "", tx).await;

        let err = test_client(port).append(sample_row()).await.unwrap_err();
        assert!(matches!(err, AppendError::RateLimited));
    }

    #[tokio::test]
    async fn test_append_bad_target() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let port = start_test_server(404, "Requested entity was not found", tx).await;

        let err = test_client(port).append(sample_row()).await.unwrap_err();
        assert!(matches!(err, AppendError::InvalidTarget(_)));
    }

    #[tokio::test]
    async fn test_append_unexpected_status() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let port = start_test_server(503, "backend unavailable", tx).await;

        let err = test_client(port).append(sample_row()).await.unwrap_err();
        assert!(matches!(err, AppendError::Upstream { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_append_connection_refused() {
        // Grab a free port, then drop the listener so nothing is there.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = test_client(port).append(sample_row()).await.unwrap_err();
        assert!(matches!(err, AppendError::Network(_)));
    }

    #[tokio::test]
    async fn test_append_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        // Accept connections but never answer.
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    tokio::time::sleep(std::time::Duration::from_secs(10)).await;
                    drop(stream);
                });
            }
        });

        let config = Config {
            spreadsheet_id: "sheet-123".to_string(),
            range: "Sheet1".to_string(),
            api_base: Url::parse(&format!("http://127.0.0.1:{port}")).unwrap(),
            http_timeout_secs: 1,
        };
        let client =
            SheetsClient::new(config, Arc::new(StaticTokenProvider::new("test-token"))).unwrap();

        let err = client.append(sample_row()).await.unwrap_err();
        assert!(matches!(err, AppendError::Timeout));
    }
}
