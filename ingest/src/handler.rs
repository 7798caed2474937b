use crate::envelope;
use crate::metrics_defs;
use crate::overflow::FailureStore;
use crate::report::CallReport;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::HeaderMap;
use hyper::{Response, StatusCode};
use serde_json::{Value, json};
use shared::http::make_json_response;
use sheets::RowAppender;
use std::sync::Arc;

pub const SECRET_HEADER: &str = "x-vapi-secret";

/// Per-request pipeline: validate the payload, map it to a row, deliver it,
/// and fall back to the overflow store when delivery fails.
///
/// Every structurally valid payload is acknowledged with 200 regardless of
/// delivery outcome -- redelivery is this service's problem, not the
/// sender's. The one exception is the overflow store itself failing, which
/// is answered with 500 because at that point the report may be lost.
pub struct WebhookHandler {
    secret_token: Option<String>,
    appender: Arc<dyn RowAppender>,
    overflow: Arc<dyn FailureStore>,
}

impl WebhookHandler {
    pub fn new(
        secret_token: Option<String>,
        appender: Arc<dyn RowAppender>,
        overflow: Arc<dyn FailureStore>,
    ) -> Self {
        WebhookHandler {
            secret_token,
            appender,
            overflow,
        }
    }

    pub async fn handle(&self, headers: &HeaderMap, body: &[u8]) -> Response<Full<Bytes>> {
        metrics::counter!(metrics_defs::REPORTS_RECEIVED.name).increment(1);

        if !self.authorized(headers) {
            return make_json_response(
                StatusCode::UNAUTHORIZED,
                &json!({"status": "unauthorized", "message": "invalid X-Vapi-Secret header"}),
            );
        }

        let payload: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                metrics::counter!(metrics_defs::REPORTS_REJECTED.name).increment(1);
                tracing::warn!(error = %e, "rejecting unparseable webhook body");
                return make_json_response(
                    StatusCode::BAD_REQUEST,
                    &json!({"status": "rejected", "message": "body is not valid JSON"}),
                );
            }
        };

        // An envelope is triaged by message type; a bare object is treated
        // as the report itself.
        let empty = Value::Object(serde_json::Map::new());
        let report_value = if envelope::is_envelope(&payload) {
            if envelope::message_type(&payload) != Some(envelope::END_OF_CALL_REPORT) {
                metrics::counter!(metrics_defs::REPORTS_IGNORED.name).increment(1);
                tracing::debug!(
                    message_type = envelope::message_type(&payload).unwrap_or("<none>"),
                    "ignoring non-report webhook message"
                );
                return make_json_response(
                    StatusCode::OK,
                    &json!({"status": "ignored", "reason": "not an end-of-call-report"}),
                );
            }
            match envelope::structured_data(&payload) {
                Some(data) => data,
                None => {
                    tracing::warn!("no structured data in end-of-call envelope");
                    &empty
                }
            }
        } else {
            &payload
        };

        let mut report = match CallReport::from_value(report_value) {
            Ok(report) => report,
            Err(e) => {
                metrics::counter!(metrics_defs::REPORTS_REJECTED.name).increment(1);
                tracing::warn!(error = %e, "rejecting malformed call report");
                return make_json_response(
                    StatusCode::BAD_REQUEST,
                    &json!({"status": "rejected", "message": e.to_string()}),
                );
            }
        };

        // The analysis step sometimes fails to pull a usable phone number;
        // the telephony caller ID in the envelope is authoritative then.
        if envelope::needs_phone_backfill(&report.phone_number)
            && let Some(number) = envelope::customer_number(&payload)
        {
            tracing::debug!("falling back to telephony caller ID for phone number");
            report.phone_number = number.to_string();
        }

        self.deliver(report).await
    }

    async fn deliver(&self, report: CallReport) -> Response<Full<Bytes>> {
        match self.appender.append(report.to_row()).await {
            Ok(outcome) => {
                metrics::counter!(metrics_defs::REPORTS_DELIVERED.name).increment(1);
                tracing::info!(
                    updated_range = %outcome.updates.updated_range,
                    "call report delivered"
                );
                make_json_response(
                    StatusCode::OK,
                    &json!({"status": "success", "message": "row appended to sheet"}),
                )
            }
            Err(append_err) => {
                tracing::warn!(error = %append_err, "sheet append failed; recording to overflow store");
                match self.overflow.record(&report, &append_err.to_string()).await {
                    Ok(()) => {
                        metrics::counter!(metrics_defs::REPORTS_RECOVERED.name).increment(1);
                        make_json_response(
                            StatusCode::OK,
                            &json!({
                                "status": "partial_failure",
                                "message": "failed to write to sheet, report logged locally",
                            }),
                        )
                    }
                    Err(sink_err) => {
                        metrics::counter!(metrics_defs::REPORTS_LOST.name).increment(1);
                        tracing::error!(
                            error = %sink_err,
                            append_error = %append_err,
                            "overflow store unwritable; call report may be lost"
                        );
                        make_json_response(
                            StatusCode::INTERNAL_SERVER_ERROR,
                            &json!({
                                "status": "error",
                                "message": "delivery and local recovery both failed",
                            }),
                        )
                    }
                }
            }
        }
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        match &self.secret_token {
            None => true,
            Some(expected) => headers
                .get(SECRET_HEADER)
                .and_then(|value| value.to_str().ok())
                .is_some_and(|value| value == expected),
        }
    }
}
