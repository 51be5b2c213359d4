//! The resilient RPC client: session bootstrap by HTML scraping, batched
//! `batchexecute` calls, and automatic re-bootstrap on an expired session.

use photoflow_protocol::{CookieJar, SessionState};
use serde_json::Value;

use crate::cookies::cookie_header;
use crate::error::RpcError;

const BASE_URL: &str = "https://photos.google.com";

fn extract_wiz_value(html: &str, key: &str) -> Option<String> {
    let needle = format!("\"{key}\":\"");
    let start = html.find(&needle)? + needle.len();
    let rest = &html[start..];
    let end = rest.find('"')?;
    let raw = &rest[..end];
    Some(
        raw.replace("\\u003d", "=")
            .replace("\\u0026", "&")
            .replace("\\/", "/"),
    )
}

/// Pull the `wrb.fr` envelope out of a `batchexecute` response body and
/// return its inner JSON payload. The body is a sequence of newline-delimited
/// chunks; the envelope line is the first one containing `wrb.fr`, and the
/// actual payload is double-JSON-encoded inside it at `[0][2]`.
pub fn parse_wrb_payload(body: &str) -> Result<Value, RpcError> {
    let json_line = body
        .lines()
        .map(str::trim)
        .find(|line| line.contains("wrb.fr"))
        .ok_or(RpcError::MissingEnvelope)?;

    let parsed: Value = serde_json::from_str(json_line)?;
    let payload = parsed
        .get(0)
        .and_then(|outer| outer.get(2))
        .and_then(Value::as_str)
        .ok_or(RpcError::MalformedEnvelope)?;

    Ok(serde_json::from_str(payload)?)
}

#[derive(Debug, Clone)]
pub struct RpcClientConfig {
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_base_delay_ms: 1500,
            timeout_seconds: 120,
        }
    }
}

pub struct RpcResult {
    pub data: Value,
    /// The session the call actually succeeded with; may differ from the
    /// one passed in if a mid-call re-bootstrap happened.
    pub session: SessionState,
}

pub struct RpcClient {
    http: reqwest::Client,
    cookie_jar: CookieJar,
    config: RpcClientConfig,
}

impl RpcClient {
    pub fn new(cookie_jar: CookieJar, config: RpcClientConfig) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            cookie_jar,
            config,
        })
    }

    /// Scrape a fresh [`SessionState`] out of the photos.google.com landing
    /// page. Requires the cookie jar to already hold a signed-in session.
    pub async fn bootstrap_session(&self, source_path: &str) -> Result<SessionState, RpcError> {
        if self.cookie_jar.is_empty() {
            return Err(RpcError::EmptyCookieJar);
        }

        let url = format!("{BASE_URL}{source_path}");
        let response = self
            .http
            .get(&url)
            .header("Cookie", cookie_header(&self.cookie_jar))
            .send()
            .await?;
        let response = response.error_for_status()?;
        let html = response.text().await?;

        let session = SessionState {
            account: extract_wiz_value(&html, "oPEP7c"),
            f_sid: extract_wiz_value(&html, "FdrFJe").unwrap_or_default(),
            bl: extract_wiz_value(&html, "cfb2h").unwrap_or_default(),
            path: extract_wiz_value(&html, "eptZe").unwrap_or_else(|| "/_/PhotosUi/".to_string()),
            at: extract_wiz_value(&html, "SNlM0e").unwrap_or_default(),
            rapt: extract_wiz_value(&html, "Dbw5Ud"),
        };

        if session.f_sid.is_empty() || session.bl.is_empty() || session.at.is_empty() {
            return Err(RpcError::SessionBootstrapIncomplete);
        }

        tracing::debug!(account = ?session.account, "bootstrapped rpc session");
        Ok(session)
    }

    /// Execute one batched RPC call, retrying with linear backoff and
    /// re-bootstrapping once on a 401/403 response.
    pub async fn execute_rpc(
        &self,
        session_state: SessionState,
        rpcid: &str,
        request_data: &Value,
        source_path: &str,
    ) -> Result<RpcResult, RpcError> {
        if rpcid.is_empty() {
            return Err(RpcError::IncompleteSession);
        }

        let mut current = session_state;
        let mut last_err = None;

        for attempt in 1..=self.config.max_retries {
            match self
                .execute_once(&current, rpcid, request_data, source_path)
                .await
            {
                Ok(data) => {
                    return Ok(RpcResult {
                        data,
                        session: current,
                    })
                }
                Err(err) => {
                    if err.should_rebootstrap() {
                        tracing::warn!(rpcid, attempt, "session expired, re-bootstrapping");
                        current = self.bootstrap_session(source_path).await?;
                    }
                    if attempt >= self.config.max_retries {
                        last_err = Some(err);
                        break;
                    }
                    let delay_ms = self.config.retry_base_delay_ms * attempt as u64;
                    tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or(RpcError::RetriesExhausted {
            attempts: self.config.max_retries,
        }))
    }

    async fn execute_once(
        &self,
        session: &SessionState,
        rpcid: &str,
        request_data: &Value,
        source_path: &str,
    ) -> Result<Value, RpcError> {
        if session.f_sid.is_empty() || session.bl.is_empty() || session.path.is_empty() || session.at.is_empty()
        {
            return Err(RpcError::IncompleteSession);
        }

        let wrapped = serde_json::json!([[[rpcid, request_data.to_string(), Value::Null, "generic"]]]);
        let body = format!(
            "f.req={}&at={}&",
            urlencoding::encode(&wrapped.to_string()),
            urlencoding::encode(&session.at),
        );

        let mut query = vec![
            ("rpcids".to_string(), rpcid.to_string()),
            ("source-path".to_string(), source_path.to_string()),
            ("f.sid".to_string(), session.f_sid.clone()),
            ("bl".to_string(), session.bl.clone()),
            ("pageId".to_string(), "none".to_string()),
            ("rt".to_string(), "c".to_string()),
        ];
        if let Some(rapt) = &session.rapt {
            query.push(("rapt".to_string(), rapt.clone()));
        }
        let query_string = query
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let url = format!("{BASE_URL}{}data/batchexecute?{query_string}", session.path);

        let response = self
            .http
            .post(&url)
            .header(
                "content-type",
                "application/x-www-form-urlencoded;charset=UTF-8",
            )
            .header("Cookie", cookie_header(&self.cookie_jar))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        if text.is_empty() {
            return Err(RpcError::MalformedEnvelope);
        }

        parse_wrb_payload(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrb_payload_extracts_nested_json() {
        let inner = serde_json::json!({"hello": "world"}).to_string();
        let envelope = serde_json::json!([["wrb.fr", null, inner]]).to_string();
        let body = format!(")]}}'\n\n{envelope}\n");
        let parsed = parse_wrb_payload(&body).unwrap();
        assert_eq!(parsed["hello"], "world");
    }

    #[test]
    fn wrb_payload_errors_without_envelope() {
        let err = parse_wrb_payload("just some text\nwith no envelope").unwrap_err();
        assert!(matches!(err, RpcError::MissingEnvelope));
    }

    #[test]
    fn extract_wiz_value_unescapes_sequences() {
        let html = r#"var x={"FdrFJe":"abc=123&def"};"#;
        assert_eq!(
            extract_wiz_value(html, "FdrFJe").as_deref(),
            Some("abc=123&def")
        );
    }
}
