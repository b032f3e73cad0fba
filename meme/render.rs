use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use super::attempt::Attempt;
use super::error::{MemeError, MemeResult};

pub const IMGFLIP_CAPTION_URL: &str = "https://api.imgflip.com/caption_image";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub api_url: String,
    pub timeout_secs: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            api_url: IMGFLIP_CAPTION_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

/// Outcome of one captioning request that reached the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderResult {
    pub success: bool,
    pub image_url: Option<String>,
    pub error_message: Option<String>,
    pub raw_response: Value,
}

impl RenderResult {
    /// Interprets a captioning service reply.
    ///
    /// Only a 200 with a JSON body counts as a reply; anything else is a
    /// transport error. A reply with `success: false` is returned, not raised.
    pub fn from_response(status: StatusCode, body: &str) -> MemeResult<Self> {
        if status != StatusCode::OK {
            return Err(MemeError::RenderTransport(format!(
                "captioning service returned {status}"
            )));
        }

        let raw_response: Value = serde_json::from_str(body).map_err(|err| {
            MemeError::RenderTransport(format!("unparseable response body: {err}"))
        })?;

        if raw_response["success"].as_bool().unwrap_or(false) {
            let image_url = raw_response["data"]["url"]
                .as_str()
                .ok_or_else(|| {
                    MemeError::RenderTransport(
                        "success response is missing data.url".to_string(),
                    )
                })?
                .to_string();

            Ok(RenderResult {
                success: true,
                image_url: Some(image_url),
                error_message: None,
                raw_response,
            })
        } else {
            let error_message = raw_response["error_message"]
                .as_str()
                .unwrap_or("Unknown error")
                .to_string();

            Ok(RenderResult {
                success: false,
                image_url: None,
                error_message: Some(error_message),
                raw_response,
            })
        }
    }
}

/// Client for the imgflip `caption_image` endpoint. Never retries.
#[derive(Clone)]
pub struct RenderClient {
    http: reqwest::Client,
    api_url: String,
}

impl RenderClient {
    pub fn new(config: &RenderConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        anyhow::Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: reqwest::Client, config: &RenderConfig) -> Self {
        RenderClient {
            http,
            api_url: config.api_url.clone(),
        }
    }

    pub async fn render(
        &self,
        attempt: &Attempt,
        credentials: &Credentials,
    ) -> MemeResult<RenderResult> {
        let mut form = attempt.form_fields();
        form.push(("username".to_string(), credentials.username.clone()));
        form.push(("password".to_string(), credentials.password.clone()));

        tracing::info!(
            template_id = attempt.template_id.as_deref().unwrap_or_default(),
            "sending caption request"
        );

        let response = self
            .http
            .post(&self.api_url)
            .form(&form)
            .send()
            .await
            .map_err(describe_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(describe_transport_error)?;
        let result = RenderResult::from_response(status, &body)?;

        match &result.error_message {
            None => tracing::info!(image_url = ?result.image_url, "meme rendered"),
            Some(error_message) => tracing::warn!(%error_message, "captioning service declined"),
        }

        Ok(result)
    }
}

fn describe_transport_error(err: reqwest::Error) -> MemeError {
    let description = if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("unable to reach the captioning service: {err}")
    } else {
        err.to_string()
    };
    MemeError::RenderTransport(description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn success_body_yields_image_url() {
        let result = RenderResult::from_response(
            StatusCode::OK,
            r#"{"success": true, "data": {"url": "http://x/y.jpg", "page_url": "http://x/y"}}"#,
        )
        .unwrap();

        assert!(result.success);
        assert_eq!(result.image_url.as_deref(), Some("http://x/y.jpg"));
        assert_eq!(result.error_message, None);
        assert_eq!(result.raw_response["data"]["page_url"], "http://x/y");
    }

    #[test]
    fn rejection_body_is_returned_not_raised() {
        let result = RenderResult::from_response(
            StatusCode::OK,
            r#"{"success": false, "error_message": "bad template"}"#,
        )
        .unwrap();

        assert_eq!(
            result,
            RenderResult {
                success: false,
                image_url: None,
                error_message: Some("bad template".to_string()),
                raw_response: json!({"success": false, "error_message": "bad template"}),
            }
        );
    }

    #[test]
    fn rejection_without_message_is_unknown_error() {
        let result = RenderResult::from_response(StatusCode::OK, r#"{"success": false}"#).unwrap();
        assert_eq!(result.error_message.as_deref(), Some("Unknown error"));
    }

    #[test]
    fn transport_failures_are_errors() {
        for (status, body) in [
            (StatusCode::INTERNAL_SERVER_ERROR, r#"{"success": false}"#),
            (StatusCode::OK, "<html>bad gateway</html>"),
            (StatusCode::OK, r#"{"success": true, "data": {}}"#),
        ] {
            assert!(matches!(
                RenderResult::from_response(status, body),
                Err(MemeError::RenderTransport(_))
            ));
        }
    }

    #[test]
    fn credentials_debug_hides_password() {
        let rendered = format!("{:?}", Credentials::new("user", "hunter2"));
        assert!(rendered.contains("user"));
        assert!(!rendered.contains("hunter2"));
    }
}
