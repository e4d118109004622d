use std::{error::Error as StdError, fmt::Display, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::intent::{
    ConsentError, ConsentRequest, ConsentResponse, Extras, RESPONSE_DATA, RESPONSE_ERROR,
};

/// Android's `Activity.RESULT_OK`.
const RESULT_OK: i32 = -1;

#[derive(Debug)]
pub enum LaunchError {
    Http(reqwest::Error),
    Status(reqwest::StatusCode),
}

impl From<reqwest::Error> for LaunchError {
    fn from(e: reqwest::Error) -> LaunchError {
        LaunchError::Http(e)
    }
}

impl Display for LaunchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaunchError::Http(e) => e.fmt(f),
            LaunchError::Status(s) => write!(f, "Activity relay answered with status {}", s),
        }
    }
}

impl StdError for LaunchError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            LaunchError::Http(e) => Some(e),
            LaunchError::Status(_) => None,
        }
    }
}

/// How the external activity settled.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityResult {
    Resolved(Option<Extras>),
    Rejected(Option<Extras>),
    /// The activity answered, but with something that is not a result.
    Unreadable(String),
}

#[async_trait]
pub trait ActivityLauncher: Send + Sync {
    async fn start_activity_for_result(
        &self,
        request: &ConsentRequest,
    ) -> Result<ActivityResult, LaunchError>;
}

#[derive(Debug, Deserialize)]
struct RelayReply {
    #[serde(rename = "resultCode")]
    result_code: i32,
    extras: Option<Extras>,
}

impl From<RelayReply> for ActivityResult {
    fn from(reply: RelayReply) -> ActivityResult {
        if reply.result_code == RESULT_OK {
            ActivityResult::Resolved(reply.extras)
        } else {
            ActivityResult::Rejected(reply.extras)
        }
    }
}

/// Forwards intents to an on-device relay that starts the activity and
/// reports its result back as JSON.
pub struct HttpActivityLauncher {
    client: reqwest::Client,
    relay_url: reqwest::Url,
}

impl HttpActivityLauncher {
    pub fn new(relay_url: reqwest::Url) -> Result<HttpActivityLauncher, LaunchError> {
        Ok(HttpActivityLauncher {
            client: reqwest::Client::builder().build()?,
            relay_url,
        })
    }
}

#[async_trait]
impl ActivityLauncher for HttpActivityLauncher {
    async fn start_activity_for_result(
        &self,
        request: &ConsentRequest,
    ) -> Result<ActivityResult, LaunchError> {
        let response = self
            .client
            .post(self.relay_url.clone())
            .json(request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(LaunchError::Status(response.status()));
        }

        let body = response.bytes().await?;
        match serde_json::from_slice::<RelayReply>(&body) {
            Ok(reply) => {
                debug!(result_code = reply.result_code, "Activity relay replied");
                Ok(reply.into())
            }
            Err(e) => Ok(ActivityResult::Unreadable(format!(
                "relay reply is not a result: {}",
                e
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InvocationOutcome {
    Success(ConsentResponse),
    Failure(ConsentError),
    MalformedResponse { reason: String },
    Unreachable { reason: String },
}

fn decode_field<T: serde::de::DeserializeOwned>(
    extras: Option<&Extras>,
    key: &str,
) -> Result<T, String> {
    let extras = extras.ok_or_else(|| "response carried no extras".to_owned())?;
    let raw = extras
        .get(key)
        .ok_or_else(|| format!("{} missing from response", key))?
        .as_str()
        .ok_or_else(|| format!("{} is not a string", key))?;
    serde_json::from_str(raw).map_err(|e| format!("{} is not valid: {}", key, e))
}

pub fn decode_outcome(result: &ActivityResult) -> InvocationOutcome {
    let decoded = match result {
        ActivityResult::Resolved(extras) => {
            decode_field(extras.as_ref(), RESPONSE_DATA).map(InvocationOutcome::Success)
        }
        ActivityResult::Rejected(extras) => {
            decode_field(extras.as_ref(), RESPONSE_ERROR).map(InvocationOutcome::Failure)
        }
        ActivityResult::Unreadable(reason) => Err(reason.clone()),
    };

    decoded.unwrap_or_else(|reason| {
        warn!(reason = reason.as_str(), "Could not decode activity result");
        InvocationOutcome::MalformedResponse { reason }
    })
}

#[derive(Clone)]
pub struct InvocationBridge {
    launcher: Arc<dyn ActivityLauncher>,
    timeout: Duration,
}

impl InvocationBridge {
    pub fn new(launcher: Arc<dyn ActivityLauncher>, timeout: Duration) -> InvocationBridge {
        InvocationBridge { launcher, timeout }
    }

    pub async fn invoke(&self, request: &ConsentRequest) -> InvocationOutcome {
        info!(
            component = request.component().class.as_str(),
            package = request.component().package.as_str(),
            "Starting activity for result"
        );

        let launch = self.launcher.start_activity_for_result(request);
        let outcome = match tokio::time::timeout(self.timeout, launch).await {
            Ok(Ok(result)) => decode_outcome(&result),
            Ok(Err(e)) => {
                let reason = e.to_string();
                warn!(error = reason.as_str(), "Could not reach activity");
                InvocationOutcome::Unreachable { reason }
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "Activity did not settle in time");
                InvocationOutcome::Unreachable {
                    reason: format!("no result within {} seconds", self.timeout.as_secs_f64()),
                }
            }
        };

        info!(?outcome, "Activity settled");
        outcome
    }
}
