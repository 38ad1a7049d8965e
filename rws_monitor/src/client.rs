use std::fmt;

use reqwest::redirect::Policy;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RwsClientConfig;
use crate::errors::{EndpointError, MonitorError};

/// The five RWS resources read on every poll cycle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `/rw/panel/ctrlstate` - motor power state, HTML.
    ControllerState,
    /// `/rw/rapid/execution` - RAPID program execution state, HTML.
    RapidExecution,
    /// `/rw/motionsystem/mechunits/{unit}/robtarget` - TCP position, HTML.
    RobTarget,
    /// Gripper digital input signal, JSON.
    Gripper,
    /// TCP speed analog output signal, JSON.
    TcpSpeed,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::ControllerState,
        Endpoint::RapidExecution,
        Endpoint::RobTarget,
        Endpoint::Gripper,
        Endpoint::TcpSpeed,
    ];

    /// Path and query relative to the controller's base URL.
    pub fn path(&self, config: &RwsClientConfig) -> String {
        match self {
            Endpoint::ControllerState => "/rw/panel/ctrlstate/".to_string(),
            Endpoint::RapidExecution => "/rw/rapid/execution".to_string(),
            Endpoint::RobTarget => format!(
                "/rw/motionsystem/mechunits/{}/robtarget?tool={}&wobj={}&coordinate={}",
                config.mechunit, config.tool, config.wobj, config.coordinate
            ),
            Endpoint::Gripper => format!("/rw/iosystem/signals/{}?json=1", config.gripper_signal),
            Endpoint::TcpSpeed => format!("/rw/iosystem/signals/{}?json=1", config.speed_signal),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::ControllerState => write!(f, "ctrlstate"),
            Endpoint::RapidExecution => write!(f, "execution"),
            Endpoint::RobTarget => write!(f, "robtarget"),
            Endpoint::Gripper => write!(f, "gripper"),
            Endpoint::TcpSpeed => write!(f, "tcp speed"),
        }
    }
}

/// Outcome of one endpoint request: the response body or why there is none.
pub type FetchResult = Result<String, EndpointError>;

/// Responses of one poll cycle's fan-out, one per endpoint.
#[derive(Debug, Clone)]
pub struct EndpointResponses {
    pub controller_state: FetchResult,
    pub rapid_execution: FetchResult,
    pub rob_target: FetchResult,
    pub gripper: FetchResult,
    pub tcp_speed: FetchResult,
}

impl EndpointResponses {
    pub fn get(&self, endpoint: Endpoint) -> &FetchResult {
        match endpoint {
            Endpoint::ControllerState => &self.controller_state,
            Endpoint::RapidExecution => &self.rapid_execution,
            Endpoint::RobTarget => &self.rob_target,
            Endpoint::Gripper => &self.gripper,
            Endpoint::TcpSpeed => &self.tcp_speed,
        }
    }
}

/// HTTP client for the controller's Robot Web Services.
///
/// Credentials are sent with every request instead of waiting for a 401
/// challenge, redirects are returned as-is (and so count as failures), and
/// each request is bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct RwsClient {
    http: reqwest::Client,
    config: RwsClientConfig,
}

impl RwsClient {
    pub fn new(config: RwsClientConfig) -> Result<Self, MonitorError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|e| MonitorError::Client(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &RwsClientConfig {
        &self.config
    }

    pub fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.config.base_url(), endpoint.path(&self.config))
    }

    /// GETs one endpoint. Never retries.
    pub async fn fetch(&self, endpoint: Endpoint) -> FetchResult {
        let url = self.url(endpoint);
        let result = self.get(&url).await;
        match &result {
            Ok(body) => debug!("{} returned {} bytes", endpoint, body.len()),
            Err(e) => warn!("{} unavailable: {}", endpoint, e),
        }
        result
    }

    /// GETs all five endpoints concurrently and waits for every one of them.
    pub async fn fetch_all(&self) -> EndpointResponses {
        let (controller_state, rapid_execution, rob_target, gripper, tcp_speed) = tokio::join!(
            self.fetch(Endpoint::ControllerState),
            self.fetch(Endpoint::RapidExecution),
            self.fetch(Endpoint::RobTarget),
            self.fetch(Endpoint::Gripper),
            self.fetch(Endpoint::TcpSpeed),
        );
        EndpointResponses {
            controller_state,
            rapid_execution,
            rob_target,
            gripper,
            tcp_speed,
        }
    }

    async fn get(&self, url: &str) -> FetchResult {
        let response = self
            .http
            .get(url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(|e| EndpointError::from_reqwest(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EndpointError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| EndpointError::from_reqwest(e, url))
    }
}
