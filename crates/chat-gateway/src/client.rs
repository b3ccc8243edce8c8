//! Gateway daemon JSON-RPC client.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, NOT_FOUND_CODE, RATE_LIMIT_CODE};
use crate::types::{DialogPage, HistoryPage, RawChat};

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Serialize)]
struct RpcRequest<'a, T: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<T>,
    id: u64,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Deserialize)]
struct RpcError {
    code: i32,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl RpcError {
    fn into_gateway_error(self) -> GatewayError {
        match self.code {
            RATE_LIMIT_CODE => {
                let retry_after = self
                    .data
                    .as_ref()
                    .and_then(|d| d.get("retryAfter"))
                    .and_then(Value::as_u64)
                    .unwrap_or(1);
                GatewayError::RateLimited { retry_after }
            }
            NOT_FOUND_CODE => GatewayError::NotFound(self.message),
            code => GatewayError::Rpc {
                code,
                message: self.message,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionParams<'a> {
    session: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone_number: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DialogsParams<'a> {
    session: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    limit: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryParams<'a> {
    session: &'a str,
    chat_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset_id: Option<i64>,
    limit: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatParams<'a> {
    session: &'a str,
    chat_id: i64,
}

/// Client for communicating with the gateway daemon.
#[derive(Clone)]
pub struct GatewayClient {
    http: Client,
    config: GatewayConfig,
    request_id: Arc<AtomicU64>,
    connected: Arc<AtomicBool>,
}

impl GatewayClient {
    /// Connect to the gateway daemon.
    pub async fn connect(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(GatewayError::Http)?;

        let client = Self {
            http,
            config,
            request_id: Arc::new(AtomicU64::new(1)),
            connected: Arc::new(AtomicBool::new(false)),
        };

        // Verify connection with health check
        if client.health_check().await? {
            info!("Connected to gateway daemon at {}", client.config.base_url);
        } else {
            return Err(GatewayError::HealthCheckFailed);
        }

        Ok(client)
    }

    /// Check if the last health check succeeded.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Perform a health check against the daemon.
    pub async fn health_check(&self) -> Result<bool, GatewayError> {
        let url = self.config.check_url();
        debug!("Health check: {}", url);

        match self.http.get(&url).send().await {
            Ok(resp) => {
                let ok = resp.status().is_success();
                self.connected.store(ok, Ordering::SeqCst);
                Ok(ok)
            }
            Err(e) => {
                self.connected.store(false, Ordering::SeqCst);
                Err(GatewayError::Http(e))
            }
        }
    }

    /// Start (or resume) the named session for a phone number.
    pub async fn start_session(&self, session: &str, phone_number: &str) -> Result<(), GatewayError> {
        let params = SessionParams {
            session,
            phone_number: Some(phone_number),
        };
        let _: Value = self.rpc_call("startSession", Some(params)).await?;
        Ok(())
    }

    /// Stop a running session, keeping its credentials.
    pub async fn stop_session(&self, session: &str) -> Result<(), GatewayError> {
        let params = SessionParams {
            session,
            phone_number: None,
        };
        let _: Value = self.rpc_call("stopSession", Some(params)).await?;
        Ok(())
    }

    /// Log a session out and delete its credentials.
    pub async fn log_out(&self, session: &str) -> Result<(), GatewayError> {
        let params = SessionParams {
            session,
            phone_number: None,
        };
        let _: Value = self.rpc_call("logOut", Some(params)).await?;
        Ok(())
    }

    /// Fetch one page of the dialog list.
    pub async fn get_dialogs(
        &self,
        session: &str,
        offset: Option<i64>,
        limit: u32,
    ) -> Result<DialogPage, GatewayError> {
        let params = DialogsParams {
            session,
            offset,
            limit,
        };
        self.rpc_call("getDialogs", Some(params)).await
    }

    /// Fetch one page of a chat's history, newest first.
    pub async fn get_chat_history(
        &self,
        session: &str,
        chat_id: i64,
        offset_id: Option<i64>,
        limit: u32,
    ) -> Result<HistoryPage, GatewayError> {
        let params = HistoryParams {
            session,
            chat_id,
            offset_id,
            limit,
        };
        self.rpc_call("getChatHistory", Some(params)).await
    }

    /// Look up a chat by id.
    pub async fn get_chat(&self, session: &str, chat_id: i64) -> Result<RawChat, GatewayError> {
        let params = ChatParams { session, chat_id };
        self.rpc_call("getChat", Some(params)).await
    }

    /// Get the configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Make a JSON-RPC call to the daemon.
    async fn rpc_call<P: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: Option<P>,
    ) -> Result<R, GatewayError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let url = self.config.rpc_url();

        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        debug!("RPC call: {} (id={})", method, id);

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(GatewayError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Connection(format!("HTTP {}: {}", status, body)));
        }

        let body = response.text().await.map_err(GatewayError::Http)?;
        parse_rpc_response(&body)
    }
}

/// Decode a JSON-RPC response body into its result or a typed error.
fn parse_rpc_response<R: for<'de> Deserialize<'de>>(body: &str) -> Result<R, GatewayError> {
    let rpc_response: RpcResponse<R> = serde_json::from_str(body)?;

    if let Some(error) = rpc_response.error {
        return Err(error.into_gateway_error());
    }

    rpc_response.result.ok_or_else(|| GatewayError::Rpc {
        code: -1,
        message: "No result in response".to_string(),
    })
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}
