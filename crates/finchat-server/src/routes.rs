//! Routes of the HTTP surface
//!
//! `GET /stockDetails/:symbol` and `GET /stockGraph/:symbol` read market data
//! directly, `POST /chat` runs one conversation turn and `GET /health`
//! reports liveness.

use crate::error::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use finchat_core::Error;
use finchat_market::chart::render_month_chart;
use finchat_market::{ChartStyle, MarketDataGateway, read_stock_data};
use finchat_runtime::ConversationBridge;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, instrument};

/// Header carrying the chat session id in both directions
pub const SESSION_HEADER: &str = "x-session-id";

/// Shared state of all handlers
#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<ConversationBridge>,
    pub gateway: Arc<dyn MarketDataGateway>,
    pub chart_style: Arc<ChartStyle>,
}

impl AppState {
    pub fn new(bridge: Arc<ConversationBridge>, gateway: Arc<dyn MarketDataGateway>) -> Self {
        Self {
            bridge,
            gateway,
            chart_style: Arc::new(ChartStyle::default()),
        }
    }

    pub fn with_chart_style(mut self, style: ChartStyle) -> Self {
        self.chart_style = Arc::new(style);
        self
    }
}

/// Body of `POST /chat`, validated
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<Value>,
    pub session_id: Option<String>,
}

impl ChatRequest {
    /// Validate a raw request body
    ///
    /// `message` must be a non-blank string. `history` may be absent or null
    /// but otherwise must be an array; its entries are filtered later.
    pub fn from_value(body: &Value) -> Result<Self, Error> {
        let body = body
            .as_object()
            .ok_or_else(|| Error::InvalidRequest("request body must be a JSON object".into()))?;

        let message = body
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| Error::InvalidRequest("message is required".into()))?;

        let history = match body.get("history") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(entries)) => entries.clone(),
            Some(_) => return Err(Error::InvalidRequest("history must be an array".into())),
        };

        let session_id = body
            .get("sessionId")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Ok(Self {
            message: message.to_string(),
            history,
            session_id,
        })
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    model: String,
    sessions: usize,
    tools: usize,
}

/// Build the application router
pub fn router(state: AppState, cors_permissive: bool) -> Router {
    let router = Router::new()
        .route("/health", get(handle_health))
        .route("/stockDetails/:symbol", get(handle_stock_details))
        .route("/stockGraph/:symbol", get(handle_stock_graph))
        .route("/chat", post(handle_chat))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let executor = state.bridge.executor();
    Json(HealthResponse {
        status: "ok",
        model: executor.config().model.clone(),
        sessions: state.bridge.sessions().len().await,
        tools: executor.tools().len(),
    })
}

async fn handle_stock_details(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Json<Value> {
    Json(read_stock_data(state.gateway.as_ref(), &symbol).await)
}

#[instrument(skip(state))]
async fn handle_stock_graph(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Response, ApiError> {
    let symbol = symbol.trim().to_uppercase();
    let chart = render_month_chart(state.gateway.as_ref(), &symbol, &state.chart_style).await?;
    debug!(bytes = chart.png.len(), points = chart.points.len(), "Chart rendered");

    Ok(([(CONTENT_TYPE, "image/png")], chart.png).into_response())
}

async fn handle_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let request = ChatRequest::from_value(&body)?;

    let session_hint = request.session_id.clone().or_else(|| {
        headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    });

    let reply = state
        .bridge
        .handle_chat(session_hint.as_deref(), &request.message, &request.history)
        .await;

    let mut response = Json(reply.envelope).into_response();
    let session_id = HeaderValue::from_str(&reply.session_id)
        .map_err(|e| ApiError::Internal(format!("session id header: {e}")))?;
    response.headers_mut().insert(SESSION_HEADER, session_id);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_request_validation() {
        let request = ChatRequest::from_value(&json!({
            "message": "price of AAPL?",
            "history": [{"sender": "user", "content": "hi"}],
            "sessionId": "abc"
        }))
        .unwrap();
        assert_eq!(request.message, "price of AAPL?");
        assert_eq!(request.history.len(), 1);
        assert_eq!(request.session_id.as_deref(), Some("abc"));

        let minimal = ChatRequest::from_value(&json!({"message": "hi", "history": null})).unwrap();
        assert!(minimal.history.is_empty());
        assert!(minimal.session_id.is_none());
    }

    #[test]
    fn test_chat_request_rejections() {
        for body in [
            json!({}),
            json!({"message": "   "}),
            json!({"message": 42}),
            json!({"message": "hi", "history": "user: hi"}),
            json!(["hi"]),
        ] {
            let err = ChatRequest::from_value(&body).unwrap_err();
            assert!(err.is_client_error(), "{body} should be rejected as a client error");
        }
    }
}
