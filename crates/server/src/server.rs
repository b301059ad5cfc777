// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The MCP server loop.
//!
//! Reads requests from stdin, dispatches tool calls as tasks (so a
//! blocking `breakpoint_wait` never starves `notifications/cancelled`),
//! and serialises responses through a single writer task. Stdin EOF is a
//! clean shutdown: in-flight calls are cancelled and the session is
//! disconnected (terminating the target only when this server launched it).

use crate::env;
use crate::mcp::{
    self, initialize_result, tool_result, CancelledParams, Request, Response, ToolCallParams,
};
use crate::tools::{catalogue, Tools};
use ildbg_core::{Clock, LaunchMode};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// In-flight tool calls by request id, for cancellation.
type Pending = Arc<Mutex<HashMap<String, CancellationToken>>>;

pub struct Server<C: Clock> {
    tools: Arc<Tools<C>>,
}

impl<C: Clock> Server<C> {
    pub fn new(tools: Tools<C>) -> Self {
        Self { tools: Arc::new(tools) }
    }

    /// Serve until the reader closes. Generic over the streams so tests
    /// can drive it with duplex pipes.
    pub async fn run<R, W>(self, reader: R, writer: W)
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut reader = BufReader::new(reader);
        let (out_tx, out_rx) = mpsc::channel::<Response>(64);
        let writer_task = tokio::spawn(write_loop(writer, out_rx));
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));

        loop {
            let request = match mcp::read_request(&mut reader).await {
                Ok(request) => request,
                Err(mcp::ProtocolError::ConnectionClosed) => {
                    info!("stdin closed; shutting down");
                    break;
                }
                Err(mcp::ProtocolError::Malformed(e)) => {
                    warn!(error = %e, "dropping malformed frame");
                    let _ = out_tx
                        .send(Response::failure(Value::Null, mcp::PARSE_ERROR, e.to_string()))
                        .await;
                    continue;
                }
                Err(e) => {
                    error!(error = %e, "transport failure");
                    break;
                }
            };
            self.handle_request(request, &out_tx, &pending).await;
        }

        // Cancel stragglers, then tear the session down.
        for (_, token) in pending.lock().drain() {
            token.cancel();
        }
        self.shutdown().await;
        drop(out_tx);
        let _ = writer_task.await;
    }

    async fn handle_request(
        &self,
        request: Request,
        out_tx: &mpsc::Sender<Response>,
        pending: &Pending,
    ) {
        debug!(method = %request.method, notification = request.is_notification(), "request");
        match request.method.as_str() {
            "initialize" => {
                self.respond(
                    out_tx,
                    request.id,
                    Ok(initialize_result(env::SERVER_VERSION)),
                )
                .await;
            }
            "notifications/initialized" => {}
            "ping" => {
                self.respond(out_tx, request.id, Ok(json!({}))).await;
            }
            "tools/list" => {
                self.respond(out_tx, request.id, Ok(json!({ "tools": catalogue() }))).await;
            }
            "tools/call" => {
                let Some(id) = request.id else {
                    warn!("tools/call without an id; ignoring");
                    return;
                };
                let params: ToolCallParams = match serde_json::from_value(request.params) {
                    Ok(params) => params,
                    Err(e) => {
                        let _ = out_tx
                            .send(Response::failure(id, mcp::INVALID_PARAMS, e.to_string()))
                            .await;
                        return;
                    }
                };
                let token = CancellationToken::new();
                pending.lock().insert(id.to_string(), token.clone());

                let tools = Arc::clone(&self.tools);
                let out_tx = out_tx.clone();
                let pending = Arc::clone(pending);
                tokio::spawn(async move {
                    let payload = tools
                        .dispatch(&params.name, params.arguments, &token)
                        .await;
                    let is_error = payload.get("error").and_then(Value::as_bool).unwrap_or(false);
                    pending.lock().remove(&id.to_string());
                    let _ = out_tx
                        .send(Response::success(id, tool_result(&payload, is_error)))
                        .await;
                });
            }
            "notifications/cancelled" => {
                if let Ok(params) = serde_json::from_value::<CancelledParams>(request.params) {
                    if let Some(token) = pending.lock().remove(&params.request_id.to_string()) {
                        info!(request_id = %params.request_id, "cancelling in-flight call");
                        token.cancel();
                    }
                }
            }
            other => {
                if let Some(id) = request.id {
                    let _ = out_tx
                        .send(Response::failure(
                            id,
                            mcp::METHOD_NOT_FOUND,
                            format!("unknown method '{other}'"),
                        ))
                        .await;
                } else {
                    debug!(method = other, "ignoring unknown notification");
                }
            }
        }
    }

    async fn respond(
        &self,
        out_tx: &mpsc::Sender<Response>,
        id: Option<Value>,
        result: Result<Value, String>,
    ) {
        let Some(id) = id else { return };
        let response = match result {
            Ok(value) => Response::success(id, value),
            Err(message) => Response::failure(id, mcp::INVALID_PARAMS, message),
        };
        let _ = out_tx.send(response).await;
    }

    /// Clean session teardown on transport close.
    async fn shutdown(&self) {
        let engine = self.tools.engine();
        let (session, info) = engine.snapshot();
        if session.is_attached() {
            let terminate = info
                .map(|i| i.mode == LaunchMode::Launch)
                .unwrap_or(false);
            if let Err(e) = engine.disconnect(terminate).await {
                warn!(error = %e, "disconnect during shutdown failed");
            }
        }
    }
}

async fn write_loop<W>(mut writer: W, mut out_rx: mpsc::Receiver<Response>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = out_rx.recv().await {
        if let Err(e) = mcp::write_response(&mut writer, &response).await {
            error!(error = %e, "stdout write failed");
            break;
        }
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
