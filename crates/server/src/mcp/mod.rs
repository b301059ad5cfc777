// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Model Context Protocol transport: line-delimited JSON-RPC over stdio.

mod types;
mod wire;

pub use types::{
    initialize_result, tool_result, CancelledParams, Request, Response, RpcError, ToolCallParams,
    ToolDescriptor, INVALID_PARAMS, JSONRPC_VERSION, METHOD_NOT_FOUND, PARSE_ERROR,
    PROTOCOL_VERSION,
};
pub use wire::{decode, encode, read_request, write_response, ProtocolError};
