//! Request envelopes.
//!
//! Two wire shapes share the method table. The plain shape is
//! `{"method": "...", "params": [{...}]}` and reports errors inside
//! `result`. The JSON-RPC 2.0 shape is detected by the presence of a
//! `jsonrpc` key and reports errors in a top-level `error` object; its
//! `jsonrpc` and `id` fields are echoed back verbatim, whatever they hold.

use crate::dispatch::{dispatch, Context};
use crate::error::{ErrorKind, ErrorObject};
use meridian_json::{parse, Value};

/// Parse one request body and produce the response document.
pub fn process_request(ctx: &Context, body: &str) -> Value {
    let Ok(request) = parse(body) else {
        return plain_error(&ErrorObject::with_message(
            ErrorKind::InvalidParams,
            "Unable to parse request.",
        ));
    };
    if request.contains("jsonrpc") {
        process_jsonrpc(ctx, &request)
    } else {
        process_plain(ctx, &request)
    }
}

static EMPTY_PARAMS: Value = Value::Object(Vec::new());
static NULL_PARAMS: Value = Value::Null;

fn method_and_params(request: &Value) -> Result<(&str, &Value), ErrorObject> {
    let method = request
        .get("method")
        .as_str()
        .ok_or_else(|| ErrorObject::new(ErrorKind::UnknownCommand))?;
    // params is a one-element array of the parameter object; absent params
    // means no parameters
    let params = match request.get("params") {
        Value::Null if !request.contains("params") => &EMPTY_PARAMS,
        Value::Array(items) => items.first().unwrap_or(&NULL_PARAMS),
        other => other,
    };
    Ok((method, params))
}

fn process_plain(ctx: &Context, request: &Value) -> Value {
    let outcome = method_and_params(request)
        .and_then(|(method, params)| dispatch(ctx, method, params));
    let mut response = match outcome {
        Ok(mut result) => {
            result.set("status", "success");
            let mut response = Value::object();
            response.set("result", result);
            response
        }
        Err(e) => plain_error(&e),
    };
    echo_api_version(request, &mut response);
    response
}

fn plain_error(e: &ErrorObject) -> Value {
    let mut result = Value::object();
    result.set("error", e.kind.token());
    result.set("error_code", u64::from(e.kind.code()));
    result.set("error_message", e.message.as_str());
    for (key, value) in &e.extra {
        result.set(key.as_str(), value.clone());
    }
    result.set("status", "error");
    let mut response = Value::object();
    response.set("result", result);
    response
}

fn process_jsonrpc(ctx: &Context, request: &Value) -> Value {
    let mut response = Value::object();
    response.set("jsonrpc", request.get("jsonrpc").clone());
    response.set("id", request.get("id").clone());

    let outcome = method_and_params(request)
        .and_then(|(method, params)| dispatch(ctx, method, params));
    match outcome {
        Ok(result) => {
            response.set("result", result);
        }
        Err(e) => {
            let mut data = Value::object();
            data.set("token", e.kind.token());
            for (key, value) in &e.extra {
                data.set(key.as_str(), value.clone());
            }
            let mut error = Value::object();
            error.set("code", u64::from(e.kind.code()));
            error.set("message", e.message.as_str());
            error.set("data", data);
            response.set("error", error);
        }
    }
    echo_api_version(request, &mut response);
    response
}

fn echo_api_version(request: &Value, response: &mut Value) {
    if request.contains("api_version") {
        response.set("api_version", request.get("api_version").clone());
    }
}
