//! Method-table dispatch.
//!
//! Every method goes through the same path: look up the handler, gate admin
//! methods, hand the parameter object to the handler, and record the outcome.

use crate::error::{ErrorKind, ErrorObject};
use crate::handlers;
use crate::handlers::HandlerResult;
use crate::metrics::RpcMetrics;
use meridian_json::Value;
use meridian_ledger::LedgerMaster;
use std::sync::Arc;
use std::time::Instant;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct Context {
    pub ledgers: Arc<LedgerMaster>,
    pub metrics: Arc<RpcMetrics>,
    /// Whether the caller may invoke admin-only methods.
    pub admin: bool,
}

impl Context {
    pub fn new(ledgers: Arc<LedgerMaster>) -> Self {
        Self {
            ledgers,
            metrics: Arc::new(RpcMetrics::new()),
            admin: false,
        }
    }

    pub fn with_admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }
}

type Handler = fn(&Context, &Value) -> HandlerResult;

struct Method {
    name: &'static str,
    handler: Handler,
    admin: bool,
}

static METHODS: &[Method] = &[
    Method { name: "account_lines", handler: handlers::account_lines, admin: false },
    Method { name: "account_objects", handler: handlers::account_objects, admin: false },
    Method { name: "book_offers", handler: handlers::book_offers, admin: false },
    Method { name: "ledger", handler: handlers::ledger, admin: false },
    Method { name: "ledger_accept", handler: handlers::ledger_accept, admin: true },
    Method { name: "ledger_closed", handler: handlers::ledger_closed, admin: false },
    Method { name: "ledger_current", handler: handlers::ledger_current, admin: false },
    Method { name: "server_state", handler: handlers::server_state, admin: false },
];

/// Run one method call. `params` must be a JSON object.
pub fn dispatch(ctx: &Context, method: &str, params: &Value) -> HandlerResult {
    let Some(entry) = METHODS.iter().find(|m| m.name == method) else {
        ctx.metrics
            .requests
            .with_label_values(&["unknown", ErrorKind::UnknownCommand.token()])
            .inc();
        return Err(ErrorObject::new(ErrorKind::UnknownCommand));
    };
    if entry.admin && !ctx.admin {
        ctx.metrics
            .requests
            .with_label_values(&[entry.name, ErrorKind::AccessDenied.token()])
            .inc();
        return Err(ErrorObject::new(ErrorKind::AccessDenied));
    }
    if !params.is_object() {
        ctx.metrics
            .requests
            .with_label_values(&[entry.name, ErrorKind::InvalidParams.token()])
            .inc();
        return Err(ErrorObject::new(ErrorKind::InvalidParams));
    }

    let started = Instant::now();
    let result = (entry.handler)(ctx, params);
    ctx.metrics
        .handler_time_ms
        .observe(started.elapsed().as_secs_f64() * 1_000.0);

    let outcome = match &result {
        Ok(_) => "success",
        Err(e) => e.kind.token(),
    };
    ctx.metrics
        .requests
        .with_label_values(&[entry.name, outcome])
        .inc();
    tracing::debug!(method = entry.name, outcome, "rpc");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_json::parse;
    use meridian_ledger::LedgerBuilder;

    fn ctx() -> Context {
        let master = LedgerMaster::new();
        master.publish_current(LedgerBuilder::new(1).build());
        Context::new(Arc::new(master))
    }

    #[test]
    fn unknown_method_is_rejected() {
        let err = dispatch(&ctx(), "no_such_method", &Value::object()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownCommand);
    }

    #[test]
    fn non_object_params_are_rejected() {
        let err = dispatch(&ctx(), "ledger", &parse("[1, 2]").unwrap()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidParams);
    }

    #[test]
    fn admin_methods_are_gated() {
        let ctx = ctx();
        let err = dispatch(&ctx, "ledger_accept", &Value::object()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AccessDenied);

        let ctx = ctx.with_admin(true);
        let result = dispatch(&ctx, "ledger_accept", &Value::object()).unwrap();
        assert_eq!(result.get("ledger_current_index").as_u64(), Some(2));
    }

    #[test]
    fn dispatch_reaches_handlers() {
        let result = dispatch(&ctx(), "ledger_current", &Value::object()).unwrap();
        assert_eq!(result.get("ledger_current_index").as_u64(), Some(1));
    }
}
