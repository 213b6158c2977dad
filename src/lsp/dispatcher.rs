//! Method-name routing to capability provider calls.
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::value::RawValue;
use tracing::debug;

use crate::lsp::backend::CapabilityProvider;
use crate::lsp::error::{DispatchError, ErrorKind};

pub const INITIALIZE: &str = "initialize";
pub const INITIALIZED: &str = "initialized";

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// `Ok(None)` means the method produces no result payload.
pub type HandlerResult = Result<Option<Box<RawValue>>, DispatchError>;

/// Decodes its own params and calls into the provider.
pub type Handler<P> =
    for<'a> fn(&'a mut P, Option<&'a RawValue>) -> BoxFuture<'a, HandlerResult>;

/// Immutable table from method name to handler; safe to share between
/// connections because all state lives in the provider.
pub struct Dispatcher<P> {
    handlers: HashMap<&'static str, Handler<P>>,
}

impl<P: CapabilityProvider> Dispatcher<P> {
    /// A dispatcher with the `initialize` / `initialized` bindings.
    pub fn new() -> Self {
        let mut dispatcher = Self::empty();
        dispatcher
            .register(INITIALIZE, handle_initialize::<P>)
            .register(INITIALIZED, handle_initialized::<P>);
        dispatcher
    }

    pub fn empty() -> Self {
        Dispatcher {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, method: &'static str, handler: Handler<P>) -> &mut Self {
        self.handlers.insert(method, handler);
        self
    }

    pub fn supports(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    pub async fn dispatch(
        &self,
        provider: &mut P,
        method: &str,
        params: Option<&RawValue>,
    ) -> HandlerResult {
        let handler = self
            .handlers
            .get(method)
            .ok_or_else(|| DispatchError::unknown_method(method))?;
        debug!(method = %method, "dispatching");
        handler(provider, params).await
    }
}

impl<P: CapabilityProvider> Default for Dispatcher<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deserialize raw params into a handler's typed parameters; absent params
/// decode as JSON `null`.
pub fn decode_params<T: DeserializeOwned>(
    method: &str,
    params: Option<&RawValue>,
) -> Result<T, DispatchError> {
    let text = params.map_or("null", RawValue::get);
    serde_json::from_str(text).map_err(|e| {
        DispatchError::new(
            ErrorKind::InvalidParams,
            format!("invalid {method} params: {e}"),
        )
    })
}

pub fn encode_result<T: Serialize>(result: &T) -> HandlerResult {
    serde_json::value::to_raw_value(result).map(Some).map_err(|e| {
        DispatchError::new(
            ErrorKind::HandlerFailure,
            format!("encoding result: {e}"),
        )
    })
}

fn handler_failure(err: anyhow::Error) -> DispatchError {
    DispatchError::new(ErrorKind::HandlerFailure, format!("{err:#}"))
}

fn handle_initialize<'a, P: CapabilityProvider>(
    provider: &'a mut P,
    params: Option<&'a RawValue>,
) -> BoxFuture<'a, HandlerResult> {
    Box::pin(async move {
        let params = decode_params(INITIALIZE, params)?;
        let result = provider.initialize(params).await.map_err(handler_failure)?;
        encode_result(&result)
    })
}

fn handle_initialized<'a, P: CapabilityProvider>(
    provider: &'a mut P,
    _params: Option<&'a RawValue>,
) -> BoxFuture<'a, HandlerResult> {
    Box::pin(async move {
        provider.initialized().await.map_err(handler_failure)?;
        Ok(None)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp::error::error_codes;
    use anyhow::anyhow;
    use lsp_types::{InitializeParams, InitializeResult, ServerCapabilities, ServerInfo};
    use serde_json::json;

    #[derive(Default)]
    struct CountingProvider {
        initialize_calls: usize,
        initialized_calls: usize,
        fail_with: Option<&'static str>,
    }

    #[async_trait::async_trait]
    impl CapabilityProvider for CountingProvider {
        async fn initialize(
            &mut self,
            _params: InitializeParams,
        ) -> anyhow::Result<InitializeResult> {
            self.initialize_calls += 1;
            if let Some(message) = self.fail_with {
                return Err(anyhow!(message));
            }
            Ok(InitializeResult {
                capabilities: ServerCapabilities::default(),
                server_info: Some(ServerInfo {
                    name: format!("call-{}", self.initialize_calls),
                    version: None,
                }),
            })
        }

        async fn initialized(&mut self) -> anyhow::Result<()> {
            self.initialized_calls += 1;
            Ok(())
        }
    }

    fn raw(value: serde_json::Value) -> Box<RawValue> {
        serde_json::value::to_raw_value(&value).unwrap()
    }

    fn init_params() -> Box<RawValue> {
        raw(json!({"processId": null, "rootUri": "file:///tmp/ws", "capabilities": {}}))
    }

    #[tokio::test]
    async fn initialize_returns_provider_result_verbatim() {
        let dispatcher = Dispatcher::new();
        let mut provider = CountingProvider::default();
        let params = init_params();

        let result = dispatcher
            .dispatch(&mut provider, INITIALIZE, Some(&params))
            .await
            .expect("dispatch")
            .expect("result");

        let value: serde_json::Value = serde_json::from_str(result.get()).unwrap();
        assert_eq!(value["serverInfo"]["name"], "call-1");
        assert!(value.get("capabilities").is_some());
    }

    #[tokio::test]
    async fn repeated_initialize_is_not_deduplicated() {
        let dispatcher = Dispatcher::new();
        let mut provider = CountingProvider::default();
        let params = init_params();

        for _ in 0..2 {
            dispatcher
                .dispatch(&mut provider, INITIALIZE, Some(&params))
                .await
                .expect("dispatch");
        }
        assert_eq!(provider.initialize_calls, 2);
    }

    #[tokio::test]
    async fn initialized_has_no_result() {
        let dispatcher = Dispatcher::new();
        let mut provider = CountingProvider::default();

        let result = dispatcher
            .dispatch(&mut provider, INITIALIZED, None)
            .await
            .expect("dispatch");
        assert!(result.is_none());
        assert_eq!(provider.initialized_calls, 1);
    }

    #[tokio::test]
    async fn unknown_method() {
        let dispatcher = Dispatcher::new();
        let mut provider = CountingProvider::default();

        let err = dispatcher
            .dispatch(&mut provider, "foo/bar", None)
            .await
            .expect_err("unknown");
        assert_eq!(err.kind, ErrorKind::UnknownMethod);
        assert_eq!(err.message, "unsupported method: \"foo/bar\"");
    }

    #[tokio::test]
    async fn provider_error_becomes_handler_failure() {
        let dispatcher = Dispatcher::new();
        let mut provider = CountingProvider {
            fail_with: Some("index unavailable"),
            ..Default::default()
        };
        let params = init_params();

        let err = dispatcher
            .dispatch(&mut provider, INITIALIZE, Some(&params))
            .await
            .expect_err("provider failure");
        assert_eq!(err.kind, ErrorKind::HandlerFailure);
        assert_eq!(err.message, "index unavailable");
        assert_eq!(err.code(), error_codes::INTERNAL_ERROR);
    }

    #[tokio::test]
    async fn bad_params_are_reported_before_the_provider_runs() {
        let dispatcher = Dispatcher::new();
        let mut provider = CountingProvider::default();
        let params = raw(json!({"processId": "not a number", "capabilities": {}}));

        let err = dispatcher
            .dispatch(&mut provider, INITIALIZE, Some(&params))
            .await
            .expect_err("invalid params");
        assert_eq!(err.kind, ErrorKind::InvalidParams);
        assert_eq!(provider.initialize_calls, 0);
    }

    fn handle_ping<'a>(
        _provider: &'a mut CountingProvider,
        params: Option<&'a RawValue>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let echo: serde_json::Value = decode_params("$/ping", params)?;
            encode_result(&json!({ "pong": echo }))
        })
    }

    #[tokio::test]
    async fn integrators_can_register_methods() {
        let mut dispatcher = Dispatcher::empty();
        dispatcher.register("$/ping", handle_ping);
        let mut provider = CountingProvider::default();
        let params = raw(json!(1));

        assert!(dispatcher.supports("$/ping"));
        assert!(!dispatcher.supports(INITIALIZE));

        let result = dispatcher
            .dispatch(&mut provider, "$/ping", Some(&params))
            .await
            .expect("dispatch")
            .expect("result");
        assert_eq!(result.get(), r#"{"pong":1}"#);
    }
}
