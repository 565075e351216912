//! The live method table: one tower service per bound RPC path.
//!
//! Generated tonic servers match `req.uri().path()` against a fixed list of
//! methods. Here the list is only known at runtime, so each discovered method
//! gets its own [`MethodService`] and the table is turned into an axum router
//! the tonic transport can serve.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;

use prost_reflect::{DynamicMessage, MessageDescriptor};
use tonic::codegen::{http, Body, BoxFuture, Context, Poll, Service, StdError};
use tonic::{Request, Response, Status};

use crate::catalog::{MethodEntry, MethodKey};
use crate::codec::{json_to_message, DynamicCodec};
use crate::dispatcher::CallDispatcher;
use crate::outcome::CallError;

/// Where the binder attaches handlers.
pub trait MethodTable {
    /// Attach `dispatcher` to `entry`'s wire path.
    ///
    /// Returns `false` and leaves the table untouched when the path is
    /// already bound.
    fn register(&mut self, entry: &MethodEntry, dispatcher: Arc<CallDispatcher>) -> bool;
}

// ── MethodService ──

/// Unary gRPC endpoint for one discovered method.
#[derive(Clone)]
pub struct MethodService {
    key: MethodKey,
    path: Arc<str>,
    request: MessageDescriptor,
    response: MessageDescriptor,
    dispatcher: Arc<CallDispatcher>,
}

impl MethodService {
    pub fn new(entry: &MethodEntry, dispatcher: Arc<CallDispatcher>) -> Self {
        Self {
            key: entry.key.clone(),
            path: entry.key.path().into(),
            request: entry.input.clone(),
            response: entry.output.clone(),
            dispatcher,
        }
    }

    pub fn key(&self) -> &MethodKey {
        &self.key
    }

    async fn respond(
        &self,
        _request: Request<DynamicMessage>,
    ) -> Result<Response<DynamicMessage>, Status> {
        tracing::debug!("Call {}", self.path);
        let content = self.dispatcher.handle(&self.path).await.into_result()?;

        match json_to_message(&self.response, content) {
            Ok(message) => Ok(Response::new(message)),
            Err(e) => {
                tracing::warn!(
                    "Content for {} does not fit {}: {e}",
                    self.path,
                    self.response.full_name()
                );
                Err(CallError::missing_mock(&self.key.method).into())
            }
        }
    }
}

impl std::fmt::Debug for MethodService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodService")
            .field("path", &self.path)
            .field("request", &self.request.full_name())
            .field("response", &self.response.full_name())
            .finish()
    }
}

struct UnaryCall(MethodService);

impl tonic::server::UnaryService<DynamicMessage> for UnaryCall {
    type Response = DynamicMessage;
    type Future = BoxFuture<Response<DynamicMessage>, Status>;

    fn call(&mut self, request: Request<DynamicMessage>) -> Self::Future {
        let method = self.0.clone();
        Box::pin(async move { method.respond(request).await })
    }
}

impl<B> Service<http::Request<B>> for MethodService
where
    B: Body + Send + 'static,
    B::Error: Into<StdError> + Send + 'static,
{
    type Response = http::Response<tonic::body::BoxBody>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let method = self.clone();
        Box::pin(async move {
            // Without a session every call is Unavailable, even one whose
            // request body would not decode.
            if let Err(err) = method.dispatcher.session() {
                tracing::warn!("{}: {}", method.path, err.message);
                return Ok(Status::from(err).into_http());
            }
            let codec = DynamicCodec::new(method.request.clone());
            let mut grpc = tonic::server::Grpc::new(codec);
            Ok(grpc.unary(UnaryCall(method), req).await)
        })
    }
}

// ── MockServer ──

/// Method table of a mock gRPC server, keyed by wire path.
#[derive(Debug, Default)]
pub struct MockServer {
    methods: BTreeMap<String, MethodService>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn method(&self, path: &str) -> Option<&MethodService> {
        self.methods.get(path)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Paths with no bound method answer `UNIMPLEMENTED`, like a generated
    /// tonic server.
    pub fn into_router(self) -> axum::Router {
        self.methods
            .into_iter()
            .fold(
                axum::Router::new().fallback(unimplemented),
                |router, (path, service)| router.route_service(&path, service),
            )
    }

    /// Routes for `tonic::transport::Server::add_routes`.
    pub fn into_routes(self) -> tonic::service::Routes {
        tonic::service::Routes::from(self.into_router())
    }
}

impl MethodTable for MockServer {
    fn register(&mut self, entry: &MethodEntry, dispatcher: Arc<CallDispatcher>) -> bool {
        let path = entry.key.path();
        if self.methods.contains_key(&path) {
            return false;
        }
        self.methods.insert(path, MethodService::new(entry, dispatcher));
        true
    }
}

async fn unimplemented(uri: http::Uri) -> http::Response<tonic::body::BoxBody> {
    tracing::warn!("No mock bound for {}", uri.path());
    Status::unimplemented(format!("no mock bound for {}", uri.path())).into_http()
}
