//! Framework-independent request pipeline stages.
//!
//! A [`Stage`] looks at a request and either answers it or passes it on
//! together with headers to add to whatever response comes back.
//! [`StageLayer`] runs any stage as a tower middleware.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::security::HeaderSet;

/// What a stage decided to do with a request.
#[derive(Debug)]
pub enum StageOutcome {
    /// Answer immediately; later stages do not run.
    Respond(Response<Body>),
    /// Hand the request to the next stage and merge `response_headers`
    /// into its response.
    Next {
        request: Request<Body>,
        response_headers: HeaderSet,
    },
}

/// One step of the request pipeline.
///
/// Stages are synchronous: they must not block or perform I/O.
pub trait Stage: Send + Sync + 'static {
    fn handle(&self, request: Request<Body>) -> StageOutcome;
}

/// Tower layer running a [`Stage`] in front of the wrapped service.
pub struct StageLayer<T> {
    stage: Arc<T>,
}

impl<T> StageLayer<T> {
    pub fn new(stage: T) -> Self {
        Self {
            stage: Arc::new(stage),
        }
    }

    /// Share a stage the caller keeps a handle to (e.g. for reloads).
    pub fn from_shared(stage: Arc<T>) -> Self {
        Self { stage }
    }
}

impl<T> Clone for StageLayer<T> {
    fn clone(&self) -> Self {
        Self {
            stage: self.stage.clone(),
        }
    }
}

impl<S, T: Stage> Layer<S> for StageLayer<T> {
    type Service = StageService<S, T>;

    fn layer(&self, inner: S) -> Self::Service {
        StageService {
            inner,
            stage: self.stage.clone(),
        }
    }
}

/// Service produced by [`StageLayer`].
pub struct StageService<S, T> {
    inner: S,
    stage: Arc<T>,
}

impl<S: Clone, T> Clone for StageService<S, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            stage: self.stage.clone(),
        }
    }
}

impl<S, T> Service<Request<Body>> for StageService<S, T>
where
    S: Service<Request<Body>, Response = Response<Body>> + Send + 'static,
    S::Future: Send + 'static,
    T: Stage,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        match self.stage.handle(request) {
            StageOutcome::Respond(response) => Box::pin(async move { Ok(response) }),
            StageOutcome::Next {
                request,
                response_headers,
            } => {
                let fut = self.inner.call(request);
                Box::pin(async move {
                    let mut response = fut.await?;
                    response_headers.apply_to(response.headers_mut());
                    Ok(response)
                })
            }
        }
    }
}
