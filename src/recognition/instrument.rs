use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::Service;
use tower_layer::Layer;
use tracing::{debug, error};

/// Wraps a service with per-call timing and error logging.
#[derive(Debug, Clone, Copy)]
pub struct InstrumentLayer {
    name: &'static str,
}

impl InstrumentLayer {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl<S> Layer<S> for InstrumentLayer {
    type Service = Instrumented<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Instrumented {
            inner,
            name: self.name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Instrumented<S> {
    inner: S,
    name: &'static str,
}

impl<S, Request> Service<Request> for Instrumented<S>
where
    S: Service<Request>,
    S::Future: Send + 'static,
    S::Error: Display,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let name = self.name;
        let start = Instant::now();
        let future = self.inner.call(request);
        Box::pin(async move {
            let result = future.await;
            let duration_us = start.elapsed().as_micros() as u64;
            match &result {
                Ok(_) => debug!("Completed '{}' successfully in {}us", name, duration_us),
                Err(e) => error!("'{}' failed after {}us: {}", name, duration_us, e),
            }
            result
        })
    }
}
