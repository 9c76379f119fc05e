use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tower::timeout::TimeoutLayer;
use tower::util::BoxCloneSyncService;
use tower::{BoxError, Service, ServiceBuilder};

use super::classifier::Classifier;
use super::instrument::InstrumentLayer;
use crate::error::AppError;
use crate::landmarks::InferenceTensor;

/// The classifier stack as handed to the recognizer: instrumented and time-bounded.
pub type ClassifierStack = BoxCloneSyncService<InferenceTensor, Vec<f32>, BoxError>;

/// Runs a [`Classifier`] on the blocking pool.
#[derive(Clone)]
pub struct ClassifierService {
    inner: Arc<dyn Classifier>,
}

impl ClassifierService {
    pub fn new(inner: Arc<dyn Classifier>) -> Self {
        Self { inner }
    }
}

impl Service<InferenceTensor> for ClassifierService {
    type Response = Vec<f32>;
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, tensor: InferenceTensor) -> Self::Future {
        let inner = self.inner.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || inner.classify(&tensor))
                .await
                .map_err(|e| AppError::Inference(format!("classifier task failed: {}", e)))?
        })
    }
}

pub struct ClassifierStackBuilder {
    classifier: Arc<dyn Classifier>,
    timeout: Duration,
}

impl ClassifierStackBuilder {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier,
            timeout: Duration::from_secs(2),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> ClassifierStack {
        let service = ServiceBuilder::new()
            .layer(InstrumentLayer::new("classifier"))
            .layer(TimeoutLayer::new(self.timeout))
            .service(ClassifierService::new(self.classifier));
        BoxCloneSyncService::new(service)
    }
}
