use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::AppError;

pub struct Server {
    address: String,
    router: Router,
}

impl Server {
    pub fn new(address: impl Into<String>, router: Router) -> Self {
        Self {
            address: address.into(),
            router,
        }
    }

    /// Serves until the token is cancelled, then drains in-flight requests.
    pub async fn start(self, cancel_token: CancellationToken) -> Result<(), AppError> {
        info!("Starting HTTP server on {}", self.address);
        let listener = TcpListener::bind(&self.address)
            .await
            .map_err(|e| AppError::Bind(e, self.address.clone()))?;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(cancel_token.cancelled_owned())
            .await?;
        info!("HTTP server on {} stopped", self.address);
        Ok(())
    }
}
