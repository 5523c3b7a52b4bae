// THEORY:
// The `TileFetcher` is the pipeline's only window onto the tile server: given a
// color, it returns the markup for that color's tile. It is a trait so the pipeline
// can be driven by the HTTP client in production and by scripted fakes in tests.
//
// The HTTP implementation talks to `GET {base}/color/{rrggbb}`. Any transport error
// or non-success status is a `FetchFailure`; there is no retry. The blocking `ureq`
// call runs on tokio's blocking pool so many fetches can be in flight at once
// without stalling the task that drives the pipeline.

use crate::core_modules::color::color::ColorSample;
use crate::{MosaicError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

pub trait TileFetcher: Send + Sync {
    /// Fetches the tile markup for one color.
    fn fetch(&self, color: &ColorSample) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Clone)]
pub struct HttpTileFetcher {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpTileFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { agent, base_url }
    }

    pub fn url_for(&self, color: &ColorSample) -> String {
        format!("{}/color/{}", self.base_url, color)
    }
}

impl TileFetcher for HttpTileFetcher {
    fn fetch(&self, color: &ColorSample) -> impl Future<Output = Result<String>> + Send {
        let agent = self.agent.clone();
        let url = self.url_for(color);
        let color = color.to_string();

        async move {
            let failure = |reason: String| MosaicError::FetchFailure { color: color.clone(), reason };

            let body = tokio::task::spawn_blocking(move || -> std::result::Result<String, String> {
                let response = match agent.get(&url).call() {
                    Ok(response) => response,
                    Err(ureq::Error::Status(code, _)) => return Err(format!("HTTP status {code}")),
                    Err(ureq::Error::Transport(transport)) => return Err(transport.to_string()),
                };
                response.into_string().map_err(|e| e.to_string())
            })
            .await
            .map_err(|e| failure(format!("fetch task failed: {e}")))?
            .map_err(failure)?;

            debug!(color = %color, bytes = body.len(), "Fetched tile");
            Ok(body)
        }
    }
}
