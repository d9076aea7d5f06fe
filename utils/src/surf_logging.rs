use log::{debug, warn};
use std::time::Instant;
use surf::middleware::{Middleware, Next};
use surf::{Client, Request, Response};

/// Middleware that logs every outgoing request with its status and duration.
#[derive(Debug)]
pub struct SurfLogging;

#[surf::utils::async_trait]
impl Middleware for SurfLogging {
    async fn handle(
        &self,
        req: Request,
        client: Client,
        next: Next<'_>,
    ) -> surf::Result<Response> {
        let method = req.method();
        let url = req.url().clone();
        let start = Instant::now();

        let res = next.run(req, client).await?;

        let status = res.status();
        if status.is_success() {
            debug!("{} {} -> {} ({:?})", method, url, status, start.elapsed());
        } else {
            warn!("{} {} -> {} ({:?})", method, url, status, start.elapsed());
        }
        Ok(res)
    }
}
