//! Report fetcher: pages through batchGet until the token runs out

use super::client::ReportingApi;
use super::model::Report;
use super::query::ReportQuery;
use crate::error::{Error, Result};
use crate::http::{FixedPause, PageThrottle};
use std::sync::Arc;
use tracing::{info, warn};

/// Retrieves complete, all-pages-merged reports
///
/// Pages are fetched strictly one after another with the throttle's pause in
/// between. Any failure on any page discards what was accumulated.
pub struct ReportFetcher<A> {
    api: A,
    throttle: Arc<dyn PageThrottle>,
}

impl<A: ReportingApi> ReportFetcher<A> {
    /// Fetcher with the default one-second pause between pages
    pub fn new(api: A) -> Self {
        Self {
            api,
            throttle: Arc::new(FixedPause::default()),
        }
    }

    /// Replace the pause policy
    #[must_use]
    pub fn with_throttle(mut self, throttle: Arc<dyn PageThrottle>) -> Self {
        self.throttle = throttle;
        self
    }

    /// The underlying API
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Fetch every page of the report described by `query`
    pub async fn fetch(&self, query: &ReportQuery) -> Result<Report> {
        query.validate()?;

        let mut request = query.to_request();
        let response = self.api.batch_get(&request).await?;

        let Some(first) = response.reports.into_iter().next() else {
            warn!("No reports returned for view {}", query.view_id);
            return Ok(Report::empty());
        };

        let mut report = Report::from_raw(first)?;
        let mut pages = 1usize;
        info!(
            "Fetched page {pages} for view {} ({} rows)",
            query.view_id,
            report.rows.len()
        );

        while let Some(token) = report.next_page_token.take() {
            self.throttle.pause().await;

            request.page_token = Some(token);
            let response = self.api.batch_get(&request).await?;
            let raw = response.reports.into_iter().next().ok_or_else(|| {
                Error::parse(format!(
                    "page {} of view {} returned no report",
                    pages + 1,
                    query.view_id
                ))
            })?;

            let page = Report::from_raw(raw)?;
            pages += 1;
            info!(
                "Fetched page {pages} for view {} ({} rows)",
                query.view_id,
                page.rows.len()
            );
            report.append_page(page);
        }

        info!(
            "Report for view {} complete: {} rows across {pages} page(s)",
            query.view_id,
            report.rows.len()
        );
        Ok(report)
    }
}

impl<A> std::fmt::Debug for ReportFetcher<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportFetcher").finish_non_exhaustive()
    }
}
