//! Submission and polling of restore jobs.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::node::FileSelection;
use super::stream::RestoreStream;
use crate::config::SdkConfig;
use crate::error::{ArchiveError, Result};
use crate::storage::{RestoreRequest, StorageArchiveClient};

/// How a restore job is waited on.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Delay between status queries.
    pub interval: Duration,
    /// Give up after this long; `None` waits for as long as the job runs.
    pub max_wait: Option<Duration>,
    /// Stops waiting when triggered.
    pub cancel: Option<CancellationToken>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_wait: None,
            cancel: None,
        }
    }
}

impl PollOptions {
    pub fn from_config(config: &SdkConfig) -> Self {
        Self {
            interval: config.job_polling_interval(),
            max_wait: config.job_max_wait(),
            cancel: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Runs restore jobs for one device within one restore session.
pub struct RestoreJobManager {
    archive: Arc<dyn StorageArchiveClient>,
    device_guid: String,
    session_id: String,
    poll: PollOptions,
}

impl RestoreJobManager {
    pub fn new(
        archive: Arc<dyn StorageArchiveClient>,
        device_guid: impl Into<String>,
        session_id: impl Into<String>,
        poll: PollOptions,
    ) -> Self {
        Self {
            archive,
            device_guid: device_guid.into(),
            session_id: session_id.into(),
            poll,
        }
    }

    /// Restore `selections` as one job and stream its result once it is done.
    pub async fn get_stream(&self, selections: &[FileSelection]) -> Result<RestoreStream> {
        let request = self.build_request(selections);
        let size = request.size;
        let job_id = self.archive.start_restore(&request).await?.job_id;
        info!(
            device_guid = %self.device_guid,
            %job_id,
            paths = selections.len(),
            "restore job submitted"
        );

        self.wait_for_job(&job_id).await?;
        debug!(%job_id, "restore job complete");

        let stream = self.archive.stream_restore_result(&job_id).await?;
        Ok(RestoreStream::new(stream, size))
    }

    /// Single status query.
    pub async fn is_job_complete(&self, job_id: &str) -> Result<bool> {
        Ok(self.archive.get_restore_status(job_id).await?.done)
    }

    /// Ask the storage node to abandon a job.
    pub async fn cancel_job(&self, job_id: &str) -> Result<()> {
        self.archive.cancel_restore(job_id).await
    }

    fn build_request(&self, selections: &[FileSelection]) -> RestoreRequest {
        RestoreRequest {
            guid: self.device_guid.clone(),
            web_restore_session_id: self.session_id.clone(),
            path_set: selections.iter().map(|s| s.path_set().clone()).collect(),
            num_files: selections.iter().map(FileSelection::num_files).sum(),
            num_dirs: selections.iter().map(FileSelection::num_dirs).sum(),
            size: selections.iter().map(FileSelection::size).sum(),
            zip_result: zip_result(selections),
            show_deleted: true,
        }
    }

    async fn wait_for_job(&self, job_id: &str) -> Result<()> {
        let started = Instant::now();
        loop {
            if self.is_job_complete(job_id).await? {
                return Ok(());
            }
            debug!(job_id, "restore job still running");
            if let Some(max_wait) = self.poll.max_wait {
                if started.elapsed() >= max_wait {
                    return Err(ArchiveError::RestoreJobTimeout {
                        job_id: job_id.to_string(),
                    });
                }
            }

            match &self.poll.cancel {
                Some(token) => {
                    tokio::select! {
                        _ = token.cancelled() => {
                            return Err(ArchiveError::RestoreJobCancelled {
                                job_id: job_id.to_string(),
                            });
                        }
                        _ = tokio::time::sleep(self.poll.interval) => {}
                    }
                }
                None => tokio::time::sleep(self.poll.interval).await,
            }
        }
    }
}

/// A directory or several paths come back zipped; a lone file is left to the
/// server default.
fn zip_result(selections: &[FileSelection]) -> Option<bool> {
    match selections {
        [single] if !single.file_type().is_directory() => None,
        [] => None,
        _ => Some(true),
    }
}
