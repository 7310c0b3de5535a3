use crate::{
    config::{AppConfig, WorkflowConfig},
    images::list_images,
    workflow::{
        payload::generate_comfy_prompt,
        submit::{PromptClient, SubmitOutcome},
    },
};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("failed to list images in {}: {}", .folder.display(), .source)]
    Discover {
        folder: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub attempted: usize,
    pub queued: usize,
    pub rejected: usize,
    pub failed: usize,
}

enum PairResult {
    Queued,
    Rejected,
    Failed,
}

async fn discover(folder: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let images = list_images(folder)
        .await
        .map_err(|source| BatchError::Discover {
            folder: folder.to_path_buf(),
            source,
        })?;

    tracing::info!("found {} images in {}", images.len(), folder.display());

    Ok(images)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[tracing::instrument(skip_all, fields(id = %file_name(id_image), pose = %file_name(pose_image)))]
async fn run_pair(
    client: &PromptClient,
    id_image: &Path,
    pose_image: &Path,
    workflow: &WorkflowConfig,
) -> PairResult {
    let prompt = match generate_comfy_prompt(id_image, pose_image, workflow).await {
        Ok(prompt) => prompt,
        Err(e) => {
            tracing::error!("failed to build prompt: {}", e);
            return PairResult::Failed;
        }
    };

    match client.queue_prompt(&prompt).await {
        Ok(SubmitOutcome::Queued { prompt_id, .. }) => {
            tracing::debug!("prompt_id: {:?}", prompt_id);
            PairResult::Queued
        }
        Ok(SubmitOutcome::Rejected { .. }) => PairResult::Rejected,
        Err(e) => {
            tracing::warn!("failed to queue workflow: {}", e);
            PairResult::Failed
        }
    }
}

/// Submit one prompt for every identity × pose combination, one at a time.
///
/// Only a folder that cannot be listed stops the batch. Problems with a
/// single pair are logged and counted in the summary.
pub async fn run_batch(config: &AppConfig) -> Result<BatchSummary, BatchError> {
    let id_images = discover(&config.ids_dir).await?;
    let pose_images = discover(&config.poses_dir).await?;

    if id_images.is_empty() || pose_images.is_empty() {
        tracing::warn!("nothing to submit");
    }

    let client = PromptClient::new(config.api_url.clone());
    tracing::info!("submitting to {}", client.api_url());

    let mut summary = BatchSummary::default();

    for id_image in id_images.iter() {
        for pose_image in pose_images.iter() {
            summary.attempted += 1;

            match run_pair(&client, id_image, pose_image, &config.workflow).await {
                PairResult::Queued => summary.queued += 1,
                PairResult::Rejected => summary.rejected += 1,
                PairResult::Failed => summary.failed += 1,
            }
        }
    }

    Ok(summary)
}
