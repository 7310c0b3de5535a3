use crate::config::WorkflowConfig;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SEED_NODE_ID: &str = "116";
pub const POSE_IMAGE_NODE_ID: &str = "126";
pub const ID_IMAGE_NODE_ID: &str = "127";
pub const OUTPUT_NODE_ID: &str = "47";

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("failed to read image {}: {}", .path.display(), .source)]
    ReadImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Debug)]
pub struct ComfyUIPrompt {
    pub prompt: Value,
    pub seed: u32,
}

async fn encode_image(path: &Path) -> Result<String, PayloadError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| PayloadError::ReadImage {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(STANDARD.encode(bytes))
}

/// ComfyUI treats `2` and `2.0` the same, but whole numbers are still
/// written as integers so the graph matches the one saved from the UI.
fn number(value: f64) -> Value {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        json!(value as i64)
    } else {
        json!(value)
    }
}

fn load_image_base64(data: &str) -> Value {
    json!({
        "class_type": "easy loadImageBase64",
        "inputs": {
            "image_output": "Hide",
            "save_prefix": "",
            "base64_data": data,
        },
        "widgets_values": [data, "Preview", "ComfyUI"],
    })
}

/// Build the PuLID + OpenPose graph for one identity/pose pair.
pub fn build_prompt(
    id_image_base64: &str,
    pose_image_base64: &str,
    seed: u32,
    workflow: &WorkflowConfig,
) -> Value {
    json!({
        SEED_NODE_ID: {
            "class_type": "Seed",
            "inputs": {"seed": seed},
        },
        POSE_IMAGE_NODE_ID: load_image_base64(pose_image_base64),
        ID_IMAGE_NODE_ID: load_image_base64(id_image_base64),

        // pose conditioning
        "105": {
            "class_type": "ControlNetLoader",
            "inputs": {"control_net_name": workflow.controlnet},
        },
        "100": {
            "class_type": "OpenposePreprocessor",
            "inputs": {"image": [POSE_IMAGE_NODE_ID, 0]},
        },
        "104": {
            "class_type": "ControlNetApply",
            "inputs": {
                "conditioning": ["6", 0],
                "control_net": ["105", 0],
                "image": ["100", 0],
                "strength": number(workflow.controlnet_strength),
            },
        },

        // prompt and negative prompt
        "6": {
            "class_type": "CLIPTextEncode",
            "inputs": {
                "clip": ["4", 1],
                "text": workflow.prompt,
            },
        },
        "7": {
            "class_type": "CLIPTextEncode",
            "inputs": {
                "clip": ["4", 1],
                "text": workflow.negative_prompt,
            },
        },

        "5": {
            "class_type": "EmptyLatentImage",
            "inputs": {
                "batch_size": workflow.batch_size,
                "width": workflow.width,
                "height": workflow.height,
            },
        },
        "42": {
            "class_type": "KSampler",
            "inputs": {
                "cfg": number(workflow.cfg),
                "denoise": number(workflow.denoise),
                "latent_image": ["5", 0],
                "model": ["114", 0],
                "negative": ["7", 0],
                "positive": ["104", 0],
                "sampler_name": workflow.sampler,
                "scheduler": workflow.scheduler,
                "seed": [SEED_NODE_ID, 3],
                "steps": workflow.steps,
            },
        },
        "46": {
            "class_type": "VAEDecode",
            "inputs": {
                "samples": ["42", 0],
                "vae": ["4", 2],
            },
        },
        OUTPUT_NODE_ID: {
            "class_type": "SaveImage",
            "inputs": {
                "filename_prefix": workflow.filename_prefix,
                "images": ["46", 0],
            },
        },
        "4": {
            "class_type": "CheckpointLoaderSimple",
            "inputs": {"ckpt_name": workflow.checkpoint},
        },

        // identity
        "114": {
            "class_type": "ApplyPulid",
            "inputs": {
                "model": ["4", 0],
                "pulid": ["112", 0],
                "eva_clip": ["113", 0],
                "face_analysis": ["115", 0],
                "image": [ID_IMAGE_NODE_ID, 0],
                "start_at": number(workflow.pulid_start_at),
                "end_at": number(workflow.pulid_end_at),
                "weight": number(workflow.pulid_weight),
                "method": workflow.pulid_method,
            },
        },
        "112": {
            "class_type": "PulidModelLoader",
            "inputs": {"pulid_file": workflow.pulid_file},
        },
        "113": {
            "class_type": "PulidEvaClipLoader",
            "inputs": {},
        },
        "115": {
            "class_type": "PulidInsightFaceLoader",
            "inputs": {"provider": workflow.face_provider},
        },
    })
}

#[tracing::instrument(skip_all)]
pub async fn generate_comfy_prompt(
    id_image: &Path,
    pose_image: &Path,
    workflow: &WorkflowConfig,
) -> Result<ComfyUIPrompt, PayloadError> {
    let id_image_base64 = encode_image(id_image).await?;
    let pose_image_base64 = encode_image(pose_image).await?;

    let seed = workflow.seed.unwrap_or_else(rand::random::<u32>);
    tracing::debug!("seed: {}", seed);

    Ok(ComfyUIPrompt {
        prompt: build_prompt(&id_image_base64, &pose_image_base64, seed, workflow),
        seed,
    })
}
