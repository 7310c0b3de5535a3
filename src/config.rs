use std::{env, path::PathBuf, str::FromStr};
use url::Url;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ids_dir: PathBuf,
    pub poses_dir: PathBuf,
    pub api_url: Url,
    pub workflow: WorkflowConfig,
}

/// Literals baked into the PuLID + OpenPose workflow graph.
///
/// The defaults are what the ComfyUI nodes on the other side expect,
/// so changing them here changes every generated prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowConfig {
    pub checkpoint: String,
    pub controlnet: String,
    pub pulid_file: String,
    pub prompt: String,
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    pub batch_size: u32,
    pub steps: u32,
    pub cfg: f64,
    pub denoise: f64,
    pub sampler: String,
    pub scheduler: String,
    pub controlnet_strength: f64,
    pub pulid_method: String,
    pub pulid_weight: f64,
    pub pulid_start_at: f64,
    pub pulid_end_at: f64,
    pub face_provider: String,
    pub filename_prefix: String,
    /// Pin the seed instead of drawing a random one for each prompt.
    pub seed: Option<u32>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            checkpoint: "juggernautXL_juggXIByRundiffusion.safetensors".into(),
            controlnet: "OpenPoseXL2.safetensors".into(),
            pulid_file: "ip-adapter_pulid_sdxl_fp16.safetensors".into(),
            prompt: "professional photograph, attractive woman in sports attire".into(),
            negative_prompt: "bad quality, worse quality, awful, blurry, deformed, ugly".into(),
            width: 720,
            height: 1280,
            batch_size: 1,
            steps: 35,
            cfg: 2.0,
            denoise: 1.0,
            sampler: "dpmpp_sde_gpu".into(),
            scheduler: "karras".into(),
            controlnet_strength: 0.9,
            pulid_method: "fidelity".into(),
            pulid_weight: 1.0,
            pulid_start_at: 0.0,
            pulid_end_at: 1.0,
            face_provider: "CUDA".into(),
            filename_prefix: "APIPrompting_".into(),
            seed: None,
        }
    }
}

trait FromEnvWithDefault: Sized {
    fn from_env_or_default(key: &str, default: Self) -> Self;
}

macro_rules! impl_from_env_parse {
    ($($ty:ty),*) => {
        $(
            impl FromEnvWithDefault for $ty {
                fn from_env_or_default(key: &str, default: Self) -> Self {
                    env::var(key)
                        .ok()
                        .and_then(|val| val.parse().ok())
                        .unwrap_or(default)
                }
            }
        )*
    };
}

impl_from_env_parse!(u32, f64);

impl FromEnvWithDefault for String {
    fn from_env_or_default(key: &str, default: Self) -> Self {
        env::var(key).unwrap_or(default)
    }
}

impl FromEnvWithDefault for PathBuf {
    fn from_env_or_default(key: &str, default: Self) -> Self {
        env::var_os(key).map(PathBuf::from).unwrap_or(default)
    }
}

impl FromEnvWithDefault for Url {
    fn from_env_or_default(key: &str, default: Self) -> Self {
        match env::var(key) {
            Ok(val) => Url::parse(&val).unwrap_or_else(|e| {
                tracing::warn!("invalid url in {} ({}): {}, using {}", key, val, e, default);
                default
            }),
            Err(_) => default,
        }
    }
}

impl<T> FromEnvWithDefault for Option<T>
where
    T: FromStr,
{
    fn from_env_or_default(key: &str, default: Self) -> Self {
        env::var(key)
            .ok()
            .and_then(|val| val.parse().ok())
            .or(default)
    }
}

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8188/prompt";

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            ids_dir: PathBuf::from_env_or_default("IDS_FOLDER", "ids".into()),
            poses_dir: PathBuf::from_env_or_default("POSES_FOLDER", "poses".into()),
            api_url: Url::from_env_or_default("COMFYUI_API_URL", default_api_url()),
            workflow: WorkflowConfig::from_env(),
        }
    }
}

fn default_api_url() -> Url {
    Url::parse(DEFAULT_API_URL).expect("default api url should be valid")
}

impl WorkflowConfig {
    pub fn from_env() -> Self {
        let d = Self::default();

        Self {
            checkpoint: String::from_env_or_default("WORKFLOW__CHECKPOINT", d.checkpoint),
            controlnet: String::from_env_or_default("WORKFLOW__CONTROLNET", d.controlnet),
            pulid_file: String::from_env_or_default("WORKFLOW__PULID_FILE", d.pulid_file),
            prompt: String::from_env_or_default("WORKFLOW__PROMPT", d.prompt),
            negative_prompt: String::from_env_or_default(
                "WORKFLOW__NEGATIVE_PROMPT",
                d.negative_prompt,
            ),
            width: u32::from_env_or_default("WORKFLOW__WIDTH", d.width),
            height: u32::from_env_or_default("WORKFLOW__HEIGHT", d.height),
            batch_size: u32::from_env_or_default("WORKFLOW__BATCH_SIZE", d.batch_size),
            steps: u32::from_env_or_default("WORKFLOW__STEPS", d.steps),
            cfg: f64::from_env_or_default("WORKFLOW__CFG", d.cfg),
            denoise: f64::from_env_or_default("WORKFLOW__DENOISE", d.denoise),
            sampler: String::from_env_or_default("WORKFLOW__SAMPLER", d.sampler),
            scheduler: String::from_env_or_default("WORKFLOW__SCHEDULER", d.scheduler),
            controlnet_strength: f64::from_env_or_default(
                "WORKFLOW__CONTROLNET_STRENGTH",
                d.controlnet_strength,
            ),
            pulid_method: String::from_env_or_default("WORKFLOW__PULID_METHOD", d.pulid_method),
            pulid_weight: f64::from_env_or_default("WORKFLOW__PULID_WEIGHT", d.pulid_weight),
            pulid_start_at: f64::from_env_or_default(
                "WORKFLOW__PULID_START_AT",
                d.pulid_start_at,
            ),
            pulid_end_at: f64::from_env_or_default("WORKFLOW__PULID_END_AT", d.pulid_end_at),
            face_provider: String::from_env_or_default(
                "WORKFLOW__FACE_PROVIDER",
                d.face_provider,
            ),
            filename_prefix: String::from_env_or_default(
                "WORKFLOW__FILENAME_PREFIX",
                d.filename_prefix,
            ),
            seed: Option::<u32>::from_env_or_default("WORKFLOW__SEED", d.seed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_api_url_points_at_local_comfyui() {
        let url = default_api_url();
        assert_eq!(url.host_str(), Some("127.0.0.1"));
        assert_eq!(url.port(), Some(8188));
        assert_eq!(url.path(), "/prompt");
    }

    #[test]
    fn unparsable_values_fall_back_to_default() {
        env::set_var("COMFY_POSE_BATCH_TEST__STEPS", "many");
        env::set_var("COMFY_POSE_BATCH_TEST__URL", "not a url");
        env::set_var("COMFY_POSE_BATCH_TEST__SEED", "-1");

        assert_eq!(u32::from_env_or_default("COMFY_POSE_BATCH_TEST__STEPS", 35), 35);
        assert_eq!(
            Url::from_env_or_default("COMFY_POSE_BATCH_TEST__URL", default_api_url()),
            default_api_url()
        );
        assert_eq!(
            Option::<u32>::from_env_or_default("COMFY_POSE_BATCH_TEST__SEED", None),
            None
        );
    }

    #[test]
    fn set_values_override_default() {
        env::set_var("COMFY_POSE_BATCH_TEST__CFG", "4.5");
        env::set_var("COMFY_POSE_BATCH_TEST__PINNED_SEED", "42");
        env::set_var("COMFY_POSE_BATCH_TEST__DIR", "/data/ids");

        assert_eq!(f64::from_env_or_default("COMFY_POSE_BATCH_TEST__CFG", 2.0), 4.5);
        assert_eq!(
            Option::<u32>::from_env_or_default("COMFY_POSE_BATCH_TEST__PINNED_SEED", None),
            Some(42)
        );
        assert_eq!(
            PathBuf::from_env_or_default("COMFY_POSE_BATCH_TEST__DIR", "ids".into()),
            PathBuf::from("/data/ids")
        );
    }

    #[test]
    fn missing_values_use_default() {
        assert_eq!(
            String::from_env_or_default("COMFY_POSE_BATCH_TEST__UNSET", "karras".into()),
            "karras"
        );
    }
}
