use super::*;
use crate::core::config::{ModelInferenceConfig, OrtSessionConfig};
use crate::core::errors::SwapResult;
use crate::core::inference::session;
use ort::execution_providers::ExecutionProviderDispatch;
use ort::logging::LogLevel;
use ort::session::builder::SessionBuilder;
use std::path::Path;

impl OrtInfer {
    /// Loads a single-session engine with default ONNX Runtime settings.
    pub fn new(kind: ModelKind, model_path: impl AsRef<Path>) -> SwapResult<Self> {
        Self::from_config(kind, &ModelInferenceConfig::default(), model_path)
    }

    /// Loads an engine from a [`ModelInferenceConfig`], building one session per
    /// pool slot.
    ///
    /// # Arguments
    ///
    /// * `kind` - The model kind, used for error attribution.
    /// * `common` - Pool size, session settings and tensor names.
    /// * `model_path` - Path to the `.onnx` weight file.
    pub fn from_config(
        kind: ModelKind,
        common: &ModelInferenceConfig,
        model_path: impl AsRef<Path>,
    ) -> SwapResult<Self> {
        let path = model_path.as_ref();
        let pool_size = common.session_pool_size.unwrap_or(1).max(1);
        let mut sessions = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let session = session::load_session_with(
                kind,
                path,
                |builder| match &common.ort_session {
                    Some(cfg) => Self::apply_ort_config(builder, cfg),
                    None => builder.with_log_level(LogLevel::Error),
                },
                Some("check device/EP configuration and model file"),
            )?;
            sessions.push(session);
        }

        let input_names = match &common.input_names {
            Some(names) => names.clone(),
            None => sessions[0].inputs.iter().map(|i| i.name.clone()).collect(),
        };
        let output_name = match &common.output_name {
            Some(name) => name.clone(),
            None => sessions[0]
                .outputs
                .first()
                .map(|o| o.name.clone())
                .ok_or_else(|| {
                    SwapError::model_load(
                        kind,
                        path,
                        "model declares no outputs",
                        None::<crate::core::errors::SimpleError>,
                    )
                })?,
        };

        let model_name = common
            .model_name
            .clone()
            .unwrap_or_else(|| kind.as_str().to_string());

        tracing::debug!(
            model = %model_name,
            path = %path.display(),
            pool_size,
            inputs = ?input_names,
            output = %output_name,
            "loaded ONNX session pool"
        );

        Ok(OrtInfer {
            sessions: sessions.into_iter().map(|s| Mutex::new(Some(s))).collect(),
            next_idx: AtomicUsize::new(0),
            input_names,
            output_name,
            model_path: path.to_path_buf(),
            model_name,
            kind,
        })
    }

    /// Applies [`OrtSessionConfig`] settings to a session builder.
    fn apply_ort_config(
        mut builder: SessionBuilder,
        cfg: &OrtSessionConfig,
    ) -> Result<SessionBuilder, ort::Error> {
        builder = builder.with_log_level(LogLevel::Error)?;
        if let Some(intra) = cfg.intra_threads {
            builder = builder.with_intra_threads(intra)?;
        }
        if let Some(inter) = cfg.inter_threads {
            builder = builder.with_inter_threads(inter)?;
        }
        if let Some(enable) = cfg.enable_mem_pattern {
            builder = builder.with_memory_pattern(enable)?;
        }
        if let Some(level) = cfg.optimization_level {
            use crate::core::config::OrtGraphOptimizationLevel as OG;
            use ort::session::builder::GraphOptimizationLevel as GOL;
            let mapped = match level {
                OG::DisableAll => GOL::Disable,
                OG::Level1 => GOL::Level1,
                OG::Level2 => GOL::Level2,
                OG::Level3 => GOL::Level3,
            };
            builder = builder.with_optimization_level(mapped)?;
        }
        if let Some(eps) = &cfg.execution_providers {
            let providers = Self::build_execution_providers(eps)?;
            if !providers.is_empty() {
                builder = builder.with_execution_providers(providers)?;
            }
        }
        Ok(builder)
    }

    /// Maps configured providers onto ONNX Runtime dispatchers.
    fn build_execution_providers(
        eps: &[crate::core::config::OrtExecutionProvider],
    ) -> Result<Vec<ExecutionProviderDispatch>, ort::Error> {
        use crate::core::config::OrtExecutionProvider as EP;
        let mut providers = Vec::new();

        for ep in eps {
            match ep {
                EP::CPU => {
                    providers
                        .push(ort::execution_providers::CPUExecutionProvider::default().build());
                }
                #[cfg(feature = "cuda")]
                EP::CUDA {
                    device_id,
                    gpu_mem_limit,
                } => {
                    let mut cuda_provider =
                        ort::execution_providers::CUDAExecutionProvider::default();
                    if let Some(id) = device_id {
                        cuda_provider = cuda_provider.with_device_id(*id);
                    }
                    if let Some(limit) = gpu_mem_limit {
                        cuda_provider = cuda_provider.with_memory_limit(*limit);
                    }
                    providers.push(cuda_provider.build());
                }
                #[cfg(feature = "tensorrt")]
                EP::TensorRT {
                    device_id,
                    fp16_enable,
                } => {
                    let mut trt_provider =
                        ort::execution_providers::TensorRTExecutionProvider::default();
                    if let Some(id) = device_id {
                        trt_provider = trt_provider.with_device_id(*id);
                    }
                    if let Some(fp16) = fp16_enable {
                        trt_provider = trt_provider.with_fp16(*fp16);
                    }
                    providers.push(trt_provider.build());
                }
                #[cfg(feature = "directml")]
                EP::DirectML { device_id } => {
                    let mut dml_provider =
                        ort::execution_providers::DirectMLExecutionProvider::default();
                    if let Some(id) = device_id {
                        dml_provider = dml_provider.with_device_id(*id);
                    }
                    providers.push(dml_provider.build());
                }
                #[cfg(feature = "coreml")]
                EP::CoreML { subgraphs } => {
                    let mut coreml_provider =
                        ort::execution_providers::CoreMLExecutionProvider::default();
                    if let Some(sub) = subgraphs {
                        coreml_provider = coreml_provider.with_subgraphs(*sub);
                    }
                    providers.push(coreml_provider.build());
                }
                #[cfg(not(feature = "cuda"))]
                EP::CUDA { .. } => {
                    return Err(ort::Error::new(
                        "CUDA execution provider requested but cuda feature is not enabled",
                    ));
                }
                #[cfg(not(feature = "tensorrt"))]
                EP::TensorRT { .. } => {
                    return Err(ort::Error::new(
                        "TensorRT execution provider requested but tensorrt feature is not enabled",
                    ));
                }
                #[cfg(not(feature = "directml"))]
                EP::DirectML { .. } => {
                    return Err(ort::Error::new(
                        "DirectML execution provider requested but directml feature is not enabled",
                    ));
                }
                #[cfg(not(feature = "coreml"))]
                EP::CoreML { .. } => {
                    return Err(ort::Error::new(
                        "CoreML execution provider requested but coreml feature is not enabled",
                    ));
                }
            }
        }

        Ok(providers)
    }
}
