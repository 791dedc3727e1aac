//! ONNX Runtime configuration types.

use serde::{Deserialize, Serialize};

/// Graph optimization levels for ONNX Runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrtGraphOptimizationLevel {
    /// Disable all optimizations.
    DisableAll,
    /// Enable basic optimizations.
    #[default]
    Level1,
    /// Enable extended optimizations.
    Level2,
    /// Enable all optimizations.
    Level3,
}

/// Execution providers for ONNX Runtime.
///
/// Accelerator providers are only usable when the matching cargo feature is
/// enabled; requesting one without the feature fails session creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum OrtExecutionProvider {
    /// CPU execution provider (always available).
    #[default]
    CPU,
    /// NVIDIA CUDA execution provider.
    CUDA {
        /// CUDA device ID (default: 0).
        device_id: Option<i32>,
        /// Memory limit in bytes.
        gpu_mem_limit: Option<usize>,
    },
    /// NVIDIA TensorRT execution provider.
    TensorRT {
        /// Device ID (default: 0).
        device_id: Option<i32>,
        /// Enable FP16 kernels.
        fp16_enable: Option<bool>,
    },
    /// DirectML execution provider (Windows only).
    DirectML {
        /// DirectML device ID (default: 0).
        device_id: Option<i32>,
    },
    /// CoreML execution provider (macOS/iOS only).
    CoreML {
        /// Enable subgraphs.
        subgraphs: Option<bool>,
    },
}

impl OrtExecutionProvider {
    /// Returns true for every provider other than CPU.
    pub fn is_accelerator(&self) -> bool {
        !matches!(self, OrtExecutionProvider::CPU)
    }
}

/// High level device selection.
///
/// `Auto` prefers whichever accelerator the crate was compiled with and always
/// keeps CPU as the fallback, so session creation succeeds on machines without
/// a GPU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    /// Use an accelerator if the build supports one, else CPU.
    #[default]
    Auto,
    /// CPU only.
    Cpu,
    /// A specific CUDA device.
    Cuda(i32),
}

impl Device {
    /// Parses device strings such as `cpu`, `auto`, `cuda` or `cuda:1`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        match value.as_str() {
            "auto" => Some(Device::Auto),
            "cpu" => Some(Device::Cpu),
            "cuda" | "gpu" => Some(Device::Cuda(0)),
            other => other
                .strip_prefix("cuda:")
                .and_then(|id| id.parse().ok())
                .map(Device::Cuda),
        }
    }

    /// Expands the device into an ordered execution provider list.
    pub fn execution_providers(&self) -> Vec<OrtExecutionProvider> {
        match self {
            Device::Cpu => vec![OrtExecutionProvider::CPU],
            Device::Cuda(id) => vec![
                OrtExecutionProvider::CUDA {
                    device_id: Some(*id),
                    gpu_mem_limit: None,
                },
                OrtExecutionProvider::CPU,
            ],
            Device::Auto => {
                let mut providers = Vec::new();
                if cfg!(feature = "tensorrt") {
                    providers.push(OrtExecutionProvider::TensorRT {
                        device_id: None,
                        fp16_enable: None,
                    });
                }
                if cfg!(feature = "cuda") {
                    providers.push(OrtExecutionProvider::CUDA {
                        device_id: None,
                        gpu_mem_limit: None,
                    });
                }
                if cfg!(feature = "directml") {
                    providers.push(OrtExecutionProvider::DirectML { device_id: None });
                }
                if cfg!(feature = "coreml") {
                    providers.push(OrtExecutionProvider::CoreML { subgraphs: None });
                }
                providers.push(OrtExecutionProvider::CPU);
                providers
            }
        }
    }
}

/// Configuration for ONNX Runtime sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrtSessionConfig {
    /// Number of threads used to parallelize execution within nodes.
    pub intra_threads: Option<usize>,
    /// Number of threads used to parallelize execution across nodes.
    pub inter_threads: Option<usize>,
    /// Graph optimization level.
    pub optimization_level: Option<OrtGraphOptimizationLevel>,
    /// Execution providers in order of preference.
    pub execution_providers: Option<Vec<OrtExecutionProvider>>,
    /// Enable memory pattern optimization.
    pub enable_mem_pattern: Option<bool>,
}

impl OrtSessionConfig {
    /// Creates a new OrtSessionConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of intra-op threads.
    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }

    /// Sets the number of inter-op threads.
    pub fn with_inter_threads(mut self, threads: usize) -> Self {
        self.inter_threads = Some(threads);
        self
    }

    /// Sets the graph optimization level.
    pub fn with_optimization_level(mut self, level: OrtGraphOptimizationLevel) -> Self {
        self.optimization_level = Some(level);
        self
    }

    /// Sets the execution providers.
    pub fn with_execution_providers(mut self, providers: Vec<OrtExecutionProvider>) -> Self {
        self.execution_providers = Some(providers);
        self
    }

    /// Enables or disables memory pattern optimization.
    pub fn with_memory_pattern(mut self, enable: bool) -> Self {
        self.enable_mem_pattern = Some(enable);
        self
    }

    /// Gets the execution providers, defaulting to CPU.
    pub fn get_execution_providers(&self) -> Vec<OrtExecutionProvider> {
        self.execution_providers
            .clone()
            .unwrap_or_else(|| vec![OrtExecutionProvider::CPU])
    }
}

/// Per-model inference settings applied when an [`crate::core::inference::OrtInfer`] is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelInferenceConfig {
    /// Display name used in logs and errors.
    pub model_name: Option<String>,
    /// Number of sessions in the pool (at least 1).
    pub session_pool_size: Option<usize>,
    /// ONNX Runtime session settings.
    pub ort_session: Option<OrtSessionConfig>,
    /// Explicit input tensor names, bound positionally.
    pub input_names: Option<Vec<String>>,
    /// Explicit output tensor name; defaults to the first model output.
    pub output_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ort_session_config_builder() {
        let config = OrtSessionConfig::new()
            .with_intra_threads(4)
            .with_inter_threads(2)
            .with_optimization_level(OrtGraphOptimizationLevel::Level2)
            .with_memory_pattern(true);

        assert_eq!(config.intra_threads, Some(4));
        assert_eq!(config.inter_threads, Some(2));
        assert_eq!(
            config.optimization_level,
            Some(OrtGraphOptimizationLevel::Level2)
        );
        assert_eq!(config.enable_mem_pattern, Some(true));
        assert_eq!(
            config.get_execution_providers(),
            vec![OrtExecutionProvider::CPU]
        );
    }

    #[test]
    fn test_device_parse() {
        assert_eq!(Device::parse("cpu"), Some(Device::Cpu));
        assert_eq!(Device::parse("CUDA:1"), Some(Device::Cuda(1)));
        assert_eq!(Device::parse("cuda"), Some(Device::Cuda(0)));
        assert_eq!(Device::parse("tpu"), None);
    }

    #[test]
    fn test_auto_device_always_falls_back_to_cpu() {
        let providers = Device::Auto.execution_providers();
        assert_eq!(providers.last(), Some(&OrtExecutionProvider::CPU));
        let cuda = Device::Cuda(2).execution_providers();
        assert!(cuda[0].is_accelerator());
        assert!(!cuda[1].is_accelerator());
    }

    #[test]
    fn test_session_config_deserializes_with_defaults() {
        let config: OrtSessionConfig = serde_json::from_str(r#"{"intra_threads": 2}"#).unwrap();
        assert_eq!(config.intra_threads, Some(2));
        assert!(config.execution_providers.is_none());
    }
}
