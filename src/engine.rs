use opencv::{
    core::{Mat, Scalar},
    dnn,
    prelude::*,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Input layer of the inception graph.
pub const INPUT_LAYER: &str = "input";
/// Output layer of the inception graph.
pub const OUTPUT_LAYER: &str = "softmax2";

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to read network model {path:?}: {source}")]
    ReadModelFailed {
        path: PathBuf,
        #[source]
        source: opencv::Error,
    },
    #[error("Network model {0:?} is empty")]
    EmptyModel(PathBuf),
    #[error("Forward pass failed: {0}")]
    ForwardFailed(opencv::Error),
    #[error("Network produced no scores")]
    EmptyOutput,
    #[error("OpenCV error: {0}")]
    OpenCvError(opencv::Error),
}

impl From<opencv::Error> for EngineError {
    fn from(err: opencv::Error) -> Self {
        EngineError::OpenCvError(err)
    }
}

pub trait InferenceEngine {
    /// Runs a forward pass on a preprocessed blob and returns the flattened
    /// score vector, one entry per class.
    fn infer(&mut self, blob: &Mat) -> Result<Vec<f32>, EngineError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Default,
    Halide,
    OpenVino,
    OpenCv,
    Vulkan,
    Cuda,
}

impl Backend {
    /// Unknown names fall back to the default backend.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "default" => Self::Default,
            "halide" => Self::Halide,
            "openvino" => Self::OpenVino,
            "opencv" => Self::OpenCv,
            "vulkan" => Self::Vulkan,
            "cuda" => Self::Cuda,
            other => {
                tracing::warn!("Unknown backend `{}`, using default", other);
                Self::Default
            }
        }
    }

    pub fn as_raw(&self) -> i32 {
        match self {
            Backend::Default => dnn::DNN_BACKEND_DEFAULT,
            Backend::Halide => dnn::DNN_BACKEND_HALIDE,
            Backend::OpenVino => dnn::DNN_BACKEND_INFERENCE_ENGINE,
            Backend::OpenCv => dnn::DNN_BACKEND_OPENCV,
            Backend::Vulkan => dnn::DNN_BACKEND_VKCOM,
            Backend::Cuda => dnn::DNN_BACKEND_CUDA,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    Cpu,
    OpenCl,
    OpenClFp16,
    Myriad,
    Vulkan,
    Fpga,
    Cuda,
    CudaFp16,
}

impl Target {
    /// Unknown names fall back to the CPU target.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "cpu" => Self::Cpu,
            "fp32" => Self::OpenCl,
            "fp16" => Self::OpenClFp16,
            "vpu" => Self::Myriad,
            "vulkan" => Self::Vulkan,
            "fpga" => Self::Fpga,
            "cuda" => Self::Cuda,
            "cudafp16" => Self::CudaFp16,
            other => {
                tracing::warn!("Unknown target `{}`, using cpu", other);
                Self::Cpu
            }
        }
    }

    pub fn as_raw(&self) -> i32 {
        match self {
            Target::Cpu => dnn::DNN_TARGET_CPU,
            Target::OpenCl => dnn::DNN_TARGET_OPENCL,
            Target::OpenClFp16 => dnn::DNN_TARGET_OPENCL_FP16,
            Target::Myriad => dnn::DNN_TARGET_MYRIAD,
            Target::Vulkan => dnn::DNN_TARGET_VULKAN,
            Target::Fpga => dnn::DNN_TARGET_FPGA,
            Target::Cuda => dnn::DNN_TARGET_CUDA,
            Target::CudaFp16 => dnn::DNN_TARGET_CUDA_FP16,
        }
    }
}

/// OpenCV DNN network loaded from a serialized model file.
pub struct DnnEngine {
    net: dnn::Net,
}

impl DnnEngine {
    pub fn new(model: &Path, backend: Backend, target: Target) -> Result<Self, EngineError> {
        let path = model.to_string_lossy();
        let mut net =
            dnn::read_net(&path, "", "").map_err(|source| EngineError::ReadModelFailed {
                path: model.to_path_buf(),
                source,
            })?;
        if net.empty()? {
            return Err(EngineError::EmptyModel(model.to_path_buf()));
        }

        net.set_preferable_backend(backend.as_raw())?;
        net.set_preferable_target(target.as_raw())?;

        tracing::info!(
            "Loaded network {:?} with backend {:?} and target {:?}",
            model,
            backend,
            target
        );

        Ok(Self { net })
    }
}

impl InferenceEngine for DnnEngine {
    fn infer(&mut self, blob: &Mat) -> Result<Vec<f32>, EngineError> {
        self.net
            .set_input(blob, INPUT_LAYER, 1.0, Scalar::default())
            .map_err(EngineError::ForwardFailed)?;
        let output = self
            .net
            .forward_single(OUTPUT_LAYER)
            .map_err(EngineError::ForwardFailed)?;

        let flat = output.reshape(1, 1)?;
        let scores = flat.data_typed::<f32>()?.to_vec();
        Ok(scores)
    }
}
