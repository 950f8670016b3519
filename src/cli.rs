use crate::engine::{Backend, Target};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "tf_classifier")]
#[command(about = "Classify webcam frames with a pretrained network and show the labelled stream")]
#[command(version)]
pub struct Args {
    /// Camera index, or a video file / stream URL
    pub device: String,

    /// Serialized network model file
    pub model: PathBuf,

    /// Label descriptions, one per line
    pub descriptions: PathBuf,

    /// Inference backend: default, halide, openvino, opencv, vulkan, cuda
    pub backend: Option<String>,

    /// Inference target: cpu, fp32, fp16, vpu, vulkan, fpga, cuda, cudafp16
    pub target: Option<String>,
}

impl Args {
    pub fn backend(&self) -> Backend {
        self.backend
            .as_deref()
            .map(Backend::parse)
            .unwrap_or_default()
    }

    pub fn target(&self) -> Target {
        self.target.as_deref().map(Target::parse).unwrap_or_default()
    }
}
