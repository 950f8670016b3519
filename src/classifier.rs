use crate::{
    cv_utils::{CvUtilsError, Overlay},
    engine::{EngineError, InferenceEngine},
    vocabulary::Vocabulary,
};
use opencv::{
    core::{self, Mat, Scalar, Size},
    dnn,
};
use std::fmt;
use thiserror::Error;

/// Side of the square input the inception graph was trained on.
pub const INPUT_SIZE: i32 = 224;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Failed to build input blob: {0}")]
    BlobFailed(opencv::Error),
    #[error("Inference error: {0}")]
    Engine(#[from] EngineError),
    #[error("Overlay error: {0}")]
    Overlay(#[from] CvUtilsError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "description: {}, maxVal: {}",
            self.label, self.confidence
        )
    }
}

/// Index and value of the highest score. Ties go to the lowest index and NaN
/// never wins.
pub fn arg_max(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (index, value)| match best {
            _ if value.is_nan() => best,
            Some((_, max)) if value <= max => best,
            _ => Some((index, value)),
        })
}

pub fn decode(scores: &[f32], vocabulary: &Vocabulary) -> Result<Classification, EngineError> {
    let (index, confidence) = arg_max(scores).ok_or(EngineError::EmptyOutput)?;
    Ok(Classification {
        label: vocabulary.resolve(index).to_string(),
        confidence,
    })
}

pub struct Classifier<E: InferenceEngine> {
    engine: E,
    vocabulary: Vocabulary,
    overlay: Overlay,
}

impl<E: InferenceEngine> Classifier<E> {
    pub fn new(engine: E, vocabulary: Vocabulary, overlay: Overlay) -> Self {
        Self {
            engine,
            vocabulary,
            overlay,
        }
    }

    /// Classifies `frame` and writes the status text onto it.
    ///
    /// The frame must be non-empty.
    pub fn classify(&mut self, frame: &mut Mat) -> Result<Classification, ClassifierError> {
        let classification = {
            let blob = dnn::blob_from_image(
                &*frame,
                1.0,
                Size::new(INPUT_SIZE, INPUT_SIZE),
                Scalar::all(0.0),
                true,
                false,
                core::CV_32F,
            )
            .map_err(ClassifierError::BlobFailed)?;
            let scores = self.engine.infer(&blob)?;
            decode(&scores, &self.vocabulary)?
        };

        self.overlay
            .annotate(frame, &classification.to_string())?;
        Ok(classification)
    }
}
