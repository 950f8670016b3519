use crate::{
    camera::{Camera, CameraError, FrameSource, FrameStatus},
    classifier::Classifier,
    cli::Args,
    config::Config,
    cv_utils::Overlay,
    display::{DisplaySink, Window},
    engine::{DnnEngine, InferenceEngine},
    error::AppError,
    status::spawn_status_printer,
    vocabulary::Vocabulary,
};
use opencv::core::Mat;
use std::thread;
use tokio::sync::mpsc::{self, UnboundedSender};

/// Classifies a frame, reports its status, then shows it.
pub struct FrameProcessor<E: InferenceEngine, D: DisplaySink> {
    classifier: Classifier<E>,
    display: D,
    status_tx: UnboundedSender<String>,
    processed: u64,
}

impl<E: InferenceEngine, D: DisplaySink> FrameProcessor<E, D> {
    pub fn new(classifier: Classifier<E>, display: D, status_tx: UnboundedSender<String>) -> Self {
        Self {
            classifier,
            display,
            status_tx,
            processed: 0,
        }
    }

    /// Returns `true` once the user asked to quit.
    pub fn process(&mut self, frame: &mut Mat) -> Result<bool, AppError> {
        let classification = self.classifier.classify(frame)?;
        self.processed += 1;
        tracing::debug!(
            frame = self.processed,
            label = %classification.label,
            confidence = classification.confidence,
            "Classified frame"
        );

        if self.status_tx.send(classification.to_string()).is_err() {
            tracing::warn!("Status printer is gone, dropping status");
        }

        Ok(self.display.show(frame)?)
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }
}

/// Reads, classifies and shows one frame at a time on the calling thread.
pub fn run_synchronous<S, E, D>(
    source: &mut S,
    processor: &mut FrameProcessor<E, D>,
) -> Result<(), AppError>
where
    S: FrameSource,
    E: InferenceEngine,
    D: DisplaySink,
{
    let mut frame = Mat::default();
    loop {
        if source.read(&mut frame)? == FrameStatus::Empty {
            tracing::trace!("Empty frame, skipping");
            continue;
        }
        if processor.process(&mut frame)? {
            tracing::info!("Exit requested");
            return Ok(());
        }
    }
}

/// Captures on a dedicated thread while the calling thread classifies and
/// shows. At most one captured frame waits in the channel.
pub fn run_pipelined<S, E, D>(
    source: S,
    processor: &mut FrameProcessor<E, D>,
) -> Result<(), AppError>
where
    S: FrameSource + Send + 'static,
    E: InferenceEngine,
    D: DisplaySink,
{
    let (frame_tx, mut frame_rx) = mpsc::channel::<Mat>(1);
    let capture = thread::Builder::new()
        .name("capture".to_string())
        .spawn(move || capture_frames(source, frame_tx))
        .map_err(AppError::SpawnCaptureFailed)?;

    let mut result = Ok(());
    let mut exit_requested = false;
    while let Some(mut frame) = frame_rx.blocking_recv() {
        match processor.process(&mut frame) {
            Ok(false) => {}
            Ok(true) => {
                tracing::info!("Exit requested");
                exit_requested = true;
                break;
            }
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }

    // Unblocks a pending send so the capture thread can finish.
    drop(frame_rx);
    let captured = capture
        .join()
        .map_err(|_| AppError::CaptureThreadPanicked)?;
    result?;
    match captured {
        // The capture thread reads ahead, so the stream may end after the
        // user already quit.
        Err(CameraError::DeviceClosed(device)) if exit_requested => {
            tracing::debug!("Device {} closed after exit was requested", device);
            Ok(())
        }
        captured => captured.map_err(AppError::from),
    }
}

fn capture_frames<S: FrameSource>(
    mut source: S,
    frame_tx: mpsc::Sender<Mat>,
) -> Result<(), CameraError> {
    loop {
        let mut frame = Mat::default();
        if source.read(&mut frame)? == FrameStatus::Empty {
            tracing::trace!("Empty frame, skipping");
            continue;
        }
        if frame_tx.blocking_send(frame).is_err() {
            tracing::debug!("Frame receiver closed, stopping capture");
            return Ok(());
        }
    }
}

pub async fn start_app(config: Config, args: Args) -> Result<(), AppError> {
    let vocabulary = Vocabulary::load(&args.descriptions)?;

    let mut camera = Camera::open(&args.device)?;
    let window = Window::new(&config.window_title)?;
    let engine = DnnEngine::new(&args.model, args.backend(), args.target())?;

    let classifier = Classifier::new(engine, vocabulary, Overlay::from(&config.overlay));
    let (status_tx, status_printer) = spawn_status_printer();
    let mut processor = FrameProcessor::new(classifier, window, status_tx);

    println!("Start reading device: {}", camera.device());

    // highgui needs the thread that created the window, so the loop stays here.
    let result = tokio::task::block_in_place(|| {
        if config.pipeline.enabled {
            tracing::info!("Running pipelined capture");
            run_pipelined(camera, &mut processor)
        } else {
            run_synchronous(&mut camera, &mut processor)
        }
    });

    tracing::info!("Processed {} frames", processor.processed());
    drop(processor);
    status_printer.await?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{display::DisplayError, engine::EngineError};
    use opencv::core::{self, Scalar};
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
    };

    enum Step {
        Frame,
        Empty,
    }

    struct FakeSource {
        steps: VecDeque<Step>,
        reads: Arc<Mutex<usize>>,
    }

    impl FakeSource {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: steps.into(),
                reads: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl FrameSource for FakeSource {
        fn read(&mut self, frame: &mut Mat) -> Result<FrameStatus, CameraError> {
            *self.reads.lock().unwrap() += 1;
            match self.steps.pop_front() {
                Some(Step::Frame) => {
                    *frame = Mat::new_rows_cols_with_default(
                        48,
                        64,
                        core::CV_8UC3,
                        Scalar::all(0.0),
                    )
                    .map_err(CameraError::ReadFrameFailed)?;
                    Ok(FrameStatus::Ready)
                }
                Some(Step::Empty) => {
                    *frame = Mat::default();
                    Ok(FrameStatus::Empty)
                }
                None => Err(CameraError::DeviceClosed("fake".to_string())),
            }
        }
    }

    struct FakeEngine;

    impl InferenceEngine for FakeEngine {
        fn infer(&mut self, _blob: &Mat) -> Result<Vec<f32>, EngineError> {
            Ok(vec![0.1, 0.9])
        }
    }

    struct FakeDisplay {
        quit_after: usize,
        shown: Vec<bool>,
    }

    impl FakeDisplay {
        fn quitting_after(quit_after: usize) -> Self {
            Self {
                quit_after,
                shown: Vec::new(),
            }
        }
    }

    impl DisplaySink for FakeDisplay {
        fn show(&mut self, frame: &Mat) -> Result<bool, DisplayError> {
            let annotated = core::sum_elems(frame).map_err(DisplayError::ShowFailed)?[1] > 0.0;
            self.shown.push(annotated);
            Ok(self.shown.len() >= self.quit_after)
        }
    }

    fn processor(
        display: FakeDisplay,
    ) -> (
        FrameProcessor<FakeEngine, FakeDisplay>,
        mpsc::UnboundedReceiver<String>,
    ) {
        let vocabulary = Vocabulary::new(vec!["cat".to_string(), "dog".to_string()]);
        let classifier = Classifier::new(FakeEngine, vocabulary, Overlay::default());
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        (FrameProcessor::new(classifier, display, status_tx), status_rx)
    }

    fn drain(status_rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
        let mut statuses = Vec::new();
        while let Ok(status) = status_rx.try_recv() {
            statuses.push(status);
        }
        statuses
    }

    #[test]
    fn test_synchronous_skips_empty_frames_and_stops_on_exit_key() {
        let mut source = FakeSource::new(vec![
            Step::Empty,
            Step::Frame,
            Step::Empty,
            Step::Empty,
            Step::Frame,
            Step::Frame,
        ]);
        let (mut processor, mut status_rx) = processor(FakeDisplay::quitting_after(2));

        run_synchronous(&mut source, &mut processor).unwrap();

        assert_eq!(processor.processed(), 2);
        assert_eq!(processor.display.shown, vec![true, true]);
        assert_eq!(*source.reads.lock().unwrap(), 5);
        assert_eq!(
            drain(&mut status_rx),
            vec!["description: dog, maxVal: 0.9"; 2]
        );
    }

    #[test]
    fn test_synchronous_fails_when_device_closes() {
        let mut source = FakeSource::new(vec![Step::Frame, Step::Empty]);
        let (mut processor, mut status_rx) = processor(FakeDisplay::quitting_after(10));

        let result = run_synchronous(&mut source, &mut processor);

        assert!(matches!(
            result,
            Err(AppError::Camera(CameraError::DeviceClosed(_)))
        ));
        assert_eq!(processor.processed(), 1);
        assert_eq!(drain(&mut status_rx).len(), 1);
    }

    #[test]
    fn test_pipelined_stops_on_exit_key() {
        let steps = (0..10)
            .flat_map(|_| [Step::Frame, Step::Empty])
            .collect::<Vec<_>>();
        let source = FakeSource::new(steps);
        let (mut processor, mut status_rx) = processor(FakeDisplay::quitting_after(3));

        run_pipelined(source, &mut processor).unwrap();

        assert_eq!(processor.processed(), 3);
        assert_eq!(processor.display.shown, vec![true, true, true]);
        assert_eq!(drain(&mut status_rx).len(), 3);
    }

    #[test]
    fn test_pipelined_exit_key_wins_over_end_of_stream() {
        for _ in 0..20 {
            let source = FakeSource::new(vec![Step::Frame, Step::Frame]);
            let (mut processor, mut status_rx) = processor(FakeDisplay::quitting_after(1));

            let result = run_pipelined(source, &mut processor);

            assert!(result.is_ok(), "unexpected error: {:?}", result);
            assert_eq!(processor.processed(), 1);
            assert_eq!(drain(&mut status_rx).len(), 1);
        }
    }

    #[test]
    fn test_pipelined_fails_when_device_closes() {
        let source = FakeSource::new(vec![Step::Frame, Step::Frame]);
        let (mut processor, mut status_rx) = processor(FakeDisplay::quitting_after(10));

        let result = run_pipelined(source, &mut processor);

        assert!(matches!(
            result,
            Err(AppError::Camera(CameraError::DeviceClosed(_)))
        ));
        assert_eq!(processor.processed(), 2);
        assert_eq!(
            drain(&mut status_rx),
            vec!["description: dog, maxVal: 0.9"; 2]
        );
    }
}
