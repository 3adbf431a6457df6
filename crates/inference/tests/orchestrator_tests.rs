//! Orchestrator Tests
//!
//! Behavior tests for the inference orchestrator against mock engines:
//! deadline dominance, error normalization, result packaging, and progress
//! forwarding.

use async_trait::async_trait;
use cutout_inference::{
    ConfigureCapability, CutoutError, EngineError, EngineLoader, EngineModule, EngineSettings,
    ImageArtifact, Orchestrator, OrchestratorConfig, ProgressReporter, ProgressStage,
    TransformOptions,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

fn png_payload() -> Vec<u8> {
    let mut bytes = PNG_SIGNATURE.to_vec();
    bytes.extend_from_slice(b"fake png body");
    bytes
}

fn input_artifact(name: &str, mime_type: &str) -> ImageArtifact {
    ImageArtifact::new(name, mime_type, vec![1, 2, 3, 4])
}

#[derive(Clone)]
enum MockBehavior {
    Succeed,
    Fail(&'static str),
    Hang(Duration),
    Garbage,
    EmitProgress(Vec<(ProgressStage, u64, u64)>),
}

struct MockEngine {
    behavior: MockBehavior,
    failing_configure: bool,
    transform_count: AtomicUsize,
}

impl MockEngine {
    fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            failing_configure: false,
            transform_count: AtomicUsize::new(0),
        }
    }

    fn with_failing_configure(behavior: MockBehavior) -> Self {
        Self {
            failing_configure: true,
            ..Self::new(behavior)
        }
    }
}

#[async_trait]
impl EngineModule for MockEngine {
    async fn transform(
        &self,
        _input: &ImageArtifact,
        _options: &TransformOptions,
        progress: ProgressReporter,
    ) -> Result<Vec<u8>, EngineError> {
        self.transform_count.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            MockBehavior::Succeed => Ok(png_payload()),
            MockBehavior::Fail(message) => Err((*message).into()),
            MockBehavior::Hang(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(png_payload())
            }
            MockBehavior::Garbage => Ok(b"JFIF not a png".to_vec()),
            MockBehavior::EmitProgress(events) => {
                for (stage, current, total) in events {
                    (*progress)(stage.clone(), *current, *total);
                }
                Ok(png_payload())
            }
        }
    }

    fn as_configurable(&self) -> Option<&dyn ConfigureCapability> {
        if self.failing_configure {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl ConfigureCapability for MockEngine {
    async fn configure(
        &self,
        _settings: &EngineSettings,
        _progress: ProgressReporter,
    ) -> Result<(), EngineError> {
        Err("configure exploded".into())
    }
}

struct MockLoader {
    engine: Arc<MockEngine>,
    load_count: AtomicUsize,
    failures_remaining: AtomicUsize,
}

impl MockLoader {
    fn new(engine: MockEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            load_count: AtomicUsize::new(0),
            failures_remaining: AtomicUsize::new(0),
        }
    }

    fn failing_first(engine: MockEngine, failures: usize) -> Self {
        Self {
            failures_remaining: AtomicUsize::new(failures),
            ..Self::new(engine)
        }
    }
}

#[async_trait]
impl EngineLoader for MockLoader {
    async fn load(&self) -> Result<Arc<dyn EngineModule>, EngineError> {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err("engine module unavailable".into());
        }
        Ok(Arc::clone(&self.engine) as Arc<dyn EngineModule>)
    }
}

fn orchestrator_with(loader: Arc<MockLoader>) -> Orchestrator {
    Orchestrator::new(OrchestratorConfig::default(), loader)
}

#[tokio::test]
async fn test_successful_run_packages_png_artifact() {
    cutout_shared::test_utils::init_test_logging();
    let loader = Arc::new(MockLoader::new(MockEngine::new(MockBehavior::Succeed)));
    let orchestrator = orchestrator_with(Arc::clone(&loader));
    assert_eq!(orchestrator.config().deadline_ms, 120_000);

    let result = orchestrator
        .run(input_artifact("employee.jpg", "image/jpeg"))
        .await
        .unwrap();

    assert_eq!(result.name, "employee.png");
    assert_eq!(result.mime_type, "image/png");
    assert!(result.bytes.starts_with(&PNG_SIGNATURE));
}

#[tokio::test]
async fn test_input_without_extension_gets_png_appended() {
    let loader = Arc::new(MockLoader::new(MockEngine::new(MockBehavior::Succeed)));
    let orchestrator = orchestrator_with(loader);

    let result = orchestrator
        .run(input_artifact("photo", "image/jpeg"))
        .await
        .unwrap();

    assert_eq!(result.name, "photo.png");
}

#[tokio::test]
async fn test_output_mime_is_png_regardless_of_input() {
    let loader = Arc::new(MockLoader::new(MockEngine::new(MockBehavior::Succeed)));
    let orchestrator = orchestrator_with(loader);

    let result = orchestrator
        .run(input_artifact("scan.webp", "image/webp"))
        .await
        .unwrap();

    assert_eq!(result.mime_type, "image/png");
}

#[tokio::test]
async fn test_engine_rejection_surfaces_inference_error() {
    let loader = Arc::new(MockLoader::new(MockEngine::new(MockBehavior::Fail(
        "model exploded",
    ))));
    let orchestrator = orchestrator_with(loader);

    let input = input_artifact("employee.jpg", "image/jpeg");
    let err = orchestrator.run(input).await.unwrap_err();

    // Failure is observable, wraps the engine's description, and is never
    // silently degraded to returning the input.
    match &err {
        CutoutError::Inference(message) => assert!(message.contains("model exploded")),
        other => panic!("expected inference error, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_timeout_dominates_slow_engine() {
    let loader = Arc::new(MockLoader::new(MockEngine::new(MockBehavior::Hang(
        Duration::from_millis(130_000),
    ))));
    let orchestrator = orchestrator_with(loader);

    let err = orchestrator
        .run(input_artifact("employee.jpg", "image/jpeg"))
        .await
        .unwrap_err();

    match err {
        CutoutError::Timeout { timeout_ms, .. } => assert_eq!(timeout_ms, 120_000),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_payload_is_packaging_error() {
    let loader = Arc::new(MockLoader::new(MockEngine::new(MockBehavior::Garbage)));
    let orchestrator = orchestrator_with(loader);

    let err = orchestrator
        .run(input_artifact("employee.jpg", "image/jpeg"))
        .await
        .unwrap_err();

    // Distinct from inference failures: the engine call itself succeeded.
    assert!(matches!(err, CutoutError::ResultPackaging(_)));
}

#[tokio::test]
async fn test_progress_forwarding_is_monotonic_and_bounded() {
    let events = vec![
        (ProgressStage::ModelFetch, 1, 2),
        (ProgressStage::Inference, 2, 10),
        (ProgressStage::Inference, 5, 10),
        (ProgressStage::Other("warmup:cache".to_string()), 1, 1),
        (ProgressStage::Inference, 10, 10),
    ];
    let loader = Arc::new(MockLoader::new(MockEngine::new(
        MockBehavior::EmitProgress(events),
    )));
    let orchestrator = orchestrator_with(loader);

    let seen: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    orchestrator
        .run_with_progress(
            input_artifact("employee.jpg", "image/jpeg"),
            Arc::new(move |percent| sink.lock().unwrap().push(percent)),
        )
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    // Only inference-stage events reach the caller
    assert_eq!(seen.as_slice(), &[20.0, 50.0, 100.0]);
    assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(seen.iter().all(|p| (0.0..=100.0).contains(p)));
}

#[tokio::test]
async fn test_configuration_failure_does_not_abort_run() {
    let loader = Arc::new(MockLoader::new(MockEngine::with_failing_configure(
        MockBehavior::Succeed,
    )));
    let orchestrator = orchestrator_with(loader);

    let result = orchestrator
        .run(input_artifact("employee.jpg", "image/jpeg"))
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_engine_load_failure_surfaces_and_is_retried() {
    // First failure hits the configuration attempt (swallowed), second
    // hits the job's own load (surfaced); the third call succeeds.
    let loader = Arc::new(MockLoader::failing_first(
        MockEngine::new(MockBehavior::Succeed),
        2,
    ));
    let orchestrator = orchestrator_with(Arc::clone(&loader));

    let err = orchestrator
        .run(input_artifact("employee.jpg", "image/jpeg"))
        .await
        .unwrap_err();
    assert!(matches!(err, CutoutError::EngineLoad(_)));

    // A failed load is not memoized; the next job loads again and runs.
    let result = orchestrator
        .run(input_artifact("employee.jpg", "image/jpeg"))
        .await;
    assert!(result.is_ok());
    assert_eq!(loader.load_count.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_concurrent_jobs_are_independent() {
    let loader = Arc::new(MockLoader::new(MockEngine::new(MockBehavior::Succeed)));
    let orchestrator = orchestrator_with(Arc::clone(&loader));

    let (a, b) = tokio::join!(
        orchestrator.run(input_artifact("a.jpg", "image/jpeg")),
        orchestrator.run(input_artifact("b.jpg", "image/jpeg")),
    );

    assert_eq!(a.unwrap().name, "a.png");
    assert_eq!(b.unwrap().name, "b.png");
    assert_eq!(loader.engine.transform_count.load(Ordering::SeqCst), 2);
    // One load for configuration, one memoized module load
    assert_eq!(loader.load_count.load(Ordering::SeqCst), 2);
}
