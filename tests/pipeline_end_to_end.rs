use image::{Rgb, RgbImage};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use synoid_remix::agent::encoder::{EncodeJob, VideoEncoder};
use synoid_remix::agent::extraction::ImageSequenceSource;
use synoid_remix::engine::intent::{FpsSetting, Pace, Transition};
use synoid_remix::{CancelToken, EngineConfig, FrameStore, Intent, RemixError, RemixPipeline, Stage};

/// Records each job and writes a stand-in container
#[derive(Default)]
struct RecordingEncoder {
    calls: AtomicUsize,
    staged: Mutex<Vec<usize>>,
}

impl VideoEncoder for RecordingEncoder {
    fn encode(&self, job: &EncodeJob) -> synoid_remix::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let pngs = fs::read_dir(&job.frames_dir)?.count();
        self.staged.lock().unwrap().push(pngs);
        fs::write(&job.output, format!("{} frames", job.frame_count))?;
        Ok(())
    }
}

fn write_sequence(dir: &Path, count: usize) {
    fs::create_dir_all(dir).unwrap();
    for i in 0..count {
        let shade = (i * 20 % 256) as u8;
        RgbImage::from_pixel(16, 16, Rgb([shade, 64, 255 - shade]))
            .save(dir.join(format!("shot_{:03}.png", i)))
            .unwrap();
    }
}

fn pipeline(encoder: Arc<RecordingEncoder>) -> RemixPipeline {
    RemixPipeline::new(
        Arc::new(ImageSequenceSource::new(5.0)),
        encoder,
        EngineConfig::default(),
    )
}

#[tokio::test]
async fn test_ten_frames_to_one_second() {
    let work = tempfile::tempdir().unwrap();
    let source = work.path().join("source");
    write_sequence(&source, 10);
    let output = work.path().join("out/remix.mp4");
    let mut store = FrameStore::create(&work.path().join("store"), 5.0).unwrap();

    let encoder = Arc::new(RecordingEncoder::default());
    let intent = Intent {
        pace: Pace::Medium,
        target_duration_s: Some(1.0),
        fps: FpsSetting::Fixed(5),
        ..Intent::default()
    };
    let outcome = pipeline(encoder.clone())
        .run(&mut store, &source, &intent, &output, &CancelToken::new())
        .await
        .unwrap();

    let indices = outcome.frame_path.indices();
    assert_eq!(indices.len(), 5);
    assert!(indices.windows(2).all(|w| w[0] < w[1]));
    assert!(indices.iter().all(|&i| i < 10));
    assert_eq!(outcome.video.frame_count, 5);
    assert_eq!(outcome.video.fps, 5.0);
    assert!((outcome.video.duration_s - 1.0).abs() < 1e-9);
    assert_eq!((outcome.video.width, outcome.video.height), (16, 16));
    assert_eq!(outcome.excluded_frames, 0);

    assert!(output.is_file());
    assert!(!work.path().join("out/remix.mp4.partial").exists());
    assert_eq!(encoder.calls.load(Ordering::SeqCst), 1);
    assert_eq!(encoder.staged.lock().unwrap()[0], 5);
    assert_eq!(store.len(), 10);
}

#[tokio::test]
async fn test_single_frame_source() {
    let work = tempfile::tempdir().unwrap();
    let source = work.path().join("source");
    write_sequence(&source, 1);
    let output = work.path().join("single.mp4");
    let mut store = FrameStore::create(&work.path().join("store"), 5.0).unwrap();

    let outcome = pipeline(Arc::new(RecordingEncoder::default()))
        .run(&mut store, &source, &Intent::default(), &output, &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.frame_path.indices(), vec![0]);
    assert_eq!(outcome.video.frame_count, 1);
    assert!((outcome.video.duration_s - 1.0 / 5.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_empty_source_fails_in_build() {
    let work = tempfile::tempdir().unwrap();
    let source = work.path().join("source");
    fs::create_dir_all(&source).unwrap();
    let output = work.path().join("never.mp4");
    let mut store = FrameStore::create(&work.path().join("store"), 5.0).unwrap();

    let encoder = Arc::new(RecordingEncoder::default());
    let err = pipeline(encoder.clone())
        .run(&mut store, &source, &Intent::default(), &output, &CancelToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::Build);
    assert!(matches!(err.source, RemixError::EmptyInput));
    assert_eq!(encoder.calls.load(Ordering::SeqCst), 0);
    assert!(!output.exists());
}

#[tokio::test]
async fn test_store_is_cleared_between_runs() {
    let work = tempfile::tempdir().unwrap();
    let long = work.path().join("long");
    let short = work.path().join("short");
    write_sequence(&long, 8);
    write_sequence(&short, 3);
    let mut store = FrameStore::create(&work.path().join("store"), 5.0).unwrap();
    let remix = pipeline(Arc::new(RecordingEncoder::default()));

    remix
        .run(&mut store, &long, &Intent::default(), &work.path().join("a.mp4"), &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(store.len(), 8);

    let outcome = remix
        .run(&mut store, &short, &Intent::default(), &work.path().join("b.mp4"), &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(store.len(), 3);
    assert!(outcome.frame_path.indices().iter().all(|&i| i < 3));
}

#[tokio::test]
async fn test_invalid_intent_and_cancellation() {
    let work = tempfile::tempdir().unwrap();
    let source = work.path().join("source");
    write_sequence(&source, 4);
    let mut store = FrameStore::create(&work.path().join("store"), 5.0).unwrap();
    let remix = pipeline(Arc::new(RecordingEncoder::default()));
    let output = work.path().join("x.mp4");

    let bad = Intent { target_duration_s: Some(-1.0), ..Intent::default() };
    let err = remix.run(&mut store, &source, &bad, &output, &CancelToken::new()).await.unwrap_err();
    assert_eq!(err.stage, Stage::Intent);
    assert!(matches!(err.source, RemixError::InvalidIntent(_)));

    let cancel = CancelToken::new();
    cancel.cancel();
    let err = remix.run(&mut store, &source, &Intent::default(), &output, &cancel).await.unwrap_err();
    assert_eq!(err.stage, Stage::Source);
    assert!(matches!(err.source, RemixError::Cancelled));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_dissolve_reports_transitions() {
    let work = tempfile::tempdir().unwrap();
    let source = work.path().join("source");
    write_sequence(&source, 20);
    let mut store = FrameStore::create(&work.path().join("store"), 5.0).unwrap();

    let intent = Intent {
        pace: Pace::Fast,
        transition: Transition::Dissolve,
        target_duration_s: Some(1.0),
        fps: FpsSetting::Fixed(5),
        ..Intent::default()
    };
    let outcome = pipeline(Arc::new(RecordingEncoder::default()))
        .run(&mut store, &source, &intent, &work.path().join("d.mp4"), &CancelToken::new())
        .await
        .unwrap();

    let gaps = outcome
        .frame_path
        .indices()
        .windows(2)
        .filter(|w| w[1] != w[0] + 1)
        .count();
    assert_eq!(outcome.video.transitions, gaps);
    assert_eq!(outcome.video.frame_count, 5);
}

#[tokio::test]
async fn test_source_in_store_dir_is_refused_untouched() {
    let work = tempfile::tempdir().unwrap();
    let shots = work.path().join("shots");
    write_sequence(&shots, 4);
    fs::write(shots.join("notes.txt"), b"keep").unwrap();
    let mut store = FrameStore::create(&shots, 5.0).unwrap();

    let encoder = Arc::new(RecordingEncoder::default());
    let err = pipeline(encoder.clone())
        .run(&mut store, &shots, &Intent::default(), &work.path().join("o.mp4"), &CancelToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::Source);
    assert!(matches!(err.source, RemixError::Extraction(_)));
    assert_eq!(FrameStore::open(&shots, 5.0).unwrap().len(), 4);
    assert!(shots.join("notes.txt").is_file());
    assert_eq!(encoder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_store_keeps_unrelated_entries() {
    let work = tempfile::tempdir().unwrap();
    let source = work.path().join("source");
    write_sequence(&source, 3);
    let store_dir = work.path().join("store");
    fs::create_dir_all(store_dir.join("keep")).unwrap();
    fs::write(store_dir.join("keep/data.bin"), b"x").unwrap();
    fs::write(store_dir.join("readme.txt"), b"x").unwrap();
    let mut store = FrameStore::create(&store_dir, 5.0).unwrap();

    pipeline(Arc::new(RecordingEncoder::default()))
        .run(&mut store, &source, &Intent::default(), &work.path().join("o.mp4"), &CancelToken::new())
        .await
        .unwrap();

    assert!(store_dir.join("keep/data.bin").is_file());
    assert!(store_dir.join("readme.txt").is_file());
    assert_eq!(store.len(), 3);
}
