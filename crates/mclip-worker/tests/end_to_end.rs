//! Full runs over generated audio and transcript sidecars.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use hound::{SampleFormat, WavSpec, WavWriter};
use mclip_ai::{OpenAiCompatProvider, ProviderErrorKind, ProviderSelection};
use mclip_models::{ScoreSource, Word};
use mclip_moments::ScorerConfig;
use mclip_worker::{
    discover_inputs, run_batch, FileStatus, FolderWatcher, JsonReportSink, Pipeline, PipelineConfig, VideoInput,
    WorkerConfig,
};
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const RATE: u32 = 4000;
const DURATION: f64 = 120.0;

/// Quiet speech level with a loud burst at 40-46 s and dead air at 25-26 s and 70-71 s.
fn level_at(t: f64) -> f32 {
    if (40.0..46.0).contains(&t) {
        0.5
    } else if (25.0..26.0).contains(&t) || (70.0..71.0).contains(&t) {
        0.0
    } else {
        0.05
    }
}

fn write_wav(path: &Path) {
    let spec = WavSpec {
        channels: 1,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    let total = (DURATION * RATE as f64) as usize;
    for i in 0..total {
        let t = i as f64 / RATE as f64;
        let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
        let sample = sign * level_at(t) * i16::MAX as f32;
        writer.write_sample(sample as i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn write_transcript(path: &Path) {
    let cues = [(42.0, "that"), (42.5, "was"), (43.0, "shocking.")];
    let words: Vec<Word> = (0..(DURATION / 0.5) as usize)
        .map(|i| i as f64 * 0.5)
        .filter(|start| level_at(*start) > 0.0)
        .map(|start| {
            let text = cues
                .iter()
                .find(|(t, _)| (*t - start).abs() < 1e-9)
                .map(|(_, w)| *w)
                .unwrap_or("word");
            Word::new(text, start, start + 0.4)
        })
        .collect();
    std::fs::write(path, serde_json::to_vec(&words).unwrap()).unwrap();
}

/// `<stem>.mp4` placeholder plus its audio and transcript sidecars.
fn seed_video(dir: &Path, stem: &str) {
    std::fs::write(dir.join(format!("{stem}.mp4")), b"not decoded").unwrap();
    write_wav(&dir.join(format!("{stem}.wav")));
    write_transcript(&dir.join(format!("{stem}.words.json")));
}

fn local_pipeline(output: &Path) -> Arc<Pipeline> {
    let selection = ProviderSelection::Local {
        reason: "test".to_string(),
    };
    Arc::new(Pipeline::new(
        PipelineConfig::default(),
        selection,
        Arc::new(JsonReportSink::new(output)),
    ))
}

#[tokio::test]
async fn batch_writes_moments_for_each_video() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    seed_video(input.path(), "keynote");

    let inputs = discover_inputs(input.path()).await.unwrap();
    assert_eq!(inputs.len(), 1);

    let summary = run_batch(local_pipeline(output.path()), inputs, 2).await;
    assert!(summary.failed.is_empty(), "{:?}", summary.failed);
    let report = &summary.succeeded[0];
    assert!(!report.moments.is_empty());
    assert!(report.hit_counts.get("energy").copied().unwrap_or(0) >= 1);
    assert!(report.hit_counts.get("keyword").copied().unwrap_or(0) >= 1);
    assert!(report.silence_threshold.is_some());
    assert!((report.duration_secs - DURATION).abs() < 0.01);

    let raw = std::fs::read(output.path().join("keynote.moments.json")).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(json["videoId"], "keynote");

    let moments = json["moments"].as_array().unwrap();
    assert!(!moments.is_empty());
    let mut spans = Vec::new();
    for moment in moments {
        let start = moment["start"].as_f64().unwrap();
        let end = moment["end"].as_f64().unwrap();
        let score = moment["compositeScore"].as_f64().unwrap();
        assert!(start >= 0.0 && end <= DURATION);
        assert!(end - start >= 15.0 - 1e-6 && end - start <= 60.0 + 1e-6);
        assert!((0.0..=10.0).contains(&score));
        assert_eq!(moment["scoreSource"], "local");
        spans.push((start, end));
    }
    // The loud burst is inside one of the selected moments
    assert!(spans.iter().any(|(s, e)| *s <= 40.0 && *e >= 46.0));

    spans.sort_by(|a, b| a.0.total_cmp(&b.0));
    assert!(spans.windows(2).all(|w| w[0].1 <= w[1].0 + 1e-6));
}

#[tokio::test]
async fn one_bad_video_does_not_stop_the_batch() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    seed_video(input.path(), "good");
    // No transcript for this one
    std::fs::write(input.path().join("orphan.mp4"), b"x").unwrap();
    write_wav(&input.path().join("orphan.wav"));

    let inputs = discover_inputs(input.path()).await.unwrap();
    let summary = run_batch(local_pipeline(output.path()), inputs, 1).await;

    assert_eq!(summary.total(), 2);
    assert_eq!(summary.succeeded.len(), 1);
    assert_eq!(summary.succeeded[0].video_id, "good");
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].video_id, "orphan");
    assert!(summary.failed[0].retryable);
    assert!(output.path().join("good.moments.json").exists());
    assert!(!output.path().join("orphan.moments.json").exists());
}

#[tokio::test]
async fn rejected_credentials_fall_back_to_local_scoring() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let provider = OpenAiCompatProvider::new(
        "groq",
        "revoked",
        format!("{}/v1/chat/completions", server.uri()),
        "llama-3.1-8b-instant",
        Duration::from_secs(5),
        100,
    )
    .unwrap();
    let scorer = ScorerConfig::default().with_retries(1, Duration::from_millis(1), Duration::from_millis(2));
    let output = TempDir::new().unwrap();
    let pipeline = Pipeline::new(
        PipelineConfig::default().with_scorer(scorer),
        ProviderSelection::Remote(Arc::new(provider)),
        Arc::new(JsonReportSink::new(output.path())),
    );

    let input = TempDir::new().unwrap();
    seed_video(input.path(), "panel");
    let video = VideoInput::from_path(input.path().join("panel.mp4")).unwrap();

    let report = pipeline.run_video(&video).await.unwrap();
    assert_eq!(report.provider, "groq");
    assert!(!report.moments.is_empty());
    assert!(report.moments.iter().all(|m| m.score_source == ScoreSource::Local));
    assert!(!report.scoring_warnings.is_empty());
    assert!(report.scoring_warnings.iter().all(|w| w.kind == ProviderErrorKind::Auth));
}

#[tokio::test]
async fn watcher_waits_for_stable_files_then_processes_once() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    seed_video(input.path(), "stream");

    let config = WorkerConfig::default()
        .with_dirs(input.path(), output.path())
        .with_watch(Duration::from_millis(10), 2);
    let mut watcher = FolderWatcher::new(local_pipeline(output.path()), &config);

    let first = watcher.poll_once().await.unwrap();
    assert!(first.batch.is_empty());
    assert_eq!(first.waiting, 1);
    assert_eq!(watcher.status("stream"), Some(FileStatus::Waiting));

    let second = watcher.poll_once().await.unwrap();
    assert_eq!(second.batch.succeeded.len(), 1);
    assert_eq!(watcher.status("stream"), Some(FileStatus::Done));
    assert!(output.path().join("stream.moments.json").exists());

    let third = watcher.poll_once().await.unwrap();
    assert!(third.batch.is_empty());
    assert_eq!(third.waiting, 0);
}

#[tokio::test]
async fn watcher_gives_up_after_max_attempts() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    std::fs::write(input.path().join("broken.mp4"), b"x").unwrap();

    let config = WorkerConfig::default()
        .with_dirs(input.path(), output.path())
        .with_watch(Duration::from_millis(10), 2);
    let mut watcher = FolderWatcher::new(local_pipeline(output.path()), &config);

    watcher.poll_once().await.unwrap();
    let attempt_one = watcher.poll_once().await.unwrap();
    assert_eq!(attempt_one.batch.failed.len(), 1);
    assert_eq!(watcher.status("broken"), Some(FileStatus::Waiting));

    let attempt_two = watcher.poll_once().await.unwrap();
    assert_eq!(attempt_two.batch.failed.len(), 1);
    assert_eq!(watcher.status("broken"), Some(FileStatus::Failed));

    let after = watcher.poll_once().await.unwrap();
    assert!(after.batch.is_empty());
}
