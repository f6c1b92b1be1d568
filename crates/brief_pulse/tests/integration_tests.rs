mod mocks;

use std::path::Path;

use brief_datastore::{JobStatus, JobStore, Stage};
use brief_pulse::{checkpoint::ArtifactPaths, AudioInput, JobProcessor, JobProcessorBuilder};
use mocks::{
    fetcher::MockFetcher, job_store::MockJobStore, summarizer::MockSummarizer,
    transcriber::MockTranscriber,
};

const SOURCE_URL: &str = "https://youtube.com/watch?v=vid12345678";
const VIDEO_ID: &str = "vid12345678";

fn build_processor(
    workdir: &Path,
    store: MockJobStore,
    fetcher: MockFetcher,
    transcriber: MockTranscriber,
    summarizer: MockSummarizer,
) -> JobProcessor<MockJobStore, MockFetcher, MockTranscriber, MockSummarizer> {
    JobProcessorBuilder::new(workdir)
        .store(store)
        .fetcher(fetcher)
        .transcriber(transcriber)
        .summarizer(summarizer)
        .build()
}

async fn submit(store: &MockJobStore) -> i64 {
    store.insert_job(SOURCE_URL).await.unwrap().id
}

// ─── Happy path ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_happy_path_produces_all_artifacts() {
    let workdir = tempfile::tempdir().unwrap();
    let store = MockJobStore::default();
    let fetcher = MockFetcher::default();
    let transcriber = MockTranscriber::choppy_greeting();
    let summarizer = MockSummarizer::greeting_analysis();

    let job_id = submit(&store).await;
    let processor = build_processor(
        workdir.path(),
        store.clone(),
        fetcher.clone(),
        transcriber.clone(),
        summarizer.clone(),
    );

    processor.process(job_id).await.expect("pipeline should succeed");

    let paths = ArtifactPaths::new(workdir.path(), VIDEO_ID);
    for path in [paths.audio(), paths.srt(), paths.transcript(), paths.report()] {
        let metadata = std::fs::metadata(&path)
            .unwrap_or_else(|_| panic!("missing artifact {}", path.display()));
        assert!(metadata.len() > 0, "empty artifact {}", path.display());
    }

    let job = store.job(job_id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.title.as_deref(), Some("Mock Video Title"));
    assert!(job.report_filename.is_some());
    assert!(job.error_message.is_none());

    for stage in Stage::ALL {
        let cp = store.checkpoint(job_id, stage).unwrap();
        assert!(cp.done, "stage {stage} should be checkpointed");
        assert!(cp.artifact_path.is_some());
    }

    // the three choppy fragments must have merged into one subtitle unit
    let srt = std::fs::read_to_string(paths.srt()).unwrap();
    assert!(srt.contains("Hi there, how are you today?"));
    assert!(!srt.contains("\n2\n"), "expected a single subtitle unit:\n{srt}");

    let report = std::fs::read_to_string(paths.report()).unwrap();
    assert!(report.contains("A short greeting exchange."));
    assert!(report.contains("Opening greeting"));
    assert!(report.contains("Mock Video Title"));
}

#[tokio::test]
async fn test_chunked_audio_input_when_chunking_enabled() {
    let workdir = tempfile::tempdir().unwrap();
    let store = MockJobStore::default();
    let transcriber = MockTranscriber::choppy_greeting();
    let transcriber_calls = transcriber.calls.clone();

    let job_id = submit(&store).await;
    let processor = JobProcessorBuilder::new(workdir.path())
        .store(store)
        .fetcher(MockFetcher::default())
        .transcriber(transcriber)
        .summarizer(MockSummarizer::greeting_analysis())
        .with_chunking(900)
        .build();

    processor.process(job_id).await.expect("pipeline should succeed");

    let calls = transcriber_calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        AudioInput::Chunked {
            chunk_duration_seconds,
            ..
        } => assert_eq!(*chunk_duration_seconds, 900),
        AudioInput::File(_) => panic!("expected chunked audio input"),
    }
}

// ─── Resume behavior ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_valid_download_checkpoint_is_skipped() {
    let workdir = tempfile::tempdir().unwrap();
    let store = MockJobStore::default();
    let fetcher = MockFetcher::default();

    let job_id = submit(&store).await;

    // simulate a previous run that finished the download stage
    let paths = ArtifactPaths::new(workdir.path(), VIDEO_ID);
    std::fs::create_dir_all(paths.audio().parent().unwrap()).unwrap();
    std::fs::write(paths.audio(), b"previously downloaded").unwrap();
    store
        .set_checkpoint(
            job_id,
            Stage::Download,
            true,
            Some(&paths.audio().display().to_string()),
        )
        .await
        .unwrap();

    let processor = build_processor(
        workdir.path(),
        store.clone(),
        fetcher.clone(),
        MockTranscriber::choppy_greeting(),
        MockSummarizer::greeting_analysis(),
    );
    processor.process(job_id).await.expect("pipeline should succeed");

    assert!(
        fetcher.calls.lock().unwrap().is_empty(),
        "download stage must not re-run"
    );
    assert_eq!(store.job(job_id).unwrap().status, JobStatus::Completed);
}

#[tokio::test]
async fn test_fully_complete_job_is_a_noop() {
    let workdir = tempfile::tempdir().unwrap();
    let store = MockJobStore::default();
    let fetcher = MockFetcher::default();
    let transcriber = MockTranscriber::choppy_greeting();
    let summarizer = MockSummarizer::greeting_analysis();

    let job_id = submit(&store).await;
    let processor = build_processor(
        workdir.path(),
        store.clone(),
        fetcher.clone(),
        transcriber.clone(),
        summarizer.clone(),
    );

    processor.process(job_id).await.expect("first run should succeed");
    assert_eq!(fetcher.calls.lock().unwrap().len(), 1);
    assert_eq!(transcriber.calls.lock().unwrap().len(), 1);

    processor.process(job_id).await.expect("second run should succeed");

    // nothing re-ran, status untouched
    assert_eq!(fetcher.calls.lock().unwrap().len(), 1);
    assert_eq!(transcriber.calls.lock().unwrap().len(), 1);
    assert_eq!(summarizer.calls.lock().unwrap().len(), 1);
    assert_eq!(store.job(job_id).unwrap().status, JobStatus::Completed);
}

#[tokio::test]
async fn test_deleted_artifact_heals_on_next_run() {
    let workdir = tempfile::tempdir().unwrap();
    let store = MockJobStore::default();
    let transcriber = MockTranscriber::choppy_greeting();

    let job_id = submit(&store).await;
    let processor = build_processor(
        workdir.path(),
        store.clone(),
        MockFetcher::default(),
        transcriber.clone(),
        MockSummarizer::greeting_analysis(),
    );
    processor.process(job_id).await.expect("first run should succeed");

    // someone deletes the SRT artifact behind our back
    let paths = ArtifactPaths::new(workdir.path(), VIDEO_ID);
    std::fs::remove_file(paths.srt()).unwrap();

    processor.process(job_id).await.expect("heal run should succeed");

    assert_eq!(
        transcriber.calls.lock().unwrap().len(),
        2,
        "transcribe stage must re-run after its artifact vanished"
    );
    assert!(paths.srt().exists());
    assert_eq!(store.job(job_id).unwrap().status, JobStatus::Completed);
}

// ─── Error propagation ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_acquisition_failure_reports_every_strategy() {
    let workdir = tempfile::tempdir().unwrap();
    let store = MockJobStore::default();
    let fetcher = MockFetcher::failing("403 forbidden");

    let job_id = submit(&store).await;
    let processor = build_processor(
        workdir.path(),
        store.clone(),
        fetcher.clone(),
        MockTranscriber::choppy_greeting(),
        MockSummarizer::greeting_analysis(),
    );

    let err = processor.process(job_id).await.unwrap_err();
    let message = format!("{err:#}");
    for strategy in ["web", "android", "ios", "last-resort"] {
        assert!(
            message.contains(strategy),
            "aggregate error should mention {strategy}: {message}"
        );
    }

    assert_eq!(fetcher.calls.lock().unwrap().len(), 4);

    let job = store.job(job_id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error_message.unwrap().contains("403 forbidden"));
}

#[tokio::test]
async fn test_transcription_failure_then_resume_at_failed_stage() {
    let workdir = tempfile::tempdir().unwrap();
    let store = MockJobStore::default();
    let fetcher = MockFetcher::default();

    let job_id = submit(&store).await;
    let processor = build_processor(
        workdir.path(),
        store.clone(),
        fetcher.clone(),
        MockTranscriber::failing("Whisper API timeout"),
        MockSummarizer::greeting_analysis(),
    );

    let err = processor.process(job_id).await.unwrap_err();
    assert!(format!("{err:#}").contains("Whisper API timeout"));

    let job = store.job(job_id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error_message.unwrap().contains("Whisper API timeout"));
    assert!(store.checkpoint(job_id, Stage::Download).unwrap().done);

    // a fresh attempt resumes at transcribe without re-downloading
    let fetcher2 = MockFetcher::default();
    let transcriber2 = MockTranscriber::choppy_greeting();
    let retry = build_processor(
        workdir.path(),
        store.clone(),
        fetcher2.clone(),
        transcriber2.clone(),
        MockSummarizer::greeting_analysis(),
    );
    retry.process(job_id).await.expect("retry should succeed");

    assert!(fetcher2.calls.lock().unwrap().is_empty());
    assert_eq!(transcriber2.calls.lock().unwrap().len(), 1);
    assert_eq!(store.job(job_id).unwrap().status, JobStatus::Completed);
}

#[tokio::test]
async fn test_summarizer_failure_still_yields_a_report() {
    let workdir = tempfile::tempdir().unwrap();
    let store = MockJobStore::default();

    let job_id = submit(&store).await;
    let processor = build_processor(
        workdir.path(),
        store.clone(),
        MockFetcher::default(),
        MockTranscriber::choppy_greeting(),
        MockSummarizer::failing("GPT rate limit"),
    );

    processor
        .process(job_id)
        .await
        .expect("analysis failures are non-fatal");

    let paths = ArtifactPaths::new(workdir.path(), VIDEO_ID);
    let report = std::fs::read_to_string(paths.report()).unwrap();
    assert!(
        report.contains("Automatic analysis was unavailable"),
        "fallback summary should be rendered"
    );
    assert_eq!(store.job(job_id).unwrap().status, JobStatus::Completed);
}

#[tokio::test]
async fn test_malformed_llm_output_falls_back_gracefully() {
    let workdir = tempfile::tempdir().unwrap();
    let store = MockJobStore::default();

    let job_id = submit(&store).await;
    let processor = build_processor(
        workdir.path(),
        store.clone(),
        MockFetcher::default(),
        MockTranscriber::choppy_greeting(),
        MockSummarizer::new("Sorry, I cannot produce JSON today."),
    );

    processor.process(job_id).await.expect("pipeline should succeed");

    let paths = ArtifactPaths::new(workdir.path(), VIDEO_ID);
    let report = std::fs::read_to_string(paths.report()).unwrap();
    assert!(report.contains("Automatic analysis was unavailable"));
}

#[tokio::test]
async fn test_store_failure_propagates() {
    let workdir = tempfile::tempdir().unwrap();
    let store = MockJobStore::failing("connection refused");

    let processor = build_processor(
        workdir.path(),
        store,
        MockFetcher::default(),
        MockTranscriber::choppy_greeting(),
        MockSummarizer::greeting_analysis(),
    );

    let result = processor.process(1).await;
    assert!(result.is_err(), "store errors must propagate");
}
