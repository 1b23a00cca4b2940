//! JSON output for selected moments.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mclip_models::{MomentRecord, SelectionResult};
use serde::Serialize;
use tracing::info;

use crate::error::{WorkerError, WorkerResult};
use crate::input::ClipSink;
use crate::pipeline::RunReport;

/// Suffix of the file written per video.
pub const MOMENTS_SUFFIX: &str = "moments.json";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MomentsFile<'a> {
    video_id: &'a str,
    moments: Vec<MomentRecord>,
    report: &'a RunReport,
}

/// Writes `<output_dir>/<video_id>.moments.json`.
#[derive(Debug, Clone)]
pub struct JsonReportSink {
    output_dir: PathBuf,
}

impl JsonReportSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path_for(&self, video_id: &str) -> PathBuf {
        self.output_dir.join(format!("{video_id}.{MOMENTS_SUFFIX}"))
    }
}

#[async_trait]
impl ClipSink for JsonReportSink {
    async fn deliver(&self, video_id: &str, selection: &SelectionResult, report: &RunReport) -> WorkerResult<()> {
        let moments: Vec<MomentRecord> = selection.moments.iter().map(MomentRecord::from).collect();
        for record in &moments {
            record
                .validate()
                .map_err(|e| WorkerError::delivery(format!("{video_id}: {e}")))?;
        }

        let body = serde_json::to_vec_pretty(&MomentsFile {
            video_id,
            moments,
            report,
        })?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.path_for(video_id);
        // Write next to the target and rename so watchers never see a partial file
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &body).await?;
        tokio::fs::rename(&tmp, &path).await?;

        info!(video_id = video_id, path = %path.display(), moments = selection.moments.len(), "Moments written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use mclip_models::{CandidateMoment, ScoreSource, ScoredMoment, SelectionShortfall};
    use tempfile::TempDir;

    fn selection() -> SelectionResult {
        let candidate = CandidateMoment::new(12.0, 40.0, Vec::new()).unwrap();
        let moment = ScoredMoment::new(candidate, 6.5, BTreeMap::new(), ScoreSource::Local);
        SelectionResult {
            moments: vec![moment],
            requested: 3,
            shortfall: Some(SelectionShortfall {
                requested: 3,
                returned: 1,
            }),
        }
    }

    #[tokio::test]
    async fn test_writes_camel_case_file() {
        let dir = TempDir::new().unwrap();
        let sink = JsonReportSink::new(dir.path().join("out"));
        let report = RunReport::for_video("talk", "local");

        sink.deliver("talk", &selection(), &report).await.unwrap();

        let raw = std::fs::read(dir.path().join("out/talk.moments.json")).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(json["videoId"], "talk");
        assert_eq!(json["moments"][0]["compositeScore"], 6.5);
        assert_eq!(json["moments"][0]["scoreSource"], "local");
        assert_eq!(json["report"]["provider"], "local");
        assert!(!dir.path().join("out/talk.moments.json.tmp").exists());
    }
}
