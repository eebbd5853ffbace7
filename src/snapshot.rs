//! Progress snapshots written by the CLI after every step.
//!
//! Each file is a pretty-printed JSON object carrying the run id and a
//! timestamp next to its payload, so a run can be audited afterwards.

use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::Result;
use crate::search::{SearchOutcome, SearchState, StepReport};

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    run_id: &'a str,
    timestamp: String,
    #[serde(flatten)]
    body: T,
}

#[derive(Serialize)]
struct Progress<'a> {
    step: &'a StepReport,
    state: &'a SearchState,
}

#[derive(Serialize)]
struct Summary<'a> {
    #[serde(flatten)]
    outcome: &'a SearchOutcome,
    flags: &'a [String],
    state: &'a SearchState,
}

/// Writes snapshot files into one results directory.
pub struct SnapshotWriter {
    dir: PathBuf,
    run_id: String,
}

impl SnapshotWriter {
    /// Recreate `dir` empty and start a new run.
    pub fn create(dir: &Path) -> Result<Self> {
        if dir.exists() {
            std::fs::remove_dir_all(dir)?;
        }
        std::fs::create_dir_all(dir)?;
        let run_id = Uuid::new_v4().to_string();
        log::info!("Writing snapshots for run {} to {}", run_id, dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            run_id,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn write<T: Serialize>(&self, name: &str, body: T) -> Result<PathBuf> {
        let envelope = Envelope {
            run_id: &self.run_id,
            timestamp: Utc::now().to_rfc3339(),
            body,
        };
        let path = self.dir.join(name);
        std::fs::write(&path, serde_json::to_string_pretty(&envelope)?)?;
        Ok(path)
    }

    /// State after one step, as `progress_step_NNNN.json`.
    pub fn write_progress(&self, state: &SearchState, report: &StepReport) -> Result<PathBuf> {
        self.write(
            &format!("progress_step_{:04}.json", report.step),
            Progress {
                step: report,
                state,
            },
        )
    }

    /// Final outcome and the explored subgraph, as `summary.json`.
    pub fn write_summary(
        &self,
        state: &SearchState,
        outcome: &SearchOutcome,
        flags: &[String],
    ) -> Result<PathBuf> {
        self.write(
            "summary.json",
            Summary {
                outcome,
                flags,
                state,
            },
        )
    }

    /// The answer payload prepared for the report sink, as `final_answer.json`.
    pub fn write_answer<T: Serialize>(&self, payload: &T) -> Result<PathBuf> {
        self.write("final_answer.json", serde_json::json!({ "payload": payload }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::StaticOracle;
    use crate::search::{EngineConfig, Goal, Kind, Normalizer, SearchEngine};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_progress_and_summary_files() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("results");
        let writer = SnapshotWriter::create(&dir).unwrap();

        let oracle = StaticOracle::new().with(Kind::Place, "LUBLIN", &["BARBARA"]);
        let engine = SearchEngine::new(oracle, Normalizer::default(), EngineConfig::default());
        let mut state = engine.seed(vec![(Kind::Place, "Lublin")]);
        let goal = Goal::new(Normalizer::default().node("Barbara").unwrap(), Kind::Person);

        let mut written = Vec::new();
        let outcome = engine
            .run_with(&mut state, &goal, |s, r| {
                written.push(writer.write_progress(s, r).unwrap());
            })
            .await
            .unwrap();
        let summary = writer.write_summary(&state, &outcome, &[]).unwrap();

        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("progress_step_0001.json"));

        let progress: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&written[0]).unwrap()).unwrap();
        assert_eq!(progress["run_id"], writer.run_id());
        assert_eq!(progress["step"]["node"], "LUBLIN");

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(summary).unwrap()).unwrap();
        assert_eq!(summary["outcome"], "found");
        assert_eq!(summary["via"], "LUBLIN");
        assert_eq!(summary["state"]["adjacency"]["places"]["LUBLIN"][0], "BARBARA");
    }

    #[test]
    fn test_create_clears_previous_run() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("results");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stale.json"), "{}").unwrap();

        SnapshotWriter::create(&dir).unwrap();
        assert!(!dir.join("stale.json").exists());
        assert!(dir.is_dir());
    }

    #[test]
    fn test_write_answer() {
        let temp_dir = TempDir::new().unwrap();
        let writer = SnapshotWriter::create(temp_dir.path()).unwrap();
        let path = writer
            .write_answer(&serde_json::json!({"task": "loop", "answer": "ELBLAG"}))
            .unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["payload"]["answer"], "ELBLAG");
    }
}
