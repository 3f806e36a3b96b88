//! Parsing of `git clone --progress` output into overall progress samples

use regex::Regex;
use std::sync::LazyLock;
use templet_core::ProgressSample;

static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3})%").expect("percent regex is valid"));

/// Clone stages that report a percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneStage {
    /// `Receiving objects: 42% (...)`, overall 0..50
    ReceivingObjects,
    /// `Resolving deltas: 42% (...)`, overall 50..100
    ResolvingDeltas,
    /// `Checking out files` / `Updating files`, overall 90..100
    CheckingOut,
}

impl CloneStage {
    /// Detect the stage marker in a lowercased output line
    fn detect(line: &str) -> Option<Self> {
        if line.contains("receiving objects") {
            Some(Self::ReceivingObjects)
        } else if line.contains("resolving deltas") {
            Some(Self::ResolvingDeltas)
        } else if line.contains("checking out files") || line.contains("updating files") {
            Some(Self::CheckingOut)
        } else {
            None
        }
    }

    /// Weight a stage-local percentage into the overall percentage
    pub fn overall_percent(&self, stage_percent: f64) -> f64 {
        let pct = stage_percent.clamp(0.0, 100.0);
        match self {
            Self::ReceivingObjects => pct * 0.5,
            Self::ResolvingDeltas => 50.0 + pct * 0.5,
            Self::CheckingOut => 90.0 + pct * 0.1,
        }
    }
}

/// Turn one line of git progress output into an overall sample
///
/// Returns `None` for lines without a stage marker or without a percentage.
pub fn parse_progress_line(line: &str) -> Option<ProgressSample> {
    let line = line.to_lowercase();
    let stage = CloneStage::detect(&line)?;
    let captures = PERCENT_RE.captures(&line)?;
    let pct: f64 = captures[1].parse().ok()?;
    Some(ProgressSample::percent(stage.overall_percent(pct)))
}
