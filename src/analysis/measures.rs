//! Dwell-time reading measures.
//!
//! An ENTER immediately followed by a LEAVE on the same word forms one
//! dwell interval. A dwell is `first_pass` when its word lies further
//! right than any word dwelt on before it in the same trial, and
//! `second_pass` otherwise (a regression or re-reading). Events that do
//! not pair up are dropped.

use serde::{Deserialize, Serialize};

use crate::trial::model::{EventKind, TrialResult};

/// Which reading pass a dwell belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingMeasure {
    /// First progressive visit to the word.
    FirstPass,
    /// Any later visit.
    SecondPass,
}

impl std::fmt::Display for ReadingMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstPass => f.write_str("first_pass"),
            Self::SecondPass => f.write_str("second_pass"),
        }
    }
}

/// One dwell interval on a word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dwell {
    /// Position of the trial in the analysed list.
    pub trial: usize,
    /// Word index.
    pub index: usize,
    /// Word text.
    pub text: String,
    /// Elapsed time of the ENTER.
    pub enter_ms: f64,
    /// Elapsed time of the LEAVE.
    pub leave_ms: f64,
    /// `leave_ms - enter_ms`.
    pub duration_ms: f64,
    /// Reading pass.
    pub measure: ReadingMeasure,
}

/// One word's rectangle, flattened for tabular output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryRow {
    /// Position of the trial in the analysed list.
    pub trial: usize,
    /// Word index.
    pub index: usize,
    /// Word text.
    pub text: String,
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// Everything derived from a list of trial results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measures {
    /// Dwell intervals in log order, trial by trial.
    pub dwells: Vec<Dwell>,
    /// Word rectangles, trial by trial.
    pub geometry: Vec<GeometryRow>,
}

/// Derives dwells and geometry rows for every trial in `results`.
#[must_use]
pub fn derive(results: &[TrialResult]) -> Measures {
    let mut measures = Measures::default();
    for (trial, result) in results.iter().enumerate() {
        measures.dwells.extend(dwell_times(trial, result));
        measures.geometry.extend(geometry_rows(trial, result));
    }
    measures
}

/// Pairs the trial's ENTER/LEAVE events into dwell intervals.
#[must_use]
pub fn dwell_times(trial: usize, result: &TrialResult) -> Vec<Dwell> {
    let events = result.word_events();
    let mut dwells = Vec::new();
    let mut furthest: Option<usize> = None;
    let mut i = 0;

    while i < events.len() {
        let enter = &events[i];
        let Some(leave) = events.get(i + 1) else {
            break;
        };
        if enter.kind != EventKind::Enter
            || leave.kind != EventKind::Leave
            || leave.index != enter.index
        {
            i += 1;
            continue;
        }

        let measure = if furthest.is_none_or(|max| enter.index > max) {
            furthest = Some(enter.index);
            ReadingMeasure::FirstPass
        } else {
            ReadingMeasure::SecondPass
        };
        dwells.push(Dwell {
            trial,
            index: enter.index,
            text: enter.text.clone(),
            enter_ms: enter.elapsed_ms,
            leave_ms: leave.elapsed_ms,
            duration_ms: leave.elapsed_ms - enter.elapsed_ms,
            measure,
        });
        i += 2;
    }

    dwells
}

/// Flattens the trial's word geometry.
#[must_use]
pub fn geometry_rows(trial: usize, result: &TrialResult) -> Vec<GeometryRow> {
    result
        .word_geometry()
        .iter()
        .map(|g| GeometryRow {
            trial,
            index: g.index,
            text: g.text.clone(),
            x: g.rect.x,
            y: g.rect.y,
            width: g.rect.width,
            height: g.rect.height,
        })
        .collect()
}
