use super::config::{MAX_SELECTED, ResidueRange};
use super::sampling::Candidate;
use std::cmp::Ordering;
use tracing::info;

/// One ranked entry: an index into the job's candidate set plus the score the
/// ranking used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankEntry {
    pub candidate: usize,
    pub score: f64,
}

/// The ranked top-K subset of a job's candidates. Computed once, after every
/// grid cell has reached a terminal state.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    entries: Vec<RankEntry>,
}

impl Selection {
    pub fn entries(&self) -> &[RankEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rank of a candidate within the selection (1-based), if selected.
    pub fn rank_of(&self, candidate: usize) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.candidate == candidate)
            .map(|p| p + 1)
    }
}

/// Summary statistics over the full candidate set, selected or not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateStats {
    pub produced: usize,
    pub best_score: f64,
    pub worst_score: f64,
    pub mean_score: f64,
}

/// Ranking score for one candidate: mean pLDDT over the focus window when a
/// region is configured, the whole-chain confidence otherwise.
pub fn score(candidate: &Candidate, focus: Option<&ResidueRange>) -> f64 {
    match focus {
        Some(region) => {
            let plddt = candidate.structure.plddt();
            let window = region.window(plddt.len());
            if window.is_empty() {
                return 0.0;
            }
            let len = window.len();
            plddt[window].iter().sum::<f64>() / len as f64
        }
        None => candidate.confidence(),
    }
}

/// Ranks candidates and keeps the top `min(limit, MAX_SELECTED, n)`.
///
/// Descending by score; ties broken by fewer recycle iterations (a stability
/// proxy), then by ascending seed so equal scores still order
/// deterministically.
pub fn select(
    candidates: &[Candidate],
    focus: Option<&ResidueRange>,
    limit: usize,
) -> Selection {
    let mut ranked: Vec<RankEntry> = candidates
        .iter()
        .enumerate()
        .map(|(candidate, c)| RankEntry {
            candidate,
            score: score(c, focus),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                candidates[a.candidate]
                    .iterations
                    .cmp(&candidates[b.candidate].iterations)
            })
            .then_with(|| candidates[a.candidate].seed.cmp(&candidates[b.candidate].seed))
    });

    ranked.truncate(limit.min(MAX_SELECTED).min(candidates.len()));
    info!(selected = ranked.len(), pool = candidates.len(), "Selection computed.");
    Selection { entries: ranked }
}

/// Statistics over all produced candidates, for reporting completeness.
pub fn statistics(candidates: &[Candidate], focus: Option<&ResidueRange>) -> Option<CandidateStats> {
    if candidates.is_empty() {
        return None;
    }
    let scores: Vec<f64> = candidates.iter().map(|c| score(c, focus)).collect();
    let best = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let worst = scores.iter().cloned().fold(f64::INFINITY, f64::min);
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;

    Some(CandidateStats {
        produced: candidates.len(),
        best_score: best,
        worst_score: worst,
        mean_score: mean,
    })
}
