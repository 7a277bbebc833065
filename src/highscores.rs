//! High score leaderboard
//!
//! Persisted as JSON next to the executable, tracks the top 10 runs.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub name: String,
    pub score: u64,
    /// Player level reached when the run ended
    pub level: u32,
    /// Unix timestamp (seconds) when achieved
    pub timestamp: u64,
}

/// Outcome of a score submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResult {
    pub accepted: bool,
    /// 1-indexed rank when accepted
    pub rank: Option<usize>,
    /// Entries on the board after the submission
    pub total: usize,
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if it doesn't
    /// qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a qualifying score to the leaderboard, keeping it sorted
    /// descending. Ties rank below existing entries. Returns the rank
    /// achieved (1-indexed) or None if the score didn't qualify.
    pub fn add_score(
        &mut self,
        name: impl Into<String>,
        score: u64,
        level: u32,
        timestamp: u64,
    ) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            name: name.into(),
            score,
            level,
            timestamp,
        };

        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    /// Submit a finished run, stamping the current time
    pub fn submit_score(&mut self, name: impl Into<String>, score: u64, level: u32) -> SubmitResult {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let rank = self.add_score(name, score, level, timestamp);
        SubmitResult {
            accepted: rank.is_some(),
            rank,
            total: self.entries.len(),
        }
    }

    /// Current board, best first
    pub fn fetch_scores(&self) -> &[HighScoreEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load from a JSON file, falling back to an empty board on any error
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<HighScores>(&json) {
                Ok(scores) => {
                    log::info!("Loaded {} high scores", scores.entries.len());
                    scores
                }
                Err(err) => {
                    log::warn!("High score file unreadable ({err}), starting fresh");
                    Self::new()
                }
            },
            Err(_) => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
        }
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_score_never_qualifies() {
        let scores = HighScores::new();
        assert!(!scores.qualifies(0));
        assert!(scores.qualifies(1));
    }

    #[test]
    fn test_entries_sorted_descending() {
        let mut scores = HighScores::new();
        scores.add_score("a", 100, 3, 0);
        scores.add_score("b", 300, 5, 0);
        scores.add_score("c", 200, 4, 0);
        let board: Vec<u64> = scores.fetch_scores().iter().map(|e| e.score).collect();
        assert_eq!(board, vec![300, 200, 100]);
        assert_eq!(scores.top_score(), Some(300));
    }

    #[test]
    fn test_ties_rank_below_existing() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score("first", 100, 1, 0), Some(1));
        assert_eq!(scores.add_score("second", 100, 1, 0), Some(2));
        assert_eq!(scores.fetch_scores()[0].name, "first");
    }

    #[test]
    fn test_board_truncates_at_cap() {
        let mut scores = HighScores::new();
        for i in 0..MAX_HIGH_SCORES as u64 + 5 {
            scores.add_score("p", 1000 - i, 1, 0);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        // A score below the floor no longer qualifies
        assert!(!scores.qualifies(1));
        assert_eq!(scores.potential_rank(1), None);
        // A qualifying score ties the 999 at rank 2 and ranks below it
        assert_eq!(scores.potential_rank(999), Some(3));
        assert_eq!(scores.potential_rank(1001), Some(1));
    }

    #[test]
    fn test_submit_reports_rank_and_total() {
        let mut scores = HighScores::new();
        let result = scores.submit_score("runner", 500, 7);
        assert!(result.accepted);
        assert_eq!(result.rank, Some(1));
        assert_eq!(result.total, 1);

        let rejected = scores.submit_score("nobody", 0, 1);
        assert!(!rejected.accepted);
        assert_eq!(rejected.rank, None);
        assert_eq!(rejected.total, 1);
    }

    #[test]
    fn test_json_round_trip() {
        let mut scores = HighScores::new();
        scores.add_score("json", 42, 2, 1_700_000_000);
        let json = serde_json::to_string(&scores).unwrap();
        let back: HighScores = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entries.len(), 1);
        assert_eq!(back.entries[0].name, "json");
        assert_eq!(back.entries[0].score, 42);
    }
}
