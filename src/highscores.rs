//! High score leaderboard
//!
//! Stored inside the profile, keeps the 10 deepest runs ranked by wave.

use serde::{Deserialize, Serialize};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Wave reached
    pub wave: u32,
    /// Run score
    pub score: u64,
    /// Profile name at the time of the run
    #[serde(default)]
    pub name: String,
    /// Unix timestamp (ms) when achieved
    #[serde(default)]
    pub date: u64,
}

/// High score leaderboard, sorted by wave descending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a run reaching `wave` would make the board
    pub fn qualifies(&self, wave: u32) -> bool {
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| wave > e.wave)
    }

    /// Add a run. Ties keep earlier entries ahead.
    /// Returns the rank achieved (1-indexed) or None if it fell off the board.
    pub fn add_score(&mut self, wave: u32, score: u64, name: &str, date: u64) -> Option<usize> {
        let entry = HighScoreEntry {
            wave,
            score,
            name: name.to_string(),
            date,
        };

        let pos = self
            .entries
            .iter()
            .position(|e| wave > e.wave)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        self.entries.truncate(MAX_HIGH_SCORES);

        (pos < MAX_HIGH_SCORES).then_some(pos + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deepest wave on the board
    pub fn best_wave(&self) -> Option<u32> {
        self.entries.first().map(|e| e.wave)
    }
}

/// Milliseconds since the Unix epoch, 0 if the clock is before it
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_by_wave_not_score() {
        let mut scores = HighScores::new();
        scores.add_score(5, 9000, "a", 1);
        scores.add_score(12, 100, "b", 2);
        scores.add_score(8, 500, "c", 3);
        let waves: Vec<u32> = scores.entries.iter().map(|e| e.wave).collect();
        assert_eq!(waves, vec![12, 8, 5]);
        assert_eq!(scores.best_wave(), Some(12));
    }

    #[test]
    fn test_keeps_top_ten() {
        let mut scores = HighScores::new();
        for wave in 1..=12 {
            scores.add_score(wave, 0, "p", 0);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.entries.last().map(|e| e.wave), Some(3));
        assert!(!scores.qualifies(2));
        assert_eq!(scores.add_score(1, 0, "p", 0), None);
        assert_eq!(scores.add_score(20, 0, "p", 0), Some(1));
    }

    #[test]
    fn test_ties_keep_earlier_entry_first() {
        let mut scores = HighScores::new();
        scores.add_score(7, 10, "first", 0);
        assert_eq!(scores.add_score(7, 99, "second", 0), Some(2));
        assert_eq!(scores.entries[0].name, "first");
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let mut scores = HighScores::new();
        scores.add_score(3, 40, "p", 5);
        let json = serde_json::to_value(&scores).expect("serialize");
        assert!(json.is_array());
        assert_eq!(json[0]["wave"], 3);
    }
}
