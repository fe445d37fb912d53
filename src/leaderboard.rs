//! Score submission contract and leaderboard
//!
//! Mirrors the score service: submissions are normalized and validated,
//! each game's table reports its top 10 by score, earliest first on ties,
//! and every change of #1 is kept so leader tenure can be reported.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tuning::ConfigError;

/// Rows returned per game
pub const MAX_HIGH_SCORES: usize = 10;

/// Current leaders reported by `top_dogs`
pub const MAX_CURRENT_HOLDERS: usize = 50;

/// Maximum length of player initials
pub const INITIALS_LEN: usize = 3;

/// Why a score could not be recorded
#[derive(Debug, Error, PartialEq)]
pub enum SubmitError {
    #[error("Missing game_slug")]
    MissingGameSlug,
    #[error("Missing initials")]
    MissingInitials,
    #[error("Invalid score")]
    InvalidScore,
    #[error("malformed submission: {0}")]
    Malformed(String),
    #[error("score service unavailable: {0}")]
    Transport(String),
}

/// Receives the final score of a run.
///
/// Called once per game over from the simulation thread, so implementations
/// must return promptly; networked sinks hand the request off and report
/// only whether it was queued.
pub trait ScoreSink {
    fn submit(&mut self, game_slug: &str, initials: &str, score: u64) -> Result<(), SubmitError>;
}

/// Lowercase, map anything outside `[a-z0-9-]` to `-`, collapse and trim dashes
pub fn normalize_slug(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    for c in raw.trim().to_lowercase().chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '-'
        };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug.trim_matches('-').to_string()
}

/// Uppercase, keep `[A-Z0-9]`, at most three characters
pub fn normalize_initials(raw: &str) -> String {
    raw.trim()
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .take(INITIALS_LEN)
        .collect()
}

/// Parse the integer prefix of a string (`" 12abc"` is 12, `"1.5"` is 1)
fn leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|v| sign * v)
}

/// POST body of a score submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub game_slug: String,
    pub initials: String,
    pub score: u64,
}

impl ScoreSubmission {
    /// Normalize and validate a submission
    pub fn new(game_slug: &str, initials: &str, score: u64) -> Result<Self, SubmitError> {
        let game_slug = normalize_slug(game_slug);
        if game_slug.is_empty() {
            return Err(SubmitError::MissingGameSlug);
        }
        let initials = normalize_initials(initials);
        if initials.is_empty() {
            return Err(SubmitError::MissingInitials);
        }
        Ok(Self {
            game_slug,
            initials,
            score,
        })
    }

    /// Parse a loosely-typed request body; the score may be a number or a numeric string
    pub fn from_json(body: &str) -> Result<Self, SubmitError> {
        #[derive(Deserialize)]
        struct RawSubmission {
            #[serde(default)]
            game_slug: Option<String>,
            #[serde(default)]
            initials: Option<String>,
            #[serde(default)]
            score: serde_json::Value,
        }

        let raw: RawSubmission =
            serde_json::from_str(body).map_err(|e| SubmitError::Malformed(e.to_string()))?;
        let score = match &raw.score {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => leading_integer(s).map(|v| v as f64),
            _ => None,
        };
        let score = match score {
            Some(v) if v.is_finite() && v >= 0.0 => v.floor() as u64,
            _ => return Err(SubmitError::InvalidScore),
        };
        Self::new(
            raw.game_slug.as_deref().unwrap_or_default(),
            raw.initials.as_deref().unwrap_or_default(),
            score,
        )
    }

    pub fn to_json(&self) -> String {
        // Plain strings and an integer always serialize
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub initials: String,
    pub score: u64,
    /// Unix seconds
    pub achieved_at: u64,
}

/// Reply to an accepted submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub ok: bool,
    pub game_slug: String,
    pub initials: String,
    pub score: u64,
    pub at: u64,
}

/// Reply to a leaderboard read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub ok: bool,
    pub game_slug: String,
    pub top10: Vec<LeaderboardRow>,
    pub leader: Option<LeaderboardRow>,
}

/// A stretch of time one score held #1 on a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderSpan {
    pub game_slug: String,
    pub initials: String,
    pub score: u64,
    pub start_at: u64,
    /// `None` while still on top
    pub end_at: Option<u64>,
}

/// Total time a player has spent as #1 across all games
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopDogTotal {
    pub initials: String,
    pub seconds_as_top1: u64,
}

/// A game's current #1 and how long they have held it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentHolder {
    pub game_slug: String,
    pub initials: String,
    pub score: u64,
    pub start_at: u64,
    pub seconds_held: u64,
}

/// Reply to a leader-tenure read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopDogsResponse {
    pub ok: bool,
    pub totals: Vec<TopDogTotal>,
    pub current: Vec<CurrentHolder>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredScore {
    game_slug: String,
    row: LeaderboardRow,
}

/// Every recorded score across all games
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Leaderboard {
    scores: Vec<StoredScore>,
    /// At most one open span per game
    #[serde(default)]
    leader_history: Vec<LeaderSpan>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a validated submission achieved at `achieved_at` (Unix seconds)
    pub fn record(&mut self, submission: &ScoreSubmission, achieved_at: u64) -> SubmitResponse {
        self.scores.push(StoredScore {
            game_slug: submission.game_slug.clone(),
            row: LeaderboardRow {
                initials: submission.initials.clone(),
                score: submission.score,
                achieved_at,
            },
        });
        self.update_leader_history(&submission.game_slug, achieved_at);
        SubmitResponse {
            ok: true,
            game_slug: submission.game_slug.clone(),
            initials: submission.initials.clone(),
            score: submission.score,
            at: achieved_at,
        }
    }

    /// Top rows for a game: score descending, earliest achievement first on ties
    pub fn top10(&self, game_slug: &str) -> Vec<LeaderboardRow> {
        let slug = normalize_slug(game_slug);
        let mut rows: Vec<LeaderboardRow> = self
            .scores
            .iter()
            .filter(|s| s.game_slug == slug)
            .map(|s| s.row.clone())
            .collect();
        // Stable sort keeps submission order for identical timestamps
        rows.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(a.achieved_at.cmp(&b.achieved_at))
        });
        rows.truncate(MAX_HIGH_SCORES);
        rows
    }

    pub fn leader(&self, game_slug: &str) -> Option<LeaderboardRow> {
        self.top10(game_slug).into_iter().next()
    }

    pub fn response(&self, game_slug: &str) -> LeaderboardResponse {
        let top10 = self.top10(game_slug);
        LeaderboardResponse {
            ok: true,
            game_slug: normalize_slug(game_slug),
            leader: top10.first().cloned(),
            top10,
        }
    }

    /// Close the open span and open a new one when #1 changed
    fn update_leader_history(&mut self, game_slug: &str, now: u64) {
        let Some(leader) = self.leader(game_slug) else {
            return;
        };
        let open = self
            .leader_history
            .iter_mut()
            .find(|span| span.game_slug == game_slug && span.end_at.is_none());
        match open {
            Some(span) if span.initials == leader.initials && span.score == leader.score => return,
            Some(span) => span.end_at = Some(now),
            None => {}
        }
        log::debug!("{} leads {} with {}", leader.initials, game_slug, leader.score);
        self.leader_history.push(LeaderSpan {
            game_slug: game_slug.to_string(),
            initials: leader.initials,
            score: leader.score,
            start_at: leader.achieved_at,
            end_at: None,
        });
    }

    /// Who has held #1 the longest overall, and who holds it on each game now
    pub fn top_dogs(&self, now: u64) -> TopDogsResponse {
        let mut held: BTreeMap<&str, u64> = BTreeMap::new();
        for span in &self.leader_history {
            let seconds = span.end_at.unwrap_or(now).saturating_sub(span.start_at);
            *held.entry(span.initials.as_str()).or_default() += seconds;
        }
        let mut totals: Vec<TopDogTotal> = held
            .into_iter()
            .map(|(initials, seconds_as_top1)| TopDogTotal {
                initials: initials.to_string(),
                seconds_as_top1,
            })
            .collect();
        totals.sort_by(|a, b| b.seconds_as_top1.cmp(&a.seconds_as_top1));
        totals.truncate(MAX_HIGH_SCORES);

        let mut current: Vec<CurrentHolder> = self
            .leader_history
            .iter()
            .filter(|span| span.end_at.is_none())
            .map(|span| CurrentHolder {
                game_slug: span.game_slug.clone(),
                initials: span.initials.clone(),
                score: span.score,
                start_at: span.start_at,
                seconds_held: now.saturating_sub(span.start_at),
            })
            .collect();
        current.sort_by(|a, b| b.seconds_held.cmp(&a.seconds_held));
        current.truncate(MAX_CURRENT_HOLDERS);

        TopDogsResponse {
            ok: true,
            totals,
            current,
        }
    }

    pub fn leader_history(&self) -> &[LeaderSpan] {
        &self.leader_history
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Load a saved leaderboard; a missing file starts empty
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No leaderboard at {}, starting fresh", path.display());
            return Ok(Self::new());
        }
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let board: Leaderboard = serde_json::from_str(&json)?;
        log::info!("Loaded {} scores", board.scores.len());
        Ok(board)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Leaderboard saved ({} scores)", self.scores.len());
        Ok(())
    }
}

/// Current Unix time in seconds
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl ScoreSink for Leaderboard {
    fn submit(&mut self, game_slug: &str, initials: &str, score: u64) -> Result<(), SubmitError> {
        let submission = ScoreSubmission::new(game_slug, initials, score)?;
        self.record(&submission, now_secs());
        Ok(())
    }
}

/// Sink that only logs the request body it would send
#[derive(Debug, Default)]
pub struct LogScoreSink;

impl ScoreSink for LogScoreSink {
    fn submit(&mut self, game_slug: &str, initials: &str, score: u64) -> Result<(), SubmitError> {
        let submission = ScoreSubmission::new(game_slug, initials, score)?;
        log::info!("POST /api/score {}", submission.to_json());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit(board: &mut Leaderboard, initials: &str, score: u64, at: u64) {
        let submission = ScoreSubmission::new("millipede", initials, score).unwrap();
        board.record(&submission, at);
    }

    #[test]
    fn test_normalize_slug() {
        assert_eq!(normalize_slug("  Neon Chase!! "), "neon-chase");
        assert_eq!(normalize_slug("--cyber--python--"), "cyber-python");
        assert_eq!(normalize_slug("$$$"), "");
    }

    #[test]
    fn test_normalize_initials() {
        assert_eq!(normalize_initials(" a.b-c d "), "ABC");
        assert_eq!(normalize_initials("z9"), "Z9");
        assert_eq!(normalize_initials("???"), "");
    }

    #[test]
    fn test_submission_validation() {
        assert_eq!(
            ScoreSubmission::new("", "ABC", 1),
            Err(SubmitError::MissingGameSlug)
        );
        assert_eq!(
            ScoreSubmission::new("millipede", "!!", 1),
            Err(SubmitError::MissingInitials)
        );
    }

    #[test]
    fn test_from_json_body() {
        let sub = ScoreSubmission::from_json(
            r#"{"game_slug":"Millipede","initials":"abcd","score":"1500"}"#,
        )
        .unwrap();
        assert_eq!(sub.game_slug, "millipede");
        assert_eq!(sub.initials, "ABC");
        assert_eq!(sub.score, 1500);

        let sub = ScoreSubmission::from_json(r#"{"game_slug":"m","initials":"x","score":12.9}"#)
            .unwrap();
        assert_eq!(sub.score, 12);

        for (raw, expected) in [("\"1.5\"", 1), ("\"12abc\"", 12), ("\" +7\"", 7)] {
            let body = format!(r#"{{"game_slug":"m","initials":"x","score":{}}}"#, raw);
            assert_eq!(ScoreSubmission::from_json(&body).unwrap().score, expected);
        }
        assert_eq!(
            ScoreSubmission::from_json(r#"{"game_slug":"m","initials":"x","score":"abc"}"#),
            Err(SubmitError::InvalidScore)
        );
        assert_eq!(
            ScoreSubmission::from_json(r#"{"game_slug":"m","initials":"x","score":"-3"}"#),
            Err(SubmitError::InvalidScore)
        );
        assert_eq!(
            ScoreSubmission::from_json(r#"{"game_slug":"m","initials":"x","score":-5}"#),
            Err(SubmitError::InvalidScore)
        );
        assert_eq!(
            ScoreSubmission::from_json(r#"{"game_slug":"m","initials":"x"}"#),
            Err(SubmitError::InvalidScore)
        );
        assert!(matches!(
            ScoreSubmission::from_json("nope"),
            Err(SubmitError::Malformed(_))
        ));
    }

    #[test]
    fn test_wire_shape() {
        let sub = ScoreSubmission::new("millipede", "ace", 90).unwrap();
        assert_eq!(
            sub.to_json(),
            r#"{"game_slug":"millipede","initials":"ACE","score":90}"#
        );
    }

    #[test]
    fn test_top10_order_and_ties() {
        let mut board = Leaderboard::new();
        submit(&mut board, "LAT", 500, 20);
        submit(&mut board, "ERL", 500, 10);
        submit(&mut board, "TOP", 900, 30);
        submit(&mut board, "LOW", 100, 5);

        let top = board.top10("millipede");
        let order: Vec<&str> = top.iter().map(|r| r.initials.as_str()).collect();
        assert_eq!(order, vec!["TOP", "ERL", "LAT", "LOW"]);
        assert_eq!(board.leader("millipede").unwrap().initials, "TOP");
        assert!(board.top10("neon-chase").is_empty());
    }

    #[test]
    fn test_top10_truncates() {
        let mut board = Leaderboard::new();
        for i in 0..15 {
            submit(&mut board, "AAA", i * 10, i);
        }
        let top = board.top10("millipede");
        assert_eq!(top.len(), MAX_HIGH_SCORES);
        assert_eq!(top[0].score, 140);
        assert_eq!(top[9].score, 50);
    }

    #[test]
    fn test_leader_change_closes_span() {
        let mut board = Leaderboard::new();
        submit(&mut board, "AAA", 100, 10);
        submit(&mut board, "BBB", 50, 20);
        assert_eq!(board.leader_history().len(), 1);

        submit(&mut board, "BBB", 200, 30);
        let history = board.leader_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].initials, "AAA");
        assert_eq!(history[0].end_at, Some(30));
        assert_eq!(history[1].initials, "BBB");
        assert_eq!(history[1].start_at, 30);
        assert_eq!(history[1].end_at, None);
    }

    #[test]
    fn test_tie_does_not_take_the_lead() {
        let mut board = Leaderboard::new();
        submit(&mut board, "AAA", 100, 10);
        submit(&mut board, "BBB", 100, 20);
        assert_eq!(board.leader_history().len(), 1);
        assert_eq!(board.leader("millipede").unwrap().initials, "AAA");
    }

    #[test]
    fn test_top_dogs() {
        let mut board = Leaderboard::new();
        submit(&mut board, "AAA", 100, 10);
        submit(&mut board, "BBB", 200, 30);
        let other = ScoreSubmission::new("neon-chase", "AAA", 5).unwrap();
        board.record(&other, 40);

        let dogs = board.top_dogs(100);
        assert!(dogs.ok);
        // AAA: 20s on millipede + 60s on neon-chase, BBB: 70s
        assert_eq!(
            dogs.totals,
            vec![
                TopDogTotal {
                    initials: "AAA".to_string(),
                    seconds_as_top1: 80,
                },
                TopDogTotal {
                    initials: "BBB".to_string(),
                    seconds_as_top1: 70,
                },
            ]
        );
        let current: Vec<(&str, &str, u64)> = dogs
            .current
            .iter()
            .map(|c| (c.game_slug.as_str(), c.initials.as_str(), c.seconds_held))
            .collect();
        assert_eq!(
            current,
            vec![("millipede", "BBB", 70), ("neon-chase", "AAA", 60)]
        );
    }

    #[test]
    fn test_history_missing_from_saved_file() {
        let board: Leaderboard = serde_json::from_str(r#"{"scores":[]}"#).unwrap();
        assert!(board.is_empty());
        assert!(board.leader_history().is_empty());
        assert!(board.top_dogs(5).totals.is_empty());
    }

    #[test]
    fn test_response_shape() {
        let mut board = Leaderboard::new();
        submit(&mut board, "ACE", 10, 1);
        let json = serde_json::to_value(board.response("Millipede")).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["game_slug"], "millipede");
        assert_eq!(json["top10"][0]["initials"], "ACE");
        assert_eq!(json["leader"]["score"], 10);
    }

    #[test]
    fn test_sink_rejects_invalid() {
        let mut board = Leaderboard::new();
        assert_eq!(
            board.submit("millipede", "", 10),
            Err(SubmitError::MissingInitials)
        );
        assert!(board.is_empty());
        assert!(LogScoreSink.submit("millipede", "abc", 10).is_ok());
    }
}
