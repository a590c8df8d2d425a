//! Deterministic text signals derived each turn.
//!
//! Every analyzer here is a pure keyword/punctuation heuristic over the
//! message text or a bounded suffix of the history.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::message::{average_length, recent_user_messages};
use super::ConversationMessage;
use crate::domain::lexicon::{
    contains_keyword, count_all_occurrences, normalize, replace_phrase, LanguagePack,
};

const QUALITY_WINDOW: usize = 10;
const SATISFACTION_WINDOW: usize = 5;
const TOPIC_WINDOW: usize = 15;

/// Dominant emotion expressed in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalState {
    Excited,
    Frustrated,
    Uncertain,
    Satisfied,
    /// No emotion keyword matched.
    Neutral,
}

impl EmotionalState {
    /// Emotions that have keyword lists, in tie-break order.
    pub const SCORED: [EmotionalState; 4] = [
        EmotionalState::Excited,
        EmotionalState::Frustrated,
        EmotionalState::Uncertain,
        EmotionalState::Satisfied,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Excited => "excited",
            Self::Frustrated => "frustrated",
            Self::Uncertain => "uncertain",
            Self::Satisfied => "satisfied",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for EmotionalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// How pressing the visitor's request is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl UrgencyLevel {
    pub const ALL: [UrgencyLevel; 4] = [
        UrgencyLevel::Low,
        UrgencyLevel::Medium,
        UrgencyLevel::High,
        UrgencyLevel::Critical,
    ];

    /// Order in which phrase lists are checked.
    const PRIORITY: [UrgencyLevel; 4] = [
        UrgencyLevel::Critical,
        UrgencyLevel::High,
        UrgencyLevel::Medium,
        UrgencyLevel::Low,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Argmax of emotion keyword occurrences; `Neutral` when nothing matches.
pub fn analyze_emotion(message: &str, pack: &LanguagePack) -> EmotionalState {
    let lowered = normalize(message);
    let mut best = (EmotionalState::Neutral, 0usize);

    for emotion in EmotionalState::SCORED {
        let score = count_all_occurrences(&lowered, pack.emotion_keywords(emotion));
        if score > best.1 {
            best = (emotion, score);
        }
    }

    best.0
}

/// Phrase lists first, in priority order, then punctuation and caps.
///
/// Calm phrases are blanked out before the urgent tiers are scanned, so
/// "no rush" never counts as "rush".
pub fn analyze_urgency(message: &str, pack: &LanguagePack) -> UrgencyLevel {
    let lowered = normalize(message);
    let calm_phrases = pack.urgency_phrases(UrgencyLevel::Low);
    let urgent_text = calm_phrases
        .iter()
        .fold(lowered.clone(), |text, phrase| replace_phrase(&text, phrase, " "));

    for level in UrgencyLevel::PRIORITY {
        let text = if level == UrgencyLevel::Low {
            &lowered
        } else {
            &urgent_text
        };
        if pack
            .urgency_phrases(level)
            .iter()
            .any(|phrase| contains_keyword(text, phrase))
        {
            return level;
        }
    }

    let exclamations = message.chars().filter(|c| *c == '!').count();
    let caps = caps_ratio(message);

    if exclamations > 2 || caps > 0.5 {
        UrgencyLevel::High
    } else if exclamations > 0 || caps > 0.2 {
        UrgencyLevel::Medium
    } else {
        UrgencyLevel::Low
    }
}

/// Long sentences, technical vocabulary and dense questions each add weight.
pub fn complexity_score(message: &str, pack: &LanguagePack) -> f64 {
    let words = message.split_whitespace().count();
    if words == 0 {
        return 0.0;
    }

    let sentences = sentence_count(message);
    let lowered = normalize(message);
    let technical_hits = count_all_occurrences(&lowered, &pack.technical_terms);
    let questions = message.chars().filter(|c| is_question_mark(*c)).count();

    let mut score = 0.0;
    if words as f64 / sentences as f64 > 15.0 {
        score += 0.3;
    }
    if technical_hits as f64 / words as f64 > 0.1 {
        score += 0.4;
    }
    if questions as f64 / sentences as f64 > 0.3 {
        score += 0.3;
    }

    f64::min(score, 1.0)
}

/// Balance of message lengths, question engagement and conversation depth.
pub fn conversation_quality(history: &[ConversationMessage]) -> f64 {
    let start = history.len().saturating_sub(QUALITY_WINDOW);
    let window = &history[start..];
    if window.is_empty() {
        return 0.0;
    }

    let users: Vec<&ConversationMessage> = window.iter().filter(|m| m.is_user()).collect();
    let user_avg = average_length(users.iter().copied());
    let assistant_avg = average_length(window.iter().filter(|m| m.is_assistant()));

    let balance = if assistant_avg == 0.0 {
        1.0
    } else {
        let (low, high) = if user_avg < assistant_avg {
            (user_avg, assistant_avg)
        } else {
            (assistant_avg, user_avg)
        };
        if high == 0.0 {
            1.0
        } else {
            low / high
        }
    };

    let question_ratio = if users.is_empty() {
        0.0
    } else {
        let asking = users
            .iter()
            .filter(|m| m.content().chars().any(is_question_mark))
            .count();
        asking as f64 / users.len() as f64
    };

    let depth = if window.len() >= 4 { 1.0 } else { 0.0 };

    (0.5 * balance + 0.3 * f64::min(2.0 * question_ratio, 1.0) + 0.2 * depth).clamp(0.0, 1.0)
}

/// Positive minus negative phrase hits over the last five visitor messages.
pub fn user_satisfaction(history: &[ConversationMessage], pack: &LanguagePack) -> f64 {
    let users: Vec<&ConversationMessage> = history.iter().filter(|m| m.is_user()).collect();
    let recent = &users[users.len().saturating_sub(SATISFACTION_WINDOW)..];

    let (positive, negative) = recent.iter().fold((0usize, 0usize), |(p, n), m| {
        let lowered = normalize(m.content());
        (
            p + count_all_occurrences(&lowered, &pack.sentiment.positive),
            n + count_all_occurrences(&lowered, &pack.sentiment.negative),
        )
    });

    (0.5 + 0.1 * positive as f64 - 0.15 * negative as f64).clamp(0.0, 1.0)
}

/// Topic tags mentioned in a single message, in pack order.
pub fn detect_topics(message: &str, pack: &LanguagePack) -> Vec<String> {
    let lowered = normalize(message);
    pack.topics
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| contains_keyword(&lowered, k)))
        .map(|(tag, _)| tag.clone())
        .collect()
}

/// Ordered unique topic tags across recent visitor messages.
pub fn topic_progression(history: &[ConversationMessage], pack: &LanguagePack) -> Vec<String> {
    let mut progression: Vec<String> = Vec::new();
    for message in recent_user_messages(history, TOPIC_WINDOW) {
        for tag in detect_topics(message.content(), pack) {
            if !progression.contains(&tag) {
                progression.push(tag);
            }
        }
    }
    progression
}

pub(crate) fn is_question_mark(c: char) -> bool {
    c == '?' || c == '؟'
}

pub(crate) fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '؟')
}

fn sentence_count(text: &str) -> usize {
    text.split(is_sentence_end)
        .filter(|s| !s.trim().is_empty())
        .count()
        .max(1)
}

fn caps_ratio(text: &str) -> f64 {
    let (letters, upper) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(l, u), c| (l + 1, u + usize::from(c.is_uppercase())));
    if letters == 0 {
        0.0
    } else {
        upper as f64 / letters as f64
    }
}
