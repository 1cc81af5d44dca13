// file: src/models/transcript.rs
// description: append-only, role-tagged conversation record for one chat session
// reference: internal data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Turns are only ever appended; there is no API to edit or drop one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_greeting(greeting: &str) -> Self {
        let mut transcript = Self::new();
        transcript.append(Role::Assistant, greeting);
        transcript
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) -> &Turn {
        self.turns.push(Turn::new(role, content));
        &self.turns[self.turns.len() - 1]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// A user question that never received an answer (its generation failed).
    pub fn has_dangling_user_turn(&self) -> bool {
        self.last().is_some_and(|turn| turn.role == Role::User)
    }

    /// Completed user/assistant pairs in order. The seeded greeting and
    /// unanswered questions are not part of any exchange.
    pub fn exchanges(&self) -> Vec<(&Turn, &Turn)> {
        let mut pairs = Vec::new();
        let mut i = 0;

        while i < self.turns.len() {
            let current = &self.turns[i];
            match self.turns.get(i + 1) {
                Some(next) if current.role == Role::User && next.role == Role::Assistant => {
                    pairs.push((current, next));
                    i += 2;
                }
                _ => i += 1,
            }
        }

        pairs
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
