//! Roster reconciliation
//!
//! Compares the members of a Discord guild against the members of a Wise Old
//! Man group and reports the group members that have no matching account in
//! the guild. Names are matched case-insensitively and reported with the
//! casing the external roster uses.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A member of the chat-side roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterMember {
    pub id: String,
    /// Account-level username
    pub account_name: String,
    /// Per-guild display alias, if the member set one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl RosterMember {
    pub fn new(id: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            account_name: account_name.into(),
            nickname: None,
            bot: false,
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn as_bot(mut self) -> Self {
        self.bot = true;
        self
    }

    /// The name other members see: the nickname when one is set and not
    /// blank, otherwise the account name.
    pub fn display_name(&self) -> &str {
        match self.nickname.as_deref() {
            Some(nick) if !nick.trim().is_empty() => nick,
            _ => &self.account_name,
        }
    }
}

/// Human members' display names, in roster order.
pub fn chat_roster_names(members: &[RosterMember]) -> Vec<String> {
    members
        .iter()
        .filter(|m| !m.bot)
        .map(|m| m.display_name().to_string())
        .collect()
}

/// External roster entries with no case-insensitive match in the chat roster,
/// sorted with [`locale_cmp`].
pub fn diff_rosters<C, E>(chat_roster: &[C], external_roster: &[E]) -> Vec<String>
where
    C: AsRef<str>,
    E: AsRef<str>,
{
    let present: HashSet<String> = chat_roster.iter().map(|n| fold(n.as_ref())).collect();

    let mut missing: Vec<String> = external_roster
        .iter()
        .map(|n| n.as_ref())
        .filter(|n| !present.contains(&fold(n)))
        .map(str::to_string)
        .collect();
    missing.sort_by(|a, b| locale_cmp(a, b));
    missing
}

/// Dictionary-style ordering: spaces and punctuation sort before digits and
/// digits before letters, letters compare case-insensitively, a lowercase
/// spelling sorts before its uppercase twin, and byte order breaks any
/// remaining tie.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .map(primary_weight)
        .cmp(b.chars().map(primary_weight))
        .then_with(|| lowercase_first(a, b))
        .then_with(|| a.cmp(b))
}

fn primary_weight(c: char) -> (u8, char) {
    let lower = c.to_lowercase().next().unwrap_or(c);
    let class = if c.is_alphabetic() {
        2
    } else if c.is_numeric() {
        1
    } else {
        0
    };
    (class, lower)
}

fn lowercase_first(a: &str, b: &str) -> Ordering {
    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca == cb {
            continue;
        }
        match (ca.is_lowercase(), cb.is_lowercase()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
    }
    Ordering::Equal
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}
