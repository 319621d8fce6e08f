use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::error::CoreError;

/// Per-chat user record, created on first contact
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub chat_id: i64,
    pub user_id: u64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub interaction_count: u64,
}

/// Aggregate statistics computed on demand over the whole store
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BotStats {
    pub total_users: usize,
    pub total_interactions: u64,
    pub average_interactions: f64,
    pub active_today: usize,
}

/// In-memory session store keyed by chat id.
///
/// Profiles are kept in insertion order so exports and listings are
/// deterministic. Nothing is persisted: a restart starts from empty.
#[derive(Debug, Default)]
pub struct SessionStore {
    profiles: Vec<UserProfile>,
    index: HashMap<i64, usize>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the profile for `chat_id` if absent, otherwise return the
    /// existing one untouched. Identity fields and `joined_at` are never
    /// overwritten.
    pub fn upsert(
        &mut self,
        chat_id: i64,
        user_id: u64,
        username: Option<String>,
        first_name: Option<String>,
        now: DateTime<Utc>,
    ) -> &UserProfile {
        let idx = match self.index.get(&chat_id) {
            Some(&idx) => idx,
            None => {
                debug!("New session for chat {} (user {})", chat_id, user_id);
                self.profiles.push(UserProfile {
                    chat_id,
                    user_id,
                    username,
                    first_name,
                    joined_at: now,
                    interaction_count: 0,
                });
                let idx = self.profiles.len() - 1;
                self.index.insert(chat_id, idx);
                idx
            }
        };
        &self.profiles[idx]
    }

    /// Increment the interaction counter and return its new value
    pub fn try_record_interaction(&mut self, chat_id: i64) -> Result<u64, CoreError> {
        let idx = *self
            .index
            .get(&chat_id)
            .ok_or(CoreError::NotFound { chat_id })?;
        let profile = &mut self.profiles[idx];
        profile.interaction_count += 1;
        Ok(profile.interaction_count)
    }

    /// Like [`try_record_interaction`](Self::try_record_interaction), but an
    /// unknown chat is a silent no-op returning 0.
    pub fn record_interaction(&mut self, chat_id: i64) -> u64 {
        match self.try_record_interaction(chat_id) {
            Ok(count) => count,
            Err(e) => {
                debug!("Interaction not recorded: {}", e);
                0
            }
        }
    }

    pub fn get(&self, chat_id: i64) -> Option<&UserProfile> {
        self.index.get(&chat_id).map(|&idx| &self.profiles[idx])
    }

    pub fn count(&self) -> usize {
        self.profiles.len()
    }

    /// All profiles in insertion order
    pub fn profiles(&self) -> impl Iterator<Item = &UserProfile> {
        self.profiles.iter()
    }

    /// `today` is a UTC calendar date; a profile is active today when it
    /// joined on that date.
    pub fn aggregate(&self, today: NaiveDate) -> BotStats {
        let total_users = self.profiles.len();
        let total_interactions: u64 = self.profiles.iter().map(|p| p.interaction_count).sum();
        let average_interactions = if total_users > 0 {
            round2(total_interactions as f64 / total_users as f64)
        } else {
            0.0
        };
        let active_today = self
            .profiles
            .iter()
            .filter(|p| p.joined_at.date_naive() == today)
            .count();

        BotStats {
            total_users,
            total_interactions,
            average_interactions,
            active_today,
        }
    }

    pub fn aggregate_now(&self) -> BotStats {
        self.aggregate(Utc::now().date_naive())
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn add(store: &mut SessionStore, chat_id: i64, now: DateTime<Utc>) {
        store.upsert(
            chat_id,
            chat_id as u64,
            Some(format!("user{}", chat_id)),
            Some("Ann".to_string()),
            now,
        );
    }

    #[test]
    fn test_upsert_creates_with_zero_interactions() {
        let mut store = SessionStore::new();
        let profile = store.upsert(10, 20, Some("ann".into()), None, at(1, 9));
        assert_eq!(profile.chat_id, 10);
        assert_eq!(profile.user_id, 20);
        assert_eq!(profile.interaction_count, 0);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_upsert_keeps_first_joined_at() {
        let mut store = SessionStore::new();
        let first = at(1, 9);
        store.upsert(10, 20, Some("ann".into()), Some("Ann".into()), first);
        for i in 1..5 {
            let later = first + Duration::hours(i);
            let profile = store.upsert(10, 99, Some("other".into()), None, later);
            assert_eq!(profile.joined_at, first);
            assert_eq!(profile.user_id, 20);
            assert_eq!(profile.username.as_deref(), Some("ann"));
        }
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_upsert_does_not_reset_counter() {
        let mut store = SessionStore::new();
        add(&mut store, 1, at(1, 9));
        store.record_interaction(1);
        store.record_interaction(1);
        add(&mut store, 1, at(2, 9));
        assert_eq!(store.get(1).unwrap().interaction_count, 2);
    }

    #[test]
    fn test_record_interaction_counts_n_times() {
        let mut store = SessionStore::new();
        add(&mut store, 7, at(1, 9));
        for n in 1..=25 {
            assert_eq!(store.record_interaction(7), n);
        }
        assert_eq!(store.get(7).unwrap().interaction_count, 25);
    }

    #[test]
    fn test_record_interaction_unknown_chat_is_noop() {
        let mut store = SessionStore::new();
        assert_eq!(store.record_interaction(404), 0);
        assert_eq!(store.count(), 0);
        assert_eq!(
            store.try_record_interaction(404),
            Err(CoreError::NotFound { chat_id: 404 })
        );
    }

    #[test]
    fn test_aggregate_empty_store() {
        let store = SessionStore::new();
        let stats = store.aggregate(at(1, 0).date_naive());
        assert_eq!(stats, BotStats::default());
        assert_eq!(stats.average_interactions, 0.0);
    }

    #[test]
    fn test_aggregate_sums_and_averages() {
        let mut store = SessionStore::new();
        add(&mut store, 1, at(1, 9));
        add(&mut store, 2, at(2, 9));
        add(&mut store, 3, at(2, 23));
        store.record_interaction(1);
        store.record_interaction(2);
        store.record_interaction(2);
        store.record_interaction(3);
        store.record_interaction(3);
        store.record_interaction(3);
        store.record_interaction(3);

        let stats = store.aggregate(at(2, 0).date_naive());
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.total_interactions, 7);
        assert_eq!(stats.average_interactions, 2.33);
        assert_eq!(stats.active_today, 2);
    }

    #[test]
    fn test_profiles_in_insertion_order() {
        let mut store = SessionStore::new();
        for chat_id in [30, 10, 20] {
            add(&mut store, chat_id, at(1, 9));
        }
        add(&mut store, 10, at(3, 9));
        let ids: Vec<i64> = store.profiles().map(|p| p.chat_id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
    }
}
