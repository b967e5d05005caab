//! The immutable in-memory snapshot plus the lookup indexes built once
//! at construction.
//!
//! RULE: every join goes through these indexes. No model scans a
//! collection to resolve an id.

use crate::model::{Event, Firm, User};
use crate::types::EntityId;
use chrono::NaiveDateTime;
use std::collections::HashMap;

pub struct Dataset {
    users: Vec<User>,
    firms: Vec<Firm>,
    events: Vec<Event>,
    user_index: HashMap<EntityId, usize>,
    firm_index: HashMap<EntityId, usize>,
    /// Per-user event positions, sorted by (event_created_at, event_id)
    /// so that "first event" is deterministic regardless of input order.
    events_by_user: HashMap<EntityId, Vec<usize>>,
}

impl Dataset {
    pub fn new(users: Vec<User>, firms: Vec<Firm>, events: Vec<Event>) -> Self {
        let mut user_index = HashMap::with_capacity(users.len());
        for (i, user) in users.iter().enumerate() {
            // First occurrence wins on duplicate ids.
            user_index.entry(user.user_id.clone()).or_insert(i);
        }

        let mut firm_index = HashMap::with_capacity(firms.len());
        for (i, firm) in firms.iter().enumerate() {
            firm_index.entry(firm.firm_id.clone()).or_insert(i);
        }

        let mut events_by_user: HashMap<EntityId, Vec<usize>> = HashMap::new();
        for (i, event) in events.iter().enumerate() {
            events_by_user
                .entry(event.user_id.clone())
                .or_default()
                .push(i);
        }
        for positions in events_by_user.values_mut() {
            positions.sort_by_key(|&i| (events[i].event_created_at, events[i].event_id));
        }

        Self {
            users,
            firms,
            events,
            user_index,
            firm_index,
            events_by_user,
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn firms(&self) -> &[Firm] {
        &self.firms
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn user(&self, user_id: &str) -> Option<&User> {
        self.user_index.get(user_id).map(|&i| &self.users[i])
    }

    pub fn firm(&self, firm_id: &str) -> Option<&Firm> {
        self.firm_index.get(firm_id).map(|&i| &self.firms[i])
    }

    /// All events for a user, in (timestamp, event_id) order. Empty for
    /// users with no events and for unknown ids.
    pub fn user_events(&self, user_id: &str) -> Vec<&Event> {
        self.events_by_user
            .get(user_id)
            .map(|positions| positions.iter().map(|&i| &self.events[i]).collect())
            .unwrap_or_default()
    }

    /// The user's earliest event, tie-broken by event id.
    pub fn first_event(&self, user_id: &str) -> Option<&Event> {
        self.events_by_user
            .get(user_id)
            .and_then(|positions| positions.first())
            .map(|&i| &self.events[i])
    }

    /// Latest timestamp across all three tables. The default reference
    /// date for future-dated findings, so reruns are reproducible.
    pub fn max_timestamp(&self) -> Option<NaiveDateTime> {
        let users = self.users.iter().map(|u| u.user_created_date);
        let firms = self.firms.iter().map(|f| f.firm_created_date);
        let events = self.events.iter().map(|e| e.event_created_at);
        users.chain(firms).chain(events).max()
    }
}
