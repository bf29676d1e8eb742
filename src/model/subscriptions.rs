//! Feedback subscriptions
//!
//! Tracks which feedback instances watch which composed group ids. Only
//! groups with at least one watcher are probed.

/// One feedback instance watching one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub group_id: String,
    pub feedback_id: String,
}

#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    entries: Vec<Subscription>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, group_id: &str, feedback_id: &str) {
        self.entries.push(Subscription {
            group_id: group_id.to_string(),
            feedback_id: feedback_id.to_string(),
        });
    }

    /// Remove every entry of this feedback instance; returns how many were removed
    pub fn unsubscribe(&mut self, feedback_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.feedback_id != feedback_id);
        before - self.entries.len()
    }

    /// Distinct watched group ids, in first-subscribed order
    pub fn active_groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !groups.contains(&entry.group_id) {
                groups.push(entry.group_id.clone());
            }
        }
        groups
    }

    /// Feedback instances to re-check once `group_id` has been probed
    pub fn feedbacks_for(&self, group_id: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.group_id == group_id)
            .map(|entry| entry.feedback_id.clone())
            .collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
