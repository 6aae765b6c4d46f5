//! Comment lifecycle: one living checklist per pull request, plus labeling.

use serde::{Deserialize, Serialize};
use tracing::debug;
use warden_core::ReviewConfig;

/// A pull request comment as listed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullComment {
    pub id: u64,
    #[serde(default)]
    pub body: String,
}

/// Ids of checklist comments superseded by a newer one.
///
/// `existing` must be newest first. The first comment containing
/// `fingerprint` is kept; every later match is returned.
///
/// # Examples
///
/// ```
/// use warden_review::comment::{reconcile, PullComment};
///
/// let comments = vec![
///     PullComment { id: 30, body: "checklist v3 FP".into() },
///     PullComment { id: 20, body: "lgtm".into() },
///     PullComment { id: 10, body: "checklist v1 FP".into() },
/// ];
/// assert_eq!(reconcile(&comments, "FP"), vec![10]);
/// ```
pub fn reconcile(existing: &[PullComment], fingerprint: &str) -> Vec<u64> {
    let mut matches = existing.iter().filter(|c| c.body.contains(fingerprint));
    if let Some(kept) = matches.next() {
        debug!(id = kept.id, "keeping newest checklist comment");
    }
    matches.map(|c| c.id).collect()
}

/// Decides the follow-up label for a rendered checklist.
#[derive(Debug, Clone)]
pub struct CommentLifecycle {
    label: String,
    markers: Vec<String>,
}

impl CommentLifecycle {
    pub fn new(label: impl Into<String>, markers: Vec<String>) -> Self {
        Self {
            label: label.into(),
            markers,
        }
    }

    /// Label and consensus markers from the review configuration.
    pub fn from_config(config: &ReviewConfig) -> Self {
        Self::new(config.wait_confirm_label.clone(), config.consensus_markers.clone())
    }

    /// The label to add, if `rendered` asks for everyone's sign-off and the
    /// pull request does not carry the label yet.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_core::ReviewConfig;
    /// use warden_review::comment::CommentLifecycle;
    ///
    /// let lifecycle = CommentLifecycle::from_config(&ReviewConfig::default());
    /// let text = "|3|Community|Recycling is approved by all members||ongoing|";
    /// assert_eq!(lifecycle.label_if_needed(text, &[]), Some("wait_confirm"));
    /// assert_eq!(lifecycle.label_if_needed(text, &["wait_confirm".to_string()]), None);
    /// ```
    pub fn label_if_needed(&self, rendered: &str, existing_labels: &[String]) -> Option<&str> {
        let wanted = self.markers.iter().any(|m| rendered.contains(m.as_str()));
        if wanted && !existing_labels.iter().any(|l| *l == self.label) {
            Some(&self.label)
        } else {
            None
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}
