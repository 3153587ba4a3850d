//! Candidate result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One result returned by a source for a campaign query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    /// Result title as listed by the source.
    pub title: String,
    /// Name of the source that produced this result.
    pub source: String,
    /// Content hash (e.g. a torrent info hash), when the source exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_hash: Option<String>,
    /// Where the item can be fetched from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Popularity signal; `None` when the source has no such notion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seeders: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Languages reported by the source, as ISO 639-1 codes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
    /// False for private or otherwise untrusted listings.
    #[serde(default = "default_trusted")]
    pub trusted: bool,
}

fn default_trusted() -> bool {
    true
}

impl Candidate {
    pub fn new(title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: source.into(),
            info_hash: None,
            url: None,
            size_bytes: None,
            seeders: None,
            published_at: None,
            languages: Vec::new(),
            trusted: true,
        }
    }

    /// Key used to recognise the same result across rounds.
    ///
    /// The lowercase content hash when known, the source URL otherwise.
    /// `None` means the result cannot be tracked and must not be acted upon.
    pub fn dedup_key(&self) -> Option<String> {
        match self.info_hash.as_deref().map(str::trim) {
            Some(hash) if !hash.is_empty() => Some(hash.to_lowercase()),
            _ => self
                .url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string),
        }
    }
}

/// What the engine decided about a recorded candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Selected for acquisition; stays unprocessed until a downstream worker picks it up.
    Accepted,
    /// Failed a static check; recorded as already processed.
    Rejected,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Accepted => "accepted",
            Disposition::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "accepted" => Some(Disposition::Accepted),
            "rejected" => Some(Disposition::Rejected),
            _ => None,
        }
    }
}

/// Write-once record of a candidate seen by a campaign.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateRecord {
    pub campaign_id: String,
    pub dedup_key: String,
    pub title: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    pub disposition: Disposition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl CandidateRecord {
    /// Record for an accepted candidate.
    pub fn accepted(
        campaign_id: &str,
        dedup_key: String,
        candidate: &Candidate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            campaign_id: campaign_id.to_string(),
            dedup_key,
            title: candidate.title.clone(),
            source: candidate.source.clone(),
            url: candidate.url.clone(),
            size_bytes: candidate.size_bytes,
            disposition: Disposition::Accepted,
            reason: None,
            created_at: now,
            processed_at: None,
        }
    }

    /// Record for a candidate rejected by a static check.
    pub fn rejected(
        campaign_id: &str,
        dedup_key: String,
        candidate: &Candidate,
        reason: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            disposition: Disposition::Rejected,
            reason: Some(reason),
            processed_at: Some(now),
            ..Self::accepted(campaign_id, dedup_key, candidate, now)
        }
    }

    /// Whether a downstream worker still has to act on this record.
    pub fn is_actionable(&self) -> bool {
        self.disposition == Disposition::Accepted && self.processed_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_prefers_lowercase_hash() {
        let mut candidate = Candidate::new("Title", "src");
        candidate.info_hash = Some("ABCDEF".to_string());
        candidate.url = Some("http://example.com/1".to_string());
        assert_eq!(candidate.dedup_key(), Some("abcdef".to_string()));
    }

    #[test]
    fn test_dedup_key_falls_back_to_url() {
        let mut candidate = Candidate::new("Title", "src");
        candidate.info_hash = Some("  ".to_string());
        candidate.url = Some("http://example.com/1".to_string());
        assert_eq!(
            candidate.dedup_key(),
            Some("http://example.com/1".to_string())
        );
    }

    #[test]
    fn test_dedup_key_missing() {
        let candidate = Candidate::new("Title", "src");
        assert_eq!(candidate.dedup_key(), None);
    }

    #[test]
    fn test_rejected_record_is_processed() {
        let candidate = Candidate::new("Title", "src");
        let now = Utc::now();
        let record =
            CandidateRecord::rejected("c1", "key".to_string(), &candidate, "too big".into(), now);
        assert_eq!(record.disposition, Disposition::Rejected);
        assert_eq!(record.processed_at, Some(now));
        assert!(!record.is_actionable());

        let accepted = CandidateRecord::accepted("c1", "key".to_string(), &candidate, now);
        assert!(accepted.is_actionable());
    }

    #[test]
    fn test_candidate_defaults_to_trusted() {
        let json = r#"{"title": "A", "source": "b"}"#;
        let candidate: Candidate = serde_json::from_str(json).unwrap();
        assert!(candidate.trusted);
        assert!(candidate.languages.is_empty());
    }
}
