//! Decoding and validation of the invocation event.
//!
//! Two shapes are accepted:
//!
//! ```json
//! { "team-a": { "rssUrl": { "aws": "https://..." } } }
//! { "notifierName": "team-a", "notifier": { "rssUrl": { "aws": "https://..." } } }
//! ```
//!
//! The second is what the scheduling rule posts. Other notifier fields
//! (schedule, webhook settings, ...) are ignored.

use crate::types::{CrawlerError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    pub notifier_name: String,
    pub feeds_by_category: BTreeMap<String, Url>,
}

#[derive(Debug, Deserialize)]
struct NotifierBody {
    #[serde(rename = "rssUrl")]
    rss_url: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct ScheduledEnvelope {
    #[serde(rename = "notifierName")]
    notifier_name: String,
    notifier: NotifierBody,
}

impl NotifierConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(CrawlerError::InvalidEvent("event must be a JSON object".to_string()));
        };

        let (notifier_name, body) = if is_envelope(&map) {
            let envelope: ScheduledEnvelope = serde_json::from_value(Value::Object(map))
                .map_err(|e| CrawlerError::InvalidEvent(format!("malformed scheduler event: {}", e)))?;
            (envelope.notifier_name, envelope.notifier)
        } else {
            single_notifier(map)?
        };

        Self::validate(notifier_name, body)
    }

    fn validate(notifier_name: String, body: NotifierBody) -> Result<Self> {
        if notifier_name.trim().is_empty() {
            return Err(CrawlerError::InvalidEvent("notifier name is empty".to_string()));
        }

        let rss_url = body.rss_url.ok_or_else(|| {
            CrawlerError::InvalidEvent(format!("notifier {} has no rssUrl", notifier_name))
        })?;

        let mut feeds_by_category = BTreeMap::new();
        for (category, raw_url) in rss_url {
            if category.trim().is_empty() {
                return Err(CrawlerError::InvalidEvent(format!(
                    "notifier {} has a feed with an empty category",
                    notifier_name
                )));
            }
            feeds_by_category.insert(category.clone(), parse_feed_url(&category, &raw_url)?);
        }

        Ok(Self {
            notifier_name,
            feeds_by_category,
        })
    }
}

fn is_envelope(map: &Map<String, Value>) -> bool {
    matches!(map.get("notifierName"), Some(Value::String(_)))
        && matches!(map.get("notifier"), Some(Value::Object(_)))
}

fn single_notifier(map: Map<String, Value>) -> Result<(String, NotifierBody)> {
    if map.len() != 1 {
        return Err(CrawlerError::InvalidEvent(format!(
            "expected exactly one notifier, found {}",
            map.len()
        )));
    }

    // len checked above
    let Some((name, body)) = map.into_iter().next() else {
        return Err(CrawlerError::InvalidEvent("event is empty".to_string()));
    };
    let body: NotifierBody = serde_json::from_value(body)
        .map_err(|e| CrawlerError::InvalidEvent(format!("notifier {} is malformed: {}", name, e)))?;
    Ok((name, body))
}

fn parse_feed_url(category: &str, raw_url: &str) -> Result<Url> {
    let url = Url::parse(raw_url).map_err(|e| {
        CrawlerError::InvalidEvent(format!("feed {} has invalid url {:?}: {}", category, raw_url, e))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CrawlerError::InvalidEvent(format!(
            "feed {} must use http or https, got {}",
            category,
            url.scheme()
        )));
    }

    Ok(url)
}
