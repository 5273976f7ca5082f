// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `alertdesk classify` command implementation.
//!
//! Classifies either free text or the stored messages of a channel, with
//! thread replies folded into their parent.

use std::collections::HashMap;
use std::sync::Arc;

use alertdesk_classifier::IncidentClassifier;
use alertdesk_classifier::heuristic::{classify_impact, classify_urgency, determine_incident_level};
use alertdesk_core::{AlertdeskError, Classification, RawMessage, StorageAdapter};
use clap::Args;

/// Characters of message text shown per line.
const EXCERPT_CHARS: usize = 60;

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Text to classify. Words are joined with spaces.
    #[arg(conflicts_with = "channel", required_unless_present = "channel")]
    pub text: Vec<String>,

    /// Classify stored messages of this channel (internal id or Slack channel ID).
    #[arg(long)]
    pub channel: Option<String>,

    /// Maximum number of top-level messages to classify.
    #[arg(long, requires = "channel")]
    pub limit: Option<usize>,

    /// Use the built-in keyword lists instead of stored rules.
    #[arg(long)]
    pub heuristic: bool,

    /// Print one JSON object per line.
    #[arg(long)]
    pub json: bool,
}

/// A top-level message and the texts of its stored replies.
#[derive(Debug)]
pub struct Thread<'a> {
    pub parent: &'a RawMessage,
    pub replies: Vec<String>,
}

fn thread_ts(message: &RawMessage) -> Option<&str> {
    message.raw.get("thread_ts").and_then(|v| v.as_str())
}

/// Group replies under their parent, keeping `posted_at` order of parents.
///
/// A reply whose parent is not stored is treated as a top-level message.
pub fn group_threads(messages: &[RawMessage]) -> Vec<Thread<'_>> {
    let stored: std::collections::HashSet<&str> =
        messages.iter().map(|m| m.slack_ts.as_str()).collect();

    let mut threads: Vec<Thread<'_>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut replies: Vec<(&str, String)> = Vec::new();

    for message in messages {
        match thread_ts(message) {
            Some(parent) if parent != message.slack_ts && stored.contains(parent) => {
                replies.push((parent, message.text().unwrap_or_default().to_string()));
            }
            _ => {
                index.insert(message.slack_ts.as_str(), threads.len());
                threads.push(Thread {
                    parent: message,
                    replies: Vec::new(),
                });
            }
        }
    }

    for (parent, text) in replies {
        if let Some(&i) = index.get(parent) {
            threads[i].replies.push(text);
        }
    }
    threads
}

fn heuristic_classification(text: &str) -> Classification {
    let urgency = classify_urgency(text);
    let impact = classify_impact(text);
    Classification {
        urgency: Some(urgency),
        impact: Some(impact),
        incident_type: Some(determine_incident_level(urgency, impact)),
        auto_classified: true,
        urgency_manual: false,
        impact_manual: false,
    }
}

async fn classify_one(
    classifier: &IncidentClassifier,
    heuristic: bool,
    text: &str,
    replies: &[String],
) -> Result<Classification, AlertdeskError> {
    if heuristic {
        let mut combined = text.to_string();
        for reply in replies {
            combined.push(' ');
            combined.push_str(reply);
        }
        Ok(heuristic_classification(&combined))
    } else {
        classifier.classify(text, replies).await
    }
}

fn render(label: &str, text: &str, classification: &Classification, json: bool) -> String {
    if json {
        return serde_json::json!({
            "ts": label,
            "text": text,
            "classification": classification,
        })
        .to_string();
    }
    let show = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    let excerpt: String = text
        .chars()
        .take(EXCERPT_CHARS)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    format!(
        "{label}  urgency={:<6} impact={:<6} type={:<3}  {excerpt}",
        show(classification.urgency.map(|l| l.to_string())),
        show(classification.impact.map(|l| l.to_string())),
        show(classification.incident_type.map(|t| t.to_string())),
    )
}

pub async fn run_classify(
    storage: Arc<dyn StorageAdapter>,
    args: &ClassifyArgs,
) -> Result<(), AlertdeskError> {
    let classifier = IncidentClassifier::new(storage.clone());

    let Some(key) = &args.channel else {
        let text = args.text.join(" ");
        let classification = classify_one(&classifier, args.heuristic, &text, &[]).await?;
        println!("{}", render("-", &text, &classification, args.json));
        return Ok(());
    };

    let channel = crate::admin::resolve_channel(storage.as_ref(), key).await?;
    let messages = storage.list_raw_messages(&channel.id, None).await?;
    let threads = group_threads(&messages);
    let limit = args.limit.unwrap_or(threads.len());

    for thread in threads.iter().take(limit) {
        let text = thread.parent.text().unwrap_or_default();
        let classification =
            classify_one(&classifier, args.heuristic, text, &thread.replies).await?;
        println!(
            "{}",
            render(&thread.parent.slack_ts, text, &classification, args.json)
        );
    }
    Ok(())
}
