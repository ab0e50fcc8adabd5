//! Maps backend answer records to display-ready views.
//!
//! Rendering is a pure function of the record and the contract; the views are
//! plain data so any front-end can style them.

use serde::Serialize;

use crate::backend::AnswerRecord;
use crate::config::ResponseContract;

/// Backend placeholder meaning "there is no higher level".
pub const NO_NEXT_LEVEL: &str = "Does not exist";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockLabel {
    Answer,
    Context,
    CurrentBucket,
    NextBucket,
}

impl BlockLabel {
    pub fn title(&self) -> &'static str {
        match self {
            BlockLabel::Answer => "Answer",
            BlockLabel::Context => "Context",
            BlockLabel::CurrentBucket => "Current Bucket",
            BlockLabel::NextBucket => "Next Bucket",
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnswerView {
    /// One composite answer for a domain.
    Maturity {
        domain: String,
        level: String,
        next_level: Option<String>,
        answer: Vec<String>,
    },
    /// One labelled field of a bucket-style record.
    Block { label: BlockLabel, lines: Vec<String> },
}

impl AnswerView {
    /// Plain-text rendering, one entry per display line.
    pub fn display_lines(&self) -> Vec<String> {
        match self {
            AnswerView::Maturity {
                domain,
                level,
                next_level,
                answer,
            } => {
                let mut lines = vec![
                    format!("🌎 Domain: {}", domain),
                    format!("📊 Current Maturity Level: {}", level),
                ];
                if let Some(next) = next_level {
                    lines.push(format!("🔄 Next Maturity Level: {}", next));
                }
                lines.push("💡 Answer:".to_string());
                lines.extend(answer.iter().cloned());
                lines
            }
            AnswerView::Block { label, lines } => {
                let mut out = vec![format!("{}:", label.title())];
                out.extend(lines.iter().cloned());
                out
            }
        }
    }
}

/// Render one record. The record's own `shape` wins over `contract`.
pub fn render(record: &AnswerRecord, contract: ResponseContract) -> Vec<AnswerView> {
    let contract = record.shape.map(ResponseContract::from).unwrap_or(contract);

    match contract {
        ResponseContract::Maturity => vec![AnswerView::Maturity {
            domain: record.domain.clone().unwrap_or_default(),
            level: record.maturity_level.clone().unwrap_or_default(),
            next_level: next_level(record.next_maturity_level.as_deref()),
            answer: split_lines(record.response.as_deref().unwrap_or("")),
        }],
        ResponseContract::Buckets => vec![
            AnswerView::Block {
                label: BlockLabel::Answer,
                lines: json_lines(record.answer.as_ref()),
            },
            AnswerView::Block {
                label: BlockLabel::Context,
                lines: json_lines(record.context.as_ref()),
            },
            AnswerView::Block {
                label: BlockLabel::CurrentBucket,
                lines: split_lines(record.current_bucket.as_deref().unwrap_or("")),
            },
            AnswerView::Block {
                label: BlockLabel::NextBucket,
                lines: split_lines(record.next_bucket.as_deref().unwrap_or("")),
            },
        ],
    }
}

fn next_level(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != NO_NEXT_LEVEL)
        .map(str::to_string)
}

/// Split on newlines, keeping blank interior lines.
pub fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let text = text.strip_suffix('\n').unwrap_or(text);
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

fn json_lines(value: Option<&serde_json::Value>) -> Vec<String> {
    match value {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(serde_json::Value::String(s)) => split_lines(s),
        Some(other) => split_lines(
            &serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        ),
    }
}
