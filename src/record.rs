//! Turning the AI collaborator's reply into an [`AnalysisRecord`].
//!
//! The reply is free text that usually wraps the JSON payload in a fenced
//! code block. Extraction looks for a ```` ```json ```` fence first, then any
//! fence, then falls back to the first well-formed JSON object in the text.

use crate::error::Error;
use crate::model::AnalysisRecord;

fn fenced_block<'a>(text: &'a str, opener: &str) -> Option<&'a str> {
    let start = text.find(opener)? + opener.len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    let body = rest[..end].trim();
    (!body.is_empty()).then_some(body)
}

/// Scan from each `{` until one position yields a complete JSON object.
fn first_json_object(text: &str) -> Option<&str> {
    for (start, _) in text.match_indices('{') {
        let candidate = &text[start..];
        let mut stream =
            serde_json::Deserializer::from_str(candidate).into_iter::<serde_json::Value>();
        if let Some(Ok(serde_json::Value::Object(_))) = stream.next() {
            let end = stream.byte_offset();
            return Some(&candidate[..end]);
        }
    }
    None
}

/// Locate the JSON payload inside an AI response.
pub fn extract_json(text: &str) -> Option<&str> {
    for opener in ["```json", "```"] {
        if let Some(body) = fenced_block(text, opener)
            && let Some(obj) = first_json_object(body)
        {
            return Some(obj);
        }
    }
    first_json_object(text)
}

/// Extract and deserialize an analysis record from raw AI output.
pub fn parse_analysis(text: &str) -> Result<AnalysisRecord, Error> {
    let json = extract_json(text)
        .ok_or_else(|| Error::InvalidRecord("no JSON object found in response".into()))?;
    let record = AnalysisRecord::from_json(json)?;
    warn_out_of_range(&record);
    Ok(record)
}

impl AnalysisRecord {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::InvalidRecord(e.to_string()))
    }
}

/// Scores are rendered as given; flag values the AI should not have produced.
fn warn_out_of_range(record: &AnalysisRecord) {
    if let Some(scores) = &record.rarity_scores {
        for (label, v) in [
            ("rarity", scores.rarity),
            ("condition", scores.condition),
            ("historicalValue", scores.historical_value),
            ("overall", scores.overall),
        ] {
            if !(0.0..=10.0).contains(&v) {
                log::warn!("rarity score {label}={v} outside 0..=10, rendering as given");
            }
        }
    }
    if !(0.0..=100.0).contains(&record.confidence) {
        log::warn!("confidence {} outside 0..=100", record.confidence);
    }
}
