//! Typed parsing of the triage reply.
//!
//! The model is instructed to emit a fenced JSON block followed by a
//! free-text reply. Parsing is strict about the contract and explicit
//! about the fallback: a reply that fails to parse still reaches the
//! patient as plain advice, with no specialty recommendation.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Urgency classes the triage prompt allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Routine,
    Soon,
    Emergency,
}

impl FromStr for Urgency {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "routine" => Ok(Self::Routine),
            "soon" => Ok(Self::Soon),
            "emergency" => Ok(Self::Emergency),
            _ => Err(()),
        }
    }
}

/// Structured triage result, whether parsed or fallback.
#[derive(Debug, Clone, Serialize)]
pub struct Triage {
    /// Specialty to recommend doctors from. `None` when the reply
    /// failed to parse and no recommendation can be made.
    pub specialty: Option<String>,
    pub urgency: Urgency,
    pub advice: String,
    /// Free-text reply for the patient (text after the JSON block,
    /// or the whole reply on fallback).
    pub reply: String,
}

#[derive(Deserialize)]
struct RawTriage {
    specialty: Option<String>,
    urgency: Option<String>,
    advice: Option<String>,
}

/// Parse the model's reply. Never fails: an unparseable reply becomes
/// a routine-urgency fallback carrying the raw text.
pub fn parse_triage_response(response: &str) -> Triage {
    match try_parse(response) {
        Some(triage) => triage,
        None => {
            tracing::warn!("Triage reply did not match the JSON contract, using fallback");
            Triage {
                specialty: None,
                urgency: Urgency::Routine,
                advice: String::new(),
                reply: response.trim().to_string(),
            }
        }
    }
}

fn try_parse(response: &str) -> Option<Triage> {
    let (json_str, rest) = extract_fenced_json(response)?;
    let raw: RawTriage = serde_json::from_str(&json_str).ok()?;

    let urgency = raw
        .urgency
        .as_deref()
        .and_then(|u| Urgency::from_str(u).ok())
        .unwrap_or(Urgency::Routine);

    let specialty = raw
        .specialty
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let advice = raw.advice.unwrap_or_default();
    let reply = if rest.is_empty() { advice.clone() } else { rest };

    Some(Triage {
        specialty,
        urgency,
        advice,
        reply,
    })
}

/// Extract the ```json fenced block and the trailing free text.
fn extract_fenced_json(response: &str) -> Option<(String, String)> {
    let json_start = response.find("```json")?;
    let content_start = json_start + 7;
    let json_end = response[content_start..].find("```")?;

    let json_str = response[content_start..content_start + json_end].trim().to_string();

    let rest_start = content_start + json_end + 3;
    let rest = response.get(rest_start..).unwrap_or("").trim().to_string();

    Some((json_str, rest))
}
