use std::sync::Arc;

use generative::{strip_code_fence, Completer, CompletionRequest};
use semantic::resilience::{CallGate, GateError};
use serde_json::Value as JsonValue;
use taxonomy::DomainSubset;
use tracing::{debug, warn};

use crate::assemble::rank_candidates;
use crate::tier1::char_prefix;
use crate::types::{ClassificationCandidate, Tier2Outcome, Tier2Status};

/// Keys under which an object reply may carry its category list.
const CATEGORY_KEYS: [&str; 2] = ["categories", "tier2_categories"];

/// Reply shape accepted from the provider once fences are stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub items: Vec<JsonValue>,
    pub profile: Option<JsonValue>,
}

/// Asks the completion provider to choose among one domain's entries, then
/// maps the answer back onto the catalog.
pub struct Tier2Classifier {
    completer: Arc<dyn Completer>,
    gate: CallGate,
    text_chars: usize,
    temperature: f32,
    max_tokens: u32,
    default_confidence: f32,
    request_profile: bool,
}

impl Tier2Classifier {
    pub fn new(completer: Arc<dyn Completer>, gate: CallGate) -> Self {
        Self {
            completer,
            gate,
            text_chars: 2000,
            temperature: 0.1,
            max_tokens: 1000,
            default_confidence: 0.75,
            request_profile: false,
        }
    }

    pub fn with_text_chars(mut self, chars: usize) -> Self {
        self.text_chars = chars;
        self
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_default_confidence(mut self, confidence: f32) -> Self {
        self.default_confidence = confidence;
        self
    }

    /// Also ask for a `user_profile` object in the same reply.
    pub fn with_profile_request(mut self, enabled: bool) -> Self {
        self.request_profile = enabled;
        self
    }

    pub async fn classify(
        &self,
        text: &str,
        domain: &str,
        subset: &DomainSubset<'_>,
        max_results: usize,
    ) -> Tier2Outcome {
        if subset.is_empty() {
            debug!(domain, "tier2_skipped_empty_subset");
            return Tier2Outcome::empty(Tier2Status::Skipped);
        }

        let request = CompletionRequest::new(
            build_system_prompt(domain, subset, max_results, self.request_profile),
            format!(
                "Analyze and classify this content:\n\n{}",
                char_prefix(text, self.text_chars)
            ),
        )
        .with_temperature(self.temperature)
        .with_max_tokens(self.max_tokens);

        let raw = match self.gate.run(self.completer.complete(&request)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!(domain, error = %e, "tier2_provider_failed");
                return Tier2Outcome::empty(Tier2Status::ProviderFailed);
            }
            Err(GateError::TimedOut(after)) => {
                warn!(domain, timeout_ms = after.as_millis() as u64, "tier2_timed_out");
                return Tier2Outcome::empty(Tier2Status::TimedOut);
            }
            Err(e @ GateError::Closed) => {
                warn!(domain, error = %e, "tier2_provider_failed");
                return Tier2Outcome::empty(Tier2Status::ProviderFailed);
            }
        };

        let Some(reply) = parse_reply(&raw) else {
            warn!(domain, reply_chars = raw.chars().count(), "tier2_parse_failed");
            return Tier2Outcome::empty(Tier2Status::ParseFailed);
        };

        let reconciled = reconcile(&reply.items, subset, self.default_confidence);
        let candidates = rank_candidates(&reconciled, max_results);
        let status = if candidates.is_empty() {
            Tier2Status::NoneResolved
        } else {
            Tier2Status::Resolved
        };
        debug!(
            domain,
            returned = reply.items.len(),
            resolved = candidates.len(),
            "tier2_reconciled"
        );
        Tier2Outcome {
            status,
            candidates,
            profile_hints: reply.profile.filter(|_| self.request_profile),
        }
    }
}

/// System prompt restricting choices to `subset`.
pub fn build_system_prompt(
    domain: &str,
    subset: &DomainSubset<'_>,
    max_results: usize,
    with_profile: bool,
) -> String {
    let listing = subset.prompt_lines();
    let item = r#"{"id": "category_id", "name": "category_name", "confidence": 0.9, "reasoning": "why this category fits"}"#;
    let format = if with_profile {
        format!(
            "Respond with a single JSON object and nothing else:\n\
             {{\"categories\": [{item}], \"user_profile\": {{\"age_range\": \"25-34\", \
             \"interests\": [\"interest\"], \"geekiness_level\": 5, \"sophistication\": \
             \"basic|intermediate|advanced\", \"behavioral_patterns\": [\"pattern\"], \
             \"confidence\": 0.8}}}}"
        )
    } else {
        format!("Respond with a JSON array and nothing else:\n[{item}]")
    };

    format!(
        "You classify content into the \"{domain}\" section of a content taxonomy.\n\n\
         Available categories, one per line as id:name:\n{listing}\n\n\
         Rules:\n\
         1. Select at most {max_results} categories, only from the list above.\n\
         2. Copy id and name exactly as listed.\n\
         3. Give each a confidence between 0.0 and 1.0.\n\n\
         {format}"
    )
}

/// Strip fences and decode. `None` when the reply is not JSON or carries no
/// category list.
pub fn parse_reply(raw: &str) -> Option<ParsedReply> {
    let value: JsonValue = serde_json::from_str(strip_code_fence(raw)).ok()?;
    match value {
        JsonValue::Array(items) => Some(ParsedReply {
            items,
            profile: None,
        }),
        JsonValue::Object(mut map) => {
            let items = CATEGORY_KEYS
                .iter()
                .find_map(|key| match map.remove(*key) {
                    Some(JsonValue::Array(items)) => Some(items),
                    _ => None,
                })?;
            let profile = map.remove("user_profile").filter(JsonValue::is_object);
            Some(ParsedReply { items, profile })
        }
        _ => None,
    }
}

/// Map provider items onto canonical subset entries.
///
/// Name resolution comes first, then an exact id lookup. Items resolving to
/// nothing are dropped. Every returned id belongs to `subset`.
pub fn reconcile(
    items: &[JsonValue],
    subset: &DomainSubset<'_>,
    default_confidence: f32,
) -> Vec<ClassificationCandidate> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let Some(fields) = item.as_object() else {
            debug!(item = %item, "tier2_item_not_an_object");
            continue;
        };
        let name = fields.get("name").and_then(JsonValue::as_str);
        let id = fields.get("id").and_then(id_string);

        let entry = name
            .and_then(|n| subset.find_by_name(n))
            .or_else(|| id.as_deref().and_then(|i| subset.get(i)));
        let Some(entry) = entry else {
            debug!(
                name = name.unwrap_or_default(),
                id = id.as_deref().unwrap_or_default(),
                "tier2_item_unresolved"
            );
            continue;
        };

        let confidence = fields
            .get("confidence")
            .and_then(JsonValue::as_f64)
            .map(|c| c as f32)
            .filter(|c| (0.0..=1.0).contains(c))
            .unwrap_or(default_confidence);
        let reasoning = fields
            .get("reasoning")
            .and_then(JsonValue::as_str)
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        out.push(ClassificationCandidate::from_entry(entry, confidence, reasoning));
    }
    out
}

fn id_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
