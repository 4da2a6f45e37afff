//! Declaration of Division extraction bridge.
//!
//! Sends the document text to the LLM with a fixed instruction and turns the
//! textual reply into a schema-checked [`ExtractedDocument`].

use tracing::{instrument, warn};

use super::llm::{LlmClient, LlmError, PromptOptions};
use crate::domain::extraction::ExtractedDocument;

/// Low temperature keeps the extraction close to deterministic
pub const EXTRACTION_TEMPERATURE: f32 = 0.3;

const SYSTEM_MESSAGE: &str = "You are an expert at extracting structured information from German \
property documents (Teilungserklärung). Extract all relevant property, building, and unit \
information and return it as JSON.";

const TARGET_SHAPE: &str = r#"{
  "property": {
    "name": "property name",
    "managementType": "WEG or MV",
    "address": {
      "street": "...",
      "houseNumber": "...",
      "postalCode": "...",
      "city": "...",
      "country": "..."
    }
  },
  "buildings": [
    {
      "address": {
        "street": "...",
        "houseNumber": "...",
        "postalCode": "...",
        "city": "...",
        "country": "..."
      },
      "additionalDetails": "..."
    }
  ],
  "units": [
    {
      "unitNumber": "...",
      "type": "Apartment/Office/Garden/Parking",
      "floor": "...",
      "entrance": "...",
      "sizeSqm": number,
      "coOwnershipShare": number (between 0 and 1),
      "constructionYear": number,
      "rooms": number,
      "buildingIndex": number (index in buildings array)
    }
  ]
}"#;

fn user_prompt(document_text: &str) -> String {
    format!(
        "Please extract the following information from this property document and return it as JSON:\n\n\
         {TARGET_SHAPE}\n\nDocument text:\n{document_text}"
    )
}

/// Extract property, buildings and units from raw document text.
#[instrument(skip(client, document_text), fields(text_len = document_text.len()))]
pub async fn extract_property_info(
    client: &LlmClient,
    document_text: &str,
) -> Result<ExtractedDocument, LlmError> {
    let options = PromptOptions {
        temperature: Some(EXTRACTION_TEMPERATURE),
        ..Default::default()
    };

    let reply = client
        .send_structured_prompt(SYSTEM_MESSAGE, &user_prompt(document_text), &options)
        .await
        .map_err(|e| LlmError::Extraction(e.to_string()))?;

    parse_extraction_reply(&reply).map_err(|reason| {
        warn!(reason = %reason, "Unusable extraction reply");
        LlmError::Extraction(reason)
    })
}

/// Inner content of the first fenced block, preferring a `json`-tagged fence.
pub fn strip_code_fence(reply: &str) -> &str {
    fenced_block(reply, "```json").or_else(|| fenced_block(reply, "```")).unwrap_or(reply)
}

fn fenced_block<'a>(text: &'a str, opening: &str) -> Option<&'a str> {
    let start = text.find(opening)? + opening.len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

/// Parse the model's reply into the extraction schema.
pub fn parse_extraction_reply(reply: &str) -> Result<ExtractedDocument, String> {
    let payload = strip_code_fence(reply).trim();
    let document: ExtractedDocument =
        serde_json::from_str(payload).map_err(|e| format!("reply is not valid extraction JSON: {e}"))?;
    document.validate().map_err(|e| e.0)?;
    Ok(document)
}
