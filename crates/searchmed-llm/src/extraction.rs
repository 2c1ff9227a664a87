//! Slot-filling extraction from LLM output.
//!
//! A [`SlotSchema`] describes the fields the model must fill from the
//! user's message. The raw model text is repaired before structural
//! parsing, because inference output is not guaranteed to be well-formed
//! JSON.

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::client::{LlmClient, LlmError};
use crate::prompts;

/// Extraction errors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("invalid response format: {0}")]
    InvalidFormat(String),

    #[error("LLM inference error: {0}")]
    Inference(#[from] LlmError),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// One field of a slot schema: JSON key plus the description shown to the
/// model.
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
}

/// A parameter schema the model fills from free text.
///
/// All fields are optional on the wire; anything the user did not mention
/// must deserialize to `None`, never to an empty default.
pub trait SlotSchema: DeserializeOwned {
    /// Human-readable schema name, used in the format instructions.
    fn schema_name() -> &'static str;

    /// Static field layout of the schema.
    fn fields() -> &'static [FieldSpec];

    /// Format instructions describing the schema's field layout.
    fn format_instructions() -> String {
        let mut out = format!(
            "Completa el esquema \"{}\" y responde únicamente con un objeto JSON.\n\
             Propiedades (todas opcionales; omite las que el usuario no mencione):\n",
            Self::schema_name()
        );
        for field in Self::fields() {
            out.push_str(&format!("- \"{}\": {}\n", field.name, field.description));
        }
        out.push_str("No añadas texto fuera del objeto JSON.");
        out
    }
}

/// Repair raw model output into parseable JSON.
///
/// Handles the malformations a small instruct model actually produces:
/// missing surrounding braces (including a bare `clave": "valor"` fragment
/// that also lost the key's opening quote), escaped underscores/brackets
/// leaking from markdown-trained models, and embedded newlines.
pub fn repair_output(raw: &str) -> String {
    let mut text = raw
        .replace("\\_", "_")
        .replace("\\[", "[")
        .replace("\\]", "]")
        .replace('\n', " ")
        .trim()
        .to_string();

    if !text.contains('{') {
        if !text.starts_with('"') && text.contains("\":") {
            text.insert(0, '"');
        }
        text.insert(0, '{');
    }
    if !text.contains('}') {
        text.push('}');
    }
    text
}

/// Slice the outermost JSON object out of repaired text, dropping any
/// prose the model wrapped around it.
fn json_slice(text: &str) -> ExtractionResult<&str> {
    let start = text
        .find('{')
        .ok_or_else(|| ExtractionError::InvalidFormat("no JSON object found in response".into()))?;
    let end = text
        .rfind('}')
        .ok_or_else(|| ExtractionError::InvalidFormat("no closing brace found in response".into()))?;
    if end < start {
        return Err(ExtractionError::InvalidFormat(
            "closing brace precedes opening brace".into(),
        ));
    }
    Ok(&text[start..=end])
}

/// Fill `S` from the user's message with one inference call.
///
/// Fields the message does not evidence stay unset on the result. Parse
/// failures after repair surface as errors; the caller owns any retry or
/// abort decision.
pub fn extract_slots<S: SlotSchema>(llm: &dyn LlmClient, user_message: &str) -> ExtractionResult<S> {
    let prompt = prompts::make_extraction_prompt(&S::format_instructions(), user_message);
    let raw = llm.infer(&prompt)?;
    tracing::debug!(
        schema = S::schema_name(),
        chars = raw.len(),
        "extraction output received"
    );

    let repaired = repair_output(&raw);
    let filled = serde_json::from_str(json_slice(&repaired)?)?;
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockLlmClient;
    use proptest::prelude::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct LookupParams {
        cn: Option<String>,
        nregistro: Option<String>,
    }

    impl SlotSchema for LookupParams {
        fn schema_name() -> &'static str {
            "busqueda de medicamento"
        }

        fn fields() -> &'static [FieldSpec] {
            &[
                FieldSpec {
                    name: "cn",
                    description: "Código nacional",
                },
                FieldSpec {
                    name: "nregistro",
                    description: "Nº de registro",
                },
            ]
        }
    }

    #[test]
    fn test_repair_wraps_missing_braces() {
        assert_eq!(repair_output("\"cn\": \"726684\""), "{\"cn\": \"726684\"}");
    }

    #[test]
    fn test_repair_restores_bare_key_quote() {
        // Missing leading brace took the key's opening quote with it
        assert_eq!(repair_output("cn\": \"726684\""), "{\"cn\": \"726684\"}");
    }

    #[test]
    fn test_repair_unescapes_artifacts() {
        let repaired = repair_output("{\"forma\\_farmaceutica\": \\[\"comprimido\"\\]}");
        assert_eq!(repaired, "{\"forma_farmaceutica\": [\"comprimido\"]}");
    }

    #[test]
    fn test_repair_collapses_newlines() {
        let repaired = repair_output("{\"cn\":\n\"726684\"}");
        assert_eq!(repaired, "{\"cn\": \"726684\"}");
    }

    #[test]
    fn test_repair_leaves_wellformed_output_alone() {
        assert_eq!(repair_output("{\"cn\": \"726684\"}"), "{\"cn\": \"726684\"}");
    }

    #[test]
    fn test_extract_populates_only_evidenced_fields() {
        let llm = MockLlmClient::new("{\"cn\": \"726684\"}");
        let params: LookupParams = extract_slots(&llm, "código nacional 726684").unwrap();
        assert_eq!(params.cn.as_deref(), Some("726684"));
        assert_eq!(params.nregistro, None);
    }

    #[test]
    fn test_extract_repairs_missing_braces() {
        let llm = MockLlmClient::new("\"cn\": \"726684\"");
        let params: LookupParams = extract_slots(&llm, "código nacional 726684").unwrap();
        assert_eq!(params.cn.as_deref(), Some("726684"));
    }

    #[test]
    fn test_extract_repairs_bare_key_fragment() {
        let llm = MockLlmClient::new("cn\": \"726684\"");
        let params: LookupParams = extract_slots(&llm, "código nacional 726684").unwrap();
        assert_eq!(params.cn.as_deref(), Some("726684"));
        assert_eq!(params.nregistro, None);
    }

    #[test]
    fn test_extract_ignores_surrounding_prose() {
        let llm = MockLlmClient::new("Aquí está el esquema:\n{\"nregistro\": \"51347\"}\nEspero que ayude.");
        let params: LookupParams = extract_slots(&llm, "registro 51347").unwrap();
        assert_eq!(params.nregistro.as_deref(), Some("51347"));
    }

    #[test]
    fn test_extract_null_fields_stay_unset() {
        let llm = MockLlmClient::new("{\"cn\": null, \"nregistro\": \"51347\"}");
        let params: LookupParams = extract_slots(&llm, "registro 51347").unwrap();
        assert_eq!(params.cn, None);
        assert_eq!(params.nregistro.as_deref(), Some("51347"));
    }

    #[test]
    fn test_extract_surfaces_unparseable_output() {
        let llm = MockLlmClient::new("no tengo ni idea");
        let result: ExtractionResult<LookupParams> = extract_slots(&llm, "consulta");
        assert!(matches!(result, Err(ExtractionError::JsonParse(_))));
    }

    #[test]
    fn test_extract_surfaces_inference_failure() {
        let llm = MockLlmClient::unreachable("connection refused");
        let result: ExtractionResult<LookupParams> = extract_slots(&llm, "consulta");
        assert!(matches!(result, Err(ExtractionError::Inference(_))));
    }

    #[test]
    fn test_format_instructions_list_all_fields() {
        let instructions = LookupParams::format_instructions();
        assert!(instructions.contains("busqueda de medicamento"));
        assert!(instructions.contains("- \"cn\": Código nacional"));
        assert!(instructions.contains("- \"nregistro\": Nº de registro"));
    }

    proptest! {
        // Any braceless key/value fragment must repair into parseable JSON
        // holding exactly that entry.
        #[test]
        fn prop_braceless_fragment_repairs_to_valid_json(
            key in "[a-z][a-z0-9]{0,11}",
            value in "[a-zA-Z0-9 ]{0,20}",
        ) {
            let fragment = format!("\"{key}\": \"{value}\"");
            let repaired = repair_output(&fragment);
            let parsed: serde_json::Value = serde_json::from_str(&repaired).unwrap();
            prop_assert_eq!(parsed[&key].as_str().unwrap(), value.as_str());
        }

        // Repair is idempotent on anything it has already repaired.
        #[test]
        fn prop_repair_is_idempotent_on_repaired_output(
            key in "[a-z][a-z0-9]{0,11}",
            value in "[a-zA-Z0-9 ]{0,20}",
        ) {
            let repaired = repair_output(&format!("\"{key}\": \"{value}\""));
            prop_assert_eq!(repair_output(&repaired), repaired.clone());
        }
    }
}
