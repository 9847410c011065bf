use serde_json::{json, Map, Value};

use super::types::conversation::{ConversationMeta, ConversationTurn, Speaker};
use crate::errors::ContractViolation;

/// Convert the transcript to the `conv_hist` list: one `{speaker: text}`
/// object per turn, in transcript order.
pub fn transcript_to_conv_hist(turns: &[ConversationTurn]) -> Vec<Value> {
    turns
        .iter()
        .map(|turn| {
            let mut entry = Map::new();
            entry.insert(turn.speaker.to_string(), json!(turn.text));
            Value::Object(entry)
        })
        .collect()
}

/// Text of the most recent customer turn, or `""` when the customer has not
/// spoken yet.
pub fn customer_last_response(turns: &[ConversationTurn]) -> &str {
    turns
        .iter()
        .rev()
        .find(|turn| turn.speaker == Speaker::Customer)
        .map(|turn| turn.text.as_str())
        .unwrap_or_default()
}

pub fn meta_to_json(meta: &ConversationMeta) -> Value {
    json!({
        "customer_information_collected": {
            "name": meta.customer_name,
            "zip_code": meta.zip_code,
        },
        "utility_company": meta.utility_company,
        "list_of_available_internet_providers": meta.available_providers,
        "agent_name": meta.agent_name,
    })
}

/// The `inputs` object the chat sequence reads.
pub fn sequence_inputs(turns: &[ConversationTurn], meta: &ConversationMeta) -> Value {
    json!({
        "meta": meta_to_json(meta),
        "conv_hist": transcript_to_conv_hist(turns),
        "customer_last_response": customer_last_response(turns),
    })
}

/// Request body for the execute endpoint. The sequence expects `inputs` as a
/// JSON document encoded into a string, not as a nested object.
pub fn build_sequence_payload(
    turns: &[ConversationTurn],
    meta: &ConversationMeta,
) -> Result<Value, serde_json::Error> {
    let inputs = serde_json::to_string(&sequence_inputs(turns, meta))?;
    Ok(json!({
        "data": [
            { "inputs": inputs }
        ]
    }))
}

/// Pull the reply text out of `preds.answer.answer`.
pub fn extract_answer(preds: &Value) -> Result<String, ContractViolation> {
    preds
        .get("answer")
        .and_then(|answer| answer.get("answer"))
        .and_then(|answer| answer.as_str())
        .map(str::to_string)
        .ok_or_else(|| ContractViolation {
            preds: preds.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn meta() -> ConversationMeta {
        ConversationMeta {
            customer_name: "Mary".to_string(),
            zip_code: "21560".to_string(),
            utility_company: "Acme Power".to_string(),
            available_providers: vec!["AT&T".to_string(), "Verizon".to_string()],
            agent_name: "Tom".to_string(),
        }
    }

    fn transcript() -> Vec<ConversationTurn> {
        vec![
            ConversationTurn::agent("hi"),
            ConversationTurn::customer("need help"),
            ConversationTurn::agent("ok"),
            ConversationTurn::customer("thanks"),
        ]
    }

    #[test]
    fn test_conv_hist_preserves_length_and_order() {
        let turns = transcript();
        let conv_hist = transcript_to_conv_hist(&turns);

        assert_eq!(conv_hist.len(), turns.len());
        assert_eq!(conv_hist[0], json!({"agent": "hi"}));
        assert_eq!(conv_hist[1], json!({"customer": "need help"}));
        assert_eq!(conv_hist[2], json!({"agent": "ok"}));
        assert_eq!(conv_hist[3], json!({"customer": "thanks"}));
    }

    #[test]
    fn test_conv_hist_keeps_consecutive_turns_from_same_speaker() {
        let turns = vec![
            ConversationTurn::customer("hello"),
            ConversationTurn::customer("anyone there?"),
        ];
        let conv_hist = transcript_to_conv_hist(&turns);
        assert_eq!(
            conv_hist,
            vec![json!({"customer": "hello"}), json!({"customer": "anyone there?"})]
        );
    }

    #[test]
    fn test_customer_last_response() {
        assert_eq!(customer_last_response(&transcript()), "thanks");

        let agent_only = vec![ConversationTurn::agent("hello, how can I help?")];
        assert_eq!(customer_last_response(&agent_only), "");
        assert_eq!(customer_last_response(&[]), "");
    }

    #[test]
    fn test_customer_last_response_skips_trailing_agent_turns() {
        let turns = vec![
            ConversationTurn::customer("first"),
            ConversationTurn::customer("second"),
            ConversationTurn::agent("noted"),
        ];
        assert_eq!(customer_last_response(&turns), "second");
    }

    #[test]
    fn test_build_sequence_payload_encodes_inputs_as_string() -> Result<()> {
        let payload = build_sequence_payload(&transcript(), &meta())?;

        let data = payload["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);

        let encoded = data[0]["inputs"].as_str().expect("inputs string");
        let inputs: Value = serde_json::from_str(encoded)?;

        assert_eq!(inputs["customer_last_response"], "thanks");
        assert_eq!(inputs["conv_hist"].as_array().map(Vec::len), Some(4));
        assert_eq!(
            inputs["meta"],
            json!({
                "customer_information_collected": {"name": "Mary", "zip_code": "21560"},
                "utility_company": "Acme Power",
                "list_of_available_internet_providers": ["AT&T", "Verizon"],
                "agent_name": "Tom"
            })
        );
        Ok(())
    }

    #[test]
    fn test_extract_answer() -> Result<()> {
        let preds = json!({"answer": {"answer": "Hello!"}});
        assert_eq!(extract_answer(&preds)?, "Hello!");
        Ok(())
    }

    #[test]
    fn test_extract_answer_contract_violation() {
        for preds in [
            json!({}),
            json!({"answer": "Hello!"}),
            json!({"answer": {"answer": 42}}),
            json!(null),
        ] {
            let err = extract_answer(&preds).unwrap_err();
            assert_eq!(err.preds, preds);
        }
    }
}
