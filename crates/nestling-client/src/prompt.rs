//! Builds chat messages for an analysis request.
//!
//! The model and wording are a black box to the access layer; this only has to
//! be deterministic so identical requests produce identical wire bodies.

use nestling_types::{AnalysisError, AnalysisRequest};

use crate::messages::ChatMessage;

const SYSTEM_PROMPT: &str = "You are a careful pediatric care assistant. You analyse infant care \
records (sleep, feeding, activity, growth) and give practical, non-diagnostic observations. \
Recommend consulting a pediatrician for any health concern.";

pub fn build_messages(request: &AnalysisRequest) -> Result<Vec<ChatMessage>, AnalysisError> {
    let records = serde_json::to_string(&request.payload)
        .map_err(|e| AnalysisError::Unknown { message: format!("payload serialize: {}", e) })?;

    let user = format!(
        "Analysis type: {}\nFocus on: {}\nSubject: {}\nRecords (JSON):\n{}",
        request.kind,
        request.kind.focus(),
        request.subject_id,
        records
    );

    Ok(vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestling_types::{AnalysisKind, AnalysisPayload};

    #[test]
    fn test_messages_mention_kind_and_subject() {
        let request = AnalysisRequest {
            kind: AnalysisKind::FeedingPattern,
            subject_id: "anon-42".to_string(),
            anonymize: true,
            payload: AnalysisPayload::default(),
        };
        let messages = build_messages(&request).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[1].content.contains("feeding_pattern"));
        assert!(messages[1].content.contains("anon-42"));
    }
}
