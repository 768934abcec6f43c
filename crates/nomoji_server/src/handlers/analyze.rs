//! Emoji analysis over submitted text.

use crate::analytics::AnalyticsEvent;
use crate::error::{ApiJson, ApiResponse, HttpError};
use crate::AppState;
use axum::{extract::State, Json};
use nomoji_core::emoji;
use serde::{Deserialize, Serialize};

const EMOJI_VIOLATION: &str = "Text contains emojis";

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub count: usize,
    pub unique: Vec<String>,
    pub has_emojis: bool,
    pub clean_text: String,
    pub violations: Vec<String>,
}

/// Length in UTF-16 code units, matching what browser clients report.
fn text_length(text: &str) -> usize {
    text.encode_utf16().count()
}

pub async fn analyze_text(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AnalyzeRequest>,
) -> Result<Json<ApiResponse<AnalyzeResponse>>, HttpError> {
    let analysis = emoji::analyze(&request.text);
    state.analytics.track(AnalyticsEvent::Analysis {
        has_emojis: analysis.has_emojis,
        emoji_count: analysis.count,
        text_length: text_length(&request.text),
    });

    let violations = if analysis.has_emojis {
        vec![EMOJI_VIOLATION.to_string()]
    } else {
        Vec::new()
    };
    Ok(Json(ApiResponse::data(AnalyzeResponse {
        count: analysis.count,
        unique: analysis.unique,
        has_emojis: analysis.has_emojis,
        clean_text: analysis.clean_text,
        violations,
    })))
}

#[cfg(test)]
mod tests {
    use super::text_length;

    #[test]
    fn text_length_counts_utf16_code_units() {
        assert_eq!(text_length(""), 0);
        assert_eq!(text_length("plain"), 5);
        assert_eq!(text_length("Hi \u{1F44B}"), 5);
        assert_eq!(text_length("caf\u{E9}"), 4);
        assert_eq!(text_length("\u{1F468}\u{200D}\u{1F4BB}"), 5);
    }
}
