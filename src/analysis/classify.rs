use super::transport::TransportResponse;
use super::wire::GenerateContentResponse;

pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// What a single attempt produced, in decision priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    RateLimited,
    NetworkError { reason: String },
    SafetyBlocked,
    EmptyResponse { raw: String },
    Success { text: String },
}

pub fn classify(response: &TransportResponse) -> Outcome {
    if response.status == STATUS_TOO_MANY_REQUESTS {
        return Outcome::RateLimited;
    }
    if !(200..300).contains(&response.status) {
        return Outcome::NetworkError {
            reason: format!("HTTP status {}", response.status),
        };
    }

    let decoded: GenerateContentResponse = match serde_json::from_str(&response.body) {
        Ok(decoded) => decoded,
        Err(err) => {
            return Outcome::NetworkError {
                reason: format!("undecodable response body: {err}"),
            }
        }
    };

    if decoded.is_safety_blocked() {
        return Outcome::SafetyBlocked;
    }
    match decoded.diagnostic_text() {
        Some(text) => Outcome::Success {
            text: text.to_string(),
        },
        None => Outcome::EmptyResponse {
            raw: response.body.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(body: &str) -> TransportResponse {
        TransportResponse::new(200, body)
    }

    #[test]
    fn too_many_requests_is_rate_limited_regardless_of_body() {
        assert_eq!(
            classify(&TransportResponse::new(429, "{\"error\":{}}")),
            Outcome::RateLimited
        );
    }

    #[test]
    fn other_error_statuses_are_network_errors() {
        for status in [400, 401, 404, 500, 503] {
            assert!(matches!(
                classify(&TransportResponse::new(status, "")),
                Outcome::NetworkError { .. }
            ));
        }
    }

    #[test]
    fn safety_finish_reason_wins_over_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"partial"}]},"finishReason":"SAFETY"}]}"#;
        assert_eq!(classify(&ok(body)), Outcome::SafetyBlocked);
        assert_eq!(
            classify(&ok(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#)),
            Outcome::SafetyBlocked
        );
    }

    #[test]
    fn missing_text_is_empty_response_carrying_raw_body() {
        let body = r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#;
        assert_eq!(
            classify(&ok(body)),
            Outcome::EmptyResponse {
                raw: body.to_string()
            }
        );
    }

    #[test]
    fn text_is_success() {
        let body = r###"{"candidates":[{"content":{"parts":[{"text":"## Diagnosis\nHealthy"}]},"finishReason":"STOP"}]}"###;
        assert_eq!(
            classify(&ok(body)),
            Outcome::Success {
                text: "## Diagnosis\nHealthy".to_string()
            }
        );
    }

    #[test]
    fn undecodable_success_body_is_network_error() {
        assert!(matches!(
            classify(&ok("<html>gateway</html>")),
            Outcome::NetworkError { .. }
        ));
    }
}
