//! 错误分类器
//!
//! 把生成后端的原始错误文本归类为面向用户的固定话术。
//! 匹配基于枚举出的标记表而非散落的子串判断；提供商若暴露结构化错误码，
//! 应替换这里的文本匹配（已知的继承性脆弱点，见 DESIGN.md）。

use serde::Serialize;

/// 面向用户的错误类别
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    QuotaExceeded,
    ApiKeyError,
    GeneralError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::ApiKeyError => "api_key_error",
            ErrorKind::GeneralError => "general_error",
        }
    }
}

/// general_error 话术中嵌入的原始错误上限（字符数）
const RAW_ERROR_PREVIEW_CHARS: usize = 100;

/// 标记表：每个类别固定一组大小写不敏感的标记，按表序先命中先生效
const MATCHERS: &[(ErrorKind, &[&str])] = &[
    (
        ErrorKind::QuotaExceeded,
        &["429", "resource_exhausted", "quota"],
    ),
    (
        ErrorKind::ApiKeyError,
        &["api key", "invalid_argument", "permission_denied", "unauthenticated"],
    ),
];

/// 分类：纯函数，永不失败，返回 (类别, 用户可见文本)
pub fn classify(raw: &str) -> (ErrorKind, String) {
    let lowered = raw.to_lowercase();
    let kind = MATCHERS
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| lowered.contains(m)))
        .map(|(kind, _)| *kind)
        .unwrap_or(ErrorKind::GeneralError);
    (kind, user_message(kind, raw))
}

/// 各类别的固定话术（与既有前端行为保持一致，不可改动措辞）
fn user_message(kind: ErrorKind, raw: &str) -> String {
    match kind {
        ErrorKind::QuotaExceeded => "⚠️ I've reached my daily API limit. Please try again later or contact support to upgrade the service for unlimited access. The quota resets in about 24 hours.".to_string(),
        ErrorKind::ApiKeyError => "🔑 There's an issue with the API configuration. Please contact support to resolve this.".to_string(),
        ErrorKind::GeneralError => {
            let preview: String = raw.chars().take(RAW_ERROR_PREVIEW_CHARS).collect();
            format!("😔 I encountered an error: {preview}. Please try again or contact support if the issue persists.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_quota_markers() {
        let (kind, text) = classify("HTTP 429: too many requests");
        assert_eq!(kind, ErrorKind::QuotaExceeded);
        assert!(text.contains("daily API limit"));

        assert_eq!(classify("RESOURCE_EXHAUSTED").0, ErrorKind::QuotaExceeded);
        assert_eq!(
            classify("Daily Quota has been used up").0,
            ErrorKind::QuotaExceeded
        );
    }

    #[test]
    fn test_classify_api_key_markers() {
        assert_eq!(
            classify("400: INVALID_ARGUMENT, check request").0,
            ErrorKind::ApiKeyError
        );
        assert_eq!(classify("API Key not valid").0, ErrorKind::ApiKeyError);
        assert_eq!(classify("UNAUTHENTICATED").0, ErrorKind::ApiKeyError);
    }

    #[test]
    fn test_classify_general_fallback() {
        let (kind, text) = classify("connection reset by peer");
        assert_eq!(kind, ErrorKind::GeneralError);
        assert!(text.contains("connection reset by peer"));
    }

    #[test]
    fn test_general_error_truncates_raw_text() {
        let raw = "x".repeat(500);
        let (_, text) = classify(&raw);
        assert!(text.contains(&"x".repeat(100)));
        assert!(!text.contains(&"x".repeat(101)));
    }

    #[test]
    fn test_quota_wins_over_api_key() {
        // 同时含两类标记时按表序取配额类
        let (kind, _) = classify("429: INVALID_ARGUMENT");
        assert_eq!(kind, ErrorKind::QuotaExceeded);
    }
}
