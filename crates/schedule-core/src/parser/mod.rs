//! Text/Image Parser
//!
//! Turns free text or an image into a `ParsedDraft`. Parsers are
//! collaborators: the service decides what to do when one fails.

mod gemini;
mod response;

use async_trait::async_trait;

use crate::domain::ParsedDraft;
use crate::error::{ParserError, ParserResult};

pub use gemini::{GeminiConfig, GeminiParser};
pub use response::{parse_date, parse_model_output, strip_code_fence};

#[async_trait(?Send)]
pub trait ScheduleParser {
    async fn parse_text(&self, text: &str) -> ParserResult<ParsedDraft>;

    async fn parse_image(&self, bytes: &[u8], mime: &str) -> ParserResult<ParsedDraft>;

    /// Whether `parse_image` can succeed at all
    fn supports_images(&self) -> bool {
        true
    }
}

/// Used when no AI backend is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralParser;

#[async_trait(?Send)]
impl ScheduleParser for LiteralParser {
    async fn parse_text(&self, text: &str) -> ParserResult<ParsedDraft> {
        Ok(ParsedDraft::literal(text))
    }

    async fn parse_image(&self, _bytes: &[u8], _mime: &str) -> ParserResult<ParsedDraft> {
        Err(ParserError::Unavailable("image parsing needs a Gemini API key".to_string()))
    }

    fn supports_images(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_literal_parser() {
        let parser = LiteralParser;
        let draft = parser.parse_text("牛乳を買う").await.unwrap();
        assert_eq!(draft.title, "牛乳を買う");
        assert!(draft.scheduled_date.is_none());
        assert!(matches!(
            parser.parse_image(&[0u8; 4], "image/png").await,
            Err(ParserError::Unavailable(_))
        ));
        assert!(!parser.supports_images());
    }
}
