//! Token Kind Value Object

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Which of the two JWTs a claim set belongs to. Stored in the `kind` claim
/// so a refresh token can never be presented as an access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    #[display("access")]
    Access,
    #[display("refresh")]
    Refresh,
}

impl TokenKind {
    /// Column value in `revoked_tokens.kind`
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "access" => Some(TokenKind::Access),
            "refresh" => Some(TokenKind::Refresh),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_representation_matches_display() {
        for kind in [TokenKind::Access, TokenKind::Refresh] {
            assert_eq!(kind.to_string(), kind.as_str());
            assert_eq!(TokenKind::from_db(kind.as_str()), Some(kind));
        }
        assert_eq!(TokenKind::from_db("session"), None);
    }

    #[test]
    fn test_serde_form() {
        assert_eq!(serde_json::to_string(&TokenKind::Refresh).unwrap(), "\"refresh\"");
    }
}
