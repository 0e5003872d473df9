use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Writable token attributes
///
/// `None` means "not supplied" and leaves the current value untouched on
/// update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenAttributes {
    pub token_type: Option<String>,
    pub value: Option<String>,
    pub secret: Option<String>,
}

/// Opaque type/value/secret triple owned by the user who created it
///
/// # Example
/// ```
/// use token_api::domain::token::{Token, TokenAttributes};
/// use uuid::Uuid;
///
/// let author = Uuid::new_v4();
/// let token = Token::new(author, TokenAttributes {
///     token_type: Some("api".to_string()),
///     ..Default::default()
/// });
/// assert!(token.is_authored_by(author));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub id: Uuid,
    pub author_id: Uuid,
    pub token_type: Option<String>,
    pub value: Option<String>,
    pub secret: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Token {
    pub fn new(author_id: Uuid, attributes: TokenAttributes) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            token_type: attributes.token_type,
            value: attributes.value,
            secret: attributes.secret,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies supplied attributes and bumps `updated_at`
    pub fn apply(&mut self, attributes: TokenAttributes) {
        if let Some(token_type) = attributes.token_type {
            self.token_type = Some(token_type);
        }
        if let Some(value) = attributes.value {
            self.value = Some(value);
        }
        if let Some(secret) = attributes.secret {
            self.secret = Some(secret);
        }
        self.updated_at = Utc::now();
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }
}

/// Actions on a single token, as seen by access checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAction {
    View,
    Update,
    Delete,
}

impl TokenAction {
    /// Whether only the token's author may perform this action
    pub fn requires_authorship(self) -> bool {
        matches!(self, TokenAction::Update | TokenAction::Delete)
    }
}

impl fmt::Display for TokenAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenAction::View => "view",
            TokenAction::Update => "update",
            TokenAction::Delete => "delete",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_keeps_unsupplied_attributes() {
        let mut token = Token::new(
            Uuid::new_v4(),
            TokenAttributes {
                token_type: Some("api".to_string()),
                value: Some("v1".to_string()),
                secret: Some("s1".to_string()),
            },
        );
        let created_at = token.created_at;

        token.apply(TokenAttributes {
            value: Some("v2".to_string()),
            ..Default::default()
        });

        assert_eq!(token.token_type.as_deref(), Some("api"));
        assert_eq!(token.value.as_deref(), Some("v2"));
        assert_eq!(token.secret.as_deref(), Some("s1"));
        assert_eq!(token.created_at, created_at);
        assert!(token.updated_at >= created_at);
    }

    #[test]
    fn authorship() {
        let author = Uuid::new_v4();
        let token = Token::new(author, TokenAttributes::default());

        assert!(token.is_authored_by(author));
        assert!(!token.is_authored_by(Uuid::new_v4()));
    }

    #[test]
    fn only_mutations_require_authorship() {
        assert!(TokenAction::Update.requires_authorship());
        assert!(TokenAction::Delete.requires_authorship());
        assert!(!TokenAction::View.requires_authorship());
    }

    #[test]
    fn action_names() {
        assert_eq!(TokenAction::Update.to_string(), "update");
        assert_eq!(TokenAction::Delete.to_string(), "delete");
    }
}
