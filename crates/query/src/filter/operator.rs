//! Filter operators and their text tokens.

use core::fmt;

/// Comparison operator of a filter criterion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Contains,
    StartsWith,
    IsNull,
    IsNotNull,
}

/// Operator tokens ordered longest first, so that `!=null` is tried before
/// `!=` and `>=` is never read as a shorter token followed by a literal.
const TOKENS: &[(&str, Operator)] = &[
    ("!=null", Operator::IsNotNull),
    ("=null", Operator::IsNull),
    ("!=", Operator::NotEquals),
    (">=", Operator::GreaterThanOrEqual),
    ("<=", Operator::LessThanOrEqual),
    ("~=", Operator::StartsWith),
    ("|=", Operator::Contains),
    ("=", Operator::Equals),
];

/// Characters that may begin an operator token.
pub(crate) const OPERATOR_CHARS: &[char] = &['=', '!', '>', '<', '~', '|'];

impl Operator {
    /// Returns the text token for this operator.
    pub fn token(&self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::NotEquals => "!=",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LessThanOrEqual => "<=",
            Operator::Contains => "|=",
            Operator::StartsWith => "~=",
            Operator::IsNull => "=null",
            Operator::IsNotNull => "!=null",
        }
    }

    /// Returns true for operators that take no comparison value.
    pub fn is_unary(&self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }

    /// Matches the longest operator token at the start of `text`.
    ///
    /// The null tokens only match when they consume the rest of `text`;
    /// `status=nullable` is an equality test against `nullable`.
    pub(crate) fn match_prefix(text: &str) -> Option<(Operator, usize)> {
        TOKENS.iter().find_map(|(token, op)| {
            if !text.starts_with(token) {
                return None;
            }
            if op.is_unary() && text.len() != token.len() {
                return None;
            }
            Some((*op, token.len()))
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_token_first() {
        assert_eq!(Operator::match_prefix(">=5"), Some((Operator::GreaterThanOrEqual, 2)));
        assert_eq!(Operator::match_prefix("!=x"), Some((Operator::NotEquals, 2)));
        assert_eq!(Operator::match_prefix("=x"), Some((Operator::Equals, 1)));
        assert_eq!(Operator::match_prefix("~=ab"), Some((Operator::StartsWith, 2)));
        assert_eq!(Operator::match_prefix("|=a"), Some((Operator::Contains, 2)));
    }

    #[test]
    fn test_null_tokens_need_full_match() {
        assert_eq!(Operator::match_prefix("=null"), Some((Operator::IsNull, 5)));
        assert_eq!(Operator::match_prefix("!=null"), Some((Operator::IsNotNull, 6)));
        assert_eq!(Operator::match_prefix("=nullable"), Some((Operator::Equals, 1)));
        assert_eq!(Operator::match_prefix("!=nulls"), Some((Operator::NotEquals, 2)));
    }

    #[test]
    fn test_unknown_operator() {
        assert_eq!(Operator::match_prefix(">5"), None);
        assert_eq!(Operator::match_prefix("<5"), None);
        assert_eq!(Operator::match_prefix("!5"), None);
    }

    #[test]
    fn test_token_display() {
        assert_eq!(Operator::LessThanOrEqual.to_string(), "<=");
        assert_eq!(Operator::IsNotNull.to_string(), "!=null");
    }
}
