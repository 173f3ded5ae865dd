/// Token separator used by the gateway when it accumulates caller input.
pub const PATH_DELIMITER: char = '*';

/// Pressing this digit returns to the main menu from any depth.
pub const RESET_TOKEN: &str = "0";

/// Ordered tokens extracted from the cumulative caller input. Derived fresh
/// on every request; never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DialogPath {
    tokens: Vec<String>,
}

impl DialogPath {
    /// Splits the raw cumulative input on the path delimiter. Empty tokens
    /// produced by stray or consecutive delimiters are dropped, so `"1**2"`
    /// and `"*1*2*"` both yield `["1", "2"]`. Empty input yields the empty
    /// path (root of the menu tree).
    pub fn parse(raw: &str) -> Self {
        let tokens = raw
            .trim()
            .split(PATH_DELIMITER)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_owned)
            .collect();
        Self { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.tokens.len()
    }

    pub fn last(&self) -> Option<&str> {
        self.tokens.last().map(String::as_str)
    }

    /// Reset dominance: the reset token as the most recent input wins
    /// regardless of everything before it.
    pub fn ends_with_reset(&self) -> bool {
        self.last() == Some(RESET_TOKEN)
    }
}
