use serde::{Deserialize, Serialize};

use crate::dialog::path::DialogPath;

/// Top-level menu choices. The three branches share the code-entry and
/// confirm/notify machinery and differ only in prompt texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuBranch {
    NotifyRightsHolder,
    QuotaStatus,
    QuotaBalance,
}

impl MenuBranch {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "1" => Some(Self::NotifyRightsHolder),
            "2" => Some(Self::QuotaStatus),
            "3" => Some(Self::QuotaBalance),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmChoice {
    Yes,
    No,
    Other,
}

impl ConfirmChoice {
    pub fn from_token(token: &str) -> Self {
        match token {
            "1" => Self::Yes,
            "2" => Self::No,
            _ => Self::Other,
        }
    }
}

/// Closed set of dialog positions a token path can classify into. States are
/// dialog depths; transitions are deterministic in (depth, next token).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialogPosition {
    /// Empty path, or reset dominance.
    Root,
    /// A top-level branch was chosen; the caller is being asked for a code.
    AwaitingCode { branch: MenuBranch },
    /// Branch and code token entered; classification against the
    /// authorization store decides the prompt.
    CodeEntered { branch: MenuBranch, code_token: String },
    /// Branch, code and a confirm-submenu answer.
    Confirmed { branch: MenuBranch, code_token: String, choice: ConfirmChoice },
    /// Any shape not matching the above: out-of-range top-level choice,
    /// excessive depth. Always recoverable via reset.
    Malformed,
}

/// Pure classification of a token path into a dialog position. Reset
/// dominance is applied first: a path whose last token is the reset token
/// resolves to `Root` regardless of everything before it.
pub fn classify(path: &DialogPath) -> DialogPosition {
    if path.ends_with_reset() || path.is_empty() {
        return DialogPosition::Root;
    }

    let tokens = path.tokens();
    let Some(branch) = MenuBranch::from_token(&tokens[0]) else {
        return DialogPosition::Malformed;
    };

    match tokens {
        [_] => DialogPosition::AwaitingCode { branch },
        [_, code] => DialogPosition::CodeEntered { branch, code_token: code.clone() },
        [_, code, choice] => DialogPosition::Confirmed {
            branch,
            code_token: code.clone(),
            choice: ConfirmChoice::from_token(choice),
        },
        _ => DialogPosition::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use crate::dialog::path::DialogPath;

    use super::{classify, ConfirmChoice, DialogPosition, MenuBranch};

    fn classified(input: &str) -> DialogPosition {
        classify(&DialogPath::parse(input))
    }

    #[test]
    fn empty_path_is_root() {
        assert_eq!(classified(""), DialogPosition::Root);
    }

    #[test]
    fn reset_wins_at_any_depth() {
        assert_eq!(classified("0"), DialogPosition::Root);
        assert_eq!(classified("1*ABC123*0"), DialogPosition::Root);
        assert_eq!(classified("9*garbage*!!*0"), DialogPosition::Root);
    }

    #[test]
    fn depth_one_selects_a_branch() {
        assert_eq!(
            classified("1"),
            DialogPosition::AwaitingCode { branch: MenuBranch::NotifyRightsHolder }
        );
        assert_eq!(classified("3"), DialogPosition::AwaitingCode { branch: MenuBranch::QuotaBalance });
    }

    #[test]
    fn out_of_range_top_level_choice_is_malformed() {
        assert_eq!(classified("4"), DialogPosition::Malformed);
        assert_eq!(classified("x*ABC123"), DialogPosition::Malformed);
    }

    #[test]
    fn depth_two_carries_the_raw_code_token() {
        assert_eq!(
            classified("2*ABC123"),
            DialogPosition::CodeEntered {
                branch: MenuBranch::QuotaStatus,
                code_token: "ABC123".to_owned()
            }
        );
    }

    #[test]
    fn depth_three_classifies_the_confirm_choice() {
        assert_eq!(
            classified("1*ABC123*1"),
            DialogPosition::Confirmed {
                branch: MenuBranch::NotifyRightsHolder,
                code_token: "ABC123".to_owned(),
                choice: ConfirmChoice::Yes,
            }
        );
        assert_eq!(
            classified("1*ABC123*2"),
            DialogPosition::Confirmed {
                branch: MenuBranch::NotifyRightsHolder,
                code_token: "ABC123".to_owned(),
                choice: ConfirmChoice::No,
            }
        );
        assert_eq!(
            classified("1*ABC123*9"),
            DialogPosition::Confirmed {
                branch: MenuBranch::NotifyRightsHolder,
                code_token: "ABC123".to_owned(),
                choice: ConfirmChoice::Other,
            }
        );
    }

    #[test]
    fn excessive_depth_is_malformed_not_terminal() {
        assert_eq!(classified("1*ABC123*1*1"), DialogPosition::Malformed);
    }
}
