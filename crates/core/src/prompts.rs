//! Menu prompt templates and gateway reply rendering.
//!
//! Prompt wording is a lookup table keyed by menu node; the resolver decides
//! which node applies, this module owns the text. Replies are rendered with
//! the gateway control marker (`CON` continues the dialog, `END` terminates
//! it) and truncated, never rejected, at the configured display budget.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::dialog::position::MenuBranch;

/// GSM-7 USSD screen budget. Configurable per deployment; this is the
/// fallback the gateway contract documents.
pub const DEFAULT_MAX_REPLY_CHARS: usize = 182;

/// A resolved reply: either a non-terminal prompt (the gateway will send
/// another request with the caller's next digit appended) or a terminal
/// message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Continue(String),
    End(String),
}

impl Reply {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End(_))
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Continue(text) | Self::End(text) => text,
        }
    }

    /// Renders the gateway wire form, capped at `max_chars` characters
    /// including the control marker. Over-length prompts are truncated on a
    /// char boundary rather than rejected.
    pub fn render(&self, max_chars: usize) -> String {
        let rendered = match self {
            Self::Continue(text) => format!("CON {text}"),
            Self::End(text) => format!("END {text}"),
        };
        truncate_chars(rendered, max_chars)
    }
}

fn truncate_chars(value: String, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value;
    }
    value.chars().take(max_chars).collect()
}

pub fn root_menu() -> Reply {
    Reply::Continue(
        "What would you like to do?\n1. Notify Rights Holder\n2. Check Quota Status\n3. Check Quota Balance"
            .to_owned(),
    )
}

pub fn enter_code() -> Reply {
    Reply::Continue("Enter your Quota Code or press 0 to return to the main menu".to_owned())
}

pub fn invalid_input() -> Reply {
    Reply::Continue("Invalid input.\nPress 0 to return to the main menu".to_owned())
}

pub fn invalid_choice() -> Reply {
    Reply::Continue("Invalid choice. Press 0 to return to the main menu".to_owned())
}

pub fn invalid_or_not_found(code_token: &str) -> Reply {
    Reply::Continue(format!(
        "Quota code {code_token} is invalid or not found.\nPress 0 to return to the main menu"
    ))
}

pub fn insufficient_balance(code_token: &str) -> Reply {
    Reply::Continue(format!(
        "Quota code {code_token} has insufficient Quota Balance.\nPress 0 to return to the main menu"
    ))
}

/// Safe default for faults that escape every other mapping. Never terminal:
/// the caller can always recover with reset.
pub fn unexpected_error() -> Reply {
    Reply::Continue(
        "An unexpected error occurred. Press 0 to return to the main menu".to_owned(),
    )
}

pub fn transient_error() -> Reply {
    Reply::Continue("An error occurred. Please try again or press 0 to return to the main menu".to_owned())
}

const CONFIRM_SUFFIX: &str =
    "Notify the Rights Holder of your intention to depart?\n1. Yes\n2. No\n0. Main menu";

pub fn confirm_submenu(
    branch: MenuBranch,
    code_token: &str,
    balance_kg: Decimal,
    expiry: Option<DateTime<Utc>>,
) -> Reply {
    let lead = match (branch, expiry) {
        (MenuBranch::QuotaStatus, Some(expiry)) => format!(
            "Quota code {code_token} is valid until {} with a remaining Quota balance of {balance_kg} kg.",
            expiry.format("%Y-%m-%d")
        ),
        (MenuBranch::QuotaBalance, _) => format!(
            "Remaining Quota balance for Quota code {code_token} is {balance_kg} kg."
        ),
        _ => format!(
            "Quota code {code_token} is valid with a remaining Quota balance of {balance_kg} kg."
        ),
    };
    Reply::Continue(format!("{lead} {CONFIRM_SUFFIX}"))
}

pub fn notification_sent() -> Reply {
    Reply::End("Notification sent to Rights Holder via SMS and Email.".to_owned())
}

pub fn notification_failed() -> Reply {
    Reply::Continue(
        "Failed to notify Rights Holder.\nPress 0 to return to the main menu".to_owned(),
    )
}

pub fn rights_holder_not_found(code_token: &str) -> Reply {
    Reply::End(format!("Rights Holder for Quota code {code_token} not found."))
}

pub fn declined(branch: MenuBranch) -> Reply {
    let text = match branch {
        MenuBranch::NotifyRightsHolder => "Thank you. No notification was sent.",
        MenuBranch::QuotaStatus => "Thank you for checking your Quota status.",
        MenuBranch::QuotaBalance => "Thank you for checking the Quota balance.",
    };
    Reply::End(text.to_owned())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use crate::dialog::position::MenuBranch;

    use super::{confirm_submenu, root_menu, Reply, DEFAULT_MAX_REPLY_CHARS};

    #[test]
    fn continue_and_end_render_their_control_markers() {
        assert_eq!(Reply::Continue("hello".to_owned()).render(64), "CON hello");
        assert_eq!(Reply::End("bye".to_owned()).render(64), "END bye");
    }

    #[test]
    fn over_length_replies_are_truncated_not_rejected() {
        let long = Reply::Continue("x".repeat(400));
        let rendered = long.render(DEFAULT_MAX_REPLY_CHARS);
        assert_eq!(rendered.chars().count(), DEFAULT_MAX_REPLY_CHARS);
        assert!(rendered.starts_with("CON "));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = Reply::End("émûç".repeat(100));
        let rendered = long.render(10);
        assert_eq!(rendered.chars().count(), 10);
    }

    #[test]
    fn root_menu_lists_the_three_top_level_choices() {
        let text = root_menu().text().to_owned();
        assert!(text.contains("1. Notify Rights Holder"));
        assert!(text.contains("2. Check Quota Status"));
        assert!(text.contains("3. Check Quota Balance"));
    }

    #[test]
    fn confirm_prompt_is_parameterized_by_code_and_balance() {
        let reply = confirm_submenu(
            MenuBranch::NotifyRightsHolder,
            "ABC123",
            Decimal::new(50, 0),
            None,
        );
        assert!(!reply.is_terminal());
        assert!(reply.text().contains("ABC123"));
        assert!(reply.text().contains("50"));
        assert!(reply.text().contains("1. Yes"));
    }

    #[test]
    fn status_branch_confirm_prompt_includes_expiry_date() {
        let expiry = Utc.with_ymd_and_hms(2026, 12, 31, 0, 0, 0).single();
        let reply =
            confirm_submenu(MenuBranch::QuotaStatus, "ABC123", Decimal::new(50, 0), expiry);
        assert!(reply.text().contains("2026-12-31"));
    }

    #[test]
    fn fits_within_default_display_budget() {
        for reply in [
            root_menu(),
            confirm_submenu(
                MenuBranch::QuotaStatus,
                "ABCDEFGH12",
                Decimal::new(123_456, 2),
                Utc.with_ymd_and_hms(2026, 12, 31, 0, 0, 0).single(),
            ),
        ] {
            assert!(reply.render(DEFAULT_MAX_REPLY_CHARS).chars().count() <= DEFAULT_MAX_REPLY_CHARS);
        }
    }
}
