use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::warn;

use crate::authz::{AuthorizationQuery, LookupError};
use crate::dialog::path::DialogPath;
use crate::dialog::position::{classify, ConfirmChoice, DialogPosition, MenuBranch};
use crate::dispatch::{DepartureNotifier, NotifyOutcome};
use crate::domain::notification::SessionId;
use crate::domain::permit::{Msisdn, PermitCode};
use crate::prompts::{self, Reply};

/// Maps a token path to a reply, consulting the authorization store and
/// triggering the departure notification at the confirmed terminal choice.
///
/// Resolution recomputes the full classification from the token path on
/// every call; nothing is held between requests. A replayed terminal path is
/// therefore expected, and safe, because the notifier is idempotent per
/// session.
pub struct MenuResolver {
    authz: Arc<dyn AuthorizationQuery>,
    notifier: Arc<dyn DepartureNotifier>,
}

impl MenuResolver {
    pub fn new(authz: Arc<dyn AuthorizationQuery>, notifier: Arc<dyn DepartureNotifier>) -> Self {
        Self { authz, notifier }
    }

    pub async fn resolve(
        &self,
        session_id: &SessionId,
        caller_phone: &Msisdn,
        path: &DialogPath,
    ) -> Reply {
        match classify(path) {
            DialogPosition::Root => prompts::root_menu(),
            DialogPosition::AwaitingCode { .. } => prompts::enter_code(),
            DialogPosition::CodeEntered { branch, code_token } => {
                self.classify_code(session_id, branch, &code_token).await
            }
            DialogPosition::Confirmed { branch, code_token, choice } => {
                self.handle_confirmation(session_id, caller_phone, branch, &code_token, choice)
                    .await
            }
            DialogPosition::Malformed => prompts::invalid_input(),
        }
    }

    async fn classify_code(
        &self,
        session_id: &SessionId,
        branch: MenuBranch,
        code_token: &str,
    ) -> Reply {
        let Some(code) = PermitCode::parse(code_token) else {
            return prompts::invalid_or_not_found(code_token);
        };

        match self.run_checks(branch, &code).await {
            Ok(reply) => reply,
            Err(LookupError::Unavailable(detail)) => {
                warn!(
                    event_name = "dialog.authz_lookup_failed",
                    session_id = session_id.as_str(),
                    permit_code = code.as_str(),
                    detail = %detail,
                    "authorization lookup failed; answering with retry prompt"
                );
                prompts::transient_error()
            }
        }
    }

    async fn run_checks(&self, branch: MenuBranch, code: &PermitCode) -> Result<Reply, LookupError> {
        if !self.authz.check_validity(code).await? {
            return Ok(prompts::invalid_or_not_found(code.as_str()));
        }

        let balance = self.authz.check_balance(code).await?;
        if balance <= Decimal::ZERO {
            return Ok(prompts::insufficient_balance(code.as_str()));
        }

        // Only the status branch surfaces the expiry date in its prompt.
        let expiry = match branch {
            MenuBranch::QuotaStatus => {
                self.authz.find_permit(code).await?.map(|permit| permit.date_expiry)
            }
            _ => None,
        };

        Ok(prompts::confirm_submenu(branch, code.as_str(), balance, expiry))
    }

    async fn handle_confirmation(
        &self,
        session_id: &SessionId,
        caller_phone: &Msisdn,
        branch: MenuBranch,
        code_token: &str,
        choice: ConfirmChoice,
    ) -> Reply {
        match choice {
            ConfirmChoice::Yes => {
                let Some(code) = PermitCode::parse(code_token) else {
                    return prompts::invalid_or_not_found(code_token);
                };
                match self.notifier.notify(session_id, &code, caller_phone).await {
                    NotifyOutcome::Delivered | NotifyOutcome::AlreadyNotified => {
                        prompts::notification_sent()
                    }
                    NotifyOutcome::RecipientNotFound => {
                        prompts::rights_holder_not_found(code.as_str())
                    }
                    NotifyOutcome::DispatchFailed => prompts::notification_failed(),
                    NotifyOutcome::Unavailable => prompts::transient_error(),
                }
            }
            ConfirmChoice::No => prompts::declined(branch),
            ConfirmChoice::Other => prompts::invalid_choice(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use crate::authz::{AuthorizationQuery, LookupError};
    use crate::dialog::path::DialogPath;
    use crate::dispatch::{DepartureNotifier, NotifyOutcome};
    use crate::domain::notification::SessionId;
    use crate::domain::permit::{Msisdn, Permit, PermitCode, RightsHolderContact};

    use super::MenuResolver;

    struct StubAuthz {
        permits: HashMap<String, Permit>,
        unavailable: bool,
        lookups: Mutex<u32>,
    }

    impl StubAuthz {
        fn with_permits(permits: Vec<Permit>) -> Self {
            let permits =
                permits.into_iter().map(|permit| (permit.code.0.clone(), permit)).collect();
            Self { permits, unavailable: false, lookups: Mutex::new(0) }
        }

        fn unavailable() -> Self {
            Self { permits: HashMap::new(), unavailable: true, lookups: Mutex::new(0) }
        }

        fn lookup_count(&self) -> u32 {
            *self.lookups.lock().expect("lock")
        }

        fn record_lookup(&self) -> Result<(), LookupError> {
            *self.lookups.lock().expect("lock") += 1;
            if self.unavailable {
                Err(LookupError::Unavailable("connection refused".to_owned()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl AuthorizationQuery for StubAuthz {
        async fn check_validity(&self, code: &PermitCode) -> Result<bool, LookupError> {
            self.record_lookup()?;
            Ok(self
                .permits
                .get(code.as_str())
                .map(|permit| permit.is_valid_at(Utc::now()))
                .unwrap_or(false))
        }

        async fn check_balance(&self, code: &PermitCode) -> Result<Decimal, LookupError> {
            self.record_lookup()?;
            Ok(self
                .permits
                .get(code.as_str())
                .map(|permit| permit.quota_balance_kg)
                .unwrap_or(Decimal::ZERO))
        }

        async fn find_permit(&self, code: &PermitCode) -> Result<Option<Permit>, LookupError> {
            self.record_lookup()?;
            Ok(self.permits.get(code.as_str()).cloned())
        }
    }

    struct RecordingNotifier {
        outcome: NotifyOutcome,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl RecordingNotifier {
        fn returning(outcome: NotifyOutcome) -> Self {
            Self { outcome, calls: Mutex::new(Vec::new()) }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl DepartureNotifier for RecordingNotifier {
        async fn notify(
            &self,
            session_id: &SessionId,
            code: &PermitCode,
            _caller_phone: &Msisdn,
        ) -> NotifyOutcome {
            self.calls
                .lock()
                .expect("lock")
                .push((session_id.as_str().to_owned(), code.as_str().to_owned()));
            self.outcome
        }
    }

    fn permit(code: &str, days_to_expiry: i64, balance_kg: i64) -> Permit {
        Permit {
            code: PermitCode(code.to_owned()),
            date_expiry: Utc::now() + Duration::days(days_to_expiry),
            quota_balance_kg: Decimal::new(balance_kg, 0),
            contact: Some(RightsHolderContact {
                cell_phone: "27812807278".to_owned(),
                email: "holder@example.test".to_owned(),
            }),
        }
    }

    fn resolver_with(
        authz: StubAuthz,
        notifier: RecordingNotifier,
    ) -> (MenuResolver, Arc<StubAuthz>, Arc<RecordingNotifier>) {
        let authz = Arc::new(authz);
        let notifier = Arc::new(notifier);
        (MenuResolver::new(authz.clone(), notifier.clone()), authz, notifier)
    }

    async fn resolve(resolver: &MenuResolver, input: &str) -> crate::prompts::Reply {
        resolver
            .resolve(
                &SessionId("ATUid_42".to_owned()),
                &Msisdn("27811234567".to_owned()),
                &DialogPath::parse(input),
            )
            .await
    }

    #[tokio::test]
    async fn empty_path_resolves_to_root_menu() {
        let (resolver, _, _) = resolver_with(
            StubAuthz::with_permits(vec![]),
            RecordingNotifier::returning(NotifyOutcome::Delivered),
        );
        let reply = resolve(&resolver, "").await;
        assert!(reply.text().contains("What would you like to do?"));
        assert!(!reply.is_terminal());
    }

    #[tokio::test]
    async fn reset_as_last_token_returns_root_regardless_of_prefix() {
        let (resolver, authz, notifier) = resolver_with(
            StubAuthz::with_permits(vec![permit("ABC123", 30, 50)]),
            RecordingNotifier::returning(NotifyOutcome::Delivered),
        );
        let reply = resolve(&resolver, "1*ABC123*0").await;
        assert!(reply.text().contains("What would you like to do?"));
        assert_eq!(authz.lookup_count(), 0, "reset must short-circuit all lookups");
        assert!(notifier.calls().is_empty());
    }

    #[tokio::test]
    async fn branch_selection_asks_for_a_code() {
        let (resolver, _, _) = resolver_with(
            StubAuthz::with_permits(vec![]),
            RecordingNotifier::returning(NotifyOutcome::Delivered),
        );
        let reply = resolve(&resolver, "1").await;
        assert!(reply.text().contains("Enter your Quota Code"));
    }

    #[tokio::test]
    async fn valid_code_presents_confirm_submenu_with_code_and_balance() {
        let (resolver, _, notifier) = resolver_with(
            StubAuthz::with_permits(vec![permit("ABC123", 30, 50)]),
            RecordingNotifier::returning(NotifyOutcome::Delivered),
        );
        let reply = resolve(&resolver, "1*ABC123").await;
        assert!(!reply.is_terminal());
        assert!(reply.text().contains("ABC123"));
        assert!(reply.text().contains("50"));
        assert!(notifier.calls().is_empty(), "depth-2 resolution must never dispatch");
    }

    #[tokio::test]
    async fn expired_code_yields_not_found_prompt_and_never_dispatches() {
        let (resolver, _, notifier) = resolver_with(
            StubAuthz::with_permits(vec![permit("OLD999", -1, 50)]),
            RecordingNotifier::returning(NotifyOutcome::Delivered),
        );
        let reply = resolve(&resolver, "1*OLD999").await;
        assert!(!reply.is_terminal());
        assert!(reply.text().contains("invalid or not found"));
        assert!(notifier.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_code_yields_not_found_prompt() {
        let (resolver, _, _) = resolver_with(
            StubAuthz::with_permits(vec![]),
            RecordingNotifier::returning(NotifyOutcome::Delivered),
        );
        let reply = resolve(&resolver, "1*UNKNOWN1").await;
        assert!(!reply.is_terminal());
        assert!(reply.text().contains("invalid or not found"));
    }

    #[tokio::test]
    async fn zero_balance_yields_insufficient_prompt() {
        let (resolver, _, notifier) = resolver_with(
            StubAuthz::with_permits(vec![permit("ABC123", 30, 0)]),
            RecordingNotifier::returning(NotifyOutcome::Delivered),
        );
        let reply = resolve(&resolver, "3*ABC123").await;
        assert!(reply.text().contains("insufficient Quota Balance"));
        assert!(notifier.calls().is_empty());
    }

    #[tokio::test]
    async fn syntactically_invalid_code_skips_the_store_entirely() {
        let (resolver, authz, _) = resolver_with(
            StubAuthz::with_permits(vec![]),
            RecordingNotifier::returning(NotifyOutcome::Delivered),
        );
        let reply = resolve(&resolver, "1*ab!").await;
        assert!(reply.text().contains("invalid or not found"));
        assert_eq!(authz.lookup_count(), 0);
    }

    #[tokio::test]
    async fn lookup_failure_is_a_nonterminal_retry_prompt() {
        let (resolver, _, notifier) = resolver_with(
            StubAuthz::unavailable(),
            RecordingNotifier::returning(NotifyOutcome::Delivered),
        );
        let reply = resolve(&resolver, "2*ABC123").await;
        assert!(!reply.is_terminal(), "transient failures must keep the dialog alive");
        assert!(reply.text().contains("error occurred"));
        assert!(notifier.calls().is_empty());
    }

    #[tokio::test]
    async fn status_branch_confirm_includes_expiry() {
        let (resolver, _, _) = resolver_with(
            StubAuthz::with_permits(vec![permit("ABC123", 30, 50)]),
            RecordingNotifier::returning(NotifyOutcome::Delivered),
        );
        let reply = resolve(&resolver, "2*ABC123").await;
        assert!(reply.text().contains("valid until"));
    }

    #[tokio::test]
    async fn confirm_yes_dispatches_once_and_ends_the_dialog() {
        let (resolver, _, notifier) = resolver_with(
            StubAuthz::with_permits(vec![permit("ABC123", 30, 50)]),
            RecordingNotifier::returning(NotifyOutcome::Delivered),
        );
        let reply = resolve(&resolver, "1*ABC123*1").await;
        assert!(reply.is_terminal());
        assert!(reply.text().contains("Notification sent"));
        assert_eq!(notifier.calls(), vec![("ATUid_42".to_owned(), "ABC123".to_owned())]);
    }

    #[tokio::test]
    async fn confirm_no_acknowledges_without_dispatching() {
        let (resolver, _, notifier) = resolver_with(
            StubAuthz::with_permits(vec![permit("ABC123", 30, 50)]),
            RecordingNotifier::returning(NotifyOutcome::Delivered),
        );
        let reply = resolve(&resolver, "2*ABC123*2").await;
        assert!(reply.is_terminal());
        assert!(notifier.calls().is_empty());
    }

    #[tokio::test]
    async fn unexpected_confirm_choice_stays_recoverable() {
        let (resolver, _, notifier) = resolver_with(
            StubAuthz::with_permits(vec![permit("ABC123", 30, 50)]),
            RecordingNotifier::returning(NotifyOutcome::Delivered),
        );
        let reply = resolve(&resolver, "1*ABC123*7").await;
        assert!(!reply.is_terminal());
        assert!(reply.text().contains("Invalid choice"));
        assert!(notifier.calls().is_empty());
    }

    #[tokio::test]
    async fn recipient_not_found_is_a_terminal_outcome() {
        let (resolver, _, _) = resolver_with(
            StubAuthz::with_permits(vec![permit("ABC123", 30, 50)]),
            RecordingNotifier::returning(NotifyOutcome::RecipientNotFound),
        );
        let reply = resolve(&resolver, "1*ABC123*1").await;
        assert!(reply.is_terminal());
        assert!(reply.text().contains("not found"));
    }

    #[tokio::test]
    async fn dispatch_failure_invites_a_retry_of_the_same_step() {
        let (resolver, _, _) = resolver_with(
            StubAuthz::with_permits(vec![permit("ABC123", 30, 50)]),
            RecordingNotifier::returning(NotifyOutcome::DispatchFailed),
        );
        let reply = resolve(&resolver, "1*ABC123*1").await;
        assert!(!reply.is_terminal(), "failed dispatch must stay retryable");
        assert!(reply.text().contains("Failed to notify"));
    }

    #[tokio::test]
    async fn malformed_depth_yields_invalid_input_prompt() {
        let (resolver, _, _) = resolver_with(
            StubAuthz::with_permits(vec![]),
            RecordingNotifier::returning(NotifyOutcome::Delivered),
        );
        let reply = resolve(&resolver, "1*ABC123*1*1").await;
        assert!(!reply.is_terminal());
        assert!(reply.text().contains("Invalid input"));
    }
}
