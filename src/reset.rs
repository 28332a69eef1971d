//! Password reset: link token gate, form state machine and the verification
//! call that moves a submitted form to its outcome.

use std::fmt::Write;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::page::Page;
use crate::selection::VisibilityToggles;

pub const MIN_TOKEN_LEN: usize = 10;
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenGate {
    Valid,
    Missing,
    TooShort { len: usize },
}

impl TokenGate {
    pub fn is_valid(self) -> bool {
        matches!(self, TokenGate::Valid)
    }
}

/// Placeholder link check: accepts any token longer than `MIN_TOKEN_LEN`
/// characters. Nothing is verified. A real deployment must verify a
/// server-signed token with an expiry instead.
pub fn check_token(token: Option<&str>) -> TokenGate {
    match token {
        None => TokenGate::Missing,
        Some(token) => {
            let len = token.chars().count();
            if len > MIN_TOKEN_LEN {
                TokenGate::Valid
            } else {
                TokenGate::TooShort { len }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all fields")]
    EmptyField,
    #[error("Password must be at least 6 characters")]
    TooShort,
    #[error("Passwords do not match")]
    Mismatch,
}

pub fn validate(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password.is_empty() || confirm.is_empty() {
        return Err(ValidationError::EmptyField);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort);
    }
    if password != confirm {
        return Err(ValidationError::Mismatch);
    }
    Ok(())
}

/// Ways the verification call can fail. Each one returns the form to
/// editing with its own message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResetFailure {
    #[error("This reset link is invalid or has expired. Request a new one.")]
    InvalidToken,
    #[error("Too many attempts. Try again in {retry_after_secs} seconds.")]
    RateLimited { retry_after_secs: u64 },
    #[error("The request timed out. Check your connection and try again.")]
    Timeout,
    #[error("Could not reach the server: {0}")]
    Network(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResetError {
    #[error("reset link rejected: {0:?}")]
    LinkRejected(TokenGate),
    #[error("cannot apply {event} while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FormStatus {
    Editing { message: Option<String> },
    Submitting,
    Submitted,
}

impl FormStatus {
    fn name(&self) -> &'static str {
        match self {
            FormStatus::Editing { .. } => "editing",
            FormStatus::Submitting => "submitting",
            FormStatus::Submitted => "submitted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    EditPassword(String),
    EditConfirm(String),
    TogglePasswordVisibility,
    ToggleConfirmVisibility,
    Submit,
    Verified,
    Failed(ResetFailure),
}

impl FormEvent {
    fn name(&self) -> &'static str {
        match self {
            FormEvent::EditPassword(_) => "edit-password",
            FormEvent::EditConfirm(_) => "edit-confirm",
            FormEvent::TogglePasswordVisibility => "toggle-password-visibility",
            FormEvent::ToggleConfirmVisibility => "toggle-confirm-visibility",
            FormEvent::Submit => "submit",
            FormEvent::Verified => "verified",
            FormEvent::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Stay,
    Verify,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetForm {
    password: String,
    confirm: String,
    visibility: VisibilityToggles,
    status: FormStatus,
}

impl Default for ResetForm {
    fn default() -> Self {
        Self {
            password: String::new(),
            confirm: String::new(),
            visibility: VisibilityToggles::default(),
            status: FormStatus::Editing { message: None },
        }
    }
}

impl ResetForm {
    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    pub fn visibility(&self) -> VisibilityToggles {
        self.visibility
    }

    /// Returns `Step::Verify` when a submit passed validation and the
    /// verification call should start.
    pub fn apply(&mut self, event: FormEvent) -> Result<Step, ResetError> {
        match (&self.status, event) {
            (FormStatus::Editing { .. }, FormEvent::EditPassword(value)) => {
                self.password = value;
            }
            (FormStatus::Editing { .. }, FormEvent::EditConfirm(value)) => {
                self.confirm = value;
            }
            (
                FormStatus::Editing { .. } | FormStatus::Submitting,
                FormEvent::TogglePasswordVisibility,
            ) => {
                self.visibility.toggle_password();
            }
            (
                FormStatus::Editing { .. } | FormStatus::Submitting,
                FormEvent::ToggleConfirmVisibility,
            ) => {
                self.visibility.toggle_confirm();
            }
            (FormStatus::Editing { .. }, FormEvent::Submit) => {
                return match validate(&self.password, &self.confirm) {
                    Ok(()) => {
                        self.status = FormStatus::Submitting;
                        Ok(Step::Verify)
                    }
                    Err(err) => {
                        self.status = FormStatus::Editing {
                            message: Some(err.to_string()),
                        };
                        Ok(Step::Stay)
                    }
                };
            }
            (FormStatus::Submitting, FormEvent::Verified) => {
                self.status = FormStatus::Submitted;
            }
            (FormStatus::Submitting, FormEvent::Failed(failure)) => {
                self.status = FormStatus::Editing {
                    message: Some(failure.to_string()),
                };
            }
            (status, event) => {
                return Err(ResetError::InvalidTransition {
                    state: status.name(),
                    event: event.name(),
                });
            }
        }
        Ok(Step::Stay)
    }
}

#[async_trait]
pub trait ResetBackend: Send + Sync {
    async fn reset_password(&self, token: &str, password: &str) -> Result<(), ResetFailure>;
}

const MAX_ATTEMPTS: u32 = 5;
const RETRY_AFTER_SECS: u64 = 60;

/// Stands in for the password service: waits `delay`, then applies the
/// same placeholder token check as the link gate. Attempts past
/// `MAX_ATTEMPTS` are refused as rate limited.
#[derive(Debug)]
pub struct SimulatedBackend {
    delay: Duration,
    attempts: AtomicU32,
}

impl SimulatedBackend {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            attempts: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl ResetBackend for SimulatedBackend {
    async fn reset_password(&self, token: &str, _password: &str) -> Result<(), ResetFailure> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) >= MAX_ATTEMPTS {
            return Err(ResetFailure::RateLimited {
                retry_after_secs: RETRY_AFTER_SECS,
            });
        }
        tokio::time::sleep(self.delay).await;
        if check_token(Some(token)).is_valid() {
            Ok(())
        } else {
            Err(ResetFailure::InvalidToken)
        }
    }
}

/// One reset-password view. Dropping it aborts any verification still in
/// flight so no result lands on a closed view.
pub struct ResetSession {
    view_id: Uuid,
    token: String,
    form: ResetForm,
    backend: Arc<dyn ResetBackend>,
    timeout: Duration,
    pending: Option<JoinHandle<Result<(), ResetFailure>>>,
}

impl ResetSession {
    pub fn open(
        token: Option<&str>,
        backend: Arc<dyn ResetBackend>,
        timeout: Duration,
    ) -> Result<Self, ResetError> {
        let gate = check_token(token);
        let token = match (gate, token) {
            (TokenGate::Valid, Some(token)) => token.to_string(),
            _ => return Err(ResetError::LinkRejected(gate)),
        };
        let view_id = Uuid::new_v4();
        debug!(view = %view_id, "reset view opened");

        Ok(Self {
            view_id,
            token,
            form: ResetForm::default(),
            backend,
            timeout,
            pending: None,
        })
    }

    pub fn form(&self) -> &ResetForm {
        &self.form
    }

    /// Must be called inside a Tokio runtime; a validated submit spawns the
    /// verification call.
    pub fn dispatch(&mut self, event: FormEvent) -> Result<(), ResetError> {
        if self.form.apply(event)? == Step::Verify {
            let backend = Arc::clone(&self.backend);
            let token = self.token.clone();
            let password = self.form.password.clone();
            let timeout = self.timeout;
            info!(view = %self.view_id, "submitting password reset");

            self.pending = Some(tokio::spawn(async move {
                match tokio::time::timeout(timeout, backend.reset_password(&token, &password)).await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ResetFailure::Timeout),
                }
            }));
        }
        Ok(())
    }

    /// Waits for an in-flight verification and feeds its outcome back into
    /// the form. Returns immediately when nothing is pending.
    pub async fn settle(&mut self) -> Result<&FormStatus, ResetError> {
        let Some(handle) = self.pending.as_mut() else {
            return Ok(self.form.status());
        };
        let joined = handle.await;
        self.pending = None;

        // A task that died without an answer counts as an unreachable server.
        let outcome = joined.unwrap_or_else(|err| Err(ResetFailure::Network(err.to_string())));
        let event = match outcome {
            Ok(()) => {
                info!(view = %self.view_id, "password reset accepted");
                FormEvent::Verified
            }
            Err(failure) => {
                warn!(view = %self.view_id, %failure, "password reset failed");
                FormEvent::Failed(failure)
            }
        };
        self.form.apply(event)?;
        Ok(self.form.status())
    }
}

impl Drop for ResetSession {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            debug!(view = %self.view_id, "reset view closed with verification in flight");
            handle.abort();
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub label: &'static str,
    pub visible: bool,
    pub display: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ResetPage {
    InvalidLink {
        gate: TokenGate,
    },
    Form {
        status: FormStatus,
        fields: Vec<FieldView>,
    },
}

fn field(label: &'static str, value: &str, visible: bool) -> FieldView {
    let display = if visible {
        value.to_string()
    } else {
        "•".repeat(value.chars().count())
    };
    FieldView {
        label,
        visible,
        display,
    }
}

pub fn build_reset_page(session: &ResetSession) -> ResetPage {
    let form = session.form();
    ResetPage::Form {
        status: form.status.clone(),
        fields: vec![
            field("New password", &form.password, form.visibility().password),
            field("Confirm password", &form.confirm, form.visibility().confirm),
        ],
    }
}

impl Page for ResetPage {
    fn markdown(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "# Reset Password");
        let _ = writeln!(output);

        match self {
            ResetPage::InvalidLink { .. } => {
                let _ = writeln!(output, "This password reset link is invalid or has expired.");
                let _ = writeln!(output, "Request a new link from the sign-in page.");
            }
            ResetPage::Form { status, fields } => match status {
                FormStatus::Submitted => {
                    let _ = writeln!(output, "Your password has been reset.");
                    let _ = writeln!(output, "You can now sign in with your new password.");
                }
                FormStatus::Submitting | FormStatus::Editing { .. } => {
                    if let FormStatus::Editing {
                        message: Some(message),
                    } = status
                    {
                        let _ = writeln!(output, "> {}", message);
                        let _ = writeln!(output);
                    }
                    for field in fields {
                        let toggle = if field.visible { "hide" } else { "show" };
                        let _ = writeln!(
                            output,
                            "- {}: `{}` ({})",
                            field.label, field.display, toggle
                        );
                    }
                    if *status == FormStatus::Submitting {
                        let _ = writeln!(output);
                        let _ = writeln!(output, "Resetting password...");
                    }
                }
            },
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    const GOOD_TOKEN: &str = "01234567890";

    fn fill(form: &mut ResetForm, password: &str, confirm: &str) {
        form.apply(FormEvent::EditPassword(password.to_string())).unwrap();
        form.apply(FormEvent::EditConfirm(confirm.to_string())).unwrap();
    }

    fn message(form: &ResetForm) -> Option<&str> {
        match form.status() {
            FormStatus::Editing { message } => message.as_deref(),
            _ => None,
        }
    }

    #[test]
    fn token_gate_requires_more_than_ten_characters() {
        assert_eq!(check_token(None), TokenGate::Missing);
        assert_eq!(check_token(Some("abc")), TokenGate::TooShort { len: 3 });
        assert_eq!(check_token(Some("0123456789")), TokenGate::TooShort { len: 10 });
        assert_eq!(check_token(Some(GOOD_TOKEN)), TokenGate::Valid);
    }

    #[test]
    fn empty_fields_are_rejected_first() {
        let mut form = ResetForm::default();
        fill(&mut form, "abc", "");
        assert_eq!(form.apply(FormEvent::Submit).unwrap(), Step::Stay);
        assert_eq!(message(&form), Some("Please fill in all fields"));
    }

    #[test]
    fn short_password_is_rejected() {
        let mut form = ResetForm::default();
        fill(&mut form, "abcde", "abcde");
        assert_eq!(form.apply(FormEvent::Submit).unwrap(), Step::Stay);
        assert_eq!(message(&form), Some("Password must be at least 6 characters"));
    }

    #[test]
    fn mismatched_passwords_are_rejected() {
        let mut form = ResetForm::default();
        fill(&mut form, "abcdef", "abcdeg");
        assert_eq!(form.apply(FormEvent::Submit).unwrap(), Step::Stay);
        assert_eq!(message(&form), Some("Passwords do not match"));
    }

    #[test]
    fn later_submit_replaces_earlier_message() {
        let mut form = ResetForm::default();
        fill(&mut form, "abc", "abc");
        form.apply(FormEvent::Submit).unwrap();
        fill(&mut form, "abcdef", "abcdeg");
        form.apply(FormEvent::Submit).unwrap();
        assert_eq!(message(&form), Some("Passwords do not match"));
    }

    #[test]
    fn valid_submit_moves_to_submitting() {
        let mut form = ResetForm::default();
        fill(&mut form, "abcdef", "abcdef");
        assert_eq!(form.apply(FormEvent::Submit).unwrap(), Step::Verify);
        assert_eq!(form.status(), &FormStatus::Submitting);
    }

    #[test]
    fn edits_are_rejected_while_submitting() {
        let mut form = ResetForm::default();
        fill(&mut form, "abcdef", "abcdef");
        form.apply(FormEvent::Submit).unwrap();
        let err = form.apply(FormEvent::EditPassword("x".to_string())).unwrap_err();
        assert_eq!(
            err,
            ResetError::InvalidTransition {
                state: "submitting",
                event: "edit-password",
            }
        );
        assert!(form.apply(FormEvent::Submit).is_err());
        form.apply(FormEvent::TogglePasswordVisibility).unwrap();
        assert!(form.visibility().password);
    }

    #[test]
    fn verification_result_outside_submitting_is_rejected() {
        let mut form = ResetForm::default();
        assert!(form.apply(FormEvent::Verified).is_err());
        assert!(form.apply(FormEvent::Failed(ResetFailure::Timeout)).is_err());
    }

    #[test]
    fn failure_returns_form_to_editing_with_its_message() {
        let mut form = ResetForm::default();
        fill(&mut form, "abcdef", "abcdef");
        form.apply(FormEvent::Submit).unwrap();
        form.apply(FormEvent::Failed(ResetFailure::RateLimited {
            retry_after_secs: 30,
        }))
        .unwrap();
        assert_eq!(message(&form), Some("Too many attempts. Try again in 30 seconds."));
    }

    #[test]
    fn session_refuses_invalid_links() {
        let backend: Arc<dyn ResetBackend> = Arc::new(SimulatedBackend::new(Duration::ZERO));
        let err = ResetSession::open(Some("short"), backend, Duration::from_secs(1))
            .err()
            .unwrap();
        assert_eq!(err, ResetError::LinkRejected(TokenGate::TooShort { len: 5 }));
    }

    #[tokio::test(start_paused = true)]
    async fn matching_passwords_reach_submitted_after_the_delay() {
        let backend = Arc::new(SimulatedBackend::new(Duration::from_millis(1500)));
        let mut session =
            ResetSession::open(Some(GOOD_TOKEN), backend, Duration::from_secs(10)).unwrap();
        session.dispatch(FormEvent::EditPassword("abcdef".into())).unwrap();
        session.dispatch(FormEvent::EditConfirm("abcdef".into())).unwrap();
        session.dispatch(FormEvent::Submit).unwrap();
        assert_eq!(session.form().status(), &FormStatus::Submitting);

        let status = session.settle().await.unwrap();
        assert_eq!(status, &FormStatus::Submitted);
    }

    struct SlowBackend;

    #[async_trait]
    impl ResetBackend for SlowBackend {
        async fn reset_password(&self, _token: &str, _password: &str) -> Result<(), ResetFailure> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out_back_to_editing() {
        let mut session =
            ResetSession::open(Some(GOOD_TOKEN), Arc::new(SlowBackend), Duration::from_secs(5))
                .unwrap();
        session.dispatch(FormEvent::EditPassword("abcdef".into())).unwrap();
        session.dispatch(FormEvent::EditConfirm("abcdef".into())).unwrap();
        session.dispatch(FormEvent::Submit).unwrap();

        let status = session.settle().await.unwrap().clone();
        assert_eq!(
            status,
            FormStatus::Editing {
                message: Some(ResetFailure::Timeout.to_string()),
            }
        );
    }

    struct RecordingBackend {
        finished: Arc<AtomicBool>,
    }

    #[async_trait]
    impl ResetBackend for RecordingBackend {
        async fn reset_password(&self, _token: &str, _password: &str) -> Result<(), ResetFailure> {
            tokio::time::sleep(Duration::from_secs(1)).await;
            self.finished.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_session_cancels_verification() {
        let finished = Arc::new(AtomicBool::new(false));
        let backend = Arc::new(RecordingBackend {
            finished: Arc::clone(&finished),
        });
        let mut session =
            ResetSession::open(Some(GOOD_TOKEN), backend, Duration::from_secs(10)).unwrap();
        session.dispatch(FormEvent::EditPassword("abcdef".into())).unwrap();
        session.dispatch(FormEvent::EditConfirm("abcdef".into())).unwrap();
        session.dispatch(FormEvent::Submit).unwrap();
        drop(session);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    struct PanickingBackend;

    #[async_trait]
    impl ResetBackend for PanickingBackend {
        async fn reset_password(&self, _token: &str, _password: &str) -> Result<(), ResetFailure> {
            panic!("password service crashed");
        }
    }

    #[tokio::test]
    async fn crashed_verification_returns_form_to_editing() {
        let mut session =
            ResetSession::open(Some(GOOD_TOKEN), Arc::new(PanickingBackend), Duration::from_secs(5))
                .unwrap();
        session.dispatch(FormEvent::EditPassword("abcdef".into())).unwrap();
        session.dispatch(FormEvent::EditConfirm("abcdef".into())).unwrap();
        session.dispatch(FormEvent::Submit).unwrap();

        let status = session.settle().await.unwrap().clone();
        match status {
            FormStatus::Editing { message: Some(message) } => {
                assert!(message.starts_with("Could not reach the server"));
            }
            other => panic!("expected editing with a message, got {other:?}"),
        }

        session.dispatch(FormEvent::EditPassword("ghijkl".into())).unwrap();
        session.dispatch(FormEvent::EditConfirm("ghijkl".into())).unwrap();
        session.dispatch(FormEvent::Submit).unwrap();
        assert_eq!(session.form().status(), &FormStatus::Submitting);
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_backend_rejects_short_tokens() {
        let backend = SimulatedBackend::new(Duration::from_millis(1500));
        let failure = backend.reset_password("abc", "abcdef").await.unwrap_err();
        assert_eq!(failure, ResetFailure::InvalidToken);

        let mut form = ResetForm::default();
        fill(&mut form, "abcdef", "abcdef");
        assert_eq!(form.apply(FormEvent::Submit).unwrap(), Step::Verify);
        form.apply(FormEvent::Failed(failure)).unwrap();
        assert_eq!(
            message(&form),
            Some("This reset link is invalid or has expired. Request a new one.")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_backend_rate_limits_repeated_attempts() {
        let backend = SimulatedBackend::new(Duration::ZERO);
        for _ in 0..MAX_ATTEMPTS {
            backend.reset_password(GOOD_TOKEN, "abcdef").await.unwrap();
        }
        let failure = backend.reset_password(GOOD_TOKEN, "abcdef").await.unwrap_err();
        assert_eq!(
            failure,
            ResetFailure::RateLimited {
                retry_after_secs: RETRY_AFTER_SECS
            }
        );
    }

    #[test]
    fn page_masks_hidden_fields() {
        let page = ResetPage::Form {
            status: FormStatus::Editing { message: None },
            fields: vec![
                field("New password", "abcdef", false),
                field("Confirm password", "abcdef", true),
            ],
        };
        let text = page.markdown();
        assert!(text.contains("New password: `••••••` (show)"));
        assert!(text.contains("Confirm password: `abcdef` (hide)"));
    }

    #[test]
    fn invalid_link_page_explains_next_step() {
        let page = ResetPage::InvalidLink {
            gate: TokenGate::Missing,
        };
        assert!(page.markdown().contains("invalid or has expired"));
    }
}
