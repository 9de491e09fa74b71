//! crates/studyspark_core/src/onboarding.rs
//!
//! The multi-step signup/verification flow: Identity -> Email -> Verify ->
//! Success, with one backward transition per step. Owns code generation, the
//! resend cooldown, and the six-cell code input model. Delivery goes through
//! the `EmailDeliveryService` port; the wall clock is passed in as `Instant`s
//! so the cooldown is testable without sleeping.

use crate::domain::{Provider, User};
use crate::ports::EmailDeliveryService;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const OTP_LEN: usize = 6;
pub const RESEND_COOLDOWN: Duration = Duration::from_secs(30);

/// Fixed code accepted in addition to the generated one, but only when the
/// explicit debug-bypass flag is enabled. Development aid; off by default.
pub const DEBUG_BYPASS_CODE: &str = "123456";

/// The five preset avatar choices offered during the Identity step.
pub const PRESET_AVATARS: [&str; 5] = [
    "https://api.dicebear.com/7.x/notionists/svg?seed=Felix&backgroundColor=b6e3f4",
    "https://api.dicebear.com/7.x/notionists/svg?seed=Aneka&backgroundColor=c0aede",
    "https://api.dicebear.com/7.x/notionists/svg?seed=Milo&backgroundColor=ffdfbf",
    "https://api.dicebear.com/7.x/notionists/svg?seed=Sora&backgroundColor=ffd5dc",
    "https://api.dicebear.com/7.x/bottts/svg?seed=StudyBot&backgroundColor=e5e7eb",
];

/// Produces a fresh 6-digit code (100000..=999999). Injected so tests stay
/// deterministic; the service crate supplies a rand-backed default.
pub type CodeGenerator = Box<dyn Fn() -> String + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingStep {
    Identity,
    Email,
    Verify,
    Success,
}

#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("A display name is required")]
    NameRequired,
    #[error("Enter a valid email address")]
    InvalidEmail,
    #[error("Email service is currently unavailable. Please try again later.")]
    DeliveryFailed,
    #[error("Please wait {0}s before requesting another code")]
    CooldownActive(u64),
    #[error("This action is not available in the current step")]
    WrongStep,
}

/// Result of feeding a digit into the Verify step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Fewer than six cells are filled; keep typing.
    Incomplete,
    Verified,
    /// Wrong code: cells cleared, focus back on the first cell.
    Mismatch,
}

//=========================================================================================
// Six-cell code input
//=========================================================================================

/// Models the six single-digit input cells: entering a digit auto-advances
/// focus, backspace on an empty cell moves focus back.
#[derive(Debug, Clone)]
pub struct OtpInput {
    cells: [Option<char>; OTP_LEN],
    focus: usize,
}

impl OtpInput {
    pub fn new() -> Self {
        Self {
            cells: [None; OTP_LEN],
            focus: 0,
        }
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn cells(&self) -> &[Option<char>; OTP_LEN] {
        &self.cells
    }

    /// Places a digit in the focused cell and advances focus. Non-digits are
    /// ignored. Returns the complete code once all six cells are filled.
    pub fn enter_digit(&mut self, digit: char) -> Option<String> {
        if !digit.is_ascii_digit() {
            return None;
        }
        self.cells[self.focus] = Some(digit);
        if self.focus < OTP_LEN - 1 {
            self.focus += 1;
        }
        self.code()
    }

    /// Clears the focused cell, or moves focus back when it is already empty.
    pub fn backspace(&mut self) {
        if self.cells[self.focus].is_some() {
            self.cells[self.focus] = None;
        } else if self.focus > 0 {
            self.focus -= 1;
        }
    }

    pub fn clear(&mut self) {
        self.cells = [None; OTP_LEN];
        self.focus = 0;
    }

    fn code(&self) -> Option<String> {
        if self.cells.iter().all(|c| c.is_some()) {
            Some(self.cells.iter().flatten().collect())
        } else {
            None
        }
    }
}

impl Default for OtpInput {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================================
// The onboarding state machine
//=========================================================================================

pub struct OnboardingFlow {
    step: OnboardingStep,
    name: String,
    email: String,
    avatar: Option<String>,
    otp: OtpInput,
    generated_code: Option<String>,
    resend_deadline: Option<Instant>,
    inline_error: Option<String>,
    debug_bypass: bool,
    email_service: Arc<dyn EmailDeliveryService>,
    code_gen: CodeGenerator,
}

impl OnboardingFlow {
    pub fn new(
        email_service: Arc<dyn EmailDeliveryService>,
        code_gen: CodeGenerator,
        debug_bypass: bool,
    ) -> Self {
        Self {
            step: OnboardingStep::Identity,
            name: String::new(),
            email: String::new(),
            avatar: Some(PRESET_AVATARS[0].to_string()),
            otp: OtpInput::new(),
            generated_code: None,
            resend_deadline: None,
            inline_error: None,
            debug_bypass,
            email_service,
            code_gen,
        }
    }

    // --- Accessors ---

    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn otp(&self) -> &OtpInput {
        &self.otp
    }

    /// The error to show inline in the Verify step, if any.
    pub fn inline_error(&self) -> Option<&str> {
        self.inline_error.as_deref()
    }

    // --- Identity ---

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// `avatar` is a preset URL or an inline-encoded image; `None` clears it.
    pub fn set_avatar(&mut self, avatar: Option<String>) {
        self.avatar = avatar;
    }

    /// Advances to the Email step. Requires a non-empty trimmed name.
    pub fn submit_identity(&mut self) -> Result<(), OnboardingError> {
        if self.step != OnboardingStep::Identity {
            return Err(OnboardingError::WrongStep);
        }
        if self.name.trim().is_empty() {
            return Err(OnboardingError::NameRequired);
        }
        self.step = OnboardingStep::Email;
        Ok(())
    }

    // --- Email ---

    pub fn set_email(&mut self, email: &str) {
        self.email = email.to_string();
    }

    /// Generates a code and attempts delivery. On success, enters Verify and
    /// starts the resend cooldown; on delivery failure, stays in Email.
    pub async fn submit_email(&mut self, now: Instant) -> Result<(), OnboardingError> {
        if self.step != OnboardingStep::Email {
            return Err(OnboardingError::WrongStep);
        }
        if !self.email.contains('@') {
            return Err(OnboardingError::InvalidEmail);
        }

        let code = (self.code_gen)();
        self.generated_code = Some(code.clone());

        self.email_service
            .send_code(self.email.trim(), &self.name, &code)
            .await
            .map_err(|_| OnboardingError::DeliveryFailed)?;

        self.otp.clear();
        self.inline_error = None;
        self.resend_deadline = Some(now + RESEND_COOLDOWN);
        self.step = OnboardingStep::Verify;
        Ok(())
    }

    pub fn back_to_identity(&mut self) -> Result<(), OnboardingError> {
        if self.step != OnboardingStep::Email {
            return Err(OnboardingError::WrongStep);
        }
        self.step = OnboardingStep::Identity;
        Ok(())
    }

    // --- Verify ---

    /// Feeds one digit into the code input. Verification runs automatically
    /// once the sixth cell fills; no explicit submit exists.
    pub fn enter_digit(&mut self, digit: char) -> VerifyOutcome {
        if self.step != OnboardingStep::Verify {
            return VerifyOutcome::Incomplete;
        }
        match self.otp.enter_digit(digit) {
            Some(entered) => self.verify(&entered),
            None => VerifyOutcome::Incomplete,
        }
    }

    pub fn backspace(&mut self) {
        if self.step == OnboardingStep::Verify {
            self.otp.backspace();
        }
    }

    fn verify(&mut self, entered: &str) -> VerifyOutcome {
        let matches_generated = self.generated_code.as_deref() == Some(entered);
        let matches_bypass = self.debug_bypass && entered == DEBUG_BYPASS_CODE;
        if matches_generated || matches_bypass {
            self.inline_error = None;
            self.step = OnboardingStep::Success;
            VerifyOutcome::Verified
        } else {
            self.otp.clear();
            self.inline_error = Some("Invalid code. Please try again.".to_string());
            VerifyOutcome::Mismatch
        }
    }

    /// Seconds left on the resend cooldown; the resend action is disabled
    /// while this is non-zero.
    pub fn resend_remaining(&self, now: Instant) -> u64 {
        self.resend_deadline
            .map(|deadline| deadline.saturating_duration_since(now).as_secs())
            .unwrap_or(0)
    }

    /// Regenerates a code, re-attempts delivery, and restarts the cooldown.
    pub async fn resend(&mut self, now: Instant) -> Result<(), OnboardingError> {
        if self.step != OnboardingStep::Verify {
            return Err(OnboardingError::WrongStep);
        }
        let remaining = self.resend_remaining(now);
        if remaining > 0 {
            return Err(OnboardingError::CooldownActive(remaining));
        }

        let code = (self.code_gen)();
        self.generated_code = Some(code.clone());

        self.email_service
            .send_code(self.email.trim(), &self.name, &code)
            .await
            .map_err(|_| OnboardingError::DeliveryFailed)?;

        self.resend_deadline = Some(now + RESEND_COOLDOWN);
        Ok(())
    }

    pub fn back_to_email(&mut self) -> Result<(), OnboardingError> {
        if self.step != OnboardingStep::Verify {
            return Err(OnboardingError::WrongStep);
        }
        self.otp.clear();
        self.inline_error = None;
        self.step = OnboardingStep::Email;
        Ok(())
    }

    // --- Success ---

    /// Builds the final profile from the collected details. Only valid once
    /// verification has succeeded; the caller hands the result to
    /// `AppStore::login`.
    pub fn finish(&self) -> Result<User, OnboardingError> {
        if self.step != OnboardingStep::Success {
            return Err(OnboardingError::WrongStep);
        }
        let email = self.email.trim().to_string();
        Ok(User {
            name: self.name.trim().to_string(),
            email: email.clone(),
            school_email: Some(email),
            avatar: self.avatar.clone(),
            provider: Provider::Email,
            is_verified: Some(true),
        })
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{EmailDeliveryService, PortError, PortResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Mock delivery port: counts sends and can be flipped to fail.
    #[derive(Default)]
    struct MockEmail {
        sent: AtomicUsize,
        failing: AtomicBool,
    }

    #[async_trait]
    impl EmailDeliveryService for MockEmail {
        async fn send_code(&self, _to: &str, _name: &str, _code: &str) -> PortResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(PortError::Unexpected("delivery down".to_string()));
            }
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn fixed_code(code: &'static str) -> CodeGenerator {
        Box::new(move || code.to_string())
    }

    fn flow_with(email: Arc<MockEmail>, code: &'static str, bypass: bool) -> OnboardingFlow {
        OnboardingFlow::new(email, fixed_code(code), bypass)
    }

    fn type_code(flow: &mut OnboardingFlow, code: &str) -> VerifyOutcome {
        let mut outcome = VerifyOutcome::Incomplete;
        for c in code.chars() {
            outcome = flow.enter_digit(c);
        }
        outcome
    }

    #[tokio::test]
    async fn happy_path_produces_a_verified_email_user() {
        let email = Arc::new(MockEmail::default());
        let mut flow = flow_with(email.clone(), "424242", false);
        let now = Instant::now();

        flow.set_name("Ada Lovelace");
        flow.submit_identity().unwrap();
        flow.set_email("ada@school.edu");
        flow.submit_email(now).await.unwrap();
        assert_eq!(flow.step(), OnboardingStep::Verify);

        assert_eq!(type_code(&mut flow, "424242"), VerifyOutcome::Verified);
        assert_eq!(flow.step(), OnboardingStep::Success);

        let user = flow.finish().unwrap();
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.email, "ada@school.edu");
        assert_eq!(user.provider, Provider::Email);
        assert_eq!(user.is_verified, Some(true));
        assert_eq!(email.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_name_cannot_leave_identity() {
        let mut flow = flow_with(Arc::new(MockEmail::default()), "111111", false);
        flow.set_name("   ");
        assert!(matches!(
            flow.submit_identity(),
            Err(OnboardingError::NameRequired)
        ));
        assert_eq!(flow.step(), OnboardingStep::Identity);
    }

    #[tokio::test]
    async fn address_without_at_sign_is_rejected() {
        let mut flow = flow_with(Arc::new(MockEmail::default()), "111111", false);
        flow.set_name("Ada");
        flow.submit_identity().unwrap();
        flow.set_email("not-an-address");
        assert!(matches!(
            flow.submit_email(Instant::now()).await,
            Err(OnboardingError::InvalidEmail)
        ));
        assert_eq!(flow.step(), OnboardingStep::Email);
    }

    #[tokio::test]
    async fn delivery_failure_stays_in_email_step() {
        let email = Arc::new(MockEmail::default());
        email.failing.store(true, Ordering::SeqCst);
        let mut flow = flow_with(email, "111111", false);
        flow.set_name("Ada");
        flow.submit_identity().unwrap();
        flow.set_email("ada@school.edu");

        assert!(matches!(
            flow.submit_email(Instant::now()).await,
            Err(OnboardingError::DeliveryFailed)
        ));
        assert_eq!(flow.step(), OnboardingStep::Email);
    }

    #[tokio::test]
    async fn mismatch_clears_cells_and_allows_retry() {
        let mut flow = flow_with(Arc::new(MockEmail::default()), "424242", false);
        let now = Instant::now();
        flow.set_name("Ada");
        flow.submit_identity().unwrap();
        flow.set_email("ada@school.edu");
        flow.submit_email(now).await.unwrap();

        assert_eq!(type_code(&mut flow, "999999"), VerifyOutcome::Mismatch);
        assert_eq!(flow.step(), OnboardingStep::Verify);
        assert!(flow.inline_error().is_some());
        assert_eq!(flow.otp().focus(), 0);
        assert!(flow.otp().cells().iter().all(|c| c.is_none()));

        // The right code still goes through afterwards.
        assert_eq!(type_code(&mut flow, "424242"), VerifyOutcome::Verified);
    }

    #[tokio::test]
    async fn bypass_code_works_only_with_the_debug_flag() {
        let now = Instant::now();

        let mut flagged = flow_with(Arc::new(MockEmail::default()), "424242", true);
        flagged.set_name("Ada");
        flagged.submit_identity().unwrap();
        flagged.set_email("ada@school.edu");
        flagged.submit_email(now).await.unwrap();
        assert_eq!(type_code(&mut flagged, "123456"), VerifyOutcome::Verified);

        let mut unflagged = flow_with(Arc::new(MockEmail::default()), "424242", false);
        unflagged.set_name("Ada");
        unflagged.submit_identity().unwrap();
        unflagged.set_email("ada@school.edu");
        unflagged.submit_email(now).await.unwrap();
        assert_eq!(type_code(&mut unflagged, "123456"), VerifyOutcome::Mismatch);
    }

    #[tokio::test]
    async fn resend_is_gated_by_the_cooldown() {
        let email = Arc::new(MockEmail::default());
        let mut flow = flow_with(email.clone(), "424242", false);
        let start = Instant::now();
        flow.set_name("Ada");
        flow.submit_identity().unwrap();
        flow.set_email("ada@school.edu");
        flow.submit_email(start).await.unwrap();

        // Disabled immediately after entering Verify.
        assert!(flow.resend_remaining(start) > 0);
        assert!(matches!(
            flow.resend(start).await,
            Err(OnboardingError::CooldownActive(_))
        ));
        assert_eq!(email.sent.load(Ordering::SeqCst), 1);

        // After the window elapses, resend goes out and the cooldown restarts.
        let later = start + RESEND_COOLDOWN + Duration::from_secs(1);
        assert_eq!(flow.resend_remaining(later), 0);
        flow.resend(later).await.unwrap();
        assert_eq!(email.sent.load(Ordering::SeqCst), 2);
        assert_eq!(flow.resend_remaining(later), RESEND_COOLDOWN.as_secs());
    }

    #[tokio::test]
    async fn backward_transitions_reset_the_input() {
        let mut flow = flow_with(Arc::new(MockEmail::default()), "424242", false);
        let now = Instant::now();
        flow.set_name("Ada");
        flow.submit_identity().unwrap();
        flow.set_email("ada@school.edu");
        flow.submit_email(now).await.unwrap();

        flow.enter_digit('4');
        flow.back_to_email().unwrap();
        assert_eq!(flow.step(), OnboardingStep::Email);
        assert!(flow.otp().cells().iter().all(|c| c.is_none()));

        flow.back_to_identity().unwrap();
        assert_eq!(flow.step(), OnboardingStep::Identity);
    }

    #[test]
    fn otp_backspace_moves_back_over_empty_cells() {
        let mut otp = OtpInput::new();
        otp.enter_digit('1');
        otp.enter_digit('2');
        assert_eq!(otp.focus(), 2);

        // Focused cell is empty: move back.
        otp.backspace();
        assert_eq!(otp.focus(), 1);
        // Now occupied: clear in place.
        otp.backspace();
        assert_eq!(otp.focus(), 1);
        assert!(otp.cells()[1].is_none());
    }

    #[test]
    fn otp_ignores_non_digits() {
        let mut otp = OtpInput::new();
        assert!(otp.enter_digit('x').is_none());
        assert_eq!(otp.focus(), 0);
    }

    #[test]
    fn finish_outside_success_is_rejected() {
        let flow = flow_with(Arc::new(MockEmail::default()), "424242", false);
        assert!(matches!(flow.finish(), Err(OnboardingError::WrongStep)));
    }
}
