//! Simulated phone/OTP sign-in.
//!
//! Nothing leaves the machine: the "sent" code is generated locally and shown on screen. The
//! view owns the timers; this type only tracks which step the form is on and what code is
//! expected.

use rand::Rng;

use crate::error::ValidationError;
use crate::notice::{Notice, NoticeQueue};
use crate::validation::{validate_country_code, validate_otp, validate_phone_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStep {
    #[default]
    CollectingPhone,
    CollectingOtp,
}

/// Which phone-step field a validation error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneField {
    CountryCode,
    PhoneNumber,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified { identity: String },
    Mismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingCode {
    identity: String,
    code: String,
}

#[derive(Debug, Default)]
pub struct AuthFlow {
    step: AuthStep,
    pending: Option<PendingCode>,
    sending: bool,
    verifying: bool,
    notices: NoticeQueue,
}

impl AuthFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> AuthStep {
        self.step
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn is_verifying(&self) -> bool {
        self.verifying
    }

    /// The code the user is expected to type, once it has been "sent".
    pub fn simulated_code(&self) -> Option<&str> {
        match self.step {
            AuthStep::CollectingOtp => self.pending.as_ref().map(|pending| pending.code.as_str()),
            AuthStep::CollectingPhone => None,
        }
    }

    pub fn begin_send(
        &mut self,
        country_code: &str,
        phone_number: &str,
    ) -> Result<(), (PhoneField, ValidationError)> {
        self.begin_send_with(country_code, phone_number, &mut rand::thread_rng())
    }

    /// Validates the phone step and holds a fresh code. The caller completes the step with
    /// [`AuthFlow::complete_send`] once its delay elapses.
    pub fn begin_send_with<R: Rng + ?Sized>(
        &mut self,
        country_code: &str,
        phone_number: &str,
        rng: &mut R,
    ) -> Result<(), (PhoneField, ValidationError)> {
        let country_code = country_code.trim();
        let phone_number = phone_number.trim();
        validate_country_code(country_code).map_err(|error| (PhoneField::CountryCode, error))?;
        validate_phone_number(phone_number).map_err(|error| (PhoneField::PhoneNumber, error))?;

        let code = rng.gen_range(100_000..=999_999).to_string();
        let identity = format!("{country_code}{phone_number}");
        tracing::info!(identity = %identity, "simulated OTP requested");
        self.pending = Some(PendingCode { identity, code });
        self.sending = true;
        Ok(())
    }

    pub fn complete_send(&mut self) {
        if !self.sending {
            return;
        }
        self.sending = false;
        if self.pending.is_some() {
            self.step = AuthStep::CollectingOtp;
            self.notices.push(Notice::success("OTP sent! (Simulated)"));
        }
    }

    pub fn begin_verify(&mut self, otp: &str) -> Result<(), ValidationError> {
        let otp = otp.trim();
        validate_otp(otp)?;
        self.verifying = true;
        self.notices.push(Notice::info(format!("Verifying OTP {otp}...")));
        Ok(())
    }

    /// Compares `otp` with the held code. A match resets the flow for the next sign-in.
    pub fn finish_verify(&mut self, otp: &str) -> VerifyOutcome {
        self.verifying = false;
        let otp = otp.trim();
        match &self.pending {
            Some(pending) if self.step == AuthStep::CollectingOtp && pending.code == otp => {
                let identity = pending.identity.clone();
                tracing::info!(identity = %identity, "simulated OTP verified");
                self.notices.push(Notice::success("Login successful!"));
                self.step = AuthStep::CollectingPhone;
                self.pending = None;
                VerifyOutcome::Verified { identity }
            }
            _ => {
                tracing::info!("simulated OTP mismatch");
                self.notices
                    .push(Notice::error("Invalid OTP. Please try again."));
                VerifyOutcome::Mismatch
            }
        }
    }

    /// Returns to the phone step and forgets the held code.
    pub fn back(&mut self) {
        self.step = AuthStep::CollectingPhone;
        self.pending = None;
        self.sending = false;
        self.verifying = false;
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn sent_flow() -> AuthFlow {
        let mut flow = AuthFlow::new();
        flow.begin_send("+1", "9876543210").unwrap();
        flow.complete_send();
        flow
    }

    #[test]
    fn matching_code_signs_in_with_full_identity() {
        let mut flow = sent_flow();
        assert_eq!(flow.step(), AuthStep::CollectingOtp);

        let code = flow.simulated_code().unwrap().to_string();
        assert_eq!(code.len(), 6);
        assert!(code.bytes().all(|b| b.is_ascii_digit()));

        flow.begin_verify(&code).unwrap();
        assert_eq!(
            flow.finish_verify(&code),
            VerifyOutcome::Verified {
                identity: "+19876543210".to_string()
            }
        );
        assert_eq!(flow.step(), AuthStep::CollectingPhone);
        assert!(flow.simulated_code().is_none());
    }

    #[test]
    fn other_codes_are_rejected_and_retries_are_allowed() {
        let mut flow = sent_flow();
        let code = flow.simulated_code().unwrap().to_string();
        let wrong = if code == "111111" { "222222" } else { "111111" };

        assert_eq!(flow.finish_verify(wrong), VerifyOutcome::Mismatch);
        assert_eq!(flow.step(), AuthStep::CollectingOtp);
        assert_eq!(flow.simulated_code(), Some(code.as_str()));
        assert!(matches!(
            flow.finish_verify(&code),
            VerifyOutcome::Verified { .. }
        ));
    }

    #[test]
    fn generated_codes_stay_in_six_digit_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let mut flow = AuthFlow::new();
            flow.begin_send_with("+44", "7700900123", &mut rng).unwrap();
            flow.complete_send();
            let code: u32 = flow.simulated_code().unwrap().parse().unwrap();
            assert!((100_000..=999_999).contains(&code));
        }
    }

    #[test]
    fn invalid_phone_step_reports_the_field() {
        let mut flow = AuthFlow::new();
        assert_eq!(
            flow.begin_send("", "9876543210"),
            Err((PhoneField::CountryCode, ValidationError::MissingCountryCode))
        );
        assert_eq!(
            flow.begin_send("+1", "12345"),
            Err((PhoneField::PhoneNumber, ValidationError::PhoneTooShort))
        );
        assert!(!flow.is_sending());
        flow.complete_send();
        assert_eq!(flow.step(), AuthStep::CollectingPhone);
    }

    #[test]
    fn back_discards_the_held_code() {
        let mut flow = sent_flow();
        let code = flow.simulated_code().unwrap().to_string();

        flow.back();

        assert_eq!(flow.step(), AuthStep::CollectingPhone);
        assert_eq!(flow.finish_verify(&code), VerifyOutcome::Mismatch);
    }

    #[test]
    fn verify_validates_before_starting() {
        let mut flow = sent_flow();
        assert_eq!(flow.begin_verify("12 34"), Err(ValidationError::OtpLength));
        assert!(!flow.is_verifying());
        flow.take_notices();

        flow.begin_verify("123456").unwrap();
        assert!(flow.is_verifying());
        assert_eq!(
            flow.take_notices(),
            vec![Notice::info("Verifying OTP 123456...")]
        );
    }
}
