//! Auth state machine
//!
//! Requests are checked locally first: a validation failure sets `error`
//! and emits nothing. While one auth request is in flight further requests
//! are ignored, and outcomes that no longer match the in-flight operation
//! (for example a login that settles after logout) are dropped.

use state_dispatch::DispatchResult;

use crate::action::Action;
use crate::effect::Effect;
use crate::error::ErrorInfo;
use crate::model::UserRef;
use crate::state::{AuthOp, Session, TokenSource, VERIFIED_TOKEN};
use crate::validate;

fn reject(session: &mut Session, message: String) -> DispatchResult<Effect> {
    session.error = Some(ErrorInfo::validation(message));
    DispatchResult::changed()
}

fn begin(session: &mut Session, op: AuthOp, effect: Effect) -> DispatchResult<Effect> {
    session.operation = Some(op);
    session.loading = true;
    session.error = None;
    DispatchResult::changed_with(effect)
}

/// Clear the in-flight marker if `op` is the operation that settled
fn finish(session: &mut Session, op: AuthOp) -> bool {
    if session.operation != Some(op) {
        tracing::debug!(?op, "Dropping auth outcome with no matching request");
        return false;
    }
    session.operation = None;
    session.loading = false;
    true
}

pub(super) fn reduce(session: &mut Session, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::SessionLogin { email, password } => {
            if session.operation.is_some() {
                return DispatchResult::unchanged();
            }
            if let Err(message) = validate::email(&email).and_then(|_| validate::password(&password))
            {
                return reject(session, message);
            }
            let email = email.trim().to_string();
            begin(session, AuthOp::Login, Effect::Login { email, password })
        }
        Action::SessionLoginDidSucceed { token, user } => {
            if !finish(session, AuthOp::Login) {
                return DispatchResult::unchanged();
            }
            session.token = Some(token.clone());
            session.token_source = Some(TokenSource::Login);
            session.user = Some(user);
            session.error = None;
            session.pending_verification = false;
            session.pending_email = None;
            DispatchResult::changed_with(Effect::StoreToken { token })
        }
        Action::SessionLoginDidFail(error) => {
            if !finish(session, AuthOp::Login) {
                return DispatchResult::unchanged();
            }
            session.error = Some(error);
            DispatchResult::changed()
        }

        Action::SessionRegister {
            email,
            password,
            accepted_terms,
        } => {
            if session.operation.is_some() {
                return DispatchResult::unchanged();
            }
            let checked = validate::accepted_terms(accepted_terms)
                .and_then(|_| validate::email(&email))
                .and_then(|_| validate::password(&password));
            if let Err(message) = checked {
                return reject(session, message);
            }
            let email = email.trim().to_string();
            begin(
                session,
                AuthOp::Register,
                Effect::Register {
                    email,
                    password,
                    accepted_terms,
                },
            )
        }
        Action::SessionRegisterDidSucceed { email } => {
            if !finish(session, AuthOp::Register) {
                return DispatchResult::unchanged();
            }
            session.pending_verification = true;
            session.pending_email = Some(email);
            DispatchResult::changed()
        }
        Action::SessionRegisterDidFail(error) => {
            if !finish(session, AuthOp::Register) {
                return DispatchResult::unchanged();
            }
            session.error = Some(error);
            DispatchResult::changed()
        }

        Action::SessionVerifyOtp { email, otp } => {
            if session.operation.is_some() {
                return DispatchResult::unchanged();
            }
            if let Err(message) = validate::email(&email).and_then(|_| validate::otp(&otp)) {
                return reject(session, message);
            }
            let email = email.trim().to_string();
            session.pending_verification = true;
            session.pending_email = Some(email.clone());
            begin(session, AuthOp::VerifyOtp, Effect::VerifyOtp { email, otp })
        }
        Action::SessionVerifyDidSucceed => {
            if !finish(session, AuthOp::VerifyOtp) {
                return DispatchResult::unchanged();
            }
            let email = session.pending_email.take().unwrap_or_default();
            session.token = Some(VERIFIED_TOKEN.to_string());
            session.token_source = Some(TokenSource::OtpVerified);
            session.user = Some(UserRef {
                email,
                ..UserRef::default()
            });
            session.pending_verification = false;
            session.error = None;
            DispatchResult::changed()
        }
        Action::SessionVerifyDidFail(error) => {
            if !finish(session, AuthOp::VerifyOtp) {
                return DispatchResult::unchanged();
            }
            session.error = Some(error);
            DispatchResult::changed()
        }

        Action::SessionRestore => {
            if session.token.is_some() {
                return DispatchResult::unchanged();
            }
            DispatchResult::effect(Effect::RestoreSession)
        }
        Action::SessionDidRestore { token } => {
            if session.token.is_some() || session.operation.is_some() {
                return DispatchResult::unchanged();
            }
            tracing::info!("Restored saved session without revalidation");
            session.token = Some(token);
            session.token_source = Some(TokenSource::Restored);
            DispatchResult::changed()
        }

        Action::SessionLogout => {
            let changed = *session != Session::default();
            *session = Session::default();
            DispatchResult {
                changed,
                effects: vec![Effect::ForgetToken],
            }
        }
        Action::SessionClearError => {
            if session.error.take().is_some() {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        _ => DispatchResult::unchanged(),
    }
}
