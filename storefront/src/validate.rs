//! Local input checks run before any request is made

pub const OTP_LENGTH: usize = 6;

/// Syntactic email check: one `@`, non-empty local part, dotted domain.
pub fn email(input: &str) -> Result<(), String> {
    let input = input.trim();
    let Some((local, domain)) = input.split_once('@') else {
        return Err("Please enter a valid email address.".to_string());
    };
    let domain_ok = domain.contains('.') && domain.split('.').all(|label| !label.is_empty());
    if local.is_empty() || domain.contains('@') || !domain_ok || input.contains(char::is_whitespace)
    {
        return Err("Please enter a valid email address.".to_string());
    }
    Ok(())
}

pub fn password(input: &str) -> Result<(), String> {
    if input.is_empty() {
        return Err("Please enter your password.".to_string());
    }
    Ok(())
}

/// The OTP must be exactly six ASCII digits.
pub fn otp(input: &str) -> Result<(), String> {
    if input.len() != OTP_LENGTH || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("Please enter the {OTP_LENGTH}-digit code."));
    }
    Ok(())
}

pub fn accepted_terms(accepted: bool) -> Result<(), String> {
    if !accepted {
        return Err("You must accept the terms and conditions.".to_string());
    }
    Ok(())
}
