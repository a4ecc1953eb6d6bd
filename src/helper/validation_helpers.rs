use crate::models::db_operations::users_db_operations;
use crate::models::forms::{FormErrors, RegistrationForm, UpdateUserForm};
use regex::Regex;
use rusqlite::{Connection, Error as RusqliteError};
use std::sync::OnceLock;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_EMAIL: &str = "Please enter a valid email address.";
pub const PASSWORD_MISMATCH: &str = "Passwords do not match.";
pub const USERNAME_TAKEN: &str = "This username is already taken.";
pub const EMAIL_TAKEN: &str = "This email address is already registered.";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$").expect("email pattern is valid")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Returns false (and records the error) when `value` is blank.
fn check_required(errors: &mut FormErrors, field: &'static str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, REQUIRED);
        return false;
    }
    true
}

fn check_identity(
    conn: &Connection,
    errors: &mut FormErrors,
    email: &str,
    username: &str,
    exclude_id: Option<i64>,
) -> Result<(), RusqliteError> {
    if check_required(errors, "email", email) {
        if !is_valid_email(email) {
            errors.add("email", INVALID_EMAIL);
        }
        if users_db_operations::email_taken(conn, email, exclude_id)? {
            errors.add("email", EMAIL_TAKEN);
        }
    }
    if check_required(errors, "username", username)
        && users_db_operations::username_taken(conn, username, exclude_id)?
    {
        errors.add("username", USERNAME_TAKEN);
    }
    Ok(())
}

pub fn validate_registration(conn: &Connection, form: &RegistrationForm) -> Result<FormErrors, RusqliteError> {
    let mut errors = FormErrors::default();
    check_identity(conn, &mut errors, &form.email, &form.username, None)?;

    if check_required(&mut errors, "password", &form.password) && form.password != form.pass_confirm {
        errors.add("password", PASSWORD_MISMATCH);
    }
    check_required(&mut errors, "pass_confirm", &form.pass_confirm);
    Ok(errors)
}

/// Uniqueness checks skip `user_id`, so a user may keep their own email and username.
pub fn validate_account_update(
    conn: &Connection,
    user_id: i64,
    form: &UpdateUserForm,
) -> Result<FormErrors, RusqliteError> {
    let mut errors = FormErrors::default();
    check_identity(conn, &mut errors, &form.email, &form.username, Some(user_id))?;

    if form.password != form.pass_confirm {
        errors.add("password", PASSWORD_MISMATCH);
    }
    Ok(errors)
}
