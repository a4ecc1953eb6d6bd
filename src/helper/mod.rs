pub mod form_helpers;
pub mod user_helpers;
pub mod validation_helpers;
