use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

/// Validation messages keyed by form field name.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Serialize for FormErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

fn field(parsed: &HashMap<String, String>, name: &str) -> String {
    parsed.get(name).cloned().unwrap_or_default()
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct RegistrationForm {
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing)]
    pub pass_confirm: String,
}

impl RegistrationForm {
    pub fn from_fields(parsed: &HashMap<String, String>) -> Self {
        RegistrationForm {
            email: field(parsed, "email").trim().to_string(),
            username: field(parsed, "username").trim().to_string(),
            password: field(parsed, "password"),
            pass_confirm: field(parsed, "pass_confirm"),
        }
    }
}

/// Account edit form. An empty `password` keeps the stored one.
#[derive(Debug, Default, Clone, Serialize)]
pub struct UpdateUserForm {
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing)]
    pub pass_confirm: String,
}

impl UpdateUserForm {
    pub fn from_fields(parsed: &HashMap<String, String>) -> Self {
        UpdateUserForm {
            email: field(parsed, "email").trim().to_string(),
            username: field(parsed, "username").trim().to_string(),
            password: field(parsed, "password"),
            pass_confirm: field(parsed, "pass_confirm"),
        }
    }

    pub fn new_password(&self) -> Option<&str> {
        (!self.password.is_empty()).then_some(self.password.as_str())
    }
}
