use serde::Deserialize;
use serde_json::Value;

use super::validate::FieldErrors;
use crate::auth::Role;
use crate::database::Record;

/// Extra keys (including any attempt to pick a `role`) are ignored
#[derive(Debug, Deserialize)]
pub struct CustomerRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StaffRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

fn check_identity(errors: &mut FieldErrors, name: &str, email: &str, password: &str) {
    errors.check(!name.trim().is_empty(), "name", "is required");
    check_credentials(errors, email, password);
}

fn check_credentials(errors: &mut FieldErrors, email: &str, password: &str) {
    let email = email.trim();
    errors.check(!email.is_empty(), "email", "is required");
    errors.check(email.contains('@'), "email", "must be a valid email address");
    errors.check(!password.is_empty(), "password", "is required");
}

impl CustomerRegistration {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_identity(&mut errors, &self.name, &self.email, &self.password);
        errors
    }

    pub fn into_record(self, password_hash: String) -> Record {
        let mut record = Record::new();
        record.insert("name".into(), Value::String(self.name.trim().to_string()));
        record.insert("email".into(), Value::String(self.email.trim().to_string()));
        record.insert("address".into(), self.address.map(Value::String).unwrap_or(Value::Null));
        record.insert("phone".into(), self.phone.map(Value::String).unwrap_or(Value::Null));
        record.insert("password".into(), Value::String(password_hash));
        record.insert("role".into(), Value::String(Role::Customer.to_string()));
        record
    }
}

impl StaffRegistration {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_identity(&mut errors, &self.name, &self.email, &self.password);
        errors
    }

    /// Registration always yields plain staff; admins are minted from the CLI
    pub fn into_record(self, password_hash: String, role: Role) -> Record {
        let mut record = Record::new();
        record.insert("name".into(), Value::String(self.name.trim().to_string()));
        record.insert("email".into(), Value::String(self.email.trim().to_string()));
        record.insert("password".into(), Value::String(password_hash));
        record.insert("role".into(), Value::String(role.to_string()));
        record
    }
}

impl Login {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_credentials(&mut errors, &self.email, &self.password);
        errors
    }
}
