//! Request bodies for each resource and the rules they are checked against
//!
//! Every create body has its own schema. Unknown keys are rejected on create;
//! on update the resource's writable whitelist decides what is applied.

pub mod account;
pub mod booking;
pub mod order;
pub mod payment;
pub mod product;
pub mod review;
pub mod service;
pub mod validate;

use serde::de::DeserializeOwned;

use crate::database::Record;
use crate::error::ApiError;
use crate::resources::Resource;

pub use account::{CustomerRegistration, Login, StaffRegistration};
pub use booking::Booking;
pub use order::Order;
pub use payment::Payment;
pub use product::Product;
pub use review::Review;
pub use service::Service;
pub use validate::FieldErrors;

/// A resource create body
pub trait NewRecord: DeserializeOwned + Send + 'static {
    fn resource() -> &'static Resource;

    fn validate(&self, errors: &mut FieldErrors);

    /// Column values to insert, defaults applied
    fn into_record(self) -> Record;

    /// Checks for a partial update that has already passed the writable whitelist
    fn validate_changes(_changes: &Record, _errors: &mut FieldErrors) {}
}

/// Validate a create body and turn it into a storable record
pub fn prepare<T: NewRecord>(body: T) -> Result<Record, ApiError> {
    let mut errors = FieldErrors::new();
    body.validate(&mut errors);
    errors.finish()?;
    Ok(body.into_record())
}

/// Whitelist and validate a partial update
pub fn prepare_changes<T: NewRecord>(body: &Record) -> Result<Record, ApiError> {
    let resource = T::resource();
    let changes = resource.writable_changes(body);
    if changes.is_empty() {
        return Err(ApiError::bad_request(format!(
            "No updatable {} fields supplied",
            resource.label.to_lowercase()
        )));
    }

    let mut errors = FieldErrors::new();
    for (key, value) in &changes {
        if let Some(column) = resource.column(key) {
            if column.value.from_json(value).is_none() {
                errors.add(key, format!("expected {}", column.value.expected()));
            }
        }
    }
    T::validate_changes(&changes, &mut errors);
    errors.finish()?;
    Ok(changes)
}

/// Serialize a struct body into a record
fn to_record<S: serde::Serialize>(body: &S) -> Record {
    match serde_json::to_value(body) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => Record::new(),
    }
}
