use serde::Deserialize;
use serde_json::Value;

use super::validate::{self, char_len_between, FieldErrors};
use super::NewRecord;
use crate::database::Record;
use crate::filter::{parse_timestamp, FieldValue};
use crate::resources::{Resource, BOOKINGS};

pub const DEFAULT_STATUS: &str = "pending";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Booking {
    pub cust_id: i64,
    pub service_id: i64,
    pub booking_date: String,
    pub notes: Option<String>,
}

impl NewRecord for Booking {
    fn resource() -> &'static Resource {
        &BOOKINGS
    }

    fn validate(&self, errors: &mut FieldErrors) {
        errors.check(self.cust_id > 0, "custId", "must be a positive integer");
        errors.check(self.service_id > 0, "serviceId", "must be a positive integer");
        errors.check(parse_timestamp(&self.booking_date).is_some(), "bookingDate", "must be a valid date");
        if let Some(notes) = &self.notes {
            errors.check(char_len_between(notes, 0, 500), "notes", "must be at most 500 characters");
        }
    }

    fn into_record(self) -> Record {
        let booking_date = parse_timestamp(&self.booking_date)
            .map(|t| FieldValue::Timestamp(t).to_json())
            .unwrap_or(Value::Null);

        let mut record = Record::new();
        record.insert("custId".into(), Value::from(self.cust_id));
        record.insert("serviceId".into(), Value::from(self.service_id));
        record.insert("bookingDate".into(), booking_date);
        record.insert("status".into(), Value::from(DEFAULT_STATUS));
        record.insert("notes".into(), self.notes.map(Value::String).unwrap_or(Value::Null));
        record
    }

    fn validate_changes(changes: &Record, errors: &mut FieldErrors) {
        validate::id_change(changes, errors, "custId");
        validate::id_change(changes, errors, "serviceId");
        validate::not_null_change(changes, errors, "bookingDate");
        validate::text_change(changes, errors, "status");
        if let Some(notes) = changes.get("notes").and_then(Value::as_str) {
            errors.check(char_len_between(notes, 0, 500), "notes", "must be at most 500 characters");
        }
    }
}
