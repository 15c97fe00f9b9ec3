use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use super::validate::{self, char_len_between, FieldErrors};
use super::NewRecord;
use crate::database::Record;
use crate::filter::FieldValue;
use crate::resources::{Resource, REVIEWS};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Review {
    pub cust_id: i64,
    pub service_id: i64,
    pub rating: i64,
    pub comment: Option<String>,
}

fn valid_rating(rating: i64) -> bool {
    (1..=5).contains(&rating)
}

impl NewRecord for Review {
    fn resource() -> &'static Resource {
        &REVIEWS
    }

    fn validate(&self, errors: &mut FieldErrors) {
        errors.check(self.cust_id > 0, "custId", "must be a positive integer");
        errors.check(self.service_id > 0, "serviceId", "must be a positive integer");
        errors.check(valid_rating(self.rating), "rating", "must be an integer from 1 to 5");
        if let Some(comment) = &self.comment {
            errors.check(char_len_between(comment, 0, 1000), "comment", "must be at most 1000 characters");
        }
    }

    fn into_record(self) -> Record {
        let mut record = Record::new();
        record.insert("custId".into(), Value::from(self.cust_id));
        record.insert("serviceId".into(), Value::from(self.service_id));
        record.insert("rating".into(), Value::from(self.rating));
        record.insert("comment".into(), self.comment.map(Value::String).unwrap_or(Value::Null));
        record.insert("reviewDate".into(), FieldValue::Timestamp(Utc::now()).to_json());
        record
    }

    fn validate_changes(changes: &Record, errors: &mut FieldErrors) {
        validate::id_change(changes, errors, "custId");
        validate::id_change(changes, errors, "serviceId");
        validate::not_null_change(changes, errors, "reviewDate");
        match validate::integer_change(changes, "rating") {
            Some(Some(rating)) => errors.check(valid_rating(rating), "rating", "must be an integer from 1 to 5"),
            Some(None) => errors.add("rating", "is required"),
            None => {}
        }
        if let Some(comment) = changes.get("comment").and_then(Value::as_str) {
            errors.check(char_len_between(comment, 0, 1000), "comment", "must be at most 1000 characters");
        }
    }
}
