use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::validate::{self, char_len_between, is_money, FieldErrors};
use super::NewRecord;
use crate::database::Record;
use crate::filter::FieldValue;
use crate::resources::{Resource, PAYMENTS};

pub const PAYMENT_METHODS: [&str; 3] = ["card", "cash", "bank_transfer"];
pub const DEFAULT_STATUS: &str = "pending";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Payment {
    pub booking_id: i64,
    pub amount: Decimal,
    pub payment_method: String,
    pub transaction_id: Option<String>,
}

fn known_method(method: &str) -> bool {
    PAYMENT_METHODS.contains(&method)
}

impl NewRecord for Payment {
    fn resource() -> &'static Resource {
        &PAYMENTS
    }

    fn validate(&self, errors: &mut FieldErrors) {
        errors.check(self.booking_id > 0, "bookingId", "must be a positive integer");
        errors.check(is_money(&self.amount), "amount", "must be positive with at most 2 decimals");
        errors.check(
            known_method(&self.payment_method),
            "paymentMethod",
            "must be one of card, cash, bank_transfer",
        );
        if let Some(transaction_id) = &self.transaction_id {
            errors.check(char_len_between(transaction_id, 0, 100), "transactionId", "must be at most 100 characters");
        }
    }

    fn into_record(self) -> Record {
        let mut record = Record::new();
        record.insert("bookingId".into(), Value::from(self.booking_id));
        record.insert("amount".into(), FieldValue::Decimal(self.amount).to_json());
        record.insert("paymentMethod".into(), Value::String(self.payment_method));
        record.insert("status".into(), Value::from(DEFAULT_STATUS));
        record.insert(
            "transactionId".into(),
            self.transaction_id.map(Value::String).unwrap_or(Value::Null),
        );
        record
    }

    fn validate_changes(changes: &Record, errors: &mut FieldErrors) {
        validate::id_change(changes, errors, "bookingId");
        validate::text_change(changes, errors, "status");
        if let Some(method) = changes.get("paymentMethod") {
            let ok = method.as_str().map_or(false, known_method);
            errors.check(ok, "paymentMethod", "must be one of card, cash, bank_transfer");
        }
        match validate::decimal_change(changes, "amount") {
            Some(Some(amount)) => errors.check(is_money(&amount), "amount", "must be positive with at most 2 decimals"),
            Some(None) => errors.add("amount", "is required"),
            None => {}
        }
    }
}
