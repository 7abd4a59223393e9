//! The request body shared by the create and update transaction endpoints.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::{
    Error, FieldErrors, TransactionType,
    auth::UserId,
    category::{CategoryId, category_belongs_to_user},
    timestamp::parse_timestamp,
    transaction::{NewTransaction, validate_amount, validate_description},
};

/// The body of a create or update transaction request, before validation.
///
/// Every field defaults to empty so that missing or mistyped fields are
/// reported against the field instead of rejecting the whole body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForm {
    /// The ID of a category owned by the user.
    #[serde(default)]
    pub category_id: String,
    /// Either "expense" or "income".
    #[serde(default, rename = "type")]
    pub type_: String,
    /// A positive JSON number.
    #[serde(default)]
    pub amount: Value,
    /// What the transaction was for.
    #[serde(default)]
    pub description: String,
    /// An RFC 3339 timestamp.
    #[serde(default)]
    pub date: String,
}

impl TransactionForm {
    /// Validate the shape of every field.
    ///
    /// This does not check that the category exists, see
    /// [TransactionForm::validate_for_user].
    ///
    /// # Errors
    ///
    /// Returns [Error::Validation] listing each invalid field.
    pub fn validate(&self) -> Result<NewTransaction, Error> {
        let mut errors = FieldErrors::new();

        let category_id = errors.check("categoryId", parse_category_id(&self.category_id));
        let type_ = errors.check("type", self.type_.parse::<TransactionType>());
        let amount = errors.check("amount", parse_amount(&self.amount));
        let description = errors.check("description", validate_description(&self.description));
        let date = errors.check("date", parse_timestamp(&self.date));

        match (category_id, type_, amount, description, date) {
            (Some(category_id), Some(type_), Some(amount), Some(description), Some(date)) => {
                Ok(NewTransaction {
                    category_id,
                    type_,
                    amount,
                    description,
                    date,
                })
            }
            _ => Err(Error::Validation(errors)),
        }
    }

    /// Validate the form and check that its category is owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [Error::Validation] listing each invalid field, with a
    /// "categoryId" error if the category is someone else's or does not exist.
    pub fn validate_for_user(
        &self,
        user_id: UserId,
        connection: &Connection,
    ) -> Result<NewTransaction, Error> {
        let new_transaction = self.validate()?;

        if category_belongs_to_user(new_transaction.category_id, user_id, connection)? {
            Ok(new_transaction)
        } else {
            Err(Error::Validation(FieldErrors::single(
                "categoryId",
                Error::UnknownCategory.to_string(),
            )))
        }
    }
}

impl From<&NewTransaction> for TransactionForm {
    fn from(transaction: &NewTransaction) -> Self {
        Self {
            category_id: transaction.category_id.to_string(),
            type_: transaction.type_.to_string(),
            amount: Value::from(transaction.amount),
            description: transaction.description.clone(),
            // Years outside 0..=9999 cannot be formatted.
            date: transaction.date.format(&Rfc3339).unwrap_or_default(),
        }
    }
}

fn parse_category_id(text: &str) -> Result<CategoryId, Error> {
    let text = text.trim();

    if text.is_empty() {
        return Err(Error::MissingCategory);
    }

    Uuid::parse_str(text).map_err(|_| Error::UnknownCategory)
}

fn parse_amount(value: &Value) -> Result<f64, Error> {
    value
        .as_f64()
        .ok_or(Error::InvalidAmount)
        .and_then(validate_amount)
}
