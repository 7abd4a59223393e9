//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, FieldErrors, TransactionType, auth::UserId};

/// The maximum number of characters in a category name.
pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// This function will return an:
    /// - [Error::EmptyCategoryName] if `name` is empty or only whitespace,
    /// - [Error::CategoryNameTooLong] if `name` has more than [MAX_CATEGORY_NAME_LENGTH] characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else if name.chars().count() > MAX_CATEGORY_NAME_LENGTH {
            Err(Error::CategoryNameTooLong)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database identifier for a category.
pub type CategoryId = Uuid;

/// A user's label for grouping transactions (e.g., 'Groceries', 'Salary').
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The category's ID in the application database.
    pub id: CategoryId,
    /// The user that owns the category.
    pub user_id: UserId,
    /// The display name.
    pub name: CategoryName,
    /// Whether the category is for expenses or income.
    #[serde(rename = "type")]
    pub type_: TransactionType,
    /// When the category was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A validated category that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    /// The display name.
    pub name: CategoryName,
    /// Whether the category is for expenses or income.
    pub type_: TransactionType,
}

/// The body of a create category request, before validation.
///
/// Missing fields are left empty so that they are reported as field errors
/// rather than as a malformed body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryForm {
    /// The display name.
    #[serde(default)]
    pub name: String,
    /// Either "expense" or "income".
    #[serde(default, rename = "type")]
    pub type_: String,
}

impl CategoryForm {
    /// Validate every field of the form.
    ///
    /// # Errors
    ///
    /// Returns [Error::Validation] listing each invalid field.
    pub fn validate(&self) -> Result<NewCategory, Error> {
        let mut errors = FieldErrors::new();

        let name = errors.check("name", CategoryName::new(&self.name));
        let type_ = errors.check("type", self.type_.parse::<TransactionType>());

        match (name, type_) {
            (Some(name), Some(type_)) => Ok(NewCategory { name, type_ }),
            _ => Err(Error::Validation(errors)),
        }
    }
}


#[cfg(test)]
mod category_form_tests {
    use crate::{Error, TransactionType};

    use super::{CategoryForm, CategoryName, NewCategory};

    #[test]
    fn validate_succeeds() {
        let form = CategoryForm {
            name: "Groceries".to_owned(),
            type_: "expense".to_owned(),
        };

        assert_eq!(
            form.validate(),
            Ok(NewCategory {
                name: CategoryName::new_unchecked("Groceries"),
                type_: TransactionType::Expense,
            })
        );
    }

    #[test]
    fn validate_reports_both_fields() {
        let form = CategoryForm {
            name: " ".to_owned(),
            type_: "transfer".to_owned(),
        };

        let Err(Error::Validation(errors)) = form.validate() else {
            panic!("expected a validation error");
        };

        assert_eq!(errors.get("name").unwrap().message, "Name is required");
        assert_eq!(
            errors.get("type").unwrap().message,
            "Type must be 'expense' or 'income'"
        );
    }

    #[test]
    fn deserializes_type_key() {
        let form: CategoryForm =
            serde_json::from_str(r#"{"name": "Salary", "type": "income"}"#).unwrap();

        assert_eq!(form.type_, "income");
    }
}
