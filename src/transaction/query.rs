//! Filtering the transaction list by date range and category.

use rusqlite::{Connection, ToSql};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{
    Error, FieldErrors,
    auth::UserId,
    category::CategoryId,
    timestamp::{parse_date_or_timestamp, to_millis},
    transaction::{Transaction, map_transaction_row},
};

/// The optional query parameters of the list transactions endpoint.
///
/// Empty strings are treated the same as missing parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilters {
    /// Only include transactions on or after this date.
    #[serde(default, skip_serializing_if = "is_blank")]
    pub start_date: Option<String>,
    /// Only include transactions on or before this date, including the whole day.
    #[serde(default, skip_serializing_if = "is_blank")]
    pub end_date: Option<String>,
    /// Only include transactions in this category.
    #[serde(default, skip_serializing_if = "is_blank")]
    pub category_id: Option<String>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|text| text.trim().is_empty())
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|text| !text.is_empty())
}

/// The parsed form of [TransactionFilters].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransactionQuery {
    /// Inclusive lower bound on the transaction date.
    pub start: Option<OffsetDateTime>,
    /// Exclusive upper bound on the transaction date.
    pub end: Option<OffsetDateTime>,
    /// Only match transactions in this category.
    pub category_id: Option<CategoryId>,
}

impl TransactionFilters {
    /// Parse the filters into a [TransactionQuery].
    ///
    /// The end date is widened by one day and made exclusive so that a
    /// calendar date includes every transaction on that day. An end date on
    /// the last representable day places no upper bound.
    ///
    /// # Errors
    ///
    /// Returns [Error::Validation] naming each parameter that could not be parsed.
    pub fn parse(&self) -> Result<TransactionQuery, Error> {
        let mut errors = FieldErrors::new();

        let start = non_blank(&self.start_date)
            .map(|text| errors.check("startDate", parse_date_or_timestamp(text)));
        // No upper bound when the day after cannot be represented.
        let end = non_blank(&self.end_date)
            .and_then(|text| errors.check("endDate", parse_date_or_timestamp(text)))
            .and_then(|date| date.checked_add(Duration::days(1)));
        let category_id = non_blank(&self.category_id).map(|text| {
            errors.check(
                "categoryId",
                Uuid::parse_str(text).map_err(|_| Error::UnknownCategory),
            )
        });

        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }

        Ok(TransactionQuery {
            start: start.flatten(),
            end,
            category_id: category_id.flatten(),
        })
    }
}

/// Get the transactions owned by `user_id` that match `query`.
///
/// Transactions are sorted by date with the most recent first, and then in
/// the order they were created.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails or a row cannot be mapped.
pub fn get_transactions(
    user_id: UserId,
    query: &TransactionQuery,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let user_id = user_id.as_uuid();
    let start = query.start.map(to_millis);
    let end = query.end.map(to_millis);

    let mut predicates = vec!["user_id = ?"];
    let mut params: Vec<&dyn ToSql> = vec![&user_id];

    if let Some(start) = &start {
        predicates.push("date >= ?");
        params.push(start);
    }

    if let Some(end) = &end {
        predicates.push("date < ?");
        params.push(end);
    }

    if let Some(category_id) = &query.category_id {
        predicates.push("category_id = ?");
        params.push(category_id);
    }

    let sql = format!(
        "SELECT id, user_id, category_id, type, amount, description, date, created_at \
        FROM \"transaction\" \
        WHERE {} \
        ORDER BY date DESC, rowid ASC",
        predicates.join(" AND ")
    );

    connection
        .prepare(&sql)?
        .query_map(params.as_slice(), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

/// Get the `limit` most recent transactions owned by `user_id`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails or a row cannot be mapped.
pub fn get_recent_transactions(
    user_id: UserId,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, category_id, type, amount, description, date, created_at \
            FROM \"transaction\" \
            WHERE user_id = ?1 \
            ORDER BY date DESC, rowid ASC \
            LIMIT ?2",
        )?
        .query_map((user_id.as_uuid(), limit), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod filter_tests {
    use time::macros::datetime;
    use uuid::Uuid;

    use crate::Error;

    use super::{TransactionFilters, TransactionQuery};

    fn filters(start: &str, end: &str, category_id: &str) -> TransactionFilters {
        TransactionFilters {
            start_date: Some(start.to_owned()),
            end_date: Some(end.to_owned()),
            category_id: Some(category_id.to_owned()),
        }
    }

    #[test]
    fn no_filters() {
        assert_eq!(
            TransactionFilters::default().parse(),
            Ok(TransactionQuery::default())
        );
    }

    #[test]
    fn blank_filters_are_ignored() {
        assert_eq!(
            filters("", " ", "").parse(),
            Ok(TransactionQuery::default())
        );
    }

    #[test]
    fn end_date_covers_whole_day() {
        let category_id = Uuid::new_v4();

        let got = filters("2025-10-01", "2025-10-31", &category_id.to_string())
            .parse()
            .unwrap();

        assert_eq!(got.start, Some(datetime!(2025-10-01 00:00 UTC)));
        assert_eq!(got.end, Some(datetime!(2025-11-01 00:00 UTC)));
        assert_eq!(got.category_id, Some(category_id));
    }

    #[test]
    fn end_date_on_last_representable_day_has_no_upper_bound() {
        for end in ["9999-12-31", "9999-12-31T23:59:59Z"] {
            let got = filters("", end, "").parse().unwrap();

            assert_eq!(got.end, None, "end date {end}");
        }
    }

    #[test]
    fn invalid_parameters_are_reported() {
        let Err(Error::Validation(errors)) = filters("yesterday", "2025-10-31", "42").parse()
        else {
            panic!("expected a validation error");
        };

        assert_eq!(errors.get("startDate").unwrap().message, "Invalid date format");
        assert!(errors.get("endDate").is_none());
        assert!(errors.get("categoryId").is_some());
    }

    #[test]
    fn serialization_omits_blank_filters() {
        let filters = TransactionFilters {
            start_date: Some("2025-10-01".to_owned()),
            end_date: Some(String::new()),
            category_id: None,
        };

        assert_eq!(
            serde_urlencoded::to_string(&filters).unwrap(),
            "startDate=2025-10-01"
        );
    }
}
