//! crates/bookstore_core/src/draft.rs
//!
//! User-entered book fields and their conversion into a wire payload.

use chrono::NaiveDate;

use crate::domain::{BookRecord, NewBook};
use crate::ports::{ApiError, ApiResult};

/// How unparseable numeric input is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericPolicy {
    /// Blank or unparseable numbers become `0`.
    #[default]
    Lenient,
    /// Blank numbers become `0`; unparseable numbers are rejected.
    Strict,
}

/// Book fields exactly as the user typed them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub category: String,
    pub price: String,
    pub rating: String,
    /// `YYYY-MM-DD`, or blank.
    pub published_date: String,
}

impl BookDraft {
    /// Pre-fills a draft from an existing record, for editing.
    pub fn from_record(record: &BookRecord) -> Self {
        Self {
            title: record.title.clone(),
            author: record.author.clone(),
            category: record.category.clone(),
            price: record.price.to_string(),
            rating: record.rating.to_string(),
            published_date: record
                .published_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }

    pub fn parse(&self, policy: NumericPolicy) -> ApiResult<NewBook> {
        let title = self.title.trim();
        let author = self.author.trim();
        if title.is_empty() || author.is_empty() {
            return Err(ApiError::Validation(
                "Title and author are required".to_string(),
            ));
        }

        let price = parse_number("price", &self.price, policy)?;
        if price < 0.0 {
            return Err(ApiError::Validation("Price cannot be negative".to_string()));
        }
        let rating = parse_number("rating", &self.rating, policy)?;
        if !(0.0..=5.0).contains(&rating) {
            return Err(ApiError::Validation(
                "Rating must be between 0 and 5".to_string(),
            ));
        }

        let date = self.published_date.trim();
        let published_date = if date.is_empty() {
            None
        } else {
            Some(NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
                ApiError::Validation(format!(
                    "Published date '{date}' is not a YYYY-MM-DD date"
                ))
            })?)
        };

        Ok(NewBook {
            title: title.to_string(),
            author: author.to_string(),
            category: self.category.trim().to_string(),
            price,
            rating,
            published_date,
        })
    }
}

fn parse_number(field: &str, raw: &str, policy: NumericPolicy) -> ApiResult<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    match (raw.parse::<f64>(), policy) {
        (Ok(value), _) if value.is_finite() => Ok(value),
        (_, NumericPolicy::Lenient) => Ok(0.0),
        (_, NumericPolicy::Strict) => Err(ApiError::Validation(format!(
            "The {field} '{raw}' is not a number"
        ))),
    }
}
