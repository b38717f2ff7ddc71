//! Destination schema and INSERT statement
//!
//! The schema is derived from the caller's month/year for every request and
//! travels with the [`InsertTarget`] handed to the writer, so concurrent
//! requests never share it.

use crate::error::{IngestError, IngestResult};
use crate::models::{COLUMNS, DESTINATION_TABLE};

/// Month and year supplied with an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateContext {
    month: String,
    year: String,
}

impl DateContext {
    /// Validate month and year.
    ///
    /// Both end up inside a SQL identifier, so only ASCII letters and digits
    /// are accepted.
    pub fn new(month: impl Into<String>, year: impl Into<String>) -> IngestResult<Self> {
        let month = month.into().trim().to_string();
        let year = year.into().trim().to_string();

        validate_part("month", &month)?;
        validate_part("year", &year)?;

        Ok(Self { month, year })
    }

    pub fn month(&self) -> &str {
        &self.month
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    /// `cashback_<month>_<year>`, lowercased
    pub fn schema_name(&self) -> String {
        format!(
            "cashback_{}_{}",
            self.month.to_lowercase(),
            self.year.to_lowercase()
        )
    }
}

fn validate_part(name: &str, value: &str) -> IngestResult<()> {
    if value.is_empty() {
        return Err(IngestError::InvalidDate(format!("{} is required", name)));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(IngestError::InvalidDate(format!(
            "{} must contain only letters and digits",
            name
        )));
    }
    Ok(())
}

/// Where one request's rows are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertTarget {
    schema: String,
    statement: String,
}

impl InsertTarget {
    pub fn new(context: &DateContext) -> Self {
        let schema = context.schema_name();
        let statement = insert_statement(&schema);
        Self { schema, statement }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }
}

/// `INSERT INTO <schema>.domain (<columns>) VALUES ($1, .., $25)`
pub fn insert_statement(schema: &str) -> String {
    let placeholders: Vec<String> = (1..=COLUMNS.len()).map(|i| format!("${}", i)).collect();

    format!(
        "INSERT INTO {}.{} ({}) VALUES ({})",
        schema,
        DESTINATION_TABLE,
        COLUMNS.join(","),
        placeholders.join(",")
    )
}
