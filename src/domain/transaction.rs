//! Domain models for recorded ledger entries.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::errors::ValidationError;
use crate::domain::{
    category::Category,
    money::{parse_amount, within_limit},
};

/// Direction of a transaction relative to the user's balance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(ValidationError::UnknownKind(other.to_string())),
        }
    }
}

/// A single recorded income or expense event. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    id: Uuid,
    description: String,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    kind: TransactionKind,
    category: Category,
    occurred_at: DateTime<Utc>,
}

impl Transaction {
    pub(crate) fn new(id: Uuid, draft: ValidDraft, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id,
            description: draft.description,
            amount: draft.amount,
            kind: draft.kind,
            category: draft.category,
            occurred_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    /// Amount with the sign it contributes to the balance.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }

    /// Returns a description of the first ledger invariant this record breaks, if any.
    pub(crate) fn invariant_violation(&self) -> Option<String> {
        if self.description.trim().is_empty() {
            return Some(format!("transaction {} has an empty description", self.id));
        }
        if self.amount <= Decimal::ZERO {
            return Some(format!(
                "transaction {} has non-positive amount {}",
                self.id, self.amount
            ));
        }
        if !within_limit(self.amount) {
            return Some(format!(
                "transaction {} has out-of-range amount {}",
                self.id, self.amount
            ));
        }
        None
    }
}

/// Raw user input for a new transaction; the amount is still unparsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    pub description: String,
    pub amount: String,
    pub kind: TransactionKind,
    pub category: Category,
}

impl TransactionDraft {
    pub fn new(
        description: impl Into<String>,
        amount: impl Into<String>,
        kind: TransactionKind,
        category: Category,
    ) -> Self {
        Self {
            description: description.into(),
            amount: amount.into(),
            kind,
            category,
        }
    }

    pub fn income(description: impl Into<String>, amount: impl Into<String>) -> Self {
        Self::new(description, amount, TransactionKind::Income, Category::Other)
    }

    pub fn expense(
        description: impl Into<String>,
        amount: impl Into<String>,
        category: Category,
    ) -> Self {
        Self::new(description, amount, TransactionKind::Expense, category)
    }

    /// Checks the input rules; the description is stored trimmed.
    pub fn validate(&self) -> Result<ValidDraft, ValidationError> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        let amount = parse_amount(&self.amount)?;
        Ok(ValidDraft {
            description: description.to_string(),
            amount,
            kind: self.kind,
            category: self.category,
        })
    }
}

/// A draft that passed validation and is ready to become a [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    description: String,
    amount: Decimal,
    kind: TransactionKind,
    category: Category,
}

impl ValidDraft {
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
