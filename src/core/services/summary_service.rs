//! Derived views over a ledger snapshot.
//!
//! Everything here is a pure function of the slice it receives: no I/O, no
//! mutation, and identical input always yields identical output. Sums are
//! exact decimals; rounding is left to the display layer.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Category, Transaction, TransactionKind};

/// How records are grouped into monthly buckets.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MonthBucketing {
    /// Bucket by month abbreviation only. January 2023 and January 2024 share
    /// the `"Jan"` bucket.
    #[default]
    MonthName,
    /// Bucket by month and year, e.g. `"Jan 2024"`.
    YearMonth,
}

impl MonthBucketing {
    fn label(self, txn: &Transaction) -> String {
        let format = match self {
            MonthBucketing::MonthName => "%b",
            MonthBucketing::YearMonth => "%b %Y",
        };
        txn.occurred_at().format(format).to_string()
    }
}

/// Expense total for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: Decimal,
}

/// Expense totals per category, in order of each category's first expense.
/// Categories without expenses are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryBreakdown {
    entries: Vec<CategoryTotal>,
}

impl CategoryBreakdown {
    pub fn get(&self, category: Category) -> Option<Decimal> {
        self.entries
            .iter()
            .find(|entry| entry.category == category)
            .map(|entry| entry.total)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryTotal> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum over every category; equals the ledger's total expenses.
    pub fn total(&self) -> Decimal {
        self.entries.iter().map(|entry| entry.total).sum()
    }

    fn add(&mut self, category: Category, amount: Decimal) {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.category == category)
        {
            Some(entry) => entry.total += amount,
            None => self.entries.push(CategoryTotal {
                category,
                total: amount,
            }),
        }
    }
}

/// Income and expense totals for one month bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthTotals {
    pub month: String,
    pub income_total: Decimal,
    pub expense_total: Decimal,
}

impl MonthTotals {
    pub fn net(&self) -> Decimal {
        self.income_total - self.expense_total
    }
}

/// Month buckets in order of first appearance. Months without records are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MonthlyBreakdown {
    buckets: Vec<MonthTotals>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl MonthlyBreakdown {
    pub fn get(&self, month: &str) -> Option<&MonthTotals> {
        self.index.get(month).map(|&idx| &self.buckets[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonthTotals> + '_ {
        self.buckets.iter()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    fn add(&mut self, month: String, kind: TransactionKind, amount: Decimal) {
        let idx = match self.index.get(&month) {
            Some(&idx) => idx,
            None => {
                self.buckets.push(MonthTotals {
                    month: month.clone(),
                    income_total: Decimal::ZERO,
                    expense_total: Decimal::ZERO,
                });
                let idx = self.buckets.len() - 1;
                self.index.insert(month, idx);
                idx
            }
        };
        let bucket = &mut self.buckets[idx];
        match kind {
            TransactionKind::Income => bucket.income_total += amount,
            TransactionKind::Expense => bucket.expense_total += amount,
        }
    }
}

/// All derived views computed together for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub balance: Decimal,
    pub income_total: Decimal,
    pub expense_total: Decimal,
    pub categories: CategoryBreakdown,
    pub months: MonthlyBreakdown,
}

pub struct SummaryService;

impl SummaryService {
    /// Total income minus total expenses. Zero for an empty ledger.
    pub fn balance(transactions: &[Transaction]) -> Decimal {
        transactions.iter().map(Transaction::signed_amount).sum()
    }

    pub fn income_total(transactions: &[Transaction]) -> Decimal {
        Self::total_of(transactions, TransactionKind::Income)
    }

    pub fn expense_total(transactions: &[Transaction]) -> Decimal {
        Self::total_of(transactions, TransactionKind::Expense)
    }

    /// Expense totals grouped by category; income never contributes.
    pub fn category_breakdown(transactions: &[Transaction]) -> CategoryBreakdown {
        let mut breakdown = CategoryBreakdown::default();
        for txn in transactions.iter().filter(|txn| txn.is_expense()) {
            breakdown.add(txn.category(), txn.amount());
        }
        breakdown
    }

    /// Income and expense totals grouped by the month of `occurred_at` (UTC).
    pub fn monthly_breakdown(
        transactions: &[Transaction],
        bucketing: MonthBucketing,
    ) -> MonthlyBreakdown {
        let mut breakdown = MonthlyBreakdown::default();
        for txn in transactions {
            breakdown.add(bucketing.label(txn), txn.kind(), txn.amount());
        }
        breakdown
    }

    pub fn summarize(transactions: &[Transaction], bucketing: MonthBucketing) -> LedgerSummary {
        let income_total = Self::income_total(transactions);
        let expense_total = Self::expense_total(transactions);
        LedgerSummary {
            balance: income_total - expense_total,
            income_total,
            expense_total,
            categories: Self::category_breakdown(transactions),
            months: Self::monthly_breakdown(transactions, bucketing),
        }
    }

    fn total_of(transactions: &[Transaction], kind: TransactionKind) -> Decimal {
        transactions
            .iter()
            .filter(|txn| txn.kind() == kind)
            .map(Transaction::amount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::domain::TransactionDraft;
    use crate::ledger::{LedgerStore, StoreOptions};
    use crate::storage::MemoryStorage;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn store_at(clock: &FixedClock) -> LedgerStore {
        LedgerStore::open_with_clock(
            Box::new(MemoryStorage::new()),
            Box::new(clock.clone()),
            StoreOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn empty_ledger_has_zero_balance_and_no_buckets() {
        let summary = SummaryService::summarize(&[], MonthBucketing::MonthName);
        assert_eq!(summary.balance, Decimal::ZERO);
        assert!(summary.categories.is_empty());
        assert!(summary.months.is_empty());
    }

    #[test]
    fn rent_and_salary_scenario() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        let mut store = store_at(&clock);
        store
            .append(TransactionDraft::expense("Rent", "1000", Category::Housing))
            .unwrap();
        store
            .append(TransactionDraft::income("Salary", "3000"))
            .unwrap();

        let snapshot = store.snapshot();
        assert_eq!(SummaryService::balance(snapshot), dec!(2000.00));
        let categories = SummaryService::category_breakdown(snapshot);
        assert_eq!(categories.len(), 1);
        assert_eq!(categories.get(Category::Housing), Some(dec!(1000)));
        assert_eq!(categories.get(Category::Other), None);
    }

    #[test]
    fn category_order_follows_first_occurrence() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        let mut store = store_at(&clock);
        for (desc, amount, category) in [
            ("Cinema", "12", Category::Entertainment),
            ("Bread", "3.20", Category::Food),
            ("Concert", "40", Category::Entertainment),
        ] {
            store
                .append(TransactionDraft::expense(desc, amount, category))
                .unwrap();
        }
        let order: Vec<_> = SummaryService::category_breakdown(store.snapshot())
            .iter()
            .map(|entry| entry.category)
            .collect();
        assert_eq!(order, vec![Category::Entertainment, Category::Food]);
    }

    #[test]
    fn month_name_bucketing_merges_years() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2023, 1, 10, 0, 0, 0).unwrap());
        let mut store = store_at(&clock);
        store
            .append(TransactionDraft::income("Bonus", "500"))
            .unwrap();
        clock.set(Utc.with_ymd_and_hms(2023, 2, 10, 0, 0, 0).unwrap());
        store
            .append(TransactionDraft::expense("Gas", "60", Category::Utilities))
            .unwrap();
        clock.set(Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap());
        store
            .append(TransactionDraft::expense("Gym", "30", Category::Healthcare))
            .unwrap();

        let months = SummaryService::monthly_breakdown(store.snapshot(), MonthBucketing::MonthName);
        let labels: Vec<_> = months.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(labels, vec!["Jan", "Feb"]);
        let jan = months.get("Jan").unwrap();
        assert_eq!(jan.income_total, dec!(500));
        assert_eq!(jan.expense_total, dec!(30));
        assert_eq!(jan.net(), dec!(470));

        let by_year =
            SummaryService::monthly_breakdown(store.snapshot(), MonthBucketing::YearMonth);
        assert_eq!(by_year.len(), 3);
        assert_eq!(
            by_year.get("Jan 2024").map(|m| m.expense_total),
            Some(dec!(30))
        );
    }

    #[test]
    fn decimal_sums_do_not_drift() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        let mut store = store_at(&clock);
        for _ in 0..10 {
            store
                .append(TransactionDraft::expense("Gum", "0.10", Category::Food))
                .unwrap();
        }
        assert_eq!(SummaryService::expense_total(store.snapshot()), dec!(1.00));
        assert_eq!(SummaryService::balance(store.snapshot()), dec!(-1));
    }

    #[test]
    fn month_bucketing_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&MonthBucketing::YearMonth).unwrap(),
            "\"year_month\""
        );
    }
}
