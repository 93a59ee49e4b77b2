pub mod summary_service;

pub use summary_service::{
    CategoryBreakdown, CategoryTotal, LedgerSummary, MonthBucketing, MonthTotals,
    MonthlyBreakdown, SummaryService,
};
