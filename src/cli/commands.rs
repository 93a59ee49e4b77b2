//! Command handlers for the ledger shell.

use dialoguer::{Input, Select};

use crate::core::errors::LedgerError;
use crate::core::services::{MonthBucketing, SummaryService};
use crate::domain::{money::format_amount, Category, TransactionDraft, TransactionKind};
use crate::ledger::MalformedPolicy;
use crate::storage::is_canonical_key;
use crate::utils::build_info;

use super::context::{CliMode, CommandError, CommandResult, ShellContext};
use super::output;
use super::registry::{CommandEntry, CommandRegistry};

const ADD_USAGE: &str = "add <description> <amount> <income|expense> [category]";
const CONFIG_USAGE: &str = "config [show | set <key> <value>]";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register(CommandEntry::new(
        "add",
        "Record a new income or expense",
        ADD_USAGE,
        cmd_add,
    ));
    registry.register(CommandEntry::new(
        "list",
        "Show every transaction in the order it was recorded",
        "list",
        cmd_list,
    ));
    registry.register(CommandEntry::new(
        "balance",
        "Show total income minus total expenses",
        "balance",
        cmd_balance,
    ));
    registry.register(CommandEntry::new(
        "categories",
        "Show expense totals per category",
        "categories",
        cmd_categories,
    ));
    registry.register(CommandEntry::new(
        "monthly",
        "Show income and expense totals per month",
        "monthly",
        cmd_monthly,
    ));
    registry.register(CommandEntry::new(
        "summary",
        "Show balance, category and monthly views together",
        "summary",
        cmd_summary,
    ));
    registry.register(CommandEntry::new(
        "config",
        "Show or change preferences",
        CONFIG_USAGE,
        cmd_config,
    ));
    registry.register(CommandEntry::new(
        "version",
        "Show build information",
        "version",
        cmd_version,
    ));
    registry.register(CommandEntry::new(
        "help",
        "List commands or describe one",
        "help [command]",
        cmd_help,
    ));
    registry.register(CommandEntry::new(
        "exit",
        "Leave the shell",
        "exit",
        cmd_exit,
    ));
    registry.alias("quit", "exit");
    registry.alias("ls", "list");
    registry
}

fn money(context: &ShellContext, amount: rust_decimal::Decimal) -> String {
    format_amount(amount, &context.config.currency_symbol)
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let draft = match args {
        [] if context.mode == CliMode::Interactive => prompt_draft(context)?,
        [] => {
            return Err(CommandError::InvalidArguments(format!(
                "usage: {ADD_USAGE}"
            )))
        }
        [description, amount, kind] => {
            let kind = kind
                .parse::<TransactionKind>()
                .map_err(LedgerError::from)?;
            TransactionDraft::new(*description, *amount, kind, Category::Other)
        }
        [description, amount, kind, category] => {
            let kind = kind
                .parse::<TransactionKind>()
                .map_err(LedgerError::from)?;
            let category = category
                .parse::<Category>()
                .map_err(LedgerError::from)?;
            TransactionDraft::new(*description, *amount, kind, category)
        }
        _ => {
            return Err(CommandError::InvalidArguments(format!(
                "usage: {ADD_USAGE}"
            )))
        }
    };

    let txn = context.store.append(draft)?;
    output::success(format!(
        "Recorded {} `{}` of {} ({}).",
        txn.kind(),
        txn.description(),
        money(context, txn.amount()),
        txn.category()
    ));
    Ok(())
}

fn prompt_draft(context: &ShellContext) -> Result<TransactionDraft, CommandError> {
    let description: String = Input::with_theme(&context.theme)
        .with_prompt("Description")
        .interact_text()?;
    let amount: String = Input::with_theme(&context.theme)
        .with_prompt("Amount")
        .interact_text()?;

    let kinds = [TransactionKind::Expense, TransactionKind::Income];
    let kind_idx = Select::with_theme(&context.theme)
        .with_prompt("Type")
        .items(&kinds.map(|kind| kind.as_str()))
        .default(0)
        .interact()?;
    let kind = kinds[kind_idx];

    let category = if kind == TransactionKind::Expense {
        let idx = Select::with_theme(&context.theme)
            .with_prompt("Category")
            .items(&Category::ALL.map(Category::as_str))
            .default(0)
            .interact()?;
        Category::ALL[idx]
    } else {
        Category::Other
    };

    Ok(TransactionDraft::new(description, amount, kind, category))
}

fn cmd_list(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let snapshot = context.store.snapshot();
    if snapshot.is_empty() {
        output::info("No transactions recorded yet.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = snapshot
        .iter()
        .map(|txn| {
            vec![
                txn.occurred_at().format(TIMESTAMP_FORMAT).to_string(),
                txn.kind().to_string(),
                txn.category().to_string(),
                money(context, txn.amount()),
                txn.description().to_string(),
            ]
        })
        .collect();
    output::table(
        &["When", "Type", "Category", "Amount", "Description"],
        &rows,
        &[3],
    );
    Ok(())
}

fn cmd_balance(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let balance = SummaryService::balance(context.store.snapshot());
    println!("Balance: {}", money(context, balance));
    Ok(())
}

fn cmd_categories(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    print_categories(context);
    Ok(())
}

fn print_categories(context: &ShellContext) {
    let breakdown = SummaryService::category_breakdown(context.store.snapshot());
    if breakdown.is_empty() {
        output::info("No expenses recorded yet.");
        return;
    }
    let rows: Vec<Vec<String>> = breakdown
        .iter()
        .map(|entry| vec![entry.category.to_string(), money(context, entry.total)])
        .collect();
    output::table(&["Category", "Spent"], &rows, &[1]);
}

fn cmd_monthly(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    print_monthly(context);
    Ok(())
}

fn print_monthly(context: &ShellContext) {
    let months =
        SummaryService::monthly_breakdown(context.store.snapshot(), context.config.month_bucketing);
    if months.is_empty() {
        output::info("No transactions recorded yet.");
        return;
    }
    let rows: Vec<Vec<String>> = months
        .iter()
        .map(|bucket| {
            vec![
                bucket.month.clone(),
                money(context, bucket.income_total),
                money(context, bucket.expense_total),
                money(context, bucket.net()),
            ]
        })
        .collect();
    output::table(&["Month", "Income", "Expenses", "Net"], &rows, &[1, 2, 3]);
    if context.config.month_bucketing == MonthBucketing::MonthName {
        output::hint("Months from different years share a row; `config set month_bucketing year_month` separates them.");
    }
}

fn cmd_summary(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let summary =
        SummaryService::summarize(context.store.snapshot(), context.config.month_bucketing);
    output::section("Summary");
    println!("Income:   {}", money(context, summary.income_total));
    println!("Expenses: {}", money(context, summary.expense_total));
    println!("Balance:  {}", money(context, summary.balance));
    output::section("Spending by category");
    print_categories(context);
    output::section("By month");
    print_monthly(context);
    Ok(())
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] | ["show"] => {
            let config = &context.config;
            println!("currency_symbol     = {}", config.currency_symbol);
            println!(
                "month_bucketing     = {}",
                bucketing_label(config.month_bucketing)
            );
            println!(
                "malformed_snapshot  = {}",
                policy_label(config.malformed_snapshot)
            );
            println!("storage_key         = {}", config.storage_key);
            println!("ui_color_enabled    = {}", config.ui_color_enabled);
            println!(
                "config file         = {}",
                context.config_manager.config_path().display()
            );
            Ok(())
        }
        ["set", key, value] => {
            let mut updated = context.config.clone();
            apply_setting(&mut updated, key, value)?;
            context.config_manager.save(&updated)?;
            context.config = updated;
            output::success(format!("Set `{key}` to `{value}`."));
            if *key == "storage_key" || *key == "malformed_snapshot" {
                output::hint("Takes effect the next time the shell starts.");
            }
            Ok(())
        }
        _ => Err(CommandError::InvalidArguments(format!(
            "usage: {CONFIG_USAGE}"
        ))),
    }
}

fn apply_setting(config: &mut crate::config::Config, key: &str, value: &str) -> CommandResult {
    match key {
        "currency_symbol" => config.currency_symbol = value.to_string(),
        "month_bucketing" => {
            config.month_bucketing = match value {
                "month_name" => MonthBucketing::MonthName,
                "year_month" => MonthBucketing::YearMonth,
                other => {
                    return Err(CommandError::InvalidArguments(format!(
                        "unknown month bucketing `{other}` (use month_name or year_month)"
                    )))
                }
            }
        }
        "malformed_snapshot" => {
            config.malformed_snapshot = match value {
                "reset" => MalformedPolicy::Reset,
                "fail" => MalformedPolicy::Fail,
                other => {
                    return Err(CommandError::InvalidArguments(format!(
                        "unknown policy `{other}` (use reset or fail)"
                    )))
                }
            }
        }
        "storage_key" => {
            if !is_canonical_key(value) {
                return Err(CommandError::InvalidArguments(format!(
                    "storage_key `{value}` must be non-empty and use only a-z, 0-9, `-` and `_`"
                )));
            }
            config.storage_key = value.to_string();
        }
        "ui_color_enabled" => {
            config.ui_color_enabled = value.parse().map_err(|_| {
                CommandError::InvalidArguments(format!("expected true or false, got `{value}`"))
            })?;
            output::set_color_enabled(config.ui_color_enabled);
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown setting `{other}`"
            )))
        }
    }
    Ok(())
}

fn bucketing_label(bucketing: MonthBucketing) -> &'static str {
    match bucketing {
        MonthBucketing::MonthName => "month_name",
        MonthBucketing::YearMonth => "year_month",
    }
}

fn policy_label(policy: MalformedPolicy) -> &'static str {
    match policy {
        MalformedPolicy::Reset => "reset",
        MalformedPolicy::Fail => "fail",
    }
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let build = build_info::current();
    println!("{}", build.summary());
    println!("target: {}", build.target);
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        return match context.registry.get(&name.to_lowercase()) {
            Some(entry) => {
                println!("{} - {}", entry.name, entry.description);
                println!("usage: {}", entry.usage);
                if entry.name == "add" {
                    let names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
                    println!("categories: {}", names.join(", "));
                }
                Ok(())
            }
            None => Err(CommandError::InvalidArguments(format!(
                "no command named `{name}`"
            ))),
        };
    }
    output::section("Commands");
    for entry in context.registry.list() {
        println!("  {:<11} {}", entry.name, entry.description);
    }
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
