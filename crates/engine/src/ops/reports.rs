//! Read-only aggregations over approved transactions.
//!
//! Sums, counts and period buckets are computed by the database. Period
//! labels are prefixes of the stored UTC timestamp text, which always starts
//! with `YYYY-MM-DD`. Averages are rounded in Rust.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Months, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
    prelude::*,
    sea_query::{Alias, Expr, Func, SimpleExpr},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, EntryType, Money, ResultEngine, TransactionStatus, categories, transactions,
    util::day_start,
};

use super::Engine;

const MONTH_NAMES: [&str; 12] = [
    "JANUARY",
    "FEBRUARY",
    "MARCH",
    "APRIL",
    "MAY",
    "JUNE",
    "JULY",
    "AUGUST",
    "SEPTEMBER",
    "OCTOBER",
    "NOVEMBER",
    "DECEMBER",
];

/// Bucket size for [`Engine::summary_over_time`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Month,
    Year,
}

impl Granularity {
    /// Length of the `YYYY-MM-DD`, `YYYY-MM` or `YYYY` label.
    pub fn label_len(self) -> i32 {
        match self {
            Self::Day => 10,
            Self::Month => 7,
            Self::Year => 4,
        }
    }

    /// SQL expression yielding the period label of a transaction date.
    fn period_expr(self) -> SimpleExpr {
        Func::cust(Alias::new("SUBSTR"))
            .arg(Expr::col((
                transactions::Entity,
                transactions::Column::TransactionDate,
            )))
            .arg(Expr::val(1))
            .arg(Expr::val(self.label_len()))
            .into()
    }
}

impl TryFrom<&str> for Granularity {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(Self::Day),
            "month" | "monthly" => Ok(Self::Month),
            "year" | "yearly" => Ok(Self::Year),
            other => Err(EngineError::Validation(format!(
                "invalid granularity: {other}. Allowed values are daily, monthly, yearly"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category_id: Uuid,
    pub category_name: String,
    pub total_minor: i64,
    pub transaction_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub period: String,
    pub total_minor: i64,
    pub transaction_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowMonth {
    /// Upper-case English month name.
    pub month: String,
    pub income_minor: i64,
    pub expense_minor: i64,
    pub net_flow_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialStatistics {
    pub total_income_minor: i64,
    pub total_expense_minor: i64,
    pub net_savings_minor: i64,
    pub average_daily_income_minor: i64,
    pub average_daily_expense_minor: i64,
    pub number_of_days: i64,
}

/// Income and expense totals of a set of approved transactions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Flow {
    income: Money,
    expense: Money,
}

impl Flow {
    /// Adds a per-entry-type total: CREDIT is income, DEBIT is expense.
    fn add(&mut self, entry_type: &str, total_minor: i64) -> ResultEngine<()> {
        let amount = Money::new(total_minor);
        match EntryType::try_from(entry_type)? {
            EntryType::Credit => self.income = self.income.try_add(amount)?,
            EntryType::Debit => self.expense = self.expense.try_add(amount)?,
        }
        Ok(())
    }

    fn net(self) -> ResultEngine<Money> {
        self.income.try_sub(self.expense)
    }
}

fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

/// Rows arrive as `(entry_type, period, total, count)` ordered by period.
fn group_over_time(
    rows: Vec<(String, String, i64, i64)>,
) -> ResultEngine<BTreeMap<EntryType, Vec<PeriodSummary>>> {
    let mut out: BTreeMap<EntryType, Vec<PeriodSummary>> = BTreeMap::new();
    for (entry_type, period, total_minor, transaction_count) in rows {
        out.entry(EntryType::try_from(entry_type.as_str())?)
            .or_default()
            .push(PeriodSummary {
                period,
                total_minor,
                transaction_count: count(transaction_count),
            });
    }
    Ok(out)
}

fn month_window(year: i32, month: u32) -> ResultEngine<(DateTime<Utc>, DateTime<Utc>)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| EngineError::Validation(format!("invalid month: {year}-{month}")))?;
    let next = first
        .checked_add_months(Months::new(1))
        .ok_or_else(|| EngineError::Validation(format!("invalid month: {year}-{month}")))?;
    Ok((day_start(first), day_start(next)))
}

/// Per-day averages rounded half-up to whole minor units.
fn average_per_day(total: Money, days: i64) -> i64 {
    let average = Decimal::from(total.minor()) / Decimal::from(days.max(1));
    average
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .try_into()
        .unwrap_or(i64::MAX)
}

fn statistics(
    flow: Flow,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> ResultEngine<FinancialStatistics> {
    let number_of_days = (end.date_naive() - start.date_naive()).num_days() + 1;
    Ok(FinancialStatistics {
        total_income_minor: flow.income.minor(),
        total_expense_minor: flow.expense.minor(),
        net_savings_minor: flow.net()?.minor(),
        average_daily_income_minor: average_per_day(flow.income, number_of_days),
        average_daily_expense_minor: average_per_day(flow.expense, number_of_days),
        number_of_days,
    })
}

/// Approved transactions of the user with `from <= date` and
/// `date <= to` (or `< to` with `end_exclusive`).
fn approved_between(
    user_id: &str,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    end_exclusive: bool,
    entry_type: Option<EntryType>,
) -> Select<transactions::Entity> {
    let mut query = transactions::Entity::find()
        .filter(transactions::Column::UserId.eq(user_id))
        .filter(transactions::Column::Status.eq(TransactionStatus::Approved.as_str()));
    if let Some(from) = from {
        query = query.filter(transactions::Column::TransactionDate.gte(from));
    }
    if let Some(to) = to {
        query = if end_exclusive {
            query.filter(transactions::Column::TransactionDate.lt(to))
        } else {
            query.filter(transactions::Column::TransactionDate.lte(to))
        };
    }
    if let Some(entry_type) = entry_type {
        query = query.filter(transactions::Column::EntryType.eq(entry_type.as_str()));
    }
    query
}

impl Engine {
    /// Totals of approved, categorized transactions grouped by category,
    /// ordered by category name.
    pub async fn category_summaries(
        &self,
        user_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        entry_type: Option<EntryType>,
    ) -> ResultEngine<Vec<CategorySummary>> {
        let rows: Vec<(Uuid, String, i64, i64)> =
            approved_between(user_id, from, to, false, entry_type)
                .select_only()
                .column(transactions::Column::CategoryId)
                .column(categories::Column::Name)
                .column_as(transactions::Column::AmountMinor.sum(), "total_minor")
                .column_as(transactions::Column::Id.count(), "transaction_count")
                .join(JoinType::InnerJoin, transactions::Relation::Category.def())
                .group_by(transactions::Column::CategoryId)
                .group_by(categories::Column::Name)
                .order_by_asc(categories::Column::Name)
                .order_by_asc(transactions::Column::CategoryId)
                .into_tuple()
                .all(&self.database)
                .await?;

        Ok(rows
            .into_iter()
            .map(
                |(category_id, category_name, total_minor, transaction_count)| CategorySummary {
                    category_id,
                    category_name,
                    total_minor,
                    transaction_count: count(transaction_count),
                },
            )
            .collect())
    }

    /// Totals per period, grouped by entry type, periods ascending.
    pub async fn summary_over_time(
        &self,
        user_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        granularity: Granularity,
        entry_type: Option<EntryType>,
    ) -> ResultEngine<BTreeMap<EntryType, Vec<PeriodSummary>>> {
        let rows: Vec<(String, String, i64, i64)> =
            approved_between(user_id, from, to, false, entry_type)
                .select_only()
                .column(transactions::Column::EntryType)
                .column_as(granularity.period_expr(), "period")
                .column_as(transactions::Column::AmountMinor.sum(), "total_minor")
                .column_as(transactions::Column::Id.count(), "transaction_count")
                .group_by(transactions::Column::EntryType)
                .group_by(granularity.period_expr())
                .order_by_asc(granularity.period_expr())
                .into_tuple()
                .all(&self.database)
                .await?;
        group_over_time(rows)
    }

    /// Income, expense and net flow for one month, or for every month of
    /// `year` in calendar order.
    pub async fn cash_flow(
        &self,
        user_id: &str,
        year: i32,
        month: Option<u32>,
    ) -> ResultEngine<Vec<CashFlowMonth>> {
        let months: Vec<u32> = match month {
            Some(month) if (1..=12).contains(&month) => vec![month],
            Some(month) => {
                return Err(EngineError::Validation(format!(
                    "month must be between 1 and 12, got {month}"
                )));
            }
            None => (1..=12).collect(),
        };
        let (start, _) = month_window(year, months[0])?;
        let (_, end) = month_window(year, months[months.len() - 1])?;

        let rows: Vec<(String, String, i64)> =
            approved_between(user_id, Some(start), Some(end), true, None)
                .select_only()
                .column_as(Granularity::Month.period_expr(), "period")
                .column(transactions::Column::EntryType)
                .column_as(transactions::Column::AmountMinor.sum(), "total_minor")
                .group_by(Granularity::Month.period_expr())
                .group_by(transactions::Column::EntryType)
                .into_tuple()
                .all(&self.database)
                .await?;

        let mut flows: HashMap<String, Flow> = HashMap::new();
        for (period, entry_type, total_minor) in rows {
            flows.entry(period).or_default().add(&entry_type, total_minor)?;
        }

        let mut out = Vec::with_capacity(months.len());
        for month in months {
            let flow = flows
                .get(&format!("{year:04}-{month:02}"))
                .copied()
                .unwrap_or_default();
            out.push(CashFlowMonth {
                month: MONTH_NAMES[month as usize - 1].to_string(),
                income_minor: flow.income.minor(),
                expense_minor: flow.expense.minor(),
                net_flow_minor: flow.net()?.minor(),
            });
        }
        Ok(out)
    }

    /// Totals and per-day averages over `[start, end]`.
    ///
    /// Returns `None` for an inverted range.
    pub async fn financial_statistics(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ResultEngine<Option<FinancialStatistics>> {
        if start > end {
            tracing::warn!(%start, %end, "financial statistics requested with an inverted range");
            return Ok(None);
        }
        let rows: Vec<(String, i64)> = approved_between(user_id, Some(start), Some(end), false, None)
            .select_only()
            .column(transactions::Column::EntryType)
            .column_as(transactions::Column::AmountMinor.sum(), "total_minor")
            .group_by(transactions::Column::EntryType)
            .into_tuple()
            .all(&self.database)
            .await?;

        let mut flow = Flow::default();
        for (entry_type, total_minor) in rows {
            flow.add(&entry_type, total_minor)?;
        }
        statistics(flow, start, end).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn granularity_accepts_aliases_and_sizes_labels() {
        assert_eq!(Granularity::try_from("Daily").unwrap(), Granularity::Day);
        assert_eq!(Granularity::try_from("month").unwrap(), Granularity::Month);
        assert_eq!(Granularity::try_from("yearly").unwrap(), Granularity::Year);
        assert!(Granularity::try_from("weekly").is_err());

        let stored = Utc
            .with_ymd_and_hms(2024, 2, 9, 23, 59, 0)
            .unwrap()
            .to_rfc3339();
        let label = |g: Granularity| stored[..g.label_len() as usize].to_string();
        assert_eq!(label(Granularity::Day), "2024-02-09");
        assert_eq!(label(Granularity::Month), "2024-02");
        assert_eq!(label(Granularity::Year), "2024");
    }

    #[test]
    fn over_time_groups_by_entry_type_keeping_period_order() {
        let rows = vec![
            ("CREDIT".to_string(), "2024-03-01".to_string(), 9_000, 1),
            ("DEBIT".to_string(), "2024-03-01".to_string(), 350, 2),
            ("DEBIT".to_string(), "2024-03-02".to_string(), 500, 1),
        ];
        let summary = group_over_time(rows).unwrap();

        let debits = &summary[&EntryType::Debit];
        assert_eq!(debits.len(), 2);
        assert_eq!(debits[0].period, "2024-03-01");
        assert_eq!(debits[0].total_minor, 350);
        assert_eq!(debits[0].transaction_count, 2);
        assert_eq!(debits[1].period, "2024-03-02");
        assert_eq!(summary[&EntryType::Credit][0].total_minor, 9_000);

        let unknown = vec![("REFUND".to_string(), "2024".to_string(), 1, 1)];
        assert!(group_over_time(unknown).is_err());
    }

    #[test]
    fn flow_splits_entry_types_and_reports_overflow() {
        let mut flow = Flow::default();
        flow.add("CREDIT", 1_000).unwrap();
        flow.add("DEBIT", 1_250).unwrap();
        assert_eq!(flow.net().unwrap(), Money::new(-250));

        flow.add("CREDIT", i64::MAX).unwrap_err();
        let mut deep = Flow::default();
        deep.add("CREDIT", i64::MIN).unwrap();
        deep.add("DEBIT", 1).unwrap();
        assert!(matches!(deep.net(), Err(EngineError::InvalidAmount(_))));
    }

    #[test]
    fn statistics_round_half_up_and_count_days_inclusively() {
        let flow = Flow {
            income: Money::new(1_000),
            expense: Money::new(5),
        };
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 2, 18, 0, 0).unwrap();
        let stats = statistics(flow, start, end).unwrap();

        assert_eq!(stats.number_of_days, 2);
        assert_eq!(stats.total_income_minor, 1_000);
        assert_eq!(stats.net_savings_minor, 995);
        assert_eq!(stats.average_daily_income_minor, 500);
        // 5 / 2 = 2.5 rounds up.
        assert_eq!(stats.average_daily_expense_minor, 3);
    }

    #[test]
    fn month_window_spans_to_next_month_start() {
        let (start, end) = month_window(2024, 12).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-12-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-01-01T00:00:00+00:00");
        assert!(month_window(2024, 13).is_err());
    }
}
