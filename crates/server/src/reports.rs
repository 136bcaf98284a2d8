//! Read-only aggregations under `/api/transactions/summary`.

use api_types::report::{
    CashFlowMonthView, CashFlowQuery, CategorySummaryQuery, CategorySummaryView,
    FinancialStatisticsView, OverTimeQuery, OverTimeResponse, PeriodSummaryView, StatisticsQuery,
};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use engine::{EntryType, Granularity};

use crate::{ServerError, server::ServerState, user, utc};

/// Reports tolerate an unknown entry type and fall back to both.
fn lenient_entry_type(value: Option<&str>) -> Option<EntryType> {
    let value = value?;
    match EntryType::try_from(value) {
        Ok(entry_type) => Some(entry_type),
        Err(err) => {
            tracing::warn!(entry_type = value, "ignoring entry type filter: {err}");
            None
        }
    }
}

pub async fn category_summaries(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<CategorySummaryQuery>,
) -> Result<Json<Vec<CategorySummaryView>>, ServerError> {
    let summaries = state
        .engine
        .category_summaries(
            &user.username,
            query.start_date.map(utc),
            query.end_date.map(utc),
            lenient_entry_type(query.entry_type.as_deref()),
        )
        .await?
        .into_iter()
        .map(|s| CategorySummaryView {
            category_id: s.category_id,
            category_name: s.category_name,
            total_minor: s.total_minor,
            transaction_count: s.transaction_count,
        })
        .collect();
    Ok(Json(summaries))
}

pub async fn summary_over_time(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<OverTimeQuery>,
) -> Result<Json<OverTimeResponse>, ServerError> {
    let granularity = match query.granularity.as_deref() {
        Some(value) => Granularity::try_from(value)?,
        None => Granularity::Month,
    };

    let summary = state
        .engine
        .summary_over_time(
            &user.username,
            query.start_date.map(utc),
            query.end_date.map(utc),
            granularity,
            lenient_entry_type(query.entry_type.as_deref()),
        )
        .await?
        .into_iter()
        .map(|(entry_type, periods)| {
            let periods = periods
                .into_iter()
                .map(|p| PeriodSummaryView {
                    period: p.period,
                    total_minor: p.total_minor,
                    transaction_count: p.transaction_count,
                })
                .collect();
            (entry_type.as_str().to_string(), periods)
        })
        .collect();
    Ok(Json(summary))
}

pub async fn cash_flow(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<CashFlowQuery>,
) -> Result<Json<Vec<CashFlowMonthView>>, ServerError> {
    let months = state
        .engine
        .cash_flow(&user.username, query.year, query.month)
        .await?
        .into_iter()
        .map(|m| CashFlowMonthView {
            month: m.month,
            income_minor: m.income_minor,
            expense_minor: m.expense_minor,
            net_flow_minor: m.net_flow_minor,
        })
        .collect();
    Ok(Json(months))
}

/// An inverted range yields `null`.
pub async fn financial_statistics(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<Option<FinancialStatisticsView>>, ServerError> {
    let stats = state
        .engine
        .financial_statistics(&user.username, utc(query.start_date), utc(query.end_date))
        .await?
        .map(|s| FinancialStatisticsView {
            total_income_minor: s.total_income_minor,
            total_expense_minor: s.total_expense_minor,
            net_savings_minor: s.net_savings_minor,
            average_daily_income_minor: s.average_daily_income_minor,
            average_daily_expense_minor: s.average_daily_expense_minor,
            number_of_days: s.number_of_days,
        });
    Ok(Json(stats))
}
