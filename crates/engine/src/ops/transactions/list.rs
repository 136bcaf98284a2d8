use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use sea_orm::{
    Condition, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
    sea_query::LikeExpr,
};

use crate::{
    EngineError, EntryType, ResultEngine, Transaction, TransactionStatus, TransactionView,
    attachments, transactions,
    util::fold_text,
};

use super::super::{Engine, with_tx};

/// Filter on an optional reference column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefFilter {
    #[default]
    Any,
    /// The column must be null.
    IsNull,
    Is(Uuid),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Newest first.
    #[default]
    Desc,
    Asc,
}

/// Filters for listing transactions. All set filters must match.
///
/// `from` and `to` are both inclusive, in UTC.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub entry_type: Option<EntryType>,
    pub category: RefFilter,
    pub account: RefFilter,
    pub card: RefFilter,
    pub status: Option<TransactionStatus>,
    /// Case and accent insensitive substring of the description.
    pub description: Option<String>,
    pub order: SortOrder,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from > to
    {
        return Err(EngineError::Validation(
            "invalid range: from must be <= to".to_string(),
        ));
    }
    Ok(())
}

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
fn like_contains(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn ref_condition(column: transactions::Column, filter: RefFilter) -> Option<Condition> {
    match filter {
        RefFilter::Any => None,
        RefFilter::IsNull => Some(Condition::all().add(column.is_null())),
        RefFilter::Is(id) => Some(Condition::all().add(column.eq(id))),
    }
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionListFilter) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionListFilter) -> Self {
        if let Some(from) = filter.from {
            self = self.filter(transactions::Column::TransactionDate.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(transactions::Column::TransactionDate.lte(to));
        }
        if let Some(entry_type) = filter.entry_type {
            self = self.filter(transactions::Column::EntryType.eq(entry_type.as_str()));
        }
        if let Some(status) = filter.status {
            self = self.filter(transactions::Column::Status.eq(status.as_str()));
        }
        for (column, ref_filter) in [
            (transactions::Column::CategoryId, filter.category),
            (transactions::Column::AccountId, filter.account),
            (transactions::Column::CardId, filter.card),
        ] {
            if let Some(condition) = ref_condition(column, ref_filter) {
                self = self.filter(condition);
            }
        }
        if let Some(needle) = filter
            .description
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let pattern = LikeExpr::new(like_contains(&fold_text(needle))).escape('\\');
            self = self.filter(transactions::Column::DescriptionNorm.like(pattern));
        }
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct TransactionsCursor {
    transaction_date: DateTime<Utc>,
    transaction_id: Uuid,
}

impl TransactionsCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))
    }

    /// Rows strictly after the cursor in the given order.
    fn after(&self, order: SortOrder) -> Condition {
        let date = transactions::Column::TransactionDate;
        let id = transactions::Column::Id;
        match order {
            SortOrder::Desc => Condition::any()
                .add(date.lt(self.transaction_date))
                .add(
                    Condition::all()
                        .add(date.eq(self.transaction_date))
                        .add(id.lt(self.transaction_id)),
                ),
            SortOrder::Asc => Condition::any()
                .add(date.gt(self.transaction_date))
                .add(
                    Condition::all()
                        .add(date.eq(self.transaction_date))
                        .add(id.gt(self.transaction_id)),
                ),
        }
    }
}

impl Engine {
    /// Counts attachments for each of the given transactions.
    pub(in crate::ops) async fn attachment_counts(
        &self,
        db: &DatabaseTransaction,
        transaction_ids: &[Uuid],
    ) -> ResultEngine<HashMap<Uuid, u64>> {
        if transaction_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(Uuid, i64)> = attachments::Entity::find()
            .select_only()
            .column(attachments::Column::TransactionId)
            .column_as(attachments::Column::Id.count(), "attachment_count")
            .filter(attachments::Column::TransactionId.is_in(transaction_ids.iter().copied()))
            .group_by(attachments::Column::TransactionId)
            .into_tuple()
            .all(db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, u64::try_from(count).unwrap_or_default()))
            .collect())
    }

    /// Lists the user's transactions matching `filter`.
    ///
    /// Pagination follows `(transaction_date, id)` in the filter's order,
    /// newest first by default. A `limit` of zero is read as one. The
    /// returned cursor is `None` on the last page.
    pub async fn list_transactions_page(
        &self,
        user_id: &str,
        limit: u64,
        cursor: Option<&str>,
        filter: &TransactionListFilter,
    ) -> ResultEngine<(Vec<TransactionView>, Option<String>)> {
        validate_list_filter(filter)?;
        let limit = limit.max(1);
        with_tx!(self, |db_tx| {
            let limit_plus_one = limit.saturating_add(1);
            let mut query = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id))
                .limit(limit_plus_one);
            query = match filter.order {
                SortOrder::Desc => query
                    .order_by_desc(transactions::Column::TransactionDate)
                    .order_by_desc(transactions::Column::Id),
                SortOrder::Asc => query
                    .order_by_asc(transactions::Column::TransactionDate)
                    .order_by_asc(transactions::Column::Id),
            };

            if let Some(cursor) = cursor {
                let cursor = TransactionsCursor::decode(cursor)?;
                query = query.filter(cursor.after(filter.order));
            }
            query = query.apply_tx_filters(filter);

            let rows: Vec<transactions::Model> = query.all(&db_tx).await?;
            let has_more = rows.len() as u64 > limit;

            let mut out: Vec<Transaction> = Vec::with_capacity(rows.len());
            for model in rows.into_iter().take(limit as usize) {
                out.push(Transaction::try_from(model)?);
            }

            let next_cursor = if has_more {
                out.last()
                    .map(|tx| TransactionsCursor {
                        transaction_date: tx.transaction_date,
                        transaction_id: tx.id,
                    })
                    .map(|c| c.encode())
                    .transpose()?
            } else {
                None
            };

            let ids: Vec<Uuid> = out.iter().map(|tx| tx.id).collect();
            let counts = self.attachment_counts(&db_tx, &ids).await?;
            let views = out
                .into_iter()
                .map(|transaction| TransactionView {
                    attachment_count: counts.get(&transaction.id).copied().unwrap_or(0),
                    transaction,
                })
                .collect();

            Ok((views, next_cursor))
        })
    }

    /// Lists every transaction matching `filter` without pagination.
    pub async fn list_transactions(
        &self,
        user_id: &str,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<TransactionView>> {
        let (items, _next) = self
            .list_transactions_page(user_id, u64::from(u32::MAX), None, filter)
            .await?;
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_codec_rejects_garbage() {
        let cursor = TransactionsCursor {
            transaction_date: Utc::now(),
            transaction_id: Uuid::new_v4(),
        };
        let encoded = cursor.encode().unwrap();
        assert_eq!(TransactionsCursor::decode(&encoded).unwrap(), cursor);
        assert!(matches!(
            TransactionsCursor::decode("not-a-cursor!"),
            Err(EngineError::InvalidCursor(_))
        ));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_contains("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_contains("coffee"), "%coffee%");
    }

    #[test]
    fn inverted_range_is_rejected() {
        let now = Utc::now();
        let filter = TransactionListFilter {
            from: Some(now),
            to: Some(now - chrono::Duration::days(1)),
            ..Default::default()
        };
        assert!(validate_list_filter(&filter).is_err());
    }
}
