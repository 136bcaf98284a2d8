//! Budgets and their spending window.
//!
//! A budget caps the spending of a set of categories over a window derived
//! from its period type, start date and optional end date. Spending is never
//! stored; it is summed from transactions every time a budget is read.

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{day_start, next_day_start, normalize_name_key},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BudgetPeriod {
    Weekly,
    Monthly,
    Yearly,
    Custom,
}

impl BudgetPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
            Self::Custom => "CUSTOM",
        }
    }
}

impl TryFrom<&str> for BudgetPeriod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            "YEARLY" => Ok(Self::Yearly),
            "CUSTOM" => Ok(Self::Custom),
            other => Err(EngineError::Validation(format!(
                "invalid budget period: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub amount_limit_minor: i64,
    pub currency: String,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub active: bool,
    pub notes: Option<String>,
    pub category_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Half-open UTC interval `[start, end)` covering whole days.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpendingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Budget {
    /// Inclusive first and last day of the current spending window.
    ///
    /// An explicit end date always wins. Otherwise the period type decides:
    /// a week, a month or a year starting at `start_date`. A `CUSTOM` budget
    /// without end date runs until `today` while active and has no window
    /// (zero spending) once deactivated.
    pub fn window_days(&self, today: NaiveDate) -> ResultEngine<Option<(NaiveDate, NaiveDate)>> {
        let start = self.start_date;
        if let Some(end) = self.end_date {
            return Ok(Some((start, end)));
        }

        let out_of_range = || EngineError::Validation(format!("budget window out of range: {start}"));
        let end = match self.period {
            BudgetPeriod::Weekly => start.checked_add_days(Days::new(6)).ok_or_else(out_of_range)?,
            BudgetPeriod::Monthly => start
                .checked_add_months(Months::new(1))
                .and_then(|d| d.pred_opt())
                .ok_or_else(out_of_range)?,
            BudgetPeriod::Yearly => start
                .checked_add_months(Months::new(12))
                .and_then(|d| d.pred_opt())
                .ok_or_else(out_of_range)?,
            BudgetPeriod::Custom if self.active => today,
            BudgetPeriod::Custom => return Ok(None),
        };
        Ok(Some((start, end)))
    }

    /// Current window as UTC instants, with the end pushed to the start of
    /// the day after the last day so every time on that day is included.
    pub fn spending_window(&self, today: NaiveDate) -> ResultEngine<Option<SpendingWindow>> {
        let Some((first, last)) = self.window_days(today)? else {
            return Ok(None);
        };
        Ok(Some(SpendingWindow {
            start: day_start(first),
            end: next_day_start(last)?,
        }))
    }
}

/// A budget with its spending computed for the current window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetView {
    pub budget: Budget,
    pub spent_minor: i64,
    pub remaining_minor: i64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    /// Folded form of `name` used for uniqueness checks.
    pub name_norm: String,
    pub amount_limit_minor: i64,
    pub currency_code: String,
    pub period: String,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub active: bool,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::budget_categories::Entity")]
    BudgetCategories,
}

impl Related<super::budget_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Budget> for ActiveModel {
    fn from(value: &Budget) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            name_norm: ActiveValue::Set(normalize_name_key(&value.name)),
            amount_limit_minor: ActiveValue::Set(value.amount_limit_minor),
            currency_code: ActiveValue::Set(value.currency.clone()),
            period: ActiveValue::Set(value.period.as_str().to_string()),
            start_date: ActiveValue::Set(value.start_date),
            end_date: ActiveValue::Set(value.end_date),
            active: ActiveValue::Set(value.active),
            notes: ActiveValue::Set(value.notes.clone()),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Budget {
    type Error = EngineError;

    /// Category ids live in `budget_categories` and are filled in by the
    /// caller.
    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            amount_limit_minor: model.amount_limit_minor,
            currency: model.currency_code,
            period: BudgetPeriod::try_from(model.period.as_str())?,
            start_date: model.start_date,
            end_date: model.end_date,
            active: model.active,
            notes: model.notes,
            category_ids: Vec::new(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
