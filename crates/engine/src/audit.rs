//! User-facing audit records of money events.
//!
//! The unique constraint on (provider, external_ref) is what turns a
//! retried call into a no-op: inserts use ignore-on-duplicate semantics and
//! a zero row count means the event was already recorded.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde_json::{Map, Value};

use crate::{Currency, Money};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Credit,
    Debit,
}

impl Direction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallet_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub direction: String,
    pub kind: String,
    pub channel: String,
    pub provider: String,
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
    pub external_ref: String,
    pub prediction_id: Option<String>,
    pub entry_id: Option<String>,
    pub description: Option<String>,
    pub from_account: Option<String>,
    pub to_account: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
    pub metadata: Json,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Parameters for one audit row; optional columns default to `None`.
pub(crate) struct AuditRow<'a> {
    pub user_id: &'a str,
    pub direction: Direction,
    pub kind: &'a str,
    pub channel: &'a str,
    pub provider: &'a str,
    pub amount: Money,
    pub currency: Currency,
    pub external_ref: &'a str,
    pub prediction_id: Option<&'a str>,
    pub entry_id: Option<&'a str>,
    pub description: Option<&'a str>,
    pub from_account: Option<&'a str>,
    pub to_account: Option<&'a str>,
    pub reference_type: Option<&'a str>,
    pub reference_id: Option<&'a str>,
    pub metadata: Option<Map<String, Value>>,
}

impl AuditRow<'_> {
    pub(crate) fn into_model(self) -> (String, ActiveModel) {
        let id = Uuid::new_v4().to_string();
        let metadata = self
            .metadata
            .map(Value::Object)
            .unwrap_or_else(|| Value::Object(Map::new()));
        let model = ActiveModel {
            id: ActiveValue::Set(id.clone()),
            user_id: ActiveValue::Set(self.user_id.to_string()),
            direction: ActiveValue::Set(self.direction.as_str().to_string()),
            kind: ActiveValue::Set(self.kind.to_string()),
            channel: ActiveValue::Set(self.channel.to_string()),
            provider: ActiveValue::Set(self.provider.to_string()),
            amount_minor: ActiveValue::Set(self.amount.minor()),
            currency: ActiveValue::Set(self.currency.code().to_string()),
            status: ActiveValue::Set("completed".to_string()),
            external_ref: ActiveValue::Set(self.external_ref.to_string()),
            prediction_id: ActiveValue::Set(self.prediction_id.map(str::to_string)),
            entry_id: ActiveValue::Set(self.entry_id.map(str::to_string)),
            description: ActiveValue::Set(self.description.map(str::to_string)),
            from_account: ActiveValue::Set(self.from_account.map(str::to_string)),
            to_account: ActiveValue::Set(self.to_account.map(str::to_string)),
            reference_type: ActiveValue::Set(self.reference_type.map(str::to_string)),
            reference_id: ActiveValue::Set(self.reference_id.map(str::to_string)),
            metadata: ActiveValue::Set(metadata),
            created_at: ActiveValue::Set(chrono::Utc::now()),
        };
        (id, model)
    }
}
