//! Append-only event log written by the bet placement workflow.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "event_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub source: String,
    pub kind: String,
    pub ref_id: Option<String>,
    pub payload: Json,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn new_event(source: &str, kind: &str, ref_id: Option<&str>, payload: Value) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        source: ActiveValue::Set(source.to_string()),
        kind: ActiveValue::Set(kind.to_string()),
        ref_id: ActiveValue::Set(ref_id.map(str::to_string)),
        payload: ActiveValue::Set(payload),
        created_at: ActiveValue::Set(chrono::Utc::now()),
    }
}
