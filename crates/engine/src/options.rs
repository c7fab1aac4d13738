//! Options (outcomes) of a prediction market.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "prediction_options")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub prediction_id: String,
    pub label: String,
    /// Payout multiplier in basis points (20_000 = 2.0x).
    pub payout_multiplier_bp: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::predictions::Entity",
        from = "Column::PredictionId",
        to = "super::predictions::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Predictions,
}

impl Related<super::predictions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Predictions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
