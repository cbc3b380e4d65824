//! Chat message entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "chat_messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub scope_key: String,
    pub seq: i64,
    pub sender_id: String,
    pub sender_name: String,
    pub kind: String, // "text", "poll" or "announcement"
    pub text: String,
    pub body_json: String,
    pub reply_json: Option<String>,
    pub image_url: Option<String>,
    pub reactions_json: String,
    pub sent_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
