//! Appointment request entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub student_email: String,
    pub lecturer_id: String,
    pub lecturer_name: String,
    pub lecturer_email: String,
    pub module: String,
    pub date: String,
    pub time: String,
    pub reason: String,
    pub status: String, // "Pending", "Approved" or "Rejected"
    pub reply: Option<String>,
    pub student_viewed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
