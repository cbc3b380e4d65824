//! Appointment store - booking requests between students and lecturers

use chrono::Utc;
use sea_orm::sea_query::{Expr, IntoCondition};
use sea_orm::*;
use tracing::{debug, info};

use crate::documents::{Appointment, AppointmentStatus, NewAppointment};
use crate::entities::appointments;
use crate::error::{Result, StoreError};
use crate::message_store::datetime_from_millis;

#[derive(Clone)]
pub struct AppointmentStore {
    db: DatabaseConnection,
}

impl AppointmentStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Record a new request in `Pending`
    pub async fn insert(&self, request: NewAppointment) -> Result<Appointment> {
        let now = Utc::now().timestamp_millis();
        let model = appointments::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            student_id: Set(request.student_id),
            student_name: Set(request.student_name),
            student_email: Set(request.student_email),
            lecturer_id: Set(request.lecturer_id),
            lecturer_name: Set(request.lecturer_name),
            lecturer_email: Set(request.lecturer_email),
            module: Set(request.module),
            date: Set(request.date),
            time: Set(request.time),
            reason: Set(request.reason),
            status: Set(AppointmentStatus::Pending.as_str().to_string()),
            reply: Set(None),
            student_viewed: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(
            "Appointment {} requested by {} with {}",
            model.id, model.student_id, model.lecturer_id
        );
        model_to_appointment(model)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Appointment>> {
        appointments::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .map(model_to_appointment)
            .transpose()
    }

    /// Requests made by a student, newest first
    pub async fn for_student(&self, student_id: &str) -> Result<Vec<Appointment>> {
        self.list(appointments::Column::StudentId.eq(student_id)).await
    }

    /// Requests addressed to a lecturer, newest first
    pub async fn for_lecturer(&self, lecturer_id: &str) -> Result<Vec<Appointment>> {
        self.list(appointments::Column::LecturerId.eq(lecturer_id)).await
    }

    /// Decided requests the student has not opened yet
    pub async fn unviewed_for_student(&self, student_id: &str) -> Result<Vec<Appointment>> {
        self.list(
            Condition::all()
                .add(appointments::Column::StudentId.eq(student_id))
                .add(appointments::Column::Status.ne(AppointmentStatus::Pending.as_str()))
                .add(appointments::Column::StudentViewed.eq(false)),
        )
        .await
    }

    /// Move a request from `from` to `to`
    ///
    /// The status check and the write are one conditional UPDATE, so two
    /// deciders racing on the same request cannot both succeed. Returns
    /// whether this call made the change.
    pub async fn transition(
        &self,
        id: &str,
        from: AppointmentStatus,
        to: AppointmentStatus,
        reply: Option<String>,
    ) -> Result<bool> {
        let result = appointments::Entity::update_many()
            .col_expr(appointments::Column::Status, Expr::value(to.as_str()))
            .col_expr(appointments::Column::Reply, Expr::value(reply))
            .col_expr(
                appointments::Column::UpdatedAt,
                Expr::value(Utc::now().timestamp_millis()),
            )
            .filter(appointments::Column::Id.eq(id))
            .filter(appointments::Column::Status.eq(from.as_str()))
            .exec(&self.db)
            .await?;

        let applied = result.rows_affected > 0;
        debug!("Appointment {} {} -> {}: {}", id, from, to, applied);
        Ok(applied)
    }

    /// Flag a decided request as opened by the student
    pub async fn mark_viewed(&self, id: &str) -> Result<bool> {
        let result = appointments::Entity::update_many()
            .col_expr(appointments::Column::StudentViewed, Expr::value(true))
            .filter(appointments::Column::Id.eq(id))
            .filter(appointments::Column::Status.ne(AppointmentStatus::Pending.as_str()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn list<F>(&self, filter: F) -> Result<Vec<Appointment>>
    where
        F: IntoCondition,
    {
        appointments::Entity::find()
            .filter(filter)
            .order_by_desc(appointments::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(model_to_appointment)
            .collect()
    }
}

fn model_to_appointment(model: appointments::Model) -> Result<Appointment> {
    let status = model
        .status
        .parse::<AppointmentStatus>()
        .map_err(|reason| StoreError::Corrupted {
            id: model.id.clone(),
            reason,
        })?;
    let created_at = datetime_from_millis(&model.id, model.created_at)?;
    let updated_at = datetime_from_millis(&model.id, model.updated_at)?;

    Ok(Appointment {
        id: model.id,
        student_id: model.student_id,
        student_name: model.student_name,
        student_email: model.student_email,
        lecturer_id: model.lecturer_id,
        lecturer_name: model.lecturer_name,
        lecturer_email: model.lecturer_email,
        module: model.module,
        date: model.date,
        time: model.time,
        reason: model.reason,
        status,
        reply: model.reply,
        student_viewed: model.student_viewed,
        created_at,
        updated_at,
    })
}
