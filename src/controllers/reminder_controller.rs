use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::{ApiResponse, Paginated, StatusResponse};
use crate::dto::maintenance_dto::{ReminderFilters, ReminderListItem, UpdateReminderRequest};
use crate::models::Reminder;
use crate::repositories::reminder_repository::{ReminderLabelRow, ReminderRepository};
use crate::utils::errors::{not_found_error, AppError};
use crate::utils::validation::{page_bounds, resolve_ordering};

const REMINDER_ORDERING: &[(&str, &str)] = &[
    ("due_date", "rem.due_date"),
    ("created_at", "rem.created_at"),
];

pub struct ReminderController {
    repository: ReminderRepository,
}

impl ReminderController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ReminderRepository::new(pool),
        }
    }

    pub async fn list(&self, user_id: Uuid, filters: ReminderFilters) -> Result<Paginated<ReminderListItem>, AppError> {
        let order_by = resolve_ordering(filters.ordering.as_deref(), REMINDER_ORDERING, "due_date")?;
        let (limit, offset) = page_bounds(filters.limit, filters.offset);

        let (rows, count) = self
            .repository
            .list(user_id, filters.is_completed, &order_by, limit, offset)
            .await?;

        Ok(Paginated {
            count,
            limit,
            offset,
            results: rows.into_iter().map(list_item).collect(),
        })
    }

    pub async fn upcoming(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Paginated<ReminderListItem>, AppError> {
        let (limit, offset) = page_bounds(limit, offset);
        let today = Utc::now().date_naive();

        let (rows, count) = self.repository.upcoming(user_id, today, limit, offset).await?;

        Ok(Paginated {
            count,
            limit,
            offset,
            results: rows.into_iter().map(list_item).collect(),
        })
    }

    pub async fn get_by_id(&self, id: Uuid, user_id: Uuid) -> Result<Reminder, AppError> {
        self.repository
            .find_owned(id, user_id)
            .await?
            .ok_or_else(|| not_found_error("Reminder", id))
    }

    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        request: UpdateReminderRequest,
    ) -> Result<ApiResponse<Reminder>, AppError> {
        request.validate()?;

        let mut reminder = self.get_by_id(id, user_id).await?;
        if let Some(due_date) = request.due_date {
            reminder.due_date = due_date;
        }
        if let Some(is_completed) = request.is_completed {
            reminder.is_completed = is_completed;
        }
        if let Some(notes) = request.notes {
            reminder.notes = notes;
        }

        let reminder = self.repository.update(&reminder).await?;
        Ok(ApiResponse::success_with_message(reminder, "Reminder updated successfully"))
    }

    pub async fn set_completed(
        &self,
        id: Uuid,
        user_id: Uuid,
        is_completed: bool,
    ) -> Result<StatusResponse, AppError> {
        let reminder = self.get_by_id(id, user_id).await?;
        self.repository.set_completed(reminder.id, is_completed).await?;

        Ok(StatusResponse::new(if is_completed {
            "reminder marked as completed"
        } else {
            "reminder marked as not completed"
        }))
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let reminder = self.get_by_id(id, user_id).await?;
        self.repository.delete(reminder.id).await?;
        Ok(())
    }
}

fn list_item(row: ReminderLabelRow) -> ReminderListItem {
    ReminderListItem {
        maintenance_record: row.record_label(),
        id: row.id,
        due_date: row.due_date,
        is_completed: row.is_completed,
        notes: row.notes,
    }
}
