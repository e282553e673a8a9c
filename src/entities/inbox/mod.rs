mod inquiries;

pub use inquiries::Entity as ContactInquiries;
pub use inquiries::Model as Inquiry;

use std::sync::Arc;

use chrono::Utc;
use sea_orm::entity::prelude::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;

use sitecms::algorithm::SnowflakeId;
use sitecms::cache::{cached, Scope, Snapshots};

pub struct Inbox {
    db: Arc<DatabaseConnection>,
    cache: Arc<dyn Snapshots>,
    ids: Arc<SnowflakeId>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewInquiry {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

impl Inbox {
    pub fn new(
        db: Arc<DatabaseConnection>,
        cache: Arc<dyn Snapshots>,
        ids: Arc<SnowflakeId>,
    ) -> Self {
        Self { db, cache, ids }
    }

    /// Newest first.
    pub async fn list_inquiries(&self) -> Result<Vec<Inquiry>, DbErr> {
        cached(self.cache.as_ref(), Scope::Inquiries, "all", || async {
            ContactInquiries::find()
                .order_by_desc(inquiries::Column::CreatedAt)
                .all(&*self.db)
                .await
        })
        .await
    }

    pub async fn create_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry, DbErr> {
        let record = inquiries::ActiveModel {
            id: Set(self.ids.generate()),
            name: Set(inquiry.name),
            email: Set(inquiry.email),
            phone: Set(inquiry.phone.filter(|phone| !phone.trim().is_empty())),
            message: Set(inquiry.message),
            is_read: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        self.cache.invalidate(Scope::Inquiries).await;
        Ok(record)
    }

    pub async fn mark_inquiry(&self, id: i64, is_read: bool) -> Result<Inquiry, DbErr> {
        let result = ContactInquiries::update_many()
            .col_expr(inquiries::Column::IsRead, Expr::value(is_read))
            .filter(inquiries::Column::Id.eq(id))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("Inquiry {} not found", id)));
        }

        self.cache.invalidate(Scope::Inquiries).await;

        ContactInquiries::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("Inquiry {} not found", id)))
    }

    pub async fn delete_inquiry(&self, id: i64) -> Result<(), DbErr> {
        let result = ContactInquiries::delete_by_id(id).exec(&*self.db).await?;

        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("Inquiry {} not found", id)));
        }

        self.cache.invalidate(Scope::Inquiries).await;
        Ok(())
    }

    /// `(total, unread)`
    pub async fn count_inquiries(&self) -> Result<(u64, u64), DbErr> {
        let total = ContactInquiries::find().count(&*self.db).await?;
        let unread = ContactInquiries::find()
            .filter(inquiries::Column::IsRead.eq(false))
            .count(&*self.db)
            .await?;

        Ok((total, unread))
    }
}
