mod invitations;
mod roles;

pub use invitations::Entity as UserInvitations;
pub use invitations::Model as Invitation;
pub use roles::Entity as UserRoles;
pub use roles::Model as UserRole;
pub use roles::Role;

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::{thread_rng, RngCore};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::Deserialize;

use sitecms::algorithm::SnowflakeId;
use sitecms::cache::{cached, Scope, Snapshots};

pub const INVITATION_TTL_DAYS: i64 = 7;

pub struct Users {
    db: Arc<DatabaseConnection>,
    cache: Arc<dyn Snapshots>,
    ids: Arc<SnowflakeId>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewInvitation {
    pub email: String,
    pub role: Role,
}

fn invitation_token() -> String {
    let mut bytes = [0u8; 32];
    thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl Users {
    pub fn new(
        db: Arc<DatabaseConnection>,
        cache: Arc<dyn Snapshots>,
        ids: Arc<SnowflakeId>,
    ) -> Self {
        Self { db, cache, ids }
    }

    pub async fn get_role(&self, user_id: &str) -> Result<Option<Role>, DbErr> {
        let role = cached(self.cache.as_ref(), Scope::UserRoles, user_id, || async {
            UserRoles::find()
                .filter(roles::Column::UserId.eq(user_id))
                .one(&*self.db)
                .await
        })
        .await?;

        Ok(role.map(|role| role.role))
    }

    pub async fn list_roles(&self) -> Result<Vec<UserRole>, DbErr> {
        cached(self.cache.as_ref(), Scope::UserRoles, "all", || async {
            UserRoles::find()
                .order_by_asc(roles::Column::CreatedAt)
                .all(&*self.db)
                .await
        })
        .await
    }

    /// Grant `role`, replacing whatever the user had.
    pub async fn set_role(&self, user_id: &str, role: Role) -> Result<UserRole, DbErr> {
        UserRoles::insert(roles::ActiveModel {
            id: Set(self.ids.generate()),
            user_id: Set(user_id.to_string()),
            role: Set(role),
            created_at: Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::column(roles::Column::UserId)
                .update_column(roles::Column::Role)
                .to_owned(),
        )
        .exec_without_returning(&*self.db)
        .await?;

        self.cache.invalidate(Scope::UserRoles).await;

        UserRoles::find()
            .filter(roles::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("Role of {} not found", user_id)))
    }

    pub async fn remove_role(&self, user_id: &str) -> Result<(), DbErr> {
        let result = UserRoles::delete_many()
            .filter(roles::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("Role of {} not found", user_id)));
        }

        self.cache.invalidate(Scope::UserRoles).await;
        Ok(())
    }

    /// Invitations neither accepted nor expired, newest first.
    pub async fn list_pending_invitations(&self) -> Result<Vec<Invitation>, DbErr> {
        let now = Utc::now();
        let invitations = cached(self.cache.as_ref(), Scope::Invitations, "all", || async {
            UserInvitations::find()
                .filter(invitations::Column::AcceptedAt.is_null())
                .order_by_desc(invitations::Column::CreatedAt)
                .all(&*self.db)
                .await
        })
        .await?;

        Ok(invitations
            .into_iter()
            .filter(|invitation| invitation.expires_at > now)
            .collect())
    }

    pub async fn invite(
        &self,
        invitation: NewInvitation,
        invited_by: &str,
    ) -> Result<Invitation, DbErr> {
        let now = Utc::now();
        let record = invitations::ActiveModel {
            id: Set(self.ids.generate()),
            email: Set(invitation.email.trim().to_lowercase()),
            role: Set(invitation.role),
            invited_by: Set(Some(invited_by.to_string())),
            token: Set(invitation_token()),
            expires_at: Set(now + Duration::days(INVITATION_TTL_DAYS)),
            accepted_at: Set(None),
            created_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        self.cache.invalidate(Scope::Invitations).await;
        Ok(record)
    }

    pub async fn cancel_invitation(&self, id: i64) -> Result<(), DbErr> {
        let result = UserInvitations::delete_by_id(id).exec(&*self.db).await?;

        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("Invitation {} not found", id)));
        }

        self.cache.invalidate(Scope::Invitations).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::testing::{cache, ids, mock};
    use sea_orm::MockExecResult;

    fn role(user_id: &str, role: Role) -> UserRole {
        UserRole {
            id: 51,
            user_id: user_id.to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    fn invitation(expires_in_days: i64) -> Invitation {
        let now = Utc::now();

        Invitation {
            id: 61,
            email: "editor@example.com".to_string(),
            role: Role::Editor,
            invited_by: Some("user-1".to_string()),
            token: invitation_token(),
            expires_at: now + Duration::days(expires_in_days),
            accepted_at: None,
            created_at: now,
        }
    }

    #[test]
    fn test_invitation_token_is_random_hex() {
        let first = invitation_token();

        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, invitation_token());
    }

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"editor\"").unwrap(),
            Role::Editor
        );
    }

    #[tokio::test]
    async fn test_get_role_of_unknown_user() {
        let db = mock(|db| db.append_query_results([Vec::<UserRole>::new()]));
        let users = Users::new(db, cache(), ids());

        assert_eq!(users.get_role("stranger").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_role_invalidates_lookup() {
        let db = mock(|db| {
            db.append_query_results([
                vec![role("user-2", Role::Editor)],
                vec![role("user-2", Role::Admin)],
                vec![role("user-2", Role::Admin)],
            ])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
        });
        let users = Users::new(db, cache(), ids());

        assert_eq!(users.get_role("user-2").await.unwrap(), Some(Role::Editor));
        assert_eq!(users.set_role("user-2", Role::Admin).await.unwrap().role, Role::Admin);
        assert_eq!(users.get_role("user-2").await.unwrap(), Some(Role::Admin));
    }

    #[tokio::test]
    async fn test_expired_invitations_are_hidden() {
        let db = mock(|db| db.append_query_results([vec![invitation(3), invitation(-1)]]));
        let users = Users::new(db, cache(), ids());

        let pending = users.list_pending_invitations().await.unwrap();

        assert_eq!(pending.len(), 1);
        assert!(pending[0].expires_at > Utc::now());
    }
}
