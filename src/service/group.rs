use chrono::{SubsecRound, Utc};
use log::info;
use uuid::Uuid;

use crate::db;
use crate::dto::{GroupData, NewGroupDto, UpdateGroupDto};
use crate::errors::ApiError;
use crate::models::{Group, JoinStatus, User};
use crate::DbPool;

fn duplicate_membership(err: sqlx::Error) -> ApiError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ApiError::conflict("Already a member of this group.")
        }
        _ => err.into(),
    }
}

/// Ride groups and their memberships. Membership changes are single
/// guarded statements, so concurrent requests never need a read lock
/// upgraded to a write.
#[derive(Clone)]
pub struct GroupService {
    pool: DbPool,
    page_size: i64,
}

impl GroupService {
    pub fn new(pool: DbPool, page_size: i64) -> Self {
        Self { pool, page_size }
    }

    pub async fn create(&self, owner: &User, dto: NewGroupDto) -> Result<GroupData, ApiError> {
        if dto.name.trim().is_empty() {
            return Err(ApiError::Validation("Field 'name' must not be empty.".to_string()));
        }
        let group = Group {
            id: Uuid::new_v4(),
            name: dto.name,
            description: dto.description.filter(|text| !text.is_empty()),
            created_by: owner.id.clone(),
            created_at: Utc::now().trunc_subsecs(0),
        };

        let mut tx = self.pool.begin().await?;
        db::group::create(&group, &mut *tx).await?;
        db::group::members::join(group.id, &owner.id, JoinStatus::Member, &mut *tx).await?;
        let members = db::group::members::get(group.id, &mut *tx).await?;
        tx.commit().await?;

        info!("group {} created by {}", group.id, owner.id);
        Ok(GroupData::new(group, members))
    }

    pub async fn update(&self, user: &User, dto: UpdateGroupDto) -> Result<(), ApiError> {
        let group = self.find(dto.group_id).await?;
        if group.created_by != user.id {
            return Err(ApiError::forbidden("You do not have the permission to update this group."));
        }
        if let Some(name) = &dto.name {
            if name.trim().is_empty() {
                return Err(ApiError::Validation("Field 'name' must not be empty.".to_string()));
            }
        }
        let description = dto.description.as_deref().filter(|text| !text.is_empty());
        db::group::update(
            group.id,
            dto.name.as_deref(),
            dto.description.is_some(),
            description,
            &self.pool,
        )
        .await?;
        Ok(())
    }

    pub async fn get_by_id(&self, group_id: Uuid) -> Result<GroupData, ApiError> {
        let group = self.find(group_id).await?;
        let members = db::group::members::get(group.id, &self.pool).await?;
        Ok(GroupData::new(group, members))
    }

    pub async fn list(&self, offset: i64) -> Result<Vec<GroupData>, ApiError> {
        let groups = db::group::get_many(offset, self.page_size, &self.pool).await?;
        let mut data = Vec::with_capacity(groups.len());
        for group in groups {
            let members = db::group::members::get(group.id, &self.pool).await?;
            data.push(GroupData::new(group, members));
        }
        Ok(data)
    }

    /// Requests membership. The owner has to approve it.
    pub async fn join(&self, user: &User, group_id: Uuid) -> Result<(), ApiError> {
        let group = self.find(group_id).await?;
        db::group::members::join(group.id, &user.id, JoinStatus::Pending, &self.pool)
            .await
            .map_err(duplicate_membership)?;
        info!("user {} asked to join group {}", user.id, group.id);
        Ok(())
    }

    pub async fn leave(&self, user: &User, group_id: Uuid) -> Result<(), ApiError> {
        let group = self.find(group_id).await?;
        if group.created_by == user.id {
            return Err(ApiError::forbidden("The owner cannot leave their own group."));
        }
        if db::group::members::leave(group.id, &user.id, &self.pool).await? == 1 {
            return Ok(());
        }
        match db::group::members::get_status(group.id, &user.id, &self.pool).await? {
            Some(JoinStatus::Banned) => Err(ApiError::forbidden("You are banned from this group.")),
            _ => Err(ApiError::conflict("You are not a member of this group.")),
        }
    }

    /// Owner-only move of another user's membership, e.g. approving a
    /// pending request or banning a member.
    pub async fn set_member_status(
        &self,
        owner: &User,
        group_id: Uuid,
        target: &str,
        to: JoinStatus,
    ) -> Result<(), ApiError> {
        let group = self.find(group_id).await?;
        if group.created_by != owner.id {
            return Err(ApiError::forbidden(
                "You do not have the permission to change the status of a group member.",
            ));
        }
        if target == owner.id {
            return Err(ApiError::forbidden("Not allowed to change your own status."));
        }

        let from = match db::group::members::get_status(group.id, target, &self.pool).await? {
            Some(from) => from,
            None => return Err(ApiError::not_found("No member with 'userId' exists in this group.")),
        };
        if !JoinStatus::owner_can_set(from, to) {
            return Err(ApiError::Conflict(format!(
                "Cannot change membership status from '{}' to '{}'.",
                from.as_str(),
                to.as_str()
            )));
        }
        if !db::group::members::set_status(group.id, target, from, to, &self.pool).await? {
            return Err(ApiError::conflict("The membership changed concurrently. Try again."));
        }
        info!("group {}: {} moved from {} to {}", group.id, target, from.as_str(), to.as_str());
        Ok(())
    }

    async fn find(&self, group_id: Uuid) -> Result<Group, ApiError> {
        match db::group::get_by_id(group_id, &self.pool).await? {
            Some(group) => Ok(group),
            None => Err(ApiError::not_found("No group exists with 'id'.")),
        }
    }
}
