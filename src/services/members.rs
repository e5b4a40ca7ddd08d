//! Member management service

use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        member::{CreateMember, Member, MemberStatus, UpdateMember},
        query::ListQuery,
    },
    policy::Caller,
    repository::Repository,
};

#[derive(Clone)]
pub struct MembersService {
    repository: Repository,
}

impl MembersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Members visible to the caller (patrons see their own record only)
    pub async fn search(&self, caller: &Caller, query: &ListQuery) -> AppResult<(Vec<Member>, i64)> {
        self.repository
            .members
            .search(&caller.scope(), None, query)
            .await
    }

    pub async fn search_active(
        &self,
        caller: &Caller,
        query: &ListQuery,
    ) -> AppResult<(Vec<Member>, i64)> {
        caller.require_librarian("list active members")?;
        self.repository
            .members
            .search(&caller.scope(), Some(MemberStatus::Active), query)
            .await
    }

    pub async fn get(&self, caller: &Caller, id: i32) -> AppResult<Member> {
        let member = self.repository.members.get_by_id(id).await?;
        caller.ensure_can_read_member(&member)?;
        Ok(member)
    }

    pub async fn create(&self, caller: &Caller, member: CreateMember) -> AppResult<Member> {
        caller.require_librarian("create members")?;
        member.validate()?;

        let created = self.repository.members.create(&member).await?;
        tracing::info!(member_id = created.id, "Member created");
        Ok(created)
    }

    pub async fn update(&self, caller: &Caller, id: i32, update: UpdateMember) -> AppResult<Member> {
        caller.require_librarian("edit members")?;
        update.validate()?;
        self.repository.members.update(id, update).await
    }

    pub async fn set_status(
        &self,
        caller: &Caller,
        id: i32,
        status: MemberStatus,
    ) -> AppResult<Member> {
        caller.require_librarian("change member status")?;
        let member = self.repository.members.set_status(id, status).await?;
        tracing::info!(member_id = id, status = %status, "Member status changed");
        Ok(member)
    }

    /// Delete a member; its loans are deleted first and their copies restored
    pub async fn delete(&self, caller: &Caller, id: i32) -> AppResult<()> {
        caller.require_librarian("delete members")?;
        let loans = self.repository.members.delete(id).await?;
        tracing::info!(member_id = id, loans_deleted = loans, "Member deleted");
        Ok(())
    }
}
