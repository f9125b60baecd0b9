//! Users, organizations and the namespace/project hierarchy.

use async_trait::async_trait;
use chrono::Utc;

use collabcache_core::cache::WriteOp;
use collabcache_core::domain::{Namespace, Organization, Project, User};
use collabcache_core::storage::{
    NamespaceRepository, OrganizationRepository, Page, Patch, ProjectRepository, RepositoryError,
    Result, UserRepository,
};
use collabcache_core::{Id, RequestContext};

use super::repository::{
    apply_patch, find, find_mut, insert_new, page_of, push_unique, remove, InMemoryRepository,
};

const USER: &str = "User";
const ORGANIZATION: &str = "Organization";
const NAMESPACE: &str = "Namespace";
const PROJECT: &str = "Project";

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn create(&self, _ctx: &RequestContext, user: &User) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(USER, WriteOp::Create)?;

        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: USER,
                id: user.email.clone(),
            });
        }

        let mut user = user.clone();
        user.created_at.get_or_insert_with(Utc::now);
        insert_new(&mut tables.users, USER, user.id, user)
    }

    async fn get(&self, _ctx: &RequestContext, id: &Id) -> Result<User> {
        self.count_read();
        find(&self.tables.read().await.users, USER, id)
    }

    async fn get_by_email(&self, _ctx: &RequestContext, email: &str) -> Result<User> {
        self.count_read();
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(USER, email))
    }

    async fn get_all(&self, _ctx: &RequestContext, page: Page) -> Result<Vec<User>> {
        self.count_read();
        Ok(page_of(&self.tables.read().await.users, page, |_| true))
    }

    async fn update(&self, _ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<User> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(USER, WriteOp::Update)?;

        let user = find_mut(&mut tables.users, USER, id)?;
        *user = apply_patch(user, patch)?;
        Ok(user.clone())
    }

    async fn delete(&self, _ctx: &RequestContext, id: &Id) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(USER, WriteOp::Delete)?;

        remove(&mut tables.users, USER, id)?;
        for organization in tables.organizations.values_mut() {
            organization.members.retain(|m| m != id);
        }
        for role in tables.roles.values_mut() {
            role.members.retain(|m| m != id);
        }
        Ok(())
    }
}

#[async_trait]
impl OrganizationRepository for InMemoryRepository {
    async fn create(
        &self,
        _ctx: &RequestContext,
        owner: &Id,
        organization: &Organization,
    ) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(ORGANIZATION, WriteOp::Create)?;

        if !tables.users.contains_key(owner) {
            return Err(RepositoryError::not_found(USER, owner));
        }

        let mut organization = organization.clone();
        push_unique(&mut organization.members, *owner);
        organization.created_at.get_or_insert_with(Utc::now);
        insert_new(
            &mut tables.organizations,
            ORGANIZATION,
            organization.id,
            organization,
        )
    }

    async fn get(&self, _ctx: &RequestContext, id: &Id) -> Result<Organization> {
        self.count_read();
        find(&self.tables.read().await.organizations, ORGANIZATION, id)
    }

    async fn get_all(&self, _ctx: &RequestContext, page: Page) -> Result<Vec<Organization>> {
        self.count_read();
        Ok(page_of(&self.tables.read().await.organizations, page, |_| true))
    }

    async fn update(&self, _ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Organization> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(ORGANIZATION, WriteOp::Update)?;

        let organization = find_mut(&mut tables.organizations, ORGANIZATION, id)?;
        *organization = apply_patch(organization, patch)?;
        Ok(organization.clone())
    }

    async fn add_member(
        &self,
        _ctx: &RequestContext,
        organization: &Id,
        member: &Id,
    ) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(ORGANIZATION, WriteOp::AddMember)?;

        if !tables.users.contains_key(member) {
            return Err(RepositoryError::not_found(USER, member));
        }
        let organization = find_mut(&mut tables.organizations, ORGANIZATION, organization)?;
        push_unique(&mut organization.members, *member);
        Ok(())
    }

    async fn remove_member(
        &self,
        _ctx: &RequestContext,
        organization: &Id,
        member: &Id,
    ) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(ORGANIZATION, WriteOp::RemoveMember)?;

        let organization = find_mut(&mut tables.organizations, ORGANIZATION, organization)?;
        organization.members.retain(|m| m != member);
        Ok(())
    }

    async fn delete(&self, _ctx: &RequestContext, id: &Id) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(ORGANIZATION, WriteOp::Delete)?;

        remove(&mut tables.organizations, ORGANIZATION, id)?;
        tables.parents.retain(|_, parent| *parent != *id);
        Ok(())
    }
}

#[async_trait]
impl NamespaceRepository for InMemoryRepository {
    async fn create(
        &self,
        _ctx: &RequestContext,
        organization: &Id,
        namespace: &Namespace,
    ) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(NAMESPACE, WriteOp::Create)?;

        if !tables.organizations.contains_key(organization) {
            return Err(RepositoryError::not_found(ORGANIZATION, organization));
        }

        let mut created = namespace.clone();
        created.created_at.get_or_insert_with(Utc::now);
        insert_new(&mut tables.namespaces, NAMESPACE, namespace.id, created)?;

        tables.parents.insert(namespace.id, *organization);
        let parent = find_mut(&mut tables.organizations, ORGANIZATION, organization)?;
        push_unique(&mut parent.namespaces, namespace.id);
        Ok(())
    }

    async fn get(&self, _ctx: &RequestContext, id: &Id) -> Result<Namespace> {
        self.count_read();
        find(&self.tables.read().await.namespaces, NAMESPACE, id)
    }

    async fn get_all(
        &self,
        _ctx: &RequestContext,
        organization: &Id,
        page: Page,
    ) -> Result<Vec<Namespace>> {
        self.count_read();
        let tables = self.tables.read().await;
        Ok(page_of(&tables.namespaces, page, |ns| {
            tables.parent_is(&ns.id, organization)
        }))
    }

    async fn update(&self, _ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Namespace> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(NAMESPACE, WriteOp::Update)?;

        let namespace = find_mut(&mut tables.namespaces, NAMESPACE, id)?;
        *namespace = apply_patch(namespace, patch)?;
        Ok(namespace.clone())
    }

    async fn delete(&self, _ctx: &RequestContext, id: &Id) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(NAMESPACE, WriteOp::Delete)?;

        remove(&mut tables.namespaces, NAMESPACE, id)?;
        if let Some(organization) = tables.parents.remove(id) {
            if let Some(organization) = tables.organizations.get_mut(&organization) {
                organization.namespaces.retain(|ns| ns != id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for InMemoryRepository {
    async fn create(&self, _ctx: &RequestContext, namespace: &Id, project: &Project) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(PROJECT, WriteOp::Create)?;

        if tables.projects.values().any(|p| p.key == project.key) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: PROJECT,
                id: project.key.clone(),
            });
        }

        if !tables.namespaces.contains_key(namespace) {
            return Err(RepositoryError::not_found(NAMESPACE, namespace));
        }

        let mut created = project.clone();
        created.created_at.get_or_insert_with(Utc::now);
        insert_new(&mut tables.projects, PROJECT, project.id, created)?;

        tables.parents.insert(project.id, *namespace);
        let parent = find_mut(&mut tables.namespaces, NAMESPACE, namespace)?;
        push_unique(&mut parent.projects, project.id);
        Ok(())
    }

    async fn get(&self, _ctx: &RequestContext, id: &Id) -> Result<Project> {
        self.count_read();
        find(&self.tables.read().await.projects, PROJECT, id)
    }

    async fn get_by_key(&self, _ctx: &RequestContext, key: &str) -> Result<Project> {
        self.count_read();
        let tables = self.tables.read().await;
        tables
            .projects
            .values()
            .find(|p| p.key == key)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(PROJECT, key))
    }

    async fn get_all(
        &self,
        _ctx: &RequestContext,
        namespace: &Id,
        page: Page,
    ) -> Result<Vec<Project>> {
        self.count_read();
        let tables = self.tables.read().await;
        Ok(page_of(&tables.projects, page, |p| {
            tables.parent_is(&p.id, namespace)
        }))
    }

    async fn update(&self, _ctx: &RequestContext, id: &Id, patch: &Patch) -> Result<Project> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(PROJECT, WriteOp::Update)?;

        let project = find_mut(&mut tables.projects, PROJECT, id)?;
        *project = apply_patch(project, patch)?;
        Ok(project.clone())
    }

    async fn delete(&self, _ctx: &RequestContext, id: &Id) -> Result<()> {
        self.count_write();
        let mut tables = self.tables.write().await;
        tables.check_writable(PROJECT, WriteOp::Delete)?;

        remove(&mut tables.projects, PROJECT, id)?;
        if let Some(namespace) = tables.parents.remove(id) {
            if let Some(namespace) = tables.namespaces.get_mut(&namespace) {
                namespace.projects.retain(|p| p != id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collabcache_core::ResourceType;

    #[tokio::test]
    async fn test_user_lookup_by_email() {
        let ctx = RequestContext::new();
        let repo = InMemoryRepository::new();
        let user = User::new("alice", "a@x");
        UserRepository::create(&repo, &ctx, &user).await.unwrap();

        let found = repo.get_by_email(&ctx, "a@x").await.unwrap();
        assert_eq!(found.id, user.id);
        assert!(repo.get_by_email(&ctx, "b@x").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let ctx = RequestContext::new();
        let repo = InMemoryRepository::new();
        UserRepository::create(&repo, &ctx, &User::new("alice", "a@x"))
            .await
            .unwrap();

        let result = UserRepository::create(&repo, &ctx, &User::new("alice2", "a@x")).await;
        assert!(matches!(result, Err(RepositoryError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_organization_owner_is_member() {
        let ctx = RequestContext::new();
        let repo = InMemoryRepository::new();
        let owner = User::new("alice", "a@x");
        UserRepository::create(&repo, &ctx, &owner).await.unwrap();
        let org = Organization::new("acme", "ops@acme");

        OrganizationRepository::create(&repo, &ctx, &owner.id, &org)
            .await
            .unwrap();

        let stored = OrganizationRepository::get(&repo, &ctx, &org.id).await.unwrap();
        assert_eq!(stored.members, vec![owner.id]);
    }

    #[tokio::test]
    async fn test_namespaces_are_scoped_to_organization() {
        let ctx = RequestContext::new();
        let repo = InMemoryRepository::new();
        let owner = User::new("alice", "a@x");
        UserRepository::create(&repo, &ctx, &owner).await.unwrap();
        let acme = Organization::new("acme", "ops@acme");
        let initech = Organization::new("initech", "ops@initech");
        OrganizationRepository::create(&repo, &ctx, &owner.id, &acme)
            .await
            .unwrap();
        OrganizationRepository::create(&repo, &ctx, &owner.id, &initech)
            .await
            .unwrap();

        NamespaceRepository::create(&repo, &ctx, &acme.id, &Namespace::new("eng"))
            .await
            .unwrap();
        NamespaceRepository::create(&repo, &ctx, &initech.id, &Namespace::new("sales"))
            .await
            .unwrap();

        let listed = NamespaceRepository::get_all(&repo, &ctx, &acme.id, Page::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "eng");
    }

    #[tokio::test]
    async fn test_project_key_lookup() {
        let ctx = RequestContext::new();
        let repo = InMemoryRepository::new();
        let owner = User::new("alice", "a@x");
        UserRepository::create(&repo, &ctx, &owner).await.unwrap();
        let org = Organization::new("acme", "ops@acme");
        OrganizationRepository::create(&repo, &ctx, &owner.id, &org)
            .await
            .unwrap();
        let ns = Namespace::new("eng");
        NamespaceRepository::create(&repo, &ctx, &org.id, &ns)
            .await
            .unwrap();
        let project = Project::new("CORE", "Core platform");
        ProjectRepository::create(&repo, &ctx, &ns.id, &project)
            .await
            .unwrap();

        let found = repo.get_by_key(&ctx, "CORE").await.unwrap();
        assert_eq!(found.id, project.id);

        let parent = NamespaceRepository::get(&repo, &ctx, &ns.id).await.unwrap();
        assert_eq!(parent.projects, vec![project.id]);
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let ctx = RequestContext::new();
        let repo = InMemoryRepository::new();

        let err = UserRepository::update(&repo, &ctx, &Id::new(ResourceType::User), &Patch::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let ctx = RequestContext::new();
        let repo = InMemoryRepository::new();
        repo.set_write_failure(Some("disk full")).await;

        let err = UserRepository::create(&repo, &ctx, &User::new("alice", "a@x"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "User Create failed: disk full");
        assert_eq!(repo.writes(), 1);
    }
}
