use std::sync::Arc;

use localeyes_core::social::{page_window, User, RESERVED_USERNAMES};
use localeyes_core::storage::codec::{
    item_to_user, user_by_email_item, user_by_id_item, user_by_username_item, ATTR_CITY,
    ATTR_DWELLING_AGE, ATTR_IS_ACTIVE, ATTR_PASSWORD, ATTR_TAG, ATTR_USERNAME,
};
use localeyes_core::storage::{
    keys, Condition, Filter, ItemKey, Query, RepositoryError, Result, TableStore,
    TransactWriteItem, UpdateAction, Value,
};

const ENTITY: &str = "User";

/// Users, stored as three views: by id (sort key is the active flag), by
/// email and by username.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn TableStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Writes the three views of a new user in one transaction.
    ///
    /// A taken email or username is reported as `AlreadyExists` naming the
    /// view that collided.
    pub async fn create(&self, user: &User) -> Result<()> {
        let writes = vec![
            TransactWriteItem::put(user_by_id_item(user), Some(Condition::NotExists)),
            TransactWriteItem::put(user_by_email_item(user), Some(Condition::NotExists)),
            TransactWriteItem::put(user_by_username_item(user), Some(Condition::NotExists)),
        ];

        self.store.transact_write(writes).await.map_err(|e| {
            if e.failed_at(1) {
                RepositoryError::AlreadyExists {
                    entity_type: "Email",
                    id: user.email.clone(),
                }
            } else if e.failed_at(2) {
                RepositoryError::AlreadyExists {
                    entity_type: "Username",
                    id: user.username.clone(),
                }
            } else if e.failed_at(0) {
                RepositoryError::AlreadyExists {
                    entity_type: ENTITY,
                    id: user.id.clone(),
                }
            } else {
                e
            }
        })?;

        tracing::info!(user_id = %user.id, username = %user.username, "Created user");
        Ok(())
    }

    async fn fetch(&self, key: ItemKey, id: &str) -> Result<User> {
        match self.store.get(&key).await? {
            Some(item) => item_to_user(&item),
            None => Err(RepositoryError::NotFound {
                entity_type: ENTITY,
                id: id.to_string(),
            }),
        }
    }

    pub async fn fetch_by_email(&self, email: &str) -> Result<User> {
        self.fetch(keys::user_by_email(email), email).await
    }

    pub async fn fetch_by_username(&self, username: &str) -> Result<User> {
        self.fetch(keys::user_by_username(username), username).await
    }

    /// Looks a user up by id; the caller names the active status because it
    /// is part of the key.
    pub async fn fetch_by_id(&self, user_id: &str, is_active: bool) -> Result<User> {
        self.fetch(keys::user_by_id(user_id, is_active), user_id)
            .await
    }

    /// Looks a user up by id whatever their status, trying active first.
    pub async fn find_by_id(&self, user_id: &str) -> Result<User> {
        match self.fetch_by_id(user_id, true).await {
            Err(RepositoryError::NotFound { .. }) => self.fetch_by_id(user_id, false).await,
            result => result,
        }
    }

    /// Whether a lookup view for the email or username already exists.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.store.get(&keys::user_by_email(email)).await?.is_some())
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        Ok(self
            .store
            .get(&keys::user_by_username(username))
            .await?
            .is_some())
    }

    /// Writes the profile fields (password, city, dwelling age, tag) to all
    /// three views.
    pub async fn update(&self, user: &User) -> Result<()> {
        let actions = vec![
            UpdateAction::set(ATTR_PASSWORD, Value::s(&user.password_hash)),
            UpdateAction::set(ATTR_CITY, Value::s(&user.city)),
            UpdateAction::set(ATTR_DWELLING_AGE, Value::N(user.dwelling_age)),
            UpdateAction::set(ATTR_TAG, Value::s(user.tag.as_str())),
        ];
        let writes = [
            keys::user_by_id(&user.id, user.is_active),
            keys::user_by_email(&user.email),
            keys::user_by_username(&user.username),
        ]
        .into_iter()
        .map(|key| TransactWriteItem::update(key, actions.clone(), Some(Condition::Exists)))
        .collect();

        self.store
            .transact_write(writes)
            .await
            .map_err(|e| not_found_on_condition(e, &user.id))?;

        tracing::info!(user_id = %user.id, "Updated user profile");
        Ok(())
    }

    /// Moves the by-id view to the sort key of the new status and flips the
    /// flag on the lookup views, atomically.
    pub async fn set_active_status(&self, user: &User, is_active: bool) -> Result<()> {
        if user.is_active == is_active {
            return Ok(());
        }

        let moved = User {
            is_active,
            ..user.clone()
        };
        let flag = vec![UpdateAction::set(ATTR_IS_ACTIVE, Value::Bool(is_active))];
        let writes = vec![
            TransactWriteItem::delete(
                keys::user_by_id(&user.id, user.is_active),
                Some(Condition::Exists),
            ),
            TransactWriteItem::put(user_by_id_item(&moved), Some(Condition::NotExists)),
            TransactWriteItem::update(
                keys::user_by_email(&user.email),
                flag.clone(),
                Some(Condition::Exists),
            ),
            TransactWriteItem::update(
                keys::user_by_username(&user.username),
                flag,
                Some(Condition::Exists),
            ),
        ];

        self.store
            .transact_write(writes)
            .await
            .map_err(|e| not_found_on_condition(e, &user.id))?;

        tracing::info!(user_id = %user.id, is_active, "Changed user status");
        Ok(())
    }

    /// Lists users ordered by email, skipping `offset` matches and returning
    /// at most `limit`. `search` matches a substring of the username. The
    /// reserved names and `admin_username` are never listed.
    pub async fn list(
        &self,
        offset: usize,
        limit: usize,
        search: Option<&str>,
        admin_username: &str,
    ) -> Result<Vec<User>> {
        let wanted = offset.saturating_add(limit);
        let mut query = Query::partition(keys::USERS_PARTITION).begins_with(keys::EMAIL_PREFIX);
        if let Some(search) = search {
            query = query.filter(Filter::contains(ATTR_USERNAME, search));
        }

        let mut users = Vec::new();
        let mut start = None;
        loop {
            let page = self.store.query(query.clone().start_after(start)).await?;
            for item in &page.items {
                let user = item_to_user(item)?;
                let hidden = RESERVED_USERNAMES.contains(&user.username.as_str())
                    || user.username == admin_username;
                if !hidden {
                    users.push(user);
                }
            }

            match page.last_evaluated_key {
                Some(key) if users.len() < wanted => start = Some(key),
                _ => break,
            }
        }

        Ok(page_window(users, offset, Some(limit)))
    }

    /// Deletes the four possible views of a user: both id views and the two
    /// lookup views.
    pub async fn delete(&self, user: &User) -> Result<()> {
        let writes = vec![
            TransactWriteItem::delete(keys::user_by_id(&user.id, true), None),
            TransactWriteItem::delete(keys::user_by_id(&user.id, false), None),
            TransactWriteItem::delete(keys::user_by_email(&user.email), None),
            TransactWriteItem::delete(keys::user_by_username(&user.username), None),
        ];
        self.store.transact_write(writes).await?;

        tracing::info!(user_id = %user.id, "Deleted user");
        Ok(())
    }
}

fn not_found_on_condition(error: RepositoryError, user_id: &str) -> RepositoryError {
    if error.is_condition_failure() {
        RepositoryError::NotFound {
            entity_type: ENTITY,
            id: user_id.to_string(),
        }
    } else {
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::store;
    use localeyes_core::social::Tag;

    fn user(id: &str, username: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            password_hash: "hash".to_string(),
            city: "Pune".to_string(),
            dwelling_age: 2.0,
            is_active: true,
            tag: Tag::Resident,
        }
    }

    #[tokio::test]
    async fn test_create_writes_three_views() {
        let store = store();
        let repo = UserRepository::new(store.clone());
        let alice = user("u1", "alice", "alice@example.com");

        repo.create(&alice).await.unwrap();

        assert_eq!(repo.fetch_by_id("u1", true).await.unwrap(), alice);
        assert_eq!(repo.fetch_by_email("alice@example.com").await.unwrap(), alice);
        assert_eq!(repo.fetch_by_username("alice").await.unwrap(), alice);
        assert!(repo.email_exists("alice@example.com").await.unwrap());
        assert!(repo.username_exists("alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_rejects_taken_username_without_partial_views() {
        let store = store();
        let repo = UserRepository::new(store.clone());
        repo.create(&user("u1", "alice", "alice@example.com"))
            .await
            .unwrap();

        let result = repo.create(&user("u2", "alice", "other@example.com")).await;

        assert_eq!(
            result,
            Err(RepositoryError::AlreadyExists {
                entity_type: "Username",
                id: "alice".to_string(),
            })
        );
        assert!(!repo.email_exists("other@example.com").await.unwrap());
        assert!(matches!(
            repo.fetch_by_id("u2", true).await,
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_taken_email() {
        let repo = UserRepository::new(store());
        repo.create(&user("u1", "alice", "alice@example.com"))
            .await
            .unwrap();

        let result = repo.create(&user("u2", "bob", "alice@example.com")).await;
        assert!(matches!(
            result,
            Err(RepositoryError::AlreadyExists {
                entity_type: "Email",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_fetch_by_id_requires_matching_status() {
        let repo = UserRepository::new(store());
        repo.create(&user("u1", "alice", "alice@example.com"))
            .await
            .unwrap();

        assert!(matches!(
            repo.fetch_by_id("u1", false).await,
            Err(RepositoryError::NotFound { .. })
        ));
        assert_eq!(repo.find_by_id("u1").await.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_update_touches_every_view() {
        let repo = UserRepository::new(store());
        let mut alice = user("u1", "alice", "alice@example.com");
        repo.create(&alice).await.unwrap();

        alice.city = "Goa".to_string();
        alice.dwelling_age = 0.5;
        alice.tag = Tag::Newbie;
        repo.update(&alice).await.unwrap();

        assert_eq!(repo.fetch_by_id("u1", true).await.unwrap().city, "Goa");
        assert_eq!(repo.fetch_by_email("alice@example.com").await.unwrap(), alice);
        assert_eq!(repo.fetch_by_username("alice").await.unwrap().tag, Tag::Newbie);
    }

    #[tokio::test]
    async fn test_update_of_missing_user_is_not_found() {
        let repo = UserRepository::new(store());
        let result = repo.update(&user("ghost", "ghost", "ghost@example.com")).await;
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_set_active_status_moves_id_view() {
        let repo = UserRepository::new(store());
        let alice = user("u1", "alice", "alice@example.com");
        repo.create(&alice).await.unwrap();

        repo.set_active_status(&alice, false).await.unwrap();

        assert!(matches!(
            repo.fetch_by_id("u1", true).await,
            Err(RepositoryError::NotFound { .. })
        ));
        assert!(!repo.fetch_by_id("u1", false).await.unwrap().is_active);
        assert!(!repo.fetch_by_username("alice").await.unwrap().is_active);
        assert!(!repo.fetch_by_email("alice@example.com").await.unwrap().is_active);

        let inactive = repo.find_by_id("u1").await.unwrap();
        repo.set_active_status(&inactive, true).await.unwrap();
        assert!(repo.fetch_by_id("u1", true).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_list_pages_and_searches() {
        let repo = UserRepository::new(store());
        for (i, name) in ["amy", "ben", "cal", "dan", "admin", "root"].iter().enumerate() {
            repo.create(&user(&format!("u{i}"), name, &format!("{name}@example.com")))
                .await
                .unwrap();
        }

        let all = repo.list(0, 10, None, "root").await.unwrap();
        let names: Vec<_> = all.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["amy", "ben", "cal", "dan"]);

        let page = repo.list(1, 2, None, "root").await.unwrap();
        let names: Vec<_> = page.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["ben", "cal"]);

        let found = repo.list(0, 10, Some("an"), "root").await.unwrap();
        let names: Vec<_> = found.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["dan"]);
    }

    #[tokio::test]
    async fn test_delete_removes_all_views() {
        let store = store();
        let repo = UserRepository::new(store.clone());
        let alice = user("u1", "alice", "alice@example.com");
        repo.create(&alice).await.unwrap();

        repo.delete(&alice).await.unwrap();

        assert!(matches!(
            repo.find_by_id("u1").await,
            Err(RepositoryError::NotFound { .. })
        ));
        assert!(!repo.email_exists("alice@example.com").await.unwrap());
        assert!(!repo.username_exists("alice").await.unwrap());
    }
}
