use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use localeyes_core::social::{
    page_window, LikeStatus, Notification, Post, PostCategory, PostLocator,
};
use localeyes_core::storage::codec::{
    item_to_notification, item_to_post, like_marker_item, notification_item, post_by_author_item,
    post_by_category_item, ATTR_AUTHOR_ID, ATTR_CONTENT, ATTR_LIKES, ATTR_QUESTION_ID, ATTR_TITLE,
};
use localeyes_core::storage::{
    keys, Condition, Filter, ItemKey, Query, RepositoryError, Result, TableStore,
    TransactWriteItem, UpdateAction, Value,
};

use super::{delete_answers_of, delete_partition};

const ENTITY: &str = "Post";

/// How long a new post stays in the notification feed.
pub const NOTIFICATION_TTL: Duration = Duration::minutes(10);

/// Posts, stored as a by-author view, a category view ordered by creation
/// time and a short-lived notification copy.
#[derive(Clone)]
pub struct PostRepository {
    store: Arc<dyn TableStore>,
}

impl PostRepository {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Writes the three views of a new post in one transaction.
    pub async fn create(&self, post: &Post) -> Result<()> {
        let notification = Notification {
            post: post.clone(),
            expires_at: (post.created_at + NOTIFICATION_TTL).timestamp(),
        };
        let writes = vec![
            TransactWriteItem::put(post_by_author_item(post), Some(Condition::NotExists)),
            TransactWriteItem::put(post_by_category_item(post), Some(Condition::NotExists)),
            TransactWriteItem::put(notification_item(&notification), None),
        ];

        self.store.transact_write(writes).await.map_err(|e| {
            if e.is_condition_failure() {
                RepositoryError::AlreadyExists {
                    entity_type: ENTITY,
                    id: post.id.clone(),
                }
            } else {
                e
            }
        })?;

        tracing::info!(
            post_id = %post.id,
            user_id = %post.user_id,
            category = post.category.as_str(),
            "Created post"
        );
        Ok(())
    }

    /// Lists posts newest first.
    ///
    /// With a category the category view is read by prefix, otherwise the
    /// recency index orders posts of every category. `search` matches a
    /// substring of the title. Pages are read until `offset + limit` matches
    /// are collected.
    pub async fn list(
        &self,
        category: Option<PostCategory>,
        search: Option<&str>,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<Vec<Post>> {
        let mut query = match category {
            Some(category) => {
                Query::partition(keys::POSTS_PARTITION).begins_with(keys::category_prefix(category))
            }
            None => Query::partition(keys::POSTS_PARTITION).on_recency_index(),
        }
        .newest_first();
        if let Some(search) = search {
            query = query.filter(Filter::contains(ATTR_TITLE, search));
        }

        let wanted = limit.map(|limit| offset.saturating_add(limit));
        let mut posts = Vec::new();
        let mut start = None;
        loop {
            let page = self.store.query(query.clone().start_after(start)).await?;
            for item in &page.items {
                posts.push(item_to_post(item)?);
            }

            match page.last_evaluated_key {
                Some(key) if wanted.is_none_or(|wanted| posts.len() < wanted) => {
                    start = Some(key)
                }
                _ => break,
            }
        }

        Ok(page_window(posts, offset, limit))
    }

    /// Posts written by a user, read from the by-author view.
    pub async fn list_by_author(&self, user_id: &str) -> Result<Vec<Post>> {
        let items = self
            .store
            .query_all(Query::partition(keys::user_pk(user_id)).begins_with(keys::POST_PREFIX))
            .await?;

        let mut posts = items.iter().map(item_to_post).collect::<Result<Vec<_>>>()?;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    /// Recent posts by other users whose notification has not expired.
    pub async fn notifications(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Notification>> {
        let items = self
            .store
            .query_all(
                Query::partition(keys::NOTIFICATIONS_PARTITION)
                    .filter(Filter::not_equals(ATTR_AUTHOR_ID, Value::s(user_id))),
            )
            .await?;

        let mut notifications = Vec::new();
        for item in &items {
            let notification = item_to_notification(item)?;
            if !notification.is_expired(now) {
                notifications.push(notification);
            }
        }
        notifications.sort_by(|a, b| b.post.created_at.cmp(&a.post.created_at));
        Ok(notifications)
    }

    /// Updates title and content on the category and by-author views.
    ///
    /// Returns `ConditionFailed` when the post exists but belongs to someone
    /// else, `NotFound` when it does not exist.
    pub async fn update(
        &self,
        user_id: &str,
        post_id: &str,
        locator: PostLocator,
        title: &str,
        content: &str,
    ) -> Result<()> {
        let category_key = keys::post_by_category(locator.category, locator.created_at, post_id);
        let actions = vec![
            UpdateAction::set(ATTR_TITLE, Value::s(title)),
            UpdateAction::set(ATTR_CONTENT, Value::s(content)),
        ];
        let writes = vec![
            TransactWriteItem::update(
                category_key.clone(),
                actions.clone(),
                Some(Condition::equals(ATTR_AUTHOR_ID, Value::s(user_id))),
            ),
            TransactWriteItem::update(
                keys::post_by_author(user_id, post_id),
                actions,
                Some(Condition::Exists),
            ),
        ];

        if let Err(e) = self.store.transact_write(writes).await {
            return Err(self.explain_ownership_failure(e, &category_key, post_id).await);
        }

        tracing::info!(post_id, user_id, "Updated post");
        Ok(())
    }

    /// Likes the post for `user_id`, or removes the like when it is already
    /// there. The marker and both like counters move in one transaction.
    pub async fn toggle_like(
        &self,
        user_id: &str,
        author_id: &str,
        post_id: &str,
        locator: PostLocator,
    ) -> Result<LikeStatus> {
        let liked = self.has_liked(user_id, post_id).await?;
        let (marker, delta, status) = if liked {
            (
                TransactWriteItem::delete(
                    keys::like_marker(post_id, user_id),
                    Some(Condition::Exists),
                ),
                -1,
                LikeStatus::NotLiked,
            )
        } else {
            (
                TransactWriteItem::put(
                    like_marker_item(post_id, user_id),
                    Some(Condition::NotExists),
                ),
                1,
                LikeStatus::Liked,
            )
        };

        let writes = vec![
            marker,
            TransactWriteItem::update(
                keys::post_by_category(locator.category, locator.created_at, post_id),
                vec![UpdateAction::add(ATTR_LIKES, delta)],
                Some(Condition::Exists),
            ),
            TransactWriteItem::update(
                keys::post_by_author(author_id, post_id),
                vec![UpdateAction::add(ATTR_LIKES, delta)],
                Some(Condition::Exists),
            ),
        ];

        self.store.transact_write(writes).await.map_err(|e| {
            if e.failed_at(1) || e.failed_at(2) {
                RepositoryError::NotFound {
                    entity_type: ENTITY,
                    id: post_id.to_string(),
                }
            } else {
                e
            }
        })?;

        tracing::info!(post_id, user_id, ?status, "Toggled like");
        Ok(status)
    }

    pub async fn has_liked(&self, user_id: &str, post_id: &str) -> Result<bool> {
        Ok(self
            .store
            .get(&keys::like_marker(post_id, user_id))
            .await?
            .is_some())
    }

    /// Deletes the three views of a post, then its questions, their answers
    /// and its like markers.
    ///
    /// The post must belong to `author_id`; a post owned by someone else
    /// yields `ConditionFailed`.
    pub async fn delete(&self, author_id: &str, post_id: &str, locator: PostLocator) -> Result<()> {
        let category_key = keys::post_by_category(locator.category, locator.created_at, post_id);
        let writes = vec![
            TransactWriteItem::delete(
                category_key.clone(),
                Some(Condition::equals(ATTR_AUTHOR_ID, Value::s(author_id))),
            ),
            TransactWriteItem::delete(keys::post_by_author(author_id, post_id), None),
            TransactWriteItem::delete(keys::notification(post_id), None),
        ];

        if let Err(e) = self.store.transact_write(writes).await {
            return Err(self.explain_ownership_failure(e, &category_key, post_id).await);
        }

        let store = self.store.as_ref();
        let questions =
            delete_partition(store, keys::questions_pk(post_id), keys::QUESTION_PREFIX).await?;
        let mut answers = 0;
        for question in &questions {
            if let Some(question_id) = question.get(ATTR_QUESTION_ID).and_then(Value::as_str) {
                answers += delete_answers_of(store, question_id).await?;
            }
        }
        let likes = delete_partition(store, keys::like_pk(post_id), keys::USER_PREFIX).await?;

        tracing::info!(
            post_id,
            questions = questions.len(),
            answers,
            likes = likes.len(),
            "Deleted post"
        );
        Ok(())
    }

    /// Tells a missing post apart from one owned by someone else after a
    /// failed ownership condition.
    async fn explain_ownership_failure(
        &self,
        error: RepositoryError,
        category_key: &ItemKey,
        post_id: &str,
    ) -> RepositoryError {
        if !error.is_condition_failure() {
            return error;
        }
        match self.store.get(category_key).await {
            Ok(Some(_)) if error.failed_at(0) => {
                RepositoryError::ConditionFailed(category_key.to_string())
            }
            Ok(_) => RepositoryError::NotFound {
                entity_type: ENTITY,
                id: post_id.to_string(),
            },
            Err(e) => e,
        }
    }
}
