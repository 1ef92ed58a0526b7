//! The content store and its event publishing write path.

use std::sync::Arc;

use bytes::Bytes;
use common::{RecordOp, Storage};
use eventlog::{EventLog, Offset, TailConfig};

use crate::error::{Error, Result};
use crate::model::{Article, ArticleEvent, Post, User};
use crate::repository::{ArticleRepository, UserRepository};

/// Articles, posts and users, plus the event log of article creations.
///
/// Records and events share one storage instance. Saving an article writes
/// the record and its [`ArticleEvent`] in the same batch, and the event is
/// published only once that batch is durable, so a consumer woken by the
/// event can always read the article it refers to.
pub struct Blog {
    articles: ArticleRepository,
    users: UserRepository,
    events: Arc<EventLog>,
}

impl Blog {
    /// Opens the blog and its event log on `storage`.
    pub async fn open(storage: Arc<dyn Storage>, tailing: TailConfig) -> Result<Self> {
        let events = EventLog::with_storage(Arc::clone(&storage), tailing).await?;
        Ok(Self::new(storage, Arc::new(events)))
    }

    pub fn new(storage: Arc<dyn Storage>, events: Arc<EventLog>) -> Self {
        Self {
            articles: ArticleRepository::new(Arc::clone(&storage)),
            users: UserRepository::new(storage),
            events,
        }
    }

    /// The log receiving one event per saved article.
    pub fn events(&self) -> &Arc<EventLog> {
        &self.events
    }

    pub fn articles(&self) -> &ArticleRepository {
        &self.articles
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    /// Saves an article and publishes an [`ArticleEvent`] for it.
    ///
    /// The article record and its event are committed in one storage batch,
    /// so a failed save leaves neither behind. Returns the offset of the
    /// published event.
    pub async fn save_article(&self, article: &Article) -> Result<Offset> {
        if article.slug.is_empty() {
            return Err(Error::InvalidInput("article slug must not be empty".to_string()));
        }
        let record = ArticleRepository::to_record(article)?;
        let payload = serde_json::to_vec(&ArticleEvent::from(article))?;
        let offset = self
            .events
            .append_with(Bytes::from(payload), vec![RecordOp::Put(record)])
            .await?;
        tracing::debug!(slug = %article.slug, offset, "Published article event");
        Ok(offset)
    }

    pub async fn find_article(&self, slug: &str) -> Result<Option<Article>> {
        self.articles.find_by_key(slug).await
    }

    /// Returns every article, newest `added_at` first.
    pub async fn find_all_articles(&self) -> Result<Vec<Article>> {
        let mut articles = self.articles.find_all().await?;
        articles.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        Ok(articles)
    }

    /// Deletes an article. No event is published.
    pub async fn delete_article(&self, slug: &str) -> Result<()> {
        self.articles.delete_by_key(slug).await
    }

    pub async fn find_post(&self, slug: &str) -> Result<Option<Post>> {
        match self.articles.find_by_key(slug).await? {
            Some(article) => Ok(Some(self.to_post(article).await?)),
            None => Ok(None),
        }
    }

    /// Returns every article as a post, newest first.
    pub async fn find_all_posts(&self) -> Result<Vec<Post>> {
        let articles = self.find_all_articles().await?;
        let mut posts = Vec::with_capacity(articles.len());
        for article in articles {
            posts.push(self.to_post(article).await?);
        }
        Ok(posts)
    }

    async fn to_post(&self, article: Article) -> Result<Post> {
        let author = self
            .users
            .find_by_key(&article.author)
            .await?
            .unwrap_or_else(|| User::unknown(&article.author));
        Ok(Post::new(article, author))
    }

    pub async fn save_user(&self, user: &User) -> Result<()> {
        self.users.save(user).await
    }

    pub async fn find_user(&self, login: &str) -> Result<Option<User>> {
        self.users.find_by_key(login).await
    }

    pub async fn find_all_users(&self) -> Result<Vec<User>> {
        self.users.find_all().await
    }

    /// Closes the event log, ending every cursor that follows it.
    pub async fn close(&self) -> Result<()> {
        self.events.close().await?;
        Ok(())
    }
}
