use crate::repo::{PageQuery, Repository};
use crate::{FetchError, Page};
use async_trait::async_trait;
use std::sync::Arc;

/// Supplies cards one page at a time. `cursor == None` requests the first page.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<Page, FetchError>;
}

/// Serves pages straight out of a card repository.
pub struct RepoSource {
    repo: Arc<dyn Repository>,
    page_size: usize,
    category: Option<String>,
}

impl RepoSource {
    pub fn new(repo: Arc<dyn Repository>, page_size: usize) -> Self {
        Self {
            repo,
            page_size: page_size.max(1),
            category: None,
        }
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category.filter(|c| !c.trim().is_empty());
        self
    }
}

#[async_trait]
impl ContentSource for RepoSource {
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<Page, FetchError> {
        let query = PageQuery {
            cursor: cursor.map(str::to_string),
            limit: self.page_size,
            category: self.category.clone(),
        };
        Ok(self.repo.page_cards(&query).await?)
    }
}
