/*
[INPUT]:  List identifiers and bearer-authenticated client
[OUTPUT]: To Do lists and task records (checklist items expanded)
[POS]:    HTTP layer - To Do read endpoints (require bearer auth)
[UPDATE]: When adding new To Do endpoints or changing query parameters
*/

use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::http::{GraphClient, Result};
use crate::types::{CollectionPage, TaskList, TodoTask};

impl GraphClient {
    /// Fetch all task lists
    ///
    /// GET /me/todo/lists
    pub async fn list_task_lists(&self) -> Result<Vec<TaskList>> {
        self.collect_pages("/me/todo/lists").await
    }

    /// Fetch all tasks of one list, each pre-expanded with its checklist items
    ///
    /// GET /me/todo/lists/{list_id}/tasks?$expand=checklistItems
    pub async fn list_tasks(&self, list_id: &str) -> Result<Vec<TodoTask>> {
        let endpoint = format!("/me/todo/lists/{}/tasks?$expand=checklistItems", list_id);
        self.collect_pages(&endpoint).await
    }

    /// Drain a Graph collection by following `@odata.nextLink` until the
    /// last page. Page order is preserved.
    async fn collect_pages<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>> {
        let builder = self.graph_request(Method::GET, endpoint)?;
        let mut page: CollectionPage<T> = self.send_json(builder).await?;

        let mut items = page.value;
        let mut page_count = 1usize;
        while let Some(next) = page.next_link.take() {
            let builder = self.graph_request_url(Method::GET, &next)?;
            page = self.send_json(builder).await?;
            items.append(&mut page.value);
            page_count += 1;
        }

        debug!(endpoint, pages = page_count, items = items.len(), "collection drained");
        Ok(items)
    }
}
