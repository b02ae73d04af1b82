//! `/files`

use serde_json::Value;
use steward_domain::{
    ApiError, ApiRequest, CacheKey, FileUpdate, FileUpload, HttpMethod, ListParams, Page,
    ResourceKind, StoredFile,
};

use super::crud::Collection;
use crate::query::{FetchPolicy, ResourceClient, ttl};

const KIND: ResourceKind = ResourceKind::Files;

/// Uploaded files.
#[derive(Debug, Clone)]
pub struct FilesApi {
    files: Collection,
}

impl FilesApi {
    /// Creates the API over `client`.
    #[must_use]
    pub const fn new(client: ResourceClient) -> Self {
        Self {
            files: Collection::new(client, KIND, ttl::DEFAULT_LIST),
        }
    }

    /// The logged-in user's files.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn my_files(
        &self,
        page: u32,
        size: u32,
        policy: FetchPolicy,
    ) -> Result<Page<StoredFile>, ApiError> {
        self.files
            .list(ListParams::paged(page, size).with_view("my-files"), policy)
            .await
    }

    /// Files marked public. Reachable anonymously.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn public(
        &self,
        page: u32,
        size: u32,
        policy: FetchPolicy,
    ) -> Result<Page<StoredFile>, ApiError> {
        self.files
            .list(ListParams::paged(page, size).with_view("public"), policy)
            .await
    }

    /// The `limit` most recently uploaded public files. Reachable anonymously.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn recent(
        &self,
        limit: u32,
        policy: FetchPolicy,
    ) -> Result<Vec<StoredFile>, ApiError> {
        let params = ListParams {
            size: Some(limit),
            ..ListParams::all().with_view("recent")
        };
        let request = ApiRequest::get(self.files.path("recent"))
            .with_query([("limit", limit.to_string())]);
        self.files
            .client()
            .fetch(CacheKey::list(KIND, params), request, ttl::DEFAULT_LIST, policy)
            .await
    }

    /// Number of files the logged-in user owns.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn my_count(&self, policy: FetchPolicy) -> Result<u64, ApiError> {
        self.files
            .list(ListParams::all().with_view("stats/my-count"), policy)
            .await
    }

    /// Number of files on the backend.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn total_count(&self, policy: FetchPolicy) -> Result<u64, ApiError> {
        self.files
            .list(ListParams::all().with_view("stats/total-count"), policy)
            .await
    }

    /// Files whose name or description matches `keyword`. Reachable
    /// anonymously.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn search(
        &self,
        keyword: &str,
        page: u32,
        size: u32,
        policy: FetchPolicy,
    ) -> Result<Page<StoredFile>, ApiError> {
        let params = ListParams::paged(page, size)
            .with_view("search")
            .with_keyword(keyword);
        self.files.list(params, policy).await
    }

    /// Files of one type, e.g. `pdf` or `image`. Reachable anonymously.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn by_type(
        &self,
        file_type: &str,
        page: u32,
        size: u32,
        policy: FetchPolicy,
    ) -> Result<Page<StoredFile>, ApiError> {
        let params = ListParams::paged(page, size).with_type_filter(file_type);
        let request = ApiRequest::get(self.files.path(format!("type/{file_type}")))
            .with_query(params.query_pairs());
        self.files
            .client()
            .fetch(CacheKey::list(KIND, params), request, ttl::DEFAULT_LIST, policy)
            .await
    }

    /// Uploads a file as `multipart/form-data`.
    ///
    /// # Errors
    /// Returns the backend error, e.g. [`ApiError::Rejected`] with 413 for
    /// oversized files.
    pub async fn upload(&self, upload: FileUpload) -> Result<StoredFile, ApiError> {
        let request =
            ApiRequest::new(HttpMethod::Post, self.files.path("upload")).with_upload(upload);
        self.files.client().mutate(request, KIND, None).await
    }

    /// Downloads the contents of a file.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn download(&self, id: u64) -> Result<Vec<u8>, ApiError> {
        self.files
            .client()
            .download(ApiRequest::get(self.files.path(format!("download/{id}"))))
            .await
    }

    /// Updates description and visibility.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn update(&self, id: u64, update: &FileUpdate) -> Result<StoredFile, ApiError> {
        self.files.update(id, update).await
    }

    /// Flips a file between public and private.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn toggle_visibility(&self, id: u64) -> Result<(), ApiError> {
        let path = self.files.path(format!("{id}/toggle-visibility"));
        let request = ApiRequest::new(HttpMethod::Patch, path);
        let _: Value = self.files.client().mutate(request, KIND, Some(id)).await?;
        Ok(())
    }

    /// Deletes a file.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn delete(&self, id: u64) -> Result<(), ApiError> {
        self.files.delete(id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::testing::ConsoleHarness;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use steward_domain::RequestBody;

    fn empty_page() -> Value {
        json!({"content": [], "totalElements": 0, "totalPages": 0, "size": 10, "number": 0})
    }

    #[tokio::test]
    async fn public_listing_works_anonymously() {
        let h = ConsoleHarness::anonymous();
        h.transport
            .respond(HttpMethod::Get, "/files/public", 200, empty_page());

        let page = h
            .console
            .files()
            .public(0, 10, FetchPolicy::CacheFirst)
            .await
            .unwrap();

        assert!(page.content.is_empty());
        assert!(h.transport.last().authorization.is_none());
    }

    #[tokio::test]
    async fn own_files_need_a_session() {
        let h = ConsoleHarness::anonymous();

        let result = h.console.files().my_files(0, 10, FetchPolicy::CacheFirst).await;

        assert_eq!(result.unwrap_err(), ApiError::Unauthenticated);
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn upload_is_multipart_and_drops_listings() {
        let h = ConsoleHarness::logged_in().await;
        h.transport.respond(
            HttpMethod::Post,
            "/files/upload",
            200,
            json!({"id": 9, "originalFileName": "report.pdf", "isPublic": true}),
        );
        h.transport
            .respond(HttpMethod::Get, "/files/my-files", 200, empty_page());
        let files = h.console.files();
        files.my_files(0, 10, FetchPolicy::CacheFirst).await.unwrap();

        let stored = files
            .upload(FileUpload {
                file_name: "report.pdf".to_string(),
                contents: b"%PDF".to_vec(),
                mime_type: None,
                description: "Q3".to_string(),
                is_public: true,
            })
            .await
            .unwrap();
        files.my_files(0, 10, FetchPolicy::CacheFirst).await.unwrap();

        assert_eq!(stored.original_file_name, "report.pdf");
        let upload = h
            .transport
            .requests()
            .into_iter()
            .find(|r| r.path == "/files/upload")
            .unwrap();
        assert!(matches!(upload.body, RequestBody::Multipart(ref f) if f.is_public));
        assert_eq!(h.transport.count(HttpMethod::Get, "/files/my-files"), 2);
    }

    #[tokio::test]
    async fn download_returns_raw_bytes() {
        let h = ConsoleHarness::logged_in().await;
        h.transport
            .respond_bytes(HttpMethod::Get, "/files/download/9", b"\x00\x01binary");

        let bytes = h.console.files().download(9).await.unwrap();

        assert_eq!(bytes, b"\x00\x01binary".to_vec());
    }

    #[tokio::test]
    async fn shared_listings_work_anonymously() {
        let h = ConsoleHarness::anonymous();
        h.transport
            .respond(HttpMethod::Get, "/files/search", 200, empty_page());
        h.transport
            .respond(HttpMethod::Get, "/files/recent", 200, json!([]));
        let files = h.console.files();

        files.search("x", 0, 10, FetchPolicy::CacheFirst).await.unwrap();
        assert_eq!(h.transport.last().path, "/files/search");
        assert!(h.transport.last().authorization.is_none());

        let recent = files.recent(5, FetchPolicy::CacheFirst).await.unwrap();
        assert!(recent.is_empty());
        let request = h.transport.last();
        assert_eq!(request.query, vec![("limit".to_string(), "5".to_string())]);
        assert!(request.authorization.is_none());
    }

    #[tokio::test]
    async fn search_leaves_the_credential_off() {
        let h = ConsoleHarness::logged_in().await;
        h.transport
            .respond(HttpMethod::Get, "/files/search", 200, empty_page());

        h.console
            .files()
            .search("q3", 0, 10, FetchPolicy::CacheFirst)
            .await
            .unwrap();

        assert!(h.transport.last().authorization.is_none());
    }

    #[tokio::test]
    async fn counts_are_dropped_by_deletes() {
        let h = ConsoleHarness::logged_in().await;
        h.transport
            .respond(HttpMethod::Get, "/files/stats/my-count", 200, json!(3));
        h.transport.respond_bytes(HttpMethod::Delete, "/files/3", b"");
        let files = h.console.files();

        assert_eq!(files.my_count(FetchPolicy::CacheFirst).await.unwrap(), 3);
        assert!(h.transport.last().authorization.is_some());
        files.delete(3).await.unwrap();
        files.my_count(FetchPolicy::CacheFirst).await.unwrap();

        assert_eq!(h.transport.count(HttpMethod::Get, "/files/stats/my-count"), 2);
    }

    #[tokio::test]
    async fn total_count_needs_a_session() {
        let h = ConsoleHarness::anonymous();

        let result = h.console.files().total_count(FetchPolicy::CacheFirst).await;

        assert_eq!(result.unwrap_err(), ApiError::Unauthenticated);
    }

    #[tokio::test]
    async fn type_filter_uses_path_segment() {
        let h = ConsoleHarness::logged_in().await;
        h.transport
            .respond(HttpMethod::Get, "/files/type/pdf", 200, empty_page());

        h.console
            .files()
            .by_type("pdf", 1, 20, FetchPolicy::CacheFirst)
            .await
            .unwrap();

        assert_eq!(h.transport.last().path, "/files/type/pdf");
    }
}
