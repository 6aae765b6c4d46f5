use reqwest::header::HeaderMap;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};
use warden_core::{ApiConfig, WardenError};

use crate::comment::PullComment;

/// Pull request detail, reduced to what a review needs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    /// `None` when the platform has not computed mergeability yet.
    #[serde(default)]
    pub mergeable: Option<bool>,
    #[serde(default)]
    pub user: Account,
    #[serde(default)]
    pub base: BranchRef,
}

impl PullRequest {
    /// Author login.
    pub fn author(&self) -> &str {
        &self.user.login
    }

    /// Target branch name.
    pub fn target_branch(&self) -> Option<&str> {
        self.base.branch()
    }

    /// Whether the platform reported a merge conflict.
    pub fn has_conflict(&self) -> bool {
        self.mergeable == Some(false)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub login: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BranchRef {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "ref")]
    pub ref_name: Option<String>,
}

impl BranchRef {
    /// Branch name: `label`, falling back to `ref`.
    pub fn branch(&self) -> Option<&str> {
        self.label
            .as_deref()
            .or(self.ref_name.as_deref())
            .filter(|b| !b.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct Label {
    name: String,
}

/// Pull request comment and label operations.
#[allow(async_fn_in_trait)]
pub trait PullRequestApi {
    /// Pull request detail.
    async fn pull_request(&self, number: u64) -> Result<PullRequest, WardenError>;
    /// Every comment, newest first.
    async fn list_comments(&self, number: u64) -> Result<Vec<PullComment>, WardenError>;
    async fn create_comment(&self, number: u64, body: &str) -> Result<(), WardenError>;
    async fn delete_comment(&self, id: u64) -> Result<(), WardenError>;
    /// Label names on the pull request.
    async fn list_labels(&self, number: u64) -> Result<Vec<String>, WardenError>;
    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<(), WardenError>;
}

impl<A: PullRequestApi + ?Sized> PullRequestApi for &A {
    async fn pull_request(&self, number: u64) -> Result<PullRequest, WardenError> {
        (**self).pull_request(number).await
    }

    async fn list_comments(&self, number: u64) -> Result<Vec<PullComment>, WardenError> {
        (**self).list_comments(number).await
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<(), WardenError> {
        (**self).create_comment(number, body).await
    }

    async fn delete_comment(&self, id: u64) -> Result<(), WardenError> {
        (**self).delete_comment(id).await
    }

    async fn list_labels(&self, number: u64) -> Result<Vec<String>, WardenError> {
        (**self).list_labels(number).await
    }

    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<(), WardenError> {
        (**self).add_labels(number, labels).await
    }
}

/// GitCode v5 REST client for one repository.
///
/// # Examples
///
/// ```
/// use warden_review::gitcode::parse_pr_reference;
///
/// let (owner, repo, number) = parse_pr_reference("openeuler/community#6912").unwrap();
/// assert_eq!(owner, "openeuler");
/// assert_eq!(repo, "community");
/// assert_eq!(number, 6912);
/// ```
pub struct GitCodeClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    owner: String,
    repo: String,
    per_page: u32,
}

impl GitCodeClient {
    /// Client for `owner/repo`, authenticated with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`WardenError::Http`] if the HTTP client cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use warden_core::ApiConfig;
    /// use warden_review::gitcode::GitCodeClient;
    ///
    /// let client = GitCodeClient::new(&ApiConfig::default(), "token", "openeuler", "community").unwrap();
    /// ```
    pub fn new(
        config: &ApiConfig,
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Result<Self, WardenError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("warden/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WardenError::Http(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
            per_page: config.per_page.max(1),
        })
    }

    fn url(&self, tail: &str) -> String {
        format!("{}/repos/{}/{}/{tail}", self.base_url, self.owner, self.repo)
    }

    fn auth(&self) -> [(&'static str, &str); 1] {
        [("access_token", self.token.as_str())]
    }
}

/// GitCode answers writes with any of these.
fn is_success(status: StatusCode) -> bool {
    matches!(status.as_u16(), 200 | 201 | 204)
}

async fn checked(response: Response, action: &str) -> Result<Response, WardenError> {
    let status = response.status();
    if is_success(status) {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(WardenError::Http(format!("{action} failed with {status}: {body}")))
}

fn send_error(action: &str) -> impl FnOnce(reqwest::Error) -> WardenError + '_ {
    move |e| WardenError::Http(format!("{action}: {e}"))
}

/// Next page to fetch, from the `total_page` response header.
fn next_page(headers: &HeaderMap, page: u32) -> Option<u32> {
    let total: u32 = headers.get("total_page")?.to_str().ok()?.trim().parse().ok()?;
    (page < total).then_some(page + 1)
}

impl PullRequestApi for GitCodeClient {
    async fn pull_request(&self, number: u64) -> Result<PullRequest, WardenError> {
        let action = "fetching pull request";
        let response = self
            .http
            .get(self.url(&format!("pulls/{number}")))
            .query(&self.auth())
            .send()
            .await
            .map_err(send_error(action))?;
        checked(response, action)
            .await?
            .json()
            .await
            .map_err(send_error(action))
    }

    async fn list_comments(&self, number: u64) -> Result<Vec<PullComment>, WardenError> {
        let action = "listing comments";
        let url = self.url(&format!("pulls/{number}/comments"));
        let per_page = self.per_page.to_string();
        let mut comments = Vec::new();
        let mut page: u32 = 1;

        loop {
            let page_str = page.to_string();
            let response = self
                .http
                .get(&url)
                .query(&self.auth())
                .query(&[
                    ("per_page", per_page.as_str()),
                    ("direction", "desc"),
                    ("comment_type", "pr_comment"),
                    ("page", page_str.as_str()),
                ])
                .send()
                .await
                .map_err(send_error(action))?;
            let response = checked(response, action).await?;
            let next = next_page(response.headers(), page);
            let batch: Vec<PullComment> = response.json().await.map_err(send_error(action))?;
            debug!(page, count = batch.len(), "fetched comment page");
            comments.extend(batch);

            match next {
                Some(n) => page = n,
                None => break,
            }
        }
        Ok(comments)
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<(), WardenError> {
        let action = "creating comment";
        let response = self
            .http
            .post(self.url(&format!("pulls/{number}/comments")))
            .query(&self.auth())
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await
            .map_err(send_error(action))?;
        checked(response, action).await?;
        info!(pr = number, "comment created");
        Ok(())
    }

    async fn delete_comment(&self, id: u64) -> Result<(), WardenError> {
        let action = "deleting comment";
        let response = self
            .http
            .delete(self.url(&format!("pulls/comments/{id}")))
            .query(&self.auth())
            .send()
            .await
            .map_err(send_error(action))?;
        checked(response, action).await?;
        debug!(id, "comment deleted");
        Ok(())
    }

    async fn list_labels(&self, number: u64) -> Result<Vec<String>, WardenError> {
        let action = "listing labels";
        let response = self
            .http
            .get(self.url(&format!("pulls/{number}/labels")))
            .query(&self.auth())
            .send()
            .await
            .map_err(send_error(action))?;
        let labels: Vec<Label> = checked(response, action)
            .await?
            .json()
            .await
            .map_err(send_error(action))?;
        Ok(labels.into_iter().map(|l| l.name).collect())
    }

    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<(), WardenError> {
        let action = "adding labels";
        let response = self
            .http
            .post(self.url(&format!("pulls/{number}/labels")))
            .query(&self.auth())
            .json(labels)
            .send()
            .await
            .map_err(send_error(action))?;
        checked(response, action).await?;
        info!(pr = number, ?labels, "labels added");
        Ok(())
    }
}

/// Parse a PR reference string (`owner/repo#number`) into its components.
///
/// # Errors
///
/// Returns [`WardenError::Config`] if the format is invalid.
pub fn parse_pr_reference(pr_ref: &str) -> Result<(String, String, u64), WardenError> {
    let invalid = || {
        WardenError::Config(format!(
            "invalid PR reference '{pr_ref}', expected owner/repo#number"
        ))
    };
    let (owner_repo, number_str) = pr_ref.split_once('#').ok_or_else(invalid)?;
    let (owner, repo) = owner_repo.split_once('/').ok_or_else(invalid)?;
    if owner.is_empty() || repo.is_empty() {
        return Err(invalid());
    }
    let number: u64 = number_str
        .parse()
        .map_err(|_| WardenError::Config(format!("invalid PR number: {number_str}")))?;
    Ok((owner.to_string(), repo.to_string(), number))
}
