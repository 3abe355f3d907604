//! GitHub REST implementation of [`Forge`].

use std::fs;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    Asset, AssetUpload, Branch, Committer, FileCommit, Forge, ForgeError, ForgeResult, NewRelease,
    Release, TreeEntry,
};
use crate::config::GitHubConfig;

const USER_AGENT: &str = concat!("binhost/", env!("CARGO_PKG_VERSION"));

const API_VERSION: &str = "2022-11-28";

/// Media type returning file contents verbatim instead of base64 JSON.
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";

/// Largest page size the REST API accepts.
const PAGE_SIZE: usize = 100;

/// [`Forge`] backed by the GitHub REST API.
///
/// All calls are blocking and share a single client, so the configured
/// timeout applies to every request.
pub struct GitHubForge {
    client: Client,
    api_url: String,
    upload_url: String,
    repository: String,
}

impl GitHubForge {
    /// Create a client for the configured repository.
    pub fn new(config: &GitHubConfig) -> ForgeResult<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|e| ForgeError::Client(format!("invalid token: {}", e)))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| ForgeError::Client(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            upload_url: config.upload_url.trim_end_matches('/').to_string(),
            repository: config.repository.clone(),
        })
    }

    fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}", self.api_url, self.repository, path)
    }

    fn execute(
        &self,
        method: &'static str,
        url: &str,
        request: RequestBuilder,
    ) -> ForgeResult<Response> {
        debug!(method, url, "GitHub request");

        let response = request.send().map_err(|source| ForgeError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ApiMessage>()
            .map(|m| m.message)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or_default().to_string());

        Err(ForgeError::Status {
            method,
            url: url.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> ForgeResult<T> {
        let response = self.execute("GET", url, self.client.get(url))?;
        decode(url, response)
    }

    fn get_optional<T: DeserializeOwned>(&self, url: &str) -> ForgeResult<Option<T>> {
        match self.get_json(url) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn put_contents(&self, commit: &FileCommit<'_>, sha: Option<&str>) -> ForgeResult<()> {
        let url = self.repo_url(&format!("contents/{}", commit.path));
        let body = PutContents::new(commit, sha);
        self.execute("PUT", &url, self.client.put(&url).json(&body))?;
        Ok(())
    }
}

impl Forge for GitHubForge {
    fn branch(&self, name: &str) -> ForgeResult<Option<Branch>> {
        let url = self.repo_url(&format!("branches/{}", name));
        let branch: Option<BranchResponse> = self.get_optional(&url)?;

        Ok(branch.map(|b| Branch {
            name: b.name,
            commit_sha: b.commit.sha,
        }))
    }

    fn create_branch(&self, name: &str, from_sha: &str) -> ForgeResult<Branch> {
        let url = self.repo_url("git/refs");
        let body = CreateRef {
            git_ref: format!("refs/heads/{}", name),
            sha: from_sha,
        };

        let response = self.execute("POST", &url, self.client.post(&url).json(&body))?;
        let created: RefResponse = decode(&url, response)?;

        Ok(Branch {
            name: name.to_string(),
            commit_sha: created.object.sha,
        })
    }

    fn release_by_tag(&self, tag: &str) -> ForgeResult<Option<Release>> {
        let url = self.repo_url(&format!("releases/tags/{}", tag));
        self.get_optional(&url)
    }

    fn create_release(&self, release: &NewRelease<'_>) -> ForgeResult<Release> {
        let url = self.repo_url("releases");
        let response = self.execute("POST", &url, self.client.post(&url).json(release))?;
        decode(&url, response)
    }

    fn list_assets(&self, release: &Release) -> ForgeResult<Vec<Asset>> {
        let mut assets = Vec::new();

        for page in 1.. {
            let url = self.repo_url(&format!(
                "releases/{}/assets?per_page={}&page={}",
                release.id, PAGE_SIZE, page
            ));
            let batch: Vec<Asset> = self.get_json(&url)?;
            let done = batch.len() < PAGE_SIZE;
            assets.extend(batch);
            if done {
                break;
            }
        }

        Ok(assets)
    }

    fn delete_asset(&self, asset: &Asset) -> ForgeResult<()> {
        let url = self.repo_url(&format!("releases/assets/{}", asset.id));
        self.execute("DELETE", &url, self.client.delete(&url))?;
        Ok(())
    }

    fn upload_asset(&self, release: &Release, upload: &AssetUpload<'_>) -> ForgeResult<Asset> {
        let data = fs::read(upload.path).map_err(|source| ForgeError::ReadFile {
            path: upload.path.to_path_buf(),
            source,
        })?;

        let url = format!(
            "{}/repos/{}/releases/{}/assets",
            self.upload_url, self.repository, release.id
        );
        let request = self
            .client
            .post(&url)
            .query(&[("name", upload.name)])
            .header(CONTENT_TYPE, upload.content_type)
            .body(data);

        let response = self.execute("POST", &url, request)?;
        decode(&url, response)
    }

    fn branch_head(&self, branch: &str) -> ForgeResult<String> {
        let url = self.repo_url(&format!("git/ref/heads/{}", branch));
        let reference: RefResponse = self.get_json(&url)?;
        Ok(reference.object.sha)
    }

    fn tree(&self, sha: &str) -> ForgeResult<Vec<TreeEntry>> {
        let url = self.repo_url(&format!("git/trees/{}", sha));
        let tree: TreeResponse = self.get_json(&url)?;
        Ok(tree.tree)
    }

    fn file_contents(&self, path: &str, branch: &str) -> ForgeResult<String> {
        let url = self.repo_url(&format!("contents/{}", path));
        let request = self
            .client
            .get(&url)
            .query(&[("ref", branch)])
            .header(ACCEPT, RAW_MEDIA_TYPE);

        let response = self.execute("GET", &url, request)?;
        response.text().map_err(|e| ForgeError::Decode {
            url,
            reason: e.to_string(),
        })
    }

    fn create_file(&self, commit: &FileCommit<'_>) -> ForgeResult<()> {
        self.put_contents(commit, None)
    }

    fn update_file(&self, commit: &FileCommit<'_>, sha: &str) -> ForgeResult<()> {
        self.put_contents(commit, Some(sha))
    }
}

fn decode<T: DeserializeOwned>(url: &str, response: Response) -> ForgeResult<T> {
    response.json().map_err(|e| ForgeError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

#[derive(Deserialize)]
struct BranchResponse {
    name: String,
    commit: ObjectRef,
}

#[derive(Deserialize)]
struct RefResponse {
    object: ObjectRef,
}

#[derive(Deserialize)]
struct ObjectRef {
    sha: String,
}

#[derive(Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
}

#[derive(Serialize)]
struct CreateRef<'a> {
    #[serde(rename = "ref")]
    git_ref: String,
    sha: &'a str,
}

#[derive(Serialize)]
struct PutContents<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    committer: &'a Committer,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

impl<'a> PutContents<'a> {
    fn new(commit: &FileCommit<'a>, sha: Option<&'a str>) -> Self {
        Self {
            message: commit.message,
            content: BASE64.encode(commit.content),
            branch: commit.branch,
            committer: commit.committer,
            sha,
        }
    }
}
