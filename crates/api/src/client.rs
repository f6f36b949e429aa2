//! OSF client implementation
//!
//! Talks to the OSF JSON:API (listings) and to WaterButler, the file
//! service behind the `upload`, `download` and `delete` links, and
//! implements the RemoteStore trait from osf-core.

use std::future::Future;
use std::io::SeekFrom;
use std::pin::Pin;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use tokio::io::{AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use url::Url;

use osf_core::path::normalize;
use osf_core::{Error, RemoteFile, RemoteStore, ResolvedConfig, Result};

use crate::model::{Entity, Page, Single};

/// OSF client bound to one project
pub struct OsfClient {
    http: reqwest::Client,
    base: Url,
    project: String,
    credentials: Option<(String, String)>,
}

impl OsfClient {
    /// Create a new client from the resolved configuration.
    ///
    /// No request is sent until the first operation.
    pub fn new(config: &ResolvedConfig) -> Result<Self> {
        let project = config.require_project()?.to_string();
        let base = Url::parse(&config.api_url)?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("osf-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        let credentials = config
            .credentials()
            .map(|(user, pass)| (user.to_string(), pass.to_string()));

        Ok(Self {
            http,
            base,
            project,
            credentials,
        })
    }

    /// Create a client and check that the project is reachable.
    ///
    /// A rejected login surfaces as `Error::Unauthorized`, an unknown project
    /// as `Error::NotFound`.
    pub async fn connect(config: &ResolvedConfig) -> Result<Self> {
        let client = Self::new(config)?;
        let url = client.project_url()?;

        tracing::debug!(url = %url, "connecting");
        let response = client.send(client.request(Method::GET, url.as_str())).await?;
        check_status(response, &format!("Project {}", client.project))?;
        Ok(client)
    }

    /// URL of the project node
    fn project_url(&self) -> Result<Url> {
        Ok(self.base.join(&format!("nodes/{}/", self.project))?)
    }

    /// URL listing the storage providers of the project
    fn storages_url(&self) -> Result<Url> {
        Ok(self.base.join(&format!("nodes/{}/files/", self.project))?)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self.http.request(method, url);
        match &self.credentials {
            Some((user, pass)) => request.basic_auth(user, Some(pass)),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }
        Ok(response)
    }

    async fn get_page(&self, url: &str) -> Result<Page> {
        tracing::debug!(url, "GET");
        let response = self.send(self.request(Method::GET, url)).await?;
        let response = check_status(response, url)?;
        response
            .json::<Page>()
            .await
            .map_err(|e| Error::Remote(format!("Unexpected response from {url}: {e}")))
    }

    /// Fetch every page of a collection, following `links.next`
    async fn get_all(&self, url: &str) -> Result<Vec<Entity>> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());

        while let Some(url) = next {
            let page = self.get_page(&url).await?;
            items.extend(page.data);
            next = page.links.next;
        }

        Ok(items)
    }

    async fn storages(&self) -> Result<Vec<Entity>> {
        let url = self.storages_url()?;
        self.get_all(url.as_str()).await
    }

    async fn storage(&self, provider: &str) -> Result<Entity> {
        self.storages()
            .await?
            .into_iter()
            .find(|s| s.name() == provider)
            .ok_or_else(|| Error::NotFound(format!("Project has no storage provider '{provider}'")))
    }

    async fn children(&self, parent: &Entity) -> Result<Vec<Entity>> {
        let href = parent
            .files_href()
            .ok_or_else(|| Error::Remote(format!("'{}' has no file listing", parent.name())))?;
        self.get_all(href).await
    }

    /// Depth-first walk collecting every file below `parent`
    fn walk<'a>(
        &'a self,
        parent: &'a Entity,
        out: &'a mut Vec<RemoteFile>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            for child in self.children(parent).await? {
                if child.is_file() {
                    out.push(child.into_remote_file());
                } else if child.is_folder() {
                    self.walk(&child, out).await?;
                }
            }
            Ok(())
        })
    }

    /// Find or create the folder `name` inside `parent`
    async fn ensure_folder(&self, parent: &Entity, name: &str) -> Result<Entity> {
        let link = parent
            .links
            .new_folder
            .as_deref()
            .or(parent.links.upload.as_deref())
            .ok_or_else(|| Error::Remote(format!("Cannot create folders in '{}'", parent.name())))?;
        let url = action_url(link, "folder", name)?;

        let response = self.send(self.request(Method::PUT, url.as_str())).await?;
        if response.status() == StatusCode::CONFLICT {
            tracing::debug!(folder = name, "folder exists");
            return self
                .children(parent)
                .await?
                .into_iter()
                .find(|c| c.is_folder() && c.name() == name)
                .ok_or_else(|| Error::NotFound(format!("Folder '{name}'")));
        }

        let response = check_status(response, url.as_str())?;
        let created: Single = response
            .json()
            .await
            .map_err(|e| Error::Remote(format!("Unexpected response from {url}: {e}")))?;
        Ok(created.data)
    }

    async fn put_file(&self, url: &str, source: tokio::fs::File) -> Result<Response> {
        // Streaming a zero-length body creates nothing on the server, so
        // empty files are sent as an explicit empty payload.
        let body = if source.metadata().await?.len() == 0 {
            reqwest::Body::from(Vec::new())
        } else {
            reqwest::Body::from(source)
        };
        self.send(self.request(Method::PUT, url).body(body)).await
    }
}

#[async_trait]
impl RemoteStore for OsfClient {
    async fn list_providers(&self) -> Result<Vec<String>> {
        Ok(self
            .storages()
            .await?
            .iter()
            .map(|s| s.name().to_string())
            .collect())
    }

    async fn list_files(&self, provider: &str) -> Result<Vec<RemoteFile>> {
        let storage = self.storage(provider).await?;
        let mut files = Vec::new();
        self.walk(&storage, &mut files).await?;
        tracing::debug!(provider, files = files.len(), "listed provider");
        Ok(files)
    }

    async fn download(
        &self,
        file: &RemoteFile,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64> {
        let url = file
            .links
            .download
            .as_deref()
            .ok_or_else(|| Error::Remote(format!("{} has no download link", file.path)))?;

        let response = self.send(self.request(Method::GET, url)).await?;
        let mut response = check_status(response, &file.path)?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
        {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        Ok(written)
    }

    async fn create_or_update(
        &self,
        provider: &str,
        path: &str,
        source: tokio::fs::File,
        update: bool,
    ) -> Result<()> {
        let path = normalize(path);
        let (folders, name) = match path.rsplit_once('/') {
            Some((dirs, name)) => (dirs.split('/').collect::<Vec<_>>(), name),
            None => (Vec::new(), path.as_str()),
        };
        if name.is_empty() {
            return Err(Error::InvalidPath(path.clone()));
        }

        let mut parent = self.storage(provider).await?;
        for folder in folders {
            parent = self.ensure_folder(&parent, folder).await?;
        }

        let link = parent
            .links
            .upload
            .as_deref()
            .ok_or_else(|| Error::Remote(format!("Cannot upload into '{}'", parent.name())))?;
        let url = action_url(link, "file", name)?;

        let mut spare = source.try_clone().await?;
        let response = self.put_file(url.as_str(), source).await?;
        if response.status() != StatusCode::CONFLICT {
            check_status(response, &path)?;
            tracing::debug!(provider, path = %path, "created remote file");
            return Ok(());
        }

        if !update {
            return Err(Error::Conflict(format!(
                "Remote file {provider}/{path} already exists, not overwriting."
            )));
        }

        let existing = self
            .children(&parent)
            .await?
            .into_iter()
            .find(|c| c.is_file() && c.name() == name)
            .and_then(|c| c.links.upload)
            .ok_or_else(|| {
                Error::Remote(format!(
                    "Could not create a new file at ({path}) nor update it."
                ))
            })?;

        spare.seek(SeekFrom::Start(0)).await?;
        let response = self.put_file(&existing, spare).await?;
        check_status(response, &path)?;
        tracing::debug!(provider, path = %path, "updated remote file");
        Ok(())
    }

    async fn remove(&self, file: &RemoteFile) -> Result<()> {
        let url = file
            .links
            .delete
            .as_deref()
            .ok_or_else(|| Error::Remote(format!("Could not delete {}.", file.path)))?;

        let response = self.send(self.request(Method::DELETE, url)).await?;
        if response.status() != StatusCode::NO_CONTENT {
            return Err(Error::Remote(format!("Could not delete {}.", file.path)));
        }
        Ok(())
    }
}

/// Map an unsuccessful status to an error
fn check_status(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else if status == StatusCode::NOT_FOUND {
        Err(Error::NotFound(what.to_string()))
    } else if status == StatusCode::FORBIDDEN {
        Err(Error::Unauthorized)
    } else {
        Err(Error::Remote(format!("{what}: HTTP {status}")))
    }
}

/// Build a WaterButler action URL such as `upload?kind=file&name=x.txt`
fn action_url(link: &str, kind: &str, name: &str) -> Result<Url> {
    let mut url = Url::parse(link)?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "kind" && k != "name")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("kind", kind)
        .append_pair("name", name);
    Ok(url)
}
