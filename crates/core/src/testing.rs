//! In-memory RemoteStore used by unit tests

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::traits::{RemoteFile, RemoteStore};

/// A recorded `create_or_update` call
#[derive(Debug, Clone)]
pub(crate) struct Upload {
    pub provider: String,
    pub path: String,
    pub data: Vec<u8>,
    pub update: bool,
}

/// Project storage held in memory, recording every call it receives
#[derive(Default)]
pub(crate) struct MemoryStore {
    providers: Vec<(String, Vec<(RemoteFile, Vec<u8>)>)>,
    unauthorized: bool,
    failing_downloads: bool,
    uploads: Mutex<Vec<Upload>>,
    downloads: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
    listings: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file; providers keep the order of their first file
    pub fn with_file(mut self, provider: &str, id: &str, path: &str, content: &str) -> Self {
        let mut file = RemoteFile::new(id, path);
        file.size = Some(content.len() as u64);
        let entry = (file, content.as_bytes().to_vec());

        match self.providers.iter_mut().find(|(name, _)| name == provider) {
            Some((_, files)) => files.push(entry),
            None => self.providers.push((provider.to_string(), vec![entry])),
        }
        self
    }

    /// Reject every request as unauthorized
    pub fn unauthorized(mut self) -> Self {
        self.unauthorized = true;
        self
    }

    /// Write part of each file, then fail the transfer
    pub fn failing_downloads(mut self) -> Self {
        self.failing_downloads = true;
        self
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }

    pub fn listings(&self) -> usize {
        *self.listings.lock().unwrap()
    }

    fn check_auth(&self) -> Result<()> {
        if self.unauthorized {
            Err(Error::Unauthorized)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list_providers(&self) -> Result<Vec<String>> {
        self.check_auth()?;
        Ok(self.providers.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn list_files(&self, provider: &str) -> Result<Vec<RemoteFile>> {
        self.check_auth()?;
        *self.listings.lock().unwrap() += 1;
        self.providers
            .iter()
            .find(|(name, _)| name == provider)
            .map(|(_, files)| files.iter().map(|(f, _)| f.clone()).collect())
            .ok_or_else(|| Error::NotFound(format!("Project has no storage provider '{provider}'")))
    }

    async fn download(
        &self,
        file: &RemoteFile,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64> {
        self.check_auth()?;
        let data = self
            .providers
            .iter()
            .flat_map(|(_, files)| files.iter())
            .find(|(f, _)| f.id == file.id)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| Error::NotFound(file.path.clone()))?;

        if self.failing_downloads {
            writer.write_all(&data[..data.len() / 2]).await?;
            return Err(Error::Network("connection reset".into()));
        }

        writer.write_all(&data).await?;
        self.downloads.lock().unwrap().push(file.id.clone());
        Ok(data.len() as u64)
    }

    async fn create_or_update(
        &self,
        provider: &str,
        path: &str,
        mut source: tokio::fs::File,
        update: bool,
    ) -> Result<()> {
        self.check_auth()?;
        let mut data = Vec::new();
        source.read_to_end(&mut data).await?;
        self.uploads.lock().unwrap().push(Upload {
            provider: provider.to_string(),
            path: path.to_string(),
            data,
            update,
        });
        Ok(())
    }

    async fn remove(&self, file: &RemoteFile) -> Result<()> {
        self.check_auth()?;
        self.removed.lock().unwrap().push(file.id.clone());
        Ok(())
    }
}
