//! JSON:API documents returned by the OSF API
//!
//! Only the members the client reads are modelled; everything else in the
//! payload is ignored.

use serde::Deserialize;

use osf_core::{FileLinks, RemoteFile};

/// A paginated collection document
#[derive(Debug, Deserialize)]
pub struct Page {
    pub data: Vec<Entity>,
    #[serde(default)]
    pub links: PageLinks,
}

/// Pagination links of a collection
#[derive(Debug, Default, Deserialize)]
pub struct PageLinks {
    #[serde(default)]
    pub next: Option<String>,
}

/// A single-resource document
#[derive(Debug, Deserialize)]
pub struct Single {
    pub data: Entity,
}

/// A storage provider, folder or file resource
#[derive(Debug, Clone, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub relationships: Relationships,
    #[serde(default)]
    pub links: EntityLinks,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Attributes {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub materialized_path: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub extra: Option<Extra>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Extra {
    #[serde(default)]
    pub hashes: Option<Hashes>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Hashes {
    #[serde(default)]
    pub md5: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Relationships {
    #[serde(default)]
    pub files: Option<Relation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Relation {
    pub links: RelationLinks,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationLinks {
    pub related: Related,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Related {
    pub href: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityLinks {
    #[serde(default)]
    pub download: Option<String>,
    #[serde(default)]
    pub upload: Option<String>,
    #[serde(default)]
    pub delete: Option<String>,
    #[serde(default)]
    pub new_folder: Option<String>,
}

impl Entity {
    /// Whether this resource is a file (as opposed to a folder or provider root)
    pub fn is_file(&self) -> bool {
        self.attributes.kind.as_deref() == Some("file")
    }

    /// Whether this resource is a folder
    pub fn is_folder(&self) -> bool {
        self.attributes.kind.as_deref() == Some("folder")
    }

    /// Display name; storage providers fall back to their provider id
    pub fn name(&self) -> &str {
        self.attributes
            .name
            .as_deref()
            .or(self.attributes.provider.as_deref())
            .unwrap_or_default()
    }

    /// URL listing the children of a folder or provider root
    pub fn files_href(&self) -> Option<&str> {
        self.relationships
            .files
            .as_ref()
            .map(|r| r.links.related.href.as_str())
    }

    /// Convert a file resource into the engine's listing entry
    pub fn into_remote_file(self) -> RemoteFile {
        let Entity {
            id,
            attributes,
            links,
            ..
        } = self;

        RemoteFile {
            id,
            path: attributes
                .materialized_path
                .or(attributes.path)
                .unwrap_or_default(),
            size: attributes.size,
            md5: attributes.extra.and_then(|e| e.hashes).and_then(|h| h.md5),
            links: FileLinks {
                download: links.download,
                upload: links.upload,
                delete: links.delete,
            },
        }
    }
}
