use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A publication as it travels over the wire and lives in the catalog.
///
/// The id is an opaque identifier minted by the upstream content service.
/// It is globally unique and roughly monotonic, which makes it usable as a
/// stable sort and cursor key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub id: String,
    pub content: String,
    pub author: Author,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
    #[serde(default)]
    pub media: Vec<Media>,
}

/// Denormalized author snapshot carried on every publication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: String,
    pub full_name: String,
    pub avatar_url: String,
}

/// A single media attachment reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub link: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publication_decodes_wire_format() {
        let body = r#"{
            "id": "64f0c7",
            "content": "hello",
            "author": {"id": "u1", "fullName": "Ada L", "avatarUrl": "http://a/x.png"},
            "createdOn": "2024-01-02T03:04:05Z",
            "updatedOn": "2024-01-02T03:04:05Z",
            "media": [{"link": "http://a/m.png"}]
        }"#;

        let p: Publication = serde_json::from_str(body).unwrap();
        assert_eq!(p.id, "64f0c7");
        assert_eq!(p.author.full_name, "Ada L");
        assert_eq!(p.media.len(), 1);
    }

    #[test]
    fn publication_media_defaults_to_empty() {
        let body = r#"{
            "id": "64f0c8",
            "content": "",
            "author": {"id": "u1", "fullName": "", "avatarUrl": ""},
            "createdOn": "2024-01-02T03:04:05Z",
            "updatedOn": "2024-01-02T03:04:05Z"
        }"#;

        let p: Publication = serde_json::from_str(body).unwrap();
        assert!(p.media.is_empty());
    }
}
