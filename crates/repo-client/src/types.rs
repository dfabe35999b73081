use docbatch_protocol::DocumentRef;
use serde::Deserialize;

/// One document as returned by the repository API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoDocument {
    pub uid: String,
    pub path: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "type")]
    pub doc_type: String,
    #[serde(default)]
    pub facets: Vec<String>,
}

impl RepoDocument {
    /// Folderish documents can hold children and serve as upload
    /// destinations.
    pub fn is_folderish(&self) -> bool {
        self.facets.iter().any(|f| f == "Folderish")
    }

    pub fn to_ref(&self) -> DocumentRef {
        DocumentRef {
            uid: self.uid.clone(),
            path: self.path.clone(),
            title: self.title.clone(),
        }
    }
}

/// Response of a `@children` listing.
#[derive(Debug, Deserialize)]
pub(crate) struct ChildrenResponse {
    #[serde(default)]
    pub entries: Vec<RepoDocument>,
}

/// Response of creating a staging batch.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchCreated {
    pub batch_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folderish_detection() {
        let doc: RepoDocument = serde_json::from_str(
            r#"{"uid":"u1","path":"/asset-library/inbox","title":"inbox",
                "type":"Folder","facets":["Folderish","NXTag"]}"#,
        )
        .unwrap();
        assert!(doc.is_folderish());

        let file: RepoDocument = serde_json::from_str(
            r#"{"uid":"u2","path":"/asset-library/a.pdf","facets":["Downloadable"]}"#,
        )
        .unwrap();
        assert!(!file.is_folderish());
        assert!(file.title.is_empty());
    }

    #[test]
    fn children_response_entries_default_empty() {
        let resp: ChildrenResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.entries.is_empty());
    }

    #[test]
    fn batch_created_wire_name() {
        let created: BatchCreated = serde_json::from_str(r#"{"batchId":"b-17"}"#).unwrap();
        assert_eq!(created.batch_id, "b-17");
    }

    #[test]
    fn to_ref_carries_identity() {
        let doc = RepoDocument {
            uid: "u1".into(),
            path: "/p".into(),
            title: "t".into(),
            doc_type: "File".into(),
            facets: vec![],
        };
        let r = doc.to_ref();
        assert_eq!((r.uid.as_str(), r.path.as_str(), r.title.as_str()), ("u1", "/p", "t"));
    }
}
