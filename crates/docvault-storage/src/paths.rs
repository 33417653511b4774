//! Blob path construction.
//!
//! Paths are an engine-side convention; the content store itself treats
//! them as opaque keys. Content is owner-scoped, and every version gets a
//! distinct path (a fresh UUID prefix), so re-uploading a file with the
//! same name can never clobber the bytes an earlier version row points at.

use uuid::Uuid;

/// Build the content-store path for a new document content blob.
///
/// Layout: `documents/{owner_id}/{blob_id}_{file_name}`.
pub fn document_blob_path(owner_id: Uuid, file_name: &str) -> String {
    format!(
        "documents/{}/{}_{}",
        owner_id,
        Uuid::new_v4(),
        sanitize_file_name(file_name)
    )
}

/// Strip directory components and path-traversal characters from a
/// client-supplied file name.
fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .replace("..", "");
    if base.is_empty() {
        "unnamed".to_string()
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_scoped_layout() {
        let owner = Uuid::new_v4();
        let path = document_blob_path(owner, "report.pdf");
        assert!(path.starts_with(&format!("documents/{owner}/")));
        assert!(path.ends_with("_report.pdf"));
    }

    #[test]
    fn test_distinct_paths_for_same_name() {
        let owner = Uuid::new_v4();
        assert_ne!(
            document_blob_path(owner, "report.pdf"),
            document_blob_path(owner, "report.pdf")
        );
    }

    #[test]
    fn test_traversal_stripped() {
        let owner = Uuid::new_v4();
        let path = document_blob_path(owner, "../../etc/passwd");
        assert!(!path.contains(".."));
        assert!(path.ends_with("_passwd"));
    }
}
