use regex::Regex;
use std::sync::OnceLock;

/// Normalizes a collection name for use as a bucket-name component:
/// lowercase, spaces and underscores replaced with `-`.
pub fn normalize_collection_name(name: &str) -> String {
    name.to_lowercase().replace([' ', '_'], "-")
}

/// Normalizes an uploaded filename for storage (spaces replaced with `-`).
pub fn normalize_filename(filename: &str) -> String {
    filename.replace(' ', "-")
}

fn bucket_char_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9\-]").expect("static regex"))
}

/// Bucket name for a collection: `collection-{id}-{sanitized-name}`.
pub fn bucket_name(collection_id: i32, collection_name: &str) -> String {
    let sanitized = bucket_char_re().replace_all(collection_name, "-");
    format!("collection-{}-{}", collection_id, sanitized)
}

/// Lowercased extension of a filename, if any.
pub fn file_extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_collection_names() {
        assert_eq!(normalize_collection_name("My Legal_Docs"), "my-legal-docs");
        assert_eq!(normalize_collection_name("demo"), "demo");
    }

    #[test]
    fn normalizes_filenames() {
        assert_eq!(normalize_filename("rapport final.pdf"), "rapport-final.pdf");
    }

    #[test]
    fn builds_bucket_names() {
        assert_eq!(bucket_name(5, "demo"), "collection-5-demo");
        assert_eq!(bucket_name(7, "a b.c"), "collection-7-a-b-c");
    }

    #[test]
    fn extracts_extensions() {
        assert_eq!(file_extension("doc.PDF"), Some("pdf".to_string()));
        assert_eq!(file_extension("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension("trailing."), None);
    }
}
