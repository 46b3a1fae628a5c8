use serde::{Deserialize, Serialize};

/// The reference frontend sends the Swagger placeholder "string" when the
/// user leaves the collection filter untouched; treat it as "no filter".
pub const NO_FILTER_SENTINEL: &str = "string";

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default, alias = "filtre_par_collection")]
    pub collection: Option<String>,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_top_n() -> usize {
    5
}

impl SearchRequest {
    /// Effective collection filter, with the sentinel and empty strings
    /// meaning unfiltered.
    pub fn collection_filter(&self) -> Option<&str> {
        match self.collection.as_deref() {
            None | Some("") | Some(NO_FILTER_SENTINEL) => None,
            Some(name) => Some(name),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedChunk {
    pub chunk_id: i32,
    pub document_id: i32,
    pub chunk_text: String,
    pub distance: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<RankedChunk>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_means_no_filter() {
        let req = SearchRequest {
            query: "q".to_string(),
            collection: Some(NO_FILTER_SENTINEL.to_string()),
            top_n: 3,
        };
        assert_eq!(req.collection_filter(), None);
    }

    #[test]
    fn named_collection_is_kept() {
        let req = SearchRequest {
            query: "q".to_string(),
            collection: Some("alpha".to_string()),
            top_n: 3,
        };
        assert_eq!(req.collection_filter(), Some("alpha"));
    }
}
