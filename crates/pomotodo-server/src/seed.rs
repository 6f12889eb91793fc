//! Startup seeding of lists from a JSON file.
//!
//! The file holds an array of lists:
//!
//! ```json
//! [
//!   {"name": "Shared groceries", "userId": null},
//!   {"name": "Alice's work", "userId": "alice"}
//! ]
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::store::TodoStore;
use pomotodo_common::protocol::error::{PomotodoError, Result};
use pomotodo_common::List;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SeedList {
    name: String,
    #[serde(default)]
    user_id: Option<String>,
}

/// Parses seed file contents into fresh lists.
pub fn parse_seed(contents: &str) -> Result<Vec<List>> {
    let entries: Vec<SeedList> = serde_json::from_str(contents)?;
    entries
        .into_iter()
        .map(|entry| {
            if entry.name.trim().is_empty() {
                return Err(PomotodoError::InvalidRequest(
                    "seed list name must not be empty".to_string(),
                ));
            }
            Ok(List::new(entry.name, entry.user_id))
        })
        .collect()
}

/// Loads the lists in `path` into `store` and returns them.
pub async fn load_seed_file(path: &Path, store: &dyn TodoStore) -> Result<Vec<List>> {
    let contents = tokio::fs::read_to_string(path).await?;
    let lists = parse_seed(&contents)?;

    for list in &lists {
        store
            .insert_list(list.clone())
            .await
            .map_err(|e| PomotodoError::Storage(e.to_string()))?;
        tracing::info!(list_id = %list.id, name = %list.name, private = list.is_private(), "seeded list");
    }

    Ok(lists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::io::Write;

    #[test]
    fn test_parse_seed() {
        let lists = parse_seed(r#"[{"name": "Public"}, {"name": "Mine", "userId": "alice"}]"#).unwrap();
        assert_eq!(lists.len(), 2);
        assert!(!lists[0].is_private());
        assert_eq!(lists[1].user_id.as_deref(), Some("alice"));
    }

    #[test]
    fn test_parse_seed_rejects_bad_input() {
        assert!(parse_seed("{}").is_err());
        assert!(parse_seed(r#"[{"name": ""}]"#).is_err());
        assert!(parse_seed(r#"[{"name": "x", "owner": "bob"}]"#).is_err());
    }

    #[tokio::test]
    async fn test_load_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"name": "Inbox", "userId": null}}]"#).unwrap();

        let store = MemoryStore::new();
        let lists = load_seed_file(file.path(), &store).await.unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(store.list_count().await, 1);
        assert_eq!(
            store.find_list(&lists[0].id).await.unwrap().unwrap().name,
            "Inbox"
        );
    }

    #[tokio::test]
    async fn test_load_missing_seed_file() {
        let store = MemoryStore::new();
        let err = load_seed_file(Path::new("/nonexistent/seed.json"), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, PomotodoError::Io(_)));
    }
}
