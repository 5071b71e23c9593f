use std::path::Path;

use crate::error::GraphIoError;
use crate::extraction::Passage;

/// Load passages from `path`.
///
/// A `.json` file must hold an array of strings; anything else is read as
/// one passage per non-empty line. Blank entries are skipped and indices are
/// assigned after skipping. `limit` keeps only the first N passages.
pub fn load_passages(path: &Path, limit: Option<usize>) -> Result<Vec<Passage>, GraphIoError> {
    let content = std::fs::read_to_string(path).map_err(|source| GraphIoError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let texts: Vec<String> = if is_json {
        serde_json::from_str(&content).map_err(|source| GraphIoError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        content.lines().map(|line| line.to_string()).collect()
    };

    let passages = texts
        .into_iter()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .take(limit.unwrap_or(usize::MAX))
        .enumerate()
        .map(|(index, text)| Passage::new(index, text))
        .collect();

    Ok(passages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_text_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("passages.txt");
        std::fs::write(&path, "First passage.\n\n  Second passage.  \n").unwrap();

        let passages = load_passages(&path, None).unwrap();
        assert_eq!(
            passages,
            vec![
                Passage::new(0, "First passage."),
                Passage::new(1, "Second passage."),
            ]
        );
    }

    #[test]
    fn test_load_json_array_with_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("passages.json");
        std::fs::write(&path, r#"["a", "", "b", "c"]"#).unwrap();

        let passages = load_passages(&path, Some(2)).unwrap();
        assert_eq!(passages, vec![Passage::new(0, "a"), Passage::new(1, "b")]);
    }

    #[test]
    fn test_invalid_json_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("passages.json");
        std::fs::write(&path, r#"{"text": "a"}"#).unwrap();

        assert!(matches!(
            load_passages(&path, None),
            Err(GraphIoError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_passages(&dir.path().join("nope.txt"), None),
            Err(GraphIoError::Read { .. })
        ));
    }
}
