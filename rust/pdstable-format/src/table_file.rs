use std::path::{Path, PathBuf};

use itertools::Itertools;
use pdstable_common::{Result, error::Error};

/// Resolves the path of the table data file described by a label.
///
/// `candidates` are the table file names the label points to. A single candidate is
/// selected implicitly; with several candidates the caller must pick one through
/// `requested`. Paths are resolved relative to the directory of `label_path`.
///
/// # Errors
///
/// Returns a schema error enumerating the candidates when the choice is ambiguous or the
/// requested name is not among them, and when the label names no table file at all.
pub fn resolve_table_file(
    label_path: Option<&Path>,
    candidates: &[String],
    requested: Option<&str>,
) -> Result<PathBuf> {
    let file_name = match (requested, candidates) {
        (None, []) => {
            return Err(Error::schema("pointer to a table file was not found in the label"));
        }
        (None, [single]) => single.as_str(),
        (None, _) => {
            return Err(Error::schema(format!(
                "multiple table files are described by the label; specify one of: {}",
                format_candidates(candidates)
            )));
        }
        (Some(requested), []) => requested,
        (Some(requested), _) => candidates
            .iter()
            .find(|c| c.as_str() == requested)
            .map(String::as_str)
            .ok_or_else(|| {
                Error::schema(format!(
                    "table file '{requested}' is not described by the label; specify one of: {}",
                    format_candidates(candidates)
                ))
            })?,
    };

    let dir = label_path.and_then(Path::parent).unwrap_or(Path::new(""));
    Ok(dir.join(file_name))
}

fn format_candidates(candidates: &[String]) -> String {
    format!("[{}]", candidates.iter().map(|c| format!("'{c}'")).join(", "))
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::resolve_table_file;

    fn candidates() -> Vec<String> {
        vec!["ring_fit.tab".into(), "input_stars.csv".into()]
    }

    #[test]
    fn test_single_candidate() {
        let path = resolve_table_file(
            Some(Path::new("/data/index/index.lbl")),
            &["index.tab".to_string()],
            None,
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/data/index/index.tab"));
    }

    #[test]
    fn test_explicit_choice() {
        let path = resolve_table_file(Some(Path::new("labels/ring.xml")), &candidates(), Some("input_stars.csv"))
            .unwrap();
        assert_eq!(path, PathBuf::from("labels/input_stars.csv"));
    }

    #[test]
    fn test_ambiguous_candidates_are_listed() {
        let expected = "['ring_fit.tab', 'input_stars.csv']";
        let err = resolve_table_file(None, &candidates(), None).unwrap_err();
        assert!(err.to_string().contains(expected), "{err}");

        let err = resolve_table_file(None, &candidates(), Some("xxx")).unwrap_err();
        assert!(err.to_string().contains(expected), "{err}");
    }

    #[test]
    fn test_no_candidates() {
        assert!(resolve_table_file(None, &[], None).is_err());
        assert_eq!(
            resolve_table_file(None, &[], Some("t.tab")).unwrap(),
            PathBuf::from("t.tab")
        );
    }
}
