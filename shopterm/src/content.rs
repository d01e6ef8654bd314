use std::path::{Path, PathBuf};
use std::sync::Arc;

use shopterm_tui::Faq;
use thiserror::Error;
use tokio::fs::read_to_string;

const DEFAULT_FAQ: &str = include_str!("../content/faq.json");

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("failed to read faq file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse faq file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Questions and answers shown on the account page, loaded once at startup.
pub async fn load_faqs(path: Option<&Path>) -> Result<Arc<[Faq]>, ContentError> {
    let (path, string) = match path {
        Some(path) => {
            let string = read_to_string(path)
                .await
                .map_err(|source| ContentError::Read {
                    path: path.to_owned(),
                    source,
                })?;
            (path.to_owned(), string)
        }
        None => (PathBuf::from("content/faq.json"), DEFAULT_FAQ.to_owned()),
    };
    let faqs: Vec<Faq> =
        serde_json::from_str(&string).map_err(|source| ContentError::Parse { path, source })?;
    Ok(faqs.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bundled_faqs_parse() {
        let faqs = load_faqs(None).await.unwrap();
        assert!(!faqs.is_empty());
        assert!(faqs.iter().all(|faq| !faq.question.is_empty() && !faq.answer.is_empty()));
    }

    #[tokio::test]
    async fn custom_file_replaces_the_bundle() {
        let path = std::env::temp_dir().join(format!("shopterm-faq-{}.json", std::process::id()));
        std::fs::write(&path, r#"[{"question": "decaf?", "answer": "no."}]"#).unwrap();
        let faqs = load_faqs(Some(&path)).await.unwrap();
        assert_eq!(faqs.len(), 1);
        assert_eq!(faqs[0].question, "decaf?");
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn malformed_file_names_the_path() {
        let path = std::env::temp_dir().join(format!("shopterm-bad-faq-{}.json", std::process::id()));
        std::fs::write(&path, "{").unwrap();
        let error = load_faqs(Some(&path)).await.unwrap_err();
        assert!(matches!(error, ContentError::Parse { .. }));
        assert!(error.to_string().contains("shopterm-bad-faq"));
        std::fs::remove_file(&path).unwrap();
    }
}
