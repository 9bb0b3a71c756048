//! Fetch, parse and publish cycle for the served document.

use std::sync::Arc;
use std::time::Instant;

use markdown_articles::{parse_str, Document, ParseError, ParserOptions};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::fetch::{DocumentSource, FetchError};
use crate::store::DocumentStore;

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to parse document: {0}")]
    Parse(#[from] ParseError),
}

/// Owns the current document and knows how to rebuild it.
pub struct ArticleService {
    source: Arc<dyn DocumentSource>,
    options: ParserOptions,
    store: DocumentStore,
    refresh_gate: Mutex<()>,
}

impl ArticleService {
    /// Performs the first fetch. The service cannot start without a document,
    /// so any failure here is returned to the caller.
    pub async fn init(
        source: Arc<dyn DocumentSource>,
        options: ParserOptions,
    ) -> Result<Self, RefreshError> {
        let document = load(source.as_ref(), &options).await?;
        tracing::info!(
            source = %source.describe(),
            articles = document.sections.len(),
            "loaded initial document"
        );

        Ok(Self {
            source,
            options,
            store: DocumentStore::new(document),
            refresh_gate: Mutex::new(()),
        })
    }

    pub fn current(&self) -> Arc<Document> {
        self.store.current()
    }

    /// Fetches and parses a fresh document, then swaps it in.
    ///
    /// The fetch and parse run without touching the store, so readers are
    /// never blocked by a slow source. On failure the previous document stays.
    pub async fn refresh(&self) -> Result<Arc<Document>, RefreshError> {
        let _gate = self.refresh_gate.lock().await;
        let started = Instant::now();

        let document = match load(self.source.as_ref(), &self.options).await {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(
                    source = %self.source.describe(),
                    error = %err,
                    "refresh failed, keeping previous document"
                );
                return Err(err);
            }
        };

        let articles = document.sections.len();
        self.store.replace(document);
        tracing::info!(
            articles,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "document refreshed"
        );

        Ok(self.store.current())
    }
}

async fn load(
    source: &dyn DocumentSource,
    options: &ParserOptions,
) -> Result<Document, RefreshError> {
    let text = source.fetch().await?;
    Ok(parse_str(&text, options)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    struct ScriptedSource {
        responses: StdMutex<Vec<Result<String, FetchError>>>,
    }

    impl ScriptedSource {
        fn new(mut responses: Vec<Result<String, FetchError>>) -> Self {
            responses.reverse();
            Self {
                responses: StdMutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl DocumentSource for ScriptedSource {
        async fn fetch(&self) -> Result<String, FetchError> {
            self.responses
                .lock()
                .unwrap()
                .pop()
                .expect("no scripted response left")
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    fn missing_file() -> FetchError {
        FetchError::File {
            path: "gone.md".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
    }

    const FIRST: &str = "# One\n\n## Jetpacks\n\n## A\nbody\n";
    const SECOND: &str = "# Two\n\n## Jetpacks\n\n## A\nbody\n## B\nmore\n";

    #[tokio::test]
    async fn init_fails_when_first_fetch_fails() {
        let source = Arc::new(ScriptedSource::new(vec![Err(missing_file())]));

        let result = ArticleService::init(source, ParserOptions::default()).await;

        assert!(matches!(result, Err(RefreshError::Fetch(_))));
    }

    #[tokio::test]
    async fn init_fails_on_malformed_document() {
        let source = Arc::new(ScriptedSource::new(vec![Ok("no title".to_string())]));

        let result = ArticleService::init(source, ParserOptions::default()).await;

        assert!(matches!(result, Err(RefreshError::Parse(_))));
    }

    #[tokio::test]
    async fn refresh_swaps_in_new_document() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(FIRST.to_string()),
            Ok(SECOND.to_string()),
        ]));
        let service = ArticleService::init(source, ParserOptions::default())
            .await
            .unwrap();

        let refreshed = service.refresh().await.unwrap();

        assert_eq!(refreshed.title, "Two");
        assert_eq!(service.current().sections.len(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_document() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(FIRST.to_string()),
            Err(missing_file()),
            Ok("# Broken\n\nno divider here\n".to_string()),
        ]));
        let service = ArticleService::init(source, ParserOptions::default())
            .await
            .unwrap();

        assert!(matches!(
            service.refresh().await,
            Err(RefreshError::Fetch(_))
        ));
        assert!(matches!(
            service.refresh().await,
            Err(RefreshError::Parse(ParseError::MissingDivider { .. }))
        ));
        assert_eq!(service.current().title, "One");
    }
}
