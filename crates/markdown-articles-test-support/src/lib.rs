//! Shared test fixtures for markdown-articles crates.

use std::path::Path;

use markdown_articles_config::{Config, LoadOptions};

pub const WEBHOOK_SECRET: &str = "correct horse battery staple";

/// Well-formed document with two articles, the second holding fenced code.
pub const SAMPLE_DOCUMENT: &str = "\
# Test Jetpack Articles

Yep, you guessed it; this is for testing.

## Jetpacks

## Test article 1

The first test article

## Test article 2

```md
## Not a heading
```
";

/// Same layout as [`SAMPLE_DOCUMENT`] with a third article appended.
pub const UPDATED_DOCUMENT: &str = "\
# Test Jetpack Articles

Yep, you guessed it; this is for testing.

## Jetpacks

## Test article 1

The first test article

## Test article 2

Rewritten.

## Test article 3

Brand new.
";

/// Missing the divider, so it never parses.
pub const MALFORMED_DOCUMENT: &str = "\
# Test Jetpack Articles

There is no divider in this document.

## Test article 1
";

/// Returns a configuration resolved from built-in defaults in `working_dir`.
pub fn test_config(working_dir: &Path) -> Config {
    Config::load(LoadOptions::default().with_working_dir(working_dir))
        .unwrap_or_else(|err| panic!("failed to load test config: {err}"))
}
