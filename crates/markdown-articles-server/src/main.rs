use std::process;

#[tokio::main]
async fn main() {
    if let Err(err) = markdown_articles_server::run().await {
        eprintln!("markdown-articles error: {err:#}");
        process::exit(1);
    }
}
