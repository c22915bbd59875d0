use social_scraper::{ScrapeRequest, ScrapeResponse, ScraperConfig, ScraperService, TokenSet};
use tower::Service;

#[tokio::main]
async fn main() {
    // ログ設定
    tracing_subscriber::fmt()
        .with_env_filter("info,social_scraper=debug")
        .init();

    // .env から FACEBOOK_APP_ID / FACEBOOK_APP_SECRET / SCOPE / PARSER_URL を読み込む
    dotenvy::dotenv().ok();
    let config = ScraperConfig::from_env().expect("設定の読み込みに失敗しました");

    let mut tokens = TokenSet::new();
    if let Ok(token) = std::env::var("FACEBOOK_TOKEN") {
        tokens = tokens.with_facebook(token);
    }
    if let Ok(token) = std::env::var("TWITTER_TOKEN") {
        tokens = tokens.with_twitter(token);
    }
    if let Ok(token) = std::env::var("INSTAGRAM_TOKEN") {
        tokens = tokens.with_instagram(token);
    }

    let mut service = ScraperService::new(config).expect("PARSER_URL environment variable not set");

    println!("=== Social Scraper Test ===");

    let result = service.call(ScrapeRequest::tokens(tokens)).await;
    let response = ScrapeResponse::from_result(&result);

    println!("HTTP {}", response.status_code());
    println!("{}", serde_json::to_string_pretty(&response).unwrap_or_default());

    if let Ok(report) = result {
        for outcome in &report.outcomes {
            println!(
                "  - {}: fetched={} forwarded={}",
                outcome.provider, outcome.fetched, outcome.forwarded
            );
        }
    }
}
