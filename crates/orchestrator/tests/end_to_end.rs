//! End-to-end run against a local HTTP origin.
//!
//! Exercises the real fetcher, crawler, orchestrator and recommender
//! together; only the origin site is simulated.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crawler::{Crawler, CrawlerConfig};
use data_loader::Handle;
use http_client::{FetchConfig, Fetcher};
use orchestrator::{OrchestratorConfig, RecommendationOrchestrator, RunOutcome};
use pipeline::{Recommender, friend_similarity};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve `pages` (path -> HTML) over HTTP/1.1; unknown paths get a 404.
async fn start_origin(pages: HashMap<String, String>) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind origin");
    let addr = listener.local_addr().expect("Failed to get local address");
    let pages = Arc::new(pages);

    let handle = tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let pages = pages.clone();

            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let path = request
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();

                let (status, body) = match pages.get(&path) {
                    Some(html) => ("200 OK", html.clone()),
                    None => ("404 Not Found", String::from("not found")),
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{}", addr), handle)
}

fn film_log(films: &[(&str, &str, bool)], pages: usize) -> String {
    let mut html = String::from("<html><body><ul class=\"poster-list\">");
    for (id, stars, liked) in films {
        html.push_str(&format!(
            "<li><div class=\"film-poster\" data-target-link=\"/film/{id}/\"><img alt=\"{id}\"/></div>\
             <p class=\"poster-viewingdata\"><span class=\"rating\">{stars}</span>{}</p></li>",
            if *liked { "<span class=\"like\"></span>" } else { "" }
        ));
    }
    html.push_str("</ul><div class=\"pagination\"><ul>");
    for page in 1..=pages {
        html.push_str(&format!("<li class=\"paginate-page\"><a>{page}</a></li>"));
    }
    html.push_str("</ul></div></body></html>");
    html
}

fn listing(handles: &[&str], next: Option<&str>) -> String {
    let mut html = String::from("<html><body>");
    for handle in handles {
        html.push_str(&format!("<a class=\"avatar\" href=\"/{handle}/\"></a>"));
    }
    if let Some(next) = next {
        html.push_str(&format!("<a class=\"next\" href=\"{next}\">Older</a>"));
    }
    html.push_str("</body></html>");
    html
}

fn site() -> HashMap<String, String> {
    let mut pages = HashMap::new();
    let mut page = |path: &str, html: String| {
        pages.insert(path.to_string(), html);
    };

    // ana follows bo, cy, dee; followed back by bo and cy (paginated)
    page("/ana/following/", listing(&["bo", "cy", "dee"], None));
    page("/ana/followers/", listing(&["bo"], Some("/ana/followers/page/2/")));
    page("/ana/followers/page/2/", listing(&["cy", "eli"], None));

    page(
        "/ana/films/",
        film_log(&[("alien", "★★★★★", true), ("cats", "★", false), ("heat", "★★★★", false)], 2),
    );
    page("/ana/films/page/2/", film_log(&[("tenet", "★★★", false)], 2));

    // bo agrees with ana
    page(
        "/bo/films/",
        film_log(
            &[
                ("alien", "★★★★½", true),
                ("cats", "½", false),
                ("heat", "★★★★", false),
                ("tenet", "★★★", false),
                ("the-thing", "★★★★★", true),
            ],
            1,
        ),
    );

    // cy disagrees; their second page is missing, so cy fails
    page(
        "/cy/films/",
        film_log(&[("alien", "★", false), ("cats", "★★★★★", true)], 2),
    );

    pages
}

fn orchestrator(base: &str) -> RecommendationOrchestrator {
    let fetcher = Fetcher::new(
        FetchConfig::default()
            .with_request_delay(Duration::ZERO)
            .with_backoff_factor(Duration::from_millis(5))
            .with_timeout(Duration::from_secs(5)),
    )
    .expect("fetcher should build");

    let crawler = Crawler::new(Arc::new(fetcher)).with_config(CrawlerConfig::default().with_domain(base));
    RecommendationOrchestrator::new(crawler).with_config(OrchestratorConfig::default().with_max_workers(4))
}

#[tokio::test]
async fn test_mutual_friends_over_http() {
    let (base, server) = start_origin(site()).await;
    let orchestrator = orchestrator(&base);

    let friends = orchestrator
        .list_friends(&Handle::new("ana").unwrap(), "mutual")
        .await
        .unwrap();

    let names: Vec<&str> = friends.iter().map(Handle::as_str).collect();
    assert_eq!(names, vec!["bo", "cy"]);
    server.abort();
}

#[tokio::test]
async fn test_full_run_over_http() {
    let (base, server) = start_origin(site()).await;
    let orchestrator = orchestrator(&base);

    let outcome = orchestrator
        .run(&Handle::new("ana").unwrap(), "mutual", &Recommender::new(), Some(25))
        .await
        .unwrap();

    let RunOutcome::Recommendations { candidates, report } = outcome else {
        panic!("expected recommendations");
    };

    assert_eq!(report.viewer.len(), 4, "both pages of the viewer's log");
    assert_eq!(report.friends.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].handle.as_str(), "cy");

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, "the-thing");
    assert_eq!(candidates[0].absolute_link(&base), format!("{}/film/the-thing/", base));

    let table = friend_similarity(&report.viewer, &report.friends);
    assert_eq!(table.len(), 1);
    assert!(table[0].1 > 0.9);
    server.abort();
}
