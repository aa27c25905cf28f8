use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use ficrecs_client::{Ao3Adapter, AttemptError, FetchConfig, FetchError, Fetcher, SourceAdapter};
use ficrecs_core::{Source, StoryStatus};

const LISTING: &str = r#"<html><body><ol class="work index group">
  <li class="work blurb group"><h4 class="heading"><a href="/works/1">One</a></h4></li>
  <li class="work blurb group"><h4 class="heading"><a href="/works/missing">Gone</a></h4></li>
</ol></body></html>"#;

const WORK: &str = r#"<html><body>
<dl class="work meta group">
  <dd class="rating tags"><a class="tag">General Audiences</a></dd>
  <dd class="fandom tags"><a class="tag">Good Omens</a></dd>
  <dd class="freeform tags"><a class="tag">Fluff</a></dd>
  <dl class="stats">
    <dd class="published">2022-06-30</dd>
    <dd class="words">2,500</dd>
    <dd class="chapters">3/?</dd>
    <dd class="hits">995</dd>
  </dl>
</dl>
<div id="workskin"><h2 class="title heading">Nice and Accurate</h2>
<h3 class="byline heading"><a rel="author" href="/users/aziraphale">aziraphale</a></h3>
<div class="summary module"><blockquote>Bookshop things.</blockquote></div></div>
</body></html>"#;

/// Minimal archive stand-in; reports the User-Agent of every request it serves.
struct ArchiveStub {
    base_url: String,
    seen: mpsc::Receiver<(String, String)>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ArchiveStub {
    fn spawn() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start archive stub server");
        let base_url = format!("http://{}", server.server_addr());
        let (seen_tx, seen) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }
                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let path = request.url().to_string();
                let agent = request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("User-Agent"))
                    .map(|h| h.value.to_string())
                    .unwrap_or_default();
                let _ = seen_tx.send((path.clone(), agent));

                let response = if path.starts_with("/works?") {
                    tiny_http::Response::from_string(LISTING)
                } else if path == "/works/1" {
                    tiny_http::Response::from_string(WORK)
                } else {
                    tiny_http::Response::from_string("unavailable").with_status_code(503)
                };
                let _ = request.respond(response);
            }
        });

        Self { base_url, seen, shutdown_tx: Some(shutdown_tx), handle: Some(handle) }
    }

    fn requests(&self) -> Vec<(String, String)> {
        self.seen.try_iter().collect()
    }
}

impl Drop for ArchiveStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn config(max_retries: u32) -> FetchConfig {
    FetchConfig {
        rate_limit: Duration::from_millis(10),
        max_retries,
        user_agent: "ficrecs-integration/1.0".into(),
        respect_robots: true,
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_reqwest_fetch_sends_user_agent() {
    let stub = ArchiveStub::spawn();
    let fetcher = Fetcher::new(config(1)).unwrap();

    let response = fetcher.fetch(&format!("{}/works/1", stub.base_url)).await.unwrap();

    assert_eq!(response.status.as_u16(), 200);
    assert!(response.text().contains("Nice and Accurate"));
    assert_eq!(stub.requests(), vec![("/works/1".to_string(), "ficrecs-integration/1.0".to_string())]);
}

#[tokio::test]
async fn test_reqwest_non_success_status_exhausts() {
    let stub = ArchiveStub::spawn();
    let fetcher = Fetcher::new(config(2)).unwrap();

    let result = fetcher.fetch(&format!("{}/works/missing", stub.base_url)).await;

    assert!(matches!(
        result,
        Err(FetchError::Exhausted { attempts: 2, last: AttemptError::Status { status: 503 }, .. })
    ));
    assert_eq!(stub.requests().len(), 2);
}

#[tokio::test]
async fn test_ao3_popular_over_http() {
    let stub = ArchiveStub::spawn();
    let fetcher = Fetcher::new(config(1)).unwrap();
    let adapter = Ao3Adapter::with_fetcher(fetcher, &stub.base_url).unwrap();

    let stories = adapter.get_popular_stories(Some("Good Omens"), 5).await.unwrap();

    assert_eq!(stories.len(), 1);
    let story = &stories[0];
    assert_eq!(story.title, "Nice and Accurate");
    assert_eq!(story.author, "aziraphale");
    assert_eq!(story.source, Source::Ao3);
    assert_eq!(story.status, StoryStatus::InProgress);
    assert_eq!(story.rating.to_string(), "3.5");
    assert_eq!(story.word_count, 2_500);
    assert_eq!(story.view_count, 995);
    assert_eq!(story.weekly_views, 100);
    assert_eq!(story.original_url, format!("{}/works/1", stub.base_url));

    let paths: Vec<_> = stub.requests().into_iter().map(|(path, _)| path).collect();
    assert_eq!(
        paths,
        vec![
            "/works?work_search[sort_column]=hits&work_search[sort_direction]=desc&work_search[fandom_names]=Good+Omens"
                .to_string(),
            "/works/1".to_string(),
            "/works/missing".to_string(),
        ]
    );
}
