//! Background polling of the merged feed.
//!
//! One task per [`Poller`]: it polls immediately, then on every interval
//! tick, plus whenever a manual refresh is queued. Polls run inline in the
//! task, so requests never overlap. Results go out as [`PollUpdate`]s.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::document::parse_document;
use super::state::PollUpdate;
use super::ClientError;
use crate::config::ClientConfig;
use crate::feed::NormalizedItem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerSettings {
    pub api_url: String,
    pub interval: Duration,
    pub request_timeout: Duration,
}

impl From<&ClientConfig> for PollerSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
            interval: Duration::from_secs(config.poll_interval_secs),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

/// Handle to the polling task. Dropping it stops polling.
pub struct Poller {
    refresh_tx: mpsc::Sender<()>,
    fetching: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Starts polling. Must be called inside a tokio runtime.
    ///
    /// The task ends on its own when `events` is closed.
    pub fn spawn(
        client: reqwest::Client,
        settings: PollerSettings,
        events: mpsc::Sender<PollUpdate>,
    ) -> Self {
        // Single slot: refreshes requested while one is queued are coalesced.
        let (refresh_tx, refresh_rx) = mpsc::channel(1);
        let fetching = Arc::new(AtomicBool::new(false));

        let handle = tokio::spawn(run(
            client,
            settings,
            events,
            refresh_rx,
            Arc::clone(&fetching),
        ));

        Self {
            refresh_tx,
            fetching,
            handle,
        }
    }

    /// Queues a poll to run as soon as the current one (if any) finishes.
    ///
    /// Returns `false` when a refresh was already queued.
    pub fn request_refresh(&self) -> bool {
        match self.refresh_tx.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) => {
                tracing::debug!("Refresh already queued, coalescing");
                false
            }
            Err(TrySendError::Closed(())) => false,
        }
    }

    /// Whether a request is in flight right now.
    pub fn is_fetching(&self) -> bool {
        self.fetching.load(Ordering::Acquire)
    }

    /// Stops polling. Equivalent to dropping the handle.
    pub fn shutdown(self) {}
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(
    client: reqwest::Client,
    settings: PollerSettings,
    events: mpsc::Sender<PollUpdate>,
    mut refresh_rx: mpsc::Receiver<()>,
    fetching: Arc<AtomicBool>,
) {
    // The first tick completes immediately.
    let mut ticker = tokio::time::interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            queued = refresh_rx.recv() => {
                if queued.is_none() {
                    break;
                }
            }
        }

        if !poll_once(&client, &settings, &events, &fetching).await {
            tracing::debug!("Poll receiver closed, stopping poller");
            break;
        }
    }
}

/// Runs one poll and reports it. Returns `false` once nobody is listening.
async fn poll_once(
    client: &reqwest::Client,
    settings: &PollerSettings,
    events: &mpsc::Sender<PollUpdate>,
    fetching: &AtomicBool,
) -> bool {
    fetching.store(true, Ordering::Release);
    if events.send(PollUpdate::Started).await.is_err() {
        return false;
    }

    let update = match fetch_document(client, &settings.api_url, settings.request_timeout).await {
        Ok(items) => {
            tracing::debug!(items = items.len(), "Polled feed");
            PollUpdate::Fetched(items)
        }
        Err(e) => {
            tracing::warn!(url = %settings.api_url, error = %e, "Feed poll failed");
            PollUpdate::Failed(e.to_string())
        }
    };

    fetching.store(false, Ordering::Release);
    events.send(update).await.is_ok()
}

/// Fetches and parses the merged feed once.
pub async fn fetch_document(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<Vec<NormalizedItem>, ClientError> {
    let body = tokio::time::timeout(timeout, download(client, url))
        .await
        .map_err(|_| ClientError::Timeout)??;
    parse_document(&body)
}

async fn download(client: &reqwest::Client, url: &str) -> Result<String, ClientError> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(ClientError::HttpStatus(response.status().as_u16()));
    }
    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DOC: &str = r#"<?xml version="1.0"?><rss version="2.0"><channel><title>t</title>
<item><title>One</title><link>https://a.test/1</link><pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate><source>A</source></item>
</channel></rss>"#;

    fn settings(server: &MockServer) -> PollerSettings {
        PollerSettings {
            api_url: format!("{}/api/feed", server.uri()),
            interval: Duration::from_secs(3600),
            request_timeout: Duration::from_secs(2),
        }
    }

    async fn serve(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/feed"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    async fn next(rx: &mut mpsc::Receiver<PollUpdate>) -> PollUpdate {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("poller sent nothing")
            .expect("poller channel closed")
    }

    #[test]
    fn settings_from_client_config() {
        let s = PollerSettings::from(&ClientConfig::default());
        assert_eq!(s.api_url, "http://localhost:3000/api/feed");
        assert_eq!(s.interval, Duration::from_secs(300));
        assert_eq!(s.request_timeout, Duration::from_secs(8));
    }

    #[tokio::test]
    async fn polls_immediately_on_start() {
        let server = serve(ResponseTemplate::new(200).set_body_string(DOC)).await;
        let (tx, mut rx) = mpsc::channel(8);
        let poller = Poller::spawn(reqwest::Client::new(), settings(&server), tx);

        assert_eq!(next(&mut rx).await, PollUpdate::Started);
        match next(&mut rx).await {
            PollUpdate::Fetched(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].link, "https://a.test/1");
                assert_eq!(items[0].source, "A");
            }
            other => panic!("expected Fetched, got {other:?}"),
        }
        assert!(!poller.is_fetching());
    }

    #[tokio::test]
    async fn manual_refresh_polls_again() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DOC))
            .expect(2)
            .mount(&server)
            .await;

        let (tx, mut rx) = mpsc::channel(8);
        let poller = Poller::spawn(reqwest::Client::new(), settings(&server), tx);
        next(&mut rx).await;
        next(&mut rx).await;

        assert!(poller.request_refresh());
        assert_eq!(next(&mut rx).await, PollUpdate::Started);
        assert!(matches!(next(&mut rx).await, PollUpdate::Fetched(_)));
    }

    #[tokio::test]
    async fn queued_refreshes_coalesce() {
        let server = serve(ResponseTemplate::new(200).set_body_string(DOC)).await;
        let (tx, _rx) = mpsc::channel(8);
        let poller = Poller::spawn(reqwest::Client::new(), settings(&server), tx);

        // Nothing has run yet on the current-thread runtime, so the slot is free.
        assert!(poller.request_refresh());
        assert!(!poller.request_refresh());
    }

    #[tokio::test]
    async fn http_error_is_reported_as_failed() {
        let server = serve(ResponseTemplate::new(502)).await;
        let (tx, mut rx) = mpsc::channel(8);
        let _poller = Poller::spawn(reqwest::Client::new(), settings(&server), tx);

        next(&mut rx).await;
        match next(&mut rx).await {
            PollUpdate::Failed(reason) => assert!(reason.contains("502")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_api_times_out() {
        let server = serve(
            ResponseTemplate::new(200)
                .set_body_string(DOC)
                .set_delay(Duration::from_secs(5)),
        )
        .await;
        let err = fetch_document(
            &reqwest::Client::new(),
            &format!("{}/api/feed", server.uri()),
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ClientError::Timeout));
    }

    #[tokio::test]
    async fn garbage_body_is_parse_error() {
        let server = serve(ResponseTemplate::new(200).set_body_string("not xml at all")).await;
        let err = fetch_document(
            &reqwest::Client::new(),
            &format!("{}/api/feed", server.uri()),
            Duration::from_secs(2),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));
    }

    #[tokio::test]
    async fn dropping_the_poller_stops_the_task() {
        let server = serve(ResponseTemplate::new(200).set_body_string(DOC)).await;
        let (tx, mut rx) = mpsc::channel(8);
        let poller = Poller::spawn(reqwest::Client::new(), settings(&server), tx);
        next(&mut rx).await;
        next(&mut rx).await;

        poller.shutdown();

        let closed = tokio::time::timeout(Duration::from_secs(5), async {
            while rx.recv().await.is_some() {}
        })
        .await;
        assert!(closed.is_ok(), "sender should drop once the task is aborted");
    }
}
