//! End-to-end probe tests against real HTTP/1.1 upstreams on localhost.

use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use twinprobe_core::{EnvironmentConfig, PluginConfig, PluginDescriptor, TwinConfig};
use twinprobe_health::*;

type Hits = Arc<Mutex<Vec<String>>>;

/// Start an upstream that answers every request with `status` and records
/// the request target.
async fn spawn_upstream(status: u16) -> (String, Hits) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits: Hits = Arc::new(Mutex::new(Vec::new()));
    let seen = hits.clone();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let seen = seen.clone();
            tokio::spawn(async move {
                let svc = service_fn(move |req: Request<Incoming>| {
                    let seen = seen.clone();
                    async move {
                        seen.lock().unwrap().push(req.uri().to_string());
                        Ok::<_, Infallible>(
                            Response::builder()
                                .status(status)
                                .body(Full::new(Bytes::new()))
                                .unwrap(),
                        )
                    }
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), svc)
                    .await;
            });
        }
    });

    (format!("http://{addr}/"), hits)
}

/// Delegates to a real factory and records every client name requested.
struct RecordingFactory {
    inner: HyperClientFactory,
    created: Mutex<Vec<String>>,
}

impl RecordingFactory {
    fn new(inner: HyperClientFactory) -> Arc<Self> {
        Arc::new(Self {
            inner,
            created: Mutex::new(Vec::new()),
        })
    }

    fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }
}

impl ClientFactory for RecordingFactory {
    fn create_client(&self, name: &str) -> ClientResult<Arc<dyn HttpClient>> {
        self.created.lock().unwrap().push(name.to_string());
        self.inner.create_client(name)
    }
}

fn two_plugins(first_url: &str, second_url: &str) -> TwinConfig {
    TwinConfig {
        plugins: Some(vec![
            PluginDescriptor {
                name: "First".to_string(),
                url: first_url.to_string(),
            },
            PluginDescriptor {
                name: "Second".to_string(),
                url: second_url.to_string(),
            },
        ]),
        ..Default::default()
    }
}

#[tokio::test]
async fn first_plugin_500_skips_second_plugin() {
    let (first_url, first_hits) = spawn_upstream(500).await;
    let (second_url, second_hits) = spawn_upstream(200).await;
    let config = two_plugins(&first_url, &second_url);

    let factory = RecordingFactory::new(HyperClientFactory::new(config.client_registrations()));
    let probe = PluginAvailabilityProbe::new(
        factory.clone(),
        config.plugin_config(),
        SharedHealthFlag::new(),
    );

    let result = probe.check_health(CancellationToken::new()).await;

    assert_eq!(result.status, ProbeStatus::Unhealthy);
    assert_eq!(factory.created(), ["plugin-First"]);
    assert_eq!(*first_hits.lock().unwrap(), ["/manifest"]);
    assert!(second_hits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn both_plugins_200_is_healthy() {
    let (first_url, first_hits) = spawn_upstream(200).await;
    let (second_url, second_hits) = spawn_upstream(200).await;
    let config = two_plugins(&first_url, &second_url);

    let factory = RecordingFactory::new(HyperClientFactory::new(config.client_registrations()));
    let probe = PluginAvailabilityProbe::new(
        factory.clone(),
        config.plugin_config(),
        SharedHealthFlag::new(),
    );

    let result = probe.check_health(CancellationToken::new()).await;

    assert_eq!(result.status, ProbeStatus::Healthy);
    assert_eq!(factory.created(), ["plugin-First", "plugin-Second"]);
    assert_eq!(first_hits.lock().unwrap().len(), 1);
    assert_eq!(second_hits.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn stale_manifest_skips_every_plugin() {
    let (url, hits) = spawn_upstream(200).await;
    let config = two_plugins(&url, &url);

    let factory = RecordingFactory::new(HyperClientFactory::new(config.client_registrations()));
    let manifest = SharedHealthFlag::new();
    let probe = PluginAvailabilityProbe::new(factory.clone(), config.plugin_config(), manifest.clone());

    manifest.write(false);
    let result = probe.check_health(CancellationToken::new()).await;
    assert_eq!(result.status, ProbeStatus::Unhealthy);
    assert!(factory.created().is_empty());
    assert!(hits.lock().unwrap().is_empty());

    // The manifest loader recovers; the next cycle probes again.
    manifest.write(true);
    let result = probe.check_health(CancellationToken::new()).await;
    assert_eq!(result.status, ProbeStatus::Healthy);
}

#[tokio::test]
async fn registry_pair_sends_page_size_query() {
    let (registry_url, hits) = spawn_upstream(200).await;
    let factory = Arc::new(HyperClientFactory::new([
        ("aas-registry", registry_url.clone()),
        ("submodel-registry", registry_url),
    ]));

    let probe = DependentPairProbe::template_registry(factory, &EnvironmentConfig::default());
    let result = probe.check_health(CancellationToken::new()).await;

    assert!(result.is_healthy());
    assert_eq!(
        *hits.lock().unwrap(),
        [
            "/shell-descriptors?limit=1",
            "/submodel-descriptors?limit=1"
        ]
    );
}

#[tokio::test]
async fn repository_down_is_unhealthy() {
    // Nothing listens on port 1.
    let factory = Arc::new(HyperClientFactory::new([(
        "template-repository",
        "http://127.0.0.1:1/",
    )]));

    let probe = DependentPairProbe::template_repository(factory, &EnvironmentConfig::default());
    let result = probe.check_health(CancellationToken::new()).await;

    assert_eq!(result, ProbeResult::unhealthy("aas-repository is unreachable"));
}

#[tokio::test]
async fn monitor_reports_mixed_dependencies() {
    let (plugin_url, _) = spawn_upstream(200).await;
    let factory = Arc::new(HyperClientFactory::new([("plugin-Only", plugin_url.clone())]));

    let plugins = PluginConfig::new(vec![PluginDescriptor {
        name: "Only".to_string(),
        url: plugin_url,
    }]);
    let monitor = HealthMonitor::new()
        .with_probe(Arc::new(PluginAvailabilityProbe::new(
            factory.clone(),
            plugins,
            SharedHealthFlag::new(),
        )))
        .with_probe(Arc::new(DependentPairProbe::template_registry(
            factory,
            &EnvironmentConfig::default(),
        )));

    let report = monitor.refresh(CancellationToken::new()).await;
    assert_eq!(report.status, ProbeStatus::Unhealthy);
    assert!(report.entries[0].result.is_healthy());
    assert!(!report.entries[1].result.is_healthy());
}
