use fxwatch::config::ResolverConfig;
use fxwatch::rate_sources::{FetcherRegistry, SourceChain, SourceDescriptor};
use fxwatch::variation::Direction;
use fxwatch::FALLBACK_SOURCE;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resolver_config() -> ResolverConfig {
    ResolverConfig {
        max_retries: 1,
        retry_delay_ms: 10,
        fallback_rate: 5.50,
        restricted: Some(false),
        preferred_api: None,
    }
}

#[tokio::test]
async fn falls_through_failing_source_to_next() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/primary"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/secondary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "USDBRL": {"bid": "5.2500", "pctChange": "0.29", "varBid": "0.0150"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sources = vec![
        SourceDescriptor::api("Primary", format!("{}/primary", server.uri()), 1),
        SourceDescriptor::api("Secondary", format!("{}/secondary", server.uri()), 2),
    ];
    let registry = FetcherRegistry::with_defaults().unwrap();
    let chain = SourceChain::build(&sources, &registry, &resolver_config()).unwrap();

    let sample = chain.acquire_rate().await;

    assert_eq!(sample.rate, 5.25);
    assert_eq!(sample.source, "Secondary");
    assert_eq!(sample.variation.direction, Direction::Up);
    assert_eq!(sample.variation.percent, "+0.29%");
    assert!((sample.variation.absolute_change - 0.0150).abs() < 1e-9);
}

#[tokio::test]
async fn out_of_range_rates_are_retried_then_fallback_used() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rates": {"BRL": 52.5}})))
        .expect(2)
        .mount(&server)
        .await;

    let sources = vec![SourceDescriptor::api("Tables", format!("{}/rates", server.uri()), 1)];
    let registry = FetcherRegistry::with_defaults().unwrap();
    let chain = SourceChain::build(&sources, &registry, &resolver_config()).unwrap();

    let sample = chain.acquire_rate().await;

    assert_eq!(sample.source, FALLBACK_SOURCE);
    assert_eq!(sample.rate, 5.50);
    assert_eq!(sample.variation.direction, Direction::Stable);
    assert_eq!(sample.variation.percent, "0.00%");
}

#[tokio::test]
async fn disabled_sources_are_never_contacted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/off"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rate": 5.10})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/on"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rate": 5.20})))
        .mount(&server)
        .await;

    let sources = vec![
        SourceDescriptor::api("Off", format!("{}/off", server.uri()), 1).disabled(),
        SourceDescriptor::api("On", format!("{}/on", server.uri()), 2),
    ];
    let registry = FetcherRegistry::with_defaults().unwrap();
    let chain = SourceChain::build(&sources, &registry, &resolver_config()).unwrap();

    assert_eq!(chain.source_names(), vec!["On"]);
    let sample = chain.acquire_rate().await;
    assert_eq!(sample.source, "On");
    assert_eq!(sample.rate, 5.20);
}
