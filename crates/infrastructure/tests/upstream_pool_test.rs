mod helpers;

use helpers::{MockDnsServer, MOCK_ANSWER};
use hostrelay_application::ports::UpstreamResolver;
use hostrelay_domain::{DnsQuery, DomainError, RecordType, UpstreamProtocol, UpstreamTarget};
use hostrelay_infrastructure::dns::forwarding::{MessageBuilder, ResponseParser};
use hostrelay_infrastructure::dns::{UpstreamPool, UpstreamServer};
use std::net::IpAddr;
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_millis(300);

fn udp(server: &MockDnsServer) -> UpstreamServer {
    UpstreamServer::new(UpstreamProtocol::Udp, server.addr())
}

fn tcp(server: &MockDnsServer) -> UpstreamServer {
    UpstreamServer::new(UpstreamProtocol::Tcp, server.addr())
}

#[tokio::test]
async fn test_forward_returns_upstream_bytes_unchanged() {
    let upstream = MockDnsServer::start().await.unwrap();
    let pool = UpstreamPool::from_servers(vec![udp(&upstream)], TIMEOUT);
    let query = MessageBuilder::build_query("bar.vm", &RecordType::A).unwrap();

    let response = pool.forward(&query).await.unwrap();

    assert_eq!(response, MockDnsServer::build_mock_response(&query));
    assert_eq!(upstream.udp_queries(), 1);
}

#[tokio::test]
async fn test_resolve_builds_its_own_query() {
    let upstream = MockDnsServer::start().await.unwrap();
    let pool = UpstreamPool::from_servers(vec![udp(&upstream)], TIMEOUT);

    let response = pool
        .resolve(&DnsQuery::new("docs.example.com", RecordType::A))
        .await
        .unwrap();

    let parsed = ResponseParser::parse(&response).unwrap();
    assert_eq!(parsed.addresses, vec![IpAddr::V4(MOCK_ANSWER)]);
}

#[tokio::test]
async fn test_tcp_upstream() {
    let upstream = MockDnsServer::start().await.unwrap();
    let pool = UpstreamPool::from_servers(vec![tcp(&upstream)], TIMEOUT);
    let query = MessageBuilder::build_query("bar.vm", &RecordType::A).unwrap();

    let response = pool.forward(&query).await.unwrap();

    assert_eq!(response, MockDnsServer::build_mock_response(&query));
    assert_eq!(upstream.tcp_queries(), 1);
    assert_eq!(upstream.udp_queries(), 0);
}

#[tokio::test]
async fn test_failover_to_next_server_in_order() {
    let dead = MockDnsServer::start_silent().await.unwrap();
    let alive = MockDnsServer::start().await.unwrap();
    let pool = UpstreamPool::from_servers(vec![udp(&dead), udp(&alive)], TIMEOUT);
    let query = MessageBuilder::build_query("bar.vm", &RecordType::A).unwrap();

    let response = pool.forward(&query).await.unwrap();

    assert_eq!(response, MockDnsServer::build_mock_response(&query));
    assert_eq!(dead.udp_queries(), 1);
    assert_eq!(alive.udp_queries(), 1);
}

#[tokio::test]
async fn test_first_responder_wins() {
    let first = MockDnsServer::start().await.unwrap();
    let second = MockDnsServer::start().await.unwrap();
    let pool = UpstreamPool::from_servers(vec![udp(&first), udp(&second)], TIMEOUT);
    let query = MessageBuilder::build_query("bar.vm", &RecordType::A).unwrap();

    pool.forward(&query).await.unwrap();

    assert_eq!(first.udp_queries(), 1);
    assert_eq!(second.udp_queries(), 0);
}

#[tokio::test]
async fn test_all_servers_silent_fails_within_bounded_time() {
    let a = MockDnsServer::start_silent().await.unwrap();
    let b = MockDnsServer::start_silent().await.unwrap();
    let pool = UpstreamPool::from_servers(vec![udp(&a), udp(&b)], TIMEOUT);
    let query = MessageBuilder::build_query("bar.vm", &RecordType::A).unwrap();

    let started = Instant::now();
    let result = pool.forward(&query).await;

    assert!(matches!(
        result,
        Err(DomainError::TransportAllServersUnreachable)
    ));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_truncated_udp_answer_retried_over_tcp() {
    let upstream = MockDnsServer::start_truncating().await.unwrap();
    let pool = UpstreamPool::from_servers(vec![udp(&upstream)], Duration::from_secs(1));
    let query = MessageBuilder::build_query("big.example.com", &RecordType::A).unwrap();

    let response = pool.forward(&query).await.unwrap();

    let parsed = ResponseParser::parse(&response).unwrap();
    assert!(!parsed.truncated);
    assert_eq!(parsed.addresses, vec![IpAddr::V4(MOCK_ANSWER)]);
    assert_eq!(upstream.udp_queries(), 1);
    assert_eq!(upstream.tcp_queries(), 1);
}

#[tokio::test]
async fn test_pool_from_config_targets() {
    let upstream = MockDnsServer::start().await.unwrap();
    let target = UpstreamTarget::udp("127.0.0.1", upstream.addr().port());

    let pool = UpstreamPool::new(&[target], TIMEOUT).await.unwrap();
    let query = MessageBuilder::build_query("bar.vm", &RecordType::A).unwrap();

    assert_eq!(pool.servers(), &[udp(&upstream)]);
    assert!(pool.forward(&query).await.is_ok());
}
