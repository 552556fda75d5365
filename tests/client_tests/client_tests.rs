//! Client Tests
//!
//! These tests verify:
//! - Typed operations through a serializer
//! - Connection pooling and reuse
//! - Error surfaces: encoding, unreachable server, disabled client
//! - Concurrent callers sharing one client

use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use setcache::error::CacheError;
use setcache::serialization::{AsciiSerializer, BincodeSerializer, BytesSerializer};
use setcache::{ClientConfig, Server, ServerConfig, SetCacheClient, StringSerializer};

// =============================================================================
// Helper Functions
// =============================================================================

fn start_server() -> (Server, SocketAddr) {
    let server = Server::new(ServerConfig::builder().listen_addr("127.0.0.1:0").build());
    let addr = server.start().unwrap();
    (server, addr)
}

fn client_for(addr: SocketAddr) -> SetCacheClient {
    SetCacheClient::new(
        ClientConfig::builder()
            .hostname("127.0.0.1")
            .port(addr.port())
            .build(),
    )
    .unwrap()
}

/// A port with nothing listening on it
fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_set_operations() {
    let (_server, addr) = start_server();
    let client = client_for(addr);
    let serializer = StringSerializer;

    let value = "value";
    assert!(!client.contains(value, &serializer).unwrap());
    assert!(client.add_if_absent(value, &serializer).unwrap());
    assert!(!client.add_if_absent(value, &serializer).unwrap());
    assert!(client.contains(value, &serializer).unwrap());
    assert!(client.remove(value, &serializer).unwrap());
    assert!(!client.contains(value, &serializer).unwrap());
}

#[test]
fn test_repeated_remove_returns_false() {
    let (_server, addr) = start_server();
    let client = client_for(addr);

    client.add_if_absent("v", &StringSerializer).unwrap();
    assert!(client.remove("v", &StringSerializer).unwrap());
    assert!(!client.remove("v", &StringSerializer).unwrap());
    assert!(!client.remove("v", &StringSerializer).unwrap());
    assert!(!client.contains("v", &StringSerializer).unwrap());
}

#[test]
fn test_identity_follows_encoded_bytes() {
    let (_server, addr) = start_server();
    let client = client_for(addr);

    // The same bytes through different serializers are the same member
    assert!(client.add_if_absent("abc", &StringSerializer).unwrap());
    assert!(client.contains(b"abc".as_slice(), &BytesSerializer).unwrap());
    assert!(!client.add_if_absent("abc", &AsciiSerializer).unwrap());
}

#[test]
fn test_closure_serializer() {
    let (_server, addr) = start_server();
    let client = client_for(addr);
    let by_id = |id: &u64| -> setcache::Result<Vec<u8>> { Ok(id.to_be_bytes().to_vec()) };

    assert!(client.add_if_absent(&7u64, &by_id).unwrap());
    assert!(client.contains(&7u64, &by_id).unwrap());
    assert!(!client.contains(&8u64, &by_id).unwrap());
}

#[test]
fn test_bincode_values() {
    let (_server, addr) = start_server();
    let client = client_for(addr);
    let serializer = BincodeSerializer::<(String, u32)>::new();

    let key = ("user".to_string(), 17);
    assert!(client.add_if_absent(&key, &serializer).unwrap());
    assert!(client.contains(&key.clone(), &serializer).unwrap());
    assert!(!client.contains(&("user".to_string(), 18), &serializer).unwrap());
}

// =============================================================================
// Connection Management Tests
// =============================================================================

#[test]
fn test_sequential_calls_reuse_one_connection() {
    let (server, addr) = start_server();
    let client = client_for(addr);

    for i in 0..10 {
        client.add_if_absent(&format!("v{}", i), &StringSerializer).unwrap();
    }

    assert_eq!(client.idle_connections(), 1);
    assert_eq!(server.connection_count(), 1);
}

#[test]
fn test_membership_survives_client_reconnect() {
    let (server, addr) = start_server();

    {
        let client = client_for(addr);
        assert!(client.add_if_absent("persistent", &StringSerializer).unwrap());
    }

    let client = client_for(addr);
    assert!(client.contains("persistent", &StringSerializer).unwrap());
    assert_eq!(server.store().unwrap().len(), 1);
}

#[test]
fn test_pooled_connection_closed_by_server_is_replaced() {
    let server = Server::new(
        ServerConfig::builder()
            .listen_addr("127.0.0.1:0")
            .read_timeout_ms(100)
            .build(),
    );
    let addr = server.start().unwrap();
    let client = client_for(addr);

    assert!(client.add_if_absent("v", &StringSerializer).unwrap());
    assert_eq!(client.idle_connections(), 1);

    // The server drops the idle connection after its read timeout
    thread::sleep(Duration::from_millis(400));

    assert!(client.contains("v", &StringSerializer).unwrap());
    assert!(!client.add_if_absent("v", &StringSerializer).unwrap());
    assert_eq!(client.idle_connections(), 1);
}

#[test]
fn test_disable_closes_pool_and_rejects_calls() {
    let (_server, addr) = start_server();
    let client = client_for(addr);
    client.add_if_absent("v", &StringSerializer).unwrap();

    client.disable();
    client.disable();

    assert!(!client.is_enabled());
    assert_eq!(client.idle_connections(), 0);
    assert!(matches!(
        client.contains("v", &StringSerializer),
        Err(CacheError::Connection(_))
    ));

    client.enable();
    client.enable();
    assert!(client.contains("v", &StringSerializer).unwrap());
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_encoding_error_sends_nothing() {
    let (server, addr) = start_server();
    let client = client_for(addr);

    let err = client.add_if_absent("ünïcode", &AsciiSerializer).unwrap_err();

    assert!(matches!(err, CacheError::Encoding(_)));
    assert_eq!(client.idle_connections(), 0);
    assert_eq!(server.connection_count(), 0);
    assert!(server.store().unwrap().is_empty());
}

#[test]
fn test_unreachable_server_is_connection_error() {
    let client = SetCacheClient::new(
        ClientConfig::builder()
            .hostname("127.0.0.1")
            .port(unused_port())
            .build(),
    )
    .unwrap();

    let err = client.contains("v", &StringSerializer).unwrap_err();
    assert!(matches!(err, CacheError::Connection(_)));
}

#[test]
fn test_server_stop_surfaces_connection_error() {
    let (server, addr) = start_server();
    let client = client_for(addr);
    client.add_if_absent("v", &StringSerializer).unwrap();

    server.stop();

    // The dead pooled connection is discarded and reconnecting fails
    let err = client.contains("v", &StringSerializer).unwrap_err();
    assert!(matches!(err, CacheError::Connection(_)));
    assert_eq!(client.idle_connections(), 0);
}

#[test]
fn test_invalid_config() {
    let empty_host = ClientConfig::builder().hostname("").build();
    assert!(matches!(
        SetCacheClient::new(empty_host),
        Err(CacheError::Config(_))
    ));

    let no_pool = ClientConfig::builder().pool_size(0).build();
    assert!(matches!(
        SetCacheClient::new(no_pool),
        Err(CacheError::Config(_))
    ));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_add_if_absent_single_winner() {
    const THREADS: usize = 8;
    let (server, addr) = start_server();
    let client = Arc::new(client_for(addr));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let client = Arc::clone(&client);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                client.add_if_absent("shared", &StringSerializer).unwrap()
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|added| *added)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(server.store().unwrap().len(), 1);
    assert!(client.idle_connections() <= client.config().pool_size);
}
