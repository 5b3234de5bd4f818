//! OpenSSL engine integration tests
//!
//! These tests run real TLS handshakes over loopback TCP against an OpenSSL
//! acceptor, with a throwaway self-signed certificate.

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::ssl::{self, AlpnError, SslAcceptor, SslMethod};
use openssl::x509::extension::SubjectAlternativeName;
use openssl::x509::{X509Builder, X509NameBuilder, X509};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;
use tlsstub::context::{Context, ContextError};
use tlsstub::net::Conn;
use tlsstub::tls::{OpensslEngine, TlsConfig, TlsConn, TlsEngine, TlsVersion};
use tlsstub::TlsError;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn self_signed() -> (X509, PKey<Private>) {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, "localhost").unwrap();
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(1).unwrap()).unwrap();
    let san = SubjectAlternativeName::new()
        .dns("localhost")
        .build(&builder.x509v3_context(None, None))
        .unwrap();
    builder.append_extension(san).unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();

    (builder.build(), key)
}

/// Accept one TLS connection, read 5 bytes, answer "World", wait for close
fn spawn_server() -> (u16, thread::JoinHandle<()>) {
    let (cert, key) = self_signed();
    let mut acceptor = SslAcceptor::mozilla_modern_v5(SslMethod::tls()).unwrap();
    acceptor.set_certificate(&cert).unwrap();
    acceptor.set_private_key(&key).unwrap();
    acceptor.check_private_key().unwrap();
    acceptor.set_alpn_select_callback(|_ssl, client_protos| {
        ssl::select_next_proto(b"\x02h2\x08http/1.1", client_protos).ok_or(AlpnError::NOACK)
    });
    let acceptor = acceptor.build();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (tcp_stream, _) = listener.accept().unwrap();
        let mut tls = acceptor.accept(tcp_stream).unwrap();

        let mut buf = [0u8; 5];
        tls.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"Hello");

        tls.write_all(b"World").unwrap();

        let mut rest = Vec::new();
        let _ = tls.read_to_end(&mut rest);
        let _ = tls.shutdown();
    });

    (port, handle)
}

fn write_all(conn: &mut dyn TlsConn, mut data: &[u8]) {
    while !data.is_empty() {
        let n = conn.write(data).unwrap();
        assert!(n > 0);
        data = &data[n..];
    }
}

fn read_exact(conn: &mut dyn TlsConn, buf: &mut [u8]) {
    let mut got = 0;
    while got < buf.len() {
        let n = conn.read(&mut buf[got..]).unwrap();
        assert!(n > 0, "connection closed early");
        got += n;
    }
}

#[test]
fn test_openssl_engine_handshake_over_tcp() {
    init_logging();

    let (port, server) = spawn_server();

    let config = TlsConfig::client()
        .version(TlsVersion::Tls13)
        .alpn(&["h2"])
        .servername("localhost")
        .verify_peer(false)
        .build()
        .unwrap();

    let engine: Box<dyn TlsEngine> = Box::new(OpensslEngine::new());
    assert_eq!(engine.name(), "openssl");
    assert_eq!(engine.parrot(), "");

    let tcp_stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    let mut conn = engine.client(Box::new(tcp_stream), &config);
    assert!(!conn.connection_state().handshake_complete);

    let ctx = Context::background().with_timeout(Duration::from_secs(10));
    conn.handshake(&ctx).unwrap();

    let state = conn.connection_state();
    assert!(state.handshake_complete);
    assert_eq!(state.version, Some(TlsVersion::Tls13));
    assert_eq!(state.negotiated_protocol.as_deref(), Some("h2"));
    assert_eq!(state.server_name.as_deref(), Some("localhost"));
    assert!(!state.did_resume);

    let cipher = state.cipher_suite.unwrap();
    assert!(cipher.name().unwrap().starts_with("TLS_"));

    assert_eq!(state.peer_certificates.len(), 1);
    assert_eq!(state.peer_certificates[0].subject.as_deref(), Some("localhost"));
    assert_eq!(
        state.peer_certificates[0].subject_alt_names,
        vec!["DNS:localhost".to_string()]
    );

    // Repeated handshakes are no-ops
    conn.handshake(&ctx).unwrap();

    assert_eq!(conn.remote_addr().unwrap().port(), port);

    write_all(conn.as_mut(), b"Hello");
    let mut buf = [0u8; 5];
    read_exact(conn.as_mut(), &mut buf);
    assert_eq!(&buf, b"World");

    conn.close().unwrap();
    server.join().unwrap();
}

#[test]
fn test_openssl_engine_implicit_handshake_on_write() {
    init_logging();

    let (port, server) = spawn_server();

    let config = TlsConfig::client()
        .version(TlsVersion::Tls13)
        .servername("localhost")
        .build()
        .unwrap();

    let tcp_stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    let mut conn = OpensslEngine::new().client(Box::new(tcp_stream), &config);

    write_all(conn.as_mut(), b"Hello");
    assert!(conn.connection_state().handshake_complete);
    assert_eq!(conn.connection_state().negotiated_protocol, None);

    let mut buf = [0u8; 5];
    read_exact(conn.as_mut(), &mut buf);
    assert_eq!(&buf, b"World");

    conn.close().unwrap();
    server.join().unwrap();
}

#[test]
fn test_openssl_engine_verify_rejects_self_signed() {
    init_logging();

    let (cert, key) = self_signed();
    let mut acceptor = SslAcceptor::mozilla_modern_v5(SslMethod::tls()).unwrap();
    acceptor.set_certificate(&cert).unwrap();
    acceptor.set_private_key(&key).unwrap();
    let acceptor = acceptor.build();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (tcp_stream, _) = listener.accept().unwrap();
        // The client aborts the handshake
        assert!(acceptor.accept(tcp_stream).is_err());
    });

    let config = TlsConfig::client()
        .servername("localhost")
        .verify_peer(true)
        .build()
        .unwrap();

    let tcp_stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    let mut conn = OpensslEngine::new().client(Box::new(tcp_stream), &config);

    let err = conn.handshake(&Context::background()).unwrap_err();
    assert!(matches!(err, TlsError::HandshakeFailed(_)));
    assert!(!conn.connection_state().handshake_complete);

    // The peer may already have torn the socket down
    let _ = conn.close();
    server.join().unwrap();
}

#[test]
fn test_openssl_engine_expired_context() {
    init_logging();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let config = TlsConfig::client().build().unwrap();
    let tcp_stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    let mut conn = OpensslEngine::new().client(Box::new(tcp_stream), &config);

    let ctx = Context::background().with_timeout(Duration::ZERO);
    let err = conn.handshake(&ctx).unwrap_err();
    assert!(matches!(err, TlsError::Canceled(ContextError::DeadlineExceeded)));

    drop(listener);
}

#[test]
fn test_openssl_engine_handshake_times_out() {
    init_logging();

    // Peer accepts TCP but never speaks TLS
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let _server = thread::spawn(move || {
        let (_stream, _) = listener.accept().unwrap();
        thread::sleep(Duration::from_secs(2));
    });

    let config = TlsConfig::client().build().unwrap();
    let tcp_stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    let mut conn = OpensslEngine::new().client(Box::new(tcp_stream), &config);

    let ctx = Context::background().with_timeout(Duration::from_millis(200));
    let err = conn.handshake(&ctx).unwrap_err();
    assert!(matches!(err, TlsError::Canceled(ContextError::DeadlineExceeded)));
}
