//! TLS engine abstraction and its stub
//!
//! An engine turns a plain [`Conn`] plus a [`TlsConfig`] into a [`TlsConn`],
//! and reports its name and the client fingerprint it parrots (if any).
//!
//! Other crates often declare their own engine trait with the same shape but
//! their own connection type. [`FuncTlsEngine`] is generic over the value its
//! `client` callback returns (and over the connection and configuration
//! types it accepts), and [`impl_tls_engine!`](crate::impl_tls_engine) wires
//! it to any such trait without that crate depending on [`TlsEngine`].
//!
//! ```
//! use tlsstub::net::Conn;
//! use tlsstub::tls::{FuncTlsConn, FuncTlsEngine, TlsConfig};
//!
//! // Declared by some consumer crate.
//! pub trait ProxyEngine {
//!     fn client(&self, conn: Box<dyn Conn>, config: &TlsConfig) -> FuncTlsConn;
//!     fn name(&self) -> String;
//!     fn parrot(&self) -> String;
//! }
//!
//! tlsstub::impl_tls_engine!(ProxyEngine, FuncTlsConn);
//!
//! let engine: Box<dyn ProxyEngine> = Box::new(
//!     FuncTlsEngine::new()
//!         .on_client(|_conn, _config| FuncTlsConn::default())
//!         .on_name(|| "stub".to_string())
//!         .on_parrot(|| "Firefox/121".to_string()),
//! );
//! assert_eq!(engine.parrot(), "Firefox/121");
//! ```

use super::config::TlsConfig;
use super::conn::TlsConn;
use crate::net::Conn;
use crate::slot;
use std::fmt;

/// Factory for TLS client connections
///
/// There is no single standard engine type across TLS libraries; this trait
/// is the common denominator: build a client connection, name the
/// implementation, and report the parroted client fingerprint.
pub trait TlsEngine: Send + Sync {
    /// Wrap `conn` in a TLS client connection configured by `config`
    ///
    /// No I/O happens here; the handshake runs on
    /// [`TlsConn::handshake`] or on first read/write.
    fn client(&self, conn: Box<dyn Conn>, config: &TlsConfig) -> Box<dyn TlsConn>;

    /// Engine name
    fn name(&self) -> String;

    /// Fingerprint of the client this engine emulates, or `""` for none
    fn parrot(&self) -> String;
}

type ClientFn<T, C, Cfg> = dyn Fn(C, &Cfg) -> T + Send + Sync;
type StringFn = dyn Fn() -> String + Send + Sync;

/// Stub TLS engine
///
/// `T` is what [`client`](Self::client) returns, `C` the connection it
/// accepts and `Cfg` the configuration type. The defaults match
/// [`TlsEngine`]; `FuncTlsEngine<Box<dyn TlsConn>>` implements it.
///
/// Each method calls its configured callback; an unconfigured callback
/// panics when invoked.
pub struct FuncTlsEngine<T, C = Box<dyn Conn>, Cfg = TlsConfig> {
    client: Option<Box<ClientFn<T, C, Cfg>>>,
    name: Option<Box<StringFn>>,
    parrot: Option<Box<StringFn>>,
}

impl<T> FuncTlsEngine<T> {
    /// Create a stub for the default connection and configuration types
    ///
    /// Use [`Default::default`] for other connection or configuration types.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T, C, Cfg> FuncTlsEngine<T, C, Cfg> {
    /// Configure [`client`](Self::client)
    pub fn on_client<F>(mut self, f: F) -> Self
    where
        F: Fn(C, &Cfg) -> T + Send + Sync + 'static,
    {
        self.client = Some(Box::new(f));
        self
    }

    /// Configure [`name`](Self::name)
    pub fn on_name<F>(mut self, f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.name = Some(Box::new(f));
        self
    }

    /// Configure [`parrot`](Self::parrot)
    pub fn on_parrot<F>(mut self, f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.parrot = Some(Box::new(f));
        self
    }

    /// Build a client connection through the configured callback
    ///
    /// `conn` and `config` are handed over untouched and the callback's
    /// result is returned as-is.
    #[track_caller]
    pub fn client(&self, conn: C, config: &Cfg) -> T {
        log::trace!("FuncTlsEngine::client");
        slot::get(&self.client, "FuncTlsEngine", "client")(conn, config)
    }

    /// Engine name, from the configured callback
    #[track_caller]
    pub fn name(&self) -> String {
        log::trace!("FuncTlsEngine::name");
        slot::get(&self.name, "FuncTlsEngine", "name")()
    }

    /// Parroted fingerprint, from the configured callback
    ///
    /// An empty string is a valid answer meaning "no parroting".
    #[track_caller]
    pub fn parrot(&self) -> String {
        log::trace!("FuncTlsEngine::parrot");
        slot::get(&self.parrot, "FuncTlsEngine", "parrot")()
    }
}

impl<T, C, Cfg> Default for FuncTlsEngine<T, C, Cfg> {
    fn default() -> Self {
        FuncTlsEngine {
            client: None,
            name: None,
            parrot: None,
        }
    }
}

impl<T, C, Cfg> fmt::Debug for FuncTlsEngine<T, C, Cfg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncTlsEngine")
            .field("client", &slot::state(&self.client))
            .field("name", &slot::state(&self.name))
            .field("parrot", &slot::state(&self.parrot))
            .finish()
    }
}

/// Implement an engine trait for [`FuncTlsEngine`]
///
/// The target trait must have the [`TlsEngine`] shape:
/// `fn client(&self, conn: C, config: &Cfg) -> T`, `fn name(&self) -> String`
/// and `fn parrot(&self) -> String`. Because the trait belongs to the
/// invoking crate, the orphan rule allows the impl.
///
/// ```ignore
/// // Default connection (`Box<dyn Conn>`) and configuration (`TlsConfig`)
/// impl_tls_engine!(my::Engine, my::Conn);
///
/// // Custom output, connection and configuration types
/// impl_tls_engine!(my::Engine, my::Conn, my::Stream, my::Config);
/// ```
#[macro_export]
macro_rules! impl_tls_engine {
    ($engine:path, $out:ty, $conn:ty, $config:ty) => {
        impl $engine for $crate::tls::FuncTlsEngine<$out, $conn, $config> {
            #[track_caller]
            fn client(&self, conn: $conn, config: &$config) -> $out {
                $crate::tls::FuncTlsEngine::client(self, conn, config)
            }

            #[track_caller]
            fn name(&self) -> ::std::string::String {
                $crate::tls::FuncTlsEngine::name(self)
            }

            #[track_caller]
            fn parrot(&self) -> ::std::string::String {
                $crate::tls::FuncTlsEngine::parrot(self)
            }
        }
    };
    ($engine:path, $out:ty) => {
        $crate::impl_tls_engine!(
            $engine,
            $out,
            ::std::boxed::Box<dyn $crate::net::Conn>,
            $crate::tls::TlsConfig
        );
    };
}

crate::impl_tls_engine!(TlsEngine, Box<dyn TlsConn>);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::net::FuncConn;
    use crate::tls::{ConnectionState, FuncTlsConn};
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    fn test_config() -> TlsConfig {
        TlsConfig::client().servername("example.com").build().unwrap()
    }

    #[test]
    fn test_func_tls_engine() {
        let engine = FuncTlsEngine::new()
            .on_client(|_conn, _config| {
                Box::new(
                    FuncTlsConn::default()
                        .on_connection_state(|| ConnectionState {
                            negotiated_protocol: Some("h2".to_string()),
                            ..ConnectionState::default()
                        })
                        .on_handshake(|_| Ok(())),
                ) as Box<dyn TlsConn>
            })
            .on_name(|| "test-engine".to_string())
            .on_parrot(|| "Chrome/120".to_string());

        assert_eq!(engine.name(), "test-engine");
        assert_eq!(engine.parrot(), "Chrome/120");

        let mut conn = engine.client(Box::new(FuncConn::new()), &test_config());
        conn.handshake(&Context::background()).unwrap();
        assert_eq!(
            conn.connection_state().negotiated_protocol.as_deref(),
            Some("h2")
        );
    }

    #[test]
    fn test_func_tls_engine_forwards_arguments() {
        let seen = Arc::new(Mutex::new(None));
        let record = seen.clone();
        let engine: FuncTlsEngine<Box<dyn TlsConn>> =
            FuncTlsEngine::new().on_client(move |conn: Box<dyn Conn>, config: &TlsConfig| {
                *record.lock().unwrap() = Some((
                    conn.remote_addr().unwrap(),
                    config.servername().map(str::to_string),
                ));
                Box::new(FuncTlsConn::default()) as Box<dyn TlsConn>
            });

        let remote: SocketAddr = "93.184.216.34:443".parse().unwrap();
        let conn = FuncConn::new().on_remote_addr(move || Ok(remote));
        let _ = TlsEngine::client(&engine, Box::new(conn), &test_config());

        assert_eq!(
            *seen.lock().unwrap(),
            Some((remote, Some("example.com".to_string())))
        );
    }

    #[test]
    fn test_func_tls_engine_empty_parrot() {
        let engine: FuncTlsEngine<Option<FuncTlsConn>> = FuncTlsEngine::new()
            .on_client(|_conn, _config| None)
            .on_name(|| "stdlib".to_string())
            .on_parrot(String::new);

        let parrot = engine.parrot();
        assert_eq!(parrot, "");
        assert_ne!(parrot, "Chrome/120");
        assert!(engine.client(Box::new(FuncConn::new()), &test_config()).is_none());
    }

    #[test]
    fn test_func_tls_engine_as_trait_object() {
        let engine: Arc<dyn TlsEngine> = Arc::new(
            FuncTlsEngine::<Box<dyn TlsConn>>::new()
                .on_client(|_conn, _config| Box::new(FuncTlsConn::default()) as Box<dyn TlsConn>)
                .on_name(|| "shared".to_string())
                .on_parrot(String::new),
        );

        let worker = {
            let engine = engine.clone();
            std::thread::spawn(move || engine.name())
        };
        assert_eq!(worker.join().unwrap(), "shared");
        assert_eq!(engine.parrot(), "");
    }

    #[test]
    fn test_func_tls_engine_custom_types() {
        let engine: FuncTlsEngine<usize, Vec<u8>, String> =
            FuncTlsEngine::default().on_client(|conn: Vec<u8>, config: &String| conn.len() + config.len());

        assert_eq!(engine.client(vec![0; 3], &"abcd".to_string()), 7);
    }

    #[test]
    #[should_panic(expected = "FuncTlsEngine: no `client` callback configured")]
    fn test_unconfigured_client_panics() {
        let engine: FuncTlsEngine<Box<dyn TlsConn>> = FuncTlsEngine::new()
            .on_name(|| "test-engine".to_string())
            .on_parrot(String::new);
        let _ = TlsEngine::client(&engine, Box::new(FuncConn::new()), &test_config());
    }

    #[test]
    #[should_panic(expected = "FuncTlsEngine: no `name` callback configured")]
    fn test_unconfigured_name_panics() {
        let engine: FuncTlsEngine<Box<dyn TlsConn>> = FuncTlsEngine::new();
        engine.name();
    }

    #[test]
    #[should_panic(expected = "FuncTlsEngine: no `parrot` callback configured")]
    fn test_unconfigured_parrot_panics() {
        let engine: FuncTlsEngine<Box<dyn TlsConn>> = FuncTlsEngine::new();
        engine.parrot();
    }

    #[test]
    fn test_debug_lists_slots() {
        let engine: FuncTlsEngine<()> = FuncTlsEngine::new().on_name(|| "x".to_string());
        let debug = format!("{:?}", engine);
        assert!(debug.contains("name: \"configured\""));
        assert!(debug.contains("client: \"unset\""));
    }
}
