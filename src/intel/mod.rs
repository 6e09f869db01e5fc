//! Domain intelligence adapters.
//!
//! The lookup mechanics (WHOIS/RDAP fallback chains, TLS handshakes,
//! geo-IP) live behind a service endpoint; this module only knows how to
//! ask it for the fixed snapshot shape.

mod http;

pub use http::HttpDomainIntel;
