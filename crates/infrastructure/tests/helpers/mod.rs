mod dns_server_mock;

pub use dns_server_mock::{MockDnsServer, MOCK_ANSWER};
