use hostrelay_domain::DomainError;
use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::{RData, Record};
use std::net::IpAddr;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DnsResponse {
    pub addresses: Vec<IpAddr>,

    pub rcode: ResponseCode,

    pub truncated: bool,

    pub answers: Vec<Record>,

    pub message: Message,
}

pub struct ResponseParser;

impl ResponseParser {
    pub fn parse(response_bytes: &[u8]) -> Result<DnsResponse, DomainError> {
        let message = Message::from_vec(response_bytes).map_err(|e| {
            DomainError::InvalidDnsResponse(format!("Failed to parse DNS response: {}", e))
        })?;

        let rcode = message.response_code();
        let truncated = message.truncated();

        let mut addresses = Vec::new();
        for record in message.answers() {
            match record.data() {
                RData::A(a) => addresses.push(IpAddr::V4(a.0)),
                RData::AAAA(aaaa) => addresses.push(IpAddr::V6(aaaa.0)),
                _ => {}
            }
        }
        let answers = message.answers().to_vec();

        debug!(
            rcode = ?rcode,
            answers = answers.len(),
            addresses = addresses.len(),
            truncated = truncated,
            "DNS response parsed"
        );

        Ok(DnsResponse {
            addresses,
            rcode,
            truncated,
            answers,
            message,
        })
    }

    /// Reads the TC bit straight from the header without a full decode.
    pub fn is_truncated(response_bytes: &[u8]) -> bool {
        response_bytes.len() >= 12 && response_bytes[2] & 0x02 != 0
    }

    /// Transaction ID from the first two header bytes.
    pub fn message_id(bytes: &[u8]) -> Option<u16> {
        (bytes.len() >= 2).then(|| u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn rcode_to_status(rcode: ResponseCode) -> &'static str {
        match rcode {
            ResponseCode::NoError => "NOERROR",
            ResponseCode::NXDomain => "NXDOMAIN",
            ResponseCode::ServFail => "SERVFAIL",
            ResponseCode::Refused => "REFUSED",
            ResponseCode::NotImp => "NOTIMP",
            ResponseCode::FormErr => "FORMERR",
            _ => "UNKNOWN",
        }
    }
}
