//! DNS Message Builder
//!
//! Constructs wire-format DNS messages with `hickory-proto`: upstream
//! queries for alias targets, and the responses the listener sends for
//! locally answered names.

use super::record_type_map::RecordTypeMapper;
use hostrelay_domain::{DomainError, LocalAnswer, RecordType};
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA, CNAME, PTR};
use hickory_proto::rr::{DNSClass, Name, RData, Record};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::net::IpAddr;
use std::str::FromStr;

/// Builds DNS messages in wire format
pub struct MessageBuilder;

impl MessageBuilder {
    /// Build a recursive query for `domain` with a random ID.
    pub fn build_query(domain: &str, record_type: &RecordType) -> Result<Vec<u8>, DomainError> {
        Self::build_query_with_id(domain, record_type).map(|(_, bytes)| bytes)
    }

    /// Build a query message and return both its ID and bytes
    ///
    /// Useful when the caller needs the ID for response matching.
    pub fn build_query_with_id(
        domain: &str,
        record_type: &RecordType,
    ) -> Result<(u16, Vec<u8>), DomainError> {
        let mut query = Query::new();
        query.set_name(Self::parse_name(domain)?);
        query.set_query_type(RecordTypeMapper::to_hickory(record_type));
        query.set_query_class(DNSClass::IN);

        let id = fastrand::u16(..);

        let mut message = Message::new(id, MessageType::Query, OpCode::Query);
        message.set_recursion_desired(true);
        message.add_query(query);

        let bytes = Self::serialize_message(&message)?;
        Ok((id, bytes))
    }

    /// Build the reply to `request`: question echoed, AA and RA set, RD
    /// copied from the request.
    pub fn build_response(
        request: &Message,
        code: ResponseCode,
        answers: Vec<Record>,
    ) -> Result<Vec<u8>, DomainError> {
        let mut message = Message::new(request.id(), MessageType::Response, OpCode::Query);
        message.set_authoritative(true);
        message.set_recursion_desired(request.recursion_desired());
        message.set_recursion_available(true);
        message.set_response_code(code);
        for query in request.queries() {
            message.add_query(query.clone());
        }
        for record in answers {
            message.add_answer(record);
        }

        Self::serialize_message(&message)
    }

    /// Convert a local answer into a resource record. IPv6 literals become
    /// AAAA records.
    pub fn local_record(answer: &LocalAnswer) -> Result<Record, DomainError> {
        let record = match answer {
            LocalAnswer::Address { name, address, ttl } => {
                let rdata = match address {
                    IpAddr::V4(v4) => RData::A(A(*v4)),
                    IpAddr::V6(v6) => RData::AAAA(AAAA(*v6)),
                };
                Record::from_rdata(Self::parse_name(name)?, *ttl, rdata)
            }
            LocalAnswer::Alias { name, target, ttl } => Record::from_rdata(
                Self::parse_name(name)?,
                *ttl,
                RData::CNAME(CNAME(Self::parse_name(target)?)),
            ),
            LocalAnswer::Pointer { name, target, ttl } => Record::from_rdata(
                Self::parse_name(name)?,
                *ttl,
                RData::PTR(PTR(Self::parse_name(target)?)),
            ),
        };
        Ok(record)
    }

    /// Names are made fully qualified so the encoder does not append a
    /// search origin.
    fn parse_name(domain: &str) -> Result<Name, DomainError> {
        let mut name = Name::from_str(domain).map_err(|e| {
            DomainError::InvalidDomainName(format!("Invalid domain '{}': {}", domain, e))
        })?;
        name.set_fqdn(true);
        Ok(name)
    }

    /// Serialize a Message to wire format bytes
    fn serialize_message(message: &Message) -> Result<Vec<u8>, DomainError> {
        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);

        message.emit(&mut encoder).map_err(|e| {
            DomainError::InvalidDnsMessage(format!("Failed to serialize DNS message: {}", e))
        })?;

        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_a_query() {
        let bytes = MessageBuilder::build_query("foo.vm", &RecordType::A).unwrap();

        assert!(bytes.len() >= 12, "DNS message too short: {} bytes", bytes.len());
        // Byte 2: QR(1) + Opcode(4) + AA(1) + TC(1) + RD(1)
        assert_eq!(bytes[2] & 0x01, 0x01, "RD flag should be set");
        assert_eq!(bytes[2] & 0x80, 0x00, "QR flag should be clear");
    }

    #[test]
    fn test_build_query_with_id() {
        let (id, bytes) = MessageBuilder::build_query_with_id("test.com", &RecordType::A).unwrap();
        let wire_id = u16::from_be_bytes([bytes[0], bytes[1]]);
        assert_eq!(wire_id, id, "Wire ID should match returned ID");
    }

    #[test]
    fn test_other_type_builds() {
        let result = MessageBuilder::build_query("example.com", &RecordType::Other(15));
        assert!(result.is_ok());
    }

    #[test]
    fn test_local_record_ipv6_becomes_aaaa() {
        let answer = LocalAnswer::address("six.vm", "fd00::1".parse().unwrap());
        let record = MessageBuilder::local_record(&answer).unwrap();
        assert!(matches!(record.data(), RData::AAAA(_)));
        assert_eq!(record.ttl(), 0);
    }

    #[test]
    fn test_local_record_alias() {
        let answer = LocalAnswer::alias("www.vm", "web.vm");
        let record = MessageBuilder::local_record(&answer).unwrap();
        match record.data() {
            RData::CNAME(target) => assert_eq!(target.to_utf8(), "web.vm."),
            other => panic!("expected CNAME, got {:?}", other),
        }
    }

    #[test]
    fn test_build_response_echoes_question() {
        let request_bytes = MessageBuilder::build_query("foo.vm", &RecordType::A).unwrap();
        let request = Message::from_vec(&request_bytes).unwrap();
        let record = MessageBuilder::local_record(&LocalAnswer::address(
            "foo.vm",
            "10.0.2.15".parse().unwrap(),
        ))
        .unwrap();

        let bytes = MessageBuilder::build_response(&request, ResponseCode::NoError, vec![record])
            .unwrap();
        let response = Message::from_vec(&bytes).unwrap();

        assert_eq!(response.id(), request.id());
        assert_eq!(response.message_type(), MessageType::Response);
        assert!(response.authoritative());
        assert!(response.recursion_available());
        assert_eq!(response.queries().len(), 1);
        assert_eq!(response.answers().len(), 1);
    }
}
