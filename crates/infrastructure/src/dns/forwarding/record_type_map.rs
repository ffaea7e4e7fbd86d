//! Mapping between `hostrelay_domain::RecordType` and `hickory_proto::rr::RecordType`.

use hostrelay_domain::RecordType;
use hickory_proto::rr::RecordType as HickoryRecordType;

pub struct RecordTypeMapper;

impl RecordTypeMapper {
    /// Domain → hickory (for building queries)
    pub fn to_hickory(record_type: &RecordType) -> HickoryRecordType {
        match record_type {
            RecordType::A => HickoryRecordType::A,
            RecordType::AAAA => HickoryRecordType::AAAA,
            RecordType::CNAME => HickoryRecordType::CNAME,
            RecordType::PTR => HickoryRecordType::PTR,
            RecordType::Other(code) => HickoryRecordType::from(*code),
        }
    }

    /// Hickory → domain (for incoming queries). Types the responder does not
    /// distinguish keep their wire code.
    pub fn from_hickory(hickory_type: HickoryRecordType) -> RecordType {
        match hickory_type {
            HickoryRecordType::A => RecordType::A,
            HickoryRecordType::AAAA => RecordType::AAAA,
            HickoryRecordType::CNAME => RecordType::CNAME,
            HickoryRecordType::PTR => RecordType::PTR,
            other => RecordType::Other(u16::from(other)),
        }
    }
}
