use crate::dns::forwarding::{MessageBuilder, RecordTypeMapper, ResponseParser};
use hostrelay_application::use_cases::{HandleDnsQueryUseCase, QueryOutcome};
use hostrelay_domain::{DnsQuery, DomainError, LocalAnswer};
use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::Record;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Turns raw query bytes into raw reply bytes. `None` means nothing is sent
/// back: the input was not a decodable query, or no upstream answered.
pub struct DnsServerHandler {
    use_case: Arc<HandleDnsQueryUseCase>,
}

impl DnsServerHandler {
    pub fn new(use_case: Arc<HandleDnsQueryUseCase>) -> Self {
        Self { use_case }
    }

    pub async fn handle_raw(&self, request_bytes: &[u8]) -> Option<Vec<u8>> {
        let request = match Message::from_vec(request_bytes) {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, len = request_bytes.len(), "Dropping undecodable packet");
                return None;
            }
        };

        if request.message_type() != MessageType::Query {
            debug!(id = request.id(), "Dropping packet that is not a query");
            return None;
        }

        let Some(question) = request.queries().first() else {
            debug!(id = request.id(), "Dropping query without a question");
            return None;
        };

        let query = DnsQuery::new(
            question.name().to_utf8(),
            RecordTypeMapper::from_hickory(question.query_type()),
        );

        info!(domain = %query.domain, record_type = %query.record_type, "DNS query received");

        let outcome = match self.use_case.execute(&query, request_bytes).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_upstream_unavailable() => {
                warn!(domain = %query.domain, error = %e, "No upstream answered, dropping query");
                return None;
            }
            Err(e @ DomainError::ResolutionCycle { .. }) => {
                warn!(domain = %query.domain, error = %e, "Alias loop in host table");
                return self.reply(&request, ResponseCode::ServFail, Vec::new());
            }
            Err(e) => {
                error!(domain = %query.domain, error = %e, "Query resolution failed");
                return self.reply(&request, ResponseCode::ServFail, Vec::new());
            }
        };

        match outcome {
            QueryOutcome::Local(answers) => match local_records(&answers) {
                Ok(records) => self.reply(&request, ResponseCode::NoError, records),
                Err(e) => {
                    error!(domain = %query.domain, error = %e, "Local answer is not encodable");
                    self.reply(&request, ResponseCode::ServFail, Vec::new())
                }
            },
            QueryOutcome::Forwarded(bytes) => Some(bytes),
            QueryOutcome::Chained { answers, upstream } => {
                let mut records = match local_records(&answers) {
                    Ok(records) => records,
                    Err(e) => {
                        error!(domain = %query.domain, error = %e, "Local answer is not encodable");
                        return self.reply(&request, ResponseCode::ServFail, Vec::new());
                    }
                };

                let code = match ResponseParser::parse(&upstream) {
                    Ok(response) => {
                        debug!(
                            domain = %query.domain,
                            status = ResponseParser::rcode_to_status(response.rcode),
                            upstream_answers = response.answers.len(),
                            "Appending upstream answers to local chain"
                        );
                        records.extend(response.answers);
                        response.rcode
                    }
                    Err(e) => {
                        warn!(domain = %query.domain, error = %e, "Unparsable upstream answer, keeping local chain");
                        ResponseCode::NoError
                    }
                };

                self.reply(&request, code, records)
            }
        }
    }

    fn reply(&self, request: &Message, code: ResponseCode, answers: Vec<Record>) -> Option<Vec<u8>> {
        match MessageBuilder::build_response(request, code, answers) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!(id = request.id(), error = %e, "Failed to encode response");
                None
            }
        }
    }
}

fn local_records(answers: &[LocalAnswer]) -> Result<Vec<Record>, DomainError> {
    answers.iter().map(MessageBuilder::local_record).collect()
}
