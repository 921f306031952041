// ---------------------------------------------------------------------------
// NDJSON transport -- one JSON-RPC 2.0 response per line
// ---------------------------------------------------------------------------

use std::io::{self, Write};

use serde::Serialize;

#[derive(Serialize)]
struct Envelope<'a> {
	jsonrpc: &'static str,
	id: u64,
	#[serde(flatten)]
	outcome: Outcome<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum Outcome<'a> {
	Result(serde_json::Value),
	Error(ErrorBody<'a>),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
	code: i32,
	message: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	data: Option<serde_json::Value>,
}

/// Writes responses to stdout unless constructed with another writer.
pub struct NdjsonTransport {
	writer: Box<dyn Write + Send>,
}

impl Default for NdjsonTransport {
	fn default() -> Self {
		Self::new()
	}
}

impl NdjsonTransport {
	pub fn new() -> Self {
		Self::with_writer(Box::new(io::stdout()))
	}

	pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
		Self { writer }
	}

	pub fn write_response(&mut self, id: u64, result: serde_json::Value) {
		self.write_line(&Envelope {
			jsonrpc: "2.0",
			id,
			outcome: Outcome::Result(result),
		});
	}

	pub fn write_error(
		&mut self,
		id: u64,
		code: i32,
		message: impl AsRef<str>,
		data: Option<serde_json::Value>,
	) {
		self.write_line(&Envelope {
			jsonrpc: "2.0",
			id,
			outcome: Outcome::Error(ErrorBody {
				code,
				message: message.as_ref(),
				data,
			}),
		});
	}

	fn write_line(&mut self, envelope: &Envelope<'_>) {
		let mut line = match serde_json::to_vec(envelope) {
			Ok(bytes) => bytes,
			Err(e) => {
				tracing::error!("Failed to serialize response {}: {}", envelope.id, e);
				return;
			}
		};
		line.push(b'\n');
		if let Err(e) = self.writer.write_all(&line).and_then(|_| self.writer.flush()) {
			tracing::error!("Failed to write response {}: {}", envelope.id, e);
		}
	}
}
