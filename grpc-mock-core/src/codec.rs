//! Schema-driven wire codec for methods discovered at runtime.
//!
//! There are no generated message types, so requests and responses travel as
//! [`DynamicMessage`]s shaped by the descriptors the registry collected.

use prost::Message;
use prost_reflect::{DeserializeOptions, DynamicMessage, MessageDescriptor};
use serde_json::Value;
use tonic::codec::{Codec, DecodeBuf, Decoder, EncodeBuf, Encoder};
use tonic::Status;

/// Decodes requests as `request` messages; responses carry their own
/// descriptor and are encoded as-is.
#[derive(Debug, Clone)]
pub struct DynamicCodec {
    request: MessageDescriptor,
}

impl DynamicCodec {
    pub fn new(request: MessageDescriptor) -> Self {
        Self { request }
    }
}

impl Codec for DynamicCodec {
    type Encode = DynamicMessage;
    type Decode = DynamicMessage;
    type Encoder = DynamicEncoder;
    type Decoder = DynamicDecoder;

    fn encoder(&mut self) -> Self::Encoder {
        DynamicEncoder
    }

    fn decoder(&mut self) -> Self::Decoder {
        DynamicDecoder {
            request: self.request.clone(),
        }
    }
}

#[derive(Debug)]
pub struct DynamicEncoder;

impl Encoder for DynamicEncoder {
    type Item = DynamicMessage;
    type Error = Status;

    fn encode(&mut self, item: Self::Item, dst: &mut EncodeBuf<'_>) -> Result<(), Self::Error> {
        item.encode(dst)
            .map_err(|e| Status::internal(format!("encoding response: {e}")))
    }
}

#[derive(Debug)]
pub struct DynamicDecoder {
    request: MessageDescriptor,
}

impl Decoder for DynamicDecoder {
    type Item = DynamicMessage;
    type Error = Status;

    fn decode(&mut self, src: &mut DecodeBuf<'_>) -> Result<Option<Self::Item>, Self::Error> {
        DynamicMessage::decode(self.request.clone(), src)
            .map(Some)
            .map_err(|e| Status::invalid_argument(format!("decoding request: {e}")))
    }
}

/// Build a message of type `descriptor` from a JSON content document.
///
/// Proto and JSON field names are both accepted; unknown fields are ignored.
pub fn json_to_message(
    descriptor: &MessageDescriptor,
    value: Value,
) -> Result<DynamicMessage, serde_json::Error> {
    let options = DeserializeOptions::new().deny_unknown_fields(false);
    DynamicMessage::deserialize_with_options(descriptor.clone(), value, &options)
}
