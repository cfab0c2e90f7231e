use super::{Sample, Walker};
use crate::error::Result;
use crate::schema::{SchemaKind, SchemaNode};
use crate::types::{Type, Value};

/// Wildcard key pattern for open-ended key/value containers.
pub(crate) const ANY_KEY: &str = ".*";

impl Walker<'_> {
    /// Arrays and slices. Octet slices are binary blobs, not arrays of
    /// small integers; fixed-length arrays (octets included) pin
    /// `minItems`/`maxItems`.
    pub(super) fn walk_sequence(&mut self, elem: &Type, len: Option<usize>, sample: &Sample<'_>) -> Result<SchemaNode> {
        if len.is_none() && elem.is_byte() {
            return Ok(SchemaNode::binary());
        }

        // first element stands for all of them
        let representative = match sample.value() {
            Value::Seq(xs) if !xs.is_empty() => sample.child(&xs[0]),
            _ => Sample::zero(elem),
        };
        let items = self.walk(elem, representative, false)?;

        let len = len.map(|n| n as u64);
        Ok(SchemaNode {
            items: Some(Box::new(items)),
            min_items: len,
            max_items: len,
            ..SchemaNode::of_kind(SchemaKind::Array)
        })
    }

    /// Maps model only their value type; keys are opaque strings.
    pub(super) fn walk_map(&mut self, value: &Type) -> Result<SchemaNode> {
        let inner = self.walk(value, Sample::zero(value), false)?;
        let mut node = SchemaNode::object();
        node.pattern_properties.insert(ANY_KEY.to_string(), inner);
        Ok(node)
    }
}
