//! Records: one object node per named record, registered by canonical name.
//!
//! Nested records are walked once and referenced everywhere else; the root
//! record stays inline. Embedded members fold their properties into the
//! enclosing node and never become a definition of their own.
use tracing::trace;

use super::{Sample, Walker, metadata};
use crate::error::{Error, Result};
use crate::schema::SchemaNode;
use crate::types::{Kind, RecordType, Type, Value};

impl Walker<'_> {
    pub(super) fn walk_record(&mut self, record: &RecordType, sample: &Sample<'_>, is_root: bool) -> Result<SchemaNode> {
        let name = record.name.as_ref();
        if !is_root {
            if let Some(reference) = self.registry.reference(name) {
                return Ok(reference);
            }
        }
        // reserved up front so self references resolve to it
        self.registry.reserve(name);

        let mut node = SchemaNode { additional_properties: self.additional_properties, ..SchemaNode::object() };
        // each record starts its own embedding chain; enclosing records are not part of it
        let outer = std::mem::replace(&mut self.embedding, vec![name.to_string()]);
        let members = self.collect_members(&mut node, record, sample);
        self.embedding = outer;
        members?;

        if is_root {
            self.registry.release(name, &node)?;
            Ok(node)
        } else {
            self.registry.fill(name, node)
        }
    }

    fn collect_members(&mut self, node: &mut SchemaNode, record: &RecordType, sample: &Sample<'_>) -> Result<()> {
        for field in &record.fields {
            if !field.is_public() {
                trace!(record = %record.name, member = %field.ident, "skip private member");
                continue;
            }
            let ty = (field.ty)();
            let member = sample.member(&field.ident, &ty);

            if field.embedded {
                self.splice_embedded(node, record, &field.ident, &ty, member)?;
                continue;
            }

            let descriptor = self.reader.read(field);
            if descriptor.is_skipped() {
                trace!(record = %record.name, member = %field.ident, "skip unnamed or ignored member");
                continue;
            }

            let mut child = self.walk(&ty, member, false)?;
            metadata::apply_metadata(&mut child, &descriptor);
            node.properties.insert(descriptor.name.clone(), child);
            if descriptor.required {
                node.require(&descriptor.name);
            }
        }
        Ok(())
    }

    /// Fold an embedded record's members straight into `node`.
    fn splice_embedded(
        &mut self,
        node: &mut SchemaNode,
        outer: &RecordType,
        ident: &str,
        ty: &Type,
        sample: Sample<'_>,
    ) -> Result<()> {
        let mut ty = ty;
        let mut sample = sample.conform(ty);
        while let Kind::Optional(inner) = &ty.kind {
            if matches!(sample.value(), Value::Null) {
                sample = Sample::zero(inner);
            }
            ty = inner.as_ref();
        }
        let Kind::Record(embedded) = &ty.kind else {
            return Err(Error::EmbeddedNotRecord {
                record: outer.name.to_string(),
                member: ident.to_string(),
            });
        };
        if self.embedding.iter().any(|n| n == embedded.name.as_ref()) {
            trace!(record = %outer.name, member = ident, "embedding cycle cut");
            return Ok(());
        }
        self.embedding.push(embedded.name.to_string());
        self.collect_members(node, embedded, &sample)?;
        self.embedding.pop();
        Ok(())
    }
}
