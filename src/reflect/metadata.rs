use crate::schema::SchemaKind;
use crate::schema::SchemaNode;
use crate::tags::FieldDescriptor;

/// Copy a member's descriptor onto its node.
///
/// `title` always lands. Validation attributes only land on nodes of the
/// matching kind: length/format on strings, range/multiple on numbers and
/// integers, item counts/uniqueness on arrays. Anything else is dropped.
/// Bounds the descriptor leaves unset keep whatever the node already had.
pub fn apply_metadata(node: &mut SchemaNode, descriptor: &FieldDescriptor) {
    node.title = descriptor.title.clone();

    match node.kind {
        Some(SchemaKind::String) => {
            node.min_length = descriptor.min_length.or(node.min_length);
            node.max_length = descriptor.max_length.or(node.max_length);
            if let Some(format) = &descriptor.format {
                node.format = Some(format.clone());
            }
        }
        Some(kind) if kind.is_numeric() => {
            node.multiple_of = descriptor.multiple_of.or(node.multiple_of);
            node.minimum = descriptor.minimum.or(node.minimum);
            node.maximum = descriptor.maximum.or(node.maximum);
            if descriptor.exclusive_minimum { node.exclusive_minimum = Some(true); }
            if descriptor.exclusive_maximum { node.exclusive_maximum = Some(true); }
        }
        Some(SchemaKind::Array) => {
            node.min_items = descriptor.min_items.or(node.min_items);
            node.max_items = descriptor.max_items.or(node.max_items);
            if descriptor.unique_items { node.unique_items = Some(true); }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> FieldDescriptor {
        FieldDescriptor::parse(
            r#"json:"x" title:"X" jsonschema:"minLength=1,maxLength=20,format=email,minimum=18,maximum=120,exclusiveMinimum,minItems=2,uniqueItems""#,
        )
    }

    #[test]
    fn string_takes_only_string_constraints() {
        let mut node = SchemaNode::of_kind(SchemaKind::String);
        apply_metadata(&mut node, &descriptor());
        assert_eq!(node.title.as_deref(), Some("X"));
        assert_eq!((node.min_length, node.max_length), (Some(1), Some(20)));
        assert_eq!(node.format.as_deref(), Some("email"));
        assert_eq!((node.minimum, node.min_items, node.unique_items), (None, None, None));
    }

    #[test]
    fn integer_ignores_string_constraints() {
        let mut node = SchemaNode::of_kind(SchemaKind::Integer);
        apply_metadata(&mut node, &descriptor());
        assert_eq!((node.minimum, node.maximum), (Some(18), Some(120)));
        assert_eq!(node.exclusive_minimum, Some(true));
        assert_eq!(node.exclusive_maximum, None);
        assert_eq!((node.max_length, node.format), (None, None));
    }

    #[test]
    fn array_keeps_fixed_length_when_tag_is_silent() {
        let mut node = SchemaNode { min_items: Some(4), max_items: Some(4), ..SchemaNode::of_kind(SchemaKind::Array) };
        apply_metadata(&mut node, &FieldDescriptor::parse(r#"json:"xs" uniqueItems:"true""#));
        assert_eq!((node.min_items, node.max_items), (Some(4), Some(4)));
        assert_eq!(node.unique_items, Some(true));
    }

    #[test]
    fn reference_only_gets_title() {
        let mut node = SchemaNode::reference("Grandfather");
        apply_metadata(&mut node, &descriptor());
        assert_eq!(node.title.as_deref(), Some("X"));
        assert_eq!(node, SchemaNode { title: Some("X".into()), ..SchemaNode::reference("Grandfather") });
    }

    #[test]
    fn format_tag_overrides_well_known_format() {
        let mut node = SchemaNode::formatted_string("date-time");
        apply_metadata(&mut node, &FieldDescriptor::parse(r#"json:"d" jsonschema:"format=date""#));
        assert_eq!(node.format.as_deref(), Some("date"));
    }
}
