//! Capability dispatch: one ordered table of predicate + handler pairs.
//!
//! A type may advertise several capabilities at once; the first rule in
//! `RULES` whose predicate holds builds the node and no later rule is
//! consulted.
use tracing::debug;

use super::{Sample, Walker};
use crate::error::{Error, Result};
use crate::schema::{SchemaKind, SchemaNode};
use crate::types::{Capabilities, Reflected, Type, Variants};

pub(crate) type Handler = fn(&mut Walker<'_>, &Type, &Sample<'_>) -> Result<SchemaNode>;

pub struct CapabilityRule {
    pub name: &'static str,
    pub applies: fn(&Capabilities) -> bool,
    pub(crate) build: Handler,
}

pub(crate) const RULES: [CapabilityRule; 6] = [
    CapabilityRule { name: "proto_enum", applies: |c| c.proto_enum, build: proto_enum },
    CapabilityRule { name: "one_of", applies: |c| c.one_of.is_some(), build: one_of },
    CapabilityRule { name: "any_of", applies: |c| c.any_of.is_some(), build: any_of },
    CapabilityRule { name: "all_of", applies: |c| c.all_of.is_some(), build: all_of },
    CapabilityRule { name: "implicit", applies: |c| c.implicit.is_some(), build: implicit },
    CapabilityRule { name: "enumerable", applies: |c| c.enumerable.is_some(), build: enumerable },
];

/// Name of the rule that decides how `capabilities` is reflected, if any.
pub fn winning_rule(capabilities: &Capabilities) -> Option<&'static str> {
    RULES.iter().find(|r| (r.applies)(capabilities)).map(|r| r.name)
}

impl Walker<'_> {
    pub(super) fn walk_capabilities(&mut self, ty: &Type, sample: &Sample<'_>) -> Result<Option<SchemaNode>> {
        let Some(rule) = RULES.iter().find(|r| (r.applies)(&ty.capabilities)) else {
            return Ok(None);
        };
        debug!(ty = %ty.display_name(), capability = rule.name, "capability rule");
        (rule.build)(self, ty, sample).map(Some)
    }

    /// Each alternative is walked as a nested (non-root) type.
    fn walk_alternatives(&mut self, variants: Option<Variants>, sample: &Sample<'_>) -> Result<Vec<SchemaNode>> {
        let alternatives = variants.map(|f| f(sample.value())).unwrap_or_default();
        alternatives.into_iter()
            .map(|Reflected { ty, value }| self.walk(&ty, Sample::owned(value), false))
            .collect()
    }
}

// ------------------------------- Handlers -------------------------------- //

/// Code-generated enumerations accept either their name or their number.
fn proto_enum(_: &mut Walker<'_>, _: &Type, _: &Sample<'_>) -> Result<SchemaNode> {
    Ok(SchemaNode {
        one_of: vec![
            SchemaNode::of_kind(SchemaKind::String),
            SchemaNode::of_kind(SchemaKind::Integer),
        ],
        ..SchemaNode::default()
    })
}

fn one_of(walker: &mut Walker<'_>, ty: &Type, sample: &Sample<'_>) -> Result<SchemaNode> {
    let one_of = walker.walk_alternatives(ty.capabilities.one_of, sample)?;
    Ok(SchemaNode { one_of, default: sample.default_literal(), ..SchemaNode::default() })
}

fn any_of(walker: &mut Walker<'_>, ty: &Type, sample: &Sample<'_>) -> Result<SchemaNode> {
    let any_of = walker.walk_alternatives(ty.capabilities.any_of, sample)?;
    Ok(SchemaNode { any_of, default: sample.default_literal(), ..SchemaNode::default() })
}

fn all_of(walker: &mut Walker<'_>, ty: &Type, sample: &Sample<'_>) -> Result<SchemaNode> {
    let all_of = walker.walk_alternatives(ty.capabilities.all_of, sample)?;
    Ok(SchemaNode { all_of, default: sample.default_literal(), ..SchemaNode::default() })
}

fn implicit(walker: &mut Walker<'_>, ty: &Type, sample: &Sample<'_>) -> Result<SchemaNode> {
    let Some(stand_in) = ty.capabilities.implicit else {
        return Err(Error::UnsupportedType { type_name: ty.display_name() });
    };
    let Reflected { ty: inner, value } = stand_in(sample.value());
    walker.walk(&inner, Sample::owned(value), false)
}

/// `enum` of the variant literals, typed after the first variant.
fn enumerable(walker: &mut Walker<'_>, ty: &Type, sample: &Sample<'_>) -> Result<SchemaNode> {
    let variants = ty.capabilities.enumerable.map(|f| f(sample.value())).unwrap_or_default();
    let Some(first) = variants.first() else {
        return Err(Error::EmptyEnum { type_name: ty.display_name() });
    };
    let element = walker.walk(&first.ty, Sample::given(&first.value), false)?;
    Ok(SchemaNode {
        kind: element.kind,
        enum_: variants.iter().map(|v| v.value.to_json()).collect(),
        default: sample.default_literal(),
        ..SchemaNode::default()
    })
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(_: &crate::types::Value) -> Vec<Reflected> { vec![Reflected::of("a")] }

    #[test]
    fn rule_order_is_fixed() {
        let names: Vec<_> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(names, ["proto_enum", "one_of", "any_of", "all_of", "implicit", "enumerable"]);
    }

    #[test]
    fn earlier_capability_wins() {
        let all = Capabilities {
            proto_enum: false,
            one_of: Some(strings),
            any_of: Some(strings),
            all_of: Some(strings),
            implicit: None,
            enumerable: Some(strings),
        };
        assert_eq!(winning_rule(&all), Some("one_of"));
        assert_eq!(winning_rule(&Capabilities { one_of: None, ..all }), Some("any_of"));
        assert_eq!(winning_rule(&Capabilities { proto_enum: true, ..all }), Some("proto_enum"));
        assert_eq!(
            winning_rule(&Capabilities { enumerable: Some(strings), ..Capabilities::default() }),
            Some("enumerable")
        );
        assert_eq!(winning_rule(&Capabilities::default()), None);
    }
}
