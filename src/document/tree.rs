//! Flattening of markup trees (XML-style documents).
//!
//! Elements map to named path segments, attributes to `@name` segments and text content
//! to the value of its enclosing element. Sibling elements that share a name can be
//! disambiguated with a [`DuplicatePolicy`], or every child can be named by a
//! caller-supplied function.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::address;
use crate::engine::{empty, failed, single, Entries, Entry, Flatten, Handler};
use crate::error::{FlattenError, Result};
use crate::reflect::Reflect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Document,
    Element,
    Attribute,
    Text,
    CData,
    Comment,
    Other,
}

/// Read access to one node of a markup tree.
pub trait MarkupNode: Reflect + Sized {
    fn node_type(&self) -> NodeType;

    /// Tag or attribute name; `#text` for text nodes.
    fn name(&self) -> &str;

    /// Attribute value or character content.
    fn value(&self) -> Option<&str>;

    fn attributes(&self) -> Vec<&Self>;

    fn children(&self) -> Vec<&Self>;

    /// Whether an element was written in self-closing form.
    fn is_empty_tag(&self) -> bool;

    /// The root element of a document node.
    fn document_element(&self) -> Option<&Self>;
}

/// Whether an element with no element or text children is reported as an empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeafReporting {
    /// Never.
    None,
    /// Only when it has no attributes and was not self-closing.
    EmptyIfNoAttributesAndNotEmptyTag,
    /// Only when it has no attributes.
    #[default]
    EmptyIfNoAttributes,
    Always,
}

mode_names!(LeafReporting, "leaf reporting mode", {
    None => "none",
    EmptyIfNoAttributesAndNotEmptyTag => "empty-if-no-attributes-and-not-empty-tag",
    EmptyIfNoAttributes => "empty-if-no-attributes",
    Always => "always",
});

/// Naming of sibling elements that share a name, under standard naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Keep the shared name; addresses repeat.
    #[default]
    ReportAsIs,
    /// `name[i]`, counting within the group from zero.
    AppendZeroBased,
    /// `name[i]`, counting within the group from one.
    AppendOneBased,
    /// Leave every member of the group out.
    Skip,
    /// Report a duplicate-name error at the first member of the group.
    Fail,
}

mode_names!(DuplicatePolicy, "duplicate policy", {
    ReportAsIs => "report-as-is",
    AppendZeroBased => "append-zero-based",
    AppendOneBased => "append-one-based",
    Skip => "skip",
    Fail => "fail",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeNaming {
    #[default]
    Standard,
    /// Every child is named by the handler's naming function.
    Custom,
}

mode_names!(NodeNaming, "node naming mode", {
    Standard => "standard",
    Custom => "custom",
});

/// Names a child node from the parent address, the child and all processable siblings.
pub type NodeNamer<N> = Arc<dyn Fn(&str, &N, &[&N]) -> String + Send + Sync>;

/// Flattens markup trees whose nodes are exactly of type `N`.
pub struct TreeHandler<N> {
    separator: String,
    leaf_reporting: LeafReporting,
    duplicates: DuplicatePolicy,
    naming: NodeNaming,
    namer: Option<NodeNamer<N>>,
}

/// Configures a [`TreeHandler`]; [`TreeHandlerBuilder::build`] checks the combination.
pub struct TreeHandlerBuilder<N> {
    separator: String,
    leaf_reporting: LeafReporting,
    duplicates: DuplicatePolicy,
    naming: NodeNaming,
    namer: Option<NodeNamer<N>>,
}

impl<N: MarkupNode> TreeHandlerBuilder<N> {
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn leaf_reporting(mut self, mode: LeafReporting) -> Self {
        self.leaf_reporting = mode;
        self
    }

    pub fn duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn naming(mut self, mode: NodeNaming) -> Self {
        self.naming = mode;
        self
    }

    /// The function used by [`NodeNaming::Custom`].
    pub fn namer(mut self, namer: impl Fn(&str, &N, &[&N]) -> String + Send + Sync + 'static) -> Self {
        self.namer = Some(Arc::new(namer));
        self
    }

    pub fn build(self) -> Result<TreeHandler<N>> {
        if self.naming == NodeNaming::Custom && self.namer.is_none() {
            return Err(FlattenError::configuration(
                "node naming mode 'custom' requires a naming function",
            ));
        }
        debug!(
            separator = %self.separator,
            leaf_reporting = %self.leaf_reporting,
            duplicates = %self.duplicates,
            naming = %self.naming,
            "Configured tree handler"
        );
        Ok(TreeHandler {
            separator: self.separator,
            leaf_reporting: self.leaf_reporting,
            duplicates: self.duplicates,
            naming: self.naming,
            namer: self.namer,
        })
    }
}

impl<N: MarkupNode> TreeHandler<N> {
    /// Standard naming, `.` separator and default reporting.
    pub fn new() -> Self {
        TreeHandler {
            separator: address::DEFAULT_SEPARATOR.to_string(),
            leaf_reporting: LeafReporting::default(),
            duplicates: DuplicatePolicy::default(),
            naming: NodeNaming::default(),
            namer: None,
        }
    }

    pub fn builder() -> TreeHandlerBuilder<N> {
        TreeHandlerBuilder {
            separator: address::DEFAULT_SEPARATOR.to_string(),
            leaf_reporting: LeafReporting::default(),
            duplicates: DuplicatePolicy::default(),
            naming: NodeNaming::default(),
            namer: None,
        }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn leaf_reporting(&self) -> LeafReporting {
        self.leaf_reporting
    }

    pub fn duplicates(&self) -> DuplicatePolicy {
        self.duplicates
    }

    pub fn naming(&self) -> NodeNaming {
        self.naming
    }

    fn element<'a>(&'a self, engine: &'a dyn Flatten, prefix: String, node: &'a N) -> Entries<'a> {
        let attributes = node.attributes();
        let has_attributes = !attributes.is_empty();
        let attribute_prefix = prefix.clone();
        let attribute_entries = attributes.into_iter().flat_map(move |attr| {
            engine.flatten(
                address::attribute(&attribute_prefix, &self.separator, attr.name()),
                attr,
            )
        });

        let children: Vec<&'a N> = node
            .children()
            .into_iter()
            .filter(|child| matches!(child.node_type(), NodeType::Element | NodeType::Text))
            .collect();

        if self.naming == NodeNaming::Standard
            && children.len() == 1
            && children[0].node_type() == NodeType::Text
        {
            return Box::new(attribute_entries.chain(engine.flatten(prefix, children[0])));
        }

        if children.is_empty() {
            let report = match self.leaf_reporting {
                LeafReporting::None => false,
                LeafReporting::EmptyIfNoAttributesAndNotEmptyTag => {
                    !has_attributes && !node.is_empty_tag()
                }
                LeafReporting::EmptyIfNoAttributes => !has_attributes,
                LeafReporting::Always => true,
            };
            let leaf = report.then(|| Ok(Entry::owned(prefix, String::new())));
            return Box::new(attribute_entries.chain(leaf));
        }

        let named = self.name_children(&prefix, &children);
        Box::new(attribute_entries.chain(named.into_iter().flat_map(move |named| match named {
            Ok((child_address, child)) => engine.flatten(child_address, child),
            Err(err) => failed(err),
        })))
    }

    /// Addresses for each processable child, in document order. A naming failure is
    /// recorded in place and ends the list.
    fn name_children<'a>(&self, prefix: &str, children: &[&'a N]) -> Vec<Result<(String, &'a N)>> {
        let mut named = Vec::with_capacity(children.len());

        match self.naming {
            NodeNaming::Custom => {
                let Some(namer) = &self.namer else {
                    named.push(Err(FlattenError::configuration(
                        "node naming mode 'custom' requires a naming function",
                    )));
                    return named;
                };
                for &child in children {
                    let name = namer(prefix, child, children);
                    named.push(Ok((address::member_with(prefix, &self.separator, &name), child)));
                }
            }
            NodeNaming::Standard => {
                let mut group_sizes: HashMap<&str, usize> = HashMap::new();
                for child in children {
                    *group_sizes.entry(child.name()).or_default() += 1;
                }

                let mut positions: HashMap<&str, usize> = HashMap::new();
                for &child in children {
                    let name = child.name();
                    let counter = positions.entry(name).or_default();
                    let position = *counter;
                    *counter += 1;

                    let output = if group_sizes.get(name).copied().unwrap_or(0) > 1 {
                        match self.duplicates {
                            DuplicatePolicy::ReportAsIs => name.to_string(),
                            DuplicatePolicy::AppendZeroBased => format!("{}[{}]", name, position),
                            DuplicatePolicy::AppendOneBased => format!("{}[{}]", name, position + 1),
                            DuplicatePolicy::Skip => continue,
                            DuplicatePolicy::Fail => {
                                named.push(Err(FlattenError::duplicate_name(prefix, name)));
                                break;
                            }
                        }
                    } else {
                        name.to_string()
                    };
                    named.push(Ok((address::member_with(prefix, &self.separator, &output), child)));
                }
            }
        }

        named
    }
}

impl<N: MarkupNode> Default for TreeHandler<N> {
    fn default() -> Self {
        TreeHandler::new()
    }
}

impl<N: MarkupNode> Handler for TreeHandler<N> {
    fn can_handle(&self, _prefix: &str, value: &dyn Reflect) -> bool {
        value.is::<N>()
    }

    fn process<'a>(
        &'a self,
        engine: &'a dyn Flatten,
        prefix: String,
        value: &'a dyn Reflect,
    ) -> Entries<'a> {
        let Some(node) = value.downcast_ref::<N>() else {
            return empty();
        };

        match node.node_type() {
            NodeType::Document => match node.document_element() {
                Some(root) => engine.flatten(
                    address::member_with(&prefix, &self.separator, root.name()),
                    root,
                ),
                None => empty(),
            },
            NodeType::Attribute | NodeType::Text => single(Entry::owned(
                prefix,
                node.value().unwrap_or_default().to_string(),
            )),
            NodeType::Element => self.element(engine, prefix, node),
            NodeType::CData | NodeType::Comment | NodeType::Other => empty(),
        }
    }
}
