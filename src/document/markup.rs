//! An in-memory markup tree implementing [`MarkupNode`].

use super::tree::{MarkupNode, NodeType};

/// A node of an XML-style document.
///
/// Built with the chaining constructors:
///
/// ```rust
/// use objflat::document::XmlNode;
///
/// let doc = XmlNode::document(
///     XmlNode::element("order")
///         .attr("id", "17")
///         .child(XmlNode::element("note").with_text("fragile"))
///         .child(XmlNode::empty_element("gift")),
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Document {
        root: Box<XmlNode>,
    },
    Element {
        name: String,
        attributes: Vec<XmlNode>,
        children: Vec<XmlNode>,
        /// Written in self-closing form (`<a/>`).
        empty_tag: bool,
    },
    Attribute {
        name: String,
        value: String,
    },
    Text(String),
    CData(String),
    Comment(String),
}

crate::reflect_value!(XmlNode);

impl XmlNode {
    pub fn document(root: XmlNode) -> Self {
        XmlNode::Document {
            root: Box::new(root),
        }
    }

    /// An element written with an explicit end tag.
    pub fn element(name: impl Into<String>) -> Self {
        XmlNode::Element {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            empty_tag: false,
        }
    }

    /// A self-closing element.
    pub fn empty_element(name: impl Into<String>) -> Self {
        XmlNode::Element {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            empty_tag: true,
        }
    }

    pub fn attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        XmlNode::Attribute {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        XmlNode::Text(content.into())
    }

    pub fn cdata(content: impl Into<String>) -> Self {
        XmlNode::CData(content.into())
    }

    pub fn comment(content: impl Into<String>) -> Self {
        XmlNode::Comment(content.into())
    }

    /// Adds an attribute. No effect on anything but an element.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let XmlNode::Element { attributes, .. } = &mut self {
            attributes.push(XmlNode::attribute(name, value));
        }
        self
    }

    /// Appends a child node. An element with children is no longer self-closing.
    pub fn child(mut self, node: XmlNode) -> Self {
        if let XmlNode::Element {
            children,
            empty_tag,
            ..
        } = &mut self
        {
            children.push(node);
            *empty_tag = false;
        }
        self
    }

    pub fn with_text(self, content: impl Into<String>) -> Self {
        self.child(XmlNode::text(content))
    }
}

impl MarkupNode for XmlNode {
    fn node_type(&self) -> NodeType {
        match self {
            XmlNode::Document { .. } => NodeType::Document,
            XmlNode::Element { .. } => NodeType::Element,
            XmlNode::Attribute { .. } => NodeType::Attribute,
            XmlNode::Text(_) => NodeType::Text,
            XmlNode::CData(_) => NodeType::CData,
            XmlNode::Comment(_) => NodeType::Comment,
        }
    }

    fn name(&self) -> &str {
        match self {
            XmlNode::Document { .. } => "#document",
            XmlNode::Element { name, .. } | XmlNode::Attribute { name, .. } => name.as_str(),
            XmlNode::Text(_) => "#text",
            XmlNode::CData(_) => "#cdata-section",
            XmlNode::Comment(_) => "#comment",
        }
    }

    fn value(&self) -> Option<&str> {
        match self {
            XmlNode::Attribute { value, .. } => Some(value.as_str()),
            XmlNode::Text(content) | XmlNode::CData(content) | XmlNode::Comment(content) => {
                Some(content.as_str())
            }
            XmlNode::Document { .. } | XmlNode::Element { .. } => None,
        }
    }

    fn attributes(&self) -> Vec<&Self> {
        match self {
            XmlNode::Element { attributes, .. } => attributes.iter().collect(),
            _ => Vec::new(),
        }
    }

    fn children(&self) -> Vec<&Self> {
        match self {
            XmlNode::Element { children, .. } => children.iter().collect(),
            XmlNode::Document { root } => vec![root.as_ref()],
            _ => Vec::new(),
        }
    }

    fn is_empty_tag(&self) -> bool {
        matches!(self, XmlNode::Element { empty_tag: true, .. })
    }

    fn document_element(&self) -> Option<&Self> {
        match self {
            XmlNode::Document { root } => Some(root.as_ref()),
            _ => None,
        }
    }
}
