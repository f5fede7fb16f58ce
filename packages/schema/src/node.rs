//! Schema nodes.
//!
//! A book's structure is a tree of [`SchemaNode`]s. Interior nodes are
//! containers with ordered, uniquely keyed children. Leaves are content nodes
//! that describe how the text under them is chaptered: a depth plus one section
//! name and one address type per level.

use crate::error::{SchemaError, SchemaResult};
use serde::{Deserialize, Serialize};

/// Key reserved for the default child of a container
pub const DEFAULT_KEY: &str = "default";

/// Extra section appended to content leaves of a commentary schema
pub const COMMENT_SECTION: &str = "Comment";

/// One title of a node in one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    pub lang: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub primary: bool,
}

/// Ordered set of titles, at most one primary per language
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TitleGroup(Vec<Title>);

impl TitleGroup {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Group holding a single primary title
    pub fn primary(lang: impl Into<String>, text: impl Into<String>) -> Self {
        Self(vec![Title {
            lang: lang.into(),
            text: text.into(),
            primary: true,
        }])
    }

    pub fn add(&mut self, title: Title) -> SchemaResult<()> {
        if title.primary && self.primary_title(&title.lang).is_some() {
            return Err(SchemaError::DuplicatePrimaryTitle { lang: title.lang });
        }
        self.0.push(title);
        Ok(())
    }

    /// Primary title text for `lang`, if any
    pub fn primary_title(&self, lang: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|t| t.primary && t.lang == lang)
            .map(|t| t.text.as_str())
    }

    /// Replace the text of an existing title.
    ///
    /// Returns whether the replaced title was the primary one for `lang`.
    pub fn replace(&mut self, lang: &str, old_text: &str, new_text: &str) -> SchemaResult<bool> {
        let title = self
            .0
            .iter_mut()
            .find(|t| t.lang == lang && t.text == old_text)
            .ok_or_else(|| SchemaError::TitleNotFound {
                lang: lang.to_string(),
                text: old_text.to_string(),
            })?;
        title.text = new_text.to_string();
        Ok(title.primary)
    }

    /// Set the primary title for `lang`, replacing an existing one
    pub fn set_primary(&mut self, lang: impl Into<String>, text: impl Into<String>) {
        let lang = lang.into();
        let text = text.into();
        match self.0.iter_mut().find(|t| t.primary && t.lang == lang) {
            Some(title) => title.text = text,
            None => self.0.push(Title {
                lang,
                text,
                primary: true,
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Title> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn validate(&self) -> SchemaResult<()> {
        for (i, title) in self.0.iter().enumerate() {
            let clash = self.0[..i]
                .iter()
                .any(|t| t.primary && title.primary && t.lang == title.lang);
            if clash {
                return Err(SchemaError::DuplicatePrimaryTitle {
                    lang: title.lang.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Addressing shape of a content leaf; depth is the number of levels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawShape", into = "RawShape")]
pub struct ContentShape {
    section_names: Vec<String>,
    address_types: Vec<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawShape {
    section_names: Vec<String>,
    address_types: Vec<String>,
    depth: usize,
}

impl ContentShape {
    pub fn new<S: Into<String>>(
        section_names: impl IntoIterator<Item = S>,
        address_types: impl IntoIterator<Item = S>,
    ) -> SchemaResult<Self> {
        let section_names: Vec<String> = section_names.into_iter().map(Into::into).collect();
        let address_types: Vec<String> = address_types.into_iter().map(Into::into).collect();
        if section_names.len() != address_types.len() {
            return Err(SchemaError::ShapeMismatch {
                section_names: section_names.len(),
                address_types: address_types.len(),
            });
        }
        Ok(Self {
            section_names,
            address_types,
        })
    }

    /// Shape addressed by integers at every level
    pub fn integers<S: Into<String>>(section_names: impl IntoIterator<Item = S>) -> Self {
        let section_names: Vec<String> = section_names.into_iter().map(Into::into).collect();
        let address_types = vec!["Integer".to_string(); section_names.len()];
        Self {
            section_names,
            address_types,
        }
    }

    pub fn depth(&self) -> usize {
        self.section_names.len()
    }

    pub fn section_names(&self) -> &[String] {
        &self.section_names
    }

    pub fn address_types(&self) -> &[String] {
        &self.address_types
    }

    /// Same shape with a trailing comment level
    pub fn with_comment_level(&self) -> Self {
        let mut shape = self.clone();
        shape.section_names.push(COMMENT_SECTION.to_string());
        shape.address_types.push("Integer".to_string());
        shape
    }
}

impl TryFrom<RawShape> for ContentShape {
    type Error = SchemaError;

    fn try_from(raw: RawShape) -> Result<Self, Self::Error> {
        let shape = ContentShape::new(raw.section_names, raw.address_types)?;
        if shape.depth() != raw.depth {
            return Err(SchemaError::ShapeMismatch {
                section_names: shape.depth(),
                address_types: raw.depth,
            });
        }
        Ok(shape)
    }
}

impl From<ContentShape> for RawShape {
    fn from(shape: ContentShape) -> Self {
        RawShape {
            depth: shape.depth(),
            section_names: shape.section_names,
            address_types: shape.address_types,
        }
    }
}

/// Container or content leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "nodeType", rename_all = "camelCase")]
pub enum NodeKind {
    Container { nodes: Vec<SchemaNode> },
    Content(ContentShape),
}

/// Node in a book's structural tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    pub key: String,

    #[serde(default, skip_serializing_if = "TitleGroup::is_empty")]
    pub titles: TitleGroup,

    /// Marks the transitional single default child of a container
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub default: bool,

    #[serde(flatten)]
    pub kind: NodeKind,
}

impl SchemaNode {
    pub fn content(key: impl Into<String>, shape: ContentShape) -> Self {
        Self {
            key: key.into(),
            titles: TitleGroup::new(),
            default: false,
            kind: NodeKind::Content(shape),
        }
    }

    pub fn container(key: impl Into<String>, children: Vec<SchemaNode>) -> Self {
        Self {
            key: key.into(),
            titles: TitleGroup::new(),
            default: false,
            kind: NodeKind::Container { nodes: children },
        }
    }

    /// Default content child, keyed `"default"`
    pub fn default_content(shape: ContentShape) -> Self {
        Self {
            key: DEFAULT_KEY.to_string(),
            titles: TitleGroup::new(),
            default: true,
            kind: NodeKind::Content(shape),
        }
    }

    /// Builder: set the primary title for a language
    pub fn with_title(mut self, lang: impl Into<String>, text: impl Into<String>) -> Self {
        self.titles.set_primary(lang, text);
        self
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Container { .. })
    }

    pub fn shape(&self) -> Option<&ContentShape> {
        match &self.kind {
            NodeKind::Content(shape) => Some(shape),
            NodeKind::Container { .. } => None,
        }
    }

    /// Children in order; empty for content leaves
    pub fn children(&self) -> &[SchemaNode] {
        match &self.kind {
            NodeKind::Container { nodes } => nodes,
            NodeKind::Content(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<SchemaNode>> {
        match &mut self.kind {
            NodeKind::Container { nodes } => Some(nodes),
            NodeKind::Content(_) => None,
        }
    }

    pub fn child(&self, key: &str) -> Option<&SchemaNode> {
        self.children().iter().find(|c| c.key == key)
    }

    pub fn child_mut(&mut self, key: &str) -> Option<&mut SchemaNode> {
        self.children_mut()?.iter_mut().find(|c| c.key == key)
    }

    pub fn default_child(&self) -> Option<&SchemaNode> {
        self.children().iter().find(|c| c.default)
    }

    /// Exactly one child, and that child is the default
    pub fn has_single_default_child(&self) -> bool {
        matches!(self.children(), [only] if only.default)
    }

    /// Copy of this subtree shaped for a commentary schema
    pub fn for_commentary(&self) -> SchemaNode {
        let mut node = self.clone();
        node.kind = match &self.kind {
            NodeKind::Content(shape) => NodeKind::Content(shape.with_comment_level()),
            NodeKind::Container { nodes } => NodeKind::Container {
                nodes: nodes.iter().map(SchemaNode::for_commentary).collect(),
            },
        };
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_shape_requires_equal_lengths() {
        let err = ContentShape::new(["Chapter", "Verse"], ["Integer"]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::ShapeMismatch {
                section_names: 2,
                address_types: 1
            }
        );
    }

    #[test]
    fn test_node_json_shape() {
        let node = SchemaNode::content("intro", ContentShape::integers(["Chapter", "Verse"]))
            .with_title("en", "Introduction");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "key": "intro",
                "titles": [{"lang": "en", "text": "Introduction", "primary": true}],
                "nodeType": "content",
                "sectionNames": ["Chapter", "Verse"],
                "addressTypes": ["Integer", "Integer"],
                "depth": 2
            })
        );
        let back: SchemaNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_depth_must_match_on_load() {
        let json = serde_json::json!({
            "key": "intro",
            "nodeType": "content",
            "sectionNames": ["Chapter"],
            "addressTypes": ["Integer"],
            "depth": 3
        });
        assert!(serde_json::from_value::<SchemaNode>(json).is_err());
    }

    #[test]
    fn test_single_primary_title_per_language() {
        let mut titles = TitleGroup::primary("en", "Sample");
        let err = titles
            .add(Title {
                lang: "en".to_string(),
                text: "Other".to_string(),
                primary: true,
            })
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicatePrimaryTitle { lang: "en".to_string() });

        titles
            .add(Title {
                lang: "en".to_string(),
                text: "Alias".to_string(),
                primary: false,
            })
            .unwrap();
        assert_eq!(titles.primary_title("en"), Some("Sample"));
    }

    #[test]
    fn test_with_title_replaces_primary() {
        let node = SchemaNode::container("root", vec![])
            .with_title("en", "First")
            .with_title("en", "Second");
        assert_eq!(node.titles.primary_title("en"), Some("Second"));
        assert_eq!(node.titles.iter().count(), 1);
    }

    #[test]
    fn test_single_default_child() {
        let shape = ContentShape::integers(["Chapter"]);
        let parent = SchemaNode::container("p", vec![SchemaNode::default_content(shape.clone())]);
        assert!(parent.has_single_default_child());

        let two = SchemaNode::container(
            "p",
            vec![
                SchemaNode::default_content(shape.clone()),
                SchemaNode::content("other", shape),
            ],
        );
        assert!(!two.has_single_default_child());
        assert!(two.default_child().is_some());
    }

    #[test]
    fn test_for_commentary_adds_comment_level() {
        let node = SchemaNode::container(
            "p",
            vec![SchemaNode::content("a", ContentShape::integers(["Chapter", "Verse"]))],
        );
        let commentary = node.for_commentary();
        let shape = commentary.child("a").and_then(SchemaNode::shape).unwrap();
        assert_eq!(shape.depth(), 3);
        assert_eq!(shape.section_names().last().map(String::as_str), Some(COMMENT_SECTION));
    }
}
