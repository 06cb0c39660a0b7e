//! In-memory element tree read from an XML document.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use crate::context::qualified_name;
use crate::error::{EncodeError, EncodeResult};

/// Namespace bound to the reserved `xml:` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// An attribute of an element. Namespace declarations are not attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub namespace: Option<String>,
    pub name: String,
    pub value: String,
}

impl Attribute {
    /// Field name the attribute is stored under: the bare local name for
    /// unqualified and `xml:` attributes (`lang`), the qualified name for
    /// everything else (`http://www.w3.org/2001/XMLSchema-instance:type`).
    pub fn field_name(&self) -> String {
        match self.namespace.as_deref() {
            None | Some(XML_NAMESPACE) => self.name.clone(),
            Some(ns) => qualified_name(ns, &self.name),
        }
    }
}

/// An element with its attributes, child elements and direct text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub namespace: Option<String>,
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Element>,
    /// Text and CDATA directly inside this element, untrimmed. Entry `i` is
    /// the text before child `i`; the last entry follows the final child.
    pub text_runs: Vec<String>,
}

impl Default for Element {
    fn default() -> Self {
        Self {
            namespace: None,
            name: String::new(),
            attributes: Vec::new(),
            children: Vec::new(),
            text_runs: vec![String::new()],
        }
    }
}

impl Element {
    /// The name used when reporting this element.
    pub fn display_name(&self) -> String {
        match self.namespace.as_deref() {
            Some(ns) => qualified_name(ns, &self.name),
            None => self.name.clone(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// All direct text, concatenated.
    pub fn text(&self) -> String {
        self.text_runs.concat()
    }

    /// Field name `child` is stored under in this element: the bare local
    /// name when the child is unqualified or shares this element's
    /// namespace, the qualified name otherwise.
    pub fn child_field_name(&self, child: &Element) -> String {
        match child.namespace.as_deref() {
            None => child.name.clone(),
            Some(ns) if self.namespace.as_deref() == Some(ns) => child.name.clone(),
            Some(ns) => qualified_name(ns, &child.name),
        }
    }

    fn push_text(&mut self, text: &str) {
        match self.text_runs.last_mut() {
            Some(run) => run.push_str(text),
            None => self.text_runs.push(text.to_owned()),
        }
    }
}

/// Read a document into an element tree.
///
/// Parsing is iterative. Nesting deeper than `max_depth` fails with
/// [`EncodeError::DepthExceeded`] before the subtree is built.
pub fn parse_document<R: BufRead>(input: R, max_depth: usize) -> EncodeResult<Element> {
    let mut reader = NsReader::from_reader(input);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) => {
                if stack.len() >= max_depth {
                    return Err(EncodeError::DepthExceeded { limit: max_depth });
                }
                stack.push(start_element(&reader, &start)?);
            }
            Event::Empty(start) => {
                if stack.len() >= max_depth {
                    return Err(EncodeError::DepthExceeded { limit: max_depth });
                }
                let element = start_element(&reader, &start)?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| EncodeError::Document("unexpected closing tag".into()))?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.push_text(&text.unescape()?);
                }
            }
            Event::CData(cdata) => {
                if let Some(current) = stack.last_mut() {
                    let raw = cdata.into_inner();
                    current.push_text(utf8(&raw)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(EncodeError::Document(format!(
            "unclosed element {:?}",
            open.display_name()
        )));
    }
    root.ok_or(EncodeError::EmptyDocument)
}

fn close_element(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> EncodeResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        parent.text_runs.push(String::new());
        return Ok(());
    }
    if root.is_some() {
        return Err(EncodeError::Document(format!(
            "second root element {:?}",
            element.display_name()
        )));
    }
    *root = Some(element);
    Ok(())
}

fn start_element<R>(reader: &NsReader<R>, start: &BytesStart<'_>) -> EncodeResult<Element> {
    let (ns, local) = reader.resolve_element(start.name());
    let namespace = namespace_uri(ns)?;
    let name = utf8(local.as_ref())?.to_owned();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let (ns, local) = reader.resolve_attribute(attr.key);
        let namespace = namespace_uri(ns)?;
        let name = utf8(local.as_ref())?.to_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push(Attribute {
            namespace,
            name,
            value,
        });
    }

    Ok(Element {
        namespace,
        name,
        attributes,
        ..Element::default()
    })
}

fn namespace_uri(result: ResolveResult<'_>) -> EncodeResult<Option<String>> {
    match result {
        ResolveResult::Bound(Namespace(ns)) => Ok(Some(utf8(ns)?.to_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) if prefix == b"xml" => Ok(Some(XML_NAMESPACE.to_owned())),
        ResolveResult::Unknown(prefix) => Err(EncodeError::UnknownPrefix(
            String::from_utf8_lossy(&prefix).into_owned(),
        )),
    }
}

fn utf8(bytes: &[u8]) -> EncodeResult<&str> {
    std::str::from_utf8(bytes).map_err(|e| EncodeError::Document(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> EncodeResult<Element> {
        parse_document(xml.as_bytes(), 16)
    }

    #[test]
    fn nested_elements() {
        let root = parse("<a><b>one</b><c/></a>").unwrap();
        assert_eq!(root.name, "a");
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].name, "b");
        assert_eq!(root.children[0].text(), "one");
        assert!(root.children[1].is_leaf());
    }

    #[test]
    fn namespaces_resolved() {
        let xml = r#"<ern:Release xmlns:ern="http://ddex.net/xml/ern/382"
                       xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
                       xsi:type="ern:Album" xml:lang="en" plain="p"/>"#;
        let root = parse(xml).unwrap();
        assert_eq!(root.namespace.as_deref(), Some("http://ddex.net/xml/ern/382"));
        assert_eq!(root.name, "Release");

        let fields: Vec<String> = root.attributes.iter().map(Attribute::field_name).collect();
        assert_eq!(
            fields,
            vec![
                "http://www.w3.org/2001/XMLSchema-instance:type".to_string(),
                "lang".to_string(),
                "plain".to_string(),
            ]
        );
        assert_eq!(root.attributes[0].value, "ern:Album");
    }

    #[test]
    fn default_namespace_applies_to_elements_only() {
        let root = parse(r#"<Release xmlns="urn:x" id="1"/>"#).unwrap();
        assert_eq!(root.namespace.as_deref(), Some("urn:x"));
        assert_eq!(root.attributes[0].namespace, None);
    }

    #[test]
    fn entities_and_cdata_unescaped() {
        let root = parse("<t>Rock &amp; Roll <![CDATA[<live>]]></t>").unwrap();
        assert_eq!(root.text(), "Rock & Roll <live>");
    }

    #[test]
    fn text_runs_split_at_children() {
        let root = parse("<t> a <x/>b<y/><z/>  </t>").unwrap();
        assert_eq!(root.text_runs, vec![" a ", "b", "", "  "]);
        assert_eq!(root.text(), " a b  ");
        assert_eq!(root.children[0].text_runs, vec![""]);
    }

    #[test]
    fn child_field_names_follow_namespaces() {
        let root = parse(
            r#"<R xmlns:a="urn:a" xmlns:b="urn:b"><a:T/><b:T/><T/></R>"#,
        )
        .unwrap();
        let names: Vec<String> = root
            .children
            .iter()
            .map(|child| root.child_field_name(child))
            .collect();
        assert_eq!(names, vec!["urn:a:T", "urn:b:T", "T"]);

        let root = parse(r#"<R xmlns="urn:x" xmlns:y="urn:y"><T/><y:T/></R>"#).unwrap();
        assert_eq!(root.child_field_name(&root.children[0]), "T");
        assert_eq!(root.child_field_name(&root.children[1]), "urn:y:T");
    }

    #[test]
    fn unknown_prefix_rejected() {
        assert!(matches!(
            parse("<x:a/>"),
            Err(EncodeError::UnknownPrefix(p)) if p == "x"
        ));
    }

    #[test]
    fn empty_document_rejected() {
        assert!(matches!(
            parse("<?xml version=\"1.0\"?>"),
            Err(EncodeError::EmptyDocument)
        ));
    }

    #[test]
    fn multiple_roots_rejected() {
        assert!(matches!(parse("<a/><b/>"), Err(EncodeError::Document(_))));
    }

    #[test]
    fn unclosed_element_rejected() {
        assert!(parse("<a><b></b>").is_err());
    }

    #[test]
    fn mismatched_end_tag_rejected() {
        assert!(matches!(parse("<a></b>"), Err(EncodeError::Xml(_))));
    }

    #[test]
    fn depth_limit_enforced() {
        let deep = "<a>".repeat(20) + &"</a>".repeat(20);
        assert!(matches!(
            parse_document(deep.as_bytes(), 8),
            Err(EncodeError::DepthExceeded { limit: 8 })
        ));
        assert!(parse_document(deep.as_bytes(), 20).is_ok());
    }
}
