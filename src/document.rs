//! Attribute-preserving XML document tree.
//!
//! The annotation pipeline rewrites a handful of attributes on a known
//! schema and must leave everything else alone, so this is deliberately
//! not a general XML data binding: text, comments, CDATA and processing
//! instructions are carried through verbatim (still escaped, as read),
//! and only element attributes are decoded.
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

/// Waypoint record tag
pub const POSITION_TAG: &str = "Position";
/// Grouping element tag, one nesting level deep
pub const GROUP_TAG: &str = "Group";

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("invalid XML attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("closing tag </{0}> without matching opening tag")]
    UnbalancedTag(String),
    #[error("document has no root element")]
    NoRootElement,
    #[error("document has more than one root element")]
    MultipleRootElements,
    #[error("serialized document is not valid UTF-8")]
    NotUtf8,
    #[error("<{element}> element is missing its {attribute} attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
}

/// Anything that can appear inside an element.
/// Non-element payloads hold the raw markup text, as read, so that
/// re-serialization reproduces them byte for byte.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    CData(String),
    ProcessingInstruction(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    /// Attributes in document order, values unescaped
    attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Overwrites `name` in place when present, appends it otherwise,
    /// keeping the document's attribute order stable across runs.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some(attribute) => attribute.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }
}

/// A parsed XML document: one root element plus whatever comments or
/// processing instructions surround it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    doctype: Option<String>,
    prolog: Vec<Node>,
    root: Element,
    epilog: Vec<Node>,
}

impl Document {
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let mut reader = Reader::from_str(text);
        let mut doctype = None;
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<Element> = None;
        let mut stack: Vec<Element> = Vec::new();

        loop {
            let node = match reader.read_event()? {
                Event::Eof => break,
                // re-emitted on serialization, never kept
                Event::Decl(_) => continue,
                Event::DocType(e) => {
                    doctype = Some(String::from_utf8_lossy(e.as_ref()).into_owned());
                    continue;
                },
                Event::Start(e) => {
                    stack.push(element_from(&e)?);
                    continue;
                },
                Event::End(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    let element = stack.pop().ok_or(DocumentError::UnbalancedTag(name))?;
                    Node::Element(element)
                },
                Event::Empty(e) => Node::Element(element_from(&e)?),
                Event::Text(e) => {
                    let raw = String::from_utf8_lossy(e.as_ref()).into_owned();
                    if stack.is_empty() {
                        // inter-element formatting outside the root
                        continue;
                    }
                    Node::Text(raw)
                },
                Event::CData(e) => Node::CData(String::from_utf8_lossy(e.as_ref()).into_owned()),
                Event::Comment(e) => {
                    Node::Comment(String::from_utf8_lossy(e.as_ref()).into_owned())
                },
                Event::PI(e) => {
                    Node::ProcessingInstruction(String::from_utf8_lossy(e.as_ref()).into_owned())
                },
            };

            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => match node {
                    Node::Element(element) => {
                        if root.is_some() {
                            return Err(DocumentError::MultipleRootElements);
                        }
                        root = Some(element);
                    },
                    other if root.is_none() => prolog.push(other),
                    other => epilog.push(other),
                },
            }
        }

        Ok(Self {
            doctype,
            prolog,
            root: root.ok_or(DocumentError::NoRootElement)?,
            epilog,
        })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Selects the waypoint records to annotate: `Position` elements
    /// directly under the root first, then `Position` elements directly
    /// under root-level `Group` elements, each batch in document order.
    /// Deeper nesting is out of reach on purpose.
    pub fn positions(&self) -> Vec<&Element> {
        let mut records: Vec<&Element> = self
            .root
            .child_elements()
            .filter(|e| e.name == POSITION_TAG)
            .collect();
        for group in self.root.child_elements().filter(|e| e.name == GROUP_TAG) {
            records.extend(group.child_elements().filter(|e| e.name == POSITION_TAG));
        }
        records
    }

    /// Mutable variant of [`Self::positions`], same selection and order.
    pub fn positions_mut(&mut self) -> Vec<&mut Element> {
        let mut records = Vec::new();
        let mut nested = Vec::new();
        for node in self.root.children.iter_mut() {
            let Node::Element(element) = node else {
                continue;
            };
            if element.name == POSITION_TAG {
                records.push(element);
            } else if element.name == GROUP_TAG {
                for inner in element.children.iter_mut() {
                    if let Node::Element(inner) = inner {
                        if inner.name == POSITION_TAG {
                            nested.push(inner);
                        }
                    }
                }
            }
        }
        records.append(&mut nested);
        records
    }

    /// Serializes with an XML declaration, UTF-8, short empty-element
    /// tags. Everything parsed is written back out; the only deltas an
    /// annotation run introduces are the attributes it set.
    pub fn to_xml_string(&self) -> Result<String, DocumentError> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;
        if let Some(doctype) = &self.doctype {
            writer.write_event(Event::DocType(BytesText::from_escaped(doctype.as_str())))?;
            writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;
        }
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        for node in &self.epilog {
            write_node(&mut writer, node)?;
        }
        String::from_utf8(writer.into_inner()).map_err(|_| DocumentError::NotUtf8)
    }
}

fn element_from(start: &BytesStart) -> Result<Element, DocumentError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), DocumentError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<(), DocumentError> {
    match node {
        Node::Element(element) => write_element(writer, element)?,
        Node::Text(raw) => writer.write_event(Event::Text(BytesText::from_escaped(raw.as_str())))?,
        Node::Comment(raw) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(raw.as_str())))?
        },
        Node::CData(raw) => writer.write_event(Event::CData(BytesCData::new(raw.as_str())))?,
        Node::ProcessingInstruction(raw) => {
            writer.write_event(Event::PI(BytesPI::new(raw.as_str())))?
        },
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Maps>
  <!-- root level -->
  <Position Name="A" DefaultCenter="+12.5-065.75"/>
  <Group Name="G1">
    <Position Name="B" DefaultCenter="-3356.70+15110.63"/>
    <Other Name="ignored"/>
    <Group Name="deep">
      <Position Name="C" DefaultCenter="+00.0-000.0"/>
    </Group>
  </Group>
  <Position Name="D" DefaultCenter="+123456.00-0654321.00"/>
</Maps>"#;

    #[test]
    fn selection_rule_and_order() {
        let document = Document::parse(DOC).unwrap();
        let names: Vec<_> = document
            .positions()
            .iter()
            .map(|p| p.attribute("Name").unwrap())
            .collect();
        // root records first, then one level under Group;
        // "C" is two Groups deep and not selected
        assert_eq!(names, vec!["A", "D", "B"]);
    }

    #[test]
    fn positions_mut_matches_positions() {
        let mut document = Document::parse(DOC).unwrap();
        let immutable: Vec<String> = document
            .positions()
            .iter()
            .map(|p| p.attribute("Name").unwrap().to_string())
            .collect();
        let mutable: Vec<String> = document
            .positions_mut()
            .iter()
            .map(|p| p.attribute("Name").unwrap().to_string())
            .collect();
        assert_eq!(immutable, mutable);
    }

    #[test]
    fn reserializes_structure_verbatim() {
        let document = Document::parse(DOC).unwrap();
        let body = &DOC[DOC.find("<Maps").unwrap()..];
        let expected = format!("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n{}", body);
        assert_eq!(document.to_xml_string().unwrap(), expected);
    }

    #[test]
    fn attribute_rewrite_keeps_order() {
        let mut document = Document::parse(DOC).unwrap();
        for position in document.positions_mut() {
            position.set_attribute("DefaultCenter", "+00.0-000.0");
            position.set_attribute("Rotation", "0");
        }
        let rewritten = document.to_xml_string().unwrap();
        assert!(rewritten
            .contains(r#"<Position Name="A" DefaultCenter="+00.0-000.0" Rotation="0"/>"#));
        // unselected records untouched
        assert!(rewritten.contains(r#"<Position Name="C" DefaultCenter="+00.0-000.0"/>"#));
    }

    #[test]
    fn empty_elements_stay_short() {
        let document = Document::parse("<Maps><Position Name=\"A\"/></Maps>").unwrap();
        assert_eq!(
            document.to_xml_string().unwrap(),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Maps><Position Name=\"A\"/></Maps>"
        );
    }

    #[test]
    fn attribute_values_unescaped_and_reescaped() {
        let document = Document::parse("<Maps><Position Name=\"A &amp; B\"/></Maps>").unwrap();
        assert_eq!(document.positions()[0].attribute("Name"), Some("A & B"));
        let rewritten = document.to_xml_string().unwrap();
        assert!(rewritten.contains("Name=\"A &amp; B\""));
    }

    #[test]
    fn rejects_empty_document() {
        assert!(matches!(
            Document::parse("<?xml version=\"1.0\"?>"),
            Err(DocumentError::NoRootElement)
        ));
    }

    #[test]
    fn rejects_malformed_document() {
        assert!(Document::parse("<Maps><Position></Maps>").is_err());
    }
}
