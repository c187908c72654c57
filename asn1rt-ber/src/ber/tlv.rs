//! TLV walker
//!
//! Reconstructs the tag/length/content structure of raw BER for inspection.
//! The walker consumes a [`ByteWindow`] front to back, one node at a time:
//!
//! 1. read the identifier octets (class, form, tag number)
//! 2. read the length octets (short, long or indefinite form)
//! 3. primitive: take `length` content octets as a leaf;
//!    constructed: walk the content as nested nodes until the declared
//!    length is used up, or until the end-of-contents marker for the
//!    indefinite form
//!
//! Every node keeps windows onto its own tag, length and content octets;
//! nothing is copied.
//!
//! Malformed input does not abort the walk with nothing to show. The walker
//! stops at the first fault and returns what it decoded up to that point,
//! with the fault attached to the constructed node (or the tree) whose
//! content could not be finished. It never skips ahead to resynchronize.

use crate::ber::types::{BerLength, BerTag};
use crate::error::{Asn1Error, Asn1Result, TlvField};
use asn1rt_core::{AsnClass, AsnForm, ByteWindow};
use serde::{Deserialize, Serialize};

/// Walker and dump settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    /// Number of nested constructed levels accepted
    pub max_depth: usize,
    /// Indentation width for each nested block in the dump
    pub indent_width: usize,
    /// Accept the indefinite length form on constructed nodes
    pub allow_indefinite: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            indent_width: 2,
            allow_indefinite: true,
        }
    }
}

/// One decoded TLV
#[derive(Debug)]
pub struct TlvNode<'a> {
    tag: BerTag,
    tag_octets: ByteWindow<'a>,
    length: BerLength,
    length_octets: ByteWindow<'a>,
    content: ByteWindow<'a>,
    children: Vec<TlvNode<'a>>,
    /// Set when decoding stopped inside this node's content
    fault: Option<Asn1Error>,
}

impl<'a> TlvNode<'a> {
    pub fn tag(&self) -> BerTag {
        self.tag
    }

    pub fn class(&self) -> AsnClass {
        self.tag.class()
    }

    pub fn form(&self) -> AsnForm {
        self.tag.form()
    }

    pub fn number(&self) -> u64 {
        self.tag.number()
    }

    pub fn tag_octets(&self) -> ByteWindow<'a> {
        self.tag_octets
    }

    pub fn length(&self) -> BerLength {
        self.length
    }

    pub fn length_octets(&self) -> ByteWindow<'a> {
        self.length_octets
    }

    /// Content octets; for the indefinite form, without the end-of-contents marker
    pub fn content(&self) -> ByteWindow<'a> {
        self.content
    }

    /// Nested nodes, in order (always empty for primitive nodes)
    pub fn children(&self) -> &[TlvNode<'a>] {
        &self.children
    }

    pub fn fault(&self) -> Option<&Asn1Error> {
        self.fault.as_ref()
    }

    /// Octets this node occupies in the input, markers included
    pub fn encoded_len(&self) -> usize {
        let marker = if self.length.is_indefinite() { 2 } else { 0 };
        self.tag_octets.len() + self.length_octets.len() + self.content.len() + marker
    }

    /// True when neither this node nor any descendant stopped on a fault
    pub fn is_complete(&self) -> bool {
        self.fault.is_none() && self.children.iter().all(TlvNode::is_complete)
    }

    /// The fault that stopped decoding in this subtree, if any
    pub fn first_fault(&self) -> Option<&Asn1Error> {
        self.fault
            .as_ref()
            .or_else(|| self.children.iter().find_map(TlvNode::first_fault))
    }

    /// Move the first fault out of this subtree
    pub(crate) fn take_fault(&mut self) -> Option<Asn1Error> {
        if let Some(fault) = self.fault.take() {
            return Some(fault);
        }
        self.children.iter_mut().find_map(TlvNode::take_fault)
    }
}

/// Result of walking a whole window
#[derive(Debug, Default)]
pub struct TlvTree<'a> {
    nodes: Vec<TlvNode<'a>>,
    /// Set when a top-level node could not be read
    fault: Option<Asn1Error>,
}

impl<'a> TlvTree<'a> {
    pub fn nodes(&self) -> &[TlvNode<'a>] {
        &self.nodes
    }

    pub fn fault(&self) -> Option<&Asn1Error> {
        self.fault.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.fault.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.fault.is_none() && self.nodes.iter().all(TlvNode::is_complete)
    }

    pub fn first_fault(&self) -> Option<&Asn1Error> {
        self.nodes
            .iter()
            .find_map(TlvNode::first_fault)
            .or(self.fault.as_ref())
    }
}

/// Walk `bytes` with the default configuration
pub fn walk(bytes: &[u8]) -> TlvTree<'_> {
    walk_window(ByteWindow::new(bytes), &WalkerConfig::default())
}

/// Walk every top-level TLV in `window`
pub fn walk_window<'a>(window: ByteWindow<'a>, config: &WalkerConfig) -> TlvTree<'a> {
    log::debug!(
        "walking {} octets at offset {}",
        window.len(),
        window.offset()
    );

    let mut tree = TlvTree::default();
    let mut rest = window;

    while !rest.is_empty() {
        match read_node(rest, 0, config) {
            Ok(node) => {
                let complete = node.is_complete();
                let consumed = node.encoded_len();
                tree.nodes.push(node);
                if !complete {
                    break;
                }
                match rest.from(consumed) {
                    Ok(next) => rest = next,
                    Err(e) => {
                        tree.fault = Some(e);
                        break;
                    }
                }
            }
            Err(e) => {
                tree.fault = Some(e);
                break;
            }
        }
    }

    match tree.first_fault() {
        Some(fault) => log::warn!("TLV walk stopped: {}", fault),
        None => log::debug!("TLV walk decoded {} top-level nodes", tree.nodes.len()),
    }
    tree
}

/// Read one node from the front of `window`
///
/// `Err` means the node itself could not be read (its tag, length or
/// primitive content is incomplete or illegal). A constructed node whose
/// children stop early is returned as `Ok` with the fault recorded inside.
pub fn read_node<'a>(
    window: ByteWindow<'a>,
    depth: usize,
    config: &WalkerConfig,
) -> Asn1Result<TlvNode<'a>> {
    let (tag, tag_len) = BerTag::decode(&window)?;
    let (tag_octets, after_tag) = window.split_at(tag_len)?;

    let (length, length_len) = BerLength::decode(&after_tag)?;
    let (length_octets, after_length) = after_tag.split_at(length_len)?;

    if tag.is_constructed() && depth >= config.max_depth {
        log::warn!(
            "constructed node at offset {} exceeds depth {}",
            window.offset(),
            config.max_depth
        );
        return Err(Asn1Error::DepthExceeded {
            max: config.max_depth,
        });
    }

    match length.value() {
        Some(declared) => {
            let truncated = Asn1Error::Truncated {
                offset: after_length.offset() + after_length.len(),
                field: TlvField::Content,
            };
            let available = declared.min(after_length.len());
            if available < declared && !tag.is_constructed() {
                return Err(truncated);
            }

            // A cut-short constructed node still shows the children that are present
            let content = after_length.until(available)?;
            let (children, mut fault) = if tag.is_constructed() {
                read_definite_children(content, depth, config)
            } else {
                (Vec::new(), None)
            };
            if available < declared && fault.is_none() && children.iter().all(TlvNode::is_complete) {
                fault = Some(truncated);
            }
            Ok(TlvNode {
                tag,
                tag_octets,
                length,
                length_octets,
                content,
                children,
                fault,
            })
        }
        None => {
            if !tag.is_constructed() {
                return Err(Asn1Error::malformed(
                    length_octets.offset(),
                    "indefinite length on a primitive encoding",
                ));
            }
            if !config.allow_indefinite {
                return Err(Asn1Error::malformed(
                    length_octets.offset(),
                    "indefinite length form not allowed",
                ));
            }
            let (content_len, children, fault) =
                read_indefinite_children(after_length, depth, config);
            Ok(TlvNode {
                tag,
                tag_octets,
                length,
                length_octets,
                content: after_length.until(content_len)?,
                children,
                fault,
            })
        }
    }
}

fn read_definite_children<'a>(
    content: ByteWindow<'a>,
    depth: usize,
    config: &WalkerConfig,
) -> (Vec<TlvNode<'a>>, Option<Asn1Error>) {
    let mut children = Vec::new();
    let mut rest = content;

    while !rest.is_empty() {
        let child = match read_node(rest, depth + 1, config) {
            Ok(child) => child,
            Err(e) => return (children, Some(e)),
        };
        let complete = child.is_complete();
        let consumed = child.encoded_len();
        children.push(child);
        if !complete {
            return (children, None);
        }
        rest = match rest.from(consumed) {
            Ok(next) => next,
            Err(e) => return (children, Some(e)),
        };
    }

    (children, None)
}

/// Children up to the end-of-contents marker
///
/// Returns the content length (marker excluded), the children and a fault
/// if the marker was never reached.
fn read_indefinite_children<'a>(
    after_length: ByteWindow<'a>,
    depth: usize,
    config: &WalkerConfig,
) -> (usize, Vec<TlvNode<'a>>, Option<Asn1Error>) {
    let mut children = Vec::new();
    let mut used = 0;

    loop {
        let rest = match after_length.from(used) {
            Ok(rest) => rest,
            Err(e) => return (used, children, Some(e)),
        };

        if rest.len() < 2 {
            let fault = Asn1Error::Truncated {
                offset: rest.offset() + rest.len(),
                field: TlvField::EndOfContents,
            };
            return (used, children, Some(fault));
        }
        if rest.as_slice()[..2] == [0x00, 0x00] {
            return (used, children, None);
        }

        let child = match read_node(rest, depth + 1, config) {
            Ok(child) => child,
            Err(e) => return (used, children, Some(e)),
        };
        let complete = child.is_complete();
        used += child.encoded_len();
        children.push(child);
        if !complete {
            return (used, children, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_window_is_nothing_to_show() {
        let tree = walk(&[]);
        assert!(tree.is_empty());
        assert!(tree.is_complete());
    }

    #[test]
    fn test_primitive_leaf() {
        let data = [0x02, 0x02, 0x14, 0x88];
        let tree = walk(&data);
        assert!(tree.is_complete());
        let node = &tree.nodes()[0];
        assert_eq!(node.tag(), BerTag::INTEGER);
        assert_eq!(node.tag_octets().as_slice(), &[0x02]);
        assert_eq!(node.length_octets().as_slice(), &[0x02]);
        assert_eq!(node.content().as_slice(), &[0x14, 0x88]);
        assert_eq!(node.content().offset(), 2);
        assert!(node.children().is_empty());
    }

    #[test]
    fn test_constructed_set_with_children() {
        let data = [
            0x31, 0x0c, 0x04, 0x00, 0x04, 0x00, 0x04, 0x00, 0x0a, 0x01, 0x00, 0x01, 0x01, 0x00,
        ];
        let tree = walk(&data);
        assert!(tree.is_complete());
        assert_eq!(tree.nodes().len(), 1);
        let set = &tree.nodes()[0];
        assert_eq!(set.form(), AsnForm::Constructed);
        assert_eq!(set.number(), 17);
        let numbers: Vec<u64> = set.children().iter().map(TlvNode::number).collect();
        assert_eq!(numbers, vec![4, 4, 4, 10, 1]);
        assert_eq!(set.encoded_len(), data.len());
    }

    #[test]
    fn test_sibling_top_level_nodes() {
        let data = [0x01, 0x01, 0x00, 0x05, 0x00];
        let tree = walk(&data);
        assert_eq!(tree.nodes().len(), 2);
        assert_eq!(tree.nodes()[1].tag(), BerTag::NULL);
    }

    #[test]
    fn test_high_tag_number_and_long_length() {
        let mut data = vec![0x9f, 0x81, 0x00, 0x81, 0x80];
        data.extend(std::iter::repeat_n(0xaa, 0x80));
        let tree = walk(&data);
        assert!(tree.is_complete());
        let node = &tree.nodes()[0];
        assert_eq!(node.class(), AsnClass::ContextSpecific);
        assert_eq!(node.number(), 0x80);
        assert_eq!(node.length(), BerLength::Long(0x80));
        assert_eq!(node.content().len(), 0x80);
    }

    #[test]
    fn test_indefinite_length() {
        let data = [0x30, 0x80, 0x02, 0x01, 0x07, 0x05, 0x00, 0x00, 0x00, 0x01, 0x01, 0xff];
        let tree = walk(&data);
        assert!(tree.is_complete());
        assert_eq!(tree.nodes().len(), 2);
        let seq = &tree.nodes()[0];
        assert!(seq.length().is_indefinite());
        assert_eq!(seq.children().len(), 2);
        assert_eq!(seq.content().as_slice(), &[0x02, 0x01, 0x07, 0x05, 0x00]);
        assert_eq!(seq.encoded_len(), 9);
        assert_eq!(tree.nodes()[1].tag(), BerTag::BOOLEAN);
    }

    #[test]
    fn test_nested_indefinite_length() {
        let data = [0x30, 0x80, 0xa0, 0x80, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00];
        let tree = walk(&data);
        assert!(tree.is_complete());
        let inner = &tree.nodes()[0].children()[0];
        assert_eq!(inner.number(), 0);
        assert_eq!(inner.children()[0].tag(), BerTag::NULL);
    }

    #[test]
    fn test_missing_end_of_contents() {
        let data = [0x30, 0x80, 0x05, 0x00];
        let tree = walk(&data);
        assert!(!tree.is_complete());
        assert_eq!(tree.nodes()[0].children().len(), 1);
        assert!(matches!(
            tree.first_fault(),
            Some(Asn1Error::Truncated {
                offset: 4,
                field: TlvField::EndOfContents
            })
        ));
    }

    #[test]
    fn test_indefinite_primitive_is_malformed() {
        let tree = walk(&[0x04, 0x80, 0x00, 0x00]);
        assert!(tree.nodes().is_empty());
        assert!(matches!(tree.fault(), Some(Asn1Error::Malformed { offset: 1, .. })));
    }

    #[test]
    fn test_indefinite_can_be_disabled() {
        let config = WalkerConfig {
            allow_indefinite: false,
            ..WalkerConfig::default()
        };
        let data = [0x30, 0x80, 0x00, 0x00];
        let tree = walk_window(ByteWindow::new(&data), &config);
        assert!(matches!(tree.fault(), Some(Asn1Error::Malformed { .. })));
    }

    #[test]
    fn test_truncated_length() {
        let tree = walk(&[0x02]);
        assert!(matches!(
            tree.fault(),
            Some(Asn1Error::Truncated {
                offset: 1,
                field: TlvField::Length
            })
        ));
    }

    #[test]
    fn test_truncated_content_inside_constructed() {
        // second child declares 3 content octets, only 1 present
        let data = [0x30, 0x05, 0x05, 0x00, 0x04, 0x03, 0xaa];
        let tree = walk(&data);
        assert!(tree.fault().is_none());
        let seq = &tree.nodes()[0];
        assert_eq!(seq.children().len(), 1);
        assert!(matches!(
            seq.fault(),
            Some(Asn1Error::Truncated {
                offset: 7,
                field: TlvField::Content
            })
        ));
        assert!(!tree.is_complete());
    }

    #[test]
    fn test_truncated_constructed_keeps_present_children() {
        let data = [0x30, 0x06, 0x05, 0x00, 0x01, 0x01];
        let tree = walk(&data);
        assert!(tree.fault().is_none());
        let seq = &tree.nodes()[0];
        assert_eq!(seq.content().len(), 4);
        assert_eq!(seq.children().len(), 1);
        assert!(matches!(
            seq.fault(),
            Some(Asn1Error::Truncated {
                offset: 6,
                field: TlvField::Content
            })
        ));

        let whole = [0x30, 0x04, 0x05, 0x00];
        let tree = walk(&whole);
        assert_eq!(tree.nodes()[0].children().len(), 1);
        assert!(matches!(
            tree.first_fault(),
            Some(Asn1Error::Truncated {
                field: TlvField::Content,
                ..
            })
        ));
    }

    #[test]
    fn test_walk_stops_after_faulty_node() {
        // the constructed node is damaged, the trailing NULL is not visited
        let data = [0x30, 0x02, 0x1f, 0x81, 0x05, 0x00];
        let tree = walk(&data);
        assert_eq!(tree.nodes().len(), 1);
        assert!(matches!(
            tree.first_fault(),
            Some(Asn1Error::Truncated {
                field: TlvField::Tag,
                ..
            })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let config = WalkerConfig {
            max_depth: 2,
            ..WalkerConfig::default()
        };
        let shallow = [0x30, 0x02, 0x30, 0x00];
        assert!(walk_window(ByteWindow::new(&shallow), &config).is_complete());

        let deep = [0x30, 0x04, 0x30, 0x02, 0x30, 0x00];
        let tree = walk_window(ByteWindow::new(&deep), &config);
        assert!(matches!(
            tree.first_fault(),
            Some(Asn1Error::DepthExceeded { max: 2 })
        ));
    }

    #[test]
    fn test_deeply_nested_input_does_not_overflow() {
        let mut data = Vec::new();
        for _ in 0..10_000 {
            data.extend_from_slice(&[0x30, 0x80]);
        }
        let tree = walk(&data);
        assert!(matches!(
            tree.first_fault(),
            Some(Asn1Error::DepthExceeded { max: 64 })
        ));
    }

    #[test]
    fn test_take_fault_moves_error_out() {
        let data = [0x30, 0x03, 0x02, 0x05, 0x00];
        let tree = walk(&data);
        let mut nodes = tree.nodes;
        assert!(nodes[0].take_fault().is_some());
        assert!(nodes[0].is_complete());
    }

    #[test]
    fn test_config_defaults() {
        let config = WalkerConfig::default();
        assert_eq!(config.max_depth, 64);
        assert_eq!(config.indent_width, 2);
        assert!(config.allow_indefinite);
    }
}
