//! TCP XML parsing into the markup arena.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};

use super::arena::{Arena, Attribute, NodeId};

/// Parse TCP XML into an arena.
///
/// Element and attribute names are reduced to lowercase local names so the
/// uppercase P4 vocabulary (`<PB N="3"/>`) and the namespaced P5 one
/// (`<tei:pb n="3"/>`) land on the same tree. Whitespace is kept exactly as
/// transcribed.
pub fn parse_document(content: &str) -> Result<Arena> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut arena = Arena::new();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut saw_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let parent = open_parent(&stack, &mut saw_root)?;
                let (name, attrs) = element_parts(&e)?;
                let id = arena.append_element(parent, name, attrs);
                stack.push(id);
            }
            Event::Empty(e) => {
                let parent = open_parent(&stack, &mut saw_root)?;
                let (name, attrs) = element_parts(&e)?;
                arena.append_element(parent, name, attrs);
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(e) => {
                let text = String::from_utf8_lossy(e.as_ref());
                push_text(&mut arena, &stack, &text)?;
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e);
                push_text(&mut arena, &stack, &text)?;
            }
            Event::GeneralRef(e) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                let resolved = resolve_entity(&entity).unwrap_or_else(|| {
                    log::debug!("unresolved entity &{entity}; kept literally");
                    format!("&{entity};")
                });
                push_text(&mut arena, &stack, &resolved)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(&open) = stack.last() {
        let name = arena.element_name(open).unwrap_or_default();
        return Err(Error::InvalidDocument(format!("unclosed element <{name}>")));
    }
    if !saw_root {
        return Err(Error::InvalidDocument("no root element".to_string()));
    }

    Ok(arena)
}

/// Parent for a new element; only one top-level element is allowed.
fn open_parent(stack: &[NodeId], saw_root: &mut bool) -> Result<NodeId> {
    match stack.last() {
        Some(&parent) => Ok(parent),
        None if *saw_root => Err(Error::InvalidDocument(
            "more than one root element".to_string(),
        )),
        None => {
            *saw_root = true;
            Ok(NodeId::ROOT)
        }
    }
}

fn push_text(arena: &mut Arena, stack: &[NodeId], text: &str) -> Result<()> {
    match stack.last() {
        Some(&parent) => {
            arena.append_text(parent, text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(Error::InvalidDocument(format!(
            "text outside the root element: {:?}",
            text.trim()
        ))),
    }
}

fn element_parts(e: &BytesStart<'_>) -> Result<(String, Vec<Attribute>)> {
    let name = e.name();
    let name = lowercase_local(name.as_ref());

    let mut attrs = Vec::new();
    for attr in e.attributes().flatten() {
        let key = attr.key;
        let local = local_name(key.as_ref());
        // Namespace declarations carry no content.
        if key.as_ref() == b"xmlns" || key.as_ref().starts_with(b"xmlns:") {
            continue;
        }
        let raw = String::from_utf8(attr.value.to_vec())?;
        attrs.push(Attribute {
            name: String::from_utf8_lossy(local).to_ascii_lowercase(),
            value: unescape(&raw),
        });
    }

    Ok((name, attrs))
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

/// Extract local name from namespaced XML name (e.g., "tei:pb" -> "pb").
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

fn lowercase_local(name: &[u8]) -> String {
    String::from_utf8_lossy(local_name(name)).to_ascii_lowercase()
}

/// Resolve entity references inside an attribute value.
fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match after.find(';') {
            Some(semi) => {
                let entity = &after[..semi];
                match resolve_entity(entity) {
                    Some(resolved) => out.push_str(&resolved),
                    None => {
                        out.push('&');
                        out.push_str(entity);
                        out.push(';');
                    }
                }
                rest = &after[semi + 1..];
            }
            None => {
                out.push_str(&rest[amp..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Resolve XML entity references.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        if let Ok(code) = u32::from_str_radix(hex, 16)
            && let Some(c) = char::from_u32(code)
        {
            return Some(c.to_string());
        }
    } else if let Some(dec) = entity.strip_prefix('#')
        && let Ok(code) = dec.parse::<u32>()
        && let Some(c) = char::from_u32(code)
    {
        return Some(c.to_string());
    }

    None
}
