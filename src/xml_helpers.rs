use xmltree::{Element, XMLNode};

fn name_matches(raw_name: &str, target: &str) -> bool {
    if raw_name.eq_ignore_ascii_case(target) {
        return true;
    }

    raw_name
        .rsplit_once(':')
        .map(|(_, suffix)| suffix.eq_ignore_ascii_case(target))
        .unwrap_or(false)
}

/// Get child element by name (case-insensitive)
pub(crate) fn get_child_ci<'a>(el: &'a Element, name: &str) -> Option<&'a Element> {
    el.children
        .iter()
        .filter_map(|n| n.as_element())
        .find(|c| name_matches(&c.name, name))
}

/// Find descendant element by name (case-insensitive)
pub(crate) fn find_descendant_ci<'a>(el: &'a Element, name: &str) -> Option<&'a Element> {
    for child in el.children.iter().filter_map(|n| n.as_element()) {
        if name_matches(&child.name, name) {
            return Some(child);
        }
        if let Some(found) = find_descendant_ci(child, name) {
            return Some(found);
        }
    }
    None
}

/// Trimmed text of a direct child, if present and non-empty
pub(crate) fn child_text(el: &Element, name: &str) -> Option<String> {
    get_child_ci(el, name)
        .and_then(|e| e.get_text())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Trimmed text of the first matching descendant
pub(crate) fn descendant_text(el: &Element, name: &str) -> Option<String> {
    find_descendant_ci(el, name)
        .and_then(|e| e.get_text())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Build `<name>text</name>`
pub(crate) fn text_element(name: &str, text: &str) -> Element {
    let mut elem = Element::new(name);
    elem.children.push(XMLNode::Text(text.to_string()));
    elem
}
