//! Small DOM helpers for the delegated event handlers.

use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlFormElement, HtmlInputElement};

pub(super) fn event_element(ev: &web_sys::Event) -> Option<Element> {
    ev.target()?.dyn_into::<Element>().ok()
}

pub(super) fn closest(el: &Element, selector: &str) -> Option<Element> {
    el.closest(selector).ok().flatten()
}

/// Value of `attr` on `el` or its nearest ancestor carrying it.
pub(super) fn closest_attr(el: &Element, attr: &str) -> Option<String> {
    closest(el, &format!("[{attr}]"))?.get_attribute(attr)
}

pub(super) fn query(selector: &str) -> Option<Element> {
    web_sys::window()?
        .document()?
        .query_selector(selector)
        .ok()
        .flatten()
}

pub(super) fn current_hash() -> String {
    web_sys::window()
        .and_then(|w| w.location().hash().ok())
        .unwrap_or_default()
}

pub(super) fn set_hash(hash: &str) {
    if let Some(w) = web_sys::window() {
        let _ = w.location().set_hash(hash);
    }
}

/// Mark an option button active within its group and mirror its value into
/// the group's hidden input.
pub(super) fn select_option(button: &Element) {
    let (Some(name), Some(value)) = (
        button.get_attribute("data-option"),
        button.get_attribute("data-value"),
    ) else {
        return;
    };
    let Some(group) = closest(button, "[data-option-group]") else {
        return;
    };
    if let Ok(buttons) = group.query_selector_all("button") {
        for i in 0..buttons.length() {
            if let Some(el) = buttons.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                let _ = el.class_list().remove_1("active");
            }
        }
    }
    let _ = button.class_list().add_1("active");

    let hidden = group
        .parent_element()
        .and_then(|p| p.query_selector(&format!("input[name=\"{name}\"]")).ok().flatten())
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok());
    if let Some(hidden) = hidden {
        hidden.set_value(&value);
    }
}

/// Text entries of a form. File inputs are skipped; photos travel separately.
pub(super) fn form_pairs(form: &HtmlFormElement) -> Vec<(String, String)> {
    let Ok(data) = web_sys::FormData::new_with_form(form) else {
        return Vec::new();
    };
    let Ok(Some(entries)) = js_sys::try_iter(&data) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| {
            let pair = js_sys::Array::from(&entry.ok()?);
            Some((pair.get(0).as_string()?, pair.get(1).as_string()?))
        })
        .collect()
}
