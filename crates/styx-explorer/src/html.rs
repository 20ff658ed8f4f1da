//! HTML pages for the explorer routes.
//!
//! Pages are small enough to write directly; every piece of user data goes
//! through [`escape_html`] and every link through [`href`].

use std::fmt::Write;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use styx_data::explorer::{BrowsePage, EditPage, EntryValue, Location, ViewPage};

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Bytes kept as-is in generated links; everything else is percent-encoded.
const PATH_UNSAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'!')
    .remove(b'$')
    .remove(b'@')
    .remove(b':')
    .remove(b',')
    .remove(b';')
    .remove(b'=');

/// Link to `route` (e.g. `/view`) for a reference path.
pub fn href(route: &str, path: &str) -> String {
    format!("{route}{}", utf8_percent_encode(path, PATH_UNSAFE))
}

pub fn index_page() -> String {
    let mut out = header("Styx Explorer");
    out.push_str("    <p class='nav'><a href='/browse/'>Browse</a> <a href='/time'>Time</a></p>\n");
    out.push_str(FOOTER);
    out
}

pub fn browse_page(page: &BrowsePage) -> String {
    let location = &page.location;
    let mut out = header(&location.self_text);
    let _ = writeln!(
        out,
        "    <p class='nav'><a href='/'>Home</a> <a href='{}'>View</a></p>",
        href("/view", &location.self_ref)
    );
    reference_line(&mut out, location);
    error_line(&mut out, page.error.as_deref());
    if let Some(parent) = &location.parent_ref {
        let _ = writeln!(out, "    <a href='{}'>..</a><br>", href("/browse", parent));
    }
    out.push_str("    <table>\n");
    out.push_str("      <tr><th>Key</th><th>Value</th><th></th></tr>\n");
    for entry in &page.entries {
        let key = escape_html(&entry.key_text);
        out.push_str("      <tr>\n");
        match &entry.value {
            EntryValue::Nested => {
                let _ = writeln!(
                    out,
                    "        <td><a href='{}'>{key}</a></td><td><a href='{}'>{{ ... }}</a></td>",
                    href("/browse", &entry.child_ref),
                    href("/view", &entry.child_ref)
                );
            }
            EntryValue::Leaf(text) => {
                let _ = writeln!(
                    out,
                    "        <td>{key}</td><td><a href='{}'>{}</a></td>",
                    href("/view", &entry.child_ref),
                    escape_html(text)
                );
            }
        }
        let _ = writeln!(
            out,
            "        <td><form method='post'><input type='hidden' name='delKey' value='{key}'><input type='submit' value='Delete'></form></td>"
        );
        out.push_str("      </tr>\n");
    }
    out.push_str("    </table>\n");
    let _ = writeln!(
        out,
        "    <form method='post'>\n      <input name='addKey' placeholder='key' value='{}'>\n      <input name='addVal' placeholder='value' value='{}'>\n      <input type='submit' value='Add'>\n    </form>",
        escape_html(page.add_key.as_deref().unwrap_or_default()),
        escape_html(page.add_val.as_deref().unwrap_or_default())
    );
    out.push_str(FOOTER);
    out
}

pub fn view_page(page: &ViewPage) -> String {
    let location = &page.location;
    let browse = location.parent_ref.as_deref().unwrap_or(&location.self_ref);
    let mut out = header(&location.self_text);
    let _ = writeln!(
        out,
        "    <p class='nav'><a href='{}'>Browse</a> <a href='{}'>Edit</a> <a href='{}'>Download</a></p>",
        href("/browse", browse),
        href("/edit", &location.self_ref),
        href("/content", &location.self_ref)
    );
    reference_line(&mut out, location);
    let _ = writeln!(out, "    <pre>\n{}\n</pre>", escape_html(&page.content));
    out.push_str(FOOTER);
    out
}

pub fn edit_page(page: &EditPage) -> String {
    let location = &page.location;
    let mut out = header(&location.self_text);
    let _ = writeln!(
        out,
        "    <p class='nav'><a href='{}'>View</a></p>",
        href("/view", &location.self_ref)
    );
    reference_line(&mut out, location);
    error_line(&mut out, page.error.as_deref());
    let _ = writeln!(
        out,
        "    <form method='post'>\n      <input type='submit' value='Store'><br>\n      <textarea name='content' rows='25' cols='100'>\n{}\n</textarea>\n    </form>",
        escape_html(&page.content)
    );
    out.push_str(FOOTER);
    out
}

const FOOTER: &str = "  </body>\n</html>\n";

fn header(title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n  <head>\n    <meta charset='utf-8'>\n    <title>Styx Explorer: {}</title>\n  </head>\n  <body>\n",
        escape_html(title)
    )
}

fn reference_line(out: &mut String, location: &Location) {
    let _ = writeln!(out, "    <hr>\n    <p class='reference'>{}</p>", escape_html(&location.self_text));
}

fn error_line(out: &mut String, error: Option<&str>) {
    if let Some(error) = error {
        let _ = writeln!(out, "    <p class='error'>{}</p>", escape_html(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<a href='x'>&\"</a>"), "&lt;a href=&apos;x&apos;&gt;&amp;&quot;&lt;/a&gt;");
    }

    #[test]
    fn href_encodes_unsafe_bytes() {
        assert_eq!(href("/browse", "/"), "/browse/");
        assert_eq!(href("/view", "/\"a b\"/{x:1}"), "/view/%22a%20b%22/%7Bx:1%7D");
        assert_eq!(href("/view", "/caf\u{e9}"), "/view/caf%C3%A9");
        assert_eq!(href("/view", "/+1"), "/view/%2B1");
    }
}
