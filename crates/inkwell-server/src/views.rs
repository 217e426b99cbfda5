//! HTML views.
//!
//! Every page is the shared layout around a body fragment. The layout shows
//! the pending flash message and who is signed in. All interpolated values
//! are escaped, except markdown that has already been rendered to HTML.

use std::fmt::Write as _;

/// What the layout needs to know about the current session.
#[derive(Debug, Default, Clone, Copy)]
pub struct Page<'a> {
    /// Flash message taken from the session for this render.
    pub flash: Option<&'a str>,
    /// Signed-in username.
    pub username: Option<&'a str>,
}

/// Wrap a body fragment in the page layout.
#[must_use]
pub fn layout(page: &Page<'_>, body: &str) -> String {
    let mut html = String::with_capacity(LAYOUT_HEAD.len() + body.len() + 512);
    html.push_str(LAYOUT_HEAD);

    if let Some(flash) = page.flash {
        let _ = writeln!(
            html,
            "<div class=\"flash\"><p>{}</p></div>",
            escape_html(flash)
        );
    }

    html.push_str("<main>\n");
    html.push_str(body);
    html.push_str("\n</main>\n<footer>\n");

    match page.username {
        Some(user) => {
            let _ = writeln!(
                html,
                "<p class=\"user-status\">Signed in as {}.</p>\n\
                 <form action=\"/users/signout\" method=\"post\">\
                 <button type=\"submit\">Sign Out</button></form>",
                escape_html(user)
            );
        }
        None => html.push_str("<p class=\"user-status\"><a href=\"/users/signin\">Sign In</a></p>\n"),
    }

    html.push_str(LAYOUT_TAIL);
    html
}

/// The document list.
#[must_use]
pub fn index(names: &[String]) -> String {
    let mut html = String::from("<ul class=\"documents\">\n");

    for name in names {
        let href = urlencoding::encode(name);
        let label = escape_html(name);
        let _ = writeln!(
            html,
            "<li><a href=\"/{href}\">{label}</a> \
             <a href=\"/{href}/edit\">Edit</a> \
             <form class=\"inline\" action=\"/{href}/delete\" method=\"post\">\
             <button type=\"submit\">Delete</button></form></li>"
        );
    }

    html.push_str("</ul>\n<p><a href=\"/new\">New Document</a></p>");
    html
}

/// The sign-in form, optionally prefilled with a username.
#[must_use]
pub fn sign_in(username: &str) -> String {
    format!(
        "<form action=\"/users/signin\" method=\"post\">\n\
         <div><label for=\"username\">Username</label>\n\
         <input name=\"username\" id=\"username\" value=\"{}\"/></div>\n\
         <div><label for=\"password\">Password</label>\n\
         <input name=\"password\" id=\"password\" type=\"password\"/></div>\n\
         <button type=\"submit\">Sign In</button>\n\
         </form>",
        escape_html(username)
    )
}

/// The new-document form, optionally prefilled with the rejected name.
#[must_use]
pub fn new_document(filename: &str) -> String {
    format!(
        "<form action=\"/create\" method=\"post\">\n\
         <label for=\"filename\">Add a new document:</label>\n\
         <input name=\"filename\" id=\"filename\" value=\"{}\"/>\n\
         <button type=\"submit\">Create</button>\n\
         </form>",
        escape_html(filename)
    )
}

/// The edit form for an existing document.
#[must_use]
pub fn edit_document(name: &str, content: &str) -> String {
    format!(
        "<form action=\"/{href}\" method=\"post\">\n\
         <label for=\"content\">Edit content of {label}:</label>\n\
         <textarea name=\"content\" id=\"content\" rows=\"20\" cols=\"100\">{content}</textarea>\n\
         <button type=\"submit\">Save Changes</button>\n\
         </form>",
        href = urlencoding::encode(name),
        label = escape_html(name),
        content = escape_html(content),
    )
}

/// Body of an error page.
#[must_use]
pub fn error(message: &str) -> String {
    format!(
        "<h2>Something went wrong</h2>\n<p>{}</p>\n<p><a href=\"/\">Back to documents</a></p>",
        escape_html(message)
    )
}

/// Escape text for safe interpolation into HTML content and attributes.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const LAYOUT_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en"><head><meta charset="utf-8"/><meta name="viewport" content="width=device-width,initial-scale=1"/>
<title>Inkwell</title>
<style>
body{font-family:-apple-system,'Segoe UI',sans-serif;max-width:760px;margin:40px auto;padding:0 16px;color:#222;line-height:1.6}
a{color:#1a5fb4}
.flash{background:#fff6d5;border:1px solid #e5c000;border-radius:6px;padding:4px 12px;margin-bottom:16px}
.documents{list-style:none;padding:0}
.documents li{padding:4px 0;border-bottom:1px solid #eee}
form.inline{display:inline}
textarea{width:100%;font-family:monospace}
footer{margin-top:32px;border-top:1px solid #eee;font-size:14px;color:#666}
</style></head>
<body>
"#;

const LAYOUT_TAIL: &str = "</footer>\n</body></html>\n";
