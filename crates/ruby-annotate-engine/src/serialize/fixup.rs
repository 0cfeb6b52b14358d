//! String-level passes over serialized markup.
//!
//! These repair markup from serializers that wrap a ruby's block children in
//! `<p>`, such as stored output from older versions. [`Serializer`](super::Serializer)
//! never produces that shape itself, so on its output only
//! [`Fixup::StripParagraphs`] changes anything.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Which pass to run over serialized output. The passes never compose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fixup {
    None,
    #[default]
    RubyParagraphs,
    StripParagraphs,
}

impl Fixup {
    pub fn apply(self, markup: &str) -> String {
        match self {
            Fixup::None => markup.to_string(),
            Fixup::RubyParagraphs => fix_ruby_paragraphs(markup),
            Fixup::StripParagraphs => strip_paragraphs(markup),
        }
    }
}

fn ruby_open_paragraph() -> &'static Regex {
    static RUBY_OPEN: OnceLock<Regex> = OnceLock::new();
    RUBY_OPEN.get_or_init(|| Regex::new(r"<ruby>\s*<p>").expect("Invalid ruby-open regex"))
}

fn paragraph_close_rt() -> &'static Regex {
    static CLOSE_RT: OnceLock<Regex> = OnceLock::new();
    CLOSE_RT.get_or_init(|| Regex::new(r"</p>\s*<rt>").expect("Invalid paragraph-close regex"))
}

fn paragraph_tag() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"</?p>").expect("Invalid paragraph regex"))
}

/// Drop the paragraph wrapper directly inside a ruby: `<ruby><p>` becomes
/// `<ruby>` and `</p><rt>` becomes `<rt>`.
///
/// The older rewrite replaced `</p><rt>` with `</rt>`, which left the reading
/// without an opening tag. This pass keeps `<rt>` instead, so its output does
/// not match markup produced by that rewrite.
pub fn fix_ruby_paragraphs(markup: &str) -> String {
    let opened = ruby_open_paragraph().replace_all(markup, "<ruby>");
    paragraph_close_rt()
        .replace_all(&opened, "<rt>")
        .into_owned()
}

/// Remove every `<p>` and `</p>`
pub fn strip_paragraphs(markup: &str) -> String {
    paragraph_tag().replace_all(markup, "").into_owned()
}
